use crate::error::{ScatterError, ScatterResult};
use crate::{Record, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

// Anything that can hand the coordinator a finite batch of records.
pub trait RecordSource {
    fn records(&mut self) -> ScatterResult<Vec<Record>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Int,
    Int64,
    Text,
    Bool,
}

impl FieldKind {
    fn parse(raw: &str) -> ScatterResult<Self> {
        match raw {
            "int" => Ok(FieldKind::Int),
            "int64" => Ok(FieldKind::Int64),
            "text" => Ok(FieldKind::Text),
            "bool" => Ok(FieldKind::Bool),
            other => Err(ScatterError::Ingest {
                message: format!("unknown field type '{other}' in header"),
            }),
        }
    }
}

// Parses delimited tabular text. The first non-empty line is a header of
// `name:type` columns (e.g. `id:int64,firstName:text,lastName:text,age:int,
// gender:text`); every following line is one record. Empty cells become
// Absent.
pub struct TabularReader {
    delimiter: char,
}

impl TabularReader {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn read<R: BufRead>(&self, reader: R) -> ScatterResult<Vec<Record>> {
        let mut columns: Option<Vec<(String, FieldKind)>> = None;
        let mut records = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match &columns {
                None => columns = Some(self.parse_header(line)?),
                Some(columns) => records.push(self.parse_row(columns, line, line_no + 1)?),
            }
        }

        if columns.is_none() {
            return Err(ScatterError::Ingest {
                message: "input has no header line".to_string(),
            });
        }

        Ok(records)
    }

    pub fn read_path(&self, path: impl AsRef<Path>) -> ScatterResult<Vec<Record>> {
        let path = path.as_ref();
        let records = self.read(BufReader::new(File::open(path)?))?;
        info!("ingested {} records from {}", records.len(), path.display());
        Ok(records)
    }

    fn parse_header(&self, line: &str) -> ScatterResult<Vec<(String, FieldKind)>> {
        let mut columns = Vec::new();
        for column in line.split(self.delimiter) {
            let column = column.trim();
            let (name, kind) = column.split_once(':').ok_or_else(|| ScatterError::Ingest {
                message: format!("header column '{column}' is not name:type"),
            })?;
            if name.is_empty() {
                return Err(ScatterError::Ingest {
                    message: format!("header column '{column}' has an empty name"),
                });
            }
            columns.push((name.trim().to_string(), FieldKind::parse(kind.trim())?));
        }
        Ok(columns)
    }

    fn parse_row(
        &self,
        columns: &[(String, FieldKind)],
        line: &str,
        line_no: usize,
    ) -> ScatterResult<Record> {
        let cells: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
        if cells.len() != columns.len() {
            return Err(ScatterError::Ingest {
                message: format!(
                    "line {line_no}: expected {} cells, found {}",
                    columns.len(),
                    cells.len()
                ),
            });
        }

        let mut record = Record::new();
        for ((name, kind), cell) in columns.iter().zip(cells) {
            record.set(name.clone(), parse_cell(*kind, cell, line_no)?);
        }
        Ok(record)
    }
}

impl Default for TabularReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_cell(kind: FieldKind, cell: &str, line_no: usize) -> ScatterResult<Value> {
    if cell.is_empty() {
        return Ok(Value::Absent);
    }

    let bad = |kind: &str| ScatterError::Ingest {
        message: format!("line {line_no}: '{cell}' is not a valid {kind}"),
    };

    match kind {
        FieldKind::Int => cell.parse().map(Value::Int).map_err(|_| bad("int")),
        FieldKind::Int64 => cell.parse().map(Value::Int64).map_err(|_| bad("int64")),
        FieldKind::Text => Ok(Value::Text(cell.to_string())),
        FieldKind::Bool => cell.parse().map(Value::Bool).map_err(|_| bad("bool")),
    }
}

// File-backed source for seeding a coordinator from tabular data.
pub struct FileSource {
    path: std::path::PathBuf,
    reader: TabularReader,
}

impl FileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            reader: TabularReader::new(),
        }
    }
}

impl RecordSource for FileSource {
    fn records(&mut self) -> ScatterResult<Vec<Record>> {
        self.reader.read_path(&self.path)
    }
}
