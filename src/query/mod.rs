use crate::Record;
use std::cmp::Ordering;
use std::sync::Arc;

// Query plans cross task boundaries during the parallel shard fan-out, so all
// three parts are shared closures behind an Arc.

#[derive(Clone)]
pub struct Filter(Arc<dyn Fn(&Record) -> bool + Send + Sync>);

impl Filter {
    pub fn new(predicate: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    pub fn accept_all() -> Self {
        Self::new(|_| true)
    }

    pub fn int_gt(field: impl Into<String>, threshold: i32) -> Self {
        let field = field.into();
        Self::new(move |record| matches!(record.int(&field), Ok(v) if v > threshold))
    }

    pub fn text_eq(field: impl Into<String>, expected: impl Into<String>) -> Self {
        let field = field.into();
        let expected = expected.into();
        Self::new(move |record| matches!(record.text(&field), Ok(v) if v == expected))
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.0)(record)
    }
}

#[derive(Clone)]
pub struct Order(Arc<dyn Fn(&Record, &Record) -> Ordering + Send + Sync>);

impl Order {
    pub fn new(comparator: impl Fn(&Record, &Record) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(comparator))
    }

    // Ascending by a single field, Absent last. The merge collapses records
    // that compare equal, so callers must extend a non-discriminating order
    // with a unique field via `then` (typically the record id).
    pub fn by_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |a, b| a.get(&field).sort_cmp(b.get(&field)))
    }

    pub fn descending(self) -> Self {
        Self::new(move |a, b| (self.0)(a, b).reverse())
    }

    pub fn then(self, tie_break: Order) -> Self {
        Self::new(move |a, b| (self.0)(a, b).then_with(|| (tie_break.0)(a, b)))
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        (self.0)(a, b)
    }
}

#[derive(Clone)]
pub struct Projection(Arc<dyn Fn(&Record) -> Record + Send + Sync>);

impl Projection {
    pub fn new(project: impl Fn(&Record) -> Record + Send + Sync + 'static) -> Self {
        Self(Arc::new(project))
    }

    pub fn identity() -> Self {
        Self::new(|record| record.clone())
    }

    pub fn keep(fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        Self::new(move |record| {
            let mut projected = Record::new();
            for field in &fields {
                let value = record.get(field);
                if !value.is_absent() {
                    projected.set(field.clone(), value.clone());
                }
            }
            projected
        })
    }

    pub fn apply(&self, record: &Record) -> Record {
        (self.0)(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, age: i32, name: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("age", age)
            .with("firstName", name)
    }

    #[test]
    fn test_filter_int_gt() {
        let filter = Filter::int_gt("age", 30);

        assert!(filter.matches(&person(1, 31, "Ada")));
        assert!(!filter.matches(&person(2, 30, "Bob")));
        assert!(!filter.matches(&Record::new().with("age", "oops")));
    }

    #[test]
    fn test_order_by_field_with_tie_break() {
        let order = Order::by_field("age").then(Order::by_field("id"));

        let a = person(1, 40, "Ada");
        let b = person(2, 40, "Bob");
        let c = person(3, 35, "Cid");

        assert_eq!(order.compare(&c, &a), Ordering::Less);
        assert_eq!(order.compare(&a, &b), Ordering::Less);
        assert_eq!(order.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_order_descending() {
        let order = Order::by_field("id").descending();

        let a = person(1, 40, "Ada");
        let b = person(2, 40, "Bob");

        assert_eq!(order.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_projection_keep_drops_missing_fields() {
        let projection = Projection::keep(&["id", "age"]);
        let projected = projection.apply(&person(1, 40, "Ada"));

        assert_eq!(projected.int64("id").unwrap(), 1);
        assert_eq!(projected.int("age").unwrap(), 40);
        assert!(projected.get("firstName").is_absent());
        assert_eq!(projected.len(), 2);

        let sparse = Projection::keep(&["id", "nope"]).apply(&person(1, 40, "Ada"));
        assert_eq!(sparse.len(), 1);
    }
}
