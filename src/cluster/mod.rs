pub mod selection;
pub mod shard;

pub use selection::{RandomSelector, ScriptedSelector, ShardSelector};
pub use shard::{Shard, ShardCursor};
