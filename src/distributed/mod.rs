pub mod coordinator;
pub mod router;

pub use coordinator::{Coordinator, ShardStatus};
pub use router::PageRouter;
