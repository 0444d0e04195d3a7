pub use allocator::*;
pub use models::*;
pub use storage::*;

pub mod allocator;
pub mod models;
pub mod storage;
