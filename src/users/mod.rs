pub use models::*;
pub use storage::*;

pub mod models;
pub mod storage;
