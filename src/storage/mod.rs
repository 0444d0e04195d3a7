pub use auto_retry::*;
pub use database::*;

mod auto_retry;
pub mod database;
