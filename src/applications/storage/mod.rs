mod applications_repository;
mod applications_repository_sql;
mod memory;

pub use applications_repository::*;
pub use applications_repository_sql::*;
pub use memory::*;
