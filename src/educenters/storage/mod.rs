mod courses_repository;
mod courses_repository_sql;
mod educenters_repository;
mod educenters_repository_sql;

pub use courses_repository::*;
pub use courses_repository_sql::*;
pub use educenters_repository::*;
pub use educenters_repository_sql::*;
