mod users_repository;
mod users_repository_sql;

pub use users_repository::*;
pub use users_repository_sql::*;
