mod database_configuration;
mod sqlx_database;

pub use database_configuration::*;
pub use sqlx_database::*;
