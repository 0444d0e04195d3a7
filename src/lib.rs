//! Storage for education centers, courses, users and their applications.
//!
//! Applications are numbered with a sequential index, allocated as `max(index) + 1`
//! inside a write transaction and protected by a unique constraint. See [`IndexAllocator`].

pub mod applications;
pub mod edu_state;
pub mod educenters;
pub mod env;
pub mod error;
pub mod logs;
pub mod permissions;
pub mod storage;
pub mod users;

pub use applications::{
    Application, ApplicationIndex, IndexAllocator, NewApplication, MAX_ALLOCATION_ATTEMPTS,
};
pub use edu_state::EduState;
pub use error::{ApiError, Result, StorageError};

#[macro_use]
extern crate tracing;
