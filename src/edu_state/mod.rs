pub use edu_state::*;

pub mod applications;
#[allow(clippy::module_inception)]
pub mod edu_state;
pub mod educenters;
pub mod repositories;
pub mod test_support;
pub mod users;
