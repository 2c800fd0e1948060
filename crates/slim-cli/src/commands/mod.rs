//! Command implementations.
//!
//! - [`optimize`] - probe, specialize and build one application
//! - [`routes`] - print an application's route table

pub mod optimize;
pub mod routes;
pub(crate) mod utils;

pub use optimize::execute as optimize_execute;
pub use routes::execute as routes_execute;
