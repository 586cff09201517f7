//! Veterinary clinic schema, seed data and transactions on an embedded
//! SQLite store.
//!
//! # Intention
//!
//! - Define the clinic tables with their full constraint set and keep an
//!   application-side validator in step with them.
//! - Run the fixed clinic transactions against an explicitly passed
//!   [`store::ClinicStore`] handle.
//!
//! # Architectural Boundaries
//!
//! - All storage and constraint enforcement is delegated to SQLite.
//! - Presentation lives in [`report`]; nothing there touches the store.

pub mod error;
pub mod model;
pub mod report;
pub mod schema;
pub mod seed;
pub mod store;
pub mod transactions;
pub mod validate;
pub mod walkthrough;

pub use error::{ClinicError, ClinicResult, ConstraintCategory};
pub use store::{ClinicStore, StoreConfig};
