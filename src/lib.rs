//! Reproduction harness for lost sibling data under concurrent
//! transactional writes against a hierarchical database.
//!
//! [`Settings`] resolves the endpoint and credentials, [`Client`] connects,
//! and [`ScenarioRunner`] seeds a user record, races three transactions
//! against it and asserts nothing unrelated disappeared.

mod client;
mod config;
mod database;
mod errors;
mod scenario;
pub mod utils;

pub use self::client::*;
pub use self::config::*;
pub use self::database::*;
pub use self::errors::*;
pub use self::scenario::*;
pub use self::utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
