//! In-process stand-in for the remote tree database.
//!
//! [`EmulatorServer`] keeps one shared tree per database URL, so every
//! client connecting to the same URL in this process observes the same
//! data. Opened with a state directory, the tree is also kept in a file so
//! processes run one after another share it, the way they would share a
//! remote instance.
//! [`EmulatorClient`] speaks the [`crate::Database`] contract against it.

mod client;
mod server;

pub use client::*;
pub use server::*;
