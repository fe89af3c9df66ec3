//! Azure Table storage over its REST protocol.
//!
//! Only what the probe needs: create-if-absent for the events table and a
//! count of rows matching an exact partition/row key pair.

pub mod auth;
pub mod connection_string;
pub mod store;

pub use connection_string::StorageAccount;
pub use store::AzureTableStore;
