//! SQLite-backed campaign repository and credential store. One worker
//! process owns one connection; the queue layer upstream guarantees a
//! single writer per account.

mod store;

pub use store::SqliteStore;
