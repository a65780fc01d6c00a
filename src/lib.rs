//! # Cellar - Pluggable Embedded Key-Value Storage
//!
//! Cellar is a lightweight, embedded key-value storage layer with pluggable
//! backends. Stores speak a single byte-oriented contract; optional features
//! like transactions, versioning, and range queries are expressed as
//! capabilities that a backend either implements or does not.
//!
//! ## Key Features
//!
//! - **Embedded**: no separate server process required
//! - **Pluggable Engines**: backends register as named engine factories
//! - **Capabilities**: transactions, versioning, and range queries are
//!   discoverable per store instead of assumed
//! - **Transactions**: overlay transactions with atomic commit
//! - **Versioning**: point-in-time snapshots with content hashes
//! - **Events**: lifecycle listeners for store creation, deletion, and close
//! - **Clean API**: PIMPL pattern provides stable, encapsulated interfaces
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cellar::multi_store::MultiStore;
//! use cellar::store::{MemoryEngine, StoreOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let multi = MultiStore::new("/data");
//! multi.register_engine(MemoryEngine::create_engine())?;
//!
//! let store = multi.create_store("users", "memory", &StoreOptions::new())?;
//! store.set(b"user:1", b"alice")?;
//! assert_eq!(store.get(b"user:1")?, b"alice");
//!
//! // Use a capability when the backend supports it.
//! if let Some(tx_support) = store.transactional() {
//!     let tx = tx_support.begin_tx(false)?;
//!     tx.set(b"user:2", b"bob")?;
//!     tx.commit()?;
//! }
//!
//! multi.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Cellar uses the **PIMPL (Pointer To IMPLementation)** design pattern:
//! public handle types (`Store`, `Engine`, `Transaction`, `MultiStore`) wrap
//! `Arc`-shared inner state, so clones are cheap and all clones observe the
//! same underlying store.
//!
//! ## Module Organization
//!
//! - [`errors`] - Error types and result definitions
//! - [`multi_store`] - Top-level orchestrator over engines and stores
//! - [`store`] - The store contract, capabilities, engines, and backends

pub mod errors;
pub mod multi_store;
pub mod store;

pub use errors::{CellarError, CellarResult, ErrorKind};
pub use multi_store::MultiStore;
