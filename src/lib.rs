//! Versioned tender and proposal records.
//!
//! Every edit snapshots the record's prior state into an append-only ledger and
//! bumps its version; a rollback restores any recorded version. The same
//! mechanism, [`controller::VersionedEntityController`], serves both kinds.

pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod gate;
pub mod kind;
pub mod proposal;
pub mod service;
pub mod store;
pub mod tender;
pub mod types;
pub mod utils;

pub use controller::VersionedEntityController;
pub use error::{EntityError, Result};
pub use service::TenderingService;
