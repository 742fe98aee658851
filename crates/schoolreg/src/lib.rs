//! `schoolreg` - School registration, fee and audit administration
//!
//! This library provides the registry of participating schools and student
//! registrations, the fee settings with their change history, CSV bulk
//! import and report export, and the append-only audit log, persisted in a
//! local `SQLite` key-value store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod dataset;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod model;
pub mod registry;
pub mod report;
pub mod storage;

pub use auth::{Authenticator, ConfigAuthenticator, Credentials};
pub use config::Config;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use registry::{Registry, RegistryOptions};
pub use storage::{Storage, StorageStats};
