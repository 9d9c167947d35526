//! # venda-core
//!
//! Shared foundation for the venda backend: domain models, the unified
//! error type, repository and capability traits, default constants, and the
//! structured logging contract.
//!
//! Workspace crates depend on `venda-core` instead of each other's
//! internals; the storage layer implements the traits defined here and the
//! worker consumes them.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
