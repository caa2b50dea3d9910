//! Emission boundary
//!
//! The scheduler decides which type is written next and with which options;
//! an [`Emitter`] does the writing.

pub mod plan;

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::EntityType;

pub use plan::{EmissionPlan, PlanEmitter, PlannedEmission};

/// Options passed with every emission call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Maximum rows to write for the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Extend the destination instead of creating or truncating it
    pub append: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<NonZeroUsize>,
    /// Fields left out of the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<BTreeSet<String>>,
    pub destination: PathBuf,
    /// Write in bulk-import form
    pub import_mode: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            limit: None,
            append: false,
            batch_size: None,
            exclude: None,
            destination: PathBuf::from(crate::config::DEFAULT_DESTINATION),
            import_mode: false,
        }
    }
}

/// Writes all rows of one type to the destination
///
/// Calls are strictly sequential; the next call starts only after the
/// previous one returned.
#[async_trait]
pub trait Emitter: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn emit(&mut self, entity: &EntityType, options: &EmitOptions) -> Result<(), Self::Error>;
}
