//! Dependency-ordered database dumps
//!
//! Reflects the entity types of a data store, orders them so every type is
//! written after the types it references, and drives an [`emit::Emitter`]
//! through that order. Reference cycles are broken deterministically.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod plan;

pub use catalog::{Catalog, EntityType, Reference, ReferenceKind, SqliteCatalog, StaticCatalog};
pub use emit::{EmitOptions, Emitter};
pub use error::{ConfigError, DumpError, SelectionError};
pub use plan::{DependencyGraph, ScanOrder, ScheduleReport, Scheduler, dump_all};
