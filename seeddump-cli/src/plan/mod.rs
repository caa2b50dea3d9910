//! Dependency-aware emission planning
//!
//! This module contains:
//! - Dependency graph building from catalog references
//! - The scheduler that emits each type after its dependencies

pub mod dependency_graph;
pub mod scheduler;

pub use dependency_graph::*;
pub use scheduler::*;

use crate::catalog::{self, Catalog};
use crate::emit::{EmitOptions, Emitter};
use crate::error::DumpError;

/// Select candidates, build their graph and emit them all
pub async fn dump_all<C, E>(
    catalog: &C,
    selector: Option<&[String]>,
    options: EmitOptions,
    scan_order: ScanOrder,
    emitter: &mut E,
) -> Result<ScheduleReport, DumpError<E::Error>>
where
    C: Catalog + ?Sized,
    E: Emitter,
{
    let types = catalog::select_candidates(catalog, selector)
        .await
        .map_err(DumpError::Selection)?;
    let graph = DependencyGraph::from_catalog(catalog, &types)
        .await
        .map_err(DumpError::Graph)?;

    Scheduler::new(types, &graph, options)
        .with_scan_order(scan_order)
        .run(emitter)
        .await
        .map_err(DumpError::Emit)
}
