//! Emission scheduler
//!
//! Repeatedly picks the next type whose dependencies have all been emitted,
//! emits it, and marks it done. When nothing qualifies the remaining types
//! contain a cycle (or hang off one) and the first remaining type is forced
//! through so the run always finishes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::DependencyGraph;
use crate::catalog::EntityType;
use crate::emit::{EmitOptions, Emitter};

/// Direction in which the remaining list is scanned for an eligible type
///
/// When several types are eligible at once, the first one met wins, so this
/// decides the output order among independent types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Prefer types nearer the end of the remaining list
    #[default]
    Reverse,
    /// Prefer types nearer the front of the remaining list
    Forward,
}

/// Mutable progress of one run
///
/// At every iteration boundary each input type is in exactly one of
/// `dumped` and `to_dump`.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    dumped: HashSet<String>,
    to_dump: Vec<EntityType>,
    append: bool,
}

impl ScheduleState {
    /// Fresh state; duplicate input types are kept once, at first position
    pub fn new(types: Vec<EntityType>, append: bool) -> Self {
        let mut seen = HashSet::new();
        let to_dump = types
            .into_iter()
            .filter(|t| seen.insert(t.name.clone()))
            .collect();
        Self {
            dumped: HashSet::new(),
            to_dump,
            append,
        }
    }

    pub fn is_dumped(&self, name: &str) -> bool {
        self.dumped.contains(name)
    }

    pub fn dumped(&self) -> &HashSet<String> {
        &self.dumped
    }

    /// Remaining types in their original relative order
    pub fn to_dump(&self) -> &[EntityType] {
        &self.to_dump
    }

    pub fn append(&self) -> bool {
        self.append
    }

    pub fn is_done(&self) -> bool {
        self.to_dump.is_empty()
    }

    fn advance(&mut self, index: usize) {
        let entity = self.to_dump.remove(index);
        self.append = true;
        self.dumped.insert(entity.name);
    }
}

/// Outcome of the selection phase of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Index into the remaining list
    pub index: usize,
    /// Chosen by the cycle fallback rather than because it was eligible
    pub forced: bool,
}

/// One completed emission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledEmission {
    pub entity: EntityType,
    /// Append flag the emitter was called with
    pub append: bool,
    pub forced: bool,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub emissions: Vec<ScheduledEmission>,
    /// False when the run was stopped before every type was emitted
    pub completed: bool,
}

impl ScheduleReport {
    pub fn order(&self) -> Vec<&str> {
        self.emissions.iter().map(|e| e.entity.name.as_str()).collect()
    }

    pub fn forced_count(&self) -> usize {
        self.emissions.iter().filter(|e| e.forced).count()
    }
}

/// Drives emission of every input type exactly once
pub struct Scheduler<'g> {
    graph: &'g DependencyGraph,
    options: EmitOptions,
    scan_order: ScanOrder,
    state: ScheduleState,
}

impl<'g> Scheduler<'g> {
    /// `options.append` is used for the first emission only
    pub fn new(types: Vec<EntityType>, graph: &'g DependencyGraph, options: EmitOptions) -> Self {
        let state = ScheduleState::new(types, options.append);
        Self {
            graph,
            options,
            scan_order: ScanOrder::default(),
            state,
        }
    }

    pub fn with_scan_order(mut self, scan_order: ScanOrder) -> Self {
        self.scan_order = scan_order;
        self
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Options for the next emission
    pub fn next_options(&self) -> EmitOptions {
        EmitOptions {
            append: self.state.append,
            ..self.options.clone()
        }
    }

    fn is_eligible(&self, entity: &EntityType) -> bool {
        if self.state.is_dumped(&entity.name) {
            return false;
        }
        self.graph.dependencies(&entity.name).iter().all(|dep| {
            *dep == entity.name || !self.graph.contains(dep) || self.state.is_dumped(dep)
        })
    }

    /// Choose the next type without changing any state
    pub fn select(&self) -> Option<Selection> {
        if self.state.is_done() {
            return None;
        }

        let remaining = self.state.to_dump();
        let found = match self.scan_order {
            ScanOrder::Reverse => remaining.iter().rposition(|t| self.is_eligible(t)),
            ScanOrder::Forward => remaining.iter().position(|t| self.is_eligible(t)),
        };

        Some(match found {
            Some(index) => Selection { index, forced: false },
            None => Selection { index: 0, forced: true },
        })
    }

    /// Run one iteration; `Ok(None)` once every type has been emitted
    ///
    /// An emitter error is returned as is and leaves the chosen type in the
    /// remaining list.
    pub async fn step<E: Emitter>(
        &mut self,
        emitter: &mut E,
    ) -> Result<Option<ScheduledEmission>, E::Error> {
        let Some(selection) = self.select() else {
            return Ok(None);
        };

        let entity = self.state.to_dump()[selection.index].clone();
        let options = self.next_options();

        if selection.forced {
            let blocking: Vec<&str> = self
                .graph
                .dependencies(&entity.name)
                .iter()
                .filter(|dep| self.graph.contains(dep) && !self.state.is_dumped(dep))
                .map(String::as_str)
                .collect();
            log::warn!(
                "Dependency cycle: dumping {} before {}",
                entity.name,
                blocking.join(", ")
            );
        }
        log::info!(
            "Dumping {} ({} remaining, append: {})",
            entity.name,
            self.state.to_dump().len() - 1,
            options.append
        );

        emitter.emit(&entity, &options).await?;
        self.state.advance(selection.index);

        Ok(Some(ScheduledEmission {
            entity,
            append: options.append,
            forced: selection.forced,
        }))
    }

    /// Emit every remaining type
    pub async fn run<E: Emitter>(&mut self, emitter: &mut E) -> Result<ScheduleReport, E::Error> {
        self.run_while(emitter, || true).await
    }

    /// Emit remaining types while `keep_going` returns true
    ///
    /// `keep_going` is consulted before each iteration, which is the only
    /// point where stopping leaves the state consistent.
    pub async fn run_while<E, F>(
        &mut self,
        emitter: &mut E,
        mut keep_going: F,
    ) -> Result<ScheduleReport, E::Error>
    where
        E: Emitter,
        F: FnMut() -> bool,
    {
        let mut report = ScheduleReport::default();
        while !self.state.is_done() {
            if !keep_going() {
                log::warn!(
                    "Stopped with {} types not dumped",
                    self.state.to_dump().len()
                );
                return Ok(report);
            }
            match self.step(emitter).await? {
                Some(emission) => report.emissions.push(emission),
                None => break,
            }
        }
        report.completed = true;
        Ok(report)
    }
}
