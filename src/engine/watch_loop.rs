// src/engine/watch_loop.rs

//! Per-class rebuild state machine for watch mode.
//!
//! Each asset class is either `Idle` or `Rebuilding`. A change that arrives
//! while its class is rebuilding sets a single pending flag; however many
//! changes arrive, at most one follow-up rebuild is queued.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::config::PathTable;
use crate::engine::report::TaskReport;
use crate::types::{AssetClass, ReloadPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    Idle,
    Rebuilding { pending: bool },
}

/// What connected sessions should be told after a successful rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadSignal {
    pub class: AssetClass,
    pub policy: ReloadPolicy,
    /// Destination files written by the rebuild.
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct WatchLoop {
    active: bool,
    states: BTreeMap<AssetClass, ClassState>,
    policies: BTreeMap<AssetClass, ReloadPolicy>,
}

impl WatchLoop {
    pub fn new(policies: BTreeMap<AssetClass, ReloadPolicy>) -> Self {
        let states = AssetClass::ALL
            .iter()
            .map(|class| (*class, ClassState::Idle))
            .collect();
        Self {
            active: false,
            states,
            policies,
        }
    }

    pub fn from_table(table: &PathTable) -> Self {
        Self::new(table.iter().map(|p| (p.class, p.reload)).collect())
    }

    /// Start reacting to source changes. Called when the watch node starts.
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self, class: AssetClass) -> ClassState {
        self.states
            .get(&class)
            .copied()
            .unwrap_or(ClassState::Idle)
    }

    /// A source of `class` changed.
    ///
    /// Returns `true` if a rebuild should be dispatched now. While a rebuild
    /// of the class is running the change is folded into the pending flag.
    pub fn on_change(&mut self, class: AssetClass) -> bool {
        if !self.active {
            return false;
        }
        let state = self.states.entry(class).or_insert(ClassState::Idle);
        match *state {
            ClassState::Idle => {
                *state = ClassState::Rebuilding { pending: false };
                true
            }
            ClassState::Rebuilding { pending } => {
                if !pending {
                    debug!(%class, "rebuild in progress; queueing one follow-up");
                }
                *state = ClassState::Rebuilding { pending: true };
                false
            }
        }
    }

    /// A rebuild of `class` finished (successfully or not).
    ///
    /// Returns `true` if a follow-up rebuild should be dispatched because
    /// changes arrived in the meantime.
    pub fn on_rebuild_finished(&mut self, class: AssetClass) -> bool {
        let state = self.states.entry(class).or_insert(ClassState::Idle);
        match *state {
            ClassState::Rebuilding { pending: true } => {
                *state = ClassState::Rebuilding { pending: false };
                true
            }
            _ => {
                *state = ClassState::Idle;
                false
            }
        }
    }

    /// Reload signal for a successful rebuild, unless the class reloads
    /// nothing.
    pub fn reload_signal(&self, class: AssetClass, report: &TaskReport) -> Option<ReloadSignal> {
        let policy = self.policies.get(&class).copied().unwrap_or_default();
        if policy == ReloadPolicy::Never {
            return None;
        }
        Some(ReloadSignal {
            class,
            policy,
            paths: report.written.clone(),
        })
    }
}
