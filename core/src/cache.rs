/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use entity::project::ProjectStatus;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

/// Current status/domain view of an in-flight deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub status: ProjectStatus,
    pub domain: Option<String>,
}

#[derive(Debug)]
struct RunEntry {
    logs: Vec<String>,
    status: ProjectStatus,
    domain: Option<String>,
}

impl RunEntry {
    fn new() -> Self {
        Self {
            logs: Vec::new(),
            status: ProjectStatus::Queued,
            domain: None,
        }
    }
}

/// Process-wide progress store for in-flight deployments, keyed by project
/// name. Entries live from `start_run` until `end_run`, so memory is bounded
/// by the number of concurrent deployments. The `in_flight` set doubles as
/// the per-project run guard: `try_begin` must succeed before a run starts,
/// and `end_run` releases the name again.
#[derive(Debug, Default)]
pub struct ProgressCache {
    entries: RwLock<HashMap<String, RunEntry>>,
    in_flight: Mutex<HashSet<String>>,
}

impl ProgressCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the run guard for a project. Returns false while another run
    /// for the same name is still in flight.
    pub fn try_begin(&self, project: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.to_string())
    }

    /// Whether a run for this project currently holds the guard.
    pub fn is_running(&self, project: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(project)
    }

    /// Reset the entry for a fresh run, discarding logs of any prior one.
    pub fn start_run(&self, project: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.to_string(), RunEntry::new());
    }

    pub fn append_log(&self, project: &str, line: impl Into<String>) {
        if let Some(entry) = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(project)
        {
            entry.logs.push(line.into());
        }
    }

    /// All log lines appended since `position`, plus the new position.
    /// Readers polling this repeatedly see every line exactly once, in order.
    pub fn logs_since(&self, project: &str, position: usize) -> (Vec<String>, usize) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        match entries.get(project) {
            Some(entry) => {
                let len = entry.logs.len();
                if position >= len {
                    (Vec::new(), len)
                } else {
                    (entry.logs[position..].to_vec(), len)
                }
            }
            None => (Vec::new(), position),
        }
    }

    /// Joined log text of the current run, for the durable record.
    pub fn log_text(&self, project: &str) -> String {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        entries
            .get(project)
            .map(|entry| entry.logs.join("\n"))
            .unwrap_or_default()
    }

    /// Update the status snapshot. Terminal states are sticky within a run:
    /// once Live or Failed is set, a non-terminal status is ignored.
    pub fn set_status(&self, project: &str, status: ProjectStatus, domain: Option<String>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(project.to_string())
            .or_insert_with(RunEntry::new);

        if entry.status.is_terminal() && !status.is_terminal() {
            return;
        }

        entry.status = status;
        if domain.is_some() {
            entry.domain = domain;
        }
    }

    pub fn snapshot(&self, project: &str) -> Option<ProgressSnapshot> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .map(|entry| ProgressSnapshot {
                status: entry.status,
                domain: entry.domain.clone(),
            })
    }

    /// Evict the entry and release the run guard. Called after the durable
    /// record has absorbed the final state.
    pub fn end_run(&self, project: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project);
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project);
    }
}
