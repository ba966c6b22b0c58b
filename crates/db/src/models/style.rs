//! Style catalogue models and the sync planner used by both stores.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::FromRow;
use stylist_core::types::{DbId, Timestamp};

/// A row from the `styles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Style {
    pub id: DbId,
    pub name: String,
    pub active: bool,
    pub created_at: Timestamp,
}

/// Changes needed to align the catalogue with the transformer's style list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StyleSyncPlan {
    /// Names the transformer offers that have no row yet.
    pub insert: Vec<String>,
    pub activate: Vec<DbId>,
    pub deactivate: Vec<DbId>,
}

impl StyleSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.activate.is_empty() && self.deactivate.is_empty()
    }
}

/// Outcome of a style sync, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StyleSyncSummary {
    pub inserted: usize,
    pub activated: usize,
    pub deactivated: usize,
}

impl From<&StyleSyncPlan> for StyleSyncSummary {
    fn from(plan: &StyleSyncPlan) -> Self {
        Self {
            inserted: plan.insert.len(),
            activated: plan.activate.len(),
            deactivated: plan.deactivate.len(),
        }
    }
}

/// Compute the inserts and activation flips that make `current` match
/// `available`. Styles are never deleted, only deactivated.
pub fn plan_sync(current: &[Style], available: &[String]) -> StyleSyncPlan {
    let available_set: HashSet<&str> = available.iter().map(String::as_str).collect();
    let known: HashSet<&str> = current.iter().map(|s| s.name.as_str()).collect();

    let mut plan = StyleSyncPlan::default();
    let mut queued = HashSet::new();
    for name in available {
        if !known.contains(name.as_str()) && queued.insert(name.as_str()) {
            plan.insert.push(name.clone());
        }
    }
    for style in current {
        let offered = available_set.contains(style.name.as_str());
        if style.active && !offered {
            plan.deactivate.push(style.id);
        } else if !style.active && offered {
            plan.activate.push(style.id);
        }
    }
    plan
}
