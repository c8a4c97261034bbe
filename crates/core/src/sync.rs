//! Synchronization status shared by customers, utility accounts and LDC accounts.

use serde::{Deserialize, Serialize};

/// Sync lifecycle.
///
/// `Pending → InProgress → {Synced | Failed | PartiallySuccessful}`. Any state can
/// move back to `InProgress`, or straight to `Synced`/`Failed`, through the
/// owning aggregate's explicit mark methods. Nothing transitions on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Pending,
    InProgress,
    Synced,
    Failed,
    PartiallySuccessful,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
            SyncStatus::PartiallySuccessful => "partially_successful",
        }
    }

    /// Whether a sync attempt has finished (successfully or not).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncStatus::Synced | SyncStatus::Failed | SyncStatus::PartiallySuccessful
        )
    }

    /// Collapse a set of per-entity statuses into one.
    ///
    /// Returns `None` for an empty set. Any `InProgress` wins; otherwise all
    /// `Synced` gives `Synced`, all `Failed` gives `Failed`, and at least one
    /// success (`Synced` or `PartiallySuccessful`) next to at least one failure
    /// gives `PartiallySuccessful`. Anything else is still `Pending`.
    pub fn combine(statuses: impl IntoIterator<Item = SyncStatus>) -> Option<SyncStatus> {
        let mut total = 0usize;
        let mut synced = 0usize;
        let mut failed = 0usize;
        let mut partial = 0usize;

        for status in statuses {
            total += 1;
            match status {
                SyncStatus::InProgress => return Some(SyncStatus::InProgress),
                SyncStatus::Synced => synced += 1,
                SyncStatus::Failed => failed += 1,
                SyncStatus::PartiallySuccessful => partial += 1,
                SyncStatus::Pending => {}
            }
        }

        if total == 0 {
            return None;
        }

        let combined = if synced == total {
            SyncStatus::Synced
        } else if failed == total {
            SyncStatus::Failed
        } else if failed > 0 && (synced > 0 || partial > 0) {
            SyncStatus::PartiallySuccessful
        } else {
            SyncStatus::Pending
        };
        Some(combined)
    }
}

impl core::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
