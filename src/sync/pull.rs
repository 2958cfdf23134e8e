//! Pull: apply remote changes through the persisted cursor.

use log::info;

use super::{ConflictOutcome, SyncReport, SyncService};
use crate::error::Result;
use crate::record::RecordKind;

impl SyncService {
    /// Fetch and apply every remote change recorded since the last pull.
    ///
    /// The cursor is stored after each applied page, so an interrupted pull
    /// resumes where it stopped. When items changed, the manual order is
    /// renumbered densely afterwards: concurrent reorders on two devices may
    /// have left duplicates or gaps.
    pub async fn pull(&self) -> Result<SyncReport> {
        let _guard = self.pull_lock.lock().await;
        let mut report = SyncReport::default();
        let mut cursor = self.store.sync_cursor().await?;
        let mut items_changed = false;

        loop {
            let batch = self
                .backend
                .fetch_changes(cursor.as_deref(), self.config.pull_page_size)
                .await?;

            for change in &batch.changes {
                let applied = self.store.apply_remote_change(change).await?;
                if applied.changed {
                    report.pulled += 1;
                    items_changed |= applied.kind == RecordKind::Item;
                } else {
                    report.skipped += 1;
                }
                if applied.conflict {
                    report.conflicts.push(ConflictOutcome {
                        kind: applied.kind,
                        id: applied.id,
                        resolution: applied.resolution,
                    });
                }
            }

            self.store.set_sync_cursor(&batch.cursor).await?;
            cursor = Some(batch.cursor);
            if !batch.has_more {
                break;
            }
        }

        if items_changed {
            let repaired = self.store.repair_sort_orders().await?;
            if repaired > 0 {
                info!("🔧 Renumbered {} item(s) after pull", repaired);
            }
        }
        if report.pulled > 0 {
            info!("📥 Pulled {} change(s)", report.pulled);
        }
        Ok(report)
    }
}
