use serde::Serialize;
use std::collections::BTreeMap;

use logbook_core::authz::{authorize, Action};
use logbook_core::catalog::LogKind;
use logbook_core::models::{EntryStatus, UserId};
use logbook_core::{RequestContext, Result};

use crate::LogbookService;

#[derive(Debug, Clone, Serialize)]
pub struct KindProgress {
    pub kind: LogKind,
    pub label: &'static str,
    pub total: i64,
    pub by_status: BTreeMap<EntryStatus, i64>,
}

/// Per-kind status counts for one student, the data behind the
/// evaluation charts.
#[derive(Debug, Clone, Serialize)]
pub struct StudentProgress {
    pub student_id: UserId,
    pub total: i64,
    pub signed: i64,
    pub kinds: Vec<KindProgress>,
}

impl LogbookService {
    pub async fn student_progress(&self, ctx: &RequestContext, student_id: &UserId) -> Result<StudentProgress> {
        let resource = self.resource_for(ctx, student_id).await?;
        authorize(Action::ViewStudent, ctx, &resource)?;

        let mut kinds = Vec::with_capacity(LogKind::ALL.len());
        for kind in LogKind::ALL {
            let mut by_status: BTreeMap<EntryStatus, i64> =
                EntryStatus::ALL.into_iter().map(|s| (s, 0)).collect();
            for (status, count) in self.store.status_counts(kind, student_id).await? {
                by_status.insert(status, count);
            }
            kinds.push(KindProgress {
                kind,
                label: kind.label(),
                total: by_status.values().sum(),
                by_status,
            });
        }

        Ok(StudentProgress {
            student_id: student_id.clone(),
            total: kinds.iter().map(|k| k.total).sum(),
            signed: kinds
                .iter()
                .map(|k| k.by_status.get(&EntryStatus::Signed).copied().unwrap_or(0))
                .sum(),
            kinds,
        })
    }
}
