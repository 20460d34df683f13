use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use logbook_core::authz::{authorize, Action, Resource};
use logbook_core::catalog::LogKind;
use logbook_core::lifecycle::{RejectOutcome, Transition};
use logbook_core::models::{DigitalSignature, EntryStatus, LogEntry, ReviewStamp, Role};
use logbook_core::validation::FieldIssue;
use logbook_core::{LogbookError, RequestContext, Result};

use crate::LogbookService;

#[derive(Debug, Clone, Serialize)]
pub struct SignOutcome {
    pub entry: LogEntry,
    pub signature: DigitalSignature,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    pub remark: String,
    #[serde(default = "default_outcome")]
    pub outcome: RejectOutcome,
}

fn default_outcome() -> RejectOutcome {
    RejectOutcome::NeedsRevision
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkSignReport {
    pub signed: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingSummary {
    pub total: i64,
    pub by_kind: BTreeMap<LogKind, i64>,
}

impl LogbookService {
    /// SUBMITTED to SIGNED plus exactly one signature record.
    pub async fn sign_entry(&self, ctx: &RequestContext, kind: LogKind, id: Uuid) -> Result<SignOutcome> {
        let entry = self.load_entry(kind, id).await?;
        let resource = self.resource_for(ctx, &entry.student_id).await?;
        authorize(Action::ReviewEntry, ctx, &resource)?;
        entry.status.apply(Transition::Sign)?;

        let (entry, signature) = match self.store.sign_entry(kind, id, &ctx.user_id).await? {
            Some(signed) => signed,
            None => return Err(self.lost_race(kind, id).await),
        };

        tracing::info!(
            kind = %kind,
            id = %id,
            actor = %ctx.user_id,
            signature = %signature.id,
            "entry signed"
        );
        Ok(SignOutcome { entry, signature })
    }

    /// Closes a review without signing. The remark must not be blank.
    pub async fn reject_entry(
        &self,
        ctx: &RequestContext,
        kind: LogKind,
        id: Uuid,
        request: RejectRequest,
    ) -> Result<LogEntry> {
        let entry = self.load_entry(kind, id).await?;
        let resource = self.resource_for(ctx, &entry.student_id).await?;
        authorize(Action::ReviewEntry, ctx, &resource)?;

        let remark = request.remark.trim();
        if remark.is_empty() {
            return Err(LogbookError::Validation(vec![FieldIssue::new(
                "remark",
                "A remark is required when rejecting an entry",
            )]));
        }
        let target = entry.status.apply(request.outcome.transition())?;

        let stamp = ReviewStamp {
            reviewer: ctx.user_id.clone(),
            remark: Some(remark.to_string()),
        };
        let reviewed = match self
            .store
            .transition(kind, id, entry.status, target, Some(&stamp))
            .await?
        {
            Some(reviewed) => reviewed,
            None => return Err(self.lost_race(kind, id).await),
        };

        tracing::info!(kind = %kind, id = %id, actor = %ctx.user_id, to = %target, "entry rejected");
        Ok(reviewed)
    }

    /// Signs each id independently. One failure does not undo the others.
    pub async fn bulk_sign(&self, ctx: &RequestContext, kind: LogKind, ids: &[Uuid]) -> Result<BulkSignReport> {
        if ctx.role == Role::Student {
            authorize(Action::ReviewEntry, ctx, &Resource::unscoped())?;
        }

        let mut report = BulkSignReport::default();
        for &id in ids {
            match self.sign_entry(ctx, kind, id).await {
                Ok(_) => report.signed.push(id),
                Err(e) => {
                    tracing::warn!(kind = %kind, id = %id, error = %e, "bulk sign skipped entry");
                    report.failed.push(BulkFailure { id, error: e.to_string() });
                }
            }
        }

        tracing::info!(
            kind = %kind,
            actor = %ctx.user_id,
            signed = report.signed.len(),
            failed = report.failed.len(),
            "bulk sign finished"
        );
        Ok(report)
    }

    /// SUBMITTED entries awaiting the caller: assigned students for
    /// faculty, every student for the HOD.
    pub async fn pending_counts(&self, ctx: &RequestContext) -> Result<PendingSummary> {
        authorize(Action::CountPending, ctx, &Resource::unscoped())?;

        let students = match ctx.role {
            Role::Faculty => Some(self.store.assigned_students(&ctx.user_id).await?),
            Role::Student | Role::Hod => None,
        };

        let mut summary = PendingSummary::default();
        for kind in LogKind::ALL {
            let count = self
                .store
                .count_by_status(kind, EntryStatus::Submitted, students.as_deref())
                .await?;
            summary.total += count;
            summary.by_kind.insert(kind, count);
        }
        Ok(summary)
    }
}
