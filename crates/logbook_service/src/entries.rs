use serde::Deserialize;
use uuid::Uuid;

use logbook_core::authz::{authorize, Action, Resource};
use logbook_core::catalog::LogKind;
use logbook_core::lifecycle::Transition;
use logbook_core::models::{EntryFilter, EntryStatus, EntryUpdate, LogEntry, NewEntry, Role, UserId};
use logbook_core::validation::{EntryCandidate, Stage};
use logbook_core::{RequestContext, Result};

use crate::LogbookService;

/// Narrowing requested by the caller when listing one kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub student_id: Option<UserId>,
    pub status: Option<EntryStatus>,
}

impl LogbookService {
    pub async fn create_entry(&self, ctx: &RequestContext, kind: LogKind, input: NewEntry) -> Result<LogEntry> {
        authorize(Action::CreateEntry, ctx, &Resource::owned_by(&ctx.user_id, false))?;

        let stage = if input.submit { Stage::Submission } else { Stage::Draft };
        self.validator.validate(&EntryCandidate {
            kind,
            category: &input.category,
            fields: &input.fields,
            stage,
        })?;

        let entry = LogEntry::new(kind, ctx.user_id.clone(), input);
        self.store.insert_entry(&entry).await?;

        tracing::info!(kind = %kind, id = %entry.id, actor = %ctx.user_id, status = %entry.status, "entry created");
        Ok(entry)
    }

    pub async fn get_entry(&self, ctx: &RequestContext, kind: LogKind, id: Uuid) -> Result<LogEntry> {
        let entry = self.load_entry(kind, id).await?;
        let resource = self.resource_for(ctx, &entry.student_id).await?;
        authorize(Action::ViewEntry, ctx, &resource)?;
        Ok(entry)
    }

    /// Students see their own entries, faculty their assigned students'
    /// entries and the HOD everything. Newest first.
    pub async fn list_entries(&self, ctx: &RequestContext, kind: LogKind, query: ListQuery) -> Result<Vec<LogEntry>> {
        let students = match (&query.student_id, ctx.role) {
            (Some(student), _) => {
                let resource = self.resource_for(ctx, student).await?;
                authorize(Action::ViewStudent, ctx, &resource)?;
                Some(vec![student.clone()])
            }
            (None, Role::Student) => Some(vec![ctx.user_id.clone()]),
            (None, Role::Faculty) => Some(self.store.assigned_students(&ctx.user_id).await?),
            (None, Role::Hod) => None,
        };

        let filter = EntryFilter {
            students,
            status: query.status,
        };
        self.store.list_entries(kind, &filter).await
    }

    /// Merges `update` into a DRAFT or NEEDS_REVISION entry.
    pub async fn update_entry(
        &self,
        ctx: &RequestContext,
        kind: LogKind,
        id: Uuid,
        update: EntryUpdate,
    ) -> Result<LogEntry> {
        let entry = self.load_entry(kind, id).await?;
        authorize(Action::EditEntry, ctx, &Resource::owned_by(&entry.student_id, false))?;
        entry.status.ensure_editable()?;

        let observed = entry.status;
        let mut updated = entry;
        updated.merge(update);
        self.validator.validate(&EntryCandidate {
            kind,
            category: &updated.category,
            fields: &updated.fields,
            stage: Stage::Draft,
        })?;

        if !self.store.update_entry(&updated, observed).await? {
            return Err(self.lost_race(kind, id).await);
        }

        tracing::info!(kind = %kind, id = %id, actor = %ctx.user_id, "entry updated");
        self.load_entry(kind, id).await
    }

    pub async fn delete_entry(&self, ctx: &RequestContext, kind: LogKind, id: Uuid) -> Result<()> {
        let entry = self.load_entry(kind, id).await?;
        authorize(Action::DeleteEntry, ctx, &Resource::owned_by(&entry.student_id, false))?;
        entry.status.ensure_deletable()?;

        if !self.store.delete_entry(kind, id, entry.status).await? {
            return Err(self.lost_race(kind, id).await);
        }

        tracing::info!(kind = %kind, id = %id, actor = %ctx.user_id, "entry deleted");
        Ok(())
    }

    /// DRAFT or NEEDS_REVISION to SUBMITTED. Required fields must be filled.
    pub async fn submit_entry(&self, ctx: &RequestContext, kind: LogKind, id: Uuid) -> Result<LogEntry> {
        let entry = self.load_entry(kind, id).await?;
        authorize(Action::SubmitEntry, ctx, &Resource::owned_by(&entry.student_id, false))?;
        let target = entry.status.apply(Transition::Submit)?;

        self.validator.validate(&EntryCandidate {
            kind,
            category: &entry.category,
            fields: &entry.fields,
            stage: Stage::Submission,
        })?;

        let submitted = match self.store.transition(kind, id, entry.status, target, None).await? {
            Some(submitted) => submitted,
            None => return Err(self.lost_race(kind, id).await),
        };

        tracing::info!(kind = %kind, id = %id, actor = %ctx.user_id, from = %entry.status, "entry submitted");
        Ok(submitted)
    }
}
