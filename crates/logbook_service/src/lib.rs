pub mod entries;
pub mod export;
pub mod identity;
pub mod progress;
pub mod review;

use std::sync::Arc;
use uuid::Uuid;

use logbook_core::authz::Resource;
use logbook_core::catalog::LogKind;
use logbook_core::models::{LogEntry, Role, UserId};
use logbook_core::validation::FieldValidator;
use logbook_core::{LogbookError, RequestContext, Result};
use logbook_db::LogbookStore;

pub use entries::ListQuery;
pub use export::ExportSummary;
pub use identity::{IdentityEvent, IdentityOutcome};
pub use progress::{KindProgress, StudentProgress};
pub use review::{BulkFailure, BulkSignReport, PendingSummary, RejectRequest, SignOutcome};

#[derive(Clone)]
pub struct LogbookService {
    pub store: Arc<dyn LogbookStore>,
    validator: Arc<FieldValidator>,
}

impl LogbookService {
    pub fn new(store: Arc<dyn LogbookStore>) -> Self {
        Self {
            store,
            validator: Arc::new(logbook_core::standard_validator()),
        }
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    async fn load_entry(&self, kind: LogKind, id: Uuid) -> Result<LogEntry> {
        self.store
            .get_entry(kind, id)
            .await?
            .ok_or_else(|| LogbookError::not_found(format!("{} {}", kind, id)))
    }

    /// Whether the caller reviews `owner`. Only meaningful for faculty.
    async fn reviews(&self, ctx: &RequestContext, owner: &UserId) -> Result<bool> {
        match ctx.role {
            Role::Faculty => self.store.is_assigned(&ctx.user_id, owner).await,
            Role::Student | Role::Hod => Ok(false),
        }
    }

    async fn resource_for<'a>(&self, ctx: &RequestContext, owner: &'a UserId) -> Result<Resource<'a>> {
        Ok(Resource::owned_by(owner, self.reviews(ctx, owner).await?))
    }

    /// Called when a guarded write matched no row: the entry either
    /// vanished or moved on since it was read.
    async fn lost_race(&self, kind: LogKind, id: Uuid) -> LogbookError {
        match self.store.get_entry(kind, id).await {
            Ok(Some(current)) => LogbookError::conflict(format!(
                "entry changed concurrently and is now {}",
                current.status
            )),
            Ok(None) => LogbookError::not_found(format!("{} {}", kind, id)),
            Err(e) => e,
        }
    }
}
