//! Keeps the local user shadow in step with the identity provider.
//!
//! Webhook payloads look like
//! `{"type": "user.updated", "data": {"id": "...", "public_metadata": {...}}}`.
//! Signature verification happens at the HTTP edge before these types
//! are deserialized.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use logbook_core::models::{Role, User, UserId};
use logbook_core::validation::FieldIssue;
use logbook_core::{LogbookError, Result};

use crate::LogbookService;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub public_metadata: PublicMetadata,
    #[serde(default)]
    pub banned: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

/// Provider-side metadata the department controls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicMetadata {
    pub role: Option<String>,
    pub batch_id: Option<Uuid>,
    pub semester: Option<i32>,
    #[serde(default)]
    pub banned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum IdentityOutcome {
    Upserted(UserId),
    Deleted(UserId),
    Ignored(String),
}

impl IdentityUser {
    fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    fn role(&self) -> Result<Option<Role>> {
        match self.public_metadata.role.as_deref() {
            None => Ok(None),
            Some(raw) => raw.parse::<Role>().map(Some).map_err(|message| {
                LogbookError::Validation(vec![FieldIssue::new("public_metadata.role", message)])
            }),
        }
    }
}

impl LogbookService {
    pub async fn apply_identity_event(&self, event: IdentityEvent) -> Result<IdentityOutcome> {
        let user_id = UserId::new(event.data.id.clone());

        match event.event_type.as_str() {
            "user.created" | "user.updated" => {
                let existing = self.store.get_user(&user_id).await?;
                let data = &event.data;
                let now = OffsetDateTime::now_utc();

                // Missing role metadata keeps the stored role, or STUDENT for a new user.
                let role = data
                    .role()?
                    .or(existing.as_ref().map(|u| u.role))
                    .unwrap_or(Role::Student);

                let user = User {
                    id: user_id.clone(),
                    role,
                    email: data.email_addresses.first().map(|e| e.email_address.clone()),
                    full_name: data.full_name(),
                    batch_id: data.public_metadata.batch_id,
                    semester: data.public_metadata.semester,
                    banned: data.banned || data.public_metadata.banned,
                    created_at: existing.map(|u| u.created_at).unwrap_or(now),
                    updated_at: now,
                };
                self.store.upsert_user(&user).await?;

                tracing::info!(user = %user_id, role = %role, event = %event.event_type, "identity synced");
                Ok(IdentityOutcome::Upserted(user_id))
            }
            "user.deleted" => {
                let removed = self.store.delete_user(&user_id).await?;
                tracing::info!(user = %user_id, removed, "identity removed");
                Ok(IdentityOutcome::Deleted(user_id))
            }
            other => {
                tracing::debug!(event = other, "ignoring identity event");
                Ok(IdentityOutcome::Ignored(other.to_string()))
            }
        }
    }
}
