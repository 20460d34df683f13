use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use logbook_core::catalog::LogKind;
use logbook_core::models::{DigitalSignature, EntryFields, LogEntry, Role, User, UserId};
use logbook_core::{LogbookError, Result};

/// Column list shared by every log table.
pub const ENTRY_COLUMNS: &str = "id, student_id, category, fields, status, remark, signer_id, \
     created_at, updated_at, submitted_at, reviewed_at";

#[derive(Debug, FromRow)]
pub struct EntryRow {
    pub id: Uuid,
    pub student_id: String,
    pub category: String,
    pub fields: Json<EntryFields>,
    pub status: String,
    pub remark: Option<String>,
    pub signer_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub submitted_at: Option<OffsetDateTime>,
    pub reviewed_at: Option<OffsetDateTime>,
}

impl EntryRow {
    pub fn into_entry(self, kind: LogKind) -> Result<LogEntry> {
        Ok(LogEntry {
            id: self.id,
            kind,
            student_id: UserId::new(self.student_id),
            category: self.category,
            fields: self.fields.0,
            status: self.status.parse().map_err(LogbookError::Database)?,
            remark: self.remark,
            signer_id: self.signer_id.map(UserId::new),
            created_at: self.created_at,
            updated_at: self.updated_at,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub role: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub batch_id: Option<Uuid>,
    pub semester: Option<i32>,
    pub banned: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = LogbookError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: UserId::new(row.id),
            role: row.role.parse::<Role>().map_err(LogbookError::Database)?,
            email: row.email,
            full_name: row.full_name,
            batch_id: row.batch_id,
            semester: row.semester,
            banned: row.banned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SignatureRow {
    pub id: Uuid,
    pub signer_id: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub signed_at: OffsetDateTime,
}

impl TryFrom<SignatureRow> for DigitalSignature {
    type Error = LogbookError;

    fn try_from(row: SignatureRow) -> Result<Self> {
        Ok(DigitalSignature {
            id: row.id,
            signer_id: UserId::new(row.signer_id),
            entity_type: row.entity_type.parse().map_err(LogbookError::Database)?,
            entity_id: row.entity_id,
            signed_at: row.signed_at,
        })
    }
}
