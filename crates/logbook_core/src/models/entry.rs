use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::LogKind;
use crate::models::user::UserId;

/// Free-text clinical fields of an entry, keyed by field name.
pub type EntryFields = Map<String, Value>;

// ---------------------------------------------------------------------------
// Review status
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Draft,
    Submitted,
    Signed,
    Rejected,
    NeedsRevision,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 5] = [
        EntryStatus::Draft,
        EntryStatus::Submitted,
        EntryStatus::Signed,
        EntryStatus::Rejected,
        EntryStatus::NeedsRevision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "DRAFT",
            EntryStatus::Submitted => "SUBMITTED",
            EntryStatus::Signed => "SIGNED",
            EntryStatus::Rejected => "REJECTED",
            EntryStatus::NeedsRevision => "NEEDS_REVISION",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown entry status '{}'", s))
    }
}

// ---------------------------------------------------------------------------
// The entry itself (one row of a log table)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub kind: LogKind,
    pub student_id: UserId,
    pub category: String,
    pub fields: EntryFields,
    pub status: EntryStatus,
    pub remark: Option<String>,
    pub signer_id: Option<UserId>,

    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601::option")]
    pub submitted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::iso8601::option")]
    pub reviewed_at: Option<OffsetDateTime>,
}

impl LogEntry {
    /// Builds a fresh entry owned by `student_id`. Entries created with
    /// `submit = true` skip the draft stage.
    pub fn new(kind: LogKind, student_id: UserId, input: NewEntry) -> Self {
        let now = OffsetDateTime::now_utc();
        let (status, submitted_at) = if input.submit {
            (EntryStatus::Submitted, Some(now))
        } else {
            (EntryStatus::Draft, None)
        };

        Self {
            id: Uuid::new_v4(),
            kind,
            student_id,
            category: input.category,
            fields: input.fields,
            status,
            remark: None,
            signer_id: None,
            created_at: now,
            updated_at: now,
            submitted_at,
            reviewed_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.student_id == user_id
    }

    /// Merges a partial update into this entry. A `null` value removes the field.
    pub fn merge(&mut self, update: EntryUpdate) {
        if let Some(category) = update.category {
            self.category = category;
        }
        for (name, value) in update.fields {
            if value.is_null() {
                self.fields.remove(&name);
            } else {
                self.fields.insert(name, value);
            }
        }
    }
}

/// Payload for creating an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub category: String,
    #[serde(default)]
    pub fields: EntryFields,
    /// Submit immediately instead of saving a draft.
    #[serde(default)]
    pub submit: bool,
}

/// Partial update of a draft or revision-requested entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub category: Option<String>,
    #[serde(default)]
    pub fields: EntryFields,
}

/// Narrowing applied when listing entries of one kind.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// `None` means unscoped (HOD); `Some` restricts to these owners.
    pub students: Option<Vec<UserId>>,
    pub status: Option<EntryStatus>,
}

/// What a reviewer stamps onto an entry when closing a review.
#[derive(Debug, Clone)]
pub struct ReviewStamp {
    pub reviewer: UserId,
    pub remark: Option<String>,
}
