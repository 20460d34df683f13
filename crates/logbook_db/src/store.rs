use async_trait::async_trait;
use uuid::Uuid;

use logbook_core::catalog::LogKind;
use logbook_core::models::{
    Batch, DigitalSignature, EntryFilter, EntryStatus, LogEntry, ReviewStamp, User, UserId,
};
use logbook_core::Result;

/// Persistence seam for the logbook.
///
/// Every status-changing method takes the status the caller observed and
/// only writes when the row still carries it. A `false` / `None` result
/// means the precondition no longer holds (or the row is gone); callers
/// re-read to tell the two apart.
#[async_trait]
pub trait LogbookStore: Send + Sync {
    // ---------------------------------------------------------------
    // Users (identity shadow)
    // ---------------------------------------------------------------
    async fn upsert_user(&self, user: &User) -> Result<()>;

    async fn delete_user(&self, id: &UserId) -> Result<bool>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    // ---------------------------------------------------------------
    // Batches and reviewer assignments
    // ---------------------------------------------------------------
    async fn create_batch(&self, batch: &Batch) -> Result<()>;

    async fn list_batches(&self) -> Result<Vec<Batch>>;

    async fn assign_batch(&self, faculty_id: &UserId, batch_id: Uuid) -> Result<()>;

    async fn assign_student(&self, faculty_id: &UserId, student_id: &UserId) -> Result<()>;

    /// Students in the faculty member's batches plus directly assigned students.
    async fn assigned_students(&self, faculty_id: &UserId) -> Result<Vec<UserId>>;

    async fn is_assigned(&self, faculty_id: &UserId, student_id: &UserId) -> Result<bool>;

    // ---------------------------------------------------------------
    // Entries
    // ---------------------------------------------------------------
    async fn insert_entry(&self, entry: &LogEntry) -> Result<()>;

    async fn get_entry(&self, kind: LogKind, id: Uuid) -> Result<Option<LogEntry>>;

    /// Newest first.
    async fn list_entries(&self, kind: LogKind, filter: &EntryFilter) -> Result<Vec<LogEntry>>;

    /// Persists `category` and `fields` of `entry` when the stored row is
    /// still in `expected`.
    async fn update_entry(&self, entry: &LogEntry, expected: EntryStatus) -> Result<bool>;

    async fn delete_entry(&self, kind: LogKind, id: Uuid, expected: EntryStatus) -> Result<bool>;

    /// Moves the entry from `from` to `to`. A review stamp records the
    /// reviewer's remark and review time.
    async fn transition(
        &self,
        kind: LogKind,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
        stamp: Option<&ReviewStamp>,
    ) -> Result<Option<LogEntry>>;

    /// SUBMITTED → SIGNED and the signature row, atomically.
    async fn sign_entry(
        &self,
        kind: LogKind,
        id: Uuid,
        signer_id: &UserId,
    ) -> Result<Option<(LogEntry, DigitalSignature)>>;

    async fn signatures_for(&self, kind: LogKind, id: Uuid) -> Result<Vec<DigitalSignature>>;

    // ---------------------------------------------------------------
    // Aggregates
    // ---------------------------------------------------------------
    /// `students = None` counts across every student.
    async fn count_by_status(
        &self,
        kind: LogKind,
        status: EntryStatus,
        students: Option<&[UserId]>,
    ) -> Result<i64>;

    async fn status_counts(&self, kind: LogKind, student_id: &UserId) -> Result<Vec<(EntryStatus, i64)>>;
}
