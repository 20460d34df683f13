use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use time::OffsetDateTime;
use uuid::Uuid;

use logbook_core::catalog::LogKind;
use logbook_core::models::{
    Batch, DigitalSignature, EntryFilter, EntryStatus, LogEntry, ReviewStamp, Role, User, UserId,
};
use logbook_core::{LogbookError, Result};

use crate::store::LogbookStore;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    batches: HashMap<Uuid, Batch>,
    batch_assignments: HashSet<(UserId, Uuid)>,
    student_assignments: HashSet<(UserId, UserId)>,
    entries: HashMap<(LogKind, Uuid), LogEntry>,
    signatures: Vec<DigitalSignature>,
}

impl State {
    fn assigned_students(&self, faculty_id: &UserId) -> BTreeSet<UserId> {
        let batches: HashSet<Uuid> = self
            .batch_assignments
            .iter()
            .filter(|(f, _)| f == faculty_id)
            .map(|(_, b)| *b)
            .collect();

        let via_batch = self
            .users
            .values()
            .filter(|u| u.role == Role::Student)
            .filter(|u| u.batch_id.map_or(false, |b| batches.contains(&b)))
            .map(|u| u.id.clone());

        let direct = self
            .student_assignments
            .iter()
            .filter(|(f, _)| f == faculty_id)
            .map(|(_, s)| s.clone());

        via_batch.chain(direct).collect()
    }
}

/// Process-local store with the same preconditions as the PostgreSQL
/// repository. Every method takes the lock once, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogbookStore for MemoryStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write();
        let created_at = state.users.get(&user.id).map(|u| u.created_at);
        let mut user = user.clone();
        if let Some(created_at) = created_at {
            user.created_at = created_at;
        }
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        Ok(self.state.write().users.remove(id).is_some())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.state.read().users.get(id).cloned())
    }

    async fn create_batch(&self, batch: &Batch) -> Result<()> {
        let mut state = self.state.write();
        if state.batches.values().any(|b| b.name == batch.name) {
            return Err(LogbookError::conflict(format!("batch '{}' already exists", batch.name)));
        }
        state.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn list_batches(&self) -> Result<Vec<Batch>> {
        let mut batches: Vec<Batch> = self.state.read().batches.values().cloned().collect();
        batches.sort_by(|a, b| {
            b.admission_year
                .cmp(&a.admission_year)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(batches)
    }

    async fn assign_batch(&self, faculty_id: &UserId, batch_id: Uuid) -> Result<()> {
        let mut state = self.state.write();
        if !state.batches.contains_key(&batch_id) {
            return Err(LogbookError::not_found(format!("batch {}", batch_id)));
        }
        state.batch_assignments.insert((faculty_id.clone(), batch_id));
        Ok(())
    }

    async fn assign_student(&self, faculty_id: &UserId, student_id: &UserId) -> Result<()> {
        self.state
            .write()
            .student_assignments
            .insert((faculty_id.clone(), student_id.clone()));
        Ok(())
    }

    async fn assigned_students(&self, faculty_id: &UserId) -> Result<Vec<UserId>> {
        Ok(self.state.read().assigned_students(faculty_id).into_iter().collect())
    }

    async fn is_assigned(&self, faculty_id: &UserId, student_id: &UserId) -> Result<bool> {
        Ok(self.state.read().assigned_students(faculty_id).contains(student_id))
    }

    async fn insert_entry(&self, entry: &LogEntry) -> Result<()> {
        let mut state = self.state.write();
        let key = (entry.kind, entry.id);
        if state.entries.contains_key(&key) {
            return Err(LogbookError::Database(format!("duplicate entry id {}", entry.id)));
        }
        state.entries.insert(key, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, kind: LogKind, id: Uuid) -> Result<Option<LogEntry>> {
        Ok(self.state.read().entries.get(&(kind, id)).cloned())
    }

    async fn list_entries(&self, kind: LogKind, filter: &EntryFilter) -> Result<Vec<LogEntry>> {
        let state = self.state.read();
        let mut entries: Vec<LogEntry> = state
            .entries
            .values()
            .filter(|e| e.kind == kind)
            .filter(|e| {
                filter
                    .students
                    .as_ref()
                    .map_or(true, |students| students.contains(&e.student_id))
            })
            .filter(|e| filter.status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn update_entry(&self, entry: &LogEntry, expected: EntryStatus) -> Result<bool> {
        let mut state = self.state.write();
        let Some(stored) = state.entries.get_mut(&(entry.kind, entry.id)) else {
            return Ok(false);
        };
        if stored.status != expected || stored.student_id != entry.student_id {
            return Ok(false);
        }
        stored.category = entry.category.clone();
        stored.fields = entry.fields.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete_entry(&self, kind: LogKind, id: Uuid, expected: EntryStatus) -> Result<bool> {
        let mut state = self.state.write();
        match state.entries.get(&(kind, id)) {
            Some(e) if e.status == expected => {
                state.entries.remove(&(kind, id));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn transition(
        &self,
        kind: LogKind,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
        stamp: Option<&ReviewStamp>,
    ) -> Result<Option<LogEntry>> {
        let mut state = self.state.write();
        let Some(entry) = state.entries.get_mut(&(kind, id)) else {
            return Ok(None);
        };
        if entry.status != from {
            return Ok(None);
        }

        let now = OffsetDateTime::now_utc();
        entry.status = to;
        entry.updated_at = now;
        if to == EntryStatus::Submitted {
            entry.submitted_at = Some(now);
        }
        if let Some(stamp) = stamp {
            entry.remark = stamp.remark.clone();
            entry.reviewed_at = Some(now);
        }
        Ok(Some(entry.clone()))
    }

    async fn sign_entry(
        &self,
        kind: LogKind,
        id: Uuid,
        signer_id: &UserId,
    ) -> Result<Option<(LogEntry, DigitalSignature)>> {
        let mut state = self.state.write();
        match state.entries.get(&(kind, id)) {
            Some(entry) if entry.status == EntryStatus::Submitted => {}
            _ => return Ok(None),
        }
        if state
            .signatures
            .iter()
            .any(|s| s.entity_type == kind && s.entity_id == id)
        {
            return Err(LogbookError::conflict("entry already carries a signature"));
        }

        let Some(entry) = state.entries.get_mut(&(kind, id)) else {
            return Ok(None);
        };

        let signature = DigitalSignature::new(signer_id.clone(), kind, id);
        entry.status = EntryStatus::Signed;
        entry.signer_id = Some(signer_id.clone());
        entry.reviewed_at = Some(signature.signed_at);
        entry.updated_at = signature.signed_at;
        let entry = entry.clone();

        state.signatures.push(signature.clone());
        Ok(Some((entry, signature)))
    }

    async fn signatures_for(&self, kind: LogKind, id: Uuid) -> Result<Vec<DigitalSignature>> {
        Ok(self
            .state
            .read()
            .signatures
            .iter()
            .filter(|s| s.entity_type == kind && s.entity_id == id)
            .cloned()
            .collect())
    }

    async fn count_by_status(
        &self,
        kind: LogKind,
        status: EntryStatus,
        students: Option<&[UserId]>,
    ) -> Result<i64> {
        let state = self.state.read();
        let count = state
            .entries
            .values()
            .filter(|e| e.kind == kind && e.status == status)
            .filter(|e| students.map_or(true, |s| s.contains(&e.student_id)))
            .count();
        Ok(count as i64)
    }

    async fn status_counts(&self, kind: LogKind, student_id: &UserId) -> Result<Vec<(EntryStatus, i64)>> {
        let state = self.state.read();
        let mut counts: HashMap<EntryStatus, i64> = HashMap::new();
        for entry in state
            .entries
            .values()
            .filter(|e| e.kind == kind && &e.student_id == student_id)
        {
            *counts.entry(entry.status).or_default() += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort();
        Ok(counts)
    }
}
