use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use logbook_core::catalog::LogKind;
use logbook_core::models::{
    Batch, DigitalSignature, EntryFilter, EntryStatus, LogEntry, ReviewStamp, User, UserId,
};
use logbook_core::{LogbookError, Result};

use crate::entities::{EntryRow, SignatureRow, UserRow, ENTRY_COLUMNS};
use crate::store::LogbookStore;

fn db_err(e: sqlx::Error) -> LogbookError {
    LogbookError::Database(e.to_string())
}

fn ids(users: &[UserId]) -> Vec<String> {
    users.iter().map(|u| u.as_str().to_string()).collect()
}

/// PostgreSQL-backed store. Table names come from [`LogKind::table`] only.
#[derive(Clone)]
pub struct LogbookRepository {
    pool: PgPool,
}

impl LogbookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LogbookStore for LogbookRepository {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users
            (id, role, email, full_name, batch_id, semester, banned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                role = EXCLUDED.role,
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                batch_id = EXCLUDED.batch_id,
                semester = EXCLUDED.semester,
                banned = EXCLUDED.banned,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(user.role.as_str())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.batch_id)
        .bind(user.semester)
        .bind(user.banned)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, role, email, full_name, batch_id, semester, banned, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(User::try_from)
        .transpose()
    }

    async fn create_batch(&self, batch: &Batch) -> Result<()> {
        sqlx::query("INSERT INTO batches (id, name, admission_year) VALUES ($1, $2, $3)")
            .bind(batch.id)
            .bind(&batch.name)
            .bind(batch.admission_year)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    LogbookError::conflict(format!("batch '{}' already exists", batch.name))
                }
                other => db_err(other),
            })?;
        Ok(())
    }

    async fn list_batches(&self) -> Result<Vec<Batch>> {
        let rows = sqlx::query_as::<_, (Uuid, String, i32)>(
            "SELECT id, name, admission_year FROM batches ORDER BY admission_year DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, admission_year)| Batch { id, name, admission_year })
            .collect())
    }

    async fn assign_batch(&self, faculty_id: &UserId, batch_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO faculty_batch_assignments (faculty_id, batch_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(faculty_id.as_str())
        .bind(batch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                LogbookError::not_found(format!("batch {}", batch_id))
            }
            other => db_err(other),
        })?;
        Ok(())
    }

    async fn assign_student(&self, faculty_id: &UserId, student_id: &UserId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO faculty_student_assignments (faculty_id, student_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(faculty_id.as_str())
        .bind(student_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn assigned_students(&self, faculty_id: &UserId) -> Result<Vec<UserId>> {
        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.id
            FROM users u
            JOIN faculty_batch_assignments fba ON fba.batch_id = u.batch_id
            WHERE fba.faculty_id = $1 AND u.role = 'STUDENT'
            UNION
            SELECT student_id
            FROM faculty_student_assignments
            WHERE faculty_id = $1
            ORDER BY 1
            "#,
        )
        .bind(faculty_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(UserId::new).collect())
    }

    async fn is_assigned(&self, faculty_id: &UserId, student_id: &UserId) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM users u
                JOIN faculty_batch_assignments fba ON fba.batch_id = u.batch_id
                WHERE fba.faculty_id = $1 AND u.id = $2 AND u.role = 'STUDENT'
            ) OR EXISTS (
                SELECT 1
                FROM faculty_student_assignments
                WHERE faculty_id = $1 AND student_id = $2
            )
            "#,
        )
        .bind(faculty_id.as_str())
        .bind(student_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn insert_entry(&self, entry: &LogEntry) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            entry.kind.table(),
            ENTRY_COLUMNS
        );

        sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.student_id.as_str())
            .bind(&entry.category)
            .bind(Json(&entry.fields))
            .bind(entry.status.as_str())
            .bind(&entry.remark)
            .bind(entry.signer_id.as_ref().map(UserId::as_str))
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .bind(entry.submitted_at)
            .bind(entry.reviewed_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn get_entry(&self, kind: LogKind, id: Uuid) -> Result<Option<LogEntry>> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", ENTRY_COLUMNS, kind.table());

        sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row.into_entry(kind))
            .transpose()
    }

    async fn list_entries(&self, kind: LogKind, filter: &EntryFilter) -> Result<Vec<LogEntry>> {
        let sql = format!(
            r#"
            SELECT {} FROM {}
            WHERE ($1::text[] IS NULL OR student_id = ANY($1))
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
            ENTRY_COLUMNS,
            kind.table()
        );

        let rows = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(filter.students.as_deref().map(ids))
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(|row| row.into_entry(kind)).collect()
    }

    async fn update_entry(&self, entry: &LogEntry, expected: EntryStatus) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE {}
            SET category = $3, fields = $4, updated_at = $5
            WHERE id = $1 AND student_id = $2 AND status = $6
            "#,
            entry.kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.student_id.as_str())
            .bind(&entry.category)
            .bind(Json(&entry.fields))
            .bind(OffsetDateTime::now_utc())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_entry(&self, kind: LogKind, id: Uuid, expected: EntryStatus) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND status = $2", kind.table());

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn transition(
        &self,
        kind: LogKind,
        id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
        stamp: Option<&ReviewStamp>,
    ) -> Result<Option<LogEntry>> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            r#"
            UPDATE {}
            SET status = $3,
                updated_at = $4,
                submitted_at = CASE WHEN $3 = 'SUBMITTED' THEN $4 ELSE submitted_at END,
                remark = CASE WHEN $5 THEN $6 ELSE remark END,
                reviewed_at = CASE WHEN $5 THEN $4 ELSE reviewed_at END
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            kind.table(),
            ENTRY_COLUMNS
        );

        sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(now)
            .bind(stamp.is_some())
            .bind(stamp.and_then(|s| s.remark.clone()))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row.into_entry(kind))
            .transpose()
    }

    async fn sign_entry(
        &self,
        kind: LogKind,
        id: Uuid,
        signer_id: &UserId,
    ) -> Result<Option<(LogEntry, DigitalSignature)>> {
        // Status update and audit row commit together or not at all.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let signature = DigitalSignature::new(signer_id.clone(), kind, id);
        let sql = format!(
            r#"
            UPDATE {}
            SET status = 'SIGNED', signer_id = $2, reviewed_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'SUBMITTED'
            RETURNING {}
            "#,
            kind.table(),
            ENTRY_COLUMNS
        );

        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(id)
            .bind(signer_id.as_str())
            .bind(signature.signed_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(db_err)?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO digital_signatures (id, signer_id, entity_type, entity_id, signed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(signature.id)
        .bind(signature.signer_id.as_str())
        .bind(kind.slug())
        .bind(signature.entity_id)
        .bind(signature.signed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                LogbookError::conflict("entry already carries a signature")
            }
            other => db_err(other),
        })?;

        tx.commit().await.map_err(db_err)?;

        Ok(Some((row.into_entry(kind)?, signature)))
    }

    async fn signatures_for(&self, kind: LogKind, id: Uuid) -> Result<Vec<DigitalSignature>> {
        let rows = sqlx::query_as::<_, SignatureRow>(
            r#"
            SELECT id, signer_id, entity_type, entity_id, signed_at
            FROM digital_signatures
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY signed_at
            "#,
        )
        .bind(kind.slug())
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DigitalSignature::try_from).collect()
    }

    async fn count_by_status(
        &self,
        kind: LogKind,
        status: EntryStatus,
        students: Option<&[UserId]>,
    ) -> Result<i64> {
        let sql = format!(
            r#"
            SELECT COUNT(*) FROM {}
            WHERE status = $1 AND ($2::text[] IS NULL OR student_id = ANY($2))
            "#,
            kind.table()
        );

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(status.as_str())
            .bind(students.map(ids))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn status_counts(&self, kind: LogKind, student_id: &UserId) -> Result<Vec<(EntryStatus, i64)>> {
        let sql = format!(
            "SELECT status, COUNT(*) FROM {} WHERE student_id = $1 GROUP BY status",
            kind.table()
        );

        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(student_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .map(|(status, count)| {
                status
                    .parse::<EntryStatus>()
                    .map(|s| (s, count))
                    .map_err(LogbookError::Database)
            })
            .collect()
    }
}
