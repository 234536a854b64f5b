//! Postgres-backed record store.
//!
//! One table per record kind; references are real foreign keys declared
//! `ON DELETE CASCADE`, so deleting a parent removes its dependents inside the
//! same statement.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (foreign key violation) | `23503` | `Integrity` |
//! | Database (unique violation) | `23505` | `Integrity` |
//! | Database (check constraint violation) | `23514` | `Integrity` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Other | N/A | `Backend` |
//! | Column decode failure | N/A | `Corrupt` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use quizdesk_core::RecordId;
use quizdesk_schema::{Answer, Attempt, Question, Record, ResourceKind, Student, Subject, Testing};

use super::r#trait::{Store, StoreError};

/// Tables, created if missing. `seq` keeps creation order for listings.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS subjects (
    seq   BIGSERIAL NOT NULL,
    id    UUID PRIMARY KEY,
    title VARCHAR(255) NOT NULL CHECK (btrim(title) <> '')
);

CREATE TABLE IF NOT EXISTS students (
    seq  BIGSERIAL NOT NULL,
    id   UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL CHECK (btrim(name) <> '')
);

CREATE TABLE IF NOT EXISTS attempts (
    seq        BIGSERIAL NOT NULL,
    id         UUID PRIMARY KEY,
    student_id UUID NOT NULL REFERENCES students (id) ON DELETE CASCADE,
    subject_id UUID NOT NULL REFERENCES subjects (id) ON DELETE CASCADE,
    date       DATE NOT NULL,
    result     SMALLINT NOT NULL CHECK (result >= 0)
);

CREATE TABLE IF NOT EXISTS questions (
    seq        BIGSERIAL NOT NULL,
    id         UUID PRIMARY KEY,
    text       TEXT NOT NULL CHECK (btrim(text) <> ''),
    subject_id UUID NOT NULL REFERENCES subjects (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS answers (
    seq         BIGSERIAL NOT NULL,
    id          UUID PRIMARY KEY,
    text        TEXT NOT NULL,
    is_correct  BOOLEAN NOT NULL,
    question_id UUID NOT NULL REFERENCES questions (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS testings (
    seq         BIGSERIAL NOT NULL,
    id          UUID PRIMARY KEY,
    attempt_id  UUID NOT NULL REFERENCES attempts (id) ON DELETE CASCADE,
    question_id UUID NOT NULL REFERENCES questions (id) ON DELETE CASCADE,
    answer_id   UUID NOT NULL REFERENCES answers (id) ON DELETE CASCADE
);
"#;

/// Postgres-backed record store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync`; every mutation runs in
/// its own transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("record tables ready");
        Ok(())
    }

    async fn begin(&self, operation: &str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Record>, StoreError> {
        let sql = format!("{} ORDER BY seq ASC", select_sql(kind));
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(|row| decode(kind, row)).collect()
    }

    #[instrument(skip(self, id), fields(id = %id), err)]
    async fn get(&self, kind: ResourceKind, id: RecordId) -> Result<Option<Record>, StoreError> {
        let sql = format!("{} WHERE id = $1", select_sql(kind));
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(|row| decode(kind, row)).transpose()
    }

    #[instrument(skip(self, record), fields(kind = %record.kind(), id = %record.id()), err)]
    async fn insert(&self, record: Record) -> Result<Record, StoreError> {
        let mut tx = self.begin("insert").await?;
        write_insert(&mut tx, &record).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        Ok(record)
    }

    #[instrument(skip(self, record), fields(kind = %record.kind(), id = %record.id()), err)]
    async fn update(&self, record: Record) -> Result<Option<Record>, StoreError> {
        let mut tx = self.begin("update").await?;
        let affected = write_update(&mut tx, &record).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        Ok((affected > 0).then_some(record))
    }

    #[instrument(skip(self, id), fields(id = %id), err)]
    async fn delete(&self, kind: ResourceKind, id: RecordId) -> Result<bool, StoreError> {
        let mut tx = self.begin("delete").await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.plural());
        let affected = sqlx::query(&sql)
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?
            .rows_affected();
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(affected > 0)
    }
}

fn select_sql(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Subject => "SELECT id, title FROM subjects",
        ResourceKind::Student => "SELECT id, name FROM students",
        ResourceKind::Attempt => {
            "SELECT id, student_id, subject_id, date, result FROM attempts"
        }
        ResourceKind::Question => "SELECT id, text, subject_id FROM questions",
        ResourceKind::Answer => "SELECT id, text, is_correct, question_id FROM answers",
        ResourceKind::Testing => {
            "SELECT id, attempt_id, question_id, answer_id FROM testings"
        }
    }
}

fn decode(kind: ResourceKind, row: &PgRow) -> Result<Record, StoreError> {
    let id = key(row, "id")?;
    let record = match kind {
        ResourceKind::Subject => Record::Subject(Subject {
            id,
            title: column(row, "title")?,
        }),
        ResourceKind::Student => Record::Student(Student {
            id,
            name: column(row, "name")?,
        }),
        ResourceKind::Attempt => {
            let result: i16 = column(row, "result")?;
            Record::Attempt(Attempt {
                id,
                student: key(row, "student_id")?,
                subject: key(row, "subject_id")?,
                date: column::<NaiveDate>(row, "date")?,
                result: u16::try_from(result)
                    .map_err(|_| StoreError::Corrupt(format!("negative attempt result {result}")))?,
            })
        }
        ResourceKind::Question => Record::Question(Question {
            id,
            text: column(row, "text")?,
            subject: key(row, "subject_id")?,
        }),
        ResourceKind::Answer => Record::Answer(Answer {
            id,
            text: column(row, "text")?,
            is_correct: column(row, "is_correct")?,
            question: key(row, "question_id")?,
        }),
        ResourceKind::Testing => Record::Testing(Testing {
            id,
            attempt: key(row, "attempt_id")?,
            question: key(row, "question_id")?,
            answer: key(row, "answer_id")?,
        }),
    };
    Ok(record)
}

fn column<T>(row: &PgRow, name: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(name)
        .map_err(|e| StoreError::Corrupt(format!("failed to read {name}: {e}")))
}

fn key(row: &PgRow, name: &str) -> Result<RecordId, StoreError> {
    column::<Uuid>(row, name).map(RecordId::from_uuid)
}

async fn write_insert(
    tx: &mut Transaction<'static, Postgres>,
    record: &Record,
) -> Result<(), StoreError> {
    let query = match record {
        Record::Subject(s) => sqlx::query("INSERT INTO subjects (id, title) VALUES ($1, $2)")
            .bind(s.id.as_uuid())
            .bind(&s.title),
        Record::Student(s) => sqlx::query("INSERT INTO students (id, name) VALUES ($1, $2)")
            .bind(s.id.as_uuid())
            .bind(&s.name),
        Record::Attempt(a) => sqlx::query(
            "INSERT INTO attempts (id, student_id, subject_id, date, result) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(a.id.as_uuid())
        .bind(a.student.as_uuid())
        .bind(a.subject.as_uuid())
        .bind(a.date)
        .bind(small_int(a.result)?),
        Record::Question(q) => {
            sqlx::query("INSERT INTO questions (id, text, subject_id) VALUES ($1, $2, $3)")
                .bind(q.id.as_uuid())
                .bind(&q.text)
                .bind(q.subject.as_uuid())
        }
        Record::Answer(a) => sqlx::query(
            "INSERT INTO answers (id, text, is_correct, question_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(a.id.as_uuid())
        .bind(&a.text)
        .bind(a.is_correct)
        .bind(a.question.as_uuid()),
        Record::Testing(t) => sqlx::query(
            "INSERT INTO testings (id, attempt_id, question_id, answer_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(t.id.as_uuid())
        .bind(t.attempt.as_uuid())
        .bind(t.question.as_uuid())
        .bind(t.answer.as_uuid()),
    };

    query
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;
    Ok(())
}

async fn write_update(
    tx: &mut Transaction<'static, Postgres>,
    record: &Record,
) -> Result<u64, StoreError> {
    let query = match record {
        Record::Subject(s) => sqlx::query("UPDATE subjects SET title = $2 WHERE id = $1")
            .bind(s.id.as_uuid())
            .bind(&s.title),
        Record::Student(s) => sqlx::query("UPDATE students SET name = $2 WHERE id = $1")
            .bind(s.id.as_uuid())
            .bind(&s.name),
        Record::Attempt(a) => sqlx::query(
            "UPDATE attempts SET student_id = $2, subject_id = $3, date = $4, result = $5 WHERE id = $1",
        )
        .bind(a.id.as_uuid())
        .bind(a.student.as_uuid())
        .bind(a.subject.as_uuid())
        .bind(a.date)
        .bind(small_int(a.result)?),
        Record::Question(q) => {
            sqlx::query("UPDATE questions SET text = $2, subject_id = $3 WHERE id = $1")
                .bind(q.id.as_uuid())
                .bind(&q.text)
                .bind(q.subject.as_uuid())
        }
        Record::Answer(a) => sqlx::query(
            "UPDATE answers SET text = $2, is_correct = $3, question_id = $4 WHERE id = $1",
        )
        .bind(a.id.as_uuid())
        .bind(&a.text)
        .bind(a.is_correct)
        .bind(a.question.as_uuid()),
        Record::Testing(t) => sqlx::query(
            "UPDATE testings SET attempt_id = $2, question_id = $3, answer_id = $4 WHERE id = $1",
        )
        .bind(t.id.as_uuid())
        .bind(t.attempt.as_uuid())
        .bind(t.question.as_uuid())
        .bind(t.answer.as_uuid()),
    };

    let done = query
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;
    Ok(done.rows_affected())
}

fn small_int(value: u16) -> Result<i16, StoreError> {
    i16::try_from(value).map_err(|_| StoreError::integrity(format!("{value} exceeds SMALLINT")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // foreign key, unique, check
                Some("23503") | Some("23505") | Some("23514") => StoreError::Integrity(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
