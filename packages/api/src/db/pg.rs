use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use store::{
    NewRecord, NewUser, OwnerSummary, PublicRecord, Record, RecordPatch, RecordStore, StoreError,
    User, UserStore,
};
use uuid::Uuid;

/// PostgreSQL-backed user and record store.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    secret_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            secret_hash: row.secret_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct RecordRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    date: NaiveDate,
    photo_ref: Option<String>,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Record {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            date: row.date,
            photo_ref: row.photo_ref,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PublicRecordRow {
    #[sqlx(flatten)]
    record: RecordRow,
    owner_name: String,
    owner_email: String,
}

impl From<PublicRecordRow> for PublicRecord {
    fn from(row: PublicRecordRow) -> Self {
        let record = Record::from(row.record);
        PublicRecord {
            owner: OwnerSummary {
                id: record.owner_id,
                name: row.owner_name,
                email: row.owner_email,
            },
            record,
        }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

const RECORD_COLUMNS: &str =
    "id, owner_id, title, description, date, photo_ref, is_public, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, name, email, secret_hash) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.secret_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate("email")
            }
            other => backend(other),
        })?;
        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(User::from))
    }

    async fn update_secret_hash(
        &self,
        id: Uuid,
        secret_hash: String,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET secret_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(&secret_hash)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_record(&self, record: NewRecord) -> Result<Record, StoreError> {
        let row: RecordRow = sqlx::query_as(&format!(
            "INSERT INTO records (id, owner_id, title, description, date, photo_ref, is_public)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(record.owner_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.date)
        .bind(&record.photo_ref)
        .bind(record.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.into())
    }

    async fn find_record(&self, id: Uuid) -> Result<Option<Record>, StoreError> {
        let row: Option<RecordRow> =
            sqlx::query_as(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(Record::from))
    }

    async fn list_records_by_owner(&self, owner_id: Uuid) -> Result<Vec<Record>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn list_public_records(&self) -> Result<Vec<PublicRecord>, StoreError> {
        let rows: Vec<PublicRecordRow> = sqlx::query_as(
            "SELECT r.id, r.owner_id, r.title, r.description, r.date, r.photo_ref,
                    r.is_public, r.created_at, r.updated_at,
                    u.name AS owner_name, u.email AS owner_email
             FROM records r
             JOIN users u ON u.id = r.owner_id
             WHERE r.is_public
             ORDER BY r.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(PublicRecord::from).collect())
    }

    async fn update_record(
        &self,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<Option<Record>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(&format!(
            "UPDATE records SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                photo_ref = COALESCE($5, photo_ref),
                is_public = COALESCE($6, is_public),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {RECORD_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.date)
        .bind(&patch.photo_ref)
        .bind(patch.is_public)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(Record::from))
    }

    async fn delete_record(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() == 1)
    }
}
