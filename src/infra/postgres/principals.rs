//! PostgreSQL-backed principal store
//!
//! The `UNIQUE (email)` constraint on `administrators` is the correctness
//! backstop for concurrent registrations of the same identity key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::domain::{NewPrincipal, Principal, PrincipalId};
use crate::infra::{PrincipalStore, Result, StoreError};

/// PostgreSQL principal store
pub struct PgPrincipalStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    display_name: String,
    email: String,
    secret_hash: String,
    created_at: DateTime<Utc>,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal {
            id: PrincipalId::from_uuid(row.id),
            display_name: row.display_name,
            identity_key: row.email,
            secret_hash: row.secret_hash,
            created_at: row.created_at,
        }
    }
}

impl PgPrincipalStore {
    /// Create a new PostgreSQL principal store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema for administrators
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS administrators (
                id UUID PRIMARY KEY,
                display_name TEXT NOT NULL,
                email TEXT NOT NULL,
                secret_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT administrators_email_key UNIQUE (email)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_by_identity_key(&self, identity_key: &str) -> Result<Option<Principal>> {
        let row: Option<PrincipalRow> = sqlx::query_as(
            r#"
            SELECT id, display_name, email, secret_hash, created_at
            FROM administrators
            WHERE email = $1
            "#,
        )
        .bind(identity_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Principal::from))
    }

    async fn insert(&self, principal: NewPrincipal) -> Result<Principal> {
        let principal = principal.into_principal();

        let result = sqlx::query(
            r#"
            INSERT INTO administrators (id, display_name, email, secret_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(principal.id.0)
        .bind(&principal.display_name)
        .bind(&principal.identity_key)
        .bind(&principal.secret_hash)
        .bind(principal.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(principal),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate),
            Err(e) => Err(StoreError::Database(e)),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
