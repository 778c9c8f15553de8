/*
 * Responsibility
 * - users テーブル向けの永続化 collaborator (UserStore trait + SQLx 実装)
 * - 認可が通った後にだけ呼ばれる。ここでは「誰が」を判断しない
 * - DB エラーは RepoError (NotFound / Conflict / Db) に変換して返す
 */
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::authz::{Role, UserField, UserId};
use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shape-valid set of attribute changes. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    /// Names of the attributes this change set touches.
    pub fn fields(&self) -> Vec<UserField> {
        let mut fields = Vec::with_capacity(3);
        if self.name.is_some() {
            fields.push(UserField::Name);
        }
        if self.email.is_some() {
            fields.push(UserField::Email);
        }
        if self.role.is_some() {
            fields.push(UserField::Role);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, RepoError>;
    async fn fetch_by_id(&self, id: UserId) -> Result<User, RepoError>;
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepoError>;
    async fn delete(&self, id: UserId) -> Result<(), RepoError>;
}

pub type DynUserStore = Arc<dyn UserStore>;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepoError::Db(sqlx::Error::Decode(Box::new(e))))?;
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, role, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn fetch_by_id(&self, id: UserId) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)?;

        row.try_into()
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepoError> {
        // NULL parameter -> keep current value
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
