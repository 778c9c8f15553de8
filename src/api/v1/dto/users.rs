/*
 * Responsibility
 * - Users の request/response DTO
 * - validate() は形式チェックのみ (誰が変更できるかは ownership policy の責務)
 */
use serde::{Deserialize, Serialize};

use crate::authz::{Role, UserId};
use crate::repos::user_repo::{User, UserChanges};

const MAX_LEN: usize = 255;

/// `PUT /users/{id}` body. Unknown keys (including any `id`) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserChanges, &'static str> {
        let name = match self.name {
            Some(n) if n.trim().is_empty() => return Err("name cannot be empty"),
            Some(n) if n.trim().len() > MAX_LEN => return Err("name must be <= 255 chars"),
            Some(n) => Some(n.trim().to_string()),
            None => None,
        };

        let email = match self.email {
            Some(e) if !is_email(e.trim()) => return Err("email must be a valid email address"),
            Some(e) => Some(e.trim().to_ascii_lowercase()),
            None => None,
        };

        let role = self
            .role
            .map(|r| r.parse::<Role>())
            .transpose()
            .map_err(|_| "role must be one of: user, admin")?;

        let changes = UserChanges { name, email, role };
        if changes.is_empty() {
            return Err("at least one field must be provided for update");
        }
        Ok(changes)
    }
}

fn is_email(s: &str) -> bool {
    if s.len() > MAX_LEN || s.chars().any(char::is_whitespace) {
        return false;
    }
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

/// Path id must be a positive integer.
pub fn validate_user_id(id: UserId) -> Result<UserId, &'static str> {
    if id > 0 {
        Ok(id)
    } else {
        Err("id must be a positive integer")
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub message: &'static str,
    pub users: Vec<UserResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
