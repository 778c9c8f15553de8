/*
 * Responsibility
 * - リクエスト単位の認証済み主体 (Principal) の型
 * - middleware (verifier) が生成して request extensions に格納し、以降は参照のみ
 *
 * Notes
 * - 生成経路は `VerifiedClaims` からの変換のみ。VerifiedClaims は verifier しか作れないため、
 *   未検証の入力 (body の id など) から Principal が作られることはない
 */
use crate::authz::role::Role;
use crate::services::auth::VerifiedClaims;

pub type UserId = i64;

/// Authenticated caller of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: UserId,
    email: String,
    role: Role,
}

impl Principal {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Ownership: the principal is the target resource.
    pub fn owns(&self, target: UserId) -> bool {
        self.id == target
    }
}

impl From<VerifiedClaims> for Principal {
    fn from(verified: VerifiedClaims) -> Self {
        let claims = verified.into_claims();
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[cfg(test)]
impl Principal {
    pub(crate) fn for_test(id: UserId, role: Role) -> Self {
        Self {
            id,
            email: format!("user{id}@example.com"),
            role,
        }
    }
}
