/*
 * Responsibility
 * - Role (閉じた列挙: user / admin) の定義
 * - RoleSet: route ごとに起動時に決める許可ロール集合 (以後 immutable)
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Allowed roles for one protected route.
///
/// Two roles only, so membership is a pair of flags; order of construction is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet {
    user: bool,
    admin: bool,
}

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = Self::default();
        for role in roles {
            match role {
                Role::User => set.user = true,
                Role::Admin => set.admin = true,
            }
        }
        set
    }

    pub fn admin_only() -> Self {
        Self::new([Role::Admin])
    }

    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::User => self.user,
            Role::Admin => self.admin,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.user && !self.admin
    }

    pub fn roles(&self) -> Vec<Role> {
        [Role::User, Role::Admin]
            .into_iter()
            .filter(|r| self.contains(*r))
            .collect()
    }

    /// Parse a comma separated list such as `"admin,user"`.
    pub fn parse_list(s: &str) -> Result<Self, UnknownRole> {
        let roles = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Role::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(roles))
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        Self::new(roles)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" user ".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_set_ignores_order_and_duplicates() {
        let a = RoleSet::new([Role::Admin, Role::User, Role::Admin]);
        let b = RoleSet::from([Role::User, Role::Admin]);
        assert_eq!(a, b);
        assert_eq!(a.roles(), vec![Role::User, Role::Admin]);
    }

    #[test]
    fn parse_list_rejects_unknown_names() {
        assert_eq!(RoleSet::parse_list("admin").unwrap(), RoleSet::admin_only());
        assert!(RoleSet::parse_list("admin, owner").is_err());
        assert!(RoleSet::parse_list(" , ").unwrap().is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let r: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(r, Role::User);
    }
}
