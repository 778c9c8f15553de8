//! Access gate: role membership check over an already verified principal.
//!
//! The check is a pure predicate. It never mutates the principal, so any number of
//! gates can be stacked in any order.

use crate::authz::error::AuthError;
use crate::authz::principal::Principal;
use crate::authz::role::RoleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    allowed: RoleSet,
}

impl RoleGate {
    pub fn new(allowed: RoleSet) -> Self {
        Self { allowed }
    }

    /// `Unauthenticated` when no principal reached the gate, `InsufficientRole` when its role
    /// is outside the allowed set.
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AuthError> {
        let principal = principal.ok_or(AuthError::Unauthenticated)?;
        if self.allowed.contains(principal.role()) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole)
        }
    }
}

pub fn require_role(allowed: impl Into<RoleSet>) -> RoleGate {
    RoleGate::new(allowed.into())
}
