//! Ownership policy for mutating a user resource.
//!
//! Rules, first match wins:
//! 1. caller is not the target and not an admin -> deny (`not-self-and-not-admin`)
//! 2. update touches `role` and caller is not an admin -> deny (`role-change-requires-admin`),
//!    also for a self update
//! 3. allow
//!
//! Delete only evaluates rule 1. The policy is a pure function of its inputs.

use std::fmt;

use axum::http::StatusCode;

use crate::authz::error::AuthError;
use crate::authz::principal::{Principal, UserId};

/// Attributes of a user resource a caller may ask to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Name,
    Email,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mutation being authorized. Updates carry the names of the attributes they change.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    Update { fields: &'a [UserField] },
    Delete,
}

impl Mutation<'_> {
    pub fn operation(&self) -> Operation {
        match self {
            Mutation::Update { .. } => Operation::Update,
            Mutation::Delete => Operation::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Allowed,
    NotSelfAndNotAdmin,
    RoleChangeRequiresAdmin,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Allowed => "allowed",
            DecisionReason::NotSelfAndNotAdmin => "not-self-and-not-admin",
            DecisionReason::RoleChangeRequiresAdmin => "role-change-requires-admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
    pub status: StatusCode,
    pub operation: Operation,
}

impl AccessDecision {
    fn allow(operation: Operation) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Allowed,
            status: StatusCode::OK,
            operation,
        }
    }

    fn deny(operation: Operation, reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
            status: StatusCode::FORBIDDEN,
            operation,
        }
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self.reason {
            DecisionReason::Allowed => Ok(()),
            DecisionReason::NotSelfAndNotAdmin => Err(AuthError::OwnershipDenied(self.operation)),
            DecisionReason::RoleChangeRequiresAdmin => Err(AuthError::RoleEscalationDenied),
        }
    }
}

pub fn evaluate(principal: &Principal, target: UserId, mutation: Mutation<'_>) -> AccessDecision {
    let operation = mutation.operation();

    if !principal.owns(target) && !principal.is_admin() {
        return AccessDecision::deny(operation, DecisionReason::NotSelfAndNotAdmin);
    }

    if let Mutation::Update { fields } = mutation
        && fields.contains(&UserField::Role)
        && !principal.is_admin()
    {
        return AccessDecision::deny(operation, DecisionReason::RoleChangeRequiresAdmin);
    }

    AccessDecision::allow(operation)
}
