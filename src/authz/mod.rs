/*
 * Responsibility
 * - 認可の中核 (role gate / ownership policy / audit)
 * - HTTP や DB に依存しない純粋なロジックのみ置く
 */
pub mod audit;
pub mod error;
pub mod gate;
pub mod policy;
pub mod principal;
pub mod role;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink, target_from_path};
pub use error::AuthError;
pub use gate::{RoleGate, require_role};
pub use policy::{Mutation, Operation, UserField};
pub use principal::{Principal, UserId};
pub use role::{Role, RoleSet};
