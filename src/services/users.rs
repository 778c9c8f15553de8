/*
 * Responsibility
 * - /users 系ユースケース (list / get / update / delete)
 * - 変更系は ownership policy → audit → store の順。拒否されたら store は呼ばない
 * - policy / audit は同期・I/O なし。I/O (store) は認可が通った後だけ
 */
use std::sync::Arc;

use crate::authz::{AuditEvent, AuditSink, AuthError, Mutation, Principal, UserId, policy};
use crate::error::AppError;
use crate::repos::user_repo::{DynUserStore, User, UserChanges};

#[derive(Clone)]
pub struct UsersService {
    store: DynUserStore,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for UsersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsersService").finish_non_exhaustive()
    }
}

impl UsersService {
    pub fn new(store: DynUserStore, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: UserId) -> Result<User, AppError> {
        Ok(self.store.fetch_by_id(id).await?)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        target: UserId,
        changes: UserChanges,
    ) -> Result<User, AppError> {
        tracing::info!(
            user_id = principal.id(),
            email = principal.email(),
            target_id = target,
            "user attempting to update user"
        );

        let fields = changes.fields();
        self.authorize(
            "users.update",
            principal,
            target,
            Mutation::Update { fields: &fields },
        )?;

        let user = self.store.update(target, &changes).await?;

        tracing::info!(target_id = target, by = principal.email(), "user updated");
        Ok(user)
    }

    pub async fn delete(&self, principal: &Principal, target: UserId) -> Result<(), AppError> {
        tracing::info!(
            user_id = principal.id(),
            email = principal.email(),
            target_id = target,
            "user attempting to delete user"
        );

        self.authorize("users.delete", principal, target, Mutation::Delete)?;

        self.store.delete(target).await?;

        tracing::info!(target_id = target, by = principal.email(), "user deleted");
        Ok(())
    }

    fn authorize(
        &self,
        action: &'static str,
        principal: &Principal,
        target: UserId,
        mutation: Mutation<'_>,
    ) -> Result<(), AuthError> {
        let decision = policy::evaluate(principal, target, mutation);
        tracing::debug!(
            operation = %decision.operation,
            allowed = decision.allowed,
            status = decision.status.as_u16(),
            reason = decision.reason.as_str(),
            "ownership decision"
        );

        let event = if decision.allowed {
            AuditEvent::allowed(action, principal, target)
        } else {
            AuditEvent::denied(
                action,
                Some(principal),
                Some(target),
                decision.reason.as_str(),
            )
        };
        self.audit.record(event);

        decision.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::audit::Outcome;
    use crate::authz::audit::testing::MemoryAuditSink;
    use crate::authz::{Operation, Role};
    use crate::repos::memory::MemoryUserStore;

    fn service(store: &MemoryUserStore, audit: &MemoryAuditSink) -> UsersService {
        UsersService::new(Arc::new(store.clone()), Arc::new(audit.clone()))
    }

    fn seeded() -> MemoryUserStore {
        MemoryUserStore::with_users(&[
            (1, Role::Admin),
            (5, Role::User),
            (7, Role::User),
            (99, Role::User),
        ])
    }

    fn rename(name: &str) -> UserChanges {
        UserChanges {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn update_of_other_user_is_denied_before_store() {
        let (store, audit) = (seeded(), MemoryAuditSink::default());
        let svc = service(&store, &audit);
        let p = Principal::for_test(5, Role::User);

        let err = svc.update(&p, 7, rename("Mallory")).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Auth(AuthError::OwnershipDenied(Operation::Update))
        ));
        assert_eq!(store.calls(), 0);
        assert_eq!(store.get(7).unwrap().name, "User 7");

        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, Outcome::Denied);
        assert_eq!(events[0].requester.as_ref().unwrap().id, 5);
        assert_eq!(events[0].target, Some(7));
        assert_eq!(events[0].reason, "not-self-and-not-admin");
    }

    #[tokio::test]
    async fn self_update_reaches_store() {
        let (store, audit) = (seeded(), MemoryAuditSink::default());
        let svc = service(&store, &audit);
        let p = Principal::for_test(5, Role::User);

        let user = svc.update(&p, 5, rename("Bob")).await.unwrap();

        assert_eq!(user.name, "Bob");
        assert_eq!(store.calls(), 1);
        assert_eq!(audit.events()[0].outcome, Outcome::Allowed);
    }

    #[tokio::test]
    async fn self_role_change_is_denied() {
        let (store, audit) = (seeded(), MemoryAuditSink::default());
        let svc = service(&store, &audit);
        let p = Principal::for_test(5, Role::User);
        let changes = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };

        let err = svc.update(&p, 5, changes).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::RoleEscalationDenied)));
        assert_eq!(store.calls(), 0);
        assert_eq!(store.get(5).unwrap().role, Role::User);
        assert_eq!(audit.events()[0].reason, "role-change-requires-admin");
    }

    #[tokio::test]
    async fn admin_can_promote_and_delete_others() {
        let (store, audit) = (seeded(), MemoryAuditSink::default());
        let svc = service(&store, &audit);
        let admin = Principal::for_test(1, Role::Admin);
        let promote = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };

        let promoted = svc.update(&admin, 7, promote).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);
        svc.delete(&admin, 99).await.unwrap();
        assert!(store.get(99).is_none());
    }

    #[tokio::test]
    async fn store_errors_pass_through_unchanged() {
        let (store, audit) = (seeded(), MemoryAuditSink::default());
        let svc = service(&store, &audit);
        let admin = Principal::for_test(1, Role::Admin);

        let err = svc.delete(&admin, 12345).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let taken = UserChanges {
            email: Some("user7@example.com".into()),
            ..Default::default()
        };
        let err = svc.update(&admin, 5, taken).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
