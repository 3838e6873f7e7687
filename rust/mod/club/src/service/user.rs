use clubhub_core::{Identity, ListResult, merge_patch, new_id, now_rfc3339};
use clubhub_kv::run_atomic;
use tracing::info;

use crate::model::{CreateUser, User, UserListQuery};
use crate::service::{keys, txn_put, txn_require_user, ClubError, ClubService};

impl ClubService {
    /// Create a new user. New users follow nothing.
    pub fn create_user(&self, input: CreateUser) -> Result<User, ClubError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ClubError::Validation("user name must not be empty".into()));
        }

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            name: name.to_string(),
            email: input.email,
            role: input.role,
            followed_clubs: Default::default(),
            created_at: now.clone(),
            updated_at: now,
        };

        run_atomic(self.kv.as_ref(), |txn| txn_put(txn, &keys::user(&user.id), &user))?;
        info!("user {} created (role={:?})", user.id, user.role);
        Ok(user)
    }

    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, ClubError> {
        self.require_user(id)
    }

    /// List users, newest first. `q` filters on name.
    pub fn list_users(&self, query: &UserListQuery) -> Result<ListResult<User>, ClubError> {
        let params = self.page(query.limit, query.offset, None, query.q.clone());
        let needle = params.q.as_deref().map(str::to_lowercase);

        let mut users: Vec<User> = self.scan_docs(keys::USER_PREFIX)?;
        if let Some(needle) = needle {
            users.retain(|u| u.name.to_lowercase().contains(&needle));
        }
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(params.paginate(users))
    }

    /// Update the caller's own profile with JSON merge-patch semantics.
    ///
    /// `id`, `created_at`, `role` and `followed_clubs` cannot be patched; the
    /// follow set only changes through follow/unfollow.
    pub fn update_user(
        &self,
        who: &Identity,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<User, ClubError> {
        if who.user_id != id {
            return Err(ClubError::Forbidden(format!(
                "user {} cannot edit user {id}",
                who.user_id
            )));
        }
        if !patch.is_object() {
            return Err(ClubError::Validation("patch must be a JSON object".into()));
        }

        run_atomic(self.kv.as_ref(), |txn| -> Result<User, ClubError> {
            let current = txn_require_user(txn, id)?;

            let mut base = serde_json::to_value(&current)
                .map_err(|e| ClubError::Internal(e.to_string()))?;
            merge_patch(&mut base, &patch);
            base["id"] = serde_json::json!(current.id);
            base["created_at"] = serde_json::json!(current.created_at);
            base["role"] = serde_json::json!(current.role);
            base["followed_clubs"] = serde_json::json!(current.followed_clubs);
            base["updated_at"] = serde_json::json!(now_rfc3339());

            let updated: User = serde_json::from_value(base)
                .map_err(|e| ClubError::Validation(e.to_string()))?;
            if updated.name.trim().is_empty() {
                return Err(ClubError::Validation("user name must not be empty".into()));
            }

            txn_put(txn, &keys::user(id), &updated)?;
            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserRole;
    use crate::service::testutil::*;
    use crate::service::ClubConfig;

    #[test]
    fn test_user_crud() {
        let (svc, _dir) = test_service();

        let user = svc
            .create_user(CreateUser {
                name: "Alice".to_string(),
                email: Some("alice@campus.edu".to_string()),
                role: UserRole::Student,
            })
            .unwrap();
        assert_eq!(user.name, "Alice");
        assert!(user.followed_clubs.is_empty());

        let fetched = svc.get_user(&user.id).unwrap();
        assert_eq!(fetched.email, Some("alice@campus.edu".to_string()));

        let updated = svc
            .update_user(
                &as_identity(&user),
                &user.id,
                serde_json::json!({"name": "Alice W."}),
            )
            .unwrap();
        assert_eq!(updated.name, "Alice W.");
        assert_eq!(updated.id, user.id);

        let list = svc.list_users(&UserListQuery::default()).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].name, "Alice W.");
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let (svc, _dir) = test_service();
        let err = svc
            .create_user(CreateUser {
                name: "  ".to_string(),
                email: None,
                role: UserRole::Student,
            })
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }

    #[test]
    fn test_update_protects_follow_set_and_role() {
        let (svc, _dir) = test_service();
        let head = head(&svc, "Hana");
        let club = club_headed_by(&svc, &head, "Chess");
        let alice = student(&svc, "Alice");
        svc.follow(&as_identity(&alice), &club.id).unwrap();

        let updated = svc
            .update_user(
                &as_identity(&alice),
                &alice.id,
                serde_json::json!({"followed_clubs": [], "role": "CLUB_HEAD"}),
            )
            .unwrap();
        assert!(updated.follows(&club.id));
        assert_eq!(updated.role, UserRole::Student);
    }

    #[test]
    fn test_update_other_user_forbidden() {
        let (svc, _dir) = test_service();
        let alice = student(&svc, "Alice");
        let bob = student(&svc, "Bob");

        let err = svc
            .update_user(&as_identity(&bob), &alice.id, serde_json::json!({"name": "x"}))
            .unwrap_err();
        assert!(matches!(err, ClubError::Forbidden(_)));
    }

    #[test]
    fn test_list_users_filters_by_name() {
        let (svc, _dir) = test_service();
        student(&svc, "Alice");
        student(&svc, "Bob");

        let query = UserListQuery {
            q: Some("ali".to_string()),
            ..Default::default()
        };
        let list = svc.list_users(&query).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].name, "Alice");
    }

    #[test]
    fn test_list_users_uses_configured_page_size() {
        let (svc, _dir) = test_service_with(ClubConfig {
            default_page_size: 2,
            max_page_size: 3,
        });
        for name in ["Alice", "Bob", "Carol", "Dan"] {
            student(&svc, name);
        }

        let list = svc.list_users(&UserListQuery::default()).unwrap();
        assert_eq!(list.total, 4);
        assert_eq!(list.items.len(), 2);

        let query = UserListQuery {
            limit: Some(100),
            ..Default::default()
        };
        let list = svc.list_users(&query).unwrap();
        assert_eq!(list.items.len(), 3);
    }

    #[test]
    fn test_update_rejects_non_object_patch() {
        let (svc, _dir) = test_service();
        let alice = student(&svc, "Alice");

        for patch in [serde_json::json!("x"), serde_json::json!([1, 2]), serde_json::json!(null)] {
            let err = svc
                .update_user(&as_identity(&alice), &alice.id, patch)
                .unwrap_err();
            assert!(matches!(err, ClubError::Validation(_)));
        }
        assert_eq!(svc.get_user(&alice.id).unwrap().name, "Alice");
    }
}
