use clubhub_core::{Identity, ListResult, merge_patch, new_id, now_rfc3339};
use clubhub_kv::{run_atomic, KVRead};
use tracing::info;

use crate::model::{Club, ClubListQuery, CreateClub, Event, User, UserRole};
use crate::service::{
    ensure_head, keys, txn_put, txn_require_club, txn_require_user, txn_scan, ClubError,
    ClubService,
};

impl ClubService {
    /// Create a club headed by the caller, who must have the `CLUB_HEAD` role.
    pub fn create_club(&self, who: &Identity, input: CreateClub) -> Result<Club, ClubError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ClubError::Validation("club name must not be empty".into()));
        }

        let now = now_rfc3339();
        let club = Club {
            id: new_id(),
            name: name.to_string(),
            description: input.description,
            category: input.category,
            head_id: who.user_id.clone(),
            followers_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        run_atomic(self.kv.as_ref(), |txn| -> Result<(), ClubError> {
            let head = txn_require_user(txn, &who.user_id)?;
            if head.role != UserRole::ClubHead {
                return Err(ClubError::Forbidden(format!(
                    "user {} is not a club head",
                    head.id
                )));
            }
            txn_put(txn, &keys::club(&club.id), &club)
        })?;

        info!("club {} created by {}", club.id, who.user_id);
        Ok(club)
    }

    /// Get a club by id.
    pub fn get_club(&self, id: &str) -> Result<Club, ClubError> {
        self.require_club(id)
    }

    /// Browse the club directory.
    pub fn list_clubs(&self, query: &ClubListQuery) -> Result<ListResult<Club>, ClubError> {
        let params = self.page(
            query.limit,
            query.offset,
            query.sort.clone(),
            query.q.clone(),
        );

        let mut clubs: Vec<Club> = self.scan_docs(keys::CLUB_PREFIX)?;

        if let Some(category) = query.category.as_deref() {
            clubs.retain(|c| {
                c.category
                    .as_deref()
                    .is_some_and(|cat| cat.eq_ignore_ascii_case(category))
            });
        }
        if let Some(needle) = params.q.as_deref().map(str::to_lowercase) {
            clubs.retain(|c| c.name.to_lowercase().contains(&needle));
        }

        match params.sort.as_deref() {
            Some("name") => clubs.sort_by(|a, b| a.name.cmp(&b.name)),
            Some("followers") => clubs.sort_by(|a, b| {
                b.followers_count
                    .cmp(&a.followers_count)
                    .then_with(|| a.name.cmp(&b.name))
            }),
            None => clubs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Some(other) => {
                return Err(ClubError::Validation(format!(
                    "unknown sort key '{other}', expected 'name' or 'followers'"
                )));
            }
        }

        Ok(params.paginate(clubs))
    }

    /// Update a club with JSON merge-patch. Head only.
    ///
    /// `followers_count` is owned by follow/unfollow and cannot be patched,
    /// nor can `id`, `head_id` or `created_at`.
    pub fn update_club(
        &self,
        who: &Identity,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Club, ClubError> {
        if !patch.is_object() {
            return Err(ClubError::Validation("patch must be a JSON object".into()));
        }

        run_atomic(self.kv.as_ref(), |txn| -> Result<Club, ClubError> {
            let current = txn_require_club(txn, id)?;
            ensure_head(who, &current)?;

            let mut base = serde_json::to_value(&current)
                .map_err(|e| ClubError::Internal(e.to_string()))?;
            merge_patch(&mut base, &patch);
            base["id"] = serde_json::json!(current.id);
            base["head_id"] = serde_json::json!(current.head_id);
            base["followers_count"] = serde_json::json!(current.followers_count);
            base["created_at"] = serde_json::json!(current.created_at);
            base["updated_at"] = serde_json::json!(now_rfc3339());

            let updated: Club = serde_json::from_value(base)
                .map_err(|e| ClubError::Validation(e.to_string()))?;
            if updated.name.trim().is_empty() {
                return Err(ClubError::Validation("club name must not be empty".into()));
            }

            txn_put(txn, &keys::club(id), &updated)?;
            Ok(updated)
        })
    }

    /// Delete a club. Head only.
    ///
    /// In one transaction: removes the club from every follower's set,
    /// deletes its events and their registrations, then the club itself.
    pub fn delete_club(&self, who: &Identity, id: &str) -> Result<(), ClubError> {
        let unfollowed = run_atomic(self.kv.as_ref(), |txn| -> Result<usize, ClubError> {
            let club = txn_require_club(txn, id)?;
            ensure_head(who, &club)?;

            let mut unfollowed = 0usize;
            for mut user in txn_scan::<User, _>(txn, keys::USER_PREFIX)? {
                if user.followed_clubs.remove(id) {
                    txn_put(txn, &keys::user(&user.id), &user)?;
                    unfollowed += 1;
                }
            }

            for event in txn_scan::<Event, _>(txn, keys::EVENT_PREFIX)? {
                if event.club_id != id {
                    continue;
                }
                for (key, _) in txn.scan(&keys::registrations_of(&event.id))? {
                    txn.delete(&key)?;
                }
                txn.delete(&keys::event(&event.id))?;
            }

            txn.delete(&keys::club(id))?;
            Ok(unfollowed)
        })?;

        info!("club {id} deleted by {} ({unfollowed} followers detached)", who.user_id);
        Ok(())
    }
}
