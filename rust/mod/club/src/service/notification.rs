use clubhub_core::{Identity, new_id, now_rfc3339};
use clubhub_kv::run_atomic;
use tracing::info;

use crate::model::{Notification, NotifyFollowers, NotifyReport, User};
use crate::service::{
    ensure_head, keys, txn_get, txn_put, txn_require_club, txn_scan, ClubError, ClubService,
};

impl ClubService {
    /// Send a message to every current follower of a club. Head only.
    ///
    /// The follower set is read and every notification written in one
    /// transaction, so a user who unfollows concurrently either gets the
    /// message or does not, never half of a delivery.
    pub fn notify_followers(
        &self,
        who: &Identity,
        club_id: &str,
        input: NotifyFollowers,
    ) -> Result<NotifyReport, ClubError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(ClubError::Validation("message must not be empty".into()));
        }

        let delivered = run_atomic(self.kv.as_ref(), |txn| -> Result<usize, ClubError> {
            let club = txn_require_club(txn, club_id)?;
            ensure_head(who, &club)?;

            let now = now_rfc3339();
            let mut delivered = 0usize;
            for user in txn_scan::<User, _>(txn, keys::USER_PREFIX)? {
                if !user.follows(club_id) {
                    continue;
                }
                let notification = Notification {
                    id: new_id(),
                    user_id: user.id,
                    club_id: club_id.to_string(),
                    message: message.to_string(),
                    read: false,
                    created_at: now.clone(),
                };
                txn_put(
                    txn,
                    &keys::notification(&notification.user_id, &notification.id),
                    &notification,
                )?;
                delivered += 1;
            }
            Ok(delivered)
        })?;

        info!("club {club_id} notified {delivered} followers");
        Ok(NotifyReport {
            club_id: club_id.to_string(),
            delivered,
        })
    }

    /// The caller's inbox, newest first.
    pub fn list_notifications(&self, who: &Identity) -> Result<Vec<Notification>, ClubError> {
        let mut inbox: Vec<Notification> =
            self.scan_docs(&keys::notifications_of(&who.user_id))?;
        inbox.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(inbox)
    }

    pub fn mark_notification_read(
        &self,
        who: &Identity,
        id: &str,
    ) -> Result<Notification, ClubError> {
        run_atomic(self.kv.as_ref(), |txn| -> Result<Notification, ClubError> {
            let key = keys::notification(&who.user_id, id);
            let mut notification: Notification = txn_get(txn, &key)?
                .ok_or_else(|| ClubError::NotFound(format!("notification {id}")))?;
            if !notification.read {
                notification.read = true;
                txn_put(txn, &key, &notification)?;
            }
            Ok(notification)
        })
    }
}
