//! Follow / unfollow.
//!
//! A user's `followed_clubs` set and the club's `followers_count` always move
//! together inside one KV transaction. The current membership is read inside
//! that same transaction, so a repeated or racing call cannot double count:
//! following twice increments once, unfollowing twice decrements once, and
//! the decrement never takes the counter below zero.

use clubhub_core::{Identity, now_rfc3339};
use clubhub_kv::{run_atomic, run_view};
use tracing::{debug, info};

use crate::model::{Club, FollowState};
use crate::service::{
    keys, txn_get, txn_put, txn_require_club, txn_require_user, ClubError, ClubService,
};

impl ClubService {
    /// Start following a club. No-op if already following.
    pub fn follow(&self, who: &Identity, club_id: &str) -> Result<FollowState, ClubError> {
        self.set_following(who, club_id, true)
    }

    /// Stop following a club. No-op if not following.
    pub fn unfollow(&self, who: &Identity, club_id: &str) -> Result<FollowState, ClubError> {
        self.set_following(who, club_id, false)
    }

    /// Whether the caller follows a club, with its current follower count.
    ///
    /// Both documents come from one snapshot, so `following` and
    /// `followers_count` always describe the same committed state.
    pub fn follow_state(&self, who: &Identity, club_id: &str) -> Result<FollowState, ClubError> {
        run_view(self.kv.as_ref(), |snap| -> Result<FollowState, ClubError> {
            let club = txn_require_club(snap, club_id)?;
            let user = txn_require_user(snap, &who.user_id)?;
            Ok(FollowState {
                following: user.follows(club_id),
                followers_count: club.followers_count,
                club_id: club.id,
                changed: false,
            })
        })
    }

    /// Clubs the caller follows, by name. Ids whose club is gone are skipped.
    pub fn followed_clubs(&self, who: &Identity) -> Result<Vec<Club>, ClubError> {
        run_view(self.kv.as_ref(), |snap| -> Result<Vec<Club>, ClubError> {
            let user = txn_require_user(snap, &who.user_id)?;
            let mut clubs = Vec::with_capacity(user.followed_clubs.len());
            for id in &user.followed_clubs {
                if let Some(club) = txn_get::<Club, _>(snap, &keys::club(id))? {
                    clubs.push(club);
                }
            }
            clubs.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(clubs)
        })
    }

    fn set_following(
        &self,
        who: &Identity,
        club_id: &str,
        follow: bool,
    ) -> Result<FollowState, ClubError> {
        let state = run_atomic(self.kv.as_ref(), |txn| -> Result<FollowState, ClubError> {
            let mut club = txn_require_club(txn, club_id)?;
            let mut user = txn_require_user(txn, &who.user_id)?;

            if user.follows(club_id) == follow {
                return Ok(FollowState {
                    club_id: club.id,
                    following: follow,
                    followers_count: club.followers_count,
                    changed: false,
                });
            }

            if follow {
                user.followed_clubs.insert(club_id.to_string());
                club.followers_count = club.followers_count.saturating_add(1);
            } else {
                user.followed_clubs.remove(club_id);
                club.followers_count = club.followers_count.saturating_sub(1);
            }
            user.updated_at = now_rfc3339();

            txn_put(txn, &keys::user(&user.id), &user)?;
            txn_put(txn, &keys::club(&club.id), &club)?;

            Ok(FollowState {
                club_id: club.id,
                following: follow,
                followers_count: club.followers_count,
                changed: true,
            })
        })?;

        let verb = if follow { "followed" } else { "unfollowed" };
        if state.changed {
            info!(
                "user {} {verb} club {} (followers={})",
                who.user_id, club_id, state.followers_count
            );
        } else {
            debug!("user {} already {verb} club {club_id}", who.user_id);
        }
        Ok(state)
    }
}
