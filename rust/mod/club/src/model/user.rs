use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What a user may do beyond following and registering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Student,
    /// May create clubs and manage the ones they head.
    ClubHead,
}

/// A student (or club head) account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Display name.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub role: UserRole,

    /// Ids of the clubs this user follows. Each id appears at most once.
    /// Every change here is paired with a `followers_count` change on the
    /// club in the same transaction.
    #[serde(default)]
    pub followed_clubs: BTreeSet<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

impl User {
    pub fn follows(&self, club_id: &str) -> bool {
        self.followed_clubs.contains(club_id)
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Query for the user directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Case-insensitive substring match on the user name.
    #[serde(default)]
    pub q: Option<String>,
}
