use serde::{Deserialize, Serialize};

/// A club students can discover and follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form directory category, e.g. "sports" or "music".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// User id of the club head.
    pub head_id: String,

    /// Cached number of users whose `followed_clubs` contains this club.
    #[serde(default)]
    pub followers_count: u64,

    pub created_at: String,

    pub updated_at: String,
}

/// Input for creating a club. The caller becomes its head.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClub {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Query for the club directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// `name`, `followers`, or unset for newest first.
    #[serde(default)]
    pub sort: Option<String>,
    /// Case-insensitive substring match on the club name.
    #[serde(default)]
    pub q: Option<String>,
    /// Exact category match, case-insensitive.
    #[serde(default)]
    pub category: Option<String>,
}

/// Follow relationship between the caller and one club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowState {
    pub club_id: String,
    pub following: bool,
    pub followers_count: u64,
    /// False when the call found the relationship already in the requested state.
    pub changed: bool,
}

/// Outcome of a follower-count reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub clubs_scanned: usize,
    pub users_scanned: usize,
    pub clubs_repaired: usize,
}
