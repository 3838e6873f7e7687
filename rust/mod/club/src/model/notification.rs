use serde::{Deserialize, Serialize};

/// A message delivered to one follower of a club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Recipient.
    pub user_id: String,
    pub club_id: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyFollowers {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub club_id: String,
    pub delivered: usize,
}
