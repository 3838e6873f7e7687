use serde::{Deserialize, Serialize};

/// An event hosted by a club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub club_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC 3339 start time, if scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    /// Entry fee in cents. Zero means free.
    #[serde(default)]
    pub fee_cents: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl Event {
    /// Paid events need the club head to confirm each registration.
    pub fn is_paid(&self) -> bool {
        self.fee_cents > 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub fee_cents: u64,
}

/// Lifecycle state of an event registration.
///
/// ```text
/// (free)  → CONFIRMED
/// (paid)  → PENDING → CONFIRMED
///                   → REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether the club head can no longer change this registration.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected)
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's registration for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub event_id: String,
    pub user_id: String,
    pub status: RegistrationStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Club head's verdict on a pending registration.
#[derive(Debug, Clone, Deserialize)]
pub struct DecideRegistration {
    pub status: RegistrationStatus,
}
