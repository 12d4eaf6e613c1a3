//! Status enums returned by the Wix APIs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order status.
///
/// Maps to the eCommerce order `status` values. Unrecognised values
/// deserialize as [`OrderStatus::Unknown`] so a new upstream status never
/// breaks the profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Initialized,
    Approved,
    Canceled,
    Pending,
    Rejected,
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initialized => "Initialized",
            Self::Approved => "Approved",
            Self::Canceled => "Canceled",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a member login, registration, or verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginState {
    /// Credentials accepted; a session token was issued.
    Success,
    /// Credentials rejected; see the accompanying error code.
    Failure,
    /// The member must enter the code emailed to them.
    RequireEmailVerification,
    /// The site owner must approve the account first.
    RequireOwnerApproval,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_deserialize() {
        let status: OrderStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(status, OrderStatus::Approved);
    }

    #[test]
    fn test_order_status_unknown_fallback() {
        let status: OrderStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert_eq!(status.to_string(), "Unknown");
    }

    #[test]
    fn test_login_state_deserialize() {
        let state: LoginState = serde_json::from_str("\"REQUIRE_EMAIL_VERIFICATION\"").unwrap();
        assert_eq!(state, LoginState::RequireEmailVerification);
    }
}
