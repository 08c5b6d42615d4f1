//! Authenticated donor identity.

use super::UserId;

/// A verified caller, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorIdentity {
    /// Platform user id.
    pub user_id: UserId,
    /// Email on the account, if shared.
    pub email: Option<String>,
    /// Display name on the account, if shared.
    pub name: Option<String>,
}

impl DonorIdentity {
    /// Identity carrying only a user id.
    #[must_use]
    pub const fn from_user(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            name: None,
        }
    }
}
