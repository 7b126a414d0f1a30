use common::UserId;
use serde::{Deserialize, Serialize};

/// The authenticated buyer a request acts for.
///
/// Authentication happens outside this crate; callers hand over the
/// identity they already trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl Customer {
    /// Creates a customer identity.
    pub fn new(id: UserId, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }
}
