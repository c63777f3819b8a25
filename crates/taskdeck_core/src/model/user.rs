//! User directory record.
//!
//! Identity itself is resolved upstream; the core only needs a stable id,
//! a display name for share confirmations, and an email address for the
//! reminder dispatcher.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user.
pub type UserId = Uuid;

/// Directory entry referenced by tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable global ID.
    pub id: UserId,
    /// Unique login/display name.
    pub username: String,
    /// Delivery address for reminders. May be empty; empty addresses are
    /// dropped from recipient lists.
    pub email: String,
}

impl User {
    /// Returns the trimmed email, or `None` when blank.
    pub fn deliverable_email(&self) -> Option<&str> {
        let trimmed = self.email.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}
