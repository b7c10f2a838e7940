//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Account role, gating the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Role {
    /// Wire/display form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Self-reported gender, kept for profile display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Wire/display form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// User profile stored in Firestore.
///
/// The coin balance lives on this document so that ledger updates and
/// recovery debits are single-document read-modify-writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (unique, lowercased)
    pub email: String,
    /// Bcrypt password hash; never serialized into API responses
    pub password_hash: String,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Profile picture URL (pre-uploaded by the client)
    pub profile_image: String,
    /// Coin balance; never negative
    #[serde(default)]
    pub coins: u32,
    /// Banned accounts are rejected before any core operation
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub role: Role,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
