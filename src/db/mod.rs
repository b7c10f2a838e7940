//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{ActivityQueryCursor, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITIES: &str = "activities";
}
