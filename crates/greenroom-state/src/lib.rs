//! Typed, serializable conversation state.
//!
//! One [`ConversationState`] holds everything a session needs to resume:
//! the bucket entries collected so far, the message log, corrections, and
//! the review/confirmation flags. The JSON form is deterministic (bucket
//! keys serialize in catalog order and message order is preserved), so a
//! serialize/deserialize round trip reproduces the state exactly.

pub mod error;
pub mod store;
pub mod types;

pub use error::StateError;
pub use store::ConversationState;
pub use types::{
    AwaitingConfirmation, BucketEntry, ChatMessage, Correction, Role, StyleProfile,
};
