//! Session registry and the public conversation API.
//!
//! [`ConversationService`] is the single entry point callers use: hand it a
//! session id, a message and (optionally) the previous state blob, get back
//! the reply, the new blob, and a progress summary. Turns for one session
//! are strictly serialized; different sessions run concurrently.

pub mod error;
pub mod registry;
pub mod service;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use service::{ConversationService, ProcessRequest, TurnOutcome};
