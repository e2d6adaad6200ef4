//! The static bucket catalog: which pieces of profile information the engine
//! collects, how values are typed, validated and normalized, and the
//! deterministic regex extractors that run before any LLM call.

pub mod bucket;
pub mod extract;
pub mod normalize;
pub mod social;
pub mod validate;
pub mod value;

pub use bucket::{catalog, optional_ids, required_ids, BucketDef, BucketId, Category, DataType};
pub use extract::ExtractedEntities;
pub use value::{SocialProfile, Story, Value};
