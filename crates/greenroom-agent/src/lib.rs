//! LLM-facing layer: the narrow provider/enricher interfaces the engine
//! consumes, and the message classifier built on top of them.

pub mod classifier;
pub mod enrich;
pub mod provider;

pub use classifier::{
    BucketUpdate, ClassificationResult, MessageClassifier, UserIntent,
};
pub use enrich::{EnrichError, LinkedInInsights, ProfileEnricher};
pub use provider::{ProviderError, TextProvider};
