/// Recommendation provider abstraction
///
/// The whole matching problem (mood to perfume, perfume to similar perfumes,
/// image lookup) is delegated to an external generative model. This module
/// keeps that collaborator behind a trait so the session logic can be tested
/// against a mock and the provider swapped without touching the rest of the
/// service.
use crate::{error::ServiceError, models::PerfumeRecommendation};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Failure modes of one outbound call, before normalization.
///
/// These variants exist for logging only. Callers of the provider trait see
/// a single opaque [`ServiceError`]; the distinction between an empty payload,
/// a schema violation and a transport failure never leaves this layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("model returned no textual payload")]
    EmptyResponse,

    #[error("response did not match the declared schema: {0}")]
    MalformedResponse(String),

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Trait for perfume recommendation providers
///
/// One best-effort call per submission: no retry, no streaming, no caching.
/// Implementations must log the technical cause of a failure themselves and
/// return only the opaque normalized error.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Fetch exactly three recommendations for a free-text mood or
    /// perfume-name prompt.
    async fn fetch_recommendations(
        &self,
        prompt: &str,
    ) -> Result<Vec<PerfumeRecommendation>, ServiceError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
