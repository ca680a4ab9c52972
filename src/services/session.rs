use serde::Serialize;

use crate::{
    error::{AppError, AppResult, ServiceError},
    models::PerfumeRecommendation,
};

/// User-visible phase of the query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Per-card image lifecycle: one allowed transition, `Primary -> Fallback`,
/// driven by an image-load-failure signal from the frontend. Never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Primary,
    Fallback,
}

/// A recommendation plus the mutable image state that lives beside it.
/// The recommendation itself is never touched after creation.
#[derive(Debug, Clone)]
pub struct ResultCard {
    pub recommendation: PerfumeRecommendation,
    pub image: ImageState,
}

impl ResultCard {
    fn new(recommendation: PerfumeRecommendation) -> Self {
        Self {
            recommendation,
            image: ImageState::Primary,
        }
    }

    /// Switches to the placeholder image. Idempotent: a second failure signal
    /// finds the card already fallen back and changes nothing.
    pub fn mark_image_failed(&mut self) {
        self.image = ImageState::Fallback;
    }
}

/// What `begin_submission` decided to do with the incoming query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The session entered `loading`; the caller must now run the provider
    /// call with this prompt and feed the result back via [`Session::complete`]
    /// together with the generation tag, so an outcome that outlived its own
    /// submission can be told apart from the current one.
    Started { prompt: String, generation: u64 },
    /// Blank after trimming; the submission is silently dropped.
    IgnoredEmpty,
    /// A submission is already in flight. The UI disables input during
    /// loading, so this only fires for misbehaving clients.
    AlreadyLoading,
}

/// The client-side state of one user's query/result lifecycle.
///
/// Transitions: `idle --submit--> loading --success--> ready --reset--> idle`;
/// `loading --failure--> error --reset--> idle`; `error --submit--> loading`.
/// Long-lived and reusable, no terminal state.
#[derive(Debug)]
pub struct Session {
    query: String,
    submitted_query: String,
    status: SessionStatus,
    cards: Option<Vec<ResultCard>>,
    error_message: Option<String>,
    /// Monotonic submission counter; survives `reset` so a completion from
    /// before the reset can never match a submission made after it.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            submitted_query: String::new(),
            status: SessionStatus::Idle,
            cards: None,
            error_message: None,
            generation: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn submitted_query(&self) -> &str {
        &self.submitted_query
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn cards(&self) -> Option<&[ResultCard]> {
        self.cards.as_deref()
    }

    /// Starts a submission. Blank queries are a no-op and never reach the
    /// provider; a submission racing another one is refused.
    ///
    /// The prompt handed back is the query as typed. Only the emptiness check
    /// trims; the model receives the original text.
    pub fn begin_submission(&mut self, query: &str) -> SubmitOutcome {
        if query.trim().is_empty() {
            return SubmitOutcome::IgnoredEmpty;
        }
        if self.status == SessionStatus::Loading {
            return SubmitOutcome::AlreadyLoading;
        }

        self.query = query.to_string();
        self.submitted_query = query.to_string();
        self.error_message = None;
        self.status = SessionStatus::Loading;
        self.generation += 1;

        SubmitOutcome::Started {
            prompt: query.to_string(),
            generation: self.generation,
        }
    }

    /// Applies the outcome of the in-flight call for submission `generation`.
    ///
    /// Only valid while `loading` and only for the submission that is still
    /// current: if a reset (or a reset followed by a fresh submission) raced
    /// the call, the stale outcome is dropped rather than applied to a
    /// submission it does not belong to.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<Vec<PerfumeRecommendation>, ServiceError>,
    ) {
        if self.status != SessionStatus::Loading || generation != self.generation {
            tracing::debug!(
                status = ?self.status,
                outcome_generation = generation,
                current_generation = self.generation,
                "Dropping stale submission outcome"
            );
            return;
        }

        match outcome {
            Ok(recommendations) => {
                self.cards = Some(recommendations.into_iter().map(ResultCard::new).collect());
                self.status = SessionStatus::Ready;
            }
            Err(error) => {
                self.cards = None;
                self.error_message = Some(error.user_message().to_string());
                self.status = SessionStatus::Error;
            }
        }
    }

    /// Clears everything and returns to `idle`. Safe from any state. The
    /// generation counter is kept so in-flight outcomes stay orphaned.
    pub fn reset(&mut self) {
        let generation = self.generation;
        *self = Self::new();
        self.generation = generation;
    }

    /// Flips card `index` to its fallback image. Idempotent per card; other
    /// cards are untouched.
    pub fn mark_image_failed(&mut self, index: usize) -> AppResult<()> {
        let card = self
            .cards
            .as_mut()
            .and_then(|cards| cards.get_mut(index))
            .ok_or_else(|| AppError::NotFound(format!("no result card at index {}", index)))?;

        card.mark_image_failed();
        Ok(())
    }
}
