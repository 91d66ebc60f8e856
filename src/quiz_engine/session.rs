//! Generation lifecycle for one quiz: loading or generating a canonical bank,
//! shuffling it, tracking answers, and submitting them.
//!
//! ## States
//!
//! ```text
//! Empty ──begin──▶ Generating ──complete(ok)──▶ Ready
//!                      │                          │
//!                      └──complete(err)──▶ Failed ◀┘ (via begin → Generating)
//! ```
//!
//! A new presentation and a cleared answer tracker are always installed in a
//! single step, so answers recorded against one permutation can never be read
//! through another. Every generation gets an epoch; a response whose ticket
//! is not the current epoch is discarded. Dropping a [`QuizSession::generate`]
//! future mid-flight moves the session to `Failed`, so it never stays stuck in
//! `Generating`.

use std::sync::Arc;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};
use crate::quiz_engine::{
    bank::QuestionSource,
    config::{EngineConfig, RegenerationPolicy},
    errors::{QuizError, ServiceError},
    models::{
        CreatePlanRequest, GenerationRequest, GenerationResponse, GenerationState, Grounding,
        PlanMetadata, Presentation, QuestionFeedback, Question, Score, SubmissionOutcome,
        SubmissionState,
    },
    reconciler::{reconcile, SubmissionReconciler},
    services::{LearningPlanStore, QuestionGenerator},
    shuffle::build_presentation,
    tracker::{tally, AnswerTracker},
};

/// Proof that a generation was started; hand it back with the response.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    epoch: u64,
    grounding: Grounding,
    pub request: GenerationRequest,
}

impl GenerationTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

pub struct QuizSession {
    config: EngineConfig,
    metadata: PlanMetadata,
    generator: Option<Arc<dyn QuestionGenerator>>,
    store: Option<Arc<dyn LearningPlanStore>>,
    rng: StdRng,
    state: GenerationState,
    epoch: u64,
    source: Option<QuestionSource>,
    grounding: Grounding,
    presentation: Option<Arc<Presentation>>,
    tracker: AnswerTracker,
    learning_plan_id: Option<String>,
}

impl QuizSession {
    pub fn new(config: EngineConfig, metadata: PlanMetadata) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        QuizSession {
            config,
            metadata,
            generator: None,
            store: None,
            rng,
            state: GenerationState::Empty,
            epoch: 0,
            source: None,
            grounding: Grounding::ServiceDefault,
            presentation: None,
            tracker: AnswerTracker::new(0),
            learning_plan_id: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn QuestionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn LearningPlanStore>) -> Self {
        self.store = Some(store);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn submission_state(&self) -> &SubmissionState {
        self.tracker.state()
    }

    /// The bank currently shown to the learner, with its frozen mapping table.
    pub fn presentation(&self) -> Option<&Arc<Presentation>> {
        self.presentation.as_ref()
    }

    pub fn source(&self) -> Option<&QuestionSource> {
        self.source.as_ref()
    }

    pub fn learning_plan_id(&self) -> Option<&str> {
        self.learning_plan_id.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &AnswerTracker {
        &self.tracker
    }

    // -----------------------------------------------------------------------
    // Loading and generation
    // -----------------------------------------------------------------------

    /// Install a built-in bank without calling the generator.
    pub fn load_static(&mut self, bank: Vec<Question>) -> Result<Arc<Presentation>, QuizError> {
        if self.state == GenerationState::Generating {
            return Err(QuizError::GenerationInProgress);
        }
        let epoch = self.epoch + 1;
        let presentation = build_presentation(&mut self.rng, &bank, epoch)?;
        self.epoch = epoch;
        Ok(self.install(presentation, QuestionSource::Static(bank), Grounding::ServiceDefault))
    }

    /// Enter `Generating` and describe the request to send.
    ///
    /// Answers and submission state are cleared immediately. Whether the
    /// visible bank is dropped too depends on the regeneration policy.
    pub fn begin_generation(
        &mut self,
        grounding: Grounding,
        count: Option<usize>,
    ) -> Result<GenerationTicket, QuizError> {
        if self.state == GenerationState::Generating {
            return Err(QuizError::GenerationInProgress);
        }

        self.epoch += 1;
        self.tracker.reset();
        if self.config.regeneration_policy == RegenerationPolicy::ClearOnStart {
            self.presentation = None;
            self.source = None;
            self.learning_plan_id = None;
        }
        self.set_state(GenerationState::Generating);

        let request = GenerationRequest::new(&grounding, self.config.question_count(count));
        Ok(GenerationTicket { epoch: self.epoch, grounding, request })
    }

    /// Apply the generator's answer to a ticket from `begin_generation`.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GenerationResponse, ServiceError>,
    ) -> Result<Arc<Presentation>, QuizError> {
        if ticket.epoch != self.epoch {
            warn!(ticket = ticket.epoch, current = self.epoch, "Discarding superseded generation response");
            return Err(QuizError::StaleGeneration { ticket: ticket.epoch, current: self.epoch });
        }
        if self.state != GenerationState::Generating {
            warn!(ticket = ticket.epoch, state = %self.state, "Generation already settled");
            return Err(QuizError::GenerationSettled(ticket.epoch));
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        if !response.success {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| "question generation was not successful".to_string());
            return Err(self.fail(ServiceError::Rejected(message).into()));
        }
        if response.questions.is_empty() {
            return Err(self.fail(QuizError::EmptyBank));
        }

        match build_presentation(&mut self.rng, &response.questions, ticket.epoch) {
            Ok(presentation) => {
                info!(epoch = ticket.epoch, questions = presentation.len(), "Generated question set ready");
                Ok(self.install(presentation, QuestionSource::Generated(response), ticket.grounding))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Request a fresh question set from the generator and, when persistence
    /// is on, create a learning plan for it.
    ///
    /// A failed plan creation is logged and leaves the session `Ready`.
    pub async fn generate(
        &mut self,
        grounding: Grounding,
        count: Option<usize>,
    ) -> Result<Arc<Presentation>, QuizError> {
        let ticket = self.begin_generation(grounding, count)?;
        let generator = self.generator.clone();

        let pending = PendingGeneration { session: &mut *self, epoch: ticket.epoch, armed: true };
        let result = match generator {
            Some(generator) => generator.generate(&ticket.request).await,
            None => Err(ServiceError::NotConfigured("question generator")),
        };
        pending.disarm();

        let presentation = self.complete_generation(ticket, result)?;

        if self.config.persist_learning_plans && self.store.is_some() {
            if let Err(e) = self.create_learning_plan().await {
                warn!(error = %e, "Learning plan creation failed, answers will not be persisted yet");
            }
        }
        Ok(presentation)
    }

    /// Give up on a generation whose response will never be applied.
    ///
    /// Returns `false` when the ticket is no longer pending. Otherwise the
    /// session moves to `Failed` and accepts new work.
    pub fn abandon_generation(&mut self, ticket: &GenerationTicket) -> bool {
        self.abandon(ticket.epoch)
    }

    /// Create the learning plan for the active canonical bank, once.
    pub async fn create_learning_plan(&mut self) -> Result<String, QuizError> {
        if let Some(id) = &self.learning_plan_id {
            return Ok(id.clone());
        }
        let presentation = self.presentation.clone().ok_or(QuizError::NoQuestions)?;
        let store = self
            .store
            .clone()
            .ok_or(ServiceError::NotConfigured("learning plan store"))?;

        let request = CreatePlanRequest {
            title: self.metadata.title.clone(),
            description: self.metadata.description.clone(),
            grounding_material: self.grounding.material().to_string(),
            canonical_questions: presentation.canonical.clone(),
        };
        let response = store.create_plan(&request).await?;

        match response.learning_plan_id {
            Some(id) if response.success => {
                info!(plan = %id, "Learning plan created");
                self.learning_plan_id = Some(id.clone());
                Ok(id)
            }
            _ => Err(ServiceError::Rejected("learning plan was not created".to_string()).into()),
        }
    }

    // -----------------------------------------------------------------------
    // Answering
    // -----------------------------------------------------------------------

    /// Record a presentation-space selection.
    ///
    /// `Ok(false)` means the quiz is locked and nothing changed.
    pub fn select(&mut self, question_id: &str, presentation_index: usize) -> Result<bool, QuizError> {
        if self.state == GenerationState::Generating {
            return Err(QuizError::GenerationInProgress);
        }
        if self.tracker.state().is_locked() {
            return Ok(false);
        }
        let presentation = self.presentation.as_ref().ok_or(QuizError::NoQuestions)?;
        let question = presentation
            .question(question_id)
            .ok_or_else(|| QuizError::UnknownQuestion(question_id.to_string()))?;
        if presentation_index >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                id: question_id.to_string(),
                index: presentation_index,
                len: question.options.len(),
            });
        }
        Ok(self.tracker.select(question_id, presentation_index))
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    pub fn current_answers(&self) -> &std::collections::BTreeMap<String, usize> {
        self.tracker.current_answers()
    }

    pub fn score(&self) -> Option<Score> {
        self.tracker.score(self.presentation.as_deref()?)
    }

    pub fn feedback(&self) -> Option<Vec<QuestionFeedback>> {
        self.tracker.feedback(self.presentation.as_deref()?)
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Lock the quiz, score it locally, and persist canonical answers.
    ///
    /// Persistence failures do not surface as `Err`: they leave the session
    /// in `SubmitFailed` (still locked) and the outcome reports
    /// `persisted: false`. The local score is returned either way.
    pub async fn submit(&mut self) -> Result<SubmissionOutcome, QuizError> {
        if self.state == GenerationState::Generating {
            return Err(QuizError::GenerationInProgress);
        }
        let presentation = self.presentation.clone().ok_or(QuizError::NoQuestions)?;
        if self.tracker.state().is_locked() {
            return Err(QuizError::AlreadySubmitted);
        }
        if self.tracker.epoch() != presentation.epoch {
            return Err(QuizError::StaleAnswers {
                recorded: self.tracker.epoch(),
                active: presentation.epoch,
            });
        }

        self.tracker.transition(SubmissionState::Submitting);
        let answers = self.tracker.current_answers().clone();
        let score = tally(&answers, &presentation);

        let store = match (&self.store, self.config.persist_learning_plans) {
            (Some(store), true) => store.clone(),
            _ => {
                debug!(%score, "Persistence disabled, quiz scored locally");
                self.tracker.transition(SubmissionState::Submitted);
                return Ok(SubmissionOutcome {
                    score,
                    canonical_answers: reconcile(&answers, &presentation.mappings),
                    learning_plan_id: None,
                    persisted: false,
                });
            }
        };

        let plan_id = match self.create_learning_plan().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "No learning plan to submit to");
                self.tracker.transition(SubmissionState::SubmitFailed { message: e.to_string() });
                return Ok(SubmissionOutcome {
                    score,
                    canonical_answers: reconcile(&answers, &presentation.mappings),
                    learning_plan_id: None,
                    persisted: false,
                });
            }
        };

        let report = SubmissionReconciler::new(store)
            .submit(&answers, &presentation.mappings, &plan_id, score)
            .await;

        let persisted = match report.ack {
            Ok(_) => {
                self.tracker.transition(SubmissionState::Submitted);
                true
            }
            Err(e) => {
                self.tracker.transition(SubmissionState::SubmitFailed { message: e.to_string() });
                false
            }
        };

        Ok(SubmissionOutcome {
            score,
            canonical_answers: report.canonical_answers,
            learning_plan_id: Some(plan_id),
            persisted,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// New bank and empty tracker in one step.
    fn install(
        &mut self,
        presentation: Presentation,
        source: QuestionSource,
        grounding: Grounding,
    ) -> Arc<Presentation> {
        let presentation = Arc::new(presentation);
        self.tracker.rebind(presentation.epoch);
        self.presentation = Some(presentation.clone());
        self.source = Some(source);
        self.grounding = grounding;
        self.learning_plan_id = None;
        self.set_state(GenerationState::Ready);
        presentation
    }

    fn fail(&mut self, error: QuizError) -> QuizError {
        warn!(error = %error, "Question generation failed");
        self.set_state(GenerationState::Failed { message: error.to_string() });
        error
    }

    fn abandon(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || self.state != GenerationState::Generating {
            return false;
        }
        warn!(epoch, "Generation abandoned before a response arrived");
        self.set_state(GenerationState::Failed { message: "generation abandoned".to_string() });
        true
    }

    fn set_state(&mut self, next: GenerationState) {
        debug!(from = %self.state, to = %next, "Generation state transition");
        self.state = next;
    }
}

/// Held across the generator call in [`QuizSession::generate`]. If the future
/// is dropped before the response arrives, the generation is abandoned.
struct PendingGeneration<'a> {
    session: &'a mut QuizSession,
    epoch: u64,
    armed: bool,
}

impl PendingGeneration<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGeneration<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon(self.epoch);
        }
    }
}
