//! # learnplan_quiz
//!
//! Quiz engine for learning-plan modules: multiple-choice questions whose
//! options are shuffled for every presentation, scored locally, and
//! persisted in their original (canonical) order.
//!
//! ## How it works
//!
//! 1. Create a [`QuizSession`] from an [`EngineConfig`] and the module's
//!    [`PlanMetadata`], optionally attaching a [`QuestionGenerator`] and a
//!    [`LearningPlanStore`].
//! 2. Either [`QuizSession::load_static`] a built-in bank or call
//!    [`QuizSession::generate`]. The engine validates the canonical
//!    questions, shuffles each question's options with Fisher-Yates, and
//!    freezes the presentation → canonical mapping table for that bank.
//! 3. The learner [`select`](QuizSession::select)s presentation positions.
//! 4. [`QuizSession::submit`] locks the quiz, scores it locally, maps every
//!    answer back through the frozen mapping, and sends the canonical answers
//!    to the store.
//!
//! ## Key properties
//!
//! - **Reversible shuffle**: every presentation carries an [`IndexMapping`]
//!   per question; scoring in presentation space and in canonical space
//!   always agree.
//! - **Atomic regeneration**: a new bank is always installed together with an
//!   empty answer tracker, and late responses from superseded generations
//!   are discarded.
//! - **Lock after submit**: once submitted (successfully or not) selections
//!   are frozen until [`QuizSession::reset`].
//!
//! ## Quick start
//!
//! ```rust
//! use learnplan_quiz::{default_bank, EngineConfig, PlanMetadata, QuizSession};
//!
//! let config = EngineConfig { rng_seed: Some(42), persist_learning_plans: false, ..Default::default() };
//! let mut session = QuizSession::new(config, PlanMetadata::default());
//! let shown = session.load_static(default_bank()).unwrap();
//!
//! for q in &shown.questions {
//!     println!("{}", q.text);
//!     for (i, opt) in q.options.iter().enumerate() {
//!         println!("  [{i}] {opt}");
//!     }
//! }
//! session.select("q1", shown.questions[0].correct_index).unwrap();
//! ```

pub mod quiz_engine;

// Convenience re-exports so callers can use `learnplan_quiz::QuizSession`
// directly without reaching into `quiz_engine::`.
pub use quiz_engine::{
    build_presentation, default_bank, init_tracing, reconcile, to_client_json, AnswerTracker,
    EngineConfig, GenerationState, Grounding, IndexMapping, LearningPlanStore, PlanMetadata,
    Presentation, PresentationQuestion, Question, QuestionGenerator, QuizError, QuizSession,
    RegenerationPolicy, Score, ServiceError, SubmissionOutcome, SubmissionState,
};
