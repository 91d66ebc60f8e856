//! Quiz engine: canonical banks, option shuffling, answer tracking, and
//! reconciliation of answers back to canonical order.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `models`     | Shared types: questions, index mappings, states, collaborator payloads |
//! | `bank`       | Default question bank, integrity checks, tagged question source |
//! | `shuffle`    | Fisher-Yates option shuffle and mapping table construction |
//! | `tracker`    | Presentation-space answers, lock-after-submit, local scoring |
//! | `reconciler` | Presentation → canonical answer translation and submission |
//! | `session`    | Generation lifecycle controller tying everything together |
//! | `services`   | Traits for the question generator and learning plan store |
//! | `http`       | reqwest implementations of those traits |
//! | `view`       | JSON payload for a UI, with the answer key withheld until submit |
//! | `config`     | `EngineConfig` from TOML / environment |
//! | `errors`     | `QuizError`, `ServiceError`, `ConfigError` |
//! | `logging`    | tracing subscriber setup |

pub mod bank;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod services;
pub mod session;
pub mod shuffle;
pub mod tracker;
pub mod view;

// Re-export the public API surface so callers can use
// `quiz_engine::QuizSession` without reaching into sub-modules.
pub use bank::{default_bank, validate_bank, QuestionSource};
pub use config::{EngineConfig, RegenerationPolicy};
pub use errors::{ConfigError, QuizError, ServiceError};
pub use http::{HttpLearningPlanStore, HttpQuestionGenerator};
pub use logging::init_tracing;
pub use models::{
    CreatePlanRequest, CreatePlanResponse, GenerationRequest, GenerationResponse,
    GenerationState, Grounding, IndexMapping, MappingTable, PlanMetadata, Presentation,
    PresentationQuestion, Question, QuestionFeedback, QuestionKind, Score, SubmissionOutcome,
    SubmissionState, SubmitAck, SubmitRequest,
};
pub use reconciler::{reconcile, SubmissionReconciler, SubmitReport};
pub use services::{LearningPlanStore, QuestionGenerator};
pub use session::{GenerationTicket, QuizSession};
pub use shuffle::{build_presentation, permutation, present_with};
pub use tracker::AnswerTracker;
pub use view::to_client_json;
