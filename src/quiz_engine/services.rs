//! Contracts for the external collaborators the engine talks to.
//!
//! The engine never persists anything itself. It asks a [`QuestionGenerator`]
//! for canonical questions and hands canonical questions and answers to a
//! [`LearningPlanStore`]. Transport, auth headers and storage are the
//! implementor's business; see `http` for the reqwest-backed versions.

use async_trait::async_trait;
use crate::quiz_engine::{
    errors::ServiceError,
    models::{
        CreatePlanRequest, CreatePlanResponse, GenerationRequest, GenerationResponse,
        SubmitAck, SubmitRequest,
    },
};

/// Produces canonical (unshuffled) questions on demand.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ServiceError>;
}

/// Persists learning plans and submitted answers.
#[async_trait]
pub trait LearningPlanStore: Send + Sync {
    async fn create_plan(&self, request: &CreatePlanRequest) -> Result<CreatePlanResponse, ServiceError>;

    async fn submit_answers(&self, request: &SubmitRequest) -> Result<SubmitAck, ServiceError>;
}
