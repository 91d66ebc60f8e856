use thiserror::Error;

/// Crate-wide error type for the quiz engine.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("question '{id}' is invalid: {reason}")]
    InvalidQuestion { id: String, reason: String },

    #[error("question id '{0}' appears more than once in the bank")]
    DuplicateQuestionId(String),

    #[error("question bank is empty")]
    EmptyBank,

    #[error("a question set is already being generated")]
    GenerationInProgress,

    #[error("generation {ticket} was superseded by generation {current}")]
    StaleGeneration { ticket: u64, current: u64 },

    #[error("generation {0} has already completed")]
    GenerationSettled(u64),

    #[error("no questions are loaded")]
    NoQuestions,

    #[error("quiz has already been submitted")]
    AlreadySubmitted,

    #[error("answers were recorded against generation {recorded}, active mapping is generation {active}")]
    StaleAnswers { recorded: u64, active: u64 },

    #[error("unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("option {index} is out of range for question '{id}' ({len} options)")]
    OptionOutOfRange { id: String, index: usize, len: usize },

    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Failures reported by (or while talking to) an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("failed to parse service response: {0}")]
    Parse(String),

    #[error("service rejected the request: {0}")]
    Rejected(String),

    #[error("no {0} is configured")]
    NotConfigured(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}
