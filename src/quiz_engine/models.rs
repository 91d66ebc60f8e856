use std::collections::{BTreeMap, HashMap};
use std::fmt;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Exactly one option is correct.
    #[default]
    Single,
}

/// A question in canonical order, exactly as its source produced it.
///
/// Never mutated after creation; regeneration replaces the whole bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Question {
            id: id.into(),
            kind: QuestionKind::Single,
            text: text.into(),
            options,
            correct_index,
            explanation: explanation.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation order
// ---------------------------------------------------------------------------

/// Bijection from presentation-option position to canonical-option position.
///
/// `slots[p] == c` means the option shown at position `p` is canonical option `c`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapping {
    slots: Vec<usize>,
}

impl IndexMapping {
    /// Accepts `slots` only if it is a permutation of `0..slots.len()`.
    pub fn from_permutation(slots: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; slots.len()];
        for &c in &slots {
            match seen.get_mut(c) {
                Some(flag) if !*flag => *flag = true,
                _ => return None,
            }
        }
        Some(IndexMapping { slots })
    }

    pub fn identity(len: usize) -> Self {
        IndexMapping { slots: (0..len).collect() }
    }

    /// Canonical position of the option shown at `presentation`.
    pub fn to_canonical(&self, presentation: usize) -> Option<usize> {
        self.slots.get(presentation).copied()
    }

    /// Presentation position where canonical option `canonical` landed.
    pub fn to_presentation(&self, canonical: usize) -> Option<usize> {
        self.slots.iter().position(|&c| c == canonical)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.slots
    }
}

/// A canonical question with its options permuted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    /// Image of the canonical `correct_index` under `mapping`.
    pub correct_index: usize,
    pub explanation: String,
    pub mapping: IndexMapping,
}

/// Mapping snapshot keyed by question id.
pub type MappingTable = HashMap<String, IndexMapping>;

/// Output of the shuffle builder: one presentation of a whole bank.
///
/// Immutable once built. `epoch` identifies the generation that produced it
/// so answers recorded against it can be matched back to this exact mapping.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub epoch: u64,
    pub canonical: Vec<Question>,
    pub questions: Vec<PresentationQuestion>,
    pub mappings: MappingTable,
}

impl Presentation {
    pub fn question(&self, id: &str) -> Option<&PresentationQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationState {
    #[default]
    Empty,
    Generating,
    Ready,
    Failed { message: String },
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationState::Empty      => write!(f, "empty"),
            GenerationState::Generating => write!(f, "generating"),
            GenerationState::Ready      => write!(f, "ready"),
            GenerationState::Failed { .. } => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Unsubmitted,
    Submitting,
    Submitted,
    /// Terminal like `Submitted`: edits stay locked, nothing is retried.
    SubmitFailed { message: String },
}

impl SubmissionState {
    /// Selections are frozen in every state but `Unsubmitted`.
    pub fn is_locked(&self) -> bool {
        !matches!(self, SubmissionState::Unsubmitted)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Unsubmitted => write!(f, "unsubmitted"),
            SubmissionState::Submitting  => write!(f, "submitting"),
            SubmissionState::Submitted   => write!(f, "submitted"),
            SubmissionState::SubmitFailed { .. } => write!(f, "submit-failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    /// Whole percent, halves rounded up; an empty quiz scores 0.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct * 200 + self.total) / (self.total * 2)) as u32
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ({}%)", self.correct, self.total, self.percentage())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub id: String,
    /// Presentation position the learner picked, if any.
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub is_correct: bool,
    pub explanation: String,
}

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

/// What the generator should ground its questions on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Grounding {
    Topic(String),
    CaseStudy(String),
    /// Let the service fall back to its own corpus.
    #[default]
    ServiceDefault,
}

impl Grounding {
    /// Text stored on the learning plan as its grounding material.
    pub fn material(&self) -> &str {
        match self {
            Grounding::Topic(t) | Grounding::CaseStudy(t) => t,
            Grounding::ServiceDefault => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_study_text: Option<String>,
    pub count: usize,
}

impl GenerationRequest {
    pub fn new(grounding: &Grounding, count: usize) -> Self {
        let (topic, case_study_text) = match grounding {
            Grounding::Topic(t)     => (Some(t.clone()), None),
            Grounding::CaseStudy(t) => (None, Some(t.clone())),
            Grounding::ServiceDefault => (None, None),
        };
        GenerationRequest { topic, case_study_text, count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Descriptive fields of a learning plan, supplied by the hosting module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub title: String,
    pub description: String,
    pub grounding_material: String,
    pub canonical_questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanResponse {
    pub success: bool,
    #[serde(default)]
    pub learning_plan_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub learning_plan_id: String,
    pub canonical_answers: BTreeMap<String, usize>,
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of one submit call. The local score is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub score: Score,
    pub canonical_answers: BTreeMap<String, usize>,
    pub learning_plan_id: Option<String>,
    pub persisted: bool,
}
