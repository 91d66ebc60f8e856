use std::collections::BTreeMap;
use tracing::debug;
use crate::quiz_engine::models::{Presentation, QuestionFeedback, Score, SubmissionState};

/// Learner selections in presentation space, plus the submission state that
/// decides whether they can still change.
#[derive(Debug, Clone, Default)]
pub struct AnswerTracker {
    answers: BTreeMap<String, usize>,
    state: SubmissionState,
    /// Epoch of the presentation these answers were recorded against.
    epoch: u64,
}

impl AnswerTracker {
    pub fn new(epoch: u64) -> Self {
        AnswerTracker { epoch, ..Default::default() }
    }

    /// Record a selection. Returns `false` (and changes nothing) once locked.
    pub fn select(&mut self, question_id: &str, presentation_index: usize) -> bool {
        if self.state.is_locked() {
            debug!(question = question_id, state = %self.state, "Selection ignored, quiz is locked");
            return false;
        }
        self.answers.insert(question_id.to_string(), presentation_index);
        true
    }

    /// Drop every answer and reopen the quiz. Questions are untouched.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.transition(SubmissionState::Unsubmitted);
    }

    /// Start over for a freshly built presentation.
    pub fn rebind(&mut self, epoch: u64) {
        self.reset();
        self.epoch = epoch;
    }

    pub fn current_answers(&self) -> &BTreeMap<String, usize> {
        &self.answers
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub(crate) fn transition(&mut self, next: SubmissionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Submission state transition");
            self.state = next;
        }
    }

    /// Local score; `None` until submission has been initiated.
    pub fn score(&self, bank: &Presentation) -> Option<Score> {
        if !self.state.is_locked() {
            return None;
        }
        Some(tally(&self.answers, bank))
    }

    /// Per-question verdicts, available under the same rule as `score`.
    pub fn feedback(&self, bank: &Presentation) -> Option<Vec<QuestionFeedback>> {
        if !self.state.is_locked() {
            return None;
        }
        let items = bank
            .questions
            .iter()
            .map(|q| {
                let selected = self.answers.get(&q.id).copied();
                QuestionFeedback {
                    id: q.id.clone(),
                    selected,
                    correct_index: q.correct_index,
                    is_correct: selected == Some(q.correct_index),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();
        Some(items)
    }
}

/// Count matches between presentation answers and presentation correct indices.
pub fn tally(answers: &BTreeMap<String, usize>, bank: &Presentation) -> Score {
    let correct = bank
        .questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_index))
        .count();
    Score { correct, total: bank.questions.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz_engine::models::{IndexMapping, MappingTable, PresentationQuestion};

    fn shown(id: &str, correct: usize) -> PresentationQuestion {
        PresentationQuestion {
            id: id.to_string(),
            text: String::new(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_index: correct,
            explanation: format!("{id} explained"),
            mapping: IndexMapping::identity(3),
        }
    }

    fn bank() -> Presentation {
        Presentation {
            epoch: 1,
            canonical: Vec::new(),
            questions: vec![shown("q1", 1), shown("q2", 2)],
            mappings: MappingTable::new(),
        }
    }

    #[test]
    fn score_is_hidden_before_submission() {
        let mut t = AnswerTracker::new(1);
        t.select("q1", 1);
        assert_eq!(t.score(&bank()), None);
    }

    #[test]
    fn score_counts_presentation_matches() {
        let mut t = AnswerTracker::new(1);
        t.select("q1", 1);
        t.select("q2", 0);
        t.transition(SubmissionState::Submitting);
        assert_eq!(t.score(&bank()), Some(Score { correct: 1, total: 2 }));
    }

    #[test]
    fn latest_selection_wins() {
        let mut t = AnswerTracker::new(1);
        t.select("q1", 0);
        t.select("q1", 2);
        assert_eq!(t.current_answers().get("q1"), Some(&2));
    }

    #[test]
    fn locked_tracker_ignores_selections() {
        let mut t = AnswerTracker::new(1);
        t.select("q1", 1);
        t.transition(SubmissionState::Submitted);
        assert!(!t.select("q1", 0));
        assert!(!t.select("q2", 2));
        assert_eq!(t.current_answers().len(), 1);
        assert_eq!(t.current_answers().get("q1"), Some(&1));
    }

    #[test]
    fn reset_clears_and_reopens() {
        let mut t = AnswerTracker::new(1);
        t.select("q1", 1);
        t.transition(SubmissionState::SubmitFailed { message: "offline".into() });
        t.reset();
        assert!(t.current_answers().is_empty());
        assert_eq!(t.state(), &SubmissionState::Unsubmitted);
        assert!(t.select("q2", 2));
    }

    #[test]
    fn feedback_marks_unanswered_as_incorrect() {
        let mut t = AnswerTracker::new(1);
        t.select("q2", 2);
        t.transition(SubmissionState::Submitted);
        let fb = t.feedback(&bank()).unwrap();
        assert!(!fb[0].is_correct);
        assert_eq!(fb[0].selected, None);
        assert!(fb[1].is_correct);
        assert_eq!(fb[1].explanation, "q2 explained");
    }
}
