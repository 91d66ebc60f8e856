//! Canonical question banks: the built-in default set, integrity checks, and
//! the tagged source a bank came from.

use std::collections::HashSet;
use crate::quiz_engine::{
    errors::QuizError,
    models::{GenerationResponse, Question},
};

/// Where the active canonical bank came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionSource {
    /// Shipped with the module; no generation was attempted.
    Static(Vec<Question>),
    /// Returned by the question generation service.
    Generated(GenerationResponse),
}

impl QuestionSource {
    pub fn questions(&self) -> &[Question] {
        match self {
            QuestionSource::Static(bank) => bank,
            QuestionSource::Generated(resp) => &resp.questions,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, QuestionSource::Generated(_))
    }
}

/// Check every question before any of them is shuffled.
pub fn validate_bank(bank: &[Question]) -> Result<(), QuizError> {
    if bank.is_empty() {
        return Err(QuizError::EmptyBank);
    }

    let mut ids = HashSet::with_capacity(bank.len());
    for q in bank {
        validate_question(q)?;
        if !ids.insert(q.id.as_str()) {
            return Err(QuizError::DuplicateQuestionId(q.id.clone()));
        }
    }
    Ok(())
}

fn validate_question(q: &Question) -> Result<(), QuizError> {
    let invalid = |reason: String| QuizError::InvalidQuestion { id: q.id.clone(), reason };

    if q.id.trim().is_empty() {
        return Err(invalid("id is empty".to_string()));
    }
    if q.options.len() < 2 {
        return Err(invalid(format!(
            "needs at least 2 options, has {}",
            q.options.len()
        )));
    }
    if q.correct_index >= q.options.len() {
        return Err(invalid(format!(
            "correct index {} is out of range for {} options",
            q.correct_index,
            q.options.len()
        )));
    }
    Ok(())
}

/// The knowledge check shown when a module supplies no questions of its own.
pub fn default_bank() -> Vec<Question> {
    let opts = |v: [&str; 4]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        Question::new(
            "q1",
            "Which finding most strongly supports a cardiogenic cause of dyspnea in this case?",
            opts([
                "Fever of 99.1°F",
                "Bibasilar crackles and cardiomegaly on CXR",
                "Room air SpO₂ of 93%",
                "Respiration rate of 22",
            ]),
            1,
            "Crackles with cardiomegaly on CXR are classic for fluid overload/congestive physiology.",
        ),
        Question::new(
            "q2",
            "Which initial test BEST evaluates fluid status and LV function at bedside?",
            opts([
                "Arterial blood gas",
                "Point-of-care ultrasound (POCUS) with cardiac views",
                "D-dimer",
                "Peak flow meter",
            ]),
            1,
            "POCUS can rapidly assess LV function, IVC dynamics, and B-lines for pulmonary edema.",
        ),
        Question::new(
            "q3",
            "Which immediate intervention is MOST appropriate?",
            opts([
                "Large 2L crystalloid bolus",
                "Begin diuresis and supplemental oxygen as needed",
                "Empiric anticoagulation",
                "Non-action; observe for 24–48h",
            ]),
            1,
            "In suspected cardiogenic pulmonary edema, diuresis and oxygen support are front-line.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_is_valid() {
        let bank = default_bank();
        assert_eq!(bank.len(), 3);
        validate_bank(&bank).unwrap();
    }

    #[test]
    fn empty_bank_is_rejected() {
        assert!(matches!(validate_bank(&[]), Err(QuizError::EmptyBank)));
    }

    #[test]
    fn single_option_question_is_rejected() {
        let q = Question::new("x", "?", vec!["only".into()], 0, "");
        assert!(matches!(
            validate_bank(&[q]),
            Err(QuizError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn out_of_range_correct_index_is_rejected() {
        let q = Question::new("x", "?", vec!["a".into(), "b".into()], 2, "");
        assert!(matches!(
            validate_bank(&[q]),
            Err(QuizError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let a = Question::new("dup", "?", vec!["a".into(), "b".into()], 0, "");
        let b = a.clone();
        assert!(matches!(
            validate_bank(&[a, b]),
            Err(QuizError::DuplicateQuestionId(id)) if id == "dup"
        ));
    }

    #[test]
    fn questions_deserialize_from_camel_case_json() {
        let json = r#"{
            "id": "q9",
            "type": "single",
            "text": "Pick one",
            "options": ["a", "b", "c"],
            "correctIndex": 2,
            "explanation": "c it is"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_index, 2);
        assert_eq!(q.options.len(), 3);
    }
}
