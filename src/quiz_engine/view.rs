use serde_json::{json, Value};
use crate::quiz_engine::{
    models::{GenerationState, PresentationQuestion, SubmissionState},
    session::QuizSession,
};

/// Build one option entry.
fn option_entry(index: usize, label: &str, selected: bool) -> Value {
    json!({ "index": index, "label": label, "selected": selected })
}

/// Build one question card. Answer key and explanation are added later,
/// only once the quiz is locked.
fn question_card(number: usize, q: &PresentationQuestion, selected: Option<usize>) -> Value {
    let options: Vec<Value> = q
        .options
        .iter()
        .enumerate()
        .map(|(i, label)| option_entry(i, label, selected == Some(i)))
        .collect();
    json!({
        "id": q.id,
        "number": number,
        "text": q.text,
        "options": options,
    })
}

fn submission_label(state: &SubmissionState) -> Value {
    match state {
        SubmissionState::SubmitFailed { message } => json!({ "state": state.to_string(), "error": message }),
        _ => json!({ "state": state.to_string() }),
    }
}

/// Render the session for a UI.
///
/// Before submission, questions carry only text and options. After it, each
/// card also gets `correctIndex`, `isCorrect` and `explanation`, and the
/// payload gets the score.
pub fn to_client_json(session: &QuizSession) -> Value {
    let answers = session.current_answers();

    let mut generation = json!({ "state": session.state().to_string() });
    if let GenerationState::Failed { message } = session.state() {
        generation["error"] = json!(message);
    }

    let Some(presentation) = session.presentation() else {
        return json!({
            "generation": generation,
            "submission": submission_label(session.submission_state()),
            "questions": [],
        });
    };

    let feedback = session.feedback();
    let questions: Vec<Value> = presentation
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let mut card = question_card(i + 1, q, answers.get(&q.id).copied());
            if let Some(fb) = feedback.as_ref().and_then(|f| f.iter().find(|f| f.id == q.id)) {
                card["correctIndex"] = json!(fb.correct_index);
                card["isCorrect"] = json!(fb.is_correct);
                card["explanation"] = json!(fb.explanation);
            }
            card
        })
        .collect();

    let mut payload = json!({
        "generation": generation,
        "submission": submission_label(session.submission_state()),
        "learningPlanId": session.learning_plan_id(),
        "questions": questions,
    });

    if let Some(score) = session.score() {
        payload["score"] = json!({
            "correct": score.correct,
            "total": score.total,
            "percentage": score.percentage(),
        });
    }

    payload
}
