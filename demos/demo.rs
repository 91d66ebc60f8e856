//! Offline walk-through of the quiz engine.
//!
//! Run with: `cargo run --example demo`
//!
//! 1. Loads the built-in knowledge check with a fixed seed, so the shuffle is
//!    the same on every run.
//! 2. Prints each question in presentation order next to the canonical
//!    position every option maps back to.
//! 3. Answers the first two questions correctly and the third one wrong,
//!    submits, and prints the score, the canonical answers that would be
//!    persisted, and the UI payload.
//!
//! Set `RUST_LOG=debug` to see the state transitions.

use learnplan_quiz::{
    default_bank, init_tracing, to_client_json, EngineConfig, PlanMetadata, QuizError, QuizSession,
};

#[tokio::main]
async fn main() -> Result<(), QuizError> {
    init_tracing("info");

    let config = EngineConfig {
        rng_seed: Some(7),
        persist_learning_plans: false,
        ..EngineConfig::default()
    };
    let metadata = PlanMetadata {
        title: "Cardiogenic dyspnea".into(),
        description: "Knowledge check".into(),
    };
    let mut session = QuizSession::new(config, metadata);
    let shown = session.load_static(default_bank())?;

    for (n, q) in shown.questions.iter().enumerate() {
        println!("{}. {}", n + 1, q.text);
        for (i, opt) in q.options.iter().enumerate() {
            let canonical = q.mapping.to_canonical(i).unwrap_or(i);
            println!("   [{i}] {opt}   (canonical #{canonical})");
        }
        println!();
    }

    let last = shown.questions.len() - 1;
    for (n, q) in shown.questions.iter().enumerate() {
        let pick = if n == last { (q.correct_index + 1) % q.options.len() } else { q.correct_index };
        session.select(&q.id, pick)?;
    }

    let outcome = session.submit().await?;
    println!("Score: {}", outcome.score);
    println!("Canonical answers: {:?}", outcome.canonical_answers);
    println!();

    let payload = serde_json::to_string_pretty(&to_client_json(&session)).unwrap_or_default();
    println!("{payload}");
    Ok(())
}
