use rand::Rng;
use crate::quiz_engine::{
    bank::validate_bank,
    errors::QuizError,
    models::{IndexMapping, MappingTable, Presentation, PresentationQuestion, Question},
};

/// Uniform random permutation of `0..n`.
pub fn permutation<R: Rng>(rng: &mut R, n: usize) -> Vec<usize> {
    let mut slots: Vec<usize> = (0..n).collect();

    // Fisher-Yates shuffle
    for i in (1..slots.len()).rev() {
        let j = rng.gen_range(0..=i);
        slots.swap(i, j);
    }

    slots
}

/// Lay out `question` according to `mapping`.
///
/// Position `p` of the result shows canonical option `mapping[p]`.
pub fn present_with(
    question: &Question,
    mapping: IndexMapping,
) -> Result<PresentationQuestion, QuizError> {
    if mapping.len() != question.options.len() {
        return Err(QuizError::InvalidQuestion {
            id: question.id.clone(),
            reason: format!(
                "mapping covers {} options but question has {}",
                mapping.len(),
                question.options.len()
            ),
        });
    }

    let correct_index = mapping
        .to_presentation(question.correct_index)
        .ok_or_else(|| QuizError::InvalidQuestion {
            id: question.id.clone(),
            reason: format!("correct index {} is out of range", question.correct_index),
        })?;

    let options = mapping
        .as_slice()
        .iter()
        .map(|&c| question.options[c].clone())
        .collect();

    Ok(PresentationQuestion {
        id: question.id.clone(),
        text: question.text.clone(),
        options,
        correct_index,
        explanation: question.explanation.clone(),
        mapping,
    })
}

/// Shuffle every question's options and collect the mapping table.
///
/// The whole bank is validated first; one malformed question rejects the batch.
pub fn build_presentation<R: Rng>(
    rng: &mut R,
    canonical: &[Question],
    epoch: u64,
) -> Result<Presentation, QuizError> {
    validate_bank(canonical)?;

    let mut questions = Vec::with_capacity(canonical.len());
    let mut mappings = MappingTable::with_capacity(canonical.len());

    for q in canonical {
        let slots = permutation(rng, q.options.len());
        let mapping = IndexMapping::from_permutation(slots).ok_or_else(|| {
            QuizError::InvalidQuestion {
                id: q.id.clone(),
                reason: "shuffle produced a non-bijective mapping".to_string(),
            }
        })?;
        mappings.insert(q.id.clone(), mapping.clone());
        questions.push(present_with(q, mapping)?);
    }

    Ok(Presentation {
        epoch,
        canonical: canonical.to_vec(),
        questions,
        mappings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn q(id: &str, options: &[&str], correct: usize) -> Question {
        Question::new(
            id,
            format!("Question {id}"),
            options.iter().map(|s| s.to_string()).collect(),
            correct,
            "because",
        )
    }

    #[test]
    fn permutation_covers_every_position_once() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..10 {
            let p = permutation(&mut rng, n);
            let unique: HashSet<usize> = p.iter().copied().collect();
            assert_eq!(p.len(), n);
            assert_eq!(unique.len(), n);
            assert!(p.iter().all(|&c| c < n));
        }
    }

    #[test]
    fn permutation_is_deterministic_with_seed() {
        let make = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            permutation(&mut rng, 12)
        };
        assert_eq!(make(99), make(99));
        assert_ne!(make(99), make(100));
    }

    #[test]
    fn every_arrangement_of_three_options_shows_up() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..600 {
            seen.insert(permutation(&mut rng, 3));
        }
        assert_eq!(seen.len(), 6, "Fisher-Yates must reach all 3! orderings");
    }

    #[test]
    fn explicit_mapping_lays_out_options() {
        let question = q("q1", &["A", "B", "C"], 2);
        let mapping = IndexMapping::from_permutation(vec![2, 0, 1]).unwrap();
        let shown = present_with(&question, mapping).unwrap();

        assert_eq!(shown.options, vec!["C", "A", "B"]);
        assert_eq!(shown.correct_index, 0);
        assert_eq!(shown.mapping.to_canonical(0), Some(2));
    }

    #[test]
    fn mapping_length_mismatch_is_rejected() {
        let question = q("q1", &["A", "B", "C"], 0);
        let mapping = IndexMapping::identity(2);
        assert!(matches!(
            present_with(&question, mapping),
            Err(QuizError::InvalidQuestion { .. })
        ));
    }

    #[test]
    fn correct_option_text_survives_the_shuffle() {
        let bank = vec![
            q("a", &["w", "x", "y", "z"], 3),
            q("b", &["yes", "no"], 0),
            q("c", &["1", "2", "3", "4", "5"], 2),
        ];
        for seed in 0..20u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = build_presentation(&mut rng, &bank, 1).unwrap();
            for (canon, shown) in bank.iter().zip(&p.questions) {
                assert_eq!(shown.id, canon.id);
                assert_eq!(
                    shown.options[shown.correct_index],
                    canon.options[canon.correct_index]
                );
                assert_eq!(p.mappings[&canon.id], shown.mapping);
            }
        }
    }

    #[test]
    fn two_option_questions_still_shuffle() {
        let bank = vec![q("tf", &["true", "false"], 0)];
        let mut flipped = false;
        for seed in 0..32u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let p = build_presentation(&mut rng, &bank, 1).unwrap();
            if p.questions[0].options[0] == "false" {
                flipped = true;
            }
        }
        assert!(flipped, "two-option questions must not be pinned in place");
    }

    #[test]
    fn one_bad_question_rejects_the_whole_batch() {
        let bank = vec![q("ok", &["a", "b"], 1), q("bad", &["a", "b"], 5)];
        let mut rng = StdRng::seed_from_u64(1);
        let err = build_presentation(&mut rng, &bank, 1).unwrap_err();
        assert!(matches!(err, QuizError::InvalidQuestion { ref id, .. } if id == "bad"));
    }
}
