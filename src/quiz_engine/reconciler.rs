use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use crate::quiz_engine::{
    errors::ServiceError,
    models::{MappingTable, Score, SubmitAck, SubmitRequest},
    services::LearningPlanStore,
};

/// Translate presentation-space answers into canonical option positions.
///
/// `mappings` must be the snapshot the answers were recorded against. An
/// answer with no usable mapping is passed through unchanged and logged.
pub fn reconcile(
    answers: &BTreeMap<String, usize>,
    mappings: &MappingTable,
) -> BTreeMap<String, usize> {
    answers
        .iter()
        .map(|(id, &shown)| {
            let canonical = match mappings.get(id).map(|m| m.to_canonical(shown)) {
                Some(Some(c)) => c,
                Some(None) => {
                    warn!(question = %id, index = shown, "Answer outside mapping range, passing through");
                    shown
                }
                None => {
                    warn!(question = %id, index = shown, "No mapping for question, passing through");
                    shown
                }
            };
            (id.clone(), canonical)
        })
        .collect()
}

/// Canonical answers plus what the store said about them.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub canonical_answers: BTreeMap<String, usize>,
    pub ack: Result<SubmitAck, ServiceError>,
}

/// Sends reconciled answers to the learning plan store. One attempt, no retry.
pub struct SubmissionReconciler {
    store: Arc<dyn LearningPlanStore>,
}

impl SubmissionReconciler {
    pub fn new(store: Arc<dyn LearningPlanStore>) -> Self {
        SubmissionReconciler { store }
    }

    pub async fn submit(
        &self,
        answers: &BTreeMap<String, usize>,
        mappings: &MappingTable,
        learning_plan_id: &str,
        score: Score,
    ) -> SubmitReport {
        let canonical_answers = reconcile(answers, mappings);
        let request = SubmitRequest {
            learning_plan_id: learning_plan_id.to_string(),
            canonical_answers: canonical_answers.clone(),
            score: score.correct,
            total: score.total,
            percentage: score.percentage(),
        };

        let ack = match self.store.submit_answers(&request).await {
            Ok(ack) if ack.success => {
                info!(plan = learning_plan_id, %score, "Quiz answers submitted");
                Ok(ack)
            }
            Ok(ack) => Err(ServiceError::Rejected(
                ack.message.unwrap_or_else(|| "submission was not accepted".to_string()),
            )),
            Err(e) => Err(e),
        };

        if let Err(e) = &ack {
            warn!(plan = learning_plan_id, error = %e, "Quiz submission failed");
        }

        SubmitReport { canonical_answers, ack }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz_engine::models::IndexMapping;

    fn table(entries: &[(&str, Vec<usize>)]) -> MappingTable {
        entries
            .iter()
            .map(|(id, slots)| {
                (id.to_string(), IndexMapping::from_permutation(slots.clone()).unwrap())
            })
            .collect()
    }

    #[test]
    fn answers_map_back_to_canonical_positions() {
        let mappings = table(&[("q1", vec![2, 0, 1]), ("q2", vec![1, 0])]);
        let answers = BTreeMap::from([("q1".to_string(), 0), ("q2".to_string(), 0)]);

        let canonical = reconcile(&answers, &mappings);
        assert_eq!(canonical["q1"], 2);
        assert_eq!(canonical["q2"], 1);
    }

    #[test]
    fn missing_mapping_passes_index_through() {
        let mappings = table(&[("q1", vec![1, 0])]);
        let answers = BTreeMap::from([("ghost".to_string(), 3)]);

        let canonical = reconcile(&answers, &mappings);
        assert_eq!(canonical["ghost"], 3);
    }

    #[test]
    fn out_of_range_answer_passes_through() {
        let mappings = table(&[("q1", vec![1, 0])]);
        let answers = BTreeMap::from([("q1".to_string(), 9)]);

        assert_eq!(reconcile(&answers, &mappings)["q1"], 9);
    }
}
