//! Trivia service.

use std::collections::BTreeMap;

use crate::services::change_feed::{ChangeEvent, ChangeFeedService, Collection, publish_logged};
use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use talentshow_common::{AppError, AppResult, IdGenerator};
use talentshow_db::{
    entities::{trivia, trivia_tally},
    repositories::TriviaRepository,
};
use tracing::{debug, info};
use validator::Validate;

/// Most options a question may carry.
pub const MAX_OPTIONS: usize = 10;

/// Trivia service for business logic.
#[derive(Clone)]
pub struct TriviaService {
    trivia_repo: TriviaRepository,
    feed: ChangeFeedService,
    id_gen: IdGenerator,
}

/// Input for creating a trivia question.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTriviaInput {
    #[validate(length(min = 1, max = 500))]
    pub question: String,

    #[validate(length(min = 1, max = 10))]
    pub options: Vec<String>,

    pub correct_option: i32,

    #[serde(default)]
    pub is_active: bool,
}

/// Results card for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaSummary {
    pub trivia_id: String,
    pub question: String,
    pub total_answers: i64,
    pub options: Vec<OptionSummary>,
}

/// One option's line on the results card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSummary {
    pub index: i32,
    pub text: String,
    pub count: i64,
    /// Share of all answers, rounded to a whole percent
    pub percentage: i64,
    pub is_correct: bool,
}

/// Collapse tally rows to a sparse `option index -> count` map.
#[must_use]
pub fn tally_map(rows: Vec<trivia_tally::Model>) -> BTreeMap<i32, i64> {
    rows.into_iter()
        .map(|row| (row.option_index, row.answer_count))
        .collect()
}

impl TriviaService {
    /// Create a new trivia service.
    #[must_use]
    pub const fn new(trivia_repo: TriviaRepository, feed: ChangeFeedService) -> Self {
        Self {
            trivia_repo,
            feed,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a question. Creating it active deactivates every other one.
    pub async fn create_trivia(&self, input: CreateTriviaInput) -> AppResult<trivia::Model> {
        input.validate()?;

        let question = input.question.trim().to_string();
        if question.is_empty() {
            return Err(AppError::Validation("question must not be blank".to_string()));
        }

        let options: Vec<String> = input
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .collect();
        if options.iter().any(String::is_empty) {
            return Err(AppError::Validation("options must not be blank".to_string()));
        }

        let in_range = usize::try_from(input.correct_option).is_ok_and(|i| i < options.len());
        if !in_range {
            return Err(AppError::InvalidOption {
                index: input.correct_option,
                options: options.len(),
            });
        }

        let options = serde_json::to_value(&options)
            .map_err(|e| AppError::Internal(format!("Failed to encode options: {e}")))?;

        let model = trivia::ActiveModel {
            id: Set(self.id_gen.generate()),
            question: Set(question),
            options: Set(options),
            correct_option: Set(input.correct_option),
            is_active: Set(input.is_active),
            created_at: Set(Utc::now().into()),
        };
        let created = self.trivia_repo.create(model).await?;

        info!(trivia_id = %created.id, active = created.is_active, "Trivia created");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::created(Collection::Trivia, &created.id),
        )
        .await;
        Ok(created)
    }

    /// Activate or deactivate a question.
    pub async fn set_trivia_active(&self, id: &str, active: bool) -> AppResult<trivia::Model> {
        if active {
            self.trivia_repo.activate_exclusive(id).await?;
        } else {
            self.trivia_repo.deactivate(id).await?;
        }
        info!(trivia_id = %id, active, "Trivia activation changed");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::updated(Collection::Trivia, id),
        )
        .await;
        self.trivia_repo.get_by_id(id).await
    }

    /// Record one answer and return the updated tallies.
    ///
    /// Answers are not attributed to a voter, so repeats all count. The call
    /// is not retried on transient failures because the increment is not
    /// idempotent.
    pub async fn answer_trivia(
        &self,
        trivia_id: &str,
        option_index: i32,
    ) -> AppResult<BTreeMap<i32, i64>> {
        let trivia = self.trivia_repo.get_by_id(trivia_id).await?;
        if !trivia.is_active {
            return Err(AppError::Conflict(format!(
                "Trivia {trivia_id} is not active"
            )));
        }

        let options = decode_options(&trivia)?;
        let in_range = usize::try_from(option_index).is_ok_and(|i| i < options.len());
        if !in_range {
            return Err(AppError::InvalidOption {
                index: option_index,
                options: options.len(),
            });
        }

        self.trivia_repo
            .increment_tally(trivia_id, option_index)
            .await?;
        debug!(trivia_id = %trivia_id, option_index, "Trivia answer recorded");

        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::updated(Collection::Trivia, trivia_id),
        )
        .await;
        self.results(trivia_id).await
    }

    /// Sparse answer counts. Options nobody picked are absent.
    pub async fn results(&self, trivia_id: &str) -> AppResult<BTreeMap<i32, i64>> {
        Ok(tally_map(self.trivia_repo.tallies(trivia_id).await?))
    }

    /// Totals and rounded percentages for every option.
    pub async fn summary(&self, trivia_id: &str) -> AppResult<TriviaSummary> {
        let trivia = self.trivia_repo.get_by_id(trivia_id).await?;
        let options = decode_options(&trivia)?;
        let results = self.results(trivia_id).await?;
        let total_answers: i64 = results.values().sum();

        let options = (0_i32..)
            .zip(options)
            .map(|(index, text)| {
                let count = results.get(&index).copied().unwrap_or(0);
                let percentage = if total_answers == 0 {
                    0
                } else {
                    (count as f64 * 100.0 / total_answers as f64).round() as i64
                };
                OptionSummary {
                    index,
                    text,
                    count,
                    percentage,
                    is_correct: index == trivia.correct_option,
                }
            })
            .collect();

        Ok(TriviaSummary {
            trivia_id: trivia.id,
            question: trivia.question,
            total_answers,
            options,
        })
    }

    /// Get a question by id.
    pub async fn get_trivia(&self, id: &str) -> AppResult<trivia::Model> {
        self.trivia_repo.get_by_id(id).await
    }

    /// All questions, newest first.
    pub async fn list_trivia(&self) -> AppResult<Vec<trivia::Model>> {
        self.trivia_repo.list_all().await
    }

    /// Delete a question and its tallies.
    pub async fn delete_trivia(&self, id: &str) -> AppResult<()> {
        self.trivia_repo.delete(id).await?;
        info!(trivia_id = %id, "Trivia deleted");
        publish_logged(
            self.feed.as_ref(),
            ChangeEvent::deleted(Collection::Trivia, id),
        )
        .await;
        Ok(())
    }
}

fn decode_options(trivia: &trivia::Model) -> AppResult<Vec<String>> {
    trivia
        .option_list()
        .map_err(|e| AppError::Internal(format!("Trivia {} has malformed options: {e}", trivia.id)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::change_feed::LocalChangeFeed;
    use std::sync::Arc;
    use talentshow_db::test_utils::TestDatabase;

    async fn service() -> (TestDatabase, TriviaService) {
        let db = TestDatabase::new().await.unwrap();
        let service = TriviaService::new(
            TriviaRepository::new(db.connection()),
            Arc::new(LocalChangeFeed::default()),
        );
        (db, service)
    }

    fn colours(active: bool) -> CreateTriviaInput {
        CreateTriviaInput {
            question: "What is the school's main color?".to_string(),
            options: vec![
                "Blue".to_string(),
                "Green".to_string(),
                "Red".to_string(),
                "Purple".to_string(),
            ],
            correct_option: 0,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_answers_count_exactly() {
        let (_db, service) = service().await;
        let trivia = service.create_trivia(colours(true)).await.unwrap();

        for _ in 0..3 {
            service.answer_trivia(&trivia.id, 2).await.unwrap();
        }
        let results = service.answer_trivia(&trivia.id, 0).await.unwrap();

        assert_eq!(results, BTreeMap::from([(0, 1), (2, 3)]));
        assert!(!results.contains_key(&1));
    }

    #[tokio::test]
    async fn test_out_of_range_answer() {
        let (_db, service) = service().await;
        let trivia = service.create_trivia(colours(true)).await.unwrap();

        for index in [4, -1] {
            match service.answer_trivia(&trivia.id, index).await {
                Err(AppError::InvalidOption { index: got, options }) => {
                    assert_eq!(got, index);
                    assert_eq!(options, 4);
                }
                other => panic!("expected InvalidOption, got {other:?}"),
            }
        }
        assert!(service.results(&trivia.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_trivia_rejects_answers() {
        let (_db, service) = service().await;
        let trivia = service.create_trivia(colours(false)).await.unwrap();

        assert!(matches!(
            service.answer_trivia(&trivia.id, 0).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.answer_trivia("missing", 0).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_activation_is_exclusive() {
        let (_db, service) = service().await;
        let first = service.create_trivia(colours(true)).await.unwrap();
        let second = service.create_trivia(colours(true)).await.unwrap();

        assert!(!service.get_trivia(&first.id).await.unwrap().is_active);

        service.set_trivia_active(&first.id, true).await.unwrap();
        assert!(!service.get_trivia(&second.id).await.unwrap().is_active);

        let off = service.set_trivia_active(&first.id, false).await.unwrap();
        assert!(!off.is_active);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_db, service) = service().await;

        let mut blank_option = colours(false);
        blank_option.options[1] = "  ".to_string();
        assert!(matches!(
            service.create_trivia(blank_option).await,
            Err(AppError::Validation(_))
        ));

        let mut no_options = colours(false);
        no_options.options.clear();
        no_options.correct_option = 0;
        assert!(matches!(
            service.create_trivia(no_options).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_correct = colours(false);
        bad_correct.correct_option = 9;
        assert!(matches!(
            service.create_trivia(bad_correct).await,
            Err(AppError::InvalidOption { .. })
        ));
    }

    #[tokio::test]
    async fn test_summary_percentages() {
        let (_db, service) = service().await;
        let trivia = service.create_trivia(colours(true)).await.unwrap();

        let empty = service.summary(&trivia.id).await.unwrap();
        assert_eq!(empty.total_answers, 0);
        assert!(empty.options.iter().all(|o| o.percentage == 0));

        service.answer_trivia(&trivia.id, 0).await.unwrap();
        service.answer_trivia(&trivia.id, 0).await.unwrap();
        service.answer_trivia(&trivia.id, 1).await.unwrap();

        let summary = service.summary(&trivia.id).await.unwrap();
        assert_eq!(summary.total_answers, 3);
        assert_eq!(summary.options[0].percentage, 67);
        assert_eq!(summary.options[1].percentage, 33);
        assert_eq!(summary.options[2].count, 0);
        assert!(summary.options[0].is_correct);
        assert!(!summary.options[1].is_correct);
    }

    #[tokio::test]
    async fn test_delete_trivia() {
        let (_db, service) = service().await;
        let trivia = service.create_trivia(colours(true)).await.unwrap();
        service.answer_trivia(&trivia.id, 1).await.unwrap();

        service.delete_trivia(&trivia.id).await.unwrap();

        assert!(service.results(&trivia.id).await.unwrap().is_empty());
        assert!(matches!(
            service.delete_trivia(&trivia.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_tally_map_is_sparse() {
        let rows = vec![
            trivia_tally::Model {
                trivia_id: "t".to_string(),
                option_index: 3,
                answer_count: 2,
            },
            trivia_tally::Model {
                trivia_id: "t".to_string(),
                option_index: 0,
                answer_count: 5,
            },
        ];
        assert_eq!(tally_map(rows), BTreeMap::from([(0, 5), (3, 2)]));
    }
}
