//! Demo data for a fresh show.

use crate::services::act::{ActService, CreateActInput};
use crate::services::trivia::{CreateTriviaInput, TriviaService};
use serde::Serialize;
use talentshow_common::AppResult;
use tracing::info;

const DEMO_ACTS: &[(&str, &str, &str)] = &[
    (
        "Grade 1 Singing Stars",
        "Grade 1",
        "Beautiful rendition of 'Twinkle Twinkle Little Star'",
    ),
    (
        "Grade 2 Dance Crew",
        "Grade 2",
        "Energetic dance performance to popular music",
    ),
    (
        "Grade 3 Magic Show",
        "Grade 3",
        "Amazing magic tricks and illusions",
    ),
    (
        "Grade 4 Poetry Recital",
        "Grade 4",
        "Original poems about friendship and school",
    ),
    (
        "Grade 5 Instrumental Ensemble",
        "Grade 5",
        "Beautiful piano and violin duet",
    ),
    (
        "Grade 6 Comedy Skit",
        "Grade 6",
        "Hilarious school-themed comedy performance",
    ),
    (
        "Grade 7 Acrobatics",
        "Grade 7",
        "Impressive gymnastics and acrobatic moves",
    ),
];

const DEMO_TRIVIA: &[(&str, [&str; 4], i32)] = &[
    (
        "What is the school motto of Laerskool Broederstroom?",
        [
            "Excellence Through Learning",
            "Growing Together",
            "Knowledge is Power",
            "Success Through Hard Work",
        ],
        1,
    ),
    (
        "Which grade has the most students this year?",
        ["Grade 1", "Grade 3", "Grade 5", "Grade 7"],
        2,
    ),
    (
        "What is the school's favorite sport?",
        ["Soccer", "Rugby", "Cricket", "Netball"],
        1,
    ),
    (
        "How many teachers work at the school?",
        ["15-20", "21-25", "26-30", "31-35"],
        2,
    ),
    (
        "What is the school's main color?",
        ["Blue", "Green", "Red", "Purple"],
        0,
    ),
];

/// Seeds sample acts and trivia through the regular services.
#[derive(Clone)]
pub struct SeedService {
    acts: ActService,
    trivia: TriviaService,
}

/// How many records a seeding run inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeedReport {
    pub acts: usize,
    pub trivia: usize,
}

impl SeedService {
    #[must_use]
    pub const fn new(acts: ActService, trivia: TriviaService) -> Self {
        Self { acts, trivia }
    }

    /// Insert the demo acts and trivia questions.
    ///
    /// A collection that already holds records is left alone, so running
    /// this twice inserts nothing the second time.
    pub async fn seed_demo(&self) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        if self.acts.list_acts().await?.is_empty() {
            for (position, (name, grade, description)) in (1_i32..).zip(DEMO_ACTS) {
                self.acts
                    .create_act(CreateActInput {
                        name: (*name).to_string(),
                        grade: (*grade).to_string(),
                        description: (*description).to_string(),
                        order: Some(position),
                        submitted_by: Some("Admin".to_string()),
                        contact_email: None,
                        contact_phone: None,
                    })
                    .await?;
                report.acts += 1;
            }
        }

        if self.trivia.list_trivia().await?.is_empty() {
            for (question, options, correct) in DEMO_TRIVIA {
                self.trivia
                    .create_trivia(CreateTriviaInput {
                        question: (*question).to_string(),
                        options: options.iter().map(ToString::to_string).collect(),
                        correct_option: *correct,
                        is_active: false,
                    })
                    .await?;
                report.trivia += 1;
            }
        }

        info!(acts = report.acts, trivia = report.trivia, "Demo data seeded");
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::change_feed::{ChangeFeedService, LocalChangeFeed};
    use crate::services::delivery::LogDelivery;
    use crate::services::notification::NotificationService;
    use crate::services::retry::RetryPolicy;
    use std::sync::Arc;
    use talentshow_db::entities::act::ActStatus;
    use talentshow_db::repositories::{ActRepository, NotificationRepository, TriviaRepository};
    use talentshow_db::test_utils::TestDatabase;

    async fn service() -> (TestDatabase, ActService, TriviaService, SeedService) {
        let db = TestDatabase::new().await.unwrap();
        let feed: ChangeFeedService = Arc::new(LocalChangeFeed::default());
        let notifications = NotificationService::new(
            NotificationRepository::new(db.connection()),
            Arc::new(LogDelivery),
            feed.clone(),
        );
        let acts = ActService::new(
            ActRepository::new(db.connection()),
            notifications,
            feed.clone(),
            RetryPolicy::none(),
        );
        let trivia = TriviaService::new(TriviaRepository::new(db.connection()), feed);
        let seed = SeedService::new(acts.clone(), trivia.clone());
        (db, acts, trivia, seed)
    }

    #[tokio::test]
    async fn test_seed_inserts_demo_show() {
        let (_db, acts, trivia, seed) = service().await;

        let report = seed.seed_demo().await.unwrap();

        assert_eq!(report, SeedReport { acts: 7, trivia: 5 });
        let listed = acts.list_acts().await.unwrap();
        let orders: Vec<i32> = listed.iter().map(|a| a.order).collect();
        assert_eq!(orders, (1..=7).collect::<Vec<_>>());
        assert!(listed.iter().all(|a| a.status == ActStatus::Approved));
        assert_eq!(listed[2].name, "Grade 3 Magic Show");
        assert!(trivia.list_trivia().await.unwrap().iter().all(|t| !t.is_active));
    }

    #[tokio::test]
    async fn test_seed_twice_is_a_no_op() {
        let (_db, acts, _trivia, seed) = service().await;
        seed.seed_demo().await.unwrap();

        let again = seed.seed_demo().await.unwrap();

        assert_eq!(again, SeedReport::default());
        assert_eq!(acts.list_acts().await.unwrap().len(), 7);
    }
}
