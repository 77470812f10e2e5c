//! Command handlers for the Play loop context.
//!
//! The handler loads the pool, runs the pure routing decision, and starts a
//! new story when the decision asks for one.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;
use vocastory_core::clock::Clock;
use vocastory_core::error::DomainError;
use vocastory_core::repository::EventRepository;
use vocastory_core::rng::DeterministicRng;
use vocastory_story::application::command_handlers::handle_start_story;
use vocastory_story::application::query_handlers::load_all_stories;
use vocastory_story::domain::aggregates::Story;
use vocastory_story::domain::commands::StartStory;
use vocastory_vocabulary::application::command_handlers::load_word_set;
use vocastory_vocabulary::application::query_handlers::load_all_word_sets;

use crate::domain::commands::Play;
use crate::domain::routing::{PlayMode, RouteDecision, RoutingConfig, plan_route};

/// Where the participant was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PlayDirective {
    /// Vote on the story's current candidates.
    Read {
        /// The story to read.
        story_id: Uuid,
    },
    /// Write the story's next sentence.
    Write {
        /// The story to write in.
        story_id: Uuid,
        /// Whether the story was started for this request.
        created: bool,
    },
    /// Review the completed story.
    Review {
        /// The story to review.
        story_id: Uuid,
    },
    /// Nothing in the pool needs this participant right now.
    NothingAvailable,
}

/// Resolves the pool to the ids of its live word sets.
async fn load_pool(
    requested: &[Uuid],
    repo: &dyn EventRepository,
) -> Result<Vec<Uuid>, DomainError> {
    if requested.is_empty() {
        return Ok(load_all_word_sets(repo)
            .await?
            .into_iter()
            .filter(|w| w.exists())
            .map(|w| w.id)
            .collect());
    }

    let mut pool = Vec::with_capacity(requested.len());
    let mut seen = BTreeSet::new();
    for &word_set_id in requested {
        if !seen.insert(word_set_id) {
            continue;
        }
        let word_set = load_word_set(word_set_id, repo).await?;
        if word_set.is_deleted() {
            debug!(%word_set_id, "skipping deleted word set");
            continue;
        }
        pool.push(word_set_id);
    }
    Ok(pool)
}

/// Handles the `Play` command: picks a story for the user to read, write in,
/// or review.
///
/// The `Mutex` is locked only around the synchronous routing decision so no
/// guard is held across an await point.
///
/// # Errors
///
/// Returns `DomainError::Validation` for unusable routing weights and
/// `DomainError::AggregateNotFound` for an unknown word set id. Errors from
/// starting a new story are passed through.
pub async fn handle_play(
    command: &Play,
    config: &RoutingConfig,
    rng: &Mutex<dyn DeterministicRng + Send>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<PlayDirective, DomainError> {
    config.validate()?;

    let pool = load_pool(&command.word_set_ids, repo).await?;
    let stories: Vec<Story> = load_all_stories(repo)
        .await?
        .into_iter()
        .filter(|s| s.word_set_id().is_some_and(|id| pool.contains(&id)))
        .collect();
    debug!(
        correlation_id = %command.correlation_id,
        word_sets = pool.len(),
        stories = stories.len(),
        "play pool loaded"
    );

    let decision = {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
        plan_route(command.user_id, &stories, &pool, config, &mut *rng_guard)
    };

    let directive = match decision {
        RouteDecision::Story { mode, story_id } => match mode {
            PlayMode::Read => PlayDirective::Read { story_id },
            PlayMode::Write => PlayDirective::Write {
                story_id,
                created: false,
            },
            PlayMode::Review => PlayDirective::Review { story_id },
        },
        RouteDecision::CreateStory { word_set_id } => {
            let started = handle_start_story(
                &StartStory {
                    correlation_id: command.correlation_id,
                    word_set_id,
                    title: None,
                },
                clock,
                repo,
            )
            .await?;
            PlayDirective::Write {
                story_id: started.aggregate_id,
                created: true,
            }
        }
        RouteDecision::NothingAvailable => PlayDirective::NothingAvailable,
    };

    info!(
        correlation_id = %command.correlation_id,
        user_id = %command.user_id,
        ?directive,
        "play routed"
    );
    Ok(directive)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vocastory_story::application::command_handlers::handle_submit_contribution;
    use vocastory_story::domain::commands::SubmitContribution;
    use vocastory_story::domain::lemmatizer::RuleLemmatizer;
    use vocastory_story::domain::validator::ContributionValidator;
    use vocastory_test_support::{FixedClock, InMemoryEventRepository, MockRng, SequenceRng};
    use vocastory_vocabulary::application::command_handlers::{
        handle_create_word_set, handle_delete_word_set,
    };
    use vocastory_vocabulary::domain::commands::{CreateWordSet, DeleteWordSet};

    use super::*;

    async fn create_word_set(repo: &InMemoryEventRepository) -> Uuid {
        handle_create_word_set(
            &CreateWordSet {
                correlation_id: Uuid::new_v4(),
                title: "Animals".to_owned(),
                creator_id: Uuid::new_v4(),
                words: vec!["cat".to_owned(), "run".to_owned()],
            },
            &FixedClock::at_default(),
            repo,
        )
        .await
        .unwrap()
        .aggregate_id
    }

    fn play(user_id: Uuid, word_set_ids: Vec<Uuid>) -> Play {
        Play {
            correlation_id: Uuid::new_v4(),
            user_id,
            word_set_ids,
        }
    }

    fn write_only() -> RoutingConfig {
        RoutingConfig {
            read_weight: 0.0,
            write_weight: 1.0,
            review_weight: 0.0,
            ..RoutingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_play_in_empty_pool_starts_a_story_to_write() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let word_set_id = create_word_set(&repo).await;
        let rng = Mutex::new(MockRng);

        // Act
        let directive = handle_play(
            &play(Uuid::new_v4(), vec![word_set_id]),
            &write_only(),
            &rng,
            &FixedClock::at_default(),
            &repo,
        )
        .await
        .unwrap();

        // Assert
        let PlayDirective::Write { story_id, created } = directive else {
            panic!("expected write directive, got {directive:?}");
        };
        assert!(created);
        let stories = load_all_stories(&repo).await.unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, story_id);
        assert_eq!(stories[0].word_set_id(), Some(word_set_id));
    }

    #[tokio::test]
    async fn test_play_sends_voter_to_story_with_foreign_candidate() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock::at_default();
        let word_set_id = create_word_set(&repo).await;
        let story_id = handle_start_story(
            &StartStory {
                correlation_id: Uuid::new_v4(),
                word_set_id,
                title: None,
            },
            &clock,
            &repo,
        )
        .await
        .unwrap()
        .aggregate_id;
        handle_submit_contribution(
            &SubmitContribution {
                correlation_id: Uuid::new_v4(),
                story_id,
                author_id: Uuid::new_v4(),
                round_index: 0,
                text: "The cat ran.".to_owned(),
            },
            &ContributionValidator::new(Arc::new(RuleLemmatizer::new())),
            &clock,
            &repo,
        )
        .await
        .unwrap();
        let rng = Mutex::new(SequenceRng::new(vec![0]).with_floats(vec![0.1]));

        let directive = handle_play(
            &play(Uuid::new_v4(), Vec::new()),
            &RoutingConfig::default(),
            &rng,
            &clock,
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(directive, PlayDirective::Read { story_id });
    }

    #[tokio::test]
    async fn test_play_with_unknown_word_set_is_not_found() {
        let repo = InMemoryEventRepository::new();
        let missing = Uuid::new_v4();
        let rng = Mutex::new(MockRng);

        let result = handle_play(
            &play(Uuid::new_v4(), vec![missing]),
            &RoutingConfig::default(),
            &rng,
            &FixedClock::at_default(),
            &repo,
        )
        .await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_play_skips_deleted_word_sets() {
        let repo = InMemoryEventRepository::new();
        let word_set_id = create_word_set(&repo).await;
        handle_delete_word_set(
            &DeleteWordSet {
                correlation_id: Uuid::new_v4(),
                word_set_id,
            },
            &FixedClock::at_default(),
            &repo,
        )
        .await
        .unwrap();
        let rng = Mutex::new(MockRng);

        let directive = handle_play(
            &play(Uuid::new_v4(), vec![word_set_id]),
            &write_only(),
            &rng,
            &FixedClock::at_default(),
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(directive, PlayDirective::NothingAvailable);
        assert!(load_all_stories(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_play_rejects_unusable_weights() {
        let repo = InMemoryEventRepository::new();
        let rng = Mutex::new(MockRng);
        let config = RoutingConfig {
            review_weight: f64::NAN,
            ..RoutingConfig::default()
        };

        let result = handle_play(
            &play(Uuid::new_v4(), Vec::new()),
            &config,
            &rng,
            &FixedClock::at_default(),
            &repo,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
