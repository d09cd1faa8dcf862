use crate::models::{MatchResult, UserPreferences};
use crate::services::annotation::AnnotationClient;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Liveness token for one search's annotation tasks
///
/// Each new search bumps the shared generation counter; a task created
/// under an older generation discards its result instead of delivering it.
/// No network-level cancellation is attempted.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer search has started
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }
}

/// Pre-delay before the task at `rank` issues its first network attempt
///
/// Rank 0 (top match) fires immediately; every later card waits
/// `interval * rank`. This spread is the sole backpressure mechanism
/// against the rate-limited endpoint; there is no shared queue or
/// semaphore.
fn stagger_delay(interval: Duration, rank: usize) -> Duration {
    interval * rank as u32
}

/// The single logical consumer of the annotation client
///
/// Spawns one independent asynchronous task per displayed result. Tasks do
/// not share mutable state; each owns its attempt counter inside the client
/// call and delivers through its join handle.
pub struct AnnotationScheduler {
    client: Arc<AnnotationClient>,
    stagger_interval: Duration,
    current_generation: Arc<AtomicU64>,
}

impl AnnotationScheduler {
    pub fn new(client: Arc<AnnotationClient>, stagger_interval: Duration) -> Self {
        Self {
            client,
            stagger_interval,
            current_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn client(&self) -> Arc<AnnotationClient> {
        Arc::clone(&self.client)
    }

    /// Start a new search generation, invalidating all earlier tickets
    pub fn begin_search(&self) -> SearchTicket {
        let generation = self.current_generation.fetch_add(1, Ordering::AcqRel) + 1;
        SearchTicket {
            generation,
            current: Arc::clone(&self.current_generation),
        }
    }

    /// Annotate every non-hard-miss result concurrently with staggered starts
    ///
    /// Consumes the ranked list and returns it in the same order with
    /// annotations applied. Hard misses are skipped entirely. A result that
    /// resolves under a superseded ticket is discarded silently and its
    /// annotation stays `None`.
    pub async fn annotate_ranked(
        &self,
        mut results: Vec<MatchResult>,
        preferences: &UserPreferences,
        ticket: &SearchTicket,
    ) -> Vec<MatchResult> {
        let mut handles = Vec::new();
        let mut display_rank: usize = 0;

        for (index, result) in results.iter().enumerate() {
            if result.is_hard_miss() {
                continue;
            }

            let client = Arc::clone(&self.client);
            let task_prefs = preferences.clone();
            let task_result = result.clone();
            let task_ticket = ticket.clone();
            let delay = stagger_delay(self.stagger_interval, display_rank);
            display_rank += 1;

            handles.push((
                index,
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    if !task_ticket.is_current() {
                        tracing::debug!(
                            "Skipping annotation for venue {}: search superseded before start",
                            task_result.venue.id
                        );
                        return None;
                    }

                    let annotation = client.annotate(&task_result, &task_prefs).await;

                    if !task_ticket.is_current() {
                        tracing::debug!(
                            "Discarding stale annotation for venue {}",
                            task_result.venue.id
                        );
                        return None;
                    }
                    Some(annotation)
                }),
            ));
        }

        for (index, handle) in handles {
            match handle.await {
                Ok(Some(annotation)) => results[index].annotation = Some(annotation),
                Ok(None) => {}
                Err(e) => tracing::warn!("Annotation task failed to join: {}", e),
            }
        }

        results
    }
}
