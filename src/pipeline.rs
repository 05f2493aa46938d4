//! Batch pipeline: chunked fetch → filter → commit
//!
//! The id range is split into fixed-size chunks. Chunks are fetched one after
//! another, every person in a chunk concurrently. Each chunk's survivors are
//! handed to the sink on a background task, so a chunk's commit overlaps the
//! next chunk's fetches. The run waits for every commit before returning.

use crate::client::SwapiClient;
use crate::person::Person;
use crate::storage::PeopleSink;
use crate::ui::ProgressMessage;
use crate::{Error, Result};
use futures::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// What to do when a person's relations cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the run on the first failed person.
    #[default]
    FailFast,
    /// Log the failure, treat the person as absent and keep going.
    SkipEntity,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail-fast",
            FailurePolicy::SkipEntity => "skip-entity",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "abort" => Ok(FailurePolicy::FailFast),
            "skip-entity" | "skip" | "isolate" => Ok(FailurePolicy::SkipEntity),
            _ => Err(Error::Config(format!("Unknown failure policy: {}", s))),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which ids to fetch and how many per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub ids: RangeInclusive<u32>,
    /// Ids per chunk; also the number of person fetches in flight at once.
    pub chunk_size: usize,
}

impl SyncPlan {
    pub fn new(first_id: u32, last_id: u32, chunk_size: usize) -> Result<Self> {
        if first_id == 0 || first_id > last_id {
            return Err(Error::Config(format!(
                "invalid id range {}..={}: ids start at 1 and must ascend",
                first_id, last_id
            )));
        }
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be at least 1".to_string()));
        }
        Ok(Self {
            ids: first_id..=last_id,
            chunk_size,
        })
    }

    pub fn chunks(&self) -> Vec<Vec<u32>> {
        chunk_ids(self.ids.clone(), self.chunk_size)
    }

    /// Number of ids in the range
    pub fn len(&self) -> usize {
        self.ids.clone().count()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Split an ascending id range into consecutive chunks of at most `chunk_size`.
pub fn chunk_ids(ids: RangeInclusive<u32>, chunk_size: usize) -> Vec<Vec<u32>> {
    let ids: Vec<u32> = ids.collect();
    ids.chunks(chunk_size.max(1)).map(<[u32]>::to_vec).collect()
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub chunks: usize,
    pub requested: usize,
    /// People fetched and resolved
    pub fetched: usize,
    /// Rows written by the sink
    pub stored: usize,
    /// Ids the API reported as unavailable
    pub not_found: Vec<u32>,
    /// Ids dropped under [`FailurePolicy::SkipEntity`]
    pub skipped: Vec<u32>,
    pub elapsed: Duration,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sync Report:")?;
        writeln!(f, "  Chunks: {}", self.chunks)?;
        writeln!(f, "  Ids requested: {}", self.requested)?;
        writeln!(f, "  People fetched: {}", self.fetched)?;
        writeln!(f, "  People stored: {}", self.stored)?;
        writeln!(f, "  Not found: {}", self.not_found.len())?;
        writeln!(f, "  Skipped on error: {}", self.skipped.len())?;
        writeln!(f, "  Elapsed: {:?}", self.elapsed)
    }
}

/// People fetched for one chunk, with the ids that produced nothing.
#[derive(Debug, Default)]
struct ChunkOutcome {
    people: Vec<Person>,
    not_found: Vec<u32>,
    skipped: Vec<u32>,
}

/// Drives a [`SyncPlan`] from the API into a [`PeopleSink`].
pub struct Pipeline {
    client: SwapiClient,
    sink: Arc<dyn PeopleSink>,
    policy: FailurePolicy,
    progress: Option<crossbeam::channel::Sender<ProgressMessage>>,
}

impl Pipeline {
    pub fn new(client: SwapiClient, sink: Arc<dyn PeopleSink>) -> Self {
        Self {
            client,
            sink,
            policy: FailurePolicy::default(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Report chunk progress on a channel (see `ui::ProgressManager`).
    #[must_use]
    pub fn with_progress(mut self, tx: crossbeam::channel::Sender<ProgressMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Fetch every id in the plan and commit each chunk's people.
    ///
    /// On a fetch error (under fail-fast) or a commit error the run stops
    /// dispatching chunks, waits for the commits already started, and returns
    /// the first error.
    pub async fn run(&self, plan: &SyncPlan) -> Result<RunReport> {
        let started = Instant::now();
        let chunks = plan.chunks();
        let mut report = RunReport {
            chunks: chunks.len(),
            requested: plan.len(),
            ..Default::default()
        };

        tracing::info!(
            "Syncing ids {}..={} in {} chunks of up to {}",
            plan.ids.start(),
            plan.ids.end(),
            chunks.len(),
            plan.chunk_size
        );
        self.notify(ProgressMessage::Started {
            chunks: chunks.len(),
            ids: report.requested,
        });

        let mut commits: Vec<JoinHandle<(usize, Result<usize>)>> = Vec::with_capacity(chunks.len());
        let mut failure: Option<Error> = None;

        for (index, ids) in chunks.iter().enumerate() {
            let outcome = match self.fetch_chunk(ids).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("chunk {} failed: {}", index + 1, e);
                    failure = Some(e);
                    break;
                }
            };

            tracing::info!(
                "chunk {}/{}: {} fetched, {} not found, {} skipped",
                index + 1,
                chunks.len(),
                outcome.people.len(),
                outcome.not_found.len(),
                outcome.skipped.len()
            );
            self.notify(ProgressMessage::ChunkFetched {
                chunk: index,
                fetched: outcome.people.len(),
                missing: outcome.not_found.len() + outcome.skipped.len(),
            });

            report.fetched += outcome.people.len();
            report.not_found.extend(outcome.not_found);
            report.skipped.extend(outcome.skipped);

            let sink = Arc::clone(&self.sink);
            let people = outcome.people;
            commits.push(tokio::spawn(async move {
                (index, sink.insert_batch(people).await)
            }));
        }

        for handle in commits {
            match handle.await {
                Ok((index, Ok(rows))) => {
                    tracing::info!("chunk {} committed {} people", index + 1, rows);
                    self.notify(ProgressMessage::ChunkCommitted { chunk: index, rows });
                    report.stored += rows;
                }
                Ok((index, Err(e))) => {
                    tracing::error!("chunk {} commit failed: {}", index + 1, e);
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    failure.get_or_insert(e.into());
                }
            }
        }

        report.elapsed = started.elapsed();
        self.notify(ProgressMessage::Finished);

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Fetch one chunk concurrently and sort the results.
    async fn fetch_chunk(&self, ids: &[u32]) -> Result<ChunkOutcome> {
        let mut outcome = ChunkOutcome::default();

        match self.policy {
            FailurePolicy::FailFast => {
                let results =
                    try_join_all(ids.iter().map(|&id| self.client.fetch_person(id))).await?;
                for (&id, person) in ids.iter().zip(results) {
                    match person {
                        Some(person) => outcome.people.push(person),
                        None => outcome.not_found.push(id),
                    }
                }
            }
            FailurePolicy::SkipEntity => {
                let results = join_all(ids.iter().map(|&id| self.client.fetch_person(id))).await;
                for (&id, result) in ids.iter().zip(results) {
                    match result {
                        Ok(Some(person)) => outcome.people.push(person),
                        Ok(None) => outcome.not_found.push(id),
                        Err(e) => {
                            tracing::warn!("skipping person {}: {}", id, e);
                            self.notify(ProgressMessage::PersonSkipped {
                                id,
                                error: e.to_string(),
                            });
                            outcome.skipped.push(id);
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn notify(&self, msg: ProgressMessage) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(msg);
        }
    }
}
