//! Bounded worker pool for concurrent reference resolution.
//!
//! A fixed number of worker tasks consume a shared job queue; each worker
//! extracts its citation's search keys, runs the resolver, and writes the
//! outcome into an entry-keyed result map. Output assembly happens after the
//! join barrier by walking the original reference list, so citation order is
//! preserved no matter which worker finished first.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::search::SearchService;
use crate::{BibResult, Bibliography, Config, ProgressEvent, Reference, keys, resolver};

/// A resolution job for one citation entry.
pub struct BibJob {
    pub reference: Reference,
    pub index: usize,
    pub total: usize,
}

/// A pool of worker tasks that resolve [`BibJob`]s.
///
/// Submit jobs via [`submit()`](ResolvePool::submit); call
/// [`join()`](ResolvePool::join) to close the queue and block until every
/// dispatched job has completed.
pub struct ResolvePool {
    job_tx: async_channel::Sender<BibJob>,
    results: Arc<DashMap<String, BibResult>>,
    workers: Vec<JoinHandle<()>>,
}

impl ResolvePool {
    /// Create a pool with `config.num_workers` worker tasks. The worker
    /// count bounds outbound request concurrency; it does not scale with
    /// the number of submitted jobs.
    pub fn new(
        config: Arc<Config>,
        service: Arc<dyn SearchService>,
        progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
    ) -> Self {
        let (job_tx, job_rx) = async_channel::unbounded::<BibJob>();
        let results: Arc<DashMap<String, BibResult>> = Arc::new(DashMap::new());
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let workers = (0..config.num_workers.max(1))
            .map(|_| {
                tokio::spawn(worker_loop(
                    job_rx.clone(),
                    Arc::clone(&config),
                    Arc::clone(&service),
                    client.clone(),
                    Arc::clone(&results),
                    Arc::clone(&progress),
                ))
            })
            .collect();

        Self {
            job_tx,
            results,
            workers,
        }
    }

    /// Submit a job to the pool.
    pub async fn submit(&self, job: BibJob) {
        let _ = self.job_tx.send(job).await;
    }

    /// Close the queue and wait for every worker to drain (the barrier).
    /// Returns the entry-keyed result map.
    pub async fn join(self) -> Arc<DashMap<String, BibResult>> {
        self.job_tx.close();
        for handle in self.workers {
            let _ = handle.await;
        }
        self.results
    }
}

async fn worker_loop(
    job_rx: async_channel::Receiver<BibJob>,
    config: Arc<Config>,
    service: Arc<dyn SearchService>,
    client: reqwest::Client,
    results: Arc<DashMap<String, BibResult>>,
    progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
) {
    while let Ok(job) = job_rx.recv().await {
        (progress)(ProgressEvent::Resolving {
            index: job.index,
            total: job.total,
            number: job.reference.number,
        });

        let keys = keys::citation_keys(&job.reference.text);
        let result = resolver::resolve(service.as_ref(), &client, &keys, &config).await;

        (progress)(ProgressEvent::Resolved {
            index: job.index,
            total: job.total,
            number: job.reference.number,
            outcome: result.outcome(),
        });

        // One writer per entry key; the scheduler reads only after the barrier.
        results.insert(job.reference.text.clone(), result);
    }
}

/// Resolve every entry of a reference list with bounded concurrency and
/// assemble the [`Bibliography`] in original citation order.
///
/// One entry's error sentinel never cancels or fails the others; it simply
/// occupies that entry's slot in the output.
pub async fn resolve_references(
    refs: &[Reference],
    config: Arc<Config>,
    service: Arc<dyn SearchService>,
    progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
) -> Bibliography {
    if refs.is_empty() {
        return Bibliography::default();
    }

    let total = refs.len();
    tracing::debug!(total, workers = config.num_workers, "resolving references");
    let pool = ResolvePool::new(config, service, Arc::new(progress));

    for (index, reference) in refs.iter().enumerate() {
        pool.submit(BibJob {
            reference: reference.clone(),
            index,
            total,
        })
        .await;
    }

    let results = pool.join().await;

    let entries = refs
        .iter()
        .map(|reference| {
            let result = results
                .get(&reference.text)
                .map(|entry| entry.value().clone())
                .unwrap_or(BibResult::NotFound);
            (reference.clone(), result)
        })
        .collect();

    Bibliography { entries }
}
