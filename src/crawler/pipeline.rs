//! Crawl pipeline - the self-feeding crawl loop
//!
//! The pipeline owns two bounded queues and the two stages that consume them:
//! - Ingestion: raw URLs -> filter chain -> filtered queue
//! - Dispatch: filtered URLs -> counter and event -> fetch task
//!
//! Each fetch task fetches a page, extracts its links, resolves them and
//! submits them back into ingestion. Nothing ends the cycle except
//! [`Pipeline::shutdown`]. There is no visited set, so a URL reachable
//! through several pages is fetched once per path.
//!
//! The backpressure policy applies to outside submissions. Links found by
//! fetch tasks never wait for queue space: when the ingestion queue is full
//! they are dropped with a warning, so finished fetch tasks cannot pile up
//! behind a slow ingestion stage.

use crate::config::{Backpressure, Config, CrawlerConfig};
use crate::crawler::extractor::LinkExtractor;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::filter::{FilterChain, FilterPredicate};
use crate::output::{CrawlEvent, CrawlObserver};
use crate::state::{CrawlCounter, UrlState};
use crate::url::{resolve, CrawlTarget};
use crate::{CrawlError, SubmitError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

/// Concurrency limits of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Maximum number of concurrent fetches
    pub workers: usize,

    /// Capacity of the ingestion and filtered queues
    pub queue_capacity: usize,

    /// What producers do when a queue is full
    pub backpressure: Backpressure,
}

impl PipelineSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            workers: config.workers,
            queue_capacity: config.queue_capacity,
            backpressure: config.backpressure,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: crate::config::default_workers(),
            queue_capacity: crate::config::default_queue_capacity(),
            backpressure: Backpressure::Block,
        }
    }
}

/// Producer handle for one of the pipeline queues
#[derive(Debug, Clone)]
pub struct Submitter {
    sender: mpsc::Sender<String>,
    closed: Arc<AtomicBool>,
    backpressure: Backpressure,
}

impl Submitter {
    /// Pushes a URL into the queue
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The URL was queued
    /// * `Err(SubmitError::Closed)` - The pipeline was shut down
    /// * `Err(SubmitError::QueueFull)` - The queue is full and the policy is
    ///   `Backpressure::Reject`
    pub async fn submit(&self, url: impl Into<String>) -> Result<(), SubmitError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SubmitError::Closed);
        }

        let url = url.into();
        tracing::trace!("{} {}", UrlState::Raw, url);
        match self.backpressure {
            Backpressure::Block => self
                .sender
                .send(url)
                .await
                .map_err(|_| SubmitError::Closed),
            Backpressure::Reject => self.try_send(url),
        }
    }

    /// Pushes a URL without waiting, whatever the backpressure policy
    ///
    /// A full queue returns `SubmitError::QueueFull`.
    pub fn try_submit(&self, url: impl Into<String>) -> Result<(), SubmitError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SubmitError::Closed);
        }

        let url = url.into();
        tracing::trace!("{} {}", UrlState::Raw, url);
        self.try_send(url)
    }

    fn try_send(&self, url: String) -> Result<(), SubmitError> {
        self.sender.try_send(url).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Closed(_) => SubmitError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.sender.is_closed()
    }
}

/// Everything the stage tasks share
struct StageContext {
    target: Arc<CrawlTarget>,
    filters: FilterChain,
    extractor: LinkExtractor,
    fetcher: Arc<dyn Fetcher>,
    observers: Vec<Arc<dyn CrawlObserver>>,
    counter: Arc<CrawlCounter>,
    workers: Arc<Semaphore>,
    ingest: Submitter,
    filtered: Submitter,
}

impl StageContext {
    fn emit(&self, event: CrawlEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }
}

/// The crawl pipeline
///
/// Configure it with the builder methods, call [`run`](Pipeline::run), then
/// feed it seeds with [`submit`](Pipeline::submit).
pub struct Pipeline {
    target: Arc<CrawlTarget>,
    filters: FilterChain,
    extractor: LinkExtractor,
    fetcher: Arc<dyn Fetcher>,
    observers: Vec<Arc<dyn CrawlObserver>>,
    counter: Arc<CrawlCounter>,
    settings: PipelineSettings,
    ingest: Submitter,
    filtered: Submitter,
    receivers: Option<(mpsc::Receiver<String>, mpsc::Receiver<String>)>,
    closed: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    stages: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Creates a pipeline with the default host-contains filter chain and
    /// the default link extractor
    ///
    /// # Arguments
    ///
    /// * `target` - The crawl target
    /// * `fetcher` - Loads page bodies
    /// * `settings` - Concurrency limits
    pub fn new(target: CrawlTarget, fetcher: Arc<dyn Fetcher>, settings: PipelineSettings) -> Self {
        let capacity = settings.queue_capacity.max(1);
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        let (filtered_tx, filtered_rx) = mpsc::channel(capacity);
        let closed = Arc::new(AtomicBool::new(false));
        let (shutdown, _) = watch::channel(false);

        Self {
            target: Arc::new(target),
            filters: FilterChain::host_contains(),
            extractor: LinkExtractor::new(),
            fetcher,
            observers: Vec::new(),
            counter: Arc::new(CrawlCounter::new()),
            settings,
            ingest: Submitter {
                sender: raw_tx,
                closed: Arc::clone(&closed),
                backpressure: settings.backpressure,
            },
            filtered: Submitter {
                sender: filtered_tx,
                closed: Arc::clone(&closed),
                backpressure: settings.backpressure,
            },
            receivers: Some((raw_rx, filtered_rx)),
            closed,
            shutdown,
            stages: Vec::new(),
        }
    }

    /// Creates a pipeline from configuration, fetching over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Pipeline ready to run
    /// * `Err(CrawlError)` - The seed, a filter, the link pattern, or the
    ///   HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let mut target = CrawlTarget::from_seed(&config.crawler.seed)?;
        if let Some(host) = &config.crawler.host {
            target = target.with_host(host.clone());
        }

        let fetcher = HttpFetcher::from_config(&config.http)?;
        let filters = FilterChain::from_config(config.filters.as_deref())?;
        let extractor = match &config.crawler.link_pattern {
            Some(pattern) => LinkExtractor::with_pattern(pattern)?,
            None => LinkExtractor::new(),
        };

        Ok(Self::new(
            target,
            Arc::new(fetcher),
            PipelineSettings::from_config(&config.crawler),
        )
        .with_filters(filters)
        .with_extractor(extractor))
    }

    /// Appends a predicate to the filter chain
    pub fn with_filter(mut self, predicate: impl FilterPredicate + 'static) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Replaces the filter chain
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_extractor(mut self, extractor: LinkExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Spawns the ingestion and dispatch stages and returns immediately
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Both stages are running
    /// * `Err(CrawlError::AlreadyRunning)` - `run` was already called
    pub fn run(&mut self) -> Result<(), CrawlError> {
        let (raw_rx, filtered_rx) = self.receivers.take().ok_or(CrawlError::AlreadyRunning)?;

        let context = Arc::new(StageContext {
            target: Arc::clone(&self.target),
            filters: std::mem::take(&mut self.filters),
            extractor: self.extractor.clone(),
            fetcher: Arc::clone(&self.fetcher),
            observers: std::mem::take(&mut self.observers),
            counter: Arc::clone(&self.counter),
            workers: Arc::new(Semaphore::new(self.settings.workers.max(1))),
            ingest: self.ingest.clone(),
            filtered: self.filtered.clone(),
        });

        tracing::info!(
            "Starting crawl pipeline for {} (workers: {}, queue capacity: {}, {} filters: {:?})",
            self.target,
            self.settings.workers,
            self.settings.queue_capacity,
            context.filters.len(),
            context.filters.names()
        );
        if context.filters.is_empty() {
            tracing::warn!("Filter chain is empty, every URL will be crawled");
        }

        self.stages.push(tokio::spawn(ingestion_stage(
            Arc::clone(&context),
            raw_rx,
            self.shutdown.subscribe(),
        )));
        self.stages.push(tokio::spawn(dispatch_stage(
            context,
            filtered_rx,
            self.shutdown.subscribe(),
        )));

        Ok(())
    }

    /// Injects a raw URL into the ingestion stream
    pub async fn submit(&self, url: impl Into<String>) -> Result<(), SubmitError> {
        self.ingest.submit(url).await
    }

    /// Returns a handle that can submit URLs from other tasks
    pub fn submitter(&self) -> Submitter {
        self.ingest.clone()
    }

    /// Closes both streams
    ///
    /// Later submissions fail with `SubmitError::Closed`. Each stage exits
    /// once the items already queued have drained. Raw URLs still queued are
    /// filtered (rejections are still reported) and then discarded instead of
    /// dispatched. Filtered URLs still queued are counted and fetched. Fetch
    /// tasks in flight are neither cancelled nor awaited; their resubmissions
    /// are discarded.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!(
            "Shutting down crawl pipeline after {} accepted URLs",
            self.counter.get()
        );
        self.shutdown.send_replace(true);
    }

    /// Waits for both stages to exit
    pub async fn stopped(&mut self) {
        for stage in self.stages.drain(..) {
            if let Err(e) = stage.await {
                tracing::error!("Pipeline stage panicked: {}", e);
            }
        }
    }

    pub fn counter(&self) -> Arc<CrawlCounter> {
        Arc::clone(&self.counter)
    }

    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    pub fn is_running(&self) -> bool {
        self.receivers.is_none() && !self.is_shut_down()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Builds a pipeline from configuration, starts it and submits the seed
///
/// # Example
///
/// ```no_run
/// use hostcrawl::config::load_config;
/// use hostcrawl::crawler::start_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let mut pipeline = start_crawl(&config).await?;
/// tokio::signal::ctrl_c().await?;
/// pipeline.shutdown();
/// pipeline.stopped().await;
/// # Ok(())
/// # }
/// ```
pub async fn start_crawl(config: &Config) -> Result<Pipeline, CrawlError> {
    let mut pipeline = Pipeline::from_config(config)?;
    pipeline.run()?;
    pipeline.submit(config.crawler.seed.trim()).await?;
    Ok(pipeline)
}

/// Consumes raw URLs and forwards the ones every filter admits
async fn ingestion_stage(
    context: Arc<StageContext>,
    mut urls: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut closing = *shutdown.borrow();
    if closing {
        urls.close();
    }

    loop {
        tokio::select! {
            // A dropped pipeline counts as a shutdown
            _ = shutdown.changed(), if !closing => {
                closing = true;
                urls.close();
            }
            next = urls.recv() => match next {
                Some(url) => filter_url(&context, url).await,
                None => break,
            },
        }
    }

    tracing::debug!("Ingestion stage stopped");
}

/// Moves a URL to its next lifecycle state
///
/// Debug builds panic on a transition the pipeline does not define.
fn advance(url: &str, from: UrlState, to: UrlState) -> UrlState {
    debug_assert!(
        from.can_transition_to(to),
        "invalid transition {} -> {} for {}",
        from,
        to,
        url
    );
    tracing::trace!("{} -> {}: {}", from, to, url);
    to
}

async fn filter_url(context: &StageContext, url: String) {
    let state = advance(&url, UrlState::Raw, UrlState::Filtering);

    if let Some(filter) = context.filters.first_rejection(&url, &context.target) {
        advance(&url, state, UrlState::Rejected);
        tracing::trace!("Rejected by {}: {}", filter, url);
        let filter = filter.to_string();
        context.emit(CrawlEvent::Rejected { url, filter });
        return;
    }

    advance(&url, state, UrlState::Filtered);
    match context.filtered.submit(url.clone()).await {
        Ok(()) => {}
        Err(SubmitError::QueueFull) => {
            tracing::warn!("Filtered queue full, dropping {}", url);
        }
        Err(SubmitError::Closed) => {
            tracing::info!("Pipeline shut down, discarding queued {}", url);
        }
    }
}

/// Consumes filtered URLs, counts them and spawns a fetch task for each
async fn dispatch_stage(
    context: Arc<StageContext>,
    mut urls: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut closing = *shutdown.borrow();
    if closing {
        urls.close();
    }

    loop {
        tokio::select! {
            _ = shutdown.changed(), if !closing => {
                closing = true;
                urls.close();
            }
            next = urls.recv() => match next {
                Some(url) => dispatch_url(&context, url).await,
                None => break,
            },
        }
    }

    tracing::debug!("Dispatch stage stopped");
}

async fn dispatch_url(context: &Arc<StageContext>, url: String) {
    let count = context.counter.increment();
    tracing::info!("[{}] {}", count, url);
    context.emit(CrawlEvent::Accepted {
        url: url.clone(),
        count,
    });

    let permit = match Arc::clone(&context.workers).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return,
    };

    tokio::spawn(crawl_page(Arc::clone(context), url, permit));
}

/// Fetches one page and feeds its links back into ingestion
async fn crawl_page(context: Arc<StageContext>, url: String, permit: OwnedSemaphorePermit) {
    let state = advance(&url, UrlState::Filtered, UrlState::Fetching);
    tracing::debug!("Fetching {}", url);

    let body = match context.fetcher.fetch(&url).await {
        Ok(body) => body,
        Err(e) => {
            advance(&url, state, UrlState::FetchFailed);
            tracing::warn!("{}", e);
            context.emit(CrawlEvent::FetchFailed {
                url,
                error: e.to_string(),
            });
            return;
        }
    };

    let state = advance(&url, state, UrlState::Fetched);
    drop(permit);

    let state = advance(&url, state, UrlState::Extracting);
    let links = resolve_links(&context, &url, &body);
    tracing::debug!("Extracted {} links from {}", links.len(), url);

    let mut submitted = 0;
    for link in links {
        match context.ingest.try_submit(link) {
            Ok(()) => submitted += 1,
            Err(SubmitError::QueueFull) => {
                tracing::warn!("Ingestion queue full, dropping a link from {}", url);
            }
            Err(SubmitError::Closed) => {
                tracing::debug!("Pipeline shut down, discarding remaining links from {}", url);
                break;
            }
        }
    }

    advance(&url, state, UrlState::Done);
    context.emit(CrawlEvent::Fetched {
        url,
        links: submitted,
    });
}

/// Extracts candidate links from `body` and resolves them against `page_url`
///
/// Malformed candidates are skipped without affecting the others.
fn resolve_links(context: &StageContext, page_url: &str, body: &str) -> Vec<String> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(e) => {
            tracing::debug!("Cannot resolve links against {}: {}", page_url, e);
            return Vec::new();
        }
    };

    context
        .extractor
        .extract(body)
        .filter_map(|candidate| match resolve(&base, candidate, &context.target) {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::debug!("Discarding link on {}: {}", page_url, e);
                None
            }
        })
        .collect()
}
