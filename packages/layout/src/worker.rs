//! # Background layout
//!
//! Pagination is CPU-bound, so jobs run on tokio's blocking pool. Finished
//! layouts are published on a `watch` channel; readers always see the last
//! layout that completed for a generation no older than the one shown.
//! A job whose generation was superseded while it ran publishes nothing.

use crate::cancel::CancelToken;
use crate::errors::LayoutError;
use crate::layout::PageLayout;
use crate::measure::{MonospaceMeasurer, TextMeasurer};
use crate::paginator::Paginator;
use scriptory_document::{BlockId, TreeSnapshot};
use scriptory_templates::Template;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Everything a pagination run needs, detached from the live document
#[derive(Debug, Clone)]
pub struct LayoutJob {
    pub snapshot: TreeSnapshot,
    pub template: Arc<Template>,
    /// Layout to resume from; `None` paginates in full
    pub previous: Option<Arc<PageLayout>>,
    pub first_dirty: Option<BlockId>,
    pub cancel: CancelToken,
}

impl LayoutJob {
    pub fn generation(&self) -> u64 {
        self.cancel.generation()
    }

    /// Run the job on the current thread.
    pub fn execute(&self, measurer: &dyn TextMeasurer) -> Result<PageLayout, LayoutError> {
        let paginator = Paginator::new(&self.template, measurer).with_cancel(self.cancel.clone());
        match &self.previous {
            Some(previous) => paginator.recompute_from(previous, &self.snapshot, self.first_dirty),
            None => paginator.paginate(&self.snapshot),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishedLayout {
    pub generation: u64,
    pub layout: Arc<PageLayout>,
}

pub struct LayoutWorker {
    measurer: Arc<dyn TextMeasurer>,
    published: watch::Sender<Option<PublishedLayout>>,
}

impl LayoutWorker {
    pub fn new() -> Self {
        Self::with_measurer(Arc::new(MonospaceMeasurer::courier()))
    }

    pub fn with_measurer(measurer: Arc<dyn TextMeasurer>) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            measurer,
            published,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PublishedLayout>> {
        self.published.subscribe()
    }

    /// Last published layout
    pub fn latest(&self) -> Option<PublishedLayout> {
        self.published.borrow().clone()
    }

    /// Paginate on the blocking pool and publish the result if still current.
    pub async fn run(&self, job: LayoutJob) -> Result<Arc<PageLayout>, LayoutError> {
        let generation = job.generation();
        let cancel = job.cancel.clone();
        let measurer = self.measurer.clone();

        let layout = tokio::task::spawn_blocking(move || job.execute(measurer.as_ref()))
            .await
            .map_err(|e| LayoutError::Worker(e.to_string()))??;

        if cancel.is_cancelled() {
            debug!(generation, "Discarding stale layout");
            return Err(LayoutError::Cancelled(generation));
        }

        let layout = Arc::new(layout);
        let published = self.published.send_if_modified(|current| {
            let newer = current
                .as_ref()
                .map(|shown| generation >= shown.generation)
                .unwrap_or(true);
            if newer {
                *current = Some(PublishedLayout {
                    generation,
                    layout: layout.clone(),
                });
            }
            newer
        });
        debug!(generation, published, pages = layout.page_count(), "Layout job finished");
        Ok(layout)
    }

    /// Run a job as a detached task
    pub fn spawn(self: &Arc<Self>, job: LayoutJob) -> JoinHandle<Result<Arc<PageLayout>, LayoutError>> {
        let worker = self.clone();
        tokio::spawn(async move { worker.run(job).await })
    }
}

impl Default for LayoutWorker {
    fn default() -> Self {
        Self::new()
    }
}
