//! # Layout Pipeline
//!
//! Keeps the page layout in step with the document: Edit → Dirty → Paginate.
//!
//! The pipeline manages:
//! - The edit generation (bumped on every change, so stale background
//!   results are recognised and dropped)
//! - The last accepted layout, which incremental runs resume from
//! - Dirty blocks of jobs that were handed out but never accepted, so the
//!   next job still covers them

use scriptory_document::{BlockId, BlockTree};
use scriptory_layout::{
    Generation, LayoutError, LayoutJob, MonospaceMeasurer, PageLayout, Paginator, TextMeasurer,
};
use scriptory_templates::Template;
use std::sync::Arc;
use tracing::debug;

pub struct LayoutPipeline {
    template: Arc<Template>,
    measurer: Arc<dyn TextMeasurer>,
    generation: Generation,
    current: Option<Arc<PageLayout>>,
    pending: Vec<BlockId>,
}

impl LayoutPipeline {
    pub fn new(template: Arc<Template>) -> Self {
        Self::with_measurer(template, Arc::new(MonospaceMeasurer::courier()))
    }

    pub fn with_measurer(template: Arc<Template>, measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            template,
            measurer,
            generation: Generation::new(),
            current: None,
            pending: Vec::new(),
        }
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Switch templates; the next run paginates in full.
    pub fn set_template(&mut self, template: Arc<Template>) {
        self.template = template;
        self.invalidate();
    }

    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// Record that the document changed. Outstanding jobs become stale.
    pub fn invalidate(&mut self) -> u64 {
        self.generation.bump()
    }

    /// Last accepted layout (if any)
    pub fn current(&self) -> Option<&Arc<PageLayout>> {
        self.current.as_ref()
    }

    /// Forget the cached layout (force a full run next time)
    pub fn clear_cache(&mut self) {
        self.current = None;
        self.pending.clear();
    }

    fn first_dirty(&mut self, tree: &mut BlockTree) -> Option<BlockId> {
        for block in self.pending.drain(..) {
            tree.mark_dirty(block);
        }
        tree.take_first_dirty()
    }

    /// Paginate on the calling thread, resuming from the last layout.
    pub fn refresh(&mut self, tree: &mut BlockTree) -> Result<Arc<PageLayout>, LayoutError> {
        let first_dirty = self.first_dirty(tree);
        let paginator = Paginator::new(&self.template, self.measurer.as_ref());
        let layout = match &self.current {
            Some(previous) => paginator.recompute_from(previous, &*tree, first_dirty)?,
            None => paginator.paginate(&*tree)?,
        };

        let layout = Arc::new(layout);
        debug!(
            generation = self.generation(),
            first_dirty = ?first_dirty,
            pages = layout.page_count(),
            "Layout refreshed"
        );
        self.current = Some(layout.clone());
        Ok(layout)
    }

    /// Package the work for a [`scriptory_layout::LayoutWorker`].
    pub fn job(&mut self, tree: &mut BlockTree) -> LayoutJob {
        let first_dirty = self.first_dirty(tree);
        // Until a layout is accepted the next job must start at least here
        self.pending.extend(first_dirty);

        LayoutJob {
            snapshot: tree.snapshot(),
            template: self.template.clone(),
            previous: self.current.clone(),
            first_dirty,
            cancel: self.generation.token(),
        }
    }

    /// Adopt a finished background layout if it is still current.
    pub fn accept(&mut self, generation: u64, layout: Arc<PageLayout>) -> bool {
        if generation != self.generation() {
            debug!(generation, current = self.generation(), "Rejecting stale layout");
            return false;
        }
        self.current = Some(layout);
        self.pending.clear();
        true
    }
}
