//! # Editor
//!
//! The coordinator that owns one document while it is being edited.
//!
//! ## Lifecycle
//!
//! ```text
//! Command → Apply → Post-effects → History → Dirty → Paginate → Events
//!             ↓          ↓            ↓                  ↓          ↓
//!          inverse   renumber     undo step         PageLayout  subscribers
//! ```
//!
//! Every successful `apply`, `undo` and `redo` bumps the document version and
//! the layout generation. With `auto_layout` the layout is refreshed before
//! the call returns; otherwise the caller drives it with
//! [`Editor::refresh_layout`] or [`Editor::layout_job`] /
//! [`Editor::accept_layout`].

use crate::commands::{self, Applied, Command};
use crate::continuity::{correct_numbering, reconcile_markers, Effect, PostEffectEngine};
use crate::errors::{CommandError, EditorError};
use crate::events::{CommandResult, EditorEvent, EventBus, RenumberReason};
use crate::pipeline::LayoutPipeline;
use crate::undo_stack::UndoStack;
use scriptory_document::{
    grammar, BlockId, BlockSource, BlockTree, ContinuityLedger, DetachedBlock, DetachedSubtree,
    Document, RevisionId, TreeError,
};
use scriptory_layout::{LayoutError, LayoutJob, LayoutWorker, PageLayout};
use scriptory_templates::{validate, Template, TemplateId, TemplateRegistry, TemplateWarning};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Undo steps kept (0 = unlimited)
    pub max_undo_levels: usize,

    /// Refresh the layout synchronously after every change
    pub auto_layout: bool,

    /// Events buffered per subscriber before slow readers lag
    pub event_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: 100,
            auto_layout: true,
            event_capacity: 256,
        }
    }
}

/// Outcome of [`Editor::import_blocks`]
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Handles of the imported top-level blocks, in order
    pub blocks: Vec<BlockId>,

    /// Template gaps for the imported kinds
    pub warnings: Vec<TemplateWarning>,

    pub result: CommandResult,
}

pub struct Editor {
    document: Document,
    registry: Arc<TemplateRegistry>,
    template_warnings: Vec<TemplateWarning>,
    config: EditorConfig,
    undo_stack: UndoStack,
    effects: PostEffectEngine,
    pipeline: LayoutPipeline,
    events: EventBus,
    version: u64,
}

impl Editor {
    pub fn new(document: Document, registry: Arc<TemplateRegistry>) -> Self {
        Self::with_config(document, registry, EditorConfig::default())
    }

    pub fn with_config(document: Document, registry: Arc<TemplateRegistry>, config: EditorConfig) -> Self {
        let (template, template_warnings) = resolve_template(&document, &registry);
        Self {
            document,
            registry,
            template_warnings,
            undo_stack: UndoStack::with_max_levels(config.max_undo_levels),
            effects: PostEffectEngine::new(),
            pipeline: LayoutPipeline::new(template),
            events: EventBus::new(config.event_capacity),
            config,
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tree(&self) -> &BlockTree {
        &self.document.tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The effective template (after fallback and overrides)
    pub fn template(&self) -> &Arc<Template> {
        self.pipeline.template()
    }

    /// Problems found when the template was resolved
    pub fn template_warnings(&self) -> &[TemplateWarning] {
        &self.template_warnings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Last accepted layout
    pub fn layout(&self) -> Option<&Arc<PageLayout>> {
        self.pipeline.current()
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    // ---- Editing ----

    /// Apply a command, its post-effects, and record one undo step.
    ///
    /// On error nothing has changed.
    pub fn apply(&mut self, command: Command) -> Result<CommandResult, EditorError> {
        let command = self.tag_revision(command);
        let template = self.pipeline.template().clone();

        let primary = command.apply(&mut self.document, &template)?;
        let (secondary, events) = match self.run_effects(&command, &template) {
            Ok(done) => done,
            Err(e) => {
                unwind(&mut self.document, &template, std::slice::from_ref(&primary));
                return Err(e.into());
            }
        };

        if command.is_structural() || matches!(command, Command::EditText { .. }) {
            for block in &primary.touched {
                self.document.revisions.record(*block);
            }
        }

        let touched = touched_by(std::iter::once(&primary).chain(&secondary));
        debug!(command = command.name(), touched = touched.len(), effects = secondary.len(), "Applied");
        self.undo_stack.record(primary, secondary);
        self.finish(touched, events)
    }

    /// Insert `text` at `offset`, carrying the formatting found there
    pub fn type_text(&mut self, block: BlockId, offset: usize, text: &str) -> Result<CommandResult, EditorError> {
        let command = commands::type_text(&self.document, block, offset, text);
        self.apply(command)
    }

    /// Undo the most recent step. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<CommandResult>, EditorError> {
        self.undo_stack.end_batch();
        let Some(batch) = self.undo_stack.pop_undo() else {
            return Ok(None);
        };

        let template = self.pipeline.template().clone();
        match replay(&mut self.document, &template, &batch.inverses) {
            Ok(touched) => {
                debug!(commands = batch.inverses.len(), "Undo");
                self.undo_stack.push_redo(batch);
                self.finish(touched, Vec::new()).map(Some)
            }
            Err(e) => {
                self.undo_stack.push_undo(batch);
                Err(EditorError::History(format!("undo failed: {}", e)))
            }
        }
    }

    /// Redo the most recently undone step
    pub fn redo(&mut self) -> Result<Option<CommandResult>, EditorError> {
        self.undo_stack.end_batch();
        let Some(batch) = self.undo_stack.pop_redo() else {
            return Ok(None);
        };

        let template = self.pipeline.template().clone();
        match replay(&mut self.document, &template, &batch.commands) {
            Ok(touched) => {
                debug!(commands = batch.commands.len(), "Redo");
                self.undo_stack.push_undo(batch);
                self.finish(touched, Vec::new()).map(Some)
            }
            Err(e) => {
                self.undo_stack.push_redo(batch);
                Err(EditorError::History(format!("redo failed: {}", e)))
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.undo_levels()
    }

    /// Commands applied until [`Editor::end_group`] undo as one step
    pub fn begin_coalescing_group(&mut self) {
        self.undo_stack.begin_batch();
    }

    pub fn end_group(&mut self) {
        self.undo_stack.end_batch();
    }

    /// Drop all history and the tombstones only it could bring back.
    pub fn clear_history(&mut self) -> usize {
        self.undo_stack.clear();
        let purged = self.document.tree.purge_tombstones();
        info!(purged, "Cleared undo history");
        purged
    }

    /// Renumber every class now, as one undo step
    pub fn renumber(&mut self) -> Result<CommandResult, EditorError> {
        let template = self.pipeline.template().clone();
        let Effect { commands, events } =
            correct_numbering(&self.document, &template, RenumberReason::Structural);

        let mut applied = Vec::with_capacity(commands.len());
        for command in &commands {
            match command.apply(&mut self.document, &template) {
                Ok(done) => applied.push(done),
                Err(e) => {
                    unwind(&mut self.document, &template, &applied);
                    return Err(e.into());
                }
            }
        }

        let mut applied = applied.into_iter();
        let Some(primary) = applied.next() else {
            return Ok(CommandResult {
                version: self.version,
                touched: Vec::new(),
                events,
            });
        };
        let secondary: Vec<Applied> = applied.collect();
        let touched = touched_by(std::iter::once(&primary).chain(&secondary));
        self.undo_stack.break_coalescing();
        self.undo_stack.record(primary, secondary);
        self.finish(touched, events)
    }

    // ---- Revisions ----

    /// Mark subsequent edits with a new revision
    pub fn open_revision(&mut self, label: impl Into<String>) -> RevisionId {
        let label = label.into();
        let id = self.document.revisions.open(label.clone());
        info!(revision = id.0, %label, "Opened revision");
        id
    }

    pub fn close_revision(&mut self) -> Option<RevisionId> {
        let closed = self.document.revisions.close();
        if let Some(id) = closed {
            info!(revision = id.0, "Closed revision");
        }
        closed
    }

    fn tag_revision(&self, mut command: Command) -> Command {
        let Some(revision) = self.document.revisions.current() else {
            return command;
        };
        if let Command::InsertBlock { runs, .. } | Command::EditText { runs, .. } = &mut command {
            for run in runs.iter_mut() {
                run.format.revision = Some(revision);
            }
        }
        command
    }

    // ---- Import ----

    /// Append blocks under `parent` as one undo step.
    ///
    /// Every subtree is checked against the grammar before anything is
    /// inserted, and numbering is corrected once at the end.
    pub fn import_blocks(
        &mut self,
        parent: BlockId,
        blocks: Vec<DetachedBlock>,
    ) -> Result<ImportReport, EditorError> {
        let document_type = self.document.document_type();
        let parent_kind = self
            .document
            .tree
            .get(parent)
            .map(|block| block.kind)
            .ok_or(TreeError::NotFound(parent))?;

        let subtrees: Vec<DetachedSubtree> = blocks.into_iter().map(DetachedSubtree::new).collect();
        for subtree in &subtrees {
            let kind = subtree.root.kind;
            if !grammar::allows(document_type, parent_kind, kind) {
                return Err(CommandError::ImportRejected {
                    parent_kind,
                    child_kind: kind,
                }
                .into());
            }
            if let Some((parent_kind, child_kind)) = subtree.first_violation(document_type) {
                return Err(CommandError::ImportRejected {
                    parent_kind,
                    child_kind,
                }
                .into());
            }
        }

        let template = self.pipeline.template().clone();
        let start = self.document.tree.children(parent).len();
        let mut kinds = HashSet::new();
        let mut inserted: Vec<Applied> = Vec::with_capacity(subtrees.len());
        for (offset, subtree) in subtrees.into_iter().enumerate() {
            kinds.insert(subtree.root.kind);
            let command = Command::InsertSubtree {
                parent,
                index: start + offset,
                subtree,
            };
            match command.apply(&mut self.document, &template) {
                Ok(done) => inserted.push(done),
                Err(e) => {
                    unwind(&mut self.document, &template, &inserted);
                    return Err(e.into());
                }
            }
        }

        let Effect { commands, events } =
            correct_numbering(&self.document, &template, RenumberReason::Structural);
        let mut renumbered = Vec::with_capacity(commands.len());
        for command in &commands {
            match command.apply(&mut self.document, &template) {
                Ok(done) => renumbered.push(done),
                Err(e) => {
                    unwind(&mut self.document, &template, &renumbered);
                    unwind(&mut self.document, &template, &inserted);
                    return Err(e.into());
                }
            }
        }

        let warnings: Vec<TemplateWarning> = validate(&template)
            .into_iter()
            .filter(|warning| match warning {
                TemplateWarning::MissingStyle { kind, .. } => kinds.contains(kind),
                _ => true,
            })
            .collect();
        for warning in &warnings {
            warn!(?warning, "Imported blocks use an incomplete template");
        }

        let blocks: Vec<BlockId> = inserted.iter().filter_map(|a| a.touched.first().copied()).collect();
        let touched = touched_by(inserted.iter().chain(&renumbered));

        let owns_group = !self.undo_stack.in_batch();
        self.undo_stack.begin_batch();
        if owns_group {
            self.undo_stack.set_batch_description(format!("Import {} blocks", blocks.len()));
        }
        for applied in inserted.into_iter().chain(renumbered) {
            self.undo_stack.record(applied, Vec::new());
        }
        if owns_group {
            self.undo_stack.end_batch();
        }

        info!(blocks = blocks.len(), warnings = warnings.len(), "Imported blocks");
        let result = self.finish(touched, events)?;
        Ok(ImportReport {
            blocks,
            warnings,
            result,
        })
    }

    // ---- Templates ----

    /// Switch the document to another template.
    ///
    /// Numbers are left alone; only the layout is redone.
    pub fn set_template(&mut self, id: TemplateId) -> Result<Vec<EditorEvent>, EditorError> {
        self.document.template_ref = id;
        let (template, warnings) = resolve_template(&self.document, &self.registry);
        self.template_warnings = warnings;
        self.pipeline.set_template(template);
        self.pipeline.clear_cache();

        let mut events: Vec<EditorEvent> = self
            .template_warnings
            .iter()
            .cloned()
            .map(|warning| EditorEvent::TemplateFallback { warning })
            .collect();
        if self.config.auto_layout {
            events.extend(self.relayout()?);
        }
        self.events.publish(&events);
        Ok(events)
    }

    // ---- Layout ----

    /// Paginate now (incrementally from the last layout)
    pub fn refresh_layout(&mut self) -> Result<Vec<EditorEvent>, EditorError> {
        let events = self.relayout()?;
        self.events.publish(&events);
        Ok(events)
    }

    /// Work for a background [`LayoutWorker`]
    pub fn layout_job(&mut self) -> LayoutJob {
        self.pipeline.job(&mut self.document.tree)
    }

    /// Adopt a background result. `None` if the document changed since the
    /// job was taken.
    pub fn accept_layout(&mut self, generation: u64, layout: Arc<PageLayout>) -> Option<Vec<EditorEvent>> {
        let previous = self.pipeline.current().cloned();
        if !self.pipeline.accept(generation, layout.clone()) {
            return None;
        }
        let events = layout_events(
            &mut self.document.continuity,
            self.pipeline.template(),
            previous.as_deref(),
            &layout,
        );
        self.events.publish(&events);
        Some(events)
    }

    /// Run one layout job on `worker` and adopt the result if still current.
    pub async fn layout_in_background(
        &mut self,
        worker: &LayoutWorker,
    ) -> Result<Option<Vec<EditorEvent>>, EditorError> {
        let job = self.layout_job();
        let generation = job.generation();
        match worker.run(job).await {
            Ok(layout) => Ok(self.accept_layout(generation, layout)),
            Err(LayoutError::Cancelled(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn relayout(&mut self) -> Result<Vec<EditorEvent>, EditorError> {
        let previous = self.pipeline.current().cloned();
        let layout = self.pipeline.refresh(&mut self.document.tree)?;
        Ok(layout_events(
            &mut self.document.continuity,
            self.pipeline.template(),
            previous.as_deref(),
            &layout,
        ))
    }

    // ---- Internal ----

    fn run_effects(
        &mut self,
        command: &Command,
        template: &Template,
    ) -> Result<(Vec<Applied>, Vec<EditorEvent>), CommandError> {
        let mut applied = Vec::new();
        let mut events = Vec::new();

        for effect in self.effects.effects() {
            let Effect { commands, events: raised } = effect.analyze(command, &self.document, template);
            for secondary in &commands {
                match secondary.apply(&mut self.document, template) {
                    Ok(done) => applied.push(done),
                    Err(e) => {
                        warn!(effect = effect.name(), error = %e, "Post-effect failed");
                        unwind(&mut self.document, template, &applied);
                        return Err(e);
                    }
                }
            }
            events.extend(raised);
        }
        Ok((applied, events))
    }

    fn finish(&mut self, touched: Vec<BlockId>, mut events: Vec<EditorEvent>) -> Result<CommandResult, EditorError> {
        self.version += 1;
        self.pipeline.invalidate();
        if self.config.auto_layout {
            events.extend(self.relayout()?);
        }
        self.events.publish(&events);
        Ok(CommandResult {
            version: self.version,
            touched,
            events,
        })
    }
}

fn resolve_template(document: &Document, registry: &TemplateRegistry) -> (Arc<Template>, Vec<TemplateWarning>) {
    let (template, fallback) = document.effective_template(registry);
    let warnings: Vec<TemplateWarning> = fallback.into_iter().chain(validate(&template)).collect();
    for warning in &warnings {
        warn!(?warning, template = %template.id.as_str(), "Template problem");
    }
    (template, warnings)
}

/// Apply `commands` in order; on failure undo the ones already applied.
fn replay(document: &mut Document, template: &Template, commands: &[Command]) -> Result<Vec<BlockId>, CommandError> {
    let mut applied = Vec::with_capacity(commands.len());
    for command in commands {
        match command.apply(document, template) {
            Ok(done) => applied.push(done),
            Err(e) => {
                unwind(document, template, &applied);
                return Err(e);
            }
        }
    }
    Ok(touched_by(&applied))
}

/// Revert applied commands, most recent first
fn unwind(document: &mut Document, template: &Template, applied: &[Applied]) {
    for done in applied.iter().rev() {
        for inverse in &done.inverse {
            if let Err(e) = inverse.apply(document, template) {
                warn!(command = inverse.name(), error = %e, "Rollback step failed");
            }
        }
    }
}

fn touched_by<'a>(applied: impl IntoIterator<Item = &'a Applied>) -> Vec<BlockId> {
    let mut seen = HashSet::new();
    applied
        .into_iter()
        .flat_map(|done| done.touched.iter().copied())
        .filter(|block| seen.insert(*block))
        .collect()
}

/// Events a new layout raises: overflows not seen before and marker changes
fn layout_events(
    ledger: &mut ContinuityLedger,
    template: &Template,
    previous: Option<&PageLayout>,
    layout: &PageLayout,
) -> Vec<EditorEvent> {
    let known: HashSet<BlockId> = previous
        .map(|p| p.overflows.iter().map(|o| o.block).collect())
        .unwrap_or_default();

    let mut events: Vec<EditorEvent> = layout
        .overflows
        .iter()
        .filter(|overflow| !known.contains(&overflow.block))
        .map(|overflow| {
            warn!(block = %overflow.block, page = overflow.page, "Block is taller than a page");
            EditorEvent::OverflowWarning {
                block: overflow.block,
                page: overflow.page,
            }
        })
        .collect();
    events.extend(reconcile_markers(ledger, layout, template));
    events
}
