//! # Continuity
//!
//! Commands trigger follow-up effects that keep a document consistent.
//!
//! ## Post-effects
//!
//! After a user command is applied, every registered [`PostEffect`] looks at
//! the command and the document and returns secondary commands. They are
//! applied immediately and recorded in the same undo step, so undo and redo
//! replay them exactly and never re-run the effects.
//!
//! - [`FreezeLockedNumbers`] marks numbers as locked when a class (or a
//!   range of it) is locked.
//! - [`Renumber`] brings every numbering class back in line with its lock
//!   state after structural changes.
//!
//! ## Markers
//!
//! MORE / CONT'D markers are not commands. [`reconcile_markers`] compares
//! each new page layout against the document's ledger and reports what was
//! added or removed.
//!
//! Post-effects are:
//! - **Deterministic**: the same command on the same document always
//!   produces the same secondary commands
//! - **Minimal**: a block whose number is already right is left alone

use crate::commands::Command;
use crate::events::{EditorEvent, RenumberReason};
use scriptory_document::{
    suffix_index, suffix_letters, Block, BlockId, BlockSource, ContinuityLedger, Document,
    LockState, NumberLabel, Numbering, SplitMarker,
};
use scriptory_layout::PageLayout;
use scriptory_templates::{LockedInsertion, NumberingClass, Template};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Secondary commands and the events that explain them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effect {
    pub commands: Vec<Command>,
    pub events: Vec<EditorEvent>,
}

/// Post-effect that can be triggered by a command
pub trait PostEffect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Analyze the command (already applied) and produce follow-up commands
    fn analyze(&self, command: &Command, document: &Document, template: &Template) -> Effect;
}

/// Lock flags follow the class's lock state
#[derive(Debug)]
pub struct FreezeLockedNumbers;

impl PostEffect for FreezeLockedNumbers {
    fn name(&self) -> &'static str {
        "freeze_locked_numbers"
    }

    fn analyze(&self, command: &Command, document: &Document, template: &Template) -> Effect {
        let (class, range) = match command {
            Command::LockNumbering { class }
            | Command::RestoreNumbering {
                class,
                state: LockState::Locked,
            } => (*class, None),
            Command::LockRange { class, first, last }
            | Command::RestoreNumbering {
                class,
                state: LockState::PartiallyLocked { first, last },
            } => (*class, Some((*first, *last))),
            _ => return Effect::default(),
        };

        let blocks = eligible(&document.tree, template, class);
        let first = range.and_then(|(first, _)| blocks.iter().position(|b| b.id == first));
        let last = range.and_then(|(_, last)| blocks.iter().position(|b| b.id == last));

        let commands = blocks
            .iter()
            .enumerate()
            .filter_map(|(index, block)| {
                let numbering = block.numbering.as_ref()?;
                let lock = match (first, last) {
                    (Some(first), Some(last)) => (first..=last).contains(&index),
                    _ => true,
                };
                (numbering.locked != lock).then(|| Command::SetNumber {
                    block: block.id,
                    numbering: Some(Numbering {
                        label: numbering.label.clone(),
                        locked: lock,
                    }),
                })
            })
            .collect();

        Effect {
            commands,
            events: Vec::new(),
        }
    }
}

/// Numbering correction for every class the template numbers
#[derive(Debug)]
pub struct Renumber;

impl PostEffect for Renumber {
    fn name(&self) -> &'static str {
        "renumber"
    }

    fn analyze(&self, command: &Command, document: &Document, template: &Template) -> Effect {
        if !command.affects_numbering() {
            return Effect::default();
        }
        let reason = if command.is_structural() {
            RenumberReason::Structural
        } else {
            RenumberReason::LockChanged
        };
        correct_numbering(document, template, reason)
    }
}

/// Bring every numbered class in line with its lock state.
pub fn correct_numbering(document: &Document, template: &Template, reason: RenumberReason) -> Effect {
    let mut effect = Effect::default();

    for class in template.numbering_classes() {
        let state = document.numbering.state(class);
        let blocks = eligible(&document.tree, template, class);
        let plan = plan_numbers(&blocks, state, template.locked_insertion);

        let mut changed = 0;
        let mut relabelled = Vec::new();
        for (block, numbering) in blocks.iter().zip(plan.numbers) {
            if block.numbering == numbering {
                continue;
            }
            // Filling in a label for a block that never had one is not a renumber
            let old_label = block.numbering.as_ref().map(|n| &n.label);
            if old_label.is_some() && old_label != numbering.as_ref().map(|n| &n.label) {
                relabelled.push(block.id);
            }
            changed += 1;
            effect.commands.push(Command::SetNumber {
                block: block.id,
                numbering,
            });
        }

        let reason = if plan.conflict {
            RenumberReason::Conflict
        } else {
            reason
        };
        if !relabelled.is_empty() || plan.conflict {
            info!(%class, ?reason, blocks = relabelled.len(), "Renumbered");
            effect.events.push(EditorEvent::RenumberPerformed {
                class,
                reason,
                blocks: relabelled,
            });
        } else if changed > 0 {
            debug!(%class, blocks = changed, "Updated numbering");
        }
    }
    effect
}

/// Live blocks numbered in `class`, in document order
pub fn eligible<'a, S: BlockSource>(
    source: &'a S,
    template: &Template,
    class: NumberingClass,
) -> Vec<&'a Block> {
    source
        .document_order()
        .into_iter()
        .filter_map(|id| source.get(id))
        .filter(|block| template.numbering_class(block.kind) == Some(class))
        .collect()
}

/// Target numbering for one class
#[derive(Debug, Clone, PartialEq)]
pub struct NumberPlan {
    /// One entry per eligible block
    pub numbers: Vec<Option<Numbering>>,

    /// Duplicate labels forced a full renumber
    pub conflict: bool,
}

/// Compute the numbers `blocks` should carry under `state`.
///
/// - `Unlocked`: 1, 2, 3, ... with no lock flags.
/// - `Locked`: locked numbers are kept; other blocks follow the template's
///   insertion rule (unnumbered, or suffixed after the preceding locked
///   number: 12A, 12B).
/// - `PartiallyLocked`: locked numbers are kept; free blocks before the
///   locked run count from 1 up to the first locked number, free blocks
///   inside it follow the insertion rule, free blocks after it continue from
///   the last locked number.
///
/// If that would leave two blocks with the same label the class is
/// renumbered from 1 and every block that was locked stays locked.
pub fn plan_numbers(blocks: &[&Block], state: LockState, insertion: LockedInsertion) -> NumberPlan {
    let existing_conflict = has_duplicates(blocks.iter().filter_map(|b| b.numbering.as_ref()));
    let numbers = match state {
        LockState::Unlocked => contiguous(blocks.len()),
        LockState::Locked | LockState::PartiallyLocked { .. } => {
            locked_plan(blocks, state, insertion)
        }
    };

    let planned_conflict = has_duplicates(numbers.iter().flatten());
    if !(existing_conflict || planned_conflict) {
        return NumberPlan {
            numbers,
            conflict: false,
        };
    }

    let numbers = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let locked = match state {
                LockState::Unlocked => false,
                LockState::Locked => true,
                LockState::PartiallyLocked { .. } => {
                    block.numbering.as_ref().map(|n| n.locked).unwrap_or(false)
                }
            };
            Some(Numbering {
                label: NumberLabel::new(index as u32 + 1),
                locked,
            })
        })
        .collect();
    NumberPlan {
        numbers,
        conflict: true,
    }
}

fn contiguous(count: usize) -> Vec<Option<Numbering>> {
    (1..=count as u32).map(|n| Some(Numbering::free(n))).collect()
}

fn has_duplicates<'a>(numbers: impl Iterator<Item = &'a Numbering>) -> bool {
    let mut seen = HashSet::new();
    numbers.into_iter().any(|n| !seen.insert(&n.label))
}

fn locked_plan(blocks: &[&Block], state: LockState, insertion: LockedInsertion) -> Vec<Option<Numbering>> {
    let is_locked = |block: &Block| block.numbering.as_ref().map(|n| n.locked).unwrap_or(false);
    let locked: Vec<usize> = (0..blocks.len()).filter(|i| is_locked(blocks[*i])).collect();
    let partial = matches!(state, LockState::PartiallyLocked { .. });

    let (Some(&first), Some(&last)) = (locked.first(), locked.last()) else {
        // Nothing frozen (yet, or any more)
        return if partial {
            contiguous(blocks.len())
        } else {
            vec![None; blocks.len()]
        };
    };

    let taken: HashSet<NumberLabel> = locked
        .iter()
        .filter_map(|i| blocks[*i].numbering.as_ref().map(|n| n.label.clone()))
        .collect();
    let mut numbers: Vec<Option<Numbering>> = vec![None; blocks.len()];

    if partial {
        let limit = label_of(blocks[first]).map(|l| l.number).unwrap_or(0);
        for (index, slot) in numbers.iter_mut().enumerate().take(first) {
            let n = index as u32 + 1;
            if n < limit {
                *slot = Some(Numbering::free(n));
            }
        }
    }

    let mut anchor: Option<NumberLabel> = None;
    let mut inserted = 0;
    for index in first..blocks.len() {
        let block = blocks[index];
        if is_locked(block) {
            numbers[index] = block.numbering.clone();
            anchor = label_of(block).cloned();
            inserted = 0;
            continue;
        }
        let Some(base) = &anchor else { continue };

        if partial && index > last {
            let n = base.number + (index - last) as u32;
            numbers[index] = Some(Numbering::free(n));
            continue;
        }

        numbers[index] = match insertion {
            LockedInsertion::Unnumbered => None,
            LockedInsertion::Suffixed => {
                let mut label;
                loop {
                    inserted += 1;
                    label = NumberLabel::suffixed(
                        base.number,
                        suffix_letters(suffix_index(base.suffix.as_deref()) + inserted),
                    );
                    if !taken.contains(&label) {
                        break;
                    }
                }
                Some(Numbering {
                    label,
                    locked: false,
                })
            }
        };
    }
    numbers
}

fn label_of(block: &Block) -> Option<&NumberLabel> {
    block.numbering.as_ref().map(|n| &n.label)
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(FreezeLockedNumbers), Box::new(Renumber)],
        }
    }

    pub fn effects(&self) -> impl Iterator<Item = &dyn PostEffect> {
        self.effects.iter().map(|effect| effect.as_ref())
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Markers a layout implies, keyed by block
pub fn markers_in(layout: &PageLayout, template: &Template) -> BTreeMap<BlockId, Vec<SplitMarker>> {
    let mut markers: BTreeMap<BlockId, Vec<SplitMarker>> = BTreeMap::new();
    for page in &layout.pages {
        for fragment in &page.fragments {
            let Some(lead_in) = &fragment.lead_in else {
                continue;
            };
            let speaker = lead_in
                .strip_suffix(template.continuity.contd_suffix.as_str())
                .unwrap_or(lead_in)
                .to_string();
            markers.entry(fragment.block).or_default().push(SplitMarker {
                page: page.number.saturating_sub(1),
                split_offset: fragment.range.start,
                speaker: (!speaker.is_empty()).then_some(speaker),
            });
        }
    }
    markers
}

/// Update the ledger to match `layout`, reporting every change.
///
/// Blocks that are no longer split (or no longer exist) lose their markers;
/// a split that moved to another page boundary is reported as a removal
/// followed by an insertion.
pub fn reconcile_markers(
    ledger: &mut ContinuityLedger,
    layout: &PageLayout,
    template: &Template,
) -> Vec<EditorEvent> {
    let mut current = markers_in(layout, template);
    let blocks: BTreeSet<BlockId> = ledger.blocks().chain(current.keys().copied()).collect();
    let mut events = Vec::new();

    for block in blocks {
        let new = current.remove(&block).unwrap_or_default();
        let old = ledger.set(block, new.clone());

        for marker in old.iter().filter(|m| !new.contains(m)) {
            events.push(EditorEvent::MarkerRemoved {
                block,
                page: marker.page,
                split_offset: marker.split_offset,
            });
        }
        for marker in new.iter().filter(|m| !old.contains(m)) {
            events.push(EditorEvent::MarkerInserted {
                block,
                page: marker.page,
                split_offset: marker.split_offset,
                speaker: marker.speaker.clone(),
            });
        }
    }

    if !events.is_empty() {
        debug!(changes = events.len(), markers = ledger.len(), "Reconciled continuity markers");
    }
    events
}
