//! # Pagination
//!
//! Distributes measured units onto pages of the template's content height.
//!
//! ## Rules
//!
//! 1. Units joined by `keep_with_next` (on the earlier) or
//!    `keep_with_previous` (on the later) form a keep group. A group that
//!    does not fit the remaining space moves to a new page, unless one of
//!    its units can be split so that everything before it stays with the
//!    head and everything after it travels with the tail.
//! 2. A split leaves at least `min_split_lines` lines on both pages.
//! 3. `WithMarkers` splits reserve one line for `(MORE)` under the head and
//!    one for `SPEAKER (CONT'D)` over the tail, and prefer to break where a
//!    sentence ends.
//! 4. A unit that cannot be placed even on an empty page is placed anyway,
//!    alone, and reported as an [`OverflowWarning`].
//!
//! ## Incremental recompute
//!
//! Each page remembers the highest unit index it consulted. After an edit,
//! units before the first dirty block are reused, and so is every leading
//! page that consulted only reused units. Flow restarts from the first page
//! that is not reused, so the result equals a full pass.

use crate::cancel::CancelToken;
use crate::errors::LayoutError;
use crate::layout::{
    template_fingerprint, FlowPosition, Fragment, FragmentReason, OverflowWarning, Page,
    PageLayout,
};
use crate::measure::{MonospaceMeasurer, TextMeasurer};
use crate::units::{measure_document, MeasuredUnit};
use scriptory_document::{BlockId, BlockSource};
use scriptory_templates::{SplitPolicy, Template};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Tolerance for floating point height comparisons
const EPSILON: f32 = 0.01;

pub struct Paginator<'a> {
    template: &'a Template,
    measurer: &'a dyn TextMeasurer,
    cancel: CancelToken,
}

struct FilledPage {
    page: Page,
    next: FlowPosition,
    overflows: Vec<OverflowWarning>,
}

/// Page being filled
struct PageCursor {
    number: u32,
    capacity: f32,
    used: f32,
    fragments: Vec<Fragment>,
    overflows: Vec<OverflowWarning>,
}

impl PageCursor {
    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn remaining(&self) -> f32 {
        self.capacity - self.used
    }

    fn push(&mut self, fragment: Fragment) {
        self.used += fragment.height;
        self.fragments.push(fragment);
    }

    fn overflow(&mut self, block: BlockId) {
        warn!(block = %block, page = self.number, "Block taller than a page");
        self.overflows.push(OverflowWarning {
            block,
            page: self.number,
        });
    }
}

impl<'a> Paginator<'a> {
    pub fn new(template: &'a Template, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            template,
            measurer,
            cancel: CancelToken::never(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Full pagination from the first block
    pub fn paginate<S: BlockSource>(&self, source: &S) -> Result<PageLayout, LayoutError> {
        let (units, _) = measure_document(source, self.template, self.measurer, &[]);
        self.flow(units, Vec::new(), Vec::new(), FlowPosition::default())
    }

    /// Recompute after edits whose earliest affected block is `first_dirty`.
    pub fn recompute_from<S: BlockSource>(
        &self,
        previous: &PageLayout,
        source: &S,
        first_dirty: Option<BlockId>,
    ) -> Result<PageLayout, LayoutError> {
        if previous.fingerprint != template_fingerprint(self.template) || !previous.has_units() {
            debug!(template = %self.template.id, "Layout inputs changed, paginating in full");
            return self.paginate(source);
        }
        let Some(first_dirty) = first_dirty else {
            return Ok(previous.clone());
        };

        let order = source.document_order();
        let Some(dirty_position) = order.iter().position(|id| *id == first_dirty) else {
            return self.paginate(source);
        };
        let positions: HashMap<BlockId, usize> =
            order.iter().enumerate().map(|(index, id)| (*id, index)).collect();

        let clean = previous
            .units
            .iter()
            .take_while(|unit| {
                positions
                    .get(&unit.block)
                    .map(|position| *position < dirty_position)
                    .unwrap_or(false)
            })
            .count();
        let (units, reused) =
            measure_document(source, self.template, self.measurer, &previous.units[..clean]);

        let kept = previous
            .pages
            .iter()
            .take_while(|page| page.horizon < reused)
            .count();
        let Some(resume) = previous.pages.get(kept).map(|page| page.start) else {
            return self.flow(units, Vec::new(), Vec::new(), FlowPosition::default());
        };

        debug!(
            first_dirty = %first_dirty,
            reused_units = reused,
            kept_pages = kept,
            "Resuming pagination"
        );

        let pages = previous.pages[..kept].to_vec();
        let overflows = previous
            .overflows
            .iter()
            .filter(|warning| warning.page as usize <= kept)
            .copied()
            .collect();
        self.flow(units, pages, overflows, resume)
    }

    fn flow(
        &self,
        units: Vec<MeasuredUnit>,
        mut pages: Vec<Page>,
        mut overflows: Vec<OverflowWarning>,
        start: FlowPosition,
    ) -> Result<PageLayout, LayoutError> {
        let mut position = start;
        while position.unit < units.len() {
            if self.cancel.is_cancelled() {
                debug!(generation = self.cancel.generation(), "Pagination cancelled");
                return Err(LayoutError::Cancelled(self.cancel.generation()));
            }

            let number = pages.len() as u32 + 1;
            let filled = self.fill_page(&units, position, number);
            overflows.extend(filled.overflows);
            pages.push(filled.page);
            position = filled.next;
        }

        info!(pages = pages.len(), units = units.len(), "Pagination complete");
        Ok(PageLayout {
            template: self.template.id.clone(),
            fingerprint: template_fingerprint(self.template),
            pages,
            overflows,
            units,
        })
    }

    fn min_lines(&self) -> usize {
        self.template.min_split_lines.max(1) as usize
    }

    fn lead_in(&self, unit: &MeasuredUnit) -> Option<String> {
        if unit.split != SplitPolicy::WithMarkers {
            return None;
        }
        let suffix = &self.template.continuity.contd_suffix;
        Some(match &unit.speaker {
            Some(speaker) => format!("{}{}", speaker, suffix),
            None => suffix.trim().to_string(),
        })
    }

    fn trail(&self, unit: &MeasuredUnit) -> Option<String> {
        (unit.split == SplitPolicy::WithMarkers).then(|| self.template.continuity.more_text.clone())
    }

    fn marker_height(&self, unit: &MeasuredUnit) -> f32 {
        if unit.split == SplitPolicy::WithMarkers {
            unit.line_height
        } else {
            0.0
        }
    }

    /// Index of the first unit after the keep group starting at `from`
    fn group_end(units: &[MeasuredUnit], from: usize) -> usize {
        let mut end = from + 1;
        while end < units.len() && (units[end - 1].keep_with_next || units[end].keep_with_previous) {
            end += 1;
        }
        end
    }

    fn whole(unit: &MeasuredUnit, with_space: bool) -> Fragment {
        Fragment {
            block: unit.block,
            range: 0..unit.char_len(),
            lines: unit.line_count(),
            reason: FragmentReason::WholeBlock,
            height: unit.height(unit.line_count(), with_space),
            lead_in: None,
            trail: None,
        }
    }

    /// Pick the head length for a split, preferring a sentence end.
    fn head_lines(&self, unit: &MeasuredUnit, from: usize, min: usize, max: usize) -> usize {
        if !self.template.continuity.prefer_sentence_break {
            return max;
        }
        unit.sentence_starts
            .iter()
            .rev()
            .map(|start| start.saturating_sub(from))
            .find(|head| *head >= min && *head <= max)
            .unwrap_or(max)
    }

    /// Latest unit of `units[from..end]` that can be split on this page,
    /// with the number of its lines that stay here.
    fn find_split(
        &self,
        units: &[MeasuredUnit],
        from: usize,
        end: usize,
        cursor: &PageCursor,
    ) -> Option<(usize, usize)> {
        let min = self.min_lines();
        let at_top = |k: usize| cursor.is_empty() && k == from;

        for j in (from..end).rev() {
            let unit = &units[j];
            let total = unit.line_count();
            if unit.split == SplitPolicy::Never || total < 2 * min {
                continue;
            }

            let before: f32 = (from..j)
                .map(|k| units[k].height(units[k].line_count(), !at_top(k)))
                .sum();
            let available = cursor.remaining()
                - before
                - unit.height(0, !at_top(j))
                - self.marker_height(unit);
            if available < 0.0 {
                continue;
            }

            let fit = ((available + EPSILON) / unit.line_height).floor() as usize;
            let max_head = fit.min(total - min);
            if max_head < min {
                continue;
            }
            return Some((j, self.head_lines(unit, 0, min, max_head)));
        }
        None
    }

    /// Place the rest of a split unit at the top of a page. Returns the line
    /// to continue from when it splits again.
    fn place_continuation(
        &self,
        unit: &MeasuredUnit,
        from_line: usize,
        cursor: &mut PageCursor,
    ) -> Option<usize> {
        let total = unit.line_count();
        let remaining = total - from_line;
        let lead = self.marker_height(unit);
        let lead_in = self.lead_in(unit);

        let whole_height = lead + remaining as f32 * unit.line_height;
        let head = if whole_height <= cursor.capacity + EPSILON {
            remaining
        } else {
            let min = self.min_lines();
            let available = cursor.capacity - lead - self.marker_height(unit);
            let fit = ((available.max(0.0) + EPSILON) / unit.line_height).floor() as usize;
            let max_head = fit.min(remaining.saturating_sub(min));
            if max_head >= min {
                self.head_lines(unit, from_line, min, max_head)
            } else {
                // No split satisfies the orphan rule on a whole page
                cursor.overflow(unit.block);
                fit.clamp(1, remaining)
            }
        };

        let continues = head < remaining;
        cursor.push(Fragment {
            block: unit.block,
            range: unit.range(from_line, from_line + head),
            lines: head,
            reason: FragmentReason::SplitContinuation,
            height: lead
                + head as f32 * unit.line_height
                + if continues { self.marker_height(unit) } else { 0.0 },
            lead_in,
            trail: if continues { self.trail(unit) } else { None },
        });

        if continues {
            debug!(block = %unit.block, line = from_line + head, "Continuation split again");
            Some(from_line + head)
        } else {
            None
        }
    }

    fn fill_page(&self, units: &[MeasuredUnit], start: FlowPosition, number: u32) -> FilledPage {
        let mut cursor = PageCursor {
            number,
            capacity: self.template.page.content_height(),
            used: 0.0,
            fragments: Vec::new(),
            overflows: Vec::new(),
        };
        let mut horizon = start.unit;
        let mut position = start;

        let finish = |cursor: PageCursor, horizon: usize, next: FlowPosition| FilledPage {
            page: Page {
                number,
                start,
                fragments: cursor.fragments,
                horizon,
            },
            next,
            overflows: cursor.overflows,
        };

        if position.line > 0 {
            let unit = &units[position.unit];
            if let Some(line) = self.place_continuation(unit, position.line, &mut cursor) {
                let next = FlowPosition {
                    unit: position.unit,
                    line,
                };
                return finish(cursor, horizon, next);
            }
            position = FlowPosition {
                unit: position.unit + 1,
                line: 0,
            };
        }

        while position.unit < units.len() {
            let from = position.unit;
            let group_end = Self::group_end(units, from);
            horizon = horizon.max(group_end);

            let mut ends = vec![group_end];
            if cursor.is_empty() && group_end > from + 1 {
                // A group taller than a page is broken up
                ends.push(from + 1);
            }

            let mut placed = false;
            for end in ends {
                let group_height: f32 = (from..end)
                    .map(|k| {
                        let at_top = cursor.is_empty() && k == from;
                        units[k].height(units[k].line_count(), !at_top)
                    })
                    .sum();

                if group_height <= cursor.remaining() + EPSILON {
                    for k in from..end {
                        let at_top = cursor.is_empty();
                        cursor.push(Self::whole(&units[k], !at_top));
                    }
                    position = FlowPosition { unit: end, line: 0 };
                    placed = true;
                    break;
                }

                if let Some((j, head)) = self.find_split(units, from, end, &cursor) {
                    for k in from..j {
                        let at_top = cursor.is_empty();
                        cursor.push(Self::whole(&units[k], !at_top));
                    }
                    let unit = &units[j];
                    let with_space = !cursor.is_empty();
                    debug!(block = %unit.block, page = number, head, "Splitting block");
                    cursor.push(Fragment {
                        block: unit.block,
                        range: unit.range(0, head),
                        lines: head,
                        reason: FragmentReason::SplitStart,
                        height: unit.height(head, with_space) + self.marker_height(unit),
                        lead_in: None,
                        trail: self.trail(unit),
                    });
                    return finish(cursor, horizon, FlowPosition { unit: j, line: head });
                }
            }

            if placed {
                continue;
            }
            if !cursor.is_empty() {
                break;
            }

            // Alone on an empty page and still too tall
            let unit = &units[from];
            cursor.overflow(unit.block);
            cursor.push(Self::whole(unit, false));
            position = FlowPosition {
                unit: from + 1,
                line: 0,
            };
            break;
        }

        if position.unit >= units.len() {
            horizon = units.len();
        }
        finish(cursor, horizon, position)
    }
}

/// Full pagination with the fixed-pitch measurer
pub fn paginate<S: BlockSource>(source: &S, template: &Template) -> PageLayout {
    let measurer = MonospaceMeasurer::courier();
    Paginator::new(template, &measurer)
        .paginate(source)
        .unwrap_or_else(|_| PageLayout::empty(template))
}

/// Incremental pagination with the fixed-pitch measurer
pub fn recompute_from<S: BlockSource>(
    previous: &PageLayout,
    source: &S,
    template: &Template,
    first_dirty: Option<BlockId>,
) -> PageLayout {
    let measurer = MonospaceMeasurer::courier();
    Paginator::new(template, &measurer)
        .recompute_from(previous, source, first_dirty)
        .unwrap_or_else(|_| PageLayout::empty(template))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Generation;
    use scriptory_document::{BlockTree, Run};
    use scriptory_templates::{builtin, BlockKind, DocumentType};

    /// Lines per page of the built-in screenplay template at 12pt
    const PAGE_LINES: usize = 53;

    fn append(tree: &mut BlockTree, kind: BlockKind, text: &str) -> BlockId {
        let root = tree.root();
        let index = tree.children(root).len();
        tree.insert_block(root, index, kind, vec![Run::plain(text)]).unwrap()
    }

    /// Action text that wraps to exactly `lines` lines (60 columns each)
    fn action_lines(lines: usize) -> String {
        vec!["x".repeat(59); lines].join(" ")
    }

    #[test]
    fn test_page_capacity() {
        let template = builtin::screenplay();
        assert_eq!((template.page.content_height() / 12.0) as usize, PAGE_LINES);
    }

    #[test]
    fn test_short_document_is_one_page() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::SceneHeading, "INT. KITCHEN - DAY");
        append(&mut tree, BlockKind::Action, "The kettle whistles.");

        let layout = paginate(&tree, &builtin::screenplay());
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages[0].fragments.len(), 2);
        // No gap above the first block of a page
        assert_eq!(layout.pages[0].fragments[0].height, 12.0);
        assert_eq!(layout.pages[0].fragments[1].height, 24.0);
    }

    #[test]
    fn test_empty_document_has_no_pages() {
        let tree = BlockTree::new(DocumentType::Screenplay);
        assert_eq!(paginate(&tree, &builtin::screenplay()).page_count(), 0);
    }

    #[test]
    fn test_scene_heading_never_ends_a_page() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        // 50 lines used (one page top, no gap)
        append(&mut tree, BlockKind::Action, &action_lines(50));
        let heading = append(&mut tree, BlockKind::SceneHeading, "EXT. ROOF - NIGHT");
        append(&mut tree, BlockKind::Action, &action_lines(4));

        let layout = paginate(&tree, &builtin::screenplay());
        assert_eq!(layout.page_of(heading), Some(2));
        assert_eq!(layout.pages[0].fragments.len(), 1);
    }

    #[test]
    fn test_scene_heading_kept_without_template_flag() {
        let mut template = builtin::screenplay();
        template
            .styles
            .get_mut(&BlockKind::SceneHeading)
            .unwrap()
            .keep_with_next = false;
        let mut bare = builtin::screenplay();
        bare.styles.remove(&BlockKind::SceneHeading);

        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(50));
        let heading = append(&mut tree, BlockKind::SceneHeading, "EXT. ROOF - NIGHT");
        append(&mut tree, BlockKind::Action, &action_lines(4));

        for template in [template, bare] {
            let layout = paginate(&tree, &template);
            assert_eq!(layout.page_of(heading), Some(2));
            let last = layout.pages[0].fragments.last().unwrap();
            assert_ne!(last.block, heading);
        }
    }

    #[test]
    fn test_heading_takes_head_of_next_block() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(44));
        let heading = append(&mut tree, BlockKind::SceneHeading, "EXT. ROOF - NIGHT");
        let action = append(&mut tree, BlockKind::Action, &action_lines(10));

        let layout = paginate(&tree, &builtin::screenplay());
        // 44 + (1 + 1) + (1 gap + head) = 53 leaves 6 lines of the action
        assert_eq!(layout.page_of(heading), Some(1));
        let pieces = layout.fragments_of(action);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].1.reason, FragmentReason::SplitStart);
        assert_eq!(pieces[0].1.lines, 6);
        assert_eq!(pieces[1].1.reason, FragmentReason::SplitContinuation);
        assert_eq!(pieces[0].1.range.end, pieces[1].1.range.start);
        assert!(pieces[0].1.trail.is_none());
    }

    #[test]
    fn test_orphan_control_moves_whole_block() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(50));
        // 2 lines free after the gap: a 3 line block would leave 1 line overleaf
        let action = append(&mut tree, BlockKind::Action, &action_lines(3));

        let layout = paginate(&tree, &builtin::screenplay());
        assert_eq!(layout.fragments_of(action).len(), 1);
        assert_eq!(layout.page_of(action), Some(2));
    }

    #[test]
    fn test_dialogue_split_gets_markers() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(40));
        append(&mut tree, BlockKind::Character, "ANNA");
        let line = "I never meant for any of this to happen to us.";
        let dialogue = append(&mut tree, BlockKind::Dialogue, &vec![line; 12].join(" "));

        let layout = paginate(&tree, &builtin::screenplay());
        let pieces = layout.fragments_of(dialogue);
        assert_eq!(pieces.len(), 2);

        let (head_page, head) = pieces[0];
        let (tail_page, tail) = pieces[1];
        assert_eq!((head_page, tail_page), (1, 2));
        assert_eq!(head.trail.as_deref(), Some("(MORE)"));
        assert_eq!(tail.lead_in.as_deref(), Some("ANNA (CONT'D)"));
        assert_eq!(head.range.end, tail.range.start);
        assert_eq!(tail.range.end, tree.get(dialogue).unwrap().char_len());
    }

    #[test]
    fn test_dialogue_split_anywhere_still_gets_markers() {
        let mut template = builtin::screenplay();
        template.styles.get_mut(&BlockKind::Dialogue).unwrap().split = SplitPolicy::Anywhere;

        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(40));
        append(&mut tree, BlockKind::Character, "ANNA");
        let line = "I never meant for any of this to happen to us.";
        let dialogue = append(&mut tree, BlockKind::Dialogue, &vec![line; 30].join(" "));

        let layout = paginate(&tree, &template);
        let pieces = layout.fragments_of(dialogue);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].1.trail.as_deref(), Some("(MORE)"));
        assert_eq!(pieces[1].1.lead_in.as_deref(), Some("ANNA (CONT'D)"));
    }

    #[test]
    fn test_dialogue_never_split_stays_whole() {
        let mut template = builtin::screenplay();
        template.styles.get_mut(&BlockKind::Dialogue).unwrap().split = SplitPolicy::Never;

        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(40));
        append(&mut tree, BlockKind::Character, "ANNA");
        let dialogue = append(&mut tree, BlockKind::Dialogue, &"Words. ".repeat(60));

        let layout = paginate(&tree, &template);
        assert_eq!(layout.fragments_of(dialogue).len(), 1);
    }

    #[test]
    fn test_dialogue_prefers_sentence_end() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, &action_lines(44));
        append(&mut tree, BlockKind::Character, "BOB");
        // Nine lines at 35 columns; the first sentence ends with line three
        let text = "You told me the storm would pass by morning and that the boats would \
                    all come home again before sunrise. But the sea kept rising and the \
                    wind kept howling and nobody came back to the village that night or \
                    the next or the one after that no matter how long we stood on the \
                    pier waiting for a sail to show.";
        let dialogue = append(&mut tree, BlockKind::Dialogue, text);

        let layout = paginate(&tree, &builtin::screenplay());
        let pieces = layout.fragments_of(dialogue);
        assert_eq!(pieces.len(), 2);
        // Six lines would fit, but the sentence ends after three
        assert_eq!(pieces[0].1.lines, 3);
        let head: String = text.chars().take(pieces[0].1.range.end).collect();
        assert!(head.trim_end().ends_with("sunrise."));
        assert_eq!(pieces[1].1.lines, 6);
    }

    #[test]
    fn test_overflow_block_gets_own_page() {
        let mut template = builtin::screenplay();
        template.page.height = 200.0;
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, "Intro.");
        // Scene headings never split
        let huge = append(&mut tree, BlockKind::SceneHeading, &action_lines(20));

        let layout = paginate(&tree, &template);
        assert_eq!(layout.page_of(huge), Some(2));
        assert_eq!(layout.overflows, vec![OverflowWarning { block: huge, page: 2 }]);
        assert_eq!(layout.pages[1].fragments.len(), 1);
    }

    #[test]
    fn test_long_block_spans_several_pages() {
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        let action = append(&mut tree, BlockKind::Action, &action_lines(130));

        let layout = paginate(&tree, &builtin::screenplay());
        let pieces = layout.fragments_of(action);
        assert_eq!(pieces.len(), 3);
        let lines: usize = pieces.iter().map(|(_, f)| f.lines).sum();
        assert_eq!(lines, 130);
        assert_eq!(layout.pages[1].start, FlowPosition { unit: 0, line: 53 });
    }

    #[test]
    fn test_recompute_matches_full_run() {
        let template = builtin::screenplay();
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        let mut ids = Vec::new();
        for i in 0..40 {
            ids.push(append(&mut tree, BlockKind::SceneHeading, &format!("INT. ROOM {} - DAY", i)));
            ids.push(append(&mut tree, BlockKind::Action, &action_lines(1 + i % 7)));
        }
        let previous = paginate(&tree, &template);
        tree.take_first_dirty();

        let target = ids[50];
        tree.edit_plain(target, 0..0, &action_lines(9)).unwrap();
        let dirty = tree.take_first_dirty();
        assert_eq!(dirty, Some(target));

        let incremental = recompute_from(&previous, &tree, &template, dirty);
        let full = paginate(&tree, &template);
        assert_eq!(incremental.to_json(), full.to_json());
        assert_eq!(incremental, full);
    }

    #[test]
    fn test_recompute_after_template_change_is_full() {
        let template = builtin::screenplay();
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        for _ in 0..30 {
            append(&mut tree, BlockKind::Action, &action_lines(5));
        }
        let previous = paginate(&tree, &template);

        let mut tighter = template.clone();
        tighter.page.height = 500.0;
        let incremental = recompute_from(&previous, &tree, &tighter, None);
        assert_eq!(incremental, paginate(&tree, &tighter));
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let template = builtin::screenplay();
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        append(&mut tree, BlockKind::Action, "Anything.");

        let generation = Generation::new();
        let token = generation.token();
        generation.bump();

        let measurer = MonospaceMeasurer::courier();
        let result = Paginator::new(&template, &measurer)
            .with_cancel(token)
            .paginate(&tree);
        assert_eq!(result, Err(LayoutError::Cancelled(0)));
    }

    #[test]
    fn test_pagination_is_deterministic() {
        let template = builtin::screenplay();
        let mut tree = BlockTree::new(DocumentType::Screenplay);
        for i in 0..25 {
            append(&mut tree, BlockKind::Character, "ANNA");
            append(&mut tree, BlockKind::Dialogue, &format!("Line {}. ", i).repeat(20));
        }
        let first = paginate(&tree.snapshot(), &template).to_json();
        let second = paginate(&tree.snapshot(), &template).to_json();
        assert_eq!(first, second);
    }
}
