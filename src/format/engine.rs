//! Page layout of a translated document.

use std::sync::Arc;

use super::cursor::Cursor;
use super::grid::{Cell, CellSource};
use super::numbering::{PageNumberType, PageNumbering};
use super::page::BraillePage;
use super::segment::SegmentInfo;
use super::spacing::PendingSpacing;
use super::{table, toc};
use crate::config::PageSettings;
use crate::error::{Error, Result};
use crate::model::{BrlData, ContainerType, Document, ElementKind, NodeData, NodeId};
use crate::style::{FormatKind, RuleSet, Style, StyleResolver};

/// A braille character with the cell source it will carry.
pub type RunCell = (char, CellSource);

/// Section attribute selecting the braille page number type.
pub const PAGE_TYPE_ATTR: &str = "pageType";

/// Section attribute restarting the count of its page number type.
pub const RESTART_NUMBERING_ATTR: &str = "restartNumbering";

/// Blank cells kept between content and a page number on the same line.
pub const NUMBER_GAP: usize = 3;

/// Dots 3-6, used for print page separator lines.
const SEPARATOR: char = '-';

/// Dot 5, the guide dot.
pub(crate) const GUIDE: char = '"';

/// A line reserved for content by [`FormatEngine::begin_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineSlot {
    pub y: usize,
    pub left: usize,
    pub right: usize,
}

impl LineSlot {
    pub fn width(&self) -> usize {
        self.right - self.left
    }
}

/// Blocks kept with the block that follows them, and the cells they placed.
#[derive(Debug)]
struct KeepGroup {
    page: usize,
    at_top: bool,
    blocks: Vec<NodeId>,
    cells: Vec<(usize, usize)>,
}

/// Split the longest line of at most `width` cells off the front of `run`.
///
/// Returns the cells to place (without trailing spaces) and the cells
/// consumed. Words longer than a line are split.
pub fn fit(run: &[RunCell], width: usize) -> (usize, usize) {
    let width = width.max(1);
    if run.len() <= width {
        return (trimmed_len(run), run.len());
    }
    if let Some(space) = run[..=width].iter().rposition(|(c, _)| *c == ' ') {
        let take = trimmed_len(&run[..space]);
        if take > 0 {
            return (take, space + 1);
        }
    }
    (width, width)
}

/// Length of the word at the front of `run`.
fn leading_word_len(run: &[RunCell]) -> usize {
    run.iter().position(|(c, _)| *c == ' ').unwrap_or(run.len())
}

fn trimmed_len(run: &[RunCell]) -> usize {
    run.iter()
        .rposition(|(c, _)| *c != ' ')
        .map(|p| p + 1)
        .unwrap_or(0)
}

pub(crate) fn skip_spaces(run: &[RunCell], mut pos: usize) -> usize {
    while pos < run.len() && run[pos].0 == ' ' {
        pos += 1;
    }
    pos
}

/// Word-wrap a run into lines of at most `width` cells.
pub fn wrap(run: &[RunCell], width: usize) -> Vec<Vec<RunCell>> {
    let mut lines = Vec::new();
    let mut pos = skip_spaces(run, 0);
    while pos < run.len() {
        let (take, next) = fit(&run[pos..], width);
        lines.push(run[pos..pos + take].to_vec());
        pos = skip_spaces(run, pos + next);
    }
    lines
}

/// Cells of one translation node. Cells point back at the text node the
/// translation follows, or at the element that owns it.
pub fn brl_cells(doc: &Document, id: NodeId, brl: &BrlData) -> Vec<RunCell> {
    let node = match doc.prev_sibling(id) {
        Some(prev) if doc.is_text(prev) => prev,
        _ => doc.parent(id).unwrap_or(id),
    };
    brl.text
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let index = brl.index.get(i).copied().unwrap_or(0);
            (ch, CellSource::Text { node, index })
        })
        .collect()
}

fn is_flow_break(kind: ElementKind) -> bool {
    matches!(
        kind,
        ElementKind::Block(_)
            | ElementKind::Container(_)
            | ElementKind::Section
            | ElementKind::PageIndicator
            | ElementKind::Head
    )
}

/// Lays out the braille of a translated document onto pages.
///
/// One page, cursor and pending-spacing triple is live at a time; running
/// out of lines commits the page and opens the next one.
pub struct FormatEngine<'a> {
    doc: &'a Document,
    resolver: &'a StyleResolver,
    doc_rules: Option<&'a RuleSet>,
    settings: &'a PageSettings,
    running_head: Option<String>,

    pages: Vec<BraillePage>,
    current: Option<BraillePage>,
    content_lines: usize,
    cursor: Cursor,
    pending: PendingSpacing,

    numbering: PageNumbering,
    page_type: PageNumberType,
    print_changed: bool,

    keeping: Option<NodeId>,
    keep: Option<KeepGroup>,
}

impl<'a> FormatEngine<'a> {
    pub fn new(doc: &'a Document, resolver: &'a StyleResolver, settings: &'a PageSettings) -> Self {
        Self {
            doc,
            resolver,
            doc_rules: None,
            settings,
            running_head: None,
            pages: Vec::new(),
            current: None,
            content_lines: 0,
            cursor: Cursor::default(),
            pending: PendingSpacing::new(),
            numbering: PageNumbering::new(),
            page_type: PageNumberType::Normal,
            print_changed: false,
            keeping: None,
            keep: None,
        }
    }

    /// Rules supplied with the document.
    pub fn with_document_rules(mut self, rules: Option<&'a RuleSet>) -> Self {
        self.doc_rules = rules;
        self
    }

    /// Braille running head placed on every page after the first.
    pub fn with_running_head(mut self, head: Option<String>) -> Self {
        self.running_head = head.filter(|h| !h.trim().is_empty());
        self
    }

    /// Format the whole document.
    pub fn format(mut self) -> Result<Vec<BraillePage>> {
        let root = self.doc.root();
        self.format_node(root)?;
        self.finish()
    }

    pub(crate) fn document(&self) -> &'a Document {
        self.doc
    }

    pub(crate) fn width(&self) -> usize {
        self.settings.width()
    }

    /// Style in effect for a node.
    pub(crate) fn style_of(&self, node: NodeId) -> Result<Arc<Style>> {
        self.resolver.effective_style(self.doc, node, self.doc_rules)
    }

    pub(crate) fn is_skipped(&self, node: NodeId) -> bool {
        self.resolver.action(self.doc, node, self.doc_rules).is_skip()
    }

    // ==================== Document walk ====================

    /// Format a node and its subtree.
    pub(crate) fn format_node(&mut self, node: NodeId) -> Result<()> {
        let Some(element) = self.doc.element(node) else {
            return Ok(());
        };
        let kind = element.kind();
        if kind == ElementKind::Head || self.is_skipped(node) {
            return Ok(());
        }
        match kind {
            ElementKind::PageIndicator => return self.page_indicator(node),
            ElementKind::Section => {
                if let Some(ty) = element.attr(PAGE_TYPE_ATTR).and_then(PageNumberType::parse) {
                    self.page_type = ty;
                }
                if element.attr(RESTART_NUMBERING_ATTR) == Some("true") {
                    // Takes effect on the next page opened
                    self.numbering.reset(self.page_type);
                }
            }
            _ => {}
        }

        let own = self.resolver.style(self.doc, node, self.doc_rules)?;
        let style = match &own {
            Some(style) => style.clone(),
            None => self.style_of(node)?,
        };
        if style.format == FormatKind::Skip {
            return Ok(());
        }

        let saved = self.keeping;
        if own.is_some() {
            self.request_before(node, &style);
            self.keeping = style.keep_with_next.then_some(node);
        }
        let result = match (style.format, kind) {
            (FormatKind::Table, ElementKind::Container(ContainerType::Table)) => {
                table::format_table(self, node, &style)
            }
            (FormatKind::Toc, ElementKind::Container(ContainerType::Toc)) => {
                toc::format_toc(self, node, &style)
            }
            _ => self.format_flow(node, &style),
        };
        self.keeping = saved;
        result?;
        if own.is_some() {
            self.request_after(node, &style);
        }
        Ok(())
    }

    /// Lay out the loose braille of a node; nested blocks are laid out on
    /// their own and split the surrounding text.
    pub(crate) fn format_flow(&mut self, node: NodeId, style: &Style) -> Result<()> {
        let mut run = Vec::new();
        let mut first = true;
        self.collect_flow(node, style, &mut run, &mut first)?;
        self.flush(&mut run, style, &mut first)
    }

    fn collect_flow(
        &mut self,
        node: NodeId,
        style: &Style,
        run: &mut Vec<RunCell>,
        first: &mut bool,
    ) -> Result<()> {
        let doc = self.doc;
        for child in doc.children(node) {
            match doc.data(child) {
                NodeData::Brl(brl) => run.extend(brl_cells(doc, child, brl)),
                NodeData::Text(_) => {}
                NodeData::Element(e) => {
                    if is_flow_break(e.kind()) {
                        self.flush(run, style, first)?;
                        self.format_node(child)?;
                    } else if !self.is_skipped(child) {
                        self.collect_flow(child, style, run, first)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self, run: &mut Vec<RunCell>, style: &Style, first: &mut bool) -> Result<()> {
        if run.iter().all(|(c, _)| *c == ' ') {
            run.clear();
            return Ok(());
        }
        self.layout_paragraph(run, style, *first)?;
        *first = false;
        run.clear();
        Ok(())
    }

    /// Braille cells of a subtree, skipping subtrees for which `exclude`
    /// holds.
    pub(crate) fn subtree_run<F>(&self, node: NodeId, exclude: &F) -> Vec<RunCell>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        let mut run = Vec::new();
        for child in self.doc.children(node) {
            if exclude(self.doc, child) {
                continue;
            }
            match self.doc.data(child) {
                NodeData::Brl(brl) => run.extend(brl_cells(self.doc, child, brl)),
                NodeData::Text(_) => {}
                NodeData::Element(_) => {
                    if !self.is_skipped(child) {
                        run.extend(self.subtree_run(child, exclude));
                    }
                }
            }
        }
        run
    }

    pub(crate) fn request_before(&mut self, node: NodeId, style: &Style) {
        self.pending.add_at_least_lines_before(style.lines_before);
        self.pending.request_pages(node, style.new_pages_before);
    }

    pub(crate) fn request_after(&mut self, node: NodeId, style: &Style) {
        self.pending.add_at_least_lines_after(style.lines_after);
        self.pending.request_pages(node, style.new_pages_after);
    }

    // ==================== Lines ====================

    /// Word-wrap a run of cells using the style's indents and alignment.
    pub(crate) fn layout_paragraph(&mut self, run: &[RunCell], style: &Style, mut first: bool) -> Result<()> {
        let mut pos = skip_spaces(run, 0);
        let mut placed = false;
        while pos < run.len() {
            if placed && style.line_spacing > 0 {
                self.pending.add_at_least_lines_before(style.line_spacing);
            }
            let slot = self.begin_line(style, first)?;
            let (take, next) = fit(&run[pos..], slot.width());
            let word = leading_word_len(&run[pos..]);
            if take < word && self.defers_word(&slot, word)? {
                self.skip_line(slot.y)?;
                continue;
            }
            let line = &run[pos..pos + take];
            let segment = SegmentInfo::new(slot.left, slot.right, style.effective_align()).starting(first);
            let x = segment.column_for(line.len());
            if style.centered_with_dots {
                self.guide_dots(slot.y, &segment, x, line.len())?;
            }
            self.put_cells(slot.y, x, line)?;
            self.finish_line(slot.y, x + line.len());
            pos = skip_spaces(run, pos + next);
            first = false;
            placed = true;
        }
        Ok(())
    }

    /// Whether a word that does not fit the shortened line `slot` should
    /// move to a later line instead of being split. Words longer than a
    /// full line are always split.
    fn defers_word(&self, slot: &LineSlot, word: usize) -> Result<bool> {
        let width = self.settings.width();
        if slot.right >= width || word > width.saturating_sub(slot.left) {
            return Ok(false);
        }
        if self.content_lines > 0 {
            return Ok(true);
        }
        // An empty page must still have a full line left for the word
        let next = slot.y + 1;
        Ok(next < self.settings.height() && self.number_label(next)?.is_none())
    }

    /// Leave line `y` without content.
    fn skip_line(&mut self, y: usize) -> Result<()> {
        self.cursor.set(0.0, y as f64)?;
        self.cursor.move_by(0.0, 1.0)
    }

    fn guide_dots(&mut self, y: usize, segment: &SegmentInfo, x: usize, len: usize) -> Result<()> {
        // One blank cell on each side of the text
        if x > segment.left + 1 {
            let dots = vec![(GUIDE, CellSource::Guide); x - 1 - segment.left];
            self.put_cells(y, segment.left, &dots)?;
        }
        let end = x + len + 1;
        if end < segment.right {
            let dots = vec![(GUIDE, CellSource::Guide); segment.right - end];
            self.put_cells(y, end, &dots)?;
        }
        Ok(())
    }

    /// Resolve pending spacing and reserve the next usable line, opening
    /// and committing pages as needed.
    pub(crate) fn begin_line(&mut self, style: &Style, first: bool) -> Result<LineSlot> {
        let height = self.settings.height();
        loop {
            self.ensure_page()?;
            let mut spacing = self.pending.take();
            self.page_mut()?.begin_spacing()?;

            if spacing.explicit_pages > 0 {
                let mut breaks = spacing.explicit_pages;
                // A page with no content yet absorbs the first break
                if self.content_lines == 0 {
                    breaks -= 1;
                }
                for _ in 0..breaks {
                    self.ensure_page()?;
                    self.commit_page()?;
                }
                spacing.explicit_pages = 0;
                if breaks > 0 {
                    spacing.implicit_page = false;
                    self.pending.restore(spacing);
                    continue;
                }
            }

            let next = if self.cursor.x() > 0 {
                self.cursor.y() + 1
            } else {
                self.cursor.y()
            };
            let blank = if self.content_lines == 0 && spacing.implicit_page {
                0
            } else {
                spacing.blank_lines
            };
            let mut y = next + blank;
            while y < height && !self.line_usable(y, style)? {
                y += 1;
            }

            if y >= height {
                if self.content_lines == 0 {
                    if blank == 0 {
                        return Err(Error::invariant(
                            "page has no usable line",
                            format!("style {}", style.name),
                        ));
                    }
                    // Leading blank lines never push content off an empty page
                    spacing.blank_lines = 0;
                    self.pending.restore(spacing);
                    self.page_mut()?.end_spacing()?;
                    continue;
                }
                if self.retract_kept()? {
                    self.pending.restore(spacing);
                    continue;
                }
                self.commit_page()?;
                spacing.implicit_page = true;
                self.pending.restore(spacing);
                continue;
            }

            self.page_mut()?.end_spacing()?;
            let right = self.right_bound(y)?;
            let indent = if first { style.indent } else { style.runover };
            let left = indent.min(right.saturating_sub(1));
            self.cursor.set(left as f64, y as f64)?;
            return Ok(LineSlot { y, left, right });
        }
    }

    /// Write cells on line `y` starting at column `x`.
    ///
    /// Writing outside the page is an invariant violation naming the text
    /// node the cells came from, when there is one.
    pub(crate) fn put_cells(&mut self, y: usize, x: usize, run: &[RunCell]) -> Result<()> {
        self.track_keep(y, x, run.len());
        let doc = self.doc;
        let grid = self.page_mut()?.grid_mut()?;
        for (i, (ch, source)) in run.iter().enumerate() {
            grid.set(x + i, y, Cell::new(*ch, *source))
                .map_err(|e| with_source_node(doc, run, e))?;
        }
        Ok(())
    }

    /// Mark line `y` as used up to column `end`.
    pub(crate) fn finish_line(&mut self, y: usize, end: usize) {
        self.cursor.move_after((end.saturating_sub(1), y));
        self.content_lines += 1;
    }

    fn track_keep(&mut self, y: usize, x: usize, len: usize) {
        let Some(owner) = self.keeping else {
            self.keep = None;
            return;
        };
        let page = self.pages.len();
        let at_top = self.content_lines == 0;
        let group = self.keep.get_or_insert_with(|| KeepGroup {
            page,
            at_top,
            blocks: Vec::new(),
            cells: Vec::new(),
        });
        if !group.blocks.contains(&owner) {
            group.blocks.push(owner);
        }
        group.cells.extend((x..x + len).map(|cx| (cx, y)));
    }

    /// Move the kept blocks to a new page when the block that follows
    /// them does not fit. Returns whether anything moved.
    fn retract_kept(&mut self) -> Result<bool> {
        let Some(group) = self.keep.take() else {
            return Ok(false);
        };
        let own = self.keeping.map_or(false, |k| group.blocks.contains(&k));
        if own || group.at_top || group.page != self.pages.len() {
            self.keep = Some(group);
            return Ok(false);
        }
        let removed = self.page_mut()?.grid_mut()?.retract(&group.cells)?;
        log::debug!(
            "Moving {} kept blocks ({} cells) to braille page {}",
            group.blocks.len(),
            removed.len(),
            self.pages.len() + 2
        );
        self.commit_page()?;
        self.pending.request_implicit_page();
        for block in group.blocks {
            self.format_node(block)?;
        }
        Ok(true)
    }

    fn line_usable(&self, y: usize, style: &Style) -> Result<bool> {
        let page = self.page()?;
        if y == 0 && page.index >= 1 && self.running_head.is_some() {
            return Ok(false);
        }
        if style.skip_number_lines && self.number_label(y)?.is_some() {
            return Ok(false);
        }
        Ok(true)
    }

    /// Page number label sharing line `y`, if any.
    fn number_label(&self, y: usize) -> Result<Option<&str>> {
        let page = self.page()?;
        if y == 0 {
            if let Some(label) = page.print_label() {
                return Ok(Some(label));
            }
        }
        if y + 1 == self.settings.height() {
            return Ok(page.braille_label());
        }
        Ok(None)
    }

    fn right_bound(&self, y: usize) -> Result<usize> {
        let width = self.settings.width();
        Ok(match self.number_label(y)? {
            Some(label) => width.saturating_sub(label.chars().count() + NUMBER_GAP),
            None => width,
        })
    }

    // ==================== Pages ====================

    fn page(&self) -> Result<&BraillePage> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::invariant("no open page", String::new()))
    }

    fn page_mut(&mut self) -> Result<&mut BraillePage> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::invariant("no open page", String::new()))
    }

    fn ensure_page(&mut self) -> Result<()> {
        if self.current.is_some() {
            return Ok(());
        }
        let index = self.pages.len();
        let (width, height) = (self.settings.width(), self.settings.height());
        self.numbering = self.numbering.next_page(self.page_type);
        if index > 0 && !self.print_changed && self.numbering.print_label().is_some() {
            self.numbering.increment_continuation();
        }
        self.print_changed = false;

        let mut page = BraillePage::new(index, width, height, self.numbering.clone());
        let numbered = self.settings.braille_page_numbers
            && !(self.settings.interpoint && page.is_verso() && !self.settings.number_verso_pages);
        let braille = numbered.then(|| self.numbering.braille_label());
        let print = if self.settings.print_page_numbers {
            self.numbering.print_label_braille()
        } else {
            None
        };
        page.set_labels(braille, print);
        write_labels(&mut page, width, height)?;
        if index > 0 {
            if let Some(head) = &self.running_head {
                write_running_head(&mut page, head, width)?;
            }
        }

        self.current = Some(page);
        self.content_lines = 0;
        self.cursor = Cursor::default();
        Ok(())
    }

    fn commit_page(&mut self) -> Result<()> {
        let Some(mut page) = self.current.take() else {
            return Ok(());
        };
        page.commit()?;
        log::debug!(
            "Committed braille page {} ({} content lines)",
            page.index + 1,
            self.content_lines
        );
        self.pages.push(page);
        self.content_lines = 0;
        self.cursor = Cursor::default();
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<BraillePage>> {
        // Trailing pages without content are dropped
        if self.current.is_some() && (self.content_lines > 0 || self.pages.is_empty()) {
            self.commit_page()?;
        }
        if self.pages.is_empty() {
            self.ensure_page()?;
            self.commit_page()?;
        }
        log::debug!("Formatted {} braille pages", self.pages.len());
        Ok(self.pages)
    }

    /// Handle a print page change.
    fn page_indicator(&mut self, node: NodeId) -> Result<()> {
        let label = match self.doc.attr(node, "number") {
            Some(n) => n.trim().to_string(),
            None => self.doc.text_content(node).trim().to_string(),
        };
        if label.is_empty() {
            log::warn!("Page indicator without a page number: {}", self.doc.snippet(node));
            return Ok(());
        }
        self.numbering.set_print_label(label);
        self.print_changed = true;
        if self.current.is_none() {
            return Ok(());
        }

        if self.content_lines == 0 {
            // At the top of a page the new number simply replaces the old one
            let print = if self.settings.print_page_numbers {
                self.numbering.print_label_braille()
            } else {
                None
            };
            let width = self.settings.width();
            let page = self.page_mut()?;
            let braille = page.braille_label().map(str::to_string);
            for x in 0..width {
                if page.grid().get(x, 0)?.map_or(false, |c| c.is_page_number()) {
                    page.grid_mut()?.clear(x, 0)?;
                }
            }
            page.set_labels(braille, print.clone());
            if let Some(print) = print {
                let x = width.saturating_sub(print.chars().count());
                page.grid_mut()?.write_str(x, 0, &print, CellSource::PageNumber)?;
            }
            self.print_changed = false;
            return Ok(());
        }

        let default = self.resolver.sheet().default_style();
        let slot = self.begin_line(&default, true)?;
        if self.content_lines == 0 {
            // The break itself moved us to a page carrying the new number
            return Ok(());
        }
        let label = self.numbering.print_label_braille().unwrap_or_default();
        let label_len = label.chars().count();
        let dashes = slot.right.saturating_sub(label_len + 1);
        let mut cells = vec![(SEPARATOR, CellSource::Reserved); dashes];
        if label_len > 0 {
            cells.push((' ', CellSource::Reserved));
            cells.extend(label.chars().map(|c| (c, CellSource::PageNumber)));
        }
        self.put_cells(slot.y, 0, &cells)?;
        self.finish_line(slot.y, cells.len());
        // The new print page began here; the next braille page continues it
        self.print_changed = false;
        Ok(())
    }
}

fn with_source_node(doc: &Document, run: &[RunCell], err: Error) -> Error {
    if !matches!(err, Error::GridOutOfBounds { .. }) {
        return err;
    }
    let node = run.iter().find_map(|(_, source)| match source {
        CellSource::Text { node, .. } => Some(*node),
        _ => None,
    });
    match node {
        Some(node) => Error::invariant(err.to_string(), doc.snippet(node)),
        None => err,
    }
}

fn write_labels(page: &mut BraillePage, width: usize, height: usize) -> Result<()> {
    let braille = page.braille_label().map(str::to_string);
    let print = page.print_label().map(str::to_string);
    let grid = page.grid_mut()?;
    if let Some(label) = braille {
        let x = width.saturating_sub(label.chars().count());
        grid.write_str(x, height - 1, &label, CellSource::PageNumber)?;
    }
    if let Some(label) = print {
        let x = width.saturating_sub(label.chars().count());
        grid.write_str(x, 0, &label, CellSource::PageNumber)?;
    }
    Ok(())
}

fn write_running_head(page: &mut BraillePage, head: &str, width: usize) -> Result<()> {
    let reserved = page
        .print_label()
        .map(|l| l.chars().count() + NUMBER_GAP)
        .unwrap_or(0);
    let available = width.saturating_sub(reserved);
    let text: String = head.chars().take(available).collect();
    let x = (available - text.chars().count()) / 2;
    page.grid_mut()?.write_str(x, 0, &text, CellSource::Reserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    fn cells(s: &str) -> Vec<RunCell> {
        s.chars().map(|c| (c, CellSource::Reserved)).collect()
    }

    #[test]
    fn test_fit_breaks_at_space() {
        let run = cells(",,hello ,,world");
        assert_eq!(fit(&run, 10), (7, 8));
        assert_eq!(fit(&run[8..], 10), (7, 7));
    }

    #[test]
    fn test_fit_splits_long_word() {
        let run = cells("abcdefghijkl");
        assert_eq!(fit(&run, 5), (5, 5));
        let run = cells("ab   ");
        assert_eq!(fit(&run, 10), (2, 5));
    }

    #[test]
    fn test_wrap() {
        let lines = wrap(&cells("  the cat sat"), 7);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.iter().map(|(c, _)| *c).collect())
            .collect();
        assert_eq!(text, vec!["the cat", "sat"]);
        assert!(wrap(&cells("   "), 5).is_empty());
    }

    #[test]
    fn test_brl_cells_source() {
        let mut doc = Document::empty();
        let root = doc.root();
        let p = doc.append_element(root, Element::new("block"));
        let text = doc.append_text(p, "Hi");
        let brl = doc.create(NodeData::Brl(BrlData::new(",hi", vec![0, 0, 1], "Hi")));
        doc.append_child(p, brl);
        let Some(data) = doc.brl(brl) else {
            panic!("not a translation node");
        };
        let run = brl_cells(&doc, brl, data);
        assert_eq!(run.len(), 3);
        assert_eq!(run[2].1, CellSource::Text { node: text, index: 1 });
    }

    #[test]
    fn test_leading_word_len() {
        assert_eq!(leading_word_len(&cells("three four")), 5);
        assert_eq!(leading_word_len(&cells("three")), 5);
        assert_eq!(leading_word_len(&cells("")), 0);
    }

    #[test]
    fn test_out_of_bounds_names_source_node() {
        let mut doc = Document::empty();
        let root = doc.root();
        let p = doc.append_element(root, Element::new("block"));
        let text = doc.append_text(p, "Hi");
        let run = vec![(',', CellSource::Reserved), ('h', CellSource::Text { node: text, index: 0 })];
        let err = Error::GridOutOfBounds {
            x: 10,
            y: 2,
            width: 10,
            height: 5,
        };
        match with_source_node(&doc, &run, err) {
            Error::Invariant { message, node } => {
                assert!(message.contains("(10, 2)"));
                assert!(node.contains("Hi"));
            }
            other => panic!("expected an invariant violation, got {:?}", other),
        }

        // Furniture has no node to name
        let furniture = cells("---");
        let err = Error::GridOutOfBounds {
            x: 10,
            y: 0,
            width: 10,
            height: 5,
        };
        assert!(matches!(
            with_source_node(&doc, &furniture, err),
            Error::GridOutOfBounds { .. }
        ));
    }
}
