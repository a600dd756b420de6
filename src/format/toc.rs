//! Table of contents layout.

use super::engine::{fit, skip_spaces, FormatEngine, RunCell, GUIDE};
use super::grid::CellSource;
use crate::error::Result;
use crate::model::{BlockType, Document, ElementKind, NodeId, SpanType};
use crate::style::{Align, Style};

/// Minimum blank cells around the guide-dot leader.
pub const LEADER_GAP: usize = 3;

fn is_page_number(doc: &Document, node: NodeId) -> bool {
    matches!(
        doc.element(node).map(|e| e.kind()),
        Some(ElementKind::Span(SpanType::TocPageNumber))
    )
}

/// The page number span of an entry, if any.
pub fn page_number_span(doc: &Document, entry: NodeId) -> Option<NodeId> {
    doc.descendants(entry)
        .into_iter()
        .find(|d| is_page_number(doc, *d))
}

/// Whether an entry of this size is set on one line without a leader.
pub fn fits_without_leader(title: usize, number: usize, width: usize) -> bool {
    title + number + LEADER_GAP <= width
}

fn trim(run: &[RunCell]) -> &[RunCell] {
    let start = skip_spaces(run, 0);
    let end = run
        .iter()
        .rposition(|(c, _)| *c != ' ')
        .map(|p| p + 1)
        .unwrap_or(start);
    &run[start..end.max(start)]
}

/// Lay out a contents container.
pub(crate) fn format_toc(engine: &mut FormatEngine<'_>, toc: NodeId, style: &Style) -> Result<()> {
    let doc = engine.document();
    for child in doc.children(toc) {
        match doc.element(child).map(|e| e.kind()) {
            Some(ElementKind::Block(BlockType::TocEntry)) => entry(engine, child)?,
            Some(ElementKind::Block(BlockType::TocHeading)) => heading(engine, child)?,
            Some(_) => engine.format_node(child)?,
            None => {}
        }
    }
    log::debug!("Laid out contents with style {}", style.name);
    Ok(())
}

fn heading(engine: &mut FormatEngine<'_>, node: NodeId) -> Result<()> {
    let mut style = (*engine.style_of(node)?).clone();
    style.align = Align::Center;
    let run = engine.subtree_run(node, &|_, _| false);
    engine.request_before(node, &style);
    engine.layout_paragraph(&run, &style, true)?;
    engine.request_after(node, &style);
    Ok(())
}

fn entry(engine: &mut FormatEngine<'_>, node: NodeId) -> Result<()> {
    let doc = engine.document();
    let style = engine.style_of(node)?;
    let title = engine.subtree_run(node, &is_page_number);
    let number = page_number_span(doc, node)
        .map(|span| engine.subtree_run(span, &|_, _| false))
        .unwrap_or_default();

    engine.request_before(node, &style);
    layout_entry(engine, trim(&title), trim(&number), &style)?;
    engine.request_after(node, &style);
    Ok(())
}

fn layout_entry(
    engine: &mut FormatEngine<'_>,
    title: &[RunCell],
    number: &[RunCell],
    style: &Style,
) -> Result<()> {
    if number.is_empty() {
        return engine.layout_paragraph(title, style, true);
    }

    let mut pos = 0;
    let mut first = true;
    let mut number = number;
    loop {
        let slot = engine.begin_line(style, first)?;
        let rest = &title[pos..];
        if !number.is_empty() && number.len() + LEADER_GAP >= slot.width() {
            log::warn!(
                "Page number of {} cells does not fit a {}-cell contents line, dropping it",
                number.len(),
                slot.width()
            );
            number = &number[..0];
        }
        if number.is_empty() {
            // Title alone, continuing on the line already reserved
            if rest.is_empty() {
                return Ok(());
            }
            let (take, next) = fit(rest, slot.width());
            engine.put_cells(slot.y, slot.left, &rest[..take])?;
            engine.finish_line(slot.y, slot.left + take);
            pos = skip_spaces(title, pos + next);
            if pos >= title.len() {
                return Ok(());
            }
            first = false;
            continue;
        }
        let number_x = slot.right.saturating_sub(number.len()).max(slot.left);

        if first && fits_without_leader(rest.len(), number.len(), slot.width()) {
            engine.put_cells(slot.y, slot.left, rest)?;
            engine.put_cells(slot.y, number_x, number)?;
            engine.finish_line(slot.y, number_x + number.len());
            return Ok(());
        }

        let limit = slot.width().saturating_sub(number.len() + LEADER_GAP).max(1);
        let (take, next) = fit(rest, limit);
        engine.put_cells(slot.y, slot.left, &rest[..take])?;
        let after = skip_spaces(title, pos + next);
        if after >= title.len() {
            // Last title line: leader of guide dots up to the page number
            let start = slot.left + take + 1;
            let dots = number_x.saturating_sub(start + 1);
            if dots > 0 {
                engine.put_cells(slot.y, start, &vec![(GUIDE, CellSource::Guide); dots])?;
            }
            engine.put_cells(slot.y, number_x, number)?;
            engine.finish_line(slot.y, number_x + number.len());
            return Ok(());
        }
        engine.finish_line(slot.y, slot.left + take);
        pos = after;
        first = false;
    }
}
