//! Table measurement and layout.
//!
//! Tables that fit the line are laid out side by side ("simple"); others
//! are written one row per paragraph ("linear").

use serde::{Deserialize, Serialize};

use super::engine::{wrap, FormatEngine, RunCell};
use super::grid::CellSource;
use crate::error::Result;
use crate::model::{ContainerType, Document, ElementKind, NodeId};
use crate::style::Style;

/// Formatting attribute recording the chosen table type.
pub const TABLE_TYPE_ATTR: &str = "brl:tableType";

/// Attribute with which a document forces a table type.
pub const USER_TABLE_TYPE_ATTR: &str = "tableType";

/// How a table is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableType {
    /// Columns side by side
    Simple,
    /// One paragraph per row
    Linear,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Simple => "simple",
            TableType::Linear => "linear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "simple" => Some(TableType::Simple),
            "linear" => Some(TableType::Linear),
            _ => None,
        }
    }

    /// Type requested by the document or recorded by probing.
    pub fn of(doc: &Document, table: NodeId) -> Option<Self> {
        doc.attr(table, USER_TABLE_TYPE_ATTR)
            .and_then(Self::parse)
            .or_else(|| doc.attr(table, TABLE_TYPE_ATTR).and_then(Self::parse))
    }
}

/// Table layout configuration.
#[derive(Debug, Clone)]
pub struct TableLayoutConfig {
    /// Blank cells between columns of a simple table
    pub column_gap: usize,
    /// Character of the line drawn under header rows (dots 2-5)
    pub header_rule: char,
    /// Separator between cells of a linear row (semicolon, space)
    pub linear_separator: &'static str,
}

impl Default for TableLayoutConfig {
    fn default() -> Self {
        Self {
            column_gap: 2,
            header_rule: '3',
            linear_separator: "2 ",
        }
    }
}

/// Print-side facts about one cell, used for width absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrintCell {
    pub len: usize,
    /// Continues the cell directly above
    pub continued: bool,
    pub image: bool,
}

/// Width of a column: its widest cell.
pub fn column_width(lengths: &[usize]) -> usize {
    lengths.iter().copied().max().unwrap_or(0)
}

/// Print width of every cell after absorption.
///
/// A `continued` cell absorbs the width of the cell in the same column of
/// the previous row, unless either of them is an image.
pub fn absorbed_print_widths(rows: &[Vec<PrintCell>]) -> Vec<Vec<usize>> {
    let mut widths: Vec<Vec<usize>> = Vec::with_capacity(rows.len());
    for (r, row) in rows.iter().enumerate() {
        let mut out = Vec::with_capacity(row.len());
        for (c, cell) in row.iter().enumerate() {
            let mut width = cell.len;
            if r > 0 && cell.continued && !cell.image {
                let above = rows[r - 1].get(c);
                if let (Some(above), Some(above_width)) = (above, widths[r - 1].get(c)) {
                    if !above.image {
                        width += above_width;
                    }
                }
            }
            out.push(width);
        }
        widths.push(out);
    }
    widths
}

/// Column widths and rows of a translated table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetrics {
    pub braille_widths: Vec<usize>,
    pub print_widths: Vec<usize>,
    #[serde(skip)]
    pub rows: Vec<Vec<NodeId>>,
    #[serde(skip)]
    pub header_rows: Vec<bool>,
}

impl TableMetrics {
    /// Measure a table whose cells already carry translations.
    pub fn measure(doc: &Document, table: NodeId) -> Self {
        let mut row_nodes = Vec::new();
        collect_rows(doc, table, &mut row_nodes);

        let mut rows = Vec::with_capacity(row_nodes.len());
        let mut header_rows = Vec::with_capacity(row_nodes.len());
        let mut braille: Vec<Vec<usize>> = Vec::new();
        let mut print: Vec<Vec<PrintCell>> = Vec::new();
        for row in row_nodes {
            let cells: Vec<NodeId> = doc
                .children(row)
                .filter(|c| doc.element(*c).map(|e| e.is_block()).unwrap_or(false))
                .collect();
            braille.push(
                cells
                    .iter()
                    .map(|c| doc.braille_content(*c).trim().chars().count())
                    .collect(),
            );
            print.push(
                cells
                    .iter()
                    .map(|c| PrintCell {
                        len: doc.text_content(*c).trim().chars().count(),
                        continued: doc.attr(*c, "continued") == Some("true"),
                        image: is_image_cell(doc, *c),
                    })
                    .collect(),
            );
            header_rows.push(doc.attr(row, "header") == Some("true"));
            rows.push(cells);
        }

        let columns = braille.iter().map(|r| r.len()).max().unwrap_or(0);
        let absorbed = absorbed_print_widths(&print);
        let per_column = |grid: &[Vec<usize>], c: usize| {
            column_width(&grid.iter().filter_map(|r| r.get(c).copied()).collect::<Vec<_>>())
        };
        Self {
            braille_widths: (0..columns).map(|c| per_column(&braille, c)).collect(),
            print_widths: (0..columns).map(|c| per_column(&absorbed, c)).collect(),
            rows,
            header_rows,
        }
    }

    pub fn columns(&self) -> usize {
        self.braille_widths.len()
    }

    /// Cells needed to place the columns side by side.
    pub fn simple_width(&self, gap: usize) -> usize {
        let sum: usize = self.braille_widths.iter().sum();
        sum + gap * self.columns().saturating_sub(1)
    }

    /// Whether a simple layout fits `width` cells.
    pub fn fits(&self, width: usize) -> bool {
        self.simple_width(TableLayoutConfig::default().column_gap) <= width
    }

    /// Layout to use at `width` cells.
    pub fn table_type(&self, width: usize) -> TableType {
        if self.columns() <= 1 || self.fits(width) {
            TableType::Simple
        } else {
            TableType::Linear
        }
    }
}

fn collect_rows(doc: &Document, node: NodeId, rows: &mut Vec<NodeId>) {
    for child in doc.children(node) {
        match doc.element(child).map(|e| e.kind()) {
            Some(ElementKind::Container(ContainerType::TableRow)) => rows.push(child),
            // Nested tables are laid out on their own
            Some(ElementKind::Container(ContainerType::Table)) => {}
            Some(ElementKind::Container(_)) | Some(ElementKind::Section) => {
                collect_rows(doc, child, rows)
            }
            _ => {}
        }
    }
}

fn is_image_cell(doc: &Document, cell: NodeId) -> bool {
    doc.descendants(cell).into_iter().any(|d| {
        doc.element(d)
            .map(|e| e.kind() == ElementKind::Container(ContainerType::Image))
            .unwrap_or(false)
    })
}

/// Lay out a table container.
pub(crate) fn format_table(engine: &mut FormatEngine<'_>, table: NodeId, style: &Style) -> Result<()> {
    let doc = engine.document();
    let metrics = TableMetrics::measure(doc, table);
    if metrics.rows.is_empty() {
        return engine.format_flow(table, style);
    }
    let available = engine.width().saturating_sub(style.indent);
    let table_type = TableType::of(doc, table).unwrap_or_else(|| metrics.table_type(available));
    log::debug!(
        "Laying out {} table: {} rows, column widths {:?}",
        table_type.as_str(),
        metrics.rows.len(),
        metrics.braille_widths
    );
    let config = TableLayoutConfig::default();
    match table_type {
        TableType::Simple if metrics.fits(available) => simple(engine, &metrics, style, &config),
        TableType::Simple => {
            log::warn!(
                "Table marked simple needs {} cells but only {} are available; using linear layout",
                metrics.simple_width(config.column_gap),
                available
            );
            linear(engine, &metrics, style, &config)
        }
        TableType::Linear => linear(engine, &metrics, style, &config),
    }
}

fn cell_run(engine: &FormatEngine<'_>, cell: NodeId) -> Vec<RunCell> {
    engine.subtree_run(cell, &|_, _| false)
}

fn simple(
    engine: &mut FormatEngine<'_>,
    metrics: &TableMetrics,
    style: &Style,
    config: &TableLayoutConfig,
) -> Result<()> {
    // Rows span the full width, so they stay off page number lines
    let mut row_style = style.clone();
    row_style.skip_number_lines = true;

    for (r, row) in metrics.rows.iter().enumerate() {
        let columns: Vec<Vec<Vec<RunCell>>> = row
            .iter()
            .enumerate()
            .map(|(c, cell)| wrap(&cell_run(engine, *cell), metrics.braille_widths[c]))
            .collect();
        let height = columns.iter().map(|lines| lines.len()).max().unwrap_or(0).max(1);
        for line in 0..height {
            let slot = engine.begin_line(&row_style, true)?;
            let mut x = slot.left;
            let mut end = slot.left;
            for (c, lines) in columns.iter().enumerate() {
                if let Some(cells) = lines.get(line).filter(|l| !l.is_empty()) {
                    engine.put_cells(slot.y, x, cells)?;
                    end = x + cells.len();
                }
                x += metrics.braille_widths[c] + config.column_gap;
            }
            engine.finish_line(slot.y, end.max(slot.left + 1));
        }

        let header = metrics.header_rows.get(r).copied().unwrap_or(false);
        let next_header = metrics.header_rows.get(r + 1).copied().unwrap_or(false);
        if header && !next_header {
            let slot = engine.begin_line(&row_style, true)?;
            let rule = vec![
                (config.header_rule, CellSource::Reserved);
                metrics.simple_width(config.column_gap).min(slot.width())
            ];
            engine.put_cells(slot.y, slot.left, &rule)?;
            engine.finish_line(slot.y, slot.left + rule.len());
        }
    }
    Ok(())
}

fn linear(
    engine: &mut FormatEngine<'_>,
    metrics: &TableMetrics,
    style: &Style,
    config: &TableLayoutConfig,
) -> Result<()> {
    for row in &metrics.rows {
        let mut run: Vec<RunCell> = Vec::new();
        for cell in row {
            let cells = cell_run(engine, *cell);
            if cells.iter().all(|(c, _)| *c == ' ') {
                continue;
            }
            if !run.is_empty() {
                run.extend(config.linear_separator.chars().map(|c| (c, CellSource::Reserved)));
            }
            run.extend(cells);
        }
        if !run.is_empty() {
            engine.layout_paragraph(&run, style, true)?;
        }
    }
    Ok(())
}
