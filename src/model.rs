//! Data structures describing the logical content of a sales report.
//!
//! The types here mirror the building blocks the renderer understands without
//! referencing `genpdf` directly, so a report can be assembled, inspected and
//! tested before any fonts are loaded.

use crate::richtext::{parse_markup, Line, ParseError};

/// Styled paragraph made of one or more lines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    lines: Vec<Line>,
}

impl RichParagraph {
    /// Creates a paragraph from pre-styled lines.
    pub fn new(lines: impl Into<Vec<Line>>) -> Self {
        Self {
            lines: lines.into(),
        }
    }

    /// Parses an HTML-like body fragment into a paragraph.
    pub fn from_markup(markup: &str) -> Result<Self, ParseError> {
        parse_markup(markup).map(Self::new)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}

/// A rectangular table whose first row is rendered as the header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableBlock {
    rows: Vec<Vec<String>>,
    column_weights: Option<Vec<usize>>,
}

impl TableBlock {
    /// Creates a table from rows of cell text; the first row is the header.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            column_weights: None,
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns, taken from the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Relative column widths; every column gets the same share unless set.
    pub fn column_weights(&self) -> Vec<usize> {
        match &self.column_weights {
            Some(weights) if weights.len() == self.column_count() => weights.clone(),
            _ => vec![1; self.column_count()],
        }
    }

    /// Sets relative column widths and returns the updated table.
    ///
    /// Weights that do not match the column count are ignored at render time.
    pub fn with_column_weights(mut self, weights: impl Into<Vec<usize>>) -> Self {
        self.column_weights = Some(weights.into());
        self
    }
}

/// Individual content blocks of a report, rendered top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(RichParagraph),
    Table(TableBlock),
    /// Vertical gap measured in lines.
    Spacer(f64),
}

/// A titled report made of content blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    title: String,
    blocks: Vec<Block>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated report.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Builds the standard sales report layout: the body text, a gap, then the table.
    ///
    /// `body` uses the markup accepted by [`parse_markup`].
    pub fn summary(
        title: impl Into<String>,
        body: &str,
        table: Vec<Vec<String>>,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(title)
            .with_block(Block::Paragraph(RichParagraph::from_markup(body)?))
            .with_block(Block::Spacer(1.0))
            .with_block(Block::Table(
                TableBlock::new(table).with_column_weights(vec![1, 5, 2, 2]),
            )))
    }
}
