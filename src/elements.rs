//! Conversion of report model blocks into `genpdf` elements.
//!
//! Paragraphs become one `genpdf` paragraph per line and tables become a framed
//! [`TableLayout`] with a bold header row.

use genpdf::elements::{Break, FrameCellDecorator, LinearLayout, Paragraph, TableLayout};
use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{Element, Mm};

use crate::model::{RichParagraph, TableBlock};
use crate::richtext::Span;

const CELL_PADDING_MM: f64 = 1.0;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn line_paragraph(spans: &[Span]) -> Paragraph {
    let mut paragraph = Paragraph::new("");
    for span in spans {
        paragraph.push(span.to_styled_string());
    }
    paragraph
}

/// Builds a vertical stack with one paragraph per line; empty lines become gaps.
pub fn paragraph_element(paragraph: &RichParagraph) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    for line in paragraph.lines() {
        if line.is_empty() {
            layout.push(Break::new(1));
        } else {
            layout.push(line_paragraph(line));
        }
    }
    layout
}

fn cell(text: &str, style: Style) -> Box<dyn Element> {
    let paragraph = Paragraph::new(StyledString::new(text.to_string(), style));
    Box::new(paragraph.padded(mm_from_f64(CELL_PADDING_MM)))
}

/// Builds a framed table; the first row is set in bold and short rows are padded
/// with empty cells.
pub fn table_element(table: &TableBlock) -> Result<TableLayout, Error> {
    let columns = table.column_count();
    let mut layout = TableLayout::new(table.column_weights());
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    for (index, row) in table.rows().iter().enumerate() {
        let style = if index == 0 {
            Style::new().bold()
        } else {
            Style::new()
        };
        let cells = (0..columns)
            .map(|column| cell(row.get(column).map(String::as_str).unwrap_or(""), style))
            .collect();
        layout.push_row(cells)?;
    }

    Ok(layout)
}
