//! Rendering of [`Report`] values into PDF documents.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::elements::{Break, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{self, Style, StyledString};
use genpdf::{Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position, Size};
use log::{debug, info};

use crate::elements;
use crate::fonts;
use crate::model::{Block, Report};
use crate::richtext::ParseError;

const DEFAULT_MARGIN_MM: i32 = 15;
const DEFAULT_FONT_SIZE: u8 = 10;
const TITLE_FONT_SIZE: u8 = 18;
const PAGE_NUMBER_FOOTER_MM: i32 = 8;

type ElementFactory = dyn Fn(usize) -> Box<dyn Element>;

/// Errors raised while turning a report into a PDF.
#[derive(Debug)]
pub enum RenderError {
    /// No usable font family was found.
    FontLoad(Error),
    /// The report body markup is malformed.
    Markup(ParseError),
    /// `genpdf` failed to lay out or serialize the document.
    Layout(Error),
    /// The rendered PDF could not be written.
    Io { path: PathBuf, source: io::Error },
}

impl From<ParseError> for RenderError {
    fn from(err: ParseError) -> Self {
        Self::Markup(err)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(_) => write!(f, "Failed to load report fonts"),
            Self::Markup(_) => write!(f, "Invalid report body markup"),
            Self::Layout(_) => write!(f, "Failed to render report"),
            Self::Io { path, .. } => write!(f, "Failed to write report to {}", path.display()),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Layout(err) => Some(err),
            Self::Markup(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// The bytes of a rendered PDF.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
}

/// Renders reports with a shared page setup.
pub struct ReportBuilder {
    paper_size: Size,
    margins: Margins,
    footer: Option<FooterSpec>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4.into(),
            margins: Margins::all(DEFAULT_MARGIN_MM),
            footer: None,
        }
    }
}

impl ReportBuilder {
    /// A4 pages with 15 mm margins and no footer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default setup plus a right-aligned `Page N` footer.
    pub fn with_page_numbers(self) -> Self {
        self.with_footer(PAGE_NUMBER_FOOTER_MM, |page| {
            let mut line = Paragraph::new(StyledString::new(
                format!("Page {}", page),
                Style::new().with_font_size(8),
            ));
            line.set_alignment(Alignment::Right);
            line
        })
    }

    /// Configures a footer with a fixed height that is rendered on every page.
    pub fn with_footer<F, E>(mut self, height: impl Into<Mm>, footer: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        self.footer = Some(FooterSpec::new(height, footer));
        self
    }

    fn document(self, report: &Report) -> Result<genpdf::Document, RenderError> {
        let font_family = fonts::default_font_family().map_err(RenderError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(report.title());
        document.set_paper_size(self.paper_size);
        document.set_font_size(DEFAULT_FONT_SIZE);
        document.set_page_decorator(ConfiguredPageDecorator::new(self.margins, self.footer));

        let mut title = Paragraph::new(StyledString::new(
            report.title().to_string(),
            Style::new().bold().with_font_size(TITLE_FONT_SIZE),
        ));
        title.set_alignment(Alignment::Center);
        document.push(title);
        document.push(Break::new(1));

        for block in report.blocks() {
            match block {
                Block::Paragraph(paragraph) => document.push(elements::paragraph_element(paragraph)),
                Block::Table(table) => {
                    document.push(elements::table_element(table).map_err(RenderError::Layout)?)
                }
                Block::Spacer(lines) => document.push(Break::new(*lines)),
            }
        }

        Ok(document)
    }

    /// Renders `report` into memory.
    pub fn render(self, report: &Report) -> Result<RenderedPdf, RenderError> {
        let document = self.document(report)?;
        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(RenderError::Layout)?;
        debug!("Rendered '{}' ({} bytes)", report.title(), bytes.len());
        Ok(RenderedPdf { bytes })
    }

    /// Renders `report` and writes it to `path`, replacing any existing file.
    pub fn render_to_file(
        self,
        report: &Report,
        path: impl AsRef<Path>,
    ) -> Result<RenderedPdf, RenderError> {
        let path = path.as_ref();
        let pdf = self.render(report)?;
        fs::write(path, &pdf.bytes).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Wrote {} ({} bytes)", path.display(), pdf.bytes.len());
        Ok(pdf)
    }
}

/// Renders a PDF at `path` with a title, an HTML-like body fragment and a table
/// whose first row is the header.
pub fn generate(
    path: impl AsRef<Path>,
    title: &str,
    body: &str,
    table: Vec<Vec<String>>,
) -> Result<RenderedPdf, RenderError> {
    let report = Report::summary(title, body, table)?;
    ReportBuilder::new()
        .with_page_numbers()
        .render_to_file(&report, path)
}

/// Definition of a footer rendered through the page decorator.
pub struct FooterSpec {
    height: Mm,
    factory: Box<ElementFactory>,
}

impl FooterSpec {
    pub fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: Margins,
    footer: Option<FooterSpec>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Margins, footer: Option<FooterSpec>) -> Self {
        Self {
            page: 0,
            margins,
            footer,
        }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(self.page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        Ok(area)
    }
}
