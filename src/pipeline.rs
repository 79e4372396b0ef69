//! The monthly job: load, aggregate, render, send.

use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::builder::{RenderError, ReportBuilder};
use crate::config::ReportConfig;
use crate::mail::{self, Email, MailError, Receipt};
use crate::model::Report;
use crate::richtext::escape_markup;
use crate::sales::{load_sales, LoadError, SaleRecord};
use crate::summary::{summarize, AggregateError};
use crate::table::sales_table;

/// What a successful run produced.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub summary: Vec<String>,
    pub report_path: PathBuf,
    /// `None` when email delivery was disabled.
    pub receipt: Option<Receipt>,
}

/// A failure in one of the pipeline stages.
#[derive(Debug)]
pub enum PipelineError {
    Load(LoadError),
    Aggregate(AggregateError),
    Render(RenderError),
    Mail(MailError),
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<AggregateError> for PipelineError {
    fn from(err: AggregateError) -> Self {
        Self::Aggregate(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<MailError> for PipelineError {
    fn from(err: MailError) -> Self {
        Self::Mail(err)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(_) => write!(f, "Loading sales data failed"),
            Self::Aggregate(_) => write!(f, "Summarising sales data failed"),
            Self::Render(_) => write!(f, "Rendering the PDF report failed"),
            Self::Mail(_) => write!(f, "Emailing the report failed"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Aggregate(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Mail(err) => Some(err),
        }
    }
}

/// The report layout: the summary sentences above the full sales table.
fn build_report(title: &str, lines: &[String], records: &[SaleRecord]) -> Result<Report, RenderError> {
    let body = lines
        .iter()
        .map(|line| escape_markup(line))
        .collect::<Vec<_>>()
        .join("<br/>");
    Ok(Report::summary(title, &body, sales_table(records))?)
}

/// Runs the whole job described by `config`.
pub fn run(config: &ReportConfig) -> Result<RunOutcome, PipelineError> {
    info!("Loading sales data from {}", config.input.display());
    let records = load_sales(&config.input)?;

    info!(
        "Summarising {} records using the {} number format",
        records.len(),
        config.number_format
    );
    let summary = summarize(&records, &config.number_format)?;
    let lines = summary.lines();

    let report = build_report(&config.title, &lines, &records)?;

    info!("Rendering report to {}", config.output.display());
    ReportBuilder::new()
        .with_page_numbers()
        .render_to_file(&report, &config.output)?;

    let receipt = if config.send_email {
        let email = Email {
            sender: config.sender.clone(),
            recipient: config.recipient.clone(),
            subject: config.title.clone(),
            body: lines.join("\n"),
            attachment: config.output.clone(),
        };
        info!("Sending report to {}", email.recipient);
        let message = email.compose()?;
        Some(mail::send(&message, &config.delivery)?)
    } else {
        info!("Email delivery disabled; leaving report at {}", config.output.display());
        None
    };

    Ok(RunOutcome {
        summary: lines,
        report_path: config.output.clone(),
        receipt,
    })
}
