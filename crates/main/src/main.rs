use std::error::Error;
use std::path::PathBuf;

use car_sales_report::config::{recipient_from_env, ReportConfig};
use car_sales_report::mail::{Delivery, DEFAULT_SMTP_PORT};
use car_sales_report::number::NumberFormat;
use car_sales_report::pipeline;
use clap::Parser;

/// Summarises `car_sales.json`, renders the summary as a PDF and emails it.
///
/// Run without arguments to process `car_sales.json` in the working directory,
/// write the report to the temp directory and send it to `$USER@example.com`
/// through the SMTP server on `localhost:25`. Fonts are looked up as described
/// in the library's `fonts` module (`CAR_SALES_FONTS_DIR` overrides).
#[derive(Parser)]
#[command(author, version, about = "Monthly car sales report")]
struct Cli {
    /// Sales export to read.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where to write the PDF report.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report title and email subject.
    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    sender: Option<String>,

    /// Defaults to `$USER@example.com`.
    #[arg(long)]
    recipient: Option<String>,

    /// Number convention of the price column, e.g. `en_US` or `de_DE.UTF-8`.
    #[arg(long, default_value = "en_US")]
    locale: NumberFormat,

    #[arg(long, default_value = "localhost")]
    smtp_host: String,

    #[arg(long, default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,

    /// Write the email as an `.eml` file into this directory instead of sending it.
    #[arg(long, conflicts_with = "no_email")]
    outbox: Option<PathBuf>,

    /// Only render the PDF.
    #[arg(long)]
    no_email: bool,
}

impl Cli {
    fn into_config(self) -> Result<ReportConfig, Box<dyn Error>> {
        let recipient = match self.recipient {
            Some(recipient) => recipient,
            None if self.no_email => String::new(),
            None => recipient_from_env()?,
        };

        let mut config = ReportConfig::new(recipient);
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(subject) = self.subject {
            config.title = subject;
        }
        if let Some(sender) = self.sender {
            config.sender = sender;
        }
        config.number_format = self.locale;
        config.delivery = match self.outbox {
            Some(dir) => Delivery::Outbox(dir),
            None => Delivery::Smtp {
                host: self.smtp_host,
                port: self.smtp_port,
            },
        };
        config.send_email = !self.no_email;
        Ok(config)
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.into_config()?;
    let outcome = pipeline::run(&config)?;

    for line in &outcome.summary {
        println!("{}", line);
    }
    println!("Report written to {}", outcome.report_path.display());
    if let Some(receipt) = outcome.receipt {
        println!("Email {}", receipt);
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
