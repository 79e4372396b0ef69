//! Composition and delivery of the report email.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lettre::address::AddressError;
use lettre::message::header::{ContentType, ContentTypeErr};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::file::FileTransport;
use lettre::transport::smtp::SmtpTransport;
use lettre::{Message, Transport};
use log::info;

/// Default SMTP port of an unauthenticated local relay.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// An email with a single file attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Email {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment: PathBuf,
}

/// Where composed messages go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Plain SMTP without authentication or TLS, as offered by a local relay.
    Smtp { host: String, port: u16 },
    /// Writes each message as an `.eml` file into the directory.
    Outbox(PathBuf),
}

impl Default for Delivery {
    fn default() -> Self {
        Self::Smtp {
            host: "localhost".to_string(),
            port: DEFAULT_SMTP_PORT,
        }
    }
}

/// Acknowledgement of a delivered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receipt {
    /// Reply code of the accepting SMTP server.
    Smtp { code: String },
    /// Message id; the file is `<dir>/<id>.eml`.
    Outbox { id: String, dir: PathBuf },
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Smtp { code } => write!(f, "accepted by SMTP server ({})", code),
            Self::Outbox { id, dir } => write!(f, "written to {}", dir.join(format!("{id}.eml")).display()),
        }
    }
}

/// Errors raised while composing or delivering the email.
#[derive(Debug)]
pub enum MailError {
    /// The sender or recipient is not a valid mailbox.
    Address { value: String, source: AddressError },
    /// The attachment could not be read.
    Attachment { path: PathBuf, source: io::Error },
    /// The attachment's MIME type could not be parsed.
    ContentType {
        value: &'static str,
        source: ContentTypeErr,
    },
    /// The message could not be assembled.
    Build(lettre::error::Error),
    /// The SMTP exchange failed.
    Smtp(lettre::transport::smtp::Error),
    /// The message could not be written to the outbox.
    Outbox(lettre::transport::file::Error),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address { value, .. } => write!(f, "Invalid email address {:?}", value),
            Self::Attachment { path, .. } => {
                write!(f, "Failed to read attachment {}", path.display())
            }
            Self::ContentType { value, .. } => write!(f, "Invalid attachment content type {:?}", value),
            Self::Build(_) => write!(f, "Failed to build email message"),
            Self::Smtp(_) => write!(f, "Failed to send email over SMTP"),
            Self::Outbox(_) => write!(f, "Failed to write email to outbox"),
        }
    }
}

impl std::error::Error for MailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Address { source, .. } => Some(source),
            Self::Attachment { source, .. } => Some(source),
            Self::ContentType { source, .. } => Some(source),
            Self::Build(err) => Some(err),
            Self::Smtp(err) => Some(err),
            Self::Outbox(err) => Some(err),
        }
    }
}

fn mailbox(value: &str) -> Result<Mailbox, MailError> {
    value.parse().map_err(|source| MailError::Address {
        value: value.to_string(),
        source,
    })
}

fn attachment_content_type(path: &Path) -> Result<ContentType, MailError> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    let value = if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    ContentType::parse(value).map_err(|source| MailError::ContentType { value, source })
}

impl Email {
    /// Builds a `multipart/mixed` message: the plain-text body followed by the
    /// attachment, named after its file.
    pub fn compose(&self) -> Result<Message, MailError> {
        let content = fs::read(&self.attachment).map_err(|source| MailError::Attachment {
            path: self.attachment.clone(),
            source,
        })?;
        let filename = self
            .attachment
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let attachment =
            Attachment::new(filename).body(content, attachment_content_type(&self.attachment)?);

        Message::builder()
            .from(mailbox(&self.sender)?)
            .to(mailbox(&self.recipient)?)
            .subject(self.subject.as_str())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(self.body.clone()))
                    .singlepart(attachment),
            )
            .map_err(MailError::Build)
    }
}

/// Delivers `message` and returns the transport's acknowledgement.
pub fn send(message: &Message, delivery: &Delivery) -> Result<Receipt, MailError> {
    match delivery {
        Delivery::Smtp { host, port } => {
            let transport = SmtpTransport::builder_dangerous(host.as_str())
                .port(*port)
                .build();
            let response = transport.send(message).map_err(MailError::Smtp)?;
            let code = response.code().to_string();
            info!("Email accepted by {}:{} ({})", host, port, code);
            Ok(Receipt::Smtp { code })
        }
        Delivery::Outbox(dir) => {
            let id = FileTransport::new(dir)
                .send(message)
                .map_err(MailError::Outbox)?;
            info!("Email written to outbox {} as {}", dir.display(), id);
            Ok(Receipt::Outbox {
                id,
                dir: dir.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(dir: &Path) -> Email {
        let attachment = dir.join("cars.pdf");
        fs::write(&attachment, b"%PDF-1.3 fake").expect("write attachment");
        Email {
            sender: "automation@example.com".into(),
            recipient: "student@example.com".into(),
            subject: "Sales summary for last month".into(),
            body: "line one\nline two".into(),
            attachment,
        }
    }

    #[test]
    fn composes_multipart_message_with_pdf() {
        let dir = tempfile::tempdir().expect("temp dir");
        let message = email(dir.path()).compose().expect("compose");
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();

        assert!(raw.contains("From: automation@example.com"));
        assert!(raw.contains("To: student@example.com"));
        assert!(raw.contains("Subject: Sales summary for last month"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("filename=\"cars.pdf\""));
        assert!(raw.contains("line one"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut email = email(dir.path());
        email.recipient = "@example.com".into();
        let err = email.compose().unwrap_err();
        assert!(matches!(err, MailError::Address { .. }));
    }

    #[test]
    fn missing_attachment_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut email = email(dir.path());
        email.attachment = dir.path().join("absent.pdf");
        let err = email.compose().unwrap_err();
        assert!(err.to_string().contains("absent.pdf"));
    }

    #[test]
    fn outbox_delivery_writes_eml() {
        let dir = tempfile::tempdir().expect("temp dir");
        let outbox = tempfile::tempdir().expect("outbox dir");
        let message = email(dir.path()).compose().expect("compose");

        let receipt = send(&message, &Delivery::Outbox(outbox.path().to_path_buf())).expect("send");
        let Receipt::Outbox { id, .. } = receipt else {
            panic!("expected an outbox receipt");
        };
        let written = fs::read_to_string(outbox.path().join(format!("{id}.eml"))).expect("eml");
        assert!(written.contains("Subject: Sales summary for last month"));
    }

    #[test]
    fn non_pdf_attachments_are_octet_streams() {
        let content_type = attachment_content_type(Path::new("report.bin")).expect("content type");
        assert_eq!(
            content_type,
            ContentType::parse("application/octet-stream").expect("valid")
        );
    }

    #[test]
    fn pdf_attachments_are_never_labelled_as_text() {
        for name in ["cars.pdf", "CARS.PDF"] {
            let content_type = attachment_content_type(Path::new(name)).expect("content type");
            assert_eq!(content_type, ContentType::parse("application/pdf").expect("valid"));
            assert_ne!(content_type, ContentType::TEXT_PLAIN);
        }
    }
}
