//! Outgoing email.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mail errors.
#[derive(Error, Debug)]
pub enum MailError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("outbox lock poisoned")]
    Poisoned,
}

pub type MailResult<T> = Result<T, MailError>;

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An email message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
    /// MIME subtype of the body ("plain" or "html")
    pub content_subtype: String,
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    /// Plain-text message.
    pub fn new(subject: &str, body: &str, from: &str, to: Vec<String>) -> Self {
        Self {
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
            to,
            content_subtype: "plain".to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn html(mut self) -> Self {
        self.content_subtype = "html".to_string();
        self
    }

    pub fn attach(&mut self, filename: &str, content: Vec<u8>, content_type: &str) {
        self.attachments.push(Attachment {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            content,
        });
    }

    /// Reject recipients that cannot be addresses.
    pub fn validate(&self) -> MailResult<()> {
        for address in self.to.iter().chain(std::iter::once(&self.from)) {
            let valid = match address.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty() && !domain.is_empty() && !address.contains(char::is_whitespace)
                }
                None => false,
            };
            if !valid {
                return Err(MailError::InvalidAddress(address.clone()));
            }
        }
        Ok(())
    }
}

/// Delivers messages. Returns the number of messages sent.
pub trait MailTransport: Send + Sync {
    fn send(&self, message: &EmailMessage) -> MailResult<usize>;
}

/// Keeps sent messages in memory.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> MailResult<Vec<EmailMessage>> {
        Ok(self.sent.lock().map_err(|_| MailError::Poisoned)?.clone())
    }
}

impl MailTransport for MemoryOutbox {
    fn send(&self, message: &EmailMessage) -> MailResult<usize> {
        if message.to.is_empty() {
            return Ok(0);
        }
        message.validate()?;
        self.sent
            .lock()
            .map_err(|_| MailError::Poisoned)?
            .push(message.clone());
        Ok(1)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OutboxAttachment {
    filename: String,
    content_type: String,
    /// Hex-encoded content
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutboxRecord {
    subject: String,
    body: String,
    from: String,
    to: Vec<String>,
    content_subtype: String,
    attachments: Vec<OutboxAttachment>,
    queued_at: DateTime<Utc>,
}

/// Writes each message as a JSON file for a relay to pick up.
#[derive(Debug, Clone)]
pub struct FileOutbox {
    dir: PathBuf,
}

impl FileOutbox {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Read back a queued message.
    pub fn read(&self, file_name: &str) -> MailResult<EmailMessage> {
        let raw = fs::read(self.dir.join(file_name))?;
        let record: OutboxRecord = serde_json::from_slice(&raw)?;
        let mut attachments = Vec::with_capacity(record.attachments.len());
        for attachment in record.attachments {
            let content = hex::decode(&attachment.content).map_err(|e| {
                MailError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })?;
            attachments.push(Attachment {
                filename: attachment.filename,
                content_type: attachment.content_type,
                content,
            });
        }
        Ok(EmailMessage {
            subject: record.subject,
            body: record.body,
            from: record.from,
            to: record.to,
            content_subtype: record.content_subtype,
            attachments,
        })
    }
}

impl MailTransport for FileOutbox {
    fn send(&self, message: &EmailMessage) -> MailResult<usize> {
        if message.to.is_empty() {
            return Ok(0);
        }
        message.validate()?;
        fs::create_dir_all(&self.dir)?;

        let queued_at = Utc::now();
        let record = OutboxRecord {
            subject: message.subject.clone(),
            body: message.body.clone(),
            from: message.from.clone(),
            to: message.to.clone(),
            content_subtype: message.content_subtype.clone(),
            attachments: message
                .attachments
                .iter()
                .map(|a| OutboxAttachment {
                    filename: a.filename.clone(),
                    content_type: a.content_type.clone(),
                    content: hex::encode(&a.content),
                })
                .collect(),
            queued_at,
        };
        let file_name = format!(
            "{}-{}.json",
            queued_at.format("%Y%m%dT%H%M%S"),
            uuid::Uuid::new_v4()
        );
        fs::write(self.dir.join(&file_name), serde_json::to_vec_pretty(&record)?)?;

        tracing::info!(file = %file_name, recipients = message.to.len(), "queued email");
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &[&str]) -> EmailMessage {
        let mut msg = EmailMessage::new(
            "Patient Discharge Summary",
            "Please find the attached file",
            "care@example.org",
            to.iter().map(|s| s.to_string()).collect(),
        )
        .html();
        msg.attach("summary.pdf", b"%PDF".to_vec(), "application/pdf");
        msg
    }

    #[test]
    fn test_memory_outbox_records_message() {
        let outbox = MemoryOutbox::new();
        assert_eq!(outbox.send(&message(&["a@example.org", "b@example.org"])).unwrap(), 1);

        let sent = outbox.messages().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.len(), 2);
        assert_eq!(sent[0].content_subtype, "html");
        assert_eq!(sent[0].attachments[0].content, b"%PDF");
    }

    #[test]
    fn test_no_recipients_sends_nothing() {
        let outbox = MemoryOutbox::new();
        assert_eq!(outbox.send(&message(&[])).unwrap(), 0);
        assert!(outbox.messages().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_address() {
        let outbox = MemoryOutbox::new();
        let err = outbox.send(&message(&["not an address"])).unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }

    #[test]
    fn test_file_outbox_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = FileOutbox::new(dir.path().join("outbox"));
        let msg = message(&["doctor@example.org"]);
        assert_eq!(outbox.send(&msg).unwrap(), 1);

        let entries: Vec<_> = fs::read_dir(outbox.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let name = entries[0].as_ref().unwrap().file_name();
        let read_back = outbox.read(name.to_str().unwrap()).unwrap();
        assert_eq!(read_back, msg);
    }
}
