use std::path::Path;
use std::time::Duration;

use futures::future::BoxFuture;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use super::types::{OutgoingEmail, SmtpConfig, SmtpSendResult};

/// Why a message could not be delivered, worded for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    #[error("Server disconnected")]
    Disconnected,
    #[error("Email sender must be a valid email address")]
    SenderRefused,
    #[error("Some recipients were refused")]
    RecipientsRefused,
    #[error("Problem with email content")]
    Data,
    #[error("Unable to establish connection with smtp server. Please check server address")]
    Connect,
    #[error("Authentication failed. Please check credentials.")]
    Authentication,
    #[error("Unable to send email. Please check configuration")]
    Other,
}

pub trait Mailer: Send + Sync {
    fn send<'a>(
        &'a self,
        config: &'a SmtpConfig,
        email: &'a OutgoingEmail,
    ) -> BoxFuture<'a, Result<SmtpSendResult, SendFailure>>;
}

/// Sends through an SMTP relay with lettre.
#[derive(Debug, Clone)]
pub struct LettreMailer {
    timeout: Option<Duration>,
}

impl Default for LettreMailer {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl LettreMailer {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn deliver(
        &self,
        config: &SmtpConfig,
        email: &OutgoingEmail,
    ) -> Result<SmtpSendResult, SendFailure> {
        let attachments = read_attachments(&email.attachments).await;
        let message = build_message(config, email, attachments)?;
        let transport = build_transport(config, self.timeout)?;

        log::debug!(
            "Sending \"{}\" through {}:{}",
            email.subject,
            config.server,
            config.port.map_or_else(|| "default".to_string(), |p| p.to_string())
        );
        transport
            .send(message)
            .await
            .map(|_response| SmtpSendResult {
                success: true,
                message: "Email sent successfully".to_string(),
            })
            .map_err(|e| {
                log::error!("Failed to send email: {e}");
                classify(&e)
            })
    }
}

impl Mailer for LettreMailer {
    fn send<'a>(
        &'a self,
        config: &'a SmtpConfig,
        email: &'a OutgoingEmail,
    ) -> BoxFuture<'a, Result<SmtpSendResult, SendFailure>> {
        Box::pin(self.deliver(config, email))
    }
}

/// Build an async SMTP transport from the given config.
fn build_transport(
    config: &SmtpConfig,
    timeout: Option<Duration>,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, SendFailure> {
    let credentials = config
        .login
        .as_deref()
        .filter(|l| !l.is_empty())
        .map(|login| {
            Credentials::new(login.to_string(), config.password.clone().unwrap_or_default())
        });

    let mut builder = if config.ssl {
        // Implicit TLS (typically port 465)
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server).map_err(|e| {
            log::error!("SMTP relay error: {e}");
            SendFailure::Connect
        })?
    } else if config.tls {
        // STARTTLS (typically port 587)
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server).map_err(|e| {
            log::error!("SMTP STARTTLS error: {e}");
            SendFailure::Connect
        })?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
    };

    if let Some(port) = config.port {
        builder = builder.port(port);
    }
    if let Some(credentials) = credentials {
        builder = builder.credentials(credentials);
    }
    Ok(builder.timeout(timeout).build())
}

async fn read_attachments(paths: &[std::path::PathBuf]) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for path in paths {
        let is_file = tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            log::warn!("Attachment {} is not a file, skipped", path.display());
            continue;
        }
        match tokio::fs::read(path).await {
            Ok(content) => files.push((file_name(path), content)),
            Err(e) => log::warn!("Unable to read attachment {}: {e}", path.display()),
        }
    }
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

fn parse_mailboxes(list: &str) -> Result<Vec<Mailbox>, SendFailure> {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| a.parse::<Mailbox>().map_err(|_| SendFailure::RecipientsRefused))
        .collect()
}

pub(crate) fn build_message(
    config: &SmtpConfig,
    email: &OutgoingEmail,
    attachments: Vec<(String, Vec<u8>)>,
) -> Result<Message, SendFailure> {
    let from = email
        .sender
        .as_deref()
        .or(config.sender.as_deref())
        .or(config.login.as_deref())
        .filter(|s| !s.trim().is_empty())
        .ok_or(SendFailure::SenderRefused)?
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| SendFailure::SenderRefused)?;

    let to = parse_mailboxes(&email.recipient)?;
    if to.is_empty() {
        return Err(SendFailure::RecipientsRefused);
    }

    let mut builder = Message::builder().from(from).subject(email.subject.as_str());
    for mailbox in to {
        builder = builder.to(mailbox);
    }
    for mailbox in parse_mailboxes(email.cc.as_deref().unwrap_or_default())? {
        builder = builder.cc(mailbox);
    }
    for mailbox in parse_mailboxes(email.bcc.as_deref().unwrap_or_default())? {
        builder = builder.bcc(mailbox);
    }

    let html = format!("<html><head></head><body>{}</body></html>", email.content);
    let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
        email.content.clone(),
        html,
    ));
    for (name, content) in attachments {
        let mime = mime_guess::from_path(&name).first_or_octet_stream();
        let content_type = ContentType::parse(mime.essence_str()).map_err(|_| SendFailure::Data)?;
        body = body.singlepart(Attachment::new(name).body(content, content_type));
    }

    builder.multipart(body).map_err(|e| {
        log::error!("Unable to build email: {e}");
        SendFailure::Data
    })
}

fn classify(err: &lettre::transport::smtp::Error) -> SendFailure {
    let code = err.status().and_then(|c| c.to_string().parse::<u16>().ok());
    match code {
        Some(530 | 534 | 535) => SendFailure::Authentication,
        Some(421) => SendFailure::Disconnected,
        Some(550 | 551 | 553) => SendFailure::RecipientsRefused,
        Some(552 | 554) => SendFailure::Data,
        Some(_) => SendFailure::Other,
        None if err.is_timeout() => SendFailure::Connect,
        None if err.is_permanent() || err.is_transient() => SendFailure::Other,
        None => SendFailure::Connect,
    }
}
