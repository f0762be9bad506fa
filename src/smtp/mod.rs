pub mod client;
pub mod types;

pub use client::{LettreMailer, Mailer, SendFailure};
pub use types::{OutgoingEmail, SmtpConfig, SmtpSendResult};
