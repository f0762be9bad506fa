//! Settings panel controller: binds the form to the settings service and
//! reports outcomes as notifications for the host UI.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

use crate::error::{Result, SettingsError};
use crate::persistence::SettingsService;
use crate::settings::{FormState, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Loading(String),
    Success(String),
    Error(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::Loading(msg) => log::info!("{msg}"),
            Notification::Success(msg) => log::info!("{msg}"),
            Notification::Error(msg) => log::error!("{msg}"),
        }
    }
}

impl Notifier for UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.send(notification) {
            log::warn!("Failed to deliver notification to UI: {e}");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Save,
    Test,
}

/// Clears the pending operation when dropped.
struct PendingGuard<'a> {
    slot: &'a Mutex<Option<Operation>>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

pub struct SettingsPanel<N: Notifier> {
    service: SettingsService,
    notifier: N,
    form: Mutex<FormState>,
    pending: Mutex<Option<Operation>>,
}

impl<N: Notifier> SettingsPanel<N> {
    pub fn new(service: SettingsService, notifier: N) -> Self {
        Self {
            service,
            notifier,
            form: Mutex::new(FormState::new()),
            pending: Mutex::new(None),
        }
    }

    /// Current form state. Keep the guard short: never across an await.
    pub fn form(&self) -> MutexGuard<'_, FormState> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> Option<Operation> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn select_provider(&self, key: &str) -> Transition {
        self.form().select_provider(key)
    }

    pub async fn init(&self) -> Result<()> {
        match self.service.load().await {
            Ok(config) => {
                self.form().populate(config);
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notification::Error(format!(
                    "Unable to load email configuration: {e}"
                )));
                Err(e)
            }
        }
    }

    pub async fn set_config(&self) -> Result<()> {
        let _guard = self.begin(Operation::Save)?;
        let payload = self.form().config_payload();

        match self.service.save(&payload).await {
            Ok(config) => {
                self.form().populate(config);
                self.notifier
                    .notify(Notification::Success("Configuration saved.".to_string()));
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::Error(format!("Unable to save configuration: {e}")));
                Err(e)
            }
        }
    }

    pub async fn test(&self) -> Result<()> {
        let (recipient, payload) = {
            let form = self.form();
            (form.recipient.trim().to_string(), form.test_payload())
        };
        if recipient.is_empty() {
            let e = SettingsError::Validation(
                "A recipient is required to send a test email".to_string(),
            );
            self.notifier.notify(Notification::Error(e.to_string()));
            return Err(e);
        }

        let _guard = self.begin(Operation::Test)?;
        self.notifier
            .notify(Notification::Loading("Sending test email...".to_string()));

        match self.service.send_test(&recipient, &payload).await {
            Ok(()) => {
                self.notifier.notify(Notification::Success(
                    "Email sent successfully. Check your mailbox.".to_string(),
                ));
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    SettingsError::Timeout(after) => format!(
                        "Test email timed out after {}s. Check the server address.",
                        after.as_secs()
                    ),
                    other => format!("Test email failed: {other}"),
                };
                self.notifier.notify(Notification::Error(message));
                Err(e)
            }
        }
    }

    fn begin(&self, operation: Operation) -> Result<PendingGuard<'_>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = *pending {
            log::debug!("{operation:?} refused while {running:?} is pending");
            drop(pending);
            self.notifier.notify(Notification::Error(
                "Please wait for the current request to finish.".to_string(),
            ));
            return Err(SettingsError::Busy);
        }
        *pending = Some(operation);
        Ok(PendingGuard {
            slot: &self.pending,
        })
    }
}
