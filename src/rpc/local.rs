use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::Value;

use super::{CommandClient, CommandRequest};
use crate::commands::CommandRouter;
use crate::error::{Result, SettingsError};

/// Dispatches commands to modules living in the same process.
#[derive(Clone)]
pub struct LocalCommandClient {
    router: Arc<CommandRouter>,
    default_timeout: Duration,
}

impl LocalCommandClient {
    pub fn new(router: Arc<CommandRouter>, default_timeout: Duration) -> Self {
        Self {
            router,
            default_timeout,
        }
    }

    async fn dispatch(&self, request: CommandRequest) -> Result<Value> {
        let timeout = request.timeout_or(self.default_timeout);
        let response = tokio::time::timeout(timeout, self.router.dispatch(request))
            .await
            .map_err(|_| SettingsError::Timeout(timeout))?;
        response.into_result()
    }
}

impl CommandClient for LocalCommandClient {
    fn send_command(&self, request: CommandRequest) -> BoxFuture<'_, Result<Value>> {
        Box::pin(self.dispatch(request))
    }
}
