//! Tool invocation: lookup, validation, execution and error categorization.

use crate::config::Settings;
use crate::error::{ErrorKind, YtError};
use crate::media::{MediaRequest, MediaService};
use crate::registry::Registry;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of one tool invocation. Never carries a raw error.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success {
        payload: String,
        metadata: Map<String, Value>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl InvocationOutcome {
    fn failure(name: &str, err: &YtError) -> Self {
        let kind = err.kind();
        let message = match kind {
            ErrorKind::UnknownOperation | ErrorKind::InvalidParameters => err.to_string(),
            ErrorKind::OperationFailed | ErrorKind::InternalError => {
                format!("Error executing tool {}: {}", name, err)
            }
        };
        Self::Failure { kind, message }
    }
}

/// Routes named tool calls to the media service.
pub struct Dispatcher {
    registry: Arc<Registry>,
    service: MediaService,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, service: MediaService) -> Self {
        Self { registry, service }
    }

    /// Dispatcher over the production backends, advertising the configured
    /// output directory as the `outputPath` default.
    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let output_dir = settings.output_dir().display().to_string();
        Ok(Self::new(
            Arc::new(Registry::new(&output_dir)),
            MediaService::from_settings(settings)?,
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Invoke tool `name` with raw JSON arguments.
    ///
    /// Arguments are validated against the tool's schema before any backend
    /// is touched.
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(&self, name: &str, arguments: Option<&Value>) -> InvocationOutcome {
        match self.run(name, arguments).await {
            Ok((payload, mut metadata)) => {
                metadata.insert("tool".to_string(), Value::String(name.to_string()));
                metadata.insert(
                    "timestamp".to_string(),
                    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
                info!("Tool {} succeeded", name);
                InvocationOutcome::Success { payload, metadata }
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                InvocationOutcome::failure(name, &e)
            }
        }
    }

    async fn run(
        &self,
        name: &str,
        arguments: Option<&Value>,
    ) -> crate::error::Result<(String, Map<String, Value>)> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| YtError::UnknownOperation(name.to_string()))?;

        let params = descriptor.parameter_schema.validate(arguments)?;
        let request = MediaRequest::from_validated(name, params)?;
        let output = self.service.execute(request).await?;

        Ok((output.payload, output.metadata))
    }
}
