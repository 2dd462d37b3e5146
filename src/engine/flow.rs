//! Flow execution
//!
//! A [`Flow`] runs its steps strictly in order against one record and one
//! transport. For each step the executor:
//!
//! 1. builds the outbound payload through the step's reader, if any
//! 2. resolves the endpoint
//! 3. calls the transport and awaits the response
//! 4. on failure, lets the step's error handler absorb the error or aborts
//! 5. on success, applies a non-empty body through the step's writer
//!
//! The next step starts only after the previous step's write completed, so a
//! trailing read always sees the identity assigned by the step before it.
//!
//! There is no retry and no rollback: when a create succeeds and the read-back
//! fails, the remote resource exists while the flow reports failure.

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::diagnostics::Diagnostics;
use super::error::{FlowError, SchemaError};
use super::record::Record;
use super::step::{OperationKind, OperationStep};
use super::transport::Transport;

/// Execution state of a flow. States are never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Pending,
    Running(usize),
    Done(usize),
    Succeeded,
    Failed(usize),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Ordered steps implementing one CRUD lifecycle event.
#[derive(Debug, Clone)]
pub struct Flow {
    resource: String,
    operation: OperationKind,
    steps: Vec<OperationStep>,
}

/// Result of one flow invocation.
#[derive(Debug)]
pub struct FlowOutcome {
    pub state: FlowState,
    pub error: Option<FlowError>,
}

impl Flow {
    pub fn new(
        resource: impl Into<String>,
        operation: OperationKind,
        steps: Vec<OperationStep>,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation,
            steps,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn steps(&self) -> &[OperationStep] {
        &self.steps
    }

    /// Run the flow and report diagnostics; empty means success.
    pub async fn execute(&self, record: &mut dyn Record, transport: &dyn Transport) -> Diagnostics {
        let outcome = self.run(record, transport).await;
        match outcome.error {
            Some(error) => Diagnostics::from_error(self.operation, &error),
            None => Diagnostics::new(),
        }
    }

    /// Run the flow and return its terminal state and error.
    pub async fn run(&self, record: &mut dyn Record, transport: &dyn Transport) -> FlowOutcome {
        let span = tracing::info_span!(
            "flow",
            resource = %self.resource,
            operation = %self.operation,
            run = %Uuid::new_v4(),
        );

        async move {
            let mut state = FlowState::Pending;
            tracing::debug!(steps = self.steps.len(), ?state, "Starting flow");

            for (index, step) in self.steps.iter().enumerate() {
                state = FlowState::Running(index);
                tracing::trace!(?state, step = %step.name(), "Step running");

                if let Err(error) = self.run_step(step, record, transport).await {
                    state = FlowState::Failed(index);
                    tracing::error!(?state, step = %step.name(), "Flow failed: {}", error);
                    return FlowOutcome {
                        state,
                        error: Some(error),
                    };
                }

                state = FlowState::Done(index);
                tracing::trace!(?state, step = %step.name(), "Step done");
            }

            state = FlowState::Succeeded;
            tracing::info!(id = %record.id(), "Flow succeeded");
            FlowOutcome { state, error: None }
        }
        .instrument(span)
        .await
    }

    async fn run_step(
        &self,
        step: &OperationStep,
        record: &mut dyn Record,
        transport: &dyn Transport,
    ) -> Result<(), FlowError> {
        let payload = match step.reader() {
            Some(factory) => {
                let reader = factory();
                let payload = reader.read(&*record).map_err(|source| FlowError::Marshal {
                    resource: self.resource.clone(),
                    operation: step.kind(),
                    source,
                })?;
                Some(payload)
            }
            None => None,
        };

        let url = step
            .url()
            .resolve(&*record, transport.context())
            .map_err(|source| FlowError::Url {
                resource: self.resource.clone(),
                operation: step.kind(),
                source,
            })?;

        tracing::debug!(
            method = %step.method(),
            url = %url,
            has_payload = payload.is_some(),
            "Executing {}",
            step.name()
        );

        let body = match transport.execute(step.method(), &url, payload.as_ref()).await {
            Ok(body) => body,
            Err(error) => {
                return step
                    .error_handler()
                    .handle(error, step.kind(), record)
                    .map_err(|source| FlowError::Request {
                        resource: self.resource.clone(),
                        operation: step.kind(),
                        source,
                    });
            }
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let Some(writer) = step.writer().instantiate() else {
            return Ok(());
        };

        let unmarshal = |source: SchemaError| FlowError::Unmarshal {
            resource: self.resource.clone(),
            operation: step.kind(),
            source,
        };

        let value: Value = serde_json::from_slice(&body).map_err(|e| unmarshal(e.into()))?;
        writer.write(&value, record).map_err(unmarshal)
    }
}
