pub mod posts;
pub mod titles;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use crate::blogai::AgentError;
use crate::registry::Registry;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("{step}: missing pipeline data `{key}`")]
    MissingData { step: &'static str, key: &'static str },

    #[error("{step}: invalid pipeline data `{key}`: {source}")]
    InvalidData {
        step: &'static str,
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Agent(#[from] AgentError),

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What every step can reach: the shared services.
#[derive(Clone)]
pub struct PipelineContext {
    pub registry: Registry,
}

impl PipelineContext {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

/// Key/value bag threaded through the steps of one run.
#[derive(Debug, Default, Clone)]
pub struct PipelineData {
    values: HashMap<String, Value>,
}

impl PipelineData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Serialize) {
        // Values are plain strings, lists and posts; serializing them cannot fail.
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.values.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get<T: DeserializeOwned>(&self, step: &'static str, key: &'static str) -> Result<T, PipelineError> {
        let value = self
            .values
            .get(key)
            .cloned()
            .ok_or(PipelineError::MissingData { step, key })?;
        serde_json::from_value(value).map_err(|source| PipelineError::InvalidData { step, key, source })
    }
}

#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &PipelineContext, data: &mut PipelineData) -> Result<(), PipelineError>;
}

/// Runs its steps strictly in order; the first error aborts the run.
/// Nothing already written by earlier steps is rolled back.
pub struct Pipeline {
    name: &'static str,
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self { name, steps: Vec::new() }
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub async fn run(&self, ctx: &PipelineContext, mut data: PipelineData) -> Result<PipelineData, PipelineError> {
        let span = tracing::info_span!("pipeline", pipeline = %self.name);
        let start = std::time::Instant::now();

        for step in &self.steps {
            let step_span = tracing::info_span!(parent: &span, "step", step = %step.name());
            if let Err(e) = step.run(ctx, &mut data).instrument(step_span).await {
                tracing::error!(
                    parent: &span,
                    step = %step.name(),
                    elapsed = format_args!("{:.1}s", start.elapsed().as_secs_f64()),
                    error = %e,
                    "✗ Failed"
                );
                return Err(e);
            }
        }

        tracing::info!(
            parent: &span,
            steps = self.steps.len(),
            elapsed = format_args!("{:.1}s", start.elapsed().as_secs_f64()),
            "✓ Completed"
        );
        Ok(data)
    }
}
