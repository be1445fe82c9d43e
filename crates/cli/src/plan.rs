use std::{fmt::Write as _, sync::Arc, time::Duration};

use async_trait::async_trait;
use harmony_core::{
    Completion, ContextTask, Orchestrator, Outcome, SharedContextTask, SharedTask, Task,
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{PlanConfig, StepConfig};

pub type Context = Map<String, Value>;
pub type PlanOrchestrator = Orchestrator<Value, Context, Value, StepError>;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("step `{step}` sets more than one of output, from_ingress, from_context")]
    ConflictingSources { step: String },

    #[error("context step `{step}` cannot read from the context it is building")]
    ContextFromContext { step: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("step `{step}` failed: {message}")]
    Scripted { step: String, message: String },

    #[error("step `{step}`: key `{key}` not found in {source_name}")]
    MissingKey {
        step: String,
        key: String,
        source_name: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepSource {
    Literal(Value),
    Ingress(String),
    Context(String),
}

/// A plan step that waits, then fails or produces its configured value.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedStep {
    pub name: String,
    pub delay: Duration,
    pub source: StepSource,
    pub fail: Option<String>,
}

impl ScriptedStep {
    fn from_config(config: StepConfig) -> Result<Self, PlanError> {
        let StepConfig {
            name,
            delay_ms,
            output,
            from_ingress,
            from_context,
            fail,
        } = config;

        let source = match (output, from_ingress, from_context) {
            (None, None, None) => StepSource::Literal(Value::Null),
            (Some(value), None, None) => StepSource::Literal(value),
            (None, Some(key), None) => StepSource::Ingress(key),
            (None, None, Some(key)) => StepSource::Context(key),
            _ => return Err(PlanError::ConflictingSources { step: name }),
        };

        Ok(Self {
            name,
            delay: Duration::from_millis(delay_ms),
            source,
            fail,
        })
    }

    async fn perform(&self, ingress: &Value, context: &Context) -> Result<Value, StepError> {
        debug!(step = %self.name, delay_ms = self.delay.as_millis() as u64, "step started");
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if let Some(message) = &self.fail {
            return Err(StepError::Scripted {
                step: self.name.clone(),
                message: message.clone(),
            });
        }

        match &self.source {
            StepSource::Literal(value) => Ok(value.clone()),
            StepSource::Ingress(key) => ingress
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| self.missing(key, "ingress")),
            StepSource::Context(key) => context
                .get(key)
                .cloned()
                .ok_or_else(|| self.missing(key, "context")),
        }
    }

    fn missing(&self, key: &str, source_name: &'static str) -> StepError {
        StepError::MissingKey {
            step: self.name.clone(),
            key: key.to_string(),
            source_name,
        }
    }
}

#[async_trait]
impl ContextTask<Value, Context, StepError> for ScriptedStep {
    async fn run(&self, ingress: Arc<Value>) -> Result<Context, StepError> {
        let empty = Context::new();
        match self.perform(&ingress, &empty).await? {
            Value::Object(partial) => Ok(partial),
            other => Ok(Context::from_iter([(self.name.clone(), other)])),
        }
    }
}

#[async_trait]
impl Task<Value, Context, Value, StepError> for ScriptedStep {
    async fn run(&self, ingress: Arc<Value>, context: Arc<Context>) -> Result<Value, StepError> {
        self.perform(&ingress, &context).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub ingress: Value,
    pub context: Vec<ScriptedStep>,
    pub serial: Vec<ScriptedStep>,
    pub parallel: Vec<ScriptedStep>,
}

impl Plan {
    pub fn from_config(config: PlanConfig) -> Result<Self, PlanError> {
        let context = steps(config.context)?;
        if let Some(step) = context
            .iter()
            .find(|step| matches!(step.source, StepSource::Context(_)))
        {
            return Err(PlanError::ContextFromContext {
                step: step.name.clone(),
            });
        }

        Ok(Self {
            ingress: config.ingress,
            context,
            serial: steps(config.serial)?,
            parallel: steps(config.parallel)?,
        })
    }

    pub fn orchestrator(&self) -> PlanOrchestrator {
        let context = self
            .context
            .iter()
            .cloned()
            .map(|step| Arc::new(step) as SharedContextTask<Value, Context, StepError>);
        let serial = self.serial.iter().cloned().map(shared);
        let parallel = self.parallel.iter().cloned().map(shared);

        Orchestrator::new(self.ingress.clone())
            .context_all(context)
            .serial_all(serial)
            .parallel_all(parallel)
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (label, steps) in [
            ("context", &self.context),
            ("serial", &self.serial),
            ("parallel", &self.parallel),
        ] {
            let names: Vec<&str> = steps.iter().map(|step| step.name.as_str()).collect();
            let _ = writeln!(out, "{label}: {} step(s) [{}]", steps.len(), names.join(", "));
        }
        out
    }
}

fn steps(configs: Vec<StepConfig>) -> Result<Vec<ScriptedStep>, PlanError> {
    configs.into_iter().map(ScriptedStep::from_config).collect()
}

fn shared(step: ScriptedStep) -> SharedTask<Value, Context, Value, StepError> {
    Arc::new(step)
}

pub async fn run_plan(plan: &Plan) -> Outcome<Value, StepError> {
    info!(
        context = plan.context.len(),
        serial = plan.serial.len(),
        parallel = plan.parallel.len(),
        "running plan"
    );
    plan.orchestrator().finish().await
}

pub fn completion_json(completion: Completion<Value>) -> Value {
    let (parallel, serial) = completion.into_parts();
    json!({ "parallel": parallel, "serial": serial })
}
