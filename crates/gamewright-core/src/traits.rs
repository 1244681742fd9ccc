use std::collections::BTreeMap;

use futures::future::BoxFuture;

use crate::error::Result;

/// One role-scoped unit of agent work.
///
/// `context` carries the committed outputs of the declared upstream steps,
/// in declaration order; `inputs` carries named task constants.
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    /// Role the agent plays, e.g. "Lead Game Designer".
    pub role: String,
    /// What this unit of work is supposed to produce.
    pub goal: String,
    /// Ordered upstream output texts.
    pub context: Vec<String>,
    /// Named task inputs.
    pub inputs: BTreeMap<String, String>,
}

impl AgentRequest {
    pub fn new(role: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            context: Vec::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn with_inputs(mut self, inputs: BTreeMap<String, String>) -> Self {
        self.inputs.extend(inputs);
        self
    }
}

/// Executes one role-scoped unit of work and returns raw text.
///
/// The pipeline treats implementations as black boxes: latency and output
/// format are unspecified. Stages that need structure parse the text
/// themselves and fail with a schema error when it does not comply.
pub trait AgentExecutor: Send + Sync + 'static {
    fn execute(&self, request: AgentRequest) -> BoxFuture<'_, Result<String>>;
}
