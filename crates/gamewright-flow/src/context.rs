use std::collections::BTreeMap;

use gamewright_core::types::RunId;

/// Immutable input bundle assembled per step.
///
/// Holds the run-level constant inputs plus the committed outputs of the
/// step's declared upstreams only — never outputs of unrelated steps.
#[derive(Debug, Clone)]
pub struct StepContext {
    run_id: RunId,
    inputs: BTreeMap<String, String>,
    upstream: Vec<(String, String)>,
}

impl StepContext {
    pub(crate) fn new(
        run_id: RunId,
        inputs: BTreeMap<String, String>,
        upstream: Vec<(String, String)>,
    ) -> Self {
        Self {
            run_id,
            inputs,
            upstream,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// A run-level constant input by name.
    pub fn input(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    pub fn inputs(&self) -> &BTreeMap<String, String> {
        &self.inputs
    }

    /// Upstream `(step name, output)` pairs in declaration order.
    pub fn upstream(&self) -> &[(String, String)] {
        &self.upstream
    }

    /// A specific upstream's committed output.
    pub fn upstream_output(&self, name: &str) -> Option<&str> {
        self.upstream
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, out)| out.as_str())
    }

    /// Just the upstream output texts, in declaration order — the shape the
    /// agent executor consumes.
    pub fn context_texts(&self) -> Vec<String> {
        self.upstream.iter().map(|(_, out)| out.clone()).collect()
    }
}
