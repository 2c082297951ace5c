//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use llm_fallback_router::{
    ModelEntry, ModelRequest, ProviderError, ProviderErrorKind, ProviderInvoker, RouterMapping,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

/// Invoker that replays per-model scripts and records every call.
///
/// When a model's script runs out, its default response is used (if set),
/// otherwise the call fails with an `unknown` error.
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, ProviderError>>>>,
    defaults: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, model: &str, results: Vec<Result<String, ProviderError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), results.into());
        self
    }

    /// Always answer `text` once the model's script is empty.
    pub fn always(self, model: &str, text: &str) -> Self {
        self.defaults
            .lock()
            .unwrap()
            .insert(model.to_string(), text.to_string());
        self
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _)| m == model).count()
    }

    pub fn call_times(&self, model: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, t)| *t)
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderInvoker for ScriptedInvoker {
    async fn call(&self, entry: &ModelEntry, _request: &ModelRequest) -> Result<String, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((entry.name.clone(), Instant::now()));

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&entry.name)
            .and_then(VecDeque::pop_front);
        if let Some(result) = scripted {
            return result;
        }
        match self.defaults.lock().unwrap().get(&entry.name) {
            Some(text) => Ok(text.clone()),
            None => Err(ProviderError::new(ProviderErrorKind::Unknown, "no scripted response")),
        }
    }
}

pub fn fail(kind: ProviderErrorKind) -> Result<String, ProviderError> {
    Err(ProviderError::new(kind, format!("{} (scripted)", kind)))
}

pub fn ok(text: &str) -> Result<String, ProviderError> {
    Ok(text.to_string())
}

/// Two models: `a` (direct, 60 rpm) falling back to `b` (gateway, 30 rpm).
pub const TWO_MODEL_YAML: &str = r#"
model_list:
  - model_name: a
    provider_kind: direct
    params:
      model: model-a
      credential_ref: A_API_KEY
      rpm: 60
  - model_name: b
    provider_kind: gateway
    params:
      model: model-b
      region: us-east-1
      rpm: 30
fallbacks:
  - a: [b]
"#;

/// Three models chained `a -> b -> c`; `b` also has its own rule `b -> c`.
pub const THREE_MODEL_YAML: &str = r#"
model_list:
  - model_name: a
    provider_kind: direct
    params: { model: model-a }
  - model_name: b
    provider_kind: gateway
    params: { model: model-b, region: us-west-2 }
  - model_name: c
    provider_kind: unified
    params: { model: model-c, api_base: "http://localhost:4000/v1" }
fallbacks:
  - a: [b, c]
  - b: [c]
"#;

pub fn two_model_mapping() -> RouterMapping {
    RouterMapping::from_yaml_str(TWO_MODEL_YAML).unwrap()
}

pub fn three_model_mapping() -> RouterMapping {
    RouterMapping::from_yaml_str(THREE_MODEL_YAML).unwrap()
}
