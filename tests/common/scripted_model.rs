/*!
 * Scripted language model for workflow tests.
 *
 * Works out which role a call belongs to from the prompt shape and answers
 * through a caller-supplied script, counting calls per role.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docufluent::errors::ProviderError;
use docufluent::providers::{Generation, LanguageModel};

/// Which workflow task issued a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Translate,
    Evaluate,
    Optimize,
    Compare,
}

impl Role {
    pub fn of(prompt: &str, system_prompt: Option<&str>) -> Self {
        if prompt.contains("Model A Translation") {
            Role::Compare
        } else if prompt.contains("Evaluate") {
            Role::Evaluate
        } else if system_prompt.is_some_and(|system| system.contains("optimizer")) {
            Role::Optimize
        } else {
            Role::Translate
        }
    }
}

type Script = dyn Fn(Role, &str) -> Result<String, ProviderError> + Send + Sync;

/// Model whose answers come from a closure
#[derive(Clone)]
pub struct ScriptedModel {
    name: String,
    script: Arc<Script>,
    calls: Arc<Mutex<HashMap<Role, usize>>>,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel").field("name", &self.name).finish()
    }
}

impl ScriptedModel {
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(Role, &str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            script: Arc::new(script),
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Translator that prefixes the source, evaluator and optimizer with fixed answers
    pub fn standard(name: &str, score_a: u8, score_c: u8) -> Self {
        Self::new(name, move |role, prompt| {
            Ok(match role {
                Role::Translate => format!("ZH:{}", prompt),
                Role::Evaluate => evaluation_json(score_a, "更自然一些"),
                Role::Optimize => "优化译文".to_string(),
                Role::Compare => comparative_json(score_a, score_c),
            })
        })
    }

    pub fn calls(&self, role: Role) -> usize {
        self.calls.lock().get(&role).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<Generation, ProviderError> {
        let role = Role::of(prompt, system_prompt);
        *self.calls.lock().entry(role).or_insert(0) += 1;
        let text = (self.script)(role, prompt)?;
        Ok(Generation::new(text, 5, 5))
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Evaluator answer with every dimension at `score`
pub fn evaluation_json(score: u8, suggestions: &str) -> String {
    format!(
        r#"{{"accuracy": {s}, "fluency": {s}, "consistency": {s}, "terminology": {s}, "completeness": {s}, "suggestions": "{}"}}"#,
        suggestions,
        s = score
    )
}

/// Comparative answer scoring model A and model C uniformly
pub fn comparative_json(score_a: u8, score_c: u8) -> String {
    format!(
        r#"{{"model_a": {}, "model_c": {}}}"#,
        evaluation_json(score_a, ""),
        evaluation_json(score_c, "")
    )
}
