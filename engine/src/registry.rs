use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use calcdoc::TokenSet;
use serde::Deserialize;

use crate::error::OperationResult;
use crate::operations;

/// When an operator line fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timing {
    /// As soon as the line reads exactly the token.
    Immediate,
    /// Only when the edit that produced the line submits it with a newline.
    OnSubmit,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timing::Immediate => f.write_str("immediate"),
            Timing::OnSubmit => f.write_str("on-submit"),
        }
    }
}

pub type Evaluate = Arc<dyn Fn(&[f64]) -> OperationResult + Send + Sync>;

/// A registered operator token.
#[derive(Clone)]
pub struct Operation {
    pub token: String,
    pub evaluate: Evaluate,
    pub timing: Timing,
}

impl Operation {
    pub fn apply(&self, stack: &[f64]) -> OperationResult {
        (self.evaluate)(stack)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("token", &self.token)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

/// Token → operation table. Lookups are exact: no trimming, no case folding.
#[derive(Debug, Clone)]
pub struct Registry {
    operations: HashMap<String, Operation>,
}

impl Registry {
    /// A registry holding the default operator set.
    pub fn new() -> Self {
        let mut registry = Registry::empty();
        registry.register_defaults();
        registry
    }

    pub fn empty() -> Self {
        Registry {
            operations: HashMap::new(),
        }
    }

    /// Insert or overwrite the operation for `token`.
    pub fn register<F>(&mut self, token: impl Into<String>, evaluate: F, timing: Timing)
    where
        F: Fn(&[f64]) -> OperationResult + Send + Sync + 'static,
    {
        let token = token.into();
        self.operations.insert(
            token.clone(),
            Operation {
                token,
                evaluate: Arc::new(evaluate),
                timing,
            },
        );
    }

    pub fn find_operation(&self, token: &str) -> Option<&Operation> {
        self.operations.get(token)
    }

    pub fn execute(&self, operation: &Operation, stack: &[f64]) -> OperationResult {
        operation.apply(stack)
    }

    /// Change the timing of an already registered token. Returns false if the
    /// token is unknown.
    pub fn set_timing(&mut self, token: &str, timing: Timing) -> bool {
        match self.operations.get_mut(token) {
            Some(operation) => {
                operation.timing = timing;
                true
            }
            None => false,
        }
    }

    /// All registered tokens, sorted.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    fn register_defaults(&mut self) {
        // Immediate
        self.register("+", operations::add, Timing::Immediate);
        self.register("-", operations::subtract, Timing::Immediate);
        self.register("*", operations::multiply, Timing::Immediate);
        self.register("/", operations::divide, Timing::Immediate);

        // On Enter
        self.register("mod", operations::modulo, Timing::OnSubmit);
        self.register("swap", operations::swap, Timing::OnSubmit);
        self.register("1/x", operations::reciprocal, Timing::OnSubmit);
        self.register("sqrt", operations::sqrt, Timing::OnSubmit);
        self.register("sin", operations::sin, Timing::OnSubmit);
        self.register("cos", operations::cos, Timing::OnSubmit);
        self.register("tan", operations::tan, Timing::OnSubmit);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl TokenSet for Registry {
    fn is_operator(&self, token: &str) -> bool {
        self.operations.contains_key(token)
    }
}
