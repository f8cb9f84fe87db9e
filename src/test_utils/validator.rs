use std::sync::Mutex;

use crate::core::RenderdError;
use crate::validator::{MarkupValidator, SafetyValidator};

/// Wraps [`SafetyValidator`] and records every document it is given.
#[derive(Debug, Default)]
pub struct RecordingValidator {
    inner: SafetyValidator,
    inputs: Mutex<Vec<String>>,
}

impl RecordingValidator {
    /// Create a recorder with no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents passed to [`MarkupValidator::validate`], in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|inputs| inputs.clone()).unwrap_or_default()
    }
}

impl MarkupValidator for RecordingValidator {
    fn validate(&self, raw: &str) -> Result<String, RenderdError> {
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(raw.to_string());
        }
        self.inner.validate(raw)
    }
}
