//! Schema synthesizer port
//!
//! Black-box transform from declaration text to validation-schema text.

/// Output of one synthesis run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Schema document, absent when synthesis failed
    pub schema_text: Option<String>,
    /// Human-readable problems found in the input
    pub errors: Vec<String>,
}

impl Synthesis {
    pub fn success(schema_text: impl Into<String>) -> Self {
        Self {
            schema_text: Some(schema_text.into()),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            schema_text: None,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.schema_text.is_some()
    }
}

/// Converts type declarations into a validation schema
pub trait SchemaSynthesizer: Send + Sync {
    fn synthesize(&self, source: &str) -> Synthesis;
}
