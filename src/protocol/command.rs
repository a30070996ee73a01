//! Command definitions
//!
//! Represents requests sent to cgminer.

/// A named cgminer request with optional parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name as cgminer knows it (e.g. `summary`, `pools`)
    name: String,

    /// Ordered parameters, joined with `,` on the wire
    params: Vec<String>,

    /// Key of the JSON section holding the result, `None` for status-only commands
    result_key: Option<String>,
}

impl Command {
    /// Create a command whose result is stored under the upper-cased name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let result_key = Some(name.to_uppercase());
        Self {
            name,
            params: Vec::new(),
            result_key,
        }
    }

    /// Append one parameter
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Append several parameters in order
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    /// Override the result section key
    pub fn with_result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    /// Mark the command as returning only a status
    pub fn without_result(mut self) -> Self {
        self.result_key = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn result_key(&self) -> Option<&str> {
        self.result_key.as_deref()
    }

    /// Parameters joined by `,`, or `None` when there are none
    pub fn joined_params(&self) -> Option<String> {
        if self.params.is_empty() {
            None
        } else {
            Some(self.params.join(","))
        }
    }
}
