use serde::{Deserialize, Serialize};
use std::fmt;

/// Input of one program run: stream tokens and entry-function arguments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    /// Tokens read through `$in`
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Positional arguments of the entry function
    #[serde(default)]
    pub args: Vec<String>,
}

impl Input {
    pub fn new(inputs: Vec<String>, args: Vec<String>) -> Self {
        Input { inputs, args }
    }

    /// Stream input only, split on whitespace
    pub fn from_stream(text: &str) -> Self {
        Input {
            inputs: text.split_whitespace().map(str::to_string).collect(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input{{inputs={:?}, args={:?}}}", self.inputs, self.args)
    }
}
