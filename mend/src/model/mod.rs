//! Intermediate representation shared by reference and submission programs
//!
//! A [`Program`] maps function names to [`Function`]s. Each function is a
//! control-flow graph whose blocks are lists of `(variable, expression)`
//! assignments, connected by optional true/false edges.

mod expr;
mod function;
mod input;
pub mod json;
pub mod names;

pub use expr::*;
pub use function::*;
pub use input::Input;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Contract violation on the program model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown location: {loc} in function `{function}`")]
    UnknownLocation { function: String, loc: Loc },

    #[error("unknown var: {var} at loc: {loc} in function `{function}`")]
    UnknownVariable {
        function: String,
        var: String,
        loc: Loc,
    },

    #[error("unknown function: {0}")]
    UnknownFunction(String),
}

/// Discriminator written next to the program's fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramTag {
    #[default]
    Program,
}

/// A whole program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Header lines of the source program, language dependent
    #[serde(rename = "importStatements", default)]
    import_statements: Vec<String>,
    #[serde(default)]
    fncs: BTreeMap<String, Function>,
    #[serde(default)]
    meta: BTreeMap<String, Function>,
    #[serde(default)]
    warns: BTreeMap<String, Function>,
    #[serde(default)]
    loops: BTreeMap<String, Function>,
    #[serde(default)]
    tokentype: ProgramTag,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, replacing any function of the same name
    pub fn add_function(&mut self, function: Function) {
        self.fncs.insert(function.name().to_string(), function);
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.fncs.get(name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.fncs.get_mut(name)
    }

    /// Like [`Program::function`], but a missing function is an error
    pub fn require_function(&self, name: &str) -> Result<&Function, ModelError> {
        self.function(name)
            .ok_or_else(|| ModelError::UnknownFunction(name.to_string()))
    }

    pub fn functions(&self) -> &BTreeMap<String, Function> {
        &self.fncs
    }

    pub fn meta(&self) -> &BTreeMap<String, Function> {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut BTreeMap<String, Function> {
        &mut self.meta
    }

    pub fn warns(&self) -> &BTreeMap<String, Function> {
        &self.warns
    }

    pub fn warns_mut(&mut self) -> &mut BTreeMap<String, Function> {
        &mut self.warns
    }

    pub fn loops(&self) -> &BTreeMap<String, Function> {
        &self.loops
    }

    pub fn loops_mut(&mut self) -> &mut BTreeMap<String, Function> {
        &mut self.loops
    }

    pub fn import_statements(&self) -> &[String] {
        &self.import_statements
    }

    pub fn set_import_statements(&mut self, lines: Vec<String>) {
        self.import_statements = lines;
    }

    /// Decode the persisted JSON form
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        json::from_str(text)
    }

    /// Encode to the persisted JSON form
    pub fn to_json(&self) -> serde_json::Result<String> {
        json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        json::to_string_pretty(self)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n\n")?;
        for function in self.fncs.values() {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
