//! Template descriptor (`starli.json`) parsing.

use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// The descriptor file name within a template directory.
pub const DESCRIPTOR_FILE_NAME: &str = "starli.json";

/// One template's static files and interactive questions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    /// Display name of the template.
    pub name: String,
    /// Files written verbatim (after substitution) into the project.
    #[serde(default)]
    pub static_files: Vec<StaticFile>,
    /// Questions asked before generation, in order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A file declared inline in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticFile {
    /// Logical name, used in messages.
    pub name: String,
    /// Destination path relative to the project root.
    pub path: String,
    /// File contents.
    #[serde(default)]
    pub content: String,
}

/// A prompt whose answer is available to substitutions under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    /// Answer key.
    pub name: String,
    /// Prompt text.
    pub message: String,
    /// Default answer.
    #[serde(default)]
    pub default: String,
}

impl TemplateDescriptor {
    /// Answers made entirely of question defaults.
    pub fn default_answers(&self) -> BTreeMap<String, String> {
        self.questions
            .iter()
            .map(|question| (question.name.clone(), question.default.clone()))
            .collect()
    }
}

/// Parse descriptor contents read from `path`.
pub fn parse_descriptor(path: &Path, contents: &str) -> Result<TemplateDescriptor> {
    serde_json::from_str(contents).map_err(|error| Error::MalformedDescriptor {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}
