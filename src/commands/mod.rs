//! CLI command implementations.

use std::{
    env,
    io::{self, IsTerminal},
};

use inquire::error::InquireError;

use crate::error::Error;

/// Output color handling selection.
#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    /// Colorize only when output is a TTY.
    Auto,
    /// Always colorize output.
    Always,
    /// Never colorize output.
    Never,
}

impl ColorChoice {
    /// Determine whether color output should be enabled.
    pub(crate) fn enabled(self) -> bool {
        match self {
            Self::Auto => io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Map an inquire failure onto the crate error.
pub(crate) fn prompt_error(error: InquireError) -> Error {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            Error::PromptCanceled
        }
        error => Error::PromptFailed {
            message: error.to_string(),
        },
    }
}

// Command modules are ordered alphabetically - maintain this order.
/// Clear-cache command implementation.
pub mod clear_cache;
/// Generate command implementation.
pub mod generate;
/// List command implementation.
pub mod list;
/// Update command implementation.
pub mod update;
