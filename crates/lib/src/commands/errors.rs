//! Command error types.

use thiserror::Error;

/// Errors raised by the administrative command layer itself.
///
/// Failures of the repository or the provider keep their own error types;
/// these variants only cover what the operator typed.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Wrong number of arguments, or an argument that does not parse.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input
        reason: String,
    },

    /// No command is registered under this name.
    #[error("unknown command '{name}'")]
    UnknownCommand {
        /// The name that was looked up
        name: String,
    },
}

impl CommandError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Check if this error is caused by operator input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CommandError::InvalidArgument { .. })
    }

    /// Check if the command name was not recognized.
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, CommandError::UnknownCommand { .. })
    }
}

impl From<CommandError> for crate::Error {
    fn from(err: CommandError) -> Self {
        crate::Error::Command(err)
    }
}
