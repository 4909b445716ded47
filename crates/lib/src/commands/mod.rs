//! Administrative commands over the user directory.
//!
//! Commands are plain data: a name, usage text, a required argument count and
//! a handler function. A [`CommandRegistry`] binds the fixed command table to a
//! [`DaoProvider`] so each invocation waits for the repository before running.
//!
//! ```
//! # use std::sync::Arc;
//! # use userdao::{DaoProvider, backend::database::InMemory, user::UserRecord};
//! # use userdao::commands::{RecordingReporter, ReportLevel};
//! # #[tokio::main]
//! # async fn main() -> userdao::Result<()> {
//! let directory = InMemory::new();
//! directory.insert(UserRecord::new("alice"))?;
//! let provider = DaoProvider::with_repository(Arc::new(directory));
//!
//! let sink = RecordingReporter::new();
//! let args = vec!["alice".to_string(), "3".to_string(), "true".to_string()];
//! provider.commands().dispatch("setpermission", &args, &sink).await?;
//! assert_eq!(sink.messages(ReportLevel::Info), vec!["Permission 3 of alice set to true"]);
//! # Ok(())
//! # }
//! ```

mod admin;
pub mod args;
mod errors;
mod reporter;

use std::collections::BTreeMap;
use std::fmt;

use futures::future::BoxFuture;
use tracing::{debug, warn};

pub use admin::COMMANDS;
pub use errors::CommandError;
pub use reporter::{RecordingReporter, ReportLevel, Reporter, TracingReporter};

use crate::Result;
use crate::backend::UserRepository;
use crate::provider::DaoProvider;

/// Signature of a command body.
pub type Handler = for<'a> fn(
    &'a dyn UserRepository,
    &'a [String],
    &'a dyn Reporter,
) -> BoxFuture<'a, Result<()>>;

/// A named administrative command.
#[derive(Clone, Copy)]
pub struct Command {
    /// Name the operator types
    pub name: &'static str,
    /// Argument synopsis shown in help output
    pub usage: &'static str,
    /// One-line description shown in help output
    pub description: &'static str,
    /// Minimum number of arguments
    pub required_args: usize,
    /// Body run once arguments are counted and the repository is ready
    pub handler: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("required_args", &self.required_args)
            .finish_non_exhaustive()
    }
}

/// The command table bound to one provider.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    provider: DaoProvider,
    commands: BTreeMap<&'static str, Command>,
}

impl CommandRegistry {
    pub(crate) fn new(provider: DaoProvider) -> Self {
        let commands = COMMANDS.iter().map(|c| (c.name, *c)).collect();
        Self { provider, commands }
    }

    /// Look up a command by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<BoundCommand<'_>> {
        self.commands
            .get(name.to_ascii_lowercase().as_str())
            .map(|command| BoundCommand {
                command,
                provider: &self.provider,
            })
    }

    /// Command names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Commands in lexical order of their names.
    pub fn iter(&self) -> impl Iterator<Item = BoundCommand<'_>> {
        self.commands.values().map(|command| BoundCommand {
            command,
            provider: &self.provider,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a command by name.
    ///
    /// Any failure, including an unknown name, is reported to `sink` exactly
    /// once as `<command>: <cause>` and then returned.
    pub async fn dispatch(&self, name: &str, args: &[String], sink: &dyn Reporter) -> Result<()> {
        let result = match self.get(name) {
            Some(command) => command.invoke(args, sink).await,
            None => Err(CommandError::UnknownCommand {
                name: name.to_string(),
            }
            .into()),
        };

        if let Err(err) = &result {
            warn!(command = name, error = %err, "Command failed");
            sink.error(&format!("{name}: {err}"));
        }
        result
    }

    /// Help text: one `name usage - description` line per command.
    pub fn usage(&self) -> String {
        self.iter()
            .map(|c| {
                let synopsis = if c.usage().is_empty() {
                    c.name().to_string()
                } else {
                    format!("{} {}", c.name(), c.usage())
                };
                format!("{synopsis} - {}", c.description())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A command together with the provider it runs against.
#[derive(Debug, Clone, Copy)]
pub struct BoundCommand<'a> {
    command: &'a Command,
    provider: &'a DaoProvider,
}

impl BoundCommand<'_> {
    pub fn name(&self) -> &'static str {
        self.command.name
    }

    pub fn usage(&self) -> &'static str {
        self.command.usage
    }

    pub fn description(&self) -> &'static str {
        self.command.description
    }

    pub fn required_args(&self) -> usize {
        self.command.required_args
    }

    /// Run the command.
    ///
    /// The argument count is checked before anything else; only then does the
    /// command wait for the repository.
    pub async fn invoke(&self, args: &[String], sink: &dyn Reporter) -> Result<()> {
        args::require(self.command, args)?;
        let repository = self.provider.repository().await?;
        debug!(
            command = self.command.name,
            backend = repository.backend_name(),
            "Running command"
        );
        (self.command.handler)(repository.as_ref(), args, sink).await
    }
}
