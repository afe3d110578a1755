//! Command table built once at start-up.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use herald_watch::ChannelId;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::stats::Statistics;

/// Invocation details handed to a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Channel the command was issued from.
    pub channel_id: ChannelId,
    /// Whitespace-separated arguments after the command name.
    pub args: Vec<String>,
}

impl CommandContext {
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Handler invoked for a command; `Some` text is the reply.
pub type CommandHandler =
    Arc<dyn Fn(&CommandContext) -> anyhow::Result<Option<String>> + Send + Sync>;

/// Errors raised while building or dispatching commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("command name or alias registered twice: {0}")]
    Duplicate(String),

    #[error("command '{command}' failed: {source}")]
    Failed {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

/// One registered command.
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    description: String,
    aliases: Vec<String>,
    handler: CommandHandler,
}

impl CommandSpec {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandContext) -> anyhow::Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            name: name.into().to_lowercase(),
            description: description.into(),
            aliases: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Adds an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandRegistry`].
#[derive(Debug, Default)]
pub struct CommandRegistryBuilder {
    prefix: Option<String>,
    specs: Vec<CommandSpec>,
    stats: Option<Arc<Statistics>>,
}

impl CommandRegistryBuilder {
    /// Sets the prefix that marks a line as a command. Defaults to `!`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Counts every dispatched call in `stats`.
    pub fn statistics(mut self, stats: Arc<Statistics>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn commands(mut self, specs: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Builds the registry, rejecting clashing names and aliases.
    pub fn build(self) -> Result<CommandRegistry, CommandError> {
        let mut commands = IndexMap::with_capacity(self.specs.len());
        let mut lookup = HashMap::new();

        for spec in self.specs {
            for key in std::iter::once(&spec.name).chain(&spec.aliases) {
                if lookup.insert(key.clone(), spec.name.clone()).is_some() {
                    return Err(CommandError::Duplicate(key.clone()));
                }
            }
            commands.insert(spec.name.clone(), spec);
        }

        info!(commands = commands.len(), "Command registry built");
        Ok(CommandRegistry {
            prefix: self.prefix.unwrap_or_else(|| "!".to_string()),
            commands,
            lookup,
            stats: self.stats,
        })
    }
}

/// Immutable table of commands, keyed by name and alias.
pub struct CommandRegistry {
    prefix: String,
    commands: IndexMap<String, CommandSpec>,
    lookup: HashMap<String, String>,
    stats: Option<Arc<Statistics>>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Splits a prefixed line into a lowercase command name and arguments.
    ///
    /// Returns `None` for lines that are not commands.
    pub fn parse(&self, line: &str) -> Option<(String, Vec<String>)> {
        let body = line.trim().strip_prefix(self.prefix.as_str())?;
        let mut words = body.split_whitespace();
        let name = words.next()?.to_lowercase();
        Some((name, words.map(str::to_string).collect()))
    }

    /// Runs the command registered under `name` or one of its aliases.
    pub fn dispatch(
        &self,
        name: &str,
        ctx: &CommandContext,
    ) -> Result<Option<String>, CommandError> {
        let key = name.to_lowercase();
        let spec = self
            .lookup
            .get(&key)
            .and_then(|canonical| self.commands.get(canonical))
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;

        if let Some(stats) = &self.stats {
            stats.record_command(&spec.name);
        }
        debug!(command = %spec.name, channel_id = ctx.channel_id, "Dispatching command");

        (spec.handler)(ctx).map_err(|source| CommandError::Failed {
            command: spec.name.clone(),
            source,
        })
    }

    /// Parses `line` and dispatches it. Non-command lines yield `Ok(None)`.
    pub fn handle_line(
        &self,
        channel_id: ChannelId,
        line: &str,
    ) -> Result<Option<String>, CommandError> {
        match self.parse(line) {
            Some((name, args)) => {
                self.dispatch(&name, &CommandContext::new(channel_id).with_args(args))
            },
            None => Ok(None),
        }
    }

    /// Lists commands in registration order.
    pub fn help(&self) -> String {
        self.commands
            .values()
            .map(|spec| {
                let mut line = format!("{}{} - {}", self.prefix, spec.name, spec.description);
                if !spec.aliases.is_empty() {
                    line.push_str(&format!(" (aliases: {})", spec.aliases.join(", ")));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(&name.to_lowercase())
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}
