//! Text commands.

mod registry;

pub use registry::{
    CommandContext, CommandError, CommandHandler, CommandRegistry, CommandRegistryBuilder,
    CommandSpec,
};
