//! Error types for command parsing.

/// Rejections produced while parsing inbound chat text.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command needs an argument the player didn't supply.
    /// The message doubles as the usage hint shown to the player.
    #[error("missing argument, usage: {usage}")]
    MissingArgument { usage: &'static str },

    /// A slash command the bot doesn't know.
    #[error("unknown command {0}")]
    Unknown(String),
}
