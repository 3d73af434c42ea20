//! Parsing of inbound chat text into typed commands.
//!
//! A line starting with `/` is a command; anything else is free text
//! that gets relayed to the opponent (when a room allows it). Command
//! arguments are everything after the first space, so secrets and
//! guesses may contain spaces.

use serde::{Deserialize, Serialize};

use crate::CommandError;

/// Everything a player can ask the bot to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `/start` — greet the player and register them.
    Start,
    /// `/challenge <handle>` — invite another player to a match.
    Challenge { handle: String },
    /// `/accept` — accept a pending challenge.
    Accept,
    /// `/decline` — decline a pending challenge.
    Decline,
    /// `/begin` — confirm the start of the match (both players must).
    ConfirmStart,
    /// `/secret <text>` — store the caller's secret word.
    SetSecret { word: String },
    /// `/done` — signal that the caller is finished entering a secret.
    ConfirmSecretsDone,
    /// `/ready` — signal readiness to play.
    ConfirmReady,
    /// `/guess <text>` — guess the opponent's secret word.
    Guess { text: String },
    /// `/forfeit` — leave the match; the opponent wins.
    Forfeit,
    /// Plain text, relayed to the opponent as-is while the room allows it.
    Relay { text: String },
}

impl Command {
    /// Parses one inbound line of chat text.
    ///
    /// # Errors
    /// - [`CommandError::MissingArgument`] for a known command without
    ///   its required argument
    /// - [`CommandError::Unknown`] for an unrecognized `/command`
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if !line.starts_with('/') {
            return Ok(Self::Relay {
                text: line.to_string(),
            });
        }

        // Split "/cmd rest of the line" into the verb and its argument.
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "/start" => Ok(Self::Start),
            "/challenge" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument {
                        usage: "/challenge <handle>",
                    });
                }
                Ok(Self::Challenge {
                    handle: arg.to_string(),
                })
            }
            "/accept" => Ok(Self::Accept),
            "/decline" => Ok(Self::Decline),
            "/begin" => Ok(Self::ConfirmStart),
            "/secret" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument {
                        usage: "/secret <your word>",
                    });
                }
                Ok(Self::SetSecret {
                    word: arg.to_string(),
                })
            }
            "/done" => Ok(Self::ConfirmSecretsDone),
            "/ready" => Ok(Self::ConfirmReady),
            "/guess" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument {
                        usage: "/guess <your guess>",
                    });
                }
                Ok(Self::Guess {
                    text: arg.to_string(),
                })
            }
            "/forfeit" => Ok(Self::Forfeit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
