//! Identity types and the chat command surface for WordDuel.
//!
//! The bot transport (Telegram, Discord, a test harness) delivers raw
//! text lines; this crate turns them into typed [`Command`]s and defines
//! the id newtypes the rest of the workspace shares.
//!
//! # Key types
//!
//! - [`UserId`] / [`RoomId`] / [`ExternalId`] — id newtypes
//! - [`Command`] — everything a player can ask the bot to do
//! - [`CommandError`] — parse rejections with usage hints

mod command;
mod error;
mod types;

pub use command::Command;
pub use error::CommandError;
pub use types::{ExternalId, RoomId, UserId};
