//! The outbound notification seam.

use wordduel_protocol::ExternalId;

/// Fire-and-forget delivery of a text message to a player.
///
/// Implemented by the chat transport outside this workspace (and by
/// channel-backed fakes in tests). Sends must never block and failures
/// are swallowed at this boundary: state transitions commit first, and
/// a lost notification never rolls one back.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, recipient: ExternalId, text: &str);
}
