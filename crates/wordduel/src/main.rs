//! Local console runner.
//!
//! Each stdin line is `<numeric id> <handle> <text>` — one message
//! from that player — and outbound messages print with the recipient
//! id. Lets you play a full duel by hand without a chat platform.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use wordduel::{init_tracing, Inbound, Server, ServerConfig, WordDuelError};
use wordduel_protocol::ExternalId;
use wordduel_service::Notifier;

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, recipient: ExternalId, text: &str) {
        println!("[to {recipient}] {text}");
    }
}

#[tokio::main]
async fn main() -> Result<(), WordDuelError> {
    init_tracing();

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut parts = line.splitn(3, ' ');
            let (Some(id), Some(handle), Some(text)) = (parts.next(), parts.next(), parts.next())
            else {
                eprintln!("usage: <numeric id> <handle> <text>");
                continue;
            };
            let Ok(id) = id.parse() else {
                eprintln!("the id must be numeric");
                continue;
            };
            let inbound = Inbound {
                external_id: ExternalId(id),
                handle: handle.to_string(),
                text: text.to_string(),
            };
            if tx.send(inbound).await.is_err() {
                break;
            }
        }
    });

    Server::new(ServerConfig::default(), Arc::new(ConsoleNotifier))
        .run(rx)
        .await
}
