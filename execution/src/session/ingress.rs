use arcade_types::casino::Interaction;
use futures::{channel::mpsc, SinkExt};
use tracing::warn;

pub enum Message {
    /// An interaction the router matched to this session.
    Input(Interaction),
    /// Force the deadline transition and settle.
    Close,
}

#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(crate) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    /// Queue an interaction. Returns false if the session already ended.
    pub async fn input(&mut self, interaction: Interaction) -> bool {
        let actor = interaction.actor;
        if self.sender.send(Message::Input(interaction)).await.is_err() {
            warn!(%actor, "session mailbox closed; input dropped");
            return false;
        }
        true
    }

    pub async fn close(&mut self) {
        if self.sender.send(Message::Close).await.is_err() {
            warn!("session mailbox closed; close dropped");
        }
    }
}
