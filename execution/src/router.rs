//! Delivers interactions to the session that expects them.

use crate::registry::{LiveSession, SessionRegistry};
use arcade_types::{
    casino::{Interaction, InteractionKind, MAX_PAYLOAD_LENGTH},
    ScopeKey,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routed {
    Delivered { session_id: u64 },
    /// No live session accepts this payload.
    NoSession,
    /// A session accepts the payload but not from this actor (or not yet).
    NotExpected { session_id: u64 },
    /// The session ended while the input was in flight.
    Closed { session_id: u64 },
}

pub struct InputRouter {
    registry: Arc<SessionRegistry>,
}

impl InputRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    fn accepts_payload(session: &LiveSession, interaction: &Interaction) -> bool {
        match interaction.kind {
            InteractionKind::Button => interaction
                .split_payload()
                .is_some_and(|(prefix, _)| prefix == session.kind.prefix()),
            InteractionKind::Text => {
                interaction.channel == session.channel && session.expected.borrow().text
            }
            InteractionKind::Command => false,
        }
    }

    /// Match `interaction` against the actor's scope, then the channel's.
    pub async fn route(&self, interaction: Interaction) -> Routed {
        if interaction.payload.len() > MAX_PAYLOAD_LENGTH {
            return Routed::NoSession;
        }
        let scopes = [
            ScopeKey::User(interaction.actor),
            ScopeKey::Channel(interaction.channel),
        ];
        let mut refused = None;
        for scope in scopes {
            let Some(mut session) = self.registry.lookup(scope) else {
                continue;
            };
            if !Self::accepts_payload(&session, &interaction) {
                continue;
            }
            let admitted = session
                .expected
                .borrow()
                .admits(interaction.actor, interaction.kind);
            if !admitted {
                refused.get_or_insert(session.session_id);
                continue;
            }
            let session_id = session.session_id;
            return if session.mailbox.input(interaction).await {
                Routed::Delivered { session_id }
            } else {
                Routed::Closed { session_id }
            };
        }
        match refused {
            Some(session_id) => {
                debug!(session = session_id, actor = %interaction.actor, "input not expected");
                Routed::NotExpected { session_id }
            }
            None => Routed::NoSession,
        }
    }
}
