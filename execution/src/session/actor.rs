use super::{Event, Message, Services, Session, Step};
use crate::{
    games::{Expectation, GameResult, Input},
    settlement::{Receipt, Resolution, SettlementError},
    store::AccountStore,
};
use arcade_types::casino::{Audience, Interaction, InteractionKind, Prompt};
use futures::{
    channel::{mpsc, oneshot},
    StreamExt,
};
use tokio::{sync::watch, time::sleep_until};
use tracing::{debug, error, info};

/// Serialises every event of one interactive session.
pub(crate) struct Actor<S: AccountStore> {
    session: Session,
    services: Services<S>,
    mailbox: mpsc::Receiver<Message>,
    expected: watch::Sender<Expectation>,
    receipt: oneshot::Sender<Result<Receipt, SettlementError>>,
}

impl<S: AccountStore> Actor<S> {
    pub fn new(
        session: Session,
        services: Services<S>,
        mailbox: mpsc::Receiver<Message>,
        expected: watch::Sender<Expectation>,
        receipt: oneshot::Sender<Result<Receipt, SettlementError>>,
    ) -> Self {
        Self {
            session,
            services,
            mailbox,
            expected,
            receipt,
        }
    }

    pub async fn run(mut self) {
        let (resolution, result) = loop {
            self.expected
                .send_replace(self.session.game.expected(&self.session.participants));
            let clock = self.services.clock;
            let deadline = sleep_until(clock.instant_at(self.session.deadline_ms));
            let timer = self.session.game.timer_at();
            let timer = async move {
                match timer {
                    Some(at) => sleep_until(clock.instant_at(at)).await,
                    None => std::future::pending().await,
                }
            };

            let (resolution, step) = tokio::select! {
                biased;
                message = self.mailbox.next() => match message {
                    Some(Message::Input(interaction)) => {
                        let Some(step) = self.input(&interaction) else {
                            continue;
                        };
                        (Resolution::Completed, step)
                    }
                    Some(Message::Close) | None => {
                        match self.drive(Event::Shutdown) {
                            Step::Continue => break (Resolution::Shutdown, GameResult::Void),
                            step => (Resolution::Shutdown, step),
                        }
                    }
                },
                _ = deadline => (Resolution::TimedOut, self.drive(Event::Deadline)),
                _ = timer => (Resolution::Completed, self.drive(Event::Timer)),
            };

            match step {
                Step::Continue
                    if resolution == Resolution::TimedOut
                        && self.session.deadline_ms <= self.services.clock.now_ms() =>
                {
                    error!(session = self.session.id, "deadline passed without rearming");
                    break (Resolution::Faulted, GameResult::Void);
                }
                Step::Continue => {}
                Step::Rejected(err) => debug!(session = self.session.id, %err, "input rejected"),
                Step::Terminal(result) => break (resolution, result),
                Step::Faulted => break (Resolution::Faulted, GameResult::Void),
            }
        };

        self.expected.send_replace(Expectation::none());
        let receipt = self
            .session
            .finish(&self.services, resolution, &result)
            .await;
        if self.receipt.send(receipt).is_err() {
            debug!(session = self.session.id, "receipt dropped by caller");
        }
    }

    fn drive(&mut self, event: Event<'_>) -> Step {
        let now_ms = self.services.clock.now_ms();
        self.session
            .drive(event, now_ms, &self.services.prompts)
            .0
    }

    /// Decode and apply one routed interaction. `None` means it was dropped.
    fn input(&mut self, interaction: &Interaction) -> Option<Step> {
        let expected = self.session.game.expected(&self.session.participants);
        if !expected.admits(interaction.actor, interaction.kind) {
            debug!(
                session = self.session.id,
                actor = %interaction.actor,
                "input no longer expected; dropped"
            );
            return None;
        }
        let input = match interaction.kind {
            InteractionKind::Button => {
                let (prefix, arg) = interaction.split_payload()?;
                if prefix != self.session.kind().prefix() {
                    return None;
                }
                Input::Button(arg)
            }
            InteractionKind::Text => Input::Text(&interaction.payload),
            InteractionKind::Command => return None,
        };
        let step = self.drive(Event::Input(interaction.actor, input));
        if let Step::Rejected(err) = &step {
            let notice = Prompt {
                session: self.session.id,
                channel: self.session.channel,
                audience: Audience::Private(interaction.actor),
                text: err.to_string(),
                choices: Vec::new(),
                expires_at_ms: None,
            };
            let _ = self.services.prompts.send(notice);
        }
        if let Step::Terminal(_) = &step {
            info!(
                session = self.session.id,
                actor = %interaction.actor,
                "final input accepted"
            );
        }
        Some(step)
    }
}
