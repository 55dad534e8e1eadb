//! Websocket gateway between the chat client and the arcade.
//!
//! The chat client keeps one websocket open on `/ws` and exchanges tagged
//! JSON messages. Requests carry an optional `id` echoed in the direct reply:
//!
//! ```json
//! {"id": 4, "type": "start", "kind": "coinflip", "channel": 9, "players": [1], "stake": 50, "choice": "heads"}
//! {"type": "input", "actor": 1, "channel": 9, "kind": "button", "payload": "mine:3", "arrival_ms": 0}
//! ```
//!
//! Every prompt any session emits is pushed to every connection as a
//! `prompt` message, and each started session reports its `receipt` on the
//! connection that started it once it settles.

use arcade_execution::{
    AccountStore, Arcade, Listing, Rejection, Resolution, Routed, SessionError, SessionHandle,
    StartRequest,
};
use arcade_types::{
    casino::{
        Interaction, JobKind, Prompt, ERROR_BAD_PARAMS, ERROR_NOT_EXPECTED, ERROR_NO_SESSION,
        ERROR_PAYOUT_PENDING, ERROR_RATE_LIMITED, ERROR_STORE,
    },
    Activity, ChannelId, GameKind, UserId,
};
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use prometheus_client::{encoding::text::encode, registry::Registry};
use serde::{Deserialize, Serialize};
use std::{
    num::{NonZeroU32, NonZeroUsize},
    sync::Arc,
    time::Duration,
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinSet,
    time::timeout,
};
use tracing::{debug, error, info, warn};

/// Inbound request body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Start {
        kind: GameKind,
        channel: ChannelId,
        /// Challenger first for two-player games.
        players: Vec<UserId>,
        #[serde(default)]
        stake: u64,
        #[serde(default)]
        choice: Option<String>,
    },
    Input(Interaction),
    Balance {
        user: UserId,
    },
    Daily {
        user: UserId,
    },
    Pay {
        from: UserId,
        to: UserId,
        amount: u64,
    },
    Job {
        user: UserId,
        job: JobKind,
    },
    Quit {
        user: UserId,
    },
    Work {
        user: UserId,
        channel: ChannelId,
    },
    Buy {
        user: UserId,
        item: String,
    },
    Shop,
}

impl Request {
    /// User the request is rate limited against.
    pub fn actor(&self) -> Option<UserId> {
        match self {
            Request::Start { players, .. } => players.first().copied(),
            Request::Input(interaction) => Some(interaction.actor),
            Request::Balance { user }
            | Request::Daily { user }
            | Request::Job { user, .. }
            | Request::Quit { user }
            | Request::Work { user, .. }
            | Request::Buy { user, .. } => Some(*user),
            Request::Pay { from, .. } => Some(*from),
            Request::Shop => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: Request,
}

/// Settled session as reported to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReceiptReply {
    pub session: u64,
    pub activity: Activity,
    pub resolution: &'static str,
    pub deltas: Vec<(UserId, i64)>,
    pub balances: Vec<(UserId, i64)>,
    pub applied: bool,
}

fn resolution_name(resolution: Resolution) -> &'static str {
    match resolution {
        Resolution::Completed => "completed",
        Resolution::TimedOut => "timed_out",
        Resolution::Faulted => "faulted",
        Resolution::Shutdown => "shutdown",
    }
}

/// Outbound message body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Ack {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        session: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        balance: Option<i64>,
        message: String,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        code: u8,
        message: String,
    },
    Prompt(Prompt),
    Receipt(ReceiptReply),
}

impl Reply {
    fn ack(id: Option<u64>, message: impl Into<String>) -> Self {
        Reply::Ack {
            id,
            session: None,
            balance: None,
            message: message.into(),
        }
    }

    fn error(id: Option<u64>, code: u8, message: impl ToString) -> Self {
        Reply::Error {
            id,
            code,
            message: message.to_string(),
        }
    }
}

/// Direct reply to a request plus the session it started, if any.
pub struct Handled {
    pub reply: Reply,
    pub session: Option<SessionHandle>,
}

impl From<Reply> for Handled {
    fn from(reply: Reply) -> Self {
        Self {
            reply,
            session: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GatewaySettings {
    pub outbound_buffer: NonZeroUsize,
    pub max_message_bytes: NonZeroUsize,
    pub send_timeout: Duration,
    pub rate_per_second: NonZeroU32,
    pub burst: NonZeroU32,
}

pub struct Gateway<S: AccountStore> {
    arcade: Arc<Arcade<S>>,
    limiter: DefaultKeyedRateLimiter<UserId>,
    registry: Registry,
    settings: GatewaySettings,
}

impl<S: AccountStore> Gateway<S> {
    pub fn new(arcade: Arc<Arcade<S>>, settings: GatewaySettings) -> Self {
        let quota = Quota::per_second(settings.rate_per_second).allow_burst(settings.burst);
        let mut registry = Registry::with_prefix("arcade");
        arcade.metrics().register(&mut registry);
        Self {
            arcade,
            limiter: RateLimiter::keyed(quota),
            registry,
            settings,
        }
    }

    pub fn arcade(&self) -> &Arc<Arcade<S>> {
        &self.arcade
    }

    /// Drop rate-limiter state for idle users.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prometheus text exposition of the engine metrics.
    pub fn render_metrics(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }

    pub async fn handle_text(&self, text: &str) -> Handled {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => self.handle(envelope).await,
            Err(err) => {
                debug!(%err, "malformed request");
                Reply::error(None, ERROR_BAD_PARAMS, format!("malformed request: {err}")).into()
            }
        }
    }

    pub async fn handle(&self, envelope: Envelope) -> Handled {
        let Envelope { id, request } = envelope;
        if let Some(actor) = request.actor() {
            if self.limiter.check_key(&actor).is_err() {
                debug!(%actor, "request rate limited");
                return Reply::error(id, ERROR_RATE_LIMITED, "slow down").into();
            }
        }

        let arcade = &self.arcade;
        match request {
            Request::Start {
                kind,
                channel,
                players,
                stake,
                choice,
            } => {
                let mut start = StartRequest::new(kind, channel, players, stake);
                start.choice = choice;
                match arcade.start_session(start).await {
                    Ok(handle) => started(id, handle),
                    Err(rejection) => rejected(id, &rejection),
                }
            }
            Request::Input(interaction) => match arcade.route(interaction).await {
                Routed::Delivered { session_id } => Reply::Ack {
                    id,
                    session: Some(session_id),
                    balance: None,
                    message: "delivered".to_string(),
                }
                .into(),
                Routed::NotExpected { .. } => {
                    Reply::error(id, ERROR_NOT_EXPECTED, "it is not your turn").into()
                }
                Routed::NoSession | Routed::Closed { .. } => {
                    Reply::error(id, ERROR_NO_SESSION, "no game is waiting for that").into()
                }
            },
            Request::Balance { user } => match arcade.balance(user).await {
                Ok(account) => Reply::Ack {
                    id,
                    session: None,
                    balance: Some(account.balance),
                    message: format!("{user} has {}", account.balance),
                }
                .into(),
                Err(err) => Reply::error(id, ERROR_STORE, err).into(),
            },
            Request::Daily { user } => match arcade.claim_daily(user).await {
                Ok(reward) => Reply::Ack {
                    id,
                    session: None,
                    balance: Some(reward.balance),
                    message: format!("daily reward of {}", reward.amount),
                }
                .into(),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Pay { from, to, amount } => match arcade.transfer(from, to, amount).await {
                Ok(transfer) => Reply::Ack {
                    id,
                    session: None,
                    balance: Some(transfer.from_balance),
                    message: format!("paid {amount} to {to}"),
                }
                .into(),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Job { user, job } => match arcade.choose_job(user, job).await {
                Ok(_) => Reply::ack(id, format!("{user} now works as a {}", job.job().display)).into(),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Quit { user } => match arcade.quit_job(user).await {
                Ok(_) => Reply::ack(id, format!("{user} quit their job")).into(),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Work { user, channel } => match arcade.start_work(user, channel).await {
                Ok(handle) => started(id, handle),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Buy { user, item } => match arcade.buy(user, &item).await {
                Ok(purchase) => Reply::Ack {
                    id,
                    session: None,
                    balance: Some(purchase.balance),
                    message: format!(
                        "{user} bought {} for {} and now owns {}",
                        purchase.item, purchase.price, purchase.owned
                    ),
                }
                .into(),
                Err(err) => Reply::error(id, err.code(), err).into(),
            },
            Request::Shop => Reply::ack(id, shop_listing(&arcade.shop())).into(),
        }
    }
}

fn started(id: Option<u64>, handle: SessionHandle) -> Handled {
    Handled {
        reply: Reply::Ack {
            id,
            session: Some(handle.session_id),
            balance: None,
            message: format!("session {} started in {}", handle.session_id, handle.scope),
        },
        session: Some(handle),
    }
}

fn shop_listing(listing: &[Listing]) -> String {
    listing
        .iter()
        .map(|entry| {
            let stock = match entry.remaining {
                Some(0) => " (sold out)".to_string(),
                Some(left) => format!(" ({left} left)"),
                None => String::new(),
            };
            format!(
                "{}: {} for {}{stock}",
                entry.item.name, entry.item.description, entry.item.price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn rejected(id: Option<u64>, rejection: &Rejection) -> Handled {
    Reply::error(id, rejection.code(), rejection).into()
}

/// Wait for `handle` to settle and describe the result.
pub async fn receipt_reply(handle: SessionHandle) -> Reply {
    let session_id = handle.session_id;
    match handle.receipt().await {
        Ok(receipt) => Reply::Receipt(ReceiptReply {
            session: receipt.session_id,
            activity: receipt.activity,
            resolution: resolution_name(receipt.resolution),
            deltas: receipt.deltas,
            balances: receipt.balances,
            applied: receipt.applied,
        }),
        Err(err @ SessionError::Settlement(_)) => {
            warn!(session = session_id, %err, "payout pending");
            Reply::error(None, ERROR_PAYOUT_PENDING, format!("session {session_id}: payout pending"))
        }
        Err(err) => {
            error!(session = session_id, %err, "session lost its receipt");
            Reply::error(None, ERROR_PAYOUT_PENDING, err)
        }
    }
}

/// Routes for the chat client: `/ws` and `/healthz`.
pub fn router<S: AccountStore>(gateway: Arc<Gateway<S>>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler::<S>))
        .route("/healthz", get(health_handler))
        .with_state(gateway)
}

/// Routes for the scraper: `/metrics`.
pub fn metrics_router<S: AccountStore>(gateway: Arc<Gateway<S>>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler::<S>))
        .with_state(gateway)
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler<S: AccountStore>(
    State(gateway): State<Arc<Gateway<S>>>,
) -> Result<Response<Body>, StatusCode> {
    let body = gateway.render_metrics().map_err(|err| {
        error!("metrics encoding failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .map_err(|err| {
            error!("metrics response build failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn ws_handler<S: AccountStore>(
    State(gateway): State<Arc<Gateway<S>>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let max_message_bytes = gateway.settings.max_message_bytes.get();
    ws.max_message_size(max_message_bytes)
        .max_frame_size(max_message_bytes)
        .on_upgrade(move |socket| connection(socket, gateway))
}

/// Queue a reply for the writer. Returns false when the connection should close.
fn enqueue(out: &mpsc::Sender<Reply>, reply: Reply) -> bool {
    match out.try_send(reply) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("client outbound queue full, closing connection");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

async fn connection<S: AccountStore>(socket: WebSocket, gateway: Arc<Gateway<S>>) {
    info!("chat client connected");
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Reply>(gateway.settings.outbound_buffer.get());
    let send_timeout = gateway.settings.send_timeout;
    let writer = tokio::spawn(async move {
        while let Some(reply) = out_rx.recv().await {
            let text = match serde_json::to_string(&reply) {
                Ok(text) => text,
                Err(err) => {
                    error!(%err, "failed to encode reply");
                    continue;
                }
            };
            match timeout(send_timeout, sink.send(Message::Text(text))).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    warn!("failed to send reply, client disconnected");
                    break;
                }
                Err(_) => {
                    warn!("websocket send timed out, closing connection");
                    break;
                }
            }
        }
        let _ = sink.close().await;
    });

    let mut prompts = gateway.arcade.subscribe();
    let mut receipts = JoinSet::new();
    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let handled = gateway.handle_text(&text).await;
                    if !enqueue(&out_tx, handled.reply) {
                        break;
                    }
                    if let Some(handle) = handled.session {
                        let out = out_tx.clone();
                        receipts.spawn(async move {
                            let reply = receipt_reply(handle).await;
                            let _ = out.send(reply).await;
                        });
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("chat client disconnected");
                    break;
                }
                Some(Err(err)) => {
                    warn!(?err, "websocket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            prompt = prompts.recv() => match prompt {
                Ok(prompt) => {
                    if !enqueue(&out_tx, Reply::Prompt(prompt)) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "client lagged behind the prompt stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(_) = receipts.join_next(), if !receipts.is_empty() => {}
        }
    }

    // Sessions keep running and settle without this connection.
    receipts.abort_all();
    drop(out_tx);
    let _ = writer.await;
}
