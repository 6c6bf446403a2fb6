//! Connection orchestrator.
//!
//! The actor mailbox is the event loop: public calls, socket callbacks and timer firings
//! are all messages handled one at a time. Socket reads run in a reader task outside the
//! actor and are forwarded as messages tagged with the connection epoch, so anything that
//! arrives after a teardown is recognized as stale and dropped.

use futures_util::StreamExt;
use kameo::error::SendError;
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage, WeakActorRef};
use tracing::{debug, info, warn};

use crate::core::{
    CLOSE_ABNORMAL, CLOSE_HEARTBEAT_TIMEOUT, CLOSE_NO_STATUS, CLOSE_NORMAL, OpaqueCommand,
    PING_FRAME, WebSocketError, WebSocketResult, WsClientConfig, WsConnectionMetrics,
    WsConnectionState, WsDisconnectReason, WsEnqueueOutcome, WsEvent, WsEventBus,
    WsEventData, WsEventKind, WsFrame, WsHeartbeatManager, WsInbound, WsListener, WsListenerId,
    WsMessageQueue, WsMetricsRecorder, WsReconnectSchedule, WsReconnectionManager,
    WsScheduledTask, WsSendCallbacks, WsSendOptions, WsSendOutcome, duration_ms,
    ping_timeout_callback, timer_callback,
};
use crate::transport::{TungsteniteTransport, WsTransport};

use super::writer::{WriterWrite, WsWriterActor};

/// Arguments passed when spawning a [`WebSocketActor`].
pub struct WebSocketActorArgs<T: WsTransport = TungsteniteTransport> {
    pub config: WsClientConfig,
    pub transport: T,
}

/// Single-connection websocket client with reconnection, heartbeat and an offline queue.
pub struct WebSocketActor<T: WsTransport = TungsteniteTransport> {
    config: WsClientConfig,
    transport: T,
    actor_ref: WeakActorRef<Self>,
    state: WsConnectionState,
    /// Bumped on every socket open and teardown.
    epoch: u64,
    manual_disconnect: bool,
    authenticated: bool,
    destroyed: bool,
    connect_task: Option<WsScheduledTask>,
    connect_timeout: Option<WsScheduledTask>,
    reader_task: Option<WsScheduledTask>,
    writer: Option<ActorRef<WsWriterActor<T::Writer>>>,
    queue: WsMessageQueue,
    reconnection: WsReconnectionManager,
    heartbeat: WsHeartbeatManager,
    metrics: WsMetricsRecorder,
    events: WsEventBus,
}

impl<T: WsTransport> Actor for WebSocketActor<T> {
    type Args = WebSocketActorArgs<T>;
    type Error = WebSocketError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        let WebSocketActorArgs { config, transport } = args;
        let queue = WsMessageQueue::new(config.max_queue_size);
        let reconnection = WsReconnectionManager::new(config.backoff(), config.max_reconnect_attempts);
        let heartbeat = WsHeartbeatManager::new(config.heartbeat_interval, config.heartbeat_timeout);

        Ok(Self {
            config,
            transport,
            actor_ref: actor_ref.downgrade(),
            state: WsConnectionState::Closed,
            epoch: 0,
            manual_disconnect: false,
            authenticated: false,
            destroyed: false,
            connect_task: None,
            connect_timeout: None,
            reader_task: None,
            writer: None,
            queue,
            reconnection,
            heartbeat,
            metrics: WsMetricsRecorder::new(),
            events: WsEventBus::new(),
        })
    }

    async fn on_stop(
        &mut self,
        _ctx: WeakActorRef<Self>,
        _reason: kameo::error::ActorStopReason,
    ) -> WebSocketResult<()> {
        self.heartbeat.stop();
        self.reconnection.cancel();
        self.teardown_io(None).await;
        Ok(())
    }

    fn on_panic(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        err: kameo::prelude::PanicError,
    ) -> impl std::future::Future<
        Output = Result<std::ops::ControlFlow<kameo::prelude::ActorStopReason>, Self::Error>,
    > + Send {
        async move {
            tracing::error!(error = ?err, "WebSocketActor panicked");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

impl<T: WsTransport> WebSocketActor<T> {
    fn transition(&mut self, next: WsConnectionState) {
        if self.state == next {
            return;
        }
        let previous = std::mem::replace(&mut self.state, next);
        debug!(from = %previous, to = %next, epoch = self.epoch, "websocket state change");
        self.emit(WsEventData::StateChange {
            previous,
            current: next,
        });
    }

    fn emit(&mut self, data: WsEventData) {
        self.events.emit(&WsEvent::now(data));
    }

    fn emit_error(&mut self, err: &WebSocketError) {
        self.metrics.record_error();
        self.emit(WsEventData::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn apply_authenticated(&mut self, value: bool) {
        if self.authenticated == value {
            return;
        }
        self.authenticated = value;
        self.emit(WsEventData::AuthChange {
            authenticated: value,
        });
    }

    fn log_url(&self) -> String {
        match self.config.resolve_url() {
            // Drop the query so the auth token never reaches the logs.
            Ok(url) => url.split('?').next().unwrap_or_default().to_string(),
            Err(_) => "<unresolved>".to_string(),
        }
    }

    async fn handle_connect(&mut self) -> WebSocketResult<()> {
        if self.destroyed {
            return Err(WebSocketError::Destroyed);
        }
        match self.state {
            WsConnectionState::Connecting | WsConnectionState::Connected => return Ok(()),
            WsConnectionState::Reconnecting => self.reconnection.cancel(),
            WsConnectionState::Closing | WsConnectionState::Closed => {}
        }
        self.manual_disconnect = false;
        self.open_socket()
    }

    fn open_socket(&mut self) -> WebSocketResult<()> {
        let url = self.config.resolve_url()?;
        self.epoch += 1;
        let epoch = self.epoch;
        self.transition(WsConnectionState::Connecting);

        info!(
            url = %self.log_url(),
            epoch,
            attempt = self.reconnection.attempt_count(),
            "opening websocket"
        );

        let transport = self.transport.clone();
        let buffers = self.config.buffers;
        let actor_ref = self.actor_ref.clone();
        self.connect_task = Some(WsScheduledTask::spawn(async move {
            match transport.connect(url, buffers).await {
                Ok((reader, writer)) => {
                    tell_actor(
                        &actor_ref,
                        ConnectionEstablished::<T> {
                            epoch,
                            reader,
                            writer,
                        },
                    )
                    .await;
                }
                Err(error) => tell_actor(&actor_ref, ConnectionFailed { epoch, error }).await,
            }
        }));

        let timeout = self.config.connection_timeout;
        if !timeout.is_zero() {
            let actor_ref = self.actor_ref.clone();
            self.connect_timeout = Some(WsScheduledTask::after(timeout, async move {
                tell_actor(&actor_ref, ConnectTimeout { epoch }).await;
            }));
        }
        Ok(())
    }

    async fn handle_established(&mut self, msg: ConnectionEstablished<T>) {
        if msg.epoch != self.epoch || self.state != WsConnectionState::Connecting {
            debug!(epoch = msg.epoch, current = self.epoch, "dropping stale websocket connection");
            return;
        }
        self.connect_timeout = None;
        self.connect_task = None;

        let epoch = self.epoch;
        self.writer = Some(WsWriterActor::spawn(WsWriterActor::new(msg.writer)));
        let actor_ref = self.actor_ref.clone();
        self.reader_task = Some(WsScheduledTask::spawn(read_loop::<T>(
            actor_ref,
            msg.reader,
            epoch,
        )));

        let attempts = self.reconnection.attempt_count();
        self.transition(WsConnectionState::Connected);
        self.metrics.record_connect();
        if attempts > 0 {
            self.metrics.record_reconnect_success();
        }
        info!(url = %self.log_url(), epoch, attempts, "websocket connected");
        self.emit(WsEventData::Connected { attempts });
        self.reconnection.reset();
        self.start_heartbeat();
        self.flush_queue().await;
    }

    fn start_heartbeat(&mut self) {
        let epoch = self.epoch;
        let tick_ref = self.actor_ref.clone();
        let timeout_ref = self.actor_ref.clone();
        let started = self.heartbeat.start(
            timer_callback(move || {
                let actor_ref = tick_ref.clone();
                async move { tell_actor(&actor_ref, HeartbeatTick { epoch }).await }
            }),
            ping_timeout_callback(move |seq| {
                let actor_ref = timeout_ref.clone();
                async move { tell_actor(&actor_ref, HeartbeatTimeout { epoch, seq }).await }
            }),
        );
        if started {
            debug!(
                epoch,
                interval_ms = duration_ms(self.heartbeat.interval()),
                timeout_ms = duration_ms(self.heartbeat.timeout()),
                "heartbeat started"
            );
        }
    }

    async fn flush_queue(&mut self) {
        let pending = self.queue.flush();
        if pending.is_empty() {
            return;
        }
        info!(count = pending.len(), "flushing queued websocket messages");
        for queued in pending {
            if let Err(err) = self.transmit(queued.payload, queued.callbacks).await {
                warn!(error = %err, "queued websocket message failed during flush");
            }
        }
    }

    async fn write_frame(&mut self, frame: WsFrame) -> WebSocketResult<()> {
        let Some(writer) = self.writer.as_ref() else {
            return Err(WebSocketError::NotConnected { state: self.state });
        };
        writer
            .ask(WriterWrite { frame })
            .await
            .map_err(|err| match err {
                SendError::HandlerError(err) => err,
                SendError::ActorNotRunning(_) | SendError::ActorStopped => {
                    writer_unavailable("writer stopped")
                }
                SendError::MailboxFull(_) => writer_unavailable("writer mailbox full"),
                SendError::Timeout(_) => writer_unavailable("writer timed out"),
            })
    }

    /// Serialize and hand to the writer, reporting the outcome through callbacks and events.
    async fn transmit(
        &mut self,
        payload: OpaqueCommand,
        callbacks: WsSendCallbacks,
    ) -> WebSocketResult<WsSendOutcome> {
        let result = match payload.to_wire() {
            Ok(raw) => self
                .write_frame(WsFrame::text(raw.clone()))
                .await
                .map(|()| raw),
            Err(err) => Err(err),
        };

        match result {
            Ok(raw) => {
                self.metrics.record_message_sent();
                if self.config.debug {
                    debug!(epoch = self.epoch, raw = %raw, "websocket frame sent");
                }
                self.emit(WsEventData::MessageSent { raw });
                callbacks.succeed();
                Ok(WsSendOutcome::Sent)
            }
            Err(err) => {
                warn!(error = %err, "websocket send failed");
                self.emit_error(&err);
                callbacks.fail(&err);
                Err(err)
            }
        }
    }

    async fn handle_send(
        &mut self,
        payload: OpaqueCommand,
        options: WsSendOptions,
    ) -> WebSocketResult<WsSendOutcome> {
        let (queue, callbacks) = options.into_parts();
        if self.destroyed {
            let err = WebSocketError::Destroyed;
            callbacks.fail(&err);
            return Err(err);
        }
        if self.state == WsConnectionState::Connected {
            return self.transmit(payload, callbacks).await;
        }
        if !queue {
            let err = WebSocketError::NotConnected { state: self.state };
            callbacks.fail(&err);
            return Err(err);
        }

        let capacity = self.queue.capacity();
        match self.queue.enqueue(payload, callbacks) {
            WsEnqueueOutcome::Queued => Ok(WsSendOutcome::Queued),
            WsEnqueueOutcome::Evicted(oldest) => {
                warn!(capacity, "outbound queue full, evicting oldest message");
                oldest
                    .callbacks
                    .fail(&WebSocketError::QueueOverflow { capacity });
                Ok(WsSendOutcome::Queued)
            }
            WsEnqueueOutcome::Rejected(message) => {
                let err = WebSocketError::QueueRejected { capacity };
                message.callbacks.fail(&err);
                Err(err)
            }
        }
    }

    async fn handle_inbound(&mut self, frame: WsFrame) {
        // Close frames never get here; the reader turns them into `SocketClosed`.
        let Some(bytes) = frame.data().cloned() else {
            if self.config.debug {
                debug!(epoch = self.epoch, "websocket control frame");
            }
            return;
        };

        self.metrics.record_message_received();
        if self.config.debug {
            debug!(
                epoch = self.epoch,
                raw = %String::from_utf8_lossy(bytes.as_ref()),
                "websocket frame received"
            );
        }

        match WsInbound::parse(&bytes) {
            Ok(WsInbound::Pong) => {
                if let Some(latency) = self.heartbeat.handle_pong() {
                    self.metrics.record_latency(latency);
                }
            }
            Ok(WsInbound::Data { data, raw }) => self.emit(WsEventData::Message { data, raw }),
            Err(err) => {
                warn!(error = %err, "dropping malformed websocket frame");
                self.emit_error(&err);
            }
        }
    }

    async fn handle_heartbeat_tick(&mut self) {
        let sent = match self.write_frame(WsFrame::text_static(PING_FRAME)).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "heartbeat ping failed, skipping tick");
                self.metrics.record_error();
                false
            }
        };
        self.heartbeat.ping_sent(sent);
    }

    async fn handle_heartbeat_timeout(&mut self, seq: u64) {
        if !self.heartbeat.handle_timeout(seq) {
            debug!(epoch = self.epoch, seq, "ignoring stale heartbeat timeout");
            return;
        }
        warn!(
            url = %self.log_url(),
            epoch = self.epoch,
            seq,
            timeout_ms = duration_ms(self.heartbeat.timeout()),
            "heartbeat timed out, closing connection"
        );
        self.metrics.record_error();
        self.close_connection(
            CLOSE_HEARTBEAT_TIMEOUT,
            "heartbeat timeout".to_string(),
            Some(WsFrame::close(CLOSE_HEARTBEAT_TIMEOUT, "heartbeat timeout")),
        )
        .await;
    }

    /// Abort IO tasks and stop the writer, optionally sending `close_frame` first.
    async fn teardown_io(&mut self, close_frame: Option<WsFrame>) {
        self.epoch += 1;
        self.connect_timeout = None;
        self.connect_task = None;
        self.reader_task = None;
        if let Some(writer) = self.writer.take() {
            if let Some(frame) = close_frame {
                let _ = writer.tell(WriterWrite { frame }).send().await;
            }
            let _ = writer.stop_gracefully().await;
        }
    }

    /// The close path: everything that happens when a socket (or attempt) ends.
    async fn close_connection(&mut self, code: u16, detail: String, close_frame: Option<WsFrame>) {
        let was_connected = matches!(
            self.state,
            WsConnectionState::Connected | WsConnectionState::Closing
        );
        if close_frame.is_some() && self.state == WsConnectionState::Connected {
            self.transition(WsConnectionState::Closing);
        }

        self.heartbeat.stop();
        self.reconnection.cancel();
        self.teardown_io(close_frame).await;

        let reason = WsDisconnectReason::classify(code, self.manual_disconnect);
        self.transition(WsConnectionState::Closed);
        if was_connected {
            self.metrics.record_disconnect();
        }
        info!(
            url = %self.log_url(),
            code,
            reason = ?reason,
            detail = %detail,
            "websocket closed"
        );

        let was_authenticated = self.authenticated;
        self.emit(WsEventData::Disconnected {
            reason,
            code,
            detail,
            was_authenticated,
        });
        self.apply_authenticated(false);

        if !self.manual_disconnect && self.config.auto_reconnect && !self.destroyed {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(&mut self) {
        let epoch = self.epoch;
        let actor_ref = self.actor_ref.clone();
        let plan = self.reconnection.schedule(async move {
            tell_actor(&actor_ref, ReconnectDue { epoch }).await;
        });

        match plan {
            WsReconnectSchedule::Scheduled {
                attempt,
                max_attempts,
                delay,
            } => {
                self.metrics.record_reconnect_attempt();
                self.transition(WsConnectionState::Reconnecting);
                warn!(
                    url = %self.log_url(),
                    attempt,
                    max_attempts,
                    delay_ms = duration_ms(delay),
                    "websocket reconnect scheduled"
                );
                self.emit(WsEventData::ReconnectAttempt {
                    attempt,
                    max_attempts,
                    delay,
                });
            }
            WsReconnectSchedule::Exhausted { attempts } => {
                let err = WebSocketError::ReconnectExhausted {
                    max_attempts: self.reconnection.max_attempts(),
                };
                warn!(url = %self.log_url(), attempts, "websocket reconnect attempts exhausted");
                self.emit_error(&err);
            }
        }
    }

    async fn handle_disconnect(&mut self) {
        if self.destroyed {
            return;
        }
        self.manual_disconnect = true;
        self.reconnection.cancel();
        self.heartbeat.stop();

        match self.state {
            WsConnectionState::Connected => {
                self.close_connection(
                    CLOSE_NORMAL,
                    "client disconnect".to_string(),
                    Some(WsFrame::close(CLOSE_NORMAL, "client disconnect")),
                )
                .await;
            }
            WsConnectionState::Connecting => {
                self.close_connection(CLOSE_NORMAL, "client disconnect".to_string(), None)
                    .await;
            }
            WsConnectionState::Reconnecting => {
                self.epoch += 1;
                info!(url = %self.log_url(), "pending websocket reconnect canceled");
                self.transition(WsConnectionState::Closed);
            }
            WsConnectionState::Closing | WsConnectionState::Closed => {}
        }
    }

    async fn handle_destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.handle_disconnect().await;
        self.destroyed = true;
        self.heartbeat.stop();
        self.reconnection.cancel();
        self.teardown_io(None).await;
        let dropped = self.queue.clear();
        self.events.clear();
        info!(dropped_messages = dropped, "websocket connection destroyed");
    }

    fn is_current(&self, epoch: u64, state: WsConnectionState) -> bool {
        epoch == self.epoch && self.state == state
    }
}

fn writer_unavailable(error: &str) -> WebSocketError {
    WebSocketError::TransportError {
        context: "write",
        error: error.to_string(),
    }
}

async fn tell_actor<T, M>(actor_ref: &WeakActorRef<WebSocketActor<T>>, msg: M)
where
    T: WsTransport,
    M: Send + 'static,
    WebSocketActor<T>: KameoMessage<M>,
{
    if let Some(actor) = actor_ref.upgrade() {
        let _ = actor.tell(msg).send().await;
    }
}

async fn read_loop<T: WsTransport>(
    actor_ref: WeakActorRef<WebSocketActor<T>>,
    mut reader: T::Reader,
    epoch: u64,
) {
    let (code, detail) = loop {
        match reader.next().await {
            Some(Ok(WsFrame::Close(frame))) => {
                break match frame {
                    Some(frame) => (frame.code, frame.reason_lossy()),
                    None => (CLOSE_NO_STATUS, String::new()),
                };
            }
            Some(Ok(frame)) => {
                let Some(actor) = actor_ref.upgrade() else {
                    return;
                };
                if actor.tell(Inbound { epoch, frame }).send().await.is_err() {
                    return;
                }
            }
            Some(Err(err)) => break (CLOSE_ABNORMAL, err.to_string()),
            None => break (CLOSE_ABNORMAL, "stream ended".to_string()),
        }
    };
    tell_actor(&actor_ref, SocketClosed { epoch, code, detail }).await;
}

// Public messages.

/// Open the connection. No-op while connecting or connected.
pub struct Connect;

impl<T: WsTransport> KameoMessage<Connect> for WebSocketActor<T> {
    type Reply = WebSocketResult<()>;

    async fn handle(&mut self, _msg: Connect, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.handle_connect().await
    }
}

/// Close the connection and suppress automatic reconnection.
pub struct Disconnect;

impl<T: WsTransport> KameoMessage<Disconnect> for WebSocketActor<T> {
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        _msg: Disconnect,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.handle_disconnect().await;
        Ok(())
    }
}

pub struct SendCommand {
    pub payload: OpaqueCommand,
    pub options: WsSendOptions,
}

impl<T: WsTransport> KameoMessage<SendCommand> for WebSocketActor<T> {
    type Reply = WebSocketResult<WsSendOutcome>;

    async fn handle(
        &mut self,
        msg: SendCommand,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.handle_send(msg.payload, msg.options).await
    }
}

pub struct Subscribe {
    pub kind: WsEventKind,
    pub listener: WsListener,
    pub once: bool,
}

impl<T: WsTransport> KameoMessage<Subscribe> for WebSocketActor<T> {
    type Reply = WebSocketResult<WsListenerId>;

    async fn handle(
        &mut self,
        msg: Subscribe,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.destroyed {
            return Err(WebSocketError::Destroyed);
        }
        Ok(if msg.once {
            self.events.once(msg.kind, msg.listener)
        } else {
            self.events.on(msg.kind, msg.listener)
        })
    }
}

pub struct Unsubscribe {
    pub kind: WsEventKind,
    pub id: WsListenerId,
}

impl<T: WsTransport> KameoMessage<Unsubscribe> for WebSocketActor<T> {
    type Reply = WebSocketResult<bool>;

    async fn handle(
        &mut self,
        msg: Unsubscribe,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.events.off(msg.kind, msg.id))
    }
}

pub struct SetAuthenticated(pub bool);

impl<T: WsTransport> KameoMessage<SetAuthenticated> for WebSocketActor<T> {
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: SetAuthenticated,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if !self.destroyed {
            self.apply_authenticated(msg.0);
        }
        Ok(())
    }
}

pub struct GetAuthenticated;

impl<T: WsTransport> KameoMessage<GetAuthenticated> for WebSocketActor<T> {
    type Reply = WebSocketResult<bool>;

    async fn handle(
        &mut self,
        _msg: GetAuthenticated,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.authenticated)
    }
}

pub struct GetMetrics;

impl<T: WsTransport> KameoMessage<GetMetrics> for WebSocketActor<T> {
    type Reply = WebSocketResult<WsConnectionMetrics>;

    async fn handle(
        &mut self,
        _msg: GetMetrics,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self
            .metrics
            .snapshot(self.queue.len(), self.reconnection.current_delay()))
    }
}

pub struct GetConnectionState;

impl<T: WsTransport> KameoMessage<GetConnectionState> for WebSocketActor<T> {
    type Reply = WebSocketResult<WsConnectionState>;

    async fn handle(
        &mut self,
        _msg: GetConnectionState,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.state)
    }
}

/// Terminal shutdown: disconnect, drop listeners and queued messages. Idempotent.
pub struct Destroy;

impl<T: WsTransport> KameoMessage<Destroy> for WebSocketActor<T> {
    type Reply = WebSocketResult<()>;

    async fn handle(&mut self, _msg: Destroy, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.handle_destroy().await;
        Ok(())
    }
}

// Internal messages, all tagged with the epoch they were created in.

pub(crate) struct ConnectionEstablished<T: WsTransport> {
    epoch: u64,
    reader: T::Reader,
    writer: T::Writer,
}

impl<T: WsTransport> KameoMessage<ConnectionEstablished<T>> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: ConnectionEstablished<T>,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.handle_established(msg).await;
    }
}

pub(crate) struct ConnectionFailed {
    epoch: u64,
    error: WebSocketError,
}

impl<T: WsTransport> KameoMessage<ConnectionFailed> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: ConnectionFailed,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if !self.is_current(msg.epoch, WsConnectionState::Connecting) {
            return;
        }
        warn!(url = %self.log_url(), error = %msg.error, "websocket connect failed");
        self.metrics.record_error();
        self.close_connection(CLOSE_ABNORMAL, msg.error.to_string(), None)
            .await;
    }
}

pub(crate) struct ConnectTimeout {
    epoch: u64,
}

impl<T: WsTransport> KameoMessage<ConnectTimeout> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: ConnectTimeout,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if !self.is_current(msg.epoch, WsConnectionState::Connecting) {
            return;
        }
        warn!(
            url = %self.log_url(),
            timeout_ms = duration_ms(self.config.connection_timeout),
            "websocket connect timed out"
        );
        self.metrics.record_error();
        self.close_connection(CLOSE_ABNORMAL, "connection timeout".to_string(), None)
            .await;
    }
}

pub(crate) struct Inbound {
    epoch: u64,
    frame: WsFrame,
}

impl<T: WsTransport> KameoMessage<Inbound> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(&mut self, msg: Inbound, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if self.is_current(msg.epoch, WsConnectionState::Connected) {
            self.handle_inbound(msg.frame).await;
        }
    }
}

pub(crate) struct SocketClosed {
    epoch: u64,
    code: u16,
    detail: String,
}

impl<T: WsTransport> KameoMessage<SocketClosed> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: SocketClosed,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.is_current(msg.epoch, WsConnectionState::Connected) {
            self.close_connection(msg.code, msg.detail, None).await;
        }
    }
}

pub(crate) struct HeartbeatTick {
    epoch: u64,
}

impl<T: WsTransport> KameoMessage<HeartbeatTick> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: HeartbeatTick,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.is_current(msg.epoch, WsConnectionState::Connected) {
            self.handle_heartbeat_tick().await;
        }
    }
}

pub(crate) struct HeartbeatTimeout {
    epoch: u64,
    seq: u64,
}

impl<T: WsTransport> KameoMessage<HeartbeatTimeout> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: HeartbeatTimeout,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.is_current(msg.epoch, WsConnectionState::Connected) {
            self.handle_heartbeat_timeout(msg.seq).await;
        }
    }
}

pub(crate) struct ReconnectDue {
    epoch: u64,
}

impl<T: WsTransport> KameoMessage<ReconnectDue> for WebSocketActor<T> {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: ReconnectDue,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.destroyed || !self.is_current(msg.epoch, WsConnectionState::Reconnecting) {
            return;
        }
        if let Err(err) = self.open_socket() {
            warn!(error = %err, "websocket reconnect could not start");
            self.emit_error(&err);
            self.transition(WsConnectionState::Closed);
        }
    }
}
