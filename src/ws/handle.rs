use std::sync::Arc;

use kameo::error::SendError;
use kameo::prelude::{Actor, ActorRef};

use crate::core::{
    OpaqueCommand, WebSocketError, WebSocketResult, WsClientConfig, WsConnectionMetrics,
    WsConnectionState, WsEvent, WsEventKind, WsListenerId, WsSendOptions, WsSendOutcome,
};
use crate::transport::{TungsteniteTransport, WsTransport};

use super::actor::{
    Connect, Destroy, Disconnect, GetAuthenticated, GetConnectionState, GetMetrics, SendCommand,
    SetAuthenticated, Subscribe, Unsubscribe, WebSocketActor, WebSocketActorArgs,
};

fn ask_error<M>(err: SendError<M, WebSocketError>) -> WebSocketError {
    match err {
        SendError::HandlerError(err) => err,
        SendError::Timeout(_) => WebSocketError::Timeout {
            context: "connection actor reply".to_string(),
        },
        SendError::ActorStopped => WebSocketError::ActorError("connection actor stopped".to_string()),
        SendError::ActorNotRunning(_) | SendError::MailboxFull(_) => {
            WebSocketError::ActorError("connection actor unavailable".to_string())
        }
    }
}

/// Cloneable handle to a running connection actor.
///
/// Every method resolves once the actor has handled the call; none of them wait on the
/// network beyond handing a frame to the socket writer.
pub struct WsConnection<T: WsTransport = TungsteniteTransport> {
    actor: ActorRef<WebSocketActor<T>>,
}

impl<T: WsTransport> Clone for WsConnection<T> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
        }
    }
}

impl WsConnection<TungsteniteTransport> {
    pub fn spawn(config: WsClientConfig) -> Self {
        Self::spawn_with_transport(config, TungsteniteTransport::default())
    }
}

impl<T: WsTransport> WsConnection<T> {
    pub fn spawn_with_transport(config: WsClientConfig, transport: T) -> Self {
        let actor = WebSocketActor::spawn(WebSocketActorArgs { config, transport });
        Self { actor }
    }

    pub fn actor_ref(&self) -> &ActorRef<WebSocketActor<T>> {
        &self.actor
    }

    pub async fn connect(&self) -> WebSocketResult<()> {
        self.actor.ask(Connect).await.map_err(ask_error)
    }

    pub async fn disconnect(&self) -> WebSocketResult<()> {
        self.actor.ask(Disconnect).await.map_err(ask_error)
    }

    pub async fn send(
        &self,
        payload: OpaqueCommand,
        options: WsSendOptions,
    ) -> WebSocketResult<WsSendOutcome> {
        self.actor
            .ask(SendCommand { payload, options })
            .await
            .map_err(ask_error)
    }

    pub async fn on(
        &self,
        kind: WsEventKind,
        listener: impl Fn(&WsEvent) + Send + Sync + 'static,
    ) -> WebSocketResult<WsListenerId> {
        self.subscribe(kind, listener, false).await
    }

    pub async fn once(
        &self,
        kind: WsEventKind,
        listener: impl Fn(&WsEvent) + Send + Sync + 'static,
    ) -> WebSocketResult<WsListenerId> {
        self.subscribe(kind, listener, true).await
    }

    pub async fn off(&self, kind: WsEventKind, id: WsListenerId) -> WebSocketResult<bool> {
        self.actor
            .ask(Unsubscribe { kind, id })
            .await
            .map_err(ask_error)
    }

    pub async fn set_authenticated(&self, authenticated: bool) -> WebSocketResult<()> {
        self.actor
            .ask(SetAuthenticated(authenticated))
            .await
            .map_err(ask_error)
    }

    pub async fn is_authenticated(&self) -> WebSocketResult<bool> {
        self.actor.ask(GetAuthenticated).await.map_err(ask_error)
    }

    pub async fn metrics(&self) -> WebSocketResult<WsConnectionMetrics> {
        self.actor.ask(GetMetrics).await.map_err(ask_error)
    }

    pub async fn state(&self) -> WebSocketResult<WsConnectionState> {
        self.actor.ask(GetConnectionState).await.map_err(ask_error)
    }

    pub async fn destroy(&self) -> WebSocketResult<()> {
        self.actor.ask(Destroy).await.map_err(ask_error)
    }

    async fn subscribe(
        &self,
        kind: WsEventKind,
        listener: impl Fn(&WsEvent) + Send + Sync + 'static,
        once: bool,
    ) -> WebSocketResult<WsListenerId> {
        self.actor
            .ask(Subscribe {
                kind,
                listener: Arc::new(listener),
                once,
            })
            .await
            .map_err(ask_error)
    }
}
