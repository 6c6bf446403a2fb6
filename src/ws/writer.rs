use futures_util::{Sink, SinkExt};
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage, WeakActorRef};
use tracing::debug;

use crate::core::{WebSocketError, WebSocketResult, WsFrame};

/// Writer actor that owns the transport sink and serializes writes.
///
/// Asked writes get the sink error back. A failed told write (the closing frame) stops the
/// actor; the reader side reports the broken socket.
pub struct WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Unpin + 'static,
{
    writer: W,
}

impl<W> WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Unpin + 'static,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> Actor for WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Unpin + 'static,
{
    type Args = Self;
    type Error = WebSocketError;

    async fn on_start(args: Self::Args, _ctx: ActorRef<Self>) -> Result<Self, Self::Error> {
        Ok(args)
    }

    async fn on_stop(
        &mut self,
        _ctx: WeakActorRef<Self>,
        _reason: kameo::error::ActorStopReason,
    ) -> Result<(), Self::Error> {
        let _ = self.writer.close().await;
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
            tracing::warn!(error = ?err, "websocket writer stopped");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

pub struct WriterWrite {
    pub frame: WsFrame,
}

impl<W> KameoMessage<WriterWrite> for WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Unpin + 'static,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: WriterWrite,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        debug!(target: "game-ws-writer", "sending websocket frame to wire");
        self.writer.send(msg.frame).await
    }
}
