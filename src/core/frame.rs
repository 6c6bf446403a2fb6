use bytes::Bytes;

/// Transport-neutral websocket frame type.
///
/// Transports convert their native frame representation into/from `WsFrame`, so the
/// connection actor never sees tungstenite types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsFrame {
    Text(Bytes),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(Option<WsCloseFrame>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsCloseFrame {
    pub code: u16,
    pub reason: Bytes,
}

impl WsCloseFrame {
    pub fn reason_lossy(&self) -> String {
        String::from_utf8_lossy(self.reason.as_ref()).into_owned()
    }
}

impl WsFrame {
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(Bytes::from(text.into()))
    }

    #[inline]
    pub fn text_static(s: &'static str) -> Self {
        Self::Text(Bytes::from_static(s.as_bytes()))
    }

    #[inline]
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Self::Close(Some(WsCloseFrame {
            code,
            reason: Bytes::from(reason.into()),
        }))
    }

    /// Payload of a data frame (text or binary); control frames yield `None`.
    #[inline]
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            WsFrame::Text(bytes) | WsFrame::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_only_exposed_for_text_and_binary() {
        assert_eq!(
            WsFrame::text("{}").data().map(|b| b.as_ref()),
            Some(b"{}".as_ref())
        );
        assert!(WsFrame::Ping(Bytes::new()).data().is_none());
        assert!(WsFrame::close(1000, "bye").data().is_none());
    }

    #[test]
    fn close_reason_is_decoded_lossily() {
        let WsFrame::Close(Some(frame)) = WsFrame::close(1001, "going away") else {
            panic!("expected close frame");
        };
        assert_eq!(frame.code, 1001);
        assert_eq!(frame.reason_lossy(), "going away");
    }
}
