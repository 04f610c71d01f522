//! WebSocket implementation of the device channel, on synchronous
//! `tungstenite` with the TCP stream switched to non-blocking so inbound
//! polling never stalls the editor loop.

use std::net::TcpStream;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error::{GlowgridError, GlowgridResult};
use crate::transport::{Channel, Connector};

pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// `url` is the device's WebSocket endpoint, e.g. `ws://matrix.local/ws`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Channel = WsChannel;

    fn connect(&mut self) -> GlowgridResult<WsChannel> {
        let (socket, _response) = tungstenite::connect(self.url.as_str())
            .map_err(|e| GlowgridError::transport(format!("connect '{}': {e}", self.url)))?;

        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            let _ = stream.set_nonblocking(true);
        }

        Ok(WsChannel { socket })
    }
}

pub struct WsChannel {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl Channel for WsChannel {
    fn send_binary(&mut self, payload: &[u8]) -> GlowgridResult<()> {
        self.socket
            .send(Message::Binary(payload.to_vec()))
            .map_err(|e| GlowgridError::transport(format!("send binary: {e}")))
    }

    fn send_text(&mut self, payload: &str) -> GlowgridResult<()> {
        self.socket
            .send(Message::Text(payload.to_string()))
            .map_err(|e| GlowgridError::transport(format!("send text: {e}")))
    }

    fn poll_inbound(&mut self) -> GlowgridResult<Option<String>> {
        loop {
            match self.socket.read() {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Ping(payload)) => {
                    self.socket
                        .send(Message::Pong(payload))
                        .map_err(|e| GlowgridError::transport(format!("send pong: {e}")))?;
                }
                // The device only talks JSON text downstream.
                Ok(Message::Binary(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(_)) => {
                    return Err(GlowgridError::transport("closed by peer"));
                }
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(GlowgridError::transport(format!("read: {e}")));
                }
            }
        }
    }

    fn close(&mut self) {
        let _ = self.socket.close(None);
    }
}
