//! Push transport: the connection the channel reads events from.

use std::future::Future;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::COOKIE};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument};
use url::Url;

use crate::api::BackendClient;
use crate::error::ChannelError;

/// Opens push connections.
pub trait PushTransport: Send + Sync {
    type Connection: PushConnection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, ChannelError>> + Send;
}

/// An open push connection.
pub trait PushConnection: Send {
    /// Next text message; `None` once the server has closed the connection.
    fn next_message(
        &mut self,
    ) -> impl Future<Output = Option<Result<String, ChannelError>>> + Send;

    /// Close the connection. Consumes it, so it runs at most once.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// WebSocket transport authenticated with the backend session cookie.
#[derive(Clone)]
pub struct WebSocketTransport {
    url: Url,
    backend: BackendClient,
}

impl WebSocketTransport {
    /// `backend` supplies the session cookie at connect time.
    #[must_use]
    pub const fn new(url: Url, backend: BackendClient) -> Self {
        Self { url, backend }
    }
}

impl PushTransport for WebSocketTransport {
    type Connection = WebSocketConnection;

    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&self) -> Result<WebSocketConnection, ChannelError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| ChannelError::InvalidRequest(e.to_string()))?;

        if let Some(cookie) = self.backend.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ChannelError::InvalidRequest(e.to_string()))?;
            request.headers_mut().insert(COOKIE, value);
        }

        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        debug!(status = response.status().as_u16(), "WebSocket upgraded");

        Ok(WebSocketConnection { stream })
    }
}

pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PushConnection for WebSocketConnection {
    async fn next_message(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Ignoring non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Server closed the push connection");
                    return None;
                }
                // Pings are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Push connection close did not complete cleanly");
        }
    }
}
