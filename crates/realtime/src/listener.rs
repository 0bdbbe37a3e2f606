use std::time::Duration;

use eyre::Result;
use futures::StreamExt;
use tokio::{task::JoinHandle, time::sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{channel::PushChannel, event::PushEvent};

/// Upper bound for the reconnect backoff.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// WebSocket listener that feeds a [`PushChannel`].
///
/// Owns the socket: parses `{ "event": <name>, "payload": { ... } }` text
/// frames, dispatches them by name, and reconnects with exponential backoff
/// when the connection drops. Frames that fail to parse are dropped.
#[derive(Debug)]
pub struct PushListener {
    ws_url: Url,
    channel: PushChannel,
    reconnect_delay: Duration,
}

impl PushListener {
    /// Create a listener for `ws_url` feeding `channel`.
    pub fn new(ws_url: Url, channel: PushChannel) -> Self {
        Self { ws_url, channel, reconnect_delay: Duration::from_secs(1) }
    }

    /// Override the initial reconnect delay.
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Run the listener until the task is aborted.
    pub async fn run(self) -> Result<()> {
        let mut delay = self.reconnect_delay;
        loop {
            match connect_async(self.ws_url.as_str()).await {
                Ok((mut ws, _response)) => {
                    info!(url = %self.ws_url, "connected to push channel");
                    delay = self.reconnect_delay;
                    while let Some(frame) = ws.next().await {
                        match frame {
                            Ok(Message::Text(text)) => self.dispatch(text.as_str()),
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "push channel read failed");
                                break;
                            }
                        }
                    }
                    warn!(url = %self.ws_url, "push channel disconnected, reconnecting");
                }
                Err(e) => {
                    error!(url = %self.ws_url, error = %e, "failed to connect to push channel");
                }
            }
            sleep(delay).await;
            delay = (delay * 2).min(MAX_RECONNECT_DELAY);
        }
    }

    /// Spawns the listener on the Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!(%e, "push listener exited unexpectedly");
            }
        })
    }

    fn dispatch(&self, frame: &str) {
        match serde_json::from_str::<PushEvent>(frame) {
            Ok(event) => self.channel.emit(&event),
            Err(e) => debug!(error = %e, "ignoring unparseable push frame"),
        }
    }
}
