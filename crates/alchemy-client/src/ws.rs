//! WebSocket subscriptions
//!
//! One connection per subscription. `eth_subscribe` is confirmed before the
//! handle is returned; a reader task then forwards `eth_subscription`
//! notifications until cancelled or the server closes the stream.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::api::{CancelHandle, EventCallback, SubscriptionApi, SubscriptionRequest};
use crate::client::AlchemyClient;
use crate::error::{ClientError, Result};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIBE_ID: u64 = 1;
const UNSUBSCRIBE_ID: u64 = 2;

/// Wait for the reply to `eth_subscribe` and return the server-side id
async fn await_confirmation(socket: &mut Socket) -> Result<String> {
    while let Some(frame) = socket.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let reply: Value = serde_json::from_str(&text)?;
        if reply.get("id").and_then(Value::as_u64) != Some(SUBSCRIBE_ID) {
            continue;
        }
        if let Some(error) = reply.get("error") {
            return Err(ClientError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("subscription rejected")
                    .to_string(),
            });
        }
        return reply
            .get("result")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse("eth_subscribe: missing id".into()));
    }
    Err(ClientError::SubscriptionClosed)
}

/// Extract the payload of an `eth_subscription` notification for `server_id`
fn notification_payload(text: &str, server_id: &str) -> Option<Value> {
    let message: Value = serde_json::from_str(text).ok()?;
    if message.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        return None;
    }
    let params = message.get("params")?;
    if params.get("subscription").and_then(Value::as_str) != Some(server_id) {
        return None;
    }
    params.get("result").cloned()
}

async fn pump(
    mut socket: Socket,
    server_id: String,
    on_event: EventCallback,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut stop => {
                let unsubscribe = json!({
                    "jsonrpc": "2.0",
                    "id": UNSUBSCRIBE_ID,
                    "method": "eth_unsubscribe",
                    "params": [server_id],
                });
                if let Err(e) = socket.send(Message::Text(unsubscribe.to_string())).await {
                    debug!("eth_unsubscribe for {} not delivered: {}", server_id, e);
                }
                if let Err(e) = socket.close(None).await {
                    debug!("Closing subscription socket {} failed: {}", server_id, e);
                }
                info!("Subscription {} cancelled", server_id);
                break;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(payload) = notification_payload(&text, &server_id) {
                        on_event(payload);
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Subscription {} closed by server", server_id);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Subscription {} stream error: {}", server_id, e);
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl SubscriptionApi for AlchemyClient {
    async fn subscribe(
        &self,
        request: SubscriptionRequest,
        on_event: EventCallback,
    ) -> Result<CancelHandle> {
        let (mut socket, _) = connect_async(self.ws_url()).await?;

        let subscribe = json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_ID,
            "method": "eth_subscribe",
            "params": request.to_params(),
        });
        socket.send(Message::Text(subscribe.to_string())).await?;
        let server_id = await_confirmation(&mut socket).await?;
        debug!("eth_subscribe confirmed: {}", server_id);

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(pump(socket, server_id, on_event, stop_rx));

        Ok(CancelHandle::new(move || {
            stop_tx.send(()).map_err(|_| ClientError::SubscriptionClosed)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_payload_matches_subscription() {
        let text = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x9ce5","result":{"number":"0x1b4"}}}"#;
        assert_eq!(
            notification_payload(text, "0x9ce5"),
            Some(json!({ "number": "0x1b4" }))
        );
        assert_eq!(notification_payload(text, "0xother"), None);
    }

    #[test]
    fn test_notification_payload_ignores_replies() {
        let text = r#"{"jsonrpc":"2.0","id":2,"result":true}"#;
        assert_eq!(notification_payload(text, "0x9ce5"), None);
        assert_eq!(notification_payload("not json", "0x9ce5"), None);
    }
}
