//! # Live sync — realtime websocket subscription for the bookmarks table
//!
//! The backend pushes row changes over a Phoenix-style websocket channel.
//! [`subscribe`] connects, joins `realtime:bookmarks` for `postgres_changes` on
//! `public.bookmarks`, waits for the join to be acknowledged and then hands the
//! socket to a background task that:
//!
//! - forwards `INSERT` rows to [`ChangeHandler::on_insert`] and `DELETE` ids to
//!   [`ChangeHandler::on_delete`], in arrival order;
//! - sends a heartbeat every [`HEARTBEAT_INTERVAL`];
//! - on shutdown, sends `phx_leave` and closes the socket.
//!
//! The task lives at most as long as its [`Subscription`]. Calling
//! [`Subscription::unsubscribe`] waits for the leave to be sent; dropping the
//! handle signals the same shutdown without waiting. When the channel ends for
//! any reason (shutdown, server close, failed heartbeat, read error) the
//! handler's [`on_close`](ChangeHandler::on_close) runs once.
//!
//! ## Wire messages
//!
//! ```text
//! → {"topic":"realtime:bookmarks","event":"phx_join","payload":{config, access_token},"ref":"1","join_ref":"1"}
//! ← {"topic":"realtime:bookmarks","event":"phx_reply","payload":{"status":"ok",…},"ref":"1"}
//! ← {"topic":"realtime:bookmarks","event":"postgres_changes","payload":{"data":{"type":"INSERT","record":{…}}}}
//! ← {"topic":"realtime:bookmarks","event":"postgres_changes","payload":{"data":{"type":"DELETE","old_record":{"id":…}}}}
//! → {"topic":"phoenix","event":"heartbeat","payload":{},"ref":"<n>"}
//! → {"topic":"realtime:bookmarks","event":"phx_leave","payload":{},"ref":"<n>","join_ref":"1"}
//! ```

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use store::{Bookmark, LiveChange};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::client::BackendClient;
use crate::config::BackendConfig;
use crate::error::{ApiError, Result};

pub const TOPIC: &str = "realtime:bookmarks";
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
const LEAVE_TIMEOUT: Duration = Duration::from_secs(5);
const JOIN_REF: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Receiver of live bookmark changes.
///
/// Called from the subscription's background task, one change at a time.
pub trait ChangeHandler: Send + Sync + 'static {
    fn on_insert(&self, bookmark: Bookmark);
    fn on_delete(&self, id: String);

    /// The channel is gone and no further changes will arrive.
    fn on_close(&self) {}
}

/// A [`ChangeHandler`] made of two closures.
pub struct Callbacks<I, D> {
    on_insert: I,
    on_delete: D,
}

pub fn callbacks<I, D>(on_insert: I, on_delete: D) -> Callbacks<I, D>
where
    I: Fn(Bookmark) + Send + Sync + 'static,
    D: Fn(String) + Send + Sync + 'static,
{
    Callbacks {
        on_insert,
        on_delete,
    }
}

impl<I, D> ChangeHandler for Callbacks<I, D>
where
    I: Fn(Bookmark) + Send + Sync + 'static,
    D: Fn(String) + Send + Sync + 'static,
{
    fn on_insert(&self, bookmark: Bookmark) {
        (self.on_insert)(bookmark)
    }

    fn on_delete(&self, id: String) {
        (self.on_delete)(id)
    }
}

/// `ws(s)://<backend>/realtime/v1/websocket?apikey=<key>&vsn=1.0.0`
pub fn websocket_url(config: &BackendConfig) -> Result<Url> {
    let mut url = config.endpoint("realtime/v1/websocket")?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| ApiError::InvalidConfiguration(format!("cannot use {scheme} for {url}")))?;
    url.query_pairs_mut()
        .append_pair("apikey", config.anon_key())
        .append_pair("vsn", "1.0.0");
    Ok(url)
}

fn join_message(access_token: &str) -> Value {
    json!({
        "topic": TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": "bookmarks" }
                ]
            },
            "access_token": access_token
        },
        "ref": JOIN_REF,
        "join_ref": JOIN_REF
    })
}

fn heartbeat_message(msg_ref: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string()
    })
}

fn leave_message(msg_ref: u64) -> Value {
    json!({
        "topic": TOPIC,
        "event": "phx_leave",
        "payload": {},
        "ref": msg_ref.to_string(),
        "join_ref": JOIN_REF
    })
}

fn text(value: &Value) -> Message {
    Message::Text(value.to_string().into())
}

/// Decode a `postgres_changes` frame into a [`LiveChange`]. Other frames and
/// change types we do not track yield `None`.
pub fn parse_change(frame: &str) -> Option<LiveChange> {
    let value: Value = serde_json::from_str(frame).ok()?;
    if value["event"] != "postgres_changes" {
        return None;
    }

    let data = &value["payload"]["data"];
    match data["type"].as_str()? {
        "INSERT" => match serde_json::from_value::<Bookmark>(data["record"].clone()) {
            Ok(bookmark) => Some(LiveChange::Insert(bookmark)),
            Err(e) => {
                tracing::warn!("Ignoring malformed INSERT record: {}", e);
                None
            }
        },
        "DELETE" => {
            let id = match &data["old_record"]["id"] {
                Value::String(id) => id.clone(),
                Value::Number(id) => id.to_string(),
                _ => return None,
            };
            Some(LiveChange::Delete { id })
        }
        _ => None,
    }
}

/// Open the live channel and start delivering changes to `handler`.
///
/// Fails with [`ApiError::Realtime`] when the socket cannot be opened or the
/// join is refused. Connecting and joining together are bounded by
/// [`OPEN_TIMEOUT`].
pub async fn subscribe<H: ChangeHandler>(
    backend: &BackendClient,
    access_token: Option<&str>,
    handler: H,
) -> Result<Subscription> {
    let url = websocket_url(backend.config())?;
    let token = access_token.unwrap_or(backend.config().anon_key());

    let socket = tokio::time::timeout(OPEN_TIMEOUT, open_channel(&url, token))
        .await
        .map_err(|_| ApiError::Realtime("channel did not open in time".to_string()))??;
    tracing::debug!("Joined {}", TOPIC);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run_channel(socket, shutdown_rx, handler));

    Ok(Subscription {
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

async fn open_channel(url: &Url, token: &str) -> Result<Socket> {
    let (mut socket, _) = connect_async(url.as_str())
        .await
        .map_err(|e| ApiError::Realtime(format!("connect failed: {e}")))?;

    socket
        .send(text(&join_message(token)))
        .await
        .map_err(|e| ApiError::Realtime(format!("join failed: {e}")))?;

    await_join_reply(&mut socket).await?;
    Ok(socket)
}

async fn await_join_reply(socket: &mut Socket) -> Result<()> {
    while let Some(message) = socket.next().await {
        let message = message.map_err(|e| ApiError::Realtime(e.to_string()))?;
        let Message::Text(frame) = message else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(frame.as_str()) else {
            continue;
        };
        if value["event"] != "phx_reply" || value["ref"] != JOIN_REF {
            continue;
        }

        return match value["payload"]["status"].as_str() {
            Some("ok") => Ok(()),
            _ => Err(ApiError::Realtime(format!(
                "join refused: {}",
                value["payload"]["response"]
            ))),
        };
    }
    Err(ApiError::Realtime("socket closed before join reply".to_string()))
}

async fn run_channel<H: ChangeHandler>(
    socket: Socket,
    mut shutdown: oneshot::Receiver<()>,
    handler: H,
) {
    let (mut write, mut read) = socket.split();
    let mut heartbeat = tokio::time::interval_at(
        tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    );
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = write.send(text(&leave_message(next_ref))).await {
                    tracing::debug!("Could not send leave: {}", e);
                }
                let _ = write.close().await;
                break;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = write.send(text(&heartbeat_message(next_ref))).await {
                    tracing::warn!("Live channel heartbeat failed: {}", e);
                    break;
                }
                next_ref += 1;
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(frame))) => match parse_change(frame.as_str()) {
                    Some(LiveChange::Insert(bookmark)) => handler.on_insert(bookmark),
                    Some(LiveChange::Delete { id }) => handler.on_delete(id),
                    None => {
                        if frame.as_str().contains("\"phx_error\"") {
                            tracing::warn!("Live channel error: {}", frame.as_str());
                        }
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Live channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Live channel read failed: {}", e);
                    break;
                }
            },
        }
    }

    handler.on_close();
}

/// Handle to an open live channel.
pub struct Subscription {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Whether the channel task is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Leave the channel and close the socket.
    pub async fn unsubscribe(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(LEAVE_TIMEOUT, &mut task).await.is_err() {
                task.abort();
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_frame, realtime_backend};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::accept_async;

    struct CloseSignal(mpsc::UnboundedSender<()>);

    impl ChangeHandler for CloseSignal {
        fn on_insert(&self, _bookmark: Bookmark) {}

        fn on_delete(&self, _id: String) {}

        fn on_close(&self) {
            let _ = self.0.send(());
        }
    }

    fn delete_frame(id: &str) -> String {
        json!({
            "topic": TOPIC,
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "schema": "public",
                    "table": "bookmarks",
                    "type": "DELETE",
                    "old_record": { "id": id }
                }
            },
            "ref": null
        })
        .to_string()
    }

    #[test]
    fn test_websocket_url() {
        let config = BackendConfig::new("https://abcd.supabase.co", "anon").unwrap();
        assert_eq!(
            websocket_url(&config).unwrap().as_str(),
            "wss://abcd.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );

        let config = BackendConfig::new("http://localhost:54321", "anon").unwrap();
        assert!(websocket_url(&config).unwrap().as_str().starts_with("ws://localhost:54321/"));
    }

    #[test]
    fn test_parse_change() {
        match parse_change(&insert_frame("b1")) {
            Some(LiveChange::Insert(bookmark)) => assert_eq!(bookmark.id, "b1"),
            other => panic!("unexpected change: {other:?}"),
        }
        assert_eq!(
            parse_change(&delete_frame("b1")),
            Some(LiveChange::Delete { id: "b1".to_string() })
        );

        let reply = json!({"topic": TOPIC, "event": "phx_reply", "payload": {"status": "ok"}, "ref": "1"});
        assert!(parse_change(&reply.to_string()).is_none());
        assert!(parse_change("not json").is_none());
    }

    #[tokio::test]
    async fn test_subscribe_delivers_changes_and_leaves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let join: Value = match ws.next().await.unwrap().unwrap() {
                Message::Text(frame) => serde_json::from_str(frame.as_str()).unwrap(),
                other => panic!("expected join, got {other:?}"),
            };
            assert_eq!(join["event"], "phx_join");
            assert_eq!(join["topic"], TOPIC);
            assert_eq!(join["payload"]["access_token"], "access-user-1");
            assert_eq!(join["payload"]["config"]["postgres_changes"][0]["table"], "bookmarks");

            let reply = json!({
                "topic": TOPIC,
                "event": "phx_reply",
                "payload": {"status": "ok", "response": {"postgres_changes": []}},
                "ref": "1"
            });
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            ws.send(Message::Text(insert_frame("b1").into())).await.unwrap();
            ws.send(Message::Text(delete_frame("b1").into())).await.unwrap();

            // Wait for the client to leave
            while let Some(Ok(message)) = ws.next().await {
                if let Message::Text(frame) = message {
                    let value: Value = serde_json::from_str(frame.as_str()).unwrap();
                    if value["event"] == "phx_leave" {
                        return true;
                    }
                }
            }
            false
        });

        let config = BackendConfig::new(&format!("http://{addr}"), "anon-key").unwrap();
        let backend = Arc::new(BackendClient::new(config).unwrap());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let delete_tx = tx.clone();
        let handler = callbacks(
            move |bookmark| {
                let _ = tx.send(LiveChange::Insert(bookmark));
            },
            move |id| {
                let _ = delete_tx.send(LiveChange::Delete { id });
            },
        );

        let subscription = subscribe(&backend, Some("access-user-1"), handler).await.unwrap();
        assert!(subscription.is_active());

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert!(matches!(first, Some(LiveChange::Insert(ref b)) if b.id == "b1"));
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(second, Some(LiveChange::Delete { id: "b1".to_string() }));

        subscription.unsubscribe().await;
        assert!(server.await.unwrap());
    }

    #[tokio::test]
    async fn test_refused_join_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _join = ws.next().await;
            let reply = json!({
                "topic": TOPIC,
                "event": "phx_reply",
                "payload": {"status": "error", "response": {"reason": "unauthorized"}},
                "ref": "1"
            });
            let _ = ws.send(Message::Text(reply.to_string().into())).await;
        });

        let config = BackendConfig::new(&format!("http://{addr}"), "anon-key").unwrap();
        let backend = BackendClient::new(config).unwrap();
        let handler = callbacks(|_| {}, |_| {});

        match subscribe(&backend, None, handler).await {
            Err(ApiError::Realtime(reason)) => assert!(reason.contains("unauthorized")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("join should have been refused"),
        }
    }

    #[tokio::test]
    async fn test_server_close_ends_subscription() {
        let backend = realtime_backend(vec![], true).await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let subscription = subscribe(&backend, Some("access-user-1"), CloseSignal(tx))
            .await
            .unwrap();

        let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(closed, Some(()));

        tokio::time::timeout(Duration::from_secs(5), async {
            while subscription.is_active() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_times_out_when_backend_never_answers() {
        // Connections queue in the backlog but are never accepted
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = BackendConfig::new(&format!("http://{addr}"), "anon-key").unwrap();
        let backend = BackendClient::new(config).unwrap();

        match subscribe(&backend, None, callbacks(|_| {}, |_| {})).await {
            Err(ApiError::Realtime(reason)) => assert!(reason.contains("in time")),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("channel should not have opened"),
        }
        drop(listener);
    }
}
