//! Push surface
//!
//! Each subscriber gets a welcome frame and an all-books snapshot, then a
//! relay of every post-apply broadcast from the registry. Inbound control
//! frames are `ping` and one-shot `subscribe`; everything else is ignored.
//! The subscriber's bounded queue lives in the registry, so a reader that
//! stops draining is removed there without ever touching ingestion.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;
use types::{now_millis, Symbol};

use crate::events::{ClientFrame, PushFrame};
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (subscriber_id, mut frames) = state.registry.subscribe();
    debug!(subscriber_id, "push subscriber connected");

    let welcome = PushFrame::Welcome {
        message: "connected to order book mirror".to_string(),
        timestamp: now_millis(),
    };
    let snapshot = PushFrame::OrderbooksSnapshot {
        data: state.registry.all_snapshots(None),
        timestamp: now_millis(),
    };
    if send_frame(&mut sink, &welcome).await.is_err()
        || send_frame(&mut sink, &snapshot).await.is_err()
    {
        state.registry.unsubscribe(subscriber_id);
        return;
    }

    loop {
        tokio::select! {
            frame = frames.recv() => {
                // None: the registry dropped this subscriber's queue.
                let Some(frame) = frame else { break };
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if handle_client_frame(&state, &mut sink, text.as_str()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.registry.unsubscribe(subscriber_id);
    debug!(subscriber_id, "push subscriber disconnected");
}

async fn handle_client_frame(
    state: &AppState,
    sink: &mut SplitSink<WebSocket, Message>,
    text: &str,
) -> Result<(), axum::Error> {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Ping) => {
            send_frame(
                sink,
                &PushFrame::Pong {
                    timestamp: now_millis(),
                },
            )
            .await
        }
        Ok(ClientFrame::Subscribe { symbol }) => {
            let symbol = Symbol::new(&symbol);
            match state.registry.snapshot(&symbol, None) {
                Some(data) => {
                    send_frame(
                        sink,
                        &PushFrame::OrderbookUpdate {
                            symbol,
                            data,
                            timestamp: now_millis(),
                        },
                    )
                    .await
                }
                None => {
                    debug!(symbol = %symbol, "subscribe request for unknown symbol");
                    Ok(())
                }
            }
        }
        Err(_) => {
            debug!("ignoring unrecognized client frame");
            Ok(())
        }
    }
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &PushFrame,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sink.send(Message::Text(payload.into())).await
}
