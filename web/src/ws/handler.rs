use crate::params::connection::ConnectParams;
use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{future, SinkExt, StreamExt};
use hub::{Frame, HubHandle, Session};
use log::*;

/// Upgrades the request and hands the socket to a hub session.
#[utoipa::path(
    get,
    path = "/ws",
    params(ConnectParams),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol"),
        (status = 400, description = "Not a WebSocket upgrade request"),
    )
)]
pub(crate) async fn connect(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(app_state): State<AppState>,
) -> Response {
    debug!(
        "WebSocket upgrade for user \"{}\" in group \"{}\"",
        params.user, params.group
    );

    let hub = app_state.hub.clone();
    ws.on_upgrade(move |socket| serve(socket, hub, params))
}

async fn serve(socket: WebSocket, hub: HubHandle, params: ConnectParams) {
    let transport = socket
        .with(|frame: Frame| future::ready(Ok::<_, axum::Error>(into_message(frame))))
        .map(|message| message.map(into_frame));

    match Session::connect(hub, params.user, params.group, transport).await {
        Ok(session) => session.run().await,
        Err(e) => warn!("Could not register WebSocket connection: {e}"),
    }
}

fn into_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(_) => Frame::Close,
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_frames_translate_both_ways() {
        assert_eq!(into_frame(Message::Close(None)), Frame::Close);
        assert!(matches!(into_message(Frame::Close), Message::Close(None)));
    }

    #[test]
    fn text_and_pings_keep_their_payload() {
        assert_eq!(
            into_frame(Message::Text("to:abc:hi".to_string())),
            Frame::Text("to:abc:hi".to_string())
        );
        assert_eq!(into_frame(Message::Pong(vec![1])), Frame::Pong(vec![1]));
        assert!(matches!(into_message(Frame::Ping(Vec::new())), Message::Ping(p) if p.is_empty()));
    }
}
