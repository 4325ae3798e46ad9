//! End-to-end tests over a real listener: WebSocket chat, handshake
//! authentication, and REST-triggered notification fan-out.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pitchline_auth::AuthConfig;
use pitchline_core::{Identity, Position};
use pitchline_server::{AppConfig, PitchlineServer, ServerConfig};
use pitchline_store::{
    IdentityRepo, NewIdentity, NewOrganization, OrganizationRepo, SubscriptionRepo,
};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> PitchlineServer {
    let config = AppConfig {
        server: ServerConfig::default(),
        auth: AuthConfig {
            secret: "e2e-secret".into(),
            ..AuthConfig::default()
        },
        database: pitchline_server::DatabaseConfig::default(),
    };
    PitchlineServer::start(&config).await.expect("server starts")
}

fn make_identity(server: &PitchlineServer, email: &str) -> Identity {
    let conn = server.state().pool.get().unwrap();
    IdentityRepo::create(
        &conn,
        &NewIdentity {
            email: email.into(),
            password: "pw".into(),
            first_name: "Test".into(),
            surname: "User".into(),
            phone_number: "-".into(),
        },
    )
    .unwrap()
}

async fn connect(server: &PitchlineServer, token: Option<&str>) -> WsStream {
    let url = format!("ws://127.0.0.1:{}/ws", server.port());
    let mut request = url.into_client_request().unwrap();
    if let Some(token) = token {
        let _ = request.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().unwrap(),
        );
    }
    let (stream, _) = connect_async(request).await.expect("handshake completes");
    stream
}

async fn send_frame(ws: &mut WsStream, frame: &Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("frame sent");
}

/// Read frames until the next text frame, skipping pings.
async fn next_json(ws: &mut WsStream) -> Value {
    let deadline = Duration::from_secs(5);
    loop {
        let msg = tokio::time::timeout(deadline, ws.next())
            .await
            .expect("frame within deadline")
            .expect("stream open")
            .expect("frame ok");
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn expect_silence(ws: &mut WsStream) {
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    match result {
        Err(_) => {}
        Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
        Ok(other) => panic!("expected no frame, got {other:?}"),
    }
}

#[tokio::test]
async fn handshake_without_credential_is_anonymous_not_rejected() {
    let server = start_server().await;
    let mut ws = connect(&server, None).await;

    send_frame(
        &mut ws,
        &json!({"id": "r1", "method": "thread.list", "params": {"peerId": 1}}),
    )
    .await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["error"]["code"], "UNAUTHENTICATED");

    // The connection survives the rejected operation
    send_frame(&mut ws, &json!({"id": "r2", "method": "no.such"})).await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["id"], "r2");

    server.shutdown().await;
}

#[tokio::test]
async fn handshake_with_garbage_token_degrades_to_anonymous() {
    let server = start_server().await;
    let mut ws = connect(&server, Some("not.a.token")).await;

    send_frame(
        &mut ws,
        &json!({"id": "r1", "method": "message.send", "params": {"recipientId": 1, "body": "hi"}}),
    )
    .await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["error"]["code"], "UNAUTHENTICATED");

    server.shutdown().await;
}

#[tokio::test]
async fn chat_roundtrip_pushes_to_recipient() {
    let server = start_server().await;
    let alice = make_identity(&server, "alice@example.com");
    let bob = make_identity(&server, "bob@example.com");
    let tokens = &server.state().tokens;

    let mut alice_ws =
        connect(&server, Some(&tokens.issue_access(&alice).unwrap())).await;
    let mut bob_ws = connect(&server, Some(&tokens.issue_access(&bob).unwrap())).await;

    send_frame(
        &mut alice_ws,
        &json!({
            "id": "send-1",
            "method": "message.send",
            "params": {"recipientId": bob.id.get(), "body": "hi bob"}
        }),
    )
    .await;

    let resp = next_json(&mut alice_ws).await;
    assert_eq!(resp["success"], true, "send failed: {resp}");
    let message_id = resp["result"]["message"]["messageId"].as_str().unwrap();

    // Bob's live connection gets the push
    let event = next_json(&mut bob_ws).await;
    assert_eq!(event["type"], "message.received");
    assert_eq!(event["message"]["body"], "hi bob");
    assert_eq!(event["message"]["messageId"], message_id);

    // Bob hides his copy; Alice still lists it
    send_frame(
        &mut bob_ws,
        &json!({"id": "hide-1", "method": "message.hide", "params": {"messageId": message_id}}),
    )
    .await;
    let resp = next_json(&mut bob_ws).await;
    assert_eq!(resp["success"], true);

    send_frame(
        &mut bob_ws,
        &json!({"id": "list-1", "method": "thread.list", "params": {"peerId": alice.id.get()}}),
    )
    .await;
    let resp = next_json(&mut bob_ws).await;
    assert_eq!(resp["result"]["messages"].as_array().unwrap().len(), 0);

    send_frame(
        &mut alice_ws,
        &json!({"id": "list-2", "method": "thread.list", "params": {"peerId": bob.id.get()}}),
    )
    .await;
    let resp = next_json(&mut alice_ws).await;
    assert_eq!(resp["result"]["messages"].as_array().unwrap().len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn subscribe_notifies_connected_members() {
    let server = start_server().await;
    let founder = make_identity(&server, "founder@example.com");
    let investor = make_identity(&server, "investor@example.com");
    let org = {
        let conn = server.state().pool.get().unwrap();
        let org = OrganizationRepo::create(
            &conn,
            &NewOrganization {
                brand: "Acme".into(),
                is_startup: true,
                ..NewOrganization::default()
            },
        )
        .unwrap();
        let _ = OrganizationRepo::relate(&conn, founder.id, org.id, Position::Founder).unwrap();
        org
    };
    let tokens = &server.state().tokens;
    let mut founder_ws =
        connect(&server, Some(&tokens.issue_access(&founder).unwrap())).await;

    let client = reqwest::Client::new();
    let url = format!(
        "http://127.0.0.1:{}/api/organizations/{}/subscriptions",
        server.port(),
        org.id.get()
    );
    let response = client
        .post(&url)
        .bearer_auth(tokens.issue_access(&investor).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let event = next_json(&mut founder_ws).await;
    assert_eq!(event["type"], "notification");
    assert_eq!(event["notification"]["kind"], "SUBSCRIPTION");
    assert_eq!(event["notification"]["actor"], investor.id.get());

    // A duplicate subscribe conflicts and dispatches nothing
    let response = client
        .post(&url)
        .bearer_auth(tokens.issue_access(&investor).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
    expect_silence(&mut founder_ws).await;

    server.shutdown().await;
}

#[tokio::test]
async fn content_update_notifies_connected_subscribers() {
    let server = start_server().await;
    let founder = make_identity(&server, "founder@example.com");
    let investor = make_identity(&server, "investor@example.com");
    let org = {
        let conn = server.state().pool.get().unwrap();
        let org = OrganizationRepo::create(
            &conn,
            &NewOrganization {
                brand: "Acme".into(),
                is_startup: true,
                ..NewOrganization::default()
            },
        )
        .unwrap();
        let _ = OrganizationRepo::relate(&conn, founder.id, org.id, Position::Founder).unwrap();
        SubscriptionRepo::subscribe(&conn, investor.id, org.id).unwrap();
        org
    };
    let tokens = &server.state().tokens;
    let mut investor_ws =
        connect(&server, Some(&tokens.issue_access(&investor).unwrap())).await;

    let client = reqwest::Client::new();
    let url = format!(
        "http://127.0.0.1:{}/api/organizations/{}/content",
        server.port(),
        org.id.get()
    );
    let response = client
        .put(&url)
        .bearer_auth(tokens.issue_access(&founder).unwrap())
        .json(&json!({"productInfo": "rockets, now reusable"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["productInfo"], "rockets, now reusable");

    let event = next_json(&mut investor_ws).await;
    assert_eq!(event["type"], "notification");
    assert_eq!(event["notification"]["kind"], "CONTENT_UPDATE");

    // An unrelated identity may not edit, and nothing is dispatched
    let response = client
        .put(&url)
        .bearer_auth(tokens.issue_access(&investor).unwrap())
        .json(&json!({"productInfo": "hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    expect_silence(&mut investor_ws).await;

    server.shutdown().await;
}
