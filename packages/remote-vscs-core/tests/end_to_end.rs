//! End-to-end tests over real sockets: a WebSocket client against the VSCS
//! service and raw TCP against the static responder.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use remote_vscs_core::host::LineState;
use remote_vscs_core::{
    bootstrap_services, start_servers, AppState, BootstrappedServices, Config, ServerError,
    ServerHandles, SimulatedHost, Snapshot, VscsCommand, VscsHost,
};

const TIMEOUT: Duration = Duration::from_secs(5);
const BOOTSTRAP_PAGE: &str = "<html><body>remote vscs</body></html>";

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct Harness {
    host: Arc<SimulatedHost>,
    services: BootstrappedServices,
    handles: ServerHandles,
    _assets: tempfile::TempDir,
}

impl Harness {
    fn ws_url(&self) -> String {
        format!("ws://{}/vatsys/vscs", self.handles.ws_addr)
    }

    async fn connect(&self) -> WsStream {
        let (ws, _) = timeout(TIMEOUT, connect_async(self.ws_url()))
            .await
            .expect("connect timed out")
            .expect("handshake failed");
        ws
    }
}

/// Boots the bridge on ephemeral localhost ports against a demo panel.
async fn boot() -> Harness {
    let assets = tempfile::tempdir().unwrap();
    std::fs::write(assets.path().join("vscs.html"), BOOTSTRAP_PAGE).unwrap();
    std::fs::create_dir(assets.path().join("js")).unwrap();
    std::fs::write(assets.path().join("js/panel.js"), "console.log('vscs');").unwrap();
    std::fs::write(assets.path().join("notes.md"), "# private").unwrap();

    let config = Config {
        base_port: 0,
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        asset_dir: assets.path().to_path_buf(),
        ..Default::default()
    };
    let host = Arc::new(SimulatedHost::demo_panel());
    let services =
        bootstrap_services(&config, Arc::clone(&host) as Arc<dyn VscsHost>).unwrap();
    services.start_background_tasks();
    let handles = start_servers(AppState::new(&services)).await.unwrap();

    Harness {
        host,
        services,
        handles,
        _assets: assets,
    }
}

async fn send(ws: &mut WsStream, command: &VscsCommand) {
    ws.send(Message::Text(command.to_json().into())).await.unwrap();
}

/// Reads the next snapshot frame.
async fn next_snapshot(ws: &mut WsStream) -> Snapshot {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("no snapshot within timeout")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = msg {
            return Snapshot::decode(text.as_str()).expect("server sent invalid snapshot");
        }
    }
}

/// Reads snapshots until one satisfies `pred`.
async fn wait_for(ws: &mut WsStream, pred: impl Fn(&Snapshot) -> bool) -> Snapshot {
    loop {
        let snap = next_snapshot(ws).await;
        if pred(&snap) {
            return snap;
        }
    }
}

async fn http_get(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    timeout(TIMEOUT, stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    response
}

fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    let pos = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    (
        String::from_utf8_lossy(&response[..pos]).into_owned(),
        response[pos + 4..].to_vec(),
    )
}

fn freq_id(snap: &Snapshot, name: &str) -> u32 {
    snap.frequencies
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.id)
        .expect("frequency on panel")
}

// ── WebSocket ──

#[tokio::test]
async fn new_session_receives_current_snapshot() {
    let h = boot().await;
    let mut ws = h.connect().await;

    let snap = next_snapshot(&mut ws).await;
    assert_eq!(snap, *h.services.sync.snapshot());
    assert!(snap.connected);
    assert_eq!(snap.lines.len(), 3);
    assert_eq!(snap.frequencies.len(), 3);
}

#[tokio::test]
async fn command_converges_every_session() {
    let h = boot().await;
    let mut a = h.connect().await;
    let mut b = h.connect().await;
    next_snapshot(&mut a).await;
    next_snapshot(&mut b).await;

    send(&mut a, &VscsCommand::Group(true)).await;

    assert!(wait_for(&mut a, |s| s.group).await.group);
    assert!(wait_for(&mut b, |s| s.group).await.group);
}

#[tokio::test]
async fn malformed_message_keeps_session_open() {
    let h = boot().await;
    let mut ws = h.connect().await;
    next_snapshot(&mut ws).await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"Value":true}"#.into())).await.unwrap();
    ws.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
    send(&mut ws, &VscsCommand::TonesToSpeaker(true)).await;

    let snap = wait_for(&mut ws, |s| s.tones_to_speaker).await;
    assert!(snap.tones_to_speaker);
}

#[tokio::test]
async fn unknown_command_still_rebroadcasts_unchanged_state() {
    let h = boot().await;
    let mut ws = h.connect().await;
    let before = next_snapshot(&mut ws).await;

    send(&mut ws, &VscsCommand::Unknown("Reboot".into())).await;

    assert_eq!(next_snapshot(&mut ws).await, before);
}

#[tokio::test]
async fn unresolvable_reference_is_ignored() {
    let h = boot().await;
    let mut ws = h.connect().await;
    let before = next_snapshot(&mut ws).await;

    send(&mut ws, &VscsCommand::Transmit(1)).await;

    assert_eq!(next_snapshot(&mut ws).await, before);
}

#[tokio::test]
async fn host_event_is_pushed_to_sessions() {
    let h = boot().await;
    let mut ws = h.connect().await;
    next_snapshot(&mut ws).await;

    let gnd = h.host.line_handle("ML_GND").unwrap();
    h.host.ring_line(gnd).unwrap();

    let snap = wait_for(&mut ws, |s| {
        s.lines
            .iter()
            .any(|l| l.callsign == "ML_GND" && l.state == LineState::Ringing)
    })
    .await;
    assert_eq!(snap.lines.len(), 3);
}

#[tokio::test]
async fn transmit_requires_valid_atc() {
    let h = boot().await;
    h.host.set_valid_atc(false);
    let mut ws = h.connect().await;
    let snap = next_snapshot(&mut ws).await;
    let twr = freq_id(&snap, "ML_TWR");

    send(&mut ws, &VscsCommand::Transmit(twr)).await;
    let after = next_snapshot(&mut ws).await;
    let f = after.frequency_by_id(twr).unwrap();
    assert!(!f.transmit);

    h.host.set_valid_atc(true);
    send(&mut ws, &VscsCommand::Transmit(twr)).await;
    let after = wait_for(&mut ws, |s| s.frequency_by_id(twr).is_some_and(|f| f.transmit)).await;
    assert!(after.frequency_by_id(twr).unwrap().receive);
}

#[tokio::test]
async fn add_then_remove_frequency_round_trips() {
    let h = boot().await;
    let mut ws = h.connect().await;
    let original = next_snapshot(&mut ws).await;

    send(&mut ws, &VscsCommand::AddFreq("ML_DEL".into())).await;
    let added = wait_for(&mut ws, |s| s.frequencies.len() == 4).await;
    let del = freq_id(&added, "ML_DEL");

    send(&mut ws, &VscsCommand::RemoveFreq(del)).await;
    let removed = wait_for(&mut ws, |s| s.frequencies.len() == 3).await;
    assert_eq!(removed.frequencies, original.frequencies);
}

#[tokio::test]
async fn wrong_path_is_not_upgraded() {
    let h = boot().await;
    let url = format!("ws://{}/vatsys/other", h.handles.ws_addr);
    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn shutdown_closes_open_sessions() {
    let h = boot().await;
    let mut ws = h.connect().await;
    next_snapshot(&mut ws).await;

    h.services.shutdown();

    let ended = timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "session stayed open after shutdown");

    let drained = timeout(TIMEOUT, async {
        while h.services.ws_manager.connection_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "session registry not drained");
}

// ── HTTP ──

#[tokio::test]
async fn root_serves_bootstrap_page() {
    let h = boot().await;
    let response = http_get(h.handles.http_addr, b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
    let (head, body) = split_response(&response);

    assert!(head.starts_with("HTTP/1.0 200 OK"));
    assert!(head.contains("Connection: close"));
    assert!(head.contains("Content-Type: text/html"));
    assert!(head.contains(&format!("Content-Length: {}", BOOTSTRAP_PAGE.len())));
    assert_eq!(body, BOOTSTRAP_PAGE.as_bytes());
}

#[tokio::test]
async fn permitted_asset_is_served_with_query_stripped() {
    let h = boot().await;
    let response = http_get(h.handles.http_addr, b"GET /js/panel.js?v=3 HTTP/1.1\r\n\r\n").await;
    let (head, body) = split_response(&response);

    assert!(head.starts_with("HTTP/1.0 200 OK"));
    assert!(head.contains("Content-Type: text/javascript"));
    assert_eq!(body, b"console.log('vscs');");
}

#[tokio::test]
async fn forbidden_missing_and_traversal_get_404() {
    let h = boot().await;
    for target in ["/notes.md", "/missing.css", "/../vscs.html", "/js/../../etc/passwd.txt"] {
        let request = format!("GET {} HTTP/1.1\r\n\r\n", target);
        let response = http_get(h.handles.http_addr, request.as_bytes()).await;
        let (head, body) = split_response(&response);
        assert!(head.starts_with("HTTP/1.0 404 Not Found"), "{target}");
        assert!(head.contains("Content-Length: 0"), "{target}");
        assert!(body.is_empty(), "{target}");
    }
}

#[tokio::test]
async fn non_get_and_truncated_requests_are_dropped() {
    let h = boot().await;
    for request in [&b"POST / HTTP/1.1\r\n\r\n"[..], b"GE", b"GET "] {
        let response = http_get(h.handles.http_addr, request).await;
        assert!(response.is_empty(), "{:?}", String::from_utf8_lossy(request));
    }

    // The listener keeps serving afterwards
    let response = http_get(h.handles.http_addr, b"GET / HTTP/1.0\r\n\r\n").await;
    assert!(response.starts_with(b"HTTP/1.0 200 OK"));
}

// ── Startup ──

#[tokio::test]
async fn occupied_port_fails_startup() {
    let h = boot().await;
    let config = Config {
        base_port: h.handles.http_addr.port(),
        bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        asset_dir: h._assets.path().to_path_buf(),
        ..Default::default()
    };
    let second = bootstrap_services(&config, Arc::new(SimulatedHost::demo_panel())).unwrap();

    match start_servers(AppState::new(&second)).await {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr.port(), config.base_port),
        Ok(_) => panic!("bind on an occupied port should fail"),
    }
}
