//! Integration tests: real viewers over TCP against a running server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use mjpeg_relay::protocol::{MultipartReader, Part, RESPONSE_HEADER};
use mjpeg_relay::{
    Frame, FrameProducer, FrameSlot, JpegEncoder, ServerConfig, SourceConfig, StreamingServer,
};

const TIMEOUT: Duration = Duration::from_secs(5);

// ── Helpers ──────────────────────────────────────────────────────

/// Start a server on an OS-assigned port
async fn start_server(config: ServerConfig) -> (Arc<StreamingServer>, Arc<FrameSlot>, SocketAddr) {
    let slot = Arc::new(FrameSlot::new());
    let server = Arc::new(StreamingServer::new(
        config.bind("127.0.0.1:0".parse().unwrap()),
        Arc::clone(&slot),
    ));

    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let task_server = Arc::clone(&server);
    tokio::spawn(async move {
        let _ = task_server.serve(&listener).await;
    });

    (server, slot, addr)
}

/// Viewer connection with a multipart parser
struct Viewer {
    stream: TcpStream,
    parser: MultipartReader,
}

impl Viewer {
    async fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        Self {
            stream,
            parser: MultipartReader::new(),
        }
    }

    async fn read_header(&mut self) -> Vec<u8> {
        let mut header = vec![0u8; RESPONSE_HEADER.len()];
        tokio::time::timeout(TIMEOUT, self.stream.read_exact(&mut header))
            .await
            .expect("timeout waiting for header")
            .unwrap();
        self.parser.push(&header);
        header
    }

    async fn next_part(&mut self) -> Part {
        let mut buf = [0u8; 8192];
        loop {
            if let Some(part) = self.parser.next_part().unwrap() {
                return part;
            }
            let n = tokio::time::timeout(TIMEOUT, self.stream.read(&mut buf))
                .await
                .expect("timeout waiting for part")
                .unwrap();
            assert!(n > 0, "server closed the stream");
            self.parser.push(&buf[..n]);
        }
    }

    /// True if nothing arrives within `wait`
    async fn is_quiet(&mut self, wait: Duration) -> bool {
        let mut buf = [0u8; 64];
        tokio::time::timeout(wait, self.stream.read(&mut buf))
            .await
            .is_err()
    }
}

async fn wait_for_active(server: &StreamingServer, expected: u64) {
    tokio::time::timeout(TIMEOUT, async {
        while server.stats().active_sessions != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("active session count did not settle");
}

/// Keep publishing `frame` until the active session count settles
///
/// A viewer that went away is only noticed when a write to it fails.
async fn publish_until_active(server: &StreamingServer, slot: &FrameSlot, frame: &Frame, expected: u64) {
    tokio::time::timeout(TIMEOUT, async {
        while server.stats().active_sessions != expected {
            slot.publish(frame.clone());
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("departed sessions were not reaped");
}

// ── Scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn test_viewer_lifecycle_scenario() {
    let (server, slot, addr) = start_server(ServerConfig::default()).await;

    // Client A sees only the header while the slot is empty
    let mut a = Viewer::connect(addr).await;
    assert_eq!(a.read_header().await, RESPONSE_HEADER);
    assert!(a.is_quiet(Duration::from_millis(150)).await);

    // One 64x64 uniform frame produces exactly one part
    let frame = Frame::solid(64, 64, [0, 200, 0]);
    slot.publish(frame.clone());

    let part = a.next_part().await;
    assert_eq!(part.content_type, "image/jpeg");
    let expected = JpegEncoder::default().encode(&frame).unwrap();
    assert_eq!(part.payload.len(), expected.len());
    assert_eq!(&part.payload[..2], &[0xFF, 0xD8]);
    assert!(a.is_quiet(Duration::from_millis(150)).await);

    // Disconnect A; its session winds down on the next failed write
    drop(a);
    publish_until_active(&server, &slot, &frame, 0).await;

    // B is accepted without restart and gets the current frame
    let mut b = Viewer::connect(addr).await;
    assert_eq!(b.read_header().await, RESPONSE_HEADER);
    let part = b.next_part().await;
    assert_eq!(part.payload.len(), expected.len());

    assert_eq!(server.stats().total_sessions, 2);
}

#[tokio::test]
async fn test_header_identical_across_connections() {
    let (_server, slot, addr) = start_server(ServerConfig::default()).await;
    slot.publish(Frame::solid(32, 32, [1, 2, 3]));

    let mut headers = Vec::new();
    for _ in 0..4 {
        let mut viewer = Viewer::connect(addr).await;
        headers.push(viewer.read_header().await);
    }

    assert!(headers.iter().all(|h| h == RESPONSE_HEADER));
}

#[tokio::test]
async fn test_content_length_matches_payload_for_every_part() {
    let (_server, slot, addr) = start_server(ServerConfig::default()).await;
    let mut viewer = Viewer::connect(addr).await;
    viewer.read_header().await;

    for i in 0..5u8 {
        slot.publish(Frame::solid(48, 32, [i * 40, 255 - i * 40, 7]));
        // The parser rejects any part whose declared length disagrees with
        // the bytes before the trailing CRLF
        let part = viewer.next_part().await;
        assert_eq!(&part.payload[..2], &[0xFF, 0xD8]);
        assert_eq!(&part.payload[part.payload.len() - 2..], &[0xFF, 0xD9]);
    }
}

#[tokio::test]
async fn test_disconnect_does_not_affect_other_viewers() {
    let (server, slot, addr) = start_server(ServerConfig::default()).await;

    let mut stays = Viewer::connect(addr).await;
    let mut leaves = Viewer::connect(addr).await;
    stays.read_header().await;
    leaves.read_header().await;
    wait_for_active(&server, 2).await;

    let frame = Frame::solid(16, 16, [9, 9, 9]);
    slot.publish(frame.clone());
    stays.next_part().await;
    leaves.next_part().await;

    drop(leaves);
    publish_until_active(&server, &slot, &frame, 1).await;

    slot.publish(Frame::solid(16, 16, [10, 10, 10]));
    let part = stays.next_part().await;
    assert_eq!(&part.payload[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_session_limit_rejects_extra_viewers() {
    let (server, slot, addr) = start_server(ServerConfig::default().max_sessions(1)).await;

    let mut first = Viewer::connect(addr).await;
    first.read_header().await;
    wait_for_active(&server, 1).await;

    // The second connection is closed without a header
    let mut second = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    let n = tokio::time::timeout(TIMEOUT, second.read_to_end(&mut buf))
        .await
        .expect("rejected connection was not closed");
    assert!(n.is_err() || buf.is_empty());
    assert_eq!(server.stats().rejected_sessions, 1);

    // The permit is released when the first viewer leaves
    drop(first);
    publish_until_active(&server, &slot, &Frame::solid(8, 8, [0, 0, 0]), 0).await;

    let mut third = Viewer::connect(addr).await;
    assert_eq!(third.read_header().await, RESPONSE_HEADER);
}

#[tokio::test]
async fn test_half_closed_viewer_still_streams() {
    let (server, slot, addr) = start_server(ServerConfig::default()).await;

    // HTTP/1.0 style client: send the request, then shut down the write side
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.0\r\n\r\n").await.unwrap();
    stream.shutdown().await.unwrap();
    let mut viewer = Viewer {
        stream,
        parser: MultipartReader::new(),
    };

    assert_eq!(viewer.read_header().await, RESPONSE_HEADER);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.stats().active_sessions, 1);

    slot.publish(Frame::solid(64, 64, [30, 60, 90]));
    let part = viewer.next_part().await;
    assert_eq!(&part.payload[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_pattern_source_end_to_end() {
    let (_server, slot, addr) = start_server(ServerConfig::default()).await;

    let config = SourceConfig::new("pattern://64x48@50").size(32, 24);
    let _producer = FrameProducer::new(config, Arc::clone(&slot)).spawn().unwrap();

    let mut viewer = Viewer::connect(addr).await;
    viewer.read_header().await;

    let first = viewer.next_part().await;
    let second = viewer.next_part().await;
    assert_eq!(&first.payload[..2], &[0xFF, 0xD8]);
    assert_ne!(first.payload, second.payload);

    let decoded = mjpeg_relay::media::decode_jpeg(&second.payload).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 24));

    slot.close();
}
