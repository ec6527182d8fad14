//! The reqwest-backed adapters against a one-shot local HTTP server.

use carevoice_core::{
    AudioClip, CollaboratorError, SynthesisPort, SynthesisRequest, TranscriptionPort,
};
use carevoice_http::{HttpClientConfig, HttpSynthesizer, HttpTranscriber};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one request, answering with `status` and a JSON `body`.
///
/// Resolves to the raw request as text.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    (base_url, server)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

#[tokio::test]
async fn transcription_uploads_multipart_file_with_bearer_token() {
    let (base_url, server) = serve_once(200, r#"{"text":"find patients with fevers"}"#).await;
    let config = HttpClientConfig::new()
        .with_base_url(base_url)
        .with_token("s3cret");
    let transcriber = HttpTranscriber::new(&config).unwrap();

    let text = transcriber
        .transcribe(AudioClip::new(b"fake-webm".to_vec(), "audio/webm"))
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert_eq!(text.as_deref(), Some("find patients with fevers"));
    let lowered = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /api/transcribe HTTP/1.1"));
    assert!(lowered.contains("authorization: bearer s3cret"));
    assert!(request.contains(r#"name="file"; filename="audio.webm""#));
    assert!(lowered.contains("content-type: audio/webm"));
    assert!(request.contains("fake-webm"));
}

#[tokio::test]
async fn synthesis_posts_json_and_reads_format() {
    let (base_url, server) =
        serve_once(200, r#"{"audio":"data:audio/mpeg;base64,SUQz"}"#).await;
    let synthesizer = HttpSynthesizer::new(&HttpClientConfig::new().with_base_url(base_url)).unwrap();

    let speech = synthesizer
        .synthesize(SynthesisRequest {
            text: "Two patients have a fever.".to_string(),
            voice: "alloy".to_string(),
        })
        .await
        .unwrap();
    let request = server.await.unwrap();

    assert_eq!(speech.format, "mp3");
    assert!(request.starts_with("POST /api/tts HTTP/1.1"));
    assert!(request.contains(r#""voice":"alloy""#));
    assert!(request.contains(r#""text":"Two patients have a fever.""#));
}

#[tokio::test]
async fn server_error_surfaces_status_and_body() {
    let (base_url, server) = serve_once(500, r#"{"detail":"model crashed"}"#).await;
    let transcriber =
        HttpTranscriber::new(&HttpClientConfig::new().with_base_url(base_url)).unwrap();

    let err = transcriber
        .transcribe(AudioClip::new(vec![1, 2, 3], "audio/wav"))
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        CollaboratorError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("model crashed"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let synthesizer =
        HttpSynthesizer::new(&HttpClientConfig::new().with_base_url(format!("http://{addr}")))
            .unwrap();
    let err = synthesizer
        .synthesize(SynthesisRequest {
            text: "hello".to_string(),
            voice: "nova".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CollaboratorError::Network(_)));
}
