//! End-to-end flow: download both assets from a local fixture server, watch
//! status reach Ready, then run inference through a fake engine.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use minicpm_local::{
    AppStatus, AssetKind, Controller, InferenceEngine, RuntimeConfig, StatusSnapshot, TokenSink,
};

const LLM_BODY: &[u8] = b"quantized language model weights";
const PROJECTOR_BODY: &[u8] = b"vision projector weights";

/// Minimal HTTP/1.1 fixture: serves a fixed body per filename, or the given
/// status with no body when `status` is not 200.
fn spawn_fixture_server(status: u16) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            std::thread::spawn(move || {
                let mut buf = [0u8; 4096];
                let mut request = Vec::new();
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let body: &[u8] = if status != 200 {
                    b""
                } else if request.contains("mmproj-model-f16.gguf") {
                    PROJECTOR_BODY
                } else {
                    LLM_BODY
                };
                let reason = if status == 200 { "OK" } else { "Not Found" };
                let header = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    reason,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
            });
        }
    });

    format!("http://{}", addr)
}

struct FakeEngine;

#[async_trait]
impl InferenceEngine for FakeEngine {
    async fn embed_text(&self, _prompt: &str) -> Vec<f32> {
        vec![0.25, 0.5, -0.75]
    }

    async fn predict(&self, _image_path: &Path, prompt: &str, tokens: TokenSink) {
        let _ = tokens.send(format!("described with: {}", prompt));
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<StatusSnapshot>,
    what: &str,
    pred: impl Fn(&StatusSnapshot) -> bool,
) -> StatusSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if pred(&rx.borrow()) {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("runtime worker stopped");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
}

fn config_for(docs: &Path, base: String) -> RuntimeConfig {
    RuntimeConfig {
        documents_dir: Some(docs.to_path_buf()),
        model_repo_base: base,
        ..Default::default()
    }
}

#[tokio::test]
async fn downloads_both_assets_and_becomes_ready() {
    let docs = tempfile::tempdir().unwrap();
    let base = spawn_fixture_server(200);
    let controller =
        Controller::new(config_for(docs.path(), base), Arc::new(FakeEngine)).unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, AppStatus::Empty);
    assert_eq!(snapshot.message, "Please download the models first");

    controller.download_all().unwrap();

    let mut rx = controller.subscribe();
    wait_for(&mut rx, "Ready with quiet transfers", |s| {
        s.status == AppStatus::Ready && s.message == "Ready"
    })
    .await;

    let store = controller.store();
    assert_eq!(
        std::fs::read(store.local_path_for(AssetKind::Llm)).unwrap(),
        LLM_BODY
    );
    assert_eq!(
        std::fs::read(store.local_path_for(AssetKind::Projector)).unwrap(),
        PROJECTOR_BODY
    );

    // Everything is in place, so a second invocation is a quiet no-op.
    controller.download_all().unwrap();
    assert_eq!(controller.snapshot().status, AppStatus::Ready);
}

#[tokio::test]
async fn failed_downloads_leave_assets_absent() {
    let docs = tempfile::tempdir().unwrap();
    let base = spawn_fixture_server(404);
    let controller =
        Controller::new(config_for(docs.path(), base), Arc::new(FakeEngine)).unwrap();

    controller.download_all().unwrap();

    // No retry and no status override on error: the runtime just stays Empty.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, AppStatus::Empty);
    assert_eq!(snapshot.message, "Please download the models first");

    let store = controller.store();
    assert!(!store.exists(AssetKind::Llm));
    assert!(!store.exists(AssetKind::Projector));

    // Failed transfers clean up their partial files.
    let leftovers: Vec<_> = match std::fs::read_dir(store.model_dir()) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
}

#[tokio::test]
async fn prediction_uses_the_default_prompt_for_empty_submissions() {
    let docs = tempfile::tempdir().unwrap();
    let base = spawn_fixture_server(200);
    let controller = Arc::new(
        Controller::new(config_for(docs.path(), base), Arc::new(FakeEngine)).unwrap(),
    );

    controller.download_all().unwrap();
    let mut rx = controller.subscribe();
    wait_for(&mut rx, "Ready", |s| s.status == AppStatus::Ready).await;

    let staged = controller.stage_image(b"jpeg bytes").unwrap();
    assert!(staged.ends_with("temp/image.jpg"));

    controller.predict(&staged, "").await;
    let snapshot = wait_for(&mut rx, "reply with default prompt", |s| {
        s.status == AppStatus::Ready && !s.reply.is_empty()
    })
    .await;
    assert_eq!(snapshot.reply, "described with: describe the image in detail");

    let embedding = controller.embed_text("a prompt").await;
    assert_eq!(embedding, vec![0.25, 0.5, -0.75]);
}
