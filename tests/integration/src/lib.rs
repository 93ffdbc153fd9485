//! Integration tests for the codemonger edge server.
//!
//! Each test boots an [`EdgeHttpService`] on an ephemeral local port, serving
//! a freshly generated contents directory, and talks to it over real HTTP.
//!
//! Run them with:
//! ```text
//! cargo test -p codemonger-edge-integration
//! ```

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use codemonger_edge_core::ExpandIndex;
use codemonger_edge_http::{DirectoryOrigin, EdgeHttpConfig, EdgeHttpService, serve};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A running edge server and the contents it serves.
#[derive(Debug)]
pub struct TestEdge {
    /// Base URL, e.g. `http://127.0.0.1:49152`.
    pub base_url: String,
    /// Contents directory; removed on drop.
    pub contents: tempfile::TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestEdge {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestEdge {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Write the site layout used by the tests.
fn write_site(root: &std::path::Path) {
    let files = [
        ("index.html", "<h1>codemonger</h1>"),
        ("blog/index.html", "<h1>blog</h1>"),
        ("blog/post001/index.html", "<h1>post001</h1>"),
        ("codemonger.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>"),
        ("assets.v2/index.html", "<h1>assets</h1>"),
    ];
    for (key, contents) in files {
        let path = root.join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        std::fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }
}

/// Boot an edge server with the `expand-index` function.
pub async fn start_edge() -> TestEdge {
    init_tracing();

    let contents = tempfile::tempdir().expect("temp contents dir");
    write_site(contents.path());

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let service = EdgeHttpService::new(
        ExpandIndex,
        DirectoryOrigin::new(contents.path()),
        EdgeHttpConfig {
            cache_ttl: Duration::from_secs(600),
        },
    );

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(serve(listener, service, async move {
        let _ = rx.await;
    }));

    TestEdge {
        base_url: format!("http://{addr}"),
        contents,
        shutdown: Some(tx),
    }
}

/// HTTP client for the tests.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

mod test_edge;
