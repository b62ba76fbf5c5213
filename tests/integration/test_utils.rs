//! Shared test utilities for integration tests
//!
//! Boots real possum nodes on loopback ports. Listeners are bound before any node starts so
//! every node knows the full passel up front.

use possum::config::PossumConfig;
use possum::server::PossumServer;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const USERNAME: &str = "possum-admin";
pub const PASSWORD: &str = "correct-horse";

/// One running node; shut down on drop
pub struct TestNode {
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
    _store_dir: TempDir,
}

impl Drop for TestNode {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub struct TestPassel {
    pub nodes: Vec<TestNode>,
    client: reqwest::Client,
}

/// Start a passel of `size` nodes that all know each other
pub async fn start_passel(size: usize) -> TestPassel {
    start_passel_with(size, |_, _| {}).await
}

/// Start a passel, letting `configure` adjust each node's configuration before it boots
pub async fn start_passel_with<F>(size: usize, configure: F) -> TestPassel
where
    F: Fn(usize, &mut PossumConfig),
{
    let mut listeners = Vec::with_capacity(size);
    for _ in 0..size {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
    }
    let urls: Vec<String> = listeners
        .iter()
        .map(|l| format!("http://{}", l.local_addr().unwrap()))
        .collect();

    let mut nodes = Vec::with_capacity(size);
    for (index, listener) in listeners.into_iter().enumerate() {
        let store_dir = TempDir::new().unwrap();
        let mut config = PossumConfig::default();
        config.identity.application_uris = vec![urls[index].trim_start_matches("http://").to_string()];
        config.passel.members = urls.clone();
        config.passel.username = Some(USERNAME.to_string());
        config.passel.password = Some(PASSWORD.to_string());
        config.storage.path = store_dir.path().join("store");
        config.peer.ca_cert = store_dir.path().join("no-cacert.pem");
        config.peer.request_timeout_secs = 5;
        configure(index, &mut config);

        let server = PossumServer::from_config(&config).unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.run(listener, async move {
            let _ = rx.await;
        }));

        nodes.push(TestNode {
            url: urls[index].clone(),
            shutdown: Some(tx),
            _store_dir: store_dir,
        });
    }

    TestPassel {
        nodes,
        client: reqwest::Client::new(),
    }
}

/// A loopback address nothing listens on
pub fn unused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

impl TestPassel {
    pub fn url(&self, index: usize) -> &str {
        &self.nodes[index].url
    }

    pub fn urls(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.url.clone()).collect()
    }

    pub async fn get(&self, index: usize, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.url(index), path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn get_with_headers(
        &self,
        index: usize,
        path: &str,
    ) -> (u16, reqwest::header::HeaderMap) {
        let response = self
            .client
            .get(format!("{}{}", self.url(index), path))
            .send()
            .await
            .unwrap();
        (response.status().as_u16(), response.headers().clone())
    }

    /// POST with the passel credentials
    pub async fn post(&self, index: usize, path: &str, body: Value) -> (u16, Value) {
        self.post_as(index, path, body, Some((USERNAME, PASSWORD))).await
    }

    pub async fn post_as(
        &self,
        index: usize,
        path: &str,
        body: Value,
        credentials: Option<(&str, &str)>,
    ) -> (u16, Value) {
        let mut request = self
            .client
            .post(format!("{}{}", self.url(index), path))
            .json(&body);
        if let Some((username, password)) = credentials {
            request = request.basic_auth(username, Some(password));
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// POST an unparsed body with the passel credentials
    pub async fn post_raw(&self, index: usize, path: &str, body: &str) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.url(index), path))
            .basic_auth(USERNAME, Some(PASSWORD))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}
