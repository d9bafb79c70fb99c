#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use cardamon_api::config::AppConfig;
use cardamon_api::database::MemoryStore;
use cardamon_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Serve the real router on the in-memory store inside the test's runtime
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.database.in_memory = true;
        config.api.port = port;
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.security.password_hash_cost = 4;

        let state = AppState::new(Arc::new(MemoryStore::new()), config)?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a fresh user; returns (username, access token, refresh token)
    pub async fn register(&self, prefix: &str) -> Result<(String, String, String)> {
        let username = format!("{}-{}", prefix, uuid::Uuid::new_v4().simple());
        let res = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({ "username": username, "password": "hunter2" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = res.json().await?;
        let access = body["accessToken"].as_str().context("no accessToken")?.to_string();
        let refresh = body["refreshToken"].as_str().context("no refreshToken")?.to_string();
        Ok((username, access, refresh))
    }
}

/// Solid-colour PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([120, 40, 200, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    buf
}

pub fn svg(width: u32, height: u32, fill: &str) -> Vec<u8> {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{fill}"/></svg>"#,
        w = width,
        h = height,
        fill = fill
    )
    .into_bytes()
}
