//! Shared fixtures for install flow tests: an in-memory release server and
//! archive builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use camoufox_fetch::{ByteStream, FetchError, FetchResult, HttpBackend, HttpResponse};
use futures_util::StreamExt;
use zip::write::SimpleFileOptions;

pub const FEED_URL: &str = "https://api.github.com/repos/daijro/camoufox/releases";
pub const DOWNLOAD_BASE: &str = "https://github.com/daijro/camoufox/releases/download";

/// Route logs to the test writer. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("camoufox_fetch=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// What the fake server does for a route.
#[derive(Clone)]
pub enum Route {
    Ok(Vec<u8>),
    Status(u16),
    /// Fail with a transport error this many times, then serve the body.
    FlakyThen(u32, Vec<u8>),
}

/// In-memory stand-in for the GitHub release API and asset host.
#[derive(Default)]
pub struct FakeReleaseServer {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, u32>>,
}

impl FakeReleaseServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, route: Route) {
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub fn hits(&self, url: &str) -> u32 {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Publish a feed of `(version, release, os.arch)` assets, newest first,
    /// each in its own release, and serve `archive` for every asset.
    pub fn publish(&self, assets: &[(&str, &str, &str)], archive: &[u8]) {
        let releases: Vec<_> = assets
            .iter()
            .map(|(version, release, platform)| {
                let name = asset_name(version, release, platform);
                let url = format!("{DOWNLOAD_BASE}/v{version}-{release}/{name}");
                self.route(&url, Route::Ok(archive.to_vec()));
                serde_json::json!({
                    "tag_name": format!("v{version}-{release}"),
                    "assets": [{"name": name, "browser_download_url": url}],
                })
            })
            .collect();
        let body = serde_json::Value::Array(releases).to_string();
        self.route(FEED_URL, Route::Ok(body.into_bytes()));
    }
}

pub fn asset_name(version: &str, release: &str, platform: &str) -> String {
    format!("camoufox-{version}-{release}-{platform}.zip")
}

pub fn asset_url(version: &str, release: &str, platform: &str) -> String {
    format!(
        "{DOWNLOAD_BASE}/v{version}-{release}/{}",
        asset_name(version, release, platform)
    )
}

fn body(bytes: Vec<u8>) -> ByteStream {
    // Split into a few chunks so streaming code paths are exercised.
    let chunks: Vec<FetchResult<Bytes>> = bytes
        .chunks(512)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    futures_util::stream::iter(chunks).boxed()
}

#[async_trait]
impl HttpBackend for FakeReleaseServer {
    async fn get(&self, url: &str) -> FetchResult<HttpResponse> {
        let hit = {
            let mut hits = self.hits.lock().unwrap();
            let entry = hits.entry(url.to_string()).or_default();
            *entry += 1;
            *entry
        };
        let route = self.routes.lock().unwrap().get(url).cloned();

        match route {
            Some(Route::Ok(bytes)) => Ok(HttpResponse {
                status: 200,
                content_length: Some(bytes.len() as u64),
                body: body(bytes),
            }),
            Some(Route::FlakyThen(failures, _)) if hit <= failures => {
                Err(FetchError::network("connection reset by peer"))
            }
            Some(Route::FlakyThen(_, bytes)) => Ok(HttpResponse {
                status: 200,
                content_length: None,
                body: body(bytes),
            }),
            Some(Route::Status(status)) => Ok(HttpResponse {
                status,
                content_length: None,
                body: body(Vec::new()),
            }),
            None => Ok(HttpResponse {
                status: 404,
                content_length: None,
                body: body(Vec::new()),
            }),
        }
    }
}

/// Build a zip archive in memory from `(path, contents)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A minimal Linux build layout.
pub fn linux_build() -> Vec<u8> {
    zip_archive(&[
        ("camoufox-bin", b"#!/bin/sh\necho camoufox\n".as_slice()),
        ("browser/omni.ja", [0u8; 2048].as_slice()),
        ("properties.json", b"{}".as_slice()),
    ])
}
