use super::util::with_retry;
use crate::core::config::SeedConfig;
use crate::core::store::{SeedDocument, SeedSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Seed data bundled into the binary.
pub const DEFAULT_SEED: &str = include_str!("../../docs/db.json");

fn parse_seed(text: &str, origin: &str) -> Result<SeedDocument> {
    serde_json::from_str(text).with_context(|| format!("Failed to parse seed data from {origin}"))
}

pub struct EmbeddedSeed;

#[async_trait]
impl SeedSource for EmbeddedSeed {
    async fn load_seed(&self) -> Result<SeedDocument> {
        parse_seed(DEFAULT_SEED, "bundled db.json")
    }
}

pub struct FileSeed {
    path: PathBuf,
}

impl FileSeed {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SeedSource for FileSeed {
    async fn load_seed(&self) -> Result<SeedDocument> {
        debug!("Reading seed data from {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read seed file: {}", self.path.display()))?;
        parse_seed(&text, &self.path.display().to_string())
    }
}

pub struct HttpSeed {
    url: String,
}

impl HttpSeed {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl SeedSource for HttpSeed {
    async fn load_seed(&self) -> Result<SeedDocument> {
        debug!("Requesting seed data from {}", self.url);
        let client = reqwest::Client::builder()
            .user_agent("cryptoverse/0.1")
            .build()?;
        let response = with_retry(|| async { client.get(&self.url).send().await }, 2, 500)
            .await
            .context("Seed request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Network response was not ok: {} for {}",
                response.status(),
                self.url
            ));
        }

        let text = response
            .text()
            .await
            .context("Failed to get seed response text")?;
        parse_seed(&text, &self.url)
    }
}

/// Picks the seed source named in configuration, falling back to the
/// bundled document.
pub fn seed_from_config(config: &SeedConfig) -> Box<dyn SeedSource> {
    match (&config.path, &config.url) {
        (Some(path), _) => Box::new(FileSeed::new(path)),
        (None, Some(url)) => Box::new(HttpSeed::new(url)),
        (None, None) => Box::new(EmbeddedSeed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::UserId;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEED_JSON: &str = r#"{
        "users": [
            {
                "id": 1,
                "fullName": "Demo User",
                "email": "demo@example.com",
                "password": "password123",
                "total_account_balance": 10000,
                "investment_balance": 0,
                "investments": []
            },
            {
                "id": 2,
                "fullName": "Second User",
                "email": "second@example.com",
                "password": "pw",
                "total_account_balance": 50,
                "investment_balance": 0
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_embedded_seed_is_valid() {
        let document = EmbeddedSeed.load_seed().await.unwrap();
        assert!(!document.users.is_empty());
        assert!(document.users.iter().any(|u| u.email == "demo@example.com"));
    }

    #[tokio::test]
    async fn test_file_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED_JSON.as_bytes()).unwrap();

        let document = FileSeed::new(file.path()).load_seed().await.unwrap();

        assert_eq!(document.users.len(), 2);
        assert_eq!(document.users[1].id, UserId(2));
    }

    #[tokio::test]
    async fn test_file_seed_missing() {
        let result = FileSeed::new("/no/such/db.json").load_seed().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_seed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/db.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEED_JSON))
            .mount(&mock_server)
            .await;

        let seed = HttpSeed::new(&format!("{}/db.json", mock_server.uri()));
        let document = seed.load_seed().await.unwrap();

        assert_eq!(document.users.len(), 2);
        assert_eq!(document.users[0].full_name, "Demo User");
    }

    #[tokio::test]
    async fn test_http_seed_not_found() {
        let mock_server = MockServer::start().await;
        let seed = HttpSeed::new(&format!("{}/db.json", mock_server.uri()));

        let result = seed.load_seed().await;

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Network response was not ok")
        );
    }

    #[tokio::test]
    async fn test_seed_from_config_prefers_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED_JSON.as_bytes()).unwrap();

        let seed = seed_from_config(&SeedConfig {
            path: Some(file.path().display().to_string()),
            url: Some("http://127.0.0.1:1/db.json".to_string()),
        });
        assert_eq!(seed.load_seed().await.unwrap().users.len(), 2);

        let bundled = seed_from_config(&SeedConfig::default());
        assert!(!bundled.load_seed().await.unwrap().users.is_empty());
    }
}
