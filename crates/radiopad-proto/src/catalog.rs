//! Station catalog: loaded once at startup, never refreshed.
//!
//! The source is either an `http(s)://` endpoint returning a JSON array of
//! `{name, url}` objects, or a local file with the same content.  An empty
//! list is an error: nothing downstream is allowed to do index arithmetic on
//! zero stations.
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::Station;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to fetch stations from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read stations file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse station list: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("station list is empty")]
    Empty,
}

/// Non-empty, ordered, immutable list of stations.
#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<Station>,
}

impl Catalog {
    pub fn new(stations: Vec<Station>) -> Result<Self, CatalogError> {
        if stations.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { stations })
    }

    pub fn from_json(body: &str) -> Result<Self, CatalogError> {
        let stations: Vec<Station> = serde_json::from_str(body)?;
        Self::new(stations)
    }

    /// Load from a URL or a local file path.
    pub async fn load(source: &str) -> Result<Self, CatalogError> {
        let body = if source.starts_with("http://") || source.starts_with("https://") {
            fetch(source).await?
        } else {
            let path = PathBuf::from(source);
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| CatalogError::Read { path, source })?
        };
        let catalog = Self::from_json(&body)?;
        tracing::info!("Loaded {} stations from {}", catalog.len(), source);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Always false; kept alongside `len` for the usual pairing.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station at `idx` wrapped into range.
    pub fn get(&self, idx: usize) -> &Station {
        &self.stations[idx % self.stations.len()]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

async fn fetch(url: &str) -> Result<String, CatalogError> {
    let wrap = |source| CatalogError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(wrap)?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(wrap)?;
    response.text().await.map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_station_array() {
        let catalog = Catalog::from_json(
            r#"[{"name":"A","url":"urlA"},{"name":"B","url":"urlB"},{"name":"A","url":"urlA"}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).name, "B");
        assert_eq!(catalog.get(0), catalog.get(2));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(Catalog::from_json("[]"), Err(CatalogError::Empty)));
        assert!(matches!(Catalog::new(Vec::new()), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Catalog::from_json(r#"{"stations": []}"#),
            Err(CatalogError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations.json");
        std::fs::write(&path, r#"[{"name":"Local","url":"file:///x.mp3"}]"#).unwrap();

        let catalog = Catalog::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(catalog.stations(), &[Station::new("Local", "file:///x.mp3")]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Catalog::load("/nonexistent/radiopad/stations.json")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
