use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::catalog::Level;
use crate::error::{ApiError, Result};

/// A resource the census backend serves
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Regions,
    Departments,
    Communes,
    CensusYears,
    Demographics { year: i32 },
    ExportAll { year: i32 },
    ExportZone { level: Level, zone_id: u32, year: i32 },
}

impl Endpoint {
    /// Path and query relative to the server root
    pub fn path(&self) -> String {
        match self {
            Endpoint::Regions => "/api/regions/".to_string(),
            Endpoint::Departments => "/api/departments/".to_string(),
            Endpoint::Communes => "/api/communes/".to_string(),
            Endpoint::CensusYears => "/api/census-years/".to_string(),
            Endpoint::Demographics { year } => format!("/api/demographics/?year={year}"),
            Endpoint::ExportAll { year } => format!("/api/export-all-data/?year={year}"),
            Endpoint::ExportZone { level, zone_id, year } => {
                format!("/api/export-zone-data/{zone_id}/{}/?year={year}", level.as_str())
            }
        }
    }

    /// File holding this payload in an offline data directory
    fn file_name(&self) -> Option<String> {
        match self {
            Endpoint::Regions => Some("regions.json".into()),
            Endpoint::Departments => Some("departments.json".into()),
            Endpoint::Communes => Some("communes.json".into()),
            Endpoint::CensusYears => Some("census-years.json".into()),
            Endpoint::Demographics { year } => Some(format!("demographics-{year}.json")),
            Endpoint::ExportAll { .. } | Endpoint::ExportZone { .. } => None,
        }
    }
}

/// Raw byte access to census payloads
pub trait DataSource: Send + Sync {
    fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>>;

    /// Human readable origin, for logs
    fn describe(&self, endpoint: &Endpoint) -> String;
}

/// Census REST API over HTTP. One attempt per request, no retries.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rgph-map/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl DataSource for HttpSource {
    fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>> {
        let url = self.describe(endpoint);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn describe(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

/// Offline mode: the same JSON payloads stored as files
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for DirSource {
    fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>> {
        let name = endpoint
            .file_name()
            .ok_or(ApiError::Unsupported("exports need the API server"))?;
        Ok(std::fs::read(self.root.join(name))?)
    }

    fn describe(&self, endpoint: &Endpoint) -> String {
        match endpoint.file_name() {
            Some(name) => self.root.join(name).display().to_string(),
            None => endpoint.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Regions.path(), "/api/regions/");
        assert_eq!(Endpoint::Demographics { year: 2023 }.path(), "/api/demographics/?year=2023");
        assert_eq!(Endpoint::ExportAll { year: 2013 }.path(), "/api/export-all-data/?year=2013");
        assert_eq!(
            Endpoint::ExportZone {
                level: Level::Department,
                zone_id: 12,
                year: 2023
            }
            .path(),
            "/api/export-zone-data/12/department/?year=2023"
        );
    }

    #[test]
    fn test_http_url_joins_base() {
        let source = HttpSource::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.describe(&Endpoint::CensusYears), "http://127.0.0.1:8000/api/census-years/");
    }

    #[test]
    fn test_dir_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("census-years.json"), b"[2013, 2023]").unwrap();
        let source = DirSource::new(dir.path());
        assert_eq!(source.fetch(&Endpoint::CensusYears).unwrap(), b"[2013, 2023]");
        assert!(matches!(source.fetch(&Endpoint::Regions), Err(ApiError::Io(_))));
        assert!(matches!(
            source.fetch(&Endpoint::ExportAll { year: 2023 }),
            Err(ApiError::Unsupported(_))
        ));
    }
}
