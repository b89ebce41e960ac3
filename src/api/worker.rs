use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::api::Api;
use crate::catalog::{DemographicSet, Level, ZoneCatalog};
use crate::detail::ExportTarget;
use crate::error::ApiError;

/// Work the UI thread hands to the fetch worker
#[derive(Debug)]
pub enum Request {
    /// Zones of every level plus the census years, fetched together
    LoadCatalog,
    LoadDemographics { year: i32, generation: u64 },
    Export { target: ExportTarget, dir: PathBuf },
}

/// Result of a request, posted back to the UI thread
#[derive(Debug)]
pub enum Response {
    Catalog { catalog: ZoneCatalog, years: Vec<i32> },
    Demographics {
        year: i32,
        generation: u64,
        result: Result<DemographicSet, ApiError>,
    },
    Exported { path: PathBuf },
    ExportFailed { message: String },
}

/// Background thread that owns the data source
pub struct Worker {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    _thread: JoinHandle<()>,
}

impl Worker {
    pub fn spawn(api: Api) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (response_tx, response_rx) = mpsc::channel::<Response>();
        let worker_thread = thread::spawn(move || {
            for request in request_rx {
                if response_tx.send(handle(&api, request)).is_err() {
                    break;
                }
            }
        });
        Self {
            requests: request_tx,
            responses: response_rx,
            _thread: worker_thread,
        }
    }

    pub fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            warn!("fetch worker is gone, request dropped");
        }
    }

    /// Next finished response, without blocking
    pub fn try_recv(&self) -> Option<Response> {
        self.responses.try_recv().ok()
    }
}

/// Serve one request synchronously
pub fn handle(api: &Api, request: Request) -> Response {
    match request {
        Request::LoadCatalog => load_catalog(api),
        Request::LoadDemographics { year, generation } => {
            let result = api.demographics(year);
            match &result {
                Ok(set) => info!(year, generation, records = set.len(), "demographics loaded"),
                Err(e) => warn!(year, generation, error = %e, "demographics fetch failed"),
            }
            Response::Demographics {
                year,
                generation,
                result,
            }
        }
        Request::Export { target, dir } => {
            let file_name = target.file_name();
            let outcome = api
                .export(&target.endpoint())
                .and_then(|bytes| write_export(&dir, &file_name, &bytes).map_err(ApiError::from));
            match outcome {
                Ok(path) => {
                    info!(path = %path.display(), "export saved");
                    Response::Exported { path }
                }
                Err(e) => {
                    error!(file = %file_name, error = %e, "export failed");
                    Response::ExportFailed {
                        message: format!("Erreur lors du téléchargement de {file_name}: {e}"),
                    }
                }
            }
        }
    }
}

fn load_catalog(api: &Api) -> Response {
    let ((regions, departments), (communes, years)) = rayon::join(
        || rayon::join(|| api.zones(Level::Region), || api.zones(Level::Department)),
        || rayon::join(|| api.zones(Level::Commune), || api.census_years()),
    );

    let mut zones = [regions, departments, communes].map(|result| match result {
        Ok(zones) => zones,
        Err(e) => {
            warn!(error = %e, "zone fetch failed");
            Vec::new()
        }
    });
    let years = years.unwrap_or_else(|e| {
        warn!(error = %e, "census years fetch failed");
        Vec::new()
    });

    let catalog = ZoneCatalog::new(
        std::mem::take(&mut zones[0]),
        std::mem::take(&mut zones[1]),
        std::mem::take(&mut zones[2]),
    );
    info!(zones = catalog.len(), years = years.len(), "catalog loaded");
    Response::Catalog { catalog, years }
}

/// Write-then-rename so a failed download never leaves a partial file
fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::fake::FakeSource;
    use crate::api::Endpoint;

    const REGIONS: &str = r#"[{"id": 1, "adm1_en": "Adrar",
        "geo_json": {"type": "Polygon", "coordinates": [[[-14, 19], [-10, 19], [-10, 23], [-14, 23], [-14, 19]]]}}]"#;

    #[test]
    fn test_catalog_partial_failure_keeps_the_rest() {
        let api = Api::new(Arc::new(
            FakeSource::new()
                .with(Endpoint::Regions, REGIONS)
                .with(Endpoint::CensusYears, "[2013, 2023]"),
        ));
        match handle(&api, Request::LoadCatalog) {
            Response::Catalog { catalog, years } => {
                assert_eq!(catalog.zones(Level::Region).len(), 1);
                assert!(catalog.zones(Level::Commune).is_empty());
                assert_eq!(years, vec![2013, 2023]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_demographics_echo_generation() {
        let api = Api::new(Arc::new(
            FakeSource::new().with(Endpoint::Demographics { year: 2023 }, r#"[{"region": 1}]"#),
        ));
        match handle(&api, Request::LoadDemographics { year: 2023, generation: 7 }) {
            Response::Demographics { year, generation, result } => {
                assert_eq!((year, generation), (2023, 7));
                assert_eq!(result.unwrap().len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        match handle(&api, Request::LoadDemographics { year: 2013, generation: 8 }) {
            Response::Demographics { result, .. } => assert!(result.is_err()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::ExportAll { year: 2023 }, "PK-xlsx")));
        let request = Request::Export {
            target: ExportTarget::all(2023),
            dir: dir.path().join("out"),
        };
        match handle(&api, request) {
            Response::Exported { path } => {
                assert_eq!(path, dir.path().join("out").join("donnees_mauritanie_2023.xlsx"));
                assert_eq!(std::fs::read(&path).unwrap(), b"PK-xlsx");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_export_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let api = Api::new(Arc::new(FakeSource::new()));
        let request = Request::Export {
            target: ExportTarget::zone(Level::Commune, 3, 2023),
            dir: dir.path().to_path_buf(),
        };
        match handle(&api, request) {
            Response::ExportFailed { message } => assert!(message.contains("commune_data_3_2023.xlsx")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_worker_thread_roundtrip() {
        let api = Api::new(Arc::new(FakeSource::new().with(Endpoint::CensusYears, "[2023]")));
        let worker = Worker::spawn(api);
        worker.send(Request::LoadCatalog);
        let mut response = None;
        for _ in 0..200 {
            if let Some(r) = worker.try_recv() {
                response = Some(r);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        match response {
            Some(Response::Catalog { years, .. }) => assert_eq!(years, vec![2023]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
