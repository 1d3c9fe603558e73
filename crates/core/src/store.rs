use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::CatalogConfig;
use crate::cpq::catalog::{Catalog, CatalogFormatError};
use crate::errors::DomainError;
use crate::persist::write_atomically;

/// Catalog shipped with the binary, used when no override file is usable.
pub const PACKAGED_CATALOG: &str = include_str!("../resources/pricing.json");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Packaged,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file `{}`", path.display()),
            Self::Packaged => f.write_str("packaged default catalog"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog from {origin}: {source}")]
    Read { origin: CatalogSource, source: io::Error },
    #[error("could not use catalog from {origin}: {source}")]
    Format { origin: CatalogSource, source: CatalogFormatError },
    #[error("could not write catalog to `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("no usable catalog (override: {override_error}; default: {default_error})")]
    Unavailable { override_error: Box<CatalogError>, default_error: Box<CatalogError> },
}

impl CatalogError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Where the catalog is read from and written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogLocations {
    /// User-editable copy; read first and the only write target.
    pub override_path: PathBuf,
    pub default: CatalogSource,
}

impl CatalogLocations {
    pub fn new(override_path: impl Into<PathBuf>) -> Self {
        Self { override_path: override_path.into(), default: CatalogSource::Packaged }
    }

    pub fn with_default_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.default = CatalogSource::File(path.into());
        self
    }
}

impl From<&CatalogConfig> for CatalogLocations {
    fn from(config: &CatalogConfig) -> Self {
        let locations = Self::new(&config.override_path);
        match &config.default_path {
            Some(path) => locations.with_default_file(path),
            None => locations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub source: CatalogSource,
}

#[derive(Clone, Debug)]
pub struct CatalogStore {
    locations: CatalogLocations,
}

impl CatalogStore {
    pub fn new(locations: CatalogLocations) -> Self {
        Self { locations }
    }

    pub fn locations(&self) -> &CatalogLocations {
        &self.locations
    }

    pub fn override_path(&self) -> &Path {
        &self.locations.override_path
    }

    pub fn load(&self) -> Result<Catalog, CatalogError> {
        self.load_with_source().map(|loaded| loaded.catalog)
    }

    /// Reads the override file, falling back to the default source on any failure.
    ///
    /// Fails only when neither source yields a valid catalog.
    pub fn load_with_source(&self) -> Result<LoadedCatalog, CatalogError> {
        let override_source = CatalogSource::File(self.locations.override_path.clone());
        let override_error = match read_catalog(&override_source) {
            Ok(catalog) => {
                info!(
                    event_name = "catalog.load.override",
                    path = %self.locations.override_path.display(),
                    entries = catalog.services().len(),
                    "loaded catalog override"
                );
                return Ok(LoadedCatalog { catalog, source: override_source });
            }
            Err(error) => error,
        };

        if override_error.is_not_found() {
            debug!(
                event_name = "catalog.load.fallback",
                path = %self.locations.override_path.display(),
                "no catalog override present, using default"
            );
        } else {
            warn!(
                event_name = "catalog.load.fallback",
                error = %override_error,
                "catalog override is unusable, using default"
            );
        }

        match read_catalog(&self.locations.default) {
            Ok(catalog) => {
                info!(
                    event_name = "catalog.load.default",
                    source = %self.locations.default,
                    entries = catalog.services().len(),
                    "loaded default catalog"
                );
                Ok(LoadedCatalog { catalog, source: self.locations.default.clone() })
            }
            Err(default_error) => {
                error!(
                    event_name = "catalog.load.unavailable",
                    override_error = %override_error,
                    default_error = %default_error,
                    "no usable catalog"
                );
                Err(CatalogError::Unavailable {
                    override_error: Box::new(override_error),
                    default_error: Box::new(default_error),
                })
            }
        }
    }

    /// Best-effort persist. Failures are logged and reported as `false`; the caller's
    /// in-memory catalog stays authoritative either way.
    pub fn save(&self, catalog: &Catalog) -> bool {
        match self.try_save(catalog) {
            Ok(()) => {
                info!(
                    event_name = "catalog.save.completed",
                    path = %self.locations.override_path.display(),
                    entries = catalog.services().len(),
                    "catalog saved"
                );
                true
            }
            Err(error) => {
                warn!(
                    event_name = "catalog.save.failed",
                    error = %error,
                    "catalog save failed, keeping in-memory catalog"
                );
                false
            }
        }
    }

    pub fn try_save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let path = &self.locations.override_path;
        let json = catalog.to_json().map_err(|source| CatalogError::Format {
            origin: CatalogSource::File(path.clone()),
            source,
        })?;
        write_atomically(path, json.as_bytes())
            .map_err(|source| CatalogError::Write { path: path.clone(), source })
    }
}

fn read_catalog(origin: &CatalogSource) -> Result<Catalog, CatalogError> {
    let raw = match origin {
        CatalogSource::Packaged => Cow::Borrowed(PACKAGED_CATALOG),
        CatalogSource::File(path) => Cow::Owned(
            fs::read_to_string(path)
                .map_err(|source| CatalogError::Read { origin: origin.clone(), source })?,
        ),
    };

    Catalog::from_json(&raw)
        .map_err(|source| CatalogError::Format { origin: origin.clone(), source })
}

/// The session's authoritative catalog plus the store it persists to.
///
/// Edits apply in memory first and are then saved best-effort; each mutator reports
/// whether the save succeeded.
#[derive(Clone, Debug)]
pub struct LiveCatalog {
    store: CatalogStore,
    catalog: Catalog,
    source: CatalogSource,
}

impl LiveCatalog {
    pub fn open(store: CatalogStore) -> Result<Self, CatalogError> {
        let LoadedCatalog { catalog, source } = store.load_with_source()?;
        Ok(Self { store, catalog, source })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Where the catalog was loaded from at open time.
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn price_of(&self, code: &str) -> Decimal {
        self.catalog.price_of(code)
    }

    pub fn replace(&mut self, catalog: Catalog) -> Result<bool, DomainError> {
        catalog.validate()?;
        self.catalog = catalog;
        Ok(self.store.save(&self.catalog))
    }

    /// Replaces the catalog from raw JSON text. Invalid input leaves it unchanged.
    pub fn replace_from_json(&mut self, raw: &str) -> Result<bool, CatalogFormatError> {
        self.catalog = Catalog::from_json(raw)?;
        Ok(self.store.save(&self.catalog))
    }

    pub fn set_price(&mut self, code: &str, unit_price: Decimal) -> Result<bool, DomainError> {
        self.catalog.set_price(code, unit_price)?;
        Ok(self.store.save(&self.catalog))
    }

    pub fn pretty_json(&self) -> String {
        self.catalog.pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{
        CatalogError, CatalogLocations, CatalogSource, CatalogStore, LiveCatalog, PACKAGED_CATALOG,
    };
    use crate::cpq::catalog::Catalog;
    use crate::domain::service::ServiceEntry;

    fn store_in(dir: &TempDir) -> CatalogStore {
        CatalogStore::new(CatalogLocations::new(dir.path().join("pricing.json")))
    }

    #[test]
    fn packaged_catalog_prices_every_recognized_code() {
        let catalog = Catalog::from_json(PACKAGED_CATALOG).expect("packaged catalog parses");

        assert!(catalog.missing_codes().is_empty());
        assert!(catalog.duplicate_codes().is_empty());
    }

    #[test]
    fn missing_override_falls_back_to_packaged_default() {
        let dir = TempDir::new().expect("temp dir");
        let loaded = store_in(&dir).load_with_source().expect("load");

        assert_eq!(loaded.source, CatalogSource::Packaged);
        assert_eq!(loaded.catalog.services().len(), 12);
    }

    #[test]
    fn valid_override_wins_over_default() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("pricing.json");
        fs::write(&path, r#"{"services":[{"code":"camera","name":"Cam","unitPrice":31}]}"#)
            .expect("write override");

        let loaded = store_in(&dir).load_with_source().expect("load");

        assert_eq!(loaded.source, CatalogSource::File(path));
        assert_eq!(loaded.catalog.price_of("camera"), Decimal::new(31, 0));
    }

    #[test]
    fn corrupt_override_falls_back_silently() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("pricing.json"), "{\"services\": [").expect("write override");

        let loaded = store_in(&dir).load_with_source().expect("load");

        assert_eq!(loaded.source, CatalogSource::Packaged);
    }

    #[test]
    fn both_sources_failing_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let locations = CatalogLocations::new(dir.path().join("pricing.json"))
            .with_default_file(dir.path().join("bundled.json"));

        let error = CatalogStore::new(locations).load().expect_err("no catalog available");

        match error {
            CatalogError::Unavailable { override_error, default_error } => {
                assert!(matches!(*override_error, CatalogError::Read { .. }));
                assert!(matches!(*default_error, CatalogError::Read { .. }));
            }
            other => panic!("expected unavailable catalog, got {other}"),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let store = store_in(&dir);
        let catalog = Catalog::new(vec![
            ServiceEntry::new("base_server", "Managed Server", Decimal::new(17550, 2)),
            ServiceEntry::new("nvr_32", "NVR 32 Port", Decimal::new(725, 0)),
        ]);

        assert!(store.save(&catalog));
        assert_eq!(store.load().expect("reload"), catalog);
    }

    #[test]
    fn failed_save_keeps_in_memory_edit() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("seed blocker");
        let store = CatalogStore::new(CatalogLocations::new(blocker.join("pricing.json")));

        let mut live = LiveCatalog::open(store).expect("open falls back to packaged");
        let persisted = live.set_price("camera", Decimal::new(99, 0)).expect("valid edit");

        assert!(!persisted);
        assert_eq!(live.price_of("camera"), Decimal::new(99, 0));
        assert!(matches!(live.store().try_save(live.catalog()), Err(CatalogError::Write { .. })));
    }

    #[test]
    fn invalid_json_replacement_leaves_catalog_unchanged() {
        let dir = TempDir::new().expect("temp dir");
        let mut live = LiveCatalog::open(store_in(&dir)).expect("open");
        let before = live.catalog().clone();

        assert!(live.replace_from_json("{\"services\": 12}").is_err());
        assert_eq!(live.catalog(), &before);
        assert!(!dir.path().join("pricing.json").exists());
    }

    #[test]
    fn replacement_is_persisted_and_reloaded() {
        let dir = TempDir::new().expect("temp dir");
        let mut live = LiveCatalog::open(store_in(&dir)).expect("open");

        let persisted = live
            .replace_from_json(r#"{"services":[{"code":"webroot","name":"W","unitPrice":2.75}]}"#)
            .expect("valid replacement");
        let reopened = LiveCatalog::open(store_in(&dir)).expect("reopen");

        assert!(persisted);
        assert_eq!(reopened.price_of("webroot"), Decimal::new(275, 2));
        assert_eq!(reopened.source(), &CatalogSource::File(dir.path().join("pricing.json")));
    }
}
