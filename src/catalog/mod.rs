//! Read-only directory collections.
//!
//! The catalog is loaded once at startup and handed out by reference; nothing
//! mutates it afterwards. Each collection is fetched from a [`CatalogSource`]
//! and falls back to the embedded payload when that source fails.

pub mod models;

use std::{fmt, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub use models::{Complexity, Doctor, HospitalTool, Location, Medicine};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Doctors,
    Medicines,
    HospitalTools,
    Locations,
}

impl Collection {
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Doctors => "doctors.json",
            Collection::Medicines => "medicines.json",
            Collection::HospitalTools => "hospital_tools.json",
            Collection::Locations => "locations.json",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            Collection::Doctors => include_str!("data/doctors.json"),
            Collection::Medicines => include_str!("data/medicines.json"),
            Collection::HospitalTools => include_str!("data/hospital_tools.json"),
            Collection::Locations => include_str!("data/locations.json"),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Doctors => "doctors",
            Collection::Medicines => "medicines",
            Collection::HospitalTools => "hospital tools",
            Collection::Locations => "locations",
        };
        f.write_str(name)
    }
}

/// Where raw collection payloads (JSON arrays) come from.
pub trait CatalogSource {
    fn fetch(&self, collection: Collection) -> Result<String>;
}

/// The payloads compiled into the binary.
pub struct EmbeddedSource;

impl CatalogSource for EmbeddedSource {
    fn fetch(&self, collection: Collection) -> Result<String> {
        Ok(collection.embedded().to_string())
    }
}

/// `<dir>/<collection>.json` files, e.g. an export from the backend.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CatalogSource for DirectorySource {
    fn fetch(&self, collection: Collection) -> Result<String> {
        let path = self.dir.join(collection.file_name());
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read {collection} from {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    doctors: Arc<[Doctor]>,
    medicines: Arc<[Medicine]>,
    hospital_tools: Arc<[HospitalTool]>,
    locations: Arc<[Location]>,
}

impl Catalog {
    /// The embedded collections. These are checked by the test suite, so a
    /// parse failure here is a build defect rather than a runtime condition.
    pub fn builtin() -> Result<Self> {
        Self::from_source(&EmbeddedSource)
    }

    /// Every collection from `source`, with no fallback.
    pub fn from_source(source: &dyn CatalogSource) -> Result<Self> {
        Ok(Self {
            doctors: parse(source, Collection::Doctors)?,
            medicines: parse(source, Collection::Medicines)?,
            hospital_tools: parse(source, Collection::HospitalTools)?,
            locations: parse(source, Collection::Locations)?,
        })
    }

    /// Each collection from `primary`, substituting the embedded payload for
    /// any collection that cannot be fetched or parsed.
    pub fn load(primary: &dyn CatalogSource) -> Result<Self> {
        let catalog = Self {
            doctors: parse_or_embedded(primary, Collection::Doctors)?,
            medicines: parse_or_embedded(primary, Collection::Medicines)?,
            hospital_tools: parse_or_embedded(primary, Collection::HospitalTools)?,
            locations: parse_or_embedded(primary, Collection::Locations)?,
        };
        log_info!(
            "Catalog loaded: {} doctors, {} medicines, {} hospital tools, {} locations",
            catalog.doctors.len(),
            catalog.medicines.len(),
            catalog.hospital_tools.len(),
            catalog.locations.len()
        );
        Ok(catalog)
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn hospital_tools(&self) -> &[HospitalTool] {
        &self.hospital_tools
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn doctor(&self, id: u32) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn medicine(&self, id: u32) -> Option<&Medicine> {
        self.medicines.iter().find(|m| m.id == id)
    }

    pub fn hospital_tool(&self, id: u32) -> Option<&HospitalTool> {
        self.hospital_tools.iter().find(|t| t.id == id)
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }
}

fn parse<T: DeserializeOwned>(source: &dyn CatalogSource, collection: Collection) -> Result<Arc<[T]>> {
    let raw = source.fetch(collection)?;
    let records: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {collection} payload"))?;
    Ok(records.into())
}

fn parse_or_embedded<T: DeserializeOwned>(
    primary: &dyn CatalogSource,
    collection: Collection,
) -> Result<Arc<[T]>> {
    match parse(primary, collection) {
        Ok(records) => Ok(records),
        Err(err) => {
            log_warn!("Using embedded {collection}: {err:#}");
            parse(&EmbeddedSource, collection)
        }
    }
}
