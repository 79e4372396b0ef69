//! Sales records and the JSON loader that reads them.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

/// Make, model and model year of a car.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
}

/// A single line of the monthly sales export.
///
/// `price` is kept exactly as it appears in the source file (for example
/// `"$1234.56"`); it is only interpreted when revenue is computed, using an
/// explicit [`NumberFormat`](crate::number::NumberFormat).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: u64,
    pub car: Car,
    pub price: String,
    pub total_sales: u64,
}

/// Returns the display name of a car, e.g. `Toyota Corolla (2020)`.
pub fn format_car(car: &Car) -> String {
    format!("{} {} ({})", car.car_make, car.car_model, car.car_year)
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_car(self))
    }
}

/// Errors raised while reading the sales export.
#[derive(Debug)]
pub enum LoadError {
    /// The file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The file is not a JSON array of well-formed sales records.
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "Failed to read sales data from {}", path.display()),
            Self::Json {
                path: Some(path), ..
            } => write!(f, "Malformed sales data in {}", path.display()),
            Self::Json { path: None, .. } => write!(f, "Malformed sales data"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

/// Parses a JSON array of sales records, keeping the input order.
pub fn parse_sales(text: &str) -> Result<Vec<SaleRecord>, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Json { path: None, source })
}

/// Reads and parses the sales export at `path`.
pub fn load_sales(path: impl AsRef<Path>) -> Result<Vec<SaleRecord>, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records: Vec<SaleRecord> =
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: Some(path.to_path_buf()),
            source,
        })?;

    debug!("Loaded {} sales records from {}", records.len(), path.display());
    Ok(records)
}
