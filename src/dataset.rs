//! Highway dataset of connected city pairs
//!
//! Loaded from a CSV file with a `start_city,end_city` header and an
//! optional `highway` column. The route source only consults it to decide
//! whether a dataset-constrained prompt is worth attempting and to list the
//! permitted connections in that prompt.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{PlannerError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighwayRow {
    pub start_city: String,
    pub end_city: String,
    #[serde(default)]
    pub highway: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HighwayDataset {
    rows: Vec<HighwayRow>,
    cities: HashSet<String>,
}

fn normalize(city: &str) -> String {
    city.trim().to_lowercase()
}

impl HighwayDataset {
    pub fn from_rows(rows: Vec<HighwayRow>) -> Self {
        let cities = rows
            .iter()
            .flat_map(|row| [normalize(&row.start_city), normalize(&row.end_city)])
            .filter(|city| !city.is_empty())
            .collect();
        Self { rows, cities }
    }

    /// Parse CSV content from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for record in csv_reader.deserialize::<HighwayRow>() {
            match record {
                Ok(row) if !row.start_city.is_empty() && !row.end_city.is_empty() => rows.push(row),
                Ok(_) => skipped += 1,
                Err(e) => {
                    warn!("Skipping malformed dataset row: {}", e);
                    skipped += 1;
                }
            }
        }

        if rows.is_empty() && skipped > 0 {
            return Err(PlannerError::parse(
                "No valid rows could be parsed from highway dataset",
            ));
        }

        info!("Loaded {} highway rows ({} skipped)", rows.len(), skipped);
        Ok(Self::from_rows(rows))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading highway dataset from: {:?}", path);
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load the dataset if configured, treating any failure as "no dataset"
    pub fn load_optional(path: Option<&str>) -> Option<Self> {
        let path = path?;
        if !Path::new(path).exists() {
            warn!("Highway dataset not found at {}, continuing without it", path);
            return None;
        }
        match Self::load(path) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                warn!("Failed to load highway dataset {}: {}", path, e);
                None
            }
        }
    }

    /// Case-insensitive membership over both city columns
    #[must_use]
    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.contains(&normalize(city))
    }

    /// One line per row, e.g. `Delhi -> Kanpur (NH2)`
    #[must_use]
    pub fn describe_connections(&self) -> String {
        self.rows
            .iter()
            .map(|row| match &row.highway {
                Some(highway) if !highway.is_empty() => {
                    format!("{} -> {} ({})", row.start_city, row.end_city, highway)
                }
                _ => format!("{} -> {}", row.start_city, row.end_city),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
