//! CSV and JSON readers for the two flat inputs.
//!
//! Price files are `Date,Price` tables. Event files are either a CSV table
//! or a JSON array of records; both go through [`RawEvent`] so field aliases
//! and validation are shared.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, warn};
use serde::Deserialize;

use super::parse_date;
use crate::domain::{PricePoint, RawEvent};
use crate::error::DataError;

/// How out-of-order price rows are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadOrder {
    /// Keep file order; the store rejects anything not strictly increasing.
    #[default]
    Strict,
    /// Sort rows by date first. Duplicates are still rejected.
    SortByDate,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(rename = "Date", alias = "date", alias = "DATE")]
    date: String,
    #[serde(rename = "Price", alias = "price", alias = "PRICE")]
    price: String,
}

/// Read a `Date,Price` table.
pub fn read_prices<R: Read>(reader: R, order: LoadOrder) -> Result<Vec<PricePoint>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (record, row) in rdr.deserialize::<PriceRecord>().enumerate() {
        let row = row?;
        let date = parse_date(&row.date)?;
        let price = row.price.parse::<f64>().map_err(|_| DataError::InvalidField {
            record,
            field: "Price",
            value: row.price.clone(),
        })?;
        points.push(PricePoint::new(date, price));
    }

    if order == LoadOrder::SortByDate {
        points.sort_by_key(|p| p.date);
    }
    debug!("read {} price rows", points.len());
    Ok(points)
}

pub fn read_prices_file(path: &Path, order: LoadOrder) -> Result<Vec<PricePoint>, DataError> {
    let file = File::open(path)?;
    read_prices(BufReader::new(file), order)
}

/// Serialization format of an event file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    Csv,
    Json,
}

impl EventFormat {
    /// Guess from the file extension. Anything but `.json` is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => EventFormat::Json,
            _ => EventFormat::Csv,
        }
    }
}

/// Read unvalidated event records.
pub fn read_events<R: Read>(reader: R, format: EventFormat) -> Result<Vec<RawEvent>, DataError> {
    let raw = match format {
        EventFormat::Json => serde_json::from_reader::<_, Vec<RawEvent>>(reader)?,
        EventFormat::Csv => {
            let mut rdr = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader);
            rdr.deserialize().collect::<Result<Vec<RawEvent>, _>>()?
        }
    };
    if raw.is_empty() {
        warn!("event file contains no records");
    }
    Ok(raw)
}

pub fn read_events_file(path: &Path) -> Result<Vec<RawEvent>, DataError> {
    let file = File::open(path)?;
    read_events(BufReader::new(file), EventFormat::from_path(path))
}
