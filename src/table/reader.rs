//! Reading raw precipitation tables and grouping them into per-station series.

use crate::table::error::TableError;
use crate::types::observation::{DailyObservation, RawObservation};
use crate::types::station::{StationInfo, StationSeries};
use bon::Builder;
use chrono::NaiveDate;
use log::{debug, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Column positions of the raw IMGW daily precipitation archives, which carry no header.
const IMGW_POSITIONS: [usize; 7] = [0, 1, 2, 3, 4, 5, 7];
const IMGW_COLUMNS: [&str; 7] = [
    "station_code",
    "station_name",
    "year",
    "month",
    "day",
    "total_precip",
    "precip_type",
];

/// How the columns of an input file are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLayout {
    /// A header row naming `station_code`, `date` or `year`/`month`/`day`, and `total_precip`.
    #[default]
    Headered,
    /// The headerless IMGW archive layout, columns identified by position.
    Imgw,
}

/// Options for reading observation files.
#[derive(Debug, Clone, Builder)]
pub struct ReadOptions {
    #[builder(default)]
    pub layout: InputLayout,
    #[builder(default = b',')]
    pub separator: u8,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::builder().build()
    }
}

/// Reads one observation file into raw rows.
///
/// Every column is read as text and parsed here, so bad values are reported with the
/// column and row they came from instead of being coerced to null. Text is decoded as
/// lossy UTF-8 since the IMGW archives are cp1250.
///
/// # Errors
///
/// [`TableError::CsvRead`] if the file cannot be parsed as CSV, otherwise any error
/// from [`observations_from_frame`].
pub fn read_observations_csv(
    path: &Path,
    options: &ReadOptions,
) -> Result<Vec<RawObservation>, TableError> {
    let frame = read_text_frame(path, options.layout == InputLayout::Headered, options.separator)?;
    let frame = match options.layout {
        InputLayout::Headered => frame,
        InputLayout::Imgw => imgw_columns(&frame)?,
    };
    let rows = observations_from_frame(&frame)?;
    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Reads every file under `<dir>/<year>/` for the years in `years`.
///
/// Subdirectories whose name is not a year, or is a year outside the range, are
/// skipped. Years and files are visited in sorted order so the row order is stable.
pub fn read_observations_dir(
    dir: &Path,
    years: RangeInclusive<i32>,
    options: &ReadOptions,
) -> Result<Vec<RawObservation>, TableError> {
    let mut year_dirs: Vec<(i32, PathBuf)> = Vec::new();
    for entry in sorted_entries(dir)? {
        let Some(year) = entry
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<i32>().ok())
        else {
            debug!("Skipping non-year entry {:?}", entry);
            continue;
        };
        if years.contains(&year) && entry.is_dir() {
            year_dirs.push((year, entry));
        }
    }
    year_dirs.sort();

    let mut rows = Vec::new();
    for (year, year_dir) in year_dirs {
        let files = sorted_entries(&year_dir)?;
        debug!("Reading {} file(s) for {}", files.len(), year);
        for file in files.iter().filter(|path| path.is_file()) {
            rows.extend(read_observations_csv(file, options)?);
        }
    }
    info!(
        "Read {} observation rows for {}..={} from {:?}",
        rows.len(),
        years.start(),
        years.end(),
        dir
    );
    Ok(rows)
}

/// Converts a polars frame into raw rows.
///
/// Requires `station_code`, `total_precip`, and either `date` (`YYYY-MM-DD`) or integer
/// `year`, `month` and `day` columns. `precip_type`, `name` (falling back to
/// `station_name`), `lat` and `lon` are picked up when present. Empty, `NaN` and `NA`
/// precipitation values count as missing.
///
/// # Errors
///
/// * [`TableError::MissingColumn`] for an absent required column.
/// * [`TableError::InvalidDate`] for dates that do not exist or do not parse.
/// * [`TableError::InvalidValue`] for an empty station code or a non-numeric precipitation value.
pub fn observations_from_frame(frame: &DataFrame) -> Result<Vec<RawObservation>, TableError> {
    let codes = required_text(frame, "station_code")?;
    let precip = required_text(frame, "total_precip")?;
    let dates = DateColumns::from_frame(frame)?;
    let precip_type = optional_text(frame, "precip_type")?;
    let name = match optional_text(frame, "name")? {
        Some(name) => Some(name),
        None => optional_text(frame, "station_name")?,
    };
    let latitude = optional_text(frame, "lat")?;
    let longitude = optional_text(frame, "lon")?;

    let mut rows = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let station_code = match codes.get(row).map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                return Err(TableError::InvalidValue {
                    column: "station_code".into(),
                    row,
                    message: "station code is empty".into(),
                })
            }
        };
        let date = dates.date_at(row, &station_code)?;
        let total_precip = parse_precip(precip.get(row)).map_err(|value| TableError::InvalidValue {
            column: "total_precip".into(),
            row,
            message: format!("'{}' is not a number", value),
        })?;

        rows.push(RawObservation {
            station_code,
            date,
            total_precip,
            precip_type: text_at(&precip_type, row),
            name: text_at(&name, row),
            latitude: text_at(&latitude, row),
            longitude: text_at(&longitude, row),
        });
    }
    Ok(rows)
}

/// Groups raw rows into one series per station, sorted by station code.
///
/// Descriptive fields are taken from the first row that carries them. A later row
/// with a different value is logged and ignored.
///
/// # Errors
///
/// * [`TableError::InvalidValue`] for a row with an empty station code.
/// * [`TableError::DuplicateKey`] if a station has two rows for the same date.
pub fn group_by_station(
    rows: Vec<RawObservation>,
) -> Result<Vec<StationSeries<DailyObservation>>, TableError> {
    let mut stations: BTreeMap<String, (StationInfo, BTreeMap<NaiveDate, DailyObservation>)> =
        BTreeMap::new();

    for (index, row) in rows.into_iter().enumerate() {
        if row.station_code.trim().is_empty() {
            return Err(TableError::InvalidValue {
                column: "station_code".into(),
                row: index,
                message: "station code is empty".into(),
            });
        }
        let (info, days) = stations
            .entry(row.station_code.clone())
            .or_insert_with(|| (StationInfo::new(row.station_code.clone()), BTreeMap::new()));

        merge_field(&row.station_code, "name", &mut info.name, row.name);
        merge_field(&row.station_code, "lat", &mut info.latitude, row.latitude);
        merge_field(&row.station_code, "lon", &mut info.longitude, row.longitude);

        let observation = DailyObservation {
            date: row.date,
            total_precip: row.total_precip,
            precip_type: row.precip_type,
        };
        if days.insert(row.date, observation).is_some() {
            return Err(TableError::DuplicateKey {
                station: row.station_code,
                date: row.date,
            });
        }
    }

    Ok(stations
        .into_values()
        .map(|(info, days)| StationSeries::new(info, days.into_values().collect()))
        .collect())
}

fn merge_field(station: &str, field: &str, slot: &mut Option<String>, value: Option<String>) {
    match (slot.as_deref(), value) {
        (None, Some(value)) => *slot = Some(value),
        (Some(existing), Some(value)) if existing != value => warn!(
            "Station {} has conflicting {} values '{}' and '{}', keeping the first",
            station, field, existing, value
        ),
        _ => {}
    }
}

/// Reads a CSV file with every column as text.
pub(crate) fn read_text_frame(
    path: &Path,
    has_header: bool,
    separator: u8,
) -> Result<DataFrame, TableError> {
    CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_encoding(CsvEncoding::LossyUtf8),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| TableError::CsvRead(path.to_path_buf(), e))
}

fn imgw_columns(frame: &DataFrame) -> Result<DataFrame, TableError> {
    let columns = frame.get_columns();
    let picked = IMGW_POSITIONS
        .iter()
        .zip(IMGW_COLUMNS)
        .map(|(&position, name)| {
            columns
                .get(position)
                .map(|column| column.clone().with_name(name.into()))
                .ok_or_else(|| TableError::MissingColumn {
                    column: format!("{} (position {})", name, position),
                })
        })
        .collect::<Result<Vec<Column>, TableError>>()?;
    Ok(DataFrame::new(picked)?)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| TableError::Io(dir.to_path_buf(), e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TableError::Io(dir.to_path_buf(), e))?;
    entries.sort();
    Ok(entries)
}

fn required_text(frame: &DataFrame, name: &str) -> Result<StringChunked, TableError> {
    optional_text(frame, name)?.ok_or_else(|| TableError::MissingColumn {
        column: name.to_string(),
    })
}

fn optional_text(frame: &DataFrame, name: &str) -> Result<Option<StringChunked>, TableError> {
    let Ok(column) = frame.column(name) else {
        return Ok(None);
    };
    let as_text = column
        .cast(&DataType::String)
        .map_err(|source| TableError::ColumnType {
            column: name.to_string(),
            source,
        })?;
    let chunked = as_text.str().map_err(|source| TableError::ColumnType {
        column: name.to_string(),
        source,
    })?;
    Ok(Some(chunked.clone()))
}

fn text_at(column: &Option<StringChunked>, row: usize) -> Option<String> {
    column
        .as_ref()
        .and_then(|c| c.get(row))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `Ok(None)` for missing values, `Err` with the offending text for garbage.
fn parse_precip(value: Option<&str>) -> Result<Option<f64>, String> {
    let Some(text) = value.map(str::trim) else {
        return Ok(None);
    };
    if text.is_empty() || text.eq_ignore_ascii_case("nan") || text.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(_) => Err(text.to_string()),
    }
}

/// The date of each row, from either a `date` column or a `year`/`month`/`day` triple.
enum DateColumns {
    Single(StringChunked),
    Triple {
        year: StringChunked,
        month: StringChunked,
        day: StringChunked,
    },
}

impl DateColumns {
    fn from_frame(frame: &DataFrame) -> Result<Self, TableError> {
        if let Some(date) = optional_text(frame, "date")? {
            return Ok(DateColumns::Single(date));
        }
        Ok(DateColumns::Triple {
            year: required_text(frame, "year")?,
            month: required_text(frame, "month")?,
            day: required_text(frame, "day")?,
        })
    }

    fn date_at(&self, row: usize, station: &str) -> Result<NaiveDate, TableError> {
        let invalid = |value: String| TableError::InvalidDate {
            station: station.to_string(),
            value,
        };
        match self {
            DateColumns::Single(date) => {
                let text = date.get(row).map(str::trim).unwrap_or_default();
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid(text.to_string()))
            }
            DateColumns::Triple { year, month, day } => {
                let parts = [year.get(row), month.get(row), day.get(row)]
                    .map(|part| part.map(str::trim).unwrap_or_default());
                let display = parts.join("-");
                let year = parts[0].parse::<i32>().map_err(|_| invalid(display.clone()))?;
                let month = parts[1].parse::<u32>().map_err(|_| invalid(display.clone()))?;
                let day = parts[2].parse::<u32>().map_err(|_| invalid(display.clone()))?;
                NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(display))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reads_headered_csv_with_date_triple() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("obs.csv");
        fs::write(
            &path,
            "station_code,name,year,month,day,total_precip,precip_type\n\
             00123,Białystok,2020,1,2,1.5,W\n\
             00123,Białystok,2020,1,3,,\n\
             00456,Suwałki,2020,1,2,NaN,S\n",
        )?;

        let rows = read_observations_csv(&path, &ReadOptions::default())?;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].station_code, "00123");
        assert_eq!(rows[0].date, date(2020, 1, 2));
        assert_eq!(rows[0].total_precip, Some(1.5));
        assert_eq!(rows[0].precip_type.as_deref(), Some("W"));
        assert_eq!(rows[0].name.as_deref(), Some("Białystok"));
        assert_eq!(rows[1].total_precip, None);
        assert_eq!(rows[1].precip_type, None);
        assert_eq!(rows[2].total_precip, None);
        Ok(())
    }

    #[test]
    fn reads_imgw_layout_by_position() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("o_d_01_2001.csv");
        fs::write(
            &path,
            "249180010,\"ZAKOPANE\",2001,01,01,4.2,0,W,\n\
             249180010,\"ZAKOPANE\",2001,01,02,0.0,0,,\n",
        )?;

        let options = ReadOptions::builder().layout(InputLayout::Imgw).build();
        let rows = read_observations_csv(&path, &options)?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station_code, "249180010");
        assert_eq!(rows[0].name.as_deref(), Some("ZAKOPANE"));
        assert_eq!(rows[0].precip_type.as_deref(), Some("W"));
        assert_eq!(rows[1].date, date(2001, 1, 2));
        assert_eq!(rows[1].total_precip, Some(0.0));
        Ok(())
    }

    #[test]
    fn reads_only_requested_year_directories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        for year in [1999, 2000, 2001] {
            let year_dir = dir.path().join(year.to_string());
            fs::create_dir(&year_dir)?;
            fs::write(
                year_dir.join("data.csv"),
                format!("station_code,date,total_precip\nX,{}-06-01,1.0\n", year),
            )?;
        }
        fs::create_dir(dir.path().join("notes"))?;

        let rows = read_observations_dir(dir.path(), 2000..=2001, &ReadOptions::default())?;

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2000, 6, 1), date(2001, 6, 1)]);
        Ok(())
    }

    #[test]
    fn missing_column_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!("station_code" => ["A"], "date" => ["2020-01-01"])?;
        match observations_from_frame(&frame) {
            Err(TableError::MissingColumn { column }) => assert_eq!(column, "total_precip"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn invalid_date_names_station() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            "station_code" => ["A"],
            "year" => [2021i32],
            "month" => [2i32],
            "day" => [30i32],
            "total_precip" => [1.0f64],
        )?;
        match observations_from_frame(&frame) {
            Err(TableError::InvalidDate { station, value }) => {
                assert_eq!(station, "A");
                assert_eq!(value, "2021-2-30");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn garbage_precipitation_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let frame = df!(
            "station_code" => ["A", "A"],
            "date" => ["2020-01-01", "2020-01-02"],
            "total_precip" => ["1.0", "lots"],
        )?;
        assert!(matches!(
            observations_from_frame(&frame),
            Err(TableError::InvalidValue { row: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn groups_by_station_and_sorts_dates() -> Result<(), TableError> {
        let mut late = RawObservation::new("B", date(2020, 1, 5), Some(2.0));
        late.name = Some("Bravo".into());
        let rows = vec![
            late,
            RawObservation::new("A", date(2020, 1, 1), Some(1.0)),
            RawObservation::new("B", date(2020, 1, 1), None),
        ];

        let grouped = group_by_station(rows)?;

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].code(), "A");
        assert_eq!(grouped[1].code(), "B");
        assert_eq!(grouped[1].station.name.as_deref(), Some("Bravo"));
        let dates: Vec<NaiveDate> = grouped[1].records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 1, 5)]);
        Ok(())
    }

    #[test]
    fn grouping_rejects_empty_station_code() {
        let rows = vec![
            RawObservation::new("A", date(2020, 1, 1), Some(1.0)),
            RawObservation::new(" ", date(2020, 1, 2), Some(1.0)),
        ];
        match group_by_station(rows) {
            Err(TableError::InvalidValue { column, row, .. }) => {
                assert_eq!(column, "station_code");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_station_date_fails_fast() {
        let rows = vec![
            RawObservation::new("A", date(2020, 1, 1), Some(1.0)),
            RawObservation::new("A", date(2020, 1, 1), Some(2.0)),
        ];
        assert!(matches!(
            group_by_station(rows),
            Err(TableError::DuplicateKey { .. })
        ));
    }
}
