//! Parser for NSRDB PSM3 CSV downloads.
//!
//! Layout: a metadata header row, a metadata value row, a column header row and
//! then one comma-separated row per timestep. Data rows carry local standard
//! time in `Year, Month, Day, Hour, Minute` columns, offset by the metadata
//! `Time Zone` field.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeMap, HashMap};
use strum::{Display, EnumString};

use crate::domain::{StationMetadata, WeatherError, WeatherRecord};

const INTEGER_COLUMNS: [&str; 7] = ["Year", "Month", "Day", "Hour", "Minute", "Cloud Type", "Fill Flag"];

const DEFAULT_AIR_TEMPERATURE_C: f64 = 25.0;
const DEFAULT_WIND_SPEED_MS: f64 = 1.0;
const DEFAULT_PRESSURE_PA: f64 = 101_325.0;
const DEFAULT_ALBEDO: f64 = 0.2;
const PA_PER_MBAR: f64 = 100.0;

/// Canonical names for PSM3 source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum WeatherVariable {
    Ghi,
    Dhi,
    Dni,
    GhiClear,
    DhiClear,
    DniClear,
    SolarZenith,
    AirTemperature,
    RelativeHumidity,
    TempDew,
    Pressure,
    WindDirection,
    WindSpeed,
    Albedo,
    PrecipitableWater,
    SurfacePressure,
}

impl WeatherVariable {
    pub fn from_source(column: &str) -> Option<Self> {
        let v = match column {
            "GHI" => Self::Ghi,
            "DHI" => Self::Dhi,
            "DNI" => Self::Dni,
            "Clearsky GHI" => Self::GhiClear,
            "Clearsky DHI" => Self::DhiClear,
            "Clearsky DNI" => Self::DniClear,
            "Solar Zenith Angle" => Self::SolarZenith,
            "Temperature" => Self::AirTemperature,
            "Relative Humidity" => Self::RelativeHumidity,
            "Dew Point" | "Dew point" => Self::TempDew,
            "Pressure" => Self::Pressure,
            "Wind Direction" => Self::WindDirection,
            "Wind Speed" => Self::WindSpeed,
            "Surface Albedo" => Self::Albedo,
            "Precipitable Water" => Self::PrecipitableWater,
            "Surface Pressure" => Self::SurfacePressure,
            _ => return None,
        };
        Some(v)
    }
}

/// Typed cell of a data row.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Int(i64),
    Float(f64),
}

impl Cell {
    fn as_f64(self) -> f64 {
        match self {
            Cell::Int(v) => v as f64,
            Cell::Float(v) => v,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Cell::Int(v) => v,
            Cell::Float(v) => v as i64,
        }
    }
}

/// Parsed PSM3 payload, before series-level validation.
#[derive(Debug, Clone)]
pub struct Psm3Data {
    pub metadata: StationMetadata,
    pub records: Vec<WeatherRecord>,
}

pub fn parse_psm3(body: &str) -> Result<Psm3Data, WeatherError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());
    let mut rows = reader.records();

    let mut next_row = |what: &str| -> Result<StringRecord, WeatherError> {
        rows.next()
            .ok_or_else(|| WeatherError::Parse(format!("missing {what} row")))?
            .map_err(|e| WeatherError::Parse(format!("{what} row: {e}")))
    };

    let fields = next_row("metadata header")?;
    let values = next_row("metadata value")?;
    let metadata = parse_metadata(&fields, &values)?;

    let header = next_row("column header")?;
    let columns: Vec<String> = header
        .iter()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let index = ColumnIndex::new(&columns)?;

    let offset = FixedOffset::east_opt(metadata.time_zone * 3600)
        .ok_or_else(|| WeatherError::Parse(format!("invalid time zone {}", metadata.time_zone)))?;

    let mut records = Vec::with_capacity(8784);
    for (line, row) in rows.enumerate() {
        let row = row.map_err(|e| WeatherError::Parse(format!("data row {line}: {e}")))?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let cells = parse_row(&columns, &row, line)?;
        records.push(index.record(&cells, offset, line)?);
    }

    Ok(Psm3Data { metadata, records })
}

fn parse_metadata(fields: &StringRecord, values: &StringRecord) -> Result<StationMetadata, WeatherError> {
    let mut raw: BTreeMap<String, String> = fields
        .iter()
        .zip(values.iter())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    fn take<T: std::str::FromStr>(raw: &mut BTreeMap<String, String>, key: &str) -> Result<T, WeatherError> {
        let value = raw
            .remove(key)
            .ok_or_else(|| WeatherError::Parse(format!("metadata field '{key}' missing")))?;
        value
            .parse::<T>()
            .map_err(|_| WeatherError::Parse(format!("metadata field '{key}' has invalid value '{value}'")))
    }

    Ok(StationMetadata {
        latitude: take(&mut raw, "Latitude")?,
        longitude: take(&mut raw, "Longitude")?,
        altitude: take(&mut raw, "Elevation")?,
        time_zone: take(&mut raw, "Time Zone")?,
        local_time_zone: take(&mut raw, "Local Time Zone")?,
        extra: raw,
    })
}

fn parse_row(columns: &[String], row: &StringRecord, line: usize) -> Result<Vec<Cell>, WeatherError> {
    if row.len() < columns.len() {
        return Err(WeatherError::Parse(format!(
            "data row {line} has {} fields, expected {}",
            row.len(),
            columns.len()
        )));
    }
    columns
        .iter()
        .zip(row.iter())
        .map(|(column, raw)| {
            let cell = if INTEGER_COLUMNS.contains(&column.as_str()) {
                raw.parse::<i64>().map(Cell::Int).ok()
            } else {
                raw.parse::<f64>().map(Cell::Float).ok()
            };
            cell.ok_or_else(|| {
                WeatherError::Parse(format!("data row {line}: column '{column}' has invalid value '{raw}'"))
            })
        })
        .collect()
}

/// Positions of the columns a [`WeatherRecord`] is built from.
struct ColumnIndex {
    year: usize,
    month: usize,
    day: usize,
    hour: usize,
    minute: usize,
    variables: HashMap<WeatherVariable, usize>,
}

impl ColumnIndex {
    fn new(columns: &[String]) -> Result<Self, WeatherError> {
        let position = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| WeatherError::Parse(format!("column '{name}' missing")))
        };
        let variables: HashMap<WeatherVariable, usize> = columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| WeatherVariable::from_source(c).map(|v| (v, i)))
            .collect();
        for required in [WeatherVariable::Ghi, WeatherVariable::Dni, WeatherVariable::Dhi] {
            if !variables.contains_key(&required) {
                return Err(WeatherError::Parse(format!("column for '{required}' missing")));
            }
        }
        Ok(Self {
            year: position("Year")?,
            month: position("Month")?,
            day: position("Day")?,
            hour: position("Hour")?,
            minute: position("Minute")?,
            variables,
        })
    }

    fn get(&self, cells: &[Cell], variable: WeatherVariable) -> Option<f64> {
        self.variables.get(&variable).map(|&i| cells[i].as_f64())
    }

    fn record(&self, cells: &[Cell], offset: FixedOffset, line: usize) -> Result<WeatherRecord, WeatherError> {
        let bad_time = || WeatherError::Parse(format!("data row {line}: invalid date/time"));
        let int = |i: usize| u32::try_from(cells[i].as_i64()).map_err(|_| bad_time());

        let year = i32::try_from(cells[self.year].as_i64()).map_err(|_| bad_time())?;
        let naive = NaiveDate::from_ymd_opt(year, int(self.month)?, int(self.day)?)
            .and_then(|d| d.and_hms_opt(int(self.hour).ok()?, int(self.minute).ok()?, 0))
            .ok_or_else(bad_time)?;
        let timestamp = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(bad_time)?;

        let surface_pressure = self
            .get(cells, WeatherVariable::SurfacePressure)
            .or_else(|| self.get(cells, WeatherVariable::Pressure))
            .map(|mbar| mbar * PA_PER_MBAR)
            .unwrap_or(DEFAULT_PRESSURE_PA);

        Ok(WeatherRecord {
            timestamp,
            dni: self.get(cells, WeatherVariable::Dni).unwrap_or_default(),
            dhi: self.get(cells, WeatherVariable::Dhi).unwrap_or_default(),
            ghi: self.get(cells, WeatherVariable::Ghi).unwrap_or_default(),
            air_temperature: self
                .get(cells, WeatherVariable::AirTemperature)
                .unwrap_or(DEFAULT_AIR_TEMPERATURE_C),
            wind_speed: self
                .get(cells, WeatherVariable::WindSpeed)
                .unwrap_or(DEFAULT_WIND_SPEED_MS),
            surface_pressure,
            albedo: self.get(cells, WeatherVariable::Albedo).unwrap_or(DEFAULT_ALBEDO),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Datelike, Duration, NaiveDate, Timelike};

    /// A full-year PSM3 body with the header layout NSRDB returns.
    pub fn psm3_body(year: i32, time_zone: i32) -> String {
        let mut body = String::from(
            "Source,Location ID,City,State,Country,Latitude,Longitude,Time Zone,Elevation,Local Time Zone,Version\n",
        );
        body.push_str(&format!(
            "NSRDB,1234567,-,-,-,23.81,90.41,{time_zone},9,{time_zone},3.2.0\n"
        ));
        body.push_str(
            "Year,Month,Day,Hour,Minute,Temperature,Dew Point,DHI,DNI,GHI,Surface Albedo,Pressure,Wind Direction,Wind Speed,\n",
        );
        let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap().and_hms_opt(0, 30, 0).unwrap();
        let mut t = start;
        while t.year() == year {
            let daylight = (6..18).contains(&t.hour());
            let ghi = if daylight { 500 } else { 0 };
            body.push_str(&format!(
                "{},{},{},{},{},27.5,20.1,{},{},{},0.12,1010,180,2.5\n",
                t.year(),
                t.month(),
                t.day(),
                t.hour(),
                t.minute(),
                ghi / 5,
                ghi,
                ghi
            ));
            t += Duration::hours(1);
        }
        body
    }
}
