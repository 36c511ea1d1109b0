use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
    time::Instant,
};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
    schema::{Column, SchemaPolicy},
    LoadError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub schema: SchemaPolicy,
    /// Replace the leading run of zero latitude/longitude values (rows
    /// logged before the first GPS fix) with the first nonzero value.
    pub fill_leading_gps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema: SchemaPolicy::Strict,
            fill_leading_gps: true,
        }
    }
}

/// Raw stick readings, in hardware units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RcChannels {
    pub throttle: Vec<i32>,
    pub rudder: Vec<i32>,
    pub elevator: Vec<i32>,
    pub aileron: Vec<i32>,
}

/// Parsed telemetry of one flight, one entry per sample in every column.
///
/// A `FlightLog` is never modified after loading; loading another file
/// produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightLog {
    time_ms: Vec<u64>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    height_ft: Vec<f64>,
    speed_mph: Vec<f64>,
    distance_ft: Vec<f64>,
    rc: RcChannels,
    datetime: Option<Vec<String>>,
    satellites: Option<Vec<u32>>,
    voltage: Option<Vec<f64>>,
    battery_percent: Option<Vec<f64>>,
    flight_mode: Option<Vec<String>>,
    message: Option<Vec<String>>,
}

/// All values of one row, borrowed from a [`FlightLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub time_ms: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub height_ft: f64,
    pub speed_mph: f64,
    pub distance_ft: f64,
    pub rc_throttle: i32,
    pub rc_rudder: i32,
    pub rc_elevator: i32,
    pub rc_aileron: i32,
    pub datetime: Option<&'a str>,
    pub satellites: Option<u32>,
    pub voltage: Option<f64>,
    pub battery_percent: Option<f64>,
    pub flight_mode: Option<&'a str>,
    pub message: Option<&'a str>,
}

/// Load a flight log, logging any failure instead of returning it.
///
/// `None` means "no data": the file could not be read, is not valid CSV or
/// does not match the schema.
pub fn load_flight_log(path: &Path, options: &LoadOptions) -> Option<FlightLog> {
    let tic = Instant::now();
    match FlightLog::from_path(path, options) {
        Ok(log) => {
            log::info!(
                "==> loaded {} samples from {:?} in {:.3} s",
                log.len(),
                path,
                tic.elapsed().as_secs_f64()
            );
            Some(log)
        }
        Err(err) => {
            log::warn!("no data loaded from {:?}: {}", path, err);
            None
        }
    }
}

impl FlightLog {
    pub fn from_path(path: &Path, options: &LoadOptions) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }

    pub fn from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let columns = ColumnIndex::from_headers(reader.headers()?, options.schema)?;

        let mut log = FlightLog::empty(&columns);
        for (i, record) in reader.records().enumerate() {
            log.push_record(&columns, &record?, i + 1)?;
        }
        if log.is_empty() {
            return Err(LoadError::NoSamples);
        }
        log.check_time(options.schema)?;

        if options.fill_leading_gps {
            let lat = fill_leading_zeros(&mut log.latitude);
            let lon = fill_leading_zeros(&mut log.longitude);
            if lat > 0 || lon > 0 {
                log::debug!("replaced {lat} latitude and {lon} longitude samples without GPS fix");
            }
        }
        Ok(log)
    }

    fn empty(columns: &ColumnIndex) -> Self {
        Self {
            time_ms: Vec::new(),
            latitude: Vec::new(),
            longitude: Vec::new(),
            height_ft: Vec::new(),
            speed_mph: Vec::new(),
            distance_ft: Vec::new(),
            rc: RcChannels::default(),
            datetime: optional_column(columns, Column::DateTime),
            satellites: optional_column(columns, Column::Satellites),
            voltage: optional_column(columns, Column::Voltage),
            battery_percent: optional_column(columns, Column::BatteryPercent),
            flight_mode: optional_column(columns, Column::FlightMode),
            message: optional_column(columns, Column::Message),
        }
    }

    fn push_record(
        &mut self,
        columns: &ColumnIndex,
        record: &StringRecord,
        row: usize,
    ) -> Result<(), LoadError> {
        // Parse the whole row first, so a failing field never leaves the
        // columns with unequal lengths.
        let time_ms = columns.parse(record, Column::Time, row)?;
        let latitude = columns.parse(record, Column::Latitude, row)?;
        let longitude = columns.parse(record, Column::Longitude, row)?;
        let height_ft = columns.parse(record, Column::Height, row)?;
        let speed_mph = columns.parse(record, Column::Speed, row)?;
        let distance_ft = columns.parse(record, Column::Distance, row)?;
        let throttle = columns.parse(record, Column::RcThrottle, row)?;
        let rudder = columns.parse(record, Column::RcRudder, row)?;
        let elevator = columns.parse(record, Column::RcElevator, row)?;
        let aileron = columns.parse(record, Column::RcAileron, row)?;
        let datetime = columns.parse_optional(record, Column::DateTime, row)?;
        let satellites = columns.parse_optional(record, Column::Satellites, row)?;
        let voltage = columns.parse_optional(record, Column::Voltage, row)?;
        let battery_percent = columns.parse_optional(record, Column::BatteryPercent, row)?;
        let flight_mode = columns.parse_optional(record, Column::FlightMode, row)?;
        let message = columns.parse_optional(record, Column::Message, row)?;

        self.time_ms.push(time_ms);
        self.latitude.push(latitude);
        self.longitude.push(longitude);
        self.height_ft.push(height_ft);
        self.speed_mph.push(speed_mph);
        self.distance_ft.push(distance_ft);
        self.rc.throttle.push(throttle);
        self.rc.rudder.push(rudder);
        self.rc.elevator.push(elevator);
        self.rc.aileron.push(aileron);
        push_optional(&mut self.datetime, datetime);
        push_optional(&mut self.satellites, satellites);
        push_optional(&mut self.voltage, voltage);
        push_optional(&mut self.battery_percent, battery_percent);
        push_optional(&mut self.flight_mode, flight_mode);
        push_optional(&mut self.message, message);
        Ok(())
    }

    fn check_time(&self, policy: SchemaPolicy) -> Result<(), LoadError> {
        if let Some(pos) = self.time_ms.windows(2).position(|pair| pair[1] < pair[0]) {
            let row = pos + 2;
            match policy {
                SchemaPolicy::Strict => return Err(LoadError::TimeNotMonotonic { row }),
                SchemaPolicy::Lenient => log::warn!("timestamps decrease at row {row}"),
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_ms.is_empty()
    }

    pub fn time_ms(&self) -> &[u64] {
        &self.time_ms
    }

    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    pub fn height_ft(&self) -> &[f64] {
        &self.height_ft
    }

    pub fn speed_mph(&self) -> &[f64] {
        &self.speed_mph
    }

    pub fn distance_ft(&self) -> &[f64] {
        &self.distance_ft
    }

    pub fn rc(&self) -> &RcChannels {
        &self.rc
    }

    pub fn datetime(&self) -> Option<&[String]> {
        self.datetime.as_deref()
    }

    pub fn sample(&self, index: usize) -> Option<Sample<'_>> {
        Some(Sample {
            time_ms: *self.time_ms.get(index)?,
            latitude: *self.latitude.get(index)?,
            longitude: *self.longitude.get(index)?,
            height_ft: *self.height_ft.get(index)?,
            speed_mph: *self.speed_mph.get(index)?,
            distance_ft: *self.distance_ft.get(index)?,
            rc_throttle: *self.rc.throttle.get(index)?,
            rc_rudder: *self.rc.rudder.get(index)?,
            rc_elevator: *self.rc.elevator.get(index)?,
            rc_aileron: *self.rc.aileron.get(index)?,
            datetime: optional_at(&self.datetime, index).map(String::as_str),
            satellites: optional_at(&self.satellites, index).copied(),
            voltage: optional_at(&self.voltage, index).copied(),
            battery_percent: optional_at(&self.battery_percent, index).copied(),
            flight_mode: optional_at(&self.flight_mode, index).map(String::as_str),
            message: optional_at(&self.message, index).map(String::as_str),
        })
    }
}

/// Replace the leading run of exactly-zero values with the first nonzero
/// value. Returns how many values were replaced; an all-zero column is left
/// as it is.
pub fn fill_leading_zeros(values: &mut [f64]) -> usize {
    let Some(first_fix) = values.iter().position(|v| *v != 0.0) else {
        return 0;
    };
    let fix = values[first_fix];
    values[..first_fix].iter_mut().for_each(|v| *v = fix);
    first_fix
}

fn optional_column<T>(columns: &ColumnIndex, column: Column) -> Option<Vec<T>> {
    columns.get(column).map(|_| Vec::new())
}

fn push_optional<T>(column: &mut Option<Vec<T>>, value: Option<T>) {
    if let (Some(column), Some(value)) = (column.as_mut(), value) {
        column.push(value);
    }
}

fn optional_at<T>(column: &Option<Vec<T>>, index: usize) -> Option<&T> {
    column.as_ref().and_then(|values| values.get(index))
}

// ---------------------------------------------------------------------------
//
//
// Header handling
//
//
// ---------------------------------------------------------------------------

/// Position of each read column in the CSV records.
struct ColumnIndex(HashMap<Column, usize>);

impl ColumnIndex {
    fn from_headers(headers: &StringRecord, policy: SchemaPolicy) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        let mut index = HashMap::new();
        for (pos, name) in headers.iter().enumerate() {
            if policy == SchemaPolicy::Strict {
                if !Column::is_known(name) {
                    return Err(LoadError::UnknownColumn(name.to_owned()));
                }
                if !seen.insert(name) {
                    return Err(LoadError::DuplicateColumn(name.to_owned()));
                }
            }
            if let Some(column) = Column::ALL.into_iter().find(|c| c.name() == name) {
                index.entry(column).or_insert(pos);
            }
        }
        if let Some(missing) = Column::ALL
            .into_iter()
            .find(|c| c.is_required() && !index.contains_key(c))
        {
            return Err(LoadError::MissingColumn(missing.name()));
        }
        log::debug!("mapped {} of {} header columns", index.len(), headers.len());
        Ok(Self(index))
    }

    fn get(&self, column: Column) -> Option<usize> {
        self.0.get(&column).copied()
    }

    fn parse<T: FieldValue>(
        &self,
        record: &StringRecord,
        column: Column,
        row: usize,
    ) -> Result<T, LoadError> {
        let pos = self
            .get(column)
            .ok_or(LoadError::MissingColumn(column.name()))?;
        let raw = record.get(pos).unwrap_or_default();
        T::parse_field(raw).ok_or_else(|| LoadError::Field {
            row,
            column: column.name(),
            value: raw.to_owned(),
        })
    }

    fn parse_optional<T: FieldValue>(
        &self,
        record: &StringRecord,
        column: Column,
        row: usize,
    ) -> Result<Option<T>, LoadError> {
        match self.get(column) {
            Some(_) => self.parse(record, column, row).map(Some),
            None => Ok(None),
        }
    }
}

trait FieldValue: Sized {
    fn parse_field(raw: &str) -> Option<Self>;
}

// "nan" and "inf" parse as f64 but are no measurement.
impl FieldValue for f64 {
    fn parse_field(raw: &str) -> Option<Self> {
        raw.parse().ok().filter(|v: &f64| v.is_finite())
    }
}

impl FieldValue for String {
    fn parse_field(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

impl FieldValue for i32 {
    fn parse_field(raw: &str) -> Option<Self> {
        parse_integer(raw).and_then(|v| i32::try_from(v).ok())
    }
}

impl FieldValue for u32 {
    fn parse_field(raw: &str) -> Option<Self> {
        parse_integer(raw).and_then(|v| u32::try_from(v).ok())
    }
}

impl FieldValue for u64 {
    fn parse_field(raw: &str) -> Option<Self> {
        parse_integer(raw).and_then(|v| u64::try_from(v).ok())
    }
}

// Some exports write integer columns as "1024.0".
fn parse_integer(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.abs() < 9.0e15)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "time(millisecond),datetime(utc),latitude,longitude,\
        height_above_takeoff(feet),speed(mph),distance(feet),satellites,\
        rc_throttle,rc_rudder,rc_elevator,rc_aileron";

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn csv_with(header: &str, rows: &[&str]) -> String {
        let mut text = header.to_owned();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    fn parse(text: &str, options: LoadOptions) -> Result<FlightLog, LoadError> {
        FlightLog::from_reader(text.as_bytes(), &options)
    }

    #[test]
    fn test_parse_valid_log() {
        init();
        let text = csv_with(
            HEADER,
            &[
                "0,2020-10-27 11:05:40,48.1,11.5,0.0,0.0,0.0,12,1024,1024,1024,1024",
                "100,2020-10-27 11:05:40,48.2,11.6,3.5,2.0,10.0,13,1684,364,1354,1024",
            ],
        );
        let log = parse(&text, LoadOptions::default()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.time_ms(), &[0, 100]);
        assert_eq!(log.rc().throttle, vec![1024, 1684]);
        assert_eq!(log.rc().rudder, vec![1024, 364]);

        let sample = log.sample(1).unwrap();
        assert_eq!(sample.height_ft, 3.5);
        assert_eq!(sample.satellites, Some(13));
        assert_eq!(sample.datetime, Some("2020-10-27 11:05:40"));
        assert_eq!(sample.voltage, None);
        assert!(log.sample(2).is_none());
    }

    #[test]
    fn test_header_whitespace_is_trimmed() {
        init();
        let header = format!("{HEADER}, xSpeed(mph)");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024,1024, 0.5"],
        );
        assert_eq!(parse(&text, LoadOptions::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_swapped_column_rejected() {
        init();
        // `satellites` is dropped and replaced with an undocumented column.
        let header = HEADER.replace("satellites", "sat_count");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024,1024"],
        );
        match parse(&text, LoadOptions::default()) {
            Err(LoadError::UnknownColumn(name)) => assert_eq!(name, "sat_count"),
            other => panic!("expected unknown column error, got {other:?}"),
        }
    }

    #[test]
    fn test_swapped_column_yields_no_data() {
        init();
        let header = HEADER.replace("satellites", "sat_count");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024,1024"],
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        assert!(load_flight_log(file.path(), &LoadOptions::default()).is_none());
    }

    #[test]
    fn test_missing_required_column() {
        init();
        let header = HEADER.replace(",rc_aileron", "");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024"],
        );
        assert!(matches!(
            parse(&text, LoadOptions::default()),
            Err(LoadError::MissingColumn("rc_aileron"))
        ));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        init();
        let header = format!("{HEADER},latitude");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024,1024,48.1"],
        );
        assert!(matches!(
            parse(&text, LoadOptions::default()),
            Err(LoadError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_lenient_ignores_unknown_columns() {
        init();
        let header = HEADER.replace("satellites", "sat_count");
        let text = csv_with(
            &header,
            &["0,2020-10-27 11:05:40,48.1,11.5,0,0,0,12,1024,1024,1024,1024"],
        );
        let options = LoadOptions {
            schema: SchemaPolicy::Lenient,
            ..Default::default()
        };
        let log = parse(&text, options).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.sample(0).unwrap().satellites, None);
    }

    #[test]
    fn test_leading_gps_zeros_replaced() {
        init();
        let text = csv_with(
            HEADER,
            &[
                "0,t,0.0,0.0,0,0,0,0,1024,1024,1024,1024",
                "100,t,0.0,0.0,0,0,0,0,1024,1024,1024,1024",
                "200,t,48.5,11.25,0,0,0,9,1024,1024,1024,1024",
                "300,t,0.0,11.5,0,0,0,9,1024,1024,1024,1024",
            ],
        );
        let log = parse(&text, LoadOptions::default()).unwrap();
        assert_eq!(log.latitude(), &[48.5, 48.5, 48.5, 0.0]);
        assert_eq!(log.longitude(), &[11.25, 11.25, 11.25, 11.5]);

        let options = LoadOptions {
            fill_leading_gps: false,
            ..Default::default()
        };
        let log = parse(&text, options).unwrap();
        assert_eq!(log.latitude(), &[0.0, 0.0, 48.5, 0.0]);
    }

    #[test]
    fn test_fill_leading_zeros_all_zero() {
        let mut values = vec![0.0, 0.0];
        assert_eq!(fill_leading_zeros(&mut values), 0);
        assert_eq!(values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_time_must_not_decrease() {
        init();
        let text = csv_with(
            HEADER,
            &[
                "0,t,48.1,11.5,0,0,0,12,1024,1024,1024,1024",
                "200,t,48.1,11.5,0,0,0,12,1024,1024,1024,1024",
                "100,t,48.1,11.5,0,0,0,12,1024,1024,1024,1024",
            ],
        );
        assert!(matches!(
            parse(&text, LoadOptions::default()),
            Err(LoadError::TimeNotMonotonic { row: 3 })
        ));
        let options = LoadOptions {
            schema: SchemaPolicy::Lenient,
            ..Default::default()
        };
        assert_eq!(parse(&text, options).unwrap().len(), 3);
    }

    #[test]
    fn test_unparsable_field() {
        init();
        let text = csv_with(
            HEADER,
            &[
                "0,t,48.1,11.5,0,0,0,12,1024,1024,1024,1024",
                "100,t,48.1,11.5,0,fast,0,12,1024,1024,1024,1024",
            ],
        );
        match parse(&text, LoadOptions::default()) {
            Err(LoadError::Field { row, column, value }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "speed(mph)");
                assert_eq!(value, "fast");
            }
            other => panic!("expected field error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_field_rejected() {
        init();
        for bad in ["nan", "inf", "-inf"] {
            let row = format!("100,t,{bad},11.5,0,0,0,12,1024,1024,1024,1024");
            let text = csv_with(
                HEADER,
                &["0,t,48.1,11.5,0,0,0,12,1024,1024,1024,1024", row.as_str()],
            );
            match parse(&text, LoadOptions::default()) {
                Err(LoadError::Field { row, column, value }) => {
                    assert_eq!(row, 2);
                    assert_eq!(column, "latitude");
                    assert_eq!(value, bad);
                }
                other => panic!("expected field error for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_range_stick_reading_derives() {
        init();
        let text = csv_with(
            HEADER,
            &["0,t,48.1,11.5,0,0,0,12,-2147483648,2147483647,1024,1024"],
        );
        let log = parse(&text, LoadOptions::default()).unwrap();
        assert_eq!(log.rc().throttle, vec![i32::MIN]);

        let series = crate::DerivedSeries::from(&log);
        assert!(series.throttle[0].is_finite() && series.throttle[0] < -100.0);
        assert!(series.rudder[0].is_finite() && series.rudder[0] > 100.0);
        assert_eq!(series.elevator, vec![0.0]);
    }

    #[test]
    fn test_integer_columns_accept_float_notation() {
        init();
        let text = csv_with(
            HEADER,
            &["0.0,t,48.1,11.5,0,0,0,12.0,1684.0,1024,1024,1024"],
        );
        let log = parse(&text, LoadOptions::default()).unwrap();
        assert_eq!(log.rc().throttle, vec![1684]);
    }

    #[test]
    fn test_header_only_is_no_samples() {
        init();
        assert!(matches!(
            parse(HEADER, LoadOptions::default()),
            Err(LoadError::NoSamples)
        ));
    }

    #[test]
    fn test_short_row_rejected() {
        init();
        let text = csv_with(HEADER, &["0,t,48.1,11.5,0,0,0,12,1024,1024"]);
        assert!(matches!(
            parse(&text, LoadOptions::default()),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_no_data() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        assert!(load_flight_log(&path, &LoadOptions::default()).is_none());
    }
}
