//! Column layout of the Airdata CSV export.

/// Every column name an Airdata export may contain (after trimming
/// surrounding whitespace). In strict mode any other header rejects the file.
pub const KNOWN_COLUMNS: &[&str] = &[
    "time(millisecond)",
    "datetime(utc)",
    "latitude",
    "longitude",
    "height_above_takeoff(feet)",
    "height_above_ground_at_drone_location(feet)",
    "ground_elevation_at_drone_location(feet)",
    "altitude_above_seaLevel(feet)",
    "height_sonar(feet)",
    "speed(mph)",
    "distance(feet)",
    "mileage(feet)",
    "satellites",
    "gpslevel",
    "voltage(v)",
    "max_altitude(feet)",
    "max_ascent(feet)",
    "max_speed(mph)",
    "max_distance(feet)",
    "xSpeed(mph)",
    "ySpeed(mph)",
    "zSpeed(mph)",
    "compass_heading(degrees)",
    "pitch(degrees)",
    "roll(degrees)",
    "isPhoto",
    "isVideo",
    "rc_elevator",
    "rc_aileron",
    "rc_throttle",
    "rc_rudder",
    "rc_elevator(percent)",
    "rc_aileron(percent)",
    "rc_throttle(percent)",
    "rc_rudder(percent)",
    "gimbal_heading(degrees)",
    "gimbal_pitch(degrees)",
    "gimbal_roll(degrees)",
    "battery_percent",
    "voltageCell1",
    "voltageCell2",
    "voltageCell3",
    "voltageCell4",
    "voltageCell5",
    "voltageCell6",
    "current(A)",
    "battery_temperature(f)",
    "altitude(feet)",
    "ascent(feet)",
    "flycStateRaw",
    "flycState",
    "message",
];

/// How strictly the header row is checked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// Every header must be a known column, exactly once.
    #[default]
    Strict,
    /// Only the columns in [`Column::ALL`] are looked up, anything else is
    /// ignored.
    Lenient,
}

/// The columns the dashboard actually reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Time,
    DateTime,
    Latitude,
    Longitude,
    Height,
    Speed,
    Distance,
    Satellites,
    Voltage,
    BatteryPercent,
    RcThrottle,
    RcRudder,
    RcElevator,
    RcAileron,
    FlightMode,
    Message,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::Time,
        Column::DateTime,
        Column::Latitude,
        Column::Longitude,
        Column::Height,
        Column::Speed,
        Column::Distance,
        Column::Satellites,
        Column::Voltage,
        Column::BatteryPercent,
        Column::RcThrottle,
        Column::RcRudder,
        Column::RcElevator,
        Column::RcAileron,
        Column::FlightMode,
        Column::Message,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Column::Time => "time(millisecond)",
            Column::DateTime => "datetime(utc)",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::Height => "height_above_takeoff(feet)",
            Column::Speed => "speed(mph)",
            Column::Distance => "distance(feet)",
            Column::Satellites => "satellites",
            Column::Voltage => "voltage(v)",
            Column::BatteryPercent => "battery_percent",
            Column::RcThrottle => "rc_throttle",
            Column::RcRudder => "rc_rudder",
            Column::RcElevator => "rc_elevator",
            Column::RcAileron => "rc_aileron",
            Column::FlightMode => "flycState",
            Column::Message => "message",
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Column::Time
                | Column::Latitude
                | Column::Longitude
                | Column::Height
                | Column::Speed
                | Column::Distance
                | Column::RcThrottle
                | Column::RcRudder
                | Column::RcElevator
                | Column::RcAileron
        )
    }

    pub fn is_known(name: &str) -> bool {
        KNOWN_COLUMNS.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_columns_are_documented() {
        for column in Column::ALL {
            assert!(Column::is_known(column.name()), "{:?}", column);
        }
    }

    #[test]
    fn test_known_columns_unique() {
        let mut names = KNOWN_COLUMNS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), KNOWN_COLUMNS.len());
    }
}
