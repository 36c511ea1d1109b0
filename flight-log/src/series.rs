use crate::{
    units::{feet_to_meters, mph_to_kmh, rc_percent},
    FlightLog,
};

/// Per-sample values in display units, derived once from a [`FlightLog`].
///
/// Time is in seconds since the first sample, heights and distances in
/// meters, speed in km/h and stick deflections in percent (-100..=100).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedSeries {
    pub time_s: Vec<f64>,
    pub height_m: Vec<f64>,
    pub speed_kmh: Vec<f64>,
    pub distance_m: Vec<f64>,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    pub throttle: Vec<f64>,
    pub rudder: Vec<f64>,
    pub elevator: Vec<f64>,
    pub aileron: Vec<f64>,
}

impl DerivedSeries {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }
}

impl From<&FlightLog> for DerivedSeries {
    fn from(log: &FlightLog) -> Self {
        let t0 = log.time_ms().first().copied().unwrap_or_default();
        let rc = log.rc();
        let percent = |raw: &[i32]| -> Vec<f64> { raw.iter().map(|v| rc_percent(*v)).collect() };
        Self {
            time_s: log
                .time_ms()
                .iter()
                .map(|t| t.saturating_sub(t0) as f64 / 1000.0)
                .collect(),
            height_m: log.height_ft().iter().map(|v| feet_to_meters(*v)).collect(),
            speed_kmh: log.speed_mph().iter().map(|v| mph_to_kmh(*v)).collect(),
            distance_m: log.distance_ft().iter().map(|v| feet_to_meters(*v)).collect(),
            latitude: log.latitude().to_vec(),
            longitude: log.longitude().to_vec(),
            throttle: percent(&rc.throttle),
            rudder: percent(&rc.rudder),
            elevator: percent(&rc.elevator),
            aileron: percent(&rc.aileron),
        }
    }
}
