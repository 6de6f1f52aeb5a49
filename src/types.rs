use crate::error::ValidationError;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `[latitude, longitude]` pair. Persisted as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized form used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "\u{1F3C3}\u{200D}\u{2642}\u{FE0F}",
            Self::Cycling => "\u{1F6B4}\u{200D}\u{2640}\u{FE0F}",
        }
    }

    /// The kind's derived metric: pace (min/km) for running, speed (km/h) for cycling.
    pub fn derived_metric(self, distance_km: f64, duration_min: f64) -> f64 {
        match self {
            Self::Running => duration_min / distance_km,
            Self::Cycling => distance_km / (duration_min / 60.0),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(ValidationError {
                message: format!("Unknown workout type: {other:?}"),
            }),
        }
    }
}

/// Kind-specific inputs plus the metric derived from them at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Activity {
    #[serde(rename_all = "camelCase")]
    Running {
        cadence_spm: u32,
        pace_min_per_km: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cycling {
        elevation_gain_m: f64,
        speed_kmh: f64,
    },
}

impl Activity {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// A workout created in this session. Only `click_count` changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: String,
    created_at: DateTime<Utc>,
    coordinates: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    click_count: u32,
    activity: Activity,
}

impl Workout {
    pub fn running(
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: u32,
    ) -> Result<Self, ValidationError> {
        Self::running_at(Utc::now(), coordinates, distance_km, duration_min, cadence_spm)
    }

    pub fn cycling(
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, ValidationError> {
        Self::cycling_at(
            Utc::now(),
            coordinates,
            distance_km,
            duration_min,
            elevation_gain_m,
        )
    }

    pub fn running_at(
        created_at: DateTime<Utc>,
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: u32,
    ) -> Result<Self, ValidationError> {
        check_base(distance_km, duration_min)?;
        if cadence_spm == 0 {
            return Err(ValidationError::not_positive());
        }
        let pace_min_per_km = WorkoutKind::Running.derived_metric(distance_km, duration_min);
        Ok(Self::build(
            created_at,
            coordinates,
            distance_km,
            duration_min,
            Activity::Running {
                cadence_spm,
                pace_min_per_km,
            },
        ))
    }

    pub fn cycling_at(
        created_at: DateTime<Utc>,
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Result<Self, ValidationError> {
        check_base(distance_km, duration_min)?;
        if !elevation_gain_m.is_finite() || elevation_gain_m < 0.0 {
            return Err(ValidationError::not_positive());
        }
        let speed_kmh = WorkoutKind::Cycling.derived_metric(distance_km, duration_min);
        Ok(Self::build(
            created_at,
            coordinates,
            distance_km,
            duration_min,
            Activity::Cycling {
                elevation_gain_m,
                speed_kmh,
            },
        ))
    }

    fn build(
        created_at: DateTime<Utc>,
        coordinates: Coords,
        distance_km: f64,
        duration_min: f64,
        activity: Activity,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            description: describe(activity.kind(), created_at),
            created_at,
            coordinates,
            distance_km,
            duration_min,
            click_count: 0,
            activity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coordinates(&self) -> Coords {
        self.coordinates
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn click_count(&self) -> u32 {
        self.click_count
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    /// Display-only counter; nothing else changes.
    pub fn register_interaction(&mut self) {
        self.click_count = self.click_count.saturating_add(1);
    }

    /// Plain-data projection used for persistence.
    pub fn to_record(&self) -> WorkoutRecord {
        WorkoutRecord {
            coordinates: self.coordinates,
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            created_at: self.created_at,
            id: self.id.clone(),
            description: self.description.clone(),
            click_count: self.click_count,
            activity: self.activity.clone(),
        }
    }
}

/// A workout as it sits in storage: every field, no behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub coordinates: Coords,
    pub distance_km: f64,
    pub duration_min: f64,
    pub created_at: DateTime<Utc>,
    pub id: String,
    pub description: String,
    pub click_count: u32,
    #[serde(flatten)]
    pub activity: Activity,
}

impl WorkoutRecord {
    pub const fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }
}

fn check_base(distance_km: f64, duration_min: f64) -> Result<(), ValidationError> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if positive(distance_km) && positive(duration_min) {
        Ok(())
    } else {
        Err(ValidationError::not_positive())
    }
}

/// `"<Kind> on <Month> <day>"` in local time.
pub fn describe(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
    let local = created_at.with_timezone(&Local);
    format!("{} on {}", kind.label(), local.format("%B %-d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn spot() -> Coords {
        Coords::new(71.0, -4.3)
    }

    #[test]
    fn running_pace_is_duration_over_distance() {
        let w = Workout::running(spot(), 29.0, 30.0, 178).unwrap();
        let Activity::Running {
            cadence_spm,
            pace_min_per_km,
        } = *w.activity()
        else {
            panic!("expected running");
        };
        assert_eq!(cadence_spm, 178);
        assert_eq!(pace_min_per_km, 30.0 / 29.0);
        assert!((pace_min_per_km - 1.0345).abs() < 1e-4);
        assert!(w.description().starts_with("Running on "));
    }

    #[test]
    fn cycling_speed_is_km_per_hour() {
        let w = Workout::cycling(spot(), 34.0, 100.0, 143.0).unwrap();
        let Activity::Cycling { speed_kmh, .. } = *w.activity() else {
            panic!("expected cycling");
        };
        assert_eq!(speed_kmh, 34.0 / (100.0 / 60.0));
        assert!((speed_kmh - 20.4).abs() < 1e-9);
    }

    #[test]
    fn description_uses_creation_month_and_day() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        let w = Workout::cycling_at(at.with_timezone(&Utc), spot(), 10.0, 30.0, 0.0).unwrap();
        assert_eq!(w.description(), "Cycling on March 7");
    }

    #[test]
    fn rejects_non_positive_inputs() {
        assert!(Workout::running(spot(), -1.0, 30.0, 170).is_err());
        assert!(Workout::running(spot(), 5.0, 0.0, 170).is_err());
        assert!(Workout::running(spot(), 5.0, 30.0, 0).is_err());
        assert!(Workout::cycling(spot(), 5.0, 30.0, -1.0).is_err());
        assert!(Workout::cycling(spot(), f64::NAN, 30.0, 1.0).is_err());
        assert!(Workout::cycling(spot(), 5.0, 30.0, 0.0).is_ok());
    }

    #[test]
    fn ids_are_unique_within_a_millisecond() {
        let at = Utc::now();
        let a = Workout::running_at(at, spot(), 5.0, 25.0, 170).unwrap();
        let b = Workout::running_at(at, spot(), 5.0, 25.0, 170).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn register_interaction_only_bumps_counter() {
        let mut w = Workout::running(spot(), 5.0, 25.0, 170).unwrap();
        let before = w.clone();
        w.register_interaction();
        w.register_interaction();
        assert_eq!(w.click_count(), 2);
        assert_eq!(w.description(), before.description());
        assert_eq!(w.activity(), before.activity());
    }

    #[test]
    fn record_json_layout() {
        let w = Workout::running(spot(), 5.0, 25.0, 170).unwrap();
        let v = serde_json::to_value(w.to_record()).unwrap();
        assert_eq!(v["coordinates"], serde_json::json!([71.0, -4.3]));
        assert_eq!(v["kind"], "running");
        assert_eq!(v["cadenceSpm"], 170);
        assert_eq!(v["paceMinPerKm"], 5.0);
        assert_eq!(v["clickCount"], 0);
        assert!(v.get("distanceKm").is_some());
        assert!(v.get("createdAt").is_some());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Cycling".parse::<WorkoutKind>().unwrap(), WorkoutKind::Cycling);
        assert!("swimming".parse::<WorkoutKind>().is_err());
    }

    proptest! {
        #[test]
        fn prop_pace_is_exact_ratio(
            distance in 0.01..1000.0f64,
            duration in 0.01..1000.0f64,
            cadence in 1u32..300,
        ) {
            let w = Workout::running(spot(), distance, duration, cadence).unwrap();
            let Activity::Running { pace_min_per_km, cadence_spm } = *w.activity() else {
                panic!("expected running");
            };
            prop_assert_eq!(pace_min_per_km, duration / distance);
            prop_assert_eq!(cadence_spm, cadence);
        }

        #[test]
        fn prop_speed_is_exact_ratio(
            distance in 0.01..1000.0f64,
            duration in 0.01..1000.0f64,
            elevation in 0.0..5000.0f64,
        ) {
            let w = Workout::cycling(spot(), distance, duration, elevation).unwrap();
            let Activity::Cycling { speed_kmh, elevation_gain_m } = *w.activity() else {
                panic!("expected cycling");
            };
            prop_assert_eq!(speed_kmh, distance / (duration / 60.0));
            prop_assert_eq!(elevation_gain_m, elevation);
        }
    }
}
