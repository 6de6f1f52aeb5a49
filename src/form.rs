use crate::error::ValidationError;
use crate::types::{Coords, Workout, WorkoutKind};

/// Raw values from the workout form, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormInput {
    pub fn running(distance: &str, duration: &str, cadence: &str) -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            elevation: String::new(),
        }
    }

    pub fn cycling(distance: &str, duration: &str, elevation: &str) -> Self {
        Self {
            kind: WorkoutKind::Cycling,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: String::new(),
            elevation: elevation.to_string(),
        }
    }

    /// Parse and check the fields that matter for the selected kind.
    pub fn validate(&self) -> Result<Draft, ValidationError> {
        let distance_km = parse_number(&self.distance);
        let duration_min = parse_number(&self.duration);

        match self.kind {
            WorkoutKind::Running => {
                let cadence = parse_number(&self.cadence);
                if !all_finite(&[distance_km, duration_min, cadence])
                    || !all_positive(&[distance_km, duration_min, cadence])
                {
                    return Err(ValidationError::not_positive());
                }
                let cadence_spm = whole_cadence(cadence)?;
                Ok(Draft::Running {
                    distance_km,
                    duration_min,
                    cadence_spm,
                })
            }
            WorkoutKind::Cycling => {
                let elevation_gain_m = parse_number(&self.elevation);
                if !all_finite(&[distance_km, duration_min, elevation_gain_m])
                    || !all_positive(&[distance_km, duration_min])
                    || elevation_gain_m < 0.0
                {
                    return Err(ValidationError::not_positive());
                }
                Ok(Draft::Cycling {
                    distance_km,
                    duration_min,
                    elevation_gain_m,
                })
            }
        }
    }
}

/// Validated form values, not yet tied to a place or time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Draft {
    Running {
        distance_km: f64,
        duration_min: f64,
        cadence_spm: u32,
    },
    Cycling {
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    },
}

impl Draft {
    pub fn into_workout(self, at: Coords) -> Result<Workout, ValidationError> {
        match self {
            Self::Running {
                distance_km,
                duration_min,
                cadence_spm,
            } => Workout::running(at, distance_km, duration_min, cadence_spm),
            Self::Cycling {
                distance_km,
                duration_min,
                elevation_gain_m,
            } => Workout::cycling(at, distance_km, duration_min, elevation_gain_m),
        }
    }
}

/// A blank field reads as zero. Unparseable input becomes NaN so it fails
/// the finiteness check.
fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    raw.parse::<f64>().unwrap_or(f64::NAN)
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn all_positive(values: &[f64]) -> bool {
    values.iter().all(|v| *v > 0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_cadence(v: f64) -> Result<u32, ValidationError> {
    if v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(ValidationError {
            message: "Cadence must be a whole number of steps per minute!".to_string(),
        });
    }
    Ok(v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_running_input() {
        let draft = FormInput::running("5.5", " 30 ", "172").validate().unwrap();
        assert_eq!(
            draft,
            Draft::Running {
                distance_km: 5.5,
                duration_min: 30.0,
                cadence_spm: 172
            }
        );
    }

    #[test]
    fn cycling_ignores_cadence_and_allows_flat_rides() {
        let mut input = FormInput::cycling("20", "60", "0");
        input.cadence = "garbage".to_string();
        assert!(matches!(input.validate(), Ok(Draft::Cycling { .. })));
    }

    #[test]
    fn rejects_bad_numbers() {
        for input in [
            FormInput::running("-1", "30", "170"),
            FormInput::running("", "30", "170"),
            FormInput::running("5", "abc", "170"),
            FormInput::running("5", "30", "0"),
            FormInput::running("5", "inf", "170"),
            FormInput::cycling("5", "0", "10"),
            FormInput::running("5", "30", ""),
            FormInput::cycling("", "30", "10"),
            FormInput::cycling("5", "30", "-3"),
        ] {
            let err = input.validate().unwrap_err();
            assert_eq!(err.message, ValidationError::NOT_POSITIVE, "{input:?}");
        }
    }

    #[test]
    fn blank_elevation_reads_as_flat_ride() {
        let draft = FormInput::cycling("20", "60", "  ").validate().unwrap();
        assert_eq!(
            draft,
            Draft::Cycling {
                distance_km: 20.0,
                duration_min: 60.0,
                elevation_gain_m: 0.0
            }
        );
    }

    #[test]
    fn cadence_must_be_whole() {
        let err = FormInput::running("5", "30", "170.5").validate().unwrap_err();
        assert!(err.message.contains("whole number"));
    }

    #[test]
    fn draft_builds_workout_at_target() {
        let at = Coords::new(10.0, 20.0);
        let w = FormInput::cycling("34", "100", "143")
            .validate()
            .unwrap()
            .into_workout(at)
            .unwrap();
        assert_eq!(w.coordinates(), at);
        assert_eq!(w.kind(), WorkoutKind::Cycling);
    }
}
