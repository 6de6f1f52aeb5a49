use crate::map::Popup;
use crate::repository::Entry;
use crate::types::Activity;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

/// One list row. `id` is what a row click reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutRow {
    pub id: String,
    pub class_name: String,
    pub title: String,
    pub details: Vec<Detail>,
}

impl WorkoutRow {
    pub fn for_entry(entry: &Entry) -> Self {
        let kind = entry.kind();
        let mut details = vec![
            Detail {
                icon: kind.icon(),
                value: entry.distance_km().to_string(),
                unit: "km",
            },
            Detail {
                icon: "\u{23F1}",
                value: entry.duration_min().to_string(),
                unit: "min",
            },
        ];

        match *entry.activity() {
            Activity::Running {
                cadence_spm,
                pace_min_per_km,
            } => {
                details.push(Detail {
                    icon: "\u{26A1}\u{FE0F}",
                    value: format!("{pace_min_per_km:.1}"),
                    unit: "min/km",
                });
                details.push(Detail {
                    icon: "\u{1F9B6}\u{1F3FC}",
                    value: cadence_spm.to_string(),
                    unit: "spm",
                });
            }
            Activity::Cycling {
                elevation_gain_m,
                speed_kmh,
            } => {
                details.push(Detail {
                    icon: "\u{26A1}\u{FE0F}",
                    value: format!("{speed_kmh:.1}"),
                    unit: "km/h",
                });
                details.push(Detail {
                    icon: "\u{26F0}",
                    value: elevation_gain_m.to_string(),
                    unit: "m",
                });
            }
        }

        Self {
            id: entry.id().to_string(),
            class_name: format!("workout workout--{kind}"),
            title: entry.description().to_string(),
            details,
        }
    }
}

impl fmt::Display for WorkoutRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.id, self.title)?;
        for d in &self.details {
            write!(f, "\t{} {} {}", d.icon, d.value, d.unit)?;
        }
        Ok(())
    }
}

/// Marker popup: kind icon plus description, styled per kind.
pub fn popup_for(entry: &Entry) -> Popup {
    let kind = entry.kind();
    Popup::sticky(
        format!("{kind}-popup"),
        format!("{} {}", kind.icon(), entry.description()),
    )
}
