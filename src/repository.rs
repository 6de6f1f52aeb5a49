use crate::dlog;
use crate::error::{NotFoundError, StorageError};
use crate::types::{Activity, Coords, Workout, WorkoutKind, WorkoutRecord};

/// One stored workout.
///
/// `Live` workouts were created in this session and keep their behavior.
/// `Restored` ones came back from storage as plain display records.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Live(Workout),
    Restored(WorkoutRecord),
}

impl Entry {
    pub fn id(&self) -> &str {
        match self {
            Self::Live(w) => w.id(),
            Self::Restored(r) => &r.id,
        }
    }

    pub const fn coordinates(&self) -> Coords {
        match self {
            Self::Live(w) => w.coordinates(),
            Self::Restored(r) => r.coordinates,
        }
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.activity().kind()
    }

    pub const fn activity(&self) -> &Activity {
        match self {
            Self::Live(w) => w.activity(),
            Self::Restored(r) => &r.activity,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Live(w) => w.description(),
            Self::Restored(r) => &r.description,
        }
    }

    pub const fn distance_km(&self) -> f64 {
        match self {
            Self::Live(w) => w.distance_km(),
            Self::Restored(r) => r.distance_km,
        }
    }

    pub const fn duration_min(&self) -> f64 {
        match self {
            Self::Live(w) => w.duration_min(),
            Self::Restored(r) => r.duration_min,
        }
    }

    pub fn to_record(&self) -> WorkoutRecord {
        match self {
            Self::Live(w) => w.to_record(),
            Self::Restored(r) => r.clone(),
        }
    }

    /// The live workout, if this entry still has one.
    pub const fn as_live_mut(&mut self) -> Option<&mut Workout> {
        match self {
            Self::Live(w) => Some(w),
            Self::Restored(_) => None,
        }
    }
}

/// Ordered, append-only workout history. Insertion order is display order.
#[derive(Debug, Default, Clone)]
pub struct WorkoutRepository {
    entries: Vec<Entry>,
}

impl WorkoutRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the end. No deduplication.
    pub fn append(&mut self, workout: Workout) -> &Entry {
        self.entries.push(Entry::Live(workout));
        &self.entries[self.entries.len() - 1]
    }

    /// Read-only view in insertion order. Call again to restart.
    pub fn all(&self) -> impl DoubleEndedIterator<Item = &Entry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Result<&Entry, NotFoundError> {
        self.entries
            .iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| NotFoundError { id: id.to_string() })
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Result<&mut Entry, NotFoundError> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or_else(|| NotFoundError { id: id.to_string() })
    }

    /// JSON array of every record, in order.
    pub fn serialize(&self) -> Result<String, StorageError> {
        let records: Vec<WorkoutRecord> = self.entries.iter().map(Entry::to_record).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Replace the whole sequence with records from `blob`.
    ///
    /// Missing or unreadable blobs leave the repository empty. Returns how
    /// many records were restored.
    pub fn load_from(&mut self, blob: Option<&str>) -> usize {
        self.entries.clear();

        let Some(blob) = blob else {
            dlog!("no persisted workouts");
            return 0;
        };

        match serde_json::from_str::<Vec<WorkoutRecord>>(blob) {
            Ok(records) => {
                self.entries = records.into_iter().map(Entry::Restored).collect();
                tracing::info!(restored = self.entries.len(), "loaded workout history");
                self.entries.len()
            }
            Err(e) => {
                tracing::warn!(err = %e, "ignoring unreadable workout history");
                0
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
