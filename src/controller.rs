//! Session state machine.
//!
//! ```text
//! AcquiringLocation -> MapReady -> FormShown -> Submitting -> FormHidden
//!                                     ^                          |
//!                                     +------- map click --------+
//! ```
//!
//! Every input arrives as an [`Event`]. [`SessionController::handle`] updates
//! the controller's own state, talks to the map and storage, and returns the
//! [`Effect`]s the user interface should apply. Restored workouts are rendered
//! as rows immediately but only get markers once the map view exists.

use crate::database::{KeyValueStore, WORKOUTS_KEY};
use crate::dlog;
use crate::error::{GeolocationUnavailable, MapError, SessionError, SessionResult};
use crate::form::FormInput;
use crate::geolocation::GeolocationSource;
use crate::map::{MapAdapter, MapWidget, PanOptions, ViewHandle};
use crate::render::{WorkoutRow, popup_for};
use crate::repository::WorkoutRepository;
use crate::types::{Coords, WorkoutKind};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// How long the form stays collapsed before its normal display mode returns.
pub const FORM_RESTORE_DELAY: Duration = Duration::from_millis(1000);

/// Pending events, shared with callbacks registered on collaborators.
pub type Mailbox = Rc<RefCell<VecDeque<Event>>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LocationAcquired(Coords),
    LocationFailed,
    MapClicked(Coords),
    KindChanged(WorkoutKind),
    Submit(FormInput),
    RowClicked(String),
    FormRestoreElapsed,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Blocking message to the user.
    Alert(String),
    /// Insert a row at the top of the list.
    RenderRow(WorkoutRow),
    /// Reveal the form and focus the distance input.
    ShowForm,
    /// Clear the inputs and collapse the form right away.
    HideForm,
    /// Give the collapsed form its normal display mode back.
    RestoreFormDisplay,
    /// Swap which of cadence/elevation is visible.
    ToggleElevationField,
    /// Deliver `event` after `after` has passed.
    Schedule { after: Duration, event: Event },
    /// Throw the session away and start over.
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    AcquiringLocation,
    MapReady,
    FormShown { target: Coords },
    Submitting { target: Coords },
    FormHidden,
}

pub struct SessionController<W, S> {
    state: SessionState,
    map: MapAdapter<W>,
    view: Option<ViewHandle>,
    repository: WorkoutRepository,
    storage: S,
    zoom: u8,
    mailbox: Mailbox,
    location_failed: bool,
    has_restored_history: bool,
}

impl<W: MapWidget, S: KeyValueStore> SessionController<W, S> {
    /// Build a session and load persisted history into `repository`.
    ///
    /// Whatever `repository` held is replaced by what storage has. The
    /// returned effects render the restored rows. Markers wait for
    /// [`Event::LocationAcquired`].
    pub fn new(
        widget: W,
        storage: S,
        repository: WorkoutRepository,
        mailbox: Mailbox,
        zoom: u8,
    ) -> (Self, Vec<Effect>) {
        let mut controller = Self {
            state: SessionState::AcquiringLocation,
            map: MapAdapter::new(widget),
            view: None,
            repository,
            storage,
            zoom,
            mailbox,
            location_failed: false,
            has_restored_history: false,
        };
        let effects = controller.restore_history();
        (controller, effects)
    }

    /// Start again from scratch with a fresh map widget. Storage is kept.
    pub fn restart(&mut self, widget: W) -> Vec<Effect> {
        self.state = SessionState::AcquiringLocation;
        self.map = MapAdapter::new(widget);
        self.view = None;
        self.location_failed = false;
        self.mailbox.borrow_mut().clear();
        self.restore_history()
    }

    fn restore_history(&mut self) -> Vec<Effect> {
        let blob = match self.storage.get(WORKOUTS_KEY) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(err = %e, "reading workout history failed; starting empty");
                None
            }
        };
        let restored = self.repository.load_from(blob.as_deref());
        self.has_restored_history = restored > 0;

        self.repository
            .all()
            .map(|e| Effect::RenderRow(WorkoutRow::for_entry(e)))
            .collect()
    }

    /// Ask the geolocation source where we are; the answer is queued as an event.
    pub fn request_location<G: GeolocationSource + ?Sized>(&self, geolocation: &mut G) {
        let event = match geolocation.current_position() {
            Ok(at) => Event::LocationAcquired(at),
            Err(GeolocationUnavailable) => Event::LocationFailed,
        };
        self.mailbox.borrow_mut().push_back(event);
    }

    pub fn handle(&mut self, event: Event) -> SessionResult<Vec<Effect>> {
        dlog!("event={event:?} state={:?}", self.state);
        match event {
            Event::LocationAcquired(at) => self.on_location(at),
            Event::LocationFailed => Ok(self.on_location_failed()),
            Event::MapClicked(at) => Ok(self.on_map_click(at)),
            Event::KindChanged(_) => Ok(vec![Effect::ToggleElevationField]),
            Event::Submit(input) => Ok(self.on_submit(&input)),
            Event::RowClicked(id) => self.on_row_click(&id),
            Event::FormRestoreElapsed => Ok(vec![Effect::RestoreFormDisplay]),
            Event::Reset => self.on_reset(),
        }
    }

    fn on_location(&mut self, at: Coords) -> SessionResult<Vec<Effect>> {
        if self.state != SessionState::AcquiringLocation || self.location_failed {
            dlog!("ignoring late location at={at}");
            return Ok(Vec::new());
        }

        let view = self.map.initialize(at, self.zoom)?;
        self.view = Some(view);

        let mailbox = Rc::clone(&self.mailbox);
        self.map.on_view_click(view, move |clicked| {
            mailbox.borrow_mut().push_back(Event::MapClicked(clicked));
        })?;

        for entry in self.repository.all() {
            self.map
                .place_marker(view, entry.coordinates(), &popup_for(entry))?;
        }

        self.state = SessionState::MapReady;
        tracing::info!(markers = self.repository.len(), "session map ready");
        Ok(Vec::new())
    }

    fn on_location_failed(&mut self) -> Vec<Effect> {
        self.location_failed = true;
        tracing::warn!("geolocation unavailable; map features disabled for this session");
        vec![Effect::Alert(GeolocationUnavailable.to_string())]
    }

    fn on_map_click(&mut self, at: Coords) -> Vec<Effect> {
        match self.state {
            SessionState::MapReady
            | SessionState::FormHidden
            | SessionState::FormShown { .. } => {
                self.state = SessionState::FormShown { target: at };
                vec![Effect::ShowForm]
            }
            SessionState::AcquiringLocation | SessionState::Submitting { .. } => Vec::new(),
        }
    }

    fn on_submit(&mut self, input: &FormInput) -> Vec<Effect> {
        let SessionState::FormShown { target } = self.state else {
            dlog!("submit without an open form; ignored");
            return Vec::new();
        };
        self.state = SessionState::Submitting { target };

        let workout = match input.validate().and_then(|draft| draft.into_workout(target)) {
            Ok(w) => w,
            Err(e) => {
                self.state = SessionState::FormShown { target };
                return vec![Effect::Alert(e.to_string())];
            }
        };

        tracing::info!(id = workout.id(), kind = %workout.kind(), "workout recorded");
        let entry = self.repository.append(workout);
        let row = WorkoutRow::for_entry(entry);
        let popup = popup_for(entry);
        let at = entry.coordinates();

        let placed = match self.view {
            Some(view) => self.map.place_marker(view, at, &popup),
            None => Err(MapError::NotReady("place_marker")),
        };
        if let Err(e) = placed {
            tracing::error!(err = %e, "could not place marker");
        }

        self.state = SessionState::FormHidden;
        self.persist();

        vec![
            Effect::RenderRow(row),
            Effect::HideForm,
            Effect::Schedule {
                after: FORM_RESTORE_DELAY,
                event: Event::FormRestoreElapsed,
            },
        ]
    }

    fn on_row_click(&mut self, id: &str) -> SessionResult<Vec<Effect>> {
        let entry = match self.repository.find_by_id_mut(id) {
            Ok(entry) => entry,
            Err(e) => {
                dlog!("row click ignored: {e}");
                return Ok(Vec::new());
            }
        };

        if let Some(workout) = entry.as_live_mut() {
            workout.register_interaction();
        }
        let at = entry.coordinates();

        let Some(view) = self.view else {
            dlog!("row click before map is ready; not panning");
            return Ok(Vec::new());
        };
        self.map.pan_to(view, at, self.zoom, PanOptions::default())?;
        Ok(Vec::new())
    }

    fn on_reset(&mut self) -> SessionResult<Vec<Effect>> {
        self.storage.remove(WORKOUTS_KEY)?;
        self.repository.clear();
        self.has_restored_history = false;
        tracing::info!("workout history reset");
        Ok(vec![Effect::Reload])
    }

    /// Write the whole repository back to storage.
    fn persist(&mut self) {
        let result = self
            .repository
            .serialize()
            .and_then(|blob| self.storage.set(WORKOUTS_KEY, &blob));
        if let Err(e) = result {
            tracing::error!(err = %e, "persisting workouts failed");
        }
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn repository(&self) -> &WorkoutRepository {
        &self.repository
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The mounted view, once the location arrived.
    pub const fn view(&self) -> Option<ViewHandle> {
        self.view
    }

    pub const fn map(&self) -> &MapAdapter<W> {
        &self.map
    }

    pub const fn map_mut(&mut self) -> &mut MapAdapter<W> {
        &mut self.map
    }

    pub const fn has_restored_history(&self) -> bool {
        self.has_restored_history
    }

    pub const fn location_failed(&self) -> bool {
        self.location_failed
    }
}

impl From<SessionError> for Effect {
    fn from(e: SessionError) -> Self {
        Self::Alert(e.to_string())
    }
}
