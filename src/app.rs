//! Top-level composition: one controller, its collaborators, and the event
//! loop that feeds it.

use crate::controller::{Effect, Event, Mailbox, SessionController};
use crate::database::KeyValueStore;
use crate::dlog;
use crate::error::{MapError, SessionResult};
use crate::form::FormInput;
use crate::geolocation::GeolocationSource;
use crate::map::MapWidget;
use crate::render::WorkoutRow;
use crate::repository::WorkoutRepository;
use crate::types::{Coords, WorkoutKind};
use std::time::Duration;

/// What the user currently sees, built up from applied [`Effect`]s.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Screen {
    /// Newest first.
    pub rows: Vec<WorkoutRow>,
    pub form_visible: bool,
    /// Layout collapsed during the hide transition.
    pub form_collapsed: bool,
    pub elevation_field_visible: bool,
    pub distance_focused: bool,
    pub alerts: Vec<String>,
}

impl Screen {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Alert(msg) => {
                tracing::warn!(alert = %msg, "user notified");
                self.alerts.push(msg);
            }
            Effect::RenderRow(row) => self.rows.insert(0, row),
            Effect::ShowForm => {
                self.form_visible = true;
                self.distance_focused = true;
            }
            Effect::HideForm => {
                self.form_visible = false;
                self.form_collapsed = true;
                self.distance_focused = false;
            }
            Effect::RestoreFormDisplay => self.form_collapsed = false,
            Effect::ToggleElevationField => {
                self.elevation_field_visible = !self.elevation_field_visible;
            }
            Effect::Schedule { .. } | Effect::Reload => {}
        }
    }

    /// Alerts shown since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }
}

struct Timer {
    due: Duration,
    event: Event,
}

/// Single-threaded event loop around a [`SessionController`].
///
/// Time is virtual: scheduled events fire when [`App::advance`] or
/// [`App::settle`] moves the clock past them.
pub struct App<W, S, G> {
    controller: SessionController<W, S>,
    make_widget: Box<dyn Fn() -> W>,
    geolocation: G,
    mailbox: Mailbox,
    timers: Vec<Timer>,
    now: Duration,
    screen: Screen,
    reloads: u32,
}

impl<W, S, G> App<W, S, G>
where
    W: MapWidget,
    S: KeyValueStore,
    G: GeolocationSource,
{
    /// Construct the session, restore history, and ask for the position.
    pub fn boot<F>(make_widget: F, storage: S, geolocation: G, zoom: u8) -> SessionResult<Self>
    where
        F: Fn() -> W + 'static,
    {
        let mailbox = Mailbox::default();
        let (controller, effects) = SessionController::new(
            make_widget(),
            storage,
            WorkoutRepository::new(),
            Mailbox::clone(&mailbox),
            zoom,
        );

        let mut app = Self {
            controller,
            make_widget: Box::new(make_widget),
            geolocation,
            mailbox,
            timers: Vec::new(),
            now: Duration::ZERO,
            screen: Screen::default(),
            reloads: 0,
        };
        app.apply_all(effects);
        app.controller.request_location(&mut app.geolocation);
        app.run_until_idle()?;
        Ok(app)
    }

    /// Process queued events until none are left.
    pub fn run_until_idle(&mut self) -> SessionResult<()> {
        loop {
            let next = self.mailbox.borrow_mut().pop_front();
            let Some(event) = next else {
                return Ok(());
            };

            match self.controller.handle(event) {
                Ok(effects) => self.apply_all(effects),
                Err(e) if e.is_fatal() => {
                    tracing::error!(err = %e, "session failed");
                    return Err(e);
                }
                Err(e) => self.screen.apply(e.into()),
            }
        }
    }

    fn apply_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Schedule { after, event } => self.timers.push(Timer {
                    due: self.now + after,
                    event,
                }),
                Effect::Reload => self.reload(),
                other => self.screen.apply(other),
            }
        }
    }

    fn reload(&mut self) {
        self.reloads += 1;
        self.timers.clear();
        self.screen = Screen::default();
        let effects = self.controller.restart((self.make_widget)());
        self.apply_all(effects);
        self.controller.request_location(&mut self.geolocation);
        dlog!("session reloaded count={}", self.reloads);
    }

    fn dispatch(&mut self, event: Event) -> SessionResult<()> {
        self.mailbox.borrow_mut().push_back(event);
        self.run_until_idle()
    }

    /// The map widget reports a click. `Ok(false)` if there is no map to click.
    pub fn click_map(&mut self, at: Coords) -> SessionResult<bool> {
        match self.controller.map_mut().dispatch_click(at) {
            Ok(delivered) => {
                self.run_until_idle()?;
                Ok(delivered)
            }
            Err(MapError::NotReady(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn change_kind(&mut self, kind: WorkoutKind) -> SessionResult<()> {
        self.dispatch(Event::KindChanged(kind))
    }

    pub fn submit(&mut self, input: FormInput) -> SessionResult<()> {
        self.dispatch(Event::Submit(input))
    }

    pub fn click_row(&mut self, id: &str) -> SessionResult<()> {
        self.dispatch(Event::RowClicked(id.to_string()))
    }

    pub fn reset(&mut self) -> SessionResult<()> {
        self.dispatch(Event::Reset)
    }

    /// Move the clock forward and fire whatever became due.
    pub fn advance(&mut self, by: Duration) -> SessionResult<()> {
        self.now += by;
        loop {
            let Some(pos) = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= self.now)
                .min_by_key(|(_, t)| t.due)
                .map(|(i, _)| i)
            else {
                return Ok(());
            };
            let timer = self.timers.remove(pos);
            self.dispatch(timer.event)?;
        }
    }

    /// Fire every pending timer.
    pub fn settle(&mut self) -> SessionResult<()> {
        let Some(last) = self.timers.iter().map(|t| t.due).max() else {
            return Ok(());
        };
        let by = last.saturating_sub(self.now);
        self.advance(by)
    }

    pub const fn controller(&self) -> &SessionController<W, S> {
        &self.controller
    }

    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    pub const fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub const fn reloads(&self) -> u32 {
        self.reloads
    }
}
