//! Map widget boundary.
//!
//! [`MapWidget`] is whatever actually draws the map. [`MapAdapter`] wraps it
//! with a two-state lifecycle: every call other than
//! [`MapAdapter::initialize`] fails with [`MapError::NotReady`] until a view
//! has been mounted. Callers pass back the [`ViewHandle`] that `initialize`
//! returned; a handle from another mount is rejected.

use crate::dlog;
use crate::error::MapError;
use crate::types::Coords;

pub const DEFAULT_ZOOM: u8 = 13;
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Opaque reference to a mounted map view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewHandle(u32);

impl ViewHandle {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: String,
    pub content: String,
}

impl Popup {
    /// Sticky popup that stays open while other markers are added.
    pub fn sticky(class_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            max_width: 250,
            min_width: 100,
            auto_close: false,
            close_on_click: false,
            class_name: class_name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanOptions {
    pub animate: bool,
    pub duration_s: f64,
}

impl Default for PanOptions {
    fn default() -> Self {
        Self {
            animate: true,
            duration_s: 1.0,
        }
    }
}

/// The external mapping service.
pub trait MapWidget {
    fn mount(&mut self, center: Coords, zoom: u8) -> Result<ViewHandle, MapError>;
    fn add_tile_layer(&mut self, view: ViewHandle, url: &str, attribution: &str);
    /// Adds a marker with its popup opened.
    fn add_marker(&mut self, view: ViewHandle, at: Coords, popup: &Popup);
    fn set_view(&mut self, view: ViewHandle, center: Coords, zoom: u8, pan: PanOptions);
}

type ClickHandler = Box<dyn FnMut(Coords)>;

pub struct MapAdapter<W> {
    widget: W,
    view: Option<ViewHandle>,
    on_click: Option<ClickHandler>,
}

impl<W: MapWidget> MapAdapter<W> {
    pub const fn new(widget: W) -> Self {
        Self {
            widget,
            view: None,
            on_click: None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        self.view.is_some()
    }

    fn check(&self, view: ViewHandle, op: &'static str) -> Result<(), MapError> {
        match self.view {
            None => Err(MapError::NotReady(op)),
            Some(mounted) if mounted != view => Err(MapError::ForeignView { op }),
            Some(_) => Ok(()),
        }
    }

    /// Mount the view and its tile layer. Uninitialized -> Ready.
    pub fn initialize(&mut self, center: Coords, zoom: u8) -> Result<ViewHandle, MapError> {
        let view = self.widget.mount(center, zoom)?;
        self.widget.add_tile_layer(view, TILE_URL, TILE_ATTRIBUTION);
        self.view = Some(view);
        tracing::info!(%center, zoom, "map view ready");
        Ok(view)
    }

    /// Always adds a new marker; there is no update or removal.
    pub fn place_marker(
        &mut self,
        view: ViewHandle,
        at: Coords,
        popup: &Popup,
    ) -> Result<(), MapError> {
        self.check(view, "place_marker")?;
        dlog!("marker at={at} class={}", popup.class_name);
        self.widget.add_marker(view, at, popup);
        Ok(())
    }

    /// Register the click handler, replacing any previous one.
    pub fn on_view_click<F>(&mut self, view: ViewHandle, handler: F) -> Result<(), MapError>
    where
        F: FnMut(Coords) + 'static,
    {
        self.check(view, "on_view_click")?;
        self.on_click = Some(Box::new(handler));
        Ok(())
    }

    pub fn pan_to(
        &mut self,
        view: ViewHandle,
        center: Coords,
        zoom: u8,
        pan: PanOptions,
    ) -> Result<(), MapError> {
        self.check(view, "pan_to")?;
        dlog!("pan to={center} zoom={zoom}");
        self.widget.set_view(view, center, zoom, pan);
        Ok(())
    }

    /// Entry point for the widget reporting a click on the view.
    ///
    /// Returns whether a handler received it.
    pub fn dispatch_click(&mut self, at: Coords) -> Result<bool, MapError> {
        if self.view.is_none() {
            return Err(MapError::NotReady("dispatch_click"));
        }
        match self.on_click.as_mut() {
            Some(handler) => {
                handler(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub const fn widget(&self) -> &W {
        &self.widget
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    pub at: Coords,
    pub popup: Popup,
}

/// In-process widget that just remembers what it was asked to draw.
#[derive(Debug, Default, Clone)]
pub struct HeadlessMap {
    mounted: u32,
    fail_mount: Option<String>,
    center: Option<(Coords, u8)>,
    tile_layers: Vec<String>,
    markers: Vec<PlacedMarker>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A widget whose mount always fails, e.g. no container to draw in.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_mount: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn markers(&self) -> &[PlacedMarker] {
        &self.markers
    }

    pub const fn center(&self) -> Option<(Coords, u8)> {
        self.center
    }

    pub fn tile_layers(&self) -> &[String] {
        &self.tile_layers
    }
}

impl MapWidget for HeadlessMap {
    fn mount(&mut self, center: Coords, zoom: u8) -> Result<ViewHandle, MapError> {
        if let Some(reason) = &self.fail_mount {
            return Err(MapError::Init(reason.clone()));
        }
        self.mounted += 1;
        self.center = Some((center, zoom));
        Ok(ViewHandle::new(self.mounted))
    }

    fn add_tile_layer(&mut self, _view: ViewHandle, url: &str, _attribution: &str) {
        self.tile_layers.push(url.to_string());
    }

    fn add_marker(&mut self, _view: ViewHandle, at: Coords, popup: &Popup) {
        self.markers.push(PlacedMarker {
            at,
            popup: popup.clone(),
        });
    }

    fn set_view(&mut self, _view: ViewHandle, center: Coords, zoom: u8, _pan: PanOptions) {
        self.center = Some((center, zoom));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const HOME: Coords = Coords::new(48.11, -1.68);

    #[test]
    fn calls_before_initialize_fail_fast() {
        let mut map = MapAdapter::new(HeadlessMap::new());
        let view = ViewHandle::new(1);
        let popup = Popup::sticky("running-popup", "x");
        assert_eq!(
            map.place_marker(view, HOME, &popup),
            Err(MapError::NotReady("place_marker"))
        );
        assert!(map.pan_to(view, HOME, 13, PanOptions::default()).is_err());
        assert!(map.on_view_click(view, |_| {}).is_err());
        assert!(map.dispatch_click(HOME).is_err());
        assert!(!map.is_ready());
    }

    #[test]
    fn initialize_mounts_view_and_tiles() {
        let mut map = MapAdapter::new(HeadlessMap::new());
        map.initialize(HOME, DEFAULT_ZOOM).unwrap();
        assert!(map.is_ready());
        assert_eq!(map.widget().center(), Some((HOME, DEFAULT_ZOOM)));
        assert_eq!(map.widget().tile_layers(), [TILE_URL.to_string()]);
    }

    #[test]
    fn failing_widget_stays_uninitialized() {
        let mut map = MapAdapter::new(HeadlessMap::failing("no container"));
        assert!(matches!(map.initialize(HOME, 13), Err(MapError::Init(_))));
        assert!(!map.is_ready());
    }

    #[test]
    fn markers_always_accumulate() {
        let mut map = MapAdapter::new(HeadlessMap::new());
        let view = map.initialize(HOME, 13).unwrap();
        let popup = Popup::sticky("cycling-popup", "ride");
        map.place_marker(view, HOME, &popup).unwrap();
        map.place_marker(view, HOME, &popup).unwrap();
        assert_eq!(map.widget().markers().len(), 2);
    }

    #[test]
    fn click_reaches_latest_handler_only() {
        let mut map = MapAdapter::new(HeadlessMap::new());
        let view = map.initialize(HOME, 13).unwrap();
        assert!(!map.dispatch_click(HOME).unwrap());

        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&first);
        map.on_view_click(view, move |c| sink.borrow_mut().push(c)).unwrap();
        let sink = Rc::clone(&second);
        map.on_view_click(view, move |c| sink.borrow_mut().push(c)).unwrap();

        assert!(map.dispatch_click(Coords::new(1.0, 2.0)).unwrap());
        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![Coords::new(1.0, 2.0)]);
    }

    #[test]
    fn handle_from_another_mount_is_rejected() {
        let mut map = MapAdapter::new(HeadlessMap::new());
        let view = map.initialize(HOME, 13).unwrap();
        let other = ViewHandle::new(99);
        let popup = Popup::sticky("running-popup", "x");

        assert_eq!(
            map.place_marker(other, HOME, &popup),
            Err(MapError::ForeignView { op: "place_marker" })
        );
        assert!(map.pan_to(other, HOME, 13, PanOptions::default()).is_err());
        assert!(map.on_view_click(other, |_| {}).is_err());
        assert!(map.widget().markers().is_empty());

        map.pan_to(view, Coords::new(1.0, 2.0), 15, PanOptions::default())
            .unwrap();
        assert_eq!(map.widget().center(), Some((Coords::new(1.0, 2.0), 15)));
    }
}
