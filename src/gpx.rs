use crate::map::PlacedMarker;
use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub kind: Option<String>,
}

/// Write every placed marker as a GPX waypoint.
pub fn export_markers(path: &Path, markers: &[PlacedMarker]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating GPX: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_waypoints(&mut out, markers)?;
    out.flush()
        .with_context(|| format!("writing GPX: {}", path.display()))?;
    tracing::info!(path = %path.display(), waypoints = markers.len(), "exported markers");
    Ok(())
}

pub fn write_waypoints<W: Write>(out: W, markers: &[PlacedMarker]) -> Result<()> {
    let mut xml = Writer::new_with_indent(out, b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", "mapty"),
        ("xmlns", "http://www.topografix.com/GPX/1/1"),
    ])))?;

    for m in markers {
        let lat = m.at.lat.to_string();
        let lon = m.at.lng.to_string();
        xml.write_event(Event::Start(
            BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
        ))?;
        write_text_element(&mut xml, "name", &m.popup.content)?;
        let kind = m
            .popup
            .class_name
            .strip_suffix("-popup")
            .unwrap_or(&m.popup.class_name);
        write_text_element(&mut xml, "type", kind)?;
        xml.write_event(Event::End(BytesEnd::new("wpt")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

fn write_text_element<W: Write>(xml: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(tag)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

pub fn read_waypoints(path: &Path) -> Result<Vec<Waypoint>> {
    let bytes = fs::read(path).with_context(|| format!("reading GPX: {}", path.display()))?;
    parse_waypoints(bytes)
}

pub fn parse_waypoints(bytes: Vec<u8>) -> Result<Vec<Waypoint>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(Cursor::new(bytes));
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut st = WptState::default();
    let mut out = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => handle_start(&mut st, &e),
            Ok(Event::End(e)) => handle_end(&mut st, &e, &mut out),
            Ok(Event::Empty(e)) => {
                handle_start(&mut st, &e);
                handle_end(&mut st, &e.to_end(), &mut out);
            }
            Ok(Event::Text(e)) => {
                if let Ok(s) = e.decode() {
                    handle_text(&mut st, &s);
                }
            }
            Err(e) => anyhow::bail!("GPX XML parse error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[derive(Default)]
struct WptState {
    in_wpt: bool,
    in_name: bool,
    in_type: bool,

    cur_lat: Option<f64>,
    cur_lon: Option<f64>,
    cur_name: Option<String>,
    cur_type: Option<String>,
}

fn handle_start(st: &mut WptState, e: &BytesStart<'_>) {
    match e.name().as_ref() {
        b"wpt" => {
            *st = WptState {
                in_wpt: true,
                ..WptState::default()
            };
            for a in e.attributes().with_checks(false).flatten() {
                let Ok(v) = a.unescape_value() else {
                    continue;
                };
                match a.key.as_ref() {
                    b"lat" => st.cur_lat = v.parse().ok(),
                    b"lon" => st.cur_lon = v.parse().ok(),
                    _ => {}
                }
            }
        }
        b"name" if st.in_wpt => st.in_name = true,
        b"type" if st.in_wpt => st.in_type = true,
        _ => {}
    }
}

fn handle_end(st: &mut WptState, e: &BytesEnd<'_>, out: &mut Vec<Waypoint>) {
    match e.name().as_ref() {
        b"name" => st.in_name = false,
        b"type" => st.in_type = false,
        b"wpt" => {
            st.in_wpt = false;
            let (Some(lat), Some(lon)) = (st.cur_lat, st.cur_lon) else {
                return;
            };
            out.push(Waypoint {
                lat,
                lon,
                name: st.cur_name.take(),
                kind: st.cur_type.take(),
            });
        }
        _ => {}
    }
}

fn handle_text(st: &mut WptState, s: &str) {
    let slot = if st.in_name {
        &mut st.cur_name
    } else if st.in_type {
        &mut st.cur_type
    } else {
        return;
    };
    slot.get_or_insert_with(String::new).push_str(s);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Popup;
    use crate::types::Coords;

    fn marker(lat: f64, lng: f64, kind: &str, content: &str) -> PlacedMarker {
        PlacedMarker {
            at: Coords::new(lat, lng),
            popup: Popup::sticky(format!("{kind}-popup"), content),
        }
    }

    #[test]
    fn markers_come_back_as_waypoints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.gpx");
        let markers = vec![
            marker(48.11, -1.68, "running", "Running on May 3"),
            marker(47.5, -2.25, "cycling", "Cycling on May 4"),
        ];

        export_markers(&path, &markers).unwrap();
        let wpts = read_waypoints(&path).unwrap();

        assert_eq!(wpts.len(), 2);
        assert_eq!((wpts[0].lat, wpts[0].lon), (48.11, -1.68));
        assert_eq!(wpts[0].name.as_deref(), Some("Running on May 3"));
        assert_eq!(wpts[1].kind.as_deref(), Some("cycling"));
    }

    #[test]
    fn empty_input_has_no_waypoints() {
        assert!(parse_waypoints(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn waypoints_without_position_are_skipped() {
        let gpx = br#"<gpx><wpt lat="1.5"><name>half</name></wpt><wpt lat="2" lon="3"/></gpx>"#;
        let wpts = parse_waypoints(gpx.to_vec()).unwrap();
        assert_eq!(wpts.len(), 1);
        assert_eq!((wpts[0].lat, wpts[0].lon), (2.0, 3.0));
        assert_eq!(wpts[0].name, None);
    }
}
