//! Line-oriented driver: each input line becomes one user interaction.

use crate::app::App;
use crate::database::KeyValueStore;
use crate::form::FormInput;
use crate::geolocation::GeolocationSource;
use crate::map::MapWidget;
use crate::types::WorkoutKind;
use crate::utils::parse_coords;
use anyhow::Result;
use std::io::{BufRead, Write};

const HELP: &str = "\
commands:
  click LAT,LON        click the map (opens the form)
  type running|cycling switch the form's workout type
  submit DIST DUR X    submit the form (X = cadence or elevation)
  row ID               click a list row (pans the map)
  list                 show the workout list
  wait                 let pending form transitions finish
  reset                clear history and restart
  quit";

pub fn run<W, S, G, R, O>(app: &mut App<W, S, G>, input: R, mut out: O) -> Result<()>
where
    W: MapWidget,
    S: KeyValueStore,
    G: GeolocationSource,
    R: BufRead,
    O: Write,
{
    let mut kind = WorkoutKind::Running;
    writeln!(out, "{HELP}")?;

    for line in input.lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        match (cmd, args.as_slice()) {
            ("quit" | "exit", _) => break,
            ("help", _) => writeln!(out, "{HELP}")?,
            ("click", [at]) => match parse_coords(at) {
                Ok(at) => {
                    if !app.click_map(at)? {
                        writeln!(out, "map is unavailable")?;
                    } else if app.screen().form_visible {
                        writeln!(out, "form open at {at} ({kind})")?;
                    }
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            ("type", [name]) => match name.parse::<WorkoutKind>() {
                Ok(next) if next != kind => {
                    kind = next;
                    app.change_kind(kind)?;
                }
                Ok(_) => {}
                Err(e) => writeln!(out, "{e}")?,
            },
            ("submit", [distance, duration, extra]) => {
                let form = match kind {
                    WorkoutKind::Running => FormInput::running(distance, duration, extra),
                    WorkoutKind::Cycling => FormInput::cycling(distance, duration, extra),
                };
                let before = app.controller().repository().len();
                app.submit(form)?;
                if app.controller().repository().len() > before
                    && let Some(row) = app.screen().rows.first()
                {
                    writeln!(out, "{row}")?;
                }
            }
            ("row", [id]) => app.click_row(id)?,
            ("list", _) => {
                for row in &app.screen().rows {
                    writeln!(out, "{row}")?;
                }
            }
            ("wait", _) => app.settle()?,
            ("reset", _) => {
                app.reset()?;
                writeln!(out, "history cleared")?;
            }
            _ => writeln!(out, "unknown command: {line}")?,
        }

        for alert in app.screen_mut().take_alerts() {
            writeln!(out, "! {alert}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::geolocation::FixedLocation;
    use crate::map::HeadlessMap;
    use crate::types::Coords;

    fn transcript(script: &str) -> (String, usize) {
        let mut app = App::boot(
            HeadlessMap::new,
            MemoryStore::new(),
            FixedLocation(Some(Coords::new(48.11, -1.68))),
            13,
        )
        .unwrap();
        let mut out = Vec::new();
        run(&mut app, script.as_bytes(), &mut out).unwrap();
        let len = app.controller().repository().len();
        (String::from_utf8(out).unwrap(), len)
    }

    #[test]
    fn records_running_and_cycling() {
        let (out, len) = transcript(
            "click 48.2,-1.7\nsubmit 5 30 170\nwait\nclick 48.3,-1.6\ntype cycling\nsubmit 34 100 143\nquit\n",
        );
        assert_eq!(len, 2);
        assert!(out.contains("20.4 km/h"));
        assert!(out.contains("170 spm"));
    }

    #[test]
    fn invalid_submit_is_reported() {
        let (out, len) = transcript("click 48.2,-1.7\nsubmit -1 30 170\n");
        assert_eq!(len, 0);
        assert!(out.contains("! The input isn't a positive number!"));
    }

    #[test]
    fn unknown_commands_are_echoed() {
        let (out, _) = transcript("dance\n");
        assert!(out.contains("unknown command: dance"));
    }
}
