#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::Parser;
use mapty::app::App;
use mapty::cli::{self, Cmd};
use mapty::database::SqliteStore;
use mapty::form::FormInput;
use mapty::geolocation::FixedLocation;
use mapty::map::HeadlessMap;
use mapty::types::WorkoutKind;
use mapty::{dlog, gpx, shell, utils};
use std::io;

type Session = App<HeadlessMap, SqliteStore, FixedLocation>;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let store = SqliteStore::open(&cli.store)
        .with_context(|| format!("opening store: {}", cli.store.display()))?;
    let mut app: Session = App::boot(HeadlessMap::new, store, FixedLocation(cli.home), cli.zoom)
        .context("starting session")?;
    report_alerts(&mut app);

    match cli.cmd.unwrap_or(Cmd::List) {
        Cmd::Add {
            at,
            kind,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            dlog!("mode=add at={at} kind={kind}");
            if !app.click_map(at)? {
                anyhow::bail!("The map is unavailable; pass --home LAT,LON (or set MAPTY_HOME).");
            }
            if kind == WorkoutKind::Cycling {
                app.change_kind(kind)?;
            }
            let before = app.controller().repository().len();
            app.submit(FormInput {
                kind,
                distance,
                duration,
                cadence,
                elevation,
            })?;
            app.settle()?;

            if app.controller().repository().len() == before {
                let alerts = app.screen_mut().take_alerts();
                anyhow::bail!("{}", alerts.join("; "));
            }
            if let Some(row) = app.screen().rows.first() {
                println!("{row}");
            }
        }
        Cmd::List => {
            for row in &app.screen().rows {
                println!("{row}");
            }
        }
        Cmd::Goto { id } => {
            if app.controller().repository().find_by_id(&id).is_err() {
                anyhow::bail!("No workout with id {id}");
            }
            app.click_row(&id)?;
            match app.controller().map().widget().center() {
                Some((center, zoom)) if app.controller().map().is_ready() => {
                    println!("{center}\tzoom={zoom}");
                }
                _ => anyhow::bail!("The map is unavailable; pass --home LAT,LON."),
            }
        }
        Cmd::Reset => {
            app.reset()?;
            println!("Workout history cleared.");
        }
        Cmd::ExportGpx { path } => {
            let markers = app.controller().map().widget().markers();
            if !app.controller().map().is_ready() {
                anyhow::bail!("The map is unavailable; pass --home LAT,LON.");
            }
            gpx::export_markers(&path, markers)?;
            println!("{} markers written to {}", markers.len(), path.display());
        }
        Cmd::Shell => {
            let stdin = io::stdin();
            shell::run(&mut app, stdin.lock(), io::stdout())?;
        }
    }

    report_alerts(&mut app);
    Ok(())
}

fn report_alerts(app: &mut Session) {
    for alert in app.screen_mut().take_alerts() {
        eprintln!("{alert}");
    }
}
