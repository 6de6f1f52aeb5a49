use crate::map::DEFAULT_ZOOM;
use crate::types::{Coords, WorkoutKind};
use crate::utils::parse_coords;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_STORE: &str = "mapty.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Pin running and cycling workouts on a map and keep the history"
)]
pub struct Cli {
    /// SQLite file holding the persisted workout history.
    #[arg(long, env = "MAPTY_STORE", default_value = DEFAULT_STORE, global = true)]
    pub store: PathBuf,

    /// Position reported by geolocation, as LAT,LON. Without it the map is unavailable.
    #[arg(long, env = "MAPTY_HOME", value_parser = parse_coords, global = true)]
    pub home: Option<Coords>,

    /// Zoom level for the initial view and for panning to a workout.
    #[arg(long, default_value_t = DEFAULT_ZOOM, global = true)]
    pub zoom: u8,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Record one workout at a map position.
    Add {
        /// Where on the map the workout was pinned, as LAT,LON.
        #[arg(long, value_parser = parse_coords)]
        at: Coords,

        #[arg(long = "type", value_parser = parse_kind, default_value = "running")]
        kind: WorkoutKind,

        /// Distance in km.
        #[arg(long)]
        distance: String,

        /// Duration in minutes.
        #[arg(long)]
        duration: String,

        /// Running cadence in steps per minute.
        #[arg(long, default_value = "")]
        cadence: String,

        /// Cycling elevation gain in meters.
        #[arg(long, default_value = "")]
        elevation: String,
    },

    /// Print the workout list, newest first. This is the default.
    List,

    /// Pan the map to a listed workout.
    Goto { id: String },

    /// Forget all stored workouts.
    Reset,

    /// Write the session's map markers to a GPX file.
    ExportGpx { path: PathBuf },

    /// Drive the session interactively from stdin.
    Shell,
}

fn parse_kind(s: &str) -> Result<WorkoutKind, String> {
    s.parse::<WorkoutKind>().map_err(|e| e.to_string())
}
