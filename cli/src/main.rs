// Copyright 2023 Viktor Reusch
//
// This file is part of seamark_convert.
//
// seamark_convert is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by the
// Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// seamark_convert is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License
// for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with seamark_convert. If not, see <https://www.gnu.org/licenses/>.

//! This is the command-line interface for the seamark converter.
//!
//! By default, it converts `data/export.gpx` into `results/osm2mm.gpx`.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use seamark_convert::{convert, InputFormat, Options, Report, TypeFilter};

#[derive(Parser)]
#[command(name = "seamark_convert")]
#[command(about = "Convert OpenStreetMap seamarks to chart plotter GPX waypoints")]
#[command(version)]
struct Args {
    /// GPX or KML export to read
    #[arg(short, long, default_value = "data/export.gpx")]
    input: PathBuf,

    /// GPX file to write; its directory is created if missing
    #[arg(short, long, default_value = "results/osm2mm.gpx")]
    output: PathBuf,

    /// Input format (defaults to the input file extension)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Convert seamark types starting with PREFIX. Can be specified multiple
    /// times. Defaults to buoy, beacon, wreck, and mooring.
    #[arg(short, long = "allow", value_name = "PREFIX")]
    allow: Vec<String>,

    /// Fixed RFC 3339 timestamp for all waypoints instead of the current time
    #[arg(short, long)]
    time: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Gpx,
    Kml,
}

impl From<Format> for InputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Gpx => Self::Gpx,
            Format::Kml => Self::Kml,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Conversion failed with: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Convert `args.input` to `args.output`.
fn run(args: &Args) -> Result<Report, seamark_convert::Error> {
    let format = match args.format {
        Some(format) => format.into(),
        None => InputFormat::from_path(&args.input).ok_or_else(|| {
            seamark_convert::Error::UnknownFormat(args.input.display().to_string())
        })?,
    };
    let filter = if args.allow.is_empty() {
        TypeFilter::default()
    } else {
        TypeFilter::new(args.allow.iter().cloned())
    };
    let options = Options {
        format,
        filter,
        time: args.time,
    };

    log::info!("reading {} as {format}", args.input.display());
    let source = BufReader::new(File::open(&args.input)?);
    create_parent(&args.output)?;
    let mut sink = BufWriter::new(File::create(&args.output)?);
    let report = convert(source, &mut sink, &options)?;
    sink.flush()?;
    log::info!("wrote {}", args.output.display());

    Ok(report)
}

/// Create the directory containing `path` if it does not exist.
fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Print the sorted types and symbols for tuning the conversion rules.
fn print_report(report: &Report) {
    println!("Ignored types: {:?}", report.ignored_types);
    println!("Used symbols: {:?}", report.used_symbols);
}
