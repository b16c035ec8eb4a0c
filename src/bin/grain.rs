// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate grainbrot;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use grainbrot::{run_sweep, Grid, OutputSink, PlaneWindow, SweepConfig, TilePool};
use num::Complex;
use std::io;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTDIR: &str = "outdir";
const SIZE: &str = "size";
const TOPLEFT: &str = "topleft";
const BOTTOMRIGHT: &str = "bottomright";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const CHECKPOINT: &str = "checkpoint";
const SAVEPROMPT: &str = "save-prompt";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("grain")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot grain-size benchmark")
        .arg(
            Arg::with_name(OUTDIR)
                .required(false)
                .long(OUTDIR)
                .short("o")
                .takes_value(true)
                .default_value(".")
                .help("Directory that receives images, report, and plot"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("600x600")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse image size"))
                .help("Size of the rendered image"),
        )
        .arg(
            Arg::with_name(TOPLEFT)
                .required(false)
                .long(TOPLEFT)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.2,1.5")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse top left corner"))
                .help("Top left corner of the plane window"),
        )
        .arg(
            Arg::with_name(BOTTOMRIGHT)
                .required(false)
                .long(BOTTOMRIGHT)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0.8,-1.5")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse bottom right corner"))
                .help("Bottom right corner of the plane window"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of worker threads (defaults to the hardware count)"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        65536,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 65536",
                    )
                })
                .help("Escape-time iteration ceiling"),
        )
        .arg(
            Arg::with_name(CHECKPOINT)
                .required(false)
                .long(CHECKPOINT)
                .short("c")
                .takes_value(true)
                .default_value("200")
                .validator(move |s| {
                    validate_range(
                        &s,
                        0,
                        100_000,
                        "Could not parse checkpoint interval",
                        "Checkpoint interval must be between 0 and 100000",
                    )
                })
                .help("Snapshot every Nth grain size (0 disables snapshots)"),
        )
        .arg(
            Arg::with_name(SAVEPROMPT)
                .required(false)
                .long(SAVEPROMPT)
                .help("After the sweep, read a filename from stdin and save the image under it"),
        )
        .get_matches()
}

fn main() {
    env_logger::init();

    let matches = args();
    let size =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let top_left =
        parse_complex(matches.value_of(TOPLEFT).unwrap()).expect("Error parsing top left point");
    let bottom_right = parse_complex(matches.value_of(BOTTOMRIGHT).unwrap())
        .expect("Error parsing bottom right point");
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t).expect("Could not parse thread count"),
        None => num_cpus::get(),
    };
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration count");
    let checkpoint = usize::from_str(matches.value_of(CHECKPOINT).unwrap())
        .expect("Could not parse checkpoint interval");

    let plane = match PlaneWindow::new(size.0, size.1, top_left, bottom_right) {
        Ok(plane) => plane,
        Err(e) => {
            eprintln!("Bad plane window: {}", e);
            std::process::exit(1);
        }
    };

    let mut grid = Grid::new(size.0, size.1);
    let mut pool = TilePool::new(threads);
    let sink = OutputSink::new(matches.value_of(OUTDIR).unwrap());
    let config = SweepConfig {
        checkpoint_interval: checkpoint,
        iteration_limit: iterations,
        ..SweepConfig::default()
    };

    let outcome = run_sweep(&mut pool, &mut grid, &plane, &sink, &config);

    match outcome.fastest() {
        Some(best) => println!(
            "minimum elapsed time: {:.3} ms at grain size {}",
            best.elapsed_ms(),
            best.grain_size
        ),
        None => println!("no samples recorded"),
    }

    if matches.is_present(SAVEPROMPT) {
        println!("Please insert the name of the png file where you want to save the image:");
        let mut name = String::new();
        io::stdin()
            .read_line(&mut name)
            .expect("Could not read a filename from stdin");
        let name = name.trim();
        if name.is_empty() {
            eprintln!("No filename given; image not saved.");
        } else {
            match sink.write_named(&grid, name) {
                Ok(path) => println!("Image saved as \"{}\".", path.display()),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    if outcome.persistence_failures > 0 {
        eprintln!(
            "{} artifact(s) could not be written",
            outcome.persistence_failures
        );
        std::process::exit(1);
    }
}
