#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![forbid(unsafe_code)]

use colored::Colorize;
use error_iter::ErrorIter;
use seqt::{Config, LoadError, Score, Sequencer, SoundError, WaveformEvent};
use std::{path::Path, process::ExitCode};
use thiserror::Error;

const DEFAULT_LOG_CONFIG: &str = "demos/log4rs.yaml";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing seqt-file argument\nUsage: player <seqt-file> [seconds] [loops]")]
    MissingFilename,

    #[error("Invalid {0} argument\nUsage: player <seqt-file> [seconds] [loops]")]
    InvalidArgument(&'static str),

    #[error("Failed to init logging: {0}")]
    Logging(String),

    #[error("Score error")]
    Load(#[from] LoadError),

    #[error("Sound error")]
    Sound(#[from] SoundError),
}

impl ErrorIter for Error {}

fn main() -> ExitCode {
    match player() {
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);

            for cause in e.chain().skip(1) {
                eprintln!("{} {}", "caused by:".bright_red(), cause);
            }

            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn init_logging() -> Result<(), Error> {
    let path = std::env::var("SEQT_LOG_CONFIG").unwrap_or_else(|_| DEFAULT_LOG_CONFIG.into());
    if !Path::new(&path).exists() {
        return Ok(());
    }

    log4rs::init_file(&path, log4rs::config::Deserializers::default())
        .map_err(|err| Error::Logging(err.to_string()))
}

fn player() -> Result<(), Error> {
    init_logging()?;

    let mut args = std::env::args().skip(1);
    let filename = args.next().ok_or(Error::MissingFilename)?;
    let seconds: f64 = match args.next() {
        Some(arg) => arg.parse().map_err(|_| Error::InvalidArgument("seconds"))?,
        None => 10.0,
    };
    let loops: i32 = match args.next() {
        Some(arg) => arg.parse().map_err(|_| Error::InvalidArgument("loops"))?,
        None => -1,
    };

    let score = Score::from_file(&filename)?;
    println!(
        "{} {} ({} BPM, {:.2}s per loop)",
        "playing".green(),
        filename,
        score.bpm(),
        score.length()
    );

    let config = Config::default();
    let fps = config.target_fps;
    let mut sequencer = Sequencer::new(config);
    let id = sequencer.play(&score, loops)?;

    // Stand-in for a real frame loop and audio backend
    let frames = (seconds.max(0.0) * fps) as u64;
    for frame in 1..=frames {
        let time = frame as f64 / fps;
        sequencer.poll(&mut |event: &WaveformEvent| {
            println!(
                "{} {:<16} {:>8.1} Hz -> {:>8.1} Hz  amp {:.3}  pan {:+.3}  len {:.3}s",
                format!("[{time:7.3}]").dimmed(),
                format!("{:?}", event.waveform).cyan(),
                event.start_frequency,
                event.end_frequency,
                event.amplitude,
                event.pan,
                event.attack + event.decay + event.sustain + event.release,
            );
        });

        if !sequencer.is_playing(id) {
            println!("{} after {:.3}s", "finished".green(), time);
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_reaches_the_load_error() {
        let err = Error::from(LoadError::Magic);
        let chain: Vec<_> = err.chain().map(ToString::to_string).collect();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], "Score error");
        assert_eq!(chain[1], LoadError::Magic.to_string());
    }
}
