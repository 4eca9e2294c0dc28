//! A frame-driven music sequencer for compact four track scores.
//!
//! Load a [`Score`], `play` it on a [`Sequencer`] and call [`Sequencer::poll`]
//! once per host frame. Every note that becomes due is resolved against an
//! [`InstrumentBank`] and handed to your [`Synthesizer`] as a
//! [`WaveformEvent`].

#![cfg_attr(not(feature = "std"), no_std)]

mod bank;
mod config;
pub mod consts;
mod score;
mod sequencer;
mod synth;

pub use bank::{major_pentatonic_scale, Instrument, InstrumentBank, Wave, Waveform};
pub use config::{Config, DEFAULT_SCALE_ROOT, DEFAULT_TARGET_FPS};
pub use score::{LoadError, Note, Score};
pub use sequencer::{Sequencer, Sound, SoundError, SoundId};
pub use synth::{SynthNote, Synthesizer, WaveformEvent};
