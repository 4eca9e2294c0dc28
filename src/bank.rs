use crate::config::DEFAULT_SCALE_ROOT;
use crate::consts::*;

/// Waveform kinds understood by the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    TiltedSawtooth,
    Pulse,
    Organ,
    Noise,
}

/// One layer of an `Instrument`.
///
/// Envelope stages are fractions of one note period. Frequencies at or below
/// 8 are ratios of the note pitch (pitched tracks); anything above is an
/// absolute pitch in Hz (drums).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    /// `None` disables the layer.
    pub waveform: Option<Waveform>,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub start_frequency: f32,
    pub end_frequency: f32,
    pub amplitude: f32,
    pub sustain_level: f32,
    pub duty_cycle: f32,
    pub pan: f32,
}

impl Wave {
    pub const SILENT: Wave = Wave {
        waveform: None,
        attack: 0.0,
        decay: 0.0,
        sustain: 0.0,
        release: 0.0,
        start_frequency: 0.0,
        end_frequency: 0.0,
        amplitude: 0.0,
        sustain_level: 0.0,
        duty_cycle: 0.0,
        pan: 0.0,
    };
}

/// Up to two layered `Wave`s summed into one timbre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instrument {
    pub waves: [Wave; SYNTH_WAVES],
}

/// Instruments for every `(track, row)` of a score plus the pitch scale rows
/// are mapped onto.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentBank {
    pub(crate) instruments: [[Instrument; NOTES_ROWS]; NOTES_TRACKS],
    pub(crate) scale: [f32; NOTES_SCALE_NOTES],
}

impl InstrumentBank {
    /// Create a custom bank.
    pub fn new(
        instruments: [[Instrument; NOTES_ROWS]; NOTES_TRACKS],
        scale: [f32; NOTES_SCALE_NOTES],
    ) -> Self {
        InstrumentBank { instruments, scale }
    }

    /// The built-in instruments (strings, lead, bass and a drum kit) over a
    /// major pentatonic scale rooted at `semitone_index`.
    pub fn with_scale_root(semitone_index: i32) -> Self {
        let strings = strings();
        let lead = lead();
        let bass = bass();
        let drums = [
            high_kick(),
            kick(),
            low_kick(),
            high_tom(),
            tom(),
            hit(),
            clap(),
            crash(),
            high_click(),
            click(),
        ];

        InstrumentBank {
            instruments: [
                [strings; NOTES_ROWS],
                [lead; NOTES_ROWS],
                [bass; NOTES_ROWS],
                drums,
            ],
            scale: major_pentatonic_scale(semitone_index),
        }
    }

    pub fn instrument(&self, track: usize, row: usize) -> Option<&Instrument> {
        self.instruments.get(track)?.get(row)
    }

    pub fn scale(&self) -> &[f32; NOTES_SCALE_NOTES] {
        &self.scale
    }
}

impl Default for InstrumentBank {
    fn default() -> Self {
        Self::with_scale_root(DEFAULT_SCALE_ROOT)
    }
}

/// Build a descending major pentatonic scale spanning four octaves.
///
/// `semitone_index` counts semitones from C0, so A2 (110 Hz) is 45. Entry 0
/// is the highest pitch. Frequencies are floored to whole Hz.
pub fn major_pentatonic_scale(semitone_index: i32) -> [f32; NOTES_SCALE_NOTES] {
    const INTERVALS: [f64; 5] = [9.0, 7.0, 4.0, 2.0, 0.0];

    let freq = 110.0 * libm::pow(2.0, f64::from(semitone_index - 45) / 12.0);
    let mut scale = [0.0; NOTES_SCALE_NOTES];
    for (i, octave) in scale.chunks_exact_mut(INTERVALS.len()).enumerate() {
        let octave_shift = (3 - i as i32) as f64;
        for (note, interval) in octave.iter_mut().zip(INTERVALS.iter()) {
            *note = libm::floor(freq * libm::pow(2.0, octave_shift + interval / 12.0)) as f32;
        }
    }

    scale
}

const C: i32 = 0;
const EB: i32 = 3;

/// Get the absolute frequency of a note on the 12-TET scale (A4 = 440 Hz).
fn note_frequency(pitch_class: i32, octave: i32) -> f32 {
    let semitones = octave * 12 + pitch_class - 57;
    440.0 * libm::powf(2.0, semitones as f32 / 12.0)
}

/// Envelope stages as `[attack, decay, sustain, release]`.
type Adsr = [f32; 4];

fn wave(
    waveform: Waveform,
    adsr: Adsr,
    (start_frequency, end_frequency): (f32, f32),
    amplitude: f32,
    sustain_level: f32,
    duty_cycle: f32,
    pan: f32,
) -> Wave {
    let [attack, decay, sustain, release] = adsr;

    Wave {
        waveform: Some(waveform),
        attack,
        decay,
        sustain,
        release,
        start_frequency,
        end_frequency,
        amplitude,
        sustain_level,
        duty_cycle,
        pan,
    }
}

fn layered(first: Wave, second: Wave) -> Instrument {
    Instrument {
        waves: [first, second],
    }
}

fn single(first: Wave) -> Instrument {
    Instrument {
        waves: [first, Wave::SILENT],
    }
}

// Pitched instruments

fn strings() -> Instrument {
    let adsr = [0.1, 0.1, 0.8, 0.1];
    layered(
        wave(Waveform::Triangle, adsr, (1.0, 1.0), 0.07, 0.8, 0.25, 0.125),
        wave(Waveform::Organ, adsr, (1.0, 1.0), 0.07, 0.8, 0.5, -0.125),
    )
}

fn lead() -> Instrument {
    layered(
        wave(Waveform::Pulse, [0.1, 0.1, 0.6, 0.1], (2.0, 2.0), 0.07, 0.75, 0.125, 0.125),
        wave(Waveform::Triangle, [0.1, 0.1, 0.6, 0.2], (4.0, 4.0), 0.07, 0.75, 0.5, -0.125),
    )
}

fn bass() -> Instrument {
    let adsr = [0.2, 0.0, 0.7, 0.1];
    layered(
        wave(Waveform::Pulse, adsr, (0.25, 0.25), 0.12, 1.0, 0.25, 0.125),
        wave(Waveform::TiltedSawtooth, adsr, (0.5, 0.5), 0.08, 1.0, 0.5, -0.125),
    )
}

// Drums

fn high_kick() -> Instrument {
    let adsr = [0.05, 0.05, 0.8, 0.1];
    let sweep = (note_frequency(EB, 3), note_frequency(C, 0));
    layered(
        wave(Waveform::Sine, adsr, sweep, 0.4, 0.5, 0.5, 0.125),
        wave(Waveform::Pulse, adsr, sweep, 0.3, 0.5, 0.2, -0.125),
    )
}

fn kick() -> Instrument {
    let adsr = [0.05, 0.05, 0.7, 0.1];
    let c1 = note_frequency(C, 1);
    layered(
        wave(Waveform::Sine, adsr, (note_frequency(EB, 3), c1), 0.5, 0.5, 0.5, 0.125),
        wave(Waveform::Pulse, adsr, (note_frequency(EB, 2), c1), 0.4, 0.5, 0.2, -0.125),
    )
}

fn low_kick() -> Instrument {
    let adsr = [0.05, 0.05, 0.7, 0.1];
    let sweep = (note_frequency(EB, 2), note_frequency(C, 0));
    layered(
        wave(Waveform::Sine, adsr, sweep, 0.6, 0.5, 0.5, 0.125),
        wave(Waveform::Pulse, adsr, sweep, 0.5, 0.5, 0.2, -0.125),
    )
}

fn high_tom() -> Instrument {
    let sweep = (note_frequency(C, 4), note_frequency(C, 0));
    single(wave(Waveform::Sine, [0.05, 0.2, 0.7, 0.2], sweep, 0.5, 0.4, 0.2, -0.125))
}

fn tom() -> Instrument {
    let sweep = (note_frequency(EB, 3), note_frequency(C, 0));
    single(wave(Waveform::Sine, [0.05, 0.2, 0.7, 0.2], sweep, 0.6, 0.4, 0.4, 0.0))
}

fn hit() -> Instrument {
    let c7 = note_frequency(C, 7);
    single(wave(Waveform::Noise, [0.02, 0.1, 0.05, 0.05], (c7, c7), 0.08, 0.1, 0.5, 0.0))
}

fn clap() -> Instrument {
    let c6 = note_frequency(C, 6);
    single(wave(Waveform::Noise, [0.05, 0.05, 0.3, 0.3], (c6, c6), 0.11, 0.3, 0.5, 0.0))
}

fn crash() -> Instrument {
    let sweep = (note_frequency(EB, 6), 2.0 * note_frequency(EB, 8));
    single(wave(Waveform::Noise, [0.05, 0.05, 0.0, 0.9], sweep, 0.12, 0.4, 0.5, 0.0))
}

fn click() -> Instrument {
    let eb6 = note_frequency(EB, 6);
    single(wave(Waveform::Triangle, [0.05, 0.2, 0.1, 0.3], (eb6, eb6), 0.1, 0.2, 0.5, 0.0))
}

fn high_click() -> Instrument {
    let eb7 = note_frequency(EB, 7);
    single(wave(Waveform::Triangle, [0.05, 0.2, 0.2, 0.3], (eb7, eb7), 0.06, 0.3, 0.5, 0.0))
}
