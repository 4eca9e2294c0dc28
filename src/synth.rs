use arrayvec::ArrayVec;

use crate::bank::{Instrument, Wave, Waveform};
use crate::consts::*;
use crate::score::Note;

/// A fully resolved tone, ready for the synthesis backend. Frequencies are in
/// Hz and envelope stages in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformEvent {
    pub waveform: Waveform,
    pub start_frequency: f32,
    pub end_frequency: f32,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub sustain_level: f32,
    pub duty_cycle: f32,
    pub pan: f32,
    pub amplitude: f32,
}

/// The synthesis backend. Receives every triggered tone in trigger order and
/// owns it from then on.
pub trait Synthesizer {
    fn play(&mut self, event: &WaveformEvent);
}

impl<F> Synthesizer for F
where
    F: FnMut(&WaveformEvent),
{
    fn play(&mut self, event: &WaveformEvent) {
        (*self)(event)
    }
}

/// A note cell placed on the scale and scaled by the playing sound, before
/// it is spread over the layers of an `Instrument`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthNote {
    pub start_freq: f32,
    pub end_freq: f32,
    pub amplitude: f32,
    pub periods: f32,
    /// Note periods per second, already scaled by the sound pitch.
    pub bps: f32,
}

impl SynthNote {
    /// Place `note`, found on `row`, on the `scale`.
    ///
    /// A slide starts the note `slide` scale entries away from its own pitch
    /// and glides back into it.
    pub fn new(
        note: Note,
        row: usize,
        scale: &[f32; NOTES_SCALE_NOTES],
        beats_per_second: f64,
        pitch: f32,
        volume: f32,
    ) -> Self {
        let last = NOTES_SCALE_NOTES - 1;
        let center = (row + SCALE_CENTER).min(last);

        let end_freq = scale[center];
        let start_freq = if note.slide != 0 {
            let slid = center as i64 + i64::from(note.slide);
            scale[slid.max(0).min(last as i64) as usize]
        } else {
            end_freq
        };

        SynthNote {
            start_freq,
            end_freq,
            amplitude: libm::powf(2.0, f32::from(note.volume) / 3.0) * volume,
            periods: f32::from(note.periods),
            bps: beats_per_second as f32 * pitch,
        }
    }

    /// Resolve one event per enabled layer of `instrument`.
    pub fn resolve(&self, instrument: &Instrument) -> ArrayVec<[WaveformEvent; SYNTH_WAVES]> {
        instrument
            .waves
            .iter()
            .filter_map(|wave| self.resolve_wave(wave))
            .collect()
    }

    fn resolve_wave(&self, wave: &Wave) -> Option<WaveformEvent> {
        let waveform = wave.waveform?;
        if self.periods <= 0.0 {
            return None;
        }

        let mut start_frequency = wave.start_frequency;
        if start_frequency <= RATIO_THRESHOLD && self.start_freq > 0.0 {
            start_frequency *= self.start_freq;
        } else if self.start_freq > 0.0 && self.end_freq > 0.0 {
            // Absolute pitches still follow the slide ratio
            start_frequency *= self.start_freq / self.end_freq;
        }

        let mut end_frequency = wave.end_frequency;
        if end_frequency <= RATIO_THRESHOLD && self.end_freq > 0.0 {
            end_frequency *= self.end_freq;
        }

        let stage = |fraction: f32| self.periods * fraction / self.bps;

        Some(WaveformEvent {
            waveform,
            start_frequency,
            end_frequency,
            attack: stage(wave.attack),
            decay: stage(wave.decay),
            sustain: stage(wave.sustain),
            release: stage(wave.release),
            sustain_level: wave.sustain_level,
            duty_cycle: wave.duty_cycle,
            pan: wave.pan,
            amplitude: self.amplitude * wave.amplitude,
        })
    }
}
