use core::fmt;
use log::{debug, trace, warn};

use crate::bank::InstrumentBank;
use crate::config::{valid_fps, Config, DEFAULT_TARGET_FPS};
use crate::consts::*;
use crate::score::Score;
use crate::synth::{SynthNote, Synthesizer};

const SLOT_BITS: u32 = 32;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;

/// Possible errors from sound control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum SoundError {
    #[cfg_attr(feature = "std", error("Too many sounds playing"))]
    TooManySounds,

    #[cfg_attr(feature = "std", error("Sound {0} not found"))]
    NotFound(SoundId),

    #[cfg_attr(feature = "std", error("Invalid {0} value"))]
    InvalidValue(&'static str),

    #[cfg_attr(feature = "std", error("Invalid track {0}"))]
    InvalidTrack(usize),
}

/// Handle to a playing sound.
///
/// The low 32 bits hold the 1-based pool slot and the high bits a generation
/// counter, so a handle to a sound that has finished never matches the sound
/// that reuses its slot. Zero is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u64);

impl SoundId {
    fn new(generation: u64, index: usize) -> Self {
        SoundId((generation << SLOT_BITS) | (index as u64 + 1))
    }

    /// Pool slot this handle points to, if it is in range.
    fn index(self) -> Option<usize> {
        let slot = (self.0 & SLOT_MASK) as usize;
        slot.checked_sub(1).filter(|&index| index < MAX_SOUNDS)
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One score being played with its own timeline and modifiers.
#[derive(Debug, Clone, Copy)]
pub struct Sound<'a> {
    id: SoundId,
    // `None` plays with the sequencer's default bank
    bank: Option<&'a InstrumentBank>,
    score: &'a Score,
    frame: u64,
    stop_frame: u64,
    speed: f64,
    pitch: f32,
    volume: f32,
    last_step: Option<u64>,
    paused: bool,
    muted_tracks: [bool; NOTES_TRACKS],
}

impl<'a> Sound<'a> {
    fn new(
        id: SoundId,
        score: &'a Score,
        bank: Option<&'a InstrumentBank>,
        stop_frame: u64,
    ) -> Self {
        Sound {
            id,
            bank,
            score,
            frame: 0,
            stop_frame,
            speed: 1.0,
            pitch: 1.0,
            volume: 1.0,
            last_step: None,
            paused: false,
            muted_tracks: [false; NOTES_TRACKS],
        }
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    pub fn score(&self) -> &'a Score {
        self.score
    }

    /// Frames played so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame at which the sound is released. `u64::MAX` loops forever.
    pub fn stop_frame(&self) -> u64 {
        self.stop_frame
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The last step whose notes were triggered, `None` before the first.
    pub fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_track_muted(&self, track: usize) -> bool {
        self.muted_tracks.get(track).copied().unwrap_or(false)
    }

    /// Advance one frame and trigger the notes of a newly reached step.
    /// Returns `false` once the sound has reached its stop frame.
    fn advance<S>(&mut self, default_bank: &InstrumentBank, fps: f64, synth: &mut S) -> bool
    where
        S: Synthesizer + ?Sized,
    {
        if self.paused {
            return true;
        }

        let frame = self.frame.saturating_add(1);
        if frame >= self.stop_frame {
            return false;
        }
        self.frame = frame;

        let beats_per_second = self.score.beats_per_second();
        let step = libm::floor(frame as f64 * beats_per_second * self.speed / fps) as u64;
        if self.last_step == Some(step) {
            return true;
        }
        self.last_step = Some(step);

        let bank = self.bank.unwrap_or(default_bank);
        self.trigger(step, bank, beats_per_second, synth);

        true
    }

    /// Send every non-silent cell of `step` to the backend, track by track and
    /// row by row.
    fn trigger<S>(&self, step: u64, bank: &InstrumentBank, beats_per_second: f64, synth: &mut S)
    where
        S: Synthesizer + ?Sized,
    {
        let score = self.score;

        for track in 0..NOTES_TRACKS {
            if self.muted_tracks[track] {
                continue;
            }

            let column = (step % score.track_columns(track) as u64) as usize;
            for row in 0..NOTES_ROWS {
                let note = score.pages[track][row][column];
                if note.periods == 0 {
                    continue;
                }

                let synth_note = SynthNote::new(
                    note,
                    row,
                    &bank.scale,
                    beats_per_second,
                    self.pitch,
                    self.volume,
                );
                for event in synth_note.resolve(&bank.instruments[track][row]) {
                    trace!(
                        "sound {} step {}: {:?} at track {} row {} column {}",
                        self.id,
                        step,
                        event.waveform,
                        track,
                        row,
                        column
                    );
                    synth.play(&event);
                }
            }
        }
    }
}

/// The sound pool. Owns up to `MAX_SOUNDS` playing sounds and the default
/// instrument bank, and turns host frames into note triggers.
///
/// A `Sequencer` is single threaded: the host owns it and calls `poll` once
/// per frame from the thread that drives its frame loop.
///
/// ```rust,ignore
/// let score = Score::from_file("song.seqt")?;
/// let mut sequencer = Sequencer::default();
/// let id = sequencer.play(&score, -1)?;
/// loop {
///     sequencer.poll(&mut backend);
///     // present the frame
/// }
/// ```
#[derive(Debug)]
pub struct Sequencer<'a> {
    config: Config,
    default_bank: InstrumentBank,
    sounds: [Option<Sound<'a>>; MAX_SOUNDS],
    generation: u64,
}

impl<'a> Default for Sequencer<'a> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<'a> Sequencer<'a> {
    /// Create an empty pool and build its default instrument bank.
    pub fn new(mut config: Config) -> Self {
        if !valid_fps(config.target_fps) {
            warn!(
                "invalid target fps {}, using {}",
                config.target_fps, DEFAULT_TARGET_FPS
            );
            config.target_fps = DEFAULT_TARGET_FPS;
        }

        Sequencer {
            config,
            default_bank: InstrumentBank::with_scale_root(config.scale_root),
            sounds: [None; MAX_SOUNDS],
            generation: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_bank(&self) -> &InstrumentBank {
        &self.default_bank
    }

    /// Change the host frame rate. Frame positions of playing sounds are kept
    /// as they are.
    pub fn set_target_fps(&mut self, target_fps: f64) -> Result<(), SoundError> {
        if !valid_fps(target_fps) {
            warn!("rejected target fps {}", target_fps);
            return Err(SoundError::InvalidValue("target fps"));
        }
        self.config.target_fps = target_fps;

        Ok(())
    }

    /// Advance every playing sound by one frame. Must be called once per host
    /// frame; triggered notes reach `synth` in slot, track and row order.
    pub fn poll<S>(&mut self, synth: &mut S)
    where
        S: Synthesizer + ?Sized,
    {
        let fps = self.config.target_fps;
        let default_bank = &self.default_bank;

        for slot in self.sounds.iter_mut() {
            let finished = match slot {
                Some(sound) => !sound.advance(default_bank, fps, synth),
                None => false,
            };
            if finished {
                if let Some(sound) = slot.take() {
                    debug!("sound {} finished at frame {}", sound.id, sound.frame);
                }
            }
        }
    }

    /// Play `score` with the default instrument bank, `loops` times over.
    /// A negative `loops` plays forever.
    pub fn play(&mut self, score: &'a Score, loops: i32) -> Result<SoundId, SoundError> {
        self.spawn(score, None, loops)
    }

    /// Play `score` with a custom instrument bank.
    pub fn play_with_bank(
        &mut self,
        score: &'a Score,
        bank: &'a InstrumentBank,
        loops: i32,
    ) -> Result<SoundId, SoundError> {
        self.spawn(score, Some(bank), loops)
    }

    fn spawn(
        &mut self,
        score: &'a Score,
        bank: Option<&'a InstrumentBank>,
        loops: i32,
    ) -> Result<SoundId, SoundError> {
        let index = match self.sounds.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                warn!("failed to play sound: too many sounds");
                return Err(SoundError::TooManySounds);
            }
        };

        let stop_frame = if loops < 0 {
            u64::max_value()
        } else {
            score.loop_frames(loops as u32, self.config.target_fps)
        };

        let id = SoundId::new(self.generation, index);
        self.generation = self.generation.wrapping_add(1);
        self.sounds[index] = Some(Sound::new(id, score, bank, stop_frame));

        debug!(
            "sound {} playing {:?} in slot {} until frame {}",
            id, score, index, stop_frame
        );

        Ok(id)
    }

    /// Look up a playing sound. Finished, stopped and never issued handles
    /// give `None`.
    pub fn sound(&self, id: SoundId) -> Option<&Sound<'a>> {
        self.sounds[id.index()?].as_ref().filter(|sound| sound.id == id)
    }

    fn sound_mut(&mut self, id: SoundId) -> Result<&mut Sound<'a>, SoundError> {
        let index = id.index().ok_or(SoundError::NotFound(id))?;
        match self.sounds[index].as_mut() {
            Some(sound) if sound.id == id => Ok(sound),
            _ => Err(SoundError::NotFound(id)),
        }
    }

    pub fn is_playing(&self, id: SoundId) -> bool {
        self.sound(id).is_some()
    }

    /// Live sounds in slot order.
    pub fn sounds(&self) -> impl Iterator<Item = &Sound<'a>> {
        self.sounds.iter().filter_map(Option::as_ref)
    }

    pub fn active_count(&self) -> usize {
        self.sounds().count()
    }

    /// Stop a sound after `secs` seconds. Zero or negative stops it on the
    /// next poll.
    pub fn stop(&mut self, id: SoundId, secs: f64) -> Result<(), SoundError> {
        let frames = secs_to_frames(secs, self.config.target_fps);
        let sound = self.sound_mut(id)?;
        sound.stop_frame = sound.frame.saturating_add(frames);
        debug!("sound {} stops at frame {}", id, sound.stop_frame);

        Ok(())
    }

    /// Release every sound immediately.
    pub fn stop_all(&mut self) {
        for slot in self.sounds.iter_mut() {
            *slot = None;
        }
    }

    /// Move a sound to `secs` seconds from its start. The step due at the new
    /// position fires on the next poll.
    pub fn seek(&mut self, id: SoundId, secs: f64) -> Result<(), SoundError> {
        let frame = secs_to_frames(secs, self.config.target_fps);
        let sound = self.sound_mut(id)?;
        sound.frame = frame;
        sound.last_step = None;
        debug!("sound {} seeked to frame {}", id, frame);

        Ok(())
    }

    pub fn set_paused(&mut self, id: SoundId, paused: bool) -> Result<(), SoundError> {
        self.sound_mut(id)?.paused = paused;

        Ok(())
    }

    /// Set the playback rate. Must be finite and non-negative; zero holds the
    /// current step.
    pub fn set_speed(&mut self, id: SoundId, speed: f64) -> Result<(), SoundError> {
        let sound = self.sound_mut(id)?;
        if !(speed.is_finite() && speed >= 0.0) {
            warn!("rejected speed {} for sound {}", speed, id);
            return Err(SoundError::InvalidValue("speed"));
        }
        sound.speed = speed;

        Ok(())
    }

    /// Set the pitch multiplier. Must be finite and positive; it also shortens
    /// note envelopes by the same factor.
    pub fn set_pitch(&mut self, id: SoundId, pitch: f32) -> Result<(), SoundError> {
        let sound = self.sound_mut(id)?;
        if !(pitch.is_finite() && pitch > 0.0) {
            warn!("rejected pitch {} for sound {}", pitch, id);
            return Err(SoundError::InvalidValue("pitch"));
        }
        sound.pitch = pitch;

        Ok(())
    }

    /// Set the volume multiplier. Must be finite and non-negative; values
    /// above 1 play louder.
    pub fn set_volume(&mut self, id: SoundId, volume: f32) -> Result<(), SoundError> {
        let sound = self.sound_mut(id)?;
        if !(volume.is_finite() && volume >= 0.0) {
            warn!("rejected volume {} for sound {}", volume, id);
            return Err(SoundError::InvalidValue("volume"));
        }
        sound.volume = volume;

        Ok(())
    }

    /// Silence or restore one track of a sound.
    pub fn set_track_muted(
        &mut self,
        id: SoundId,
        track: usize,
        muted: bool,
    ) -> Result<(), SoundError> {
        let sound = self.sound_mut(id)?;
        let slot = sound
            .muted_tracks
            .get_mut(track)
            .ok_or(SoundError::InvalidTrack(track))?;
        *slot = muted;

        Ok(())
    }
}

/// Whole frames in `secs` seconds; negative and NaN durations are zero.
fn secs_to_frames(secs: f64, fps: f64) -> u64 {
    (libm::fmax(secs, 0.0) * fps) as u64
}
