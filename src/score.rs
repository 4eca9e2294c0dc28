use byteorder::{ByteOrder, LittleEndian};
use core::fmt;

#[cfg(feature = "std")]
use log::error;
#[cfg(feature = "std")]
use std::path::Path;

use crate::consts::*;

/// Possible errors while loading a `Score`.
#[derive(Debug)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum LoadError {
    #[cfg(feature = "std")]
    #[error("Unreadable score source")]
    Unreadable(#[source] std::io::Error),

    #[cfg_attr(feature = "std", error("Incorrect file length"))]
    FileLength,

    #[cfg_attr(feature = "std", error("Malformed score source: bad magic"))]
    Magic,

    #[cfg_attr(feature = "std", error("Invalid tempo: {0} BPM"))]
    Tempo(i16),

    #[cfg_attr(
        feature = "std",
        error("Track {track} loop length {size} exceeds the grid")
    )]
    TrackSize { track: usize, size: u32 },
}

/// A single cell in the note grid. A cell with zero `periods` is a rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Note {
    /// Note length in periods (steps).
    pub periods: i8,
    /// Logarithmic velocity, each unit is a third of a doubling.
    pub volume: i8,
    /// Semitone offset on the scale to glide from.
    pub slide: i8,
}

impl Note {
    pub const REST: Note = Note {
        periods: 0,
        volume: 0,
        slide: 0,
    };
}

type Pages = [[[Note; NOTES_TOTAL_COLUMNS]; NOTES_ROWS]; NOTES_TRACKS];

/// A `Score` holds the tempo, the loop length of each track and the full note
/// grid addressed by `[track][row][column]`. It is immutable once loaded.
#[derive(Clone)]
pub struct Score {
    pub(crate) version: u8,
    pub(crate) flags: u8,
    pub(crate) bpm: i16,
    pub(crate) track_sizes: [u32; NOTES_TRACKS],
    pub(crate) pages: Pages,
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Score")
            .field("version", &self.version)
            .field("flags", &self.flags)
            .field("bpm", &self.bpm)
            .field("track_sizes", &self.track_sizes)
            .finish()
    }
}

impl Score {
    /// Create a new `Score` from a byte slice. Bytes past the note grid are
    /// ignored.
    ///
    /// ```rust,ignore
    /// Score::from_slice(include_bytes!("/some/file.seqt"))
    /// ```
    pub fn from_slice(slice: &[u8]) -> Result<Score, LoadError> {
        if slice.len() < SCORE_LENGTH {
            return Err(LoadError::FileLength);
        }
        if slice[..4] != MAGIC[..] {
            return Err(LoadError::Magic);
        }

        let version = slice[4];
        let flags = slice[5];

        let bpm = LittleEndian::read_i16(&slice[6..8]);
        if bpm <= 0 {
            return Err(LoadError::Tempo(bpm));
        }

        let mut track_sizes = [0; NOTES_TRACKS];
        for (track, size) in track_sizes.iter_mut().enumerate() {
            let i = 8 + track * 4;
            *size = LittleEndian::read_u32(&slice[i..i + 4]);
            if *size as usize > NOTES_TOTAL_COLUMNS {
                return Err(LoadError::TrackSize {
                    track,
                    size: *size,
                });
            }
        }

        // Cells are stored row-major in the same [track][row][column] order
        let mut pages = [[[Note::REST; NOTES_TOTAL_COLUMNS]; NOTES_ROWS]; NOTES_TRACKS];
        let cells = slice[HEADER_LENGTH..SCORE_LENGTH].chunks_exact(NOTE_LENGTH);
        let notes = pages
            .iter_mut()
            .flat_map(|rows| rows.iter_mut())
            .flat_map(|columns| columns.iter_mut());
        for (note, cell) in notes.zip(cells) {
            *note = Note {
                periods: cell[0] as i8,
                volume: cell[1] as i8,
                slide: cell[2] as i8,
            };
        }

        Ok(Score {
            version,
            flags,
            bpm,
            track_sizes,
            pages,
        })
    }

    /// Load a `Score` from a file on disk. (Requires `std` feature.)
    #[cfg(feature = "std")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Score, LoadError> {
        let path = path.as_ref();

        let data = std::fs::read(path).map_err(|e| {
            error!("failed to open seqt source '{}': {}", path.display(), e);
            LoadError::Unreadable(e)
        })?;

        Score::from_slice(&data).map_err(|e| {
            error!("malformed seqt source '{}': {}", path.display(), e);
            e
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Tempo in beats per minute. Always positive.
    pub fn bpm(&self) -> i16 {
        self.bpm
    }

    /// Authored loop length of `track` in columns, or `None` for an unknown
    /// track.
    pub fn track_size(&self, track: usize) -> Option<u32> {
        self.track_sizes.get(track).copied()
    }

    /// Number of columns `track` actually loops over. Short loops are
    /// stretched to one page.
    pub fn track_columns(&self, track: usize) -> usize {
        let size = self.track_sizes.get(track).copied().unwrap_or(0);
        (size as usize).max(NOTES_COLUMNS)
    }

    /// Steps per second, `bpm × TIME_SIG / 60`.
    pub fn beats_per_second(&self) -> f64 {
        f64::from(self.bpm) * TIME_SIG as f64 / 60.0
    }

    /// Columns in one loop of the longest track, as authored.
    pub fn loop_columns(&self) -> u32 {
        self.track_sizes.iter().copied().max().unwrap_or(0)
    }

    /// Length of one loop of the longest track, in seconds.
    pub fn length(&self) -> f64 {
        f64::from(self.loop_columns()) / self.beats_per_second()
    }

    /// Frames covering `loops` loops at `fps`. Exact whenever the result is
    /// a whole number of frames.
    pub fn loop_frames(&self, loops: u32, fps: f64) -> u64 {
        let steps = f64::from(loops) * f64::from(self.loop_columns());
        let beats_per_minute = f64::from(self.bpm) * TIME_SIG as f64;

        (steps * fps * 60.0 / beats_per_minute) as u64
    }

    /// Get the note cell at the given grid coordinate.
    pub fn note(&self, track: usize, row: usize, column: usize) -> Option<Note> {
        self.pages.get(track)?.get(row)?.get(column).copied()
    }
}

/// Byte-level score builder for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) struct ScoreBytes(Vec<u8>);

    impl ScoreBytes {
        pub(crate) fn new(bpm: i16, track_sizes: [u32; NOTES_TRACKS]) -> Self {
            let mut data = vec![0; SCORE_LENGTH];
            data[..4].copy_from_slice(MAGIC);
            data[4] = 1;
            LittleEndian::write_i16(&mut data[6..8], bpm);
            for (track, &size) in track_sizes.iter().enumerate() {
                let i = 8 + track * 4;
                LittleEndian::write_u32(&mut data[i..i + 4], size);
            }

            ScoreBytes(data)
        }

        pub(crate) fn note(
            mut self,
            track: usize,
            row: usize,
            column: usize,
            periods: i8,
            volume: i8,
            slide: i8,
        ) -> Self {
            let cell = (track * NOTES_ROWS + row) * NOTES_TOTAL_COLUMNS + column;
            let i = HEADER_LENGTH + cell * NOTE_LENGTH;
            self.0[i] = periods as u8;
            self.0[i + 1] = volume as u8;
            self.0[i + 2] = slide as u8;
            self
        }

        pub(crate) fn bytes(&self) -> &[u8] {
            &self.0
        }

        pub(crate) fn score(&self) -> Score {
            Score::from_slice(&self.0).unwrap()
        }
    }
}
