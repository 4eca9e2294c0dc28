/// Beats per bar; steps advance this many times per quarter note tempo beat.
pub const TIME_SIG: usize = 4;
/// Waveform layers per instrument.
pub const SYNTH_WAVES: usize = 2;

pub const NOTES_TRACKS: usize = 4;
pub const NOTES_PAGES: usize = 7;
pub const NOTES_COLUMNS: usize = 16;
pub const NOTES_ROWS: usize = 10;
pub const NOTES_SCALE_NOTES: usize = 2 * NOTES_ROWS;
pub const NOTES_TOTAL_COLUMNS: usize = NOTES_PAGES * NOTES_COLUMNS;

/// Offset from a row to its pitch in the scale.
pub const SCALE_CENTER: usize = NOTES_ROWS / 2;

/// Maximum number of sounds playing at once.
pub const MAX_SOUNDS: usize = 32;

pub(crate) const MAGIC: &[u8; 4] = b"SEQT";
pub(crate) const HEADER_LENGTH: usize = 24;
pub(crate) const NOTE_LENGTH: usize = 3;
pub(crate) const SCORE_LENGTH: usize =
    HEADER_LENGTH + NOTES_TRACKS * NOTES_ROWS * NOTES_TOTAL_COLUMNS * NOTE_LENGTH;

/// Nominal layer frequencies at or below this are ratios of the note pitch.
pub(crate) const RATIO_THRESHOLD: f32 = 8.0;
