use seqt::consts::*;
use seqt::{Config, LoadError, Score, Sequencer, SoundError, Waveform, WaveformEvent};
use std::io::Write;

const HEADER_LENGTH: usize = 24;

/// `(track, row, column, periods, volume, slide)`
type Cell = (usize, usize, usize, i8, i8, i8);

/// Encode a score file with the given notes.
fn score_file(bpm: i16, track_sizes: [u32; 4], notes: &[Cell]) -> Vec<u8> {
    let cells = NOTES_TRACKS * NOTES_ROWS * NOTES_TOTAL_COLUMNS;
    let mut data = vec![0_u8; HEADER_LENGTH + cells * 3];

    data[..4].copy_from_slice(b"SEQT");
    data[4] = 1;
    data[6..8].copy_from_slice(&bpm.to_le_bytes());
    for (track, size) in track_sizes.iter().enumerate() {
        let i = 8 + track * 4;
        data[i..i + 4].copy_from_slice(&size.to_le_bytes());
    }

    for &(track, row, column, periods, volume, slide) in notes {
        let cell = (track * NOTES_ROWS + row) * NOTES_TOTAL_COLUMNS + column;
        let i = HEADER_LENGTH + cell * 3;
        data[i] = periods as u8;
        data[i + 1] = volume as u8;
        data[i + 2] = slide as u8;
    }

    data
}

fn poll_events(sequencer: &mut Sequencer, frames: usize) -> Vec<WaveformEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        sequencer.poll(&mut |event: &WaveformEvent| events.push(*event));
    }
    events
}

#[test]
fn load_from_file_and_play() {
    let data = score_file(120, [16, 16, 16, 16], &[(0, 0, 0, 4, 0, 0)]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();

    let score = Score::from_file(file.path()).unwrap();
    assert_eq!(score.bpm(), 120);
    assert_eq!(score.length(), 2.0);

    let mut sequencer = Sequencer::default();
    let id = sequencer.play(&score, -1).unwrap();
    let events = poll_events(&mut sequencer, 1);

    // Step 0 of the scenario: 120 BPM, 4 beats, 60 fps → 8 steps per second
    let strings = sequencer.default_bank().instrument(0, 0).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].waveform, Waveform::Triangle);
    assert_eq!(events[0].amplitude, strings.waves[0].amplitude);
    assert_eq!(events[0].start_frequency, sequencer.default_bank().scale()[SCALE_CENTER]);
    assert_eq!(sequencer.sound(id).unwrap().last_step(), Some(0));
}

#[test]
fn missing_files_are_unreadable() {
    let dir = tempfile::tempdir().unwrap();

    match Score::from_file(dir.path().join("missing.seqt")) {
        Err(LoadError::Unreadable(_)) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn malformed_files_are_rejected() {
    let mut data = score_file(120, [16; 4], &[]);
    data[..4].copy_from_slice(b"RIFF");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();

    match Score::from_file(file.path()) {
        Err(LoadError::Magic) => (),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn full_pool_rejects_new_sounds() {
    let score = Score::from_slice(&score_file(120, [16; 4], &[(3, 0, 0, 1, 0, 0)])).unwrap();
    let mut sequencer = Sequencer::default();

    let ids: Vec<_> = (0..MAX_SOUNDS)
        .map(|_| sequencer.play(&score, -1).unwrap())
        .collect();
    sequencer.set_volume(ids[3], 0.25).unwrap();

    assert_eq!(sequencer.play(&score, -1), Err(SoundError::TooManySounds));
    assert_eq!(sequencer.active_count(), MAX_SOUNDS);
    assert!(ids.iter().all(|&id| sequencer.is_playing(id)));
    assert_eq!(sequencer.sound(ids[3]).unwrap().volume(), 0.25);

    // Every sound triggers its high kick, two layers each
    assert_eq!(poll_events(&mut sequencer, 1).len(), MAX_SOUNDS * 2);
}

#[test]
fn trigger_batches_follow_distinct_steps() {
    let notes: Vec<Cell> = (0..16).map(|column| (0, 0, column, 1, 0, 0)).collect();
    let score = Score::from_slice(&score_file(120, [16; 4], &notes)).unwrap();
    let mut sequencer = Sequencer::default();
    let id = sequencer.play(&score, -1).unwrap();

    let mut batches = 0;
    let mut steps = Vec::new();
    for _ in 0..100 {
        if !poll_events(&mut sequencer, 1).is_empty() {
            batches += 1;
        }
        let step = sequencer.sound(id).unwrap().last_step().unwrap();
        if steps.last() != Some(&step) {
            steps.push(step);
        }
    }

    // floor(100 × 8 / 60) = 13
    assert_eq!(steps.len(), 14);
    assert_eq!(batches, steps.len());
}

#[test]
fn doubled_speed_halves_the_frames_between_steps() {
    let score = Score::from_slice(&score_file(120, [16; 4], &[])).unwrap();
    let mut sequencer = Sequencer::new(Config::default().with_target_fps(64.0));
    let normal = sequencer.play(&score, -1).unwrap();
    let fast = sequencer.play(&score, -1).unwrap();
    sequencer.set_speed(fast, 2.0).unwrap();

    let mut normal_changes = Vec::new();
    let mut fast_changes = Vec::new();
    let mut last = (None, None);
    for frame in 1..=64_u64 {
        poll_events(&mut sequencer, 1);
        let current = (
            sequencer.sound(normal).unwrap().last_step(),
            sequencer.sound(fast).unwrap().last_step(),
        );
        if current.0 != last.0 {
            normal_changes.push(frame);
        }
        if current.1 != last.1 {
            fast_changes.push(frame);
        }
        last = current;
    }

    // 8 steps per second at 64 fps: every 8 frames, or every 4 at double speed
    assert!(normal_changes[1..].windows(2).all(|w| w[1] - w[0] == 8));
    assert!(fast_changes[1..].windows(2).all(|w| w[1] - w[0] == 4));
}

#[test]
fn finished_sounds_free_their_slot() {
    let score = Score::from_slice(&score_file(240, [16; 4], &[])).unwrap();
    let mut sequencer = Sequencer::default();

    // One loop of 16 columns at 16 steps per second is 60 frames
    let once = sequencer.play(&score, 1).unwrap();
    poll_events(&mut sequencer, 59);
    assert!(sequencer.is_playing(once));
    poll_events(&mut sequencer, 1);
    assert!(!sequencer.is_playing(once));

    let next = sequencer.play(&score, 1).unwrap();
    assert_ne!(once, next);
    assert_eq!(sequencer.seek(once, 0.0), Err(SoundError::NotFound(once)));
}

#[test]
fn tracks_loop_at_their_own_length() {
    // Track 0 loops every 16 columns, track 1 every 20
    let score = Score::from_slice(&score_file(
        120,
        [0, 20, 16, 16],
        &[(0, 0, 0, 1, 0, 0), (1, 0, 0, 1, 0, 0)],
    ))
    .unwrap();
    let mut sequencer = Sequencer::new(Config::default().with_target_fps(8.0));
    sequencer.play(&score, -1).unwrap();

    // At 8 fps every frame is one step; frame n plays step n
    let mut strings = Vec::new();
    let mut leads = Vec::new();
    for frame in 1..=40_u64 {
        for event in poll_events(&mut sequencer, 1) {
            match event.waveform {
                Waveform::Organ => strings.push(frame),
                Waveform::Pulse => leads.push(frame),
                _ => (),
            }
        }
    }

    assert_eq!(strings, vec![16, 32]);
    assert_eq!(leads, vec![20, 40]);
}
