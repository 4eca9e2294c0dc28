/// Frame rate assumed when the host does not pick one.
pub const DEFAULT_TARGET_FPS: f64 = 60.0;
/// Semitone index (from C0) of the default scale root, E♭2.
pub const DEFAULT_SCALE_ROOT: i32 = 39;

/// Settings a `Sequencer` is created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Host frames per second. Converts seconds to frames for `play`, `stop`
    /// and `seek`, and frames to steps in `poll`.
    pub target_fps: f64,
    /// Root of the default instrument bank's scale.
    pub scale_root: i32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            target_fps: DEFAULT_TARGET_FPS,
            scale_root: DEFAULT_SCALE_ROOT,
        }
    }
}

impl Config {
    pub fn with_target_fps(mut self, target_fps: f64) -> Config {
        self.target_fps = target_fps;
        self
    }

    pub fn with_scale_root(mut self, scale_root: i32) -> Config {
        self.scale_root = scale_root;
        self
    }
}

/// A usable frame rate is finite and positive.
pub(crate) fn valid_fps(fps: f64) -> bool {
    fps.is_finite() && fps > 0.0
}
