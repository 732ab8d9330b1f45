//! Tick to frame conversion settings.

use std::convert::TryFrom;

/// Frames per second of the target animation.
pub const FPS: u32 = 30;

/// Ticks per quarter note assumed for every input file.
///
/// The division declared in the file header is not consulted.
pub const PPQN: u32 = 96;

/// Invalid [`FrameClock`] parameters.
///
/// [`FrameClock`]: struct.FrameClock.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("frames per second must be positive")]
    ZeroFps,
    #[error("ticks per quarter note must be positive")]
    ZeroPpqn,
}

/// Scale between the tick domain and the frame domain.
///
/// `frames = floor(ticks * fps / (ppqn * 60))`, computed on integers so results never depend on
/// float rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
    ppqn: u32,
}

impl FrameClock {
    pub fn new(fps: u32, ppqn: u32) -> Result<Self, ConfigError> {
        if fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if ppqn == 0 {
            return Err(ConfigError::ZeroPpqn);
        }
        Ok(FrameClock { fps, ppqn })
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn ppqn(&self) -> u32 {
        self.ppqn
    }

    /// Converts a tick count (absolute or a span) into whole frames, truncating.
    pub fn frames(&self, ticks: u64) -> u64 {
        let scaled = u128::from(ticks) * u128::from(self.fps);
        let frames = scaled / (u128::from(self.ppqn) * 60);
        u64::try_from(frames).unwrap_or(u64::MAX)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        FrameClock {
            fps: FPS,
            ppqn: PPQN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FrameClock};

    #[test]
    fn test_default_clock() {
        let clock = FrameClock::default();
        assert_eq!(clock.fps(), 30);
        assert_eq!(clock.ppqn(), 96);
    }

    #[test]
    fn test_frames_truncate() {
        let clock = FrameClock::default();
        // 5760 ticks per frame at 30 fps / 96 ppqn
        assert_eq!(clock.frames(0), 0);
        assert_eq!(clock.frames(96), 0);
        assert_eq!(clock.frames(191), 0);
        assert_eq!(clock.frames(192), 1);
        assert_eq!(clock.frames(383), 1);
        assert_eq!(clock.frames(384), 2);
        assert_eq!(clock.frames(u64::MAX), u64::MAX / 192);
    }

    #[test]
    fn test_custom_clock() {
        let clock = FrameClock::new(60, 480).unwrap();
        assert_eq!(clock.frames(480), 1);
        assert_eq!(clock.frames(959), 1);
        assert_eq!(clock.frames(960), 2);
    }

    #[test]
    fn test_rejects_zero() {
        assert_eq!(FrameClock::new(0, 96), Err(ConfigError::ZeroFps));
        assert_eq!(FrameClock::new(30, 0), Err(ConfigError::ZeroPpqn));
    }
}
