//! Notification sound on product arrival.
//!
//! [`Notifier`] pairs a [`SoundPlayer`] with the user's [`SoundPreference`].
//! Playback failures are logged at debug level and never surfaced.

use std::io::Write;

use tracing::debug;

use kiosk_core::constants::NOTIFICATION_VOLUME;

use crate::error::{Result, SoundError};

/// Something that can play the notification sound once.
pub trait SoundPlayer: Send {
    /// Start playing at `volume` (0.0 - 1.0). Must not block for the length
    /// of the sound.
    fn play(&mut self, volume: f32) -> Result<()>;
}

/// User-toggleable sound setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundPreference {
    enabled: bool,
    volume: f32,
}

impl SoundPreference {
    /// Create a preference; `volume` must be within 0.0..=1.0.
    pub fn new(enabled: bool, volume: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(SoundError::InvalidVolume(volume));
        }
        Ok(Self { enabled, volume })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Flip the setting and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}

impl Default for SoundPreference {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: NOTIFICATION_VOLUME,
        }
    }
}

/// Rings the terminal bell. Volume is not adjustable.
#[derive(Debug)]
pub struct BellPlayer<W> {
    out: W,
}

impl BellPlayer<std::io::Stdout> {
    /// Bell on standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> BellPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> SoundPlayer for BellPlayer<W> {
    fn play(&mut self, _volume: f32) -> Result<()> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Plays a WAV file through the default audio output.
#[cfg(feature = "audio")]
#[derive(Debug, Clone)]
pub struct WavPlayer {
    path: std::path::PathBuf,
}

#[cfg(feature = "audio")]
impl WavPlayer {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn play_blocking(path: &std::path::Path, volume: f32) -> Result<()> {
        let file = std::fs::File::open(path)?;
        let mut stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| SoundError::device_unavailable(e.to_string()))?;
        stream.log_on_drop(false);

        let source = rodio::Decoder::new(std::io::BufReader::new(file))
            .map_err(|e| SoundError::decode(e.to_string()))?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.set_volume(volume);
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[cfg(feature = "audio")]
impl SoundPlayer for WavPlayer {
    fn play(&mut self, volume: f32) -> Result<()> {
        if !self.path.is_file() {
            return Err(SoundError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("sound file not found: {}", self.path.display()),
            )));
        }

        let path = self.path.clone();
        std::thread::Builder::new()
            .name("kiosk-sound".to_string())
            .spawn(move || {
                if let Err(e) = Self::play_blocking(&path, volume) {
                    debug!("Could not play notification sound: {}", e);
                }
            })?;
        Ok(())
    }
}

/// Plays the notification when enabled, swallowing failures.
pub struct Notifier {
    player: Box<dyn SoundPlayer>,
    preference: SoundPreference,
}

impl Notifier {
    pub fn new(player: Box<dyn SoundPlayer>, preference: SoundPreference) -> Self {
        Self { player, preference }
    }

    pub fn preference(&self) -> SoundPreference {
        self.preference
    }

    pub fn is_enabled(&self) -> bool {
        self.preference.is_enabled()
    }

    /// Flip the sound setting and return the new value.
    pub fn toggle(&mut self) -> bool {
        let enabled = self.preference.toggle();
        debug!(enabled, "sound toggled");
        enabled
    }

    /// Play once if enabled. Returns `true` if playback started.
    pub fn notify(&mut self) -> bool {
        if !self.preference.is_enabled() {
            return false;
        }
        match self.player.play(self.preference.volume()) {
            Ok(()) => true,
            Err(e) => {
                debug!("Could not play notification sound: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("preference", &self.preference)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        volumes: Arc<Mutex<Vec<f32>>>,
        fail: bool,
    }

    impl SoundPlayer for Recorder {
        fn play(&mut self, volume: f32) -> Result<()> {
            if self.fail {
                return Err(SoundError::device_unavailable("no output"));
            }
            self.volumes.lock().unwrap().push(volume);
            Ok(())
        }
    }

    #[test]
    fn test_bell_writes_bel() {
        let mut bell = BellPlayer::new(Vec::new());
        bell.play(0.5).unwrap();
        bell.play(0.5).unwrap();
        assert_eq!(bell.into_inner(), b"\x07\x07");
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(-0.1, false)]
    #[case(1.5, false)]
    #[case(f32::NAN, false)]
    fn test_preference_volume_range(#[case] volume: f32, #[case] valid: bool) {
        assert_eq!(SoundPreference::new(true, volume).is_ok(), valid);
    }

    #[test]
    fn test_default_preference() {
        let preference = SoundPreference::default();
        assert!(preference.is_enabled());
        assert_eq!(preference.volume(), 0.5);
    }

    #[test]
    fn test_notify_respects_toggle() {
        let recorder = Recorder::default();
        let mut notifier = Notifier::new(Box::new(recorder.clone()), SoundPreference::default());

        assert!(notifier.notify());
        assert!(!notifier.toggle());
        assert!(!notifier.notify());
        assert!(notifier.toggle());
        assert!(notifier.notify());

        assert_eq!(*recorder.volumes.lock().unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_notify_swallows_failures() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut notifier = Notifier::new(Box::new(recorder), SoundPreference::default());
        assert!(!notifier.notify());
        assert!(notifier.is_enabled());
    }
}
