//! Keyboard commands read line by line from stdin.
//!
//! A stdin read blocks and cannot be cancelled, so the reader lives on its
//! own detached thread rather than on the runtime's blocking pool. Runtime
//! shutdown never waits for it.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::runtime::Command;

/// Map one input line to a command. Unknown keys map to nothing.
pub fn key_command(line: &str) -> Option<Command> {
    match line.trim() {
        "s" | "S" => Some(Command::ToggleSound),
        "q" | "Q" => Some(Command::Quit),
        "" => None,
        other => {
            debug!(key = other, "unknown key");
            None
        }
    }
}

/// Start reading `input` on a thread named `kiosk-keys`.
///
/// The thread ends after sending `Quit`, at end of input, or once the kiosk
/// stops listening.
pub fn spawn_key_reader<R>(
    input: R,
    commands: mpsc::Sender<Command>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("kiosk-keys".to_string())
        .spawn(move || read_keys(input, commands))
}

fn read_keys<R: BufRead>(input: R, commands: mpsc::Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not read keyboard input: {}", e);
                return;
            }
        };
        let Some(command) = key_command(&line) else {
            continue;
        };
        let quit = matches!(command, Command::Quit);
        if commands.blocking_send(command).is_err() || quit {
            return;
        }
    }
    debug!("stdin closed, keyboard commands disabled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};
    use std::sync::Arc;
    use std::sync::mpsc as std_mpsc;
    use std::time::{Duration, Instant};

    use kiosk_core::SystemClock;
    use kiosk_display::{BellPlayer, Notifier, Screen, SoundPreference};
    use kiosk_network::HubClientConfig;
    use kiosk_store::ProductRepository;
    use rstest::rstest;

    use crate::binding::ConnectionBinding;
    use crate::runtime::{self, Kiosk};

    /// Input whose first read blocks until the paired sender is dropped.
    struct Blocked(std_mpsc::Receiver<()>);

    impl Read for Blocked {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[rstest]
    #[case("s", Some("toggle"))]
    #[case("S\r", Some("toggle"))]
    #[case(" q ", Some("quit"))]
    #[case("Q", Some("quit"))]
    #[case("", None)]
    #[case("x", None)]
    fn test_key_command(#[case] line: &str, #[case] expected: Option<&str>) {
        let actual = match key_command(line) {
            Some(Command::ToggleSound) => Some("toggle"),
            Some(Command::Quit) => Some("quit"),
            Some(other) => panic!("unexpected command {other:?}"),
            None => None,
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_reader_stops_after_quit() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = Cursor::new("s\nx\n\nq\ns\n");

        spawn_key_reader(input, tx).unwrap().join().unwrap();

        assert!(matches!(rx.blocking_recv(), Some(Command::ToggleSound)));
        assert!(matches!(rx.blocking_recv(), Some(Command::Quit)));
        assert!(rx.blocking_recv().is_none());
    }

    #[test]
    fn test_shutdown_does_not_wait_for_pending_key_reader() {
        let (_unblock, blocked) = std_mpsc::channel::<()>();
        let (done_tx, done_rx) = std_mpsc::channel();

        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let (tx, rx) = mpsc::channel(8);
                spawn_key_reader(BufReader::new(Blocked(blocked)), tx.clone()).unwrap();

                let mut config =
                    HubClientConfig::new("ws://127.0.0.1:9/readerHub".parse().unwrap());
                config.skip_negotiation = true;
                let binding = ConnectionBinding::activate(config, tx.clone());

                let kiosk = Kiosk::new(
                    ProductRepository::new(),
                    Duration::from_secs(15),
                    Notifier::new(
                        Box::new(BellPlayer::new(std::io::sink())),
                        SoundPreference::default(),
                    ),
                    Screen::new(80),
                    Arc::new(SystemClock),
                    Instant::now(),
                );
                tx.send(Command::Quit).await.unwrap();
                runtime::run(kiosk, rx, Duration::from_secs(1), std::io::sink()).await;
                binding.deactivate().await;
            });
            drop(rt);
            done_tx.send(()).unwrap();
        });

        done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("runtime shut down while the key reader was blocked");
    }
}
