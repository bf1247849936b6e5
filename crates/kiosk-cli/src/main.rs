//! `rfid-kiosk`: terminal kiosk showing the latest RFID-detected product.
//!
//! Keys (followed by Enter): `s` toggles the notification sound, `q` quits.

mod binding;
mod config;
mod keys;
mod logging;
mod runtime;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use kiosk_core::SystemClock;
use kiosk_display::{BellPlayer, Notifier, Screen, SoundPlayer, SoundPreference};
use kiosk_store::ProductRepository;

use crate::binding::ConnectionBinding;
use crate::config::{Cli, KioskConfig};
use crate::runtime::{Command, Kiosk};

const COMMAND_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = KioskConfig::load(&cli)?;
    logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    info!(
        version = kiosk_core::VERSION,
        hub_url = %config.hub_url,
        "starting RFID kiosk"
    );

    let preference = SoundPreference::new(config.sound_enabled, config.volume)?;
    let notifier = Notifier::new(sound_player(&config), preference);
    let kiosk = Kiosk::new(
        ProductRepository::new(),
        config.inactivity_timeout,
        notifier,
        Screen::new(config.screen_width),
        Arc::new(SystemClock),
        tokio::time::Instant::now().into_std(),
    );

    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let binding = ConnectionBinding::activate(config.hub_client_config(), commands_tx.clone());
    if let Err(e) = keys::spawn_key_reader(
        std::io::BufReader::new(std::io::stdin()),
        commands_tx.clone(),
    ) {
        warn!("Could not start keyboard reader: {}", e);
    }
    tokio::spawn(quit_on_ctrl_c(commands_tx));

    runtime::run(kiosk, commands_rx, config.check_interval, std::io::stdout()).await;

    binding.deactivate().await;
    info!("RFID kiosk stopped");
    Ok(())
}

#[cfg(feature = "audio")]
fn sound_player(config: &KioskConfig) -> Box<dyn SoundPlayer> {
    if config.sound_file.is_file() {
        Box::new(kiosk_display::WavPlayer::new(config.sound_file.clone()))
    } else {
        warn!(
            path = %config.sound_file.display(),
            "sound file not found, using the terminal bell"
        );
        Box::new(BellPlayer::stdout())
    }
}

#[cfg(not(feature = "audio"))]
fn sound_player(config: &KioskConfig) -> Box<dyn SoundPlayer> {
    tracing::debug!(
        path = %config.sound_file.display(),
        "built without audio, using the terminal bell"
    );
    Box::new(BellPlayer::stdout())
}

async fn quit_on_ctrl_c(commands: mpsc::Sender<Command>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupt received, shutting down");
            let _ = commands.send(Command::Quit).await;
        }
        Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
    }
}
