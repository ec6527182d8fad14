//! `devices`: list microphones.

use anyhow::Result;
use carevoice_voice::local::CpalInputHost;

use crate::error::CliError;

pub fn execute() -> Result<()> {
    let devices = CpalInputHost::list_devices().map_err(|e| CliError::Audio(e.to_string()))?;
    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{marker} {}", device.name);
    }
    Ok(())
}
