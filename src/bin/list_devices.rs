use anyhow::{Context, Result};
use dns_voice_agent::audio::{list_devices, SAMPLE_RATE};

fn main() -> Result<()> {
    env_logger::init();

    let devices = list_devices().context("Failed to enumerate input devices")?;
    if devices.is_empty() {
        println!("No input devices found");
        return Ok(());
    }

    println!("🎤 Input devices:");
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        let resample = if device.default_sample_rate == SAMPLE_RATE {
            ""
        } else {
            ", resampled"
        };
        println!(
            "  {}{} - {} ch @ {} Hz{}",
            device.name, marker, device.channel_count, device.default_sample_rate, resample
        );
    }
    Ok(())
}
