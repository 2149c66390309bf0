//! Audio device listing command.

use clap::Args;
use tonewheel_io::{default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let outputs = list_devices()?;

    if outputs.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    let default_name = default_device()?.map(|d| d.name);

    println!("Output Devices");
    println!("==============\n");
    for (idx, device) in outputs.iter().enumerate() {
        let marker = if default_name.as_deref() == Some(device.name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, marker
        );
    }
    println!();
    println!("Tip: Use device index or partial name with --output:");
    println!("  tonewheel play --output 0");
    Ok(())
}
