//! Patch listing command.

use clap::Args;
use tonewheel_synth::Patch;

#[derive(Args)]
pub struct PatchesArgs {}

pub fn run(_args: PatchesArgs) -> anyhow::Result<()> {
    println!("Available Patches");
    println!("=================\n");
    for patch in Patch::ALL {
        println!("  {:<6} {}", patch.name(), patch.description());
    }
    Ok(())
}
