//! Session listing command.

use clap::Args;
use tonewheel_config::{factory_sessions, resolve_session};

#[derive(Args)]
pub struct SessionsArgs {
    /// Session name or path to show in full (lists factory sessions if omitted)
    name: Option<String>,
}

pub fn run(args: SessionsArgs) -> anyhow::Result<()> {
    match args.name {
        Some(name) => {
            let session = resolve_session(&name)?;
            print!("{}", session.to_toml()?);
        }
        None => {
            println!("Factory Sessions");
            println!("================\n");
            for session in factory_sessions() {
                println!(
                    "  {:<8} {}",
                    session.name,
                    session.description.as_deref().unwrap_or("")
                );
                println!("           tracks: {}", session.patch_names().join(", "));
            }
            println!();
            println!("Show one with: tonewheel sessions <NAME>");
        }
    }
    Ok(())
}
