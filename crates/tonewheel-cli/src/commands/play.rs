//! Real-time playback command.
//!
//! The cpal callback is the device: it plays the shared buffer and, each
//! time a half runs out, services the synth in place. Transpose requests
//! come from stdin through a bounded channel and are applied between halves.

use crate::device::{Control, DeadlineMonitor, Performance};
use clap::Args;
use std::io::BufRead;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{TrySendError, sync_channel};
use std::time::Duration;
use tonewheel_config::resolve_session;
use tonewheel_io::{AudioStream, StreamConfig};

#[derive(Args)]
pub struct PlayArgs {
    /// Session name or path to a session TOML file
    #[arg(short, long, default_value = "demo")]
    session: String,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Advance the transpose every N milliseconds
    #[arg(long, value_name = "MS")]
    transpose_every: Option<u32>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let session = resolve_session(&args.session)?;

    let mut stream = AudioStream::new(StreamConfig {
        sample_rate: Some(session.sample_rate),
        output_device: args.output,
    })?;
    let channels = stream.output_channels() as usize;

    let mut perf = Performance::from_session(&session, Some(stream.sample_rate()))?
        .with_transpose_every(args.transpose_every);
    let monitor = DeadlineMonitor::new(perf.frames_per_half(), perf.sample_rate());

    println!("Session: {}", session.name);
    if let Some(description) = &session.description {
        println!("  {description}");
    }
    println!(
        "\nPlaying at {} Hz. Press Enter to transpose, Ctrl+C to stop.\n",
        perf.sample_rate()
    );

    let running = stream.running_flag();
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let (controls_tx, controls) = sync_channel(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() {
                break;
            }
            match controls_tx.try_send(Control::Transpose) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    });

    let watch = monitor.clone();
    let watch_running = running.clone();
    let watcher = std::thread::spawn(move || {
        let mut reported = 0;
        loop {
            std::thread::sleep(Duration::from_secs(1));
            let overruns = watch.overruns();
            if overruns > reported {
                tracing::warn!(
                    overruns,
                    halves = watch.halves(),
                    budget_us = watch.budget().as_micros() as u64,
                    "render missed its deadline"
                );
                reported = overruns;
            }
            if !watch_running.load(Ordering::SeqCst) {
                break;
            }
        }
    });

    let cb_monitor = monitor.clone();
    stream.run_output(move |data: &mut [f32]| {
        perf.drain(&controls);
        perf.fill_device(data, channels, |perf, elapsed| {
            cb_monitor.record(elapsed);
            perf.drain(&controls);
        });
    })?;

    let _ = watcher.join();
    println!(
        "Done! {} halves rendered, {} over budget.",
        monitor.halves(),
        monitor.overruns()
    );
    Ok(())
}
