//! Offline render command.

use crate::device::Performance;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tonewheel_config::resolve_session;
use tonewheel_io::{WavRecorder, WavSpec};

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUT")]
    output: PathBuf,

    /// Session name or path to a session TOML file
    #[arg(short, long, default_value = "demo")]
    session: String,

    /// Length of the render in seconds
    #[arg(long, default_value = "10.0")]
    seconds: f64,

    /// Advance the transpose every N milliseconds
    #[arg(long, value_name = "MS")]
    transpose_every: Option<u32>,

    /// Override the session sample rate
    #[arg(long)]
    sample_rate: Option<u32>,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        anyhow::bail!("--seconds must be a non-negative number");
    }

    let session = resolve_session(&args.session)?;
    let mut perf = Performance::from_session(&session, args.sample_rate)?
        .with_transpose_every(args.transpose_every);

    let sample_rate = perf.sample_rate();
    let total_frames = (args.seconds * f64::from(sample_rate)).round() as u64;

    println!("Session: {}", session.name);
    println!("Rendering {:.2}s at {} Hz...", args.seconds, sample_rate);

    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut recorder = WavRecorder::create(&args.output, WavSpec::stereo(sample_rate))?;
    let mut remaining = total_frames;
    while remaining > 0 {
        let frames = (perf.frames_per_half() as u64).min(remaining);
        perf.render_half(|half| recorder.write_samples(&half[..frames as usize * 2]))?;
        remaining -= frames;
        pb.inc(frames);
    }
    pb.finish_and_clear();

    let written = recorder.frames_written();
    recorder.finalize()?;

    if perf.rejected_notes() > 0 {
        tracing::warn!(
            count = perf.rejected_notes(),
            "notes out of range after transpose were skipped"
        );
    }
    println!("Wrote {} frames to {}", written, args.output.display());
    Ok(())
}
