//! Output device emulation.
//!
//! The synth renders into one half of a shared buffer while the device
//! plays the other. [`Performance`] plays the device role: it consumes the
//! buffer half by half, raises the finished half on the ready flag, derives
//! the millisecond tick from the sample clock, runs the sequencer and then
//! services the synth. The offline renderer and the cpal callback both drive
//! it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use tonewheel_config::Session;
use tonewheel_io::write_frames;
use tonewheel_synth::{BufferHalf, BufferReady, DoubleBuffer, Sequencer, Synth};

/// Control events applied between buffer halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Step to the next transpose offset.
    Transpose,
}

/// A synth, its sequencer and its output buffer, clocked by the device.
pub struct Performance {
    synth: Synth,
    sequencer: Sequencer,
    buffer: DoubleBuffer,
    ready: BufferReady,
    playing: BufferHalf,
    read_frame: usize,
    frames_elapsed: u64,
    sample_rate: u32,
    transpose_every: Option<u32>,
    next_transpose: u32,
    rejected_notes: u64,
}

impl Performance {
    /// Build a performance from a session.
    ///
    /// `sample_rate` overrides the session rate when the device dictates one.
    pub fn from_session(session: &Session, sample_rate: Option<u32>) -> anyhow::Result<Self> {
        let mut session = session.clone();
        if let Some(rate) = sample_rate {
            session.sample_rate = rate;
        }

        let synth: Synth = session.build_synth()?;
        let sequencer = session.build_sequencer()?;
        let buffer = session.build_buffer()?;

        tracing::info!(
            session = %session.name,
            sample_rate = session.sample_rate,
            frames_per_half = buffer.frames_per_half(),
            tracks = sequencer.tracks().len(),
            "performance ready"
        );

        Ok(Self {
            synth,
            sequencer,
            buffer,
            ready: BufferReady::new(),
            playing: BufferHalf::First,
            read_frame: 0,
            frames_elapsed: 0,
            sample_rate: session.sample_rate,
            transpose_every: None,
            next_transpose: 0,
            rejected_notes: 0,
        })
    }

    /// Advance the transpose every `ms` milliseconds of output.
    pub fn with_transpose_every(mut self, ms: Option<u32>) -> Self {
        self.transpose_every = ms.filter(|&ms| ms > 0);
        self.next_transpose = self.transpose_every.unwrap_or(0);
        self
    }

    /// Milliseconds of audio the device has consumed.
    pub fn tick(&self) -> u32 {
        (self.frames_elapsed * 1000 / u64::from(self.sample_rate.max(1))) as u32
    }

    /// Sample rate the synth renders at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames per buffer half.
    pub fn frames_per_half(&self) -> usize {
        self.buffer.frames_per_half()
    }

    /// Notes the patches rejected as out of range.
    pub fn rejected_notes(&self) -> u64 {
        self.rejected_notes
    }

    /// The synth.
    pub fn synth(&self) -> &Synth {
        &self.synth
    }

    /// The output buffer.
    pub fn buffer(&self) -> &DoubleBuffer {
        &self.buffer
    }

    /// Apply a control event.
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Transpose => {
                let offset = self.synth.advance_transpose();
                tracing::info!(offset, "transpose");
            }
        }
    }

    /// Apply every pending control event without blocking.
    pub fn drain(&mut self, controls: &Receiver<Control>) {
        while let Ok(control) = controls.try_recv() {
            self.apply(control);
        }
    }

    /// Finish playing the current half and refill it.
    ///
    /// Raises the half the device just consumed, advances the clock, runs
    /// the sequencer at the new tick and services the synth. Returns the
    /// half that was rendered; it plays after the other one.
    pub fn finish_half(&mut self) -> BufferHalf {
        let finished = self.playing;
        self.ready.raise(finished);
        self.playing = finished.other();
        self.read_frame = 0;
        self.frames_elapsed += self.buffer.frames_per_half() as u64;

        let tick = self.tick();
        if let Some(every) = self.transpose_every
            && tick >= self.next_transpose
        {
            self.apply(Control::Transpose);
            self.next_transpose = self.next_transpose.saturating_add(every);
        }

        let rejected = self
            .sequencer
            .update_each(&mut self.synth, tick, |track, err| {
                tracing::debug!(%err, track, tick, "note rejected");
            });
        self.rejected_notes += rejected as u64;

        self.synth
            .service(&self.ready, &mut self.buffer)
            .unwrap_or(finished)
    }

    /// Render one half offline and hand it to `sink`.
    ///
    /// The half handed over is the one the device would play next, so
    /// successive calls produce the output stream in playback order.
    pub fn render_half<E>(
        &mut self,
        mut sink: impl FnMut(&[i16]) -> Result<(), E>,
    ) -> Result<(), E> {
        sink(self.buffer.half(self.playing))?;
        self.finish_half();
        Ok(())
    }

    /// Fill an interleaved `f32` device buffer, rendering halves as they
    /// are consumed.
    ///
    /// `on_half` runs after every refill with the time the refill took.
    pub fn fill_device(
        &mut self,
        out: &mut [f32],
        channels: usize,
        mut on_half: impl FnMut(&mut Self, Duration),
    ) {
        if channels == 0 {
            return;
        }
        let mut written = 0;
        while written < out.len() {
            let start = self.read_frame * 2;
            let frames = write_frames(
                &self.buffer.half(self.playing)[start..],
                &mut out[written..],
                channels,
            );
            self.read_frame += frames;
            written += frames * channels;

            if self.read_frame >= self.buffer.frames_per_half() {
                let began = std::time::Instant::now();
                self.finish_half();
                on_half(self, began.elapsed());
            } else if frames == 0 {
                // Output shorter than one frame
                out[written..].fill(0.0);
                break;
            }
        }
    }
}

/// Counts refills that took longer than the audio they produce.
#[derive(Debug, Clone)]
pub struct DeadlineMonitor {
    budget: Duration,
    halves: Arc<AtomicU64>,
    overruns: Arc<AtomicU64>,
}

impl DeadlineMonitor {
    /// Monitor refills against the duration of one buffer half.
    pub fn new(frames_per_half: usize, sample_rate: u32) -> Self {
        let budget = Duration::from_secs_f64(frames_per_half as f64 / f64::from(sample_rate.max(1)));
        Self {
            budget,
            halves: Arc::new(AtomicU64::new(0)),
            overruns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record one refill.
    pub fn record(&self, elapsed: Duration) {
        self.halves.fetch_add(1, Ordering::Relaxed);
        if elapsed > self.budget {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Time available per half.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Halves rendered so far.
    pub fn halves(&self) -> u64 {
        self.halves.load(Ordering::Relaxed)
    }

    /// Refills that missed their deadline.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}
