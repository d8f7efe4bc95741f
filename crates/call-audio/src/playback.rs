use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::Error;

/// A chunk with its scheduled play window.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledChunk {
    pub samples: Vec<f32>,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Strict-FIFO playback schedule.
///
/// Models the self-re-arming chain: each chunk, on completion, triggers the
/// next dequeue-and-play with the next chunk's start pinned exactly to the
/// previous chunk's end — never earlier, never with a scheduled gap. When
/// the queue drains the driver goes idle; the next enqueue re-arms it at
/// the caller's clock, which is the one place a (real, audible) gap can
/// appear.
///
/// This is the scheduling contract; [`PlaybackHandle`] realizes it against
/// the output device.
pub struct PlaybackQueue {
    sample_rate: u32,
    queue: VecDeque<Vec<f32>>,
    current_end: Option<f64>,
}

impl PlaybackQueue {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            queue: VecDeque::new(),
            current_end: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current_end.is_none()
    }

    pub fn depth(&self) -> usize {
        self.queue.len()
    }

    /// Enqueue a decoded chunk. Returns the chunk to start playing now if
    /// the driver was idle (the re-arm), `None` if it joined the queue.
    pub fn enqueue(&mut self, samples: Vec<f32>, now_secs: f64) -> Option<ScheduledChunk> {
        if self.current_end.is_some() {
            self.queue.push_back(samples);
            return None;
        }

        Some(self.schedule(samples, now_secs))
    }

    /// The playing chunk finished. Returns the next chunk, scheduled
    /// back-to-back, or `None` when the queue is drained and the driver
    /// goes idle.
    pub fn on_complete(&mut self) -> Option<ScheduledChunk> {
        let previous_end = self.current_end.take()?;

        let samples = self.queue.pop_front()?;
        Some(self.schedule(samples, previous_end))
    }

    fn schedule(&mut self, samples: Vec<f32>, start_secs: f64) -> ScheduledChunk {
        let end_secs = start_secs + samples.len() as f64 / self.sample_rate as f64;
        self.current_end = Some(end_secs);
        ScheduledChunk {
            samples,
            start_secs,
            end_secs,
        }
    }
}

/// Device-backed playback driver on its own thread.
///
/// rodio's sink plays appended sources sequentially with no gap, which is
/// exactly the [`PlaybackQueue`] contract; the thread exists because the
/// output stream handle is not `Send` and must live where it was opened.
/// Shutting down (or dropping the sender) releases the device
/// deterministically.
pub struct PlaybackHandle {
    tx: Option<mpsc::Sender<Vec<f32>>>,
    drain_on_close: Arc<AtomicBool>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Open the default output device and start the driver.
    pub fn spawn(sample_rate: u32) -> Result<Self, Error> {
        let (tx, mut rx) = mpsc::channel::<Vec<f32>>(64);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), Error>>();
        let drain_on_close = Arc::new(AtomicBool::new(false));
        let drain = drain_on_close.clone();

        let join = std::thread::Builder::new()
            .name("playback-driver".into())
            .spawn(move || {
                let stream = match rodio::OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::OutputStream(e.to_string())));
                        return;
                    }
                };

                let sink = rodio::Sink::connect_new(stream.mixer());

                while let Some(samples) = rx.blocking_recv() {
                    sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, samples));
                }

                if drain.load(Ordering::Relaxed) {
                    sink.sleep_until_end();
                } else {
                    sink.stop();
                }
                tracing::debug!("playback_driver_exited");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx: Some(tx),
                drain_on_close,
                join: Some(join),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => Err(Error::OutputStream("playback thread died on startup".into())),
        }
    }

    /// Sender for decoded chunks, in arrival order. `None` once the driver
    /// has been shut down.
    pub fn sender(&self) -> Option<mpsc::Sender<Vec<f32>>> {
        self.tx.clone()
    }

    /// Stop the driver. `drain` plays out whatever is already queued;
    /// otherwise playback cuts immediately. Either way the device is
    /// released before this returns. Senders cloned via [`Self::sender`]
    /// must be dropped first — the driver runs until the channel closes.
    pub fn shutdown(mut self, drain: bool) {
        self.drain_on_close.store(drain, Ordering::Relaxed);
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.tx = None;
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("playback_driver_panicked");
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.close_and_join();
    }
}
