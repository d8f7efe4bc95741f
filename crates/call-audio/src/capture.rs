use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;

use crate::pcm::FrameChunker;
use crate::{Error, FRAME_SAMPLES, SAMPLE_RATE};

/// A running microphone capture.
///
/// The cpal stream is not `Send`, so it lives on a dedicated thread for its
/// whole life; the handle owns that thread. Dropping the handle stops the
/// stream and releases the device before `drop` returns.
pub struct CaptureHandle {
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    join: Option<std::thread::JoinHandle<()>>,
    overran: Arc<AtomicBool>,
    device_name: Option<String>,
}

impl CaptureHandle {
    /// True once the receiver fell behind and the uplink was closed.
    pub fn overran(&self) -> bool {
        self.overran.load(Ordering::Relaxed)
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("capture_thread_panicked");
        }
    }
}

/// Open the default input device and stream fixed-size i16-LE frames into
/// `frames`.
///
/// `frames` should be a depth-1 channel: each frame is transmitted as soon
/// as it is produced and nothing is queued behind it. If the receiver is
/// not keeping up the sender is dropped, which closes the channel — the
/// bridge treats that closure as an overrun and tears down, because
/// delivering stale audio late is worse than ending the stream.
pub fn start_capture(frames: mpsc::Sender<Bytes>) -> Result<CaptureHandle, Error> {
    let overran = Arc::new(AtomicBool::new(false));
    let overran_flag = overran.clone();

    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<Option<String>, Error>>();

    let join = std::thread::Builder::new()
        .name("capture-driver".into())
        .spawn(move || {
            let stream = match open_input_stream(frames, overran_flag) {
                Ok((stream, device_name)) => {
                    let _ = ready_tx.send(Ok(device_name));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // park until the handle drops its sender
            let _ = stop_rx.recv();
            drop(stream);
            tracing::debug!("capture_released");
        })?;

    match ready_rx.recv() {
        Ok(Ok(device_name)) => {
            tracing::debug!(device = ?device_name, "capture_started");
            Ok(CaptureHandle {
                stop_tx: Some(stop_tx),
                join: Some(join),
                overran,
                device_name,
            })
        }
        Ok(Err(e)) => {
            let _ = join.join();
            Err(e)
        }
        Err(_) => Err(Error::NoInputDevice),
    }
}

fn open_input_stream(
    frames: mpsc::Sender<Bytes>,
    overran: Arc<AtomicBool>,
) -> Result<(cpal::Stream, Option<String>), Error> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(Error::NoInputDevice)?;
    let device_name = device.name().ok();

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut chunker = FrameChunker::new(FRAME_SAMPLES);
    let mut tx = Some(frames);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let Some(sender) = tx.as_ref() else {
                return;
            };
            for frame in chunker.push(data) {
                match sender.try_send(frame) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!("capture_overrun_closing_uplink");
                        overran.store(true, Ordering::Relaxed);
                        tx = None;
                        return;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tx = None;
                        return;
                    }
                }
            }
        },
        |err| {
            tracing::error!(error = %err, "capture_stream_error");
        },
        None,
    )?;

    stream.play()?;
    Ok((stream, device_name))
}
