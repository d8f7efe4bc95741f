use bytes::{BufMut, Bytes, BytesMut};

const I16_SCALE: f32 = 32768.0;

/// Encode float samples as 16-bit little-endian PCM.
pub fn f32_to_i16_bytes<I>(samples: I) -> Bytes
where
    I: IntoIterator<Item = f32>,
{
    let mut buf = BytesMut::new();
    for sample in samples {
        let scaled = (sample * I16_SCALE).clamp(-I16_SCALE, I16_SCALE - 1.0);
        buf.put_i16_le(scaled as i16);
    }
    buf.freeze()
}

/// Decode 16-bit little-endian PCM into float samples. A trailing odd byte
/// is ignored.
pub fn bytes_to_f32_samples(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_SCALE)
        .collect()
}

/// Accumulates capture-callback sample slices into fixed-size i16-LE
/// frames. The callback hands over whatever buffer size the device chose;
/// the wire wants exact frames.
pub struct FrameChunker {
    frame_samples: usize,
    buffer: Vec<f32>,
}

impl FrameChunker {
    pub fn new(frame_samples: usize) -> Self {
        Self {
            frame_samples,
            buffer: Vec::with_capacity(frame_samples),
        }
    }

    /// Push samples, returning every completed frame.
    pub fn push(&mut self, samples: &[f32]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for &sample in samples {
            self.buffer.push(sample);
            if self.buffer.len() == self.frame_samples {
                frames.push(f32_to_i16_bytes(self.buffer.drain(..)));
            }
        }
        frames
    }

    /// Remaining samples that never filled a frame. Encoded short rather
    /// than zero-padded so the receiver's clock is not skewed.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(f32_to_i16_bytes(self.buffer.drain(..)))
        }
    }
}
