use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::Error;

/// Writes uplink PCM frames to a WAV file for later review of practice
/// sessions.
pub struct WavRecorder {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
}

impl WavRecorder {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
        })
    }

    /// Append one i16-LE frame as produced by the capture pipeline.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for pair in frame.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
        }
        Ok(())
    }

    /// Flush headers and close the file. Safe to call once; subsequent
    /// writes become no-ops.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}
