//! Capture sink capability and the in-memory WAV sink.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{Error, Result};

/// Format of the audio handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Receives rendered audio and turns it into an encoded artifact.
///
/// One render uses the sink as `start`, any number of `write`s, `stop`,
/// then `release`. `release` is also called when the render fails part
/// way, so it must cope with a sink that was never started or stopped.
pub trait CaptureSink {
    fn start(&mut self, format: CaptureFormat) -> Result<()>;

    /// Append interleaved samples.
    fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Finish capture and return the encoded bytes.
    fn stop(&mut self) -> Result<Vec<u8>>;

    fn release(&mut self) -> Result<()>;
}

/// WAV sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavEncoding {
    #[default]
    Pcm16,
    Float32,
}

impl WavEncoding {
    fn spec(self, format: CaptureFormat) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            WavEncoding::Pcm16 => (16, SampleFormat::Int),
            WavEncoding::Float32 => (32, SampleFormat::Float),
        };
        WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Buffers captured samples and encodes them as a WAV file on `stop`.
#[derive(Debug, Default)]
pub struct WavCaptureSink {
    encoding: WavEncoding,
    format: Option<CaptureFormat>,
    samples: Vec<f32>,
    released: bool,
}

impl WavCaptureSink {
    pub fn new(encoding: WavEncoding) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.format.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn encode(&self, format: CaptureFormat) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, self.encoding.spec(format))?;
            match self.encoding {
                WavEncoding::Pcm16 => {
                    for &sample in &self.samples {
                        let value = (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32);
                        writer.write_sample(value as i16)?;
                    }
                }
                WavEncoding::Float32 => {
                    for &sample in &self.samples {
                        writer.write_sample(sample)?;
                    }
                }
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

impl CaptureSink for WavCaptureSink {
    fn start(&mut self, format: CaptureFormat) -> Result<()> {
        if self.released {
            return Err(Error::Capture("sink already released".into()));
        }
        if self.format.is_some() {
            return Err(Error::Capture("capture already started".into()));
        }
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(Error::Capture(format!(
                "unusable format: {} Hz, {} channels",
                format.sample_rate, format.channels
            )));
        }
        self.samples.clear();
        self.format = Some(format);
        Ok(())
    }

    fn write(&mut self, samples: &[f32]) -> Result<()> {
        if self.format.is_none() {
            return Err(Error::Capture("write before start".into()));
        }
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<u8>> {
        let format = self
            .format
            .take()
            .ok_or_else(|| Error::Capture("stop before start".into()))?;
        let bytes = self.encode(format)?;
        debug!(samples = self.samples.len(), bytes = bytes.len(), "capture encoded");
        self.samples.clear();
        Ok(bytes)
    }

    fn release(&mut self) -> Result<()> {
        self.format = None;
        self.samples = Vec::new();
        self.released = true;
        Ok(())
    }
}
