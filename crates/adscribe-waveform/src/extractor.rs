//! Audio extraction from video files

use std::fs::File;
use std::path::Path;

use rubato::{FftFixedInOut, Resampler};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::WaveformError;
use crate::progress::ProgressSink;
use crate::waveform::{PeakFolder, Waveform, WaveformHeader};

/// Turns a video file into a waveform. Runs on a worker thread.
pub trait AudioExtractor: Send + Sync {
    fn extract(&self, video: &Path, progress: &dyn ProgressSink) -> Result<Waveform, WaveformError>;
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Rate the decoded audio is brought to before folding
    pub target_sample_rate: u32,
    /// Decoded samples folded into one stored peak
    pub sample_ratio: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 44100,
            // 100 peaks per second
            sample_ratio: 441,
        }
    }
}

/// Extractor backed by symphonia
#[derive(Debug, Clone, Default)]
pub struct SymphoniaExtractor {
    config: ExtractorConfig,
}

impl SymphoniaExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl AudioExtractor for SymphoniaExtractor {
    fn extract(&self, video: &Path, progress: &dyn ProgressSink) -> Result<Waveform, WaveformError> {
        if !video.exists() {
            return Err(WaveformError::FileNotFound(video.to_path_buf()));
        }

        info!("Extracting audio from: {}", video.display());
        progress.set_progress("Opening video", 0.0);

        let file = File::open(video)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = video.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| WaveformError::InvalidFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| WaveformError::InvalidFormat("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_rate = codec_params
            .sample_rate
            .ok_or_else(|| WaveformError::InvalidFormat("No sample rate".to_string()))?;
        let total_frames = codec_params.n_frames;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| WaveformError::InvalidFormat(format!("Decoder error: {}", e)))?;

        let target_rate = self.config.target_sample_rate;
        let mut resampler = if source_rate != target_rate {
            debug!("Resampling {} Hz -> {} Hz", source_rate, target_rate);
            Some(StreamResampler::new(source_rate, target_rate)?)
        } else {
            None
        };
        let mut folder = PeakFolder::new(self.config.sample_ratio);
        let mut frames_done: u64 = 0;
        let mut last_percent = 0u32;

        progress.set_progress("Extracting audio", 0.0);

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Stopping at packet read error: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Packet decode error: {}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let frames = decoded.frames() as u64;
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            // Track parameters may omit the layout; the decoded buffer always has it
            let mono = mix_to_mono(sample_buf.samples(), spec.channels.count());

            match resampler.as_mut() {
                Some(resampler) => {
                    for sample in resampler.push(mono)? {
                        folder.push(sample);
                    }
                }
                None => mono.for_each(|sample| folder.push(sample)),
            }

            frames_done += frames;
            if let Some(total) = total_frames.filter(|total| *total > 0) {
                let percent = ((frames_done * 100) / total).min(99) as u32;
                if percent > last_percent {
                    last_percent = percent;
                    progress.set_progress("Extracting audio", percent as f64);
                }
            }
        }

        if let Some(resampler) = resampler {
            for sample in resampler.finish()? {
                folder.push(sample);
            }
        }

        let peaks = folder.finish();
        if peaks.is_empty() {
            return Err(WaveformError::ExtractionFailed(format!(
                "No audio decoded from {}",
                video.display()
            )));
        }

        progress.set_progress("Audio extracted", 100.0);
        info!("Extracted {} waveform peaks", peaks.len());

        Waveform::new(
            WaveformHeader::mono_16bit(target_rate, self.config.sample_ratio),
            peaks,
        )
    }
}

/// Average interleaved frames of `channels` samples into mono
fn mix_to_mono(samples: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    samples
        .chunks(channels.max(1))
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
}

/// Mono resampler fed in arbitrary-sized pieces
struct StreamResampler {
    inner: FftFixedInOut<f32>,
    pending: Vec<f32>,
    ratio: f64,
}

impl StreamResampler {
    const CHUNK_SIZE: usize = 1024;

    fn new(from_rate: u32, to_rate: u32) -> Result<Self, WaveformError> {
        let inner = FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, Self::CHUNK_SIZE, 1)
            .map_err(|e| WaveformError::ExtractionFailed(format!("Resampler: {}", e)))?;
        Ok(Self {
            inner,
            pending: Vec::new(),
            ratio: to_rate as f64 / from_rate as f64,
        })
    }

    fn push(&mut self, samples: impl Iterator<Item = f32>) -> Result<Vec<f32>, WaveformError> {
        self.pending.extend(samples);
        let mut output = Vec::new();
        loop {
            let needed = self.inner.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            output.extend(self.process(chunk)?);
        }
        Ok(output)
    }

    fn finish(mut self) -> Result<Vec<f32>, WaveformError> {
        let remaining = self.pending.len();
        if remaining == 0 {
            return Ok(Vec::new());
        }
        let mut padded = std::mem::take(&mut self.pending);
        padded.resize(self.inner.input_frames_next(), 0.0);
        let result = self.process(padded)?;
        let keep = ((remaining as f64 * self.ratio) as usize).min(result.len());
        Ok(result[..keep].to_vec())
    }

    fn process(&mut self, chunk: Vec<f32>) -> Result<Vec<f32>, WaveformError> {
        let input = vec![chunk];
        let mut result = self
            .inner
            .process(&input, None)
            .map_err(|e| WaveformError::ExtractionFailed(format!("Resample: {}", e)))?;
        Ok(result.swap_remove(0))
    }
}
