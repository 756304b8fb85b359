//! Waveform data

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::WaveformError;

/// Waveform header metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformHeader {
    /// Sample rate of the decoded audio
    pub sample_rate: u32,
    /// Bytes per stored sample frame
    pub block_align: u16,
    /// Decoded samples folded into one stored sample
    pub sample_ratio: u32,
}

impl WaveformHeader {
    /// Header for mono 16-bit peaks
    pub fn mono_16bit(sample_rate: u32, sample_ratio: u32) -> Self {
        Self {
            sample_rate,
            block_align: 2,
            sample_ratio,
        }
    }
}

/// Derived audio peaks of a project's video, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    header: WaveformHeader,
    data: Vec<i16>,
}

impl Waveform {
    pub fn new(header: WaveformHeader, data: Vec<i16>) -> Result<Self, WaveformError> {
        if header.sample_rate == 0 {
            return Err(WaveformError::InvalidFormat("Sample rate is zero".to_string()));
        }
        if header.sample_ratio == 0 {
            return Err(WaveformError::InvalidFormat("Sample ratio is zero".to_string()));
        }
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &WaveformHeader {
        &self.header
    }

    pub fn data(&self) -> &[i16] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Video time (ms) of a stored sample index
    pub fn sample_to_ms(&self, sample: usize) -> f64 {
        sample as f64 * self.header.sample_ratio as f64 * 1000.0 / self.header.sample_rate as f64
    }

    /// Stored sample index at a video time (ms), clamped at zero
    pub fn ms_to_sample(&self, ms: f64) -> usize {
        (ms.max(0.0) * self.header.sample_rate as f64
            / (1000.0 * self.header.sample_ratio as f64)) as usize
    }

    /// Covered video time (ms)
    pub fn duration_ms(&self) -> f64 {
        self.sample_to_ms(self.data.len())
    }

    /// Peaks between two video times
    pub fn samples_between(&self, start_ms: f64, end_ms: f64) -> &[i16] {
        let start = self.ms_to_sample(start_ms).min(self.data.len());
        let end = self.ms_to_sample(end_ms).clamp(start, self.data.len());
        &self.data[start..end]
    }

    /// Build the waveform of a recorded WAV clip, e.g. a description's audio
    pub fn from_wav_file(path: &Path, sample_ratio: u32) -> Result<Self, WaveformError> {
        let file = File::open(path).map_err(|_| WaveformError::FileNotFound(path.to_path_buf()))?;
        let reader = hound::WavReader::new(BufReader::new(file))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut folder = PeakFolder::new(sample_ratio.max(1));
        for frame in samples.chunks(channels) {
            folder.push(frame.iter().sum::<f32>() / frame.len() as f32);
        }

        Self::new(
            WaveformHeader::mono_16bit(spec.sample_rate, sample_ratio.max(1)),
            folder.finish(),
        )
    }
}

/// Folds mono samples into one signed peak per `ratio` samples
#[derive(Debug)]
pub(crate) struct PeakFolder {
    ratio: usize,
    count: usize,
    peak: f32,
    out: Vec<i16>,
}

impl PeakFolder {
    pub(crate) fn new(ratio: u32) -> Self {
        Self {
            ratio: ratio as usize,
            count: 0,
            peak: 0.0,
            out: Vec::new(),
        }
    }

    /// Feed one sample in `-1.0..=1.0`
    pub(crate) fn push(&mut self, sample: f32) {
        if sample.abs() > self.peak.abs() {
            self.peak = sample;
        }
        self.count += 1;
        if self.count == self.ratio {
            self.flush();
        }
    }

    pub(crate) fn finish(mut self) -> Vec<i16> {
        if self.count > 0 {
            self.flush();
        }
        self.out
    }

    fn flush(&mut self) {
        let scaled = (self.peak * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32);
        self.out.push(scaled as i16);
        self.count = 0;
        self.peak = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_conversion() {
        // 44.1 kHz folded by 441 -> 100 stored samples per second
        let waveform = Waveform::new(WaveformHeader::mono_16bit(44100, 441), vec![0; 1000]).unwrap();
        assert_eq!(waveform.duration_ms(), 10_000.0);
        assert_eq!(waveform.ms_to_sample(2500.0), 250);
        assert_eq!(waveform.sample_to_ms(250), 2500.0);
        assert_eq!(waveform.samples_between(1000.0, 2000.0).len(), 100);
        assert!(waveform.samples_between(9000.0, 20_000.0).len() == 100);
    }

    #[test]
    fn test_rejects_zero_ratio() {
        let result = Waveform::new(WaveformHeader::mono_16bit(44100, 0), vec![]);
        assert!(matches!(result, Err(WaveformError::InvalidFormat(_))));
    }

    #[test]
    fn test_peak_folder_keeps_sign() {
        let mut folder = PeakFolder::new(3);
        for sample in [0.1, -0.5, 0.2, 0.25, 0.0, 0.1, -1.0] {
            folder.push(sample);
        }
        let peaks = folder.finish();
        assert_eq!(peaks.len(), 3);
        assert!(peaks[0] < 0);
        assert!(peaks[1] > 0);
        assert_eq!(peaks[2], -i16::MAX);
    }

    #[test]
    fn test_from_wav_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clip.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..8000 {
            let value = if i < 4000 { 16000i16 } else { 0 };
            writer.write_sample(value).unwrap();
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = Waveform::from_wav_file(&path, 80).unwrap();
        assert_eq!(waveform.header().sample_rate, 8000);
        assert_eq!(waveform.len(), 100);
        assert_eq!(waveform.duration_ms(), 1000.0);
        assert!(waveform.data()[10] > 15000);
        assert_eq!(waveform.data()[90], 0);
    }
}
