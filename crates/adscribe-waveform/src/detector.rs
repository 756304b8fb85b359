//! Silence detection over waveform peaks

use adscribe_core::Space;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::waveform::Waveform;

/// Finds silence windows. Results must be ascending and non-overlapping.
pub trait SpaceDetector: Send + Sync {
    fn detect(&self, waveform: &Waveform) -> Vec<Space>;
}

/// Silence detector settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceDetectorConfig {
    /// Analysis window length (ms)
    pub window_ms: f64,
    /// A window is silent when its RMS is below this fraction of the loudest window
    pub threshold_ratio: f64,
    /// Shortest silence reported as a space (ms)
    pub min_space_ms: f64,
    /// Trimmed from both ends of every space (ms)
    pub padding_ms: f64,
}

impl Default for SilenceDetectorConfig {
    fn default() -> Self {
        Self {
            window_ms: 100.0,
            threshold_ratio: 0.1,
            min_space_ms: 1500.0,
            padding_ms: 50.0,
        }
    }
}

/// RMS threshold detector
#[derive(Debug, Clone, Default)]
pub struct SilenceDetector {
    config: SilenceDetectorConfig,
}

impl SilenceDetector {
    pub fn new(config: SilenceDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SilenceDetectorConfig {
        &self.config
    }
}

impl SpaceDetector for SilenceDetector {
    fn detect(&self, waveform: &Waveform) -> Vec<Space> {
        if waveform.is_empty() {
            return Vec::new();
        }

        let window = waveform.ms_to_sample(self.config.window_ms).max(1);
        let levels: Vec<f64> = waveform.data().chunks(window).map(rms).collect();
        let loudest = levels.iter().cloned().fold(0.0, f64::max);
        let threshold = loudest * self.config.threshold_ratio;
        debug!(
            "Silence detection: {} windows, loudest {:.1}, threshold {:.1}",
            levels.len(),
            loudest,
            threshold
        );

        let duration = waveform.duration_ms();
        let mut spaces = Vec::new();
        let mut run_start: Option<usize> = None;

        // Trailing sentinel closes a run that reaches the end
        for (i, level) in levels.iter().map(Some).chain(std::iter::once(None)).enumerate() {
            let silent = match level {
                Some(level) => loudest == 0.0 || *level < threshold,
                None => false,
            };
            match (silent, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    run_start = None;
                    let start_ms = waveform.sample_to_ms(start * window) + self.config.padding_ms;
                    let end_ms =
                        waveform.sample_to_ms(i * window).min(duration) - self.config.padding_ms;
                    if end_ms - start_ms >= self.config.min_space_ms {
                        spaces.push(Space::new(start_ms, end_ms));
                    }
                }
                _ => {}
            }
        }

        info!("Detected {} spaces", spaces.len());
        spaces
    }
}

fn rms(samples: &[i16]) -> f64 {
    let sum: f64 = samples.iter().map(|s| (*s as f64) * (*s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::WaveformHeader;

    /// 100 peaks per second
    fn waveform_from_pattern(pattern: &[(bool, usize)]) -> Waveform {
        let mut data = Vec::new();
        for (loud, seconds) in pattern {
            let value = if *loud { 20000 } else { 0 };
            data.extend(std::iter::repeat(value).take(seconds * 100));
        }
        Waveform::new(WaveformHeader::mono_16bit(44100, 441), data).unwrap()
    }

    #[test]
    fn test_detects_silences_in_order() {
        let waveform = waveform_from_pattern(&[
            (true, 3),
            (false, 4),
            (true, 2),
            (false, 1),
            (true, 2),
            (false, 3),
        ]);

        let spaces = SilenceDetector::default().detect(&waveform);

        // The one-second gap is below the minimum length
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].start_ms, 3050.0);
        assert_eq!(spaces[0].end_ms, 6950.0);
        assert_eq!(spaces[1].start_ms, 12050.0);
        assert_eq!(spaces[1].end_ms, 14950.0);
        for pair in spaces.windows(2) {
            assert!(pair[0].end_ms <= pair[1].start_ms);
        }
    }

    #[test]
    fn test_silent_waveform_is_one_space() {
        let waveform = waveform_from_pattern(&[(false, 5)]);
        let spaces = SilenceDetector::default().detect(&waveform);
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].start_ms, 50.0);
        assert_eq!(spaces[0].end_ms, 4950.0);
    }

    #[test]
    fn test_loud_waveform_has_no_space() {
        let waveform = waveform_from_pattern(&[(true, 5)]);
        assert!(SilenceDetector::default().detect(&waveform).is_empty());
    }
}
