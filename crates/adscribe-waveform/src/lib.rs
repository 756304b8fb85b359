//! Waveform extraction and analysis for adscribe
//!
//! Turns the audio track of a video into a compact peak waveform, caches it
//! inside the project folder and finds silence windows in it.

pub mod cache;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod progress;
pub mod waveform;

pub use detector::{SilenceDetector, SilenceDetectorConfig, SpaceDetector};
pub use error::WaveformError;
pub use extractor::{AudioExtractor, ExtractorConfig, SymphoniaExtractor};
pub use progress::{LoadingProgress, NoProgress, ProgressSink, ProgressState};
pub use waveform::{Waveform, WaveformHeader};
