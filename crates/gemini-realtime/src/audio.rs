//! Audio framing contract between the duplex adapter and the session.

use crate::error::SessionError;
use async_trait::async_trait;
use base64::Engine;
use tokio::sync::mpsc;

/// Sample rate the adapter captures microphone audio at.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
/// Sample rate the server streams speech audio at.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// A buffer of 16-bit PCM samples tagged with its sample rate.
///
/// Frames are moved through channels, never copied or retained beyond
/// one transfer, so a slow consumer cannot build up backpressure here.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn captured(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: CAPTURE_SAMPLE_RATE,
        }
    }

    pub fn playback(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: PLAYBACK_SAMPLE_RATE,
        }
    }

    /// Mime tag attached to outbound realtime input.
    pub fn mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.sample_rate)
    }
}

/// A captured frame plus its RMS level for the visualizer.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub frame: AudioFrame,
    pub rms: f32,
}

/// Root-mean-square amplitude of a frame, normalized to `0.0..=1.0`.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / 32768.0;
            normalized * normalized
        })
        .sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Encodes PCM samples as base64 over little-endian bytes for the wire.
pub fn encode_pcm_base64(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD.encode(&bytes)
}

/// Decodes base64 PCM. Malformed input yields an empty buffer; an
/// incomplete trailing byte is discarded.
pub fn decode_pcm_base64(data: &str) -> Vec<i16> {
    match base64::engine::general_purpose::STANDARD.decode(data) {
        Ok(bytes) => bytes
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
            .collect(),
        Err(_) => {
            tracing::warn!("failed to decode base64 audio payload");
            Vec::new()
        }
    }
}

/// Channel endpoints handed to the session by [`AudioDuplex::start`].
pub struct AudioStreams {
    /// Microphone frames, tagged with per-frame RMS.
    pub captured: mpsc::Receiver<CapturedFrame>,
    /// Sink for server speech audio.
    pub playback: mpsc::Sender<AudioFrame>,
    /// Fires each time the playback queue empties.
    pub drained: mpsc::Receiver<()>,
}

/// Duplex audio capability consumed by the session client.
///
/// The adapter exclusively owns the microphone and speaker for the
/// lifetime of one session. The 16 kHz capture / 24 kHz playback rates
/// are fixed configuration, not negotiated.
#[async_trait]
pub trait AudioDuplex: Send + Sync {
    /// Acquires the devices and starts capture and playback.
    async fn start(&self) -> Result<AudioStreams, SessionError>;
    /// Releases both devices. Idempotent and safe under repeated calls.
    async fn stop(&self);
}
