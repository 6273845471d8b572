//! Safe Rust wrappers for FFmpeg codec operations
//!
//! This module provides RAII wrappers around FFmpeg's C structures,
//! ensuring proper resource cleanup and memory safety.

pub mod audio_buffer;
pub mod avio_context;
pub mod context;
pub mod demuxer;
pub mod frame;
pub mod hwdevice;
pub mod hwframes;
pub mod io_buffer;
pub mod packet;
pub mod resampler;
pub mod scaler;

pub use audio_buffer::AudioSampleBuffer;
pub use avio_context::{CustomIOContext, IoMode};
pub use context::{CodecContext, CodecType};
pub use demuxer::{DemuxerContext, MediaType, StreamInfo};
pub use frame::Frame;
pub use hwdevice::HwDeviceContext;
pub use hwframes::{HwFrameConfig, HwFrameContext};
pub use io_buffer::{BufferSource, MemoryBuffer, ReadOnlyBuffer, StreamingBuffer, StreamingBufferHandle};
pub use packet::Packet;
pub use resampler::Resampler;
pub use scaler::{ScaleAlgorithm, Scaler};

use crate::ffi::{AVCodecID, AVPixelFormat, AVSampleFormat};

/// Encoder rate-control strategy, mirroring WebCodecs' `bitrateMode`.
///
/// `Variable` is accepted (some encoders expose it even though the current
/// W3C surface only lists `constant`/`quantizer`) and behaves like `Constant`
/// with a tolerance window, since x264/x265/libvpx all call this "VBR".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitrateMode {
    #[default]
    Constant,
    Variable,
    Quantizer,
}

/// Bitstream packaging for AVC/HEVC output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitstreamFormat {
    #[default]
    Avc,
    Annexb,
}

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Codec identifier, used both to select the context and to pick the
    /// per-encoder AVOption tuning table.
    pub codec_id: AVCodecID,
    /// Video width in pixels
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Pixel format
    pub pixel_format: AVPixelFormat,
    /// Target bitrate in bits per second (0 for CRF/quantizer mode)
    pub bitrate: u64,
    /// Rate control strategy
    pub bitrate_mode: BitrateMode,
    /// Constant rate factor / quantizer value, used when `bitrate_mode` is
    /// `Quantizer` (or as a CRF hint for `Variable`)
    pub crf: Option<u32>,
    /// Maximum instantaneous rate, bits per second (VBV/rc_max_rate)
    pub rc_max_rate: Option<u64>,
    /// Decoder buffer size backing `rc_max_rate`, in bits
    pub rc_buffer_size: Option<u64>,
    /// Frames per second (numerator)
    pub framerate_num: u32,
    /// Frames per second (denominator)
    pub framerate_den: u32,
    /// Group of pictures size (keyframe interval)
    pub gop_size: u32,
    /// Maximum B-frames between non-B frames. Spec-mandated 0 for every
    /// video encoder so the per-frame keyframe hint stays reliable; kept
    /// as a field rather than a hardcoded constant so `configure_encoder`
    /// remains a generic, testable function.
    pub max_b_frames: u32,
    /// Number of threads (0 for auto)
    pub thread_count: u32,
    /// Codec profile (codec-specific)
    pub profile: Option<i32>,
    /// Codec level (codec-specific)
    pub level: Option<i32>,
    /// AVC/HEVC bitstream packaging
    pub bitstream_format: BitstreamFormat,
    /// Hint to skip hardware probing entirely
    pub prefer_software: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec_id: AVCodecID::H264,
            width: 1920,
            height: 1080,
            pixel_format: AVPixelFormat::Yuv420p,
            bitrate: 5_000_000, // 5 Mbps
            bitrate_mode: BitrateMode::Constant,
            crf: None,
            rc_max_rate: None,
            rc_buffer_size: None,
            framerate_num: 30,
            framerate_den: 1,
            gop_size: 60, // 2 seconds at 30fps
            max_b_frames: 0,
            thread_count: 0, // Auto
            profile: None,
            level: None,
            bitstream_format: BitstreamFormat::Avc,
            prefer_software: false,
        }
    }
}

/// Decoder configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Codec ID
    pub codec_id: AVCodecID,
    /// Number of threads (0 for auto)
    pub thread_count: u32,
    /// Extra data (codec-specific, e.g., SPS/PPS for H.264)
    pub extradata: Option<Vec<u8>>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            codec_id: AVCodecID::H264,
            thread_count: 0,
            extradata: None,
        }
    }
}

/// Audio encoder configuration (internal, FFmpeg-facing)
#[derive(Debug, Clone)]
pub struct AudioEncoderConfig {
    pub sample_rate: u32,
    pub channels: u32,
    pub sample_format: AVSampleFormat,
    pub bitrate: u64,
    pub thread_count: u32,
}

impl Default for AudioEncoderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            sample_format: AVSampleFormat::Fltp,
            bitrate: 128_000,
            thread_count: 0,
        }
    }
}

/// Audio decoder configuration (internal, FFmpeg-facing)
#[derive(Debug, Clone)]
pub struct AudioDecoderConfig {
    pub codec_id: AVCodecID,
    pub sample_rate: u32,
    pub channels: u32,
    pub thread_count: u32,
    pub extradata: Option<Vec<u8>>,
}

impl Default for AudioDecoderConfig {
    fn default() -> Self {
        Self {
            codec_id: AVCodecID::Aac,
            sample_rate: 0,
            channels: 0,
            thread_count: 0,
            extradata: None,
        }
    }
}

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] crate::ffi::FFmpegError),

    #[error("Codec not found: {0}")]
    CodecNotFound(String),

    #[error("Encoder not found for codec: {0:?}")]
    EncoderNotFound(AVCodecID),

    #[error("Decoder not found for codec: {0:?}")]
    DecoderNotFound(AVCodecID),

    #[error("Failed to allocate {0}")]
    AllocationFailed(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Codec not configured")]
    NotConfigured,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unsupported pixel format: {0:?}")]
    UnsupportedPixelFormat(AVPixelFormat),

    #[error("Hardware acceleration error: {0}")]
    HardwareError(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
