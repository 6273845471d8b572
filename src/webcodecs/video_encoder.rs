//! VideoEncoder - WebCodecs API implementation
//!
//! Provides video encoding functionality using FFmpeg. Encoding happens on
//! a dedicated worker thread per encoder instance (see `crate::core`); this
//! struct only ever touches the control queue and a small piece of shared
//! bookkeeping, never the codec context itself.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/VideoEncoder

use crate::codec::{BitrateMode, BitstreamFormat, CodecContext, EncoderConfig, Frame, Scaler};
use crate::core::{CodecWorker, ControlQueue, QueueState, SafeCallbackGateway, WorkerRole};
use crate::ffi::{AVCodecID, AVHWDeviceType, AVPixelFormat};
use crate::webcodecs::error::{invalid_state_error, not_supported_error, operation_error, quota_exceeded_error};
use crate::webcodecs::{
    AvcBitstreamFormat, EncodedVideoChunk, HardwareAcceleration, HevcBitstreamFormat, LatencyMode,
    VideoEncoderBitrateMode, VideoEncoderConfig, VideoFrame,
};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::ThreadsafeFunction;
use napi_derive::napi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Encoder state
#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecState {
    /// Encoder not configured
    #[default]
    Unconfigured,
    /// Encoder configured and ready
    Configured,
    /// Encoder closed
    Closed,
}

/// Output callback metadata
#[napi(object)]
pub struct EncodedVideoChunkMetadata {
    /// Decoder configuration for this chunk (only present for keyframes)
    pub decoder_config: Option<VideoDecoderConfigOutput>,
}

/// Decoder configuration output (for passing to decoder)
#[napi(object)]
pub struct VideoDecoderConfigOutput {
    /// Codec string
    pub codec: String,
    /// Coded width
    pub coded_width: Option<u32>,
    /// Coded height
    pub coded_height: Option<u32>,
    /// Codec description (e.g., avcC for H.264)
    pub description: Option<Buffer>,
}

/// Encode options
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct VideoEncoderEncodeOptions {
    /// Force this frame to be a keyframe
    pub key_frame: Option<bool>,
}

/// Result of isConfigSupported
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VideoEncoderSupport {
    /// Whether the configuration is supported
    pub supported: bool,
    /// The configuration that was checked
    pub config: VideoEncoderConfig,
}

struct FacadeState {
    state: CodecState,
}

enum EncoderMessage {
    Configure {
        config: EncoderConfig,
        hw_type: Option<AVHWDeviceType>,
        codec_string: String,
        use_avcc: bool,
    },
    Encode {
        frame: Frame,
        timestamp: i64,
        force_key_frame: bool,
    },
    Flush {
        responder: oneshot::Sender<Result<()>>,
    },
    Reset,
    Close,
}

/// Runs on the dedicated worker thread; the sole owner of the
/// `CodecContext` and `Scaler` for this encoder instance.
struct VideoEncoderWorker {
    context: Option<CodecContext>,
    scaler: Option<Scaler>,
    width: u32,
    height: u32,
    codec_string: String,
    use_avcc: bool,
    extradata_sent: bool,
    output: SafeCallbackGateway<(EncodedVideoChunk, EncodedVideoChunkMetadata)>,
    error: SafeCallbackGateway<String>,
    dequeue: Option<SafeCallbackGateway<u32>>,
    state: Arc<Mutex<FacadeState>>,
}

impl VideoEncoderWorker {
    fn handle_configure(
        &mut self,
        config: EncoderConfig,
        hw_type: Option<AVHWDeviceType>,
        codec_string: String,
        use_avcc: bool,
    ) {
        self.context = None;
        self.scaler = None;
        self.width = config.width;
        self.height = config.height;
        self.codec_string = codec_string;
        self.use_avcc = use_avcc;
        self.extradata_sent = false;

        let mut context = match CodecContext::new_encoder_with_hw(config.codec_id, hw_type) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(format!("Failed to create encoder: {e}")),
        };
        if let Err(e) = context.configure_encoder(&config) {
            return self.fail(format!("Failed to configure encoder: {e}"));
        }
        if let Err(e) = context.open() {
            return self.fail(format!("Failed to open encoder: {e}"));
        }
        self.context = Some(context);
    }

    fn handle_encode(&mut self, mut frame: Frame, timestamp: i64, force_key_frame: bool) {
        let (width, height) = (self.width, self.height);
        let needs_conversion = frame.format() != AVPixelFormat::Yuv420p || frame.width() != width || frame.height() != height;

        let mut frame_to_encode = if needs_conversion {
            if self.scaler.is_none() {
                match Scaler::new(
                    frame.width(),
                    frame.height(),
                    frame.format(),
                    width,
                    height,
                    AVPixelFormat::Yuv420p,
                    crate::codec::scaler::ScaleAlgorithm::Bilinear,
                ) {
                    Ok(scaler) => self.scaler = Some(scaler),
                    Err(e) => return self.fail(format!("Failed to create scaler: {e}")),
                }
            }
            match self.scaler.as_ref().unwrap().scale_alloc(&frame) {
                Ok(scaled) => scaled,
                Err(e) => return self.fail(format!("Failed to scale frame: {e}")),
            }
        } else {
            frame
        };
        frame_to_encode.set_pts(timestamp);
        let _ = force_key_frame; // keyframe forcing is codec-option territory, not wired up yet

        let extradata = if !self.extradata_sent {
            self.context.as_ref().and_then(|ctx| ctx.extradata().map(|d| d.to_vec()))
        } else {
            None
        };

        let Some(context) = self.context.as_mut() else {
            return self.fail("Encode called with no active encoder context".into());
        };

        let packets = match context.encode(Some(&frame_to_encode)) {
            Ok(pkts) => pkts,
            Err(e) => return self.fail(format!("Encode failed: {e}")),
        };

        for packet in packets {
            self.emit_chunk(packet, &extradata);
        }
    }

    fn handle_flush(&mut self, responder: oneshot::Sender<Result<()>>) {
        let result = match self.context.as_mut() {
            Some(context) => match context.flush_encoder() {
                Ok(packets) => {
                    for packet in packets {
                        self.emit_chunk(packet, &None);
                    }
                    context.flush();
                    Ok(())
                }
                Err(e) => Err(operation_error(&format!("Flush failed: {e}"))),
            },
            None => Ok(()),
        };
        let _ = responder.send(result);
    }

    fn emit_chunk(&mut self, packet: crate::codec::Packet, pending_extradata: &Option<Vec<u8>>) {
        let is_key = packet.is_key();
        let metadata = if !self.extradata_sent && is_key {
            self.extradata_sent = true;
            EncodedVideoChunkMetadata {
                decoder_config: Some(VideoDecoderConfigOutput {
                    codec: self.codec_string.clone(),
                    coded_width: Some(self.width),
                    coded_height: Some(self.height),
                    description: pending_extradata.clone().map(Buffer::from),
                }),
            }
        } else {
            EncodedVideoChunkMetadata { decoder_config: None }
        };
        let chunk = EncodedVideoChunk::from_packet_with_format(packet, None, self.use_avcc);
        self.output.call(Ok((chunk, metadata)));
    }

    fn handle_reset(&mut self) {
        self.context = None;
        self.scaler = None;
    }

    fn fail(&mut self, message: String) {
        self.error.call(Ok(message));
        if let Ok(mut state) = self.state.lock() {
            state.state = CodecState::Closed;
        }
    }
}

impl WorkerRole for VideoEncoderWorker {
    type Message = EncoderMessage;

    fn handle_message(&mut self, message: EncoderMessage, queue_depth: usize) -> bool {
        match message {
            EncoderMessage::Configure {
                config,
                hw_type,
                codec_string,
                use_avcc,
            } => {
                self.handle_configure(config, hw_type, codec_string, use_avcc);
                true
            }
            EncoderMessage::Encode {
                frame,
                timestamp,
                force_key_frame,
            } => {
                self.handle_encode(frame, timestamp, force_key_frame);
                if queue_depth + 1 >= crate::core::SOFT_QUEUE_THRESHOLD
                    && queue_depth < crate::core::SOFT_QUEUE_THRESHOLD
                {
                    if let Some(dequeue) = &self.dequeue {
                        dequeue.call(Ok(queue_depth as u32));
                    }
                }
                true
            }
            EncoderMessage::Flush { responder } => {
                self.handle_flush(responder);
                true
            }
            EncoderMessage::Reset => {
                self.handle_reset();
                true
            }
            EncoderMessage::Close => {
                self.handle_reset();
                false
            }
        }
    }
}

/// VideoEncoder - WebCodecs-compliant video encoder.
///
/// `configure`/`encode`/`reset` enqueue a control message and return
/// immediately without touching the codec; `flush` returns a future
/// settled once the worker has drained the encoder.
#[napi]
pub struct VideoEncoder {
    queue: ControlQueue<EncoderMessage>,
    worker: Mutex<CodecWorker>,
    state: Arc<Mutex<FacadeState>>,
    output: SafeCallbackGateway<(EncodedVideoChunk, EncodedVideoChunkMetadata)>,
    error: SafeCallbackGateway<String>,
    next_promise_id: AtomicU64,
}

#[napi]
impl VideoEncoder {
    /// Create a new VideoEncoder. `output` is invoked with each encoded
    /// chunk and its metadata; `error` is invoked with a message and the
    /// encoder transitions to `closed` whenever the worker hits an
    /// unrecoverable encode failure. `dequeue`, if given, is invoked with
    /// the new queue depth whenever `encodeQueueSize` falls back below the
    /// saturation threshold.
    #[napi(constructor)]
    pub fn new(
        output: ThreadsafeFunction<(EncodedVideoChunk, EncodedVideoChunkMetadata)>,
        error: ThreadsafeFunction<String>,
        dequeue: Option<ThreadsafeFunction<u32>>,
    ) -> Result<Self> {
        let output_gateway = SafeCallbackGateway::new(output);
        let error_gateway = SafeCallbackGateway::new(error);
        let dequeue_gateway = dequeue.map(SafeCallbackGateway::new);

        let state = Arc::new(Mutex::new(FacadeState {
            state: CodecState::Unconfigured,
        }));

        let (queue, consumer) = ControlQueue::new();
        let role = VideoEncoderWorker {
            context: None,
            scaler: None,
            width: 0,
            height: 0,
            codec_string: String::new(),
            use_avcc: true,
            extradata_sent: false,
            output: output_gateway.clone(),
            error: error_gateway.clone(),
            dequeue: dequeue_gateway,
            state: Arc::clone(&state),
        };
        let worker = CodecWorker::spawn(role, consumer);

        Ok(Self {
            queue,
            worker: Mutex::new(worker),
            state,
            output: output_gateway,
            error: error_gateway,
            next_promise_id: AtomicU64::new(0),
        })
    }

    #[napi(getter)]
    pub fn state(&self) -> Result<CodecState> {
        Ok(self.lock_state()?.state)
    }

    /// Number of `encode()` calls enqueued but not yet processed by the
    /// worker.
    #[napi(getter)]
    pub fn encode_queue_size(&self) -> Result<u32> {
        Ok(self.queue.depth() as u32)
    }

    #[napi(getter)]
    pub fn codec_saturated(&self) -> Result<bool> {
        Ok(self.queue.state() != QueueState::Open)
    }

    #[napi]
    pub fn configure(&self, config: VideoEncoderConfig) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Encoder is closed"));
        }

        let codec_string = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;
        let codec_id = parse_codec_string(&codec_string)?;
        let width = config
            .width
            .ok_or_else(|| Error::new(Status::InvalidArg, "width is required"))?;
        let height = config
            .height
            .ok_or_else(|| Error::new(Status::InvalidArg, "height is required"))?;

        let hw_type = config.hardware_acceleration.as_ref().and_then(|ha| match ha {
            HardwareAcceleration::PreferHardware => Some(crate::ffi::hwaccel::PREFERRED_HW_DEVICE),
            _ => None,
        });

        let bitrate_mode = match config.bitrate_mode {
            Some(VideoEncoderBitrateMode::Constant) => BitrateMode::Constant,
            Some(VideoEncoderBitrateMode::Quantizer) => BitrateMode::Quantizer,
            _ => BitrateMode::Variable,
        };

        let (gop_size, max_b_frames) = match config.latency_mode {
            Some(LatencyMode::Realtime) => (10, 0),
            _ => (60, 0),
        };

        let use_avcc = match codec_id {
            AVCodecID::H264 => !matches!(
                config.avc.as_ref().and_then(|a| a.format),
                Some(AvcBitstreamFormat::Annexb)
            ),
            AVCodecID::Hevc => !matches!(
                config.hevc.as_ref().and_then(|h| h.format),
                Some(HevcBitstreamFormat::Annexb)
            ),
            _ => true,
        };
        let bitstream_format = if use_avcc { BitstreamFormat::Avc } else { BitstreamFormat::Annexb };

        let encoder_config = EncoderConfig {
            codec_id,
            width,
            height,
            pixel_format: AVPixelFormat::Yuv420p,
            bitrate: config.bitrate.unwrap_or(5_000_000.0) as u64,
            bitrate_mode,
            crf: None,
            rc_max_rate: None,
            rc_buffer_size: None,
            framerate_num: config.framerate.unwrap_or(30.0) as u32,
            framerate_den: 1,
            gop_size,
            max_b_frames,
            thread_count: 0,
            profile: None,
            level: None,
            bitstream_format,
            prefer_software: matches!(config.hardware_acceleration, Some(HardwareAcceleration::PreferSoftware)),
        };

        self.queue.push(EncoderMessage::Configure {
            config: encoder_config,
            hw_type,
            codec_string,
            use_avcc,
        });

        state.state = CodecState::Configured;
        Ok(())
    }

    #[napi]
    pub fn encode(&self, frame: &VideoFrame, options: Option<VideoEncoderEncodeOptions>) -> Result<()> {
        let state = self.lock_state()?;
        if state.state != CodecState::Configured {
            return Err(invalid_state_error("Encoder is not configured"));
        }
        if self.queue.state() == QueueState::Full {
            return Err(quota_exceeded_error(
                "encodeQueueSize is at its hard limit; wait for a dequeue before encoding more",
            ));
        }

        let cloned = frame
            .with_frame(|f| f.try_clone())?
            .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to clone frame: {e}")))?;
        let timestamp = frame.timestamp()?;
        let force_key_frame = options.and_then(|o| o.key_frame).unwrap_or(false);

        self.queue.push(EncoderMessage::Encode {
            frame: cloned,
            timestamp,
            force_key_frame,
        });
        Ok(())
    }

    /// Flush all pending encode work. Settles once the worker has drained
    /// the encoder and emitted any trailing chunks.
    #[napi]
    pub async fn flush(&self) -> Result<()> {
        {
            let state = self.lock_state()?;
            if state.state == CodecState::Closed {
                return Err(invalid_state_error("Encoder is closed"));
            }
            if state.state == CodecState::Unconfigured {
                return Ok(());
            }
        }

        let promise_id = self.next_promise_id.fetch_add(1, Ordering::AcqRel);
        let (tx, rx) = oneshot::channel();
        tracing::debug!(promise_id, "flush requested");
        self.queue.push(EncoderMessage::Flush { responder: tx });

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(operation_error("Encoder was reset or closed during flush")),
        }
    }

    #[napi]
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Encoder is closed"));
        }
        self.queue.clear();
        self.queue.push(EncoderMessage::Reset);
        state.state = CodecState::Unconfigured;
        Ok(())
    }

    #[napi]
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        self.queue.seal();
        self.queue.force_push(EncoderMessage::Close);
        state.state = CodecState::Closed;
        self.output.close();
        self.error.close();
        Ok(())
    }

    #[napi]
    pub fn is_config_supported(config: VideoEncoderConfig) -> Result<VideoEncoderSupport> {
        let codec_string = config.codec.clone().unwrap_or_default();
        let supported = parse_codec_string(&codec_string)
            .and_then(|codec_id| {
                CodecContext::new_encoder(codec_id).map_err(|e| Error::new(Status::GenericFailure, e.to_string()))
            })
            .is_ok();

        Ok(VideoEncoderSupport { supported, config })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, FacadeState>> {
        self.state
            .lock()
            .map_err(|_| operation_error("Encoder state lock poisoned"))
    }
}

/// Parse WebCodecs codec string to FFmpeg codec ID
fn parse_codec_string(codec: &str) -> Result<AVCodecID> {
    let codec_lower = codec.to_lowercase();

    if codec_lower.starts_with("avc1") || codec_lower.starts_with("avc3") || codec_lower == "h264" {
        Ok(AVCodecID::H264)
    } else if codec_lower.starts_with("hev1") || codec_lower.starts_with("hvc1") || codec_lower == "h265" || codec_lower == "hevc" {
        Ok(AVCodecID::Hevc)
    } else if codec_lower == "vp8" {
        Ok(AVCodecID::Vp8)
    } else if codec_lower.starts_with("vp09") || codec_lower == "vp9" {
        Ok(AVCodecID::Vp9)
    } else if codec_lower.starts_with("av01") || codec_lower == "av1" {
        Ok(AVCodecID::Av1)
    } else {
        Err(not_supported_error(&format!("Unsupported codec: {}", codec)))
    }
}
