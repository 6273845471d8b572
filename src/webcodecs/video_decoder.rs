//! VideoDecoder - WebCodecs API implementation
//!
//! Provides video decoding functionality using FFmpeg. Decoding happens on
//! a dedicated worker thread per decoder instance (see `crate::core`); this
//! struct only ever touches the control queue and a small piece of shared
//! bookkeeping, never the codec context itself.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/VideoDecoder

use crate::codec::{CodecContext, DecoderConfig, Frame, Packet};
use crate::core::{CodecWorker, ControlQueue, QueueState, SafeCallbackGateway, WorkerRole};
use crate::ffi::{AVCodecID, AVHWDeviceType};
use crate::webcodecs::error::{data_error, invalid_state_error, not_supported_error, operation_error, quota_exceeded_error};
use crate::webcodecs::{CodecState, EncodedVideoChunk, HardwareAcceleration, VideoDecoderConfig, VideoFrame};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::ThreadsafeFunction;
use napi_derive::napi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Result of isConfigSupported
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VideoDecoderSupport {
    /// Whether the configuration is supported
    pub supported: bool,
    /// The configuration that was checked (codec only for simplicity)
    pub codec: String,
}

/// Host-side bookkeeping touched from both threads: `state` is flipped to
/// `Closed` by the worker on an unrecoverable decode error (§7), and
/// `awaiting_key_chunk` enforces that the first `decode()` call after
/// `configure`/`flush`/`reset` carries a key chunk. Both live behind one
/// small lock rather than the old model's single big mutex around the
/// codec itself — the codec context is never reachable from here.
struct FacadeState {
    state: CodecState,
    awaiting_key_chunk: bool,
}

/// One entry in the control-message FIFO between this façade and its
/// worker thread. Each variant owns its payload.
enum DecoderMessage {
    Configure {
        config: DecoderConfig,
        hw_type: Option<AVHWDeviceType>,
        codec_id: AVCodecID,
        display_aspect: Option<(u32, u32)>,
        rotation: f64,
        flip: bool,
    },
    Decode {
        data: Vec<u8>,
        timestamp: i64,
        duration: Option<i64>,
    },
    Flush {
        responder: oneshot::Sender<Result<()>>,
    },
    Reset,
    Close,
}

/// Runs on the dedicated worker thread; the sole owner of the
/// `CodecContext` for this decoder instance.
struct VideoDecoderWorker {
    context: Option<CodecContext>,
    rotation: f64,
    flip: bool,
    output: SafeCallbackGateway<VideoFrame>,
    error: SafeCallbackGateway<String>,
    dequeue: Option<SafeCallbackGateway<u32>>,
    state: Arc<Mutex<FacadeState>>,
}

impl VideoDecoderWorker {
    fn handle_configure(
        &mut self,
        config: DecoderConfig,
        hw_type: Option<AVHWDeviceType>,
        codec_id: AVCodecID,
        _display_aspect: Option<(u32, u32)>,
        rotation: f64,
        flip: bool,
    ) {
        self.context = None;
        let mut context = match CodecContext::new_decoder_with_hw(codec_id, hw_type) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(format!("Failed to create decoder: {e}")),
        };
        if let Err(e) = context.configure_decoder(&config) {
            return self.fail(format!("Failed to configure decoder: {e}"));
        }
        if let Err(e) = context.open() {
            return self.fail(format!("Failed to open decoder: {e}"));
        }
        self.context = Some(context);
        self.rotation = rotation;
        self.flip = flip;
    }

    fn handle_decode(&mut self, data: Vec<u8>, timestamp: i64, duration: Option<i64>) {
        let Some(context) = self.context.as_mut() else {
            return self.fail("Decode called with no active decoder context".into());
        };
        match decode_chunk_data(context, &data, timestamp, duration) {
            Ok(frames) => {
                let rotation = self.rotation;
                let flip = self.flip;
                for frame in frames {
                    let video_frame =
                        VideoFrame::from_internal_with_orientation(frame, timestamp, duration, rotation, flip);
                    self.output.call(Ok(video_frame));
                }
            }
            Err(e) => self.fail(format!("Decode failed: {e}")),
        }
    }

    fn handle_flush(&mut self, responder: oneshot::Sender<Result<()>>) {
        let result = match self.context.as_mut() {
            Some(context) => match context.flush_decoder() {
                Ok(frames) => {
                    let rotation = self.rotation;
                    let flip = self.flip;
                    for frame in frames {
                        let pts = frame.pts();
                        let duration = if frame.duration() > 0 {
                            Some(frame.duration())
                        } else {
                            None
                        };
                        let video_frame =
                            VideoFrame::from_internal_with_orientation(frame, pts, duration, rotation, flip);
                        self.output.call(Ok(video_frame));
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

    fn handle_reset(&mut self) {
        self.context = None;
    }

    fn fail(&mut self, message: String) {
        self.error.call(Ok(message));
        if let Ok(mut state) = self.state.lock() {
            state.state = CodecState::Closed;
        }
    }
}

impl WorkerRole for VideoDecoderWorker {
    type Message = DecoderMessage;

    fn handle_message(&mut self, message: DecoderMessage, queue_depth: usize) -> bool {
        match message {
            DecoderMessage::Configure {
                config,
                hw_type,
                codec_id,
                display_aspect,
                rotation,
                flip,
            } => {
                self.handle_configure(config, hw_type, codec_id, display_aspect, rotation, flip);
                true
            }
            DecoderMessage::Decode {
                data,
                timestamp,
                duration,
            } => {
                self.handle_decode(data, timestamp, duration);
                // queue_depth is the depth immediately *after* this message
                // was popped; +1 recovers the depth right before, so this
                // tells us whether the dequeue just crossed back below the
                // soft threshold (§4.2.3 step 3, §4.3 queue accounting).
                if queue_depth + 1 >= crate::core::SOFT_QUEUE_THRESHOLD
                    && queue_depth < crate::core::SOFT_QUEUE_THRESHOLD
                {
                    if let Some(dequeue) = &self.dequeue {
                        dequeue.call(Ok(queue_depth as u32));
                    }
                }
                true
            }
            DecoderMessage::Flush { responder } => {
                self.handle_flush(responder);
                true
            }
            DecoderMessage::Reset => {
                self.handle_reset();
                true
            }
            DecoderMessage::Close => {
                self.handle_reset();
                false
            }
        }
    }
}

/// VideoDecoder - WebCodecs-compliant video decoder.
///
/// `decode`/`configure`/`reset` enqueue a control message and return
/// immediately without touching the codec; `flush` returns a future
/// settled once the worker has drained the decoder.
#[napi]
pub struct VideoDecoder {
    queue: ControlQueue<DecoderMessage>,
    worker: Mutex<CodecWorker>,
    state: Arc<Mutex<FacadeState>>,
    output: SafeCallbackGateway<VideoFrame>,
    error: SafeCallbackGateway<String>,
    next_promise_id: AtomicU64,
}

#[napi]
impl VideoDecoder {
    /// Create a new VideoDecoder. `output` is invoked with each decoded
    /// `VideoFrame`; `error` is invoked with a message and the decoder
    /// transitions to `closed` whenever the worker hits an unrecoverable
    /// decode failure. `dequeue`, if given, is invoked with the new queue
    /// depth whenever `decodeQueueSize` falls back below the saturation
    /// threshold (the closest napi equivalent of the spec's `dequeue`
    /// event, since this class isn't a DOM `EventTarget`).
    #[napi(constructor)]
    pub fn new(
        output: ThreadsafeFunction<VideoFrame>,
        error: ThreadsafeFunction<String>,
        dequeue: Option<ThreadsafeFunction<u32>>,
    ) -> Result<Self> {
        let output_gateway = SafeCallbackGateway::new(output);
        let error_gateway = SafeCallbackGateway::new(error);
        let dequeue_gateway = dequeue.map(SafeCallbackGateway::new);

        let state = Arc::new(Mutex::new(FacadeState {
            state: CodecState::Unconfigured,
            awaiting_key_chunk: true,
        }));

        let (queue, consumer) = ControlQueue::new();
        let role = VideoDecoderWorker {
            context: None,
            rotation: 0.0,
            flip: false,
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

    /// Number of `decode()` calls enqueued but not yet processed by the
    /// worker — the *input* queue, per §4.3 (not pending outputs).
    #[napi(getter)]
    pub fn decode_queue_size(&self) -> Result<u32> {
        Ok(self.queue.depth() as u32)
    }

    /// Whether the control queue is at or above the soft saturation
    /// threshold.
    #[napi(getter)]
    pub fn codec_saturated(&self) -> Result<bool> {
        Ok(self.queue.state() != QueueState::Open)
    }

    #[napi]
    pub fn configure(&self, config: VideoDecoderConfig) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Decoder is closed"));
        }

        let codec_string = config
            .codec
            .as_deref()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;
        let codec_id = parse_codec_string(codec_string)?;

        let hw_type = config.hardware_acceleration.as_ref().and_then(|ha| match ha {
            HardwareAcceleration::PreferHardware => Some(crate::ffi::hwaccel::PREFERRED_HW_DEVICE),
            _ => None,
        });

        let decoder_config = DecoderConfig {
            codec_id,
            thread_count: 0,
            extradata: config.description.as_ref().map(|d| d.to_vec()),
        };
        let display_aspect = match (config.display_aspect_width, config.display_aspect_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        };
        let rotation = config.rotation.unwrap_or(0.0);
        let flip = config.flip.unwrap_or(false);

        self.queue.push(DecoderMessage::Configure {
            config: decoder_config,
            hw_type,
            codec_id,
            display_aspect,
            rotation,
            flip,
        });

        state.state = CodecState::Configured;
        state.awaiting_key_chunk = true;
        Ok(())
    }

    #[napi]
    pub fn decode(&self, chunk: &EncodedVideoChunk) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state != CodecState::Configured {
            return Err(invalid_state_error("Decoder is not configured"));
        }

        let is_key = chunk.is_key();
        if state.awaiting_key_chunk && !is_key {
            return Err(data_error(
                "The first chunk decoded after configure/flush/reset must be a key chunk",
            ));
        }

        if self.queue.state() == QueueState::Full {
            return Err(quota_exceeded_error(
                "decodeQueueSize is at its hard limit; wait for a dequeue before decoding more",
            ));
        }

        let data = chunk
            .get_data_optional(|d| d.to_vec())
            .ok_or_else(|| data_error("Could not read chunk data"))?;
        let timestamp = chunk.timestamp()?;
        let duration = chunk.duration()?;

        self.queue.push(DecoderMessage::Decode {
            data,
            timestamp,
            duration,
        });
        state.awaiting_key_chunk = false;
        Ok(())
    }

    /// Flush all pending decode work. Settles once the worker has drained
    /// the decoder and emitted any trailing frames (§4.2.4, §4.3).
    #[napi]
    pub async fn flush(&self) -> Result<()> {
        {
            let mut state = self.lock_state()?;
            if state.state == CodecState::Closed {
                return Err(invalid_state_error("Decoder is closed"));
            }
            if state.state == CodecState::Unconfigured {
                return Ok(());
            }
            state.awaiting_key_chunk = true;
        }

        let promise_id = self.next_promise_id.fetch_add(1, Ordering::AcqRel);
        let (tx, rx) = oneshot::channel();
        tracing::debug!(promise_id, "flush requested");
        self.queue.push(DecoderMessage::Flush { responder: tx });

        match rx.await {
            Ok(result) => result,
            // Reset/Close raced ahead of this Flush and the worker exited
            // (or cleared the queue) without ever reaching it. Settle the
            // promise as a rejection — per §4.6, orphaning a flush this
            // way is accepted, but "orphaned" here means rejected, not
            // left hanging forever.
            Err(_) => Err(operation_error("Decoder was reset or closed during flush")),
        }
    }

    #[napi]
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Decoder is closed"));
        }
        self.queue.clear();
        self.queue.push(DecoderMessage::Reset);
        state.state = CodecState::Unconfigured;
        state.awaiting_key_chunk = true;
        Ok(())
    }

    #[napi]
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        self.queue.seal();
        self.queue.force_push(DecoderMessage::Close);
        state.state = CodecState::Closed;
        // Unregister callback delivery before the worker thread tears down
        // the codec context, so a racing in-flight `call()` can't reach a
        // host `Env` that's gone by the time it runs (§4.6).
        self.output.close();
        self.error.close();
        Ok(())
    }

    #[napi]
    pub fn is_config_supported(config: VideoDecoderConfig) -> Result<VideoDecoderSupport> {
        let codec_string = config.codec.clone().unwrap_or_default();
        let supported = parse_codec_string(&codec_string)
            .and_then(|codec_id| {
                CodecContext::new_decoder(codec_id)
                    .map_err(|e| Error::new(Status::GenericFailure, e.to_string()))
            })
            .is_ok();

        Ok(VideoDecoderSupport {
            supported,
            codec: codec_string,
        })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, FacadeState>> {
        self.state
            .lock()
            .map_err(|_| operation_error("Decoder state lock poisoned"))
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

/// Decode chunk data using FFmpeg
fn decode_chunk_data(
    context: &mut CodecContext,
    data: &[u8],
    timestamp: i64,
    duration: Option<i64>,
) -> Result<Vec<Frame>> {
    let mut packet = Packet::new().map_err(|e| {
        Error::new(Status::GenericFailure, format!("Failed to create packet: {}", e))
    })?;

    packet.set_pts(timestamp);
    packet.set_dts(timestamp);
    if let Some(dur) = duration {
        packet.set_duration(dur);
    }

    unsafe {
        use crate::ffi::avcodec::av_new_packet;

        let ret = av_new_packet(packet.as_mut_ptr(), data.len() as i32);
        if ret < 0 {
            return Err(Error::new(
                Status::GenericFailure,
                format!("Failed to allocate packet data: {}", ret),
            ));
        }

        let pkt_data = packet.data() as *mut u8;
        std::ptr::copy_nonoverlapping(data.as_ptr(), pkt_data, data.len());
    }

    context.decode(Some(&packet)).map_err(|e| {
        Error::new(Status::GenericFailure, format!("Decode failed: {}", e))
    })
}
