//! AudioDecoder - WebCodecs API implementation
//!
//! Provides audio decoding functionality using FFmpeg. Decoding happens on
//! a dedicated worker thread per decoder instance (see `crate::core`); this
//! struct only ever touches the control queue and a small piece of shared
//! bookkeeping, never the codec context itself.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/AudioDecoder

use crate::codec::{AudioDecoderConfig as InternalAudioDecoderConfig, CodecContext, Frame, Packet};
use crate::core::{CodecWorker, ControlQueue, QueueState, SafeCallbackGateway, WorkerRole};
use crate::ffi::AVCodecID;
use crate::webcodecs::error::{
    data_error, invalid_state_error, not_supported_error, operation_error, quota_exceeded_error,
};
use crate::webcodecs::{AudioData, AudioDecoderConfig, AudioDecoderSupport, EncodedAudioChunk};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::ThreadsafeFunction;
use napi_derive::napi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::video_encoder::CodecState;

/// Host-side bookkeeping shared with the worker thread: `state` is flipped
/// to `Closed` on an unrecoverable worker-side error (§7), and
/// `awaiting_key_chunk` enforces that the first `decode()` after
/// `configure`/`flush`/`reset` carries a key chunk.
struct FacadeState {
    state: CodecState,
    awaiting_key_chunk: bool,
}

/// One entry in the control-message FIFO between this façade and its
/// worker thread.
enum DecoderMessage {
    Configure {
        config: InternalAudioDecoderConfig,
    },
    Decode {
        data: Vec<u8>,
        timestamp: i64,
    },
    Flush {
        responder: oneshot::Sender<Result<()>>,
    },
    Reset,
    Close,
}

/// Runs on the dedicated worker thread; the sole owner of the
/// `CodecContext` for this decoder instance.
struct AudioDecoderWorker {
    context: Option<CodecContext>,
    output: SafeCallbackGateway<AudioData>,
    error: SafeCallbackGateway<String>,
    dequeue: Option<SafeCallbackGateway<u32>>,
    state: Arc<Mutex<FacadeState>>,
}

impl AudioDecoderWorker {
    fn handle_configure(&mut self, config: InternalAudioDecoderConfig) {
        self.context = None;
        let mut context = match CodecContext::new_decoder(config.codec_id) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(format!("Failed to create decoder: {e}")),
        };
        if let Err(e) = context.configure_audio_decoder(&config) {
            return self.fail(format!("Failed to configure decoder: {e}"));
        }
        if let Err(e) = context.open() {
            return self.fail(format!("Failed to open decoder: {e}"));
        }
        self.context = Some(context);
    }

    fn handle_decode(&mut self, data: Vec<u8>, timestamp: i64) {
        let Some(context) = self.context.as_mut() else {
            return self.fail("Decode called with no active decoder context".into());
        };
        match decode_audio_chunk_data(context, &data, timestamp) {
            Ok(frames) => {
                for frame in frames {
                    let pts = frame.pts();
                    let audio_data = AudioData::from_internal(frame, pts);
                    self.output.call(Ok(audio_data));
                }
            }
            Err(e) => self.fail(format!("Decode failed: {e}")),
        }
    }

    fn handle_flush(&mut self, responder: oneshot::Sender<Result<()>>) {
        let result = match self.context.as_mut() {
            Some(context) => match context.flush_decoder() {
                Ok(frames) => {
                    for frame in frames {
                        let pts = frame.pts();
                        let audio_data = AudioData::from_internal(frame, pts);
                        self.output.call(Ok(audio_data));
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

impl WorkerRole for AudioDecoderWorker {
    type Message = DecoderMessage;

    fn handle_message(&mut self, message: DecoderMessage, queue_depth: usize) -> bool {
        match message {
            DecoderMessage::Configure { config } => {
                self.handle_configure(config);
                true
            }
            DecoderMessage::Decode { data, timestamp } => {
                self.handle_decode(data, timestamp);
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

/// AudioDecoder - WebCodecs-compliant audio decoder.
///
/// `decode`/`configure`/`reset` enqueue a control message and return
/// immediately without touching the codec; `flush` returns a future settled
/// once the worker has drained the decoder.
#[napi]
pub struct AudioDecoder {
    queue: ControlQueue<DecoderMessage>,
    worker: Mutex<CodecWorker>,
    state: Arc<Mutex<FacadeState>>,
    output: SafeCallbackGateway<AudioData>,
    error: SafeCallbackGateway<String>,
    next_promise_id: AtomicU64,
}

#[napi]
impl AudioDecoder {
    /// Create a new AudioDecoder. `output` is invoked with each decoded
    /// `AudioData`; `error` is invoked with a message and the decoder
    /// transitions to `closed` whenever the worker hits an unrecoverable
    /// decode failure. `dequeue`, if given, is invoked with the new queue
    /// depth whenever `decodeQueueSize` falls back below the saturation
    /// threshold.
    #[napi(constructor)]
    pub fn new(
        output: ThreadsafeFunction<AudioData>,
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
        let role = AudioDecoderWorker {
            context: None,
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
    /// worker — the *input* queue (not pending outputs).
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
    pub fn configure(&self, config: AudioDecoderConfig) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Decoder is closed"));
        }

        let codec_string = config
            .codec
            .as_deref()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;
        let codec_id = parse_audio_codec_string(codec_string)?;

        let decoder_config = InternalAudioDecoderConfig {
            codec_id,
            sample_rate: config.sample_rate.unwrap_or(0.0) as u32,
            channels: config.number_of_channels.unwrap_or(0),
            thread_count: 0,
            extradata: config.description.as_ref().map(|d| d.to_vec()),
        };

        self.queue.push(DecoderMessage::Configure {
            config: decoder_config,
        });

        state.state = CodecState::Configured;
        state.awaiting_key_chunk = true;
        Ok(())
    }

    #[napi]
    pub fn decode(&self, chunk: &EncodedAudioChunk) -> Result<()> {
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

        let data = chunk.get_data_vec()?;
        let timestamp = chunk.get_timestamp()?;

        self.queue.push(DecoderMessage::Decode { data, timestamp });
        state.awaiting_key_chunk = false;
        Ok(())
    }

    /// Flush all pending decode work. Settles once the worker has drained
    /// the decoder and emitted any trailing audio data.
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
        self.output.close();
        self.error.close();
        Ok(())
    }

    #[napi]
    pub async fn is_config_supported(config: AudioDecoderConfig) -> Result<AudioDecoderSupport> {
        let codec_id = match config
            .codec
            .as_deref()
            .ok_or(())
            .and_then(|c| parse_audio_codec_string(c).map_err(|_| ()))
        {
            Ok(id) => id,
            Err(_) => {
                return Ok(AudioDecoderSupport {
                    supported: false,
                    config,
                });
            }
        };

        let result = CodecContext::new_decoder(codec_id);

        Ok(AudioDecoderSupport {
            supported: result.is_ok(),
            config,
        })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, FacadeState>> {
        self.state
            .lock()
            .map_err(|_| operation_error("Decoder state lock poisoned"))
    }
}

/// Parse WebCodecs audio codec string to FFmpeg codec ID
fn parse_audio_codec_string(codec: &str) -> Result<AVCodecID> {
    let codec_lower = codec.to_lowercase();

    if codec_lower.starts_with("mp4a.40") || codec_lower == "aac" {
        return Ok(AVCodecID::Aac);
    }
    if codec_lower == "opus" {
        return Ok(AVCodecID::Opus);
    }
    if codec_lower == "mp3" || codec_lower == "mp4a.6b" {
        return Ok(AVCodecID::Mp3);
    }
    if codec_lower == "flac" {
        return Ok(AVCodecID::Flac);
    }
    if codec_lower == "vorbis" {
        return Ok(AVCodecID::Vorbis);
    }
    if codec_lower == "pcm-s16" || codec_lower == "pcm_s16le" {
        return Ok(AVCodecID::PcmS16le);
    }
    if codec_lower == "pcm-f32" || codec_lower == "pcm_f32le" {
        return Ok(AVCodecID::PcmF32le);
    }

    Err(not_supported_error(&format!("Unsupported audio codec: {}", codec)))
}

/// Decode audio chunk data using FFmpeg
fn decode_audio_chunk_data(
    context: &mut CodecContext,
    data: &[u8],
    timestamp: i64,
) -> Result<Vec<Frame>> {
    let mut packet = Packet::new().map_err(|e| {
        Error::new(Status::GenericFailure, format!("Failed to create packet: {}", e))
    })?;

    packet.set_pts(timestamp);
    packet.set_dts(timestamp);

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
