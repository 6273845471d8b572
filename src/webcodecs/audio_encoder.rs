//! AudioEncoder - WebCodecs API implementation
//!
//! Provides audio encoding functionality using FFmpeg. Encoding happens on a
//! dedicated worker thread per encoder instance (see `crate::core`); this
//! struct only ever touches the control queue and a small piece of shared
//! bookkeeping, never the codec context itself.
//! See: https://developer.mozilla.org/en-US/docs/Web/API/AudioEncoder

use crate::codec::{
    context::get_audio_encoder_name, AudioEncoderConfig as InternalAudioEncoderConfig,
    AudioSampleBuffer, CodecContext, Frame, Packet, Resampler,
};
use crate::core::{CodecWorker, ControlQueue, QueueState, SafeCallbackGateway, WorkerRole};
use crate::ffi::{AVCodecID, AVSampleFormat};
use crate::webcodecs::error::{invalid_state_error, not_supported_error, operation_error, quota_exceeded_error};
use crate::webcodecs::{AudioData, AudioEncoderConfig, AudioEncoderSupport, EncodedAudioChunk};
use napi::bindgen_prelude::*;
use napi::threadsafe_function::ThreadsafeFunction;
use napi_derive::napi;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::video_encoder::CodecState;

/// Output callback metadata for audio
#[napi(object)]
pub struct EncodedAudioChunkMetadata {
    /// Decoder configuration for this chunk
    pub decoder_config: Option<AudioDecoderConfigOutput>,
}

/// Decoder configuration output (for passing to decoder)
#[napi(object)]
pub struct AudioDecoderConfigOutput {
    /// Codec string
    pub codec: String,
    /// Sample rate
    pub sample_rate: Option<u32>,
    /// Number of channels
    pub number_of_channels: Option<u32>,
    /// Codec description (e.g., AudioSpecificConfig for AAC)
    pub description: Option<Buffer>,
}

/// Encode options for audio
#[napi(object)]
#[derive(Debug, Clone, Default)]
pub struct AudioEncoderEncodeOptions {
    // Currently no options defined in WebCodecs spec for audio
}

/// Host-side bookkeeping shared with the worker thread. `state` is flipped
/// to `Closed` on an unrecoverable worker-side error (§7).
struct FacadeState {
    state: CodecState,
}

/// Derived configuration the worker needs to build its encoder and
/// resampler. Resolved on the host side (where the napi-facing config
/// object lives) and handed across in one message.
struct ResolvedEncoderConfig {
    encoder_config: InternalAudioEncoderConfig,
    codec_string: String,
    target_format: AVSampleFormat,
}

/// One entry in the control-message FIFO between this façade and its
/// worker thread.
enum EncoderMessage {
    Configure {
        config: ResolvedEncoderConfig,
    },
    Encode {
        frame: Frame,
        timestamp: i64,
    },
    Flush {
        responder: oneshot::Sender<Result<()>>,
    },
    Reset,
    Close,
}

/// Runs on the dedicated worker thread; the sole owner of the
/// `CodecContext` for this encoder instance.
struct AudioEncoderWorker {
    context: Option<CodecContext>,
    resampler: Option<Resampler>,
    sample_buffer: Option<AudioSampleBuffer>,
    codec_string: String,
    target_sample_rate: u32,
    target_channels: u32,
    target_format: AVSampleFormat,
    frame_count: u64,
    extradata_sent: bool,
    output: SafeCallbackGateway<(EncodedAudioChunk, EncodedAudioChunkMetadata)>,
    error: SafeCallbackGateway<String>,
    dequeue: Option<SafeCallbackGateway<u32>>,
    state: Arc<Mutex<FacadeState>>,
}

impl AudioEncoderWorker {
    fn handle_configure(&mut self, config: ResolvedEncoderConfig) {
        self.context = None;
        self.resampler = None;
        self.sample_buffer = None;

        let codec_id = match parse_audio_codec_string(&config.codec_string) {
            Ok(id) => id,
            Err(e) => return self.fail(e.reason),
        };

        let encoder_name = get_audio_encoder_name(codec_id);
        let context_result = if let Some(name) = encoder_name {
            CodecContext::new_encoder_by_name(name).or_else(|_| CodecContext::new_encoder(codec_id))
        } else {
            CodecContext::new_encoder(codec_id)
        };
        let mut context = match context_result {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(format!("Failed to create encoder: {e}")),
        };

        if let Err(e) = context.configure_audio_encoder(&config.encoder_config) {
            return self.fail(format!("Failed to configure encoder: {e}"));
        }
        if let Err(e) = context.open() {
            return self.fail(format!("Failed to open encoder: {e}"));
        }

        let frame_size = context.frame_size();
        let frame_size = if frame_size == 0 {
            AudioSampleBuffer::frame_size_for_codec(&config.codec_string)
        } else {
            frame_size as usize
        };

        self.sample_buffer = Some(AudioSampleBuffer::new(
            frame_size,
            config.encoder_config.channels,
            config.encoder_config.sample_rate,
            config.target_format,
        ));
        self.target_sample_rate = config.encoder_config.sample_rate;
        self.target_channels = config.encoder_config.channels;
        self.target_format = config.target_format;
        self.codec_string = config.codec_string;
        self.context = Some(context);
        self.frame_count = 0;
        self.extradata_sent = false;
    }

    fn handle_encode(&mut self, frame: Frame, timestamp: i64) {
        if self.sample_buffer.is_none() {
            return self.fail("Encode called with no active encoder context".into());
        }

        let src_format = frame.sample_format();
        let src_channels = frame.channels();
        let src_sample_rate = frame.sample_rate();

        let needs_resampling = src_sample_rate != self.target_sample_rate
            || src_channels != self.target_channels
            || src_format != self.target_format;

        if needs_resampling && self.resampler.is_none() {
            match Resampler::new(
                src_channels,
                src_sample_rate,
                src_format,
                self.target_channels,
                self.target_sample_rate,
                self.target_format,
            ) {
                Ok(resampler) => self.resampler = Some(resampler),
                Err(e) => return self.fail(format!("Failed to create resampler: {e}")),
            }
        }

        let frame_to_add = if let Some(resampler) = self.resampler.as_mut() {
            match resampler.convert_alloc(&frame) {
                Ok(f) => f,
                Err(e) => return self.fail(format!("Resampling failed: {e}")),
            }
        } else {
            frame
        };

        let Some(sample_buffer) = self.sample_buffer.as_mut() else {
            return self.fail("No sample buffer".into());
        };
        if let Err(e) = sample_buffer.add_frame(&frame_to_add) {
            return self.fail(format!("Failed to add samples: {e}"));
        }

        let mut extradata = if !self.extradata_sent {
            self.context.as_ref().and_then(|ctx| ctx.extradata().map(|d| d.to_vec()))
        } else {
            None
        };

        loop {
            let (has_frame, frame_size, sample_rate) = match self.sample_buffer.as_ref() {
                Some(buf) => (buf.has_full_frame(), buf.frame_size() as i64, buf.sample_rate() as i64),
                None => break,
            };
            if !has_frame {
                break;
            }

            let mut frame_to_encode = {
                let Some(buf) = self.sample_buffer.as_mut() else { break };
                match buf.take_frame() {
                    Ok(Some(f)) => f,
                    Ok(None) => break,
                    Err(e) => return self.fail(format!("Failed to get frame: {e}")),
                }
            };

            let frame_timestamp = if self.frame_count == 0 {
                timestamp
            } else {
                timestamp + (self.frame_count as i64 * frame_size * 1_000_000) / sample_rate
            };
            frame_to_encode.set_pts(frame_timestamp);

            let Some(context) = self.context.as_mut() else {
                return self.fail("No encoder context".into());
            };

            let packets = match context.encode(Some(&frame_to_encode)) {
                Ok(pkts) => pkts,
                Err(e) => return self.fail(format!("Encode failed: {e}")),
            };

            self.frame_count += 1;
            let duration_us = (frame_size * 1_000_000) / sample_rate;

            for packet in packets {
                self.emit_chunk(&packet, Some(duration_us), extradata.take());
            }
        }
    }

    fn emit_chunk(&mut self, packet: &Packet, duration_us: Option<i64>, extradata: Option<Vec<u8>>) {
        let chunk = EncodedAudioChunk::from_packet(packet, duration_us, None);

        let metadata = if !self.extradata_sent {
            self.extradata_sent = true;
            EncodedAudioChunkMetadata {
                decoder_config: Some(AudioDecoderConfigOutput {
                    codec: self.codec_string.clone(),
                    sample_rate: Some(self.target_sample_rate),
                    number_of_channels: Some(self.target_channels),
                    description: extradata.map(Buffer::from),
                }),
            }
        } else {
            EncodedAudioChunkMetadata { decoder_config: None }
        };

        self.output.call(Ok((chunk, metadata)));
    }

    fn handle_flush(&mut self, responder: oneshot::Sender<Result<()>>) {
        let result = self.drain_flush();
        let _ = responder.send(result);
    }

    fn drain_flush(&mut self) -> Result<()> {
        if let Some(sample_buffer) = self.sample_buffer.as_mut() {
            if let Ok(Some(mut frame)) = sample_buffer.flush() {
                let frame_size = sample_buffer.frame_size() as i64;
                let sample_rate = sample_buffer.sample_rate() as i64;
                let frame_timestamp = (self.frame_count as i64 * frame_size * 1_000_000) / sample_rate;
                frame.set_pts(frame_timestamp);

                if let Some(context) = self.context.as_mut() {
                    if let Ok(packets) = context.encode(Some(&frame)) {
                        let duration_us = (frame.nb_samples() as i64 * 1_000_000) / sample_rate;
                        for packet in packets {
                            self.emit_chunk(&packet, Some(duration_us), None);
                        }
                    }
                }
            }
        }

        let Some(context) = self.context.as_mut() else {
            return Ok(());
        };

        let packets = context
            .flush_encoder()
            .map_err(|e| operation_error(&format!("Flush failed: {e}")))?;
        for packet in packets {
            self.emit_chunk(&packet, None, None);
        }
        Ok(())
    }

    fn handle_reset(&mut self) {
        self.context = None;
        self.resampler = None;
        self.sample_buffer = None;
        self.frame_count = 0;
        self.extradata_sent = false;
    }

    fn fail(&mut self, message: String) {
        self.error.call(Ok(message));
        if let Ok(mut state) = self.state.lock() {
            state.state = CodecState::Closed;
        }
    }
}

impl WorkerRole for AudioEncoderWorker {
    type Message = EncoderMessage;

    fn handle_message(&mut self, message: EncoderMessage, queue_depth: usize) -> bool {
        match message {
            EncoderMessage::Configure { config } => {
                self.handle_configure(config);
                true
            }
            EncoderMessage::Encode { frame, timestamp } => {
                self.handle_encode(frame, timestamp);
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

/// AudioEncoder - WebCodecs-compliant audio encoder.
///
/// `encode`/`configure`/`reset` enqueue a control message and return
/// immediately without touching the codec; `flush` returns a future settled
/// once the worker has drained the encoder.
#[napi]
pub struct AudioEncoder {
    queue: ControlQueue<EncoderMessage>,
    worker: Mutex<CodecWorker>,
    state: Arc<Mutex<FacadeState>>,
    output: SafeCallbackGateway<(EncodedAudioChunk, EncodedAudioChunkMetadata)>,
    error: SafeCallbackGateway<String>,
    next_promise_id: AtomicU64,
}

#[napi]
impl AudioEncoder {
    /// Create a new AudioEncoder. `output` is invoked with each encoded
    /// chunk and its metadata; `error` is invoked with a message and the
    /// encoder transitions to `closed` whenever the worker hits an
    /// unrecoverable encode failure. `dequeue`, if given, is invoked with
    /// the new queue depth whenever `encodeQueueSize` falls back below the
    /// saturation threshold.
    #[napi(constructor)]
    pub fn new(
        output: ThreadsafeFunction<(EncodedAudioChunk, EncodedAudioChunkMetadata)>,
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
        let role = AudioEncoderWorker {
            context: None,
            resampler: None,
            sample_buffer: None,
            codec_string: String::new(),
            target_sample_rate: 48_000,
            target_channels: 2,
            target_format: AVSampleFormat::Fltp,
            frame_count: 0,
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
    /// worker — the *input* queue (not pending outputs).
    #[napi(getter)]
    pub fn encode_queue_size(&self) -> Result<u32> {
        Ok(self.queue.depth() as u32)
    }

    #[napi(getter)]
    pub fn codec_saturated(&self) -> Result<bool> {
        Ok(self.queue.state() != QueueState::Open)
    }

    #[napi]
    pub fn configure(&self, config: AudioEncoderConfig) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.state == CodecState::Closed {
            return Err(invalid_state_error("Encoder is closed"));
        }

        let codec_string = config
            .codec
            .clone()
            .ok_or_else(|| Error::new(Status::InvalidArg, "codec is required"))?;
        let codec_id = parse_audio_codec_string(&codec_string)?;
        let target_format = get_encoder_sample_format(codec_id);

        let sample_rate = config.sample_rate.unwrap_or(48_000.0) as u32;
        let channels = config.number_of_channels.unwrap_or(2);

        let resolved = ResolvedEncoderConfig {
            encoder_config: InternalAudioEncoderConfig {
                sample_rate,
                channels,
                sample_format: target_format,
                bitrate: config.bitrate.unwrap_or(128_000.0) as u64,
                thread_count: 0,
            },
            codec_string,
            target_format,
        };

        self.queue.push(EncoderMessage::Configure { config: resolved });
        state.state = CodecState::Configured;
        Ok(())
    }

    #[napi]
    pub fn encode(&self, data: &AudioData) -> Result<()> {
        let state = self.lock_state()?;
        if state.state != CodecState::Configured {
            return Err(invalid_state_error("Encoder is not configured"));
        }
        if self.queue.state() == QueueState::Full {
            return Err(quota_exceeded_error(
                "encodeQueueSize is at its hard limit; wait for a dequeue before encoding more",
            ));
        }

        let timestamp = data.timestamp()?;
        let frame = data
            .with_frame(|f| f.try_clone())?
            .map_err(|e| Error::new(Status::GenericFailure, format!("Failed to clone frame: {e}")))?;

        self.queue.push(EncoderMessage::Encode { frame, timestamp });
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
    pub async fn is_config_supported(config: AudioEncoderConfig) -> Result<AudioEncoderSupport> {
        let codec_id = match config
            .codec
            .as_deref()
            .ok_or(())
            .and_then(|c| parse_audio_codec_string(c).map_err(|_| ()))
        {
            Ok(id) => id,
            Err(_) => {
                return Ok(AudioEncoderSupport { supported: false, config });
            }
        };

        let encoder_name = get_audio_encoder_name(codec_id);
        let result = if let Some(name) = encoder_name {
            CodecContext::new_encoder_by_name(name).or_else(|_| CodecContext::new_encoder(codec_id))
        } else {
            CodecContext::new_encoder(codec_id)
        };

        Ok(AudioEncoderSupport {
            supported: result.is_ok(),
            config,
        })
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, FacadeState>> {
        self.state
            .lock()
            .map_err(|_| operation_error("Encoder state lock poisoned"))
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

/// Get the preferred sample format for an encoder
fn get_encoder_sample_format(codec_id: AVCodecID) -> AVSampleFormat {
    match codec_id {
        AVCodecID::Aac => AVSampleFormat::Fltp,
        AVCodecID::Opus => AVSampleFormat::Flt,
        AVCodecID::Mp3 => AVSampleFormat::S16p,
        AVCodecID::Flac => AVSampleFormat::S16,
        AVCodecID::Vorbis => AVSampleFormat::Fltp,
        AVCodecID::PcmS16le => AVSampleFormat::S16,
        AVCodecID::PcmS16be => AVSampleFormat::S16,
        AVCodecID::PcmF32le => AVSampleFormat::Flt,
        AVCodecID::PcmF32be => AVSampleFormat::Flt,
        _ => AVSampleFormat::Fltp,
    }
}
