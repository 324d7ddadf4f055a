//! FFmpeg decoder backend and log level configuration.
//!
//! [`FfmpegDecoder`] implements [`FrameDecoder`] on top of
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next). Frames are converted
//! to RGB24 by `swscale`, and the picture type of each decoded frame is taken
//! from `av_get_picture_type_char`, which yields the same `I`/`P`/`B`/`?` tags
//! [`FrameType::from_tag`](crate::FrameType::from_tag) classifies.
//!
//! FFmpeg also prints its own diagnostics to stderr. Use
//! [`set_ffmpeg_log_level`] to quiet them; Rust-side messages go through the
//! [`log`](https://crates.io/crates/log) facade as usual.
//!
//! # Example
//!
//! ```no_run
//! use frame_compare::{FfmpegDecoderFactory, FfmpegLogLevel, VideoSource};
//!
//! frame_compare::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//!
//! let source = VideoSource::open("input.mp4", &FfmpegDecoderFactory)?;
//! println!("{} readable frames", source.total_frames());
//! # Ok::<(), frame_compare::FrameCompareError>(())
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::RgbImage;

use crate::decoder::{DecoderFactory, FrameDecoder};
use crate::error::FrameCompareError;
use crate::utilities::{
    frame_number_to_seek_target, frame_to_rgb_buffer, pts_to_frame_number, start_time_to_micros,
};

/// FFmpeg internal log verbosity level.
///
/// Setting a level makes FFmpeg drop every message below that severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Unrecoverable conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Set FFmpeg's own stderr verbosity. Does not affect `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Opens [`FfmpegDecoder`]s. This is the default [`DecoderFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegDecoderFactory;

impl DecoderFactory for FfmpegDecoderFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameDecoder>, FrameCompareError> {
        Ok(Box::new(FfmpegDecoder::open(path)?))
    }
}

/// A seekable, sequential frame reader for the best video stream of a file.
///
/// [`seek`](FrameDecoder::seek) jumps to the nearest keyframe before the
/// target and arms a skip so that the next [`read_next`](FrameDecoder::read_next)
/// decodes forward to the exact index. Subsequent reads continue from there
/// without seeking again.
pub struct FfmpegDecoder {
    path: PathBuf,
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    /// First timestamp of the stream, in `time_base` units.
    start_time: i64,
    /// `start_time` in microseconds, for seek targets.
    start_offset: i64,
    frames_per_second: f64,
    frame_count: u64,
    width: u32,
    height: u32,
    /// Index the next `read_next` call should return.
    cursor: u64,
    last_position: Option<u64>,
    current_tag: u8,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    eof_sent: bool,
}

// SAFETY: an FfmpegDecoder is owned by exactly one VideoSource and only ever
// driven from the sampling worker thread; the raw FFmpeg pointers it wraps
// are never shared.
unsafe impl Send for FfmpegDecoder {}

impl FfmpegDecoder {
    /// Open the best video stream of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameCompareError::FileOpen`] if FFmpeg cannot open the
    /// file, the file has no video stream, or no decoder is available.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameCompareError> {
        let path = path.as_ref().to_path_buf();
        let open_error = |reason: String| FrameCompareError::FileOpen {
            path: path.clone(),
            reason,
        };

        log::debug!("Opening decoder for {}", path.display());

        ffmpeg_next::init().map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| open_error("no video stream found".to_string()))?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        // MPEG-TS and some MP4 edits start well after zero.
        let start_time = Some(stream.start_time())
            .filter(|&start| start != ffmpeg_sys_next::AV_NOPTS_VALUE)
            .unwrap_or(0);
        let start_offset = start_time_to_micros(start_time, time_base);

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else if frames_per_second > 0.0 && input_context.duration() > 0 {
            let seconds = input_context.duration() as f64 / f64::from(ffmpeg_sys_next::AV_TIME_BASE);
            (seconds * frames_per_second).round() as u64
        } else {
            0
        };

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("failed to read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("failed to create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("failed to create scaler: {error}")))?;

        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, ~{} frames",
            path.display(),
            width,
            height,
            frames_per_second,
            frame_count,
        );

        Ok(Self {
            path,
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            start_time,
            start_offset,
            frames_per_second,
            frame_count,
            width,
            height,
            cursor: 0,
            last_position: None,
            current_tag: b'?',
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            eof_sent: false,
        })
    }

    /// Pull the next decoded frame into `decoded_frame`.
    ///
    /// Returns `Ok(false)` once the decoder is fully drained.
    fn receive_next(&mut self) -> Result<bool, FrameCompareError> {
        loop {
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => return Ok(true),
                Err(FfmpegError::Eof) => return Ok(false),
                Err(FfmpegError::Other { errno }) if errno == ffmpeg_sys_next::EAGAIN => {}
                Err(error) => return Err(error.into()),
            }

            if self.eof_sent {
                return Ok(false);
            }

            let mut packet = Packet::empty();
            loop {
                match packet.read(&mut self.input_context) {
                    Ok(()) if packet.stream() == self.video_stream_index => {
                        self.decoder.send_packet(&packet)?;
                        break;
                    }
                    Ok(()) => continue,
                    Err(FfmpegError::Eof) => {
                        self.decoder.send_eof()?;
                        self.eof_sent = true;
                        break;
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        }
    }

    fn decoded_frame_number(&self) -> u64 {
        self.decoded_frame
            .pts()
            .or_else(|| self.decoded_frame.timestamp())
            .map(|pts| pts_to_frame_number(pts, self.start_time, self.time_base, self.frames_per_second))
            .unwrap_or(self.cursor)
    }

    fn decoded_frame_type_tag(&self) -> u8 {
        // SAFETY: decoded_frame holds a valid AVFrame after a successful receive.
        unsafe {
            let picture_type = (*self.decoded_frame.as_ptr()).pict_type;
            ffmpeg_sys_next::av_get_picture_type_char(picture_type) as u8
        }
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn is_open(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn reported_frame_count(&self) -> u64 {
        self.frame_count
    }

    fn seek(&mut self, position: u64) -> Result<(), FrameCompareError> {
        if !self.is_open() || (self.frame_count > 0 && position >= self.frame_count) {
            return Err(FrameCompareError::FramePosition {
                path: self.path.clone(),
                position,
            });
        }

        let target = frame_number_to_seek_target(position, self.frames_per_second, self.start_offset);
        self.input_context
            .seek(target, ..target)
            .map_err(|_| FrameCompareError::FramePosition {
                path: self.path.clone(),
                position,
            })?;
        self.decoder.flush();
        self.eof_sent = false;
        self.cursor = position;
        self.last_position = None;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FrameCompareError> {
        if !self.is_open() {
            return Err(FrameCompareError::VideoCaptureFailed {
                path: self.path.clone(),
            });
        }

        loop {
            if !self.receive_next()? {
                return Ok(None);
            }

            let frame_number = self.decoded_frame_number();
            if frame_number < self.cursor {
                log::trace!("Skipping frame {frame_number} on the way to {}", self.cursor);
                continue;
            }
            if frame_number > self.cursor {
                log::debug!(
                    "{}: expected frame {}, decoder produced {frame_number}",
                    self.path.display(),
                    self.cursor,
                );
            }

            self.current_tag = self.decoded_frame_type_tag();
            self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;
            let buffer = frame_to_rgb_buffer(&self.rgb_frame, self.width, self.height);
            self.cursor = frame_number + 1;
            self.last_position = Some(frame_number);

            return RgbImage::from_raw(self.width, self.height, buffer)
                .map(Some)
                .ok_or_else(|| FrameCompareError::ImageRead {
                    path: self.path.clone(),
                    position: frame_number,
                });
        }
    }

    fn current_frame_type_tag(&self) -> u8 {
        self.current_tag
    }

    fn last_position(&self) -> Option<u64> {
        self.last_position
    }
}
