//! Internal FFmpeg helpers.
//!
//! Pixel-data copying and frame-number/timestamp conversion shared by the
//! FFmpeg decoder backend.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Microseconds per second; the unit `avformat_seek_file` expects when no
/// stream index is given.
const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Copy pixel data from an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg rows frequently carry padding (stride > width × 3). The padding is
/// stripped so the result can be handed to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_length = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_length {
        return data[..row_length * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_length * (height as usize));
    for row in 0..(height as usize) {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_length]);
    }
    buffer
}

/// Convert a frame index to a container-level seek target in microseconds.
///
/// `start_offset` is the stream's start time in microseconds. Frame 0 is the
/// first frame of the stream, not timestamp zero.
pub(crate) fn frame_number_to_seek_target(frame_number: u64, frames_per_second: f64, start_offset: i64) -> i64 {
    if frames_per_second <= 0.0 {
        return start_offset;
    }
    start_offset + (frame_number as f64 / frames_per_second * MICROSECONDS_PER_SECOND) as i64
}

/// A stream start time in its time base, as microseconds.
pub(crate) fn start_time_to_micros(start_time: i64, time_base: Rational) -> i64 {
    let denominator = time_base.denominator().max(1) as f64;
    (start_time as f64 * time_base.numerator() as f64 / denominator * MICROSECONDS_PER_SECOND) as i64
}

/// Rescale a PTS value in the stream's time base to a frame index counted
/// from `start_time`, the stream's first timestamp.
///
/// Rounds to the nearest frame so that timestamps stored with a little
/// jitter do not land on the previous index.
pub(crate) fn pts_to_frame_number(pts: i64, start_time: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let denominator = time_base.denominator().max(1) as f64;
    let seconds = pts.saturating_sub(start_time) as f64 * time_base.numerator() as f64 / denominator;
    (seconds * frames_per_second).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::Rational;

    use super::{frame_number_to_seek_target, pts_to_frame_number, start_time_to_micros};

    #[test]
    fn seek_target_is_in_microseconds() {
        assert_eq!(frame_number_to_seek_target(25, 25.0, 0), 1_000_000);
        assert_eq!(frame_number_to_seek_target(0, 30.0, 0), 0);
        assert_eq!(frame_number_to_seek_target(10, 0.0, 0), 0);
    }

    #[test]
    fn pts_rounds_to_nearest_frame() {
        let time_base = Rational::new(1, 90_000);
        // Frame 3 at 30 fps is 9000 ticks; a tick short must still be frame 3.
        assert_eq!(pts_to_frame_number(8_999, 0, time_base, 30.0), 3);
        assert_eq!(pts_to_frame_number(9_000, 0, time_base, 30.0), 3);
        assert_eq!(pts_to_frame_number(-10, 0, time_base, 30.0), 0);
    }

    #[test]
    fn offset_streams_count_from_their_start_time() {
        // MPEG-TS style stream starting at 1.4 s.
        let time_base = Rational::new(1, 90_000);
        let start_time = 126_000;
        let start_offset = start_time_to_micros(start_time, time_base);
        assert_eq!(start_offset, 1_400_000);

        assert_eq!(pts_to_frame_number(start_time, start_time, time_base, 30.0), 0);
        assert_eq!(pts_to_frame_number(start_time + 58 * 3_000, start_time, time_base, 30.0), 58);
        assert_eq!(frame_number_to_seek_target(0, 30.0, start_offset), 1_400_000);
        assert_eq!(frame_number_to_seek_target(100, 30.0, start_offset), 4_733_333);
    }
}
