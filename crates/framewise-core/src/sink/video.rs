//! FFmpeg-backed video encoding.
//!
//! Frames are converted from packed RGB24 to YUV420P and encoded as
//! MPEG-4 Part 2, tagged with the container's FourCC.

use std::fs;
use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling;
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::Rational;
use tracing::debug;

use super::FrameSink;
use crate::error::{ensure_dimensions, MediaError};
use crate::frame::{Dimensions, Frame, CHANNELS};
use crate::media::VideoContainer;
use crate::source::init_ffmpeg;

/// Minimum encoder bit rate in bits per second.
const MIN_BIT_RATE: f64 = 400_000.0;

/// Bits per pixel per frame.
const BITS_PER_PIXEL: f64 = 0.25;

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs()
}

/// Express a frame rate as a small rational, keeping NTSC rates exact.
pub(crate) fn rate_to_rational(fps: f64) -> Rational {
    let rounded = fps.round();
    if (fps - rounded).abs() < 1e-3 {
        return Rational::new(rounded as i32, 1);
    }
    let ntsc = fps * 1.001;
    if (ntsc - ntsc.round()).abs() < 1e-2 {
        return Rational::new((ntsc.round() * 1000.0) as i32, 1001);
    }
    let num = (fps * 1000.0).round() as i64;
    let divisor = gcd(num, 1000).max(1);
    Rational::new((num / divisor) as i32, (1000 / divisor) as i32)
}

fn target_bit_rate(dimensions: Dimensions, fps: f64) -> usize {
    let pixels = f64::from(dimensions.width) * f64::from(dimensions.height);
    (pixels * fps * BITS_PER_PIXEL).max(MIN_BIT_RATE) as usize
}

struct EncoderState {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: scaling::Context,
    encoder_tb: Rational,
    stream_tb: Rational,
}

impl EncoderState {
    fn drain(&mut self) -> Result<(), ffmpeg::Error> {
        let mut packet = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(self.encoder_tb, self.stream_tb);
            packet.write_interleaved(&mut self.output)?;
        }
        Ok(())
    }
}

/// A video file bound to one frame size and frame rate.
pub struct VideoSink {
    path: PathBuf,
    dimensions: Dimensions,
    state: Option<EncoderState>,
    pts: i64,
    finished: bool,
}

impl VideoSink {
    /// Create the output file and write the container header.
    pub fn create(
        path: &Path,
        dimensions: Dimensions,
        fps: f64,
        container: VideoContainer,
    ) -> Result<Self, MediaError> {
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(MediaError::InvalidParameter(format!(
                "video frames must be non-empty, got {dimensions}"
            )));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MediaError::InvalidParameter(format!(
                "frame rate must be positive, got {fps}"
            )));
        }
        init_ffmpeg().map_err(MediaError::Encode)?;

        let encode_err = |e: ffmpeg::Error| {
            MediaError::Encode(format!("{}: {e}", path.display()))
        };

        let mut output =
            ffmpeg::format::output_as(path, container.extension()).map_err(encode_err)?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4)
            .ok_or_else(|| MediaError::Encode("MPEG-4 encoder not available".into()))?;

        let rate = rate_to_rational(fps);
        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(encode_err)?;
        encoder.set_width(dimensions.width);
        encoder.set_height(dimensions.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_frame_rate(Some(rate));
        encoder.set_time_base(rate.invert());
        encoder.set_bit_rate(target_bit_rate(dimensions, fps));
        if global_header {
            encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder.open_as(codec).map_err(encode_err)?;

        let mut stream = output.add_stream(codec).map_err(encode_err)?;
        stream.set_parameters(&encoder);
        stream.set_time_base(encoder.time_base());
        // SAFETY: the stream parameters are owned by `output`, which outlives this write.
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag =
                u32::from_le_bytes(container.fourcc());
        }

        output.write_header().map_err(encode_err)?;

        let stream_tb = output
            .stream(0)
            .map(|s| s.time_base())
            .ok_or_else(|| MediaError::Encode("output stream missing after header".into()))?;

        let scaler = scaling::Context::get(
            Pixel::RGB24,
            dimensions.width,
            dimensions.height,
            Pixel::YUV420P,
            dimensions.width,
            dimensions.height,
            scaling::Flags::BILINEAR,
        )
        .map_err(encode_err)?;

        debug!(
            path = %path.display(),
            size = %dimensions,
            fps,
            ?container,
            "opened video encoder"
        );

        Ok(Self {
            path: path.to_path_buf(),
            dimensions,
            state: Some(EncoderState {
                output,
                encoder_tb: encoder.time_base(),
                encoder,
                scaler,
                stream_tb,
            }),
            pts: 0,
            finished: false,
        })
    }

    fn encode_err(&self, e: ffmpeg::Error) -> MediaError {
        MediaError::Encode(format!("{}: {e}", self.path.display()))
    }
}

impl FrameSink for VideoSink {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        ensure_dimensions(self.dimensions, frame.dimensions())?;
        let Some(state) = self.state.as_mut() else {
            return Err(MediaError::Encode(format!(
                "{} is already closed",
                self.path.display()
            )));
        };

        let mut rgb = VideoFrame::new(Pixel::RGB24, frame.width, frame.height);
        let row = frame.width as usize * CHANNELS;
        let stride = rgb.stride(0);
        {
            let data = rgb.data_mut(0);
            for (y, src) in frame.pixels.chunks_exact(row).enumerate() {
                data[y * stride..y * stride + row].copy_from_slice(src);
            }
        }

        let mut yuv = VideoFrame::empty();
        let result = state
            .scaler
            .run(&rgb, &mut yuv)
            .and_then(|()| {
                yuv.set_pts(Some(self.pts));
                state.encoder.send_frame(&yuv)
            })
            .and_then(|()| state.drain());
        result.map_err(|e| self.encode_err(e))?;

        self.pts += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.pts as u64
    }

    fn finish(&mut self) -> Result<PathBuf, MediaError> {
        let Some(mut state) = self.state.take() else {
            return Err(MediaError::Encode(format!(
                "{} is already closed",
                self.path.display()
            )));
        };

        state
            .encoder
            .send_eof()
            .and_then(|()| state.drain())
            .and_then(|()| state.output.write_trailer())
            .map_err(|e| self.encode_err(e))?;

        self.finished = true;
        debug!(path = %self.path.display(), frames = self.pts, "closed video encoder");
        Ok(self.path.clone())
    }

    fn discard(&mut self) {
        // Close the file before removing it. A failed finish has already
        // dropped the encoder but left the file behind.
        self.state = None;
        if !self.finished {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FrameSource, VideoStreamSource};
    use crate::media::VideoFile;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32, shift: u8) -> Frame {
        let mut pixels = Vec::with_capacity((width * height) as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) as u8).wrapping_mul(4).wrapping_add(shift);
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(width, height, pixels)
    }

    #[test]
    fn test_rate_to_rational() {
        assert_eq!(rate_to_rational(25.0), Rational::new(25, 1));
        assert_eq!(rate_to_rational(29.97), Rational::new(30000, 1001));
        assert_eq!(rate_to_rational(12.5), Rational::new(25, 2));
    }

    #[test]
    fn test_target_bit_rate_floor() {
        assert_eq!(target_bit_rate(Dimensions::new(8, 8), 1.0), 400_000);
        assert!(target_bit_rate(Dimensions::new(1920, 1080), 30.0) > 400_000);
    }

    #[test]
    fn test_encode_then_decode_keeps_frame_count_and_size() {
        for container in [VideoContainer::Avi, VideoContainer::Mp4] {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join(format!("clip.{}", container.extension()));
            let size = Dimensions::new(64, 48);

            let mut sink = VideoSink::create(&path, size, 10.0, container).unwrap();
            for i in 0..10u8 {
                sink.write(&gradient(64, 48, i * 8)).unwrap();
            }
            assert_eq!(sink.frames_written(), 10);
            assert_eq!(sink.finish().unwrap(), path);

            let video = VideoFile::probe(&path).unwrap();
            assert_eq!(video.dimensions, size);
            assert!((video.fps - 10.0).abs() < 0.01);

            let mut source = VideoStreamSource::open(&video).unwrap();
            let mut count = 0;
            while let Some(frame) = source.next_frame().unwrap() {
                assert_eq!(frame.dimensions(), size);
                count += 1;
            }
            assert_eq!(count, 10);
        }
    }

    #[test]
    fn test_mismatched_frame_rejected_before_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.avi");
        let mut sink =
            VideoSink::create(&path, Dimensions::new(32, 32), 5.0, VideoContainer::Avi).unwrap();

        assert!(matches!(
            sink.write(&Frame::black(32, 30)),
            Err(MediaError::DimensionMismatch { .. })
        ));
        assert_eq!(sink.frames_written(), 0);
    }

    #[test]
    fn test_discard_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.avi");
        let mut sink =
            VideoSink::create(&path, Dimensions::new(32, 32), 5.0, VideoContainer::Avi).unwrap();
        sink.write(&Frame::black(32, 32)).unwrap();

        sink.discard();
        assert!(!path.exists());
        assert!(sink.finish().is_err());
    }

    #[test]
    fn test_discard_after_encoder_closed_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        let mut sink =
            VideoSink::create(&path, Dimensions::new(32, 32), 5.0, VideoContainer::Mp4).unwrap();
        sink.write(&Frame::black(32, 32)).unwrap();

        // Same state a failed trailer write leaves behind
        drop(sink.state.take());
        assert!(path.exists());

        sink.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_keeps_finished_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.avi");
        let mut sink =
            VideoSink::create(&path, Dimensions::new(32, 32), 5.0, VideoContainer::Avi).unwrap();
        sink.write(&Frame::black(32, 32)).unwrap();
        sink.finish().unwrap();

        sink.discard();
        assert!(path.exists());
    }
}
