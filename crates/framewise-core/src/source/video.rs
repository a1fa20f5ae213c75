//! FFmpeg-backed video decoding.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling;
use ffmpeg::util::error::EAGAIN;
use ffmpeg::util::frame::video::Video as VideoFrame;
use tracing::debug;

use super::FrameSource;
use crate::error::MediaError;
use crate::frame::{Dimensions, Frame, CHANNELS};
use crate::media::VideoFile;

/// Initialize FFmpeg once per process and keep its own logging quiet.
pub(crate) fn init_ffmpeg() -> Result<(), String> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    INIT.get_or_init(|| {
        ffmpeg::init().map_err(|e| format!("failed to initialize FFmpeg: {e}"))?;
        ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
        Ok(())
    })
    .clone()
}

fn rate_to_f64(rate: ffmpeg::Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        return None;
    }
    Some(f64::from(rate))
}

/// Whether `read` frames already cover the container's declared count.
fn reached_count(declared: Option<u64>, read: u64) -> bool {
    declared.is_some_and(|n| read >= n)
}

/// Read the stream properties of a video without decoding it.
pub(crate) fn probe(path: &Path) -> Result<VideoFile, MediaError> {
    init_ffmpeg().map_err(|e| MediaError::unreadable(path, e))?;

    let input = ffmpeg::format::input(path).map_err(|e| MediaError::unreadable(path, e))?;
    let stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| MediaError::unreadable(path, "no video stream"))?;

    let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|ctx| ctx.decoder().video())
        .map_err(|e| MediaError::unreadable(path, e))?;

    let fps = rate_to_f64(stream.avg_frame_rate())
        .or_else(|| rate_to_f64(stream.rate()))
        .ok_or_else(|| MediaError::unreadable(path, "stream has no frame rate"))?;

    let dimensions = Dimensions::new(decoder.width(), decoder.height());
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(MediaError::unreadable(path, "stream has no frame size"));
    }

    let frame_count = u64::try_from(stream.frames()).ok().filter(|&n| n > 0);

    Ok(VideoFile {
        path: path.to_path_buf(),
        fps,
        dimensions,
        frame_count,
    })
}

/// Decodes the best video stream of a file to RGB frames.
pub struct VideoStreamSource {
    path: PathBuf,
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    fps: f64,
    frame_count: Option<u64>,
    read: u64,
    eof_sent: bool,
    exhausted: bool,
}

impl VideoStreamSource {
    pub fn open(video: &VideoFile) -> Result<Self, MediaError> {
        let path = video.path.as_path();
        init_ffmpeg().map_err(|e| MediaError::unreadable(path, e))?;

        let input = ffmpeg::format::input(path).map_err(|e| MediaError::unreadable(path, e))?;
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| MediaError::unreadable(path, "no video stream"))?;
        let stream_index = stream.index();

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| MediaError::unreadable(path, e))?;

        let scaler = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| MediaError::unreadable(path, e))?;

        debug!(
            path = %path.display(),
            size = %video.dimensions,
            fps = video.fps,
            frames = ?video.frame_count,
            "opened video stream"
        );

        Ok(Self {
            path: video.path.clone(),
            input,
            decoder,
            scaler,
            stream_index,
            fps: video.fps,
            frame_count: video.frame_count,
            read: 0,
            eof_sent: false,
            exhausted: false,
        })
    }

    fn convert(&mut self, decoded: &VideoFrame) -> Result<Frame, MediaError> {
        if decoded.width() != self.decoder.width() || decoded.height() != self.decoder.height() {
            return Err(MediaError::unreadable(
                &self.path,
                "frame size changed mid-stream",
            ));
        }

        let mut rgb = VideoFrame::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|e| MediaError::unreadable(&self.path, e))?;

        let width = rgb.width();
        let height = rgb.height();
        let row = width as usize * CHANNELS;
        let stride = rgb.stride(0);
        let data = rgb.data(0);

        // Rows may be padded
        let mut pixels = Vec::with_capacity(row * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            pixels.extend_from_slice(&data[start..start + row]);
        }
        Ok(Frame::new(width, height, pixels))
    }

    fn decode_next(&mut self) -> Result<Option<Frame>, MediaError> {
        let mut decoded = VideoFrame::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return self.convert(&decoded).map(Some),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == EAGAIN => {}
                Err(e) => return Err(MediaError::unreadable(&self.path, e)),
            }
            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = ffmpeg::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|e| MediaError::unreadable(&self.path, e))?;
                    }
                }
                Err(ffmpeg::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| MediaError::unreadable(&self.path, e))?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(MediaError::unreadable(&self.path, e)),
            }
        }
    }
}

impl FrameSource for VideoStreamSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, MediaError> {
        if self.exhausted || reached_count(self.frame_count, self.read) {
            self.exhausted = true;
            return Ok(None);
        }
        let result = self.decode_next();
        match result {
            Ok(Some(_)) => self.read += 1,
            _ => self.exhausted = true,
        }
        result
    }

    fn frame_rate(&self) -> Option<f64> {
        Some(self.fps)
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }
}
