//! Scripted in-memory decoder shared by the integration tests.
//!
//! Each synthetic video is a list of picture-type tags, one per frame. The
//! decoded image for frame `n` is a 4x4 square filled with `n % 256`, so tests
//! can tell which frame a slot holds from its pixels as well.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use frame_compare::{ChannelOrder, DecoderFactory, FrameCompareError, FrameDecoder};
use image::{Rgb, RgbImage};

/// Counters and switches shared between a test and one synthetic video.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    decodes: Arc<AtomicUsize>,
    seeks: Arc<AtomicUsize>,
    broken: Arc<AtomicBool>,
}

impl Controls {
    /// Frames decoded since the last reset.
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    /// Seeks since the last reset.
    pub fn seeks(&self) -> usize {
        self.seeks.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.decodes.store(0, Ordering::SeqCst);
        self.seeks.store(0, Ordering::SeqCst);
    }

    /// Make the video unreadable from now on, as if the file vanished.
    pub fn break_source(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

struct Script {
    tags: Arc<Vec<u8>>,
    gaps: Arc<Vec<u64>>,
    reported: u64,
    order: ChannelOrder,
    controls: Controls,
}

pub struct SyntheticDecoder {
    tags: Arc<Vec<u8>>,
    gaps: Arc<Vec<u64>>,
    reported: u64,
    order: ChannelOrder,
    controls: Controls,
    cursor: u64,
    last_position: u64,
    last_tag: u8,
}

impl FrameDecoder for SyntheticDecoder {
    fn is_open(&self) -> bool {
        !self.controls.broken.load(Ordering::SeqCst)
    }

    fn reported_frame_count(&self) -> u64 {
        self.reported
    }

    fn seek(&mut self, position: u64) -> Result<(), FrameCompareError> {
        if !self.is_open() || position >= self.reported {
            return Err(FrameCompareError::FramePosition {
                path: PathBuf::from("synthetic"),
                position,
            });
        }
        self.controls.seeks.fetch_add(1, Ordering::SeqCst);
        self.cursor = position;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, FrameCompareError> {
        while self.gaps.contains(&self.cursor) {
            self.cursor += 1;
        }
        let Some(&tag) = self.tags.get(self.cursor as usize) else {
            return Ok(None);
        };
        self.controls.decodes.fetch_add(1, Ordering::SeqCst);
        self.last_tag = tag;
        let shade = (self.cursor % 256) as u8;
        let pixel = match self.order {
            ChannelOrder::Rgb => Rgb([shade, 0, 255]),
            ChannelOrder::Bgr => Rgb([255, 0, shade]),
        };
        self.last_position = self.cursor;
        self.cursor += 1;
        Ok(Some(RgbImage::from_pixel(4, 4, pixel)))
    }

    fn current_frame_type_tag(&self) -> u8 {
        self.last_tag
    }

    // Gap-free videos rely on the default, like most decoders.
    fn last_position(&self) -> Option<u64> {
        (!self.gaps.is_empty()).then_some(self.last_position)
    }

    fn channel_order(&self) -> ChannelOrder {
        self.order
    }
}

/// Opens synthetic videos registered by path.
#[derive(Default)]
pub struct SyntheticFactory {
    scripts: HashMap<PathBuf, Script>,
}

impl SyntheticFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video whose container reports its true length.
    pub fn add(&mut self, path: impl Into<PathBuf>, tags: Vec<u8>) -> Controls {
        let reported = tags.len() as u64;
        self.add_with(path, tags, reported, ChannelOrder::Rgb)
    }

    /// Register a video with an arbitrary reported frame count.
    pub fn add_with(
        &mut self,
        path: impl Into<PathBuf>,
        tags: Vec<u8>,
        reported: u64,
        order: ChannelOrder,
    ) -> Controls {
        self.insert(path.into(), tags, Vec::new(), reported, order)
    }

    /// Register a video whose decoder never returns the frames in `gaps`:
    /// a read at a gap yields the next frame after it, as a decoder does
    /// when timestamps jump.
    pub fn add_with_gaps(&mut self, path: impl Into<PathBuf>, tags: Vec<u8>, gaps: &[u64]) -> Controls {
        let reported = tags.len() as u64;
        self.insert(path.into(), tags, gaps.to_vec(), reported, ChannelOrder::Rgb)
    }

    fn insert(
        &mut self,
        path: PathBuf,
        tags: Vec<u8>,
        gaps: Vec<u64>,
        reported: u64,
        order: ChannelOrder,
    ) -> Controls {
        let controls = Controls::default();
        self.scripts.insert(
            path,
            Script {
                tags: Arc::new(tags),
                gaps: Arc::new(gaps),
                reported,
                order,
                controls: controls.clone(),
            },
        );
        controls
    }

    pub fn into_shared(self) -> Arc<dyn DecoderFactory> {
        Arc::new(self)
    }
}

impl DecoderFactory for SyntheticFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameDecoder>, FrameCompareError> {
        let script = self.scripts.get(path).ok_or_else(|| FrameCompareError::FileOpen {
            path: path.to_path_buf(),
            reason: "no such synthetic video".to_string(),
        })?;
        if script.controls.broken.load(Ordering::SeqCst) {
            return Err(FrameCompareError::FileOpen {
                path: path.to_path_buf(),
                reason: "broken".to_string(),
            });
        }
        Ok(Box::new(SyntheticDecoder {
            tags: Arc::clone(&script.tags),
            gaps: Arc::clone(&script.gaps),
            reported: script.reported,
            order: script.order,
            controls: script.controls.clone(),
            cursor: 0,
            last_position: 0,
            last_tag: b'?',
        }))
    }
}

/// Repeating `I B B P B B P B B P B B` group of twelve frames.
pub fn gop(len: usize) -> Vec<u8> {
    (0..len)
        .map(|index| match index % 12 {
            0 => b'I',
            n if n % 3 == 0 => b'P',
            _ => b'B',
        })
        .collect()
}

/// Every frame has the same tag.
pub fn uniform(len: usize, tag: u8) -> Vec<u8> {
    vec![tag; len]
}

/// Frame index encoded in a synthetic image. Valid for videos shorter than 256
/// frames, or modulo 256 otherwise.
pub fn shade_of(image: &RgbImage) -> u8 {
    image.get_pixel(3, 3).0[0]
}

/// [`gop`] with the last frame forced to B, so a forward B search from any
/// position always succeeds.
pub fn clip(len: usize) -> Vec<u8> {
    let mut tags = gop(len);
    if let Some(last) = tags.last_mut() {
        *last = b'B';
    }
    tags
}
