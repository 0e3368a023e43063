use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::{CaptureProvider, FrameSource};
use crate::shared::frame::Frame;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Offline stand-in for a live camera: plays a directory of image files
/// (sorted by file name) as successive RGBA frames.
///
/// With `loop_playback` the sequence wraps around indefinitely, which is
/// the closer analogue to a capture device that never runs dry.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    position: usize,
    frames_served: usize,
    loop_playback: bool,
    stopped: bool,
}

impl ImageSequenceSource {
    /// Lists the image files under `dir`. Fails when the directory cannot
    /// be read or holds no decodable image files — the capture-acquisition
    /// failure case.
    pub fn open(dir: &Path, loop_playback: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read frame directory {}: {e}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(format!("no image files in {}", dir.display()).into());
        }

        Ok(Self {
            paths,
            position: 0,
            frames_served: 0,
            loop_playback,
            stopped: false,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.stopped {
            return Ok(None);
        }
        if self.position >= self.paths.len() {
            if !self.loop_playback {
                return Ok(None);
            }
            self.position = 0;
        }

        // Advance past the file before decoding: an undecodable file is
        // reported once, then skipped, so it can never stall the stream.
        let path = self.paths[self.position].clone();
        self.position += 1;
        let image = image::open(&path)
            .map_err(|e| format!("cannot decode {}: {e}", path.display()))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        let frame = Frame::new(image.into_raw(), width, height, 4, self.frames_served);
        self.frames_served += 1;
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Acquires an [`ImageSequenceSource`] each time a session starts.
pub struct ImageSequenceProvider {
    dir: PathBuf,
    loop_playback: bool,
}

impl ImageSequenceProvider {
    pub fn new(dir: PathBuf, loop_playback: bool) -> Self {
        Self { dir, loop_playback }
    }
}

impl CaptureProvider for ImageSequenceProvider {
    fn acquire(&mut self) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
        Ok(Box::new(ImageSequenceSource::open(
            &self.dir,
            self.loop_playback,
        )?))
    }
}
