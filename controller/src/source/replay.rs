use marker_signal_common::frame::{now_ms, Frame};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{FrameSource, SourceError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Feeds previously captured image files through the loop in file-name order.
///
/// Useful for bench testing the detector and serial wiring without a camera.
pub struct ReplaySource {
    files: Vec<PathBuf>,
    cursor: usize,
    repeat: bool,
    next_seq: u64,
}

impl ReplaySource {
    pub fn open(dir: &Path, repeat: bool) -> Result<Self, SourceError> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| SourceError::ReplayDir(dir.to_path_buf(), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SourceError::ReplayDir(dir.to_path_buf(), e))?
                .path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(SourceError::EmptyReplay(dir.to_path_buf()));
        }
        files.sort();

        info!(dir = %dir.display(), files = files.len(), repeat, "replaying frames from disk");
        Ok(Self {
            files,
            cursor: 0,
            repeat,
            next_seq: 0,
        })
    }

}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.cursor >= self.files.len() {
            if !self.repeat {
                return Ok(None);
            }
            debug!("replay wrapped around");
            self.cursor = 0;
        }

        let path = &self.files[self.cursor];
        let image = image::open(path).map_err(|e| SourceError::Decode(path.clone(), e))?;
        let frame = Frame::from_image(image, self.next_seq, now_ms())?;

        self.cursor += 1;
        self.next_seq += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Fresh scratch directory under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "marker-signal-replay-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, width: u32) {
        RgbImage::from_pixel(width, 2, Rgb([10, 20, 30]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn plays_files_in_name_order_then_ends() {
        let dir = scratch_dir("order");
        write_png(&dir, "b.png", 2);
        write_png(&dir, "a.png", 1);
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let mut source = ReplaySource::open(&dir, false).unwrap();

        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!((first.seq(), first.width()), (0, 1));
        assert_eq!((second.seq(), second.width()), (1, 2));
        assert!(source.next_frame().unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn repeat_wraps_and_keeps_counting() {
        let dir = scratch_dir("repeat");
        write_png(&dir, "only.png", 3);

        let mut source = ReplaySource::open(&dir, true).unwrap();
        for expected in 0..3 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.seq(), expected);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        let err = ReplaySource::open(&dir, false).err().expect("should fail");
        assert!(matches!(err, SourceError::EmptyReplay(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = ReplaySource::open(Path::new("/nonexistent/marker-signal"), false)
            .err()
            .expect("should fail");
        assert!(matches!(err, SourceError::ReplayDir(..)));
    }
}
