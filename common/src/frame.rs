use image::{imageops, DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Channel order of the samples inside a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 3 bytes per pixel, blue first. What the camera hands out.
    Bgr8,
    /// 3 bytes per pixel, red first. What decoded image files give us.
    Rgb8,
    /// 1 byte per pixel intensity.
    Gray8,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Bgr8 | PixelLayout::Rgb8 => 3,
            PixelLayout::Gray8 => 1,
        }
    }
}

/// One captured image plus its capture metadata.
///
/// Samples are row-major with `width * height * channels` bytes and no row padding.
/// A frame cannot be modified after construction.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    seq: u64,
    captured_at_ms: i64,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        layout: PixelLayout,
        seq: u64,
        captured_at_ms: i64,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
            seq,
            captured_at_ms,
        })
    }

    /// Build an RGB frame from a decoded image file.
    pub fn from_image(image: DynamicImage, seq: u64, captured_at_ms: i64) -> Result<Self, FrameError> {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height, PixelLayout::Rgb8, seq, captured_at_ms)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        &self.data[start..start + channels]
    }

    fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let px = self.pixel(x, y);
        match self.layout {
            PixelLayout::Bgr8 => [px[2], px[1], px[0]],
            PixelLayout::Rgb8 => [px[0], px[1], px[2]],
            PixelLayout::Gray8 => [px[0], px[0], px[0]],
        }
    }

    /// Single-channel intensity image for debug output.
    pub fn to_gray(&self) -> GrayImage {
        if self.layout == PixelLayout::Gray8 {
            return GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.pixel(x, y)[0]]));
        }
        imageops::grayscale(&self.to_rgb())
    }

    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| Rgb(self.rgb_at(x, y)))
    }
}

/// Wall-clock capture timestamp in Unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame has an empty dimension: {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("frame buffer is {got} bytes, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
}
