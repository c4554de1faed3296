//! Row-major RGB32 pixel storage and a one-row scanline cache.
//!
//! Pixels are 4 bytes each in B, G, R, pad order. Fetching a scan row is the
//! comparatively expensive step, so [`PixelBufferCache`] remembers the most
//! recently touched row and reuses it while accesses stay on that row.

use std::ops::Range;

use crate::{MediaError, Result};

/// Bytes per RGB32 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Owned `width * height` grid of RGB32 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb32Buffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Rgb32Buffer {
    /// Black buffer of the given size.
    ///
    /// Fails when `width * height` pixels cannot be addressed.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| MediaError::invalid(format!("a {width}x{height} buffer is too large")))?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Buffer where every pixel is `(r, g, b)`.
    pub fn filled(width: usize, height: usize, rgb: (u8, u8, u8)) -> Result<Self> {
        let mut buffer = Self::new(width, height)?;
        buffer.fill(rgb);
        Ok(buffer)
    }

    /// Converts tightly packed R,G,B bytes into RGB32.
    pub fn from_rgb8(width: usize, height: usize, rgb: &[u8]) -> Self {
        assert_eq!(rgb.len(), width * height * 3, "rgb8 data does not match {width}x{height}");
        let data = rgb
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0], 0xff])
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Tightly packed R,G,B bytes, dropping the pad byte.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per scan row.
    pub fn stride(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    pub fn fill(&mut self, (r, g, b): (u8, u8, u8)) {
        for pixel in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[b, g, r, 0xff]);
        }
    }

    /// Byte range of row `y` inside the backing store.
    pub fn row_span(&self, y: usize) -> Range<usize> {
        assert!(y < self.height, "row {y} outside image of height {}", self.height);
        let start = y * self.stride();
        start..start + self.stride()
    }

    pub fn scan_line(&self, y: usize) -> &[u8] {
        let span = self.row_span(y);
        &self.data[span]
    }

    pub fn scan_line_mut(&mut self, y: usize) -> &mut [u8] {
        let span = self.row_span(y);
        &mut self.data[span]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedRow {
    index: usize,
    stride: usize,
    span: Range<usize>,
}

/// Direct-mapped cache of capacity one, keyed by row index.
///
/// The cached entry is a byte range into the image rather than a copy, so
/// reads always observe the latest writes and nothing needs flushing. A span
/// depends only on the row index and the stride, so the entry is also keyed
/// on the stride and a cache handed a buffer of a different width refetches.
#[derive(Debug, Clone, Default)]
pub struct PixelBufferCache {
    cached: Option<CachedRow>,
    row_fetches: usize,
}

impl PixelBufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows fetched from the image so far.
    pub fn row_fetches(&self) -> usize {
        self.row_fetches
    }

    /// Row currently held by the cache, if any.
    pub fn cached_row(&self) -> Option<usize> {
        self.cached.as_ref().map(|row| row.index)
    }

    fn acquire(&mut self, image: &Rgb32Buffer, y: usize) -> Range<usize> {
        debug_assert!(y < image.height(), "row {y} outside image of height {}", image.height());
        match &self.cached {
            Some(row) if row.index == y && row.stride == image.stride() => row.span.clone(),
            _ => {
                let span = image.row_span(y);
                self.row_fetches += 1;
                self.cached = Some(CachedRow {
                    index: y,
                    stride: image.stride(),
                    span: span.clone(),
                });
                span
            }
        }
    }

    /// Colour of pixel `(x, y)` as `(r, g, b)`.
    pub fn get_color(&mut self, image: &Rgb32Buffer, x: usize, y: usize) -> (u8, u8, u8) {
        debug_assert!(x < image.width(), "column {x} outside image of width {}", image.width());
        let span = self.acquire(image, y);
        let row = &image.data[span];
        let offset = BYTES_PER_PIXEL * x;
        (row[offset + 2], row[offset + 1], row[offset])
    }

    /// Writes `(r, g, b)` into pixel `(x, y)`. Components are stored as given.
    pub fn set_color(
        &mut self,
        image: &mut Rgb32Buffer,
        x: usize,
        y: usize,
        (r, g, b): (u8, u8, u8),
    ) {
        debug_assert!(x < image.width(), "column {x} outside image of width {}", image.width());
        let span = self.acquire(image, y);
        let row = &mut image.data[span];
        let offset = BYTES_PER_PIXEL * x;
        row[offset] = b;
        row[offset + 1] = g;
        row[offset + 2] = r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_do_not_leak_into_neighbours() {
        let mut image = Rgb32Buffer::new(2, 2).unwrap();
        let mut cache = PixelBufferCache::new();

        cache.set_color(&mut image, 0, 0, (255, 0, 0));
        assert_eq!(cache.get_color(&image, 0, 0), (255, 0, 0));
        assert_eq!(cache.get_color(&image, 1, 0), (0, 0, 0));
        assert_eq!(cache.get_color(&image, 0, 1), (0, 0, 0));
    }

    #[test]
    fn stores_components_in_bgr_order() {
        let mut image = Rgb32Buffer::new(3, 1).unwrap();
        let mut cache = PixelBufferCache::new();
        cache.set_color(&mut image, 1, 0, (10, 20, 30));

        assert_eq!(&image.scan_line(0)[4..7], &[30, 20, 10]);
    }

    #[test]
    fn row_major_traversal_fetches_each_row_once() {
        let (width, height) = (17, 9);
        let mut image = Rgb32Buffer::new(width, height).unwrap();
        let mut cache = PixelBufferCache::new();

        for y in 0..height {
            for x in 0..width {
                let value = ((x + y) % 256) as u8;
                cache.set_color(&mut image, x, y, (value, value, value));
            }
        }
        assert_eq!(cache.row_fetches(), height);

        let mut cache = PixelBufferCache::new();
        for y in 0..height {
            for x in 0..width {
                let value = ((x + y) % 256) as u8;
                assert_eq!(cache.get_color(&image, x, y), (value, value, value));
            }
        }
        assert_eq!(cache.row_fetches(), height);
    }

    #[test]
    fn interleaved_rows_never_read_stale_data() {
        let mut image = Rgb32Buffer::new(4, 4).unwrap();
        let mut cache = PixelBufferCache::new();
        let coords = [(0, 0), (3, 2), (1, 0), (3, 2), (2, 3), (0, 0), (1, 1)];

        for (step, &(x, y)) in coords.iter().enumerate() {
            let rgb = (step as u8, 2 * step as u8, 255 - step as u8);
            cache.set_color(&mut image, x, y, rgb);
            // Touch another row so the next read must refetch.
            let _ = cache.get_color(&image, 0, (y + 1) % 4);
            assert_eq!(cache.get_color(&image, x, y), rgb);
            cache.set_color(&mut image, x, y, rgb);
            assert_eq!(cache.get_color(&image, x, y), rgb);
        }
    }

    #[test]
    fn column_major_traversal_refetches_on_every_access() {
        let image = Rgb32Buffer::new(3, 3).unwrap();
        let mut cache = PixelBufferCache::new();
        for x in 0..3 {
            for y in 0..3 {
                cache.get_color(&image, x, y);
            }
        }
        assert_eq!(cache.row_fetches(), 9);
        assert_eq!(cache.cached_row(), Some(2));
    }

    #[test]
    fn one_cache_follows_buffers_of_different_widths() {
        let narrow = Rgb32Buffer::filled(2, 2, (1, 2, 3)).unwrap();
        let mut wide = Rgb32Buffer::new(5, 2).unwrap();
        let mut cache = PixelBufferCache::new();

        assert_eq!(cache.get_color(&narrow, 1, 1), (1, 2, 3));
        cache.set_color(&mut wide, 4, 1, (9, 8, 7));
        assert_eq!(cache.row_fetches(), 2);
        assert_eq!(&wide.scan_line(1)[16..19], &[7, 8, 9]);
        assert_eq!(wide.scan_line(0), &[0; 20]);

        assert_eq!(cache.get_color(&narrow, 0, 1), (1, 2, 3));
        assert_eq!(cache.row_fetches(), 3);
    }

    #[test]
    fn refuses_unaddressable_sizes() {
        assert!(matches!(
            Rgb32Buffer::new(usize::MAX / 4, 8),
            Err(MediaError::InvalidInput(_))
        ));
        assert!(Rgb32Buffer::new(usize::MAX, 2).is_err());
    }

    #[test]
    #[should_panic]
    fn rejects_rows_past_the_end() {
        let image = Rgb32Buffer::new(2, 2).unwrap();
        PixelBufferCache::new().get_color(&image, 0, 2);
    }
}
