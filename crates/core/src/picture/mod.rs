use std::{
    fmt,
    path::{Path, PathBuf},
};

use image::{
    imageops::{self, FilterType},
    RgbImage,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    color::WHITE,
    config::PictureConfig,
    error::Axis,
    pixels::{PixelBufferCache, Rgb32Buffer},
    Color, MediaError, Result,
};

/// An RGB picture backed by an RGB32 buffer and a scanline cache.
///
/// All coordinate-taking methods validate their arguments and report
/// descriptive errors; the cache below them never sees an out-of-range
/// coordinate.
#[derive(Debug, Clone)]
pub struct Picture {
    file_name: Option<PathBuf>,
    image: Rgb32Buffer,
    cache: PixelBufferCache,
}

/// Snapshot of a single pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: usize,
    pub y: usize,
    pub color: Color,
}

impl Pixel {
    pub fn red(&self) -> u8 {
        self.color.red
    }

    pub fn green(&self) -> u8 {
        self.color.green
    }

    pub fn blue(&self) -> u8 {
        self.color.blue
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pixel red={} green={} blue={}",
            self.color.red, self.color.green, self.color.blue
        )
    }
}

/// Write handle for one pixel of a [`Picture`].
#[derive(Debug)]
pub struct PixelMut<'a> {
    picture: &'a mut Picture,
    x: usize,
    y: usize,
}

impl PixelMut<'_> {
    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    pub fn color(&mut self) -> Color {
        self.picture.read(self.x, self.y)
    }

    pub fn set_color(&mut self, color: Color) {
        self.picture.write(self.x, self.y, color);
    }

    pub fn set_red(&mut self, red: i32) {
        let color = self.color();
        self.set_color(Color::new(red, color.green as i32, color.blue as i32));
    }

    pub fn set_green(&mut self, green: i32) {
        let color = self.color();
        self.set_color(Color::new(color.red as i32, green, color.blue as i32));
    }

    pub fn set_blue(&mut self, blue: i32) {
        let color = self.color();
        self.set_color(Color::new(color.red as i32, color.green as i32, blue));
    }
}

impl Picture {
    /// White picture of the given size.
    pub fn blank(width: usize, height: usize) -> Result<Self> {
        Self::empty(width, height, WHITE)
    }

    pub fn empty(width: usize, height: usize, color: Color) -> Result<Self> {
        Self::empty_with_config(width, height, color, &PictureConfig::default())
    }

    pub fn empty_with_config(
        width: usize,
        height: usize,
        color: Color,
        config: &PictureConfig,
    ) -> Result<Self> {
        check_dimensions("empty picture", width, height, config)?;
        Ok(Self::from_buffer(Rgb32Buffer::filled(width, height, color.rgb())?))
    }

    fn from_buffer(image: Rgb32Buffer) -> Self {
        Self {
            file_name: None,
            image,
            cache: PixelBufferCache::new(),
        }
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        Self::from_buffer(Rgb32Buffer::from_rgb8(
            image.width() as usize,
            image.height() as usize,
            image.as_raw(),
        ))
    }

    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(
            self.width() as u32,
            self.height() as u32,
            self.image.to_rgb8(),
        )
        .ok_or_else(|| MediaError::msg("picture dimensions do not match its pixel data"))
    }

    /// Loads any raster format understood by the `image` crate.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)?.to_rgb8();
        let mut picture = Self::from_rgb_image(&decoded);
        picture.file_name = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            width = picture.width(),
            height = picture.height(),
            "loaded picture"
        );
        Ok(picture)
    }

    /// Writes the picture; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.extension().is_none() {
            return Err(MediaError::invalid(format!(
                "no file extension provided in {}",
                path.display()
            )));
        }
        self.to_rgb_image()?.save(path)?;
        info!(path = %path.display(), "wrote picture");
        Ok(())
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    /// Rows fetched by the scanline cache so far.
    pub fn row_fetches(&self) -> usize {
        self.cache.row_fetches()
    }

    pub fn buffer(&self) -> &Rgb32Buffer {
        &self.image
    }

    fn check_coordinates(&self, x: usize, y: usize) -> Result<()> {
        if x >= self.width() {
            return Err(MediaError::pixel_out_of_range(Axis::X, x, self.width()));
        }
        if y >= self.height() {
            return Err(MediaError::pixel_out_of_range(Axis::Y, y, self.height()));
        }
        Ok(())
    }

    fn read(&mut self, x: usize, y: usize) -> Color {
        Color::from_rgb(self.cache.get_color(&self.image, x, y))
    }

    fn write(&mut self, x: usize, y: usize, color: Color) {
        self.cache.set_color(&mut self.image, x, y, color.rgb());
    }

    pub fn pixel(&mut self, x: usize, y: usize) -> Result<Pixel> {
        let color = self.pixel_color(x, y)?;
        Ok(Pixel { x, y, color })
    }

    pub fn pixel_color(&mut self, x: usize, y: usize) -> Result<Color> {
        self.check_coordinates(x, y)?;
        Ok(self.read(x, y))
    }

    pub fn set_pixel_color(&mut self, x: usize, y: usize, color: Color) -> Result<()> {
        self.check_coordinates(x, y)?;
        self.write(x, y, color);
        Ok(())
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Result<PixelMut<'_>> {
        self.check_coordinates(x, y)?;
        Ok(PixelMut {
            picture: self,
            x,
            y,
        })
    }

    /// Every pixel, row by row from the top-left corner.
    pub fn pixels(&mut self) -> impl Iterator<Item = Pixel> + '_ {
        let (width, height) = (self.width(), self.height());
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| (x, y)))
            .map(move |(x, y)| Pixel {
                x,
                y,
                color: self.read(x, y),
            })
    }

    /// Replaces every pixel with `f(color)`, visiting rows in order.
    pub fn map_colors(&mut self, mut f: impl FnMut(Color) -> Color) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let color = self.read(x, y);
                self.write(x, y, f(color));
            }
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.image.fill(color.rgb());
    }

    /// Copy of this picture that keeps the file name but starts with a cold cache.
    pub fn duplicate(&self) -> Self {
        Self {
            file_name: self.file_name.clone(),
            image: self.image.clone(),
            cache: PixelBufferCache::new(),
        }
    }

    /// `width x height` region starting at `(x, y)`, which must lie inside
    /// the picture. Parts of the region past the edges come out black.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        if x >= self.width() {
            return Err(MediaError::invalid("crop: upper-left x must be within the picture"));
        }
        if y >= self.height() {
            return Err(MediaError::invalid("crop: upper-left y must be within the picture"));
        }
        self.crop_with_cutoff(x as i64, y as i64, width, height)
    }

    /// Like [`Picture::crop`] but the region may start anywhere.
    pub fn crop_with_cutoff(&self, x: i64, y: i64, width: usize, height: usize) -> Result<Self> {
        check_dimensions("crop", width, height, &PictureConfig::default())?;
        let mut cropped = Self::from_buffer(Rgb32Buffer::new(width, height)?);
        blit(&self.image, &mut cropped.image, -x, -y);
        Ok(cropped)
    }

    /// Copies this picture into `target` with its top-left corner at
    /// `(x, y)`. The whole picture must fit.
    pub fn copy_into(&self, target: &mut Picture, x: usize, y: usize) -> Result<()> {
        if x >= target.width() {
            return Err(MediaError::invalid("copy into: start x must be within the target picture"));
        }
        if y >= target.height() {
            return Err(MediaError::invalid("copy into: start y must be within the target picture"));
        }
        if x + self.width() > target.width() || y + self.height() > target.height() {
            return Err(MediaError::invalid(
                "copy into: the picture won't fit into the target picture",
            ));
        }
        self.copy_into_with_cutoff(target, x as i64, y as i64);
        Ok(())
    }

    /// Copies as much of this picture into `target` as fits.
    pub fn copy_into_with_cutoff(&self, target: &mut Picture, x: i64, y: i64) {
        blit(&self.image, &mut target.image, x, y);
    }

    /// Scales the height by `factor` and the width in proportion.
    ///
    /// `smooth` selects a triangle (bilinear) filter instead of nearest
    /// neighbour. The result obeys the same size limits as a new picture.
    pub fn scale(&self, factor: f64, smooth: bool) -> Result<Self> {
        if !(factor > 0.0) {
            return Err(MediaError::invalid("scale: factor must be greater than 0"));
        }
        let height = (self.height() as f64 * factor) as usize;
        let width = (self.width() as f64 * height as f64 / self.height() as f64)
            .round()
            .max(1.0) as usize;
        check_dimensions("scale", width, height, &PictureConfig::default())?;

        let filter = if smooth {
            FilterType::Triangle
        } else {
            FilterType::Nearest
        };
        let resized = imageops::resize(&self.to_rgb_image()?, width as u32, height as u32, filter);
        Ok(Self::from_rgb_image(&resized))
    }
}

/// Both dimensions of a new picture must lie in `1..=config.max_dimension`.
fn check_dimensions(
    context: &str,
    width: usize,
    height: usize,
    config: &PictureConfig,
) -> Result<()> {
    if width > config.max_dimension || height > config.max_dimension {
        return Err(MediaError::invalid(format!(
            "{context}: height and width must be at most {} each",
            config.max_dimension
        )));
    }
    if width == 0 || height == 0 {
        return Err(MediaError::invalid(format!(
            "{context}: height and width must be greater than 0 each"
        )));
    }
    Ok(())
}

/// Copies the overlapping part of `src`, placed at `(x, y)` in `dst`.
fn blit(src: &Rgb32Buffer, dst: &mut Rgb32Buffer, x: i64, y: i64) {
    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    let (dst_w, dst_h) = (dst.width() as i64, dst.height() as i64);

    let left = x.max(0);
    let right = (x + src_w).min(dst_w);
    let top = y.max(0);
    let bottom = (y + src_h).min(dst_h);
    if left >= right || top >= bottom {
        return;
    }

    let bpp = crate::pixels::BYTES_PER_PIXEL;
    let dst_cols = left as usize * bpp..right as usize * bpp;
    let src_cols = (left - x) as usize * bpp..(right - x) as usize * bpp;
    for ty in top..bottom {
        let row = src.scan_line((ty - y) as usize);
        dst.scan_line_mut(ty as usize)[dst_cols.clone()].copy_from_slice(&row[src_cols.clone()]);
    }
}

impl fmt::Display for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Picture, ")?;
        if let Some(path) = &self.file_name {
            write!(f, "filename {} ", path.display())?;
        }
        write!(f, "height {} width {}", self.height(), self.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, BLUE, RED};

    #[test]
    fn validates_dimensions() {
        assert!(Picture::blank(0, 10).is_err());
        assert!(Picture::blank(10_001, 10).is_err());
        let picture = Picture::empty(3, 2, BLUE).unwrap();
        assert_eq!(picture.to_string(), "Picture, height 2 width 3");
    }

    #[test]
    fn sets_and_reads_pixels() {
        let mut picture = Picture::empty(2, 2, BLACK).unwrap();
        picture.set_pixel_color(0, 0, RED).unwrap();

        assert_eq!(picture.pixel_color(0, 0).unwrap(), RED);
        assert_eq!(picture.pixel_color(1, 0).unwrap(), BLACK);
        assert_eq!(picture.pixel(0, 0).unwrap().to_string(), "Pixel red=255 green=0 blue=0");
    }

    #[test]
    fn reports_out_of_range_coordinates() {
        let mut picture = Picture::blank(4, 3).unwrap();
        let err = picture.pixel(4, 0).unwrap_err();
        assert_eq!(err.to_string(), "x (= 4) is less than 0 or bigger than the width (= 3)");
        let err = picture.set_pixel_color(0, 3, RED).unwrap_err();
        assert!(matches!(err, MediaError::PixelOutOfRange { axis: Axis::Y, .. }));
    }

    #[test]
    fn pixel_handles_clamp_components() {
        let mut picture = Picture::empty(1, 1, Color::new(10, 20, 30)).unwrap();
        let mut pixel = picture.pixel_mut(0, 0).unwrap();
        pixel.set_red(300);
        pixel.set_blue(-3);
        assert_eq!(pixel.color(), Color::new(255, 20, 0));
    }

    #[test]
    fn iterates_row_major_with_one_fetch_per_row() {
        let mut picture = Picture::blank(5, 4).unwrap();
        let coords: Vec<(usize, usize)> = picture.pixels().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords[..6], [(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (0, 1)]);
        assert_eq!(coords.len(), 20);
        assert_eq!(picture.row_fetches(), 4);
    }

    #[test]
    fn maps_colors_in_place() {
        let mut picture = Picture::empty(3, 3, Color::new(100, 150, 200)).unwrap();
        picture.map_colors(|color| color.darker());
        assert!(picture.pixels().all(|p| p.color == Color::new(70, 105, 140)));
    }

    #[test]
    fn crops_with_black_outside() {
        let mut picture = Picture::empty(4, 4, BLUE).unwrap();
        picture.set_pixel_color(2, 2, RED).unwrap();

        let mut cropped = picture.crop(2, 2, 3, 3).unwrap();
        assert_eq!(cropped.width(), 3);
        assert_eq!(cropped.pixel_color(0, 0).unwrap(), RED);
        assert_eq!(cropped.pixel_color(1, 1).unwrap(), BLUE);
        assert_eq!(cropped.pixel_color(2, 2).unwrap(), BLACK);

        assert!(picture.crop(4, 0, 1, 1).is_err());
        let mut shifted = picture.crop_with_cutoff(-1, -1, 2, 2).unwrap();
        assert_eq!(shifted.pixel_color(0, 0).unwrap(), BLACK);
        assert_eq!(shifted.pixel_color(1, 1).unwrap(), BLUE);
    }

    #[test]
    fn crop_regions_obey_the_size_limit() {
        let picture = Picture::empty(4, 4, BLUE).unwrap();
        for (width, height) in [(20_000, 1), (usize::MAX / 4, 8), (1, 10_001), (0, 3)] {
            let err = picture.crop_with_cutoff(0, 0, width, height).unwrap_err();
            assert!(matches!(err, MediaError::InvalidInput(_)), "{width}x{height}: {err}");
        }
        assert!(picture.crop(0, 0, 20_000, 1).is_err());
        assert!(picture.crop_with_cutoff(0, 0, 10_000, 1).is_ok());
    }

    #[test]
    fn copies_into_larger_picture() {
        let small = Picture::empty(2, 2, RED).unwrap();
        let mut big = Picture::empty(4, 4, BLACK).unwrap();

        small.copy_into(&mut big, 1, 1).unwrap();
        assert_eq!(big.pixel_color(1, 1).unwrap(), RED);
        assert_eq!(big.pixel_color(2, 2).unwrap(), RED);
        assert_eq!(big.pixel_color(3, 3).unwrap(), BLACK);

        let err = small.copy_into(&mut big, 3, 0).unwrap_err();
        assert!(err.to_string().contains("won't fit"));

        small.copy_into_with_cutoff(&mut big, 3, -1);
        assert_eq!(big.pixel_color(3, 0).unwrap(), RED);
        assert_eq!(big.pixel_color(3, 1).unwrap(), BLACK);
    }

    #[test]
    fn scales_by_factor() {
        let mut picture = Picture::empty(2, 2, BLACK).unwrap();
        picture.set_pixel_color(1, 1, RED).unwrap();

        let mut doubled = picture.scale(2.0, false).unwrap();
        assert_eq!((doubled.width(), doubled.height()), (4, 4));
        assert_eq!(doubled.pixel_color(3, 3).unwrap(), RED);
        assert_eq!(doubled.pixel_color(2, 2).unwrap(), RED);
        assert_eq!(doubled.pixel_color(1, 1).unwrap(), BLACK);

        let uniform = Picture::empty(4, 2, BLUE).unwrap();
        let mut smooth = uniform.scale(1.5, true).unwrap();
        assert_eq!((smooth.width(), smooth.height()), (6, 3));
        assert!(smooth.pixels().all(|p| p.color == BLUE));

        assert!(picture.scale(0.0, false).is_err());
        assert!(picture.scale(0.1, false).is_err());
    }

    #[test]
    fn scaling_past_the_size_limit_fails() {
        let picture = Picture::blank(2, 2).unwrap();
        let err = picture.scale(6000.0, false).unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
        assert!(err.to_string().contains("at most 10000"));
        assert!(picture.scale(f64::INFINITY, true).is_err());

        let wide = Picture::blank(10_000, 1).unwrap();
        assert!(wide.scale(2.0, false).is_err());
    }

    #[test]
    fn saves_and_reopens_png() {
        let mut picture = Picture::empty(3, 2, BLUE).unwrap();
        picture.set_pixel_color(2, 1, Color::new(1, 2, 3)).unwrap();
        let path = std::env::temp_dir().join(format!("media-lab-picture-{}.png", std::process::id()));

        picture.save(&path).unwrap();
        let mut loaded = Picture::open(&path).unwrap();
        assert_eq!(loaded.file_name(), Some(path.as_path()));
        assert_eq!(loaded.pixel_color(2, 1).unwrap(), Color::new(1, 2, 3));
        assert_eq!(loaded.pixel_color(0, 0).unwrap(), BLUE);

        assert!(picture.save(path.with_extension("")).is_err());
        std::fs::remove_file(path).unwrap();
    }
}
