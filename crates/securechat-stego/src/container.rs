//! Picks the base raster a hidden payload rides on.
//!
//! Candidates come from a sticker directory. When it has none, a fallback
//! sticker is synthesized once and saved there, so later calls pick it up
//! like any other file.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, info, warn};

use crate::draw::{self, Shape};
use crate::error::StegoError;

pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 300;
pub const FALLBACK_FILE: &str = "fallback_sticker.png";

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

const BAND_PALETTE: [[u8; 3]; 5] = [
    [255, 182, 193],
    [173, 216, 230],
    [144, 238, 144],
    [255, 218, 185],
    [221, 160, 221],
];

const ACCENT_PALETTE: [[u8; 3]; 4] = [
    [255, 255, 0],
    [255, 0, 255],
    [0, 255, 255],
    [255, 140, 0],
];

pub struct ContainerSelector {
    dir: PathBuf,
}

impl ContainerSelector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Image files in the sticker directory, sorted by path. An unreadable
    /// directory counts as empty.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read sticker directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();
        paths
    }

    /// Uniformly pick a candidate and load it, synthesizing the fallback
    /// sticker when there is nothing to pick from.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RgbImage, StegoError> {
        let candidates = self.candidates();

        if let Some(path) = candidates.choose(rng) {
            debug!("Selected sticker {}", path.display());
            let img = image::open(path).map_err(|e| {
                StegoError::ContainerUnavailable(format!("{}: {}", path.display(), e))
            })?;
            return Ok(img.to_rgb8());
        }

        info!("No stickers in {}, synthesizing fallback", self.dir.display());
        let img = synthesize_fallback(rng);
        if let Err(e) = self.persist_fallback(&img) {
            warn!("Could not save fallback sticker: {}", e);
        }
        Ok(img)
    }

    fn persist_fallback(&self, img: &RgbImage) -> Result<PathBuf, StegoError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(FALLBACK_FILE);
        img.save(&path)?;
        info!("Created fallback sticker at {}", path.display());
        Ok(path)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Shrink to fit within the canonical canvas, keeping the aspect ratio.
/// Smaller images are returned as is.
pub fn fit_canvas(img: RgbImage) -> RgbImage {
    if img.width() <= CANVAS_WIDTH && img.height() <= CANVAS_HEIGHT {
        return img;
    }
    DynamicImage::ImageRgb8(img)
        .resize(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
        .to_rgb8()
}

/// Composite one to three faint, light-colored shapes for visual variety.
pub fn perturb<R: Rng + ?Sized>(img: &RgbImage, rng: &mut R) -> RgbImage {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut out = img.clone();
    if w == 0 || h == 0 {
        return out;
    }

    for _ in 0..rng.random_range(1..=3) {
        let shape = if rng.random_bool(0.5) { Shape::Circle } else { Shape::Rectangle };
        let color = Rgb([
            rng.random_range(200..=255),
            rng.random_range(200..=255),
            rng.random_range(200..=255),
        ]);
        let alpha = rng.random_range(30..=80);
        let size: i64 = match shape {
            Shape::Circle => rng.random_range(5..=15),
            Shape::Rectangle => rng.random_range(5..=25),
        };
        let x = rng.random_range(0..w);
        let y = rng.random_range(0..h);

        out = draw::blend_shape(&out, shape, (x, y, x + size, y + size), color, alpha);
    }
    out
}

/// Pastel bands, a few bright blobs and a "FALLBACK" caption.
pub fn synthesize_fallback<R: Rng + ?Sized>(rng: &mut R) -> RgbImage {
    let (w, h) = (CANVAS_WIDTH as i64, CANVAS_HEIGHT as i64);
    let mut img = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgb([255, 255, 255]));

    let mut bands = BAND_PALETTE;
    bands.shuffle(rng);
    let band_w = w / bands.len() as i64;
    for (i, color) in bands.iter().enumerate() {
        let x0 = i as i64 * band_w;
        draw::fill_rect(&mut img, x0, 0, x0 + band_w, h, Rgb(*color));
    }

    for _ in 0..rng.random_range(2..=4) {
        let color = Rgb(*ACCENT_PALETTE.choose(rng).unwrap_or(&ACCENT_PALETTE[0]));
        let size = rng.random_range(50..=100);
        let x = rng.random_range(0..w - size);
        let y = rng.random_range(0..h - size);
        if rng.random_bool(0.6) {
            draw::fill_ellipse(&mut img, x, y, x + size, y + size, color);
        } else {
            draw::fill_rect(&mut img, x, y, x + size, y + size / 2, color);
        }
    }

    let scale = 3;
    let cx = (w - draw::caption_width("FALLBACK", scale)) / 2;
    let cy = (h - draw::caption_height(scale)) / 2;
    draw::draw_caption(&mut img, cx, cy, "FALLBACK", Rgb([0, 0, 0]), scale);
    img
}

/// Last-resort carrier: solid pink with a caption. Needs no I/O.
pub fn placeholder() -> RgbImage {
    let mut img = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgb([255, 182, 193]));
    draw::draw_caption(&mut img, 50, 150, "ENCRYPTED STICKER MESSAGE", Rgb([0, 0, 0]), 2);
    img
}
