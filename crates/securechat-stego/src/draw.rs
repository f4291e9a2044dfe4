//! Minimal raster drawing on top of `image` buffers: filled rectangles,
//! filled ellipses, translucent overlays and a blocky caption font.

use image::{ImageBuffer, Pixel, Rgb, RgbImage, Rgba, RgbaImage, imageops};

/// Fill the half-open box `[x0, x1) x [y0, y1)`, clipped to the image.
pub fn fill_rect<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: P,
) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in y0.max(0)..y1.min(h) {
        for x in x0.max(0)..x1.min(w) {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Fill the ellipse inscribed in the box `[x0, x1) x [y0, y1)`.
pub fn fill_ellipse<P: Pixel>(
    img: &mut ImageBuffer<P, Vec<P::Subpixel>>,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: P,
) {
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    let (w, h) = (img.width() as i64, img.height() as i64);
    let cx = (x0 + x1) as f64 / 2.0;
    let cy = (y0 + y1) as f64 / 2.0;
    let rx = (x1 - x0) as f64 / 2.0;
    let ry = (y1 - y0) as f64 / 2.0;

    for y in y0.max(0)..y1.min(h) {
        for x in x0.max(0)..x1.min(w) {
            let dx = (x as f64 + 0.5 - cx) / rx;
            let dy = (y as f64 + 0.5 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Rectangle,
}

/// Draw `shape` in `color` with alpha `alpha` onto `base` by compositing a
/// transparent RGBA overlay and flattening back to RGB.
pub fn blend_shape(
    base: &RgbImage,
    shape: Shape,
    bounds: (i64, i64, i64, i64),
    color: Rgb<u8>,
    alpha: u8,
) -> RgbImage {
    let mut overlay = RgbaImage::new(base.width(), base.height());
    let [r, g, b] = color.0;
    let fill = Rgba([r, g, b, alpha]);
    let (x0, y0, x1, y1) = bounds;
    match shape {
        Shape::Circle => fill_ellipse(&mut overlay, x0, y0, x1, y1, fill),
        Shape::Rectangle => fill_rect(&mut overlay, x0, y0, x1, y1, fill),
    }

    let mut canvas = image::DynamicImage::ImageRgb8(base.clone()).to_rgba8();
    imageops::overlay(&mut canvas, &overlay, 0, 0);
    image::DynamicImage::ImageRgba8(canvas).to_rgb8()
}

const GLYPH_W: i64 = 5;
const GLYPH_H: i64 = 7;

// 5x7 bitmaps, one row per byte, bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        _ => return None,
    };
    Some(rows)
}

/// Stamp `text` at `(x, y)` with each font pixel drawn as a `scale`-sized
/// square. Characters outside the font render as blanks.
pub fn draw_caption(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, scale: i64) {
    let advance = (GLYPH_W + 1) * scale;
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let gx = x + i as i64 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                    let px = gx + col * scale;
                    let py = y + row as i64 * scale;
                    fill_rect(img, px, py, px + scale, py + scale, color);
                }
            }
        }
    }
}

/// Width in pixels `draw_caption` would use for `text`.
pub fn caption_width(text: &str, scale: i64) -> i64 {
    text.chars().count() as i64 * (GLYPH_W + 1) * scale
}

pub fn caption_height(scale: i64) -> i64 {
    GLYPH_H * scale
}
