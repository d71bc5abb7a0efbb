use ab_glyph::{FontVec, PxScale};
use chrono::NaiveDateTime;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

const TIMESTAMP_COLOR: Rgba<u8> = Rgba([255, 140, 0, 255]);
const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
const SHADOW_OFFSET: i32 = 2;
/// Font height as a fraction of image height.
const FONT_SIZE_RATIO: f32 = 0.03;
const MIN_FONT_SIZE: u32 = 12;
/// Distance from the right and bottom edges as a fraction of each dimension.
const MARGIN_RATIO: f32 = 0.02;
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Candidate scalable fonts, tried in order. Collections (.ttc) are skipped
/// by the parse failure path.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draw the formatted date into the bottom-right corner of the image.
///
/// The input is not mutated. The returned image has identical dimensions and,
/// for plain RGB and grayscale inputs, the same color mode; alpha-carrying
/// inputs come back as RGBA.
pub fn render_timestamp(image: &DynamicImage, date: NaiveDateTime) -> DynamicImage {
    let mut base = image.to_rgba8();
    let (width, height) = base.dimensions();
    let mut layer = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

    let text = date.format(DATE_FORMAT).to_string();
    let font = StampFont::load(height);
    let (text_width, text_height) = font.measure(&text);

    let margin_x = (width as f32 * MARGIN_RATIO) as i32;
    let margin_y = (height as f32 * MARGIN_RATIO) as i32;
    // Anchored bottom-right. May go negative for tiny images; drawing is
    // bounds-checked, so oversized text just renders partially.
    let x = width as i32 - margin_x - text_width as i32;
    let y = height as i32 - margin_y - text_height as i32;

    font.draw(&mut layer, SHADOW_COLOR, x + SHADOW_OFFSET, y + SHADOW_OFFSET, &text);
    font.draw(&mut layer, TIMESTAMP_COLOR, x, y, &text);

    imageops::overlay(&mut base, &layer, 0, 0);

    match image {
        DynamicImage::ImageRgb8(_) => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8())
        }
        DynamicImage::ImageLuma8(_) => {
            DynamicImage::ImageLuma8(DynamicImage::ImageRgba8(base).to_luma8())
        }
        _ => DynamicImage::ImageRgba8(base),
    }
}

enum StampFont {
    Scalable { font: FontVec, scale: PxScale },
    Builtin { factor: u32 },
}

impl StampFont {
    /// Scalable system font when one can be found, built-in glyphs otherwise.
    fn load(image_height: u32) -> StampFont {
        let size = font_size_for(image_height);

        for path in FONT_SEARCH_PATHS {
            let Ok(data) = std::fs::read(path) else {
                continue;
            };
            match FontVec::try_from_vec(data) {
                Ok(font) => {
                    debug!("stamp font loaded from {}", path);
                    return StampFont::Scalable {
                        font,
                        scale: PxScale::from(size as f32),
                    };
                }
                Err(_) => debug!("could not parse font at {}", path),
            }
        }

        debug!("no scalable font available, using built-in glyphs");
        StampFont::Builtin {
            factor: (size / (glyphs::HEIGHT + 1)).max(1),
        }
    }

    /// Pixel bounding box of `text` at this font's size.
    fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            StampFont::Scalable { font, scale } => text_size(*scale, font, text),
            StampFont::Builtin { factor } => glyphs::measure(text, *factor),
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, text: &str) {
        match self {
            StampFont::Scalable { font, scale } => {
                draw_text_mut(canvas, color, x, y, *scale, font, text);
            }
            StampFont::Builtin { factor } => {
                glyphs::draw(canvas, color, x, y, text, *factor);
            }
        }
    }
}

fn font_size_for(image_height: u32) -> u32 {
    ((image_height as f32 * FONT_SIZE_RATIO) as u32).max(MIN_FONT_SIZE)
}

/// Fixed 5x7 glyph set covering the characters a rendered date can contain.
/// Used only when no scalable font is installed.
mod glyphs {
    use image::{Rgba, RgbaImage};

    pub const WIDTH: u32 = 5;
    pub const HEIGHT: u32 = 7;
    const SPACING: u32 = 1;

    /// Row bitmaps, most significant of the low five bits = leftmost column.
    fn rows(c: char) -> Option<[u8; HEIGHT as usize]> {
        Some(match c {
            '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
            '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
            '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
            '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
            '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
            '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
            '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
            '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
            '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
            '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
            '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
            ' ' => [0; HEIGHT as usize],
            _ => return None,
        })
    }

    pub fn measure(text: &str, factor: u32) -> (u32, u32) {
        let count = text.chars().count() as u32;
        if count == 0 {
            return (0, 0);
        }
        let advance = (WIDTH + SPACING) * factor;
        (count * advance - SPACING * factor, HEIGHT * factor)
    }

    pub fn draw(canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, text: &str, factor: u32) {
        let (width, height) = canvas.dimensions();
        let advance = ((WIDTH + SPACING) * factor) as i32;

        for (index, c) in text.chars().enumerate() {
            let Some(bitmap) = rows(c) else {
                continue;
            };
            let origin_x = x + index as i32 * advance;

            for (row, bits) in bitmap.iter().enumerate() {
                for col in 0..WIDTH {
                    if bits & (1 << (WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    // Fill the scaled cell for this glyph pixel.
                    for dy in 0..factor {
                        for dx in 0..factor {
                            let px = origin_x + (col * factor + dx) as i32;
                            let py = y + (row as u32 * factor + dy) as i32;
                            if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                                canvas.put_pixel(px as u32, py as u32, color);
                            }
                        }
                    }
                }
            }
        }
    }
}
