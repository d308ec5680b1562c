//! Frame counter overlay.
//!
//! Numbers are drawn as seven-segment digits built from filled rectangles so
//! no font file has to ship with the binary. Each digit is drawn twice: a
//! black shadow offset down-right, then the white glyph on top, which keeps
//! the counter legible on both bright and dark arena footage.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Top-left corner of the counter.
pub const COUNTER_ORIGIN: (i32, i32) = (10, 10);

const FOREGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const SHADOW: Rgb<u8> = Rgb([0, 0, 0]);

// Segment bits: a=top, b=upper right, c=lower right, d=bottom, e=lower left,
// f=upper left, g=middle.
const SEG_A: u8 = 1 << 0;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

const DIGIT_SEGMENTS: [u8; 10] = [
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
    SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
    SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
    SEG_F | SEG_G | SEG_B | SEG_C,
    SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
    SEG_A | SEG_F | SEG_G | SEG_E | SEG_C | SEG_D,
    SEG_A | SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
];

/// Digit cell geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
    pub stroke: u32,
    pub spacing: u32,
    pub shadow: i32,
}

impl GlyphMetrics {
    /// Metrics scaled to the frame height, 24px tall digits at 480 lines.
    pub fn for_frame_height(frame_height: u32) -> Self {
        let scale = (frame_height / 480).max(1);
        Self {
            width: 12 * scale,
            height: 24 * scale,
            stroke: 3 * scale,
            spacing: 4 * scale,
            shadow: 2 * scale as i32,
        }
    }

    /// Horizontal advance from one digit to the next.
    pub fn advance(&self) -> u32 {
        self.width + self.spacing
    }
}

/// Draw `frame_number` in the top-left corner of `frame`.
pub fn draw_frame_number(frame: &mut RgbImage, frame_number: u64) {
    let metrics = GlyphMetrics::for_frame_height(frame.height());
    let text = frame_number.to_string();
    let (x0, y0) = COUNTER_ORIGIN;

    for (layer, color) in [(metrics.shadow, SHADOW), (0, FOREGROUND)] {
        for (i, ch) in text.chars().enumerate() {
            let Some(digit) = ch.to_digit(10) else {
                continue;
            };
            let x = x0 + layer + (i as u32 * metrics.advance()) as i32;
            draw_digit(frame, digit as usize, x, y0 + layer, &metrics, color);
        }
    }
}

fn draw_digit(
    frame: &mut RgbImage,
    digit: usize,
    x: i32,
    y: i32,
    m: &GlyphMetrics,
    color: Rgb<u8>,
) {
    let segments = DIGIT_SEGMENTS[digit];
    let w = m.width as i32;
    let h = m.height as i32;
    let t = m.stroke as i32;
    let half = h / 2;

    // (bit, x, y, width, height) relative to the cell origin.
    let rects = [
        (SEG_A, 0, 0, w, t),
        (SEG_B, w - t, 0, t, half),
        (SEG_C, w - t, half, t, h - half),
        (SEG_D, 0, h - t, w, t),
        (SEG_E, 0, half, t, h - half),
        (SEG_F, 0, 0, t, half),
        (SEG_G, 0, half - t / 2, w, t),
    ];

    for (bit, dx, dy, rw, rh) in rects {
        if segments & bit != 0 && rw > 0 && rh > 0 {
            let rect = Rect::at(x + dx, y + dy).of_size(rw as u32, rh as u32);
            draw_filled_rect_mut(frame, rect, color);
        }
    }
}
