//! Raster drawing primitives on top of `imageproc`.
//!
//! Coordinates follow the flyer layout: `(x0, y0)` top-left inclusive,
//! `(x1, y1)` bottom-right exclusive, in canvas pixels. Anything outside the
//! canvas is clipped.

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut, draw_text_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

pub fn fill_rect(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let (w, h) = (x1 - x0, y1 - y0);
    if w <= 0 || h <= 0 {
        return;
    }
    draw_filled_rect_mut(canvas, Rect::at(x0, y0).of_size(w as u32, h as u32), color);
}

/// Rectangle with circular corners of `radius` (shrunk to fit small boxes).
pub fn fill_rounded_rect(
    canvas: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: i32,
    color: Rgba<u8>,
) {
    let (w, h) = (x1 - x0, y1 - y0);
    if w <= 0 || h <= 0 {
        return;
    }
    let r = radius.min(w / 2).min(h / 2).max(0);
    if r == 0 {
        fill_rect(canvas, x0, y0, x1, y1, color);
        return;
    }
    fill_rect(canvas, x0 + r, y0, x1 - r, y1, color);
    fill_rect(canvas, x0, y0 + r, x1, y1 - r, color);
    for (cx, cy) in [
        (x0 + r, y0 + r),
        (x1 - r - 1, y0 + r),
        (x0 + r, y1 - r - 1),
        (x1 - r - 1, y1 - r - 1),
    ] {
        draw_filled_circle_mut(canvas, (cx, cy), r, color);
    }
}

/// Circle inscribed in the square `[x, y] – [x + diameter, y + diameter]`.
pub fn fill_circle(canvas: &mut RgbaImage, x: i32, y: i32, diameter: i32, color: Rgba<u8>) {
    let r = diameter / 2;
    draw_filled_circle_mut(canvas, (x + r, y + r), r, color);
}

/// Filled polygon. The outline is closed implicitly.
pub fn fill_polygon(canvas: &mut RgbaImage, points: &[(i32, i32)], color: Rgba<u8>) {
    let mut poly: Vec<Point<i32>> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
    // imageproc rejects an explicitly closed outline.
    if poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 3 {
        return;
    }
    draw_polygon_mut(canvas, &poly, color);
}

/// Draw `text` with its top-left corner at `(x, y)`.
pub fn text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    px: f32,
    x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
) {
    if text.is_empty() {
        return;
    }
    draw_text_mut(canvas, color, x, y, PxScale::from(px), font, text);
}

/// Alpha-blend `top` onto `canvas` at `(x, y)`.
pub fn paste(canvas: &mut RgbaImage, top: &RgbaImage, x: i32, y: i32) {
    imageops::overlay(canvas, top, i64::from(x), i64::from(y));
}

/// Scale and centre-crop `img` so it covers exactly `width × height`.
pub fn cover(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    img.resize_to_fill(width, height, FilterType::Lanczos3).to_rgba8()
}

/// Scale `img` (up or down) to the largest size that fits inside
/// `width × height`, keeping its aspect ratio.
pub fn contain(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    img.resize(width, height, FilterType::Lanczos3).to_rgba8()
}

/// Like [`contain`] but never enlarges.
pub fn shrink_to_fit(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    if img.width() <= width && img.height() <= height {
        img.to_rgba8()
    } else {
        contain(img, width, height)
    }
}

/// Blend a uniform translucent black over the whole image.
pub fn darken(img: &mut RgbaImage, alpha: u8) {
    let shade = RgbaImage::from_pixel(img.width(), img.height(), Rgba([0, 0, 0, alpha]));
    imageops::overlay(img, &shade, 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn rounded_rect_leaves_corners_clear() {
        let mut canvas = RgbaImage::from_pixel(100, 100, WHITE);
        fill_rounded_rect(&mut canvas, 10, 10, 90, 60, 20, RED);
        assert_eq!(*canvas.get_pixel(50, 30), RED);
        assert_eq!(*canvas.get_pixel(11, 11), WHITE);
        assert_eq!(*canvas.get_pixel(88, 58), WHITE);
        assert_eq!(*canvas.get_pixel(5, 30), WHITE);
    }

    #[test]
    fn degenerate_shapes_are_ignored() {
        let mut canvas = RgbaImage::from_pixel(20, 20, WHITE);
        fill_rect(&mut canvas, 10, 10, 10, 15, RED);
        fill_rounded_rect(&mut canvas, 10, 10, 5, 15, 3, RED);
        fill_polygon(&mut canvas, &[(1, 1), (5, 5)], RED);
        assert!(canvas.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn closed_polygon_outline_is_accepted() {
        let mut canvas = RgbaImage::from_pixel(50, 50, WHITE);
        fill_polygon(&mut canvas, &[(0, 0), (40, 0), (40, 40), (0, 40), (0, 0)], RED);
        assert_eq!(*canvas.get_pixel(20, 20), RED);
    }

    #[test]
    fn shrink_never_enlarges() {
        let small = DynamicImage::new_rgba8(100, 40);
        let out = shrink_to_fit(&small, 550, 550);
        assert_eq!(out.dimensions(), (100, 40));

        let large = DynamicImage::new_rgba8(1100, 550);
        let out = shrink_to_fit(&large, 550, 550);
        assert_eq!(out.dimensions(), (550, 275));
    }

    #[test]
    fn contain_enlarges_to_fit() {
        let logo = DynamicImage::new_rgba8(100, 50);
        let out = contain(&logo, 391, 391);
        assert_eq!(out.width(), 391);
        assert!(out.height() <= 391);
    }

    #[test]
    fn cover_fills_exact_box() {
        let photo = DynamicImage::new_rgba8(300, 300);
        assert_eq!(cover(&photo, 250, 100).dimensions(), (250, 100));
    }

    #[test]
    fn darken_lowers_brightness() {
        let mut img = RgbaImage::from_pixel(4, 4, WHITE);
        darken(&mut img, 60);
        let p = img.get_pixel(0, 0);
        assert!(p[0] < 255 && p[0] > 150, "got {p:?}");
        assert_eq!(p[3], 255);
    }
}
