use crate::draw::geometry::ImageBounds;
use crate::draw::model::Color;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};

pub fn blank_surface(width: u32, height: u32, fill: Color) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(fill.to_rgba_array()))
}

/// Source-over blend of `top` onto `bottom`, straight (non-premultiplied) alpha.
pub fn blend_pixel(bottom: Color, top: Color) -> Color {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

pub fn blend_into(surface: &mut RgbaImage, x: u32, y: u32, color: Color) {
    if color.a == 0 {
        return;
    }
    let dst = surface.get_pixel_mut(x, y);
    let blended = blend_pixel(Color::from_rgba_array(dst.0), color);
    dst.0 = blended.to_rgba_array();
}

/// Composite a same-sized layer surface over `base`.
pub fn composite_over(base: &mut RgbaImage, top: &RgbaImage) {
    if base.dimensions() != top.dimensions() {
        tracing::warn!(
            base = ?base.dimensions(),
            top = ?top.dimensions(),
            "skipping composite of mismatched surfaces"
        );
        return;
    }
    for (dst, src) in base.pixels_mut().zip(top.pixels()) {
        if src.0[3] == 0 {
            continue;
        }
        let blended = blend_pixel(Color::from_rgba_array(dst.0), Color::from_rgba_array(src.0));
        dst.0 = blended.to_rgba_array();
    }
}

/// Draw `image` stretched into `bounds` on `surface`, clipped to the surface.
///
/// Exact-size placement at the origin copies pixels directly; downscaled placement resamples
/// once with a triangle filter; upscaled placement (zoomed-in viewport) samples nearest
/// source pixels only for the visible area.
pub fn draw_image_into(surface: &mut RgbaImage, image: &RgbaImage, bounds: ImageBounds) {
    let (iw, ih) = image.dimensions();
    if iw == 0 || ih == 0 || bounds.w <= 0.0 || bounds.h <= 0.0 {
        return;
    }

    let target_w = bounds.w.round() as u32;
    let target_h = bounds.h.round() as u32;
    let origin_x = bounds.x.round() as i64;
    let origin_y = bounds.y.round() as i64;

    if target_w == iw && target_h == ih {
        blit(surface, image, origin_x, origin_y);
        return;
    }

    if target_w <= iw && target_h <= ih && target_w > 0 && target_h > 0 {
        let resized = image::imageops::resize(image, target_w, target_h, FilterType::Triangle);
        blit(surface, &resized, origin_x, origin_y);
        return;
    }

    let (sw, sh) = surface.dimensions();
    let x0 = bounds.x.max(0.0).floor() as u32;
    let y0 = bounds.y.max(0.0).floor() as u32;
    let x1 = (bounds.x + bounds.w).min(sw as f32).ceil().max(0.0) as u32;
    let y1 = (bounds.y + bounds.h).min(sh as f32).ceil().max(0.0) as u32;
    for y in y0..y1.min(sh) {
        let v = (y as f32 + 0.5 - bounds.y) / bounds.h;
        if !(0.0..1.0).contains(&v) {
            continue;
        }
        let sy = ((v * ih as f32) as u32).min(ih - 1);
        for x in x0..x1.min(sw) {
            let u = (x as f32 + 0.5 - bounds.x) / bounds.w;
            if !(0.0..1.0).contains(&u) {
                continue;
            }
            let sx = ((u * iw as f32) as u32).min(iw - 1);
            let src = Color::from_rgba_array(image.get_pixel(sx, sy).0);
            blend_into(surface, x, y, src);
        }
    }
}

fn blit(surface: &mut RgbaImage, image: &RgbaImage, origin_x: i64, origin_y: i64) {
    let (sw, sh) = surface.dimensions();
    for (x, y, px) in image.enumerate_pixels() {
        let dx = origin_x + x as i64;
        let dy = origin_y + y as i64;
        if dx < 0 || dy < 0 || dx >= sw as i64 || dy >= sh as i64 {
            continue;
        }
        blend_into(surface, dx as u32, dy as u32, Color::from_rgba_array(px.0));
    }
}
