//! Centred, rotated placement of one raster onto another.
//!
//! Both renderers use the same canvas model: translate to the output centre,
//! rotate, then draw the source centred at an offset with a given size.
//! Here that is evaluated by inverse mapping: every output pixel centre is
//! carried back through the rotation into the source's local frame and
//! sampled there. Pixels the source does not cover keep the canvas colour.
//!
//! For a clockwise rotation θ (y axis down) the inverse is:
//! ```text
//! local_x =  cos(θ) * u + sin(θ) * v - offset_x
//! local_y = -sin(θ) * u + cos(θ) * v - offset_y
//! ```
//! where `(u, v)` is the output pixel centre relative to the output centre.

use crate::decode::{DecodedImage, FilterType};

/// Where and how large the source lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Horizontal offset of the source centre from the canvas centre, in
    /// output pixels, measured in the rotated frame.
    pub offset_x: f64,
    /// Vertical offset, likewise.
    pub offset_y: f64,
    /// Drawn width in output pixels.
    pub width: f64,
    /// Drawn height in output pixels.
    pub height: f64,
    /// Clockwise rotation about the canvas centre, in degrees.
    pub rotation: f64,
}

impl Placement {
    /// True when the placement would draw at least some area.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
            && self.rotation.is_finite()
    }
}

/// Draw `source` onto `canvas` according to `placement`.
///
/// Nothing is drawn if the placement is degenerate or either raster is empty.
pub fn draw_transformed(
    canvas: &mut DecodedImage,
    source: &DecodedImage,
    placement: &Placement,
    filter: FilterType,
) {
    if canvas.is_empty() || source.is_empty() || !placement.is_drawable() {
        return;
    }

    let angle = placement.rotation.to_radians();
    let cos = angle.cos();
    let sin = angle.sin();

    let cx = canvas.width as f64 / 2.0;
    let cy = canvas.height as f64 / 2.0;
    let half_w = placement.width / 2.0;
    let half_h = placement.height / 2.0;

    // Output pixels per source pixel along each axis
    let step_x = source.width as f64 / placement.width;
    let step_y = source.height as f64 / placement.height;

    let out_w = canvas.width as usize;
    for py in 0..canvas.height {
        let v = py as f64 + 0.5 - cy;
        for px in 0..canvas.width {
            let u = px as f64 + 0.5 - cx;

            let local_x = cos * u + sin * v - placement.offset_x;
            let local_y = -sin * u + cos * v - placement.offset_y;

            if local_x < -half_w || local_x >= half_w || local_y < -half_h || local_y >= half_h {
                continue;
            }

            // Pixel-centre convention: source pixel i covers [i, i + 1)
            let src_x = (local_x + half_w) * step_x - 0.5;
            let src_y = (local_y + half_h) * step_y - 0.5;

            let pixel = match filter {
                FilterType::Nearest => sample_nearest(source, src_x, src_y),
                FilterType::Bilinear => sample_bilinear(source, src_x, src_y),
                FilterType::Lanczos3 => sample_lanczos3(source, src_x, src_y),
            };

            let idx = (py as usize * out_w + px as usize) * 3;
            canvas.pixels[idx..idx + 3].copy_from_slice(&pixel);
        }
    }
}

/// Get a pixel as [f64; 3], clamping the coordinate to the image edge.
#[inline]
fn get_pixel_f64(image: &DecodedImage, px: i64, py: i64) -> [f64; 3] {
    let x = px.clamp(0, image.width as i64 - 1) as usize;
    let y = py.clamp(0, image.height as i64 - 1) as usize;
    let idx = (y * image.width as usize + x) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

fn sample_nearest(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let px = (x + 0.5).floor() as i64;
    let py = (y + 0.5).floor() as i64;
    let p = get_pixel_f64(image, px, py);
    [p[0] as u8, p[1] as u8, p[2] as u8]
}

/// Sample a pixel using bilinear interpolation over the 4 nearest pixels.
///
/// Coordinates outside the image are clamped to the edge, so the border of
/// the drawn area repeats the source's outermost pixels.
fn sample_bilinear(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x0 + 1, y0);
    let p01 = get_pixel_f64(image, x0, y0 + 1);
    let p11 = get_pixel_f64(image, x0 + 1, y0 + 1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

/// Sample a pixel using Lanczos3 interpolation over a 6x6 neighbourhood.
fn sample_lanczos3(image: &DecodedImage, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (image.width as i64, image.height as i64);

    // Kernel does not fit: too small to benefit, fall back
    if w < 6 || h < 6 {
        return sample_bilinear(image, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        let py = y0 + ky;
        let wy = lanczos_weight(y - py as f64, 3.0);
        if wy == 0.0 {
            continue;
        }
        for kx in -2..=3 {
            let px = x0 + kx;
            let weight = lanczos_weight(x - px as f64, 3.0) * wy;

            let pixel = get_pixel_f64(image, px, py);
            sum[0] += pixel[0] * weight;
            sum[1] += pixel[1] * weight;
            sum[2] += pixel[2] * weight;
            weight_sum += weight;
        }
    }

    let mut result = [0u8; 3];
    if weight_sum > 0.0 {
        for i in 0..3 {
            result[i] = (sum[i] / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }

    result
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
