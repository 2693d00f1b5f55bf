use rayon::prelude::*;

use crate::foundation::core::RenderSize;
use crate::foundation::error::{MixplayError, MixplayResult};

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Borrowed packed RGBA8 image.
#[derive(Clone, Copy, Debug)]
pub struct RgbaView<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: &'a [u8],
}

impl RgbaView<'_> {
    fn pixel(&self, x: usize, y: usize) -> Option<Rgba8> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        let i = (y * self.width as usize + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// Quantize an opacity scalar to `0..=255` after clamping into `[0,1]`.
pub fn opacity_to_u8(opacity: f32) -> u8 {
    let opacity = if opacity.is_nan() {
        0.0
    } else {
        opacity.clamp(0.0, 1.0)
    };
    ((opacity * 255.0).round() as i32).clamp(0, 255) as u8
}

/// Multiply only the alpha channel of `px` by `op` (`0..=255`).
pub fn scale_alpha(px: Rgba8, op: u8) -> Rgba8 {
    [px[0], px[1], px[2], mul_div255(px[3], op)]
}

/// Source-over of `fg` onto `bg` after scaling the foreground alpha by `opacity`.
///
/// `out.rgb = fg.rgb * a' + bg.rgb * (1 - a')`, `out.a = a' + bg.a * (1 - a')` with
/// `a' = fg.a * opacity`. All products round half up: `(x * y + 127) / 255`.
pub fn over(bg: Rgba8, fg: Rgba8, opacity: f32) -> Rgba8 {
    over_u8(bg, fg, opacity_to_u8(opacity))
}

fn over_u8(bg: Rgba8, fg: Rgba8, op: u8) -> Rgba8 {
    let fa = scale_alpha(fg, op)[3];
    if fa == 0 {
        return bg;
    }
    let inv = 255 - fa;

    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = mul_div255(fg[i], fa).saturating_add(mul_div255(bg[i], inv));
    }
    out[3] = fa.saturating_add(mul_div255(bg[3], inv));
    out
}

/// Composite `fg` over `bg` into the RGBA8 destination `dst` of `size`.
///
/// Both sources are anchored at the top-left. Destination pixels outside `bg` start transparent;
/// pixels outside `fg` keep the background. Rows are blended in parallel once the frame holds at
/// least `parallel_min_pixels` pixels (`0` disables parallelism).
pub fn composite_over_in_place(
    dst: &mut [u8],
    size: RenderSize,
    bg: RgbaView<'_>,
    fg: RgbaView<'_>,
    opacity: f32,
    parallel_min_pixels: usize,
) -> MixplayResult<()> {
    check_view(&bg)?;
    check_view(&fg)?;
    let row_bytes = check_dst(dst, size)?;
    if row_bytes == 0 {
        return Ok(());
    }
    let op = opacity_to_u8(opacity);

    let blend_row = |(y, row): (usize, &mut [u8])| {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let b = bg.pixel(x, y).unwrap_or([0; 4]);
            let out = match fg.pixel(x, y) {
                Some(f) => over_u8(b, f, op),
                None => b,
            };
            px.copy_from_slice(&out);
        }
    };

    if parallel_min_pixels > 0 && size.pixel_count() >= parallel_min_pixels {
        dst.par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(blend_row);
    } else {
        dst.chunks_exact_mut(row_bytes).enumerate().for_each(blend_row);
    }
    Ok(())
}

/// Copy `src` into the RGBA8 destination `dst` of `size` without any blending.
///
/// Same-sized sources are copied byte for byte.
pub fn copy_into(dst: &mut [u8], size: RenderSize, src: RgbaView<'_>) -> MixplayResult<()> {
    check_view(&src)?;
    let row_bytes = check_dst(dst, size)?;
    if src.width == size.width && src.height == size.height {
        dst.copy_from_slice(src.data);
        return Ok(());
    }
    if row_bytes == 0 {
        return Ok(());
    }
    for (y, row) in dst.chunks_exact_mut(row_bytes).enumerate() {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&src.pixel(x, y).unwrap_or([0; 4]));
        }
    }
    Ok(())
}

fn check_view(view: &RgbaView<'_>) -> MixplayResult<()> {
    let expected = (view.width as usize) * (view.height as usize) * 4;
    if view.data.len() != expected {
        return Err(MixplayError::render(format!(
            "source view {}x{} needs {expected} bytes, got {}",
            view.width,
            view.height,
            view.data.len()
        )));
    }
    Ok(())
}

fn check_dst(dst: &[u8], size: RenderSize) -> MixplayResult<usize> {
    if dst.len() != size.pixel_count() * 4 {
        return Err(MixplayError::render(
            "destination buffer does not match render size",
        ));
    }
    Ok(size.width as usize * 4)
}

fn mul_div255(x: u8, y: u8) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
