//! Dimension policy for the inpainting model's size constraints
//!
//! The model requires both dimensions to be multiples of 8 and works best
//! between 512 and 768 pixels per side.

const TARGET_MAX_DIM: u32 = 768;
const MIN_DIM: u32 = 512;

/// Round a dimension down to the nearest multiple of 8
fn floor_to_multiple_of_8(value: u32) -> u32 {
    (value / 8) * 8
}

/// Compute the resize target for a source image.
///
/// The longer side is scaled to 768 and the shorter side follows the aspect
/// ratio, both floored to multiples of 8. If either side lands below 512 it is
/// raised to 512 and the other side is re-derived from the aspect ratio, again
/// floored to a multiple of 8 and clamped to at least 512. The correction runs
/// once; it is not iterated to a fixed point, so extreme aspect ratios trade
/// aspect fidelity for the size floor.
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    debug_assert!(width > 0 && height > 0);
    let aspect = width as f64 / height as f64;

    let (mut new_width, mut new_height) = if width > height {
        let w = TARGET_MAX_DIM;
        (w, (w as f64 / aspect).round() as u32)
    } else {
        let h = TARGET_MAX_DIM;
        ((h as f64 * aspect).round() as u32, h)
    };

    new_width = floor_to_multiple_of_8(new_width);
    new_height = floor_to_multiple_of_8(new_height);

    if new_width < MIN_DIM || new_height < MIN_DIM {
        if new_width < new_height {
            new_width = new_width.max(MIN_DIM);
            new_height = floor_to_multiple_of_8((new_width as f64 / aspect).round() as u32);
            new_height = new_height.max(floor_to_multiple_of_8(MIN_DIM));
        } else {
            new_height = new_height.max(MIN_DIM);
            new_width = floor_to_multiple_of_8((new_height as f64 * aspect).round() as u32);
            new_width = new_width.max(floor_to_multiple_of_8(MIN_DIM));
        }
    }

    (new_width, new_height)
}
