//! Single-tag bitmap rasterization.

use apriltag_core::GrayImage;
use apriltag_families::TagFamily;

use crate::RenderError;

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// Render one tag as a grayscale bitmap.
///
/// The output contains, from the outside in: `margin_modules` of white quiet
/// zone, one black border module per side, and the `dim x dim` payload grid.
/// Each module is `px_per_module` pixels square. Payload bits follow the
/// family convention: row-major, black = 1.
pub fn render_tag(
    family: TagFamily,
    id: u32,
    px_per_module: usize,
    margin_modules: usize,
) -> Result<GrayImage, RenderError> {
    if id as usize >= family.len() {
        return Err(RenderError::IdOutOfRange {
            id,
            family: family.name,
            len: family.len(),
        });
    }
    if px_per_module == 0 {
        return Err(RenderError::ZeroScale);
    }

    let code = family.codes[id as usize];
    let total = family.total_dim() + 2 * margin_modules;
    let side = total * px_per_module;
    let mut img = GrayImage::filled(side, side, WHITE);

    for my in 0..total {
        for mx in 0..total {
            let value = module_value(family, code, mx, my, margin_modules);
            if value == WHITE {
                continue;
            }
            for yy in 0..px_per_module {
                let row = (my * px_per_module + yy) * side;
                let x0 = mx * px_per_module;
                img.data[row + x0..row + x0 + px_per_module].fill(value);
            }
        }
    }

    Ok(img)
}

/// Color of one module in the full (quiet zone + border + payload) grid.
fn module_value(
    family: TagFamily,
    code: u64,
    mx: usize,
    my: usize,
    margin_modules: usize,
) -> u8 {
    let total_dim = family.total_dim();
    let inner = margin_modules..margin_modules + total_dim;
    if !inner.contains(&mx) || !inner.contains(&my) {
        return WHITE; // quiet zone
    }

    let bx = mx - margin_modules;
    let by = my - margin_modules;
    let on_border = bx == 0 || by == 0 || bx + 1 == total_dim || by + 1 == total_dim;
    if on_border {
        return BLACK;
    }

    let px = bx - 1;
    let py = by - 1;
    let bit = (code >> (py * family.dim + px)) & 1;
    if bit == 1 {
        BLACK
    } else {
        WHITE
    }
}
