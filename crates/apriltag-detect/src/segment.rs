//! Connected-component extraction over the binarized image.

use crate::threshold::BinaryImage;

/// One 8-connected foreground component.
pub(crate) struct Component {
    /// Member pixel coordinates, in discovery order.
    pub pixels: Vec<(i32, i32)>,
}

/// Collect 8-connected foreground components with at least `min_pixels`
/// members. Scan order is row-major, so output order is deterministic.
pub(crate) fn find_components(bin: &BinaryImage, min_pixels: usize) -> Vec<Component> {
    let (w, h) = (bin.width as i32, bin.height as i32);
    let mut visited = vec![false; bin.data.len()];
    let mut out = Vec::new();
    let mut stack: Vec<(i32, i32)> = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            let sidx = (sy * w + sx) as usize;
            if visited[sidx] || bin.data[sidx] == 0 {
                continue;
            }

            let mut pixels = Vec::new();
            visited[sidx] = true;
            stack.push((sx, sy));

            while let Some((x, y)) = stack.pop() {
                pixels.push((x, y));
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (nx, ny) = (x + dx, y + dy);
                        if nx < 0 || ny < 0 || nx >= w || ny >= h {
                            continue;
                        }
                        let nidx = (ny * w + nx) as usize;
                        if !visited[nidx] && bin.data[nidx] == 1 {
                            visited[nidx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            if pixels.len() >= min_pixels {
                out.push(Component { pixels });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_from_rows(rows: &[&[u8]]) -> BinaryImage {
        let height = rows.len();
        let width = rows[0].len();
        let mut data = Vec::with_capacity(width * height);
        for r in rows {
            data.extend_from_slice(r);
        }
        BinaryImage {
            width,
            height,
            data,
        }
    }

    #[test]
    fn separate_blobs_are_separate_components() {
        let bin = bin_from_rows(&[
            &[1, 1, 0, 0, 1],
            &[1, 1, 0, 0, 1],
            &[0, 0, 0, 0, 0],
        ]);
        let comps = find_components(&bin, 1);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].pixels.len(), 4);
        assert_eq!(comps[1].pixels.len(), 2);
    }

    #[test]
    fn diagonal_pixels_connect() {
        let bin = bin_from_rows(&[
            &[1, 0, 0],
            &[0, 1, 0],
            &[0, 0, 1],
        ]);
        let comps = find_components(&bin, 1);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].pixels.len(), 3);
    }

    #[test]
    fn small_components_are_dropped() {
        let bin = bin_from_rows(&[
            &[1, 0, 0],
            &[0, 0, 0],
            &[0, 0, 0],
        ]);
        assert!(find_components(&bin, 2).is_empty());
    }

    #[test]
    fn component_touching_every_edge_is_collected() {
        let bin = bin_from_rows(&[
            &[1, 1, 1],
            &[1, 0, 1],
            &[1, 1, 1],
        ]);
        let comps = find_components(&bin, 1);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].pixels.len(), 8);
    }
}
