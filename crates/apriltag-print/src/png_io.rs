use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use apriltag_core::GrayImage;

use crate::RenderError;

/// Write a grayscale image as an 8-bit PNG.
pub fn write_png(image: &GrayImage, path: &Path) -> Result<(), RenderError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        image.width as u32,
        image.height as u32,
    );
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_tag;
    use apriltag_families::builtins::TAG36H11;

    #[test]
    fn writes_a_decodable_png_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tag.png");
        let img = render_tag(TAG36H11, 0, 6, 1).expect("render");
        write_png(&img, &path).expect("write png");

        let meta = std::fs::metadata(&path).expect("stat");
        assert!(meta.len() > 8);
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
