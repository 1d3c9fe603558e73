use image::ImageError;
use miniz_oxide::deflate::compress_to_vec_zlib;

const COMPRESSION_LEVEL: u8 = 6;

/// A decoded logo ready to embed as a FlateDecode RGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    /// zlib-compressed 8-bit RGB samples, row-major.
    pub data: Vec<u8>,
}

impl LogoImage {
    /// Decodes PNG or JPEG bytes. Transparent pixels are flattened onto white.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut samples = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in rgba.pixels() {
            let [red, green, blue, alpha] = pixel.0;
            samples.extend([red, green, blue].map(|channel| over_white(channel, alpha)));
        }

        Ok(Self { width, height, data: compress_to_vec_zlib(&samples, COMPRESSION_LEVEL) })
    }

    /// Largest size that fits a `side` × `side` box while keeping the aspect ratio.
    pub fn fit_within(&self, side: f32) -> (f32, f32) {
        if self.width == 0 || self.height == 0 {
            return (0.0, 0.0);
        }

        let scale = side / self.width.max(self.height) as f32;
        (self.width as f32 * scale, self.height as f32 * scale)
    }
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let blended = u16::from(channel) * u16::from(alpha) + 255 * (255 - u16::from(alpha));
    (blended / 255) as u8
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    use super::LogoImage;

    fn png(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).expect("encode png");
        bytes.into_inner()
    }

    #[test]
    fn decodes_png_into_rgb_samples() {
        let logo = LogoImage::decode(&png(3, 2, [10, 20, 30, 255])).expect("decode");
        let samples = decompress_to_vec_zlib(&logo.data).expect("inflate");

        assert_eq!((logo.width, logo.height), (3, 2));
        assert_eq!(samples.len(), 18);
        assert_eq!(&samples[..3], &[10, 20, 30]);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let logo = LogoImage::decode(&png(1, 1, [0, 0, 0, 0])).expect("decode");
        let samples = decompress_to_vec_zlib(&logo.data).expect("inflate");

        assert_eq!(samples, vec![255, 255, 255]);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(LogoImage::decode(b"definitely not an image").is_err());
    }

    #[test]
    fn wide_logo_fits_box_width() {
        let logo = LogoImage { width: 200, height: 50, data: Vec::new() };

        assert_eq!(logo.fit_within(80.0), (80.0, 20.0));
    }
}
