//! Image decoding backed by the `image` crate.

use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use tracing::{debug, warn};

use super::loader::ItemLoader;

/// RGB pixels as `f32` in `[0, 1]`, channel-last, logical shape `[1, H, W, 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height as usize, self.width as usize, 3]
    }
}

/// Per-pixel mask, `1 - alpha` for images with transparency, zeros otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub image: ImageTensor,
    pub mask: ImageMask,
}

/// Loader that decodes any format the `image` crate was built with.
///
/// EXIF orientation is applied before conversion. The decoder and its file
/// handle are dropped inside [`ItemLoader::load`] on success and failure alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl ItemLoader for ImageLoader {
    type Item = LoadedImage;

    fn load(&self, path: &Path) -> Option<LoadedImage> {
        match decode(path) {
            Ok(loaded) => {
                debug!(
                    path = %path.display(),
                    width = loaded.image.width,
                    height = loaded.image.height,
                    "image decoded"
                );
                Some(loaded)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "failed to load image");
                None
            }
        }
    }
}

fn decode(path: &Path) -> Result<LoadedImage> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniff format of {}", path.display()))?;
    let mut decoder = reader
        .into_decoder()
        .with_context(|| format!("create decoder for {}", path.display()))?;
    let orientation = decoder.orientation().context("read orientation")?;
    let mut decoded = DynamicImage::from_decoder(decoder)
        .with_context(|| format!("decode {}", path.display()))?;
    decoded.apply_orientation(orientation);
    Ok(to_tensors(&decoded))
}

fn to_tensors(decoded: &DynamicImage) -> LoadedImage {
    let rgb = decoded.to_rgb32f();
    let (width, height) = rgb.dimensions();
    let image = ImageTensor {
        width,
        height,
        data: rgb.into_raw(),
    };

    // Palette images with a transparency entry decode as RGBA, so their
    // transparent pixels are masked like any other alpha channel.
    let data = if decoded.color().has_alpha() {
        decoded
            .to_rgba32f()
            .pixels()
            .map(|pixel| 1.0 - pixel.0[3])
            .collect()
    } else {
        vec![0.0; width as usize * height as usize]
    };

    LoadedImage {
        image,
        mask: ImageMask {
            width,
            height,
            data,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs;

    #[test]
    fn decodes_rgb_png_with_zero_mask() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("red.png");
        RgbImage::from_pixel(3, 2, Rgb([255, 0, 0]))
            .save(&path)
            .expect("save png");

        let loaded = ImageLoader.load(&path).expect("loaded");
        assert_eq!(loaded.image.shape(), [1, 2, 3, 3]);
        assert_eq!(loaded.image.data.len(), 18);
        assert_eq!(&loaded.image.data[..3], &[1.0, 0.0, 0.0]);
        assert_eq!(loaded.mask.data, vec![0.0; 6]);
    }

    #[test]
    fn alpha_channel_becomes_inverted_mask() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("clear.png");
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 0]));
        img.save(&path).expect("save png");

        let loaded = ImageLoader.load(&path).expect("loaded");
        assert_eq!(loaded.mask.data, vec![0.0, 1.0]);
    }

    #[test]
    fn palette_transparency_is_masked() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("clear.gif");
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        img.save(&path).expect("save gif");

        let loaded = ImageLoader.load(&path).expect("loaded");
        assert_eq!(loaded.mask.data, vec![0.0, 1.0]);
    }

    #[test]
    fn undecodable_file_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.png");
        fs::write(&path, b"definitely not a png").expect("write");

        assert!(ImageLoader.load(&path).is_none());
        assert!(ImageLoader.load(&temp.path().join("missing.png")).is_none());
    }
}
