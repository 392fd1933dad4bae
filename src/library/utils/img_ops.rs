use image::{
    buffer::ConvertBuffer,
    codecs::jpeg::JpegEncoder,
    imageops::{resize, FilterType},
    ColorType, ImageBuffer, Luma, Rgb,
};
use thiserror::Error;

pub type RgbImgBuf = ImageBuffer<Rgb<u8>, Vec<u8>>;
pub type GrayImgBuf = ImageBuffer<Luma<u8>, Vec<u8>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImgOpsError {
    #[error("Image processing error: {0}")]
    ImgError(String),

    #[error("Cannot process an empty {0}x{1} image")]
    EmptyImage(u32, u32),
}

impl From<image::ImageError> for ImgOpsError {
    fn from(e: image::ImageError) -> Self {
        Self::ImgError(e.to_string())
    }
}

//Resize first and then convert to grayscale, so the colour conversion only runs over the
//handful of pixels which survive the resize.
pub fn gray_thumbnail(img: &RgbImgBuf, width: u32, height: u32) -> GrayImgBuf {
    let resized = resize(img, width, height, FilterType::Triangle);
    resized.convert()
}

pub fn encode_jpeg(img: &RgbImgBuf, quality: u8) -> Result<Vec<u8>, ImgOpsError> {
    let (dim_x, dim_y) = img.dimensions();
    if dim_x == 0 || dim_y == 0 {
        return Err(ImgOpsError::EmptyImage(dim_x, dim_y));
    }

    let mut jpeg_encoding = vec![];
    JpegEncoder::new_with_quality(&mut jpeg_encoding, quality).encode(img, dim_x, dim_y, ColorType::Rgb8)?;

    Ok(jpeg_encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_thumbnail_keeps_gradient_direction() {
        let img = RgbImgBuf::from_fn(90, 80, |x, _y| Rgb([(x * 2) as u8; 3]));
        let thumb = gray_thumbnail(&img, 9, 8);

        assert_eq!(thumb.dimensions(), (9, 8));
        for x in 0..8 {
            assert!(thumb.get_pixel(x + 1, 3).0[0] > thumb.get_pixel(x, 3).0[0]);
        }
    }

    #[test]
    fn test_jpeg_starts_with_soi_marker() {
        let img = RgbImgBuf::from_pixel(32, 24, Rgb([10, 200, 30]));
        let jpeg = encode_jpeg(&img, 75).unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_empty_image_is_not_encoded() {
        let img = RgbImgBuf::new(0, 0);
        assert_eq!(encode_jpeg(&img, 75).unwrap_err(), ImgOpsError::EmptyImage(0, 0));
    }
}
