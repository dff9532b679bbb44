use crate::render::{RasterTile, render::RenderError};
use image::{
    ExtendedColorType, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};

const JPEG_QUALITY: u8 = 90;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub(crate) fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub(crate) fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub(crate) fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// PNG when some pixels are empty so they stay transparent, JPEG otherwise.
    pub(crate) fn auto(tile: &RasterTile) -> Self {
        if tile.is_full() { Self::Jpeg } else { Self::Png }
    }
}

fn to_byte(value: f64, rescale: Option<(f64, f64)>) -> u8 {
    let value = match rescale {
        Some((min, max)) => (value - min) / (max - min) * 255.0,
        None => value,
    };

    value.round().clamp(0.0, 255.0) as u8
}

/// Encodes the tile as 8-bit gray (1–2 bands) or RGB (first 3 bands).
/// PNG carries the mask as alpha; JPEG leaves empty pixels black.
pub(crate) fn encode(
    tile: &RasterTile,
    format: ImageFormat,
    rescale: Option<(f64, f64)>,
) -> Result<Vec<u8>, RenderError> {
    let _span = tracy_client::span!("encode_tile");

    let channels: Vec<&Vec<f64>> = if tile.band_count() >= 3 {
        tile.bands.iter().take(3).collect()
    } else {
        tile.bands.iter().take(1).collect()
    };

    let alpha = format == ImageFormat::Png;
    let pixel_len = channels.len() + usize::from(alpha);
    let mut data = Vec::with_capacity(tile.mask.len() * pixel_len);

    for (i, valid) in tile.mask.iter().enumerate() {
        for channel in &channels {
            data.push(if *valid { to_byte(channel[i], rescale) } else { 0 });
        }

        if alpha {
            data.push(if *valid { 255 } else { 0 });
        }
    }

    let color_type = match (channels.len(), alpha) {
        (1, false) => ExtendedColorType::L8,
        (1, true) => ExtendedColorType::La8,
        (_, false) => ExtendedColorType::Rgb8,
        (_, true) => ExtendedColorType::Rgba8,
    };

    let mut buffer = Vec::new();

    match format {
        ImageFormat::Png => PngEncoder::new(&mut buffer).write_image(
            &data,
            tile.width,
            tile.height,
            color_type,
        ),
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).write_image(
            &data,
            tile.width,
            tile.height,
            color_type,
        ),
    }
    .map_err(|err| RenderError::ImageEncoding(Box::new(err)))?;

    Ok(buffer)
}
