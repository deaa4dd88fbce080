//! # 画布合成与编码模块
//!
//! ## 设计思路
//!
//! 分配一张更大的画布，整张填充背景色，再把原图像素原样放到居中位置，最后按输入格式重新编码。
//! 不做跨格式转码：PNG 进 PNG 出，JPEG 进 JPEG 出。
//!
//! ## 实现思路
//!
//! - 画布沿用源图的像素布局（L8 / RGBA16 / RGB32F ...），原图区域用 `imageops::replace`
//!   直接覆盖，不做 alpha 混合，保证像素逐位一致。
//! - 背景色按源像素布局转换（白色在 16 位下即 65535，在浮点下即 1.0）。
//! - 编码前仅在目标编码器不接受当前布局时做转换（例如 JPEG 只接受 L8 / RGB8）。

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{FilterType as PngFilterType, PngEncoder};
use image::{
    ColorType, DynamicImage, GenericImageView, ImageBuffer, ImageEncoder, Pixel, Rgba, imageops,
};
use std::borrow::Cow;
use std::io::Cursor;

use super::source::{BorderPixels, BorderedImage, ImageMetadata, SupportedFormat};
use super::{BorderConfig, BorderError};

/// 合成并编码：输出与输入同格式的完整字节。
pub fn composite_and_encode(
    source: &DynamicImage,
    metadata: &ImageMetadata,
    pixels: BorderPixels,
    config: &BorderConfig,
) -> Result<BorderedImage, BorderError> {
    let canvas = compose_canvas(source, pixels, config)?;
    let (width, height) = canvas.dimensions();
    let bytes = encode_canvas(&canvas, metadata.format, config)?;

    Ok(BorderedImage {
        bytes,
        format: metadata.format,
        width,
        height,
    })
}

/// 计算画布尺寸：`(width + 2h) × (height + 2v)`。
///
/// 溢出、超过 `max_canvas_pixels`，或按 `bytes_per_pixel` 估算超过 `max_canvas_bytes`，
/// 均视为编码阶段资源耗尽。
pub fn canvas_dimensions(
    width: u32,
    height: u32,
    bytes_per_pixel: u64,
    pixels: BorderPixels,
    config: &BorderConfig,
) -> Result<(u32, u32), BorderError> {
    let grow = |length: u32, border: u32| {
        border
            .checked_mul(2)
            .and_then(|both| length.checked_add(both))
    };

    let (Some(canvas_width), Some(canvas_height)) =
        (grow(width, pixels.horizontal), grow(height, pixels.vertical))
    else {
        return Err(BorderError::Encode(format!(
            "画布尺寸溢出：{}x{} 加边 {}/{}",
            width, height, pixels.horizontal, pixels.vertical
        )));
    };

    let canvas_pixels = canvas_width as u64 * canvas_height as u64;
    if canvas_pixels > config.max_canvas_pixels {
        return Err(BorderError::Encode(format!(
            "画布像素过大：{}x{}（限制：{} 像素）",
            canvas_width, canvas_height, config.max_canvas_pixels
        )));
    }

    let canvas_bytes = canvas_pixels.saturating_mul(bytes_per_pixel);
    if canvas_bytes > config.max_canvas_bytes {
        return Err(BorderError::Encode(format!(
            "画布预计内存过大：{:.2} MB（限制：{:.2} MB）",
            canvas_bytes as f64 / 1024.0 / 1024.0,
            config.max_canvas_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok((canvas_width, canvas_height))
}

/// 分配画布、填充背景并把原图放到 `(h, v)` 偏移处。
pub fn compose_canvas(
    source: &DynamicImage,
    pixels: BorderPixels,
    config: &BorderConfig,
) -> Result<DynamicImage, BorderError> {
    let (width, height) = source.dimensions();
    let bytes_per_pixel = source.color().bytes_per_pixel() as u64;
    let (canvas_width, canvas_height) =
        canvas_dimensions(width, height, bytes_per_pixel, pixels, config)?;

    let background = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
        1,
        1,
        Rgba(config.background),
    ));

    macro_rules! pad_as {
        ($variant:ident, $buffer:expr, $convert:ident) => {
            DynamicImage::$variant(pad(
                $buffer,
                *background.$convert().get_pixel(0, 0),
                pixels,
                canvas_width,
                canvas_height,
            ))
        };
    }

    let canvas = match source {
        DynamicImage::ImageLuma8(buffer) => pad_as!(ImageLuma8, buffer, to_luma8),
        DynamicImage::ImageLumaA8(buffer) => pad_as!(ImageLumaA8, buffer, to_luma_alpha8),
        DynamicImage::ImageRgb8(buffer) => pad_as!(ImageRgb8, buffer, to_rgb8),
        DynamicImage::ImageRgba8(buffer) => pad_as!(ImageRgba8, buffer, to_rgba8),
        DynamicImage::ImageLuma16(buffer) => pad_as!(ImageLuma16, buffer, to_luma16),
        DynamicImage::ImageLumaA16(buffer) => pad_as!(ImageLumaA16, buffer, to_luma_alpha16),
        DynamicImage::ImageRgb16(buffer) => pad_as!(ImageRgb16, buffer, to_rgb16),
        DynamicImage::ImageRgba16(buffer) => pad_as!(ImageRgba16, buffer, to_rgba16),
        DynamicImage::ImageRgb32F(buffer) => pad_as!(ImageRgb32F, buffer, to_rgb32f),
        DynamicImage::ImageRgba32F(buffer) => pad_as!(ImageRgba32F, buffer, to_rgba32f),
        other => pad_as!(ImageRgba8, &other.to_rgba8(), to_rgba8),
    };

    Ok(canvas)
}

fn pad<P>(
    source: &ImageBuffer<P, Vec<P::Subpixel>>,
    background: P,
    pixels: BorderPixels,
    canvas_width: u32,
    canvas_height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    let mut canvas = ImageBuffer::from_pixel(canvas_width, canvas_height, background);
    imageops::replace(
        &mut canvas,
        source,
        pixels.horizontal as i64,
        pixels.vertical as i64,
    );
    canvas
}

/// 按目标格式编码画布。
pub fn encode_canvas(
    canvas: &DynamicImage,
    format: SupportedFormat,
    config: &BorderConfig,
) -> Result<Vec<u8>, BorderError> {
    let prepared = prepare_for_encoder(canvas, format);
    let (width, height) = prepared.dimensions();
    let mut buffer = Vec::new();

    match format {
        SupportedFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                config.png_compression,
                PngFilterType::Adaptive,
            );
            encoder
                .write_image(prepared.as_bytes(), width, height, prepared.color().into())
                .map_err(|e| BorderError::Encode(format!("PNG 编码失败：{}", e)))?;
        }
        SupportedFormat::Jpeg => {
            let encoder =
                JpegEncoder::new_with_quality(Cursor::new(&mut buffer), config.jpeg_quality);
            encoder
                .write_image(prepared.as_bytes(), width, height, prepared.color().into())
                .map_err(|e| BorderError::Encode(format!("JPEG 编码失败：{}", e)))?;
        }
        other => {
            prepared
                .write_to(&mut Cursor::new(&mut buffer), other.image_format())
                .map_err(|e| BorderError::Encode(format!("{:?} 编码失败：{}", other, e)))?;
        }
    }

    if buffer.is_empty() {
        return Err(BorderError::Encode("编码结果为空".to_string()));
    }

    Ok(buffer)
}

/// 转换为目标编码器可接受的像素布局；已可接受时不复制。
fn prepare_for_encoder(canvas: &DynamicImage, format: SupportedFormat) -> Cow<'_, DynamicImage> {
    let color = canvas.color();
    let is_gray = matches!(
        color,
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
    );
    let has_alpha = color.has_alpha();

    match format {
        SupportedFormat::Png => match color {
            ColorType::Rgb32F => Cow::Owned(DynamicImage::ImageRgb16(canvas.to_rgb16())),
            ColorType::Rgba32F => Cow::Owned(DynamicImage::ImageRgba16(canvas.to_rgba16())),
            _ => Cow::Borrowed(canvas),
        },
        SupportedFormat::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(canvas),
            _ if is_gray => Cow::Owned(DynamicImage::ImageLuma8(canvas.to_luma8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(canvas.to_rgb8())),
        },
        SupportedFormat::Gif => match color {
            ColorType::Rgba8 => Cow::Borrowed(canvas),
            _ => Cow::Owned(DynamicImage::ImageRgba8(canvas.to_rgba8())),
        },
        SupportedFormat::Qoi | SupportedFormat::WebP => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(canvas),
            _ if has_alpha => Cow::Owned(DynamicImage::ImageRgba8(canvas.to_rgba8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(canvas.to_rgb8())),
        },
        SupportedFormat::Bmp | SupportedFormat::Tga => match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                Cow::Borrowed(canvas)
            }
            _ if is_gray && has_alpha => Cow::Owned(DynamicImage::ImageLumaA8(canvas.to_luma_alpha8())),
            _ if is_gray => Cow::Owned(DynamicImage::ImageLuma8(canvas.to_luma8())),
            _ if has_alpha => Cow::Owned(DynamicImage::ImageRgba8(canvas.to_rgba8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(canvas.to_rgb8())),
        },
        SupportedFormat::Tiff => match color {
            ColorType::La8 => Cow::Owned(DynamicImage::ImageRgba8(canvas.to_rgba8())),
            ColorType::La16 => Cow::Owned(DynamicImage::ImageRgba16(canvas.to_rgba16())),
            ColorType::Rgb32F => Cow::Owned(DynamicImage::ImageRgb16(canvas.to_rgb16())),
            ColorType::Rgba32F => Cow::Owned(DynamicImage::ImageRgba16(canvas.to_rgba16())),
            _ => Cow::Borrowed(canvas),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma, Rgb};

    fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 200) as u8, (y % 200) as u8, 40, 255])
        }))
    }

    fn meta(source: &DynamicImage, format: SupportedFormat) -> ImageMetadata {
        ImageMetadata { width: source.width(), height: source.height(), format, color: source.color() }
    }

    #[test]
    fn canvas_grows_by_twice_the_border() {
        let source = gradient_rgba(300, 200);
        let canvas = compose_canvas(
            &source,
            BorderPixels { horizontal: 30, vertical: 40 },
            &BorderConfig::default(),
        )
        .expect("compose should succeed");

        assert_eq!(canvas.dimensions(), (360, 280));
        let canvas = canvas.to_rgba8();
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.get_pixel(359, 279), Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(30, 40), source.to_rgba8().get_pixel(0, 0));
        assert_eq!(canvas.get_pixel(329, 239), source.to_rgba8().get_pixel(299, 199));
        assert_eq!(*canvas.get_pixel(330, 240), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn transparent_source_pixels_are_not_blended() {
        let source = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let canvas = compose_canvas(
            &source,
            BorderPixels { horizontal: 1, vertical: 1 },
            &BorderConfig::default(),
        )
        .expect("compose should succeed")
        .to_rgba8();

        assert_eq!(*canvas.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
        assert_eq!(*canvas.get_pixel(0, 2), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn zero_border_is_pass_through() {
        let source = gradient_rgba(12, 7);
        let canvas = compose_canvas(
            &source,
            BorderPixels { horizontal: 0, vertical: 0 },
            &BorderConfig::default(),
        )
        .expect("compose should succeed");

        assert_eq!(canvas.to_rgba8(), source.to_rgba8());
    }

    #[test]
    fn pixel_layout_is_preserved() {
        let gray = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(3, 3, Luma([9])));
        let canvas = compose_canvas(
            &gray,
            BorderPixels { horizontal: 2, vertical: 1 },
            &BorderConfig::default(),
        )
        .expect("compose should succeed");

        assert_eq!(canvas.color(), ColorType::L8);
        let canvas = canvas.to_luma8();
        assert_eq!(*canvas.get_pixel(0, 0), Luma([255]));
        assert_eq!(*canvas.get_pixel(2, 1), Luma([9]));

        let deep = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(2, 2, image::Rgb([1u16, 2, 3])));
        let canvas = compose_canvas(
            &deep,
            BorderPixels { horizontal: 1, vertical: 1 },
            &BorderConfig::default(),
        )
        .expect("compose should succeed");
        assert_eq!(canvas.color(), ColorType::Rgb16);
        assert_eq!(*canvas.as_rgb16().expect("rgb16").get_pixel(0, 0), Rgb([65535u16, 65535, 65535]));
    }

    #[test]
    fn oversized_canvas_is_encode_error() {
        let source = gradient_rgba(10, 10);
        let mut config = BorderConfig::default();
        config.max_canvas_pixels = 400;

        let result = compose_canvas(&source, BorderPixels { horizontal: 10, vertical: 0 }, &config);
        assert!(matches!(result, Err(BorderError::Encode(_))));

        let result =
            canvas_dimensions(10, 10, 4, BorderPixels { horizontal: u32::MAX, vertical: 0 }, &config);
        assert!(matches!(result, Err(BorderError::Encode(_))));
    }

    #[test]
    fn canvas_memory_limit_counts_pixel_depth() {
        let mut config = BorderConfig::default();
        config.max_canvas_bytes = 3_200;
        let pixels = BorderPixels { horizontal: 5, vertical: 5 };

        // 20x20 画布：RGBA8 为 1600 字节，RGBA16 为 3200 字节，RGBA32F 为 6400 字节
        assert_eq!(canvas_dimensions(10, 10, 4, pixels, &config).expect("rgba8 fits"), (20, 20));
        assert_eq!(canvas_dimensions(10, 10, 8, pixels, &config).expect("rgba16 fits"), (20, 20));
        assert!(matches!(
            canvas_dimensions(10, 10, 16, pixels, &config),
            Err(BorderError::Encode(_))
        ));

        let deep = DynamicImage::ImageRgba32F(ImageBuffer::from_pixel(10, 10, Rgba([0.5f32, 0.5, 0.5, 1.0])));
        assert!(matches!(compose_canvas(&deep, pixels, &config), Err(BorderError::Encode(_))));
    }

    #[test]
    fn output_format_matches_input_format() {
        let source = gradient_rgba(16, 8);
        let pixels = BorderPixels { horizontal: 2, vertical: 3 };
        let config = BorderConfig::default();

        for format in [
            SupportedFormat::Png,
            SupportedFormat::Jpeg,
            SupportedFormat::Gif,
            SupportedFormat::Bmp,
            SupportedFormat::Tiff,
            SupportedFormat::Tga,
            SupportedFormat::Qoi,
            SupportedFormat::WebP,
        ] {
            let output = composite_and_encode(&source, &meta(&source, format), pixels, &config)
                .expect("composite and encode should succeed");

            assert_eq!(output.format, format);
            assert_eq!((output.width, output.height), (20, 14));

            let decoded = image::load_from_memory_with_format(&output.bytes, format.image_format())
                .expect("output should decode");
            assert_eq!(decoded.dimensions(), (20, 14));
        }
    }

    #[test]
    fn png_output_is_lossless() {
        let source = gradient_rgba(9, 5);
        let output = composite_and_encode(
            &source,
            &meta(&source, SupportedFormat::Png),
            BorderPixels { horizontal: 1, vertical: 2 },
            &BorderConfig::default(),
        )
        .expect("encode png");

        assert_eq!(image::guess_format(&output.bytes).expect("guess"), ImageFormat::Png);
        let decoded = image::load_from_memory(&output.bytes).expect("decode").to_rgba8();
        let source = source.to_rgba8();
        for (x, y, pixel) in source.enumerate_pixels() {
            assert_eq!(decoded.get_pixel(x + 1, y + 2), pixel);
        }
    }
}
