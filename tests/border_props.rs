// Property checks for border geometry and canvas sizing.
use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, Rgba};
use image_border::border::{
    BorderConfig, BorderPixels, BorderSpec, ImageMetadata, SupportedFormat, compositor, geometry,
};
use proptest::prelude::*;

fn meta(width: u32, height: u32) -> ImageMetadata {
    ImageMetadata { width, height, format: SupportedFormat::Png, color: ColorType::Rgba8 }
}

proptest! {
    #[test]
    fn border_pixels_follow_rounded_percentage(
        width in 1u32..10_000,
        height in 1u32..10_000,
        x in 0.0f64..400.0,
        y in 0.0f64..400.0,
    ) {
        let pixels = geometry::compute_border_pixels(&meta(width, height), &BorderSpec::new(x, y))
            .expect("non-negative percentages must succeed");

        prop_assert_eq!(pixels.horizontal as f64, (width as f64 * x / 100.0).round());
        prop_assert_eq!(pixels.vertical as f64, (height as f64 * y / 100.0).round());
    }

    #[test]
    fn axes_never_influence_each_other(
        width in 1u32..5_000,
        height in 1u32..5_000,
        x in 0.0f64..200.0,
        y1 in 0.0f64..200.0,
        y2 in 0.0f64..200.0,
    ) {
        let a = geometry::compute_border_pixels(&meta(width, height), &BorderSpec::new(x, y1))
            .expect("geometry");
        let b = geometry::compute_border_pixels(&meta(width, height), &BorderSpec::new(x, y2))
            .expect("geometry");

        prop_assert_eq!(a.horizontal, b.horizontal);
    }

    #[test]
    fn negative_percentages_always_fail(
        width in 1u32..5_000,
        x in -1_000.0f64..-0.0001,
    ) {
        let result = geometry::compute_border_pixels(&meta(width, width), &BorderSpec::new(x, 0.0));
        prop_assert!(result.is_err());
    }

    #[test]
    fn canvas_is_source_plus_twice_border(
        width in 1u32..24,
        height in 1u32..24,
        h in 0u32..12,
        v in 0u32..12,
    ) {
        let source = DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 1, 255])
        }));
        let pixels = BorderPixels { horizontal: h, vertical: v };

        let canvas = compositor::compose_canvas(&source, pixels, &BorderConfig::default())
            .expect("compose");
        prop_assert_eq!(canvas.dimensions(), (width + 2 * h, height + 2 * v));

        let canvas = canvas.to_rgba8();
        prop_assert_eq!(*canvas.get_pixel(0, 0), if h == 0 && v == 0 {
            Rgba([0, 0, 1, 255])
        } else {
            Rgba([255, 255, 255, 255])
        });
        prop_assert_eq!(*canvas.get_pixel(h, v), Rgba([0, 0, 1, 255]));
    }
}
