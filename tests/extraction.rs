//! End-to-end extraction on images written to the temp directory.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgb as Pixel, RgbImage, Rgba, RgbaImage};
use top_colors::{
    ExtractOptions, ExtractionError, Rgb, extract_top_colors, hex_to_rgb, try_extract_top_colors,
};

/// A file in the temp directory, removed on drop.
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        Self(std::env::temp_dir().join(format!("top-colors-{}-{name}", std::process::id())))
    }

    fn with_image(name: &str, img: DynamicImage) -> Self {
        let file = Self::new(name);
        img.save(&file.0).unwrap();
        file
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn gradient() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(200, 200, |x, y| {
        Pixel([x as u8, y as u8, ((x + y) / 2) as u8])
    }))
}

fn distance(a: Rgb, b: Rgb) -> f32 {
    let d = |p: u8, q: u8| (p as f32 - q as f32).powi(2);
    (d(a.r, b.r) + d(a.g, b.g) + d(a.b, b.b)).sqrt()
}

fn assert_close(actual: Rgb, expected: Rgb, tolerance: f32) {
    assert!(
        distance(actual, expected) <= tolerance,
        "{actual} is not within {tolerance} of {expected}"
    );
}

#[test]
fn solid_red_gives_red_for_every_cluster() {
    let file = Scratch::with_image(
        "solid-red.png",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Pixel([255, 0, 0]))),
    );

    let (colors, hex) = extract_top_colors(file.path(), 3);

    assert_eq!(colors, [Rgb::new(255, 0, 0); 3]);
    assert_eq!(hex, ["#ff0000", "#ff0000", "#ff0000"]);
}

#[test]
fn checkerboard_gives_black_and_white() {
    let board = RgbImage::from_fn(200, 200, |x, y| {
        if (x / 20 + y / 20) % 2 == 0 {
            Pixel([0, 0, 0])
        } else {
            Pixel([255, 255, 255])
        }
    });
    let file = Scratch::with_image("checkerboard.png", DynamicImage::ImageRgb8(board));

    let (mut colors, mut hex) = extract_top_colors(file.path(), 2);
    colors.sort_by_key(|c| c.r);
    hex.sort();

    assert_eq!(colors, [Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]);
    assert_eq!(hex, ["#000000", "#ffffff"]);
}

#[test]
fn well_separated_regions_are_found() {
    let img = RgbImage::from_fn(300, 100, |x, y| {
        let jitter = ((x + y) % 6) as u8;
        match x / 100 {
            0 => Pixel([250 + jitter, (y % 3) as u8, 0]),
            1 => Pixel([0, 250 + jitter, (x % 3) as u8]),
            _ => Pixel([(y % 3) as u8, 0, 250 + jitter]),
        }
    });
    let file = Scratch::with_image("regions.png", DynamicImage::ImageRgb8(img));

    let (colors, _) = extract_top_colors(file.path(), 3);
    assert_eq!(colors.len(), 3);

    for primary in [Rgb::new(255, 0, 0), Rgb::new(0, 255, 0), Rgb::new(0, 0, 255)] {
        let nearest = colors
            .iter()
            .copied()
            .min_by(|a, b| distance(*a, primary).total_cmp(&distance(*b, primary)))
            .unwrap();
        assert_close(nearest, primary, 12.0);
    }
}

#[test]
fn repeated_extraction_is_deterministic() {
    let file = Scratch::with_image("deterministic.png", gradient());
    let options = ExtractOptions::default().with_n_colors(10);

    let first = try_extract_top_colors(file.path(), &options).unwrap();
    let second = try_extract_top_colors(file.path(), &options).unwrap();

    assert_eq!(first, second);
}

#[test]
fn result_is_complete_and_hex_matches_colors() {
    let file = Scratch::with_image("gradient.png", gradient());

    let (colors, hex) = extract_top_colors(file.path(), 10);

    assert_eq!(colors.len(), 10);
    assert_eq!(hex.len(), 10);
    for (color, code) in colors.iter().zip(&hex) {
        assert_eq!(code.len(), 7);
        assert_eq!(code, &code.to_lowercase());
        assert_eq!(hex_to_rgb(code), Ok(*color));
    }
}

#[test]
fn missing_file_gives_empty_result() {
    let path = Scratch::new("does-not-exist.png");

    let (colors, hex) = extract_top_colors(path.path(), 10);
    assert!(colors.is_empty());
    assert!(hex.is_empty());

    let err = try_extract_top_colors(path.path(), &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, ExtractionError::Read { .. }));
    assert!(err.to_string().contains("does-not-exist.png"));
}

#[test]
fn corrupt_file_gives_empty_result() {
    let file = Scratch::new("corrupt.png");
    std::fs::write(file.path(), b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();

    let (colors, hex) = extract_top_colors(file.path(), 10);
    assert!(colors.is_empty() && hex.is_empty());

    let err = try_extract_top_colors(file.path(), &ExtractOptions::default()).unwrap_err();
    assert!(matches!(err, ExtractionError::Decode(_)));
}

#[test]
fn tiny_image_is_downsampled_to_one_pixel() {
    let file = Scratch::with_image(
        "tiny.png",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Pixel([12, 34, 56]))),
    );

    let (colors, hex) = extract_top_colors(file.path(), 1);
    assert_eq!(colors, [Rgb::new(12, 34, 56)]);
    assert_eq!(hex, ["#0c2238"]);

    // one pixel left, two clusters requested
    assert_eq!(extract_top_colors(file.path(), 2), (vec![], vec![]));
    let err = try_extract_top_colors(file.path(), &ExtractOptions::default().with_n_colors(2)).unwrap_err();
    assert!(matches!(err, ExtractionError::TooFewPixels { requested: 2, available: 1 }));
}

#[test]
fn zero_colors_is_rejected() {
    let file = Scratch::with_image("zero.png", gradient());

    assert_eq!(extract_top_colors(file.path(), 0), (vec![], vec![]));
    let err = try_extract_top_colors(file.path(), &ExtractOptions::default().with_n_colors(0)).unwrap_err();
    assert!(matches!(err, ExtractionError::InvalidColorCount { requested: 0 }));
}

#[test]
fn common_formats_are_decoded() {
    let teal = Pixel([0, 128, 128]);
    let cases = [
        ("teal.bmp", DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, teal)), 0.0),
        ("teal.jpg", DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, teal)), 4.0),
        (
            "teal.gif",
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([0, 128, 128, 255]))),
            2.0,
        ),
    ];

    for (name, img, tolerance) in cases {
        let file = Scratch::with_image(name, img);
        let (colors, hex) = extract_top_colors(file.path(), 1);
        assert_eq!(colors.len(), 1, "{name}");
        assert_eq!(hex.len(), 1, "{name}");
        assert_close(colors[0], Rgb::new(0, 128, 128), tolerance);
    }
}

#[test]
fn grayscale_is_expanded_to_rgb() {
    let file = Scratch::with_image(
        "gray.png",
        DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 50, Luma([77]))),
    );

    let (colors, hex) = extract_top_colors(file.path(), 2);
    assert_eq!(colors, [Rgb::new(77, 77, 77); 2]);
    assert_eq!(hex, ["#4d4d4d", "#4d4d4d"]);
}

#[test]
fn clustered_colors_keep_shared_channels_exact() {
    let img = RgbImage::from_fn(300, 100, |x, _| match x / 100 {
        0 => Pixel([0, 100, 220]),
        1 => Pixel([2, 100, 220]),
        _ => Pixel([250, 100, 220]),
    });
    let file = Scratch::with_image("bands.png", DynamicImage::ImageRgb8(img));

    let (colors, hex) = extract_top_colors(file.path(), 2);
    let mut pairs: Vec<(Rgb, String)> = colors.into_iter().zip(hex).collect();
    pairs.sort_by_key(|(c, _)| c.r);

    let (dark, _) = &pairs[0];
    assert!(dark.r <= 2, "{dark}");
    assert_eq!((dark.g, dark.b), (100, 220));
    assert_eq!(pairs[1], (Rgb::new(250, 100, 220), "#fa64dc".to_string()));
}

#[test]
fn shares_cover_every_clustered_pixel() {
    let file = Scratch::with_image("shares.png", gradient());

    let palette = try_extract_top_colors(file.path(), &ExtractOptions::default().with_n_colors(6)).unwrap();

    assert_eq!(palette.len(), 6);
    let total: f32 = palette.swatches().iter().map(|s| s.share).sum();
    assert!((total - 1.0).abs() < 1e-4, "shares sum to {total}");
    assert!(palette.swatches().iter().all(|s| (0.0..=1.0).contains(&s.share)));
}
