use std::collections::HashMap;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};
use kmeans_colors::get_kmeans;
use palette::Srgb;
use serde::Serialize;
use tracing::{debug, error};

use crate::color::{Rgb, rgb_to_hex};
use crate::error::{ExtractionError, Result};

/// Upper bound on `n_colors`; cluster labels are stored as `u8`.
pub const MAX_COLORS: usize = 256;

pub const DEFAULT_N_COLORS: usize = 10;
pub const DEFAULT_DOWNSAMPLE_FACTOR: u32 = 10;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_CONVERGE: f32 = 1e-4;

/// Tunables for one extraction run.
#[derive(Clone, Copy, Debug)]
pub struct ExtractOptions {
    /// Number of dominant colors to return.
    pub n_colors: usize,
    /// Width and height are each divided by this before clustering.
    pub downsample_factor: u32,
    /// Resampling filter used when downsampling. `Nearest` never invents
    /// colors that are absent from the source.
    pub filter: FilterType,
    /// Seed for k-means++ initialisation.
    pub seed: u64,
    pub max_iter: usize,
    /// Stop once the centroids move less than this between iterations.
    pub converge: f32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            n_colors: DEFAULT_N_COLORS,
            downsample_factor: DEFAULT_DOWNSAMPLE_FACTOR,
            filter: FilterType::Nearest,
            seed: DEFAULT_SEED,
            max_iter: DEFAULT_MAX_ITER,
            converge: DEFAULT_CONVERGE,
        }
    }
}

impl ExtractOptions {
    pub fn with_n_colors(mut self, n_colors: usize) -> Self {
        self.n_colors = n_colors;
        self
    }

    pub fn with_downsample_factor(mut self, factor: u32) -> Self {
        self.downsample_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_colors == 0 || self.n_colors > MAX_COLORS {
            return Err(ExtractionError::InvalidColorCount {
                requested: self.n_colors,
            });
        }
        Ok(())
    }
}

/// One dominant color.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Swatch {
    #[serde(rename = "rgb")]
    pub color: Rgb,
    /// Always `rgb_to_hex(color)`.
    pub hex: String,
    /// Fraction of the clustered pixels assigned to this color.
    pub share: f32,
}

impl Swatch {
    fn new(color: Rgb, share: f32) -> Self {
        Self {
            color,
            hex: rgb_to_hex(color),
            share,
        }
    }
}

/// The dominant colors of one image, in the order the clustering produced
/// them (not sorted by share).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Palette {
    swatches: Vec<Swatch>,
}

impl Palette {
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }

    pub fn colors(&self) -> Vec<Rgb> {
        self.swatches.iter().map(|s| s.color).collect()
    }

    pub fn hex(&self) -> Vec<String> {
        self.swatches.iter().map(|s| s.hex.clone()).collect()
    }

    /// Split into the parallel `(colors, hex)` sequences.
    pub fn into_parts(self) -> (Vec<Rgb>, Vec<String>) {
        self.swatches.into_iter().map(|s| (s.color, s.hex)).unzip()
    }
}

// ------------------------------------------------------------
// Entry points
// ------------------------------------------------------------

/// Find the `n_colors` dominant colors of the image at `image_path`.
///
/// Returns the colors and their hex codes as two sequences of equal length.
/// On any failure the error is logged and both sequences are empty; use
/// [`try_extract_top_colors`] to get the error itself.
pub fn extract_top_colors(image_path: impl AsRef<Path>, n_colors: usize) -> (Vec<Rgb>, Vec<String>) {
    let path = image_path.as_ref();
    let options = ExtractOptions::default().with_n_colors(n_colors);
    match try_extract_top_colors(path, &options) {
        Ok(palette) => palette.into_parts(),
        Err(e) => {
            error!(path = %path.display(), "Error processing the image: {e}");
            (Vec::new(), Vec::new())
        }
    }
}

/// Read, decode and cluster the image at `image_path`.
pub fn try_extract_top_colors(image_path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Palette> {
    options.validate()?;
    let path = image_path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read image");
    let img = image::load_from_memory(&bytes)?;
    palette_of(&img, options)
}

/// Same as [`try_extract_top_colors`] for an encoded image already in memory.
/// The format is guessed from the content.
pub fn extract_top_colors_bytes(input: &[u8], options: &ExtractOptions) -> Result<Palette> {
    options.validate()?;
    let img = image::load_from_memory(input)?;
    palette_of(&img, options)
}

/// Cluster an already decoded image.
pub fn extract_from_image(img: &DynamicImage, options: &ExtractOptions) -> Result<Palette> {
    options.validate()?;
    palette_of(img, options)
}

/// `options` must already be validated.
fn palette_of(img: &DynamicImage, options: &ExtractOptions) -> Result<Palette> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(ExtractionError::EmptyImage);
    }
    debug!(width = w, height = h, color = ?img.color(), "decoded image");

    // Alpha, palette and grayscale sources all end up as plain 8-bit RGB.
    let small = downsample(&img.to_rgb8(), options.downsample_factor, options.filter);
    let pixels: Vec<Rgb> = small.pixels().map(|p| Rgb::from(p.0)).collect();

    let swatches = cluster(&pixels, options)?;
    debug_assert_eq!(swatches.len(), options.n_colors);
    Ok(Palette { swatches })
}

// ------------------------------------------------------------
// Downsampling
// ------------------------------------------------------------

/// Integer-divide both dimensions by `factor`, never going below 1.
pub fn downsampled_dimensions(width: u32, height: u32, factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    ((width / factor).max(1), (height / factor).max(1))
}

fn downsample(img: &RgbImage, factor: u32, filter: FilterType) -> RgbImage {
    let (in_w, in_h) = img.dimensions();
    let (out_w, out_h) = downsampled_dimensions(in_w, in_h, factor);

    // Fast path – no scaling required.
    if out_w == in_w && out_h == in_h {
        return img.clone();
    }

    debug!(from = ?(in_w, in_h), to = ?(out_w, out_h), "downsampling");
    imageops::resize(img, out_w, out_h, filter)
}

// ------------------------------------------------------------
// Clustering
// ------------------------------------------------------------

fn cluster(pixels: &[Rgb], options: &ExtractOptions) -> Result<Vec<Swatch>> {
    let k = options.n_colors;
    if pixels.len() < k {
        return Err(ExtractionError::TooFewPixels {
            requested: k,
            available: pixels.len(),
        });
    }

    match count_distinct(pixels, k) {
        Some(counts) => {
            debug!(distinct = counts.len(), k, "no more distinct colors than clusters");
            Ok(exact_swatches(&counts, pixels.len(), k))
        }
        None => Ok(kmeans_swatches(pixels, options)),
    }
}

/// Count occurrences of each distinct color in first-seen order, giving up
/// as soon as there are more than `limit` of them.
fn count_distinct(pixels: &[Rgb], limit: usize) -> Option<Vec<(Rgb, usize)>> {
    let mut counts: Vec<(Rgb, usize)> = Vec::new();
    let mut slots: HashMap<Rgb, usize> = HashMap::new();
    for &p in pixels {
        match slots.get(&p) {
            Some(&i) => counts[i].1 += 1,
            None => {
                if counts.len() == limit {
                    return None;
                }
                slots.insert(p, counts.len());
                counts.push((p, 1));
            }
        }
    }
    Some(counts)
}

/// With at most `k` distinct colors every color is its own centroid. The
/// clusters left over stay empty and repeat the most populous color.
fn exact_swatches(counts: &[(Rgb, usize)], total: usize, k: usize) -> Vec<Swatch> {
    let total = total as f32;
    let mut swatches: Vec<Swatch> = counts
        .iter()
        .map(|&(color, n)| Swatch::new(color, n as f32 / total))
        .collect();

    // rev() so ties go to the first-seen color
    if let Some(&(dominant, _)) = counts.iter().rev().max_by_key(|(_, n)| *n) {
        let missing = k - swatches.len();
        swatches.extend(std::iter::repeat_with(|| Swatch::new(dominant, 0.0)).take(missing));
    }
    swatches
}

fn kmeans_swatches(pixels: &[Rgb], options: &ExtractOptions) -> Vec<Swatch> {
    let k = options.n_colors;
    let points: Vec<Srgb<f32>> = pixels.iter().map(|p| p.to_srgb()).collect();

    let result = get_kmeans(k, options.max_iter, options.converge, false, &points, options.seed);
    debug!(k, points = points.len(), score = result.score, "k-means finished");

    // Centroids are the exact integer means of their members. The f32 sums
    // inside k-means can land just under a whole channel value.
    let mut sums = vec![[0u64; 3]; result.centroids.len()];
    let mut members = vec![0u64; result.centroids.len()];
    for (&idx, p) in result.indices.iter().zip(pixels) {
        let sum = &mut sums[idx as usize];
        sum[0] += u64::from(p.r);
        sum[1] += u64::from(p.g);
        sum[2] += u64::from(p.b);
        members[idx as usize] += 1;
    }

    let total = points.len() as f32;
    result
        .centroids
        .iter()
        .zip(sums.iter().zip(members))
        .map(|(&c, (sum, n))| {
            // an empty cluster keeps whatever centroid k-means left it with
            let color = match n {
                0 => Rgb::from_centroid(c),
                n => Rgb::new((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8),
            };
            Swatch::new(color, n as f32 / total)
        })
        .collect()
}
