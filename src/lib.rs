//! Find the dominant colors of an image.
//!
//! The image is decoded, flattened to RGB, shrunk by a fixed factor and its
//! pixels are clustered with k-means. Each centroid becomes one swatch with
//! its `#rrggbb` code.
//!
//! ```rust,no_run
//! let (colors, hex) = top_colors::extract_top_colors("photo.jpg", 10);
//! for (c, h) in colors.iter().zip(&hex) {
//!     println!("{h}: {} {} {}", c.r, c.g, c.b);
//! }
//! ```

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

pub mod color;
pub mod error;
pub mod extract;

pub use color::{ParseHexError, Rgb, hex_to_rgb, rgb_to_hex};
pub use error::{ExtractionError, Result};
pub use extract::{
    ExtractOptions, MAX_COLORS, Palette, Swatch, downsampled_dimensions, extract_from_image,
    extract_top_colors, extract_top_colors_bytes, try_extract_top_colors,
};

/// Find the `n_colors` dominant colors of an encoded image.
///
/// Resolves to `{ colors: [[r, g, b], ...], hex: ["#rrggbb", ...], shares: [...] }`
/// with all three arrays in the same order.
#[wasm_bindgen]
pub fn top_colors(input: Vec<u8>, n_colors: usize) -> std::result::Result<Object, JsValue> {
    let options = ExtractOptions::default().with_n_colors(n_colors);
    let palette = extract_top_colors_bytes(&input, &options)
        .map_err(|e| JsValue::from_str(&format!("Error processing the image: {e}")))?;

    let colors_js = Array::new();
    let hex_js = Array::new();
    let shares_js = Array::new();
    for swatch in palette.swatches() {
        let Rgb { r, g, b } = swatch.color;
        colors_js.push(&Array::of3(&JsValue::from(r), &JsValue::from(g), &JsValue::from(b)));
        hex_js.push(&JsValue::from_str(&swatch.hex));
        shares_js.push(&JsValue::from_f64(f64::from(swatch.share)));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("colors"), &colors_js)?;
    Reflect::set(&result, &JsValue::from_str("hex"), &hex_js)?;
    Reflect::set(&result, &JsValue::from_str("shares"), &shares_js)?;

    Ok(result)
}
