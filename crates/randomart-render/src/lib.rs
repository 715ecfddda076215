//! `randomart-render` samples a randomart program over a pixel grid and
//! writes the result as a PNG.
//!
//! ## Examples
//!
//! ```rust
//! use randomart_lang::Engine;
//!
//! let mut engine = Engine::default();
//! engine.parse("E(x, y, 0)").unwrap();
//!
//! let image = randomart_render::render(engine.program(), 16).unwrap();
//! assert_eq!(image.dimensions(), (16, 16));
//! ```
use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage};
use miette::Diagnostic;
use randomart_lang::{NodeKind, NodeStore, Provenance};
use rayon::prelude::*;
use thiserror::Error;

pub const DEFAULT_SIZE: u32 = 256;

#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    #[error("The program evaluates to \"{kind}\" built at {provenance}, not to `E`")]
    #[diagnostic(
        code(RenderError::InvalidRoot),
        help("Only programs whose root evaluates to `E(r, g, b)` can be rendered.")
    )]
    InvalidRoot {
        kind: NodeKind,
        provenance: Provenance,
    },
    #[error("There is no program to render")]
    #[diagnostic(code(RenderError::EmptyProgram))]
    EmptyProgram,
    #[error("Failed to evaluate pixel ({i}, {j})")]
    #[diagnostic(code(RenderError::Eval))]
    Eval {
        i: u32,
        j: u32,
        #[source]
        source: randomart_lang::EvalError,
    },
    #[error("Image size must be positive")]
    #[diagnostic(code(RenderError::InvalidSize))]
    InvalidSize,
    #[error("Failed to write image to {path}")]
    #[diagnostic(code(RenderError::Write))]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// One evaluated pixel, each channel nominally in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Maps each channel from `[-1, 1]` to a byte. Values outside that range
    /// saturate and NaN becomes 0.
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([channel(self.r), channel(self.g), channel(self.b), u8::MAX])
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[inline]
fn channel(value: f32) -> u8 {
    // float to int casts saturate, NaN casts to 0
    ((value + 1.0) / 2.0 * 255.0) as u8
}

/// Maps pixel index `i` of a `size` wide row to `[-1, 1)`.
#[inline]
pub fn pixel_to_coord(i: u32, size: u32) -> f32 {
    2.0 * i as f32 / size as f32 - 1.0
}

/// Evaluates `program` at every pixel of a `size` x `size` image.
///
/// Rows are rendered in parallel, each worker evaluating on its own copy of
/// the sealed program. Any failing pixel fails the whole image.
pub fn render(program: &NodeStore, size: u32) -> Result<RgbaImage, RenderError> {
    if size == 0 {
        return Err(RenderError::InvalidSize);
    }
    if program.size() == 0 {
        return Err(RenderError::EmptyProgram);
    }

    let row_len = size as usize * 4;
    let mut buffer = vec![0u8; row_len * size as usize];

    buffer
        .par_chunks_mut(row_len)
        .enumerate()
        .try_for_each_init(
            || program.clone(),
            |store, (j, row)| render_row(store, j as u32, size, row),
        )?;

    log::debug!("Rendered {size}x{size} image");
    ImageBuffer::from_raw(size, size, buffer).ok_or(RenderError::InvalidSize)
}

fn render_row(store: &mut NodeStore, j: u32, size: u32, row: &mut [u8]) -> Result<(), RenderError> {
    let y = pixel_to_coord(j, size);

    for (i, pixel) in row.chunks_exact_mut(4).enumerate() {
        let i = i as u32;
        let color = eval_pixel(store, pixel_to_coord(i, size), y)
            .map_err(|e| e.at(i, j))?;
        pixel.copy_from_slice(&color.to_rgba().0);
    }

    Ok(())
}

enum PixelError {
    Eval(randomart_lang::EvalError),
    Render(RenderError),
}

impl PixelError {
    fn at(self, i: u32, j: u32) -> RenderError {
        match self {
            PixelError::Eval(source) => RenderError::Eval { i, j, source },
            PixelError::Render(e) => e,
        }
    }
}

fn eval_pixel(store: &mut NodeStore, x: f32, y: f32) -> Result<Color, PixelError> {
    let result = randomart_lang::eval(store, x, y).map_err(PixelError::Eval)?;

    store.triple_values(result).map(Color::from).ok_or_else(|| {
        let node = store[result];
        PixelError::Render(RenderError::InvalidRoot {
            kind: node.kind(),
            provenance: node.provenance,
        })
    })
}

/// Encodes `image` as PNG at `path`.
pub fn write_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), RenderError> {
    let path = path.as_ref();
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| RenderError::Write {
            path: path.display().to_string(),
            source,
        })?;

    log::info!("Wrote {}", path.display());
    Ok(())
}
