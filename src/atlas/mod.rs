//! Icon sprite sheet layout.
//!
//! Icons are packed into a fixed-column grid of 32×32 cells in the order the
//! scripts listed them. Icon `i` lands in column `i % columns`, row
//! `i / columns`; the calculator computes the same coordinates, so the order
//! must never change.

mod png;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{LoadError, Result};
use crate::icons::IconSource;
use crate::script::SpriteMeta;

pub use png::{content_hash, encode_png};

/// Edge length of one atlas cell, in pixels.
pub const CELL_SIZE: u32 = 32;

/// Horizontal offset of the 32px variant inside a 64px-high mipmap strip.
const MIPMAP_OFFSET: u32 = 64;

/// Grid dimensions for a given icon count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGeometry {
    pub count: usize,
    pub columns: u32,
    pub rows: u32,
}

impl AtlasGeometry {
    pub fn new(count: usize, columns: i64) -> Result<Self> {
        let columns = u32::try_from(columns)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| LoadError::Atlas {
                message: format!("Invalid column count: {}", columns),
            })?;
        if count == 0 {
            return Err(LoadError::Atlas {
                message: "No icons to pack".to_string(),
            });
        }

        let rows = u32::try_from(count.div_ceil(columns as usize)).map_err(|_| LoadError::Atlas {
            message: format!("Too many icons: {}", count),
        })?;
        if columns.checked_mul(CELL_SIZE).is_none() || rows.checked_mul(CELL_SIZE).is_none() {
            return Err(LoadError::Atlas {
                message: format!("Sheet of {} columns and {} rows is too large", columns, rows),
            });
        }

        Ok(Self {
            count,
            columns,
            rows,
        })
    }

    /// Grid cell `(column, row)` of icon `index`.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((index % columns) as u32, (index / columns) as u32)
    }

    /// Top-left pixel of icon `index`.
    pub fn origin(&self, index: usize) -> (u32, u32) {
        let (column, row) = self.cell(index);
        (column * CELL_SIZE, row * CELL_SIZE)
    }

    pub fn width(&self) -> u32 {
        self.columns * CELL_SIZE
    }

    pub fn height(&self) -> u32 {
        self.rows * CELL_SIZE
    }
}

/// How a source image is fitted into its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sizing {
    /// Already 32×32.
    Copy,
    /// A mipmap strip: take the 32×32 variant at (64, 0).
    MipmapCrop,
    /// Anything else: bilinear resample of the whole image.
    Scale,
}

impl Sizing {
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width == CELL_SIZE && height == CELL_SIZE {
            Sizing::Copy
        } else if width > MIPMAP_OFFSET && height == MIPMAP_OFFSET {
            Sizing::MipmapCrop
        } else {
            Sizing::Scale
        }
    }
}

/// An encoded sprite sheet.
#[derive(Debug, Clone)]
pub struct Atlas {
    /// PNG file contents.
    pub png: Vec<u8>,
    /// Lowercase hex MD5 of `png`.
    pub hash: String,
    pub width: u32,
    pub height: u32,
}

impl Atlas {
    pub fn meta(&self) -> SpriteMeta {
        SpriteMeta {
            hash: self.hash.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Composes icons into the grid canvas.
pub struct AtlasBuilder {
    geometry: AtlasGeometry,
    canvas: RgbaImage,
}

impl AtlasBuilder {
    /// Start with a fully transparent canvas.
    pub fn new(geometry: AtlasGeometry) -> Self {
        Self {
            canvas: RgbaImage::new(geometry.width(), geometry.height()),
            geometry,
        }
    }

    pub fn geometry(&self) -> &AtlasGeometry {
        &self.geometry
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Draw `icon` into cell `index`.
    pub fn place(&mut self, index: usize, icon: &DynamicImage) -> Result<Sizing> {
        if index >= self.geometry.count {
            return Err(LoadError::Atlas {
                message: format!(
                    "Icon index {} out of range for {} icons",
                    index, self.geometry.count
                ),
            });
        }

        let sizing = Sizing::for_dimensions(icon.width(), icon.height());
        let cell = match sizing {
            Sizing::Copy => icon.to_rgba8(),
            // crop_imm clips to the source, so narrow strips leave the
            // rest of the cell transparent.
            Sizing::MipmapCrop => icon
                .crop_imm(MIPMAP_OFFSET, 0, CELL_SIZE, CELL_SIZE)
                .to_rgba8(),
            Sizing::Scale => imageops::resize(icon, CELL_SIZE, CELL_SIZE, FilterType::Triangle),
        };

        let (x, y) = self.geometry.origin(index);
        imageops::replace(&mut self.canvas, &cell, i64::from(x), i64::from(y));
        Ok(sizing)
    }

    /// Encode the canvas and hash the result.
    pub fn finish(self) -> Result<Atlas> {
        let png = encode_png(&self.canvas)?;
        let hash = content_hash(&png);
        debug!(
            width = self.canvas.width(),
            height = self.canvas.height(),
            bytes = png.len(),
            hash = %hash,
            "encoded sprite sheet"
        );

        Ok(Atlas {
            png,
            hash,
            width: self.geometry.width(),
            height: self.geometry.height(),
        })
    }
}

/// Decode one icon, naming `source` on failure.
pub fn decode_icon(bytes: &[u8], source: &IconSource) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
        path: source.to_string(),
        message: e.to_string(),
    })
}

/// Pack already decoded icons in order.
pub fn pack(icons: &[DynamicImage], columns: i64) -> Result<Atlas> {
    let mut builder = AtlasBuilder::new(AtlasGeometry::new(icons.len(), columns)?);
    for (index, icon) in icons.iter().enumerate() {
        builder.place(index, icon)?;
    }
    builder.finish()
}
