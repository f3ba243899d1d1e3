//! Raster output: projects segments into an RGBA pixel buffer.
//!
//! The integrator space (33,000 x 41,000 units) is divided by a single
//! integer scale, the larger of the two per-axis ratios, so the picture
//! keeps its aspect ratio and is centred in the buffer.

#![allow(clippy::cast_precision_loss)]

use std::fmt;

use crate::analog::{MAX_X, MAX_Y};
use crate::vectors::{COLOR_RANGE, Segment};

/// Default buffer width: one pixel per 100 integrator units.
pub const DEFAULT_WIDTH: u32 = 330;
/// Default buffer height.
pub const DEFAULT_HEIGHT: u32 = 410;

/// Failure to set up the pixel surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// A dimension is zero, or both exceed the integrator extent.
    InvalidDimensions { width: u32, height: u32 },
    /// The pixel buffer could not be allocated.
    Allocation,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid display size {width}x{height}")
            }
            Self::Allocation => write!(f, "failed to allocate pixel buffer"),
        }
    }
}

impl std::error::Error for InitError {}

/// A segment projected into pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "native", derive(serde::Serialize))]
pub struct Line {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    /// Grey level, 0-255.
    pub color: u8,
}

/// RGBA pixel buffer with its projection.
#[derive(Debug, Clone)]
pub struct Display {
    width: u32,
    height: u32,
    scaling: i64,
    x_offset: i64,
    y_offset: i64,
    pixels: Vec<u8>,
}

impl Default for Display {
    /// 330 x 410 pixels: 100 integrator units per pixel, no border.
    fn default() -> Self {
        let scaling = MAX_X / i64::from(DEFAULT_WIDTH);
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scaling,
            x_offset: 0,
            y_offset: 0,
            pixels: vec![0; DEFAULT_WIDTH as usize * DEFAULT_HEIGHT as usize * 4],
        }
    }
}

impl Display {
    pub fn new(width: u32, height: u32) -> Result<Self, InitError> {
        let invalid = InitError::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }

        let scaling = (MAX_X / i64::from(width)).max(MAX_Y / i64::from(height));
        if scaling == 0 {
            return Err(invalid);
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(invalid)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| InitError::Allocation)?;
        pixels.resize(len, 0);

        Ok(Self {
            width,
            height,
            scaling,
            x_offset: (i64::from(width) - MAX_X / scaling) / 2,
            y_offset: (i64::from(height) - MAX_Y / scaling) / 2,
            pixels,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Integrator units per pixel.
    #[must_use]
    pub fn scaling(&self) -> i64 {
        self.scaling
    }

    /// Pixel offset of the integrator origin.
    #[must_use]
    pub fn offset(&self) -> (i64, i64) {
        (self.x_offset, self.y_offset)
    }

    /// RGBA bytes, row-major from the top-left.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Clear the buffer and draw `segments`, appending each projected line
    /// to `lines`.
    pub fn render(&mut self, segments: &[Segment], lines: &mut Vec<Line>) {
        self.pixels.fill(0);

        for segment in segments {
            // The redraw marker wraps to black.
            let color = (u32::from(segment.color) * 256 / u32::from(COLOR_RANGE)) as u8;
            let line = Line {
                x0: self.project_x(segment.x0),
                y0: self.project_y(segment.y0),
                x1: self.project_x(segment.x1),
                y1: self.project_y(segment.y1),
                color,
            };
            self.draw_line(&line);
            lines.push(line);
        }
    }

    fn project_x(&self, x: i64) -> i32 {
        (self.x_offset + x / self.scaling) as i32
    }

    fn project_y(&self, y: i64) -> i32 {
        (self.y_offset + y / self.scaling) as i32
    }

    /// Fixed-step DDA walk, one pixel per step along the major axis.
    fn draw_line(&mut self, line: &Line) {
        let dx = line.x1 - line.x0;
        let dy = line.y1 - line.y0;
        let steps = dx.abs().max(dy.abs());
        if steps == 0 {
            self.set_pixel(line.x0, line.y0, line.color);
            return;
        }

        let x_inc = dx as f32 / steps as f32;
        let y_inc = dy as f32 / steps as f32;
        let mut x = line.x0 as f32;
        let mut y = line.y0 as f32;
        for _ in 0..=steps {
            self.set_pixel(x as i32, y as i32, line.color);
            x += x_inc;
            y += y_inc;
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (x as usize + y as usize * self.width as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&[color, color, color, 0xFF]);
    }
}
