//! Canvas data model: the artifact handed to the downstream renderer.
//!
//! Field names serialize exactly as the renderer expects them
//! (`anchor`, `width`, `angle`, `opacity`, `strength`, `length1`, `length2`,
//! `color`), so keep them stable.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PaintError, Result};

/// Neutral gray a stroke carries until it is colorized.
pub const UNSET_COLOR: [f64; 3] = [0.5, 0.5, 0.5];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brushstroke {
    /// Canvas coordinates, `[x, y]`
    pub anchor: [f64; 2],
    pub width: f64,
    /// Radians
    pub angle: f64,
    pub opacity: f64,
    pub strength: f64,
    pub length1: f64,
    pub length2: f64,
    /// Normalized RGB
    pub color: [f64; 3],
}

impl Brushstroke {
    pub fn x(&self) -> f64 {
        self.anchor[0]
    }

    pub fn y(&self) -> f64 {
        self.anchor[1]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub strokes: Vec<Brushstroke>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Painting order, index 0 is the bottom layer
    pub layers: Vec<Layer>,
}

impl Canvas {
    /// Creates a canvas with `layer_count` empty layers.
    pub fn new(width: u32, height: u32, layer_count: usize) -> Self {
        Self {
            width,
            height,
            layers: vec![Layer::new(); layer_count],
        }
    }

    pub fn stroke_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Writes the canvas as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let wrap = |source: std::io::Error| PaintError::CanvasWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(File::create(path).map_err(wrap)?);
        self.write_json(&mut writer)?;
        writer.flush().map_err(wrap)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PaintError::CanvasRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| PaintError::CanvasParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
