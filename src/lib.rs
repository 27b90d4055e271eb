//! brushlayer - painterly stroke generation
//!
//! Turns a source image into an ordered stack of brushstroke layers for a
//! separate renderer. Each layer is driven by its own style record:
//!
//! - lower layers paint from a blurred copy of the source, the top layer from
//!   the source itself
//! - an importance mask built from image gradients steers random placement
//!   toward edges
//! - a deterministic fill pass guarantees every pixel is covered
//!
//! ```no_run
//! use std::path::Path;
//! use rand::SeedableRng;
//!
//! let mut painting = brushlayer::Painting::load(Path::new("in.png"), Path::new("style.json"))?;
//! painting.process(&mut rand::rngs::StdRng::seed_from_u64(7));
//! painting.save(Path::new("canvas.json"))?;
//! # Ok::<(), brushlayer::PaintError>(())
//! ```

pub mod canvas;
pub mod colorize;
pub mod coverage;
pub mod error;
pub mod importance;
pub mod logging;
pub mod pipeline;
pub mod placement;
pub mod raster;
pub mod strokes;
pub mod style;

pub use canvas::{Brushstroke, Canvas, Layer};
pub use error::{PaintError, Result};
pub use pipeline::{Painting, paint};
pub use style::{CanvasStyle, LayerStyle};
