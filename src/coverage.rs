//! Coverage bookkeeping for stroke placement.
//!
//! A `CoverageGrid` is the per-layer mask of stroke anchors (plus whatever the
//! importance mask pre-marked). Placement asks one question of it, "is
//! anything marked inside this window?", and performs one mutation, "mark this
//! anchor".

use image::GrayImage;

/// Half-open, canvas-clipped square window around a pixel:
/// rows `row_start..row_end`, cols `col_start..col_end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl Window {
    /// Window `trunc(p - half) .. trunc(p + half)` on each axis, clipped to a
    /// `height x width` canvas. A window narrower than one pixel collapses to
    /// the pixel itself; an empty canvas gives an empty window.
    pub fn around(row: u32, col: u32, half: f64, width: u32, height: u32) -> Self {
        let span = |center: u32, len: u32| {
            if len == 0 {
                return (0, 0);
            }
            let lo = ((center as f64 - half).trunc().max(0.0) as u32).min(len);
            let hi = ((center as f64 + half).trunc() as u32).min(len);
            (lo, hi.max((center + 1).min(len)))
        };
        let (row_start, row_end) = span(row, height);
        let (col_start, col_end) = span(col, width);
        Self {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.row_start..self.row_end).contains(&row) && (self.col_start..self.col_end).contains(&col)
    }

    pub fn is_empty(&self) -> bool {
        self.row_start >= self.row_end || self.col_start >= self.col_end
    }
}

#[derive(Clone, Debug)]
pub struct CoverageGrid {
    width: u32,
    height: u32,
    marks: Vec<bool>,
}

impl CoverageGrid {
    /// An empty grid: every pixel is eligible for a stroke.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            marks: vec![false; width as usize * height as usize],
        }
    }

    /// Seeds the grid from a mask; any nonzero pixel counts as marked.
    pub fn from_mask(mask: &GrayImage) -> Self {
        Self {
            width: mask.width(),
            height: mask.height(),
            marks: mask.as_raw().iter().map(|&v| v != 0).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    pub fn is_marked(&self, row: u32, col: u32) -> bool {
        self.marks[self.index(row, col)]
    }

    pub fn mark(&mut self, row: u32, col: u32) {
        let idx = self.index(row, col);
        self.marks[idx] = true;
    }

    pub fn marked_count(&self) -> usize {
        self.marks.iter().filter(|&&m| m).count()
    }

    pub fn window(&self, row: u32, col: u32, half: f64) -> Window {
        Window::around(row, col, half, self.width, self.height)
    }

    /// True if any pixel inside `window` is marked.
    pub fn window_has_mark(&self, window: &Window) -> bool {
        if window.is_empty() {
            return false;
        }
        (window.row_start..window.row_end).any(|row| {
            let start = self.index(row, window.col_start);
            let end = self.index(row, window.col_end);
            self.marks[start..end].iter().any(|&m| m)
        })
    }
}
