//! A detector's pixel-grid hit-accumulation sink (spec.md §1: "specified
//! only by the values it must produce"), plus the persisted-artifact
//! contract spec.md §6 describes. Rendering (PNG encoding) stays an
//! external collaborator: [`FrameExport`] only specifies the trait
//! boundary and the row-stride arithmetic a concrete encoder must honour.

use crate::core::math::Complex;
use crate::core::Float;

/// A single detector pixel: a running hit count and accumulated complex
/// amplitude (bookkeeping only, per spec.md's Non-goals).
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    pub count: u32,
    pub amplitude: Complex,
}

/// A `cols x rows` grid of [`Cell`]s with physical pixel pitch
/// `(px_width, px_height)`, tracking the running maximum count/energy
/// needed to normalise an export (spec.md §3, §6).
#[derive(Debug, Clone)]
pub struct DetectorStorage {
    cols: usize,
    rows: usize,
    px_width: Float,
    px_height: Float,
    cells: Vec<Cell>,
    max_count: u32,
    max_energy: Float,
}

impl DetectorStorage {
    pub fn new(cols: usize, rows: usize, px_width: Float, px_height: Float) -> Self {
        Self {
            cols,
            rows,
            px_width,
            px_height,
            cells: vec![Cell::default(); cols * rows],
            max_count: 0,
            max_energy: 0.0,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn max_energy(&self) -> Float {
        self.max_energy
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.cols + x]
    }

    /// Total hit count across every pixel, used to cross-check a trace's
    /// intercepted-ray count (spec.md §8 scenario F).
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count as u64).sum()
    }

    /// Maps a local-frame hit point to pixel coordinates and accumulates
    /// it. Returns `false` for an off-grid hit (spec.md's SPEC_FULL §3
    /// `DetectorStorage` contract).
    pub fn hit(&mut self, x: Float, y: Float, amplitude: Complex) -> bool {
        let u = (x / self.px_width + self.cols as Float / 2.0).floor();
        let v = (y / self.px_height + self.rows as Float / 2.0).floor();
        if u < 0.0 || v < 0.0 || u >= self.cols as Float || v >= self.rows as Float {
            return false;
        }
        let (col, row) = (u as usize, v as usize);
        let cell = &mut self.cells[row * self.cols + col];
        cell.count += 1;
        cell.amplitude = cell.amplitude + amplitude;
        self.max_count = self.max_count.max(cell.count);
        self.max_energy = self.max_energy.max(cell.amplitude.intensity());
        true
    }
}

/// Row stride, in cells, rounded up to a multiple of 4 (spec.md §6).
pub fn row_stride(cols: usize) -> usize {
    cols.div_ceil(4) * 4
}

#[derive(Debug, thiserror::Error)]
pub enum StrideError {
    #[error("buffer too small: need at least {needed} cells, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
}

/// The external collaborator that turns accumulated detector counts into
/// persisted bytes. No concrete encoder dependency is added here; a caller
/// outside this crate supplies one (spec.md §1's out-of-scope PNG writer).
pub trait FrameExport {
    /// 8-bit greyscale PNG, values scaled by the detector's maximum count.
    fn write_png(&self, storage: &DetectorStorage) -> anyhow::Result<Vec<u8>>;

    /// Raw little-endian `u32` counts, `cols * rows` cells, row stride
    /// `row_stride(cols)`.
    fn write_raw_u32(&self, storage: &DetectorStorage) -> anyhow::Result<Vec<u8>>;

    /// Raw complex amplitude, `2 * Real` per cell, same row stride.
    fn write_raw_complex(&self, storage: &DetectorStorage) -> anyhow::Result<Vec<u8>>;
}

/// Computes the byte length of a raw `u32` frame export, validating that
/// `buf_len` can hold it.
pub fn raw_u32_len(cols: usize, rows: usize, buf_len: usize) -> Result<usize, StrideError> {
    let needed = row_stride(cols) * rows * 4;
    if buf_len < needed {
        return Err(StrideError::BufferTooSmall { needed, got: buf_len });
    }
    Ok(needed)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hit_inside_grid_increments_cell() {
        let mut storage = DetectorStorage::new(4, 4, 1.0, 1.0);
        assert!(storage.hit(0.0, 0.0, Complex::one()));
        assert_eq!(storage.total_count(), 1);
        assert_eq!(storage.max_count(), 1);
    }

    #[test]
    fn test_hit_outside_grid_is_rejected() {
        let mut storage = DetectorStorage::new(4, 4, 1.0, 1.0);
        assert!(!storage.hit(100.0, 0.0, Complex::one()));
        assert_eq!(storage.total_count(), 0);
    }

    #[test]
    fn test_row_stride_rounds_up_to_multiple_of_four() {
        assert_eq!(row_stride(1), 4);
        assert_eq!(row_stride(4), 4);
        assert_eq!(row_stride(5), 8);
        assert_eq!(row_stride(512), 512);
    }

    #[test]
    fn test_sum_of_pixel_counts_equals_number_of_hits() {
        let mut storage = DetectorStorage::new(512, 512, 15e-6, 15e-6);
        for _ in 0..100 {
            storage.hit(0.0, 0.0, Complex::one());
        }
        assert_eq!(storage.total_count(), 100);
    }
}
