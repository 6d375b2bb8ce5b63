//! Random sources for the Monte Carlo shadow cast.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draws grid cells for shadow rays.
pub trait CellSampler {
    /// One cell in `0..rows` x `0..cols`.
    fn next_cell(&mut self, rows: usize, cols: usize) -> (usize, usize);

    /// `count` independent draws, with replacement.
    fn draw(&mut self, rows: usize, cols: usize, count: usize) -> Vec<(usize, usize)> {
        (0..count).map(|_| self.next_cell(rows, cols)).collect()
    }
}

/// Uniform draws from a ChaCha8 stream.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    rng: ChaCha8Rng,
}

impl UniformSampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl CellSampler for UniformSampler {
    fn next_cell(&mut self, rows: usize, cols: usize) -> (usize, usize) {
        (self.rng.gen_range(0..rows), self.rng.gen_range(0..cols))
    }
}

/// Replays a fixed list of cells, cycling when exhausted. Cells are reduced
/// modulo the requested grid size.
#[derive(Debug, Clone)]
pub struct SequenceSampler {
    cells: Vec<(usize, usize)>,
    cursor: usize,
}

impl SequenceSampler {
    /// # Panics
    /// If `cells` is empty.
    pub fn new(cells: Vec<(usize, usize)>) -> Self {
        assert!(!cells.is_empty(), "SequenceSampler needs at least one cell");
        Self { cells, cursor: 0 }
    }

    /// Every cell of a `rows` x `cols` grid in row-major order.
    pub fn exhaustive(rows: usize, cols: usize) -> Self {
        Self::new(
            (0..rows)
                .flat_map(|i| (0..cols).map(move |j| (i, j)))
                .collect(),
        )
    }

    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl CellSampler for SequenceSampler {
    fn next_cell(&mut self, rows: usize, cols: usize) -> (usize, usize) {
        let (i, j) = self.cells[self.cursor % self.cells.len()];
        self.cursor += 1;
        (i % rows, j % cols)
    }
}
