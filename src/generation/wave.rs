//! Possibility state of the collapse lattice.

/// Per-cell sets of still-possible pattern ids over a rectangular lattice.
///
/// Cells only ever lose possibilities. A cell with one left is collapsed, a
/// cell with none is a contradiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wave {
    width: usize,
    height: usize,
    pattern_count: usize,
    possible: Vec<bool>,
    counts: Vec<usize>,
}

impl Wave {
    /// Creates a lattice where every cell allows every pattern.
    pub fn new(width: usize, height: usize, pattern_count: usize) -> Self {
        let cells = width * height;
        Self {
            width,
            height,
            pattern_count,
            possible: vec![true; cells * pattern_count],
            counts: vec![pattern_count; cells],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Row-major index of `(x, y)`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Lattice position of a cell index.
    pub fn position(&self, cell: usize) -> (usize, usize) {
        (cell % self.width, cell / self.width)
    }

    pub fn is_possible(&self, cell: usize, pattern: usize) -> bool {
        self.possible[cell * self.pattern_count + pattern]
    }

    /// Number of patterns still possible in a cell.
    pub fn count(&self, cell: usize) -> usize {
        self.counts[cell]
    }

    /// Pattern ids still possible in a cell, ascending.
    pub fn candidates(&self, cell: usize) -> Vec<usize> {
        (0..self.pattern_count)
            .filter(|&pattern| self.is_possible(cell, pattern))
            .collect()
    }

    /// Removes a pattern from a cell. Returns whether anything changed.
    pub fn ban(&mut self, cell: usize, pattern: usize) -> bool {
        let slot = cell * self.pattern_count + pattern;
        if !self.possible[slot] {
            return false;
        }
        self.possible[slot] = false;
        self.counts[cell] -= 1;
        true
    }

    /// Restricts a cell to a single pattern.
    pub fn collapse(&mut self, cell: usize, chosen: usize) {
        for pattern in 0..self.pattern_count {
            if pattern != chosen {
                self.ban(cell, pattern);
            }
        }
    }

    /// The uncollapsed cell with the fewest possibilities.
    ///
    /// Ties go to the lowest row-major index. `None` once every cell is
    /// collapsed.
    pub fn lowest_entropy_cell(&self) -> Option<usize> {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 1)
            .min_by_key(|(cell, &count)| (count, *cell))
            .map(|(cell, _)| cell)
    }

    /// The single remaining pattern of a collapsed cell.
    pub fn collapsed_pattern(&self, cell: usize) -> Option<usize> {
        if self.counts[cell] == 1 {
            (0..self.pattern_count).find(|&pattern| self.is_possible(cell, pattern))
        } else {
            None
        }
    }

    pub fn is_fully_collapsed(&self) -> bool {
        self.counts.iter().all(|&count| count == 1)
    }
}
