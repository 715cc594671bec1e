//! Uniform grid for neighbor queries.

use evo_core::{EntityId, Vec2, WorldConfig};

/// Map partitioned into square cells, each holding the lifeforms inside it.
/// Rebuilt from scratch every tick.
#[derive(Debug, Clone)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    cell_size: f64,
    width: f64,
    height: f64,
    cells: Vec<Vec<EntityId>>,
}

impl Grid {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            cols,
            rows,
            cell_size,
            width,
            height,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.map_width(), config.map_height(), config.cell_size)
    }

    /// Empty every cell, keeping allocations
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Replace the contents with the given lifeforms
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (EntityId, Vec2)>) {
        self.clear();
        for (id, pos) in entries {
            self.insert(id, pos);
        }
    }

    pub fn insert(&mut self, id: EntityId, pos: Vec2) {
        let (col, row) = self.cell_of(pos);
        let index = self.cell_index(col, row);
        self.cells[index].push(id);
    }

    /// Cell coordinates holding `pos`; positions off the map land in the border cells
    pub fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let x = Self::clamp_axis(pos.x, self.width);
        let y = Self::clamp_axis(pos.y, self.height);
        let col = ((x / self.cell_size) as usize).min(self.cols - 1);
        let row = ((y / self.cell_size) as usize).min(self.rows - 1);
        (col, row)
    }

    fn clamp_axis(value: f64, extent: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, (extent - 1.0).max(0.0))
    }

    fn cell_index(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    pub fn cell(&self, col: usize, row: usize) -> &[EntityId] {
        &self.cells[self.cell_index(col, row)]
    }

    /// Inclusive cell range covering the square `pos ± radius`
    pub fn cell_range(&self, pos: Vec2, radius: f64) -> ((usize, usize), (usize, usize)) {
        let radius = radius.max(0.0);
        let min = self.cell_of(Vec2::new(pos.x - radius, pos.y - radius));
        let max = self.cell_of(Vec2::new(pos.x + radius, pos.y + radius));
        (min, max)
    }

    /// Every entry in the cells the square `pos ± radius` touches.
    ///
    /// This over-approximates the circle: callers filter by exact distance.
    pub fn query(&self, pos: Vec2, radius: f64) -> impl Iterator<Item = EntityId> + '_ {
        let ((col_min, row_min), (col_max, row_max)) = self.cell_range(pos, radius);
        (row_min..=row_max).flat_map(move |row| {
            (col_min..=col_max).flat_map(move |col| self.cell(col, row).iter().copied())
        })
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }
}
