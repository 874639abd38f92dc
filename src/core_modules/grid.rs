// THEORY:
// The `GridLayout` decides how one mosaic job is split into independent pieces of
// work. The default is four quadrants split at the image midpoints, but any
// `columns x rows` grid is allowed so the degree of parallelism is not baked in.
//
// Key architectural principles:
// 1.  **Exact Cover**: Column boundaries sit at `width * i / columns` and row
//     boundaries at `height * j / rows`. Consecutive boundaries share an edge, so
//     the cells cover the image exactly with no gap and no overlap.
// 2.  **Row-Major Cells**: Cells are produced top-left first, left-to-right, then
//     top-to-bottom. The order only matters for logging; merging relies solely on
//     the cells being disjoint.
// 3.  **Degenerate Cells Are Allowed**: A grid finer than the image produces
//     zero-sized cells. They are still returned (so the cell count is stable) and
//     callers skip them.

pub mod grid {
    use crate::core_modules::block::block::Region;
    use crate::error::{MosaicError, Result};

    /// One cell of a partitioned image.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GridCell {
        /// The column index of this cell in the grid.
        pub column: u32,
        /// The row index of this cell in the grid.
        pub row: u32,
        /// The pixels this cell owns, in full-image coordinates.
        pub region: Region,
    }

    /// How many independent composition tasks a job is split into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GridLayout {
        /// The width of the grid in cells.
        pub columns: u32,
        /// The height of the grid in cells.
        pub rows: u32,
    }

    impl Default for GridLayout {
        fn default() -> Self {
            Self::quadrants()
        }
    }

    impl GridLayout {
        pub fn new(columns: u32, rows: u32) -> Self {
            Self { columns, rows }
        }

        /// The classic 2x2 split at the horizontal and vertical midpoints.
        pub fn quadrants() -> Self {
            Self::new(2, 2)
        }

        pub fn cell_count(&self) -> usize {
            self.columns as usize * self.rows as usize
        }

        pub fn validate(&self) -> Result<()> {
            if self.columns == 0 || self.rows == 0 {
                return Err(MosaicError::InvalidInput(format!(
                    "grid must have at least one column and one row, got {}x{}",
                    self.columns, self.rows
                )));
            }
            Ok(())
        }

        /// Splits a `width x height` image into `columns x rows` cells.
        pub fn partition(&self, width: u32, height: u32) -> Result<Vec<GridCell>> {
            self.validate()?;

            let xs = Self::boundaries(width, self.columns);
            let ys = Self::boundaries(height, self.rows);

            let mut cells = Vec::with_capacity(self.cell_count());
            for row in 0..self.rows as usize {
                for column in 0..self.columns as usize {
                    cells.push(GridCell {
                        column: column as u32,
                        row: row as u32,
                        region: Region::new(
                            xs[column],
                            ys[row],
                            xs[column + 1] - xs[column],
                            ys[row + 1] - ys[row],
                        ),
                    });
                }
            }
            Ok(cells)
        }

        fn boundaries(length: u32, parts: u32) -> Vec<u32> {
            (0..=parts)
                .map(|i| ((length as u64 * i as u64) / parts as u64) as u32)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::grid::*;
    use crate::core_modules::block::block::Region;
    use crate::error::MosaicError;

    fn assert_exact_cover(width: u32, height: u32, grid: GridLayout) {
        let cells = grid.partition(width, height).expect("partition");
        assert_eq!(cells.len(), grid.cell_count());

        let mut owners = vec![0u32; (width * height) as usize];
        for cell in &cells {
            let r = cell.region;
            assert!(r.right() <= width && r.bottom() <= height);
            for y in r.y..r.bottom() {
                for x in r.x..r.right() {
                    owners[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(
            owners.iter().all(|&n| n == 1),
            "{width}x{height} with {grid:?} is not an exact cover"
        );
    }

    #[test]
    fn quadrants_split_at_midpoints() {
        let cells = GridLayout::quadrants().partition(10, 7).expect("partition");
        let regions: Vec<Region> = cells.iter().map(|c| c.region).collect();
        assert_eq!(
            regions,
            vec![
                Region::new(0, 0, 5, 3),
                Region::new(5, 0, 5, 3),
                Region::new(0, 3, 5, 4),
                Region::new(5, 3, 5, 4),
            ]
        );
        assert_eq!((cells[3].column, cells[3].row), (1, 1));
    }

    #[test]
    fn partitions_cover_exactly() {
        for (w, h) in [(1, 1), (2, 2), (3, 5), (4, 4), (17, 9), (640, 481)] {
            assert_exact_cover(w, h, GridLayout::quadrants());
        }
        assert_exact_cover(10, 10, GridLayout::new(3, 4));
        assert_exact_cover(7, 3, GridLayout::new(1, 1));
        assert_exact_cover(5, 5, GridLayout::new(6, 2));
    }

    #[test]
    fn tiny_images_produce_empty_cells() {
        let cells = GridLayout::quadrants().partition(1, 1).expect("partition");
        let non_empty: Vec<&GridCell> = cells.iter().filter(|c| !c.region.is_empty()).collect();
        assert_eq!(non_empty.len(), 1);
        assert_eq!(non_empty[0].region, Region::new(0, 0, 1, 1));
    }

    #[test]
    fn rejects_degenerate_grid() {
        assert!(matches!(
            GridLayout::new(0, 2).partition(4, 4),
            Err(MosaicError::InvalidInput(_))
        ));
        assert!(GridLayout::new(2, 0).validate().is_err());
    }
}
