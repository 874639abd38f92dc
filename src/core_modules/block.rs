// THEORY:
// The `block` module describes the geometry the composer works on. A `Region` is
// any axis-aligned rectangle of the source image; a `Block` is one square cell
// of the mosaic, the unit that gets replaced by a single tile.
//
// Key architectural principles:
// 1.  **Row-Major Walk**: A region is covered by blocks left-to-right, then
//     top-to-bottom, stepping by the tile size on both axes. Blocks never
//     overlap.
// 2.  **Full-Size Edges**: When the region is not a multiple of the tile size,
//     the last row and column of blocks still have the full side length and
//     reach past the region. Whoever paints them decides how to clip.
// 3.  **Data Container**: Like the color type, these are plain values. They know
//     their own bounds and nothing about images.

pub mod block {
    /// An axis-aligned rectangle in image coordinates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Region {
        /// Left edge (inclusive).
        pub x: u32,
        /// Top edge (inclusive).
        pub y: u32,
        /// Width in pixels.
        pub width: u32,
        /// Height in pixels.
        pub height: u32,
    }

    impl Region {
        pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
            Self { x, y, width, height }
        }

        /// Right edge (exclusive).
        pub fn right(&self) -> u32 {
            self.x.saturating_add(self.width)
        }

        /// Bottom edge (exclusive).
        pub fn bottom(&self) -> u32 {
            self.y.saturating_add(self.height)
        }

        pub fn area(&self) -> u64 {
            self.width as u64 * self.height as u64
        }

        pub fn is_empty(&self) -> bool {
            self.width == 0 || self.height == 0
        }

        /// True when `other` lies entirely inside this region.
        pub fn contains_region(&self, other: &Region) -> bool {
            other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom()
        }

        /// The overlap of two regions; empty when they are disjoint.
        pub fn intersect(&self, other: &Region) -> Region {
            let x = self.x.max(other.x);
            let y = self.y.max(other.y);
            let right = self.right().min(other.right());
            let bottom = self.bottom().min(other.bottom());
            if right <= x || bottom <= y {
                return Region::new(x, y, 0, 0);
            }
            Region::new(x, y, right - x, bottom - y)
        }

        /// Iterates the blocks of side `size` covering this region in row-major order.
        pub fn blocks(&self, size: u32) -> Blocks {
            Blocks {
                region: *self,
                size,
                next_x: self.x,
                next_y: self.y,
            }
        }

        /// How many blocks of side `size` cover this region.
        pub fn block_count(&self, size: u32) -> u64 {
            if size == 0 || self.is_empty() {
                return 0;
            }
            self.width.div_ceil(size) as u64 * self.height.div_ceil(size) as u64
        }
    }

    /// One square cell of the mosaic, anchored at its top-left corner.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Block {
        pub x: u32,
        pub y: u32,
        pub size: u32,
    }

    impl Block {
        /// The full square this block paints, ignoring any region boundary.
        pub fn paint_rect(&self) -> Region {
            Region::new(self.x, self.y, self.size, self.size)
        }

        /// The part of this block that falls inside `region`.
        pub fn clipped_to(&self, region: &Region) -> Region {
            self.paint_rect().intersect(region)
        }
    }

    /// Row-major iterator over the blocks of a region.
    #[derive(Debug, Clone)]
    pub struct Blocks {
        region: Region,
        size: u32,
        next_x: u32,
        next_y: u32,
    }

    impl Iterator for Blocks {
        type Item = Block;

        fn next(&mut self) -> Option<Block> {
            if self.size == 0 || self.region.is_empty() || self.next_y >= self.region.bottom() {
                return None;
            }

            let block = Block {
                x: self.next_x,
                y: self.next_y,
                size: self.size,
            };

            match self.next_x.checked_add(self.size) {
                Some(x) if x < self.region.right() => self.next_x = x,
                _ => {
                    self.next_x = self.region.x;
                    self.next_y = self.next_y.saturating_add(self.size);
                }
            }

            Some(block)
        }
    }
}
