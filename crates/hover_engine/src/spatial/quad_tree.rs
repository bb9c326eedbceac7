//! Quad-tree spatial partitioning structure
//!
//! Divides the ground plane into hierarchical regions for fast culling
//! queries. The tree has no removal or move operation: it is meant to be
//! cleared and refilled every frame, and [`QuadTree::clear`] keeps every
//! allocated cell so a rebuild after warm-up does not allocate.
//!
//! Cells live in fixed-size buckets of `4 * sets_per_bucket` cells. A cell
//! refers to its four children by a bucket/offset pair instead of a pointer,
//! which keeps subcell reuse across `clear()` safe.
//!
//! Quadrant layout and boundary convention:
//!
//! ```text
//!  2 | 3    y
//! ---|---   ^
//!  0 | 1    |->x
//! ```
//!
//! An item goes to the left quadrants when `max_x < mid_x` and to the right
//! ones when `min_x >= mid_x` (same for `y`). Items touching or crossing a
//! split line stay in the parent cell, so an item is never stored twice.

use serde::{Deserialize, Serialize};

use super::region::QuadTreeRegion;
use super::search::{QuadTreeSearch, RegionSearch};
use crate::config::Config;

/// Number of children of a subdivided cell
pub const SUBCELLS_COUNT: usize = 4;

/// Maps stored items to the region they span
pub trait RegionMapper<T> {
    /// Region spanned by `item`
    fn region(&self, item: &T) -> QuadTreeRegion;
}

impl<T, F> RegionMapper<T> for F
where
    F: Fn(&T) -> QuadTreeRegion,
{
    fn region(&self, item: &T) -> QuadTreeRegion {
        self(item)
    }
}

/// Configuration for quad-tree behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Members a cell holds before it subdivides
    pub max_members_per_cell: usize,

    /// Cell sets (groups of four sibling cells) per arena bucket
    pub sets_per_bucket: usize,

    /// Maximum subdivision depth, cells at this depth never split
    pub max_depth: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_members_per_cell: 5,
            sets_per_bucket: 32,
            max_depth: 20,
        }
    }
}

impl Config for QuadTreeConfig {}

/// Quad-tree errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QuadTreeError {
    /// The item region does not touch the tree's spanning region
    #[error("Tried to add an item spanning {region} outside the quad tree range {spanning}")]
    OutOfBounds {
        /// Region of the rejected item
        region: QuadTreeRegion,
        /// Region covered by the tree
        spanning: QuadTreeRegion,
    },
}

/// Location of four sibling cells in the bucket arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSet {
    bucket: usize,
    first: usize,
}

impl CellSet {
    fn cell(self, quadrant: usize) -> CellId {
        CellId::Sub { bucket: self.bucket, index: self.first + quadrant }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellId {
    Root,
    Sub { bucket: usize, index: usize },
}

#[derive(Debug)]
struct Cell<T> {
    region: QuadTreeRegion,
    members: Vec<(T, QuadTreeRegion)>,
    subcells: Option<CellSet>,
    depth: u32,
}

impl<T> Cell<T> {
    fn new(region: QuadTreeRegion, depth: u32) -> Self {
        Self {
            region,
            members: Vec::new(),
            subcells: None,
            depth,
        }
    }

    /// Drop members and children, keeping the member storage
    fn reset(&mut self) {
        self.members.clear();
        self.subcells = None;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BucketCursor {
    bucket: usize,
    used_sets: usize,
}

/// A quad tree of elements of type `T`
///
/// The `M` mapper computes, at insertion, the region each item spans. The
/// spanning region is fixed at creation.
#[derive(Debug)]
pub struct QuadTree<T, M> {
    mapper: M,
    config: QuadTreeConfig,
    root: Cell<T>,
    buckets: Vec<Vec<Cell<T>>>,
    cursor: BucketCursor,
    len: usize,
}

impl<T, M: RegionMapper<T>> QuadTree<T, M> {
    /// Create a tree over `spanning_region` with the default configuration
    pub fn new(spanning_region: QuadTreeRegion, mapper: M) -> Self {
        Self::with_config(spanning_region, mapper, QuadTreeConfig::default())
    }

    /// Create a tree over `spanning_region`
    pub fn with_config(spanning_region: QuadTreeRegion, mapper: M, config: QuadTreeConfig) -> Self {
        Self {
            mapper,
            config,
            root: Cell::new(spanning_region, 0),
            buckets: Vec::new(),
            cursor: BucketCursor::default(),
            len: 0,
        }
    }

    /// Region covered by the tree
    pub fn spanning_region(&self) -> &QuadTreeRegion {
        &self.root.region
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree stores no item
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of arena buckets allocated so far (never shrinks)
    pub fn allocated_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Remove every item, keeping the cell arena for the next rebuild
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.iter_mut().for_each(Cell::reset);
        }
        self.root.reset();
        self.cursor = BucketCursor::default();
        self.len = 0;
    }

    /// Insert an item.
    ///
    /// Fails when the item's region does not overlap the spanning region.
    pub fn add(&mut self, item: T) -> Result<(), QuadTreeError> {
        let region = self.mapper.region(&item);
        if !region.overlaps(self.spanning_region()) {
            return Err(QuadTreeError::OutOfBounds {
                region,
                spanning: *self.spanning_region(),
            });
        }

        self.insert_at(CellId::Root, item, region);
        self.len += 1;
        Ok(())
    }

    /// Insert every item, stopping at the first rejected one
    pub fn add_all(&mut self, items: impl IntoIterator<Item = T>) -> Result<(), QuadTreeError> {
        items.into_iter().try_for_each(|item| self.add(item))
    }

    /// Items overlapping `bounds`
    pub fn collect_in_bounds(&self, bounds: &QuadTreeRegion) -> Vec<&T> {
        let mut collected = Vec::new();
        self.collect_map_in_shape(&RegionSearch::new(*bounds), |item| item, &mut collected);
        collected
    }

    /// Items matched by `search`
    pub fn collect_in_shape<S: QuadTreeSearch + ?Sized>(&self, search: &S) -> Vec<&T> {
        let mut collected = Vec::new();
        self.collect_map_in_shape(search, |item| item, &mut collected);
        collected
    }

    /// Push `map(item)` for every item matched by `search`.
    ///
    /// A cell the search fully contains is collected without testing its
    /// items, a cell neither contained nor overlapped is skipped whole.
    pub fn collect_map_in_shape<'a, S, R, F>(&'a self, search: &S, map: F, collected: &mut Vec<R>)
    where
        S: QuadTreeSearch + ?Sized,
        F: Fn(&'a T) -> R,
    {
        self.collect_in_cell(CellId::Root, search, &map, collected);
    }

    /// Visit every live cell with its region, depth and member count
    pub fn visit_cells(&self, mut visitor: impl FnMut(&QuadTreeRegion, u32, usize)) {
        let mut pending = vec![CellId::Root];
        while let Some(id) = pending.pop() {
            let cell = self.cell(id);
            visitor(&cell.region, cell.depth, cell.members.len());
            if let Some(set) = cell.subcells {
                pending.extend((0..SUBCELLS_COUNT).map(|q| set.cell(q)));
            }
        }
    }

    fn cell(&self, id: CellId) -> &Cell<T> {
        match id {
            CellId::Root => &self.root,
            CellId::Sub { bucket, index } => &self.buckets[bucket][index],
        }
    }

    fn cell_mut(&mut self, id: CellId) -> &mut Cell<T> {
        match id {
            CellId::Root => &mut self.root,
            CellId::Sub { bucket, index } => &mut self.buckets[bucket][index],
        }
    }

    fn insert_at(&mut self, start: CellId, item: T, region: QuadTreeRegion) {
        let mut id = start;
        loop {
            let cell = self.cell(id);
            let should_subdivide = cell.subcells.is_none()
                && cell.members.len() >= self.config.max_members_per_cell
                && cell.depth < self.config.max_depth
                && quadrant_of(&cell.region, &region).is_some();
            if should_subdivide {
                self.subdivide(id);
            }

            let cell = self.cell(id);
            let child = cell
                .subcells
                .and_then(|set| quadrant_of(&cell.region, &region).map(|q| set.cell(q)));
            match child {
                Some(child) => id = child,
                None => {
                    self.cell_mut(id).members.push((item, region));
                    return;
                }
            }
        }
    }

    fn subdivide(&mut self, id: CellId) {
        let (region, depth) = {
            let cell = self.cell(id);
            (cell.region, cell.depth)
        };
        let set = self.alloc_subcells(&region, depth + 1);

        let cell = self.cell_mut(id);
        cell.subcells = Some(set);
        let mut members = std::mem::take(&mut cell.members);

        // redistribute current items, straddling ones stay here
        let mut kept = Vec::new();
        for (item, item_region) in members.drain(..) {
            match quadrant_of(&region, &item_region) {
                Some(q) => self.insert_at(set.cell(q), item, item_region),
                None => kept.push((item, item_region)),
            }
        }
        members.extend(kept);
        self.cell_mut(id).members = members;
    }

    fn alloc_subcells(&mut self, parent: &QuadTreeRegion, depth: u32) -> CellSet {
        if self.cursor.used_sets == self.config.sets_per_bucket {
            self.cursor.bucket += 1;
            self.cursor.used_sets = 0;
        }
        if self.cursor.bucket == self.buckets.len() {
            let cells = SUBCELLS_COUNT * self.config.sets_per_bucket;
            self.buckets.push((0..cells).map(|_| Cell::new(QuadTreeRegion::default(), 0)).collect());
            log::trace!("quad tree allocated bucket #{} ({} cells)", self.buckets.len(), cells);
        }

        let set = CellSet {
            bucket: self.cursor.bucket,
            first: self.cursor.used_sets * SUBCELLS_COUNT,
        };
        self.cursor.used_sets += 1;

        for quadrant in 0..SUBCELLS_COUNT {
            let cell = self.cell_mut(set.cell(quadrant));
            cell.reset();
            cell.region = quadrant_region(parent, quadrant);
            cell.depth = depth;
        }
        set
    }
}

fn quadrant_region(parent: &QuadTreeRegion, quadrant: usize) -> QuadTreeRegion {
    let (mid_x, mid_y) = parent.midpoint();
    let mut region = *parent;
    if quadrant & 1 == 0 { region.max_x = mid_x } else { region.min_x = mid_x }
    if quadrant & 2 == 0 { region.max_y = mid_y } else { region.min_y = mid_y }
    region
}

fn quadrant_of(cell: &QuadTreeRegion, item: &QuadTreeRegion) -> Option<usize> {
    let (mid_x, mid_y) = cell.midpoint();
    let x_bit = if item.max_x < mid_x {
        0
    } else if item.min_x >= mid_x {
        1
    } else {
        return None;
    };
    let y_bit = if item.max_y < mid_y {
        0
    } else if item.min_y >= mid_y {
        2
    } else {
        return None;
    };
    Some(x_bit | y_bit)
}

impl<T, M: RegionMapper<T>> QuadTree<T, M> {
    fn collect_in_cell<'a, S, R, F>(&'a self, id: CellId, search: &S, map: &F, collected: &mut Vec<R>)
    where
        S: QuadTreeSearch + ?Sized,
        F: Fn(&'a T) -> R,
    {
        let cell = self.cell(id);
        for (item, region) in &cell.members {
            let result = search.test(region);
            if result.contains || result.overlaps {
                collected.push(map(item));
            }
        }

        let Some(set) = cell.subcells else { return };
        for quadrant in 0..SUBCELLS_COUNT {
            let child = set.cell(quadrant);
            let result = search.test(&self.cell(child).region);
            if result.contains {
                self.collect_all_in_cell(child, map, collected);
            } else if result.overlaps {
                self.collect_in_cell(child, search, map, collected);
            }
        }
    }

    fn collect_all_in_cell<'a, R, F>(&'a self, id: CellId, map: &F, collected: &mut Vec<R>)
    where
        F: Fn(&'a T) -> R,
    {
        let cell = self.cell(id);
        collected.extend(cell.members.iter().map(|(item, _)| map(item)));
        if let Some(set) = cell.subcells {
            for quadrant in 0..SUBCELLS_COUNT {
                self.collect_all_in_cell(set.cell(quadrant), map, collected);
            }
        }
    }
}
