//! Spatial partitioning data structures
//!
//! Provides the ground-plane quad-tree used to cull track pieces and
//! scenery before they reach the renderer, plus the shapes it can be
//! searched with.

mod quad_tree;
mod region;
mod search;

pub use quad_tree::{QuadTree, QuadTreeConfig, QuadTreeError, RegionMapper, SUBCELLS_COUNT};
pub use region::QuadTreeRegion;
pub use search::{CircleSearch, QuadTreeSearch, RegionSearch, SearchResult, ViewWedgeSearch};
