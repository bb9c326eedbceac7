//! Quad-tree queries checked against brute force on random layouts

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::foundation::math::Vec2;
use crate::spatial::{CircleSearch, QuadTree, QuadTreeConfig, QuadTreeRegion, QuadTreeSearch, ViewWedgeSearch};

type Item = (usize, QuadTreeRegion);
type RegionTree = QuadTree<Item, fn(&Item) -> QuadTreeRegion>;

const SPAN: QuadTreeRegion = QuadTreeRegion::new(-512.0, -512.0, 512.0, 512.0);

fn region_of(item: &Item) -> QuadTreeRegion {
    item.1
}

fn tree() -> RegionTree {
    let config = QuadTreeConfig { max_members_per_cell: 4, sets_per_bucket: 8, max_depth: 12 };
    QuadTree::with_config(SPAN, region_of as fn(&Item) -> QuadTreeRegion, config)
}

fn random_region(rng: &mut StdRng, max_half: f32) -> QuadTreeRegion {
    let half_x = rng.gen_range(0.0..max_half);
    let half_y = rng.gen_range(0.0..max_half);
    let x = rng.gen_range(SPAN.min_x + half_x..SPAN.max_x - half_x);
    let y = rng.gen_range(SPAN.min_y + half_y..SPAN.max_y - half_y);
    QuadTreeRegion::from_center(x, y, half_x, half_y)
}

fn random_items(seed: u64, count: usize) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|id| (id, random_region(&mut rng, 20.0))).collect()
}

fn ids<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<usize> {
    let mut ids: Vec<usize> = items.into_iter().map(|item| item.0).collect();
    ids.sort_unstable();
    ids
}

/// Items a search must return: those whose own region it hits
fn brute_force<S: QuadTreeSearch>(items: &[Item], search: &S) -> Vec<usize> {
    ids(items.iter().filter(|item| search.test(&item.1).is_hit()))
}

#[test]
fn test_bounds_queries_match_brute_force() {
    let items = random_items(7, 600);
    let mut tree = tree();
    tree.add_all(items.iter().copied()).unwrap();
    assert_eq!(tree.len(), items.len());

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let bounds = random_region(&mut rng, 150.0);
        let expected = ids(items.iter().filter(|item| item.1.overlaps(&bounds)));
        assert_eq!(ids(tree.collect_in_bounds(&bounds)), expected, "bounds {bounds:?}");
    }
}

#[test]
fn test_shape_queries_match_brute_force() {
    let items = random_items(3, 400);
    let mut tree = tree();
    tree.add_all(items.iter().copied()).unwrap();

    let circle = CircleSearch::new(Vec2::new(40.0, -60.0), 120.0);
    assert_eq!(ids(tree.collect_in_shape(&circle)), brute_force(&items, &circle));

    let wedge = ViewWedgeSearch::new(Vec2::new(-300.0, 0.0), Vec2::new(1.0, 0.2), 0.6, 500.0);
    assert_eq!(ids(tree.collect_in_shape(&wedge)), brute_force(&items, &wedge));
}

#[test]
fn test_every_item_lands_in_exactly_one_cell() {
    let items = random_items(19, 300);
    let mut tree = tree();
    tree.add_all(items.iter().copied()).unwrap();

    let mut stored = 0;
    let mut cells = 0;
    tree.visit_cells(|region, depth, members| {
        assert!(SPAN.contains(region));
        assert!(depth <= 12);
        stored += members;
        cells += 1;
    });
    assert_eq!(stored, items.len());
    assert!(cells > 1);
    assert_eq!(ids(tree.collect_in_bounds(&SPAN)), ids(&items));
}

#[test]
fn test_per_frame_rebuild_is_stable() {
    let items = random_items(23, 500);
    let mut tree = tree();
    tree.add_all(items.iter().copied()).unwrap();
    let bounds = QuadTreeRegion::new(-100.0, -100.0, 100.0, 100.0);
    let first = ids(tree.collect_in_bounds(&bounds));
    let buckets = tree.allocated_buckets();

    for _ in 0..5 {
        tree.clear();
        tree.add_all(items.iter().copied()).unwrap();
        assert_eq!(ids(tree.collect_in_bounds(&bounds)), first);
        assert_eq!(tree.allocated_buckets(), buckets);
    }
}
