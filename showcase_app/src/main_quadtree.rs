//! Quad-tree Culling Demo
//!
//! Scatters scenery over a large ground area and flies a camera around it:
//! - The tree is cleared and refilled every frame, like the game does
//! - The camera's view wedge is collected through the tree and by brute force
//! - Cell depth histogram and arena usage are reported at the end
//!
//! The number of scenery objects may be given as first argument.

use hover_engine::foundation::logging;
use hover_engine::foundation::math::Vec2;
use hover_engine::foundation::time::Stopwatch;
use hover_engine::spatial::{QuadTree, QuadTreeConfig, QuadTreeRegion, QuadTreeSearch, ViewWedgeSearch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// World layout
const WORLD_HALF_SIZE: f32 = 2048.0;
const DEFAULT_SCENERY_COUNT: usize = 20_000;
const SMALL_PROP_SIZE: f32 = 2.0;
const LARGE_PROP_SIZE: f32 = 40.0;
const LARGE_PROP_RATIO: f64 = 0.05;

// Camera
const FRAMES: usize = 240;
const ORBIT_RADIUS: f32 = 1200.0;
const VIEW_DISTANCE: f32 = 600.0;
const VIEW_HALF_ANGLE: f32 = 0.6;

#[derive(Debug, Clone, Copy)]
struct Prop {
    id: usize,
    footprint: QuadTreeRegion,
}

fn footprint_of(prop: &Prop) -> QuadTreeRegion {
    prop.footprint
}

fn scatter(count: usize, rng: &mut StdRng) -> Vec<Prop> {
    (0..count)
        .map(|id| {
            let half = if rng.gen_bool(LARGE_PROP_RATIO) {
                rng.gen_range(SMALL_PROP_SIZE..LARGE_PROP_SIZE)
            } else {
                rng.gen_range(0.1..SMALL_PROP_SIZE)
            };
            let limit = WORLD_HALF_SIZE - half;
            let footprint =
                QuadTreeRegion::from_center(rng.gen_range(-limit..limit), rng.gen_range(-limit..limit), half, half);
            Prop { id, footprint }
        })
        .collect()
}

/// Camera on a circular orbit, looking along its path
fn camera_at(frame: usize) -> ViewWedgeSearch {
    let angle = frame as f32 / FRAMES as f32 * std::f32::consts::TAU;
    let (sin, cos) = angle.sin_cos();
    ViewWedgeSearch::new(
        Vec2::new(cos, sin) * ORBIT_RADIUS,
        Vec2::new(-sin, cos),
        VIEW_HALF_ANGLE,
        VIEW_DISTANCE,
    )
}

fn main() {
    logging::init();
    let count = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_SCENERY_COUNT);
    log::info!("Starting quad-tree culling demo with {count} props");

    let mut rng = StdRng::seed_from_u64(7);
    let props = scatter(count, &mut rng);
    let spanning = QuadTreeRegion::new(-WORLD_HALF_SIZE, -WORLD_HALF_SIZE, WORLD_HALF_SIZE, WORLD_HALF_SIZE);
    let mut tree = QuadTree::with_config(
        spanning,
        footprint_of as fn(&Prop) -> QuadTreeRegion,
        QuadTreeConfig::default(),
    );

    let mut rebuild_ms = 0.0;
    let mut tree_ms = 0.0;
    let mut brute_ms = 0.0;
    let mut visible_total = 0;
    let mut mismatches = 0;
    let mut visible = Vec::new();

    for frame in 0..FRAMES {
        let stopwatch = Stopwatch::start_new();
        tree.clear();
        if let Err(err) = tree.add_all(props.iter().copied()) {
            log::error!("Rebuild failed: {err}");
            return;
        }
        rebuild_ms += stopwatch.elapsed_millis();

        let camera = camera_at(frame);
        let stopwatch = Stopwatch::start_new();
        visible.clear();
        tree.collect_map_in_shape(&camera, |prop| prop.id, &mut visible);
        tree_ms += stopwatch.elapsed_millis();

        let stopwatch = Stopwatch::start_new();
        let brute = props.iter().filter(|prop| camera.test(&prop.footprint).is_hit()).count();
        brute_ms += stopwatch.elapsed_millis();

        if brute != visible.len() {
            mismatches += 1;
            log::warn!("Frame {frame}: tree found {} props, brute force {brute}", visible.len());
        }
        visible_total += visible.len();
        if frame % 60 == 0 {
            log::info!("Frame {frame}: {} props in view", visible.len());
        }
    }

    let mut depths: Vec<(usize, usize)> = Vec::new();
    tree.visit_cells(|_, depth, members| {
        let depth = depth as usize;
        if depths.len() <= depth {
            depths.resize(depth + 1, (0, 0));
        }
        depths[depth].0 += 1;
        depths[depth].1 += members;
    });
    for (depth, (cells, members)) in depths.iter().enumerate() {
        log::info!("depth {depth:>2}: {cells:>6} cells, {members:>6} props");
    }

    let frames = FRAMES as f32;
    log::info!(
        "{} buckets allocated, {:.1} props in view per frame, {mismatches} mismatching frames",
        tree.allocated_buckets(),
        visible_total as f32 / frames
    );
    log::info!(
        "per frame: rebuild {:.3}ms, tree query {:.3}ms, brute force {:.3}ms",
        rebuild_ms / frames,
        tree_ms / frames,
        brute_ms / frames
    );
}
