//! Behavioral properties of the engine as a whole.

use backdrop::config::{BackdropConfig, ConstellationConfig, GridConfig, Scene};
use backdrop::physics::{proximity, step_constellation, step_grid, wrap};
use backdrop::pointer::PointerState;
use backdrop::store::{Entity, EntityStore};
use backdrop::timeline::{frames_to_converge, MarkerState, TimelineConfig, TimelineSync};
use backdrop::viewport::Rect;
use backdrop::{Backdrop, DrawList, FrameOutcome, HostEvent, ManualDriver, MountOutcome, Vec2, WindowMetrics};
use proptest::prelude::*;

type Engine = Backdrop<DrawList, ManualDriver>;

fn seeded(config: BackdropConfig) -> Engine {
    Backdrop::new(BackdropConfig { seed: Some(42), ..config }, ManualDriver::new()).unwrap()
}

/// Deliver pending frames at a fixed interval, starting at `start_ms`.
fn run(engine: &mut Engine, start_ms: f64, frames: usize, interval_ms: f64) -> f64 {
    let mut now = start_ms;
    for _ in 0..frames {
        let Some(token) = engine.driver_mut().take_pending() else {
            break;
        };
        engine.frame(token, now);
        now += interval_ms;
    }
    now
}

fn positions(engine: &Engine) -> Vec<Vec2> {
    engine.store().entities().iter().map(|e| e.position).collect()
}

#[derive(Debug, Clone)]
enum Op {
    Move(f32, f32),
    Press(f32, f32),
    Leave,
    Resize(f32, f32),
    Hide(bool),
    Frame(f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-300.0f32..2300.0, -300.0f32..1500.0).prop_map(|(x, y)| Op::Move(x, y)),
        1 => (0.0f32..2000.0, 0.0f32..1200.0).prop_map(|(x, y)| Op::Press(x, y)),
        1 => Just(Op::Leave),
        1 => (0.0f32..2000.0, 0.0f32..1200.0).prop_map(|(w, h)| Op::Resize(w, h)),
        1 => any::<bool>().prop_map(Op::Hide),
        6 => (0.0f64..150.0).prop_map(Op::Frame),
    ]
}

fn apply_ops(engine: &mut Engine, ops: &[Op]) {
    let mut now = 0.0;
    for op in ops {
        match *op {
            Op::Move(x, y) => engine.handle_event(HostEvent::PointerMove {
                position: Vec2::new(x, y),
            }),
            Op::Press(x, y) => engine.handle_event(HostEvent::PointerDown {
                position: Vec2::new(x, y),
            }),
            Op::Leave => engine.handle_event(HostEvent::PointerLeave),
            Op::Resize(w, h) => engine.handle_event(HostEvent::Resize(WindowMetrics::new(w, h, 1.0))),
            Op::Hide(hidden) => engine.handle_event(HostEvent::VisibilityChange { hidden }),
            Op::Frame(dt) => {
                now += dt;
                if let Some(token) = engine.driver_mut().take_pending() {
                    engine.frame(token, now);
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_grid_stays_bounded(ops in proptest::collection::vec(op(), 1..150)) {
        let mut engine = seeded(BackdropConfig::mesh_grid());
        prop_assert_eq!(engine.mount(Some(DrawList::new()), WindowMetrics::new(800.0, 600.0, 1.0)), MountOutcome::Running);
        apply_ops(&mut engine, &ops);

        for e in engine.store().entities() {
            prop_assert!(e.position.is_finite() && e.velocity.is_finite());
            prop_assert!(e.position.distance(e.origin) < 200.0, "point drifted to {:?}", e.position);
        }
    }

    #[test]
    fn prop_constellation_stays_in_wrap_bounds(ops in proptest::collection::vec(op(), 1..150)) {
        let mut engine = seeded(BackdropConfig::constellation());
        prop_assert_eq!(engine.mount(Some(DrawList::new()), WindowMetrics::new(800.0, 600.0, 1.0)), MountOutcome::Running);
        apply_ops(&mut engine, &ops);

        let Scene::Constellation(cfg) = &engine.config().scene else {
            unreachable!();
        };
        let margin = cfg.wrap_margin;
        let bounds = engine.store().bounds();
        for e in engine.store().entities() {
            prop_assert!(e.position.is_finite() && e.velocity.is_finite());
            prop_assert!(e.position.x >= -margin && e.position.x <= bounds.x + margin);
            prop_assert!(e.position.y >= -margin && e.position.y <= bounds.y + margin);
        }
    }

    #[test]
    fn prop_wrap_lands_inside_margin(
        x in -3000.0f32..3000.0,
        y in -3000.0f32..3000.0,
        w in 1.0f32..2000.0,
        h in 1.0f32..2000.0,
        margin in 0.0f32..100.0,
    ) {
        let p = wrap(Vec2::new(x, y), Vec2::new(w, h), margin);
        prop_assert!(p.x >= -margin && p.x <= w + margin);
        prop_assert!(p.y >= -margin && p.y <= h + margin);
        if (-margin..=w + margin).contains(&x) {
            prop_assert_eq!(p.x, x);
        }
    }

    #[test]
    fn prop_grid_rebuild_is_idempotent(w in 1.0f32..3000.0, h in 1.0f32..3000.0) {
        let config = GridConfig::default();
        let mut a = EntityStore::new();
        let mut b = EntityStore::new();
        a.rebuild_grid(Vec2::new(w, h), &config);
        b.rebuild_grid(Vec2::new(w, h), &config);
        b.rebuild_grid(Vec2::new(w, h), &config);
        prop_assert_eq!(a.entities(), b.entities());
        prop_assert_eq!(a.kind(), b.kind());
        prop_assert!(a.len() <= config.max_points);
    }

    #[test]
    fn prop_no_pull_beyond_influence_radius(
        angle in 0.0f32..std::f32::consts::TAU,
        extra in 0.0f32..500.0,
    ) {
        let config = GridConfig::default();
        let rest = Vec2::new(400.0, 300.0);
        let mut points = vec![Entity {
            position: rest,
            origin: rest,
            velocity: Vec2::ZERO,
            size: 1.0,
            alpha: 1.0,
            neighbors: Vec::new(),
        }];
        let pointer = PointerState {
            position: rest + Vec2::from_angle(angle) * (config.influence_radius + extra),
            active: true,
        };
        prop_assert_eq!(proximity(pointer.position.distance(rest), config.influence_radius), 0.0);
        step_grid(&mut points, pointer, &config, 1.0);
        prop_assert_eq!(points[0].position, rest);
        prop_assert_eq!(points[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn prop_no_repel_beyond_radius(
        angle in 0.0f32..std::f32::consts::TAU,
        extra in 0.0f32..500.0,
        vx in -1.0f32..1.0,
        vy in -1.0f32..1.0,
    ) {
        let config = ConstellationConfig::default();
        let start = Vec2::new(400.0, 300.0);
        let velocity = Vec2::new(vx, vy);
        let mut particles = vec![Entity {
            position: start,
            origin: start,
            velocity,
            size: 1.0,
            alpha: 1.0,
            neighbors: Vec::new(),
        }];
        let pointer = PointerState {
            position: start + Vec2::from_angle(angle) * (config.repel_radius + extra),
            active: true,
        };
        step_constellation(&mut particles, pointer, &config, Vec2::new(800.0, 600.0), 1.0);
        prop_assert_eq!(particles[0].velocity, velocity * config.damping);
    }

    #[test]
    fn prop_timeline_settles_within_bound(
        first in -1500.0f32..1500.0,
        second in -1500.0f32..1500.0,
    ) {
        let config = TimelineConfig::default();
        let mut sync = TimelineSync::new(config.clone());
        sync.update_layout(&milestones(first), 220.0, 1080.0);
        sync.update_layout(&milestones(second), 220.0, 1080.0);

        let start = sync.marker().unwrap();
        let target = sync.target().unwrap();
        let bound = frames_to_converge(difference(&start, &target), config.ease, config.snap_epsilon);

        let mut frames = 0;
        while !sync.is_settled() && frames <= bound + 1 {
            sync.step();
            frames += 1;
        }
        // One frame of slack for rounding in the geometric decay.
        prop_assert!(frames <= bound + 1, "{} frames, bound {}", frames, bound);
        prop_assert_eq!(sync.marker(), Some(target));
    }
}

fn milestones(scroll: f32) -> Vec<Option<Rect>> {
    (0..6)
        .map(|i| Some(Rect::new(260.0, 180.0 + i as f32 * 320.0 - scroll, 300.0, 96.0)))
        .collect()
}

fn difference(a: &MarkerState, b: &MarkerState) -> f32 {
    let origin = (a.rect.origin - b.rect.origin).abs().max_element();
    let size = (a.rect.size - b.rect.size).abs().max_element();
    origin
        .max(size)
        .max((a.pill_opacity - b.pill_opacity).abs())
        .max((a.blur - b.blur).abs())
}

#[test]
fn test_homepage_grid_scenario() {
    let mut engine = seeded(BackdropConfig::mesh_grid());
    engine.mount(Some(DrawList::new()), WindowMetrics::new(800.0, 600.0, 1.0));
    assert_eq!(engine.store().len(), 11 * 9);

    let center = Vec2::new(400.0, 300.0);
    engine.handle_event(HostEvent::PointerMove { position: center });
    run(&mut engine, 0.0, 61, 16.7);

    let Scene::Grid(grid) = &engine.config().scene else {
        unreachable!();
    };
    let radius = grid.influence_radius;
    let mut displaced = 0;
    for e in engine.store().entities() {
        let dist = e.origin.distance(center);
        if dist >= radius + 40.0 {
            assert_eq!(e.position, e.origin, "point at {:?} moved", e.origin);
        } else if dist < radius {
            assert!(e.position.distance(e.origin) > 0.5, "point at {:?} stayed put", e.origin);
            // Pulled toward the pointer, not away from it.
            assert!(e.position.distance(center) < dist);
            displaced += 1;
        }
    }
    assert!(displaced > 0);
}

#[test]
fn test_unmount_makes_everything_a_no_op() {
    let mut engine = seeded(BackdropConfig::constellation());
    engine.mount(Some(DrawList::new()), WindowMetrics::new(1024.0, 768.0, 1.0));
    run(&mut engine, 0.0, 10, 16.0);

    let in_flight = engine.driver().pending().unwrap();
    let before = positions(&engine);
    let generation = engine.store().generation();

    engine.unmount();
    assert!(engine.driver().pending().is_none());
    assert!(engine.canvas().is_none());

    assert_eq!(engine.frame(in_flight, 1000.0), FrameOutcome::Stale);
    engine.handle_event(HostEvent::Resize(WindowMetrics::new(640.0, 480.0, 1.0)));
    engine.handle_event(HostEvent::PointerDown {
        position: Vec2::new(10.0, 10.0),
    });
    engine.unmount();

    assert_eq!(positions(&engine), before);
    assert_eq!(engine.store().generation(), generation);
    assert!(engine.driver().pending().is_none());
}

#[test]
fn test_visibility_pause_is_transparent() {
    let metrics = WindowMetrics::new(1024.0, 768.0, 1.0);

    let mut steady = seeded(BackdropConfig::constellation());
    steady.mount(Some(DrawList::new()), metrics);
    run(&mut steady, 0.0, 41, 16.0);

    let mut paused = seeded(BackdropConfig::constellation());
    paused.mount(Some(DrawList::new()), metrics);
    let now = run(&mut paused, 0.0, 21, 16.0);

    paused.handle_event(HostEvent::VisibilityChange { hidden: true });
    let frozen = positions(&paused);

    // The loop keeps ticking while hidden but does no work.
    for i in 0..30 {
        let token = paused.driver_mut().take_pending().unwrap();
        assert_eq!(paused.frame(token, now + 500.0 + 16.0 * i as f64), FrameOutcome::Paused);
    }
    assert!(paused.driver().pending().is_some());
    assert_eq!(positions(&paused), frozen);

    // Ten seconds later the page comes back.
    paused.handle_event(HostEvent::VisibilityChange { hidden: false });
    // The first frame after resuming only re-establishes the time reference.
    run(&mut paused, now + 10_000.0, 21, 16.0);

    assert_eq!(positions(&paused), positions(&steady));
    assert_eq!(
        paused.waves().map(|w| w.phase()),
        steady.waves().map(|w| w.phase())
    );
}

#[test]
fn test_scrolled_out_of_view_pauses() {
    let mut engine = seeded(BackdropConfig::mesh_grid());
    engine.mount(Some(DrawList::new()), WindowMetrics::new(800.0, 600.0, 1.0));
    engine.handle_event(HostEvent::PointerMove {
        position: Vec2::new(400.0, 300.0),
    });
    let now = run(&mut engine, 0.0, 5, 16.0);

    engine.handle_event(HostEvent::IntersectionChange { intersecting: false });
    assert!(!engine.visibility().is_visible());
    let frozen = positions(&engine);

    let token = engine.driver_mut().take_pending().unwrap();
    assert_eq!(engine.frame(token, now), FrameOutcome::Paused);
    assert!(engine.driver().pending().is_some());
    assert_eq!(positions(&engine), frozen);

    engine.handle_event(HostEvent::IntersectionChange { intersecting: true });
    let token = engine.driver_mut().take_pending().unwrap();
    assert_eq!(engine.frame(token, now + 16.0), FrameOutcome::Rendered);
}
