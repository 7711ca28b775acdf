//! End-to-end pipeline scenarios: scheduling, fetching, decoding, and label
//! decoration driven through the `Viewer` facade exactly as a host would.

mod common;

use geo::Coord;
use slippy_mvt::StyleConfig;
use slippy_viewer::{CanvasSize, Effect, LabelConfig, TileState, Viewer, ZoomLevel};

fn viewer() -> Viewer {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Viewer::new(
        CanvasSize {
            width: 512.0,
            height: 512.0,
        },
        1.0,
        StyleConfig::default(),
        LabelConfig::default(),
    )
}

fn c(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

/// Runs ticks, answering every fetch with `bytes`, until the viewer goes
/// quiet. Debounce effects are left unfired (the viewport is quiescent).
fn run_to_quiescence(viewer: &mut Viewer, bytes: &[u8]) -> usize {
    let mut fetched = 0;
    let mut now = 0.0;
    for _ in 0..300 {
        for effect in viewer.tick(now) {
            if let Effect::Fetch(grid) = effect {
                fetched += 1;
                viewer.fetch_completed(grid, Ok(bytes.to_vec()));
            }
        }
        now += 1.0 / 60.0;
    }
    fetched
}

#[test]
fn pipeline_end_to_end() {
    let mut viewer = viewer();
    viewer.jump_to(c(0.5, 0.5), ZoomLevel::new(14.2));
    viewer.set_font(common::test_font());

    let bytes = common::sample_tile();
    let fetched = run_to_quiescence(&mut viewer, &bytes);
    assert!(fetched > 0);

    let visible = viewer.visible_tiles();
    assert!(!visible.is_empty());

    // Fallback-layer tiles render underneath the current zoom.
    assert_eq!(visible.first().unwrap().0.zoom, slippy_viewer::FALLBACK_ZOOM);

    // Every visible current-zoom tile made it all the way to decorated.
    let current: Vec<_> = visible.iter().filter(|(g, _)| g.zoom == 14).collect();
    assert!(!current.is_empty());
    for (_, state) in &current {
        let TileState::Decorated(decorated) = state else {
            panic!("tile not decorated");
        };
        assert!(!decorated.tile.water.is_empty());
        assert!(!decorated.tile.roads.is_empty());
        assert_eq!(decorated.tile.place_labels.len(), 1);
        assert!(!decorated.place_text.is_empty());
    }
}

#[test]
fn decode_failure_degrades_tile_without_stopping_the_viewer() {
    let mut viewer = viewer();
    viewer.jump_to(c(0.5, 0.5), ZoomLevel::new(10.0));

    // Garbage bytes: every tile decodes to Error, ticks keep working.
    let fetched = run_to_quiescence(&mut viewer, &[0xff, 0xff, 0xff]);
    assert!(fetched > 0);
    assert!(viewer.visible_tiles().is_empty());

    // The viewer still responds to input afterwards.
    let effect = viewer.animate_zoom(1.0);
    assert!(matches!(effect, Effect::ScheduleDebounce { .. }));
}

#[test]
fn debounce_coalesces_gesture_bursts() {
    let mut viewer = viewer();
    // Drain the initial scheduling pass.
    run_to_quiescence(&mut viewer, &[]);

    viewer.pointer_down(1, c(100.0, 100.0));
    let mut tokens = Vec::new();
    for i in 1..=5 {
        let moved = viewer.pointer_move(1, c(100.0 + 10.0 * f64::from(i), 100.0));
        let Some(Effect::ScheduleDebounce { token, .. }) = moved else {
            panic!("gesture should schedule a debounce");
        };
        tokens.push(token);
    }
    viewer.pointer_up(1);

    // The four superseded timers are no-ops.
    for token in &tokens[..4] {
        viewer.debounce_fired(*token);
        assert!(!viewer.scheduling_pending());
    }

    // Only the latest token triggers, and only one pass runs.
    viewer.debounce_fired(tokens[4]);
    assert!(viewer.scheduling_pending());
    viewer.tick(10.0);
    assert!(!viewer.scheduling_pending());
}

#[test]
fn scheduling_targets_the_animation_destination() {
    let mut viewer = viewer();
    viewer.jump_to(c(0.5, 0.5), ZoomLevel::new(10.0));
    run_to_quiescence(&mut viewer, &[]);

    let Effect::ScheduleDebounce { token, .. } = viewer.animate_zoom(3.0) else {
        panic!("expected a debounce effect");
    };
    viewer.debounce_fired(token);

    let effects = viewer.tick(100.0);
    let zooms: Vec<u8> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Fetch(grid) => Some(grid.zoom),
            Effect::ScheduleDebounce { .. } => None,
        })
        .collect();
    // Tiles are fetched for where the camera is heading, not where it is.
    assert!(zooms.contains(&13));
    assert!(!zooms.contains(&10));
}

#[test]
fn fallback_layer_is_scheduled_underneath() {
    let mut viewer = viewer();
    viewer.jump_to(c(0.5, 0.5), ZoomLevel::new(12.0));
    let effects = viewer.tick(0.0);
    let zooms: Vec<u8> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Fetch(grid) => Some(grid.zoom),
            Effect::ScheduleDebounce { .. } => None,
        })
        .collect();
    assert!(zooms.contains(&slippy_viewer::FALLBACK_ZOOM));
    assert!(zooms.contains(&12));
}

#[test]
fn full_cache_never_evicts_the_tiles_on_screen() {
    let mut viewer = viewer();
    let home = c(0.5, 0.5);

    // Wander around at the same zoom until the cache is well past the cap.
    for i in 0..60i32 {
        let position = c(0.1 + 0.002 * f64::from(i), 0.1);
        let Effect::ScheduleDebounce { token, .. } = viewer.jump_to(position, ZoomLevel::new(14.0))
        else {
            panic!("jump should schedule a debounce");
        };
        viewer.debounce_fired(token);
        for effect in viewer.tick(f64::from(i)) {
            if let Effect::Fetch(grid) = effect {
                viewer.fetch_completed(grid, Ok(Vec::new()));
            }
        }
    }

    // Settle at home and let the visible tiles decode.
    let Effect::ScheduleDebounce { token, .. } = viewer.jump_to(home, ZoomLevel::new(14.0)) else {
        panic!("jump should schedule a debounce");
    };
    viewer.debounce_fired(token);
    run_to_quiescence(&mut viewer, &common::sample_tile());
    let on_screen: Vec<_> = viewer
        .visible_tiles()
        .iter()
        .map(|(grid, _)| *grid)
        .filter(|grid| grid.zoom == 14)
        .collect();
    assert!(!on_screen.is_empty());

    // A pass with the camera unmoved must not refetch what is on screen.
    let Effect::ScheduleDebounce { token, .. } = viewer.jump_to(home, ZoomLevel::new(14.0)) else {
        panic!("jump should schedule a debounce");
    };
    viewer.debounce_fired(token);
    let effects = viewer.tick(1000.0);
    assert!(!effects.iter().any(|e| match e {
        Effect::Fetch(grid) => on_screen.contains(grid),
        Effect::ScheduleDebounce { .. } => false,
    }));
    for grid in &on_screen {
        assert!(matches!(
            viewer.cache().get(*grid),
            Some(TileState::Decoded(_) | TileState::Decorated(_))
        ));
    }
}

#[test]
fn stale_completion_after_jump_is_harmless() {
    let mut viewer = viewer();
    viewer.jump_to(c(0.5, 0.5), ZoomLevel::new(10.0));

    let effects = viewer.tick(0.0);
    let first_fetch = effects
        .iter()
        .find_map(|e| match e {
            Effect::Fetch(grid) => Some(*grid),
            Effect::ScheduleDebounce { .. } => None,
        })
        .expect("initial pass issues fetches");

    // Answer the same fetch twice; the second completion is stale.
    viewer.fetch_completed(first_fetch, Ok(common::sample_tile()));
    viewer.fetch_completed(first_fetch, Ok(vec![0xff]));
    viewer.tick(1.0);
    assert!(matches!(
        viewer.cache().get(first_fetch),
        Some(TileState::Decoded(_) | TileState::Decorated(_))
    ));
}
