//! Integration tests for the gridfluid solver.

use approx::assert_relative_eq;
use gridfluid::{
    load_scene, save_scene, CellType, Divergence, FluidGrid, GridError, Region, SceneSpec,
    SimConfig, E, Q,
};

/// Closed box with a pool of fluid sloshing to the right.
fn make_sloshing_pool(config: SimConfig) -> FluidGrid {
    let spec = SceneSpec {
        width: 24,
        height: 14,
        config,
        obstacles: vec![Region {
            x: 12,
            y: 1,
            width: 2,
            height: 2,
        }],
        fluid: vec![Region {
            x: 1,
            y: 1,
            width: 10,
            height: 6,
        }],
        empty: vec![],
        velocity: [0.04, 0.0],
    };
    spec.build().unwrap()
}

fn summed_mass(grid: &FluidGrid) -> f64 {
    grid.cells().iter().map(|c| c.mass()).sum()
}

fn neighbors(grid: &FluidGrid, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    (1..Q).filter_map(move |i| {
        let nx = x.checked_add_signed(E[i][0] as isize)?;
        let ny = y.checked_add_signed(E[i][1] as isize)?;
        (nx < grid.width() && ny < grid.height()).then_some((nx, ny))
    })
}

#[test]
fn single_seed_creates_interface_ring() {
    let mut grid = FluidGrid::new(40, 20).unwrap();
    grid.set_fluid(10, 10).unwrap();

    assert_eq!(grid.cell_type(10, 10).unwrap(), CellType::Fluid);
    for (x, y) in neighbors(&grid, 10, 10) {
        assert_eq!(grid.cell_type(x, y).unwrap(), CellType::Interface);
        assert_relative_eq!(grid.mass_at(x, y).unwrap(), 0.9);
    }
    assert_eq!(grid.cell_type(12, 10).unwrap(), CellType::Empty);
    assert_eq!(grid.cell_type(10, 13).unwrap(), CellType::Empty);
}

#[test]
fn obstacles_survive_stepping() {
    let mut grid = make_sloshing_pool(SimConfig::default());
    grid.set_obstacle(5, 11).unwrap();
    for _ in 0..40 {
        grid.step().unwrap();
        assert_eq!(grid.cell_type(5, 11).unwrap(), CellType::Obstacle);
        assert_eq!(grid.cell_type(12, 1).unwrap(), CellType::Obstacle);
        assert_eq!(grid.cell_type(0, 0).unwrap(), CellType::Obstacle);
    }
}

#[test]
fn populations_stay_non_negative_and_bounded() {
    let config = SimConfig::default();
    let ceiling = config.pressure_ceiling;
    let mut grid = make_sloshing_pool(config);
    for _ in 0..40 {
        grid.step().unwrap();
        for cell in grid.cells() {
            if let Some(parcel) = cell.parcel() {
                assert!(parcel.df.iter().all(|&f| f >= 0.0), "{parcel:?}");
                assert!(parcel.pressure() <= ceiling);
            }
        }
    }
}

#[test]
fn closed_scene_conserves_mass() {
    let mut grid = make_sloshing_pool(SimConfig::default());
    let initial = summed_mass(&grid);
    assert_relative_eq!(grid.total_mass(), initial, max_relative = 1e-12);

    let mut lost = 0.0;
    let mut transitions = 0;
    for _ in 0..60 {
        let report = grid.step().unwrap();
        lost += report.lost_mass;
        transitions += report.filled + report.emptied;

        let current = summed_mass(&grid);
        assert_relative_eq!(grid.total_mass(), current, max_relative = 1e-9);
        assert_relative_eq!(current + lost, initial, max_relative = 1e-9);
    }
    assert_eq!(grid.steps(), 60);
    println!("committed {transitions} transitions");
}

#[test]
fn interface_shell_separates_fluid_from_empty() {
    let mut grid = make_sloshing_pool(SimConfig::default());
    for step in 0..60 {
        grid.step().unwrap();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if grid.cell_type(x, y).unwrap() != CellType::Fluid {
                    continue;
                }
                for (nx, ny) in neighbors(&grid, x, y) {
                    assert_ne!(
                        grid.cell_type(nx, ny).unwrap(),
                        CellType::Empty,
                        "fluid ({x}, {y}) touches empty ({nx}, {ny}) after step {step}"
                    );
                }
            }
        }
    }
}

#[test]
fn properties_snapshot_is_idempotent() {
    let mut grid = make_sloshing_pool(SimConfig::default());
    for _ in 0..5 {
        grid.step().unwrap();
    }
    let first = grid.properties().clone();
    let second = grid.properties().clone();
    assert_eq!(first, second);
    assert!(first.max_pressure >= first.min_pressure);
    assert!(first.max_speed > 0.0);
    assert_relative_eq!(first.summed_mass(), summed_mass(&grid), max_relative = 1e-12);
}

#[test]
fn gravity_is_configured_but_inert() {
    let mut still = make_sloshing_pool(SimConfig::default());
    let mut heavy = make_sloshing_pool(SimConfig::default());
    heavy.set_gravity(1.0);
    for _ in 0..20 {
        still.step().unwrap();
        heavy.step().unwrap();
    }
    assert_eq!(still.cells(), heavy.cells());
    assert_eq!(heavy.properties().gravity, 1.0);
}

#[test]
fn pool_at_rest_stays_at_rest() {
    let mut grid = FluidGrid::new(16, 10).unwrap();
    for y in 1..4 {
        for x in 1..15 {
            grid.set_fluid(x, y).unwrap();
        }
    }
    let before = grid.cells().to_vec();
    for _ in 0..25 {
        let report = grid.step().unwrap();
        assert_eq!(report.filled + report.emptied, 0);
    }
    for (a, b) in before.iter().zip(grid.cells()) {
        assert_eq!(a.cell_type(), b.cell_type());
        assert_relative_eq!(a.mass(), b.mass(), epsilon = 1e-12);
    }
    let props = grid.properties();
    assert_relative_eq!(props.max_speed, 0.0, epsilon = 1e-12);
}

#[test]
fn pressure_ceiling_halts_simulation() {
    let config = SimConfig::default().with_pressure_ceiling(0.75);
    let mut grid = FluidGrid::with_config(20, 12, config).unwrap();
    for x in 3..8 {
        grid.set_fluid(x, 3).unwrap();
    }

    match grid.step() {
        Err(GridError::Diverged {
            cause: Divergence::PressureCeiling { pressure, ceiling },
            ..
        }) => {
            assert!(pressure > ceiling);
        }
        other => panic!("expected divergence, got {other:?}"),
    }
    assert!(grid.is_halted());
    assert!(matches!(grid.step(), Err(GridError::Halted)));
}

#[test]
fn scene_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pool.json");

    let spec = SceneSpec {
        width: 10,
        height: 8,
        config: SimConfig::default().with_omega(0.8),
        obstacles: vec![Region {
            x: 4,
            y: 1,
            width: 1,
            height: 3,
        }],
        fluid: vec![Region {
            x: 1,
            y: 1,
            width: 3,
            height: 2,
        }],
        empty: vec![],
        velocity: [0.0, 0.0],
    };
    save_scene(&spec, &path).unwrap();
    let loaded = load_scene(&path).unwrap();
    assert_eq!(loaded, spec);

    let grid = loaded.build().unwrap();
    assert_eq!(grid.config().omega, 0.8);
    assert_eq!(grid.cell_type(4, 2).unwrap(), CellType::Obstacle);
    assert_eq!(grid.cell_type(2, 2).unwrap(), CellType::Fluid);
}

#[test]
fn missing_scene_file_is_io_error() {
    let err = load_scene("/nonexistent/scene.json").unwrap_err();
    assert!(matches!(err, GridError::IoError(_)));
    assert!(!err.is_fatal());
}

#[test]
fn bundled_dam_break_scene_runs() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenes/dam_break.json");
    let mut grid = load_scene(path).unwrap().build().unwrap();
    let initial = summed_mass(&grid);
    let mut lost = 0.0;
    for _ in 0..30 {
        lost += grid.step().unwrap().lost_mass;
    }
    assert_relative_eq!(summed_mass(&grid) + lost, initial, max_relative = 1e-9);
    assert_eq!(grid.cell_type(30, 3).unwrap(), CellType::Obstacle);
}

#[test]
fn carved_bubble_keeps_interface_shell() {
    let spec = SceneSpec {
        width: 40,
        height: 30,
        config: SimConfig::default(),
        obstacles: vec![],
        fluid: vec![Region {
            x: 1,
            y: 1,
            width: 38,
            height: 24,
        }],
        empty: vec![Region {
            x: 8,
            y: 8,
            width: 5,
            height: 5,
        }],
        velocity: [0.0, 0.0],
    };
    let mut grid = spec.build().unwrap();
    assert_eq!(grid.cell_type(10, 10).unwrap(), CellType::Empty);
    assert_eq!(grid.cell_type(7, 7).unwrap(), CellType::Interface);
    assert_eq!(grid.cell_type(13, 10).unwrap(), CellType::Interface);

    for step in 0..20 {
        grid.step().unwrap();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if grid.cell_type(x, y).unwrap() != CellType::Fluid {
                    continue;
                }
                for (nx, ny) in neighbors(&grid, x, y) {
                    assert_ne!(
                        grid.cell_type(nx, ny).unwrap(),
                        CellType::Empty,
                        "fluid ({x}, {y}) touches empty ({nx}, {ny}) after step {step}"
                    );
                }
            }
        }
    }
}
