use overworld_core::{
    AvatarId, Axis, BuildError, CellCode, CellCoord, Command, Event, Grid, LayerName, LevelId,
    PixelPoint, TileSheet, Velocity, DEFAULT_LEVEL_TRIGGERS,
};
use overworld_world::{
    apply, query, AvatarCatalog, LayerGrids, LayerKind, SheetCatalog, World, WorldAssets,
    WorldSettings,
};

fn grid(rows: &[&[i32]]) -> Grid {
    Grid::from_rows(
        rows.iter()
            .map(|row| row.iter().copied().map(CellCode::new).collect())
            .collect(),
    )
    .expect("rectangular grid")
}

fn blank() -> Grid {
    grid(&[&[-1, -1, -1], &[-1, -1, -1], &[-1, -1, -1]])
}

fn assets() -> WorldAssets {
    WorldAssets {
        grids: LayerGrids {
            terrain: grid(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0]]),
            nature: blank(),
            floor: blank(),
            house: blank(),
            water: blank(),
            water_details: blank(),
            limits: grid(&[&[0, 0, 0], &[0, -1, 0], &[0, 104, 0]]),
            player_start: grid(&[&[1, 0, 0], &[0, 0, 0], &[0, 0, 0]]),
        },
        sheets: TileSheet::ALL
            .iter()
            .fold(SheetCatalog::new(), |catalog, sheet| {
                catalog.with_sheet(*sheet, 16)
            }),
        avatars: AvatarCatalog::new()
            .with_avatar(AvatarId::new("knight"), 12)
            .with_avatar(AvatarId::new("wizard"), 8),
    }
}

fn settings() -> WorldSettings {
    WorldSettings {
        triggers: DEFAULT_LEVEL_TRIGGERS.to_vec(),
        avatar: AvatarId::new("knight"),
    }
}

fn world() -> World {
    World::build(&assets(), &settings()).expect("world should build")
}

fn step(world: &mut World, x: i32, y: i32) -> Vec<Event> {
    let mut events = Vec::new();
    apply(
        world,
        Command::MovePlayer {
            velocity: Velocity::new(x, y),
        },
        &mut events,
    );
    events
}

fn level_entries(events: &[Event]) -> Vec<LevelId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::LevelEntered { level, .. } => Some(*level),
            _ => None,
        })
        .collect()
}

#[test]
fn build_places_player_on_the_spawn_cell() {
    let world = world();

    assert_eq!(query::player(&world).position(), PixelPoint::new(0, 0));
    assert_eq!(query::spawn_point(&world), PixelPoint::new(0, 0));
    assert!(!query::is_paused(&world));
    assert_eq!(query::trigger_layers(&world).len(), 6);
    assert_eq!(
        query::layer(&world, LayerKind::Limit).map(|layer| layer.len()),
        Some(1)
    );
    assert_eq!(
        query::layer(&world, LayerKind::Terrain).map(|layer| layer.len()),
        Some(9)
    );
    assert!(query::layer(&world, LayerKind::PlayerSpawn).is_none());
}

#[test]
fn walking_down_and_right_hits_the_blocker_then_enters_level_one_once() {
    let mut world = world();

    let events = step(&mut world, 0, 32);
    assert_eq!(
        events,
        vec![Event::PlayerMoved {
            from: PixelPoint::new(0, 0),
            to: PixelPoint::new(0, 32),
        }]
    );

    let events = step(&mut world, 32, 0);
    assert_eq!(
        events,
        vec![Event::PlayerBlocked {
            axis: Axis::Horizontal,
            at: PixelPoint::new(0, 32),
        }]
    );

    let _ = step(&mut world, 0, 32);
    let events = step(&mut world, 32, 0);
    assert_eq!(query::player(&world).position(), PixelPoint::new(32, 64));
    assert_eq!(
        events.last(),
        Some(&Event::LevelEntered {
            level: LevelId::new(1),
            cell: CellCoord::new(1, 2),
        })
    );

    let events = step(&mut world, 0, 0);
    assert!(level_entries(&events).is_empty());
}

#[test]
fn player_never_overlaps_the_blocker_while_walking() {
    let mut world = world();
    let blocker = query::layer(&world, LayerKind::Limit)
        .and_then(|layer| layer.sprites().first().copied())
        .expect("one blocking tile")
        .rect();

    for (x, y) in [(4, 0), (4, 4), (4, 4), (0, 4), (4, 0), (4, 4), (0, 4), (4, 0)] {
        for _ in 0..4 {
            let _ = step(&mut world, x, y);
            assert!(!query::player(&world).rect().overlaps(&blocker));
        }
    }
}

#[test]
fn trigger_fires_again_only_after_leaving_the_zone() {
    let mut world = world();
    let _ = step(&mut world, 0, 64);

    let mut entries = Vec::new();
    for (x, y) in [(32, 0), (4, 0), (-4, 0), (-32, 0), (32, 0)] {
        entries.extend(level_entries(&step(&mut world, x, y)));
    }

    assert_eq!(entries, vec![LevelId::new(1), LevelId::new(1)]);
}

#[test]
fn spawning_on_a_trigger_fires_only_after_stepping_off_and_back() {
    let mut assets = assets();
    assets.grids.limits = grid(&[&[104, 0, 0], &[0, 0, 0], &[0, 0, 0]]);
    let mut world = World::build(&assets, &settings()).expect("world should build");

    assert!(level_entries(&step(&mut world, 0, 0)).is_empty());
    assert!(level_entries(&step(&mut world, 32, 0)).is_empty());

    let events = step(&mut world, -32, 0);
    assert_eq!(level_entries(&events), vec![LevelId::new(1)]);
    assert!(events.contains(&Event::LevelEntered {
        level: LevelId::new(1),
        cell: CellCoord::new(0, 0),
    }));
}

#[test]
fn paused_world_ignores_movement_and_never_fires_triggers() {
    let mut world = world();
    let _ = step(&mut world, 0, 64);
    let mut events = Vec::new();
    apply(&mut world, Command::TogglePause, &mut events);
    assert_eq!(events, vec![Event::PauseToggled { paused: true }]);

    for _ in 0..10 {
        assert!(step(&mut world, 32, 0).is_empty());
    }
    assert_eq!(query::player(&world).position(), PixelPoint::new(0, 64));

    events.clear();
    apply(&mut world, Command::TogglePause, &mut events);
    assert!(!query::is_paused(&world));
    assert_eq!(level_entries(&step(&mut world, 32, 0)), vec![LevelId::new(1)]);
}

#[test]
fn avatar_change_keeps_position_and_rejects_unknown_identities() {
    let mut world = world();
    let _ = step(&mut world, 4, 0);
    let position = query::player(&world).position();

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::SetAvatar {
            avatar: AvatarId::new("wizard"),
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SetAvatar {
            avatar: AvatarId::new("ghost"),
        },
        &mut events,
    );

    assert_eq!(
        events,
        vec![
            Event::AvatarChanged {
                avatar: AvatarId::new("wizard")
            },
            Event::AvatarRejected {
                avatar: AvatarId::new("ghost")
            },
        ]
    );
    assert_eq!(query::player(&world).avatar(), &AvatarId::new("wizard"));
    assert_eq!(query::player(&world).position(), position);
}

#[test]
fn build_fails_without_spawn_cell() {
    let mut assets = assets();
    assets.grids.player_start = grid(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0]]);

    let error = World::build(&assets, &settings()).expect_err("no spawn marker");

    assert_eq!(error, BuildError::MissingSpawn);
}

#[test]
fn build_fails_on_mismatched_limit_grid() {
    let mut assets = assets();
    assets.grids.limits = grid(&[&[0, 0, 0], &[0, -1, 0]]);

    let error = World::build(&assets, &settings()).expect_err("short limit grid");

    assert!(matches!(
        error,
        BuildError::DimensionMismatch {
            layer: LayerName::Limit,
            ..
        }
    ));
}

#[test]
fn build_fails_for_unregistered_starting_avatar() {
    let settings = WorldSettings {
        avatar: AvatarId::new("ghost"),
        ..settings()
    };

    let error = World::build(&assets(), &settings).expect_err("unknown avatar");

    assert!(matches!(error, BuildError::AssetLoad { .. }));
}

#[test]
fn rebuilding_from_the_same_assets_is_reproducible() {
    let mut first = world();
    let _ = step(&mut first, 0, 64);
    let second = world();

    assert_eq!(query::player(&second).position(), PixelPoint::new(0, 0));
    for kind in LayerKind::TILE_LAYERS {
        assert_eq!(query::layer(&first, kind), query::layer(&second, kind));
    }
}
