use overworld_core::{
    AvatarId, CellCode, Command, DirectionalInput, Event, Grid, LevelId, PixelPoint, TileSheet,
    DEFAULT_LEVEL_TRIGGERS,
};
use overworld_system_movement::{Config, Movement};
use overworld_world::{
    self as world, query, AvatarCatalog, LayerGrids, SheetCatalog, World, WorldAssets,
    WorldSettings,
};

const RIGHT: DirectionalInput = DirectionalInput {
    right: true,
    ..DirectionalInput::NONE
};
const DOWN: DirectionalInput = DirectionalInput {
    down: true,
    ..DirectionalInput::NONE
};

#[test]
fn held_input_walks_the_player_until_a_blocker_stops_it() {
    let mut world = corridor();
    let mut movement = Movement::new(Config::new(4));

    let log = run(&mut world, &mut movement, &[RIGHT; 40]);

    assert_eq!(query::player(&world).position(), PixelPoint::new(32, 0));
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::PlayerBlocked { .. })));
}

#[test]
fn replaying_the_same_input_is_deterministic() {
    let script: Vec<_> = [DOWN; 24].into_iter().chain([RIGHT; 20]).collect();

    let first = {
        let mut world = corridor();
        run(&mut world, &mut Movement::new(Config::new(4)), &script)
    };
    let second = {
        let mut world = corridor();
        run(&mut world, &mut Movement::new(Config::new(4)), &script)
    };

    assert_eq!(first, second, "replay diverged between runs");
    let entries: Vec<_> = first
        .iter()
        .filter_map(|event| match event {
            Event::LevelEntered { level, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(entries, vec![LevelId::new(1)]);
}

#[test]
fn pausing_through_the_world_stops_emitted_moves() {
    let mut world = corridor();
    let mut movement = Movement::default();
    let mut events = Vec::new();
    world::apply(&mut world, Command::TogglePause, &mut events);

    let log = run_with(&mut world, &mut movement, events, &[RIGHT; 10]);

    assert_eq!(log, vec![Event::PauseToggled { paused: true }]);
    assert_eq!(query::player(&world).position(), PixelPoint::new(0, 0));
}

fn run(world: &mut World, movement: &mut Movement, inputs: &[DirectionalInput]) -> Vec<Event> {
    run_with(world, movement, Vec::new(), inputs)
}

fn run_with(
    world: &mut World,
    movement: &mut Movement,
    pending: Vec<Event>,
    inputs: &[DirectionalInput],
) -> Vec<Event> {
    let mut log = pending.clone();
    let mut events = pending;
    for input in inputs {
        let mut commands = Vec::new();
        movement.handle(&events, *input, &mut commands);
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
        log.extend(events.iter().cloned());
    }
    log
}

fn corridor() -> World {
    let rows = |cells: &[[i32; 4]; 4]| {
        Grid::from_rows(
            cells
                .iter()
                .map(|row| row.iter().copied().map(CellCode::new).collect())
                .collect(),
        )
        .expect("rectangular grid")
    };
    let blank = rows(&[[-1; 4]; 4]);
    let assets = WorldAssets {
        grids: LayerGrids {
            terrain: blank.clone(),
            nature: blank.clone(),
            floor: blank.clone(),
            house: blank.clone(),
            water: blank.clone(),
            water_details: blank,
            limits: rows(&[[0, 0, -1, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 104, 0, 0]]),
            player_start: rows(&[[1, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]),
        },
        sheets: TileSheet::ALL
            .iter()
            .fold(SheetCatalog::new(), |catalog, sheet| {
                catalog.with_sheet(*sheet, 8)
            }),
        avatars: AvatarCatalog::new().with_avatar(AvatarId::new("knight"), 4),
    };
    let settings = WorldSettings {
        triggers: DEFAULT_LEVEL_TRIGGERS.to_vec(),
        avatar: AvatarId::new("knight"),
    };
    World::build(&assets, &settings).expect("corridor should build")
}
