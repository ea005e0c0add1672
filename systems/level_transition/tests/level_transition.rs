use overworld_core::{CellCoord, Event, LevelId, DEFAULT_LEVEL_TRIGGERS};
use overworld_system_level_transition::{LevelTransition, LevelTransitionRequest};

fn entered(level: u8) -> Event {
    Event::LevelEntered {
        level: LevelId::new(level),
        cell: CellCoord::new(u32::from(level), 0),
    }
}

#[test]
fn each_entry_requests_the_registered_scene() {
    let mut system = LevelTransition::new(
        DEFAULT_LEVEL_TRIGGERS
            .iter()
            .map(|trigger| (trigger.level(), format!("level_{}", trigger.level().get()))),
    );
    let mut requests = Vec::new();

    system.handle(&[entered(3), entered(6)], &mut requests);

    assert_eq!(
        requests,
        vec![
            LevelTransitionRequest {
                level: LevelId::new(3),
                scene: "level_3".to_owned(),
            },
            LevelTransitionRequest {
                level: LevelId::new(6),
                scene: "level_6".to_owned(),
            },
        ]
    );
}

#[test]
fn unknown_levels_are_ignored_without_disturbing_known_ones() {
    let mut system = LevelTransition::new([(LevelId::new(1), "forest")]);
    let mut requests = Vec::new();

    system.handle(&[entered(9), entered(1), entered(9)], &mut requests);

    assert_eq!(
        requests,
        vec![LevelTransitionRequest {
            level: LevelId::new(1),
            scene: "forest".to_owned(),
        }]
    );
}
