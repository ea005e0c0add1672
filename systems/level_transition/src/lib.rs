#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns level entries into scene transition requests.
//!
//! Scene management itself lives outside the overworld; this system only
//! names the scene a level entry should lead to.

use std::collections::BTreeMap;

use overworld_core::{Event, LevelId};
use tracing::{info, warn};

/// Request handed to the external scene manager when a level is entered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelTransitionRequest {
    /// Level whose trigger was entered.
    pub level: LevelId,
    /// Scene registered for the level.
    pub scene: String,
}

/// Pure system that maps level entries onto registered scenes.
#[derive(Debug, Default)]
pub struct LevelTransition {
    scenes: BTreeMap<LevelId, String>,
}

impl LevelTransition {
    /// Creates a new system from `(level, scene)` pairs; later pairs win.
    #[must_use]
    pub fn new<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = (LevelId, S)>,
        S: Into<String>,
    {
        Self {
            scenes: scenes
                .into_iter()
                .map(|(level, scene)| (level, scene.into()))
                .collect(),
        }
    }

    /// Scene registered for `level`, if any.
    #[must_use]
    pub fn scene(&self, level: LevelId) -> Option<&str> {
        self.scenes.get(&level).map(String::as_str)
    }

    /// Consumes world events and emits one request per entered level.
    ///
    /// Entries for levels without a scene are reported and dropped.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<LevelTransitionRequest>) {
        for event in events {
            let Event::LevelEntered { level, cell } = event else {
                continue;
            };

            match self.scenes.get(level) {
                Some(scene) => {
                    info!(%level, %cell, scene = %scene, "level transition requested");
                    out.push(LevelTransitionRequest {
                        level: *level,
                        scene: scene.clone(),
                    });
                }
                None => warn!(%level, %cell, "no scene registered for level; ignoring entry"),
            }
        }
    }
}
