#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that turns directional input into player moves.

use overworld_core::{Command, DirectionalInput, Event};

/// Player speed used when no configuration overrides it, in pixels per frame.
pub const DEFAULT_PLAYER_SPEED: i32 = 4;

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    speed: i32,
}

impl Config {
    /// Creates a new configuration moving the player `speed` pixels per axis each frame.
    #[must_use]
    pub const fn new(speed: i32) -> Self {
        Self { speed }
    }

    /// Pixels travelled per axis each frame.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_SPEED)
    }
}

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug)]
pub struct Movement {
    speed: i32,
    paused: bool,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            speed: config.speed(),
            paused: false,
        }
    }

    /// Reports whether the last observed pause event froze the player.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Consumes world events and the frame's input to emit a movement command.
    ///
    /// A command is emitted every unpaused frame, including frames without
    /// input, so the player settles into its idle animation.
    pub fn handle(&mut self, events: &[Event], input: DirectionalInput, out: &mut Vec<Command>) {
        for event in events {
            if let Event::PauseToggled { paused } = event {
                self.paused = *paused;
            }
        }

        if self.paused {
            return;
        }

        out.push(Command::MovePlayer {
            velocity: input.velocity(self.speed),
        });
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
