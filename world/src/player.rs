//! Player-controlled avatar: movement, collision resolution and animation.

use overworld_core::{
    AvatarId, Axis, Facing, GridDimensions, PixelPoint, PixelRect, Velocity, TILE_SIZE,
};

use crate::layers::Layer;

/// Number of moving updates spent on each animation frame.
pub const ANIMATION_PERIOD: u32 = 8;

/// Movement state of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerState {
    /// The player did not move during the last update.
    #[default]
    Idle,
    /// The player moved during the last update.
    Moving {
        /// Facing derived from the resolved velocity.
        facing: Facing,
    },
}

/// The avatar steered across the overworld.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerEntity {
    position: PixelPoint,
    velocity: Velocity,
    state: PlayerState,
    facing: Facing,
    frame: usize,
    frame_clock: u32,
    avatar: AvatarId,
    frames_per_facing: usize,
}

/// Outcome of a single movement update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MoveResolution {
    pub(crate) from: PixelPoint,
    pub(crate) to: PixelPoint,
    pub(crate) blocked_horizontal: bool,
    pub(crate) blocked_vertical: bool,
}

impl PlayerEntity {
    pub(crate) fn spawn(position: PixelPoint, avatar: AvatarId, frames_per_facing: usize) -> Self {
        Self {
            position,
            velocity: Velocity::ZERO,
            state: PlayerState::Idle,
            facing: Facing::default(),
            frame: 0,
            frame_clock: 0,
            avatar,
            frames_per_facing: frames_per_facing.max(1),
        }
    }

    /// Top-left pixel of the player.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Velocity resolved during the last update.
    #[must_use]
    pub const fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Movement state after the last update.
    #[must_use]
    pub const fn state(&self) -> PlayerState {
        self.state
    }

    /// Direction the player is facing; retained while idle.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Identity whose image set the player is drawn with.
    #[must_use]
    pub fn avatar(&self) -> &AvatarId {
        &self.avatar
    }

    /// Collision rectangle of the player.
    #[must_use]
    pub const fn rect(&self) -> PixelRect {
        PixelRect::tile(self.position)
    }

    /// Index of the current animation frame within the avatar sheet.
    #[must_use]
    pub const fn image_index(&self) -> usize {
        self.facing.sheet_row() * self.frames_per_facing + self.frame
    }

    pub(crate) fn set_avatar(&mut self, avatar: AvatarId, frames_per_facing: usize) {
        self.avatar = avatar;
        self.frames_per_facing = frames_per_facing.max(1);
        self.frame %= self.frames_per_facing;
    }

    /// Moves horizontally, then vertically, cancelling each axis that would
    /// overlap a limit tile and clamping the player to the map.
    ///
    /// Displacements longer than a tile are swept in tile-sized steps, so no
    /// speed carries the player across a wall.
    pub(crate) fn advance(
        &mut self,
        requested: Velocity,
        limits: &Layer,
        bounds: GridDimensions,
    ) -> MoveResolution {
        let from = self.position;
        let max_x = (bounds.pixel_width() - TILE_SIZE).max(0);
        let max_y = (bounds.pixel_height() - TILE_SIZE).max(0);

        let target_x = (self.position.x + requested.x).clamp(0, max_x);
        let candidate = PixelPoint::new(target_x, self.position.y);
        let blocked_horizontal =
            candidate != self.position && path_blocked(self.position, candidate, limits);
        self.velocity.x = if blocked_horizontal {
            0
        } else {
            let moved = candidate.x - self.position.x;
            self.position = candidate;
            moved
        };

        let target_y = (self.position.y + requested.y).clamp(0, max_y);
        let candidate = PixelPoint::new(self.position.x, target_y);
        let blocked_vertical =
            candidate != self.position && path_blocked(self.position, candidate, limits);
        self.velocity.y = if blocked_vertical {
            0
        } else {
            let moved = candidate.y - self.position.y;
            self.position = candidate;
            moved
        };

        self.animate();

        MoveResolution {
            from,
            to: self.position,
            blocked_horizontal,
            blocked_vertical,
        }
    }

    fn animate(&mut self) {
        match Facing::from_velocity(self.velocity) {
            Some(facing) => {
                self.facing = facing;
                self.state = PlayerState::Moving { facing };
                self.frame_clock += 1;
                if self.frame_clock >= ANIMATION_PERIOD {
                    self.frame_clock = 0;
                    self.frame = (self.frame + 1) % self.frames_per_facing;
                }
            }
            None => {
                self.state = PlayerState::Idle;
                self.frame = 0;
                self.frame_clock = 0;
            }
        }
    }
}

/// Reports whether any step of at most one tile from `from` toward `to`
/// overlaps a limit tile. The points differ on one axis only.
fn path_blocked(from: PixelPoint, to: PixelPoint, limits: &Layer) -> bool {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let distance = dx.abs().max(dy.abs());
    let mut travelled = 0;
    while travelled < distance {
        travelled = (travelled + TILE_SIZE).min(distance);
        let step = PixelPoint::new(
            from.x + dx.signum() * travelled,
            from.y + dy.signum() * travelled,
        );
        if limits.overlaps(&PixelRect::tile(step)) {
            return true;
        }
    }
    false
}

/// Axes whose motion was cancelled by a resolution, horizontal first.
pub(crate) fn blocked_axes(resolution: &MoveResolution) -> impl Iterator<Item = Axis> {
    [
        (resolution.blocked_horizontal, Axis::Horizontal),
        (resolution.blocked_vertical, Axis::Vertical),
    ]
    .into_iter()
    .filter_map(|(blocked, axis)| blocked.then_some(axis))
}
