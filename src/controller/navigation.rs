use glam::Vec3;

use crate::model::Latch;

/// Half-width of the corridor; |x| at or past this is inside a side wall.
pub const SIDE_LIMIT: f32 = 2.35;
/// Back wall of room one.
pub const NORTH_LIMIT: f32 = 2.35;
/// Far wall of room three.
pub const SOUTH_LIMIT: f32 = -12.35;
pub const DOOR1_PLANE: f32 = -2.35;
pub const DOOR2_PLANE: f32 = -7.35;

/// Region in front of the trophy that ends the game.
pub const FINISH_X: (f32, f32) = (-0.5, 0.5);
pub const FINISH_Z: (f32, f32) = (-11.5, -10.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// S
    Backward,
    /// D
    Right,
    /// W
    Forward,
    /// A
    Left,
}

/// Only the first held direction in this order moves the player.
pub const MOVE_PRIORITY: [Direction; 4] = [
    Direction::Backward,
    Direction::Right,
    Direction::Forward,
    Direction::Left,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldDirections {
    pub backward: bool,
    pub right: bool,
    pub forward: bool,
    pub left: bool,
}

impl HeldDirections {
    pub fn is_held(&self, dir: Direction) -> bool {
        match dir {
            Direction::Backward => self.backward,
            Direction::Right => self.right,
            Direction::Forward => self.forward,
            Direction::Left => self.left,
        }
    }

    pub fn active(&self) -> Option<Direction> {
        MOVE_PRIORITY.into_iter().find(|d| self.is_held(*d))
    }
}

/// Horizontal displacement for one frame. Backward ignores `phi`.
pub fn step_delta(dir: Direction, dt: f32, speed: f32, theta: f32, phi: f32) -> Vec3 {
    let v = dt * speed;
    let (st, ct) = theta.sin_cos();
    let cp = phi.cos();
    match dir {
        Direction::Backward => Vec3::new(-v * st, 0.0, -v * ct),
        Direction::Right => Vec3::new(-v * cp * ct, 0.0, v * cp * st),
        Direction::Forward => Vec3::new(v * cp * st, 0.0, v * cp * ct),
        Direction::Left => Vec3::new(v * cp * ct, 0.0, -v * cp * st),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    SideWall,
    EndWall,
    Door1,
    Door2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Blocked(BlockReason),
    Clear,
    /// Accepted and inside the finish region.
    Finish,
}

impl Collision {
    pub fn accepted(self) -> bool {
        !matches!(self, Collision::Blocked(_))
    }
}

fn in_range(v: f32, (lo, hi): (f32, f32)) -> bool {
    v >= lo && v <= hi
}

/// Tests a tentative position against the room planes and door gates.
pub fn collision_test(p: Vec3, door1_open: bool, door2_open: bool) -> Collision {
    if p.x.abs() >= SIDE_LIMIT {
        return Collision::Blocked(BlockReason::SideWall);
    }
    if p.z >= NORTH_LIMIT || p.z <= SOUTH_LIMIT {
        return Collision::Blocked(BlockReason::EndWall);
    }
    if !door1_open {
        if p.z <= DOOR1_PLANE {
            return Collision::Blocked(BlockReason::Door1);
        }
    } else if !door2_open {
        if p.z <= DOOR2_PLANE {
            return Collision::Blocked(BlockReason::Door2);
        }
    } else if in_range(p.x, FINISH_X) && in_range(p.z, FINISH_Z) {
        return Collision::Finish;
    }
    Collision::Clear
}

/// Player position plus the sticky game-over flag.
#[derive(Debug, Clone)]
pub struct Navigator {
    position: Vec3,
    speed: f32,
    game_over: Latch,
}

impl Navigator {
    pub fn new(spawn: Vec3, speed: f32) -> Self {
        Self { position: spawn, speed, game_over: Latch::default() }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn game_over(&self) -> bool {
        self.game_over.is_set()
    }

    /// Integrates at most one direction, then commits or rejects the move.
    /// Runs even with nothing held so standing in the finish region counts.
    pub fn step(
        &mut self,
        held: HeldDirections,
        dt: f32,
        theta: f32,
        phi: f32,
        door1_open: bool,
        door2_open: bool,
    ) -> Collision {
        let tentative = match held.active() {
            Some(dir) => self.position + step_delta(dir, dt, self.speed, theta, phi),
            None => self.position,
        };
        let result = collision_test(tentative, door1_open, door2_open);
        match result {
            Collision::Blocked(reason) => {
                tracing::trace!(?reason, x = tentative.x, z = tentative.z, "move rejected");
            }
            Collision::Clear => self.position = tentative,
            Collision::Finish => {
                self.position = tentative;
                if self.game_over.latch(true) {
                    tracing::info!(x = tentative.x, z = tentative.z, "finish reached");
                }
            }
        }
        result
    }
}
