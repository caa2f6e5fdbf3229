//! Swept collision for the paddle stage
//!
//! The ball is a point with a radius bias that moves in a straight line. Every
//! obstacle is built from axis-aligned segments; we solve for the time of
//! impact on each one and keep the earliest. Walls, blocks and paddle cells
//! each report through their own group of [`EdgeMask`] bits so a corner hit
//! can register two edges in the same pass.

use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;

use super::state::Ball;
use crate::consts::{BALL_RADIUS, CELL_HALF, PADDLE_LIFT};

/// Returned by [`check_ball_against`] when nothing is hit in time
pub const NO_IMPACT: f32 = 1001.0;
/// Hits closer together than this count as simultaneous
pub const TIME_EPSILON: f32 = 1e-6;

/// Set of edges touched in one collision pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeMask(u32);

impl EdgeMask {
    pub const EMPTY: EdgeMask = EdgeMask(0);

    pub const WALL_TOP: EdgeMask = EdgeMask(1);
    pub const WALL_RIGHT: EdgeMask = EdgeMask(2);
    pub const WALL_LEFT: EdgeMask = EdgeMask(4);
    pub const BLOCK_LEFT: EdgeMask = EdgeMask(8);
    pub const BLOCK_TOP: EdgeMask = EdgeMask(16);
    pub const BLOCK_RIGHT: EdgeMask = EdgeMask(32);
    pub const BLOCK_BOTTOM: EdgeMask = EdgeMask(64);
    pub const PADDLE_LEFT: EdgeMask = EdgeMask(128);
    pub const PADDLE_TOP: EdgeMask = EdgeMask(256);
    pub const PADDLE_RIGHT: EdgeMask = EdgeMask(512);
    pub const PADDLE_BOTTOM: EdgeMask = EdgeMask(1024);
    pub const WALL_BOTTOM: EdgeMask = EdgeMask(2048);

    pub const WALLS: EdgeMask = EdgeMask(1 | 2 | 4 | 2048);
    pub const BLOCKS: EdgeMask = EdgeMask(8 | 16 | 32 | 64);
    pub const PADDLE: EdgeMask = EdgeMask(128 | 256 | 512 | 1024);
    /// Edges that reverse horizontal motion
    pub const X_FACING: EdgeMask = EdgeMask(2 | 4 | 8 | 32 | 128 | 512);
    /// Edges that reverse vertical motion
    pub const Y_FACING: EdgeMask = EdgeMask(1 | 16 | 64 | 256 | 1024 | 2048);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: EdgeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: EdgeMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EdgeMask {
    type Output = EdgeMask;

    fn bitor(self, rhs: EdgeMask) -> EdgeMask {
        EdgeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for EdgeMask {
    fn bitor_assign(&mut self, rhs: EdgeMask) {
        self.0 |= rhs.0;
    }
}

/// A straight segment. Only horizontal and vertical ones are supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self::new(Vec2::new(x0, y), Vec2::new(x1, y))
    }

    pub fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self::new(Vec2::new(x, y0), Vec2::new(x, y1))
    }
}

/// What a cell belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Board cell at `(col, row)`
    Block { col: i32, row: i32 },
    /// One cell of the paddle
    Paddle,
}

impl Target {
    /// `[left, top, right, bottom]` bits for this target
    fn edges(self) -> [EdgeMask; 4] {
        match self {
            Target::Block { .. } => [
                EdgeMask::BLOCK_LEFT,
                EdgeMask::BLOCK_TOP,
                EdgeMask::BLOCK_RIGHT,
                EdgeMask::BLOCK_BOTTOM,
            ],
            Target::Paddle => [
                EdgeMask::PADDLE_LEFT,
                EdgeMask::PADDLE_TOP,
                EdgeMask::PADDLE_RIGHT,
                EdgeMask::PADDLE_BOTTOM,
            ],
        }
    }
}

/// Earliest hit found so far in a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Time of impact
    pub time: f32,
    /// Every edge hit at `time`
    pub mask: EdgeMask,
    /// Board cell hit at `time`, if any
    pub block: Option<(i32, i32)>,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            time: NO_IMPACT,
            mask: EdgeMask::EMPTY,
            block: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        !self.mask.is_empty()
    }

    /// Keep the earlier of two hits; simultaneous hits combine their edges
    pub fn merge(self, other: CollisionResult) -> CollisionResult {
        if !other.is_hit() {
            return self;
        }
        if !self.is_hit() || other.time < self.time - TIME_EPSILON {
            return other;
        }
        if other.time <= self.time + TIME_EPSILON {
            return CollisionResult {
                time: self.time.min(other.time),
                mask: self.mask | other.mask,
                block: self.block.or(other.block),
            };
        }
        self
    }
}

/// Time at which the ball first touches `segment`, or [`NO_IMPACT`] if that is
/// not within `[0, t)`.
///
/// # Panics
///
/// Panics on a segment that is neither horizontal nor vertical.
pub fn check_ball_against(ball: &Ball, t: f32, segment: &Segment) -> f32 {
    let Segment { a, b } = *segment;
    let (toi, cross_at, lo, hi) = if a.x == b.x {
        if ball.vel.x == 0.0 {
            return NO_IMPACT;
        }
        let bias = BALL_RADIUS.copysign(ball.vel.x);
        let toi = (a.x - (ball.pos.x + bias)) / ball.vel.x;
        (toi, ball.pos.y + ball.vel.y * toi, a.y.min(b.y), a.y.max(b.y))
    } else if a.y == b.y {
        if ball.vel.y == 0.0 {
            return NO_IMPACT;
        }
        let bias = BALL_RADIUS.copysign(ball.vel.y);
        let toi = (a.y - (ball.pos.y + bias)) / ball.vel.y;
        (toi, ball.pos.x + ball.vel.x * toi, a.x.min(b.x), a.x.max(b.x))
    } else {
        panic!("unsupported collision geometry: diagonal segment {segment:?}");
    };

    if toi >= 0.0 && toi < t && (lo..=hi).contains(&cross_at) {
        toi
    } else {
        NO_IMPACT
    }
}

/// Test the four edges of the cell centred at `center`. Only edges the ball is
/// moving toward and that were not hit in the previous pass (`last`) count.
pub fn check_ball_against_block(
    ball: &Ball,
    t: f32,
    last: EdgeMask,
    center: Vec2,
    target: Target,
) -> CollisionResult {
    let center = match target {
        Target::Paddle => center + Vec2::new(0.0, PADDLE_LIFT),
        Target::Block { .. } => center,
    };
    let block = match target {
        Target::Block { col, row } => Some((col, row)),
        Target::Paddle => None,
    };
    let (left, top, right, bottom) = (
        center.x - CELL_HALF,
        center.y + CELL_HALF,
        center.x + CELL_HALF,
        center.y - CELL_HALF,
    );
    let [left_bit, top_bit, right_bit, bottom_bit] = target.edges();
    let vel = ball.vel;

    let candidates = [
        (left_bit, vel.x > 0.0, Segment::vertical(left, bottom, top)),
        (top_bit, vel.y < 0.0, Segment::horizontal(top, left, right)),
        (right_bit, vel.x < 0.0, Segment::vertical(right, bottom, top)),
        (bottom_bit, vel.y > 0.0, Segment::horizontal(bottom, left, right)),
    ];

    let mut best = CollisionResult::miss();
    for (bit, approaching, segment) in candidates {
        if !approaching || last.intersects(bit) {
            continue;
        }
        let time = check_ball_against(ball, t, &segment);
        if time < t {
            best = best.merge(CollisionResult {
                time,
                mask: bit,
                block,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(pos: (f32, f32), vel: (f32, f32)) -> Ball {
        Ball {
            pos: Vec2::new(pos.0, pos.1),
            vel: Vec2::new(vel.0, vel.1),
        }
    }

    #[test]
    fn test_horizontal_segment_toi() {
        let b = ball((0.0, 0.0), (0.0, 2.0));
        let seg = Segment::horizontal(1.125, -1.0, 1.0);
        // Leading edge at y + 0.125 reaches 1.125 after 0.5
        assert!((check_ball_against(&b, 1.0, &seg) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_vertical_segment_toi() {
        let b = ball((0.0, 0.0), (-4.0, 0.0));
        let seg = Segment::vertical(-2.125, -1.0, 1.0);
        assert!((check_ball_against(&b, 1.0, &seg) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_impact_must_be_inside_window() {
        let b = ball((0.0, 0.0), (0.0, 2.0));
        let seg = Segment::horizontal(1.125, -1.0, 1.0);
        assert_eq!(check_ball_against(&b, 0.5, &seg), NO_IMPACT);

        let away = ball((0.0, 0.0), (0.0, -2.0));
        assert_eq!(check_ball_against(&away, 10.0, &seg), NO_IMPACT);
    }

    #[test]
    fn test_impact_must_be_within_extent() {
        let b = ball((3.0, 0.0), (0.0, 2.0));
        let seg = Segment::horizontal(1.125, -1.0, 1.0);
        assert_eq!(check_ball_against(&b, 10.0, &seg), NO_IMPACT);
    }

    #[test]
    fn test_zero_velocity_never_hits() {
        let b = ball((0.0, 0.0), (0.0, 0.0));
        let seg = Segment::vertical(0.5, -1.0, 1.0);
        assert_eq!(check_ball_against(&b, 10.0, &seg), NO_IMPACT);
    }

    #[test]
    #[should_panic(expected = "unsupported collision geometry")]
    fn test_diagonal_segment_panics() {
        let b = ball((0.0, 0.0), (1.0, 1.0));
        let seg = Segment::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        check_ball_against(&b, 10.0, &seg);
    }

    #[test]
    fn test_block_bottom_edge_from_below() {
        let b = ball((1.0, 0.0), (0.0, 1.0));
        let hit = check_ball_against_block(
            &b,
            10.0,
            EdgeMask::EMPTY,
            Vec2::new(1.0, 2.0),
            Target::Block { col: 2, row: 4 },
        );
        assert_eq!(hit.mask, EdgeMask::BLOCK_BOTTOM);
        assert_eq!(hit.block, Some((2, 4)));
        // Bottom edge at 1.75, leading edge starts at 0.125
        assert!((hit.time - 1.625).abs() < 1e-5);
    }

    #[test]
    fn test_last_mask_suppresses_edge() {
        let b = ball((1.0, 0.0), (0.0, 1.0));
        let hit = check_ball_against_block(
            &b,
            10.0,
            EdgeMask::BLOCK_BOTTOM,
            Vec2::new(1.0, 2.0),
            Target::Block { col: 2, row: 4 },
        );
        assert!(!hit.is_hit());
    }

    #[test]
    fn test_paddle_uses_paddle_bits_and_lift() {
        let b = ball((0.0, 3.0), (0.0, -1.0));
        let hit = check_ball_against_block(
            &b,
            10.0,
            EdgeMask::EMPTY,
            Vec2::ZERO,
            Target::Paddle,
        );
        assert_eq!(hit.mask, EdgeMask::PADDLE_TOP);
        assert_eq!(hit.block, None);
        // Top edge at PADDLE_LIFT + 0.25
        assert!((hit.time - (3.0 - 0.125 - (PADDLE_LIFT + 0.25))).abs() < 1e-5);
    }

    #[test]
    fn test_shallow_diagonal_hits_side_only() {
        let b = ball((-1.0, 0.0), (1.0, 0.1));
        let hit = check_ball_against_block(
            &b,
            10.0,
            EdgeMask::EMPTY,
            Vec2::ZERO,
            Target::Block { col: 0, row: 0 },
        );
        assert_eq!(hit.mask, EdgeMask::BLOCK_LEFT);
        assert!((hit.time - 0.625).abs() < 1e-5);
    }

    #[test]
    fn test_merge_rules() {
        let early = CollisionResult {
            time: 0.5,
            mask: EdgeMask::WALL_TOP,
            block: None,
        };
        let late = CollisionResult {
            time: 0.7,
            mask: EdgeMask::BLOCK_LEFT,
            block: Some((1, 1)),
        };
        let tie = CollisionResult {
            time: 0.5,
            mask: EdgeMask::BLOCK_BOTTOM,
            block: Some((2, 2)),
        };

        assert_eq!(CollisionResult::miss().merge(late), late);
        assert_eq!(late.merge(early), early);
        assert_eq!(early.merge(late), early);
        let merged = early.merge(tie);
        assert_eq!(merged.mask, EdgeMask::WALL_TOP | EdgeMask::BLOCK_BOTTOM);
        assert_eq!(merged.block, Some((2, 2)));
        assert_eq!(early.merge(CollisionResult::miss()), early);
    }

    #[test]
    fn test_edge_groups_are_disjoint() {
        assert!(!EdgeMask::WALLS.intersects(EdgeMask::BLOCKS));
        assert!(!EdgeMask::WALLS.intersects(EdgeMask::PADDLE));
        assert!(!EdgeMask::BLOCKS.intersects(EdgeMask::PADDLE));
        assert!(!EdgeMask::X_FACING.intersects(EdgeMask::Y_FACING));
        assert_eq!(
            EdgeMask::X_FACING.bits() | EdgeMask::Y_FACING.bits(),
            EdgeMask::WALLS.bits() | EdgeMask::BLOCKS.bits() | EdgeMask::PADDLE.bits()
        );
    }
}
