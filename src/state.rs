//! Round-scoped entities: ball, target and the game lifecycle flags

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::center_of;
use crate::scene::{Element, Scene, VisualChange};

/// Monotonic round counter. Bumped by every reset; continuations captured
/// under an older token are stale.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoundToken(pub u64);

/// Ball lifecycle - exactly one is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallPhase {
    /// Aiming, follows the pointer
    #[default]
    Idle,
    /// Thrown, no contact yet
    InMotion,
    /// Thrown and touched a collidable element
    Collided,
}

/// The thrown projectile
#[derive(Debug, Clone, Default)]
pub struct Ball {
    phase: BallPhase,
    /// Last committed center, baseline for relative effects
    saved_position: Option<Vec2>,
}

impl Ball {
    pub fn phase(&self) -> BallPhase {
        self.phase
    }

    pub fn in_motion(&self) -> bool {
        matches!(self.phase, BallPhase::InMotion | BallPhase::Collided)
    }

    pub fn colision(&self) -> bool {
        self.phase == BallPhase::Collided
    }

    pub fn saved_position(&self) -> Option<Vec2> {
        self.saved_position
    }

    pub fn start_throw(&mut self) {
        self.phase = BallPhase::InMotion;
    }

    /// Record contact. Returns false if the ball was not in flight or had
    /// already collided.
    pub fn mark_colision(&mut self) -> bool {
        if self.phase != BallPhase::InMotion {
            return false;
        }
        self.phase = BallPhase::Collided;
        true
    }

    /// Checkpoint the current transform as the baseline
    pub fn save_position(&mut self, scene: &mut dyn Scene) {
        self.saved_position = center_of(scene, Element::Ball);
        scene.apply(VisualChange::CommitTransform(Element::Ball));
    }

    /// Back to the idle aiming position
    pub fn reset(&mut self, scene: &mut dyn Scene) {
        self.phase = BallPhase::Idle;
        self.saved_position = None;
        scene.apply(VisualChange::ResetBall);
    }
}

/// Independently running target animation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetMotion {
    pub paused: bool,
}

/// The object being captured
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub motion: Option<TargetMotion>,
}

impl Target {
    pub fn with_motion() -> Self {
        Self {
            motion: Some(TargetMotion::default()),
        }
    }

    pub fn pause_motion(&mut self, scene: &mut dyn Scene) {
        if let Some(motion) = self.motion.as_mut()
            && !motion.paused
        {
            motion.paused = true;
            scene.apply(VisualChange::PauseMotion(Element::Target));
        }
    }

    pub fn is_paused(&self) -> bool {
        self.motion.is_some_and(|m| m.paused)
    }

    /// Restore the pre-round transform and resume motion
    pub fn reset(&mut self, scene: &mut dyn Scene) {
        scene.apply(VisualChange::ResetTarget);
        if let Some(motion) = self.motion.as_mut()
            && motion.paused
        {
            motion.paused = false;
            scene.apply(VisualChange::ResumeMotion(Element::Target));
        }
    }
}

/// Lifecycle flags shared by the machine and the poll loop
#[derive(Debug, Clone)]
pub struct GameState {
    pub running: bool,
    pub visible: bool,
    round: RoundToken,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            running: false,
            visible: true,
            round: RoundToken::default(),
        }
    }
}

impl GameState {
    pub fn round(&self) -> RoundToken {
        self.round
    }

    /// Invalidate every continuation of the current round
    pub fn next_round(&mut self) -> RoundToken {
        self.round = RoundToken(self.round.0 + 1);
        self.round
    }

    pub fn is_current(&self, token: RoundToken) -> bool {
        self.round == token
    }

    /// The collision poll runs iff this holds
    pub fn should_poll(&self) -> bool {
        self.running && self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimScene;

    #[test]
    fn test_ball_phase_transitions() {
        let mut scene = SimScene::default();
        let mut ball = Ball::default();
        assert!(!ball.in_motion());
        assert!(!ball.mark_colision(), "idle ball cannot collide");

        ball.start_throw();
        assert!(ball.in_motion());
        assert!(ball.mark_colision());
        assert!(ball.colision());
        assert!(ball.in_motion());
        assert!(!ball.mark_colision(), "second contact is ignored");

        ball.reset(&mut scene);
        assert_eq!(ball.phase(), BallPhase::Idle);
        assert!(ball.saved_position().is_none());
    }

    #[test]
    fn test_save_position_reads_center() {
        let mut scene = SimScene::default();
        scene.place(Element::Ball, Vec2::new(240.0, 300.0));
        let mut ball = Ball::default();
        ball.save_position(&mut scene);
        assert_eq!(ball.saved_position(), Some(Vec2::new(240.0, 300.0)));
        assert!(
            scene
                .changes()
                .contains(&VisualChange::CommitTransform(Element::Ball))
        );
    }

    #[test]
    fn test_target_pause_and_resume() {
        let mut scene = SimScene::default();
        let mut target = Target::with_motion();
        target.pause_motion(&mut scene);
        target.pause_motion(&mut scene);
        assert!(target.is_paused());
        assert_eq!(
            scene
                .changes()
                .iter()
                .filter(|c| **c == VisualChange::PauseMotion(Element::Target))
                .count(),
            1
        );

        target.reset(&mut scene);
        assert!(!target.is_paused());
        assert!(
            scene
                .changes()
                .contains(&VisualChange::ResumeMotion(Element::Target))
        );
    }

    #[test]
    fn test_round_tokens() {
        let mut state = GameState::default();
        let first = state.round();
        let second = state.next_round();
        assert!(second > first);
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }

    #[test]
    fn test_should_poll_needs_both_flags() {
        let mut state = GameState::default();
        assert!(!state.should_poll());
        state.running = true;
        assert!(state.should_poll());
        state.visible = false;
        assert!(!state.should_poll());
    }
}
