//! Capture state machine
//!
//! Owns the ball, target, screen and lifecycle flags, exposes the action
//! API (`pointer_ball`, `throw_ball`, `check_ball_colisions`) and drives the
//! effect chain from throw to outcome.
//!
//! Every continuation is a `Stage` queued on the timeline together with the
//! round token that was current when it was queued. `run_due` pops due
//! stages and runs each through the single `run_stage` driver; a stage whose
//! token no longer matches (a reset happened in between) is dropped.
//!
//! Round flow:
//! ```text
//! throw ─ ThrowRise ─▶ ThrowApex ─(upward)─ ThrowDescend ─▶ ResolveThrow
//!                          └─(downward)── 400ms ─▶ Reset
//! ResolveThrow ─(miss)── 400ms ─▶ Reset
//!              └─(hit)── MoveAside ─▶ OpenBall ── 1000ms ─▶ CloseBall
//! CloseBall ─ Drop ─▶ Settle (reset + shake + roll) ── 6×shake ─▶ Reveal
//! Reveal ─(success)─ Confetti ─▶ Captured
//!        └─(escape)── Poof ─▶ HideEscape
//! ```

use bevy::log::{debug, info, warn};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::capture::{
    self, Outcome, RandomSource, SeededRandom, ThrowResult, roll_outcome, success_rate,
};
use crate::collision::find_collision;
use crate::constants::{SEED_MAX, SEED_MIN};
use crate::effects::{Effect, EffectKind, EffectParams, EffectSequencer};
use crate::error::CaptureError;
use crate::events::{CaptureEvent, EventBus};
use crate::geometry::center_of;
use crate::scene::{BallImage, Class, Element, Scene, VisualChange};
use crate::state::{Ball, GameState, RoundToken, Target};
use crate::timeline::Timeline;
use crate::trajectory::{Screen, ThrowParameters};
use crate::tuning::CaptureTuning;

/// Zero-argument notification fired once per successful capture
pub type CaptureCallback = Box<dyn FnMut() + Send + Sync>;

/// Coarse round phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Aiming
    #[default]
    Idle,
    /// Ball in flight (collision polling active)
    Thrown,
    /// Hit confirmed, ball opening/closing
    CaptureAttempt,
    /// Shake and reveal
    Outcome,
}

/// Continuations of the effect chain
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Rise finished
    ThrowApex(ThrowParameters),
    /// Descend finished, run the hit test
    ResolveThrow,
    /// Ball stepped aside, open it
    OpenBall,
    /// Particle hold over, close the ball
    CloseBall,
    /// Ball landed, reset and start the reveal
    Settle,
    /// Shakes done
    Reveal { seed: i32, success_rate: f32 },
    /// Confetti done
    Captured,
    /// Poof done
    HideEscape,
    /// Delayed reset after a miss
    Reset,
}

#[derive(Debug)]
struct Scheduled {
    round: RoundToken,
    stage: Stage,
}

/// Per-game counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStats {
    pub throws: u32,
    pub collisions: u32,
    pub hits: u32,
    pub misses: u32,
    pub captures: u32,
    pub escapes: u32,
    pub resets: u32,
}

pub struct CaptureMachine {
    ball: Ball,
    target: Target,
    screen: Screen,
    state: GameState,
    tuning: CaptureTuning,
    phase: RoundPhase,
    scene: Box<dyn Scene>,
    rng: Box<dyn RandomSource>,
    on_capture: Option<CaptureCallback>,
    timeline: Timeline<Scheduled>,
    sequencer: EffectSequencer,
    /// Class toggles made since the in-chain reset, in order
    overlay: Vec<(Element, Class)>,
    events: EventBus,
    stats: RoundStats,
    stale_dropped: u64,
}

impl CaptureMachine {
    pub fn new(scene: Box<dyn Scene>, screen: Screen, tuning: CaptureTuning) -> Self {
        Self {
            ball: Ball::default(),
            target: Target::default(),
            screen,
            state: GameState::default(),
            tuning,
            phase: RoundPhase::Idle,
            scene,
            rng: Box::new(SeededRandom::from_entropy()),
            on_capture: None,
            timeline: Timeline::new(),
            sequencer: EffectSequencer::new(),
            overlay: Vec::new(),
            events: EventBus::new(),
            stats: RoundStats::default(),
            stale_dropped: 0,
        }
    }

    /// Replace the seed source
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Register the capture-success callback
    pub fn on_capture(mut self, callback: impl FnMut() + Send + Sync + 'static) -> Self {
        self.on_capture = Some(Box::new(callback));
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &CaptureTuning {
        &self.tuning
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn stats(&self) -> RoundStats {
        self.stats
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.timeline.now()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timeline.next_due()
    }

    /// Continuations dropped because their round had been reset
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    /// Effects that failed to start and were skipped over
    pub fn failed_effects(&self) -> u64 {
        self.sequencer.failed()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    pub fn start_game(&mut self) {
        self.state.running = true;
        info!("Capture game started");
        self.emit(CaptureEvent::GameStarted);
    }

    /// Stop the game; the round in progress is torn down
    pub fn pause_game(&mut self) {
        self.state.running = false;
        info!("Capture game paused");
        self.emit(CaptureEvent::GamePaused);
        self.reset_state();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.state.visible = visible;
    }

    pub fn resize(&mut self, screen: Screen) {
        self.screen = screen;
        info!("Screen resized to {}x{}", screen.width, screen.height);
        self.emit(CaptureEvent::Resized(screen));
        self.reset_state();
    }

    /// Tear down the round and return to the pre-throw baseline. Safe to call
    /// at any point; continuations already queued become no-ops.
    pub fn reset_state(&mut self) {
        let round = self.state.next_round();
        self.ball.reset(self.scene.as_mut());
        self.target.reset(self.scene.as_mut());
        self.scene
            .apply(VisualChange::ClearContainer(Element::ParticleContainer));
        self.scene
            .apply(VisualChange::ClearContainer(Element::ConfettiContainer));
        self.scene.apply(VisualChange::ClearTransform(Element::Poof));

        // Undo outcome UI toggled this round, newest first
        while let Some((element, class)) = self.overlay.pop() {
            self.scene.apply(VisualChange::ToggleClass(element, class));
        }

        self.phase = RoundPhase::Idle;
        self.stats.resets += 1;
        debug!("Round reset, now {:?}", round);
        self.emit(CaptureEvent::RoundReset { round });
    }

    // -------------------------------------------------------------------------
    // Action API
    // -------------------------------------------------------------------------

    /// Follow the pointer; a final event without a throw cancels the aim
    pub fn pointer_ball(&mut self, coords: Option<Vec2>, is_final: bool) {
        if let Some(point) = coords {
            self.scene.apply(VisualChange::FollowPointer(point));
            self.emit(CaptureEvent::Aim {
                x: point.x,
                y: point.y,
            });
        }
        if is_final && !self.ball.in_motion() {
            self.run_effect(Effect::simple(EffectKind::RestoreBall, Element::Ball), None);
            self.emit(CaptureEvent::AimCancelled);
        }
    }

    /// Begin a throw round. Ignored until the previous round has finished.
    pub fn throw_ball(&mut self, angle: f32, delta_y: f32, velocity: f32) {
        if self.ball.in_motion() || self.phase != RoundPhase::Idle {
            debug!("Throw ignored: round in progress ({:?})", self.phase);
            return;
        }
        self.ball.start_throw();
        self.phase = RoundPhase::Thrown;
        self.stats.throws += 1;

        let params = ThrowParameters::resolve(self.screen, &self.tuning, angle, delta_y, velocity);
        info!(
            "Throw: velocity={:.2} scale={:.2} dx={:.1} dy={:.1}",
            params.velocity, params.scale_percent, params.translate_x, params.translate_y
        );
        self.emit(CaptureEvent::Throw(params));

        // Ring width freezes here; it decides the success rate later
        self.scene
            .apply(VisualChange::StopAnimation(Element::RingFill));

        self.run_effect(
            Effect::new(EffectKind::ThrowRise, Element::Ball, throw_params(&params)),
            Some(Stage::ThrowApex(params)),
        );
    }

    /// Poll for ball contact. Idempotent once a contact has been recorded.
    pub fn check_ball_colisions(&mut self) {
        if self.phase != RoundPhase::Thrown || self.ball.colision() || !self.ball.in_motion() {
            return;
        }
        let hit = match find_collision(self.scene.as_ref()) {
            Ok(Some(hit)) => hit,
            Ok(None) => return,
            Err(e) => {
                debug!("Collision check skipped: {}", e);
                return;
            }
        };

        self.ball.mark_colision();
        self.stats.collisions += 1;
        info!("Ball collision with {:?}", hit.element);
        self.emit(CaptureEvent::Collision {
            element: hit.element,
            x: hit.point.x,
            y: hit.point.y,
        });

        let element = hit.element;
        self.scene.apply(VisualChange::CollisionTransform {
            element,
            stack: hit.stack,
        });
        self.run_effect(
            Effect::new(
                EffectKind::CollisionParticles,
                element,
                EffectParams::Burst { at: hit.point },
            ),
            None,
        );
        self.run_effect(Effect::simple(EffectKind::RestoreBall, Element::Ball), None);
    }

    // -------------------------------------------------------------------------
    // Driver
    // -------------------------------------------------------------------------

    /// Run every continuation due at or before `until`, then move the clock
    /// to `until`
    pub fn run_due(&mut self, until: u64) {
        while let Some((_, scheduled)) = self.timeline.pop_due(until) {
            if let Err(e) = self.check_round(scheduled.round) {
                debug!("Dropping {:?}: {}", scheduled.stage, e);
                self.stale_dropped += 1;
                continue;
            }
            self.run_stage(scheduled.stage);
        }
        self.timeline.advance_to(until);
    }

    fn check_round(&self, round: RoundToken) -> Result<(), CaptureError> {
        if self.state.is_current(round) {
            Ok(())
        } else {
            Err(CaptureError::StaleRound {
                expected: round,
                actual: self.state.round(),
            })
        }
    }

    fn run_stage(&mut self, stage: Stage) {
        match stage {
            Stage::ThrowApex(params) => self.throw_apex(params),
            Stage::ResolveThrow => self.determine_throw_result(),
            Stage::OpenBall => self.emit_target_particles_to_ball(),
            Stage::CloseBall => self.close_capture_ball(),
            Stage::Settle => {
                self.reset_state();
                self.animate_capture_state();
            }
            Stage::Reveal { seed, success_rate } => self.reveal_outcome(seed, success_rate),
            Stage::Captured => self.finish_capture(),
            Stage::HideEscape => self.hide_escape(),
            Stage::Reset => self.reset_state(),
        }
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    fn throw_apex(&mut self, params: ThrowParameters) {
        if !params.is_upward() {
            debug!("Downward throw, no second stage");
            self.miss();
            return;
        }
        self.ball.save_position(self.scene.as_mut());
        self.run_effect(
            Effect::new(EffectKind::ThrowDescend, Element::Ball, throw_params(&params)),
            Some(Stage::ResolveThrow),
        );
    }

    fn determine_throw_result(&mut self) {
        let result = match capture::determine_throw_result(self.scene.as_ref()) {
            Ok(result) => result,
            Err(e) => {
                warn!("{}; treating throw as a miss", e);
                ThrowResult::Miss
            }
        };

        let ThrowResult::Hit {
            radius,
            orientation,
            ..
        } = result
        else {
            self.miss();
            return;
        };

        info!("Throw hit the target");
        self.stats.hits += 1;
        self.phase = RoundPhase::CaptureAttempt;
        self.emit(CaptureEvent::ThrowResolved { hit: true });

        self.target.pause_motion(self.scene.as_mut());
        self.ball.save_position(self.scene.as_mut());
        self.run_effect(
            Effect::new(
                EffectKind::MoveAside,
                Element::Ball,
                EffectParams::Aside {
                    radius,
                    orientation,
                },
            ),
            Some(Stage::OpenBall),
        );
    }

    fn miss(&mut self) {
        info!("Throw missed");
        self.stats.misses += 1;
        self.emit(CaptureEvent::ThrowResolved { hit: false });
        self.schedule(self.tuning.miss_reset_delay_ms, Stage::Reset);
    }

    fn emit_target_particles_to_ball(&mut self) {
        self.scene
            .apply(VisualChange::SetBallImage(BallImage::Opened));

        let ball_size = self
            .scene
            .bounds(Element::Ball)
            .map(|r| r.width())
            .unwrap_or(0.0);
        match center_of(self.scene.as_ref(), Element::Target) {
            Some(from) => self.run_effect(
                Effect::new(
                    EffectKind::EmitParticles,
                    Element::Ball,
                    EffectParams::Stream { from, ball_size },
                ),
                None,
            ),
            None => debug!("Target not measurable, skipping particle stream"),
        }
        self.run_effect(Effect::simple(EffectKind::FadeOut, Element::Target), None);

        self.schedule(self.tuning.particle_hold_ms, Stage::CloseBall);
    }

    fn close_capture_ball(&mut self) {
        self.scene
            .apply(VisualChange::SetBallImage(BallImage::Closed));
        self.scene
            .apply(VisualChange::ClearContainer(Element::ParticleContainer));
        self.ball.save_position(self.scene.as_mut());
        self.run_effect(
            Effect::simple(EffectKind::Drop, Element::Ball),
            Some(Stage::Settle),
        );
    }

    fn animate_capture_state(&mut self) {
        self.phase = RoundPhase::Outcome;
        self.toggle(Element::CaptureScreen, Class::Hidden);
        self.toggle(Element::ButtonContainer, Class::Hidden);

        let shake_ms = self.tuning.shake_duration_ms;
        self.run_effect(
            Effect::new(
                EffectKind::Shake,
                Element::CaptureBall,
                EffectParams::Timed {
                    duration_ms: shake_ms,
                },
            ),
            None,
        );

        let ring_width = match self.scene.bounds(Element::RingActive) {
            Some(rect) => rect.width(),
            None => {
                debug!("Ring not measurable, assuming it is fully open");
                self.tuning.ring_max_width
            }
        };
        let rate = success_rate(ring_width, self.tuning.ring_max_width);
        let seed = self.rng.random_int(SEED_MIN, SEED_MAX);
        info!("Capture roll: seed={} success_rate={:.1}", seed, rate);
        self.emit(CaptureEvent::CaptureRoll {
            seed,
            success_rate: rate,
        });

        self.schedule(
            self.tuning.reveal_delay_ms(),
            Stage::Reveal {
                seed,
                success_rate: rate,
            },
        );
    }

    fn reveal_outcome(&mut self, seed: i32, success_rate: f32) {
        self.scene
            .apply(VisualChange::StopAnimation(Element::CaptureBall));

        match roll_outcome(seed, success_rate) {
            Outcome::Success => {
                self.toggle(Element::CaptureButton, Class::Active);
                self.toggle(Element::CaptureStatus, Class::Hidden);
                self.run_effect(
                    Effect::simple(EffectKind::Confetti, Element::ConfettiContainer),
                    Some(Stage::Captured),
                );
            }
            Outcome::Escape => {
                self.toggle(Element::ButtonContainer, Class::Hidden);
                self.toggle(Element::PoofContainer, Class::Hidden);
                self.run_effect(
                    Effect::simple(EffectKind::Poof, Element::Poof),
                    Some(Stage::HideEscape),
                );
            }
        }
    }

    fn finish_capture(&mut self) {
        self.scene
            .apply(VisualChange::ClearContainer(Element::ConfettiContainer));
        // Success UI stays up for the caller
        self.overlay.clear();
        self.phase = RoundPhase::Idle;
        self.stats.captures += 1;
        info!("Target captured");
        self.emit(CaptureEvent::Captured);

        if let Some(callback) = self.on_capture.as_mut() {
            callback();
        }
    }

    fn hide_escape(&mut self) {
        self.toggle(Element::CaptureScreen, Class::Hidden);
        self.scene.apply(VisualChange::ClearTransform(Element::Poof));
        self.toggle(Element::PoofContainer, Class::Hidden);
        debug_assert!(self.overlay.is_empty(), "escape toggles should cancel out");
        self.overlay.clear();
        self.phase = RoundPhase::Idle;
        self.stats.escapes += 1;
        info!("Target escaped");
        self.emit(CaptureEvent::Escaped);
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn run_effect(&mut self, effect: Effect, then: Option<Stage>) {
        let round = self.state.round();
        self.sequencer.run(
            self.scene.as_mut(),
            &mut self.timeline,
            effect,
            then.map(|stage| Scheduled { round, stage }),
        );
    }

    fn schedule(&mut self, delay_ms: u64, stage: Stage) {
        let round = self.state.round();
        self.timeline.schedule(delay_ms, Scheduled { round, stage });
    }

    /// Toggle a class and track it so a reset can undo it
    fn toggle(&mut self, element: Element, class: Class) {
        self.scene.apply(VisualChange::ToggleClass(element, class));
        if let Some(idx) = self.overlay.iter().position(|t| *t == (element, class)) {
            self.overlay.remove(idx);
        } else {
            self.overlay.push((element, class));
        }
    }

    fn emit(&mut self, event: CaptureEvent) {
        self.events.update_time(self.timeline.now());
        self.events.emit(event);
    }
}

fn throw_params(params: &ThrowParameters) -> EffectParams {
    EffectParams::Throw {
        translate_x: params.translate_x,
        translate_y: params.translate_y,
        travel: params.travel,
        scale: params.scale_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptedRandom;
    use crate::sim::SimScene;
    use crate::state::BallPhase;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FULL_POWER: f32 = 7.2;

    fn machine(scene: &SimScene, seeds: &[i32]) -> (CaptureMachine, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let mut machine = CaptureMachine::new(
            Box::new(scene.clone()),
            Screen::new(480.0, 800.0),
            CaptureTuning::default(),
        )
        .with_random(Box::new(ScriptedRandom::new(seeds.iter().copied())))
        .on_capture(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        machine.start_game();
        (machine, calls)
    }

    fn names(machine: &CaptureMachine) -> Vec<&'static str> {
        machine.events().peek().iter().map(|e| e.event.name()).collect()
    }

    fn time_of(machine: &CaptureMachine, name: &str) -> Option<u64> {
        machine
            .events()
            .peek()
            .iter()
            .find(|e| e.event.name() == name)
            .map(|e| e.time_ms)
    }

    /// Straight full-power throw that lands on the target
    fn throw_hit(machine: &mut CaptureMachine) {
        machine.throw_ball(-90.0, -50.0, FULL_POWER);
        machine.check_ball_colisions();
    }

    #[test]
    fn test_successful_capture() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(10_000);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(m.stats().captures, 1);
        assert_eq!(m.phase(), RoundPhase::Idle);

        let seq = names(&m);
        let order = ["Throw", "Collision", "Hit", "RoundReset", "CaptureRoll", "Captured"];
        let mut idx = 0;
        for name in seq {
            if idx < order.len() && name == order[idx] {
                idx += 1;
            }
        }
        assert_eq!(idx, order.len(), "events out of order: {:?}", names(&m));

        assert_eq!(time_of(&m, "Hit"), Some(600));
        assert_eq!(time_of(&m, "CaptureRoll"), Some(2200));
        assert_eq!(time_of(&m, "Captured"), Some(5500));

        // Success UI stays up
        assert!(!scene.is_hidden(Element::CaptureScreen));
        assert!(!scene.is_hidden(Element::CaptureStatus));
        assert!(scene.is_active(Element::CaptureButton));
        assert_eq!(scene.effect_count(EffectKind::Confetti), 1);
        assert_eq!(scene.effect_count(EffectKind::Poof), 0);
    }

    #[test]
    fn test_escape() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[60]);

        throw_hit(&mut m);
        m.run_due(10_000);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.stats().escapes, 1);
        assert!(names(&m).contains(&"Escaped"));
        assert!(!names(&m).contains(&"Captured"));

        // Escape UI comes and goes
        assert!(scene.is_hidden(Element::CaptureScreen));
        assert!(scene.is_hidden(Element::PoofContainer));
        assert!(!scene.is_hidden(Element::ButtonContainer));
        assert_eq!(scene.effect_count(EffectKind::Poof), 1);
    }

    #[test]
    fn test_ring_width_sets_success_rate() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);
        throw_hit(&mut m);
        m.run_due(10_000);

        let roll = m
            .events()
            .peek()
            .iter()
            .find_map(|e| match e.event {
                CaptureEvent::CaptureRoll { seed, success_rate } => Some((seed, success_rate)),
                _ => None,
            })
            .unwrap();
        assert_eq!(roll, (10, 50.0));
    }

    #[test]
    fn test_unmeasurable_ring_counts_as_open() {
        let mut scene = SimScene::default();
        scene.remove(Element::RingActive);
        let (mut m, calls) = machine(&scene, &[0]);

        throw_hit(&mut m);
        m.run_due(10_000);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.stats().escapes, 1);
    }

    #[test]
    fn test_downward_throw_misses_and_resets() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[0]);

        m.throw_ball(-90.0, 50.0, FULL_POWER);
        m.run_due(699);
        assert!(m.ball().in_motion());
        assert_eq!(time_of(&m, "Miss"), Some(300));
        assert_eq!(scene.effect_count(EffectKind::ThrowDescend), 0);

        m.run_due(700);
        assert_eq!(m.ball().phase(), BallPhase::Idle);
        assert_eq!(m.phase(), RoundPhase::Idle);
        assert_eq!(m.stats().misses, 1);
        assert_eq!(scene.ball_center(), scene.ball_rest());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_weak_upward_throw_misses() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[0]);

        m.throw_ball(-90.0, -50.0, 0.0);
        m.check_ball_colisions();
        m.run_due(10_000);

        assert_eq!(m.stats().collisions, 0);
        assert_eq!(time_of(&m, "Miss"), Some(600));
        assert_eq!(time_of(&m, "RoundReset"), Some(1000));
        assert_eq!(m.stats().hits, 0);
    }

    #[test]
    fn test_reset_mid_capture_cancels_round() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(1000);
        assert_eq!(m.phase(), RoundPhase::CaptureAttempt);
        assert!(scene.target_faded());

        m.reset_state();
        m.run_due(20_000);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.stale_dropped(), 1);
        assert_eq!(m.phase(), RoundPhase::Idle);
        assert_eq!(m.ball().phase(), BallPhase::Idle);
        assert!(!scene.target_faded());
        assert_eq!(scene.ball_center(), scene.ball_rest());
        assert_eq!(scene.ball_image(), BallImage::Idle);
        assert_eq!(scene.effect_count(EffectKind::Drop), 0);
        assert!(!names(&m).contains(&"CaptureRoll"));
    }

    #[test]
    fn test_pause_during_outcome_reverts_overlays() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(3000);
        assert_eq!(m.phase(), RoundPhase::Outcome);
        assert!(!scene.is_hidden(Element::CaptureScreen));
        assert!(scene.is_hidden(Element::ButtonContainer));

        m.pause_game();
        assert!(scene.is_hidden(Element::CaptureScreen));
        assert!(!scene.is_hidden(Element::ButtonContainer));

        m.run_due(20_000);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!names(&m).contains(&"Captured"));
        assert!(!names(&m).contains(&"Escaped"));
        assert_eq!(scene.effect_count(EffectKind::Confetti), 0);
        assert!(!m.state().running);
    }

    #[test]
    fn test_resize_resets_round() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(500);
        m.resize(Screen::new(600.0, 1000.0));

        assert_eq!(m.screen(), Screen::new(600.0, 1000.0));
        assert_eq!(m.ball().phase(), BallPhase::Idle);
        m.run_due(20_000);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.stats().hits, 0);
    }

    #[test]
    fn test_collision_is_idempotent() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.check_ball_colisions();
        m.check_ball_colisions();

        assert_eq!(m.stats().collisions, 1);
        assert_eq!(scene.effect_count(EffectKind::CollisionParticles), 1);
        assert!(m.ball().colision());
    }

    #[test]
    fn test_no_collision_while_aiming() {
        let mut scene = SimScene::default();
        let target = scene.center(Element::Target).unwrap();
        scene.place(Element::Ball, target);
        let (mut m, _) = machine(&scene, &[10]);

        m.check_ball_colisions();
        assert_eq!(m.stats().collisions, 0);
        assert!(!m.ball().colision());
    }

    #[test]
    fn test_throw_ignored_while_in_motion() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);

        m.throw_ball(-90.0, -50.0, FULL_POWER);
        m.throw_ball(-60.0, -80.0, 1.0);

        assert_eq!(m.stats().throws, 1);
        assert_eq!(scene.effect_count(EffectKind::ThrowRise), 1);
        assert!(!scene.ring_running());
    }

    #[test]
    fn test_swipe_during_outcome_is_ignored() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(3000);
        assert_eq!(m.phase(), RoundPhase::Outcome);
        assert!(!m.ball().in_motion());

        m.throw_ball(-90.0, 50.0, FULL_POWER);
        m.check_ball_colisions();
        assert_eq!(m.phase(), RoundPhase::Outcome);
        assert_eq!(m.stats().throws, 1);
        assert_eq!(m.stats().collisions, 1);
        assert_eq!(scene.effect_count(EffectKind::ThrowRise), 1);

        m.run_due(20_000);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(m.stats().captures, 1);
        assert_eq!(m.stale_dropped(), 0);
        assert_eq!(m.phase(), RoundPhase::Idle);

        // The next round is open again
        throw_hit(&mut m);
        assert_eq!(m.stats().throws, 2);
    }

    #[test]
    fn test_reset_during_success_reveal_withholds_callback() {
        let scene = SimScene::default();
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(5300);
        assert!(scene.is_active(Element::CaptureButton));
        assert!(!scene.is_hidden(Element::CaptureStatus));
        let before = scene.changes().len();

        m.reset_state();
        m.run_due(20_000);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(m.stats().captures, 0);
        assert!(!scene.is_active(Element::CaptureButton));
        assert!(scene.is_hidden(Element::CaptureStatus));
        assert!(scene.is_hidden(Element::CaptureScreen));
        assert!(
            scene.changes()[before..]
                .contains(&VisualChange::ClearContainer(Element::ConfettiContainer))
        );
    }

    #[test]
    fn test_reset_during_poof_clears_escape_ui() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[60]);

        throw_hit(&mut m);
        m.run_due(5300);
        assert!(!scene.is_hidden(Element::PoofContainer));
        assert!(!scene.is_hidden(Element::CaptureScreen));
        let before = scene.changes().len();

        m.reset_state();
        m.run_due(20_000);

        assert_eq!(m.stats().escapes, 0);
        assert!(scene.is_hidden(Element::PoofContainer));
        assert!(scene.is_hidden(Element::CaptureScreen));
        assert!(!scene.is_hidden(Element::ButtonContainer));
        assert!(
            scene.changes()[before..].contains(&VisualChange::ClearTransform(Element::Poof))
        );
    }

    #[test]
    fn test_failed_effects_still_complete_round() {
        let mut scene = SimScene::default();
        scene.fail_effect(EffectKind::Confetti);
        scene.fail_effect(EffectKind::Drop);
        let (mut m, calls) = machine(&scene, &[10]);

        throw_hit(&mut m);
        m.run_due(10_000);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Drop and confetti each collapse to zero time
        assert_eq!(time_of(&m, "CaptureRoll"), Some(1900));
        assert_eq!(time_of(&m, "Captured"), Some(4900));
        assert_eq!(m.failed_effects(), 2);
    }

    #[test]
    fn test_target_motion_paused_on_hit_and_resumed() {
        let scene = SimScene::default();
        let (m, _) = machine(&scene, &[10]);
        let mut m = m.with_target(Target::with_motion());

        throw_hit(&mut m);
        m.run_due(700);
        assert!(m.target().is_paused());
        assert!(scene.target_paused());

        m.run_due(2200);
        assert!(!m.target().is_paused());
        assert!(!scene.target_paused());
    }

    #[test]
    fn test_pointer_follow_and_cancel() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);

        m.pointer_ball(Some(Vec2::new(200.0, 600.0)), false);
        assert_eq!(scene.ball_center(), Vec2::new(200.0, 600.0));

        m.pointer_ball(None, true);
        assert_eq!(scene.ball_center(), scene.ball_rest());
        assert!(names(&m).contains(&"AimCancelled"));
        assert_eq!(m.stats().throws, 0);
    }

    #[test]
    fn test_reset_is_safe_anytime() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);

        m.reset_state();
        m.reset_state();
        assert_eq!(m.state().round(), RoundToken(2));
        assert_eq!(m.phase(), RoundPhase::Idle);

        throw_hit(&mut m);
        m.run_due(10_000);
        assert_eq!(m.stats().captures, 1);
    }

    #[test]
    fn test_angled_full_power_throw_hits() {
        let scene = SimScene::default();
        let (mut m, _) = machine(&scene, &[10]);

        m.throw_ball(0.0, -50.0, FULL_POWER);
        m.check_ball_colisions();
        m.run_due(600);

        let params = m
            .events()
            .peek()
            .iter()
            .find_map(|e| match e.event {
                CaptureEvent::Throw(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert!((params.scale_percent - 1.0).abs() < 1e-6);
        assert!((params.translate_x - 45.0).abs() < 1e-4);
        assert_eq!(m.stats().collisions, 1);
        assert_eq!(m.stats().hits, 1);
        // Lands right of center, so steps aside to the right
        let aside = scene
            .effects()
            .into_iter()
            .find(|e| e.kind == EffectKind::MoveAside)
            .unwrap();
        assert_eq!(
            aside.params,
            EffectParams::Aside {
                radius: 80.0,
                orientation: 1.0
            }
        );
    }
}
