//! Input adapter - gestures, visibility and resize into machine actions
//!
//! Also owns the collision poll loop. The loop is a self-rescheduling task:
//! each tick runs a collision check and queues the next tick only while the
//! game is running and visible. A stopped loop never resumes on its own;
//! becoming visible again issues a fresh task (new generation) and any tick
//! left over from an older generation is ignored.

use bevy::log::debug;
use bevy::math::Vec2;
use bevy::prelude::Message;
use std::time::Duration;

use crate::machine::CaptureMachine;
use crate::timeline::Timeline;
use crate::trajectory::Screen;

/// Recognized gesture types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Pan,
    Swipe,
}

/// Normalized gesture from the recognizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    /// Pointer position; None when the recognizer has no center
    pub center: Option<Vec2>,
    /// Degrees, screen convention (-90 = straight up)
    pub angle: f32,
    pub delta_y: f32,
    pub velocity: f32,
    pub is_final: bool,
}

impl GestureEvent {
    pub fn pan(center: Vec2, is_final: bool) -> Self {
        Self {
            kind: GestureKind::Pan,
            center: Some(center),
            angle: 0.0,
            delta_y: 0.0,
            velocity: 0.0,
            is_final,
        }
    }

    pub fn swipe(center: Vec2, angle: f32, delta_y: f32, velocity: f32) -> Self {
        Self {
            kind: GestureKind::Swipe,
            center: Some(center),
            angle,
            delta_y,
            velocity,
            is_final: true,
        }
    }
}

/// Everything the adapter reacts to
#[derive(Message, Debug, Clone, PartialEq)]
pub enum InputEvent {
    Gesture(GestureEvent),
    Visibility { hidden: bool },
    Resize { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy)]
struct PollTick {
    generation: u64,
}

pub struct InputAdapter {
    machine: CaptureMachine,
    poll: Timeline<PollTick>,
    /// Generation of the live poll task
    generation: u64,
    polling: bool,
    now_ms: u64,
    /// Sub-millisecond remainder carried between frames
    carry: Duration,
}

impl InputAdapter {
    pub fn new(machine: CaptureMachine) -> Self {
        Self {
            machine,
            poll: Timeline::new(),
            generation: 0,
            polling: false,
            now_ms: 0,
            carry: Duration::ZERO,
        }
    }

    pub fn machine(&self) -> &CaptureMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut CaptureMachine {
        &mut self.machine
    }

    /// Whether a poll loop is live
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Start the game and its poll loop
    pub fn start(&mut self) {
        self.machine.start_game();
        self.restart_poll();
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Gesture(gesture) => match gesture.kind {
                GestureKind::Pan => self.machine.pointer_ball(gesture.center, gesture.is_final),
                GestureKind::Swipe => {
                    self.machine
                        .throw_ball(gesture.angle, gesture.delta_y, gesture.velocity)
                }
            },
            InputEvent::Visibility { hidden } => {
                self.machine.set_visible(!hidden);
                if hidden {
                    // The live loop sees the flag on its next tick and stops
                    self.machine.pause_game();
                } else {
                    self.machine.start_game();
                    self.restart_poll();
                }
            }
            InputEvent::Resize { width, height } => {
                self.machine.resize(Screen::new(width, height));
            }
        }
    }

    /// Issue a fresh poll task, superseding any older one
    fn restart_poll(&mut self) {
        if !self.machine.state().should_poll() {
            return;
        }
        self.generation += 1;
        self.polling = true;
        debug!("Poll loop started (generation {})", self.generation);
        self.poll.schedule(
            0,
            PollTick {
                generation: self.generation,
            },
        );
    }

    fn on_poll_tick(&mut self, tick: PollTick) {
        if tick.generation != self.generation {
            return;
        }
        self.machine.check_ball_colisions();

        if self.machine.state().should_poll() {
            self.poll
                .schedule(self.machine.tuning().poll_interval_ms, tick);
        } else {
            self.polling = false;
            debug!("Poll loop stopped (generation {})", tick.generation);
        }
    }

    /// Advance by a frame delta, carrying sub-millisecond remainders
    pub fn advance(&mut self, dt: Duration) {
        let total = self.carry + dt;
        let ms = total.as_millis() as u64;
        self.carry = total - Duration::from_millis(ms);
        self.advance_ms(ms);
    }

    /// Advance virtual time, running machine continuations and poll ticks in
    /// due order (machine first on ties)
    pub fn advance_ms(&mut self, ms: u64) {
        let until = self.now_ms.saturating_add(ms);
        loop {
            let next = [self.machine.next_due(), self.poll.next_due()]
                .into_iter()
                .flatten()
                .min();
            let Some(t) = next.filter(|t| *t <= until) else {
                break;
            };
            self.machine.run_due(t);
            while let Some((_, tick)) = self.poll.pop_due(t) {
                self.on_poll_tick(tick);
            }
        }
        self.machine.run_due(until);
        self.poll.advance_to(until);
        self.now_ms = until;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptedRandom;
    use crate::sim::SimScene;
    use crate::state::BallPhase;
    use crate::tuning::CaptureTuning;

    fn adapter(scene: &SimScene) -> InputAdapter {
        let machine = CaptureMachine::new(
            Box::new(scene.clone()),
            Screen::new(480.0, 800.0),
            CaptureTuning::default(),
        )
        .with_random(Box::new(ScriptedRandom::new([10])));
        let mut adapter = InputAdapter::new(machine);
        adapter.start();
        adapter
    }

    fn swipe() -> InputEvent {
        InputEvent::Gesture(GestureEvent::swipe(Vec2::new(240.0, 680.0), -90.0, -50.0, 7.2))
    }

    fn emitted(adapter: &InputAdapter, name: &str) -> bool {
        adapter
            .machine()
            .events()
            .peek()
            .iter()
            .any(|e| e.event.name() == name)
    }

    #[test]
    fn test_poll_detects_collision() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        assert!(a.is_polling());

        a.handle(swipe());
        a.advance_ms(0);
        assert_eq!(a.machine().ball().phase(), BallPhase::Collided);
    }

    #[test]
    fn test_full_round_through_adapter() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.handle(swipe());
        a.advance_ms(6000);

        assert_eq!(a.now_ms(), 6000);
        assert_eq!(a.machine().stats().captures, 1);
        assert!(a.is_polling());
    }

    #[test]
    fn test_poll_stops_when_hidden() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.advance_ms(250);
        assert!(a.is_polling());

        a.handle(InputEvent::Visibility { hidden: true });
        assert!(!a.machine().state().running);
        // Stops on its next tick
        a.advance_ms(100);
        assert!(!a.is_polling());
        assert!(a.poll.is_empty());

        a.advance_ms(1000);
        assert!(a.poll.is_empty());
    }

    #[test]
    fn test_hidden_mid_throw_drops_continuations() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.handle(swipe());
        a.advance_ms(100);

        a.handle(InputEvent::Visibility { hidden: true });
        a.advance_ms(10_000);

        assert!(a.machine().stale_dropped() >= 1);
        assert!(!emitted(&a, "Hit"));
        assert!(!emitted(&a, "Miss"));
        assert_eq!(a.machine().ball().phase(), BallPhase::Idle);
        assert_eq!(scene.ball_center(), scene.ball_rest());
    }

    #[test]
    fn test_show_restarts_poll_with_new_generation() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.handle(InputEvent::Visibility { hidden: true });
        a.advance_ms(200);
        assert!(!a.is_polling());
        let stopped = a.generation;

        a.handle(InputEvent::Visibility { hidden: false });
        assert!(a.is_polling());
        assert!(a.generation > stopped);
        assert!(a.machine().state().running);

        a.handle(swipe());
        a.advance_ms(0);
        assert_eq!(a.machine().ball().phase(), BallPhase::Collided);
    }

    #[test]
    fn test_restart_leaves_one_live_loop() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.advance_ms(50);
        a.handle(InputEvent::Visibility { hidden: false });
        a.handle(InputEvent::Visibility { hidden: false });
        a.advance_ms(1000);

        // Older ticks were ignored rather than rescheduled
        assert_eq!(a.poll.len(), 1);
    }

    #[test]
    fn test_resize_updates_screen() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.handle(InputEvent::Resize {
            width: 320.0,
            height: 640.0,
        });
        assert_eq!(a.machine().screen(), Screen::new(320.0, 640.0));
        assert!(emitted(&a, "Resized"));
    }

    #[test]
    fn test_pan_moves_ball() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.handle(InputEvent::Gesture(GestureEvent::pan(Vec2::new(100.0, 500.0), false)));
        assert_eq!(scene.ball_center(), Vec2::new(100.0, 500.0));
        a.handle(InputEvent::Gesture(GestureEvent::pan(Vec2::new(100.0, 500.0), true)));
        assert_eq!(scene.ball_center(), scene.ball_rest());
    }

    #[test]
    fn test_frame_deltas_carry_remainder() {
        let scene = SimScene::default();
        let mut a = adapter(&scene);
        a.advance(Duration::from_micros(600));
        assert_eq!(a.now_ms(), 0);
        a.advance(Duration::from_micros(600));
        assert_eq!(a.now_ms(), 1);
        a.advance(Duration::from_millis(16));
        assert_eq!(a.now_ms(), 17);
    }
}
