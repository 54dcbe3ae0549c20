//! In-memory scene
//!
//! Cloning a `SimScene` yields another handle to the same world, so a test
//! can hand one clone to the machine and inspect the other.

use bevy::math::{Rect, Vec2};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::constants::*;
use crate::effects::{Effect, EffectKind, EffectParams};
use crate::scene::{BallImage, Class, Element, Scene, VisualChange};
use crate::trajectory::Screen;

/// Share of the vertical gesture delta the descend stage drops by
const DESCEND_FRACTION: f32 = 0.1;

/// Everything the engine asked of the scene, in order
#[derive(Debug, Clone, PartialEq)]
enum SceneRecord {
    Effect(Effect),
    Change(VisualChange),
}

#[derive(Debug)]
struct SimWorld {
    /// Centers and sizes of every element except the ball and ring
    centers: HashMap<Element, Vec2>,
    sizes: HashMap<Element, Vec2>,
    /// z-order, topmost first
    stacking: Vec<Element>,
    collidable: HashSet<Element>,
    removed: HashSet<Element>,
    hidden: HashSet<Element>,
    active: HashSet<Element>,

    ball_rest: Vec2,
    ball_base: Vec2,
    pointer_offset: Vec2,
    ball_image: BallImage,

    target_home: Vec2,
    target_faded: bool,
    target_paused: bool,

    ring_width: f32,
    ring_running: bool,

    default_effect_ms: u64,
    effect_ms: HashMap<EffectKind, u64>,
    failing: HashSet<EffectKind>,

    log: Vec<SceneRecord>,
}

impl SimWorld {
    fn new(screen: Screen) -> Self {
        let size = Vec2::new(screen.width, screen.height);
        let ball_rest = Vec2::new(size.x / 2.0, size.y * SIM_BALL_REST_Y);
        let target_home = Vec2::new(size.x / 2.0, size.y * SIM_TARGET_Y);

        let mut centers = HashMap::new();
        let mut sizes = HashMap::new();
        let mut place = |el: Element, center: Vec2, extent: Vec2| {
            centers.insert(el, center);
            sizes.insert(el, extent);
        };
        place(Element::Target, target_home, SIM_TARGET_SIZE);
        place(Element::Other(0), size / 2.0, size);
        place(Element::CaptureScreen, size / 2.0, size);
        place(Element::CaptureBall, size / 2.0, SIM_BALL_SIZE);
        place(Element::ButtonContainer, Vec2::new(size.x / 2.0, size.y - 40.0), Vec2::new(size.x, 80.0));
        place(Element::CaptureButton, Vec2::new(size.x / 2.0, size.y - 40.0), Vec2::splat(64.0));
        place(Element::CaptureStatus, Vec2::new(size.x / 2.0, 40.0), Vec2::new(size.x, 80.0));
        place(Element::ConfettiContainer, size / 2.0, size);
        place(Element::ParticleContainer, size / 2.0, size);
        place(Element::PoofContainer, size / 2.0, size);
        place(Element::Poof, size / 2.0, SIM_TARGET_SIZE);
        place(Element::RingFill, target_home, SIM_TARGET_SIZE);

        Self {
            centers,
            sizes,
            stacking: vec![
                Element::Ball,
                Element::RingActive,
                Element::Target,
                Element::Other(0),
            ],
            collidable: HashSet::from([Element::Target]),
            removed: HashSet::new(),
            // Outcome overlays start hidden
            hidden: HashSet::from([
                Element::CaptureScreen,
                Element::CaptureStatus,
                Element::PoofContainer,
            ]),
            active: HashSet::new(),
            ball_rest,
            ball_base: ball_rest,
            pointer_offset: Vec2::ZERO,
            ball_image: BallImage::Idle,
            target_home,
            target_faded: false,
            target_paused: false,
            ring_width: SIM_RING_SIZE.x,
            ring_running: true,
            default_effect_ms: SIM_EFFECT_MS,
            effect_ms: HashMap::new(),
            failing: HashSet::new(),
            log: Vec::new(),
        }
    }

    fn ball_center(&self) -> Vec2 {
        self.ball_base + self.pointer_offset
    }

    fn bounds(&self, element: Element) -> Option<Rect> {
        if self.removed.contains(&element) {
            return None;
        }
        match element {
            Element::Ball => Some(Rect::from_center_size(self.ball_center(), SIM_BALL_SIZE)),
            Element::RingActive => {
                let center = self.centers.get(&Element::Target)?;
                Some(Rect::from_center_size(*center, Vec2::splat(self.ring_width.max(0.0))))
            }
            other => {
                let center = self.centers.get(&other)?;
                let size = self.sizes.get(&other)?;
                Some(Rect::from_center_size(*center, *size))
            }
        }
    }

    fn play(&mut self, effect: &Effect) -> Result<Duration, String> {
        self.log.push(SceneRecord::Effect(effect.clone()));
        if self.failing.contains(&effect.kind) {
            return Err(format!("{:?} unavailable", effect.kind));
        }

        match (effect.kind, effect.params) {
            (EffectKind::ThrowRise, EffectParams::Throw { translate_x, travel, .. }) => {
                self.ball_base += self.pointer_offset + Vec2::new(translate_x, travel);
                self.pointer_offset = Vec2::ZERO;
            }
            (EffectKind::ThrowDescend, EffectParams::Throw { translate_y, .. }) => {
                self.ball_base.y += translate_y.abs() * DESCEND_FRACTION;
            }
            (EffectKind::MoveAside, EffectParams::Aside { radius, orientation }) => {
                self.ball_base.x += orientation * radius;
            }
            (EffectKind::Drop, _) => {
                self.ball_base.y += SIM_BALL_SIZE.y / 2.0;
            }
            (EffectKind::RestoreBall, _) => {
                self.pointer_offset = Vec2::ZERO;
            }
            (EffectKind::FadeOut, _) if effect.element == Element::Target => {
                self.target_faded = true;
            }
            _ => {}
        }

        let ms = match effect.params {
            EffectParams::Timed { duration_ms } => duration_ms,
            _ => self
                .effect_ms
                .get(&effect.kind)
                .copied()
                .unwrap_or(self.default_effect_ms),
        };
        Ok(Duration::from_millis(ms))
    }

    fn apply(&mut self, change: VisualChange) {
        match &change {
            VisualChange::FollowPointer(point) => {
                self.pointer_offset = *point - self.ball_base;
            }
            VisualChange::SetBallImage(image) => self.ball_image = *image,
            VisualChange::ToggleClass(element, class) => {
                let set = match class {
                    Class::Hidden => &mut self.hidden,
                    Class::Active => &mut self.active,
                };
                if !set.remove(element) {
                    set.insert(*element);
                }
            }
            VisualChange::CommitTransform(Element::Ball) => {
                self.ball_base += self.pointer_offset;
                self.pointer_offset = Vec2::ZERO;
            }
            VisualChange::ResetBall => {
                self.ball_base = self.ball_rest;
                self.pointer_offset = Vec2::ZERO;
                self.ball_image = BallImage::Idle;
                self.ring_running = true;
            }
            VisualChange::ResetTarget => {
                self.target_faded = false;
                self.centers.insert(Element::Target, self.target_home);
            }
            VisualChange::StopAnimation(Element::RingFill) => self.ring_running = false,
            VisualChange::PauseMotion(Element::Target) => self.target_paused = true,
            VisualChange::ResumeMotion(Element::Target) => self.target_paused = false,
            VisualChange::CollisionTransform { element, .. } => {
                if let Some(idx) = self.stacking.iter().position(|e| e == element) {
                    let el = self.stacking.remove(idx);
                    // Lands directly under the ball
                    let ball_idx = self
                        .stacking
                        .iter()
                        .position(|e| *e == Element::Ball)
                        .map(|i| i + 1)
                        .unwrap_or(0);
                    self.stacking.insert(ball_idx, el);
                }
            }
            _ => {}
        }
        self.log.push(SceneRecord::Change(change));
    }
}

/// Shared handle to an in-memory scene
#[derive(Debug, Clone)]
pub struct SimScene {
    world: Arc<Mutex<SimWorld>>,
}

impl Default for SimScene {
    fn default() -> Self {
        Self::new(Screen::new(DEFAULT_SCREEN_SIZE.x, DEFAULT_SCREEN_SIZE.y))
    }
}

impl SimScene {
    pub fn new(screen: Screen) -> Self {
        Self {
            world: Arc::new(Mutex::new(SimWorld::new(screen))),
        }
    }

    fn world(&self) -> MutexGuard<'_, SimWorld> {
        // A panic mid-update leaves geometry usable; keep going
        self.world.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Move an element's center (the ball's pointer offset is cleared)
    pub fn place(&mut self, element: Element, center: Vec2) {
        let mut w = self.world();
        w.removed.remove(&element);
        match element {
            Element::Ball => {
                w.ball_base = center;
                w.pointer_offset = Vec2::ZERO;
            }
            other => {
                w.centers.insert(other, center);
            }
        }
    }

    /// Add an element on top of the z-order
    pub fn add_element(&mut self, element: Element, center: Vec2, size: Vec2, collidable: bool) {
        let mut w = self.world();
        w.centers.insert(element, center);
        w.sizes.insert(element, size);
        w.stacking.retain(|e| *e != element);
        w.stacking.insert(0, element);
        if collidable {
            w.collidable.insert(element);
        } else {
            w.collidable.remove(&element);
        }
    }

    /// Make an element unmeasurable
    pub fn remove(&mut self, element: Element) {
        self.world().removed.insert(element);
    }

    pub fn set_ring_width(&mut self, width: f32) {
        self.world().ring_width = width;
    }

    pub fn set_effect_ms(&mut self, kind: EffectKind, ms: u64) {
        self.world().effect_ms.insert(kind, ms);
    }

    /// Make an effect fail to start
    pub fn fail_effect(&mut self, kind: EffectKind) {
        self.world().failing.insert(kind);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn center(&self, element: Element) -> Option<Vec2> {
        self.world().bounds(element).map(|r| r.center())
    }

    pub fn ball_center(&self) -> Vec2 {
        self.world().ball_center()
    }

    pub fn ball_rest(&self) -> Vec2 {
        self.world().ball_rest
    }

    pub fn ball_image(&self) -> BallImage {
        self.world().ball_image
    }

    pub fn is_hidden(&self, element: Element) -> bool {
        self.world().hidden.contains(&element)
    }

    pub fn is_active(&self, element: Element) -> bool {
        self.world().active.contains(&element)
    }

    pub fn target_faded(&self) -> bool {
        self.world().target_faded
    }

    pub fn target_paused(&self) -> bool {
        self.world().target_paused
    }

    pub fn ring_running(&self) -> bool {
        self.world().ring_running
    }

    pub fn changes(&self) -> Vec<VisualChange> {
        self.world()
            .log
            .iter()
            .filter_map(|r| match r {
                SceneRecord::Change(c) => Some(c.clone()),
                SceneRecord::Effect(_) => None,
            })
            .collect()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.world()
            .log
            .iter()
            .filter_map(|r| match r {
                SceneRecord::Effect(e) => Some(e.clone()),
                SceneRecord::Change(_) => None,
            })
            .collect()
    }

    pub fn effect_count(&self, kind: EffectKind) -> usize {
        self.world()
            .log
            .iter()
            .filter(|r| matches!(r, SceneRecord::Effect(e) if e.kind == kind))
            .count()
    }
}

impl Scene for SimScene {
    fn bounds(&self, element: Element) -> Option<Rect> {
        self.world().bounds(element)
    }

    fn elements_at_point(&self, point: Vec2) -> Vec<Element> {
        let w = self.world();
        w.stacking
            .iter()
            .copied()
            .filter(|el| !w.hidden.contains(el))
            .filter(|el| w.bounds(*el).is_some_and(|r| r.contains(point)))
            .collect()
    }

    fn is_collidable(&self, element: Element) -> bool {
        let w = self.world();
        if element == Element::Target && w.target_faded {
            return false;
        }
        w.collidable.contains(&element)
    }

    fn play_effect(&mut self, effect: &Effect) -> Result<Duration, String> {
        self.world().play(effect)
    }

    fn apply(&mut self, change: VisualChange) {
        self.world().apply(change);
    }
}
