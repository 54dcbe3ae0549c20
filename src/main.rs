//! Capture Game - headless demo round
//!
//! Plays one scripted throw through the Bevy plugin against the simulated
//! scene and logs every engine event.
//!
//! Usage:
//!   cargo run -- --velocity 7.2 --delta-y -50 --ring 40
//!   cargo run -- --angle -70 --seed 42 --tuning config/capture_tuning.json

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::time::Duration;

use capture_game::{
    CAPTURE_TUNING_FILE, CaptureGame, CaptureMachine, CapturePlugin, CaptureTuning,
    DEFAULT_SCREEN_SIZE, Element, GestureEvent, InputAdapter, InputEvent, Screen, SeededRandom,
    SimScene,
};

/// Give up if the round has not resolved by then
const DEMO_TIME_LIMIT: Duration = Duration::from_secs(20);

#[derive(Resource, Clone, Copy)]
struct DemoThrow {
    origin: Vec2,
    angle: f32,
    delta_y: f32,
    velocity: f32,
}

fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let tuning_path: String =
        arg_value(&args, "--tuning").unwrap_or_else(|| CAPTURE_TUNING_FILE.to_string());
    let seed: Option<u64> = arg_value(&args, "--seed");
    let ring_width: Option<f32> = arg_value(&args, "--ring");

    let screen = Screen::new(DEFAULT_SCREEN_SIZE.x, DEFAULT_SCREEN_SIZE.y);
    let mut scene = SimScene::new(screen);
    if let Some(width) = ring_width {
        scene.set_ring_width(width);
    }
    let origin = scene.center(Element::Ball).unwrap_or(Vec2::ZERO);

    let demo = DemoThrow {
        origin,
        angle: arg_value(&args, "--angle").unwrap_or(-90.0),
        delta_y: arg_value(&args, "--delta-y").unwrap_or(-50.0),
        velocity: arg_value(&args, "--velocity").unwrap_or(7.2),
    };

    let mut app = App::new();
    // Logging comes up first so tuning load messages are visible
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
        LogPlugin::default(),
    ));

    let tuning = CaptureTuning::load_or_default(&tuning_path);
    let random = match seed {
        Some(seed) => SeededRandom::new(seed),
        None => SeededRandom::from_entropy(),
    };
    let machine = CaptureMachine::new(Box::new(scene), screen, tuning)
        .with_random(Box::new(random))
        .on_capture(|| info!("Capture callback fired"));
    let mut adapter = InputAdapter::new(machine);
    adapter.start();

    app.add_plugins(CapturePlugin)
        .insert_resource(CaptureGame(adapter))
        .insert_resource(demo)
        .add_systems(Startup, throw_once)
        .add_systems(Update, exit_when_round_ends.after(capture_game::plugin::log_capture_events))
        .run();
}

fn throw_once(demo: Res<DemoThrow>, mut input: MessageWriter<InputEvent>) {
    info!(
        "Throwing: angle={} delta_y={} velocity={}",
        demo.angle, demo.delta_y, demo.velocity
    );
    input.write(InputEvent::Gesture(GestureEvent::swipe(
        demo.origin,
        demo.angle,
        demo.delta_y,
        demo.velocity,
    )));
}

fn exit_when_round_ends(
    game: Res<CaptureGame>,
    time: Res<Time>,
    mut exit: MessageWriter<AppExit>,
) {
    let machine = game.0.machine();
    let stats = machine.stats();
    let resolved = stats.captures + stats.escapes > 0
        || (stats.misses > 0 && !machine.ball().in_motion());

    if resolved {
        info!(
            "Round over after {}ms: {} captured, {} escaped, {} missed",
            game.0.now_ms(),
            stats.captures,
            stats.escapes,
            stats.misses
        );
        exit.write(AppExit::Success);
    } else if time.elapsed() > DEMO_TIME_LIMIT {
        warn!("Round did not resolve in {:?}", DEMO_TIME_LIMIT);
        exit.write(AppExit::error());
    }
}
