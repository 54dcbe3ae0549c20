//! Bevy integration
//!
//! `CapturePlugin` feeds `InputEvent` messages into the game resource and
//! advances its virtual clock by the frame delta.

use bevy::prelude::*;

use crate::events::CaptureEvent;
use crate::input::{InputAdapter, InputEvent};

/// The running capture game
#[derive(Resource)]
pub struct CaptureGame(pub InputAdapter);

pub struct CapturePlugin;

impl Plugin for CapturePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<InputEvent>().add_systems(
            Update,
            (forward_input_events, advance_capture_game, log_capture_events).chain(),
        );
    }
}

/// Hand this frame's input to the adapter
pub fn forward_input_events(
    game: Option<ResMut<CaptureGame>>,
    mut events: MessageReader<InputEvent>,
) {
    let Some(mut game) = game else {
        events.clear();
        return;
    };
    for event in events.read() {
        game.0.handle(event.clone());
    }
}

pub fn advance_capture_game(game: Option<ResMut<CaptureGame>>, time: Res<Time>) {
    if let Some(mut game) = game {
        game.0.advance(time.delta());
    }
}

/// Drain the engine's event bus into the log
pub fn log_capture_events(game: Option<ResMut<CaptureGame>>) {
    let Some(mut game) = game else {
        return;
    };
    let events = game.0.machine_mut().events_mut();
    let drained = events.drain();
    events.clear_processed();
    for bus_event in drained {
        match &bus_event.event {
            CaptureEvent::Captured | CaptureEvent::Escaped => {
                info!("[{}ms] {}", bus_event.time_ms, bus_event.event.name())
            }
            CaptureEvent::Aim { .. } => {}
            other => debug!("[{}ms] {:?}", bus_event.time_ms, other),
        }
    }
}
