//! Tag Arena entry point
//!
//! Runs headless: two scripted players play a full tag match and then a duel
//! through the same `App` a windowed shim would drive. `RUST_LOG=info` shows
//! the match flow.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tag_arena::app::{App, AppEvent, Game, InputEvent, Screen};
use tag_arena::consts::SIM_DT;
use tag_arena::settings::Settings;
use tag_arena::sim::GameEvent;
use tag_arena::sim::duel::DuelEvent;
use tag_arena::sim::state::{Key, KeyBindings, PlayerSlot};

/// Give up on a game after this many frames (10 minutes at 60 Hz)
const MAX_FRAMES: u32 = 60 * 600;
/// Frames between HUD dumps
const HUD_EVERY: u32 = 60 * 10;

fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(1);
    let settings = Settings::load();
    log::info!("Tag Arena headless run (seed {})", seed);
    log::debug!(
        "Audio gains: sfx {:.2}, music {:.2}",
        settings.sfx_gain(),
        settings.music_gain()
    );

    let mut app = App::new(settings, seed);
    let mut bot_rng = Pcg32::seed_from_u64(seed ^ 0x5eed);

    app.handle_event(InputEvent::Click);
    for c in "Ana".chars() {
        app.handle_event(InputEvent::Text(c));
    }
    app.handle_event(InputEvent::FocusName(PlayerSlot::Two));
    for c in "Bruno".chars() {
        app.handle_event(InputEvent::Text(c));
    }
    app.handle_event(InputEvent::Start);
    play(&mut app, &mut bot_rng);

    app.back_to_menu(false);
    app.handle_event(InputEvent::ToggleGame);
    app.handle_event(InputEvent::Start);
    app.handle_event(InputEvent::KeyDown(Key::Space));
    app.handle_event(InputEvent::KeyUp(Key::Space));
    play(&mut app, &mut bot_rng);
}

/// Run the current game until it ends or the frame limit hits
fn play(app: &mut App, rng: &mut Pcg32) {
    let mut tags = 0u32;
    let mut pickups = 0u32;
    let mut shots = 0u32;

    for frame in 0..MAX_FRAMES {
        steer(app, rng);
        app.update(SIM_DT);

        for event in app.take_events() {
            match event {
                AppEvent::Match(GameEvent::Tagged { .. }) => tags += 1,
                AppEvent::Match(GameEvent::PowerUpCollected { .. }) => pickups += 1,
                AppEvent::Duel(DuelEvent::Shot { .. }) => shots += 1,
                _ => {}
            }
        }

        if frame % HUD_EVERY == 0 {
            for line in app.hud_lines() {
                log::info!("  {}", line);
            }
        }

        if matches!(&app.screen, Screen::Playing(game) if game.is_over()) {
            log::info!("Finished after {} frames", frame + 1);
            break;
        }
    }

    for line in app.hud_lines() {
        println!("{}", line);
    }
    println!("tags: {}, pickups: {}, shots: {}", tags, pickups, shots);
}

/// Press and release keys the way two players might
fn steer(app: &mut App, rng: &mut Pcg32) {
    let (positions, chaser) = match &app.screen {
        Screen::Playing(Game::Tag(state)) => (
            [state.players[0].pos, state.players[1].pos],
            state.tagger().unwrap_or(PlayerSlot::One),
        ),
        Screen::Playing(Game::Duel(state)) => (
            [state.fighters[0].center(), state.fighters[1].center()],
            PlayerSlot::One,
        ),
        _ => return,
    };
    let duel = matches!(app.screen, Screen::Playing(Game::Duel(_)));

    for slot in PlayerSlot::BOTH {
        let me = positions[slot.index()];
        let them = positions[slot.other().index()];
        let mut dir = them - me;
        // Runners flee in the tag game; both sides close in for a duel
        if !duel && slot != chaser {
            dir = -dir;
        }
        dir += Vec2::new(rng.random_range(-80.0..80.0), rng.random_range(-80.0..80.0));

        let keys = match slot {
            PlayerSlot::One => KeyBindings::wasd(),
            PlayerSlot::Two => KeyBindings::arrows(),
        };
        hold(app, keys.right, dir.x > 10.0);
        hold(app, keys.left, dir.x < -10.0);
        hold(app, keys.down, dir.y > 10.0);
        hold(app, keys.up, dir.y < -10.0);

        if duel && rng.random_bool(0.02) {
            let action = match (slot, rng.random_bool(0.5)) {
                (PlayerSlot::One, true) => Key::F,
                (PlayerSlot::One, false) => Key::G,
                (PlayerSlot::Two, true) => Key::RightShift,
                (PlayerSlot::Two, false) => Key::Enter,
            };
            app.handle_event(InputEvent::KeyDown(action));
            app.handle_event(InputEvent::KeyUp(action));
        }
    }
}

fn hold(app: &mut App, key: Key, down: bool) {
    let event = if down {
        InputEvent::KeyDown(key)
    } else {
        InputEvent::KeyUp(key)
    };
    app.handle_event(event);
}
