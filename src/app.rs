//! Screen flow around the simulation
//!
//! `App` is what a windowing shim drives: feed it input events, call
//! `update` once per frame, then draw `scene()` and `hud_lines()`. The
//! simulation itself only ever advances in fixed `SIM_DT` steps.

use std::collections::HashSet;

use crate::consts::*;
use crate::renderer::{DuelHud, Hud, Scene};
use crate::settings::Settings;
use crate::sim::duel::{DuelEvent, DuelInput, DuelPhase, DuelState, tick_duel};
use crate::sim::state::{GameEvent, Key, MoveIntent, PlayerSetup, PlayerSlot};
use crate::sim::{MatchState, TickInput, tick};

/// How long the intro plays before falling through to the menu
pub const INTRO_MS: f64 = 7000.0;
/// Longest name the menu accepts
pub const MAX_NAME_CHARS: usize = 16;
/// Largest frame delta fed to the accumulator
const MAX_FRAME_DT: f32 = 0.1;

/// Colors offered by the menu pickers
pub const PALETTE: [[u8; 3]; 10] = [
    [255, 109, 106],
    [255, 199, 95],
    [92, 225, 230],
    [159, 105, 255],
    [64, 222, 140],
    [255, 77, 0],
    [255, 230, 0],
    [0, 180, 255],
    [140, 100, 255],
    [80, 255, 180],
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameChoice {
    #[default]
    Tag,
    Duel,
}

impl GameChoice {
    pub fn toggled(self) -> Self {
        match self {
            GameChoice::Tag => GameChoice::Duel,
            GameChoice::Duel => GameChoice::Tag,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameChoice::Tag => "Tag",
            GameChoice::Duel => "Duel",
        }
    }
}

/// Everything typed or picked on the menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub names: [String; 2],
    pub colors: [usize; 2],
    pub choice: GameChoice,
    /// Name field receiving text
    pub focus: PlayerSlot,
}

impl Default for Menu {
    fn default() -> Self {
        Self {
            names: [String::new(), String::new()],
            colors: [0, 2],
            choice: GameChoice::Tag,
            focus: PlayerSlot::One,
        }
    }
}

impl Menu {
    /// Append a typed character to the focused name
    pub fn type_char(&mut self, c: char) {
        let name = &mut self.names[self.focus.index()];
        if !c.is_control() && name.chars().count() < MAX_NAME_CHARS {
            name.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.names[self.focus.index()].pop();
    }

    /// Step a player's color through the palette, wrapping at either end
    pub fn cycle_color(&mut self, slot: PlayerSlot, step: i32) {
        let len = PALETTE.len() as i32;
        let idx = &mut self.colors[slot.index()];
        *idx = (*idx as i32 + step).rem_euclid(len) as usize;
    }

    /// Player setup with blank names replaced by the defaults
    pub fn setup(&self, slot: PlayerSlot) -> PlayerSetup {
        let typed = self.names[slot.index()].trim();
        let mut setup = PlayerSetup::default_for(slot);
        if !typed.is_empty() {
            setup.name = typed.to_string();
        }
        setup.color = PALETTE[self.colors[slot.index()] % PALETTE.len()];
        setup
    }

    pub fn clear_names(&mut self) {
        for name in &mut self.names {
            name.clear();
        }
    }
}

/// The game being played
#[derive(Debug, Clone)]
pub enum Game {
    Tag(Box<MatchState>),
    Duel(Box<DuelState>),
}

impl Game {
    pub fn is_over(&self) -> bool {
        match self {
            Game::Tag(state) => state.is_over(),
            Game::Duel(state) => state.phase == DuelPhase::GameOver,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Screen {
    Intro { elapsed_ms: f64 },
    Menu,
    Playing(Game),
}

/// Raw input forwarded by the shim
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Printable text, delivered separately from key presses
    Text(char),
    Click,
    /// Menu widget interactions
    FocusName(PlayerSlot),
    CycleColor(PlayerSlot, i32),
    ToggleGame,
    Start,
    Quit,
}

/// What the shim should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    None,
    SetFullscreen(bool),
    Quit,
}

/// Sound and feedback cues gathered across substeps
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Match(GameEvent),
    Duel(DuelEvent),
}

/// One-shot duel presses, consumed by the next substep
#[derive(Debug, Clone, Copy, Default)]
struct DuelPresses {
    melee: [bool; 2],
    shoot: [bool; 2],
    start: bool,
}

pub struct App {
    pub settings: Settings,
    pub screen: Screen,
    pub menu: Menu,
    pub fullscreen: bool,
    accumulator: f32,
    held: HashSet<Key>,
    presses: DuelPresses,
    next_seed: u64,
    events: Vec<AppEvent>,
}

impl App {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            settings,
            screen: Screen::Intro { elapsed_ms: 0.0 },
            menu: Menu::default(),
            fullscreen: false,
            accumulator: 0.0,
            held: HashSet::new(),
            presses: DuelPresses::default(),
            next_seed: seed,
            events: Vec::new(),
        }
    }

    pub fn handle_event(&mut self, event: InputEvent) -> AppCommand {
        match event {
            InputEvent::Quit => return AppCommand::Quit,
            InputEvent::KeyDown(Key::F11) => {
                self.fullscreen = !self.fullscreen;
                return AppCommand::SetFullscreen(self.fullscreen);
            }
            InputEvent::KeyDown(key) => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
                return AppCommand::None;
            }
            _ => {}
        }

        match &self.screen {
            Screen::Intro { .. } => {
                if matches!(
                    event,
                    InputEvent::KeyDown(_) | InputEvent::Click | InputEvent::Text(_)
                ) {
                    self.screen = Screen::Menu;
                }
            }
            Screen::Menu => self.handle_menu_event(event),
            Screen::Playing(game) => {
                let (over, duel) = (game.is_over(), matches!(game, Game::Duel(_)));
                self.handle_game_key(event, over, duel);
            }
        }
        AppCommand::None
    }

    fn handle_game_key(&mut self, event: InputEvent, over: bool, duel: bool) {
        match event {
            InputEvent::KeyDown(Key::Escape) => self.back_to_menu(false),
            InputEvent::KeyDown(Key::R) if over => self.back_to_menu(true),
            InputEvent::KeyDown(key) if duel => {
                let p = &mut self.presses;
                match key {
                    Key::F => p.melee[0] = true,
                    Key::RightShift => p.melee[1] = true,
                    Key::G => p.shoot[0] = true,
                    Key::Enter => p.shoot[1] = true,
                    Key::Space => p.start = true,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn handle_menu_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Text(c) => self.menu.type_char(c),
            InputEvent::KeyDown(Key::Backspace) => self.menu.backspace(),
            InputEvent::FocusName(slot) => self.menu.focus = slot,
            InputEvent::CycleColor(slot, step) => self.menu.cycle_color(slot, step),
            InputEvent::ToggleGame => self.menu.choice = self.menu.choice.toggled(),
            InputEvent::KeyDown(Key::Enter) | InputEvent::Start => self.start_game(),
            _ => {}
        }
    }

    /// Leave the menu and start the selected game with a fresh seed
    pub fn start_game(&mut self) {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        let one = self.menu.setup(PlayerSlot::One);
        let two = self.menu.setup(PlayerSlot::Two);

        let game = match self.menu.choice {
            GameChoice::Tag => Game::Tag(Box::new(MatchState::new(seed, &self.settings, one, two))),
            GameChoice::Duel => Game::Duel(Box::new(DuelState::new(seed, one, two))),
        };
        log::info!("Starting {} (seed {})", self.menu.choice.label(), seed);

        self.screen = Screen::Playing(game);
        self.accumulator = 0.0;
        self.held.clear();
        self.presses = DuelPresses::default();
        self.events.clear();
    }

    /// Drop the running game; `clear_names` also resets the typed names
    pub fn back_to_menu(&mut self, clear_names: bool) {
        if clear_names {
            self.menu.clear_names();
        }
        self.screen = Screen::Menu;
        self.accumulator = 0.0;
        self.held.clear();
        self.presses = DuelPresses::default();
    }

    /// Advance by one frame of `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        match &mut self.screen {
            Screen::Intro { elapsed_ms } => {
                *elapsed_ms += dt as f64 * 1000.0;
                if *elapsed_ms >= INTRO_MS {
                    self.screen = Screen::Menu;
                }
            }
            Screen::Menu => {}
            Screen::Playing(game) => {
                self.accumulator += dt;

                let mut substeps = 0;
                while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                    match game {
                        Game::Tag(state) => {
                            let input = TickInput::from_held(state, |k| self.held.contains(&k));
                            tick(state, &input, SIM_DT);
                            self.events
                                .extend(state.events.iter().cloned().map(AppEvent::Match));
                        }
                        Game::Duel(state) => {
                            let input = duel_input(&self.held, &self.presses);
                            tick_duel(state, &input, SIM_DT);
                            self.events
                                .extend(state.events.iter().copied().map(AppEvent::Duel));
                            // One-shot presses apply to a single step
                            self.presses = DuelPresses::default();
                        }
                    }
                    self.accumulator -= SIM_DT;
                    substeps += 1;
                }
            }
        }
    }

    /// Cues produced since the last call
    pub fn take_events(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn scene(&self) -> Option<Scene> {
        match &self.screen {
            Screen::Playing(Game::Tag(state)) => {
                Some(Scene::capture(state, !self.settings.effective_flicker()))
            }
            Screen::Playing(Game::Duel(state)) => Some(Scene::capture_duel(state)),
            _ => None,
        }
    }

    /// Text for the current screen, top to bottom
    pub fn hud_lines(&self) -> Vec<String> {
        match &self.screen {
            Screen::Intro { .. } => vec!["TAG ARENA".to_string(), "Press any key".to_string()],
            Screen::Menu => {
                let mut lines = Vec::new();
                for slot in PlayerSlot::BOTH {
                    let marker = if self.menu.focus == slot { ">" } else { " " };
                    lines.push(format!(
                        "{} {}: {}",
                        marker,
                        PlayerSetup::default_for(slot).name,
                        self.menu.names[slot.index()]
                    ));
                }
                lines.push(format!("Game: {}", self.menu.choice.label()));
                lines.push("Enter to start".to_string());
                lines
            }
            Screen::Playing(Game::Tag(state)) => {
                let mut lines = Hud::from_state(state).lines();
                if state.is_over() {
                    lines.push("Press R to return to the menu".to_string());
                }
                lines
            }
            Screen::Playing(Game::Duel(state)) => match state.phase {
                DuelPhase::Instructions => vec![
                    "P1: WASD move, F melee, G shoot".to_string(),
                    "P2: Arrows move, Right Shift melee, Enter shoot".to_string(),
                    "Space to start".to_string(),
                ],
                _ => {
                    let hud = DuelHud::from_state(state);
                    let mut lines = hud.fighters.to_vec();
                    lines.extend(hud.message);
                    lines
                }
            },
        }
    }
}

fn duel_input(held: &HashSet<Key>, presses: &DuelPresses) -> DuelInput {
    let intent = |up, down, left, right| MoveIntent {
        up: held.contains(&up),
        down: held.contains(&down),
        left: held.contains(&left),
        right: held.contains(&right),
    };
    DuelInput {
        intents: [
            intent(Key::W, Key::S, Key::A, Key::D),
            intent(Key::Up, Key::Down, Key::Left, Key::Right),
        ],
        melee: presses.melee,
        shoot: presses.shoot,
        start: presses.start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MatchPhase;

    fn app_at_menu() -> App {
        let mut app = App::new(Settings::default(), 7);
        app.handle_event(InputEvent::Click);
        app
    }

    #[test]
    fn test_intro_times_out() {
        let mut app = App::new(Settings::default(), 1);
        for _ in 0..69 {
            app.update(0.1);
        }
        assert!(matches!(app.screen, Screen::Intro { .. }));
        app.update(0.1);
        app.update(0.1);
        assert!(matches!(app.screen, Screen::Menu));
    }

    #[test]
    fn test_any_key_skips_intro() {
        let mut app = App::new(Settings::default(), 1);
        app.handle_event(InputEvent::KeyDown(Key::Space));
        assert!(matches!(app.screen, Screen::Menu));
    }

    #[test]
    fn test_name_entry_limits() {
        let mut app = app_at_menu();
        for c in "An extremely long player name".chars() {
            app.handle_event(InputEvent::Text(c));
        }
        app.handle_event(InputEvent::Text('\u{7}'));
        assert_eq!(app.menu.names[0].chars().count(), MAX_NAME_CHARS);

        app.handle_event(InputEvent::KeyDown(Key::Backspace));
        assert_eq!(app.menu.names[0].chars().count(), MAX_NAME_CHARS - 1);

        app.handle_event(InputEvent::FocusName(PlayerSlot::Two));
        app.handle_event(InputEvent::Text('Z'));
        assert_eq!(app.menu.names[1], "Z");
    }

    #[test]
    fn test_color_cycle_wraps() {
        let mut menu = Menu::default();
        assert_eq!(menu.colors, [0, 2]);
        menu.cycle_color(PlayerSlot::One, -1);
        assert_eq!(menu.colors[0], 9);
        menu.cycle_color(PlayerSlot::One, 1);
        assert_eq!(menu.colors[0], 0);
        assert_eq!(menu.setup(PlayerSlot::Two).color, PALETTE[2]);
    }

    #[test]
    fn test_blank_names_use_defaults() {
        let mut menu = Menu::default();
        menu.names[1] = "   ".to_string();
        assert_eq!(menu.setup(PlayerSlot::One).name, "Player 1");
        assert_eq!(menu.setup(PlayerSlot::Two).name, "Player 2");
    }

    #[test]
    fn test_tag_match_runs_on_held_keys() {
        let mut app = app_at_menu();
        app.handle_event(InputEvent::Start);
        let start = match &app.screen {
            Screen::Playing(Game::Tag(state)) => state.players[0].pos,
            other => panic!("expected a tag match, got {:?}", other),
        };

        app.handle_event(InputEvent::KeyDown(Key::D));
        app.handle_event(InputEvent::KeyDown(Key::S));
        for _ in 0..30 {
            app.update(SIM_DT);
        }
        app.handle_event(InputEvent::KeyUp(Key::D));

        match &app.screen {
            Screen::Playing(Game::Tag(state)) => {
                assert!(state.now_ms > 0.0);
                assert_ne!(state.players[0].pos, start);
            }
            other => panic!("expected a tag match, got {:?}", other),
        }
        assert!(app.scene().is_some());
        assert!(app.hud_lines()[0].starts_with("Round 1/3"));
    }

    #[test]
    fn test_keys_held_across_screens_are_dropped() {
        let mut app = app_at_menu();
        app.handle_event(InputEvent::KeyDown(Key::D));
        app.handle_event(InputEvent::Start);
        let start = match &app.screen {
            Screen::Playing(Game::Tag(state)) => state.players[0].pos,
            other => panic!("expected a tag match, got {:?}", other),
        };

        for _ in 0..30 {
            app.update(SIM_DT);
        }
        match &app.screen {
            Screen::Playing(Game::Tag(state)) => assert_eq!(state.players[0].pos, start),
            other => panic!("expected a tag match, got {:?}", other),
        }

        app.handle_event(InputEvent::KeyDown(Key::Right));
        app.handle_event(InputEvent::KeyDown(Key::Escape));
        assert!(app.held.is_empty());
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut app = app_at_menu();
        app.handle_event(InputEvent::Start);
        app.update(1.0);
        match &app.screen {
            Screen::Playing(Game::Tag(state)) => {
                let max_ms = (SIM_DT * MAX_SUBSTEPS as f32 * 1000.0) as f64 + 1.0;
                assert!(state.now_ms <= max_ms);
            }
            other => panic!("expected a tag match, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_keeps_names_and_r_clears_them() {
        let mut app = app_at_menu();
        app.handle_event(InputEvent::Text('Q'));
        app.handle_event(InputEvent::Start);
        app.handle_event(InputEvent::KeyDown(Key::Escape));
        assert!(matches!(app.screen, Screen::Menu));
        assert_eq!(app.menu.names[0], "Q");

        app.handle_event(InputEvent::Start);
        // R does nothing mid-match
        app.handle_event(InputEvent::KeyDown(Key::R));
        assert!(matches!(app.screen, Screen::Playing(_)));

        if let Screen::Playing(Game::Tag(state)) = &mut app.screen {
            state.phase = MatchPhase::MatchOver;
        }
        app.handle_event(InputEvent::KeyDown(Key::R));
        assert!(matches!(app.screen, Screen::Menu));
        assert!(app.menu.names[0].is_empty());
    }

    #[test]
    fn test_duel_start_is_one_shot() {
        let mut app = app_at_menu();
        app.handle_event(InputEvent::ToggleGame);
        app.handle_event(InputEvent::Start);
        assert!(app.hud_lines()[2].contains("Space"));

        app.handle_event(InputEvent::KeyDown(Key::Space));
        app.update(SIM_DT);
        match &app.screen {
            Screen::Playing(Game::Duel(state)) => assert_eq!(state.phase, DuelPhase::Playing),
            other => panic!("expected a duel, got {:?}", other),
        }
        assert!(app.take_events().contains(&AppEvent::Duel(DuelEvent::Started)));
        assert!(app.take_events().is_empty());
    }

    #[test]
    fn test_fullscreen_and_quit() {
        let mut app = App::new(Settings::default(), 1);
        assert_eq!(
            app.handle_event(InputEvent::KeyDown(Key::F11)),
            AppCommand::SetFullscreen(true)
        );
        // F11 does not skip the intro
        assert!(matches!(app.screen, Screen::Intro { .. }));
        assert_eq!(
            app.handle_event(InputEvent::KeyDown(Key::F11)),
            AppCommand::SetFullscreen(false)
        );
        assert_eq!(app.handle_event(InputEvent::Quit), AppCommand::Quit);
    }

    #[test]
    fn test_seeds_advance_between_games() {
        let mut app = app_at_menu();
        app.start_game();
        let first = match &app.screen {
            Screen::Playing(Game::Tag(state)) => state.seed,
            _ => unreachable!(),
        };
        app.back_to_menu(false);
        app.start_game();
        let second = match &app.screen {
            Screen::Playing(Game::Tag(state)) => state.seed,
            _ => unreachable!(),
        };
        assert_eq!(second, first + 1);
    }
}
