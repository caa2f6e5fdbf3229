//! Game engine
//!
//! Owns both player records, the peer link and audio. Runs the simulation at a
//! fixed timestep and routes whatever the simulation emits: messages to the
//! peer, sounds to the speakers, notices to the HUD slot.

use log::{info, warn};
use rand::Rng;

use crate::audio::{AudioManager, SoundEffect};
use crate::consts::*;
use crate::net::{Message, PeerAction, PeerLink, apply_to_mirror};
use crate::settings::Settings;
use crate::sim::stage::{self, Stage};
use crate::sim::{GameEvent, KeyRepeat, MatchState, Notice, TickInput, tick};

pub struct Engine {
    settings: Settings,
    local: MatchState,
    remote: MatchState,
    link: Option<PeerLink>,
    audio: AudioManager,
    repeat: KeyRepeat,
    accumulator: f32,
    in_play: bool,
    events: Vec<GameEvent>,
}

impl Engine {
    pub fn new(settings: Settings, link: Option<PeerLink>, mut audio: AudioManager) -> Self {
        let mut tuning = settings.tuning;
        if link.is_some() {
            // Both peers fall at the same pace
            tuning.level = 0;
        }
        let seed = settings.seed.unwrap_or_else(rand::random);
        info!("Starting match with seed {seed}");
        audio.apply_settings(&settings);

        Self {
            local: MatchState::local(tuning, seed),
            remote: MatchState::remote(tuning),
            repeat: KeyRepeat::new(settings.key_repeat_delay, settings.key_repeat_interval),
            settings,
            link,
            audio,
            accumulator: 0.0,
            in_play: true,
            events: Vec::new(),
        }
    }

    /// Offline game
    pub fn solo(settings: Settings) -> Self {
        Self::new(settings, None, AudioManager::default())
    }

    pub fn networked(settings: Settings, link: PeerLink) -> Self {
        Self::new(settings, Some(link), AudioManager::default())
    }

    pub fn local(&self) -> &MatchState {
        &self.local
    }

    /// Mirror of the opponent
    pub fn remote(&self) -> &MatchState {
        &self.remote
    }

    pub fn in_play(&self) -> bool {
        self.in_play
    }

    pub fn is_networked(&self) -> bool {
        self.link.is_some()
    }

    /// Peer link still receiving
    pub fn is_connected(&self) -> bool {
        self.link.as_ref().is_some_and(PeerLink::is_connected)
    }

    /// Advance by a frame's worth of fixed steps. Returns the number of steps run.
    pub fn frame(&mut self, dt: f32, input: &mut TickInput) -> u32 {
        let dt = dt.min(MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step(input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.hard_drop = false;
        }

        if substeps == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            warn!("Falling behind, dropping {:.3}s", self.accumulator - SIM_DT);
            self.accumulator = SIM_DT;
        }
        substeps
    }

    /// One fixed step: peer messages first, then the local simulation
    pub fn step(&mut self, input: &TickInput) {
        self.handle_peer();

        if self.can_restart() && (input.idle_mode || input.any_pressed()) {
            self.restart();
        }

        if self.in_play {
            tick(&mut self.local, input, &mut self.repeat, SIM_DT, &mut self.events);
        } else if self.local.stage == Stage::GameOver {
            // Keep the game-over animation running
            let idle = TickInput::default();
            tick(&mut self.local, &idle, &mut self.repeat, SIM_DT, &mut self.events);
        } else {
            self.local.decay_notice(SIM_DT);
        }

        if self.remote.stage == Stage::GameOver {
            self.remote.gameover_spread += GAMEOVER_SPREAD_SPEED * SIM_DT;
        }

        self.route_events();
    }

    fn handle_peer(&mut self) {
        let Some(link) = &self.link else {
            return;
        };
        let inbound: Vec<Message> = link.drain().collect();
        for msg in inbound {
            match apply_to_mirror(&mut self.remote, &msg) {
                PeerAction::None => {}
                PeerAction::Attack(severity) => self.perform_attack(severity),
                PeerAction::OpponentLost => {
                    info!("Opponent lost with score {}", self.remote.score);
                    self.in_play = false;
                    self.notify(Notice::YouWin);
                }
            }
        }
    }

    /// Apply an attack to the local player
    pub fn perform_attack(&mut self, severity: u8) {
        if !self.in_play {
            return;
        }
        stage::perform_attack(&mut self.local, severity, &mut self.events);
    }

    fn notify(&mut self, notice: Notice) {
        info!("{}", notice.as_str());
        self.local.show_notice(notice, self.settings.notice_seconds);
        self.audio.play(SoundEffect::Penguin);
    }

    fn send(&self, msg: &Message) {
        if let Some(link) = &self.link {
            link.send(msg);
        }
    }

    fn route_events(&mut self) {
        let mut events = std::mem::take(&mut self.events);
        for event in events.drain(..) {
            match event {
                GameEvent::Send(msg) => self.send(&msg),
                GameEvent::Attack(severity) => {
                    if severity == 3 {
                        let notice = if self.local.stage == Stage::Tetris {
                            Notice::Tetris
                        } else {
                            Notice::Super
                        };
                        self.notify(notice);
                    }
                    self.send(&Message::Attack { severity });
                }
                GameEvent::Sound(effect) => self.audio.play(effect),
                GameEvent::Notice(notice) => self.notify(notice),
                GameEvent::Lost => self.in_play = false,
            }
        }
        // Keep the allocation
        self.events = events;
    }

    /// Offline only, once the game-over animation has spread far enough
    pub fn can_restart(&self) -> bool {
        self.link.is_none()
            && !self.in_play
            && self.local.gameover_spread > GAMEOVER_RESTART_SPREAD
    }

    pub fn restart(&mut self) {
        let seed: u64 = self.local.rng().random();
        info!("Restarting with seed {seed}");
        self.local.reset(seed);
        self.remote.reset(0);
        self.repeat = KeyRepeat::new(
            self.settings.key_repeat_delay,
            self.settings.key_repeat_interval,
        );
        self.accumulator = 0.0;
        self.in_play = true;
    }
}
