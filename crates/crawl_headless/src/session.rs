//! Interactive play session.
//!
//! A [`Session`] owns one game and turns protocol commands and timer
//! ticks into responses. [`run_session`] drives it from stdin and a tokio
//! interval, so player input and enemy ticks are handled on one task and
//! never interleave mid-tick.

use std::time::Duration;

use crawl_core::prelude::*;
use std::result::Result;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::ascii::render_frame;
use crate::combat_log;
use crate::config::SessionConfig;
use crate::protocol::{Command, ProtocolError, Response};

/// Lines buffered between the stdin reader and the session.
const INPUT_BUFFER: usize = 64;

/// Error ending a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Writing to stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An input line could not be understood.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One game plus the options controlling its output.
#[derive(Debug)]
pub struct Session {
    game: GameInstance,
    config: SessionConfig,
    finished: bool,
    generation: u64,
}

impl Session {
    /// Start a session with a fresh game.
    pub fn new(config: SessionConfig) -> Self {
        let game = match config.seed {
            Some(seed) => GameInstance::from_seed(seed),
            None => GameInstance::from_entropy(),
        };
        Self::with_game(game, config)
    }

    /// Start a session around an existing game.
    pub fn with_game(game: GameInstance, config: SessionConfig) -> Self {
        Self {
            game,
            config,
            finished: false,
            generation: 0,
        }
    }

    /// The running game.
    pub fn game(&self) -> &GameInstance {
        &self.game
    }

    /// Mutable access to the running game.
    pub fn game_mut(&mut self) -> &mut GameInstance {
        &mut self.game
    }

    /// Whether `quit` was received.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bumped on every restart, so drivers can re-arm their clocks.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The `ready` response for the current game.
    pub fn ready(&self) -> Response {
        Response::ready(self.game.tick(), self.game.seed())
    }

    /// Handle one raw input line.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        match Command::parse_line(line) {
            Ok(cmd) => self.handle(cmd),
            Err(ProtocolError::Empty) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Rejected input line");
                vec![Response::error(e.to_string(), None)]
            }
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        debug!(cmd = name, tick = self.game.tick(), "Handling command");

        match cmd {
            Command::Move { dx, dy } => match Direction::from_delta(dx, dy) {
                Ok(direction) => {
                    let events = self.game.move_hero(direction);
                    self.after_action(name, &events)
                }
                Err(e) => vec![Response::error(e.to_string(), Some(name))],
            },
            Command::Attack => {
                let events = self.game.attack();
                self.after_action(name, &events)
            }
            Command::Query => vec![Response::state(&self.game)],
            Command::Render => vec![self.frame()],
            Command::Hash => vec![Response::StateHash {
                tick: self.game.tick(),
                hash: self.game.state_hash(),
            }],
            Command::Restart { seed } => {
                let seed = seed.unwrap_or_else(|| SeededRandom::from_entropy().seed());
                self.game.restart_with_seed(seed);
                self.generation += 1;
                info!(seed, "Game restarted");
                vec![Response::ack(name, self.game.tick()), self.ready()]
            }
            Command::Quit => {
                self.finished = true;
                vec![Response::Bye]
            }
        }
    }

    /// Feed elapsed time to the enemy timer and report what happened.
    pub fn on_elapsed(&mut self, elapsed: Duration) -> Vec<Response> {
        let mut responses = Vec::new();
        for events in self.game.advance(elapsed) {
            if !events.is_quiet() {
                responses.extend(self.after_tick(&events));
            }
        }
        responses
    }

    fn after_action(&self, name: &str, events: &TickEvents) -> Vec<Response> {
        let mut responses = self.after_tick(events);
        responses.push(Response::ack(name, self.game.tick()));
        responses
    }

    fn after_tick(&self, events: &TickEvents) -> Vec<Response> {
        let mut responses = Vec::new();

        if self.config.combat_log {
            responses.extend(
                combat_log::describe(events, &self.game)
                    .into_iter()
                    .map(|message| Response::Log {
                        tick: events.tick,
                        message,
                    }),
            );
        }
        if events.game_over {
            responses.push(Response::GameOver {
                tick: events.tick,
                stats: *self.game.stats(),
            });
        }
        if self.config.auto_state {
            responses.push(Response::state(&self.game));
        }
        if self.config.auto_render {
            responses.push(self.frame());
        }

        responses
    }

    fn frame(&self) -> Response {
        Response::Frame {
            tick: self.game.tick(),
            text: render_frame(&self.game.snapshot(), &self.config.render),
        }
    }
}

async fn write_responses<W>(out: &mut W, responses: &[Response]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if responses.is_empty() {
        return Ok(());
    }
    for response in responses {
        out.write_all(response.to_json_line().as_bytes()).await?;
    }
    out.flush().await
}

/// Run a session on stdin/stdout until `quit` or end of input.
///
/// Enemy ticks fire from a tokio interval set to the game's timer period.
/// The interval only runs while the timer is armed and restarts its phase
/// after every `restart`.
pub async fn run_session(config: SessionConfig) -> Result<(), SessionError> {
    let mut session = Session::new(config);
    let mut stdout = tokio::io::stdout();

    info!(seed = ?session.game().seed(), "Session started");
    write_responses(&mut stdout, &[session.ready()]).await?;

    let (tx, mut rx) = mpsc::channel::<String>(INPUT_BUFFER);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let period = session.game().timer().interval();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut generation = session.generation();

    while !session.is_finished() {
        let armed = session.game().timer().is_armed();
        let responses = tokio::select! {
            line = rx.recv() => match line {
                Some(line) => session.handle_line(&line),
                None => {
                    info!("Input closed, ending session");
                    break;
                }
            },
            _ = ticker.tick(), if armed => session.on_elapsed(period),
        };

        if session.generation() != generation {
            generation = session.generation();
            ticker.reset();
        }

        write_responses(&mut stdout, &responses).await?;
    }

    reader.abort();
    info!(tick = session.game().tick(), "Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawl_test_utils::fixtures::{game_from_layout, DUEL, SURROUNDED};

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            seed: Some(7),
            ..SessionConfig::default()
        }
    }

    fn duel_session() -> Session {
        Session::with_game(game_from_layout(DUEL), quiet_config())
    }

    #[test]
    fn test_ready_reports_seed() {
        let session = Session::new(quiet_config());
        match session.ready() {
            Response::Ready { seed, tick, .. } => {
                assert_eq!(seed, Some(7));
                assert_eq!(tick, 0);
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[test]
    fn test_diagonal_move_rejected() {
        let mut session = duel_session();
        let responses = session.handle(Command::Move { dx: 1, dy: 1 });
        assert_eq!(responses.len(), 1);
        assert!(matches!(
            &responses[0],
            Response::Error { cmd: Some(cmd), .. } if cmd == "move"
        ));
        assert_eq!(session.game().tick(), 0);
    }

    #[test]
    fn test_attack_logs_and_acks() {
        let mut session = duel_session();
        let responses = session.handle(Command::Attack);

        match &responses[0] {
            Response::Log { tick, message } => {
                assert_eq!(*tick, 1);
                assert!(message.starts_with("Hit enemy at (3, 1)"), "{message}");
            }
            other => panic!("expected log, got {other:?}"),
        }
        assert_eq!(responses.last(), Some(&Response::ack("attack", 1)));
    }

    #[test]
    fn test_combat_log_can_be_disabled() {
        let config = SessionConfig {
            combat_log: false,
            ..quiet_config()
        };
        let mut session = Session::with_game(game_from_layout(DUEL), config);
        let responses = session.handle(Command::Attack);
        assert_eq!(responses, vec![Response::ack("attack", 1)]);
    }

    #[test]
    fn test_auto_state_and_render() {
        let config = SessionConfig {
            auto_state: true,
            auto_render: true,
            combat_log: false,
            ..quiet_config()
        };
        let mut session = Session::with_game(game_from_layout(DUEL), config);
        let responses = session.handle_line("a");

        assert_eq!(responses.len(), 3);
        assert!(matches!(responses[0], Response::State(_)));
        assert!(matches!(responses[1], Response::Frame { tick: 1, .. }));
        assert_eq!(responses[2], Response::ack("move", 1));
    }

    #[test]
    fn test_hash_matches_game() {
        let mut session = duel_session();
        let expected = session.game().state_hash();
        assert_eq!(
            session.handle(Command::Hash),
            vec![Response::StateHash {
                tick: 0,
                hash: expected
            }]
        );
    }

    #[test]
    fn test_restart_bumps_generation() {
        let mut session = duel_session();
        session.handle(Command::Attack);

        let responses = session.handle(Command::Restart { seed: Some(99) });
        assert_eq!(session.generation(), 1);
        assert_eq!(session.game().tick(), 0);
        assert_eq!(session.game().seed(), Some(99));
        assert_eq!(responses[0], Response::ack("restart", 0));
        assert_eq!(responses[1], Response::ready(0, Some(99)));
    }

    #[test]
    fn test_quit_finishes() {
        let mut session = duel_session();
        assert_eq!(session.handle_line(r#"{"cmd":"quit"}"#), vec![Response::Bye]);
        assert!(session.is_finished());
    }

    #[test]
    fn test_bad_line_reports_error() {
        let mut session = duel_session();
        let responses = session.handle_line("{not json");
        assert!(matches!(&responses[0], Response::Error { cmd: None, .. }));
        assert!(session.handle_line("   ").is_empty());
    }

    #[test]
    fn test_timer_tick_kills_weak_hero() {
        let mut session = Session::with_game(game_from_layout(SURROUNDED), quiet_config());
        assert!(session.game_mut().set_hero_hp(1));

        let interval = session.game().timer().interval();
        let responses = session.on_elapsed(interval);

        assert!(responses
            .iter()
            .any(|r| matches!(r, Response::Log { message, .. } if message == "The hero has fallen")));
        assert!(responses
            .iter()
            .any(|r| matches!(r, Response::GameOver { tick: 1, .. })));
        assert!(!session.game().timer().is_armed());

        assert!(session.on_elapsed(interval * 4).is_empty());
    }

    #[test]
    fn test_actions_after_death_are_acked_without_effect() {
        let mut session = Session::with_game(game_from_layout(SURROUNDED), quiet_config());
        session.game_mut().set_hero_hp(1);
        session.on_elapsed(session.game().timer().interval());

        let tick = session.game().tick();
        assert_eq!(session.handle(Command::Attack), vec![Response::ack("attack", tick)]);
    }
}
