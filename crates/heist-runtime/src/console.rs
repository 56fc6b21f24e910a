//! Console line parsing and the per-line driver

use heist_types::{ParameterError, PlayerId, Role, SessionId};
use std::sync::Arc;
use vh_04_session_coordinator::{SessionApi, SessionError, SessionManager, SessionView};

pub const HELP: &str = "\
commands:
  join <hacker|infiltrator|strategist|quantum_expert>
  leave
  status
  dump      full session view as JSON
  help
  quit
anything else is sent to the command router, e.g.
  move to 3 4 | go north 2 | scan | hack x:0 | grab | entangle h:0 cx:0:1";

#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleInput {
    Join(Role),
    Leave,
    Status,
    Dump,
    Help,
    Quit,
    Command(String),
    Empty,
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Result<Self, ParameterError> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(ConsoleInput::Empty);
        };
        let input = match first.to_ascii_lowercase().as_str() {
            "join" => ConsoleInput::Join(words.next().unwrap_or_default().parse()?),
            "leave" => ConsoleInput::Leave,
            "status" => ConsoleInput::Status,
            "dump" => ConsoleInput::Dump,
            "help" | "?" => ConsoleInput::Help,
            "quit" | "exit" => ConsoleInput::Quit,
            _ => ConsoleInput::Command(line.to_string()),
        };
        Ok(input)
    }
}

/// One console user attached to one session
pub struct Console {
    manager: Arc<SessionManager>,
    session: SessionId,
    player: Option<PlayerId>,
}

/// Text to print and whether to stop reading input
#[derive(Debug, PartialEq)]
pub struct ConsoleReply {
    pub text: String,
    pub quit: bool,
}

impl ConsoleReply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

impl Console {
    pub fn new(manager: Arc<SessionManager>, session: SessionId) -> Self {
        Self {
            manager,
            session,
            player: None,
        }
    }

    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Handle one line of input. Only fatal session errors are returned.
    pub async fn handle_line(&mut self, line: &str) -> Result<ConsoleReply, SessionError> {
        let input = match ConsoleInput::parse(line) {
            Ok(input) => input,
            Err(e) => return Ok(ConsoleReply::say(e.to_string())),
        };

        if let Some(player) = self.player {
            // Any input counts as a heartbeat
            if !matches!(input, ConsoleInput::Leave | ConsoleInput::Quit) {
                self.manager.heartbeat(self.session, player).await?;
            }
        }

        let reply = match input {
            ConsoleInput::Empty => ConsoleReply::say(""),
            ConsoleInput::Help => ConsoleReply::say(HELP),
            ConsoleInput::Quit => ConsoleReply {
                text: "bye".into(),
                quit: true,
            },
            ConsoleInput::Status => {
                ConsoleReply::say(status_line(self.manager.get_snapshot(self.session)?.as_ref()))
            }
            ConsoleInput::Dump => {
                let view = self.manager.get_snapshot(self.session)?;
                ConsoleReply::say(
                    serde_json::to_string_pretty(view.as_ref())
                        .unwrap_or_else(|e| format!("cannot render view: {e}")),
                )
            }
            ConsoleInput::Join(role) => match self.player {
                Some(_) => ConsoleReply::say("already joined"),
                None => match self.manager.join(self.session, role).await {
                    Ok(player) => {
                        self.player = Some(player);
                        ConsoleReply::say(format!("joined as {role} ({player})"))
                    }
                    Err(SessionError::ValidationFailure(reason)) => ConsoleReply::say(reason),
                    Err(e) => return Err(e),
                },
            },
            ConsoleInput::Leave => match self.player.take() {
                Some(player) => {
                    self.manager.leave(self.session, player).await?;
                    ConsoleReply::say("left the heist")
                }
                None => ConsoleReply::say("not joined"),
            },
            ConsoleInput::Command(text) => match self.player {
                None => ConsoleReply::say("join first: join <role>"),
                Some(player) => {
                    let result = self
                        .manager
                        .submit_command(self.session, player, &text)
                        .await?;
                    let mut out = format!(
                        "[{}] {} (revision {})",
                        if result.success { "ok" } else { "no" },
                        result.message,
                        result.revision
                    );
                    if let Some(fidelity) = result.fidelity {
                        out.push_str(&format!("\n  fidelity {fidelity:.3}"));
                    }
                    if let Some(scan) = &result.scan {
                        for guard in &scan.guards {
                            out.push_str(&format!("\n  guard at {}", guard.position));
                        }
                        for treasure in &scan.treasures {
                            out.push_str(&format!(
                                "\n  treasure {} worth {} at {}",
                                treasure.treasure_id, treasure.value, treasure.position
                            ));
                        }
                    }
                    ConsoleReply::say(out)
                }
            },
        };
        Ok(reply)
    }
}

/// One-line session summary
pub fn status_line(view: &SessionView) -> String {
    let solved = view.puzzles.iter().filter(|p| p.solved).count();
    format!(
        "{} | revision {} | players {}/{} connected | puzzles {}/{} | loot {}/{}",
        view.state,
        view.revision,
        view.connected_players(),
        view.players.len(),
        solved,
        view.puzzles.len(),
        view.collected_value,
        view.total_value
    )
}
