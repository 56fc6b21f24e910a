//! Players and their connection lifecycle

use heist_types::{ActionRecord, PlayerId, PlayerPosition, Position, Role};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Connection status of a player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected { since: Instant },
}

/// A player inside a session
///
/// The role is fixed at join time. History keeps the most recent actions
/// up to the configured capacity.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    role: Role,
    pub position: Position,
    status: ConnectionStatus,
    last_seen: Instant,
    history: VecDeque<ActionRecord>,
    history_capacity: usize,
}

impl Player {
    /// New connected player at the vault entrance
    pub fn new(id: PlayerId, role: Role, history_capacity: usize, now: Instant) -> Self {
        Self {
            id,
            role,
            position: Position::ORIGIN,
            status: ConnectionStatus::Connected,
            last_seen: now,
            history: VecDeque::with_capacity(history_capacity.min(64)),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Player restored from a snapshot. Starts disconnected until the
    /// client heartbeats again.
    pub fn restored(
        id: PlayerId,
        role: Role,
        position: Position,
        history: Vec<ActionRecord>,
        history_capacity: usize,
        now: Instant,
    ) -> Self {
        let mut player = Self::new(id, role, history_capacity, now);
        player.position = position;
        player.status = ConnectionStatus::Disconnected { since: now };
        for record in history {
            player.record(record);
        }
        player
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Mark disconnected. Returns `false` if already disconnected.
    pub fn disconnect(&mut self, now: Instant) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.status = ConnectionStatus::Disconnected { since: now };
        true
    }

    /// Mark connected and refresh the heartbeat. Returns `true` if the
    /// player was disconnected.
    pub fn reconnect(&mut self, now: Instant) -> bool {
        self.last_seen = now;
        if self.is_connected() {
            return false;
        }
        self.status = ConnectionStatus::Connected;
        true
    }

    /// Time since the last heartbeat or action
    pub fn silent_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    pub fn record(&mut self, record: ActionRecord) {
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    pub fn history(&self) -> impl Iterator<Item = &ActionRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn as_position(&self) -> PlayerPosition {
        PlayerPosition {
            player_id: self.id,
            position: self.position,
            connected: self.is_connected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heist_types::{ActionKind, ActionOutcome};

    fn record(n: u64) -> ActionRecord {
        ActionRecord {
            player_id: PlayerId::new(),
            kind: ActionKind::Scan,
            payload: format!("scan {n}"),
            timestamp_ms: n,
            elapsed_ms: n,
            position: Position::ORIGIN,
            outcome: ActionOutcome::Success,
        }
    }

    #[test]
    fn test_new_player_spawns_at_entrance() {
        let player = Player::new(PlayerId::new(), Role::Hacker, 64, Instant::now());
        assert_eq!(player.position, Position::ORIGIN);
        assert!(player.is_connected());
        assert_eq!(player.role(), Role::Hacker);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut player = Player::new(PlayerId::new(), Role::Strategist, 3, Instant::now());
        for n in 0..5 {
            player.record(record(n));
        }
        assert_eq!(player.history_len(), 3);
        let first = player.history().next().unwrap();
        assert_eq!(first.timestamp_ms, 2);
    }

    #[test]
    fn test_disconnect_and_reconnect() {
        let start = Instant::now();
        let mut player = Player::new(PlayerId::new(), Role::Infiltrator, 8, start);
        assert!(player.disconnect(start));
        assert!(!player.disconnect(start));
        assert!(!player.as_position().connected);

        let later = start + Duration::from_secs(5);
        assert!(player.reconnect(later));
        assert!(!player.reconnect(later));
        assert_eq!(player.silent_for(later), Duration::ZERO);
    }

    #[test]
    fn test_restored_player_starts_disconnected() {
        let player = Player::restored(
            PlayerId::new(),
            Role::QuantumExpert,
            Position::new(2.0, 3.0),
            vec![record(1), record(2)],
            64,
            Instant::now(),
        );
        assert!(!player.is_connected());
        assert_eq!(player.history_len(), 2);
        assert_eq!(player.position, Position::new(2.0, 3.0));
    }
}
