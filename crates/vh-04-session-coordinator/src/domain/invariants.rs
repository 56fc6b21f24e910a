//! Domain invariants checked after every mutation
//!
//! A violation means the session state can no longer be trusted; the
//! actor moves the session to `Failed`.

use super::errors::InvariantViolation;
use super::session::Session;
use heist_types::{PlayerId, PuzzleId, Role, SessionState};
use std::collections::{BTreeMap, BTreeSet};

/// The parts of a session that must only move forward
#[derive(Clone, Debug, PartialEq)]
pub struct Fingerprint {
    pub revision: u64,
    pub state: SessionState,
    pub solved: BTreeSet<PuzzleId>,
    pub roles: BTreeMap<PlayerId, Role>,
}

impl Session {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            revision: self.revision,
            state: self.state,
            solved: self
                .puzzles
                .iter()
                .filter(|p| p.is_solved())
                .map(|p| p.id)
                .collect(),
            roles: self
                .players
                .values()
                .map(|p| (p.id, p.role()))
                .collect(),
        }
    }

    /// Invariants that hold for any single state
    pub fn check_state(&self) -> Result<(), InvariantViolation> {
        let collected = self.vault.collected_value();
        let total = self.vault.total_value();
        if collected > total {
            return Err(InvariantViolation::CollectedExceedsTotal { collected, total });
        }
        for guard in &self.guards {
            if guard.memory.len() > guard.memory.capacity() {
                return Err(InvariantViolation::GuardMemoryOverflow {
                    guard: guard.id,
                    len: guard.memory.len(),
                    capacity: guard.memory.capacity(),
                });
            }
        }
        Ok(())
    }

    /// Invariants relating the state before a mutation to the state after
    pub fn check_transition(&self, before: &Fingerprint) -> Result<(), InvariantViolation> {
        if self.revision < before.revision {
            return Err(InvariantViolation::RevisionNotIncreasing {
                before: before.revision,
                after: self.revision,
            });
        }
        if self.state != before.state && !before.state.can_transition_to(self.state) {
            return Err(InvariantViolation::IllegalTransition {
                from: before.state,
                to: self.state,
            });
        }
        if let Some(reverted) = before
            .solved
            .iter()
            .find(|id| !self.puzzles.iter().any(|p| &p.id == *id && p.is_solved()))
        {
            return Err(InvariantViolation::SolvedReverted(*reverted));
        }
        for (id, role) in &before.roles {
            if let Some(player) = self.players.get(id) {
                if player.role() != *role {
                    return Err(InvariantViolation::RoleChanged(*id));
                }
            }
        }
        self.check_state()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::errors::InvariantViolation;
    use crate::domain::session::tests::active_session;
    use heist_types::Role;

    #[test]
    fn test_healthy_session_passes() {
        let (mut session, now) = active_session(8, 4);
        let before = session.fingerprint();
        session.join(Role::Hacker, now).unwrap();
        assert!(session.check_transition(&before).is_ok());
    }

    #[test]
    fn test_revision_regression_detected() {
        let (mut session, _) = active_session(8, 4);
        let before = session.fingerprint();
        session.revision -= 1;
        assert_eq!(
            session.check_transition(&before),
            Err(InvariantViolation::RevisionNotIncreasing {
                before: before.revision,
                after: before.revision - 1,
            })
        );
    }

    #[test]
    fn test_removed_puzzle_counts_as_reverted() {
        let (mut session, _) = active_session(8, 4);
        let id = session.puzzles[0].id;
        session.puzzles[0].mark_solved(heist_types::PlayerId::new());
        let before = session.fingerprint();
        session.puzzles.clear();
        assert_eq!(
            session.check_transition(&before),
            Err(InvariantViolation::SolvedReverted(id))
        );
    }

    #[test]
    fn test_illegal_state_change_detected() {
        let (mut session, _) = active_session(8, 4);
        session.fail();
        let before = session.fingerprint();
        session.state = heist_types::SessionState::Active;
        assert!(matches!(
            session.check_transition(&before),
            Err(InvariantViolation::IllegalTransition { .. })
        ));
    }
}
