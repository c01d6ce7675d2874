// Party/Lobby Manager: invite-code parties formed before a match.

use crate::domain::{PartyState, PlayerId};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct PartyBook {
    parties: BTreeMap<String, PartyState>,
}

impl PartyBook {
    pub fn new() -> Self {
        Self {
            parties: BTreeMap::new(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&PartyState> {
        self.parties.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// Creates a party led by `creator`. Blank codes and codes already in use are rejected so
    /// unrelated parties never merge.
    pub fn create(&mut self, creator: PlayerId, code: &str) -> Option<&PartyState> {
        let code = code.trim();
        if code.is_empty() || self.parties.contains_key(code) {
            return None;
        }

        let party = PartyState::new(code.to_string(), creator);
        Some(self.parties.entry(code.to_string()).or_insert(party))
    }

    /// Appends `joiner` to an existing party. Unknown codes and existing members are ignored.
    pub fn join(&mut self, joiner: PlayerId, code: &str) -> Option<&PartyState> {
        let party = self.parties.get_mut(code.trim())?;
        if party.has_member(joiner) {
            return None;
        }

        party.members.push(joiner);
        Some(party)
    }

    /// Returns the party only when `requester` is its recorded leader.
    pub fn led_by(&self, requester: PlayerId, code: &str) -> Option<&PartyState> {
        self.parties
            .get(code.trim())
            .filter(|party| party.leader == requester)
    }

    /// Drops `player_id` from every party it belongs to.
    ///
    /// A departing leader hands over to the first remaining member; a party left without
    /// members is disbanded. Returns the surviving parties whose membership changed.
    pub fn remove_member(&mut self, player_id: PlayerId) -> Vec<PartyState> {
        let mut changed = Vec::new();
        let mut disbanded = Vec::new();

        for (code, party) in self.parties.iter_mut() {
            if !party.has_member(player_id) {
                continue;
            }

            party.members.retain(|id| *id != player_id);
            match party.members.first() {
                None => disbanded.push(code.clone()),
                Some(next) => {
                    if party.leader == player_id {
                        party.leader = *next;
                    }
                    changed.push(party.clone());
                }
            }
        }

        for code in disbanded {
            self.parties.remove(&code);
        }

        changed
    }
}
