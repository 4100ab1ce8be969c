//! Battlefields: the two contested locations of a duel

use crate::core::{BattlefieldId, CardId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battlefield {
    pub id: BattlefieldId,

    /// The battlefield card itself (may carry an ability)
    pub card: Option<CardId>,

    /// Hidden card slot per player seat
    pub facedown: [Option<CardId>; 2],

    /// Units stationed here, per player seat
    pub units: [Vec<CardId>; 2],

    pub controller: Option<PlayerId>,

    /// Set while a showdown window over this battlefield is pending or open
    pub contested_by: Option<PlayerId>,
}

impl Battlefield {
    pub fn new(id: BattlefieldId) -> Self {
        Battlefield {
            id,
            card: None,
            facedown: [None, None],
            units: [Vec::new(), Vec::new()],
            controller: None,
            contested_by: None,
        }
    }

    pub fn units_of(&self, player: PlayerId) -> &[CardId] {
        &self.units[player.index()]
    }

    pub fn has_units(&self, player: PlayerId) -> bool {
        !self.units[player.index()].is_empty()
    }

    pub fn add_unit(&mut self, player: PlayerId, unit: CardId) {
        self.units[player.index()].push(unit);
    }

    /// Remove a unit from whichever side holds it
    pub fn remove_unit(&mut self, unit: CardId) -> bool {
        for side in self.units.iter_mut() {
            if let Some(pos) = side.iter().position(|&id| id == unit) {
                side.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn contains_unit(&self, unit: CardId) -> bool {
        self.units.iter().any(|side| side.contains(&unit))
    }

    pub fn is_controlled_by(&self, player: PlayerId) -> bool {
        self.controller == Some(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_per_side() {
        let mut bf = Battlefield::new(BattlefieldId::new(0));
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        bf.add_unit(p0, CardId::new(3));
        bf.add_unit(p1, CardId::new(4));
        bf.add_unit(p1, CardId::new(5));

        assert_eq!(bf.units_of(p0), &[CardId::new(3)]);
        assert_eq!(bf.units_of(p1).len(), 2);
        assert!(bf.contains_unit(CardId::new(5)));

        assert!(bf.remove_unit(CardId::new(4)));
        assert!(!bf.remove_unit(CardId::new(4)));
        assert_eq!(bf.units_of(p1), &[CardId::new(5)]);
    }

    #[test]
    fn test_control() {
        let mut bf = Battlefield::new(BattlefieldId::new(1));
        assert!(bf.controller.is_none());
        bf.controller = Some(PlayerId::new(1));
        assert!(bf.is_controlled_by(PlayerId::new(1)));
        assert!(!bf.is_controlled_by(PlayerId::new(0)));
    }
}
