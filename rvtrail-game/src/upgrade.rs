//! Spending materials on the RV and the weapon.
use serde::{Deserialize, Serialize};

use crate::config::UpgradeCfg;
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeOutcome {
    /// Materials were spent and the item reached `level`
    Upgraded { level: u32 },
    /// Not enough materials; nothing changed
    InsufficientMaterials { have: i32, need: i32 },
}

impl UpgradeOutcome {
    #[must_use]
    pub const fn applied(self) -> bool {
        matches!(self, Self::Upgraded { .. })
    }
}

#[must_use]
pub const fn can_upgrade_vehicle(state: &GameState, cfg: &UpgradeCfg) -> bool {
    state.materials >= cfg.vehicle_cost
}

#[must_use]
pub const fn can_upgrade_weapon(state: &GameState, cfg: &UpgradeCfg) -> bool {
    state.materials >= cfg.weapon_cost
}

/// Reinforce the RV: one level up, more power and more armour.
pub fn upgrade_vehicle(state: &mut GameState, cfg: &UpgradeCfg) -> UpgradeOutcome {
    if !can_upgrade_vehicle(state, cfg) {
        return UpgradeOutcome::InsufficientMaterials {
            have: state.materials,
            need: cfg.vehicle_cost,
        };
    }
    state.materials -= cfg.vehicle_cost;
    state.rv.level = state.rv.level.saturating_add(1);
    state.rv.power = state.rv.power.saturating_add(cfg.vehicle_power);
    state.rv.defense = state.rv.defense.saturating_add(cfg.vehicle_defense);
    state.log.push(format!(
        "The RV is now Lv.{}. Power and armour both improved.",
        state.rv.level
    ));
    log::debug!("rv upgraded to level {}", state.rv.level);
    UpgradeOutcome::Upgraded {
        level: state.rv.level,
    }
}

/// Reinforce the weapon: one level up and more damage.
pub fn upgrade_weapon(state: &mut GameState, cfg: &UpgradeCfg) -> UpgradeOutcome {
    if !can_upgrade_weapon(state, cfg) {
        return UpgradeOutcome::InsufficientMaterials {
            have: state.materials,
            need: cfg.weapon_cost,
        };
    }
    state.materials -= cfg.weapon_cost;
    state.weapon.level = state.weapon.level.saturating_add(1);
    state.weapon.damage = state.weapon.damage.saturating_add(cfg.weapon_damage);
    state.log.push(format!(
        "Your {} has been reinforced, now Lv.{}.",
        state.weapon.name, state.weapon.level
    ));
    log::debug!("weapon upgraded to level {}", state.weapon.level);
    UpgradeOutcome::Upgraded {
        level: state.weapon.level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::{CityCatalog, CityKey};
    use crate::config::RulesConfig;

    fn state_with(materials: i32) -> (GameState, UpgradeCfg) {
        let rules = RulesConfig::default();
        let mut state = GameState::new(CityKey::Xian, &rules, &CityCatalog::load_from_static());
        state.materials = materials;
        (state, rules.upgrades)
    }

    #[test]
    fn vehicle_upgrade_is_gated_on_cost() {
        let (mut state, cfg) = state_with(29);
        let before = state.clone();
        let outcome = upgrade_vehicle(&mut state, &cfg);
        assert_eq!(
            outcome,
            UpgradeOutcome::InsufficientMaterials { have: 29, need: 30 }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn vehicle_upgrade_spends_and_improves() {
        let (mut state, cfg) = state_with(30);
        let outcome = upgrade_vehicle(&mut state, &cfg);
        assert_eq!(outcome, UpgradeOutcome::Upgraded { level: 2 });
        assert_eq!(state.materials, 0);
        assert_eq!(state.rv.power, 15);
        assert_eq!(state.rv.defense, 15);
        assert!(state.log.latest().unwrap().contains("Lv.2"));
        assert!(!upgrade_vehicle(&mut state, &cfg).applied());
    }

    #[test]
    fn weapon_upgrade_rechecks_each_call() {
        let (mut state, cfg) = state_with(45);
        assert!(upgrade_weapon(&mut state, &cfg).applied());
        assert!(upgrade_weapon(&mut state, &cfg).applied());
        assert!(!upgrade_weapon(&mut state, &cfg).applied());
        assert_eq!(state.materials, 5);
        assert_eq!(state.weapon.level, 3);
        assert_eq!(state.weapon.damage, 35);
        assert!(state.log.latest().unwrap().contains("crossbow"));
    }

    #[test]
    fn upgrades_keep_log_bounded() {
        let (mut state, cfg) = state_with(20 * 15);
        for _ in 0..15 {
            upgrade_weapon(&mut state, &cfg);
        }
        assert_eq!(state.log.len(), state.log.capacity());
    }
}
