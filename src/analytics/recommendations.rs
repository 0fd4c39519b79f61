//! Maintenance and recycling rule tables.
//!
//! Maintenance rules are independent: every rule whose condition holds
//! contributes its action, in table order. Recycling is exclusive and
//! evaluated from the healthiest band down.

use serde::Serialize;

use crate::config::defaults::{
    CONTINUE_USE_LIFE_SCORE, HOT_THERMAL_SCORE, HIGH_AVG_POWER_WATTS, HIGH_SM_PCT,
    PARTIAL_RECYCLE_LIFE_SCORE,
};
use crate::types::{RecyclingCategory, TelemetryRecord};

/// A single maintenance rule outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MaintenanceAction {
    CleanCooling,
    LowerPowerLimit,
    ReduceOverclock,
}

impl MaintenanceAction {
    pub const fn message(self) -> &'static str {
        match self {
            Self::CleanCooling => "Clean fans, reapply thermal paste",
            Self::LowerPowerLimit => "Lower power limit or increase cooling",
            Self::ReduceOverclock => "Reduce overclock or enforce power cap",
        }
    }
}

/// Condition → action table.
const MAINTENANCE_RULES: [(fn(&TelemetryRecord) -> bool, MaintenanceAction); 3] = [
    (|t| t.thermal_score > HOT_THERMAL_SCORE, MaintenanceAction::CleanCooling),
    (|t| t.avg_power_watts > HIGH_AVG_POWER_WATTS, MaintenanceAction::LowerPowerLimit),
    (
        |t| t.avg_sm_pct > HIGH_SM_PCT && t.is_overclocked(),
        MaintenanceAction::ReduceOverclock,
    ),
];

/// All maintenance actions that apply to a device, in table order.
pub fn maintenance_actions(t: &TelemetryRecord) -> Vec<MaintenanceAction> {
    MAINTENANCE_RULES
        .iter()
        .filter(|(condition, _)| condition(t))
        .map(|(_, action)| *action)
        .collect()
}

/// Comma-joined action messages, or `"None"` when nothing fires.
pub fn maintenance_summary(t: &TelemetryRecord) -> String {
    let actions = maintenance_actions(t);
    if actions.is_empty() {
        return "None".to_string();
    }
    actions
        .iter()
        .map(|a| a.message())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Recycling band for a life score.
pub fn recycling_category(life_score: f64) -> RecyclingCategory {
    if life_score > CONTINUE_USE_LIFE_SCORE {
        RecyclingCategory::ContinueUse
    } else if life_score > PARTIAL_RECYCLE_LIFE_SCORE {
        RecyclingCategory::PartialRecycling
    } else {
        RecyclingCategory::Retire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rules_fire() {
        let t = TelemetryRecord {
            thermal_score: 18.0,
            avg_power_watts: 180.0,
            avg_sm_pct: 90.0,
            overclock_proxy: 0.0,
            ..Default::default()
        };
        assert!(maintenance_actions(&t).is_empty());
        assert_eq!(maintenance_summary(&t), "None");
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let t = TelemetryRecord {
            thermal_score: 25.0,
            avg_power_watts: 220.0,
            avg_sm_pct: 85.0,
            overclock_proxy: 1.0,
            ..Default::default()
        };
        assert_eq!(
            maintenance_summary(&t),
            "Clean fans, reapply thermal paste, Lower power limit or increase cooling, \
             Reduce overclock or enforce power cap"
        );
    }

    #[test]
    fn test_overclock_rule_needs_both_conditions() {
        let mut t = TelemetryRecord {
            avg_sm_pct: 71.0,
            overclock_proxy: 0.0,
            ..Default::default()
        };
        assert!(maintenance_actions(&t).is_empty());
        t.overclock_proxy = 1.0;
        assert_eq!(maintenance_actions(&t), vec![MaintenanceAction::ReduceOverclock]);
        t.avg_sm_pct = 70.0;
        assert!(maintenance_actions(&t).is_empty());
    }

    #[test]
    fn test_thermal_rule_monotonic() {
        let bases = [
            TelemetryRecord::default(),
            TelemetryRecord {
                avg_power_watts: 250.0,
                ..Default::default()
            },
            TelemetryRecord {
                avg_sm_pct: 90.0,
                overclock_proxy: 1.0,
                ..Default::default()
            },
        ];
        for base in bases {
            let mut previous: Vec<MaintenanceAction> = Vec::new();
            for step in 0..60 {
                let mut t = base;
                t.thermal_score = f64::from(step) * 0.5;
                let actions = maintenance_actions(&t);
                for a in &previous {
                    assert!(actions.contains(a), "raising thermal_score removed {a:?}");
                }
                if t.thermal_score > 18.0 {
                    assert!(actions.contains(&MaintenanceAction::CleanCooling));
                }
                previous = actions;
            }
        }
    }

    #[test]
    fn test_recycling_boundaries() {
        assert_eq!(recycling_category(100.0), RecyclingCategory::ContinueUse);
        assert_eq!(recycling_category(71.0), RecyclingCategory::ContinueUse);
        assert_eq!(recycling_category(70.0), RecyclingCategory::PartialRecycling);
        assert_eq!(recycling_category(41.0), RecyclingCategory::PartialRecycling);
        assert_eq!(recycling_category(40.0), RecyclingCategory::Retire);
        assert_eq!(recycling_category(0.0), RecyclingCategory::Retire);
    }

    #[test]
    fn test_recycling_total_over_range() {
        for i in 0..=1000 {
            let score = f64::from(i) / 10.0;
            let c = recycling_category(score);
            let expected = if score > 70.0 {
                RecyclingCategory::ContinueUse
            } else if score > 40.0 {
                RecyclingCategory::PartialRecycling
            } else {
                RecyclingCategory::Retire
            };
            assert_eq!(c, expected);
        }
    }
}
