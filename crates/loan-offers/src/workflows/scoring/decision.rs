use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_STANDARD_THRESHOLD: f64 = 0.5;
pub const DEFAULT_HIGH_RECALL_THRESHOLD: f64 = 0.3;
pub const DEFAULT_VIP_PROMO_THRESHOLD: f64 = 0.8;

/// Probability cutoffs for each offer tier, loaded once from model metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    #[serde(default = "default_standard")]
    pub standard: f64,
    #[serde(default = "default_high_recall")]
    pub high_recall: f64,
    #[serde(default = "default_vip_promo")]
    pub vip_promo: f64,
}

fn default_standard() -> f64 {
    DEFAULT_STANDARD_THRESHOLD
}

fn default_high_recall() -> f64 {
    DEFAULT_HIGH_RECALL_THRESHOLD
}

fn default_vip_promo() -> f64 {
    DEFAULT_VIP_PROMO_THRESHOLD
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            standard: DEFAULT_STANDARD_THRESHOLD,
            high_recall: DEFAULT_HIGH_RECALL_THRESHOLD,
            vip_promo: DEFAULT_VIP_PROMO_THRESHOLD,
        }
    }
}

impl ThresholdSet {
    /// Cutoff configured for an offer tier. `Tier::None` has no cutoff.
    pub fn cutoff(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::VipPromo => Some(self.vip_promo),
            Tier::Standard => Some(self.standard),
            Tier::HighRecall => Some(self.high_recall),
            Tier::None => None,
        }
    }

    /// Returns the first tier whose cutoff is not a probability in [0, 1].
    pub fn out_of_range(&self) -> Option<(Tier, f64)> {
        Tier::PRECEDENCE.into_iter().find_map(|tier| {
            self.cutoff(tier)
                .filter(|value| !(0.0..=1.0).contains(value))
                .map(|value| (tier, value))
        })
    }
}

/// Offer category assigned by threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    VipPromo,
    Standard,
    HighRecall,
    None,
}

impl Tier {
    /// Offer tiers from highest to lowest priority. `Tier::None` is the fallback.
    pub const PRECEDENCE: [Tier; 3] = [Tier::VipPromo, Tier::Standard, Tier::HighRecall];

    /// Wire key used by metadata thresholds and the template catalog.
    pub fn key(self) -> &'static str {
        match self {
            Tier::VipPromo => "vip_promo",
            Tier::Standard => "standard",
            Tier::HighRecall => "high_recall",
            Tier::None => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::VipPromo => "VIP Promo",
            Tier::Standard => "Standard",
            Tier::HighRecall => "High Recall",
            Tier::None => "No offer",
        }
    }

    pub fn is_offer(self) -> bool {
        !matches!(self, Tier::None)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-tier binary decisions, independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierDecisions {
    pub vip_promo: bool,
    pub standard: bool,
    pub high_recall: bool,
}

impl TierDecisions {
    pub fn get(&self, tier: Tier) -> bool {
        match tier {
            Tier::VipPromo => self.vip_promo,
            Tier::Standard => self.standard,
            Tier::HighRecall => self.high_recall,
            Tier::None => false,
        }
    }
}

/// Outcome of applying a [`ThresholdSet`] to one predicted probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub probability: f64,
    pub decision_standard: u8,
    pub decision_high_recall: u8,
    pub decision_vip_promo: u8,
    pub thresholds: ThresholdSet,
}

impl ScoringResult {
    pub fn decisions(&self) -> TierDecisions {
        TierDecisions {
            vip_promo: self.decision_vip_promo == 1,
            standard: self.decision_standard == 1,
            high_recall: self.decision_high_recall == 1,
        }
    }

    pub fn tier(&self) -> Tier {
        resolve_tier(self.decisions())
    }
}

/// Applies every tier cutoff to `probability`; a tier is satisfied when `probability >= cutoff`.
///
/// The caller guarantees `probability` lies in [0, 1].
pub fn decide(probability: f64, thresholds: &ThresholdSet) -> ScoringResult {
    let satisfied = |cutoff: f64| u8::from(probability >= cutoff);

    ScoringResult {
        probability,
        decision_standard: satisfied(thresholds.standard),
        decision_high_recall: satisfied(thresholds.high_recall),
        decision_vip_promo: satisfied(thresholds.vip_promo),
        thresholds: *thresholds,
    }
}

/// Picks the highest-priority satisfied tier: VIP promo, then standard, then high recall.
pub fn resolve_tier(decisions: TierDecisions) -> Tier {
    Tier::PRECEDENCE
        .into_iter()
        .find(|tier| decisions.get(*tier))
        .unwrap_or(Tier::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions(vip_promo: bool, standard: bool, high_recall: bool) -> TierDecisions {
        TierDecisions {
            vip_promo,
            standard,
            high_recall,
        }
    }

    #[test]
    fn decide_is_inclusive_at_each_boundary() {
        let thresholds = ThresholdSet::default();

        let at_standard = decide(0.5, &thresholds);
        assert_eq!(at_standard.decision_standard, 1);
        assert_eq!(at_standard.decision_high_recall, 1);
        assert_eq!(at_standard.decision_vip_promo, 0);

        let at_vip = decide(0.8, &thresholds);
        assert_eq!(at_vip.decision_vip_promo, 1);

        let just_below = decide(0.299_999, &thresholds);
        assert_eq!(just_below.decisions(), TierDecisions::default());
    }

    #[test]
    fn decide_evaluates_tiers_independently() {
        // A set where the "higher" tier has the lower cutoff still compares each tier on its own.
        let thresholds = ThresholdSet {
            standard: 0.9,
            high_recall: 0.1,
            vip_promo: 0.4,
        };

        let result = decide(0.5, &thresholds);
        assert_eq!(result.decisions(), decisions(true, false, true));
        assert_eq!(result.thresholds, thresholds);
    }

    #[test]
    fn resolve_tier_follows_fixed_precedence() {
        assert_eq!(resolve_tier(decisions(true, true, true)), Tier::VipPromo);
        assert_eq!(resolve_tier(decisions(false, true, true)), Tier::Standard);
        assert_eq!(resolve_tier(decisions(false, false, true)), Tier::HighRecall);
        assert_eq!(resolve_tier(decisions(false, false, false)), Tier::None);
        assert_eq!(resolve_tier(decisions(true, false, false)), Tier::VipPromo);
    }

    #[test]
    fn high_probability_resolves_to_vip_promo() {
        let result = decide(0.85, &ThresholdSet::default());
        assert_eq!(
            (
                result.decision_standard,
                result.decision_high_recall,
                result.decision_vip_promo
            ),
            (1, 1, 1)
        );
        assert_eq!(result.tier(), Tier::VipPromo);
    }

    #[test]
    fn mid_probability_resolves_to_high_recall() {
        let result = decide(0.45, &ThresholdSet::default());
        assert_eq!(
            (
                result.decision_standard,
                result.decision_high_recall,
                result.decision_vip_promo
            ),
            (0, 1, 0)
        );
        assert_eq!(result.tier(), Tier::HighRecall);
    }

    #[test]
    fn scoring_result_survives_wire_round_trip() {
        let result = decide(0.6180339887, &ThresholdSet::default());
        let encoded = serde_json::to_string(&result).expect("serializes");
        let decoded: ScoringResult = serde_json::from_str(&encoded).expect("parses");
        assert_eq!(decoded, result);

        let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
        assert_eq!(value["thresholds"]["vip_promo"], 0.8);
        assert_eq!(value["decision_standard"], 1);
    }

    #[test]
    fn thresholds_fill_missing_keys_with_defaults() {
        let parsed: ThresholdSet =
            serde_json::from_str(r#"{"standard": 0.55}"#).expect("thresholds parse");
        assert_eq!(parsed.standard, 0.55);
        assert_eq!(parsed.high_recall, DEFAULT_HIGH_RECALL_THRESHOLD);
        assert_eq!(parsed.vip_promo, DEFAULT_VIP_PROMO_THRESHOLD);
    }

    #[test]
    fn out_of_range_reports_offending_tier() {
        let thresholds = ThresholdSet {
            high_recall: 1.2,
            ..ThresholdSet::default()
        };
        assert_eq!(thresholds.out_of_range(), Some((Tier::HighRecall, 1.2)));
        assert_eq!(ThresholdSet::default().out_of_range(), None);
    }
}
