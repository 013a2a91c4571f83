use serde::Serialize;

use super::error::CalcError;

/// How thresholds are compared while scanning a table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierScan {
    /// Thresholds strictly decreasing; a tier matches when `x >= threshold`.
    AtLeast,
    /// Thresholds strictly increasing; a tier matches when `x < threshold`.
    Below,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Tier {
    pub threshold: f64,
    pub label: &'static str,
    pub value: f64,
}

impl Tier {
    pub const fn new(threshold: f64, label: &'static str, value: f64) -> Self {
        Self {
            threshold,
            label,
            value,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Fallback {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMatch {
    pub label: &'static str,
    pub value: f64,
    /// `None` when the fallback tier matched.
    pub index: Option<usize>,
}

/// Half-open interval `[lower, upper)` covered by one tier.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub label: &'static str,
    pub index: Option<usize>,
}

impl Band {
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x < self.upper
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TierTable {
    pub name: &'static str,
    pub scan: TierScan,
    pub tiers: &'static [Tier],
    pub fallback: Fallback,
}

impl TierTable {
    pub const fn new(
        name: &'static str,
        scan: TierScan,
        tiers: &'static [Tier],
        fallback_label: &'static str,
        fallback_value: f64,
    ) -> Self {
        Self {
            name,
            scan,
            tiers,
            fallback: Fallback {
                label: fallback_label,
                value: fallback_value,
            },
        }
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        let invalid = |reason: String| CalcError::InvalidTierTable {
            table: self.name.to_string(),
            reason,
        };

        if self.tiers.is_empty() {
            return Err(invalid("needs at least one tier".to_string()));
        }
        for tier in self.tiers {
            if !tier.threshold.is_finite() {
                return Err(invalid(format!("tier `{}` has a non-finite threshold", tier.label)));
            }
            if !tier.value.is_finite() {
                return Err(invalid(format!("tier `{}` has a non-finite value", tier.label)));
            }
        }
        if !self.fallback.value.is_finite() {
            return Err(invalid("fallback has a non-finite value".to_string()));
        }
        for pair in self.tiers.windows(2) {
            let ordered = match self.scan {
                TierScan::AtLeast => pair[0].threshold > pair[1].threshold,
                TierScan::Below => pair[0].threshold < pair[1].threshold,
            };
            if !ordered {
                return Err(invalid(format!(
                    "tiers `{}` and `{}` overlap or are out of order",
                    pair[0].label, pair[1].label
                )));
            }
        }
        Ok(())
    }

    pub fn classify(&self, x: f64) -> TierMatch {
        for (index, tier) in self.tiers.iter().enumerate() {
            let hit = match self.scan {
                TierScan::AtLeast => x >= tier.threshold,
                TierScan::Below => x < tier.threshold,
            };
            if hit {
                return TierMatch {
                    label: tier.label,
                    value: tier.value,
                    index: Some(index),
                };
            }
        }
        TierMatch {
            label: self.fallback.label,
            value: self.fallback.value,
            index: None,
        }
    }

    pub fn bands(&self) -> Vec<Band> {
        let mut bands = Vec::with_capacity(self.tiers.len() + 1);
        match self.scan {
            TierScan::AtLeast => {
                let mut upper = f64::INFINITY;
                for (index, tier) in self.tiers.iter().enumerate() {
                    bands.push(Band {
                        lower: tier.threshold,
                        upper,
                        label: tier.label,
                        index: Some(index),
                    });
                    upper = tier.threshold;
                }
                bands.push(Band {
                    lower: f64::NEG_INFINITY,
                    upper,
                    label: self.fallback.label,
                    index: None,
                });
            }
            TierScan::Below => {
                let mut lower = f64::NEG_INFINITY;
                for (index, tier) in self.tiers.iter().enumerate() {
                    bands.push(Band {
                        lower,
                        upper: tier.threshold,
                        label: tier.label,
                        index: Some(index),
                    });
                    lower = tier.threshold;
                }
                bands.push(Band {
                    lower,
                    upper: f64::INFINITY,
                    label: self.fallback.label,
                    index: None,
                });
            }
        }
        bands
    }
}
