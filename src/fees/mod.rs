//! Fee Module
//!
//! `FeeParameters` carries the chain-native knobs a builder needs; `Fee`
//! pairs them with a display amount. `FeeModel` turns a provider's raw
//! quote into the fee options offered to the user.

pub mod model;

pub use model::*;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{units_to_decimal, Amount};

// =============================================================================
// Fee Parameters
// =============================================================================

/// Chain-native fee knobs, all in the chain's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeParameters {
    /// `limit * price` (legacy gas)
    Legacy { limit: u128, price: u128 },
    /// `limit * max_fee`, with `priority_fee` as the embedded tip
    PriorityBased {
        limit: u128,
        max_fee: u128,
        priority_fee: u128,
    },
    /// `Σ limits[i] * costs[i]` over independently priced resources
    ResourceBased { limits: Vec<u128>, costs: Vec<u128> },
}

impl FeeParameters {
    /// Total fee in smallest units. Saturates at `u128::MAX`.
    pub fn total_units(&self) -> u128 {
        match self {
            FeeParameters::Legacy { limit, price } => limit.saturating_mul(*price),
            FeeParameters::PriorityBased { limit, max_fee, .. } => limit.saturating_mul(*max_fee),
            FeeParameters::ResourceBased { limits, costs } => limits
                .iter()
                .zip(costs)
                .fold(0u128, |acc, (limit, cost)| acc.saturating_add(limit.saturating_mul(*cost))),
        }
    }

    /// Fee as a decimal of the fee currency: `total_units / 10^decimals`.
    pub fn calculate_fee(&self, decimals: u32) -> Decimal {
        units_to_decimal(self.total_units(), decimals)
    }

    /// Same parameters with a new gas limit, for use after a separate
    /// gas-estimation round trip. Resource-based parameters carry one limit
    /// per resource, so they are returned unchanged; see
    /// `changing_resource_limits`.
    pub fn changing_limit(&self, limit: u128) -> Self {
        match self {
            FeeParameters::Legacy { price, .. } => FeeParameters::Legacy { limit, price: *price },
            FeeParameters::PriorityBased {
                max_fee,
                priority_fee,
                ..
            } => FeeParameters::PriorityBased {
                limit,
                max_fee: *max_fee,
                priority_fee: *priority_fee,
            },
            FeeParameters::ResourceBased { .. } => self.clone(),
        }
    }

    pub fn changing_resource_limits(&self, limits: Vec<u128>) -> Self {
        match self {
            FeeParameters::ResourceBased { costs, .. } => FeeParameters::ResourceBased {
                limits,
                costs: costs.clone(),
            },
            _ => self.clone(),
        }
    }

    pub fn limit(&self) -> Option<u128> {
        match self {
            FeeParameters::Legacy { limit, .. } | FeeParameters::PriorityBased { limit, .. } => {
                Some(*limit)
            }
            FeeParameters::ResourceBased { .. } => None,
        }
    }
}

// =============================================================================
// Fee
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Amount,
    pub parameters: Option<FeeParameters>,
}

impl Fee {
    pub fn new(amount: Amount) -> Self {
        Self {
            amount,
            parameters: None,
        }
    }

    pub fn with_parameters(amount: Amount, parameters: FeeParameters) -> Self {
        Self {
            amount,
            parameters: Some(parameters),
        }
    }

    /// Recompute the fee for a new gas limit. Fees without parameters are
    /// returned unchanged.
    pub fn changing_limit(&self, limit: u128) -> Self {
        match &self.parameters {
            Some(params) => {
                let parameters = params.changing_limit(limit);
                let value = parameters.calculate_fee(self.amount.decimals());
                Fee {
                    amount: Amount {
                        currency: self.amount.currency.clone(),
                        value,
                    },
                    parameters: Some(parameters),
                }
            }
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Blockchain;
    use std::str::FromStr;

    #[test]
    fn test_legacy_fee_exact() {
        let params = FeeParameters::Legacy {
            limit: 21_000,
            price: 476_190_476_190,
        };
        assert_eq!(
            params.calculate_fee(18),
            Decimal::from_str("0.00999999999999").unwrap()
        );
    }

    #[test]
    fn test_priority_fee_uses_max_fee() {
        let params = FeeParameters::PriorityBased {
            limit: 21_000,
            max_fee: 100,
            priority_fee: 2,
        };
        assert_eq!(params.total_units(), 2_100_000);
    }

    #[test]
    fn test_resource_fee_sums_resources() {
        let params = FeeParameters::ResourceBased {
            limits: vec![118, 408, 1_000_000],
            costs: vec![2, 3, 1],
        };
        assert_eq!(params.total_units(), 118 * 2 + 408 * 3 + 1_000_000);
    }

    #[test]
    fn test_overflow_saturates() {
        let params = FeeParameters::Legacy {
            limit: u128::MAX,
            price: u128::MAX,
        };
        assert_eq!(params.total_units(), u128::MAX);
        assert_eq!(params.calculate_fee(0), Decimal::MAX);
        // Large but representable after scaling down.
        assert!(params.calculate_fee(18) > Decimal::ZERO);
    }

    #[test]
    fn test_changing_limit_keeps_prices() {
        let params = FeeParameters::PriorityBased {
            limit: 21_000,
            max_fee: 10,
            priority_fee: 1,
        };
        let changed = params.changing_limit(50_000);
        assert_eq!(changed.limit(), Some(50_000));
        assert_eq!(changed.total_units(), 500_000);
        assert_eq!(params.limit(), Some(21_000));
    }

    #[test]
    fn test_fee_changing_limit_recomputes_amount() {
        let params = FeeParameters::Legacy { limit: 21_000, price: 1_000_000_000 };
        let fee = Fee::with_parameters(
            Amount::coin(Blockchain::Ethereum, params.calculate_fee(18)),
            params,
        );
        let changed = fee.changing_limit(42_000);
        assert_eq!(changed.amount.value, Decimal::from_str("0.000042").unwrap());
    }
}
