//! Fee models per chain family.
//!
//! A provider returns a raw `FeeQuote`; the wallet's `FeeModel` maps it to
//! ordered fee options (slowest first).

use serde::{Deserialize, Serialize};

use super::{Fee, FeeParameters};
use crate::types::{Amount, Blockchain, Currency};
use crate::utils::chain_config::KoinosConfig;

/// Raw fee data as fetched by a network provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeQuote {
    /// Ready-made totals in smallest units.
    Fixed { totals: Vec<u128> },
    /// Fee rates per virtual byte and the estimated transaction size.
    PerByte { rates: Vec<u128>, vsize: u64 },
    Gas { limit: u128, prices: Vec<u128> },
    Eip1559 {
        limit: u128,
        base_fee: u128,
        priority_fees: Vec<u128>,
    },
    Resource { limits: Vec<u128>, costs: Vec<u128> },
}

pub trait FeeModel: Send + Sync {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee>;
}

fn coin_fee(blockchain: Blockchain, units: u128, parameters: Option<FeeParameters>) -> Fee {
    Fee {
        amount: Amount::from_smallest_unit(Currency::Coin { blockchain }, units),
        parameters,
    }
}

fn from_parameters(blockchain: Blockchain, parameters: FeeParameters) -> Fee {
    coin_fee(blockchain, parameters.total_units(), Some(parameters))
}

/// Models that only understand ready-made totals and per-byte rates.
fn simple_fees(blockchain: Blockchain, quote: &FeeQuote) -> Vec<Fee> {
    match quote {
        FeeQuote::Fixed { totals } => totals
            .iter()
            .map(|total| coin_fee(blockchain, *total, None))
            .collect(),
        FeeQuote::PerByte { rates, vsize } => rates
            .iter()
            .map(|rate| coin_fee(blockchain, rate.saturating_mul(u128::from(*vsize)), None))
            .collect(),
        _ => Vec::new(),
    }
}

/// Bitcoin family: per-vbyte rates, no builder parameters.
#[derive(Debug, Clone)]
pub struct UtxoFeeModel {
    pub blockchain: Blockchain,
}

impl FeeModel for UtxoFeeModel {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee> {
        simple_fees(self.blockchain, quote)
    }
}

/// EVM family: legacy gas price or EIP-1559.
#[derive(Debug, Clone)]
pub struct EvmFeeModel {
    pub blockchain: Blockchain,
}

impl FeeModel for EvmFeeModel {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee> {
        match quote {
            FeeQuote::Gas { limit, prices } => prices
                .iter()
                .map(|price| {
                    from_parameters(
                        self.blockchain,
                        FeeParameters::Legacy {
                            limit: *limit,
                            price: *price,
                        },
                    )
                })
                .collect(),
            FeeQuote::Eip1559 {
                limit,
                base_fee,
                priority_fees,
            } => priority_fees
                .iter()
                .map(|priority_fee| {
                    // 2 * base fee + tip
                    let max_fee = base_fee.saturating_mul(2).saturating_add(*priority_fee);
                    from_parameters(
                        self.blockchain,
                        FeeParameters::PriorityBased {
                            limit: *limit,
                            max_fee,
                            priority_fee: *priority_fee,
                        },
                    )
                })
                .collect(),
            other => simple_fees(self.blockchain, other),
        }
    }
}

/// Tron: bandwidth and energy, both quoted by the provider.
#[derive(Debug, Clone)]
pub struct TronFeeModel {
    pub blockchain: Blockchain,
}

impl FeeModel for TronFeeModel {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee> {
        match quote {
            FeeQuote::Resource { limits, costs } => vec![from_parameters(
                self.blockchain,
                FeeParameters::ResourceBased {
                    limits: limits.clone(),
                    costs: costs.clone(),
                },
            )],
            other => simple_fees(self.blockchain, other),
        }
    }
}

/// Koinos: fixed per-transfer resource limits priced by chain-supplied costs.
#[derive(Debug, Clone)]
pub struct KoinosFeeModel {
    pub blockchain: Blockchain,
    pub config: KoinosConfig,
}

impl KoinosFeeModel {
    pub fn transfer_limits(&self) -> Vec<u128> {
        vec![
            u128::from(self.config.max_disk_storage_per_transfer),
            u128::from(self.config.max_network_bandwidth_per_transfer),
            u128::from(self.config.max_compute_bandwidth_per_transfer),
        ]
    }
}

impl FeeModel for KoinosFeeModel {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee> {
        match quote {
            FeeQuote::Resource { costs, .. } => vec![from_parameters(
                self.blockchain,
                FeeParameters::ResourceBased {
                    limits: self.transfer_limits(),
                    costs: costs.clone(),
                },
            )],
            other => simple_fees(self.blockchain, other),
        }
    }
}

/// Chia and Internet Computer: flat totals.
#[derive(Debug, Clone)]
pub struct FlatFeeModel {
    pub blockchain: Blockchain,
}

impl FeeModel for FlatFeeModel {
    fn make_fees(&self, quote: &FeeQuote) -> Vec<Fee> {
        simple_fees(self.blockchain, quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_utxo_per_byte() {
        let model = UtxoFeeModel { blockchain: Blockchain::Bitcoin };
        let fees = model.make_fees(&FeeQuote::PerByte { rates: vec![2, 10], vsize: 141 });
        assert_eq!(fees.len(), 2);
        assert_eq!(fees[1].amount.value, Decimal::from_str("0.0000141").unwrap());
        assert!(fees[0].parameters.is_none());
    }

    #[test]
    fn test_eip1559_max_fee() {
        let model = EvmFeeModel { blockchain: Blockchain::Polygon };
        let fees = model.make_fees(&FeeQuote::Eip1559 {
            limit: 21_000,
            base_fee: 100,
            priority_fees: vec![7],
        });
        assert_eq!(
            fees[0].parameters,
            Some(FeeParameters::PriorityBased { limit: 21_000, max_fee: 207, priority_fee: 7 })
        );
    }

    #[test]
    fn test_koinos_uses_configured_limits() {
        let model = KoinosFeeModel {
            blockchain: Blockchain::Koinos,
            config: KoinosConfig::default(),
        };
        let fees = model.make_fees(&FeeQuote::Resource { limits: vec![], costs: vec![1, 1, 1] });
        assert_eq!(fees[0].parameters.as_ref().map(|p| p.total_units()), Some(118 + 408 + 1_000_000));
    }

    #[test]
    fn test_unsupported_quote_yields_nothing() {
        let model = UtxoFeeModel { blockchain: Blockchain::Bitcoin };
        assert!(model.make_fees(&FeeQuote::Gas { limit: 1, prices: vec![1] }).is_empty());
    }
}
