//! Mark a gold holding to market.

use goldrate_common::{Currency, Money};
use goldrate_fx::ExchangeRate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ValuationError, ValuationResult};
use crate::fetcher::GoldPriceSnapshot;
use crate::units::{to_baht, GoldKind, WeightUnit};

/// Gold someone holds, and what they paid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub weight: Decimal,
    pub unit: WeightUnit,
    #[serde(default)]
    pub kind: GoldKind,
    /// Total purchase cost in THB.
    pub cost_thb: Decimal,
}

impl Holding {
    pub fn new(weight: Decimal, unit: WeightUnit, cost_thb: Decimal) -> Self {
        Self {
            weight,
            unit,
            kind: GoldKind::default(),
            cost_thb,
        }
    }

    pub fn with_kind(mut self, kind: GoldKind) -> Self {
        self.kind = kind;
        self
    }

    /// Weight in baht for this holding's kind.
    pub fn weight_baht(&self) -> Decimal {
        to_baht(self.weight, self.unit, self.kind)
    }

    fn validate(&self) -> ValuationResult<()> {
        if self.weight <= Decimal::ZERO {
            return Err(ValuationError::InvalidWeight(self.weight));
        }
        if self.cost_thb < Decimal::ZERO {
            return Err(ValuationError::InvalidCost(self.cost_thb));
        }
        Ok(())
    }
}

/// A holding valued at the dealer buy price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub weight_baht: Decimal,
    pub market_value_thb: Decimal,
    pub market_value_cny: Decimal,
    pub profit_thb: Decimal,
    /// `None` when the holding cost nothing.
    pub profit_pct: Option<Decimal>,
}

/// Value `holding` at what a dealer would pay today, converting to CNY at
/// the rate's sell side.
pub fn value_holding(
    holding: &Holding,
    prices: &GoldPriceSnapshot,
    rate: &ExchangeRate,
) -> ValuationResult<Valuation> {
    holding.validate()?;
    if prices.bullion_buy <= Decimal::ZERO {
        return Err(ValuationError::PriceUnavailable);
    }

    let weight_baht = holding.weight_baht();
    let market_value = weight_baht
        .checked_mul(prices.bullion_buy)
        .ok_or(ValuationError::Overflow)?;
    let market_thb = Money::new(market_value, Currency::thb()).round();
    let market_cny = rate.quote.convert_back_at_sell(&market_thb, &rate.pair)?;

    let profit_thb = market_thb
        .value
        .checked_sub(holding.cost_thb)
        .ok_or(ValuationError::Overflow)?;
    let profit_pct = if holding.cost_thb.is_zero() {
        None
    } else {
        let pct = profit_thb
            .checked_div(holding.cost_thb)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(ValuationError::Overflow)?;
        Some(pct.round_dp(2))
    };

    debug!(
        weight_baht = %weight_baht,
        market_value_thb = %market_thb.value,
        source = %rate.source,
        "Valued holding"
    );

    Ok(Valuation {
        weight_baht: weight_baht.round_dp(4),
        market_value_thb: market_thb.value,
        market_value_cny: market_cny.value,
        profit_thb,
        profit_pct,
    })
}
