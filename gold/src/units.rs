//! Thai gold weight units.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of gold; the baht weighs slightly differently for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoldKind {
    #[default]
    Bullion,
    Ornament,
}

impl GoldKind {
    /// Grams in one baht of this kind.
    pub fn grams_per_baht(&self) -> Decimal {
        match self {
            GoldKind::Bullion => Decimal::new(15_244, 3),
            GoldKind::Ornament => Decimal::new(1_516, 2),
        }
    }
}

impl FromStr for GoldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bullion" | "bar" => Ok(GoldKind::Bullion),
            "ornament" | "jewelry" => Ok(GoldKind::Ornament),
            other => Err(format!("unknown gold kind: {other}")),
        }
    }
}

/// Unit a weight is given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Baht,
    Gram,
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baht" => Ok(WeightUnit::Baht),
            "gram" | "grams" | "g" => Ok(WeightUnit::Gram),
            other => Err(format!("unknown weight unit: {other}")),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightUnit::Baht => f.write_str("baht"),
            WeightUnit::Gram => f.write_str("g"),
        }
    }
}

/// Convert baht weight to grams.
pub fn baht_to_grams(baht: Decimal, kind: GoldKind) -> Decimal {
    baht * kind.grams_per_baht()
}

/// Convert grams to baht weight.
pub fn grams_to_baht(grams: Decimal, kind: GoldKind) -> Decimal {
    grams / kind.grams_per_baht()
}

/// Express `weight` in baht.
pub fn to_baht(weight: Decimal, unit: WeightUnit, kind: GoldKind) -> Decimal {
    match unit {
        WeightUnit::Baht => weight,
        WeightUnit::Gram => grams_to_baht(weight, kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_baht_gram_conversion() {
        assert_eq!(baht_to_grams(dec!(1), GoldKind::Bullion), dec!(15.244));
        assert_eq!(baht_to_grams(dec!(2), GoldKind::Ornament), dec!(30.32));
        assert_eq!(grams_to_baht(dec!(15.244), GoldKind::Bullion), dec!(1));
        assert_eq!(to_baht(dec!(7.622), WeightUnit::Gram, GoldKind::Bullion), dec!(0.5));
        assert_eq!(to_baht(dec!(3), WeightUnit::Baht, GoldKind::Ornament), dec!(3));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("Baht".parse::<WeightUnit>().unwrap(), WeightUnit::Baht);
        assert_eq!("g".parse::<WeightUnit>().unwrap(), WeightUnit::Gram);
        assert!("tael".parse::<WeightUnit>().is_err());
        assert_eq!("ornament".parse::<GoldKind>().unwrap(), GoldKind::Ornament);
        assert_eq!(GoldKind::default(), GoldKind::Bullion);
    }
}
