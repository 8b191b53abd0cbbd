use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxError};

/// Monetary amount in dollars
pub type Money = Decimal;

/// Percentage in [0, 100]
pub type Percentage = Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Province {
    #[serde(rename = "AB")]
    Alberta,
    #[serde(rename = "BC")]
    BritishColumbia,
    #[serde(rename = "MB")]
    Manitoba,
    #[serde(rename = "NB")]
    NewBrunswick,
    #[serde(rename = "NL")]
    NewfoundlandAndLabrador,
    #[serde(rename = "NS")]
    NovaScotia,
    #[serde(rename = "NT")]
    NorthwestTerritories,
    #[serde(rename = "NU")]
    Nunavut,
    #[serde(rename = "ON")]
    Ontario,
    #[serde(rename = "PE")]
    PrinceEdwardIsland,
    #[serde(rename = "QC")]
    Quebec,
    #[serde(rename = "SK")]
    Saskatchewan,
    #[serde(rename = "YT")]
    Yukon,
}

impl Province {
    pub const ALL: [Province; 13] = [
        Province::Alberta,
        Province::BritishColumbia,
        Province::Manitoba,
        Province::NewBrunswick,
        Province::NewfoundlandAndLabrador,
        Province::NovaScotia,
        Province::NorthwestTerritories,
        Province::Nunavut,
        Province::Ontario,
        Province::PrinceEdwardIsland,
        Province::Quebec,
        Province::Saskatchewan,
        Province::Yukon,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Province::Alberta => "AB",
            Province::BritishColumbia => "BC",
            Province::Manitoba => "MB",
            Province::NewBrunswick => "NB",
            Province::NewfoundlandAndLabrador => "NL",
            Province::NovaScotia => "NS",
            Province::NorthwestTerritories => "NT",
            Province::Nunavut => "NU",
            Province::Ontario => "ON",
            Province::PrinceEdwardIsland => "PE",
            Province::Quebec => "QC",
            Province::Saskatchewan => "SK",
            Province::Yukon => "YT",
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Province {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_uppercase();
        Province::ALL
            .iter()
            .copied()
            .find(|p| p.code() == code)
            .ok_or_else(|| TaxError::validation(format!("unknown province code `{}`", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Jurisdiction {
    Federal,
    Provincial(Province),
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jurisdiction::Federal => f.write_str("federal"),
            Jurisdiction::Provincial(province) => write!(f, "provincial ({})", province),
        }
    }
}

/// One tier of a progressive table. `upper_bound` is inclusive; `None` means unbounded.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TaxBracket {
    #[serde(default)]
    pub upper_bound: Option<Money>,

    #[serde(alias = "percentage")]
    pub rate: Percentage,
}

impl TaxBracket {
    pub const fn new(upper_bound: Option<Money>, rate: Percentage) -> TaxBracket {
        TaxBracket { upper_bound, rate }
    }

    fn compute_tax(&self, lower_bound: Money, income: Money) -> Money {
        let top = match self.upper_bound {
            Some(upper) => income.min(upper),
            None => income,
        };
        let portion_of_income = (top - lower_bound).max(Decimal::ZERO);
        portion_of_income * self.rate / Decimal::ONE_HUNDRED
    }
}

/// Ordered, validated bracket sequence for one jurisdiction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    jurisdiction: Jurisdiction,
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    /// Validates that the brackets cover [0, ∞) with strictly increasing
    /// bounds and non-decreasing rates.
    pub fn new(jurisdiction: Jurisdiction, brackets: Vec<TaxBracket>) -> Result<Self> {
        let invalid = |reason: String| {
            TaxError::configuration(format!("{} bracket table: {}", jurisdiction, reason))
        };

        let last = match brackets.last() {
            Some(last) => last,
            None => return Err(invalid("no brackets".to_string())),
        };
        if let Some(bound) = last.upper_bound {
            return Err(invalid(format!(
                "last bracket must be unbounded, found upper bound {}",
                bound
            )));
        }

        let mut previous_bound = Decimal::ZERO;
        let mut previous_rate: Option<Percentage> = None;
        for (i, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE_HUNDRED {
                return Err(invalid(format!(
                    "bracket {} rate {} is outside [0, 100]",
                    i, bracket.rate
                )));
            }
            if let Some(rate) = previous_rate {
                if bracket.rate < rate {
                    return Err(invalid(format!(
                        "bracket {} rate {} is lower than the previous rate {}",
                        i, bracket.rate, rate
                    )));
                }
            }
            previous_rate = Some(bracket.rate);

            if i + 1 == brackets.len() {
                break;
            }
            match bracket.upper_bound {
                Some(bound) if bound > previous_bound => previous_bound = bound,
                Some(bound) => {
                    return Err(invalid(format!(
                        "bracket {} upper bound {} does not exceed {}",
                        i, bound, previous_bound
                    )))
                }
                None => return Err(invalid(format!("bracket {} is unbounded but not last", i))),
            }
        }

        Ok(BracketTable {
            jurisdiction,
            brackets,
        })
    }

    pub fn jurisdiction(&self) -> Jurisdiction {
        self.jurisdiction
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Rate of the first tier, used to value non-refundable credits.
    pub fn lowest_rate(&self) -> Percentage {
        self.brackets
            .first()
            .map(|b| b.rate)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Unrounded tax on an amount and the rate of the bracket containing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxOwed {
    pub tax: Money,
    pub marginal_rate: Percentage,
}

impl TaxOwed {
    pub fn average_rate_percent(&self, taxable_income: Money) -> Percentage {
        if taxable_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.tax / taxable_income * Decimal::ONE_HUNDRED
    }
}

/// Applies `table` to `taxable_income`. An amount sitting exactly on a
/// bound is taxed entirely in the lower tier.
pub fn compute_tax(taxable_income: Money, table: &BracketTable) -> TaxOwed {
    let mut owed = TaxOwed {
        tax: Decimal::ZERO,
        marginal_rate: table.lowest_rate(),
    };
    if taxable_income <= Decimal::ZERO {
        return owed;
    }

    let mut lower_bound = Decimal::ZERO;
    for bracket in table.brackets() {
        owed.tax += bracket.compute_tax(lower_bound, taxable_income);
        owed.marginal_rate = bracket.rate;

        match bracket.upper_bound {
            Some(upper) if taxable_income > upper => lower_bound = upper,
            _ => break,
        }
    }

    owed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TaxTables;
    use crate::tables::TaxYear;
    use rust_decimal_macros::dec;

    fn federal_2021() -> BracketTable {
        TaxTables::reference()
            .unwrap()
            .bracket_table(TaxYear(2021), Jurisdiction::Federal)
            .unwrap()
            .clone()
    }

    #[test]
    fn zero_income_owes_nothing_at_first_rate() {
        let owed = compute_tax(Decimal::ZERO, &federal_2021());
        assert_eq!(owed.tax, Decimal::ZERO);
        assert_eq!(owed.marginal_rate, dec!(15));
    }

    #[test]
    fn negative_income_is_treated_as_zero() {
        let owed = compute_tax(dec!(-500), &federal_2021());
        assert_eq!(owed.tax, Decimal::ZERO);
        assert_eq!(owed.marginal_rate, dec!(15));
    }

    #[test]
    fn boundary_belongs_to_lower_bracket() {
        let table = federal_2021();

        let at_bound = compute_tax(dec!(49020), &table);
        assert_eq!(at_bound.tax, dec!(7353.00));
        assert_eq!(at_bound.marginal_rate, dec!(15));

        let above_bound = compute_tax(dec!(49021), &table);
        assert_eq!(above_bound.marginal_rate, dec!(20.5));
        assert_eq!(above_bound.tax, dec!(7353.205));
    }

    #[test]
    fn top_bracket_accumulates_every_tier() {
        let owed = compute_tax(dec!(300000), &federal_2021());
        let expected = dec!(49020) * dec!(0.15)
            + dec!(49020) * dec!(0.205)
            + dec!(53938) * dec!(0.26)
            + dec!(64533) * dec!(0.29)
            + dec!(83489) * dec!(0.33);
        assert_eq!(owed.tax, expected);
        assert_eq!(owed.marginal_rate, dec!(33));
    }

    #[test]
    fn cents_are_not_rounded_between_brackets() {
        let owed = compute_tax(dec!(98040.01), &federal_2021());
        assert_eq!(owed.tax, dec!(7353) + dec!(10049.1) + dec!(0.0026));
        assert_eq!(owed.marginal_rate, dec!(26));
    }

    #[test]
    fn average_rate_is_derived_from_tax() {
        let owed = compute_tax(dec!(49020), &federal_2021());
        assert_eq!(owed.average_rate_percent(dec!(49020)), dec!(15));
        assert_eq!(owed.average_rate_percent(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn table_rejects_bounded_last_bracket() {
        let err = BracketTable::new(
            Jurisdiction::Federal,
            vec![TaxBracket::new(Some(dec!(1000)), dec!(10))],
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn table_rejects_unsorted_bounds() {
        let err = BracketTable::new(
            Jurisdiction::Federal,
            vec![
                TaxBracket::new(Some(dec!(5000)), dec!(10)),
                TaxBracket::new(Some(dec!(4000)), dec!(12)),
                TaxBracket::new(None, dec!(20)),
            ],
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn table_rejects_regressive_rates() {
        let err = BracketTable::new(
            Jurisdiction::Provincial(Province::Ontario),
            vec![
                TaxBracket::new(Some(dec!(5000)), dec!(20)),
                TaxBracket::new(None, dec!(10)),
            ],
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn table_rejects_empty_and_mid_table_unbounded() {
        assert!(BracketTable::new(Jurisdiction::Federal, vec![]).is_err());
        assert!(BracketTable::new(
            Jurisdiction::Federal,
            vec![TaxBracket::new(None, dec!(10)), TaxBracket::new(None, dec!(20))],
        )
        .is_err());
    }

    #[test]
    fn table_rejects_rate_above_hundred() {
        assert!(BracketTable::new(
            Jurisdiction::Federal,
            vec![TaxBracket::new(None, dec!(100.5))],
        )
        .is_err());
    }

    #[test]
    fn province_codes_parse_case_insensitively() {
        assert_eq!("on".parse::<Province>().unwrap(), Province::Ontario);
        assert_eq!(" QC ".parse::<Province>().unwrap(), Province::Quebec);
        assert!("ZZ".parse::<Province>().is_err());
    }
}
