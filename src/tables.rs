use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::accounting::Credit;
use crate::error::{Result, TaxError};
use crate::tax::{BracketTable, Jurisdiction, Money, Percentage, Province, TaxBracket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxYear(pub u16);

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const REFERENCE_YEAR: TaxYear = TaxYear(2021);

const FEDERAL_2021: [TaxBracket; 5] = [
    TaxBracket::new(Some(dec!(49020)), dec!(15)),
    TaxBracket::new(Some(dec!(98040)), dec!(20.5)),
    TaxBracket::new(Some(dec!(151978)), dec!(26)),
    TaxBracket::new(Some(dec!(216511)), dec!(29)),
    TaxBracket::new(None, dec!(33)),
];

const ONTARIO_2021: [TaxBracket; 5] = [
    TaxBracket::new(Some(dec!(45142)), dec!(5.05)),
    TaxBracket::new(Some(dec!(90287)), dec!(9.15)),
    TaxBracket::new(Some(dec!(150000)), dec!(11.16)),
    TaxBracket::new(Some(dec!(220000)), dec!(12.16)),
    TaxBracket::new(None, dec!(13.16)),
];

// Reference amounts only, not the legal values for every credit.
const CREDITS_2021: [(Credit, CreditValue); 12] = [
    (Credit::BasicPersonal, CreditValue::new(dec!(13808), CreditKind::NonRefundable)),
    (Credit::Spouse, CreditValue::new(dec!(13808), CreditKind::NonRefundable)),
    (Credit::Caregiver, CreditValue::new(dec!(7348), CreditKind::NonRefundable)),
    (Credit::EligibleDependant, CreditValue::new(dec!(13808), CreditKind::NonRefundable)),
    (Credit::CanadaEmployment, CreditValue::new(dec!(1257), CreditKind::NonRefundable)),
    (Credit::Disability, CreditValue::new(dec!(8662), CreditKind::NonRefundable)),
    (Credit::InterestDividends, CreditValue::new(dec!(0), CreditKind::NonRefundable)),
    (Credit::PensionIncome, CreditValue::new(dec!(2000), CreditKind::NonRefundable)),
    (Credit::Education, CreditValue::new(dec!(0), CreditKind::NonRefundable)),
    (Credit::GstHstCredit, CreditValue::new(dec!(456), CreditKind::Refundable)),
    (Credit::ChildBenefit, CreditValue::new(dec!(6833), CreditKind::Refundable)),
    (Credit::WorkingIncomeBenefit, CreditValue::new(dec!(1395), CreditKind::Refundable)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    /// Worth `amount` times the lowest federal rate
    NonRefundable,
    /// Worth `amount` as-is
    Refundable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditValue {
    pub amount: Money,
    pub kind: CreditKind,
}

impl CreditValue {
    pub const fn new(amount: Money, kind: CreditKind) -> Self {
        CreditValue { amount, kind }
    }

    pub fn value(&self, lowest_rate: Percentage) -> Money {
        match self.kind {
            CreditKind::NonRefundable => self.amount * lowest_rate / Decimal::ONE_HUNDRED,
            CreditKind::Refundable => self.amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditTable {
    values: BTreeMap<Credit, CreditValue>,
}

impl CreditTable {
    pub fn new(values: BTreeMap<Credit, CreditValue>) -> Result<Self> {
        CreditTable { values }.validated()
    }

    pub fn validated(self) -> Result<Self> {
        for (credit, value) in &self.values {
            check_credit_value(*credit, value)?;
        }
        Ok(self)
    }

    pub fn get(&self, credit: Credit) -> Option<&CreditValue> {
        self.values.get(&credit)
    }

    /// Adds or replaces one entry, under the same check as a loaded table.
    pub fn insert(&mut self, credit: Credit, value: CreditValue) -> Result<Option<CreditValue>> {
        check_credit_value(credit, &value)?;
        Ok(self.values.insert(credit, value))
    }
}

fn check_credit_value(credit: Credit, value: &CreditValue) -> Result<()> {
    if value.amount < Decimal::ZERO {
        return Err(TaxError::configuration(format!(
            "credit value for `{}` cannot be negative, got {}",
            credit.key(),
            value.amount
        )));
    }
    Ok(())
}

/// Read-only registry of bracket and credit tables, keyed by tax year.
/// Built once at startup and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct TaxTables {
    brackets: BTreeMap<(TaxYear, Jurisdiction), BracketTable>,
    credits: BTreeMap<TaxYear, CreditTable>,
}

impl TaxTables {
    /// Federal and Ontario tables for the 2021 tax year.
    pub fn reference() -> Result<Self> {
        let mut tables = TaxTables::default();
        tables.insert_brackets(
            REFERENCE_YEAR,
            BracketTable::new(Jurisdiction::Federal, FEDERAL_2021.to_vec())?,
        );
        tables.insert_brackets(
            REFERENCE_YEAR,
            BracketTable::new(
                Jurisdiction::Provincial(Province::Ontario),
                ONTARIO_2021.to_vec(),
            )?,
        );
        tables.insert_credits(
            REFERENCE_YEAR,
            CreditTable::new(CREDITS_2021.iter().copied().collect())?,
        );
        Ok(tables)
    }

    pub fn insert_brackets(&mut self, year: TaxYear, table: BracketTable) -> Option<BracketTable> {
        self.brackets.insert((year, table.jurisdiction()), table)
    }

    pub fn insert_credits(&mut self, year: TaxYear, table: CreditTable) -> Option<CreditTable> {
        self.credits.insert(year, table)
    }

    pub fn bracket_table(&self, year: TaxYear, jurisdiction: Jurisdiction) -> Result<&BracketTable> {
        self.brackets.get(&(year, jurisdiction)).ok_or_else(|| {
            TaxError::configuration(format!(
                "no {} bracket table for tax year {}",
                jurisdiction, year
            ))
        })
    }

    pub fn credit_values(&self, year: TaxYear) -> Result<&CreditTable> {
        self.credits.get(&year).ok_or_else(|| {
            TaxError::configuration(format!("no credit value table for tax year {}", year))
        })
    }
}
