use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::accounting::{Credit, CreditSelection, DeductionInput, IncomeInput};
use crate::error::Result;
use crate::suggestions::SuggestionConfig;
use crate::tables::{CreditValue, TaxTables, TaxYear, REFERENCE_YEAR};
use crate::tax::{BracketTable, Jurisdiction, Province, TaxBracket};

/// A tax return as described in the TOML input file
#[derive(Debug, Deserialize, Clone)]
pub struct TaxReturn {
    #[serde(default = "default_tax_year")]
    pub tax_year: TaxYear,

    #[serde(default = "default_province")]
    pub province: Province,

    #[serde(default)]
    pub income: IncomeInput,

    #[serde(default)]
    pub deductions: DeductionInput,

    #[serde(default)]
    pub credits: CreditSelection,

    #[serde(default)]
    pub suggestions: SuggestionConfig,

    #[serde(default)]
    provincial_tax_brackets: Vec<TaxBracket>,

    #[serde(default)]
    federal_tax_brackets: Vec<TaxBracket>,

    #[serde(default)]
    credit_values: BTreeMap<String, CreditValue>,
}

fn default_tax_year() -> TaxYear {
    REFERENCE_YEAR
}

fn default_province() -> Province {
    Province::Ontario
}

impl TaxReturn {
    /// Reference tables with this return's overrides applied for its tax year.
    pub fn tables(&self) -> Result<TaxTables> {
        let mut tables = TaxTables::reference()?;

        if !self.federal_tax_brackets.is_empty() {
            debug!(tax_year = %self.tax_year, "using federal brackets from tax return");
            tables.insert_brackets(
                self.tax_year,
                BracketTable::new(Jurisdiction::Federal, self.federal_tax_brackets.clone())?,
            );
        }

        if !self.provincial_tax_brackets.is_empty() {
            debug!(tax_year = %self.tax_year, province = %self.province, "using provincial brackets from tax return");
            tables.insert_brackets(
                self.tax_year,
                BracketTable::new(
                    Jurisdiction::Provincial(self.province),
                    self.provincial_tax_brackets.clone(),
                )?,
            );
        }

        if !self.credit_values.is_empty() {
            let mut merged = tables
                .credit_values(self.tax_year)
                .cloned()
                .unwrap_or_default();
            for (name, value) in &self.credit_values {
                merged.insert(name.parse::<Credit>()?, *value)?;
            }
            debug!(
                tax_year = %self.tax_year,
                count = self.credit_values.len(),
                "using credit values from tax return"
            );
            tables.insert_credits(self.tax_year, merged);
        }

        Ok(tables)
    }
}
