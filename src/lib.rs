//! Personal income tax estimation: bracket tables, a progressive tax
//! calculator, summary building and optimization suggestions.
//!
//! Everything here is a pure function of its inputs. [`TaxTables`] is the only
//! long-lived value and is read-only once built.

#[macro_use]
extern crate lazy_static;

pub mod accounting;
pub mod error;
pub mod output;
pub mod suggestions;
pub mod summary;
pub mod tables;
pub mod tax;
pub mod tax_return;

pub use accounting::{Credit, CreditSelection, DeductionInput, IncomeInput};
pub use error::{Result, TaxError};
pub use suggestions::{Impact, Suggestion, SuggestionCategory, SuggestionConfig, SuggestionEngine};
pub use summary::{TaxSummary, TaxSummaryBuilder};
pub use tables::{TaxTables, TaxYear};
pub use tax::{BracketTable, Jurisdiction, Money, Percentage, Province, TaxBracket};

/// Used both for live previews and for the authoritative calculation.
pub fn compute_tax_summary(
    tables: &TaxTables,
    tax_year: TaxYear,
    province: Province,
    income: &IncomeInput,
    deductions: &DeductionInput,
    credits: &CreditSelection,
) -> Result<TaxSummary> {
    TaxSummaryBuilder::new(tables).build(tax_year, province, income, deductions, credits)
}

/// Suggestions under the default thresholds.
pub fn compute_suggestions(
    income: &IncomeInput,
    deductions: &DeductionInput,
    summary: &TaxSummary,
) -> Vec<Suggestion> {
    SuggestionEngine::default().generate(income, deductions, summary)
}
