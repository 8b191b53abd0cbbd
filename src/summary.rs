use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accounting::{self, CreditSelection, DeductionInput, IncomeInput};
use crate::error::Result;
use crate::tables::{TaxTables, TaxYear};
use crate::tax::{self, Jurisdiction, Money, Percentage, Province};

/// Result of one calculation. Monetary fields are rounded to the cent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub tax_year: TaxYear,
    pub province: Province,
    pub total_income: Money,
    pub total_deductions: Money,
    pub total_credits: Money,
    pub taxable_income: Money,
    pub federal_tax: Money,
    pub provincial_tax: Money,
    /// Federal plus provincial tax less credits. Negative means a refund.
    pub total_tax: Money,
    pub net_income: Money,
    pub refund_amount: Money,
    pub balance_owing: Money,
    /// Federal marginal rate
    pub marginal_rate_percent: Percentage,
    pub provincial_marginal_rate_percent: Percentage,
    pub effective_rate_percent: Percentage,
}

impl TaxSummary {
    pub fn is_refund(&self) -> bool {
        self.refund_amount > Decimal::ZERO
    }
}

fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Builds summaries against a shared set of tables
#[derive(Debug, Clone, Copy)]
pub struct TaxSummaryBuilder<'a> {
    tables: &'a TaxTables,
}

impl<'a> TaxSummaryBuilder<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        TaxSummaryBuilder { tables }
    }

    pub fn build(
        &self,
        tax_year: TaxYear,
        province: Province,
        income: &IncomeInput,
        deductions: &DeductionInput,
        credits: &CreditSelection,
    ) -> Result<TaxSummary> {
        income.validate()?;
        deductions.validate()?;

        let federal_table = self.tables.bracket_table(tax_year, Jurisdiction::Federal)?;
        let provincial_table = self
            .tables
            .bracket_table(tax_year, Jurisdiction::Provincial(province))?;
        let credit_table = self.tables.credit_values(tax_year)?;

        let total_income = accounting::aggregate_income(income);
        let total_deductions = accounting::aggregate_deductions(deductions);
        let total_credits =
            accounting::aggregate_credits(credits, credit_table, federal_table.lowest_rate())?;
        let taxable_income = accounting::taxable_income(total_income, total_deductions);

        let federal = tax::compute_tax(taxable_income, federal_table);
        let provincial = tax::compute_tax(taxable_income, provincial_table);

        let total_tax = federal.tax + provincial.tax - total_credits;

        let effective_rate_percent = if total_income > Decimal::ZERO {
            (total_tax / total_income * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        } else {
            Decimal::ZERO
        };

        let total_tax = round_cents(total_tax);

        debug!(
            %tax_year,
            %province,
            %total_income,
            %total_deductions,
            %taxable_income,
            federal_tax = %federal.tax,
            provincial_tax = %provincial.tax,
            %total_credits,
            %total_tax,
            "computed tax summary"
        );

        Ok(TaxSummary {
            tax_year,
            province,
            total_income: round_cents(total_income),
            total_deductions: round_cents(total_deductions),
            total_credits: round_cents(total_credits),
            taxable_income: round_cents(taxable_income),
            federal_tax: round_cents(federal.tax),
            provincial_tax: round_cents(provincial.tax),
            total_tax,
            net_income: round_cents(total_income) - total_tax,
            refund_amount: (-total_tax).max(Decimal::ZERO),
            balance_owing: total_tax.max(Decimal::ZERO),
            marginal_rate_percent: federal.marginal_rate,
            provincial_marginal_rate_percent: provincial.marginal_rate,
            effective_rate_percent,
        })
    }
}
