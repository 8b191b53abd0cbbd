use std::io::Write;

use crate::accounting::{Credit, CreditSelection};
use crate::suggestions::Suggestion;
use crate::summary::TaxSummary;
use crate::tax::{Money, Percentage};

use num_format::{CustomFormat, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryOutput {
    #[serde(rename = "Tax Year")]
    tax_year: u16,

    province: &'static str,

    #[serde(serialize_with = "format_money", rename = "Total Income")]
    total_income: Money,

    #[serde(serialize_with = "format_money", rename = "Total Deductions")]
    total_deductions: Money,

    #[serde(serialize_with = "format_money", rename = "Taxable Income")]
    taxable_income: Money,

    #[serde(serialize_with = "format_money", rename = "Federal Tax")]
    federal_tax: Money,

    #[serde(serialize_with = "format_money", rename = "Provincial Tax")]
    provincial_tax: Money,

    #[serde(serialize_with = "format_money", rename = "Total Credits")]
    total_credits: Money,

    #[serde(serialize_with = "format_money", rename = "Total Tax")]
    total_tax: Money,

    #[serde(serialize_with = "format_money", rename = "Net Income")]
    net_income: Money,

    #[serde(serialize_with = "format_money", rename = "Refund")]
    refund_amount: Money,

    #[serde(serialize_with = "format_money", rename = "Balance Owing")]
    balance_owing: Money,

    #[serde(serialize_with = "format_rate", rename = "Marginal Rate")]
    marginal_rate_percent: Percentage,

    #[serde(serialize_with = "format_rate", rename = "Provincial Marginal Rate")]
    provincial_marginal_rate_percent: Percentage,

    #[serde(serialize_with = "format_rate", rename = "Effective Rate")]
    effective_rate_percent: Percentage,
}

impl From<&TaxSummary> for SummaryOutput {
    fn from(summary: &TaxSummary) -> Self {
        Self {
            tax_year: summary.tax_year.0,
            province: summary.province.code(),
            total_income: summary.total_income,
            total_deductions: summary.total_deductions,
            taxable_income: summary.taxable_income,
            federal_tax: summary.federal_tax,
            provincial_tax: summary.provincial_tax,
            total_credits: summary.total_credits,
            total_tax: summary.total_tax,
            net_income: summary.net_income,
            refund_amount: summary.refund_amount,
            balance_owing: summary.balance_owing,
            marginal_rate_percent: summary.marginal_rate_percent,
            provincial_marginal_rate_percent: summary.provincial_marginal_rate_percent,
            effective_rate_percent: summary.effective_rate_percent,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreditOutput {
    code: &'static str,

    #[serde(rename = "Credit Claimed")]
    label: &'static str,
}

impl From<Credit> for CreditOutput {
    fn from(credit: Credit) -> Self {
        Self {
            code: credit.key(),
            label: credit.label(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SuggestionOutput<'a> {
    id: &'a str,
    category: String,
    impact: String,

    #[serde(serialize_with = "format_savings", rename = "Potential Savings")]
    potential_savings: Option<Money>,

    title: &'a str,
    description: &'a str,
}

impl<'a> From<&'a Suggestion> for SuggestionOutput<'a> {
    fn from(suggestion: &'a Suggestion) -> Self {
        Self {
            id: &suggestion.id,
            category: suggestion.category.to_string(),
            impact: suggestion.impact.to_string(),
            potential_savings: suggestion.potential_savings,
            title: &suggestion.title,
            description: &suggestion.description,
        }
    }
}

/// Two decimals, `_` thousands separators from 10,000 up.
pub fn money_to_string(amount: Money) -> String {
    lazy_static! {
        static ref NUM_FMT: CustomFormat = CustomFormat::builder().separator("_").build().unwrap();
    }

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let cents = match (rounded.abs() * Decimal::ONE_HUNDRED).to_i64() {
        Some(cents) => cents,
        None => return format!("{:.2}", rounded),
    };

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let whole = cents / 100;
    let whole = if whole >= 10_000 {
        whole.to_formatted_string(&*NUM_FMT)
    } else {
        whole.to_string()
    };

    format!("{}{}.{:02}", sign, whole, cents % 100)
}

fn format_money<S>(amount: &Money, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&money_to_string(*amount))
}

fn format_savings<S>(amount: &Option<Money>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match amount {
        Some(amount) => format_money(amount, s),
        None => s.serialize_str(""),
    }
}

fn format_rate<S>(rate: &Percentage, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format!("{:.2}%", rate))
}

/// Writes the summary table, then the claimed credits and the suggestions,
/// each preceded by a blank line. Empty tables are left out.
pub fn write<W: Write>(
    mut out: W,
    summary: &TaxSummary,
    credits: &CreditSelection,
    suggestions: &[Suggestion],
) -> csv::Result<()> {
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.serialize(SummaryOutput::from(summary))?;
        writer.flush()?;
    }

    if credits.claimed().next().is_some() {
        writeln!(out)?;
        let mut writer = csv::Writer::from_writer(&mut out);
        for credit in credits.claimed() {
            writer.serialize(CreditOutput::from(credit))?;
        }
        writer.flush()?;
    }

    if !suggestions.is_empty() {
        writeln!(out)?;
        let mut writer = csv::Writer::from_writer(&mut out);
        for suggestion in suggestions {
            writer.serialize(SuggestionOutput::from(suggestion))?;
        }
        writer.flush()?;
    }

    Ok(())
}

pub fn print(
    summary: &TaxSummary,
    credits: &CreditSelection,
    suggestions: &[Suggestion],
) -> csv::Result<()> {
    let stdout = std::io::stdout();
    let handle = stdout.lock();
    write(handle, summary, credits, suggestions)
}
