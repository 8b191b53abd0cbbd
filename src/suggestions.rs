use std::cmp::Reverse;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::accounting::{self, DeductionInput, IncomeInput};
use crate::error::{Result, TaxError};
use crate::summary::TaxSummary;
use crate::tax::{Money, Percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Impact::Low => "LOW",
            Impact::Medium => "MEDIUM",
            Impact::High => "HIGH",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionCategory {
    Rrsp,
    HomeOffice,
    Medical,
    Investment,
}

impl fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuggestionCategory::Rrsp => "RRSP",
            SuggestionCategory::HomeOffice => "HOME_OFFICE",
            SuggestionCategory::Medical => "MEDICAL",
            SuggestionCategory::Investment => "INVESTMENT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub category: SuggestionCategory,
    pub title: String,
    pub description: String,
    pub potential_savings: Option<Money>,
    pub impact: Impact,

    /// Set by the presentation layer, never by the engine.
    #[serde(default)]
    pub applied: bool,
}

/// Thresholds and factors for the suggestion rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub rrsp_income_threshold: Money,
    pub rrsp_contribution_floor: Money,
    pub rrsp_contribution_cap_percent: Percentage,
    pub rrsp_annual_cap: Money,
    pub rrsp_minimum_room: Money,
    pub rrsp_high_impact_savings: Money,
    pub rrsp_medium_impact_savings: Money,

    pub home_office_income_threshold: Money,
    pub home_office_savings_percent: Percentage,
    pub home_office_high_impact_savings: Money,
    pub home_office_medium_impact_savings: Money,

    pub medical_review_threshold: Money,
    pub medical_review_savings: Money,

    pub investment_income_threshold: Money,
    pub investment_savings_percent: Percentage,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionConfig {
            rrsp_income_threshold: dec!(60000),
            rrsp_contribution_floor: dec!(5000),
            rrsp_contribution_cap_percent: dec!(18),
            rrsp_annual_cap: dec!(27830),
            rrsp_minimum_room: dec!(1000),
            rrsp_high_impact_savings: dec!(2000),
            rrsp_medium_impact_savings: dec!(1000),

            home_office_income_threshold: dec!(10000),
            home_office_savings_percent: dec!(10),
            home_office_high_impact_savings: dec!(2000),
            home_office_medium_impact_savings: dec!(500),

            medical_review_threshold: dec!(1000),
            medical_review_savings: dec!(150),

            investment_income_threshold: dec!(5000),
            investment_savings_percent: dec!(5),
        }
    }
}

impl SuggestionConfig {
    /// Amounts must be non-negative and percentages within [0, 100].
    pub fn validate(&self) -> Result<()> {
        let amounts = [
            ("rrsp_income_threshold", self.rrsp_income_threshold),
            ("rrsp_contribution_floor", self.rrsp_contribution_floor),
            ("rrsp_annual_cap", self.rrsp_annual_cap),
            ("rrsp_minimum_room", self.rrsp_minimum_room),
            ("rrsp_high_impact_savings", self.rrsp_high_impact_savings),
            ("rrsp_medium_impact_savings", self.rrsp_medium_impact_savings),
            ("home_office_income_threshold", self.home_office_income_threshold),
            ("home_office_high_impact_savings", self.home_office_high_impact_savings),
            ("home_office_medium_impact_savings", self.home_office_medium_impact_savings),
            ("medical_review_threshold", self.medical_review_threshold),
            ("medical_review_savings", self.medical_review_savings),
            ("investment_income_threshold", self.investment_income_threshold),
        ];
        if let Some((field, amount)) = amounts.iter().find(|(_, a)| *a < Decimal::ZERO) {
            return Err(TaxError::configuration(format!(
                "suggestion setting `{}` cannot be negative, got {}",
                field, amount
            )));
        }

        let percentages = [
            ("rrsp_contribution_cap_percent", self.rrsp_contribution_cap_percent),
            ("home_office_savings_percent", self.home_office_savings_percent),
            ("investment_savings_percent", self.investment_savings_percent),
        ];
        if let Some((field, percent)) = percentages
            .iter()
            .find(|(_, p)| *p < Decimal::ZERO || *p > Decimal::ONE_HUNDRED)
        {
            return Err(TaxError::configuration(format!(
                "suggestion setting `{}` must be between 0 and 100, got {}",
                field, percent
            )));
        }

        Ok(())
    }
}

type Rule = fn(&SuggestionEngine, &IncomeInput, &DeductionInput, &TaxSummary) -> Option<Suggestion>;

// Output follows this order.
const RULES: [Rule; 4] = [
    SuggestionEngine::rrsp_headroom,
    SuggestionEngine::home_office,
    SuggestionEngine::medical_review,
    SuggestionEngine::investment_efficiency,
];

fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(amount: Money, percent: Percentage) -> Money {
    amount * percent / Decimal::ONE_HUNDRED
}

fn tier(savings: Money, high: Money, medium: Money) -> Impact {
    if savings > high {
        Impact::High
    } else if savings > medium {
        Impact::Medium
    } else {
        Impact::Low
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig) -> Result<Self> {
        config.validate()?;
        Ok(SuggestionEngine { config })
    }

    pub fn generate(
        &self,
        income: &IncomeInput,
        deductions: &DeductionInput,
        summary: &TaxSummary,
    ) -> Vec<Suggestion> {
        let suggestions: Vec<Suggestion> = RULES
            .iter()
            .filter_map(|rule| rule(self, income, deductions, summary))
            .collect();

        debug!(count = suggestions.len(), "generated suggestions");
        suggestions
    }

    fn rrsp_headroom(
        &self,
        income: &IncomeInput,
        deductions: &DeductionInput,
        summary: &TaxSummary,
    ) -> Option<Suggestion> {
        let cfg = &self.config;
        if income.employment <= cfg.rrsp_income_threshold
            || deductions.rrsp_contribution >= cfg.rrsp_contribution_floor
        {
            return None;
        }
        if summary.marginal_rate_percent <= Decimal::ZERO {
            warn!(
                marginal_rate = %summary.marginal_rate_percent,
                "skipping RRSP suggestion without a marginal rate"
            );
            return None;
        }

        let room = accounting::rrsp_contribution_room(
            income.employment,
            cfg.rrsp_contribution_cap_percent,
            cfg.rrsp_annual_cap,
        ) - deductions.rrsp_contribution;
        if room <= cfg.rrsp_minimum_room {
            return None;
        }

        let savings = round_cents(percent_of(room, summary.marginal_rate_percent));
        Some(Suggestion {
            id: "rrsp-headroom".to_string(),
            category: SuggestionCategory::Rrsp,
            title: "Increase RRSP Contributions".to_string(),
            description: format!(
                "Consider contributing an additional ${:.2} to your RRSP to reduce your taxable income.",
                room
            ),
            potential_savings: Some(savings),
            impact: tier(
                savings,
                cfg.rrsp_high_impact_savings,
                cfg.rrsp_medium_impact_savings,
            ),
            applied: false,
        })
    }

    fn home_office(
        &self,
        income: &IncomeInput,
        deductions: &DeductionInput,
        _summary: &TaxSummary,
    ) -> Option<Suggestion> {
        let cfg = &self.config;
        if income.self_employment <= cfg.home_office_income_threshold
            || deductions.claims_home_office
        {
            return None;
        }

        let savings = round_cents(percent_of(
            income.self_employment,
            cfg.home_office_savings_percent,
        ));
        Some(Suggestion {
            id: "home-office".to_string(),
            category: SuggestionCategory::HomeOffice,
            title: "Claim Home Office Expenses".to_string(),
            description: "You have self-employment income but haven't claimed home office \
                          expenses. You may be eligible to deduct a portion of your home expenses."
                .to_string(),
            potential_savings: Some(savings),
            impact: tier(
                savings,
                cfg.home_office_high_impact_savings,
                cfg.home_office_medium_impact_savings,
            ),
            applied: false,
        })
    }

    fn medical_review(
        &self,
        _income: &IncomeInput,
        deductions: &DeductionInput,
        _summary: &TaxSummary,
    ) -> Option<Suggestion> {
        let cfg = &self.config;
        if deductions.medical <= Decimal::ZERO || deductions.medical >= cfg.medical_review_threshold {
            return None;
        }

        Some(Suggestion {
            id: "medical-review".to_string(),
            category: SuggestionCategory::Medical,
            title: "Review Medical Expenses".to_string(),
            description: "You've claimed some medical expenses. Make sure to include all \
                          eligible expenses like prescriptions, dental work, and eyeglasses."
                .to_string(),
            potential_savings: Some(cfg.medical_review_savings),
            impact: Impact::Low,
            applied: false,
        })
    }

    fn investment_efficiency(
        &self,
        income: &IncomeInput,
        _deductions: &DeductionInput,
        _summary: &TaxSummary,
    ) -> Option<Suggestion> {
        let cfg = &self.config;
        if income.investment <= cfg.investment_income_threshold {
            return None;
        }

        Some(Suggestion {
            id: "investment-efficiency".to_string(),
            category: SuggestionCategory::Investment,
            title: "Optimize Investment Income".to_string(),
            description: "Consider investing in tax-efficient funds or using a Tax-Free Savings \
                          Account (TFSA) to minimize tax on your investment returns."
                .to_string(),
            potential_savings: Some(round_cents(percent_of(
                income.investment,
                cfg.investment_savings_percent,
            ))),
            impact: Impact::Medium,
            applied: false,
        })
    }
}

/// Highest impact first, then largest savings. Ties keep their input order.
pub fn rank(suggestions: &[Suggestion]) -> Vec<Suggestion> {
    let mut ranked = suggestions.to_vec();
    ranked.sort_by_key(|s| {
        (
            Reverse(s.impact),
            Reverse(s.potential_savings.unwrap_or(Decimal::ZERO)),
        )
    });
    ranked
}
