use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxError};
use crate::tables::CreditTable;
use crate::tax::{Money, Percentage};

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IncomeInput {
    pub employment: Money,
    pub self_employment: Money,
    pub investment: Money,
    pub rental: Money,
    pub other: Money,

    /// Number of T4 slips received. Informational only.
    pub income_slips: u32,
}

impl IncomeInput {
    pub fn validate(&self) -> Result<()> {
        non_negative("income.employment", self.employment)?;
        non_negative("income.self_employment", self.self_employment)?;
        non_negative("income.investment", self.investment)?;
        non_negative("income.rental", self.rental)?;
        non_negative("income.other", self.other)
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DeductionInput {
    pub rrsp_contribution: Money,
    pub child_care: Money,
    pub moving: Money,
    pub union_dues: Money,
    pub tools: Money,
    pub medical: Money,
    pub charitable_donations: Money,
    pub student_loan_interest: Money,
    pub tuition: Money,
    pub other: Money,

    pub claims_home_office: bool,

    /// Share of the home used for work. Required when `claims_home_office` is set.
    pub home_office_percentage: Option<Percentage>,
}

impl DeductionInput {
    pub fn validate(&self) -> Result<()> {
        non_negative("deductions.rrsp_contribution", self.rrsp_contribution)?;
        non_negative("deductions.child_care", self.child_care)?;
        non_negative("deductions.moving", self.moving)?;
        non_negative("deductions.union_dues", self.union_dues)?;
        non_negative("deductions.tools", self.tools)?;
        non_negative("deductions.medical", self.medical)?;
        non_negative("deductions.charitable_donations", self.charitable_donations)?;
        non_negative("deductions.student_loan_interest", self.student_loan_interest)?;
        non_negative("deductions.tuition", self.tuition)?;
        non_negative("deductions.other", self.other)?;

        match self.home_office_percentage {
            Some(p) if p < Decimal::ZERO || p > Decimal::ONE_HUNDRED => {
                Err(TaxError::validation(format!(
                    "deductions.home_office_percentage must be within [0, 100], got {}",
                    p
                )))
            }
            None if self.claims_home_office => Err(TaxError::validation(
                "deductions.home_office_percentage is required when claiming home office expenses",
            )),
            _ => Ok(()),
        }
    }
}

fn non_negative(field: &str, amount: Money) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(TaxError::validation(format!(
            "{} cannot be negative, got {}",
            field, amount
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credit {
    BasicPersonal,
    Spouse,
    Caregiver,
    EligibleDependant,
    CanadaEmployment,
    Disability,
    InterestDividends,
    PensionIncome,
    Education,
    GstHstCredit,
    ChildBenefit,
    WorkingIncomeBenefit,
}

impl Credit {
    pub const ALL: [Credit; 12] = [
        Credit::BasicPersonal,
        Credit::Spouse,
        Credit::Caregiver,
        Credit::EligibleDependant,
        Credit::CanadaEmployment,
        Credit::Disability,
        Credit::InterestDividends,
        Credit::PensionIncome,
        Credit::Education,
        Credit::GstHstCredit,
        Credit::ChildBenefit,
        Credit::WorkingIncomeBenefit,
    ];

    /// Name used for this credit in tax return files
    pub fn key(self) -> &'static str {
        match self {
            Credit::BasicPersonal => "basic_personal",
            Credit::Spouse => "spouse",
            Credit::Caregiver => "caregiver",
            Credit::EligibleDependant => "eligible_dependant",
            Credit::CanadaEmployment => "canada_employment",
            Credit::Disability => "disability",
            Credit::InterestDividends => "interest_dividends",
            Credit::PensionIncome => "pension_income",
            Credit::Education => "education",
            Credit::GstHstCredit => "gst_hst_credit",
            Credit::ChildBenefit => "child_benefit",
            Credit::WorkingIncomeBenefit => "working_income_benefit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Credit::BasicPersonal => "Basic personal amount",
            Credit::Spouse => "Spouse or common-law partner amount",
            Credit::Caregiver => "Canada caregiver amount",
            Credit::EligibleDependant => "Amount for an eligible dependant",
            Credit::CanadaEmployment => "Canada employment amount",
            Credit::Disability => "Disability amount",
            Credit::InterestDividends => "Interest and dividend income",
            Credit::PensionIncome => "Pension income amount",
            Credit::Education => "Education amount",
            Credit::GstHstCredit => "GST/HST credit",
            Credit::ChildBenefit => "Canada child benefit",
            Credit::WorkingIncomeBenefit => "Canada workers benefit",
        }
    }
}

impl FromStr for Credit {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Credit::ALL
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .ok_or_else(|| TaxError::configuration(format!("unknown credit `{}`", s)))
    }
}

/// Eligibility flags, one per credit category
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CreditSelection {
    pub basic_personal: bool,
    pub spouse: bool,
    pub caregiver: bool,
    pub eligible_dependant: bool,
    pub canada_employment: bool,
    pub disability: bool,
    pub interest_dividends: bool,
    pub pension_income: bool,
    pub education: bool,
    pub gst_hst_credit: bool,
    pub child_benefit: bool,
    pub working_income_benefit: bool,
}

impl Default for CreditSelection {
    fn default() -> Self {
        CreditSelection {
            basic_personal: true,
            spouse: false,
            caregiver: false,
            eligible_dependant: false,
            canada_employment: true,
            disability: false,
            interest_dividends: false,
            pension_income: false,
            education: false,
            gst_hst_credit: true,
            child_benefit: false,
            working_income_benefit: false,
        }
    }
}

impl CreditSelection {
    /// Selection with every flag cleared
    pub fn none() -> Self {
        CreditSelection {
            basic_personal: false,
            spouse: false,
            caregiver: false,
            eligible_dependant: false,
            canada_employment: false,
            disability: false,
            interest_dividends: false,
            pension_income: false,
            education: false,
            gst_hst_credit: false,
            child_benefit: false,
            working_income_benefit: false,
        }
    }

    pub fn with(mut self, credit: Credit) -> Self {
        *self.flag_mut(credit) = true;
        self
    }

    pub fn is_claimed(&self, credit: Credit) -> bool {
        match credit {
            Credit::BasicPersonal => self.basic_personal,
            Credit::Spouse => self.spouse,
            Credit::Caregiver => self.caregiver,
            Credit::EligibleDependant => self.eligible_dependant,
            Credit::CanadaEmployment => self.canada_employment,
            Credit::Disability => self.disability,
            Credit::InterestDividends => self.interest_dividends,
            Credit::PensionIncome => self.pension_income,
            Credit::Education => self.education,
            Credit::GstHstCredit => self.gst_hst_credit,
            Credit::ChildBenefit => self.child_benefit,
            Credit::WorkingIncomeBenefit => self.working_income_benefit,
        }
    }

    fn flag_mut(&mut self, credit: Credit) -> &mut bool {
        match credit {
            Credit::BasicPersonal => &mut self.basic_personal,
            Credit::Spouse => &mut self.spouse,
            Credit::Caregiver => &mut self.caregiver,
            Credit::EligibleDependant => &mut self.eligible_dependant,
            Credit::CanadaEmployment => &mut self.canada_employment,
            Credit::Disability => &mut self.disability,
            Credit::InterestDividends => &mut self.interest_dividends,
            Credit::PensionIncome => &mut self.pension_income,
            Credit::Education => &mut self.education,
            Credit::GstHstCredit => &mut self.gst_hst_credit,
            Credit::ChildBenefit => &mut self.child_benefit,
            Credit::WorkingIncomeBenefit => &mut self.working_income_benefit,
        }
    }

    /// Claimed credits in declaration order
    pub fn claimed(&self) -> impl Iterator<Item = Credit> + '_ {
        Credit::ALL
            .iter()
            .copied()
            .filter(move |c| self.is_claimed(*c))
    }
}

pub fn aggregate_income(income: &IncomeInput) -> Money {
    income.employment + income.self_employment + income.investment + income.rental + income.other
}

/// Sum of the deduction amounts. The home-office flag and percentage add
/// nothing here; a home-office dollar amount must arrive through another field.
pub fn aggregate_deductions(deductions: &DeductionInput) -> Money {
    deductions.rrsp_contribution
        + deductions.child_care
        + deductions.moving
        + deductions.union_dues
        + deductions.tools
        + deductions.medical
        + deductions.charitable_donations
        + deductions.student_loan_interest
        + deductions.tuition
        + deductions.other
}

pub fn aggregate_credits(
    credits: &CreditSelection,
    credit_table: &CreditTable,
    lowest_rate: Percentage,
) -> Result<Money> {
    credits.claimed().try_fold(Decimal::ZERO, |total, credit| {
        let value = credit_table.get(credit).ok_or_else(|| {
            TaxError::configuration(format!("no credit value configured for `{:?}`", credit))
        })?;
        Ok(total + value.value(lowest_rate))
    })
}

pub fn taxable_income(total_income: Money, total_deductions: Money) -> Money {
    (total_income - total_deductions).max(Decimal::ZERO)
}

pub fn rrsp_contribution_room(
    employment_income: Money,
    contribution_cap_percent: Percentage,
    annual_cap: Money,
) -> Money {
    let earned_room = employment_income * contribution_cap_percent / Decimal::ONE_HUNDRED;
    earned_room.min(annual_cap).max(Decimal::ZERO)
}
