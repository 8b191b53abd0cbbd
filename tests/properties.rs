// Property-based checks over the public calculation entry points.

use proptest::prelude::*;
use rust_decimal::Decimal;

use taxsim::tables::REFERENCE_YEAR;
use taxsim::tax::compute_tax;
use taxsim::{
    compute_suggestions, compute_tax_summary, Credit, CreditSelection, DeductionInput,
    IncomeInput, Jurisdiction, Province, TaxTables,
};

fn cents(amount: u64) -> Decimal {
    Decimal::new(amount as i64, 2)
}

fn credit_selection() -> impl Strategy<Value = CreditSelection> {
    prop::collection::vec(any::<bool>(), Credit::ALL.len()).prop_map(|flags| {
        Credit::ALL
            .iter()
            .zip(flags)
            .filter(|(_, on)| *on)
            .fold(CreditSelection::none(), |selection, (credit, _)| {
                selection.with(*credit)
            })
    })
}

fn income_input() -> impl Strategy<Value = IncomeInput> {
    (
        0u64..50_000_000,
        0u64..10_000_000,
        0u64..5_000_000,
        0u64..5_000_000,
        0u64..1_000_000,
        0u32..5,
    )
        .prop_map(
            |(employment, self_employment, investment, rental, other, income_slips)| IncomeInput {
                employment: cents(employment),
                self_employment: cents(self_employment),
                investment: cents(investment),
                rental: cents(rental),
                other: cents(other),
                income_slips,
            },
        )
}

fn deduction_input() -> impl Strategy<Value = DeductionInput> {
    (0u64..3_000_000, 0u64..1_500_000, 0u64..500_000, 0u64..200_000).prop_map(
        |(rrsp, child_care, medical, other)| DeductionInput {
            rrsp_contribution: cents(rrsp),
            child_care: cents(child_care),
            medical: cents(medical),
            other: cents(other),
            ..Default::default()
        },
    )
}

proptest! {
    #[test]
    fn tax_is_non_decreasing_in_income(a in 0u64..40_000_000, b in 0u64..40_000_000) {
        let tables = TaxTables::reference().unwrap();
        for jurisdiction in [Jurisdiction::Federal, Jurisdiction::Provincial(Province::Ontario)].iter() {
            let table = tables.bracket_table(REFERENCE_YEAR, *jurisdiction).unwrap();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let low_tax = compute_tax(cents(low), table);
            let high_tax = compute_tax(cents(high), table);

            prop_assert!(low_tax.tax <= high_tax.tax);
            prop_assert!(low_tax.marginal_rate <= high_tax.marginal_rate);
        }
    }

    #[test]
    fn one_cent_more_costs_at_most_the_top_rate(a in 0u64..40_000_000) {
        let tables = TaxTables::reference().unwrap();
        let table = tables.bracket_table(REFERENCE_YEAR, Jurisdiction::Federal).unwrap();
        let step = compute_tax(cents(a + 1), table).tax - compute_tax(cents(a), table).tax;

        // 1 cent at 33%
        prop_assert!(step >= Decimal::ZERO);
        prop_assert!(step <= Decimal::new(33, 4));
    }

    #[test]
    fn refund_and_balance_are_exclusive(
        income in income_input(),
        deductions in deduction_input(),
        credits in credit_selection(),
    ) {
        let tables = TaxTables::reference().unwrap();
        let summary = compute_tax_summary(
            &tables, REFERENCE_YEAR, Province::Ontario, &income, &deductions, &credits,
        ).unwrap();

        prop_assert!(summary.refund_amount >= Decimal::ZERO);
        prop_assert!(summary.balance_owing >= Decimal::ZERO);
        prop_assert!(summary.refund_amount.is_zero() || summary.balance_owing.is_zero());
        prop_assert_eq!(summary.balance_owing - summary.refund_amount, summary.total_tax);
    }

    #[test]
    fn taxable_income_is_floored_at_zero(
        income in income_input(),
        deductions in deduction_input(),
    ) {
        let tables = TaxTables::reference().unwrap();
        let summary = compute_tax_summary(
            &tables, REFERENCE_YEAR, Province::Ontario, &income, &deductions, &CreditSelection::none(),
        ).unwrap();

        let expected = (summary.total_income - summary.total_deductions).max(Decimal::ZERO);
        prop_assert!(summary.taxable_income >= Decimal::ZERO);
        prop_assert_eq!(summary.taxable_income, expected);
    }

    #[test]
    fn calculation_is_idempotent(
        income in income_input(),
        deductions in deduction_input(),
        credits in credit_selection(),
    ) {
        let tables = TaxTables::reference().unwrap();
        let first = compute_tax_summary(
            &tables, REFERENCE_YEAR, Province::Ontario, &income, &deductions, &credits,
        ).unwrap();
        let second = compute_tax_summary(
            &tables, REFERENCE_YEAR, Province::Ontario, &income, &deductions, &credits,
        ).unwrap();
        prop_assert_eq!(&first, &second);

        let suggestions = compute_suggestions(&income, &deductions, &first);
        prop_assert_eq!(suggestions, compute_suggestions(&income, &deductions, &second));
    }

    #[test]
    fn suggestion_savings_are_never_negative(
        income in income_input(),
        deductions in deduction_input(),
    ) {
        let tables = TaxTables::reference().unwrap();
        let summary = compute_tax_summary(
            &tables, REFERENCE_YEAR, Province::Ontario, &income, &deductions, &CreditSelection::default(),
        ).unwrap();

        for suggestion in compute_suggestions(&income, &deductions, &summary) {
            prop_assert!(suggestion.potential_savings.unwrap_or_default() >= Decimal::ZERO);
            prop_assert!(!suggestion.applied);
        }
    }
}

#[test]
fn zero_tax_for_zero_income_on_every_reference_table() {
    let tables = TaxTables::reference().unwrap();
    for jurisdiction in [Jurisdiction::Federal, Jurisdiction::Provincial(Province::Ontario)].iter() {
        let table = tables.bracket_table(REFERENCE_YEAR, *jurisdiction).unwrap();
        assert_eq!(compute_tax(Decimal::ZERO, table).tax, Decimal::ZERO);
    }
}

#[test]
fn rrsp_suggestion_for_salaried_taxpayer() {
    let tables = TaxTables::reference().unwrap();
    let income = IncomeInput {
        employment: Decimal::new(70_000, 0),
        ..Default::default()
    };
    let deductions = DeductionInput::default();
    let credits = CreditSelection::none().with(Credit::BasicPersonal);

    let summary = compute_tax_summary(
        &tables,
        REFERENCE_YEAR,
        Province::Ontario,
        &income,
        &deductions,
        &credits,
    )
    .unwrap();
    let suggestions = compute_suggestions(&income, &deductions, &summary);

    let rrsp = suggestions
        .iter()
        .find(|s| s.id == "rrsp-headroom")
        .expect("RRSP suggestion");
    assert_eq!(rrsp.impact, taxsim::Impact::High);
    assert!(rrsp.potential_savings.unwrap() > Decimal::ZERO);
}

#[test]
fn zero_income_scenario() {
    let tables = TaxTables::reference().unwrap();
    let income = IncomeInput::default();
    let deductions = DeductionInput::default();
    let summary = compute_tax_summary(
        &tables,
        REFERENCE_YEAR,
        Province::Ontario,
        &income,
        &deductions,
        &CreditSelection::default(),
    )
    .unwrap();

    assert_eq!(summary.total_income, Decimal::ZERO);
    assert_eq!(summary.taxable_income, Decimal::ZERO);
    assert_eq!(summary.federal_tax, Decimal::ZERO);
    assert_eq!(summary.provincial_tax, Decimal::ZERO);
    assert_eq!(summary.effective_rate_percent, Decimal::ZERO);
    assert!(compute_suggestions(&income, &deductions, &summary).is_empty());
}
