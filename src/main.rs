use taxsim::tax_return::TaxReturn;
use taxsim::{output, Province, SuggestionEngine, TaxSummaryBuilder, TaxYear};

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(StructOpt)]
#[structopt(name = "taxsim")]
struct Opt {
    #[structopt(short, long, default_value = "tax_return.toml")]
    config_file: String,

    /// Overrides the tax year in the config file
    #[structopt(short = "y", long)]
    tax_year: Option<u16>,

    /// Two-letter province code, overrides the config file
    #[structopt(short, long)]
    province: Option<Province>,

    #[structopt(long)]
    no_suggestions: bool,

    /// Orders suggestions by impact, then savings
    #[structopt(long)]
    ranked: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxsim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = Opt::from_args();

    let config_file_content = std::fs::read_to_string(&options.config_file)
        .with_context(|| format!("Couldn't open config file `{}`", options.config_file))?;

    let mut tax_return: TaxReturn =
        toml::from_str(&config_file_content).context("Invalid TOML in config file")?;

    if let Some(year) = options.tax_year {
        tax_return.tax_year = TaxYear(year);
    }
    if let Some(province) = options.province {
        tax_return.province = province;
    }

    let tables = tax_return.tables().context("Invalid tax tables")?;

    info!(
        tax_year = %tax_return.tax_year,
        province = %tax_return.province,
        "computing tax summary"
    );

    let summary = TaxSummaryBuilder::new(&tables)
        .build(
            tax_return.tax_year,
            tax_return.province,
            &tax_return.income,
            &tax_return.deductions,
            &tax_return.credits,
        )
        .context("Couldn't compute tax summary")?;

    let mut suggestions = if options.no_suggestions {
        Vec::new()
    } else {
        SuggestionEngine::new(tax_return.suggestions.clone())
            .context("Invalid suggestion settings")?
            .generate(&tax_return.income, &tax_return.deductions, &summary)
    };
    if options.ranked {
        suggestions = taxsim::suggestions::rank(&suggestions);
    }

    output::print(&summary, &tax_return.credits, &suggestions).context("Couldn't write output")?;

    Ok(())
}
