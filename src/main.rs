use anyhow::{Context, Result};
use clap::Parser;
use settlement_fixtures::{Cli, FixtureConfig, generate, setup_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_format())?;

    let config = load_config(&cli)?;
    let target = cli.target()?;
    let selection = target.selection;

    println!(
        "Generating fabricated test data for {} epoch(s): {selection}",
        selection.count()
    );
    println!("Output root: {}", target.output_root.display());
    println!();

    let report = generate(
        selection,
        &target.output_root,
        &config,
        cli.workers.get(),
        |summary| println!("  {summary}"),
    )?;

    println!();
    println!("Generated {} epoch(s) of fabricated input data.", report.epochs);
    if report.epochs > 1 {
        println!("{report}");
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FixtureConfig> {
    match &cli.config {
        Some(path) => FixtureConfig::from_path(path)
            .with_context(|| format!("loading fixture config from {}", path.display())),
        None => Ok(FixtureConfig::default()),
    }
}
