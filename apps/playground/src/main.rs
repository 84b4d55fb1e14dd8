use anyhow::Context;
use clap::Parser;
use fkit_logger::Logger;
use fkit_playground::Playground;
use fkit_playground::args::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logger = Logger::builder().name(env!("CARGO_PKG_NAME")).level(args.level);
    if let Some(dir) = &args.log_dir {
        logger = logger.log_dir(dir);
    }
    let _log = logger.init()?;

    let report = Playground::builder()
        .variables(&args.variables)
        .features(args.features)
        .build()?
        .run()
        .with_context(|| format!("Playground run over {} failed", args.variables.display()))?;

    tracing::info!(
        exposures = report.exposures,
        malformed = report.malformed.len(),
        "Playground finished"
    );

    if args.json {
        print_json(&serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_json(rendered: &str) {
    println!("{rendered}");
}
