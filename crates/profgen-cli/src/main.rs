mod args;
mod logging;
mod summary;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use profgen::profiling::summary_rows;
use profgen::{
    generate_profiled_module, AggregationPolicy, CallHistory, GenerateOptions, InMemoryModel,
};
use tracing::info;

use args::{Cli, Commands, GenerateArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level, cli.log_json);

    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Summarize {
            history,
            aggregation,
            json,
        } => run_summarize(&history, aggregation, json),
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let options = args.apply(GenerateOptions::from_env());
    let description = fs::read_to_string(&args.graph)
        .with_context(|| format!("failed to read graph description {}", args.graph.display()))?;
    let model = InMemoryModel::from_json(&description)
        .with_context(|| format!("invalid graph description {}", args.graph.display()))?;
    let module = generate_profiled_module(&model, &options)
        .with_context(|| format!("failed to generate code for {}", args.graph.display()))?;

    match &args.out {
        Some(path) => {
            fs::write(path, &module)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(out = %path.display(), bytes = module.len(), "wrote profiled module");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(module.as_bytes())
                .context("failed to write generated code to stdout")?;
        }
    }
    Ok(())
}

fn run_summarize(path: &Path, aggregation: AggregationPolicy, json: bool) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read call history {}", path.display()))?;
    let history = CallHistory::from_json(&text, aggregation)
        .with_context(|| format!("invalid call history {}", path.display()))?;
    info!(calls = history.len(), %aggregation, "summarizing call history");

    let rows = summary_rows(&history.average_per_operator());
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", summary::format_table(&rows, history.len()));
    }
    Ok(())
}
