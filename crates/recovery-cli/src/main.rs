use clap::Parser;
use recovery_cli::cli::{Cli, Commands};
use recovery_cli::common::OutputFormat;
use recovery_core::OptimizationInput;
use recovery_solver::{assemble_result, sequence_for, solve_recovery, RecoverySolverConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn run_solve(
    input: &Path,
    output: Option<&Path>,
    objective: Option<recovery_cli::cli::CliObjective>,
    time_limit_seconds: f64,
    mip_gap: f64,
    format: OutputFormat,
) -> anyhow::Result<()> {
    info!("reading input from {}", input.display());
    let raw_input = fs::read_to_string(input)?;
    let mut optimization_input = OptimizationInput::from_json_str(&raw_input)?;
    if let Some(objective) = objective {
        optimization_input.objective = objective.into();
    }

    let diagnostics = optimization_input.validate();
    if diagnostics.has_errors() {
        anyhow::bail!("input failed validation:\n{diagnostics}");
    }
    if diagnostics.has_warnings() {
        for issue in diagnostics.warnings() {
            tracing::warn!("{issue}");
        }
    }

    info!("building topology graph");
    let graph = recovery_core::TopologyGraph::build(&optimization_input);

    info!("solving recovery MILP (time limit {time_limit_seconds}s, gap {mip_gap})");
    let config = RecoverySolverConfig {
        max_time_seconds: time_limit_seconds,
        mip_gap,
        verbose: false,
    };
    let raw_solution = solve_recovery(&optimization_input, &config)?;

    info!("synthesizing switching order");
    let operations = sequence_for(&optimization_input, &raw_solution, &graph);

    info!("assembling result");
    let result = assemble_result(&optimization_input, &raw_solution, operations);

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Table => format!(
            "status: {}\nobjective_value: {:.4}\noperation_cost: {:.4}\nsafety_region_percent: {:.2}\nswitch operations: {}\n",
            result.status.as_deref().unwrap_or("unknown"),
            result.objective_value,
            result.summary.operation_cost,
            result.summary.safety_region_percent,
            result.summary.total_operations_count,
        ),
    };

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&result)?;
            fs::write(path, json)?;
            info!("wrote result to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let outcome = match &cli.command {
        Some(Commands::Solve {
            input,
            output,
            objective,
            time_limit_seconds,
            mip_gap,
            format,
        }) => run_solve(
            input,
            output.as_deref(),
            *objective,
            *time_limit_seconds,
            *mip_gap,
            *format,
        ),
        None => {
            eprintln!("no subcommand given; try `recovery-cli solve --input <path>`");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("{err:#}");
        std::process::exit(1);
    }
}
