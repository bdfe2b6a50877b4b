//! mend CLI

use clap::{Args, Parser, Subcommand};
use mend::align::{NameAlignment, StructuralMapping, VariableMapping};
use mend::error::report_error;
use mend::interp::{ExecConfig, Interpreter};
use mend::localize::ErrorLocalizer;
use mend::model::{Input, Program, json};
use mend::pipeline;
use mend::repair::format_repairs;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mend", version, about = "Trace-based repair of student programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program and print its trace
    Run {
        /// Program in JSON form
        program: PathBuf,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Print the error locations of a submission
    Localize {
        #[command(flatten)]
        pair: PairArgs,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
    /// Print repair candidates for a submission
    Repair {
        #[command(flatten)]
        pair: PairArgs,
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        exec: ExecArgs,
    },
}

#[derive(Args)]
struct PairArgs {
    /// Reference program in JSON form
    reference: PathBuf,
    /// Submitted program in JSON form
    submission: PathBuf,
    /// Function to localize and repair
    #[arg(long, default_value = "main")]
    function: String,
    /// Structural mapping in JSON form (default: align by location ids)
    #[arg(long)]
    structural: Option<PathBuf>,
    /// Variable mapping in JSON form (default: align by variable names)
    #[arg(long)]
    variables: Option<PathBuf>,
}

#[derive(Args)]
struct InputArgs {
    /// Stream input, whitespace separated; repeat for several runs
    #[arg(short, long = "input")]
    input: Vec<String>,
    /// JSON array of `{"inputs": [..], "args": [..]}` objects
    #[arg(long)]
    inputs_file: Option<PathBuf>,
}

#[derive(Args)]
struct ExecArgs {
    /// Entry function
    #[arg(long, default_value = "main")]
    entry: String,
    /// Maximum number of visited locations per run
    #[arg(long, default_value_t = 50_000)]
    steps: usize,
    /// Wall-clock limit per run in seconds, 0 for none
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

impl ExecArgs {
    fn config(&self) -> ExecConfig {
        let limit = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        ExecConfig::default()
            .with_entry(self.entry.clone())
            .with_step_limit(self.steps)
            .with_time_limit(limit)
    }
}

fn main() {
    env_logger::Builder::from_default_env().init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            program,
            inputs,
            exec,
        } => run_program(&program, &inputs, &exec),
        Command::Localize { pair, inputs, exec } => localize(&pair, &inputs, &exec),
        Command::Repair { pair, inputs, exec } => repair(&pair, &inputs, &exec),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Decode a JSON file, printing a report that points at malformed text
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let filename = path.display().to_string();
    let source = std::fs::read_to_string(path)
        .map_err(|e| mend::Error::io_error(format!("{filename}: {e}")))?;
    json::from_str(&source).map_err(|e| {
        let err = mend::Error::decode(filename.clone(), e);
        report_error(&filename, &source, &err).ok();
        err.into()
    })
}

fn load_inputs(args: &InputArgs) -> Result<Vec<Input>, Box<dyn std::error::Error>> {
    let mut inputs: Vec<Input> = args.input.iter().map(|text| Input::from_stream(text)).collect();
    if let Some(path) = &args.inputs_file {
        inputs.extend(load_json::<Vec<Input>>(path)?);
    }
    if inputs.is_empty() {
        inputs.push(Input::default());
    }
    Ok(inputs)
}

fn run_program(
    path: &Path,
    inputs: &InputArgs,
    exec: &ExecArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let program: Program = load_json(path)?;
    let interpreter = Interpreter::new(exec.config());
    for input in load_inputs(inputs)? {
        let trace = interpreter.execute_program(&program, &input)?;
        println!("{input}");
        for entry in &trace {
            println!("  {entry}");
        }
        if trace.is_truncated() {
            println!("  (truncated)");
        }
    }
    Ok(())
}

struct LoadedPair {
    reference: Program,
    submission: Program,
    structural: StructuralMapping,
    variables: VariableMapping,
}

fn load_pair(pair: &PairArgs) -> Result<LoadedPair, Box<dyn std::error::Error>> {
    use mend::align::{StructuralAlignment, VariableAlignment};

    let reference: Program = load_json(&pair.reference)?;
    let submission: Program = load_json(&pair.submission)?;
    let aligner = NameAlignment::new();
    let structural = match &pair.structural {
        Some(path) => load_json(path)?,
        None => aligner.generate_structural_alignment(&reference, &submission)?,
    };
    let variables = match &pair.variables {
        Some(path) => load_json(path)?,
        None => aligner.generate_variable_alignment(&reference, &submission, &structural)?,
    };
    Ok(LoadedPair {
        reference,
        submission,
        structural,
        variables,
    })
}

fn localize(
    pair: &PairArgs,
    inputs: &InputArgs,
    exec: &ExecArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_pair(pair)?;
    let localisation = ErrorLocalizer::new().localize_errors(
        &loaded.submission,
        &loaded.reference,
        &load_inputs(inputs)?,
        &pair.function,
        &loaded.structural,
        &loaded.variables,
        &Interpreter::new(exec.config()),
    )?;
    if localisation.is_empty() {
        println!("No error locations found");
    } else {
        print!("{localisation}");
    }
    Ok(())
}

fn repair(
    pair: &PairArgs,
    inputs: &InputArgs,
    exec: &ExecArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_pair(pair)?;
    let outcome = pipeline::repair_with_mappings(
        &loaded.reference,
        &loaded.submission,
        &load_inputs(inputs)?,
        &pair.function,
        loaded.structural,
        loaded.variables,
        exec.config(),
    )?;
    if outcome.candidates.is_empty() {
        println!("No repair found");
        return Ok(());
    }
    for (i, candidate) in outcome.candidates.iter().enumerate() {
        println!("Candidate {} (cost {}):", i + 1, candidate.cost());
        println!("{}", format_repairs(candidate.local_repairs()));
    }
    Ok(())
}
