use automata::dtm::Configuration;
use automata::{
    AutomatonError, DefinitionLoader, Device, Limits, Outcome, Registry, Samples,
    DEFAULT_MAX_STEPS,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The definition document to load
    #[clap(short, long, global = true, conflicts_with = "sample")]
    definition: Option<PathBuf>,

    /// Use a built-in sample instead of a definition file
    #[clap(short, long, global = true)]
    sample: Option<String>,

    /// Step bound for tape machines
    #[clap(long, global = true, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Print debug logs
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the definition and print a summary
    Check,
    /// Test whether each input is accepted
    Accept {
        /// Inputs to test
        inputs: Vec<String>,
    },
    /// Run a tape machine and print the final tape
    Run {
        /// The initial tape contents
        #[clap(default_value = "")]
        input: String,

        /// Print each configuration of the execution
        #[clap(short, long)]
        trace: bool,
    },
    /// Print the transition graph as Graphviz DOT
    Dot,
    /// Print the stored device summary as JSON
    Info,
    /// List the built-in samples
    Samples,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs the selected command. `Ok(false)` means an input was rejected or a machine did not halt.
fn execute(cli: &Cli) -> Result<bool, AutomatonError> {
    if let Command::Samples = cli.command {
        for sample in Samples::all() {
            println!("{}\t{}", sample.name, sample.definition.kind());
        }
        return Ok(true);
    }

    let device = load_device(cli)?;

    match &cli.command {
        Command::Check => {
            println!(
                "{} definition is valid: {} states, {} transitions",
                device.kind(),
                device.states().len(),
                device.transition_count()
            );
            Ok(true)
        }
        Command::Accept { inputs } => {
            let mut all_accepted = true;
            for input in inputs {
                let accepted = device.accepts(input)?;
                all_accepted &= accepted;
                println!(
                    "{:?}\t{}",
                    input,
                    if accepted { "accepted" } else { "rejected" }
                );
            }
            Ok(all_accepted)
        }
        Command::Run { input, trace } => run(&device, input, *trace),
        Command::Dot => {
            println!("{}", device.graph());
            Ok(true)
        }
        Command::Info => {
            let registry = Registry::new();
            let id = registry.insert(device)?;
            let info = registry.info(&id)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(true)
        }
        Command::Samples => Ok(true),
    }
}

fn load_device(cli: &Cli) -> Result<Device, AutomatonError> {
    let definition = match (&cli.definition, &cli.sample) {
        (Some(path), _) => DefinitionLoader::load(path)?,
        (None, Some(name)) => Samples::by_name(name)?.definition.clone(),
        (None, None) => {
            return Err(AutomatonError::NotFound(
                "Either --definition or --sample is required".to_string(),
            ))
        }
    };

    let limits = Limits {
        max_steps: cli.max_steps,
    };
    tracing::debug!(
        kind = %definition.kind(),
        states = definition.states().len(),
        transitions = definition.transition_count(),
        max_steps = limits.max_steps,
        "definition loaded"
    );

    Ok(Device::build_with_limits(&definition, limits)?)
}

fn run(device: &Device, input: &str, trace: bool) -> Result<bool, AutomatonError> {
    let machine = match device {
        Device::Dtm(machine) => machine,
        other => {
            return Err(AutomatonError::Unsupported {
                operation: "run",
                kind: other.kind(),
            })
        }
    };

    if trace {
        let print_config = |config: &Configuration| {
            println!(
                "Step: {}, State: {}, Head: {}, Tape: {}",
                config.step,
                config.state,
                config.head,
                config.tape_contents()
            );
        };

        let mut execution = machine.execute(input)?;
        for config in execution.by_ref() {
            print_config(&config);
        }

        let outcome = execution.outcome();
        println!("\nMachine stopped: {:?}", outcome);
        println!("\nFinal tape:");
        println!("{}", execution.configuration().tape_contents());
        return Ok(outcome == Some(Outcome::Accept));
    }

    let result = machine.run(input)?;
    println!("{}", result.final_tape);
    if !result.halted {
        eprintln!("machine did not halt within {} steps", result.steps);
    }
    Ok(result.outcome == Outcome::Accept)
}
