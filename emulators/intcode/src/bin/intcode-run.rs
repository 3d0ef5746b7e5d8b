use anyhow::Context;
use clap::Parser;
use intcode::{
    amplifier::{best_phase_sequence, run_chain, Topology},
    disasm::disassemble,
    Machine, Program,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "intcode-run",
    about = "Run an Intcode program and report what it emitted."
)]
struct Args {
    /// Program file (comma-separated integers). Reads stdin when omitted or "-".
    #[arg(value_name = "PROGRAM")]
    program: Option<PathBuf>,

    /// Values queued on the input channel, in order.
    #[arg(
        short,
        long,
        value_name = "N",
        num_args = 1..,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    input: Vec<i64>,

    /// Fault once this many instructions have executed.
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Run an amplifier chain, one machine per phase setting.
    #[arg(
        long,
        value_name = "N",
        num_args = 1..,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    phases: Vec<i64>,

    /// Feed the last amplifier's output back into the first.
    #[arg(long, default_value_t = false, requires = "phases")]
    feedback: bool,

    /// Try every ordering of --phases and report the best.
    #[arg(long, default_value_t = false, requires = "phases")]
    search: bool,

    /// Print a disassembly of the program and exit.
    #[arg(long, default_value_t = false, conflicts_with_all = ["phases", "json"])]
    disasm: bool,

    /// Emit a JSON report instead of plain text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    last_output: Option<i64>,
    outputs: &'a [i64],
    steps: u64,
    memory: &'a [i64],
}

#[derive(Serialize)]
struct ChainReport {
    phases: Vec<i64>,
    signal: Option<i64>,
}

fn read_source(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("reading program {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let source = read_source(args.program.as_ref())?;
    let program = Program::parse(&source)?;
    info!(len = program.len(), "program loaded");

    if args.disasm {
        for line in disassemble(&program) {
            println!("{line}");
        }
        return Ok(());
    }

    if !args.phases.is_empty() {
        return run_amplifiers(&args, &program);
    }

    let input: VecDeque<i64> = args.input.iter().copied().collect();
    let mut machine = Machine::from_program(program).with_input(input);
    if let Some(limit) = args.max_steps {
        machine = machine.with_step_limit(limit);
    }
    let last = machine.run()?;

    if args.json {
        let report = RunReport {
            last_output: last,
            outputs: machine.outputs(),
            steps: machine.steps(),
            memory: machine.memory(),
        };
        serde_json::to_writer(io::stdout(), &report)?;
        println!();
    } else {
        for value in machine.outputs() {
            println!("{value}");
        }
        match last {
            Some(value) => println!("last output: {value}"),
            None => println!("last output: none"),
        }
    }
    Ok(())
}

fn run_amplifiers(args: &Args, program: &Program) -> anyhow::Result<()> {
    let topology = if args.feedback {
        Topology::Feedback
    } else {
        Topology::Series
    };
    let signal = args.input.first().copied().unwrap_or(0);

    let report = if args.search {
        match best_phase_sequence(program, &args.phases, signal, topology)? {
            Some((value, phases)) => ChainReport {
                phases,
                signal: Some(value),
            },
            None => ChainReport {
                phases: args.phases.clone(),
                signal: None,
            },
        }
    } else {
        ChainReport {
            phases: args.phases.clone(),
            signal: run_chain(program, &args.phases, signal, topology)?,
        }
    };

    if args.json {
        serde_json::to_writer(io::stdout(), &report)?;
        println!();
    } else {
        let phases = report
            .phases
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");
        match report.signal {
            Some(value) => println!("phases {phases}: signal {value}"),
            None => println!("phases {phases}: no signal"),
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intcode=warn,intcode_run=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}
