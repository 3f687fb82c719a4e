//! # Physolve CLI Application
//!
//! Solve one physics equation from the terminal.
//!
//! ```text
//! phys_cli "f = m * a" m=10kg "a=2 m/s^2"
//! phys_cli --sentence "find the force when mass is 10kg and acceleration is 2m/s^2"
//! phys_cli            # interactive prompts
//! ```
//!
//! Exit code 0 on success, 1 when the solve fails, 2 on a usage error.

mod sentence;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use phys_core::expr::ParseOptions;
use phys_core::{load_settings, solve_text, Equation, PhysError, Solution, SolverSettings, UnitSystem};

const EXIT_SOLVE_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

const USAGE: &str = "\
Usage:
  phys_cli <equation> [name=value ...] [--json] [--settings <file>] [--verbose]
  phys_cli --sentence \"<english sentence>\" [--json] [--settings <file>] [--verbose]
  phys_cli                     interactive prompt

Values carry their unit: m=10kg \"a=2 m/s^2\" v=3e8m/s r=5ohm";

#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Direct {
        equation: String,
        knowns: Vec<(String, String)>,
    },
    Sentence(String),
    Interactive,
}

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    mode: Mode,
    json: bool,
    verbose: bool,
    settings_path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut json = false;
    let mut verbose = false;
    let mut settings_path = None;
    let mut sentence = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--settings" => {
                let path = iter.next().ok_or("--settings needs a file path")?;
                settings_path = Some(PathBuf::from(path));
            }
            "--sentence" => {
                let text = iter.next().ok_or("--sentence needs a sentence")?;
                sentence = Some(text.clone());
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
            _ => positional.push(arg.clone()),
        }
    }

    let mode = match (sentence, positional.split_first()) {
        (Some(_), Some(_)) => {
            return Err("--sentence cannot be combined with an equation".to_string())
        }
        (Some(text), None) => Mode::Sentence(text),
        (None, None) => Mode::Interactive,
        (None, Some((equation, rest))) => {
            let knowns = rest
                .iter()
                .map(|pair| match pair.split_once('=') {
                    Some((name, value)) if !name.trim().is_empty() => {
                        Ok((name.trim().to_string(), value.trim().to_string()))
                    }
                    _ => Err(format!("expected name=value, got '{}'", pair)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Mode::Direct {
                equation: equation.clone(),
                knowns,
            }
        }
    };

    Ok(CliArgs {
        mode,
        json,
        verbose,
        settings_path,
    })
}

fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

/// Ask for an equation, then a value for each of its variables.
fn interactive_request(settings: &SolverSettings) -> Result<(String, Vec<(String, String)>), PhysError> {
    println!("Physolve - Physics Equation Solver");
    println!("==================================");
    println!();

    let equation_text = prompt_line("Equation (e.g. f = m * a): ").unwrap_or_default();
    let options = ParseOptions {
        reserve_euler: settings.reserve_euler,
        ..ParseOptions::default()
    };
    let equation = Equation::parse_with(&equation_text, options)?;

    println!("Enter a value with its unit for each known variable; leave the unknown blank.");
    let mut knowns = Vec::new();
    for var in &equation.variables {
        if let Some(value) = prompt_line(&format!("  {} = ", var)).filter(|v| !v.is_empty()) {
            knowns.push((var.clone(), value));
        }
    }
    println!();
    Ok((equation_text, knowns))
}

fn print_solution(solution: &Solution, json: bool) {
    if json {
        match serde_json::to_string_pretty(solution) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error: {}", e),
        }
    } else {
        println!("{}", solution);
    }
}

fn print_error(error: &PhysError, json: bool) {
    eprintln!("Error: {}", error);
    if json {
        if let Ok(text) = serde_json::to_string_pretty(error) {
            eprintln!("{}", text);
        }
    }
}

fn run(cli: CliArgs) -> i32 {
    let settings = match &cli.settings_path {
        Some(path) => match load_settings(path) {
            Ok(settings) => settings,
            Err(e) => {
                print_error(&e, cli.json);
                return EXIT_USAGE;
            }
        },
        None => SolverSettings::default(),
    };

    let (equation, knowns) = match cli.mode {
        Mode::Direct { equation, knowns } => (equation, knowns),
        Mode::Sentence(text) => {
            let parsed = sentence::parse_sentence(&text);
            let Some(template) = parsed.template else {
                eprintln!("Error: no known equation matches that sentence");
                return EXIT_SOLVE_ERROR;
            };
            if !cli.json {
                println!("Using {}: {}", template.name, template.equation);
            }
            (template.equation.to_string(), parsed.knowns.into_iter().collect())
        }
        Mode::Interactive => match interactive_request(&settings) {
            Ok(request) => request,
            Err(e) => {
                print_error(&e, cli.json);
                return EXIT_SOLVE_ERROR;
            }
        },
    };

    log::debug!("solving '{}' with {:?}", equation, knowns);
    match solve_text(&equation, knowns, UnitSystem::standard(), &settings) {
        Ok(solution) => {
            print_solution(&solution, cli.json);
            0
        }
        Err(e) => {
            print_error(&e, cli.json);
            EXIT_SOLVE_ERROR
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            std::process::exit(EXIT_USAGE);
        }
    };

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    std::process::exit(run(cli));
}
