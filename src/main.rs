use clap::{Parser, Subcommand};
use log::{debug, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use unicalc::academic::{required_final, required_final_for_passing, CourseGrade, CourseInputs};
use unicalc::academic::{HIGH_SCHOLARSHIP_THRESHOLD, SCHOLARSHIP_THRESHOLD};
use unicalc::scientific::History;
use unicalc::store::{FileStore, KeyValueStore, MemoryStore, Persisted};
use unicalc::{AngleMode, Calculator};

const HISTORY_KEY: &str = "history";
const ANGLE_MODE_KEY: &str = "angleMode";

/// Scientific calculator and course grade helper
#[derive(Parser, Debug)]
#[command(name = "unicalc", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    /// Angle unit for sin, cos and tan (DEG or RAD)
    #[arg(short, long)]
    mode: Option<AngleMode>,

    /// JSON file that keeps the history and angle mode between runs
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Number of parsed expressions to cache (0 = disabled)
    #[arg(long, default_value_t = 100)]
    cache_size: usize,

    #[command(subcommand)]
    command: Option<Command>,

    /// Expression to evaluate; starts an interactive session when omitted
    #[arg(allow_hyphen_values = true)]
    expression: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Course total, status and letter grade
    Grade {
        #[arg(long)]
        reg_mid: f64,
        #[arg(long)]
        reg_end: f64,
        #[arg(long = "final")]
        final_score: Option<f64>,
    },
    /// Final exam score needed for passing and scholarships
    Target {
        #[arg(long)]
        reg_term: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    match &args.command {
        Some(Command::Grade {
            reg_mid,
            reg_end,
            final_score,
        }) => print_grade(*reg_mid, *reg_end, *final_score),
        Some(Command::Target { reg_term }) => print_targets(*reg_term),
        None => run_calculator(&args)?,
    }
    Ok(())
}

fn run_calculator(args: &Args) -> io::Result<()> {
    let mut store: Box<dyn KeyValueStore> = match &args.history_file {
        Some(path) => {
            info!("Using history file {}", path.display());
            Box::new(FileStore::new(path))
        }
        None => Box::new(MemoryStore::new()),
    };
    let history_slot: Persisted<History> = Persisted::new(HISTORY_KEY);
    let mode_slot: Persisted<AngleMode> = Persisted::new(ANGLE_MODE_KEY);

    let mode = args
        .mode
        .unwrap_or_else(|| mode_slot.load_or_default(&*store));
    let mut calculator = Calculator::new(args.cache_size).with_mode(mode);
    calculator.restore_history(history_slot.load_or_default(&*store));

    if let Some(expression) = &args.expression {
        let outcome = calculator.calculate(expression);
        history_slot.save(&mut *store, calculator.history());
        match outcome {
            Ok(result) => println!("{}", result),
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("[{}] > ", calculator.mode());
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        debug!("REPL input: {}", input);

        match input {
            "" => {}
            ":quit" | ":q" => break,
            ":deg" | ":rad" => {
                let mode = if input == ":deg" {
                    AngleMode::Deg
                } else {
                    AngleMode::Rad
                };
                calculator.set_mode(mode);
                mode_slot.save(&mut *store, &mode);
            }
            ":history" => {
                if calculator.history().is_empty() {
                    println!("No calculations yet.");
                }
                for entry in calculator.history().entries() {
                    println!("{} = {}", entry.expression, entry.result);
                }
            }
            ":clear" => {
                calculator.clear_history();
                history_slot.save(&mut *store, calculator.history());
            }
            expression => match calculator.calculate(expression) {
                Ok(result) => {
                    println!("{}", result);
                    history_slot.save(&mut *store, calculator.history());
                }
                Err(err) => println!("Error: {}", err),
            },
        }

        print!("[{}] > ", calculator.mode());
        stdout.flush()?;
    }
    println!();
    Ok(())
}

fn print_grade(reg_mid: f64, reg_end: f64, final_score: Option<f64>) {
    let grade = CourseGrade::evaluate(&CourseInputs {
        reg_mid: Some(reg_mid),
        reg_end: Some(reg_end),
        final_score,
        ..Default::default()
    });

    match grade.reg_term {
        Some(reg_term) => println!("RegTerm: {:.2}", reg_term),
        None => println!("RegTerm: -"),
    }
    match grade.total {
        Some(total) => println!("Total:   {:.2}", total),
        None => println!("Total:   -"),
    }
    if let Some(letter) = grade.letter {
        println!(
            "Grade:   {} ({:.2}, {})",
            letter.letter, letter.points, letter.traditional
        );
    }
    println!("Status:  {}", grade.status);
    if let Some(required) = grade.required_for_pass {
        println!("Final needed to pass: {}", required);
    }
}

fn print_targets(reg_term: f64) {
    println!("Pass (> 50):                {}", required_final_for_passing(reg_term));
    println!(
        "Scholarship (>= 70):        {}",
        required_final(reg_term, SCHOLARSHIP_THRESHOLD)
    );
    println!(
        "High scholarship (>= 90):   {}",
        required_final(reg_term, HIGH_SCHOLARSHIP_THRESHOLD)
    );
}
