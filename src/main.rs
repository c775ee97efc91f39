use bindexpr::cli::{self, CliError, EvalOptions};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "bindexpr")]
#[command(about = "bindexpr - Parse, inspect and evaluate data-binding expressions")]
#[command(version)]
struct Cli {
    /// Log compilation and cache activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tokens of an expression
    Tokens {
        /// The expression to tokenize
        expression: String,
    },

    /// Print the syntax tree of an expression as JSON
    Ast {
        /// The expression to parse
        expression: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Compile an expression and report what it depends on
    Check {
        /// The expression to compile
        expression: String,
    },

    /// Evaluate an expression against a JSON scope
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON scope (reads from stdin if not provided)
        #[arg(short, long)]
        scope: Option<String>,

        /// JSON locals, shadowing the scope
        #[arg(short, long)]
        locals: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Tokens { expression } => {
            cli::render_tokens(&expression).and_then(|tokens| print_json(&tokens, false))
        }
        Commands::Ast { expression, pretty } => {
            cli::render_ast(&expression).and_then(|ast| print_json(&ast, pretty))
        }
        Commands::Check { expression } => {
            cli::inspect(&expression).and_then(|report| print_json(&report.to_json(), true))
        }
        Commands::Eval {
            expression,
            scope,
            locals,
            pretty,
        } => run_eval(expression, scope, locals, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_eval(
    expression: String,
    scope: Option<String>,
    locals: Option<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let scope = match scope {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer).filter(|b| !b.trim().is_empty())
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        scope,
        locals,
    };

    let output = cli::execute_eval(&options)?;
    print_json(&output, pretty)
}
