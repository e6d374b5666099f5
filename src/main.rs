use clap::{Parser as ClapParser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use qualex::cli::{self, CheckOptions, CheckResult, CliError, RenderCommandOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "qualex")]
#[command(about = "qualex - match JSON objects with qualifier expressions and render them as parameterized queries")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an expression and evaluate it against JSON input
    Check {
        /// The expression to evaluate
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the canonical and parameterized forms of an expression
    Render {
        /// The expression to render
        expression: String,

        /// Identification variable prepended to object paths
        #[arg(short, long)]
        root: Option<String>,

        /// Parameter value as name=value (repeatable)
        #[arg(short = 'P', long = "param")]
        params: Vec<String>,
    },
}

fn init_logging(verbose: bool) -> Option<LoggerHandle> {
    let level = if verbose { "debug" } else { "warn" };
    match Logger::try_with_env_or_str(level).and_then(|logger| logger.start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            expression,
            input,
            pretty,
            syntax_only,
        } => run_check(expression, input, pretty, syntax_only),
        Commands::Render {
            expression,
            root,
            params,
        } => run_render(expression, root, params),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        input,
        pretty,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(canonical) => {
            println!("Syntax is valid");
            println!("{}", canonical);
        }
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_render(expression: String, root: Option<String>, params: Vec<String>) -> Result<(), CliError> {
    let params = params
        .iter()
        .map(|raw| cli::parse_param(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let result = cli::execute_render(&RenderCommandOptions {
        expression,
        root,
        params,
    })?;

    println!("canonical:     {}", result.canonical);
    println!("parameterized: {}", result.parameterized.text);
    for (i, value) in result.parameterized.bindings.iter().enumerate() {
        println!("  ?{} = {} ({})", i + 1, value, value.type_name());
    }
    Ok(())
}
