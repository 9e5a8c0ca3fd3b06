use clap::{Parser, Subcommand};
use exprcalc::{eval_expr, ops, parse_expr, Context, Lexer, ParseError};
use miette::{IntoDiagnostic, WrapErr};
use std::io::{self, BufRead, Write};
use tracing::Level;

const SAMPLES: &[&str] = &[
    "1",
    "1+2",
    "(1+3)",
    "(((1)+((4))))",
    "1 - 2 + 3",
    "(1 - 2) + 3",
    "1.2",
    "3,4",
    "e + pi",
    "sin(pi * 180)",
    "cos((pi / pi) * 180)",
    "tan(e ^ 1)",
    "log(1)",
    "ln(1)",
    "exp(1)",
    "sqrt(1)",
    "abs(1)",
    "|2 + 4|",
    "1 + 2 * 3",
    "2 * 3 + 1",
    "- 1 + 2",
    "1 + - 2",
    "- - 1",
    "+ + 1",
    "3t * 8",
    "8 + 3t",
    "8 + -3t",
    "4 + 7t^2",
    "4 + (2+7t^2+3)",
    "&",
];

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log parser and evaluator activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of an expression
    Tokenize { expression: String },
    /// Print the canonical form and tree of an expression
    Parse { expression: String },
    /// Evaluate an expression
    Eval {
        expression: String,
        /// Variable binding, e.g. `--var t=2`
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, f64)>,
    },
    /// Run the built-in sample expressions
    Demo {
        #[arg(short, long, default_value_t = 2.0, allow_negative_numbers = true)]
        t: f64,
    },
    /// Interactive calculator; `t = <expr>` rebinds t
    Calc {
        #[arg(long = "var", value_parser = parse_binding)]
        vars: Vec<(String, f64)>,
    },
}

fn parse_binding(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid value for '{}': {err}", name.trim()))?;
    Ok((name.trim().to_string(), value))
}

fn report_parse_error(input: &str, err: &ParseError) {
    let pad = " ".repeat(err.offset());
    println!();
    println!("{input}");
    println!("{pad}^");
    println!("{pad}{err}");
    println!();
}

fn demo(t: f64) {
    let mut ctx = Context::new();
    ctx.set_variable("t", t);

    for input in SAMPLES {
        match parse_expr(input) {
            Ok(expr) => match eval_expr(&expr, &ctx) {
                Ok(value) => println!(
                    "{:<20} = {:<30} = {}",
                    input,
                    expr.print(),
                    ops::format_number(value)
                ),
                Err(err) => println!("{:<20} = {:<30} : {}", input, expr.print(), err),
            },
            Err(err) => report_parse_error(input, &err),
        }
    }
}

fn calc(mut ctx: Context) -> miette::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock();

    loop {
        print!("calc> ");
        io::stdout().flush().into_diagnostic()?;

        let mut input = String::new();
        let read = lines
            .read_line(&mut input)
            .into_diagnostic()
            .wrap_err("reading stdin failed")?;
        if read == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        let (target, source) = match input.split_once('=') {
            Some((name, rhs)) if name.trim() == "t" => (Some("t"), rhs.trim()),
            _ => (None, input),
        };

        let expr = match parse_expr(source) {
            Ok(expr) => expr,
            Err(err) => {
                eprintln!("{:?}", miette::Report::new(err));
                continue;
            }
        };

        match eval_expr(&expr, &ctx) {
            Ok(value) => match target {
                Some(name) => {
                    ctx.set_variable(name, value);
                    println!("{name} = {}", ops::format_number(value));
                }
                None => println!("{expr} = {}", ops::format_number(value)),
            },
            Err(err) => eprintln!("{:?}", miette::Report::new(err)),
        }
    }

    Ok(())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Tokenize { expression } => {
            for token in Lexer::new(&expression) {
                println!(
                    "{:<18} {:?} {}..{}",
                    token.kind.name(),
                    token.slice,
                    token.offset,
                    token.end()
                );
            }
        }
        Commands::Parse { expression } => {
            let expr = parse_expr(&expression)?;
            println!("{expr}");
            println!("{expr:#?}");
        }
        Commands::Eval { expression, vars } => {
            let ctx: Context = vars.into_iter().collect();
            let expr = parse_expr(&expression)?;
            let value = eval_expr(&expr, &ctx)?;
            println!("{value}");
        }
        Commands::Demo { t } => demo(t),
        Commands::Calc { vars } => calc(vars.into_iter().collect())?,
    }

    Ok(())
}
