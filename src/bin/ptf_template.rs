//! Command-line front end for placeholder resolution
//!
//! Resolves, normalizes and inspects templates read from an argument, a
//! file or stdin.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};
use ptf_template::{Context, Resolver, ResolverConfig, SyntaxNormalizer};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ptf-template")]
#[command(about = "Resolve {{...}} placeholders in request templates and test data")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, env = "PTF_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every placeholder in a template
    Resolve {
        #[command(flatten)]
        input: Input,

        /// JSON object file whose top-level keys become variables
        #[arg(long, env = "PTF_VARS_FILE")]
        vars: Option<PathBuf>,

        /// Single variable as name=value; the value is parsed as JSON when possible
        #[arg(long = "var", value_name = "NAME=VALUE")]
        var: Vec<String>,

        /// Fail on the first unresolved placeholder
        #[arg(long, env = "PTF_STRICT")]
        strict: bool,

        #[arg(long, env = "PTF_MAX_DEPTH", default_value_t = 10)]
        max_depth: usize,

        #[arg(long, env = "PTF_OPEN_DELIMITER", default_value = "{{")]
        open: String,

        #[arg(long, env = "PTF_CLOSE_DELIMITER", default_value = "}}")]
        close: String,

        /// Rewrite legacy ${...} placeholders before resolving
        #[arg(long)]
        normalize: bool,

        /// Treat the input as a JSON document and resolve every string in it
        #[arg(long)]
        json: bool,
    },
    /// Rewrite legacy ${...} placeholders into {{...}} form
    Normalize {
        #[command(flatten)]
        input: Input,

        /// Convert {{...}} back to ${...} instead
        #[arg(long)]
        reverse: bool,
    },
    /// Check placeholder brace balance in both dialects
    Validate {
        #[command(flatten)]
        input: Input,

        /// Print only VALID or INVALID
        #[arg(short, long)]
        quiet: bool,
    },
    /// List placeholder bodies, one per line
    Variables {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args)]
struct Input {
    /// Template text; reads from stdin if neither this nor --file is given
    template: Option<String>,

    /// File containing the template
    #[arg(short, long, conflicts_with = "template")]
    file: Option<PathBuf>,
}

impl Input {
    fn read(&self) -> Result<String> {
        if let Some(template) = &self.template {
            return Ok(template.clone());
        }
        if let Some(path) = &self.file {
            return fs::read_to_string(path)
                .with_context(|| format!("reading template file {}", path.display()));
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading template from stdin")?;
        Ok(buffer)
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    match run(cli.command) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Resolve {
            input,
            vars,
            var,
            strict,
            max_depth,
            open,
            close,
            normalize,
            json,
        } => {
            let config = ResolverConfig::default()
                .with_throw_on_undefined(strict)
                .with_max_depth(max_depth)
                .with_delimiters(open, close);
            let mut resolver = Resolver::with_context(load_context(vars.as_ref(), &var)?, config);

            let mut text = input.read()?;
            if normalize {
                text = SyntaxNormalizer::normalize(&text);
            }

            if json {
                let mut document: Value =
                    serde_json::from_str(&text).context("parsing input as JSON")?;
                if normalize {
                    document = SyntaxNormalizer::normalize_object(&document);
                }
                let resolved = resolver.resolve_value(&document)?;
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                print!("{}", resolver.resolve(&text)?);
            }
            Ok(0)
        }
        Commands::Normalize { input, reverse } => {
            let text = input.read()?;
            let output = if reverse {
                SyntaxNormalizer::to_legacy_syntax(&text)
            } else {
                SyntaxNormalizer::normalize(&text)
            };
            print!("{output}");
            Ok(0)
        }
        Commands::Validate { input, quiet } => {
            let validation = SyntaxNormalizer::validate_syntax(&input.read()?);
            if quiet {
                println!("{}", if validation.is_valid { "VALID" } else { "INVALID" });
            } else if validation.is_valid {
                println!("✓ Template is valid");
            } else {
                for error in &validation.errors {
                    eprintln!("✗ {error}");
                }
            }
            Ok(if validation.is_valid { 0 } else { 1 })
        }
        Commands::Variables { input } => {
            for name in SyntaxNormalizer::extract_variables(&input.read()?) {
                println!("{name}");
            }
            Ok(0)
        }
    }
}

fn load_context(vars_file: Option<&PathBuf>, vars: &[String]) -> Result<Context> {
    let mut context = Context::new();

    if let Some(path) = vars_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading variables file {}", path.display()))?;
        let Value::Object(map) = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("parsing variables file {}", path.display()))?
        else {
            bail!("variables file {} must contain a JSON object", path.display());
        };
        context.variables.extend(map);
    }

    for assignment in vars {
        let Some((name, raw)) = assignment.split_once('=') else {
            bail!("--var expects NAME=VALUE, got '{assignment}'");
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        context.variables.insert(name.trim().to_string(), value);
    }

    Ok(context)
}
