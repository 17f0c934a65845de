//! iniguard CLI
//!
//! Entry point for the `iniguard` command-line tool. Mirrors the shape of
//! `git config`: a bare `NAME` reads, `NAME VALUE` writes, and flags select
//! the other actions.

use clap::{ArgGroup, CommandFactory, Parser};
use iniguard::cli::{self, Action, CliError, OutputOptions, SectionOption};
use iniguard::config::{CliOverrides, EnvOverrides, Settings};
use std::io::Write;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "iniguard")]
#[command(about = "Schema-checked, layered INI configuration", version)]
#[command(group(ArgGroup::new("action").multiple(false)))]
struct Cli {
    /// Option to read or write, as `section.option`
    #[arg(conflicts_with = "action")]
    name: Option<String>,

    /// New value for NAME
    #[arg(requires = "name")]
    value: Option<String>,

    /// List every option of the effective config
    #[arg(long, short = 'l', group = "action", help_heading = "Actions")]
    list: bool,

    /// Open the writable config file in an editor
    #[arg(long, short = 'e', group = "action", help_heading = "Actions")]
    edit: bool,

    /// Remove an option from the writable config file
    #[arg(long, value_name = "NAME", group = "action", help_heading = "Actions")]
    unset: Option<String>,

    /// Remove every option from the writable config file
    #[arg(long, group = "action", help_heading = "Actions")]
    unset_all: bool,

    /// Print the schema
    #[arg(long, group = "action", help_heading = "Actions")]
    list_valid_options: bool,

    /// Report every schema violation in the effective config
    #[arg(long, group = "action", help_heading = "Actions")]
    check: bool,

    /// Prefix values with the file they come from
    #[arg(long)]
    show_origin: bool,

    /// Output --list and --check as JSON
    #[arg(long)]
    json: bool,

    /// Schema file
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Config file layer, lowest precedence first; the last one is writable
    #[arg(long = "file", short = 'f', value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Settings file (default: <config dir>/iniguard/settings.toml)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Keep section and option names as written instead of lowercasing
    #[arg(long)]
    case_sensitive: bool,

    /// Log debug information to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn action(&self) -> Result<Option<Action>, CliError> {
        let action = if self.list {
            Action::List
        } else if self.edit {
            Action::Edit
        } else if let Some(name) = &self.unset {
            Action::Unset(name.parse()?)
        } else if self.unset_all {
            Action::UnsetAll
        } else if self.list_valid_options {
            Action::ListValidOptions
        } else if self.check {
            Action::Check
        } else if let Some(name) = &self.name {
            let name: SectionOption = name.parse()?;
            match &self.value {
                Some(value) => Action::Set(name, value.clone()),
                None => Action::Get(name),
            }
        } else {
            return Ok(None);
        };
        Ok(Some(action))
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            settings: self.settings.clone(),
            schema: self.schema.clone(),
            files: self.files.clone(),
            case_sensitive: self.case_sensitive,
        }
    }
}

fn main() {
    let args = Cli::parse();
    iniguard::logging::init(args.verbose);

    let action = match args.action() {
        Ok(Some(action)) => action,
        Ok(None) => {
            if let Err(e) = write_help(&mut std::io::stdout().lock()) {
                exit_with(e);
            }
            process::exit(0);
        }
        Err(e) => exit_with(e),
    };

    let settings = match Settings::resolve(&args.overrides(), &EnvOverrides::from_env()) {
        Ok(s) => s,
        Err(e) => exit_with(e.into()),
    };

    let output = OutputOptions {
        show_origin: args.show_origin,
        json: args.json,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = cli::run(&settings, action, output, &mut out);
    let _ = out.flush();

    if let Err(e) = result {
        exit_with(e);
    }
}

fn write_help(out: &mut dyn Write) -> Result<(), CliError> {
    write!(out, "{}", Cli::command().render_help())?;
    out.flush()?;
    Ok(())
}

fn exit_with(e: CliError) -> ! {
    tracing::debug!(error = ?e, "command failed");
    eprintln!("error: {}", e);
    process::exit(e.exit_code());
}
