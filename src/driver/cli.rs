use clap::{App, AppSettings, Arg, ArgMatches, ErrorKind, SubCommand};
use std::path::PathBuf;

use super::CommandError;
use crate::interpreter::{coerce_literal, CoercionError, Interpreter, NamedArgs, RuntimeError};
use crate::loader::{Loader, UnitDescriptor};
use crate::syntax::{Node, Parser, UnaryOperator};
use crate::value::Value;

#[derive(Debug, PartialEq)]
pub enum CommandOptions {
    /// Load every unit under `root` and report cycles.
    Check { root: PathBuf },
    Run {
        root: PathBuf,
        function: String,
        args: NamedArgs,
        json: bool,
    },
    Describe { root: PathBuf, function: String },
}

#[derive(Debug, Default)]
pub struct Command {}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the command line `args` (program name first) and returns its output.
    pub fn run(&self, args: impl ExactSizeIterator<Item = String>) -> Result<String, CommandError> {
        let options = match parse_options(args) {
            Ok(options) => options,
            Err(Usage::Message(message)) => return Ok(message),
            Err(Usage::Error(err)) => return Err(err),
        };

        match options {
            CommandOptions::Check { root } => check(root),
            CommandOptions::Run {
                root,
                function,
                args,
                json,
            } => run(root, &function, args, json),
            CommandOptions::Describe { root, function } => describe(root, &function),
        }
    }
}

fn check(root: PathBuf) -> Result<String, CommandError> {
    let mut loader = Loader::new();
    loader.load_directory(&root)?;

    let mut output = String::new();
    for unit in loader.units() {
        let dependencies = unit
            .dependencies()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>();
        output.push_str(&format!("{} -> [{}]\n", unit.name(), dependencies.join(", ")));
    }

    let library = loader.into_library()?;
    output.push_str(&format!("{} unit(s), no dependency cycle\n", library.len()));

    Ok(output)
}

fn run(root: PathBuf, function: &str, args: NamedArgs, json: bool) -> Result<String, CommandError> {
    let mut loader = Loader::new();
    loader.load_directory(&root)?;

    let interpreter = Interpreter::from(loader.into_library()?);
    let value = interpreter.invoke(function, args)?;

    if json {
        Ok(format!("{}\n", serde_json::to_string(&value)?))
    } else {
        Ok(format!("{}\n", value))
    }
}

fn describe(root: PathBuf, function: &str) -> Result<String, CommandError> {
    let mut loader = Loader::new();
    loader.load_directory(&root)?;

    match loader.get(function) {
        Some(unit) => Ok(describe_unit(unit)),
        None => Err(RuntimeError::UnknownFunction(function.to_string()).into()),
    }
}

fn describe_unit(unit: &UnitDescriptor) -> String {
    let mut output = format!("{} ({})\n", unit.name(), unit.location());

    for (name, param) in unit.parameters().iter() {
        output.push_str(&format!("  @arg {}", name));
        if let Some(ref ty) = param.ty {
            output.push_str(&format!(" {}", ty));
        }
        if param.optional {
            output.push_str(" (optional)");
        }
        output.push('\n');
    }
    for (name, info) in unit.fields() {
        let keyword = if info.is_view { "@view" } else { "@field" };
        output.push_str(&format!("  {} {}: {}\n", keyword, name, info.ty));
    }
    for dependency in unit.dependencies() {
        output.push_str(&format!("  calls {}\n", dependency));
    }

    output
}

#[derive(Debug)]
enum Usage {
    /// `--help` or `--version` output.
    Message(String),
    Error(CommandError),
}

impl From<CommandError> for Usage {
    fn from(err: CommandError) -> Self {
        Usage::Error(err)
    }
}

impl From<String> for Usage {
    fn from(message: String) -> Self {
        Usage::Error(CommandError::InvalidOption(message))
    }
}

fn parse_options(args: impl ExactSizeIterator<Item = String>) -> Result<CommandOptions, Usage> {
    let root = Arg::with_name("ROOT")
        .help("Directory holding the .jn units")
        .required(true)
        .index(1);
    let function = Arg::with_name("FUNCTION")
        .help("Fully-qualified function name, e.g. test:add")
        .required(true)
        .index(2);

    let app = App::new("jnane")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("check")
                .about("Loads every unit and checks for dependency cycles")
                .arg(root.clone()),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Invokes a function with named arguments")
                .arg(root.clone())
                .arg(function.clone())
                .arg(
                    Arg::with_name("arg")
                        .long("arg")
                        .value_name("NAME=VALUE")
                        .help("Named argument, VALUE is a literal (repeatable)")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1),
                )
                .arg(
                    Arg::with_name("args")
                        .long("args")
                        .value_name("JSON")
                        .help("Named arguments as a JSON object")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Prints the result as JSON"),
                ),
        )
        .subcommand(
            SubCommand::with_name("describe")
                .about("Prints the parameters and annotations of a function")
                .arg(root)
                .arg(function),
        );

    let matches = app.get_matches_from_safe(args).map_err(|err| match err.kind {
        ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => Usage::Message(err.message),
        _ => Usage::Error(CommandError::InvalidOption(err.message)),
    })?;

    let options = match matches.subcommand() {
        ("check", Some(matches)) => CommandOptions::Check {
            root: root_of(matches),
        },
        ("run", Some(matches)) => CommandOptions::Run {
            root: root_of(matches),
            function: function_of(matches),
            args: named_args(matches)?,
            json: matches.is_present("json"),
        },
        ("describe", Some(matches)) => CommandOptions::Describe {
            root: root_of(matches),
            function: function_of(matches),
        },
        (name, _) => return Err(format!("unknown command `{}`", name).into()),
    };

    Ok(options)
}

fn root_of(matches: &ArgMatches<'_>) -> PathBuf {
    PathBuf::from(matches.value_of("ROOT").unwrap_or("."))
}

fn function_of(matches: &ArgMatches<'_>) -> String {
    matches.value_of("FUNCTION").unwrap_or_default().to_string()
}

// `--args` first, then each `--arg` on top of it.
fn named_args(matches: &ArgMatches<'_>) -> Result<NamedArgs, CommandError> {
    let mut args = match matches.value_of("args") {
        Some(json) => serde_json::from_str::<NamedArgs>(json)?,
        None => NamedArgs::new(),
    };

    for arg in matches.values_of("arg").into_iter().flatten() {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => (name.trim(), value),
            _ => return Err(format!("expected NAME=VALUE, found `{}`", arg).into()),
        };

        args.insert(name.to_string(), parse_value(value)?);
    }

    Ok(args)
}

/// Reads a command-line value as a Jnane literal: `3`, `-2.5`, `"text"`, `Vrai`,
/// `null`. Anything else is taken as a plain string.
pub fn parse_value(text: &str) -> Result<Value, CoercionError> {
    let program = match Parser::parse_string(text) {
        Ok(program) => program,
        Err(_) => return Ok(Value::from(text)),
    };

    let value = match program.body.as_slice() {
        [Node::Literal(literal)] => coerce_literal(literal)?,
        [Node::Unary {
            operator: UnaryOperator::Minus,
            operand,
        }] => match operand.as_ref() {
            Node::Literal(literal) => match coerce_literal(literal)? {
                Value::Integer(n) => Value::Integer(-n),
                Value::Decimal(n) => Value::Decimal(-n),
                _ => Value::from(text),
            },
            _ => Value::from(text),
        },
        _ => Value::from(text),
    };

    Ok(value)
}
