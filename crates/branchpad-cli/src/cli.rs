//! Command-line surface
//!
//! Built with clap's builder API; [`Action::from_matches`] turns the parsed
//! arguments into a typed action.

use branchpad_core::{CellId, ParamValue, Parameter};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// A `--param` value that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamSpecError {
    /// No `=` separating name and values
    #[error("expected name=min:max:step or name=a,b,c, got '{0}'")]
    Malformed(String),
    /// Range member is not a number
    #[error("'{value}' in parameter '{name}' is not a number")]
    NotANumber {
        /// Parameter name
        name: String,
        /// Offending text
        value: String,
    },
}

/// Parse one `--param` value
///
/// `name=min:max:step` declares a numeric range; `name=a,b,c` declares
/// options. Options that all parse as numbers (or all as booleans) keep
/// that type, anything else is text.
///
/// # Errors
/// Returns `ParamSpecError` when the value has neither shape.
pub fn parse_param(spec: &str) -> Result<Parameter, ParamSpecError> {
    let Some((name, body)) = spec.split_once('=') else {
        return Err(ParamSpecError::Malformed(spec.to_string()));
    };
    let name = name.trim();
    if name.is_empty() || body.trim().is_empty() {
        return Err(ParamSpecError::Malformed(spec.to_string()));
    }

    let parts: Vec<&str> = body.split(':').map(str::trim).collect();
    if let [min, max, step] = parts[..] {
        let number = |value: &str| {
            value.parse::<f64>().map_err(|_| ParamSpecError::NotANumber {
                name: name.to_string(),
                value: value.to_string(),
            })
        };
        let (min, max, step) = (number(min)?, number(max)?, number(step)?);
        return Ok(Parameter::number(name, min).with_range(min, max, step));
    }
    if parts.len() != 1 {
        return Err(ParamSpecError::Malformed(spec.to_string()));
    }

    let raw: Vec<&str> = body.split(',').map(str::trim).collect();
    let options: Vec<ParamValue> = if let Ok(numbers) =
        raw.iter().map(|v| v.parse::<f64>()).collect::<Result<Vec<_>, _>>()
    {
        numbers.into_iter().map(ParamValue::Number).collect()
    } else if let Ok(flags) = raw.iter().map(|v| v.parse::<bool>()).collect::<Result<Vec<_>, _>>() {
        flags.into_iter().map(ParamValue::Bool).collect()
    } else {
        raw.iter().map(|v| ParamValue::Text((*v).to_string())).collect()
    };

    let parameter = match &options[0] {
        ParamValue::Number(n) => Parameter::number(name, *n),
        ParamValue::Bool(b) => Parameter::boolean(name, *b),
        ParamValue::Text(s) => Parameter::string(name, s.clone()),
    };
    Ok(parameter.with_options(options))
}

fn cell_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).required(true).help(help)
}

/// The `branchpad` command
#[must_use]
pub fn command() -> Command {
    Command::new("branchpad")
        .version(branchpad_core::VERSION)
        .about("Branching computational notebook")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("notebook")
                .long("notebook")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Notebook file to operate on"),
        )
        .subcommand(
            Command::new("init").about("Create a notebook holding only the root cell").arg(
                Arg::new("force")
                    .long("force")
                    .action(ArgAction::SetTrue)
                    .help("Overwrite an existing notebook file"),
            ),
        )
        .subcommand(
            Command::new("show").about("Print the cell tree").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output cells as JSON"),
            ),
        )
        .subcommand(
            Command::new("edit")
                .about("Change a cell's code or label without running it")
                .arg(cell_arg("cell", "Cell id"))
                .arg(Arg::new("code").long("code").help("New code"))
                .arg(Arg::new("label").long("label").help("New label"))
                .arg(Arg::new("description").long("description").help("New description")),
        )
        .subcommand(
            Command::new("run")
                .about("Run a cell with its ancestors, then re-run its subtree")
                .arg(cell_arg("cell", "Cell id")),
        )
        .subcommand(
            Command::new("fork")
                .about("Fork a cell into two branches")
                .arg(cell_arg("cell", "Cell id")),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Snapshot a cell")
                .arg(cell_arg("cell", "Cell id"))
                .arg(cell_arg("label", "Snapshot label")),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore a cell from one of its snapshots")
                .arg(cell_arg("cell", "Cell id"))
                .arg(cell_arg("snapshot", "Snapshot id or label")),
        )
        .subcommand(
            Command::new("sweep")
                .about("Run a cell once per parameter combination")
                .arg(cell_arg("cell", "Cell id"))
                .arg(
                    Arg::new("param")
                        .long("param")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("name=min:max:step or name=a,b,c"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a cell and its subtree")
                .arg(cell_arg("cell", "Cell id")),
        )
        .subcommand(
            Command::new("export")
                .about("Print the branch ending at a cell as one script")
                .arg(cell_arg("cell", "Cell id"))
                .arg(
                    Arg::new("requirements")
                        .long("requirements")
                        .action(ArgAction::SetTrue)
                        .help("Print requirements.txt instead"),
                ),
        )
        .subcommand(
            Command::new("compare")
                .about("Line diff between two cells' code")
                .arg(cell_arg("a", "Left cell id"))
                .arg(cell_arg("b", "Right cell id"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the diff as JSON"),
                ),
        )
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create a fresh notebook file
    Init {
        /// Overwrite an existing file
        force: bool,
    },
    /// Print the tree
    Show {
        /// JSON instead of text
        json: bool,
    },
    /// Edit a cell
    Edit {
        /// Target
        cell: CellId,
        /// New code
        code: Option<String>,
        /// New label
        label: Option<String>,
        /// New description
        description: Option<String>,
    },
    /// Run a cell
    Run(CellId),
    /// Fork a cell
    Fork(CellId),
    /// Snapshot a cell
    Snapshot {
        /// Target
        cell: CellId,
        /// Snapshot label
        label: String,
    },
    /// Restore a snapshot
    Restore {
        /// Target
        cell: CellId,
        /// Snapshot id or label
        snapshot: String,
    },
    /// Sweep a cell
    Sweep {
        /// Target
        cell: CellId,
        /// Axes
        parameters: Vec<Parameter>,
    },
    /// Delete a subtree
    Delete(CellId),
    /// Export a branch
    Export {
        /// Leaf of the branch
        cell: CellId,
        /// requirements.txt instead of the script
        requirements: bool,
    },
    /// Diff two cells
    Compare {
        /// Left cell
        a: CellId,
        /// Right cell
        b: CellId,
        /// JSON instead of text
        json: bool,
    },
}

impl Action {
    /// Build the action from parsed arguments
    ///
    /// # Errors
    /// Returns an error for an unknown subcommand or a bad `--param`.
    pub fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let string = |args: &ArgMatches, name: &str| args.get_one::<String>(name).cloned();
        let cell = |args: &ArgMatches, name: &str| {
            string(args, name)
                .map(CellId::new)
                .ok_or_else(|| anyhow::anyhow!("missing <{name}>"))
        };

        Ok(match matches.subcommand() {
            Some(("init", args)) => Self::Init {
                force: args.get_flag("force"),
            },
            Some(("show", args)) => Self::Show {
                json: args.get_flag("json"),
            },
            Some(("edit", args)) => Self::Edit {
                cell: cell(args, "cell")?,
                code: string(args, "code"),
                label: string(args, "label"),
                description: string(args, "description"),
            },
            Some(("run", args)) => Self::Run(cell(args, "cell")?),
            Some(("fork", args)) => Self::Fork(cell(args, "cell")?),
            Some(("snapshot", args)) => Self::Snapshot {
                cell: cell(args, "cell")?,
                label: string(args, "label").unwrap_or_default(),
            },
            Some(("restore", args)) => Self::Restore {
                cell: cell(args, "cell")?,
                snapshot: string(args, "snapshot").unwrap_or_default(),
            },
            Some(("sweep", args)) => Self::Sweep {
                cell: cell(args, "cell")?,
                parameters: args
                    .get_many::<String>("param")
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .map(parse_param)
                    .collect::<Result<_, _>>()?,
            },
            Some(("delete", args)) => Self::Delete(cell(args, "cell")?),
            Some(("export", args)) => Self::Export {
                cell: cell(args, "cell")?,
                requirements: args.get_flag("requirements"),
            },
            Some(("compare", args)) => Self::Compare {
                a: cell(args, "a")?,
                b: cell(args, "b")?,
                json: args.get_flag("json"),
            },
            other => anyhow::bail!("unknown command {:?}", other.map(|(name, _)| name)),
        })
    }

    /// Whether the action changes the notebook file
    #[must_use]
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Self::Show { .. } | Self::Export { .. } | Self::Compare { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchpad_core::NumericRange;

    fn parse(args: &[&str]) -> Action {
        let matches = command().try_get_matches_from(args).unwrap();
        Action::from_matches(&matches).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn range_param() {
        let param = parse_param("lr=0:4:2").unwrap();
        assert_eq!(param.name, "lr");
        assert_eq!(param.range, Some(NumericRange::new(0.0, 4.0, 2.0)));
    }

    #[test]
    fn option_params_keep_their_type() {
        let numbers = parse_param("k=1,2,3").unwrap();
        assert_eq!(
            numbers.options,
            Some(vec![
                ParamValue::Number(1.0),
                ParamValue::Number(2.0),
                ParamValue::Number(3.0)
            ])
        );
        let flags = parse_param("on=true,false").unwrap();
        assert_eq!(flags.value, ParamValue::Bool(true));
        let words = parse_param("mode = fast, slow").unwrap();
        assert_eq!(words.name, "mode");
        assert_eq!(words.value, ParamValue::Text("fast".to_string()));
    }

    #[test]
    fn malformed_params() {
        assert!(matches!(parse_param("lr"), Err(ParamSpecError::Malformed(_))));
        assert!(matches!(parse_param("lr=1:2"), Err(ParamSpecError::Malformed(_))));
        assert!(matches!(
            parse_param("lr=0:x:1"),
            Err(ParamSpecError::NotANumber { .. })
        ));
    }

    #[test]
    fn subcommands_parse() {
        assert_eq!(parse(&["branchpad", "run", "root"]), Action::Run(CellId::root()));
        let sweep = parse(&[
            "branchpad", "sweep", "root", "--param", "a=1,2", "--param", "b=0:1:1",
        ]);
        let Action::Sweep { parameters, .. } = sweep else {
            panic!("expected sweep");
        };
        assert_eq!(parameters.len(), 2);
        assert!(!parse(&["branchpad", "show", "--notebook", "x.json"]).mutates());
        assert!(parse(&["branchpad", "fork", "root"]).mutates());
    }
}
