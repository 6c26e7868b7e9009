// Command-line arguments

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use fleetping_core::domain::{Invocation, SelectionOp};

#[derive(Parser, Debug)]
#[command(name = "fleet-ping")]
#[command(about = "Check which nodes of the fleet are alive", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Use this config file
    #[arg(short = 'c', long = "conf", value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// Execute only on these nodes
    #[arg(short = 'n', long = "node", value_name = "LIST")]
    pub node: Vec<String>,

    /// Execute only on these groups of nodes
    #[arg(short = 'g', long = "group", value_name = "LIST")]
    pub group: Vec<String>,

    /// Exclude these nodes from the selected group
    #[arg(short = 'x', long = "exclude", value_name = "LIST")]
    pub exclude: Vec<String>,

    /// Exclude these groups from the selection
    #[arg(short = 'X', long = "exclude-group", value_name = "LIST")]
    pub exclude_group: Vec<String>,

    /// Condense output
    #[arg(short = 'a', long)]
    pub aggregate: bool,

    /// Number of concurrent processes
    #[arg(
        short = 'p',
        long = "numproc",
        value_name = "NUM",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub numproc: Option<u64>,

    /// Sleep this many seconds between launches; 0 runs one node at a time
    #[arg(short = 'z', long = "zzz", value_name = "SECS")]
    pub zzz: Option<u64>,

    /// Be verbose
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Output actions as unix shell commands
    #[arg(long)]
    pub unix: bool,

    /// Accepted for compatibility; has no effect
    #[arg(short = 'q', long, hide = true)]
    pub quiet: bool,
}

impl Cli {
    /// Replayable form of this run, with the selection steps in command-line order
    pub fn invocation(&self, selection: Vec<SelectionOp>) -> Invocation {
        Invocation {
            conf: self.conf.clone(),
            selection,
            num_proc: self.numproc.and_then(|n| usize::try_from(n).ok()),
            zzz: self.zzz,
            verbose: self.verbose,
            unix: self.unix,
        }
    }
}

/// Parse arguments, keeping the relative order of selection flags
///
/// # Errors
/// - clap::Error for bad usage, and for `--help`/`--version` (exit code 0)
pub fn parse_from<I, T>(args: I) -> Result<(Cli, Vec<SelectionOp>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    let selection = selection_ops(&matches);
    Ok((cli, selection))
}

fn selection_ops(matches: &ArgMatches) -> Vec<SelectionOp> {
    let kinds: [(&str, fn(String) -> SelectionOp); 4] = [
        ("node", SelectionOp::AddNode),
        ("group", SelectionOp::AddGroup),
        ("exclude", SelectionOp::ExcludeNode),
        ("exclude_group", SelectionOp::ExcludeGroup),
    ];

    let mut indexed: Vec<(usize, SelectionOp)> = Vec::new();
    for (id, make) in kinds {
        let (Some(indices), Some(values)) = (
            matches.indices_of(id),
            matches.get_many::<String>(id),
        ) else {
            continue;
        };
        indexed.extend(indices.zip(values).map(|(i, v)| (i, make(v.clone()))));
    }

    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, op)| op).collect()
}
