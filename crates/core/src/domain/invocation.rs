// Invocation - replayable record of what the user asked for

use std::path::PathBuf;

use super::selection::SelectionOp;

/// Selection steps plus operational flags of one run
///
/// Aggregation re-runs the same request over its transport, so this must
/// reproduce the per-node command set exactly. The aggregate flag itself is
/// never part of the replayed arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub conf: Option<PathBuf>,
    pub selection: Vec<SelectionOp>,
    pub num_proc: Option<usize>,
    pub zzz: Option<u64>,
    pub verbose: bool,
    pub unix: bool,
}

impl Invocation {
    /// Argument vector (without program name) that replays this request
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(conf) = &self.conf {
            args.push("--conf".to_string());
            args.push(conf.display().to_string());
        }
        for op in &self.selection {
            args.push(op.flag().to_string());
            args.push(op.spec().to_string());
        }
        if let Some(n) = self.num_proc {
            args.push("--numproc".to_string());
            args.push(n.to_string());
        }
        if let Some(secs) = self.zzz {
            args.push("--zzz".to_string());
            args.push(secs.to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if self.unix {
            args.push("--unix".to_string());
        }
        args
    }
}
