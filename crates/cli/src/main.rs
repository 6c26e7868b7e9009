//! fleet-ping - check whether the nodes of a fleet are alive

mod args;
mod config;
mod logging;
mod output;

use anyhow::{Context, Result};
use std::future::Future;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

use fleetping_core::application::{
    resolve_local_node, shutdown_channel, Aggregator, Classifier, DispatchConfig, Dispatcher,
    LaunchPolicy, ProbeRunner,
};
use fleetping_core::domain::{Invocation, NodeSet, ProbeCommand, ProbeJob, SelectionOp};
use fleetping_core::port::{SystemTimeProvider, TimeProvider};
use fleetping_infra_system::{SelfReplayTransport, SubprocessProbeExecutor, SystemHostIdentity};

use crate::args::Cli;
use crate::config::FleetConfig;
use crate::output::ResultPrinter;

const EXIT_FAILURE: u8 = 1;
const EXIT_AGGREGATE_FAILURE: u8 = 255;

#[tokio::main]
async fn main() -> ExitCode {
    let (cli, selection) = match args::parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let _ = e.print();
            return if e.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            };
        }
    };

    logging::init(cli.verbose);
    output::configure_colors();

    match run(cli, selection).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fleet-ping: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli, selection: Vec<SelectionOp>) -> Result<ExitCode> {
    let invocation = cli.invocation(selection);

    if cli.aggregate {
        return Ok(run_aggregated(&invocation).await);
    }

    let config = FleetConfig::load(cli.conf.as_deref())?;
    let registry = Arc::new(config.registry()?);

    let mut node_set = NodeSet::new(Arc::clone(&registry));
    for op in &invocation.selection {
        node_set.apply(op).with_context(|| op.to_string())?;
    }

    let nodes = node_set.resolve();
    if nodes.is_empty() {
        println!("no valid nodes specified");
        return Ok(ExitCode::from(EXIT_FAILURE));
    }

    let concurrency = invocation.num_proc.unwrap_or(config.num_proc);
    let policy = match cli.zzz {
        Some(secs) => LaunchPolicy::from_zzz(secs),
        None => LaunchPolicy::from_sleep_time(config.sleep_time),
    };
    let dispatch_config =
        DispatchConfig::new(concurrency, policy).context("invalid num_proc setting")?;

    let command = Arc::new(
        ProbeCommand::parse(&config.ping_cmd).context("invalid ping_cmd setting")?,
    );
    let jobs = ProbeJob::for_nodes(nodes, command);

    let local_node = resolve_local_node(
        &registry,
        config.nodename.as_deref(),
        &SystemHostIdentity::new(),
    );

    // DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let executor = Arc::new(
        SubprocessProbeExecutor::new(Classifier::standard()).with_echo_commands(cli.unix),
    );
    let runner = Arc::new(
        ProbeRunner::new(executor, Arc::clone(&time_provider)).with_local_node(local_node),
    );
    let dispatcher = Dispatcher::new(dispatch_config, time_provider);

    let (shutdown_tx, shutdown) = shutdown_channel();
    let shutdown_tx = Arc::new(shutdown_tx);

    let signal_tx = Arc::clone(&shutdown_tx);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            signal_tx.shutdown();
        }
    });

    let mut printer = ResultPrinter::new(io::stdout());
    let outcome = dispatcher
        .dispatch(jobs, runner, shutdown, |result| {
            match printer.print(result) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("stdout closed, stopping");
                    shutdown_tx.shutdown();
                }
                Err(e) => warn!(error = %e, "Failed to write result"),
            }
        })
        .await;

    signal_task.abort();

    info!(
        results = outcome.results.len(),
        up = outcome.results.iter().filter(|r| r.is_up()).count(),
        interrupted = outcome.interrupted,
        "Done"
    );
    Ok(ExitCode::SUCCESS)
}

/// Re-run this invocation as a child and print identical output once
async fn run_aggregated(invocation: &Invocation) -> ExitCode {
    let transport = match SelfReplayTransport::current_exe() {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("fleet-ping: {e}");
            return ExitCode::from(EXIT_AGGREGATE_FAILURE);
        }
    };
    let aggregator = Aggregator::new(Arc::new(transport));

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    aggregate_until(&aggregator, invocation, interrupt, io::stdout()).await
}

/// Aggregate unless `interrupt` resolves first
///
/// An interrupted run prints nothing and still exits cleanly; dropping the
/// pending fetch kills the replayed child.
async fn aggregate_until<F, W>(
    aggregator: &Aggregator,
    invocation: &Invocation,
    interrupt: F,
    out: W,
) -> ExitCode
where
    F: Future<Output = ()>,
    W: Write,
{
    let groups = tokio::select! {
        fetched = aggregator.run(invocation) => match fetched {
            Ok(groups) => groups,
            Err(e) => {
                eprintln!("fleet-ping: {e}");
                return ExitCode::from(EXIT_AGGREGATE_FAILURE);
            }
        },
        () = interrupt => {
            info!("Interrupt received, abandoning aggregation");
            return ExitCode::SUCCESS;
        }
    };

    let mut printer = ResultPrinter::new(out);
    if let Err(e) = printer.print_groups(&groups) {
        if e.kind() != io::ErrorKind::BrokenPipe {
            warn!(error = %e, "Failed to write aggregated output");
        }
    }
    ExitCode::SUCCESS
}
