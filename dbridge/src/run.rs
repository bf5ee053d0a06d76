use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use dbridge_core::{LaunchRequest, Orchestrator, OrchestratorConfig, OutputSink};

use crate::cli::Cli;
use crate::output;

/// Forwards relayed child output through the styled terminal helpers.
struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn line(&self, line: &str) {
        output::child_line(line);
    }
}

pub async fn run(cli: Cli) -> i32 {
    let cli = match cli.normalize() {
        Ok(cli) => cli,
        Err(message) => {
            output::error_stderr(&message);
            return 1;
        }
    };

    let timeout = Duration::from_millis(cli.timeout);
    let mut request = LaunchRequest::new(cli.host.clone(), cli.port, cli.target.clone());
    request.args = cli.args.clone();
    request.runtime = cli.runtime.clone();
    request.announce_timeout = timeout;

    let config = OrchestratorConfig {
        port_timeout: timeout,
        discovery_retries: cli.retries,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(config, Arc::new(ConsoleSink));

    let mut exit_rx = spawn_signal_listeners();

    output::step(&format!("connecting to {}:{} ..", request.host, request.port));

    let outcome = tokio::select! {
        result = orchestrator.run(&request) => Some(result),
        _ = exit_requested(&mut exit_rx) => None,
    };

    let url = match outcome {
        // Interrupted before the bridge came up.
        None => {
            orchestrator.shutdown().await;
            return 0;
        }
        Some(Err(e)) => {
            orchestrator.shutdown().await;
            report(&e);
            return 1;
        }
        Some(Ok(url)) => url,
    };

    output::success("debugger session ready, open this link in Chrome:");
    println!("\n  {url}\n");

    if cli.open {
        open_in_browser(&url);
    }

    // Stay attached to the child: exit when it exits, or reap it on a signal.
    let child = orchestrator.child();
    let code = tokio::select! {
        code = child.wait() => code.unwrap_or(0),
        _ = exit_requested(&mut exit_rx) => 0,
    };
    orchestrator.shutdown().await;
    code
}

fn report(error: &dbridge_core::LaunchError) {
    if error.is_operational() {
        output::error_stderr(&error.to_string());
    } else {
        output::error_stderr("There was an internal error in dbridge. Please report this bug.");
        output::error_stderr(&error.to_string());
    }
}

/// One listener task per signal, each funneled into a watch channel
/// (ctrl-c everywhere; SIGTERM and SIGHUP on unix).
fn spawn_signal_listeners() -> tokio::sync::watch::Receiver<bool> {
    let (exit_tx, exit_rx) = tokio::sync::watch::channel(false);

    {
        let exit_tx = exit_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = exit_tx.send(true);
                if output::is_verbose() {
                    println!("\nShutting down...");
                }
            }
        });
    }
    #[cfg(unix)]
    {
        let exit_tx_term = exit_tx.clone();
        tokio::spawn(async move {
            if let Ok(mut sigterm) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            {
                let _ = sigterm.recv().await;
                let _ = exit_tx_term.send(true);
            }
        });

        let exit_tx_hup = exit_tx.clone();
        tokio::spawn(async move {
            if let Ok(mut sighup) =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            {
                let _ = sighup.recv().await;
                let _ = exit_tx_hup.send(true);
            }
        });
    }

    exit_rx
}

async fn exit_requested(exit_rx: &mut tokio::sync::watch::Receiver<bool>) {
    while exit_rx.changed().await.is_ok() {
        if *exit_rx.borrow() {
            return;
        }
    }
    // Sender gone; never resolve.
    std::future::pending::<()>().await;
}

/// Best-effort side action; the URL on stdout is the real deliverable.
fn open_in_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let (program, args): (&str, Vec<&str>) = ("open", vec![url]);
    #[cfg(target_os = "windows")]
    let (program, args): (&str, Vec<&str>) = ("cmd", vec!["/C", "start", "", url]);
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let (program, args): (&str, Vec<&str>) = ("xdg-open", vec![url]);

    let spawned = std::process::Command::new(program)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = spawned {
        tracing::debug!(error = %e, "failed to open browser");
    }
}
