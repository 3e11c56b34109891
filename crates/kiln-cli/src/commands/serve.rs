//! `kiln serve`: initial build, static server over the output directory,
//! and a full rebuild after every debounced batch of source changes.
//!
//! Rebuilds run one at a time on this task, so two builds never write the
//! output directory concurrently. The server keeps answering from whatever
//! is on disk while a rebuild runs.

use std::time::Duration;

use kiln_config::{ConfigOverrides, DevOverrides};
use kiln_pipeline::BuildReport;
use tokio::signal;
use tokio::sync::{mpsc, oneshot};

use crate::cli::{ProjectArgs, ServeArgs};
use crate::commands::utils;
use crate::dev::{DevServer, DevServerState, FileChange, FileWatcher, IgnoreSet, SharedState};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;

pub async fn execute(args: ServeArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        mode: Some(args.mode.clone()),
        unhandled: None,
        dev: args.port.map(|port| DevOverrides { port: Some(port) }),
    };
    let project = utils::load_project(&args.project, &overrides)?;

    let policy = project.mode.policy(&project.config.dev);
    let server_policy = policy
        .dev_server
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "the development server is disabled in {} mode",
                project.mode
            ))
        })
        .with_hint("Run `kiln serve --mode development`, or `kiln build` for production output")?;

    let state: SharedState = std::sync::Arc::new(DevServerState::new(project.out_dir()));

    ui::info("Performing initial build...");
    state.start_build();
    let report = match utils::run_build(&project).await {
        Ok(report) => report,
        Err(e) => {
            state.fail_build(e.to_string());
            return Err(e);
        }
    };
    record(&state, &report);
    if let Err(e) = super::build::finish(&report) {
        ui::error(&e.to_string());
    }

    let ignore = IgnoreSet::new(
        project.root.clone(),
        &project.config.dev.watch_ignore,
        vec![project.out_dir()],
    )?;
    let (watcher, mut changes) = FileWatcher::new(
        vec![project.source_dir()],
        project.watch_files(),
        ignore,
        project.config.dev.debounce_ms,
    )?;
    for path in watcher.watched() {
        ui::info(&format!("Watching {}", path.display()));
    }

    let server = DevServer::bind(&server_policy.host, server_policy.port, state.clone()).await?;
    let addr = server.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server_handle = tokio::spawn(server.serve(async move {
        let _ = shutdown_rx.await;
    }));
    ui::success(&format!("Serving {} at http://{}", project.out_dir().display(), addr));
    ui::info("Press Ctrl+C to stop");

    let debounce = Duration::from_millis(project.config.dev.debounce_ms);
    loop {
        tokio::select! {
            Some(change) = changes.recv() => {
                let batch = collect_batch(change, &mut changes, debounce).await;
                rebuild(&args.project, &overrides, &state, &batch).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down development server...");
                let _ = shutdown_tx.send(());
                match (&mut server_handle).await {
                    Ok(result) => result?,
                    Err(e) => return Err(CliError::Server(format!("Server task failed: {e}"))),
                }
                break;
            }

            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => Err(CliError::Server("server stopped unexpectedly".to_string())),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(CliError::Server(format!("Server task failed: {e}"))),
                };
            }
        }
    }

    ui::success("Development server stopped");
    Ok(())
}

/// Wait out the debounce window so one burst of saves triggers one rebuild.
async fn collect_batch(
    first: FileChange,
    changes: &mut mpsc::Receiver<FileChange>,
    debounce: Duration,
) -> Vec<FileChange> {
    let mut batch = vec![first];
    loop {
        match tokio::time::timeout(debounce, changes.recv()).await {
            Ok(Some(change)) => batch.push(change),
            Ok(None) | Err(_) => return batch,
        }
    }
}

/// Reload configuration and run a full build. Errors are reported and
/// recorded; the server keeps running.
async fn rebuild(
    args: &ProjectArgs,
    overrides: &ConfigOverrides,
    state: &SharedState,
    batch: &[FileChange],
) {
    match batch {
        [single] => ui::info(&format!("Changed: {}", single.path().display())),
        _ => ui::info(&format!("{} files changed", batch.len())),
    }

    state.start_build();
    let result = match utils::load_project(args, overrides) {
        Ok(project) => utils::run_build(&project).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => {
            record(state, &report);
            if let Err(e) = super::build::finish(&report) {
                ui::error(&e.to_string());
            }
        }
        Err(e) => {
            state.fail_build(e.to_string());
            ui::error(&format!("Rebuild failed: {e}"));
        }
    }
}

fn record(state: &SharedState, report: &BuildReport) {
    if report.is_success() {
        state.complete_build(report.duration.as_millis() as u64, report.emitted.len());
    } else {
        let failed = report
            .failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        state.fail_build(failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn batch_collects_changes_inside_the_window() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(FileChange::Modified(PathBuf::from("b.js"))).await.unwrap();
        tx.send(FileChange::Created(PathBuf::from("c.js"))).await.unwrap();

        let batch = collect_batch(
            FileChange::Modified(PathBuf::from("a.js")),
            &mut rx,
            Duration::from_millis(20),
        )
        .await;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].path(), PathBuf::from("a.js"));
        assert_eq!(batch[2], FileChange::Created(PathBuf::from("c.js")));
    }

    #[tokio::test]
    async fn batch_ends_when_the_channel_closes() {
        let (tx, mut rx) = mpsc::channel::<FileChange>(1);
        drop(tx);
        let batch = collect_batch(
            FileChange::Removed(PathBuf::from("gone.js")),
            &mut rx,
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(batch.len(), 1);
    }
}
