use std::process::ExitCode;

use anyhow::Context;
use infakt_mirror::config::MirrorConfig;
use infakt_mirror::runner::Runner;
use infakt_mirror::{history, logging};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run { commit: bool },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut mode = CliMode::Run { commit: true };
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--no-commit" => {
                if let CliMode::Run { commit } = &mut mode {
                    *commit = false;
                }
            }
            "--help" | "-h" => mode = CliMode::Help,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let offset = history::local_offset();
    dotenvy::dotenv().ok();
    let commit_flag = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: infakt-mirror [--no-commit]");
            println!("  --no-commit   Mirror only, do not record the run in the data repository");
            return Ok(ExitCode::SUCCESS);
        }
        CliMode::Run { commit } => commit,
    };

    let config = MirrorConfig::from_env()?;
    let _log_guard = logging::init(&config.log_dir)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        api = %config.api_domain,
        "infakt-mirror v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let runner = Runner::from_config(&config)?;
    runner.bootstrap().await?;
    let summary = runner.run().await;
    let success = summary.all_success();
    if !success {
        let failed: Vec<_> = summary.failed().collect();
        tracing::warn!(failed = ?failed, "run finished with failures");
    }

    if config.commit && commit_flag {
        let data_dir = config.data_dir.clone();
        let at = history::now_at(offset);
        tokio::task::spawn_blocking(move || history::commit_run(&data_dir, success, at))
            .await
            .context("history commit task panicked")?
            .context("failed to record run in history")?;
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_mode_defaults_to_committing_run() {
        let mode = parse_cli_mode(args(&["infakt-mirror"])).unwrap();
        assert_eq!(mode, CliMode::Run { commit: true });
    }

    #[test]
    fn parse_cli_mode_supports_no_commit() {
        let mode = parse_cli_mode(args(&["infakt-mirror", "--no-commit"])).unwrap();
        assert_eq!(mode, CliMode::Run { commit: false });
    }

    #[test]
    fn parse_cli_mode_supports_help() {
        let mode = parse_cli_mode(args(&["infakt-mirror", "--help"])).unwrap();
        assert_eq!(mode, CliMode::Help);
    }

    #[test]
    fn parse_cli_mode_rejects_unknown_arguments() {
        assert!(parse_cli_mode(args(&["infakt-mirror", "--force"])).is_err());
    }
}
