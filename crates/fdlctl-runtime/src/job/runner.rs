//! The pipeline runner: drives the external processing program as a
//! three-step subprocess sequence, feeding every output line to the
//! job controller as it arrives.
//!
//! Steps: environment preparation, dependency installation, main
//! execution. Failures at any step are converted to `error` records
//! and the run always reaches the controller's completion path - a run
//! can never end stuck in the running state.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use fdlctl_core::{LogKind, LogRecord, RunOptions};

use super::config::PipelineConfig;
use super::controller::JobController;
use super::error::JobError;

/// Fire-and-forget driver for the external pipeline.
pub struct PipelineRunner {
    config: Arc<PipelineConfig>,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Claim the run slot and spawn the pipeline task. Returns
    /// immediately; progress is observable only through the
    /// controller's stream and status.
    pub fn start(
        &self,
        controller: &Arc<JobController>,
        options: RunOptions,
    ) -> Result<(), JobError> {
        controller.begin_run()?;
        let controller = Arc::clone(controller);
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            if let Err(e) = run_pipeline(&controller, &config, options).await {
                error!(error = %e, "pipeline run failed");
                controller.append(LogRecord::error(format!("Pipeline failed: {e:#}")));
                controller.end_run("Run terminated with errors");
            }
        });
        Ok(())
    }
}

async fn run_pipeline(
    controller: &Arc<JobController>,
    config: &PipelineConfig,
    options: RunOptions,
) -> anyhow::Result<()> {
    prepare_environment(controller, config).await?;
    install_dependencies(controller, config).await?;
    execute_script(controller, config, &options).await
}

/// Step 1: verify or create the isolated execution environment.
async fn prepare_environment(
    controller: &Arc<JobController>,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    if config.venv_dir.is_dir() {
        controller.append(LogRecord::setup("Virtual environment found"));
        return Ok(());
    }

    controller.append(LogRecord::setup("Creating virtual environment..."));
    let mut cmd = Command::new(&config.python_bin);
    cmd.arg("-m")
        .arg("venv")
        .arg(&config.venv_dir)
        .current_dir(&config.work_dir);
    let status = run_step(controller, cmd, LogKind::Setup, keep_all).await?;
    if !status.success() {
        bail!("virtual environment creation failed with {status}");
    }
    controller.append(LogRecord::setup("Virtual environment created"));
    Ok(())
}

/// Step 2: install the pipeline's dependencies, filtering pip's
/// informational noise out of the log.
async fn install_dependencies(
    controller: &Arc<JobController>,
    config: &PipelineConfig,
) -> anyhow::Result<()> {
    controller.append(LogRecord::setup("Installing dependencies..."));
    let mut cmd = Command::new(config.venv_pip());
    cmd.arg("install")
        .arg("-r")
        .arg(&config.requirements)
        .current_dir(&config.work_dir);
    let status = run_step(controller, cmd, LogKind::Setup, without_install_noise).await?;
    if !status.success() {
        bail!("dependency installation failed with {status}");
    }
    Ok(())
}

/// Step 3: run the processing script, streaming stdout and stderr into
/// the buffer in real time, and end the run on exit.
async fn execute_script(
    controller: &Arc<JobController>,
    config: &PipelineConfig,
    options: &RunOptions,
) -> anyhow::Result<()> {
    controller.append(LogRecord::execute("Starting script execution..."));

    let (args, secret) = build_script_args(config, options)?;
    let program = config.venv_python();
    controller.append(LogRecord::execute(format!(
        "Executing: {}",
        render_command(&program, &args, secret.as_deref())
    )));

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .current_dir(&config.work_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {}", program.display()))?;

    let stdout = child.stdout.take().context("pipeline stdout unavailable")?;
    let stderr = child.stderr.take().context("pipeline stderr unavailable")?;
    controller.attach_child(child);

    let out = spawn_line_reader(stdout, LogKind::Output, Arc::clone(controller), keep_all);
    let err = spawn_line_reader(stderr, LogKind::Error, Arc::clone(controller), keep_all);
    let _ = tokio::join!(out, err);

    match controller.take_child() {
        Some(mut child) => {
            let status = child.wait().await.context("failed to reap pipeline process")?;
            if status.success() {
                controller.end_run("Processing completed successfully");
            } else {
                controller.append(LogRecord::error(format!("Script exited with {status}")));
                controller.end_run("Run terminated with errors");
            }
        }
        // Handle gone: the run was cancelled and already closed out.
        None => debug!("pipeline process cancelled before exit"),
    }
    Ok(())
}

/// Build the script argument vector from the run options. Returns the
/// arguments and the secret that must be redacted from any rendering.
fn build_script_args(
    config: &PipelineConfig,
    options: &RunOptions,
) -> anyhow::Result<(Vec<String>, Option<String>)> {
    let mut args = vec![config.script.display().to_string()];
    if options.clear_cache {
        args.push("--clear-cache".to_string());
    }

    let mut secret = None;
    if options.remote_source {
        args.push("--create-remote-zip".to_string());
        let remote = if options.use_default_source {
            config
                .default_remote
                .clone()
                .context("default remote source requested but not configured")?
        } else {
            options
                .remote
                .clone()
                .context("remote run requested without coordinates")?
        };
        args.push("--remote-host".to_string());
        args.push(remote.host);
        args.push("--remote-user".to_string());
        args.push(remote.user);
        args.push("--remote-password".to_string());
        args.push(remote.password.clone());
        args.push("--remote-port".to_string());
        args.push(remote.port.to_string());
        args.push("--remote-path".to_string());
        args.push(remote.path);
        secret = Some(remote.password);
    } else {
        let zip = config
            .local_zip
            .clone()
            .context("local-file run requested but no archive configured")?;
        args.push(zip.display().to_string());
    }
    Ok((args, secret))
}

/// Render a command line for logging, masking the secret argument.
fn render_command(program: &Path, args: &[String], secret: Option<&str>) -> String {
    let mut parts = vec![program.display().to_string()];
    for arg in args {
        if secret.is_some_and(|s| arg == s) {
            parts.push("****".to_string());
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// Run a pipeline step to completion, streaming its output as records.
async fn run_step(
    controller: &Arc<JobController>,
    mut cmd: Command,
    kind: LogKind,
    keep: fn(&str) -> bool,
) -> anyhow::Result<ExitStatus> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn().context("failed to spawn step command")?;
    let stdout = child.stdout.take().context("step stdout unavailable")?;
    let stderr = child.stderr.take().context("step stderr unavailable")?;

    let out = spawn_line_reader(stdout, kind, Arc::clone(controller), keep);
    let err = spawn_line_reader(stderr, kind, Arc::clone(controller), keep);
    let _ = tokio::join!(out, err);

    child.wait().await.context("failed to reap step command")
}

/// Byte-based line reader with lossy UTF-8 decoding: external tooling
/// can emit non-UTF8 bytes, and `lines()` would kill the reader task.
fn spawn_line_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: LogKind,
    controller: Arc<JobController>,
    keep: fn(&str) -> bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    let line = String::from_utf8_lossy(&buf).to_string();
                    if line.trim().is_empty() || !keep(&line) {
                        continue;
                    }
                    controller.append(LogRecord::new(kind, line));
                }
                Err(e) => {
                    debug!(kind = kind.label(), error = %e, "line reader exiting on read error");
                    break;
                }
            }
        }

        debug!(kind = kind.label(), "line reader task exiting");
    })
}

fn keep_all(_line: &str) -> bool {
    true
}

fn without_install_noise(line: &str) -> bool {
    !is_install_noise(line)
}

/// pip chatter that adds nothing to the run log.
fn is_install_noise(line: &str) -> bool {
    line.contains("already satisfied")
        || line.contains("[notice]")
        || line.contains("A new release of pip")
        || line.contains("To update, run:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdlctl_core::RemoteSource;
    use std::path::PathBuf;

    fn remote() -> RemoteSource {
        RemoteSource {
            host: "game.example.net".to_string(),
            user: "steam".to_string(),
            password: "hunter2".to_string(),
            port: 2222,
            path: "/srv/cstrike".to_string(),
        }
    }

    #[test]
    fn local_mode_passes_archive_positionally() {
        let mut config = PipelineConfig::new("/srv/fastdl");
        config.local_zip = Some(PathBuf::from("/srv/fastdl/cstrike.zip"));
        let (args, secret) = build_script_args(&config, &RunOptions::default()).unwrap();
        assert_eq!(
            args,
            vec![
                "/srv/fastdl/cssfdlp.py".to_string(),
                "/srv/fastdl/cstrike.zip".to_string()
            ]
        );
        assert!(secret.is_none());
    }

    #[test]
    fn local_mode_without_archive_is_an_error() {
        let config = PipelineConfig::new("/srv/fastdl");
        let err = build_script_args(&config, &RunOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no archive configured"));
    }

    #[test]
    fn remote_mode_uses_explicit_coordinates() {
        let config = PipelineConfig::new("/srv/fastdl");
        let options = RunOptions {
            remote_source: true,
            remote: Some(remote()),
            ..RunOptions::default()
        };
        let (args, secret) = build_script_args(&config, &options).unwrap();
        assert!(args.contains(&"--create-remote-zip".to_string()));
        assert!(args.contains(&"game.example.net".to_string()));
        assert!(args.contains(&"2222".to_string()));
        assert_eq!(secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn remote_mode_falls_back_to_configured_default() {
        let mut config = PipelineConfig::new("/srv/fastdl");
        config.default_remote = Some(remote());
        let options = RunOptions {
            remote_source: true,
            use_default_source: true,
            ..RunOptions::default()
        };
        let (args, _) = build_script_args(&config, &options).unwrap();
        assert!(args.contains(&"game.example.net".to_string()));
    }

    #[test]
    fn remote_mode_without_coordinates_is_an_error() {
        let config = PipelineConfig::new("/srv/fastdl");
        let options = RunOptions {
            remote_source: true,
            ..RunOptions::default()
        };
        assert!(build_script_args(&config, &options).is_err());
    }

    #[test]
    fn clear_cache_flag_precedes_mode_arguments() {
        let mut config = PipelineConfig::new("/srv/fastdl");
        config.local_zip = Some(PathBuf::from("/srv/fastdl/cstrike.zip"));
        let options = RunOptions {
            clear_cache: true,
            ..RunOptions::default()
        };
        let (args, _) = build_script_args(&config, &options).unwrap();
        assert_eq!(args[1], "--clear-cache");
    }

    #[test]
    fn rendered_command_never_contains_the_password() {
        let config = PipelineConfig::new("/srv/fastdl");
        let options = RunOptions {
            remote_source: true,
            remote: Some(remote()),
            ..RunOptions::default()
        };
        let (args, secret) = build_script_args(&config, &options).unwrap();
        let rendered = render_command(&config.venv_python(), &args, secret.as_deref());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("--remote-password ****"));
    }

    #[test]
    fn install_noise_patterns() {
        assert!(is_install_noise("Requirement already satisfied: boto3"));
        assert!(is_install_noise(
            "[notice] A new release of pip is available: 23.0 -> 24.0"
        ));
        assert!(is_install_noise("[notice] To update, run: pip install --upgrade pip"));
        assert!(!is_install_noise("Installing collected packages: paramiko"));
        assert!(!is_install_noise("Collecting boto3"));
    }
}
