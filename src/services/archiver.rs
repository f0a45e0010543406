use camino::{Utf8Path, Utf8PathBuf};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Archive name passed to the archiver; the tool appends `.rpf`.
pub const ARCHIVE_NAME: &str = "dlc";

/// One archive to build: the assembled tree and where the archive goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub name: String,
}

impl ArchiveRequest {
    pub fn new(input_dir: &Utf8Path, output_dir: &Utf8Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            name: ARCHIVE_NAME.to_string(),
        }
    }
}

/// Diagnostics of a successful archiver run.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Errors that can occur while running the archiver
#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Archiver executable not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Archiver exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

/// Builds one archive file from a directory tree.
pub trait Archiver {
    fn create_archive(
        &self,
        request: &ArchiveRequest,
    ) -> impl Future<Output = Result<ArchiveOutput, ArchiverError>>;
}

/// Runs `gtautil createarchive` as a subprocess.
#[derive(Debug, Clone)]
pub struct GtaUtilArchiver {
    executable: Utf8PathBuf,
    timeout: Duration,
}

impl GtaUtilArchiver {
    pub fn new(executable: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Arguments for one `createarchive` invocation.
    pub fn build_args(&self, request: &ArchiveRequest) -> Vec<String> {
        vec![
            "createarchive".to_string(),
            "--input".to_string(),
            request.input_dir.to_string(),
            "--output".to_string(),
            request.output_dir.to_string(),
            "--name".to_string(),
            request.name.clone(),
        ]
    }

    /// Human readable command line for logs.
    pub fn command_line(&self, request: &ArchiveRequest) -> String {
        let args: Vec<String> = self
            .build_args(request)
            .into_iter()
            .map(|a| if a.contains(' ') { format!("\"{a}\"") } else { a })
            .collect();
        format!("{} {}", self.executable, args.join(" "))
    }
}

impl Archiver for GtaUtilArchiver {
    async fn create_archive(&self, request: &ArchiveRequest) -> Result<ArchiveOutput, ArchiverError> {
        tracing::info!("Executing: {}", self.command_line(request));

        let start = Instant::now();

        let mut cmd = Command::new(self.executable.as_std_path());
        cmd.args(self.build_args(request)).kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ArchiverError::NotFound(self.executable.clone())
            } else {
                ArchiverError::ProcessError(e)
            }
        })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::warn!("Archiver timed out after {:?}", self.timeout);
                ArchiverError::Timeout(self.timeout)
            })??;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        tracing::info!(
            "Archiver completed in {:.2}s with exit code {}",
            duration.as_secs_f32(),
            exit_code
        );

        if !output.status.success() {
            return Err(ArchiverError::Failed {
                code: exit_code,
                stderr,
            });
        }

        Ok(ArchiveOutput {
            stdout,
            stderr,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ArchiveRequest {
        ArchiveRequest::new(
            Utf8Path::new("output/ABC/abc_vehicle_dlc_temp"),
            Utf8Path::new("output/ABC"),
        )
    }

    #[test]
    fn test_build_args() {
        let archiver = GtaUtilArchiver::new("utils/gtautil", Duration::from_secs(5));
        let args = archiver.build_args(&request());

        assert_eq!(
            args,
            vec![
                "createarchive",
                "--input",
                "output/ABC/abc_vehicle_dlc_temp",
                "--output",
                "output/ABC",
                "--name",
                "dlc",
            ]
        );
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let archiver = GtaUtilArchiver::new("utils/gtautil", Duration::from_secs(5));
        let request = ArchiveRequest::new(Utf8Path::new("my mods/tmp"), Utf8Path::new("out"));
        let line = archiver.command_line(&request);

        assert!(line.starts_with("utils/gtautil createarchive"));
        assert!(line.contains("--input \"my mods/tmp\""));
        assert!(line.ends_with("--name dlc"));
    }

    #[test]
    fn test_missing_executable_is_not_found() {
        let archiver = GtaUtilArchiver::new("/no/such/gtautil", Duration::from_secs(5));
        let result = tokio_test::block_on(archiver.create_archive(&request()));
        assert!(matches!(result, Err(ArchiverError::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_maps_to_result() {
        let ok = GtaUtilArchiver::new("true", Duration::from_secs(5));
        assert!(ok.create_archive(&request()).await.is_ok());

        let failing = GtaUtilArchiver::new("false", Duration::from_secs(5));
        match failing.create_archive(&request()).await {
            Err(ArchiverError::Failed { code, .. }) => assert_eq!(code, 1),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
