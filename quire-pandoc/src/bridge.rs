//! Runs the `pandoc` binary.
//!
//! Each call spawns one process, writes the input to its stdin and buffers
//! everything it prints. Pandoc reports recoverable problems on stderr prefixed
//! with `[WARNING]`; those are logged. Anything else on stderr, or a non-zero
//! exit, fails the call.

use crate::error::BridgeError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Environment variable naming the pandoc binary to use.
pub const BINARY_ENV: &str = "QUIRE_PANDOC_BIN";

pub const CITEPROC_FILTER: &str = "pandoc-citeproc";

/// Environment variable naming the `pandoc-citeproc` binary used to convert
/// bibliographies.
pub const CITEPROC_BINARY_ENV: &str = "QUIRE_CITEPROC_BIN";

const WARNING_MARKER: &str = "[WARNING]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Explicit binary, taking precedence over [`BINARY_ENV`] and `PATH`.
    pub binary: Option<PathBuf>,
    pub standalone: bool,
    pub template: Option<PathBuf>,
    /// Run the citation processor filter.
    pub citeproc: bool,
    /// Read input from this file instead of stdin.
    pub input: Option<PathBuf>,
    /// Write output to this file instead of stdout.
    pub output: Option<PathBuf>,
    /// Passed through after the generated arguments.
    pub extra_args: Vec<String>,
}

/// Finds the pandoc binary.
pub fn resolve_pandoc_binary(explicit: Option<&Path>) -> Result<PathBuf, BridgeError> {
    resolve_binary(explicit, BINARY_ENV, "pandoc")
}

/// Finds the `pandoc-citeproc` binary.
pub fn resolve_citeproc_binary(explicit: Option<&Path>) -> Result<PathBuf, BridgeError> {
    resolve_binary(explicit, CITEPROC_BINARY_ENV, CITEPROC_FILTER)
}

fn resolve_binary(explicit: Option<&Path>, env: &str, name: &str) -> Result<PathBuf, BridgeError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(env) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    which::which(name)
        .map_err(|err| BridgeError::NotFound(format!("{err}; install {name} or set {env}")))
}

/// Command line for a conversion from `from` to `to`.
pub fn arguments(from: &str, to: &str, options: &BridgeOptions) -> Vec<String> {
    let mut args = vec![format!("--from={from}"), format!("--to={to}")];
    if options.standalone {
        args.push("--standalone".to_string());
    }
    if let Some(template) = &options.template {
        args.push(format!("--template={}", template.display()));
    }
    if options.citeproc {
        args.push(format!("--filter={CITEPROC_FILTER}"));
    }
    args.push("--eol=lf".to_string());
    if let Some(output) = &options.output {
        args.push(format!("--output={}", output.display()));
    }
    args.extend(options.extra_args.iter().cloned());
    if let Some(input) = &options.input {
        args.push(input.display().to_string());
    }
    args
}

/// Converts `input` in format `from` to Pandoc JSON.
pub async fn to_json(
    input: &[u8],
    from: &str,
    options: &BridgeOptions,
) -> Result<String, BridgeError> {
    let stdout = run(input, &arguments(from, "json", options), options).await?;
    String::from_utf8(stdout).map_err(|err| {
        BridgeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

/// Converts Pandoc JSON to format `to`.
///
/// Returns what pandoc printed, which is empty when `options.output` is set.
pub async fn from_json(
    json: &str,
    to: &str,
    options: &BridgeOptions,
) -> Result<Vec<u8>, BridgeError> {
    run(json.as_bytes(), &arguments("json", to, options), options).await
}

/// Converts a bibliography file (BibTeX, BibLaTeX, CSL YAML, RIS, ...) to
/// CSL-JSON with `pandoc-citeproc --bib2json`. The input format follows the
/// file extension.
pub async fn bib_to_csl(path: &Path, binary: Option<&Path>) -> Result<String, BridgeError> {
    let binary = resolve_citeproc_binary(binary)?;
    let args = vec!["--bib2json".to_string(), path.display().to_string()];
    let stdout = run_binary(&binary, &[], &args).await?;
    String::from_utf8(stdout).map_err(|err| {
        BridgeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

/// Spawns pandoc with `args`, feeding it `input`, and returns its stdout.
pub async fn run(
    input: &[u8],
    args: &[String],
    options: &BridgeOptions,
) -> Result<Vec<u8>, BridgeError> {
    let binary = resolve_pandoc_binary(options.binary.as_deref())?;
    run_binary(&binary, input, args).await
}

async fn run_binary(binary: &Path, input: &[u8], args: &[String]) -> Result<Vec<u8>, BridgeError> {
    tracing::debug!(binary = %binary.display(), ?args, "running pandoc");

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BridgeError::Spawn {
            binary: binary.display().to_string(),
            source,
        })?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_vec();
        tokio::spawn(async move {
            let written = match stdin.write_all(&input).await {
                Ok(()) => stdin.shutdown().await,
                Err(err) => Err(err),
            };
            match written {
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                    tracing::debug!("pandoc closed stdin early");
                    Ok(())
                }
                other => other,
            }
        })
    });

    let output = child.wait_with_output().await?;
    if let Some(writer) = writer {
        writer
            .await
            .map_err(|err| BridgeError::Io(std::io::Error::other(err)))??;
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut errors = Vec::new();
    for line in stderr.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.contains(WARNING_MARKER) {
            tracing::warn!(message = line, "pandoc");
        } else {
            errors.push(line);
        }
    }
    if !errors.is_empty() {
        return Err(BridgeError::Engine(errors.join("\n")));
    }
    if !output.status.success() {
        return Err(BridgeError::Engine(format!("exited with {}", output.status)));
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_arguments() {
        let args = arguments("markdown", "json", &BridgeOptions::default());
        insta::assert_snapshot!(args.join(" "), @"--from=markdown --to=json --eol=lf");
    }

    #[test]
    fn full_arguments() {
        let options = BridgeOptions {
            standalone: true,
            template: Some(PathBuf::from("/tmp/tpl.docx")),
            citeproc: true,
            input: Some(PathBuf::from("/tmp/in.docx")),
            output: Some(PathBuf::from("/tmp/out.docx")),
            extra_args: vec!["--wrap=none".to_string()],
            ..Default::default()
        };
        let args = arguments("json", "docx", &options);
        insta::assert_snapshot!(
            args.join(" "),
            @"--from=json --to=docx --standalone --template=/tmp/tpl.docx --filter=pandoc-citeproc --eol=lf --output=/tmp/out.docx --wrap=none /tmp/in.docx"
        );
    }

    #[test]
    fn explicit_binary_wins() {
        let path = Path::new("/opt/pandoc/bin/pandoc");
        assert_eq!(resolve_pandoc_binary(Some(path)).unwrap(), path);
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let options = BridgeOptions {
            binary: Some(PathBuf::from("/nonexistent/quire/pandoc")),
            ..Default::default()
        };
        let err = to_json(b"hello", "markdown", &options).await.unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    mod stub {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("pandoc");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn options(binary: PathBuf) -> BridgeOptions {
            BridgeOptions {
                binary: Some(binary),
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn stdout_is_returned() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(dir.path(), "cat");
            let json = to_json(b"{\"x\":1}", "markdown", &options(binary))
                .await
                .unwrap();
            assert_eq!(json, "{\"x\":1}");
        }

        #[tokio::test]
        async fn warnings_do_not_fail() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(dir.path(), "cat >/dev/null\necho '[WARNING] odd' >&2\necho out");
            let out = from_json("{}", "markdown", &options(binary)).await.unwrap();
            assert_eq!(out, b"out\n");
        }

        #[tokio::test]
        async fn other_stderr_fails() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(dir.path(), "cat >/dev/null\necho 'Unknown reader: foo' >&2");
            let err = to_json(b"", "foo", &options(binary)).await.unwrap_err();
            match err {
                BridgeError::Engine(message) => assert_eq!(message, "Unknown reader: foo"),
                other => panic!("unexpected error {other}"),
            }
        }

        #[tokio::test]
        async fn non_zero_exit_fails() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(dir.path(), "exit 3");
            let err = to_json(b"", "markdown", &options(binary)).await.unwrap_err();
            assert!(matches!(err, BridgeError::Engine(_)), "{err}");
        }
    }
}
