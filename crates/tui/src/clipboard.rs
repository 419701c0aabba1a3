use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

type Program = (&'static str, &'static [&'static str]);

const NO_ARGS: &[&str] = &[];

/// Clipboard programs tried in order for the current platform.
fn candidates() -> &'static [Program] {
    #[cfg(target_os = "macos")]
    {
        const PROGRAMS: &[Program] = &[("pbcopy", NO_ARGS)];
        PROGRAMS
    }
    #[cfg(target_os = "linux")]
    {
        const PROGRAMS: &[Program] = &[
            ("wl-copy", NO_ARGS),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ];
        PROGRAMS
    }
    #[cfg(target_os = "windows")]
    {
        const PROGRAMS: &[Program] = &[("clip", NO_ARGS)];
        PROGRAMS
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        &[]
    }
}

fn pipe_to(program: &str, args: &[&str], value: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launch {program}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(value.as_bytes())
            .with_context(|| format!("write {program}"))?;
    }
    let status = child.wait().with_context(|| format!("wait {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// Copy `value` with the first clipboard program that works.
pub fn copy(value: &str) -> Result<()> {
    let mut last_err = None;
    for (program, args) in candidates() {
        match pipe_to(program, args, value) {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!("clipboard via {program} failed: {e:#}");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e.context("clipboard copy failed")),
        None => bail!("clipboard copy is unavailable on this platform"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn linux_prefers_wayland_then_x11() {
        let names: Vec<_> = candidates().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["wl-copy", "xclip", "xsel"]);
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = pipe_to("pipeline-ui-no-such-clipboard", &[], "x").unwrap_err();
        assert!(err.to_string().contains("launch pipeline-ui-no-such-clipboard"));
    }
}
