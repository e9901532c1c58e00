use std::{
    io::{BufRead, BufReader, Read},
    process::{Command, ExitStatus, Output, Stdio},
    thread,
};

use bitflags::bitflags;
use tracing::{debug, trace, Level};

use crate::result::{bail, err_msg, Result};

pub const YT_DLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

/// Run a command, returning its raw output handle.
///
/// IO handles will be captured only if the caller required it or if the log level is Debug.
/// In that last case, `stdout` and `stderr` will be logged.
///
/// The function returns an error only if the command failed to execute.
/// If the program runs but returns a non-0 status code, it will not trigger an error.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = tracing::enabled!(Level::DEBUG);
    let get_io = |capture| {
        if capture {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(get_io(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(get_io(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd.output()?;

    if is_debug {
        debug!("status: {}", res.status);
        debug!("stdout: {} bytes long", res.stdout.len());
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        debug!("stderr: {} bytes long", res.stderr.len());
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Run the command and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<()> {
    let res = run_command(program, f, Capture::STDERR)?;
    if res.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&res.stderr);
        bail(format!(
            "{program} did run but was not successful. Here is its stderr: {stderr}"
        ))
    }
}

#[derive(Debug)]
pub struct StreamedOutput {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Run a command, handing every `stdout` line to `on_line` as soon as it is printed.
///
/// `stderr` is collected on the side and returned once the program exits.
/// Like [`run_command`], a non-0 status code is not an error.
pub fn run_streaming<F, L>(program: &str, f: F, mut on_line: L) -> Result<StreamedOutput>
where
    F: FnOnce(&mut Command) -> &mut Command,
    L: FnMut(&str),
{
    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("Executing command: {cmd:?}");
    let mut child = cmd.spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| err_msg("Could not capture stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| err_msg("Could not capture stderr"))?;

    // Drain stderr concurrently, a full pipe would block the program
    let stderr = thread::scope(|scope| -> Result<Vec<u8>> {
        let collector = scope.spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).map(|_| buf)
        });

        for line in BufReader::new(stdout).split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches('\r');
            trace!("stdout: {line}");
            on_line(line);
        }

        Ok(collector
            .join()
            .map_err(|_| err_msg("stderr reader panicked"))??)
    })?;

    let status = child.wait()?;
    debug!("status: {status}");

    let stderr = String::from_utf8_lossy(&stderr).into_owned();
    trace!("stderr: {stderr:?}");

    Ok(StreamedOutput { status, stderr })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, lines: &mut Vec<String>) -> StreamedOutput {
        run_streaming("sh", |cmd| cmd.arg("-c").arg(script), |line| {
            lines.push(line.to_owned())
        })
        .unwrap()
    }

    #[test]
    fn stdout_lines_are_streamed_and_stderr_collected() {
        let mut lines = Vec::new();
        let res = sh(
            "echo one; echo oops >&2; printf 'two\\r\\nthree'; exit 3",
            &mut lines,
        );

        assert_eq!(lines, ["one", "two", "three"]);
        assert_eq!(res.status.code(), Some(3));
        assert_eq!(res.stderr, "oops\n");
    }

    #[test]
    fn large_stderr_does_not_block_the_program() {
        let mut lines = Vec::new();
        let res = sh(
            "head -c 300000 /dev/zero | tr '\\000' x >&2; echo done",
            &mut lines,
        );

        assert_eq!(lines, ["done"]);
        assert!(res.status.success());
        assert_eq!(res.stderr.len(), 300000);
    }

    #[test]
    fn missing_program_is_an_error() {
        let res = run_streaming("bcdl-test-no-such-program", |cmd| cmd.arg("-h"), |_| {});
        assert!(res.is_err());
    }
}
