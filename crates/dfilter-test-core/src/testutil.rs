//! Fake analyzer and checker programs for tests.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Write an executable `/bin/sh` script named `name` into `dir`.
///
/// The file is created by a short-lived `sh` child, so no write descriptor for
/// it is ever open in this process. A sibling test thread forking while such a
/// descriptor is open would make executing the script fail with `ETXTBSY`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    let mut writer = Command::new("/bin/sh")
        .args(["-c", "cat > \"$1\" && chmod 755 \"$1\"", "sh"])
        .arg(&path)
        .stdin(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = writer.stdin.take() {
        stdin.write_all(format!("#!/bin/sh\n{body}").as_bytes())?;
    }
    let status = writer.wait()?;
    if status.success() {
        Ok(path)
    } else {
        Err(io::Error::other(format!(
            "failed to write {}: {status}",
            path.display()
        )))
    }
}

/// An analyzer that prints each argument it received on its own line.
pub fn echo_args_analyzer(dir: &Path) -> io::Result<PathBuf> {
    write_script(dir, "tshark", "printf '%s\\n' \"$@\"\n")
}

/// An analyzer that prints `lines` lines regardless of its arguments.
pub fn fixed_output_analyzer(dir: &Path, lines: usize) -> io::Result<PathBuf> {
    let body = (1..=lines).fold(String::new(), |mut acc, i| {
        acc.push_str(&format!("echo line{i}\n"));
        acc
    });
    write_script(dir, "tshark", &body)
}

/// A checker that prints `stdout`, writes `stderr` and exits with `code`.
pub fn fake_checker(dir: &Path, stdout: &str, stderr: &str, code: i32) -> io::Result<PathBuf> {
    write_script(
        dir,
        "dftest",
        &format!("printf '%s' '{stdout}'\nprintf '%s' '{stderr}' >&2\nexit {code}\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_script_is_executable_and_runs_at_once() -> TestResult {
        let dir = TempDir::new()?;
        for i in 0..20 {
            let script = write_script(dir.path(), &format!("s{i}"), &format!("echo {i}\n"))?;
            let mode = std::fs::metadata(&script)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
            let output = Command::new(&script).output()?;
            assert_eq!(String::from_utf8_lossy(&output.stdout), format!("{i}\n"));
        }
        Ok(())
    }

    #[test]
    fn test_script_body_is_written_verbatim() -> TestResult {
        let dir = TempDir::new()?;
        let script = write_script(dir.path(), "quotes", "printf '%s' \"$1\"\n")?;
        let content = std::fs::read_to_string(&script)?;
        assert_eq!(content, "#!/bin/sh\nprintf '%s' \"$1\"\n");
        Ok(())
    }
}
