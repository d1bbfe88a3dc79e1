//! The interestingness oracle.
//!
//! An oracle judges whether a candidate input still exhibits the property
//! under investigation. Oracles must be idempotent in outcome for
//! identical inputs; the engine caches verdicts by content and treats
//! [`Verdict::Unresolved`] as not interesting.

use std::fs;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Oracle verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate preserves the property under investigation.
    Interesting,
    NotInteresting,
    /// The test could not be carried out (spawn failure, timeout).
    Unresolved,
}

/// Interestingness test over candidate bytes.
///
/// `id` is unique per invocation within a session; subprocess oracles use
/// it for working-directory isolation.
pub trait Oracle {
    fn test(&self, candidate: &[u8], id: &str) -> Verdict;
}

/// Wraps a plain closure as an oracle. The workhorse for embedding and
/// for in-process tests.
pub struct FnOracle<F> {
    f: F,
}

impl<F: Fn(&[u8]) -> bool> FnOracle<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn(&[u8]) -> bool> Oracle for FnOracle<F> {
    fn test(&self, candidate: &[u8], _id: &str) -> Verdict {
        if (self.f)(candidate) {
            Verdict::Interesting
        } else {
            Verdict::NotInteresting
        }
    }
}

/// Runs a user command against each candidate.
///
/// The candidate is written into a fresh scoped temp directory, the
/// command is spawned there with the candidate path appended to its
/// arguments and `WHITTLE_TEST_ID` in its environment. Exit status 0 is
/// interesting, any other status is not; spawn failures and timeouts are
/// unresolved. The directory is removed on every exit path.
pub struct SubprocessOracle {
    command: Vec<String>,
    file_name: String,
    timeout: Option<Duration>,
}

impl SubprocessOracle {
    /// # Panics
    /// Panics if `command` is empty.
    pub fn new(command: Vec<String>) -> Self {
        assert!(!command.is_empty(), "oracle command must not be empty");
        Self {
            command,
            file_name: "candidate".to_owned(),
            timeout: None,
        }
    }

    /// Name of the candidate file inside the working directory. Keep the
    /// original input's extension here when the test command cares.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Per-call timeout. An expired call is killed and reported
    /// unresolved.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Oracle for SubprocessOracle {
    fn test(&self, candidate: &[u8], id: &str) -> Verdict {
        let dir = match tempfile::Builder::new()
            .prefix(&format!("whittle-{id}-"))
            .tempdir()
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "cannot create oracle working directory");
                return Verdict::Unresolved;
            }
        };
        let path = dir.path().join(&self.file_name);
        if let Err(e) = fs::write(&path, candidate) {
            warn!(error = %e, "cannot write candidate file");
            return Verdict::Unresolved;
        }

        let mut child = match Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(&path)
            .env("WHITTLE_TEST_ID", id)
            .current_dir(dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %self.command[0], error = %e, "cannot spawn oracle command");
                return Verdict::Unresolved;
            }
        };

        let status = match self.timeout {
            None => child.wait().ok(),
            Some(timeout) => wait_with_timeout(&mut child, timeout),
        };
        match status {
            Some(status) if status.success() => Verdict::Interesting,
            Some(_) => Verdict::NotInteresting,
            None => {
                debug!(id, "oracle call timed out");
                let _ = child.kill();
                let _ = child.wait();
                Verdict::Unresolved
            }
        }
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_oracle_maps_bool_to_verdict() {
        let oracle = FnOracle::new(|bytes: &[u8]| bytes.contains(&b'x'));
        assert_eq!(oracle.test(b"axb", "t0"), Verdict::Interesting);
        assert_eq!(oracle.test(b"ab", "t1"), Verdict::NotInteresting);
    }

    #[cfg(unix)]
    #[test]
    fn subprocess_oracle_observes_exit_status() {
        let oracle = SubprocessOracle::new(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "grep -q needle \"$0\"".to_owned(),
        ]);
        assert_eq!(oracle.test(b"hay needle stack", "t0"), Verdict::Interesting);
        assert_eq!(oracle.test(b"just hay", "t1"), Verdict::NotInteresting);
    }

    #[cfg(unix)]
    #[test]
    fn subprocess_oracle_times_out_as_unresolved() {
        let oracle = SubprocessOracle::new(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            "sleep 5".to_owned(),
        ])
        .timeout(Duration::from_millis(50));
        assert_eq!(oracle.test(b"anything", "t0"), Verdict::Unresolved);
    }

    #[test]
    fn missing_command_is_unresolved() {
        let oracle = SubprocessOracle::new(vec!["whittle-no-such-binary".to_owned()]);
        assert_eq!(oracle.test(b"x", "t0"), Verdict::Unresolved);
    }
}
