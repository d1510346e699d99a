//! Mounting a network share at the target directory.
//!
//! The agent only mounts when both `network_user` and `network_password`
//! are configured. [`NetUseMounter`] drives the Windows `net use` command:
//!
//! ```text
//! net use * /delete /yes                      failure logged, ignored
//! net use <target> /delete                    failure logged, ignored
//! net use <target> /user:<user> <password>    failure is fatal
//! ```
//!
//! The password is passed as a process argument only. [`NetUseCommand`]'s
//! `Debug` and `Display` output, the log lines and [`MountError`] all mask it.

use std::fmt;
use std::io;
use std::process::Command;

use camino::Utf8Path;

use fc_core::RemoteCredentials;

const MASK: &str = "********";

/// Errors that can occur while mounting the remote target.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    /// The mount command ran and reported failure.
    #[error("`{command}` failed ({status}): {output}")]
    Command {
        /// The command line, password masked.
        command: String,
        /// The process exit status.
        status: String,
        /// Combined stdout and stderr, trimmed.
        output: String,
    },

    /// The mount command could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line, password masked.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// This platform has no `net use`.
    #[error("mounting a network share is only supported on Windows")]
    Unsupported,
}

/// Makes a network share available at a local path.
///
/// Runs on the blocking pool during startup, before directories are
/// validated.
pub trait RemoteMounter: Send + Sync {
    /// Ensures `target` is backed by a share mounted with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns a [`MountError`] if the share could not be mounted.
    fn mount(&self, target: &Utf8Path, credentials: &RemoteCredentials) -> Result<(), MountError>;
}

/// One `net use` invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct NetUseCommand {
    args: Vec<String>,
    secret: Option<usize>,
}

impl NetUseCommand {
    /// `net use * /delete /yes`: drop every existing mapping.
    #[must_use]
    pub fn unmount_all() -> Self {
        Self {
            args: vec!["use".into(), "*".into(), "/delete".into(), "/yes".into()],
            secret: None,
        }
    }

    /// `net use <target> /delete`: drop the mapping for `target`.
    #[must_use]
    pub fn unmount(target: &Utf8Path) -> Self {
        Self {
            args: vec!["use".into(), target.to_string(), "/delete".into()],
            secret: None,
        }
    }

    /// `net use <target> /user:<user> <password>`.
    #[must_use]
    pub fn mount(target: &Utf8Path, credentials: &RemoteCredentials) -> Self {
        Self {
            args: vec![
                "use".into(),
                target.to_string(),
                format!("/user:{}", credentials.user),
                credentials.password.clone(),
            ],
            secret: Some(3),
        }
    }

    /// Returns the raw arguments, password included.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for NetUseCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("net")?;
        for (index, arg) in self.args.iter().enumerate() {
            if self.secret == Some(index) {
                write!(f, " {MASK}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for NetUseCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NetUseCommand")
            .field(&self.to_string())
            .finish()
    }
}

/// Mounts shares with the `net use` shell command.
#[derive(Debug, Clone)]
pub struct NetUseMounter {
    program: String,
    supported: bool,
}

impl NetUseMounter {
    /// Creates a mounter running `net` from `PATH`.
    ///
    /// On platforms other than Windows, [`mount`](RemoteMounter::mount)
    /// returns [`MountError::Unsupported`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "net".to_owned(),
            supported: cfg!(windows),
        }
    }

    /// Creates a mounter running `program` with `net`'s arguments.
    ///
    /// Used for wrappers that accept `net use` syntax on any platform.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            supported: true,
        }
    }

    fn run(&self, command: &NetUseCommand) -> Result<(), MountError> {
        tracing::debug!(command = %command, "Running mount command");

        let output = Command::new(&self.program)
            .args(command.args())
            .output()
            .map_err(|source| MountError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(MountError::Command {
            command: command.to_string(),
            status: output.status.to_string(),
            output: combined.trim().to_owned(),
        })
    }
}

impl Default for NetUseMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMounter for NetUseMounter {
    fn mount(&self, target: &Utf8Path, credentials: &RemoteCredentials) -> Result<(), MountError> {
        if !self.supported {
            return Err(MountError::Unsupported);
        }

        for cleanup in [NetUseCommand::unmount_all(), NetUseCommand::unmount(target)] {
            if let Err(error) = self.run(&cleanup) {
                tracing::warn!(error = %error, "Unmount before mount failed, continuing");
            }
        }

        self.run(&NetUseCommand::mount(target, credentials))?;
        tracing::info!(target_dir = %target, user = %credentials.user, "Mounted network share");
        Ok(())
    }
}
