// logvet - platform/remote.rs
//
// Remote log acquisition over SSH/SFTP.
//
// One authenticated session is opened per check run and reused for every
// remote path; transport setup is the expensive part and the paths all
// live on the same host. The session hands back plain `String` log text;
// nothing above this layer knows SSH exists.

use crate::util::constants;
use crate::util::error::SourceError;
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// SFTP status codes that mean "the file is not there", which the check
/// runner downgrades to a skipped outcome. Everything else is fatal.
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_NO_SUCH_PATH: i32 = 10;

/// An authenticated SSH session to the host under check.
pub struct RemoteSession {
    session: Session,
    host: String,
    user: String,
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("host", &self.host)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl RemoteSession {
    /// Connect and authenticate with a password.
    ///
    /// The TCP connect is bounded by `SSH_CONNECT_TIMEOUT_SECS`; after the
    /// handshake every blocking operation on the session is bounded by
    /// `SSH_IO_TIMEOUT_MS` so a stalled transfer cannot hang the check.
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Self, SourceError> {
        let addr = (host, port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| SourceError::Resolve {
                host: host.to_string(),
            })?;

        tracing::info!(host, port, user, "Connecting to SSH host");

        let tcp = TcpStream::connect_timeout(
            &addr,
            Duration::from_secs(constants::SSH_CONNECT_TIMEOUT_SECS),
        )
        .map_err(|e| SourceError::Connect {
            host: host.to_string(),
            source: e,
        })?;

        let mut session = Session::new().map_err(|e| SourceError::Ssh {
            host: host.to_string(),
            operation: "session init",
            source: e,
        })?;

        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| SourceError::Ssh {
            host: host.to_string(),
            operation: "handshake",
            source: e,
        })?;

        if session.userauth_password(user, password).is_err() || !session.authenticated() {
            return Err(SourceError::Auth {
                host: host.to_string(),
                user: user.to_string(),
            });
        }

        session.set_timeout(constants::SSH_IO_TIMEOUT_MS);

        tracing::debug!(host, "SSH session established");

        Ok(Self {
            session,
            host: host.to_string(),
            user: user.to_string(),
        })
    }

    /// Fetch a remote log file's content over SFTP, decoded lossily like a
    /// local read. A missing file maps to `SourceError::NotFound`.
    pub fn fetch_log(&self, remote_path: &str) -> Result<String, SourceError> {
        let sftp = self.session.sftp().map_err(|e| SourceError::Ssh {
            host: self.host.clone(),
            operation: "sftp init",
            source: e,
        })?;

        let stat = sftp
            .stat(Path::new(remote_path))
            .map_err(|e| self.sftp_to_source(remote_path, "stat", e))?;

        if let Some(size) = stat.size {
            if size > constants::MAX_SOURCE_BYTES {
                return Err(SourceError::TooLarge {
                    path: self.source_name(remote_path),
                    size,
                    max: constants::MAX_SOURCE_BYTES,
                });
            }
        }

        let mut file = sftp
            .open(Path::new(remote_path))
            .map_err(|e| self.sftp_to_source(remote_path, "open", e))?;

        let mut bytes = Vec::with_capacity(stat.size.unwrap_or(0) as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| SourceError::Io {
                path: remote_path.into(),
                operation: "sftp read",
                source: e,
            })?;

        tracing::debug!(
            host = %self.host,
            path = remote_path,
            bytes = bytes.len(),
            "Fetched remote log"
        );

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Display name for a remote path: `user@host:path`.
    pub fn source_name(&self, remote_path: &str) -> String {
        format!("{}@{}:{}", self.user, self.host, remote_path)
    }

    fn sftp_to_source(
        &self,
        remote_path: &str,
        operation: &'static str,
        e: ssh2::Error,
    ) -> SourceError {
        map_sftp_error(&self.host, &self.source_name(remote_path), operation, e)
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        let _ = self
            .session
            .disconnect(None, "logvet check finished", None);
    }
}

/// Map an SFTP-layer error, keeping "no such file" distinct so the check
/// runner can treat an absent remote log as a skip.
fn map_sftp_error(
    host: &str,
    source_name: &str,
    operation: &'static str,
    e: ssh2::Error,
) -> SourceError {
    match e.code() {
        ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE) | ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_PATH) => {
            SourceError::NotFound {
                path: source_name.to_string(),
            }
        }
        _ => SourceError::Ssh {
            host: host.to_string(),
            operation,
            source: e,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_such_file_maps_to_not_found() {
        let e = ssh2::Error::new(ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE), "no such file");
        let mapped = map_sftp_error("box", "root@box:/var/log/x.log", "open", e);
        assert!(matches!(
            mapped,
            SourceError::NotFound { path } if path == "root@box:/var/log/x.log"
        ));
    }

    #[test]
    fn test_no_such_path_maps_to_not_found() {
        let e = ssh2::Error::new(ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_PATH), "no such path");
        let mapped = map_sftp_error("box", "root@box:/gone", "stat", e);
        assert!(matches!(mapped, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_other_sftp_errors_stay_fatal() {
        let e = ssh2::Error::new(ssh2::ErrorCode::SFTP(3), "permission denied");
        let mapped = map_sftp_error("box", "root@box:/var/log/x.log", "open", e);
        assert!(matches!(
            mapped,
            SourceError::Ssh { operation: "open", .. }
        ));
    }

    #[test]
    fn test_unresolvable_host_is_a_resolve_error() {
        let result = RemoteSession::connect("no-such-host.invalid.", 22, "root", "pw");
        assert!(matches!(result.unwrap_err(), SourceError::Resolve { .. }));
    }
}
