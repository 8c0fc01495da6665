//! NETCONF over the system `ssh` client
//!
//! The session runs `ssh -s <host> netconf` and speaks base:1.0 framing:
//! every message is terminated by `]]>]]>`. Only base:1.0 is announced in
//! the client hello, so servers never switch to chunked framing.
//! Authentication, host keys and timeouts are left to the ssh client.

use crate::reply::XmlElement;
use crate::{FetchError, NetconfConnection, Result, NETCONF_BASE_NS};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

const END_OF_MESSAGE: &[u8] = b"]]>]]>";

const CLIENT_HELLO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
  </capabilities>
</hello>"#;

/// Where and how to reach the device
#[derive(Debug, Clone, Default)]
pub struct SshTarget {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,

    /// Extra `-o` options handed to ssh (e.g. `StrictHostKeyChecking=no`)
    pub ssh_options: Vec<String>,
}

impl SshTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-s");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(username) = &self.username {
            cmd.arg("-l").arg(username);
        }
        for option in &self.ssh_options {
            cmd.arg("-o").arg(option);
        }
        cmd.arg(&self.host).arg("netconf");
        cmd
    }
}

/// NETCONF session over an ssh subprocess
pub struct SshConnection {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    message_id: u64,
    capabilities: Vec<String>,

    /// Set once hellos were exchanged; only then is `<close-session/>` sent
    established: bool,
}

impl SshConnection {
    /// Spawn ssh, read the server hello and answer with ours
    pub fn connect(target: &SshTarget) -> Result<Self> {
        debug!(host = %target.host, port = ?target.port, "Opening NETCONF session");
        Self::open(target.command())
    }

    fn open(mut command: Command) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FetchError::Transport(format!("Failed to spawn ssh: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FetchError::Transport("ssh stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::Transport("ssh stdout unavailable".to_string()))?;

        let mut conn = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            message_id: 0,
            capabilities: Vec::new(),
            established: false,
        };

        let hello = conn.read_message()?;
        conn.capabilities = parse_hello(&hello)?;
        conn.write_message(CLIENT_HELLO)?;
        conn.established = true;

        debug!(
            capabilities = conn.capabilities.len(),
            "NETCONF session established"
        );
        Ok(conn)
    }

    fn write_message(&mut self, message: &str) -> Result<()> {
        let stdin = &mut self.stdin;
        let written: std::io::Result<()> = (|| {
            stdin.write_all(message.as_bytes())?;
            stdin.write_all(END_OF_MESSAGE)?;
            stdin.flush()
        })();
        written.map_err(|e| FetchError::Transport(format!("Failed to write to session: {}", e)))
    }

    fn read_message(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        loop {
            let read = self
                .stdout
                .read_until(b'>', &mut buf)
                .map_err(|e| FetchError::Transport(format!("Failed to read from session: {}", e)))?;
            if read == 0 {
                return Err(FetchError::Transport(
                    "Session closed by remote end".to_string(),
                ));
            }
            if buf.ends_with(END_OF_MESSAGE) {
                buf.truncate(buf.len() - END_OF_MESSAGE.len());
                break;
            }
        }

        String::from_utf8(buf)
            .map_err(|e| FetchError::MalformedReply(format!("Reply is not UTF-8: {}", e)))
    }

    fn rpc(&mut self, body: &str) -> Result<String> {
        self.message_id += 1;
        let message = format!(
            r#"<rpc message-id="{}" xmlns="{}">{}</rpc>"#,
            self.message_id, NETCONF_BASE_NS, body
        );
        self.write_message(&message)?;
        self.read_message()
    }
}

impl NetconfConnection for SshConnection {
    fn server_capabilities(&self) -> Result<Vec<String>> {
        Ok(self.capabilities.clone())
    }

    fn get(&mut self, filter: &str) -> Result<String> {
        self.rpc(&format!("<get>{}</get>", filter))
    }

    fn dispatch(&mut self, request: &str) -> Result<String> {
        self.rpc(request)
    }
}

impl Drop for SshConnection {
    fn drop(&mut self) {
        if self.established {
            if let Err(e) = self.rpc("<close-session/>") {
                warn!("Failed to close NETCONF session: {}", e);
            }
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Capability URIs from a server `<hello>`
fn parse_hello(hello: &str) -> Result<Vec<String>> {
    let root = XmlElement::parse(hello)?;
    let capabilities = root
        .descend(&["hello", "capabilities"])
        .ok_or_else(|| {
            FetchError::MalformedReply("Server hello without capabilities".to_string())
        })?;

    Ok(capabilities
        .children_named("capability")
        .map(|c| c.text.trim().to_string())
        .collect())
}
