//! SSH transport for IOS XE devices (libssh2)
//!
//! Show commands go over an exec channel. Configuration needs an
//! interactive shell because IOS XE only accepts one command per exec
//! request.

use ssh2::Session;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

use netops_core::{Error, Result};

use crate::ios_xe::{DeviceTransport, TransportFactory};
use crate::testbed::DeviceConnection;

/// Markers IOS XE prints when it rejects a configuration line
const CLI_ERROR_MARKERS: &[&str] = &["% Invalid input", "% Incomplete command", "% Ambiguous command"];

fn ssh_error(context: &str, err: ssh2::Error) -> Error {
    Error::transport(format!("{}: {}", context, err))
}

pub struct SshTransportFactory {
    connect_timeout: Duration,
}

impl SshTransportFactory {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl TransportFactory for SshTransportFactory {
    fn open(&self, device: &DeviceConnection) -> Result<Box<dyn DeviceTransport>> {
        Ok(Box::new(SshTransport::new(device.clone(), self.connect_timeout)))
    }
}

pub struct SshTransport {
    device: DeviceConnection,
    timeout: Duration,
    session: Option<Session>,
}

impl SshTransport {
    pub fn new(device: DeviceConnection, timeout: Duration) -> Self {
        Self {
            device,
            timeout,
            session: None,
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| Error::transport(format!("Not connected to {}", self.device.name)))
    }

}

/// Read a channel to EOF. Bytes that are not UTF-8 (a Latin-1 banner,
/// say) are replaced rather than failing the command.
fn read_output(reader: &mut impl Read) -> Result<String> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

impl DeviceTransport for SshTransport {
    fn connect(&mut self) -> Result<()> {
        let address = self.device.address();
        let socket = address
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::config(format!("Cannot resolve device address {}", address)))?;

        let tcp = TcpStream::connect_timeout(&socket, self.timeout)
            .map_err(|e| Error::transport(format!("Connect to {} failed: {}", address, e)))?;

        let mut session = Session::new().map_err(|e| ssh_error("SSH init failed", e))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.timeout.as_millis().min(u32::MAX as u128) as u32);
        session
            .handshake()
            .map_err(|e| ssh_error("SSH handshake failed", e))?;

        let creds = &self.device.credentials;
        session
            .userauth_password(&creds.username, creds.password())
            .map_err(|e| Error::auth(format!("SSH login to {} failed: {}", self.device.name, e)))?;
        if !session.authenticated() {
            return Err(Error::auth(format!("SSH login to {} rejected", self.device.name)));
        }

        debug!("SSH session established to {}", address);
        self.session = Some(session);
        Ok(())
    }

    fn execute(&mut self, command: &str) -> Result<String> {
        let mut channel = self
            .session()?
            .channel_session()
            .map_err(|e| ssh_error("Open channel failed", e))?;
        channel
            .exec(command)
            .map_err(|e| ssh_error("Exec failed", e))?;

        let output = read_output(&mut channel)?;
        channel.wait_close().map_err(|e| ssh_error("Channel close failed", e))?;

        let exit = channel.exit_status().unwrap_or(0);
        if exit != 0 {
            return Err(Error::network(
                None,
                format!("'{}' exited with status {}: {}", command, exit, output.trim()),
            ));
        }
        Ok(output)
    }

    fn configure(&mut self, config: &str) -> Result<String> {
        let mut channel = self
            .session()?
            .channel_session()
            .map_err(|e| ssh_error("Open channel failed", e))?;
        channel
            .request_pty("vt100", None, Some((200, 24, 0, 0)))
            .map_err(|e| ssh_error("PTY request failed", e))?;
        channel.shell().map_err(|e| ssh_error("Shell request failed", e))?;

        let mut script = String::from("terminal length 0\nconfigure terminal\n");
        for line in config.lines().filter(|l| !l.trim().is_empty()) {
            script.push_str(line);
            script.push('\n');
        }
        script.push_str("end\nexit\n");

        channel.write_all(script.as_bytes())?;
        channel.flush()?;
        channel.send_eof().map_err(|e| ssh_error("Send EOF failed", e))?;

        let output = read_output(&mut channel)?;
        if let Err(e) = channel.wait_close() {
            warn!("Closing config channel on {} failed: {}", self.device.name, e);
        }

        if let Some(line) = output
            .lines()
            .find(|l| CLI_ERROR_MARKERS.iter().any(|m| l.contains(m)))
        {
            return Err(Error::validation(format!(
                "Device {} rejected configuration: {}",
                self.device.name,
                line.trim()
            )));
        }
        Ok(output)
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.disconnect(None, "netops-agent done", None) {
                warn!("SSH disconnect from {} failed: {}", self.device.name, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netops_core::Credentials;

    fn device(port: u16) -> DeviceConnection {
        DeviceConnection {
            name: "lab".into(),
            host: "127.0.0.1".into(),
            port,
            os: None,
            credentials: Credentials::new("admin", "pw"),
        }
    }

    #[test]
    fn test_execute_requires_connection() {
        let mut transport = SshTransport::new(device(22), Duration::from_secs(1));
        assert!(transport.execute("show version").is_err());
        assert!(transport.disconnect().is_ok());
    }

    #[test]
    fn test_read_output_tolerates_latin1() {
        let mut banner: &[u8] = b"Caf\xe9 lab switch\nVersion 17.9\n";
        let output = read_output(&mut banner).unwrap();
        assert!(output.starts_with("Caf\u{fffd} lab switch"));
        assert!(output.contains("Version 17.9"));
    }

    #[test]
    fn test_connect_refused_is_network_error() {
        // bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut transport = SshTransport::new(device(port), Duration::from_secs(1));
        assert!(matches!(transport.connect(), Err(Error::Network { .. })));
    }
}
