//! IOS XE device client
//!
//! Every operation opens its own CLI session and closes it again before
//! returning, whatever the outcome. Command text is checked against the
//! modifier denylist before a connection is attempted.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use netops_core::config::IosXeSettings;
use netops_core::{Credentials, Error, Result};

use crate::ssh::SshTransportFactory;
use crate::testbed::{DeviceConnection, Testbed};

/// Output modifiers that are never passed to a device
pub const DISALLOWED_MODIFIERS: &[&str] =
    &["|", "include", "exclude", "begin", "redirect", ">", "<"];

const SHOW_RUN_BRIEF: &str = "show run brief";
const SHOW_LOGGING: &str = "show logging last 250";

fn modifier_error(text: &str, modifier: &str) -> Error {
    Error::validation(format!(
        "Command '{}' contains disallowed modifier '{}'. Modifiers are not allowed.",
        text.trim(),
        modifier
    ))
}

/// Reject a show command that carries an output modifier.
///
/// Every token matches as a case-insensitive substring, so
/// `show interfaces includeall` is refused along with `| include`.
pub fn check_disallowed_modifiers(text: &str) -> Result<()> {
    let lowered = text.to_lowercase();
    match DISALLOWED_MODIFIERS.iter().find(|m| lowered.contains(*m)) {
        Some(modifier) => Err(modifier_error(text, modifier)),
        None => Ok(()),
    }
}

/// Reject configuration text that carries an output modifier.
///
/// Symbols match anywhere. Word tokens match only as whole words so that
/// lines such as `ip dhcp excluded-address` can still be applied.
pub fn check_config_modifiers(config: &str) -> Result<()> {
    let words: Vec<String> = config.split_whitespace().map(str::to_lowercase).collect();

    for modifier in DISALLOWED_MODIFIERS {
        let found = if modifier.chars().all(char::is_alphabetic) {
            words.iter().any(|w| w == modifier)
        } else {
            config.contains(modifier)
        };
        if found {
            return Err(modifier_error(config, modifier));
        }
    }
    Ok(())
}

/// A blocking CLI session to one device
pub trait DeviceTransport: Send {
    fn connect(&mut self) -> Result<()>;

    /// Run one exec-mode command and return its raw output
    fn execute(&mut self, command: &str) -> Result<String>;

    /// Apply configuration lines in config mode
    fn configure(&mut self, config: &str) -> Result<String>;

    /// Close the session. Must be safe to call when not connected.
    fn disconnect(&mut self) -> Result<()>;
}

/// Builds unconnected transports for a device
pub trait TransportFactory: Send + Sync {
    fn open(&self, device: &DeviceConnection) -> Result<Box<dyn DeviceTransport>>;
}

/// Disconnects its transport when dropped
struct ScopedSession {
    device: String,
    transport: Box<dyn DeviceTransport>,
}

impl ScopedSession {
    fn connect(factory: &dyn TransportFactory, device: &DeviceConnection) -> Result<Self> {
        let mut session = Self {
            device: device.name.clone(),
            transport: factory.open(device)?,
        };
        info!("Connecting to device {} ({})", device.name, device.address());
        session.transport.connect()?;
        Ok(session)
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        debug!("Disconnecting from device {}", self.device);
        if let Err(e) = self.transport.disconnect() {
            warn!("Disconnect from {} failed: {}", self.device, e);
        }
    }
}

#[derive(Debug, Clone)]
enum DeviceTarget {
    Testbed {
        path: PathBuf,
        device: String,
        credentials: Option<Credentials>,
    },
    Direct(DeviceConnection),
}

impl DeviceTarget {
    fn name(&self) -> &str {
        match self {
            Self::Testbed { device, .. } => device,
            Self::Direct(conn) => &conn.name,
        }
    }

    fn resolve(&self) -> Result<DeviceConnection> {
        match self {
            Self::Testbed {
                path,
                device,
                credentials,
            } => Testbed::load(path)?.connection(device, credentials.as_ref()),
            Self::Direct(conn) => Ok(conn.clone()),
        }
    }
}

/// Client for one IOS XE device
pub struct IosXeClient {
    target: DeviceTarget,
    factory: Arc<dyn TransportFactory>,
}

impl IosXeClient {
    /// Client for the configured testbed device, using SSH.
    ///
    /// `credentials` override whatever the testbed declares.
    pub fn new(settings: &IosXeSettings, credentials: Option<Credentials>) -> Self {
        Self::with_factory(
            settings,
            credentials,
            Arc::new(SshTransportFactory::new(settings.connect_timeout)),
        )
    }

    pub fn with_factory(
        settings: &IosXeSettings,
        credentials: Option<Credentials>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            target: DeviceTarget::Testbed {
                path: settings.testbed.clone(),
                device: settings.device.clone(),
                credentials,
            },
            factory,
        }
    }

    /// Client for an already resolved device
    pub fn with_connection(device: DeviceConnection, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            target: DeviceTarget::Direct(device),
            factory,
        }
    }

    pub fn device(&self) -> &str {
        self.target.name()
    }

    /// Run a show command and return its raw output
    pub async fn read(&self, command: &str) -> Result<Value> {
        let command = command.trim().to_string();
        if command.is_empty() {
            return Err(Error::validation("A command must be provided."));
        }
        check_disallowed_modifiers(&command)?;
        self.run_command(command).await
    }

    /// Apply multi-line configuration text
    pub async fn configure(&self, config: &str) -> Result<Value> {
        if config.trim().is_empty() {
            return Err(Error::validation("Configuration text must not be empty."));
        }
        check_config_modifiers(config)?;

        let text = config.to_string();
        info!("Applying configuration to {}:\n{}", self.device(), text);
        let output = self
            .with_session(move |transport| transport.configure(&text))
            .await?;

        Ok(json!({
            "status": "success",
            "message": "Configuration applied successfully.",
            "device": self.device(),
            "output": output,
        }))
    }

    /// Retrieve the running configuration
    pub async fn learn_config(&self) -> Result<Value> {
        self.run_command(SHOW_RUN_BRIEF.to_string()).await
    }

    /// Retrieve recent log entries
    pub async fn learn_logging(&self) -> Result<Value> {
        self.run_command(SHOW_LOGGING.to_string()).await
    }

    async fn run_command(&self, command: String) -> Result<Value> {
        debug!("Executing '{}' on {}", command, self.device());
        let cmd = command.clone();
        let output = self
            .with_session(move |transport| transport.execute(&cmd))
            .await?;

        Ok(json!({
            "device": self.device(),
            "command": command,
            "output": output,
        }))
    }

    async fn with_session<F>(&self, op: F) -> Result<String>
    where
        F: FnOnce(&mut dyn DeviceTransport) -> Result<String> + Send + 'static,
    {
        let target = self.target.clone();
        let factory = Arc::clone(&self.factory);

        tokio::task::spawn_blocking(move || {
            let device = target.resolve()?;
            let mut session = ScopedSession::connect(factory.as_ref(), &device)?;
            op(session.transport.as_mut())
        })
        .await
        .map_err(|e| Error::transport(format!("Device task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        fail_connect: bool,
        fail_execute: bool,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct RecordingTransport(Arc<Recorder>);

    impl DeviceTransport for RecordingTransport {
        fn connect(&mut self) -> Result<()> {
            self.0.events.lock().unwrap().push("connect".into());
            if self.0.fail_connect {
                return Err(Error::auth("bad password"));
            }
            Ok(())
        }

        fn execute(&mut self, command: &str) -> Result<String> {
            self.0.events.lock().unwrap().push(format!("execute:{}", command));
            if self.0.fail_execute {
                return Err(Error::transport("channel closed"));
            }
            Ok(format!("output of {}", command))
        }

        fn configure(&mut self, config: &str) -> Result<String> {
            self.0.events.lock().unwrap().push(format!("configure:{}", config));
            Ok(String::new())
        }

        fn disconnect(&mut self) -> Result<()> {
            self.0.events.lock().unwrap().push("disconnect".into());
            Ok(())
        }
    }

    impl TransportFactory for Arc<Recorder> {
        fn open(&self, _device: &DeviceConnection) -> Result<Box<dyn DeviceTransport>> {
            Ok(Box::new(RecordingTransport(Arc::clone(self))))
        }
    }

    fn client(recorder: &Arc<Recorder>) -> IosXeClient {
        let device = DeviceConnection {
            name: "Cat8000V".into(),
            host: "192.0.2.1".into(),
            port: 22,
            os: Some("iosxe".into()),
            credentials: Credentials::new("admin", "pw"),
        };
        IosXeClient::with_connection(device, Arc::new(Arc::clone(recorder)))
    }

    #[test]
    fn test_modifier_denylist() {
        assert!(check_disallowed_modifiers("show ip interface brief").is_ok());

        let err = check_disallowed_modifiers("show ip int brief | include up").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("'|'"));

        assert!(check_disallowed_modifiers("show run > flash:run.txt").is_err());
        assert!(check_disallowed_modifiers("show logging BEGIN foo").is_err());
        assert!(check_disallowed_modifiers("show run | BEGIN x").is_err());
    }

    #[test]
    fn test_modifier_denylist_matches_substrings() {
        let err = check_disallowed_modifiers("show interfaces includeall").unwrap_err();
        assert!(err.to_string().contains("'include'"));

        let err = check_disallowed_modifiers("show ip dhcp excluded-address").unwrap_err();
        assert!(err.to_string().contains("'exclude'"));

        assert!(check_disallowed_modifiers("show Redirects").is_err());
    }

    #[test]
    fn test_config_modifiers_match_whole_words() {
        assert!(check_config_modifiers("ip dhcp excluded-address 10.0.0.1").is_ok());
        assert!(check_config_modifiers("interface Gi1\n description uplink").is_ok());
        assert!(check_config_modifiers("logging host 10.0.0.9 include").is_err());
        assert!(check_config_modifiers("banner motd < hi").is_err());
    }

    #[tokio::test]
    async fn test_read_with_substring_modifier_never_connects() {
        let recorder = Arc::new(Recorder::default());
        let err = client(&recorder)
            .read("show interfaces includeall")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_read_connects_and_disconnects() {
        let recorder = Arc::new(Recorder::default());
        let result = client(&recorder).read("show version").await.unwrap();

        assert_eq!(result["output"], "output of show version");
        assert_eq!(result["device"], "Cat8000V");
        assert_eq!(
            recorder.events(),
            vec!["connect", "execute:show version", "disconnect"]
        );
    }

    #[tokio::test]
    async fn test_configure_with_modifier_never_connects() {
        let recorder = Arc::new(Recorder::default());
        let err = client(&recorder)
            .configure("show ip int brief | include up")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_after_execute_failure() {
        let recorder = Arc::new(Recorder {
            fail_execute: true,
            ..Default::default()
        });
        let err = client(&recorder).learn_logging().await.unwrap_err();

        assert!(matches!(err, Error::Network { .. }));
        assert_eq!(
            recorder.events(),
            vec!["connect", "execute:show logging last 250", "disconnect"]
        );
    }

    #[tokio::test]
    async fn test_disconnect_after_connect_failure() {
        let recorder = Arc::new(Recorder {
            fail_connect: true,
            ..Default::default()
        });
        let err = client(&recorder).learn_config().await.unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(recorder.events(), vec!["connect", "disconnect"]);
    }

    #[tokio::test]
    async fn test_configure_applies_text() {
        let recorder = Arc::new(Recorder::default());
        let result = client(&recorder)
            .configure("interface Loopback100\n description mgmt")
            .await
            .unwrap();

        assert_eq!(result["status"], "success");
        assert_eq!(recorder.events()[1], "configure:interface Loopback100\n description mgmt");
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let recorder = Arc::new(Recorder::default());
        assert!(client(&recorder).read("   ").await.is_err());
        assert!(recorder.events().is_empty());
    }
}
