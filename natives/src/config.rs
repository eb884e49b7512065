use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NativesConfig {
    /// Namespace for staging keys created by algebra batches
    pub temp_key_prefix: String,
    /// Upper bound on members carried by one SADD/SREM command
    pub max_members_per_command: usize,
}

impl Default for NativesConfig {
    fn default() -> Self {
        Self {
            temp_key_prefix: "natives:tmp:".to_string(),
            max_members_per_command: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RespConfig {
    /// Address of the Redis-compatible store
    pub addr: String,
    pub connect_timeout: Option<Duration>,
    /// Applies to each write and each reply read
    pub io_timeout: Option<Duration>,
}

impl Default for RespConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            connect_timeout: Some(Duration::from_secs(5)),
            io_timeout: None,
        }
    }
}

impl RespConfig {
    pub fn with_addr(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), ..Self::default() }
    }
}

pub type SharedConfig = Arc<NativesConfig>;
