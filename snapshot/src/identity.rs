// Process identity used to build global job ids

use crate::config::AgentConfig;
use crate::models::JobKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

const FALLBACK_HOST_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Identity of the monitored process as seen by a remote collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pid: String,
    host_address: String,
}

impl ProcessIdentity {
    pub fn new(pid: impl Into<String>, host_address: impl Into<String>) -> Self {
        Self {
            pid: pid.into(),
            host_address: host_address.into(),
        }
    }

    /// Resolve the identity of the current process, honouring config overrides
    pub fn current(config: &AgentConfig) -> Self {
        let pid = config
            .process_id
            .clone()
            .unwrap_or_else(|| std::process::id().to_string());
        let host_address = config
            .host_address
            .clone()
            .unwrap_or_else(|| local_host_address().to_string());

        tracing::debug!(pid = %pid, host_address = %host_address, "Process identity resolved");
        Self { pid, host_address }
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn host_address(&self) -> &str {
        &self.host_address
    }

    /// `<pid>_<host>_<hash>` where the hash only depends on the job full name
    pub fn global_job_id(&self, key: &JobKey) -> String {
        format!(
            "{}_{}_{}",
            self.pid,
            self.host_address,
            full_name_hash(&key.full_name())
        )
    }
}

/// First 8 bytes of the SHA-256 of `full_name`, hex encoded
fn full_name_hash(full_name: &str) -> String {
    let digest = Sha256::digest(full_name.as_bytes());
    hex::encode(&digest[..8])
}

// Connecting a UDP socket sends nothing; it only selects the outbound interface.
fn local_host_address() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(FALLBACK_HOST_ADDRESS)
}
