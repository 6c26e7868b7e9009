// Host identity from the operating system
// reason: sysinfo for portable hostname lookup
use sysinfo::System;
use tracing::debug;

use fleetping_core::port::HostIdentity;

/// Host names as reported by the OS: the full name, then its short form
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostIdentity;

impl SystemHostIdentity {
    pub fn new() -> Self {
        Self
    }
}

impl HostIdentity for SystemHostIdentity {
    fn hostnames(&self) -> Vec<String> {
        let Some(full) = System::host_name() else {
            debug!("Host name not available");
            return Vec::new();
        };

        let mut names = vec![full.clone()];
        if let Some((short, _)) = full.split_once('.') {
            if !short.is_empty() {
                names.push(short.to_string());
            }
        }
        debug!(hostnames = ?names, "Host names collected");
        names
    }
}
