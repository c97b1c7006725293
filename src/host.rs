/*
 * SPDX-License-Identifier: MIT
 *
 * Permission is hereby granted, free of charge, to any person obtaining a
 * copy of this software and associated documentation files (the "Software"),
 * to deal in the Software without restriction, including without limitation
 * the rights to use, copy, modify, merge, publish, distribute, sublicense,
 * and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL
 * THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
 * FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
 * DEALINGS IN THE SOFTWARE.
 */
use serde::{Deserialize, Serialize};

/// BMC basic-auth credentials. Owned by the controller and passed by
/// reference; never stored beyond the life of one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One managed server. The controller creates and persists this record; the
/// provisioning steps are the only code that mutates it. There is no
/// explicit state enum; the lifecycle state is inferred from which fields
/// are populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostRecord {
    /// Name the controller knows this host by. Used for logging only.
    pub name: String,
    /// Base endpoint of the BMC REST interface, e.g.
    /// `redfish://10.0.0.2/redfish/v1`. Whatever scheme it carries is
    /// coerced to HTTPS before use.
    pub bmc_address: String,
    /// OS image to write on the next provision call. Set by the controller.
    pub image_url: Option<String>,
    /// Identifier with the management backend; empty until registered.
    pub provisioning_id: String,
    /// Present once hardware inspection has completed.
    pub hardware_details: Option<HardwareDetails>,
    /// Last-known power state as tracked by this system, not polled live.
    pub powered_on: bool,
    /// Image a provision sequence last wrote successfully. Guards the forced
    /// reboot from re-running against an already provisioned host.
    pub provisioned_image: Option<String>,
    /// Last error reported for this host; cleared on successful access
    /// validation.
    pub error_message: Option<String>,
}

impl HostRecord {
    pub fn new(name: &str, bmc_address: &str) -> HostRecord {
        HostRecord {
            name: name.to_string(),
            bmc_address: bmc_address.to_string(),
            ..Default::default()
        }
    }

    /// True when the requested image is not the one already on the host.
    pub fn needs_provisioning(&self) -> bool {
        match &self.image_url {
            Some(url) => self.provisioned_image.as_deref() != Some(url.as_str()),
            None => false,
        }
    }

    /// Drops any recorded error, reporting whether there was one to drop.
    pub fn clear_error(&mut self) -> bool {
        self.error_message.take().is_some()
    }

    pub fn set_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }
}

/// Hardware inventory as reported by inspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HardwareDetails {
    pub ram_gib: u32,
    pub nics: Vec<Nic>,
    pub storage: Vec<Storage>,
    pub cpus: Vec<Cpu>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nic {
    pub name: String,
    pub model: String,
    pub network: String,
    pub mac: String,
    pub ip: String,
    pub speed_gbps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Storage {
    pub name: String,
    pub media_type: String,
    pub size_gib: u64,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cpu {
    pub arch: String,
    pub speed_ghz: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_needs_provisioning() {
        let mut host = HostRecord::new("node-0", "redfish://10.0.0.2/redfish/v1");
        assert!(!host.needs_provisioning());

        host.image_url = Some("http://images/ubuntu.iso".to_string());
        assert!(host.needs_provisioning());

        host.provisioned_image = host.image_url.clone();
        assert!(!host.needs_provisioning());

        host.image_url = Some("http://images/fedora.iso".to_string());
        assert!(host.needs_provisioning());
    }

    #[test]
    fn test_clear_error_reports_change() {
        let mut host = HostRecord::new("node-0", "redfish://10.0.0.2/redfish/v1");
        assert!(!host.clear_error());

        host.set_error("registration failed");
        assert!(host.clear_error());
        assert_eq!(host.error_message, None);
        assert!(!host.clear_error());
    }
}
