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
//! Hardware inspection lives outside this crate; the provisioner only asks a
//! collaborator for the inventory once and stores the answer on the record.

use crate::host::{Cpu, HardwareDetails, HostRecord, Nic, Storage};

pub trait InspectionService: Send + Sync {
    /// Returns the hardware inventory for a host. Called once per host, when
    /// the record has no details yet.
    fn describe_hardware(&self, host: &HostRecord) -> HardwareDetails;
}

/// Placeholder inventory until a real inspection backend exists.
pub struct FixedInventory;

impl InspectionService for FixedInventory {
    fn describe_hardware(&self, _host: &HostRecord) -> HardwareDetails {
        HardwareDetails {
            ram_gib: 128,
            nics: vec![
                Nic {
                    name: "nic-1".to_string(),
                    model: "virt-io".to_string(),
                    network: "Pod Networking".to_string(),
                    mac: "some:mac:address".to_string(),
                    ip: "192.168.100.1".to_string(),
                    speed_gbps: 1,
                },
                Nic {
                    name: "nic-2".to_string(),
                    model: "e1000".to_string(),
                    network: "Pod Networking".to_string(),
                    mac: "some:other:mac:address".to_string(),
                    ip: "192.168.100.2".to_string(),
                    speed_gbps: 1,
                },
            ],
            storage: vec![
                Storage {
                    name: "disk-1 (boot)".to_string(),
                    media_type: "SSD".to_string(),
                    size_gib: 1024 * 93,
                    model: "Dell CFJ61".to_string(),
                },
                Storage {
                    name: "disk-2".to_string(),
                    media_type: "SSD".to_string(),
                    size_gib: 1024 * 93,
                    model: "Dell CFJ61".to_string(),
                },
            ],
            cpus: vec![Cpu {
                arch: "x86".to_string(),
                speed_ghz: 3.0,
            }],
        }
    }
}
