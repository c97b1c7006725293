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
//! Wire shapes for the handful of Redfish resources the provisioner touches.

use std::fmt;

use serde::{Deserialize, Serialize};

/// GET `Managers/{id}/VirtualMedia/CD`. Only the connection state matters
/// here; the other fields are kept for debug logging.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualMediaStatus {
    pub connected_via: Option<String>,
    pub image: Option<String>,
    pub inserted: Option<bool>,
}

impl VirtualMediaStatus {
    /// `"NotConnected"` and an absent field both count as disconnected.
    pub fn is_connected(&self) -> bool {
        matches!(self.connected_via.as_deref(), Some(v) if v != "NotConnected")
    }
}

/// POST body for `Actions/VirtualMedia.InsertMedia`.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct InsertMediaRequest {
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum ResetType {
    On,
    ForceOff,
    GracefulShutdown,
    GracefulRestart,
    ForceRestart,
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// POST body for `Actions/ComputerSystem.Reset`.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ResetRequest {
    pub reset_type: ResetType,
}

/// Dell OEM configuration import, POSTed to
/// `Actions/Oem/EID_674_Manager.ImportSystemConfiguration`. The settings in
/// the buffer are absolute, so re-applying the import is harmless.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ImportSystemConfiguration {
    pub share_parameters: ShareParameters,
    pub import_buffer: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ShareParameters {
    pub target: String,
}

impl ImportSystemConfiguration {
    /// Boot the virtual CD/DVD exactly once on the next restart.
    pub fn one_time_virtual_media_boot(manager_id: &str) -> ImportSystemConfiguration {
        ImportSystemConfiguration {
            share_parameters: ShareParameters {
                target: "ALL".to_string(),
            },
            import_buffer: format!(
                "<SystemConfiguration><Component FQDD=\"{manager_id}\">\
                 <Attribute Name=\"ServerBoot.1#BootOnce\">Enabled</Attribute>\
                 <Attribute Name=\"ServerBoot.1#FirstBootDevice\">VCD-DVD</Attribute>\
                 </Component></SystemConfiguration>"
            ),
        }
    }
}
