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
//! Scripted virtual-media and boot actions built on the HTTP client.
//!
//! Eject and insert guard themselves on the current media connection state,
//! so re-running them is safe. A failed call returns the error to the caller
//! instead of continuing; skipping a step and rebooting anyway would boot
//! the wrong media.

use tracing::{debug, info, warn};

use crate::model::{
    ImportSystemConfiguration, InsertMediaRequest, ResetRequest, ResetType, VirtualMediaStatus,
};
use crate::network::RedfishHttpClient;
use crate::RedfishError;

/// Whether an action had to touch the BMC or was already satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Skipped,
}

pub struct Bmc {
    client: RedfishHttpClient,
}

impl Bmc {
    pub fn new(client: RedfishHttpClient) -> Bmc {
        Bmc { client }
    }

    /// Reads the virtual CD connection state. A BMC that answers garbage is
    /// treated as having nothing attached, so an insert still runs.
    pub async fn is_media_connected(&self) -> Result<bool, RedfishError> {
        let url = self.client.manager_url(&["VirtualMedia", "CD"]);
        match self.client.get::<VirtualMediaStatus>(&url).await {
            Ok((_status_code, media)) => Ok(media.is_connected()),
            Err(RedfishError::JsonDeserializeError { url, body, .. }) => {
                warn!("Unreadable virtual media state from {url}: {body}");
                Ok(false)
            }
            Err(RedfishError::NoContent) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ejects the attached virtual CD, if any.
    pub async fn eject_media(&self) -> Result<Outcome, RedfishError> {
        if !self.is_media_connected().await? {
            debug!("No media to eject");
            return Ok(Outcome::Skipped);
        }
        info!("Ejecting attached media");
        let url = self
            .client
            .manager_url(&["VirtualMedia", "CD", "Actions", "VirtualMedia.EjectMedia"]);
        match self.client.post(&url, &serde_json::json!({})).await {
            Ok(_status_code) => Ok(Outcome::Applied),
            // Dell answers 409 when the slot is already empty.
            Err(RedfishError::UnnecessaryOperation) => Ok(Outcome::Skipped),
            Err(e) => Err(e),
        }
    }

    /// Attaches `image_url` as the virtual CD. An already attached image is
    /// assumed to be the right one and left alone.
    pub async fn insert_media(&self, image_url: &str) -> Result<Outcome, RedfishError> {
        if self.is_media_connected().await? {
            debug!("Media already attached, skipping insert");
            return Ok(Outcome::Skipped);
        }
        info!("Attaching media {image_url}");
        let url = self
            .client
            .manager_url(&["VirtualMedia", "CD", "Actions", "VirtualMedia.InsertMedia"]);
        let body = InsertMediaRequest {
            image: image_url.to_string(),
        };
        self.client
            .post(&url, &body)
            .await
            .map(|_status_code| Outcome::Applied)
    }

    /// Applies the one-time boot override to the virtual CD/DVD. There is no
    /// read-back check; the setting is absolute and re-applying it is safe.
    pub async fn set_one_time_boot(&self) -> Result<Outcome, RedfishError> {
        info!("Setting one-time boot to virtual CD/DVD");
        let url = self.client.manager_url(&[
            "Actions",
            "Oem",
            "EID_674_Manager.ImportSystemConfiguration",
        ]);
        let body = ImportSystemConfiguration::one_time_virtual_media_boot(self.client.manager_id());
        self.client
            .post(&url, &body)
            .await
            .map(|_status_code| Outcome::Applied)
    }

    /// Forces a restart. Every call reboots the host; the owning provisioning
    /// step is responsible for not invoking this twice for the same image.
    pub async fn force_reboot(&self) -> Result<Outcome, RedfishError> {
        info!("Forcing host restart");
        let url = self.client.system_url(&["Actions", "ComputerSystem.Reset"]);
        let body = ResetRequest {
            reset_type: ResetType::ForceRestart,
        };
        self.client
            .post(&url, &body)
            .await
            .map(|_status_code| Outcome::Applied)
    }
}
