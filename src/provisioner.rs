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
//! The provisioning step state machine. State is not an explicit enum; it is
//! inferred from which [`HostRecord`] fields are populated, and each step
//! converges by mutating at most a small part of the record per call.

use std::time::Duration;

use tracing::{debug, info};

use crate::bmc::Bmc;
use crate::host::{Credentials, HostRecord};
use crate::inspection::InspectionService;
use crate::network::{Endpoint, RedfishClientPool};
use crate::{EventPublisher, Provisioner, RedfishError};

/// How soon to re-invoke after registering a new host.
pub const REGISTER_REQUEUE_DELAY: Duration = Duration::from_secs(5);
/// How soon to re-invoke after a provision sequence completed.
pub const PROVISION_REQUEUE_DELAY: Duration = Duration::from_secs(10);
/// How soon to re-invoke while deprovisioning converges.
pub const DEPROVISION_REQUEUE_DELAY: Duration = Duration::from_secs(10);

/// Outcome of one step invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepResult {
    /// The host record changed and must be persisted before the next call.
    pub dirty: bool,
    /// Hint for when the controller should invoke the step again. Zero means
    /// as soon as it likes.
    pub requeue_after: Duration,
}

impl StepResult {
    fn stable() -> StepResult {
        StepResult::default()
    }

    fn dirty_after(requeue_after: Duration) -> StepResult {
        StepResult {
            dirty: true,
            requeue_after,
        }
    }
}

/// Redfish-backed implementation of the step protocol. One instance serves
/// one reconciliation invocation; it holds no mutable state of its own, and
/// a fresh BMC client is built per provisioning call from the host's address
/// and the borrowed credentials.
pub struct RedfishProvisioner<'a> {
    creds: &'a Credentials,
    publisher: &'a dyn EventPublisher,
    inspector: &'a dyn InspectionService,
    pool: RedfishClientPool,
}

impl<'a> RedfishProvisioner<'a> {
    pub fn new(
        creds: &'a Credentials,
        publisher: &'a dyn EventPublisher,
        inspector: &'a dyn InspectionService,
        pool: RedfishClientPool,
    ) -> RedfishProvisioner<'a> {
        RedfishProvisioner {
            creds,
            publisher,
            inspector,
            pool,
        }
    }

    fn bmc_for(&self, host: &HostRecord) -> Bmc {
        let client = self
            .pool
            .create_client(Endpoint::new(&host.bmc_address), self.creds);
        Bmc::new(client)
    }
}

#[async_trait::async_trait]
impl Provisioner for RedfishProvisioner<'_> {
    async fn validate_management_access(
        &self,
        host: &mut HostRecord,
    ) -> Result<StepResult, RedfishError> {
        info!(host = %host.name, "testing management access");

        if host.provisioning_id.is_empty() {
            // TODO: replace the placeholder with real backend registration
            // once the management backend exists.
            host.provisioning_id = "temporary-fake-id".to_string();
            info!(
                host = %host.name,
                provisioning_id = %host.provisioning_id,
                "setting provisioning id"
            );
            self.publisher.publish("Registered", "Registered new host");
            return Ok(StepResult::dirty_after(REGISTER_REQUEUE_DELAY));
        }

        Ok(StepResult {
            dirty: host.clear_error(),
            requeue_after: Duration::ZERO,
        })
    }

    async fn inspect_hardware(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError> {
        info!(host = %host.name, "inspecting hardware");

        if host.hardware_details.is_none() {
            info!(host = %host.name, "continuing inspection by setting details");
            host.hardware_details = Some(self.inspector.describe_hardware(host));
            self.publisher
                .publish("InspectionComplete", "Hardware inspection completed");
            return Ok(StepResult::dirty_after(Duration::ZERO));
        }

        Ok(StepResult::stable())
    }

    async fn update_hardware_state(
        &self,
        host: &mut HostRecord,
    ) -> Result<StepResult, RedfishError> {
        debug!(host = %host.name, powered_on = host.powered_on, "updating hardware state");
        Ok(StepResult::stable())
    }

    async fn provision(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError> {
        let image = host.image_url.clone().ok_or(RedfishError::MissingImage)?;

        if !host.needs_provisioning() {
            // The forced restart is destructive. Never re-run the sequence
            // for an image that is already on the host.
            debug!(host = %host.name, image = %image, "image already provisioned");
            return Ok(StepResult::stable());
        }

        info!(host = %host.name, image = %image, "provisioning image to host");
        let bmc = self.bmc_for(host);

        bmc.eject_media().await?;
        bmc.insert_media(&image).await?;
        bmc.set_one_time_boot().await?;
        bmc.force_reboot().await?;

        host.provisioned_image = Some(image);
        info!(host = %host.name, "finished provisioning");
        Ok(StepResult::dirty_after(PROVISION_REQUEUE_DELAY))
    }

    async fn deprovision(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError> {
        info!(host = %host.name, "ensuring host is removed");

        // One piece of state is cleared per call, so the controller persists
        // incremental progress and a crash between calls loses at most one
        // field.
        if host.hardware_details.is_some() {
            self.publisher
                .publish("DeprovisionStarted", "Image deprovisioning started");
            info!(host = %host.name, "clearing hardware details");
            host.hardware_details = None;
            host.provisioned_image = None;
            return Ok(StepResult::dirty_after(DEPROVISION_REQUEUE_DELAY));
        }

        if !host.provisioning_id.is_empty() {
            info!(host = %host.name, "clearing provisioning id");
            host.provisioning_id.clear();
            return Ok(StepResult::dirty_after(DEPROVISION_REQUEUE_DELAY));
        }

        self.publisher
            .publish("DeprovisionComplete", "Image deprovisioning completed");
        Ok(StepResult {
            dirty: false,
            requeue_after: DEPROVISION_REQUEUE_DELAY,
        })
    }

    async fn power_on(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError> {
        info!(host = %host.name, "ensuring host is powered on");

        if !host.powered_on {
            self.publisher.publish("PowerOn", "Host powered on");
            info!(host = %host.name, "changing power status");
            host.powered_on = true;
            return Ok(StepResult::dirty_after(Duration::ZERO));
        }

        Ok(StepResult::stable())
    }

    async fn power_off(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError> {
        info!(host = %host.name, "ensuring host is powered off");

        if host.powered_on {
            self.publisher.publish("PowerOff", "Host powered off");
            info!(host = %host.name, "changing power status");
            host.powered_on = false;
            return Ok(StepResult::dirty_after(Duration::ZERO));
        }

        Ok(StepResult::stable())
    }
}
