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
//! Drives the out-of-band lifecycle of a bare metal server through its BMC's
//! Redfish REST interface: attach a boot image as virtual media, set a
//! one-time boot override, force a reboot, toggle power, and tear a host
//! down for reuse.
//!
//! This crate is one provider plugged into a larger host-management
//! controller. The controller owns the reconciliation loop, persistence of
//! [`HostRecord`]s and credential storage; it drives one [`Provisioner`]
//! operation per tick and persists the mutated record whenever
//! [`StepResult::dirty`] is set.

pub mod bmc;
mod error;
pub mod host;
pub mod inspection;
pub mod model;
mod network;
mod provisioner;

pub use bmc::{Bmc, Outcome};
pub use error::RedfishError;
pub use host::{Cpu, Credentials, HardwareDetails, HostRecord, Nic, Storage};
pub use inspection::{FixedInventory, InspectionService};
pub use network::{Endpoint, RedfishClientPool, RedfishClientPoolBuilder, RedfishHttpClient};
pub use provisioner::{
    RedfishProvisioner, StepResult, DEPROVISION_REQUEUE_DELAY, PROVISION_REQUEUE_DELAY,
    REGISTER_REQUEUE_DELAY,
};

/// The step protocol the host controller drives.
///
/// Every operation is idempotent and re-entrant: the controller calls it
/// repeatedly with the current record until it reports `dirty = false`, and
/// an operation that reports `dirty = false` with a zero requeue hint is a
/// stable no-op for unchanged inputs. Calls against the same record must be
/// serialized by the controller; nothing here locks.
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    /// Tests the connection information for the host and registers it with
    /// the management backend if that has not happened yet.
    async fn validate_management_access(
        &self,
        host: &mut HostRecord,
    ) -> Result<StepResult, RedfishError>;

    /// Fills in the hardware details of the host. Reports dirty until
    /// inspection has completed.
    async fn inspect_hardware(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError>;

    /// Refreshes cached hardware state. Expected to be cheap; reports dirty
    /// only when something actually changed.
    async fn update_hardware_state(
        &self,
        host: &mut HostRecord,
    ) -> Result<StepResult, RedfishError>;

    /// Writes the image from the host record to the host: eject any attached
    /// media, insert the image, set one-time boot to the virtual CD and
    /// force a restart. The forced restart is destructive, so the sequence
    /// only runs when the requested image is not already on the host.
    async fn provision(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError>;

    /// Prepares the host for removal. Clears one piece of provisioning state
    /// per call and reports dirty until nothing is left.
    async fn deprovision(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError>;

    /// Ensures the host is powered on, independent of any image operation.
    async fn power_on(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError>;

    /// Ensures the host is powered off, independent of any image operation.
    async fn power_off(&self, host: &mut HostRecord) -> Result<StepResult, RedfishError>;
}

/// Notified of significant host transitions, synchronously, as they happen.
/// Implemented by the controller, typically by recording an event against
/// the host object.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, reason: &str, message: &str);
}
