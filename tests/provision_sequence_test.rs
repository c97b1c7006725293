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
//! The full provision sequence against a mocked BMC: strict action ordering,
//! abort on transport failure, and the guard against re-running the forced
//! reboot.

use std::sync::Once;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redfish_provisioner::{
    Credentials, EventPublisher, FixedInventory, HostRecord, Provisioner, RedfishClientPool,
    RedfishError, RedfishProvisioner, PROVISION_REQUEUE_DELAY,
};

const VM_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1/VirtualMedia/CD";
const EJECT_PATH: &str =
    "/redfish/v1/Managers/iDRAC.Embedded.1/VirtualMedia/CD/Actions/VirtualMedia.EjectMedia";
const INSERT_PATH: &str =
    "/redfish/v1/Managers/iDRAC.Embedded.1/VirtualMedia/CD/Actions/VirtualMedia.InsertMedia";
const IMPORT_PATH: &str =
    "/redfish/v1/Managers/iDRAC.Embedded.1/Actions/Oem/EID_674_Manager.ImportSystemConfiguration";
const RESET_PATH: &str =
    "/redfish/v1/Systems/System.Embedded.1/Actions/ComputerSystem.Reset";

static SETUP: Once = Once::new();

fn setup() {
    SETUP.call_once(|| {
        use tracing_subscriber::fmt::Layer;
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{filter::LevelFilter, EnvFilter};
        tracing_subscriber::registry()
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy()
                    .add_directive("hyper=warn".parse().unwrap())
                    .add_directive("reqwest=warn".parse().unwrap())
                    .add_directive("rustls=warn".parse().unwrap()),
            )
            .with(
                Layer::default()
                    .compact()
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
            .init();
    });
}

struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _reason: &str, _message: &str) {}
}

fn creds() -> Credentials {
    setup();
    Credentials {
        username: "root".to_string(),
        password: "calvin".to_string(),
    }
}

fn host_for(server: &MockServer) -> HostRecord {
    let mut host = HostRecord::new("node-0", &format!("{}/redfish/v1", server.uri()));
    host.image_url = Some("http://images/ubuntu.iso".to_string());
    host
}

async fn trace(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|r| (r.method.to_string(), r.url.path().to_string()))
        .collect()
}

#[tokio::test]
async fn test_provision_runs_actions_in_order() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;
    // A CD is attached when provisioning starts; after the eject the status
    // read reports it gone, so the insert must run.
    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ConnectedVia": "URI"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ConnectedVia": "NotConnected"})),
        )
        .mount(&server)
        .await;
    for action in [EJECT_PATH, INSERT_PATH, IMPORT_PATH, RESET_PATH] {
        Mock::given(method("POST"))
            .and(path(action))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let creds = creds();
    let publisher = NullPublisher;
    let pool = RedfishClientPool::builder().allow_plain_http().build()?;
    let p = RedfishProvisioner::new(&creds, &publisher, &FixedInventory, pool);
    let mut host = host_for(&server);

    let result = p.provision(&mut host).await?;
    assert!(result.dirty);
    assert_eq!(result.requeue_after, PROVISION_REQUEUE_DELAY);
    assert_eq!(
        host.provisioned_image.as_deref(),
        Some("http://images/ubuntu.iso")
    );
    assert!(!host.needs_provisioning());

    let expected: Vec<(String, String)> = [
        ("GET", VM_PATH),
        ("POST", EJECT_PATH),
        ("GET", VM_PATH),
        ("POST", INSERT_PATH),
        ("POST", IMPORT_PATH),
        ("POST", RESET_PATH),
    ]
    .iter()
    .map(|(m, p)| (m.to_string(), p.to_string()))
    .collect();
    assert_eq!(trace(&server).await, expected);
    Ok(())
}

#[tokio::test]
async fn test_provision_does_not_rerun_for_same_image() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ConnectedVia": "NotConnected"})),
        )
        .mount(&server)
        .await;
    for action in [INSERT_PATH, IMPORT_PATH, RESET_PATH] {
        Mock::given(method("POST"))
            .and(path(action))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let creds = creds();
    let publisher = NullPublisher;
    let pool = RedfishClientPool::builder().allow_plain_http().build()?;
    let p = RedfishProvisioner::new(&creds, &publisher, &FixedInventory, pool);
    let mut host = host_for(&server);

    assert!(p.provision(&mut host).await?.dirty);
    let requests_after_first = trace(&server).await.len();
    assert!(!host.needs_provisioning());

    // Stable no-op: the destructive chain must not run again.
    let second = p.provision(&mut host).await?;
    assert!(!second.dirty);
    assert_eq!(trace(&server).await.len(), requests_after_first);

    // A new image provisions again.
    host.image_url = Some("http://images/fedora.iso".to_string());
    assert!(host.needs_provisioning());
    Ok(())
}

#[tokio::test]
async fn test_transport_error_aborts_sequence() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ConnectedVia": "URI"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EJECT_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    for action in [INSERT_PATH, IMPORT_PATH, RESET_PATH] {
        Mock::given(method("POST"))
            .and(path(action))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
    }

    let creds = creds();
    let publisher = NullPublisher;
    let pool = RedfishClientPool::builder().allow_plain_http().build()?;
    let p = RedfishProvisioner::new(&creds, &publisher, &FixedInventory, pool);
    let mut host = host_for(&server);

    let err = p.provision(&mut host).await.unwrap_err();
    assert!(matches!(err, RedfishError::HTTPErrorCode { .. }));
    // No marker: the controller will retry the whole sequence.
    assert_eq!(host.provisioned_image, None);
    Ok(())
}
