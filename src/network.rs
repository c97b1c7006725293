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
use std::{collections::HashMap, time::Duration};

use reqwest::{
    header::HeaderValue, header::ACCEPT, header::CONTENT_TYPE, Client as HttpClient,
    ClientBuilder as HttpClientBuilder, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::host::Credentials;
pub use crate::RedfishError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Resource instance ids of the Dell iDRAC embedded manager and system.
/// Other BMCs expose different ids; override them on the [`Endpoint`].
pub const DEFAULT_SYSTEM_ID: &str = "System.Embedded.1";
pub const DEFAULT_MANAGER_ID: &str = "iDRAC.Embedded.1";

#[derive(Debug)]
pub struct RedfishClientPoolBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
    allow_plain_http: bool,
}

impl RedfishClientPoolBuilder {
    /// Accept self signed and otherwise invalid certificates.
    ///
    /// Certificate verification is on by default, but BMCs usually ship with
    /// a self-signed certificate, so most lab deployments need this.
    pub fn accept_invalid_certs(mut self) -> RedfishClientPoolBuilder {
        self.accept_invalid_certs = true;
        self
    }

    /// Keep an explicit `http://` base address as plain HTTP instead of
    /// coercing it to HTTPS. Only useful against mockup servers that cannot
    /// terminate TLS; real BMC traffic carries credentials and must not go
    /// over plain HTTP.
    pub fn allow_plain_http(mut self) -> RedfishClientPoolBuilder {
        self.allow_plain_http = true;
        self
    }

    /// Overwrites the timeout that will be applied to every request
    pub fn timeout(mut self, timeout: Duration) -> RedfishClientPoolBuilder {
        self.timeout = timeout;
        self
    }

    /// Builds a Redfish client network configuration
    pub fn build(&self) -> Result<RedfishClientPool, RedfishError> {
        let http_client = HttpClientBuilder::new()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .map_err(|source| RedfishError::ClientBuild { source })?;
        Ok(RedfishClientPool {
            http_client,
            allow_plain_http: self.allow_plain_http,
        })
    }
}

/// The endpoint that a client connects to, as supplied by the caller. The
/// base address is used verbatim except for scheme normalization at client
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base of the BMC REST interface, e.g. `redfish://10.0.0.2/redfish/v1`.
    pub base_address: String,
    /// Instance id for `Systems/{id}/...` resources.
    pub system_id: String,
    /// Instance id for `Managers/{id}/...` resources.
    pub manager_id: String,
}

impl Endpoint {
    pub fn new(base_address: &str) -> Endpoint {
        Endpoint {
            base_address: base_address.to_string(),
            system_id: DEFAULT_SYSTEM_ID.to_string(),
            manager_id: DEFAULT_MANAGER_ID.to_string(),
        }
    }

    pub fn with_system_id(mut self, id: &str) -> Endpoint {
        self.system_id = id.to_string();
        self
    }

    pub fn with_manager_id(mut self, id: &str) -> Endpoint {
        self.manager_id = id.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct RedfishClientPool {
    http_client: HttpClient,
    allow_plain_http: bool,
}

impl RedfishClientPool {
    /// Returns a builder for configuring a Redfish HTTP connection pool
    pub fn builder() -> RedfishClientPoolBuilder {
        RedfishClientPoolBuilder {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            allow_plain_http: false,
        }
    }

    /// Creates a client for one BMC endpoint. No network traffic happens
    /// here; the base address is normalized and the credentials are fixed
    /// for the life of the client.
    pub fn create_client(&self, endpoint: Endpoint, creds: &Credentials) -> RedfishHttpClient {
        RedfishHttpClient {
            http_client: self.http_client.clone(),
            base: normalize_base(&endpoint.base_address, self.allow_plain_http),
            system_id: endpoint.system_id,
            manager_id: endpoint.manager_id,
            username: creds.username.trim_end_matches('\n').to_string(),
            password: creds.password.trim_end_matches('\n').to_string(),
        }
    }
}

/// Host records arrive with `redfish://`, `http://` or no scheme at all;
/// whatever was supplied is coerced to HTTPS. A trailing slash is dropped so
/// URL building can always join with `/`.
fn normalize_base(address: &str, allow_plain_http: bool) -> String {
    let address = address.trim_end_matches('/');
    let (scheme, rest) = match address.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("", address),
    };
    if scheme == "http" && allow_plain_http {
        return address.to_string();
    }
    format!("https://{rest}")
}

/// A HTTP client which targets a single BMC endpoint
pub struct RedfishHttpClient {
    http_client: HttpClient,
    base: String,
    system_id: String,
    manager_id: String,
    username: String,
    password: String,
}

impl RedfishHttpClient {
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn manager_id(&self) -> &str {
        &self.manager_id
    }

    /// `{base}/Systems/{system_id}/{parts...}`. Pure; stable for identical
    /// inputs.
    pub fn system_url(&self, parts: &[&str]) -> String {
        format!(
            "{}/Systems/{}/{}",
            self.base,
            self.system_id,
            parts.join("/")
        )
    }

    /// `{base}/Managers/{manager_id}/{parts...}`.
    pub fn manager_url(&self, parts: &[&str]) -> String {
        format!(
            "{}/Managers/{}/{}",
            self.base,
            self.manager_id,
            parts.join("/")
        )
    }

    /// `{base}/EventService/{parts...}`.
    pub fn event_url(&self, parts: &[&str]) -> String {
        format!("{}/EventService/{}", self.base, parts.join("/"))
    }

    pub async fn get<T>(&self, url: &str) -> Result<(StatusCode, T), RedfishError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
    {
        let (status_code, resp_opt) = self.req::<T, String>(Method::GET, url, None).await?;
        match resp_opt {
            Some(response_body) => Ok((status_code, response_body)),
            None => Err(RedfishError::NoContent),
        }
    }

    pub async fn post<B>(&self, url: &str, data: &B) -> Result<StatusCode, RedfishError>
    where
        B: Serialize + ::std::fmt::Debug,
    {
        let (status_code, _resp_body): (_, Option<HashMap<String, serde_json::Value>>) =
            self.req(Method::POST, url, Some(data)).await?;
        Ok(status_code)
    }

    // All the HTTP requests happen from here.
    async fn req<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, Option<T>), RedfishError>
    where
        T: DeserializeOwned + ::std::fmt::Debug,
        B: Serialize + ::std::fmt::Debug,
    {
        let body_enc = match body {
            Some(b) => {
                let body_enc =
                    serde_json::to_string(b).map_err(|e| RedfishError::JsonSerializeError {
                        url: url.to_string(),
                        object_debug: format!("{b:?}"),
                        source: e,
                    })?;
                Some(body_enc)
            }
            None => None,
        };
        debug!(
            "TX {} {} {}",
            method,
            url,
            body_enc.as_deref().unwrap_or_default()
        );

        let mut req_b = match method {
            Method::GET => self.http_client.get(url),
            Method::POST => self.http_client.post(url),
            _ => unreachable!("Only GET and POST http methods are used."),
        };
        req_b = req_b
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .basic_auth(&self.username, Some(&self.password));
        if let Some(b) = body_enc {
            req_b = req_b.body(b);
        }
        let response = req_b.send().await.map_err(|e| RedfishError::NetworkError {
            url: url.to_string(),
            source: e,
        })?;
        let status_code = response.status();
        if status_code == StatusCode::CONFLICT {
            // 409 is how Dell responds to requests that are already satisfied,
            // such as ejecting media when nothing is attached.
            return Err(RedfishError::UnnecessaryOperation);
        }
        // read the body even if not status 2XX, because BMCs give useful error messages as JSON
        let response_body = response
            .text()
            .await
            .map_err(|e| RedfishError::NetworkError {
                url: url.to_string(),
                source: e,
            })?;
        let mut res = None;
        if !response_body.is_empty() {
            debug!("RX {status_code} {response_body}");
            match serde_json::from_str(&response_body) {
                Ok(v) => res.insert(v),
                Err(e) => {
                    return Err(RedfishError::JsonDeserializeError {
                        url: url.to_string(),
                        body: response_body,
                        source: e,
                    });
                }
            };
        } else {
            debug!("RX {status_code}");
        }

        if !status_code.is_success() {
            return Err(RedfishError::HTTPErrorCode {
                url: url.to_string(),
                status_code,
            });
        }
        Ok((status_code, res))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            username: "root".to_string(),
            password: "calvin".to_string(),
        }
    }

    fn client_for(base: &str) -> RedfishHttpClient {
        let pool = RedfishClientPool::builder().build().unwrap();
        pool.create_client(Endpoint::new(base), &creds())
    }

    #[test]
    fn test_system_url_coerces_scheme() {
        let client = client_for("http://example/redfish/v1");
        assert_eq!(
            client.system_url(&["Actions", "ComputerSystem.Reset"]),
            "https://example/redfish/v1/Systems/System.Embedded.1/Actions/ComputerSystem.Reset"
        );
    }

    #[test]
    fn test_redfish_scheme_becomes_https() {
        let client = client_for("redfish://10.0.0.2/redfish/v1");
        assert_eq!(
            client.manager_url(&["VirtualMedia", "CD"]),
            "https://10.0.0.2/redfish/v1/Managers/iDRAC.Embedded.1/VirtualMedia/CD"
        );
    }

    #[test]
    fn test_bare_address_gets_https() {
        let client = client_for("bmc.example.net/redfish/v1/");
        assert_eq!(client.base(), "https://bmc.example.net/redfish/v1");
        assert_eq!(
            client.event_url(&["Subscriptions"]),
            "https://bmc.example.net/redfish/v1/EventService/Subscriptions"
        );
    }

    #[test]
    fn test_plain_http_requires_opt_in() {
        let pool = RedfishClientPool::builder()
            .allow_plain_http()
            .build()
            .unwrap();
        let client = pool.create_client(Endpoint::new("http://127.0.0.1:8733/redfish/v1"), &creds());
        assert_eq!(client.base(), "http://127.0.0.1:8733/redfish/v1");
    }

    #[test]
    fn test_credentials_trailing_newline_stripped() {
        let pool = RedfishClientPool::builder().build().unwrap();
        let creds = Credentials {
            username: "root\n".to_string(),
            password: "calvin\n".to_string(),
        };
        let client = pool.create_client(Endpoint::new("redfish://h/redfish/v1"), &creds);
        assert_eq!(client.username, "root");
        assert_eq!(client.password, "calvin");
    }

    #[test]
    fn test_resource_ids_can_be_overridden() {
        let pool = RedfishClientPool::builder().build().unwrap();
        let endpoint = Endpoint::new("redfish://h/redfish/v1")
            .with_system_id("1")
            .with_manager_id("BMC");
        let client = pool.create_client(endpoint, &creds());
        assert_eq!(
            client.system_url(&["Actions", "ComputerSystem.Reset"]),
            "https://h/redfish/v1/Systems/1/Actions/ComputerSystem.Reset"
        );
        assert_eq!(
            client.manager_url(&["VirtualMedia", "CD"]),
            "https://h/redfish/v1/Managers/BMC/VirtualMedia/CD"
        );
    }
}
