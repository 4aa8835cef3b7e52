//! Realtime-database transport over HTTPS.
//!
//! Implements [`StreamTransport`] for a Firebase-style JSON store:
//!
//! | Operation     | Request                                                     |
//! |---------------|-------------------------------------------------------------|
//! | `open_stream` | `GET https://{host}{path}.json?auth=..`, `Accept: text/event-stream` |
//! | `get`         | `GET https://{host}{path}.json?auth=..`                     |
//! | `put`         | `PUT https://{host}{path}.json?auth=..` with a JSON body    |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the certificate
//!   bundle.  The stream is opened under `stream_connect_timeout_ms`, which
//!   covers the TCP connect, the TLS handshake and the response headers.
//!   Once the headers are in, the socket timeout drops to
//!   `stream_read_timeout_ms` so a read with nothing pending returns within
//!   a tick.
//! - **all other targets**: an in-memory store with an injectable event
//!   stream, for host-side tests and simulation.

use core::fmt::Write as _;

use crate::config::SystemConfig;
use crate::error::ChannelError;
use crate::remote::transport::StreamTransport;

/// Longest request URL.
pub const MAX_URL_LEN: usize = 256;

pub type ResourceUrl = heapless::String<MAX_URL_LEN>;

/// REST URL of the value at `path`.
pub fn resource_url(host: &str, path: &str, auth: &str) -> Result<ResourceUrl, ChannelError> {
    if host.is_empty() {
        return Err(ChannelError::NotConnected);
    }
    if !path.starts_with('/') {
        return Err(ChannelError::Malformed);
    }
    let mut url = ResourceUrl::new();
    write!(url, "https://{host}{path}.json").map_err(|_| ChannelError::Malformed)?;
    if !auth.is_empty() {
        write!(url, "?auth={auth}").map_err(|_| ChannelError::Malformed)?;
    }
    Ok(url)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::time::Duration;

    use esp_idf_svc::http::client::{Configuration, EspHttpConnection, FollowRedirectsPolicy};
    use esp_idf_svc::handle::RawHandle;
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::{Read, Write};
    use log::{debug, warn};

    use super::{resource_url, ChannelError, StreamTransport, SystemConfig};

    /// REST/REST-streaming client.
    pub struct FirebaseTransport {
        host: heapless::String<96>,
        auth: heapless::String<64>,
        connect_timeout: Duration,
        read_timeout_ms: u32,
        stream: Option<EspHttpConnection>,
    }

    impl FirebaseTransport {
        pub fn new(config: &SystemConfig) -> Self {
            Self {
                host: config.remote_host.clone(),
                auth: config.remote_auth.clone(),
                connect_timeout: Duration::from_millis(u64::from(config.stream_connect_timeout_ms)),
                read_timeout_ms: config.stream_read_timeout_ms,
                stream: None,
            }
        }

        fn connect(&self, timeout: Duration) -> Result<EspHttpConnection, ChannelError> {
            EspHttpConnection::new(&Configuration {
                timeout: Some(timeout),
                follow_redirects_policy: FollowRedirectsPolicy::FollowAll,
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            })
            .map_err(|e| {
                warn!("Firebase: client init failed ({})", e);
                ChannelError::Transport
            })
        }

        fn request(
            &self,
            method: Method,
            path: &str,
            headers: &[(&str, &str)],
            body: &[u8],
            timeout: Duration,
        ) -> Result<EspHttpConnection, ChannelError> {
            let url = resource_url(&self.host, path, &self.auth)?;
            let mut conn = self.connect(timeout)?;
            conn.initiate_request(method, &url, headers)
                .map_err(|_| ChannelError::Transport)?;
            if !body.is_empty() {
                conn.write_all(body).map_err(|_| ChannelError::Transport)?;
            }
            conn.initiate_response().map_err(|_| ChannelError::Transport)?;
            match conn.status() {
                200..=299 => Ok(conn),
                401 | 403 => Err(ChannelError::AuthRevoked),
                status => Err(ChannelError::Http(status)),
            }
        }
    }

    /// REST calls are one-shot and may take longer than a stream read.
    const REST_TIMEOUT: Duration = Duration::from_secs(5);

    impl StreamTransport for FirebaseTransport {
        fn open_stream(&mut self, path: &str) -> Result<(), ChannelError> {
            self.close_stream();
            let conn = self.request(
                Method::Get,
                path,
                &[("Accept", "text/event-stream")],
                &[],
                self.connect_timeout,
            )?;
            // Headers are in: from here on every read is bounded by the short timeout.
            let timeout_ms = i32::try_from(self.read_timeout_ms).unwrap_or(i32::MAX);
            // SAFETY: the handle belongs to `conn`, which is alive for the call.
            esp_idf_svc::sys::esp!(unsafe {
                esp_idf_svc::sys::esp_http_client_set_timeout_ms(conn.handle(), timeout_ms)
            })
            .map_err(|e| {
                warn!("Firebase: cannot shorten stream read timeout ({})", e);
                ChannelError::Transport
            })?;
            debug!("Firebase: stream open on '{}'", path);
            self.stream = Some(conn);
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
            let Some(conn) = self.stream.as_mut() else {
                return Err(ChannelError::NotConnected);
            };
            match conn.read(buf) {
                Ok(0) => {
                    self.stream = None;
                    Err(ChannelError::StreamClosed)
                }
                Ok(n) => Ok(n),
                // Read timed out with nothing pending.
                Err(e) if e.0.code() == esp_idf_svc::sys::ESP_ERR_HTTP_EAGAIN as i32 => Ok(0),
                Err(e) => {
                    warn!("Firebase: stream read failed ({})", e);
                    self.stream = None;
                    Err(ChannelError::Transport)
                }
            }
        }

        fn close_stream(&mut self) {
            self.stream = None;
        }

        fn get(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, ChannelError> {
            let mut conn = self.request(Method::Get, path, &[], &[], REST_TIMEOUT)?;
            let mut len = 0;
            while len < buf.len() {
                match conn.read(&mut buf[len..]) {
                    Ok(0) => break,
                    Ok(n) => len += n,
                    Err(_) => return Err(ChannelError::Transport),
                }
            }
            Ok(len)
        }

        fn put(&mut self, path: &str, body: &[u8]) -> Result<(), ChannelError> {
            let mut content_len: heapless::String<8> = heapless::String::new();
            core::fmt::Write::write_fmt(&mut content_len, format_args!("{}", body.len()))
                .map_err(|_| ChannelError::Malformed)?;
            let headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", content_len.as_str()),
            ];
            self.request(Method::Put, path, &headers, body, REST_TIMEOUT)?;
            Ok(())
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use std::collections::{BTreeMap, VecDeque};

    use log::debug;

    use super::{resource_url, ChannelError, StreamTransport, SystemConfig};

    /// In-memory store with a scripted event stream.
    pub struct FirebaseTransport {
        host: heapless::String<96>,
        auth: heapless::String<64>,
        values: BTreeMap<String, Vec<u8>>,
        inbound: VecDeque<u8>,
        open_path: Option<String>,
        fail_next_read: Option<ChannelError>,
        opens: u32,
    }

    impl FirebaseTransport {
        pub fn new(config: &SystemConfig) -> Self {
            Self {
                host: config.remote_host.clone(),
                auth: config.remote_auth.clone(),
                values: BTreeMap::new(),
                inbound: VecDeque::new(),
                open_path: None,
                fail_next_read: None,
                opens: 0,
            }
        }

        /// Store a raw JSON value.
        pub fn sim_set(&mut self, path: &str, json: &str) {
            self.values.insert(path.into(), json.as_bytes().to_vec());
        }

        pub fn sim_value(&self, path: &str) -> Option<&str> {
            self.values.get(path).and_then(|v| core::str::from_utf8(v).ok())
        }

        /// Queue one server-sent event on the stream.
        pub fn sim_push_event(&mut self, event: &str, data: &str) {
            self.inbound
                .extend(format!("event: {event}\ndata: {data}\n\n").into_bytes());
        }

        /// Make the next stream read fail with `error`.
        pub fn sim_fail_next_read(&mut self, error: ChannelError) {
            self.fail_next_read = Some(error);
        }

        /// Times the stream has been (re)opened.
        pub fn sim_opens(&self) -> u32 {
            self.opens
        }
    }

    impl StreamTransport for FirebaseTransport {
        fn open_stream(&mut self, path: &str) -> Result<(), ChannelError> {
            resource_url(&self.host, path, &self.auth)?;
            debug!("Firebase(sim): stream open on '{}'", path);
            self.open_path = Some(path.into());
            self.opens += 1;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
            if self.open_path.is_none() {
                return Err(ChannelError::NotConnected);
            }
            if let Some(e) = self.fail_next_read.take() {
                self.open_path = None;
                return Err(e);
            }
            let n = buf.len().min(self.inbound.len());
            for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn close_stream(&mut self) {
            self.open_path = None;
        }

        fn get(&mut self, path: &str, buf: &mut [u8]) -> Result<usize, ChannelError> {
            resource_url(&self.host, path, &self.auth)?;
            let v = self.values.get(path).ok_or(ChannelError::Http(404))?;
            let n = v.len().min(buf.len());
            buf[..n].copy_from_slice(&v[..n]);
            Ok(n)
        }

        fn put(&mut self, path: &str, body: &[u8]) -> Result<(), ChannelError> {
            resource_url(&self.host, path, &self.auth)?;
            self.values.insert(path.into(), body.to_vec());
            Ok(())
        }
    }
}

pub use platform::FirebaseTransport;
