use std::collections::HashMap;

use alloy::{
    rpc::json_rpc::{RequestPacket, ResponsePacket},
    transports::{
        TransportError, TransportErrorKind, TransportFut, TransportResult,
        http::reqwest::{
            self,
            header::{HeaderMap, HeaderName, HeaderValue},
        },
    },
};
use std::task;
use tower::Service;
use tracing::{Instrument, debug, debug_span, trace};

use crate::error::DemoError;

/// A transport that uses a shared reqwest client but injects custom headers per request
#[derive(Clone, Debug)]
pub struct HeaderInjectingTransport {
    /// The shared reqwest client (this is where connection pooling happens)
    client: reqwest::Client,
    /// The URL to send requests to
    url: reqwest::Url,
    /// Headers to inject into every request made by this transport
    custom_headers: HeaderMap,
}

impl HeaderInjectingTransport {
    pub fn new(client: reqwest::Client, url: reqwest::Url, headers: HeaderMap) -> Self {
        Self {
            client,
            url,
            custom_headers: headers,
        }
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    async fn do_request(self, req: RequestPacket) -> TransportResult<ResponsePacket> {
        let mut request_builder = self.client.post(self.url).json(&req);

        for (name, value) in &self.custom_headers {
            request_builder = request_builder.header(name, value);
        }

        let resp = request_builder
            .send()
            .await
            .map_err(TransportErrorKind::custom)?;

        let status = resp.status();
        debug!(?status, "received response from server");

        let body = resp.bytes().await.map_err(TransportErrorKind::custom)?;
        debug!(bytes = body.len(), "retrieved response body");
        trace!(body = ?String::from_utf8_lossy(&body), "response body");

        if !status.is_success() {
            return Err(TransportErrorKind::http_error(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        serde_json::from_slice(&body)
            .map_err(|err| TransportError::deser_err(err, String::from_utf8_lossy(&body)))
    }
}

impl Service<RequestPacket> for HeaderInjectingTransport {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    #[inline]
    fn poll_ready(&mut self, _cx: &mut task::Context<'_>) -> task::Poll<Result<(), Self::Error>> {
        // reqwest always returns ready
        task::Poll::Ready(Ok(()))
    }

    #[inline]
    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let this = self.clone();
        let span = debug_span!("HeaderInjectingTransport", url = %this.url);
        Box::pin(this.do_request(req).instrument(span))
    }
}

/// Builder for transports that all share one connection pool
#[derive(Clone, Debug)]
pub struct SharedClientTransportBuilder {
    shared_client: reqwest::Client,
}

impl SharedClientTransportBuilder {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            shared_client: client,
        }
    }

    /// Build a builder around a fresh reqwest client
    pub fn with_new_client() -> Result<Self, DemoError> {
        let client = reqwest::ClientBuilder::new()
            .build()
            .map_err(|e| DemoError::RpcConfigError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self::new(client))
    }

    pub fn with_headers(&self, url: reqwest::Url, headers: HeaderMap) -> HeaderInjectingTransport {
        HeaderInjectingTransport::new(self.shared_client.clone(), url, headers)
    }
}

/// Convert configured `name: value` pairs into request headers
pub fn header_map_from_pairs(pairs: &HashMap<String, String>) -> Result<HeaderMap, DemoError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());

    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            DemoError::RpcConfigError {
                message: format!("Invalid header name {name:?}: {e}"),
            }
        })?;
        headers.insert(name, HeaderValue::from_str(value)?);
    }

    Ok(headers)
}
