//! Grant gate: the request handler that decides A/AAAA queries.
//!
//! Only address lookups are gated. Every other query type, and every
//! allowed address lookup, is passed to the next handler untouched.

use dissident_engine::{AccessEngine, Verdict};
use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::RecordType;
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use tracing::error;

use crate::upstream::serve_failed;

/// Returns true for query types the gate evaluates.
pub const fn is_gated(query_type: RecordType) -> bool {
    matches!(query_type, RecordType::A | RecordType::AAAA)
}

/// Request handler that enforces access grants in front of `next`.
pub struct GrantGate<N> {
    engine: AccessEngine,
    next: N,
}

impl<N> GrantGate<N> {
    /// Wrap `next` with the grant check.
    pub const fn new(engine: AccessEngine, next: N) -> Self {
        Self { engine, next }
    }

    /// The decision engine.
    pub const fn engine(&self) -> &AccessEngine {
        &self.engine
    }
}

#[async_trait::async_trait]
impl<N: RequestHandler> RequestHandler for GrantGate<N> {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        self.engine.record_request();

        let Some(query) = request.queries().first() else {
            return self.next.handle_request(request, response_handle).await;
        };

        if !is_gated(query.query_type()) {
            return self.next.handle_request(request, response_handle).await;
        }

        let source = request.src().ip().to_canonical();
        let name = query.name().to_string();

        match self.engine.evaluate(source, &name).await {
            Verdict::Allow { .. } => self.next.handle_request(request, response_handle).await,
            Verdict::Deny { .. } => deny(request, response_handle).await,
        }
    }
}

/// Answer NXDOMAIN with AA and RA set, echoing the question.
async fn deny<R: ResponseHandler>(request: &Request, mut response_handle: R) -> ResponseInfo {
    let mut header = Header::response_from_request(request.header());
    header.set_authoritative(true);
    header.set_recursion_available(true);
    header.set_response_code(ResponseCode::NXDomain);

    let response = MessageResponseBuilder::from_message_request(request).build_no_records(header);

    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "failed to send NXDOMAIN response");
            serve_failed(request)
        }
    }
}
