//! Upstream forwarder: the last handler in the chain.
//!
//! Resolves whatever reaches it against the configured upstream servers and
//! copies the answer records into the response.

use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::{Name, Record};
use hickory_proto::xfer::Protocol;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{Resolver, TokioResolver};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::net::SocketAddr;
use tracing::{debug, error, warn};

/// Request handler that forwards queries to upstream resolvers.
pub struct Forwarder {
    resolver: TokioResolver,
}

impl Forwarder {
    /// Forward to `upstream` over UDP, with TCP for truncated answers.
    pub fn new(upstream: &[SocketAddr]) -> Self {
        let mut config = ResolverConfig::new();
        for addr in upstream {
            config.add_name_server(NameServerConfig::new(*addr, Protocol::Udp));
            config.add_name_server(NameServerConfig::new(*addr, Protocol::Tcp));
        }

        let mut opts = ResolverOpts::default();
        // Names arrive fully qualified; never append a search domain.
        opts.ndots = 0;

        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Self { resolver }
    }
}

#[async_trait::async_trait]
impl RequestHandler for Forwarder {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let builder = MessageResponseBuilder::from_message_request(request);

        let Some(query) = request.queries().first() else {
            let response = builder.error_msg(request.header(), ResponseCode::FormErr);
            return match response_handle.send_response(response).await {
                Ok(info) => info,
                Err(e) => {
                    error!(error = %e, "failed to send FORMERR response");
                    serve_failed(request)
                }
            };
        };

        let name = Name::from(query.name().clone());
        let query_type = query.query_type();

        let mut header = Header::response_from_request(request.header());
        header.set_recursion_available(true);

        let answers: Vec<Record> = match self.resolver.lookup(name.clone(), query_type).await {
            Ok(lookup) => lookup.records().to_vec(),
            Err(e) if e.is_nx_domain() => {
                header.set_response_code(ResponseCode::NXDomain);
                Vec::new()
            }
            Err(e) if e.is_no_records_found() => Vec::new(),
            Err(e) => {
                warn!(name = %name, query_type = %query_type, error = %e, "upstream lookup failed");
                header.set_response_code(ResponseCode::ServFail);
                Vec::new()
            }
        };

        debug!(name = %name, query_type = %query_type, answers = answers.len(), "forwarded");

        let response = builder.build(
            header,
            answers.iter(),
            std::iter::empty(),
            std::iter::empty(),
            std::iter::empty(),
        );
        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "failed to send forwarded response");
                serve_failed(request)
            }
        }
    }
}

/// Response info for a request whose response could not be written.
pub(crate) fn serve_failed(request: &Request) -> ResponseInfo {
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::ServFail);
    header.into()
}
