use log::{debug, trace, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::{Config, ConfigError, DNS_PORT};
use crate::dns_parser::{
    random_id, Header, Message, MessageProperties, Opcode, Question, RRData, ResourceRecord,
    ResponseCode, Type,
};
use crate::transport::{ResolveError, Transport, UdpTransport};
use crate::zone::ZoneLookup;

/// Largest reply sent over UDP before it is truncated
pub const MAX_UDP_PAYLOAD: usize = 512;

/// Turns queries into responses
///
/// A standard query is answered from the first of these that knows it:
/// the cache, the zone data, iterative resolution from the root servers
/// and the configured forwarders.
pub struct Resolver {
    config: Config,
    forwarders: Vec<SocketAddr>,
    cache: Arc<Cache>,
    zones: Arc<dyn ZoneLookup>,
    transport: Arc<dyn Transport>,
}

/// Where an iterative walk down the name stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecursionState {
    /// Number of labels, from the root, already delegated
    iteration: usize,
    server: SocketAddr,
}

/// How an iterative walk ended
#[derive(Debug)]
enum Walk {
    Answered(Vec<ResourceRecord>),
    NameError,
    Exhausted,
}

impl Resolver {
    pub fn new(config: Config, zones: Arc<dyn ZoneLookup>) -> Result<Resolver, ConfigError> {
        let transport = Arc::new(UdpTransport::new(config.upstream_timeout()));
        Resolver::with_transport(config, zones, transport)
    }

    pub fn with_transport(
        config: Config,
        zones: Arc<dyn ZoneLookup>,
        transport: Arc<dyn Transport>,
    ) -> Result<Resolver, ConfigError> {
        config.validate()?;
        let forwarders = config.forwarding.addrs()?;
        Ok(Resolver {
            config,
            forwarders,
            cache: Arc::new(Cache::new()),
            zones,
            transport,
        })
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answers one datagram off the wire
    ///
    /// Returns `None` when nothing should be sent back: the datagram has no
    /// readable header, or it is itself a response.
    pub async fn handle_datagram(&self, data: &[u8]) -> Option<Vec<u8>> {
        let mut response = match Message::parse(data) {
            Ok(query) if !query.header.query => {
                trace!("ignoring response {:?}", query.header.id);
                return None;
            }
            Ok(query) if !query.is_valid_query() => {
                warn!("query {:?} carries response fields", query.header.id);
                self.format_error(&query)
            }
            Ok(query) => self.resolve(&query).await,
            Err(error) => {
                let header = match Header::parse(data) {
                    Ok(header) if header.query => header,
                    _ => {
                        warn!("couldn't parse packet: {}", error);
                        return None;
                    }
                };
                warn!("couldn't parse query {:?}: {}", header.id, error);
                let mut query = Message::new();
                query.header = header;
                self.format_error(&query)
            }
        };

        match response.encode_limited(Some(MAX_UDP_PAYLOAD)) {
            Ok(Ok(packet)) => Some(packet),
            Ok(Err(packet)) => {
                debug!("response {:?} truncated", response.header.id);
                Some(packet)
            }
            Err(error) => {
                warn!("couldn't encode response {:?}: {}", response.header.id, error);
                None
            }
        }
    }

    /// Resolves `query`, failures become error responses
    pub async fn resolve(&self, query: &Message) -> Message {
        match query.header.opcode {
            Some(Opcode::StandardQuery) => match self.resolve_standard_query(query).await {
                Ok(response) => response,
                Err(error) => {
                    warn!("couldn't resolve query {:?}: {}", query.header.id, error);
                    self.respond(query, ResponseCode::ServerFailure)
                }
            },
            Some(Opcode::InverseQuery) | Some(Opcode::ServerStatus) => {
                self.respond(query, ResponseCode::NotImplemented)
            }
            None => self.format_error(query),
        }
    }

    /// Walks cache, zone data, recursion and forwarding in that order
    ///
    /// Upstream failures are returned as errors, `resolve` turns them into
    /// a server failure.
    pub async fn resolve_standard_query(&self, query: &Message) -> Result<Message, ResolveError> {
        let question = match query.questions.first() {
            Some(question) if question.qtype.is_some() && question.qclass.is_some() => question,
            _ => return Ok(self.format_error(query)),
        };
        debug!("resolving {} {:?}", question.qname, question.qtype);

        if let Some(records) = self.cache.search(question) {
            trace!("{} answered from cache", question.qname);
            return Ok(self.answer(query, records, false));
        }

        if let Some(records) = self.zones.lookup(question) {
            trace!("{} answered from zone data", question.qname);
            let authoritative = records.iter().any(|record| record.authoritative);
            return Ok(self.answer(query, records, authoritative));
        }

        let mut exhausted = None;
        if self.config.recursion.recursion_available && query.header.recursion_desired {
            match self.resolve_recursive(question).await {
                Ok(Walk::Answered(records)) => return Ok(self.answer(query, records, false)),
                Ok(Walk::NameError) => return Ok(self.respond(query, ResponseCode::NameError)),
                Ok(Walk::Exhausted) => {
                    debug!("recursion for {} found no answer", question.qname);
                    exhausted = Some(ResponseCode::ServerFailure);
                }
                Err(error) => {
                    warn!("recursion for {} failed: {}", question.qname, error);
                    exhausted = Some(ResponseCode::ServerFailure);
                }
            }
        }

        if self.config.forwarding.enabled {
            return self.forward(query).await;
        }

        Ok(self.respond(query, exhausted.unwrap_or(ResponseCode::NameError)))
    }

    /// Follows delegations from a root server down to the question's name
    ///
    /// Every iteration asks the current server for the NS records of one more
    /// label of the name and moves on to the first address offered as glue.
    /// The last iteration asks the question itself.
    async fn resolve_recursive(&self, question: &Question) -> Result<Walk, ResolveError> {
        let root = self
            .config
            .recursion
            .root_servers
            .first()
            .ok_or(ResolveError::NoUpstream)?;
        let mut state = RecursionState {
            iteration: 0,
            server: SocketAddr::new((*root).into(), DNS_PORT),
        };
        let total = question.qname.labels().len();
        let max_attempts = self.config.recursion.max_recursion_attempts;

        while state.iteration < total && state.iteration <= max_attempts {
            let last = state.iteration + 1 == total;
            let sub_question = if last {
                question.clone()
            } else {
                let mut zone = question.clone();
                zone.qname = question.qname.suffix(state.iteration + 1);
                zone.qtype = Some(Type::NS);
                zone
            };
            trace!(
                "recursion {}: asking {} for {} {:?}",
                state.iteration,
                state.server,
                sub_question.qname,
                sub_question.qtype
            );

            let sub_query = Message::query(random_id(), sub_question, false);
            let reply = self.ask(sub_query, state.server).await?;
            self.cache.insert(&reply);

            let answers: Vec<_> = reply
                .answers
                .iter()
                .filter(|record| question.matches(record))
                .cloned()
                .collect();
            if !answers.is_empty() {
                return Ok(Walk::Answered(answers));
            }
            if reply.header.response_code == Some(ResponseCode::NameError) {
                return Ok(Walk::NameError);
            }

            let glue = reply.additional.iter().find_map(|record| match record.data {
                RRData::A(ip) => Some(ip),
            });
            match glue {
                Some(ip) => state.server = SocketAddr::new(ip.into(), DNS_PORT),
                None if !last => {
                    debug!("{} gave no referral for {}", state.server, question.qname);
                    return Ok(Walk::Exhausted);
                }
                None => {}
            }
            state.iteration += 1;
        }

        Ok(Walk::Exhausted)
    }

    /// Relays `query` to the forwarders, in order, until one replies
    async fn forward(&self, query: &Message) -> Result<Message, ResolveError> {
        let mut last_error = ResolveError::NoUpstream;
        for &server in &self.forwarders {
            match self.ask(query.clone(), server).await {
                Ok(reply) => {
                    debug!("forwarder {} answered {:?}", server, query.header.id);
                    self.cache.insert(&reply);
                    let response_code = reply
                        .header
                        .response_code
                        .unwrap_or(ResponseCode::ServerFailure);
                    let mut response = self.respond(query, response_code);
                    response.set_properties(MessageProperties {
                        answers: Some(reply.answers),
                        nameservers: Some(reply.nameservers),
                        additional: Some(reply.additional),
                        ..Default::default()
                    });
                    return Ok(response);
                }
                Err(error) => {
                    warn!("forwarder {} failed: {}", server, error);
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }

    /// Sends `query` to `server`
    ///
    /// The reply must carry the query's id and repeat its questions.
    async fn ask(&self, mut query: Message, server: SocketAddr) -> Result<Message, ResolveError> {
        let packet = query.encode()?;
        let reply = self.transport.exchange(&packet, server).await?;
        let same_questions = reply.questions.len() == query.questions.len()
            && reply.questions.iter().zip(&query.questions).all(|(a, b)| {
                a.qtype == b.qtype && a.qclass == b.qclass && a.qname.eq_ignore_case(&b.qname)
            });
        if reply.header.id != query.header.id || reply.header.query || !same_questions {
            return Err(ResolveError::Mismatch(server));
        }
        Ok(reply)
    }

    fn respond(&self, query: &Message, response_code: ResponseCode) -> Message {
        let mut response = Message::response_to(query);
        response.set_as_response(
            false,
            false,
            self.config.recursion.recursion_available,
            response_code,
        );
        response
    }

    fn answer(
        &self,
        query: &Message,
        records: Vec<ResourceRecord>,
        authoritative: bool,
    ) -> Message {
        let mut response = self.respond(query, ResponseCode::NoError);
        response.header.authoritative = authoritative;
        response.set_properties(MessageProperties {
            answers: Some(records),
            ..Default::default()
        });
        response
    }

    /// A format error response, questions that can't be written are dropped
    fn format_error(&self, query: &Message) -> Message {
        let mut response = self.respond(query, ResponseCode::FormatError);
        if response
            .questions
            .iter()
            .any(|question| question.qtype.is_none() || question.qclass.is_none())
        {
            response.set_properties(MessageProperties {
                questions: Some(Vec::new()),
                ..Default::default()
            });
        }
        response
    }
}
