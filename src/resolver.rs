//! Stub and iterative resolution of A records.
//!
//! A resolution starts at the upstream resolver (stub) or the root server
//! (recursive), or at a nameserver found in the cache for a parent of the
//! queried name, and follows glue-backed delegations hop by hop until an
//! answer for the queried name, or its latest alias, shows up.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Instant;

use tracing::{debug, info, instrument, trace, warn};

use crate::cache::unix_now;
use crate::{
    Cache, CachedRecord, Message, Name, Networkable, Question, RecordType, ResolveError,
    ResolverConfig, ResourceRecord, WireCursor,
};

mod referral;
use referral::Delegation;

mod transport;
pub use transport::{Transport, UdpTransport};

/// Outcome of a resolution that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Address { address: Ipv4Addr, cached: bool },
    /// Neither an answer nor a usable delegation came back.
    NoRecord,
}

impl Resolution {
    pub fn address(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Address { address, .. } => Some(*address),
            Self::NoRecord => None,
        }
    }
}

struct Walk {
    target: Name,
    tracked: Name,
    hops: usize,
    visited: HashSet<Ipv4Addr>,
    started: Instant,
}

impl Walk {
    fn new(target: Name) -> Self {
        Self {
            tracked: target.clone(),
            target,
            hops: 0,
            visited: HashSet::new(),
            started: Instant::now(),
        }
    }
}

pub struct Resolver<T = UdpTransport> {
    cache: Cache,
    transport: T,
    config: ResolverConfig,
}

impl Resolver<UdpTransport> {
    pub fn with_udp(cache: Cache, config: ResolverConfig) -> Self {
        let transport = UdpTransport::new(config.read_timeout(), config.buffer_size());
        Self::new(cache, transport, config)
    }
}

impl<T: Transport> Resolver<T> {
    pub fn new(cache: Cache, transport: T, config: ResolverConfig) -> Self {
        Self {
            cache,
            transport,
            config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn into_cache(self) -> Cache {
        self.cache
    }

    /// Resolves `domain` to an IPv4 address.
    ///
    /// A single trailing dot is ignored. With `use_cache`, the cache is
    /// consulted once before the first query: a fresh entry for the full name
    /// is returned directly, and one for a parent suffix becomes the first
    /// nameserver. Responses are cached either way.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(
        &self,
        domain: &str,
        recursive: bool,
        use_cache: bool,
    ) -> Result<Resolution, ResolveError> {
        let domain = domain.strip_suffix('.').unwrap_or(domain);
        let target = Name::new(domain);
        target.validate()?;

        let mut nameserver = if recursive {
            self.config.root_server
        } else {
            self.config.upstream
        };

        if use_cache {
            if let Some((suffix, entry)) = self.lookup(&target) {
                if suffix == target {
                    info!(name = %target, address = %entry.addr, "cache hit");
                    return Ok(Resolution::Address {
                        address: entry.addr,
                        cached: true,
                    });
                }

                // The delegation may be stale, so the cache is not consulted again.
                info!(zone = %suffix, nameserver = %entry.addr, "starting from cached delegation");
                nameserver = entry.addr;
            }
        }

        self.walk(Walk::new(target), nameserver).await
    }

    /// Most specific fresh entry among the suffixes of `name`.
    fn lookup(&self, name: &Name) -> Option<(Name, CachedRecord)> {
        let now = unix_now();

        for suffix in name.suffixes() {
            match self.cache.get(&suffix) {
                Ok(Some(entry)) if entry.is_fresh(now) => return Some((suffix, entry)),
                Ok(Some(_)) => trace!(name = %suffix, "stale cache entry"),
                Ok(None) => {}
                Err(err) => {
                    warn!(name = %suffix, %err, "cache read failed, continuing uncached");
                    return None;
                }
            }
        }

        None
    }

    async fn walk(&self, mut walk: Walk, mut nameserver: Ipv4Addr) -> Result<Resolution, ResolveError> {
        let deadline = self.config.total_timeout();

        loop {
            if walk.hops >= self.config.max_hops {
                warn!(name = %walk.target, hops = walk.hops, "giving up on referral chain");
                return Err(ResolveError::TooManyReferrals(walk.hops));
            }

            let elapsed = walk.started.elapsed();
            if elapsed >= deadline {
                return Err(ResolveError::DeadlineExceeded(elapsed));
            }

            walk.hops += 1;
            if !walk.visited.insert(nameserver) {
                warn!(%nameserver, hop = walk.hops, "nameserver already visited");
            }

            let response = self.query(nameserver, &walk.target).await?;
            if response.header.flags.rcode() != 0 {
                warn!(%nameserver, rcode = response.header.flags.rcode(), "nameserver returned an error code");
            }

            walk.tracked = referral::follow_aliases(&response.answers, &walk.tracked);
            let delegations = referral::delegations(&response);
            self.cache_response(&response.answers, &delegations);

            if let Some(answer) = referral::find_answer(&response.answers, &walk.tracked) {
                if let Some(address) = answer.address() {
                    info!(name = %walk.target, owner = %answer.name, %address, hops = walk.hops, "resolved");
                    return Ok(Resolution::Address {
                        address,
                        cached: false,
                    });
                }
            }

            match referral::next_hop(&response.additionals, &delegations) {
                Some((zone, next)) => {
                    debug!(%zone, from = %nameserver, to = %next, "following referral");
                    nameserver = next;
                }
                None => {
                    info!(name = %walk.target, hops = walk.hops, "no record found");
                    return Ok(Resolution::NoRecord);
                }
            }
        }
    }

    async fn query(&self, nameserver: Ipv4Addr, name: &Name) -> Result<Message, ResolveError> {
        let query = Message::new_query(vec![Question::new(name.clone(), RecordType::A)]);
        let payload = query.to_bytes()?;
        let server = SocketAddrV4::new(nameserver, self.config.port);

        debug!(%server, %name, id = query.header.id, "sending query");
        let reply = self.exchange(server, &payload).await?;

        let response = Message::from_bytes(&mut WireCursor::new(&reply))?;
        log_response(server, &response);

        Ok(response)
    }

    async fn exchange(&self, server: SocketAddrV4, payload: &[u8]) -> Result<Vec<u8>, ResolveError> {
        let mut attempt = 0;

        loop {
            match self.transport.exchange(server, payload).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_transient() && attempt < self.config.retries => {
                    let backoff = self.config.retry_backoff(attempt);
                    warn!(%server, %err, attempt, ?backoff, "query failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Stores each A answer under its owner, and each delegated zone once
    /// under the address of its glue.
    fn cache_response(&self, answers: &[ResourceRecord], delegations: &[Delegation<'_>]) {
        let now = unix_now();

        for answer in answers {
            if answer.type_ == RecordType::Cname {
                continue;
            }
            match CachedRecord::from_record(answer, now) {
                Some(entry) => self.store(&answer.name, &entry),
                None => trace!(name = %answer.name, type_ = %answer.type_, "not caching answer"),
            }
        }

        let mut cached: HashSet<&Name> = HashSet::new();
        for delegation in delegations {
            if cached.contains(delegation.zone) {
                continue;
            }
            if let Some(entry) = delegation
                .glue
                .and_then(|glue| CachedRecord::from_record(glue, now))
            {
                self.store(delegation.zone, &entry);
                cached.insert(delegation.zone);
            }
        }
    }

    fn store(&self, name: &Name, entry: &CachedRecord) {
        if let Err(err) = self.cache.store(name, entry) {
            warn!(%name, %err, "cache write failed, continuing uncached");
        }
    }
}

fn log_response(server: SocketAddrV4, response: &Message) {
    debug!(
        %server,
        id = response.header.id,
        rcode = response.header.flags.rcode(),
        answers = response.answers.len(),
        authorities = response.authorities.len(),
        additionals = response.additionals.len(),
        "received response"
    );

    let sections = [
        ("answer", &response.answers),
        ("authority", &response.authorities),
        ("additional", &response.additionals),
    ];
    for (section, records) in sections {
        for record in records {
            trace!(section, name = %record.name, ttl = record.ttl, type_ = %record.type_, data = ?record.data);
        }
    }
}
