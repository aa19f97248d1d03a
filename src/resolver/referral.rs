use std::net::Ipv4Addr;

use crate::{Message, Name, RecordData, ResourceRecord};

/// An authority NS record together with the glue for its server, if the
/// additional section carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation<'a> {
    pub zone: &'a Name,
    pub server: &'a Name,
    pub glue: Option<&'a ResourceRecord>,
}

impl Delegation<'_> {
    pub fn glue_address(&self) -> Option<Ipv4Addr> {
        self.glue.and_then(ResourceRecord::address)
    }
}

/// Follows CNAME answers starting from `tracked` and returns the final alias
/// target. Answer order does not matter, and each CNAME is followed at most
/// once so alias loops end.
pub fn follow_aliases(answers: &[ResourceRecord], tracked: &Name) -> Name {
    let mut tracked = tracked.clone();
    let mut followed = vec![false; answers.len()];

    loop {
        let next = answers.iter().enumerate().find_map(|(i, record)| match &record.data {
            RecordData::Cname(target) if !followed[i] && record.name == tracked => {
                Some((i, target))
            }
            _ => None,
        });

        let Some((i, target)) = next else {
            return tracked;
        };

        followed[i] = true;
        tracked = target.clone();
    }
}

/// The first A answer owned by `tracked`.
pub fn find_answer<'a>(answers: &'a [ResourceRecord], tracked: &Name) -> Option<&'a ResourceRecord> {
    answers
        .iter()
        .find(|record| record.address().is_some() && &record.name == tracked)
}

pub fn delegations(response: &Message) -> Vec<Delegation<'_>> {
    response
        .authorities
        .iter()
        .filter_map(|authority| match &authority.data {
            RecordData::Ns(server) => Some(Delegation {
                zone: &authority.name,
                server,
                glue: response
                    .additionals
                    .iter()
                    .find(|glue| glue.address().is_some() && &glue.name == server),
            }),
            _ => None,
        })
        .collect()
}

/// The first additional record, in section order, that carries the address
/// of a delegated server, paired with the zone it serves.
pub fn next_hop<'a>(
    additionals: &'a [ResourceRecord],
    delegations: &[Delegation<'a>],
) -> Option<(&'a Name, Ipv4Addr)> {
    additionals.iter().find_map(|glue| {
        let address = glue.address()?;
        let delegation = delegations.iter().find(|d| d.server == &glue.name)?;
        Some((delegation.zone, address))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Flags, Header};

    fn a(name: &str, addr: [u8; 4]) -> ResourceRecord {
        ResourceRecord::a(Name::new(name), 300, addr.into())
    }

    fn cname(name: &str, target: &str) -> ResourceRecord {
        ResourceRecord::cname(Name::new(name), 300, Name::new(target))
    }

    #[test]
    fn follows_cname_chain_in_any_order() {
        let answers = vec![
            a("edge.cdn.net", [1, 2, 3, 4]),
            cname("cdn.example.com", "edge.cdn.net"),
            cname("sub.example.com", "cdn.example.com"),
        ];

        let tracked = follow_aliases(&answers, &Name::new("sub.example.com"));
        assert_eq!(tracked, Name::new("edge.cdn.net"));
        assert_eq!(
            find_answer(&answers, &tracked).and_then(ResourceRecord::address),
            Some(Ipv4Addr::new(1, 2, 3, 4))
        );
    }

    #[test]
    fn alias_loop_terminates() {
        let answers = vec![cname("a.example", "b.example"), cname("b.example", "a.example")];

        let tracked = follow_aliases(&answers, &Name::new("a.example"));
        assert_eq!(tracked, Name::new("a.example"));
        assert!(find_answer(&answers, &tracked).is_none());
    }

    #[test]
    fn answer_must_match_tracked_name() {
        let answers = vec![a("other.example", [1, 1, 1, 1])];
        assert!(find_answer(&answers, &Name::new("example.com")).is_none());
    }

    #[test]
    fn pairs_delegations_with_glue() {
        let mut response = Message::new(Header::new(1, Flags::default()));
        response.add_authority(ResourceRecord::ns(
            Name::new("example.com"),
            3600,
            Name::new("ns1.example.net"),
        ));
        response.add_authority(ResourceRecord::ns(
            Name::new("example.com"),
            3600,
            Name::new("ns2.example.net"),
        ));
        response.add_additional(a("ns2.example.net", [10, 0, 0, 2]));

        let delegations = delegations(&response);
        assert_eq!(delegations.len(), 2);
        assert_eq!(delegations[0].glue_address(), None);
        assert_eq!(delegations[1].glue_address(), Some(Ipv4Addr::new(10, 0, 0, 2)));
        assert_eq!(delegations[1].zone, &Name::new("example.com"));
    }

    #[test]
    fn next_hop_follows_additional_order() {
        let mut response = Message::new(Header::new(1, Flags::default()));
        response.add_authority(ResourceRecord::ns(Name::new("com"), 3600, Name::new("a.gtld")));
        response.add_authority(ResourceRecord::ns(Name::new("com"), 3600, Name::new("b.gtld")));
        response.add_additional(a("unrelated.example", [10, 9, 9, 9]));
        response.add_additional(a("b.gtld", [10, 0, 0, 2]));
        response.add_additional(a("a.gtld", [10, 0, 0, 1]));

        let delegations = delegations(&response);
        assert_eq!(delegations[0].glue_address(), Some(Ipv4Addr::new(10, 0, 0, 1)));

        let (zone, address) = next_hop(&response.additionals, &delegations).unwrap();
        assert_eq!(zone, &Name::new("com"));
        assert_eq!(address, Ipv4Addr::new(10, 0, 0, 2));
    }

    #[test]
    fn no_next_hop_without_matching_glue() {
        let mut response = Message::new(Header::new(1, Flags::default()));
        response.add_authority(ResourceRecord::ns(Name::new("com"), 3600, Name::new("a.gtld")));
        response.add_additional(a("b.gtld", [10, 0, 0, 2]));

        let delegations = delegations(&response);
        assert_eq!(next_hop(&response.additionals, &delegations), None);
    }
}
