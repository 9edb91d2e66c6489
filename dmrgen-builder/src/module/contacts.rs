//! Contact producers

use dmrgen_common::{Contact, ContactId, ContactType, Sequence};
use regex::Regex;

use crate::module::datasource::TalkgroupRegistry;
use crate::module::generator::{Aggregator, Generate};

/// Local talkgroup of a repeater
pub const LOCAL_TALKGROUP: u32 = 9;
/// Network echo test service
pub const PARROT_ID: u32 = 9990;
/// Reserved all-call address
pub const ALL_CALL_ID: u32 = 16_777_215;
/// APRS gateway receiving position reports
pub const APRS_GATEWAY_ID: u32 = 262_999;

/// Fan-in of contact producers
pub type ContactAggregator<'a> = Aggregator<'a, Contact>;

/// Registry names sometimes carry stray whitespace and line breaks.
fn sanitize_name(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace()).to_string()
}

/// One group-call contact per registry talkgroup, primary table first.
pub struct RegistryContacts<'r, R: TalkgroupRegistry + ?Sized> {
    registry: &'r R,
}

impl<'r, R: TalkgroupRegistry + ?Sized> RegistryContacts<'r, R> {
    pub fn new(registry: &'r R) -> Self {
        Self { registry }
    }
}

impl<R: TalkgroupRegistry + ?Sized> Generate for RegistryContacts<'_, R> {
    type Entity = Contact;

    fn label(&self) -> String {
        "registry talkgroups".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Contact> {
        self.registry
            .primary()
            .iter()
            .chain(self.registry.supplementary())
            .map(|entry| Contact {
                id: seq.next_id(),
                name: sanitize_name(&entry.name),
                kind: ContactType::GroupCall,
                calling_id: entry.calling_id,
            })
            .collect()
    }
}

/// Network service contacts: Local, Parrot and All Call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialContacts;

impl Generate for SpecialContacts {
    type Entity = Contact;

    fn label(&self) -> String {
        "special contacts".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Contact> {
        [
            ("Local", ContactType::GroupCall, LOCAL_TALKGROUP),
            ("Parrot", ContactType::PrivateCall, PARROT_ID),
            ("All Call", ContactType::AllCall, ALL_CALL_ID),
        ]
        .into_iter()
        .map(|(name, kind, calling_id)| Contact {
            id: seq.next_id(),
            name: name.to_string(),
            kind,
            calling_id,
        })
        .collect()
    }
}

/// Private-call contact of the APRS gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct AprsGatewayContact;

impl Generate for AprsGatewayContact {
    type Entity = Contact;

    fn label(&self) -> String {
        "APRS gateway contact".to_string()
    }

    fn generate(&self, seq: &mut Sequence) -> Vec<Contact> {
        vec![Contact {
            id: seq.next_id(),
            name: "BM APRS".to_string(),
            kind: ContactType::PrivateCall,
            calling_id: APRS_GATEWAY_ID,
        }]
    }
}

/// Already-produced contacts whose calling address matches `pattern`,
/// e.g. `^260` for one country's talkgroups.
pub fn matching_contacts(contacts: &[Contact], pattern: &Regex) -> Vec<Contact> {
    contacts
        .iter()
        .filter(|contact| pattern.is_match(&contact.calling_id.to_string()))
        .cloned()
        .collect()
}

/// Identifier of the contact with the given address and call type.
pub fn find_contact(contacts: &[Contact], kind: ContactType, calling_id: u32) -> Option<ContactId> {
    contacts
        .iter()
        .find(|contact| contact.kind == kind && contact.calling_id == calling_id)
        .map(|contact| contact.id)
}
