//! Payload parsing for `"<name> - <contact>"` lead blocks.

/// Token separating the name from the contact inside a payload.
pub const FIELD_SEPARATOR: &str = " - ";

/// Contact value recorded when the payload carries no usable contact.
pub const CONTACT_NOT_DETECTED: &str = "not detected";

/// Name and contact extracted from a lead payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLead {
    /// Lead name, possibly empty.
    pub name: String,
    /// Contact detail, or [`CONTACT_NOT_DETECTED`].
    pub contact: String,
}

/// Split a raw payload into name and contact.
///
/// Only the first [`FIELD_SEPARATOR`] is authoritative, so a contact such as
/// `555 - 0001` keeps its own dashes. A payload without the separator (or
/// with nothing after it) degrades to the whole payload as the name and
/// [`CONTACT_NOT_DETECTED`] as the contact. Never fails.
pub fn parse_payload(payload: &str) -> ParsedLead {
    let Some((name, contact)) = payload.split_once(FIELD_SEPARATOR) else {
        return ParsedLead {
            name: payload.trim().to_owned(),
            contact: CONTACT_NOT_DETECTED.to_owned(),
        };
    };

    let contact = contact.trim();
    ParsedLead {
        name: name.trim().to_owned(),
        contact: if contact.is_empty() {
            CONTACT_NOT_DETECTED.to_owned()
        } else {
            contact.to_owned()
        },
    }
}
