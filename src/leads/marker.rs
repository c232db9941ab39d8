//! Lead marker scanning and reply sanitization.
//!
//! The model is instructed to embed captured contact details in its reply as
//! `||LEAD:<name> - <contact>||`. This module is the only place that knows
//! the sentinel syntax: [`scan`] locates the first complete block and
//! [`sanitize`] removes exactly the reported span(s) before the reply is
//! shown to the user.

use std::ops::Range;

use tracing::debug;

/// Opening sentinel of a lead block.
pub const LEAD_OPEN: &str = "||LEAD:";

/// Closing sentinel of a lead block.
pub const LEAD_CLOSE: &str = "||";

/// A detected lead block inside a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadMarker<'a> {
    /// Byte range of the whole block, sentinels included.
    pub span: Range<usize>,
    /// Raw text between the sentinels, untrimmed.
    pub payload: &'a str,
}

/// Find the first complete lead block in `reply`.
///
/// Returns `None` when the opening sentinel is absent or is not followed by
/// a closing sentinel. An unterminated block is never guessed at.
pub fn scan(reply: &str) -> Option<LeadMarker<'_>> {
    let start = reply.find(LEAD_OPEN)?;
    let body = reply.get(start..)?.strip_prefix(LEAD_OPEN)?;
    let payload_len = body.find(LEAD_CLOSE)?;
    let payload = body.get(..payload_len)?;

    let marker_len = LEAD_OPEN
        .len()
        .checked_add(payload_len)?
        .checked_add(LEAD_CLOSE.len())?;
    let end = start.checked_add(marker_len)?;

    Some(LeadMarker {
        span: start..end,
        payload,
    })
}

/// Remove `span` from `reply` and trim the result.
///
/// A span that does not fall on character boundaries inside `reply` leaves
/// the text untouched.
pub fn remove_span(reply: &str, span: Range<usize>) -> String {
    match (reply.get(..span.start), reply.get(span.end..)) {
        (Some(head), Some(tail)) => {
            let mut out = String::with_capacity(reply.len());
            out.push_str(head);
            out.push_str(tail);
            out.trim().to_owned()
        }
        _ => reply.to_owned(),
    }
}

/// Produce the user-facing reply for a scanned model reply.
///
/// With no marker the reply is returned unchanged. Otherwise the reported
/// span is removed, then any further complete blocks found by re-scanning
/// the remainder are removed too, so no lead syntax reaches the user. Only
/// the first block ever yields a lead; the extra ones are dropped.
pub fn sanitize(reply: &str, marker: Option<&LeadMarker<'_>>) -> String {
    let Some(marker) = marker else {
        return reply.to_owned();
    };

    let mut text = remove_span(reply, marker.span.clone());
    while let Some(span) = scan(&text).map(|extra| extra.span) {
        debug!(offset = span.start, "dropping additional lead marker");
        text = remove_span(&text, span);
    }
    text
}
