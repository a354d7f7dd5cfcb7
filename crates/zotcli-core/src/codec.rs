//! Printable blob codec and hidden-fragment embedding for note HTML.
//!
//! A note edited with zotcli keeps the user's original markup inside the
//! remote HTML as a zlib-compressed, base64-encoded JSON payload carried in
//! the `title` attribute of a visually hidden wrapper element. The wrapper
//! markup is a wire format shared with other implementations of this scheme
//! and must not change.

use std::io::{Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Result, ZotError};
use crate::records::NoteRecord;

/// Opening marker of the hidden wrapper fragment.
const FRAGMENT_OPEN: &str = "<div class=\"zotcli-note\">";
/// Closing marker; the wrapper never nests another `div`.
const FRAGMENT_CLOSE: &str = "</div>";
/// Whitespace `embed` places before the wrapper.
const FRAGMENT_LEAD: &str = "\n    ";

const TITLE_ATTR: &str = "title=\"";

/// Encode a note record to a compact printable blob.
///
/// JSON serialization, zlib compression, then standard base64. Deterministic
/// for identical input.
pub fn encode_blob(record: &NoteRecord) -> Result<String> {
    let json = serde_json::to_vec(record)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(general_purpose::STANDARD.encode(compressed))
}

/// Decode a printable blob back into a note record.
///
/// Tolerates embedded whitespace (other implementations line-wrap the
/// base64). Anything else outside the base64 alphabet, undecodable zlib
/// data, or JSON that is not a note record is a `MalformedBlob` error.
pub fn decode_blob(blob: &str) -> Result<NoteRecord> {
    let cleaned: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    if !cleaned
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
    {
        return Err(ZotError::MalformedBlob(
            "blob contains bytes outside the base64 alphabet".to_string(),
        ));
    }
    let compressed = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ZotError::MalformedBlob(format!("invalid base64: {}", e)))?;

    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| ZotError::MalformedBlob(format!("zlib inflate failed: {}", e)))?;

    serde_json::from_slice(&json)
        .map_err(|e| ZotError::MalformedBlob(format!("payload is not a note record: {}", e)))
}

fn render_fragment(blob: &str) -> String {
    format!(
        "\n    <div class=\"zotcli-note\">\n        \
         <p xmlns=\"http://www.w3.org/1999/xhtml\"\n        \
         id=\"zotcli-data\" style=\"color: #cccccc;\"\n        \
         xml:base=\"http://www.w3.org/1999/xhtml\"\n        \
         title=\"{}\">\n        \
         (hidden zotcli data)\n        \
         </p>\n    </div>\n",
        blob
    )
}

/// Append the hidden payload fragment to a note's HTML.
pub fn embed(html: &str, record: &NoteRecord) -> Result<String> {
    let blob = encode_blob(record)?;
    Ok(format!("{}{}", html, render_fragment(&blob)))
}

/// Scan HTML for hidden payload fragments.
///
/// Returns the decoded payload of the first fragment (if any decodes) and
/// the HTML with every fragment stripped. A bounded prefix/suffix scan, not
/// a greedy pattern: each fragment spans from its opening marker to the
/// first `</div>` after it, and a wrapper with no closing marker is left in
/// place untouched.
pub fn extract(html: &str) -> (Option<NoteRecord>, String) {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut payload: Option<NoteRecord> = None;
    let mut first = true;

    while let Some(start) = rest.find(FRAGMENT_OPEN) {
        let head = &rest[..start];
        let after_open = &rest[start..];
        let Some(close) = after_open.find(FRAGMENT_CLOSE) else {
            // Unterminated wrapper: not ours to strip.
            out.push_str(head);
            out.push_str(after_open);
            return (payload, out);
        };
        let fragment = &after_open[..close + FRAGMENT_CLOSE.len()];

        if first {
            payload = fragment_payload(fragment);
            first = false;
        }

        // embed pads the wrapper with fixed whitespace; peel it back off so
        // extract(embed(html, p)) returns html byte-for-byte.
        if let Some(trimmed) = head.strip_suffix(FRAGMENT_LEAD) {
            out.push_str(trimmed);
        } else {
            out.push_str(head);
        }
        rest = &after_open[close + FRAGMENT_CLOSE.len()..];
        rest = rest.strip_prefix('\n').unwrap_or(rest);
    }

    out.push_str(rest);
    (payload, out)
}

/// Pull the `title` attribute value out of a wrapper fragment and decode it.
/// A fragment that does not carry a decodable payload is treated as if it
/// had none.
fn fragment_payload(fragment: &str) -> Option<NoteRecord> {
    let attr_start = fragment.find(TITLE_ATTR)? + TITLE_ATTR.len();
    let attr_len = fragment[attr_start..].find('"')?;
    let blob = &fragment[attr_start..attr_start + attr_len];
    match decode_blob(blob) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring undecodable note payload");
            None
        }
    }
}
