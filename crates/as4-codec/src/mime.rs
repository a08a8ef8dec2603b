//! SOAP-with-attachments style `multipart/related` framing.
//!
//! The root part holds the serialized envelope header; every attachment
//! travels in its own part identified by `Content-ID`.

use crate::error::MimeError;
use shared_types::Attachment;
use uuid::Uuid;

/// Content id of the root (envelope) part.
pub const ROOT_CONTENT_ID: &str = "root.envelope@as4";

/// Content type of the root part.
pub const ENVELOPE_CONTENT_TYPE: &str = "application/json";

const DEFAULT_PART_CONTENT_TYPE: &str = "application/octet-stream";
const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// A packaged transmission: the `Content-Type` header value and the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Package envelope bytes and attachments into a `multipart/related` body.
#[must_use]
pub fn package(envelope: &[u8], attachments: &[Attachment]) -> MimeBody {
    let boundary = format!("MIMEBoundary_{}", Uuid::new_v4().simple());
    let content_type = format!(
        "multipart/related; type=\"{ENVELOPE_CONTENT_TYPE}\"; boundary=\"{boundary}\"; start=\"<{ROOT_CONTENT_ID}>\""
    );

    let size = envelope.len() + attachments.iter().map(|a| a.data.len() + 128).sum::<usize>();
    let mut body = Vec::with_capacity(size + 256);

    write_part(&mut body, &boundary, ENVELOPE_CONTENT_TYPE, ROOT_CONTENT_ID, envelope);
    for attachment in attachments {
        write_part(
            &mut body,
            &boundary,
            &attachment.mime_type,
            &attachment.content_id,
            &attachment.data,
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MimeBody { content_type, body }
}

fn write_part(
    body: &mut Vec<u8>,
    boundary: &str,
    content_type: &str,
    content_id: &str,
    data: &[u8],
) {
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: {content_type}\r\nContent-Transfer-Encoding: binary\r\nContent-ID: <{content_id}>\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(CRLF);
}

/// Split a `multipart/related` body into the root part and the attachments.
///
/// The root is the part named by the `start` parameter, or the first part
/// when the parameter is absent. Attachments keep their order in the body.
pub fn unpackage(content_type: &str, body: &[u8]) -> Result<(Vec<u8>, Vec<Attachment>), MimeError> {
    let boundary = parameter(content_type, "boundary")
        .ok_or_else(|| MimeError::MissingBoundary(content_type.to_string()))?;
    let start = parameter(content_type, "start").map(|s| strip_angle(&s).to_string());

    let delimiter = format!("--{boundary}").into_bytes();
    let mut separator = CRLF.to_vec();
    separator.extend_from_slice(&delimiter);

    let mut cursor =
        find(body, &delimiter, 0).ok_or(MimeError::MissingDelimiter)? + delimiter.len();
    let mut parts = Vec::new();

    loop {
        if body[cursor..].starts_with(b"--") {
            break;
        }
        let line_end = find(body, CRLF, cursor).ok_or(MimeError::Unterminated)?;
        let part_start = line_end + CRLF.len();
        let part_end = find(body, &separator, part_start).ok_or(MimeError::Unterminated)?;

        parts.push(parse_part(parts.len(), &body[part_start..part_end])?);
        cursor = part_end + separator.len();
    }

    let root_index = match &start {
        Some(start) => parts
            .iter()
            .position(|p| &p.content_id == start)
            .ok_or_else(|| MimeError::MissingRoot {
                start: Some(start.clone()),
            })?,
        None if parts.is_empty() => return Err(MimeError::MissingRoot { start: None }),
        None => 0,
    };

    let root = parts.remove(root_index);
    Ok((root.data, parts))
}

fn parse_part(index: usize, raw: &[u8]) -> Result<Attachment, MimeError> {
    let header_end = if raw.starts_with(CRLF) {
        Some((0, CRLF.len()))
    } else {
        find(raw, HEADER_END, 0).map(|pos| (pos, pos + HEADER_END.len()))
    };
    let header_end = header_end.ok_or_else(|| MimeError::MalformedPart {
        index,
        reason: "no blank line after headers".into(),
    })?;

    let headers =
        std::str::from_utf8(&raw[..header_end.0]).map_err(|_| MimeError::MalformedPart {
            index,
            reason: "headers are not UTF-8".into(),
        })?;

    let mut content_id = None;
    let mut mime_type = None;
    for line in headers.split("\r\n").filter(|l| !l.is_empty()) {
        let (name, value) = line.split_once(':').ok_or_else(|| MimeError::MalformedPart {
            index,
            reason: format!("bad header line '{line}'"),
        })?;
        let value = value.trim();
        if name.trim().eq_ignore_ascii_case("content-id") {
            content_id = Some(strip_angle(value).to_string());
        } else if name.trim().eq_ignore_ascii_case("content-type") {
            mime_type = Some(value.to_string());
        }
    }

    Ok(Attachment {
        content_id: content_id.ok_or(MimeError::MissingContentId { index })?,
        mime_type: mime_type.unwrap_or_else(|| DEFAULT_PART_CONTENT_TYPE.to_string()),
        data: raw[header_end.1..].to_vec(),
    })
}

/// Value of a `;`-separated header parameter, unquoted.
fn parameter(header: &str, name: &str) -> Option<String> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn strip_angle(value: &str) -> &str {
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
