//! Catalog codec
//!
//! Encoding and decoding of the persisted catalog text.
//!
//! ## File Layout
//!
//! ```text
//! id,votes,image_path        <- header row
//! 1,3,a.png                  <- one row per item, in catalog order
//! 2,5,b.png
//! ```
//!
//! Rows are joined with `\n` and the file has no trailing newline. Fields
//! are never quoted or escaped, so ids and image refs must not contain the
//! separator or a line break.

use crate::error::{Result, VoteError};

use super::{Catalog, ItemRecord};

/// Separator between the three fields of a row
pub const FIELD_SEPARATOR: char = ',';

/// Header row naming the fields
pub const HEADER: &str = "id,votes,image_path";

const HEADER_FIELDS: [&str; 3] = ["id", "votes", "image_path"];

const BOM: char = '\u{feff}';

// =============================================================================
// Decoding
// =============================================================================

/// Decode a whole catalog file
///
/// Tolerates a leading byte-order mark, padding around header names, CRLF
/// line endings and blank lines.
pub fn decode_catalog(text: &str) -> Result<Catalog> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut lines = text
        .split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| VoteError::Format("missing header row".to_string()))?;
    decode_header(header_line, header)?;

    let mut items = Vec::new();
    for (line_no, line) in lines {
        items.push(decode_row(line_no, line)?);
    }

    Catalog::new(items)
}

fn decode_header(line_no: usize, line: &str) -> Result<()> {
    let names: Vec<&str> = line
        .split(FIELD_SEPARATOR)
        .map(|name| name.trim().trim_start_matches(BOM))
        .collect();

    if names != HEADER_FIELDS {
        return Err(VoteError::Format(format!(
            "line {}: expected header '{}', got '{}'",
            line_no, HEADER, line
        )));
    }
    Ok(())
}

fn decode_row(line_no: usize, line: &str) -> Result<ItemRecord> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let [id, votes, image_ref] = fields.as_slice() else {
        return Err(VoteError::Format(format!(
            "line {}: expected 3 fields, got {}",
            line_no,
            fields.len()
        )));
    };

    if id.is_empty() {
        return Err(VoteError::Format(format!("line {}: empty item id", line_no)));
    }

    let votes = votes.trim().parse::<u64>().map_err(|e| {
        VoteError::Format(format!(
            "line {}: invalid vote count '{}': {}",
            line_no, votes, e
        ))
    })?;

    Ok(ItemRecord::new(*id, votes, *image_ref))
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a catalog as the full file contents
pub fn encode_catalog(catalog: &Catalog) -> Result<String> {
    let mut out = String::with_capacity(HEADER.len() + catalog.len() * 24);
    out.push_str(HEADER);

    for item in catalog {
        check_field("id", &item.id)?;
        check_field("image_path", &item.image_ref)?;

        out.push('\n');
        out.push_str(&item.id);
        out.push(FIELD_SEPARATOR);
        out.push_str(&item.votes.to_string());
        out.push(FIELD_SEPARATOR);
        out.push_str(&item.image_ref);
    }

    Ok(out)
}

fn check_field(name: &str, value: &str) -> Result<()> {
    if value.contains([FIELD_SEPARATOR, '\n', '\r']) {
        return Err(VoteError::Format(format!(
            "{} '{}' contains a separator or line break",
            name, value
        )));
    }
    Ok(())
}
