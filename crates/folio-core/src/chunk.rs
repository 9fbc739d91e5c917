//! Paragraph-boundary fragment splitter.
//!
//! Retrieval works on fragments rather than whole READMEs so that a long
//! document can contribute only its relevant section. Splitting happens on
//! blank lines (`\n\n`) and never exceeds `max_tokens` (at roughly four
//! characters per token). A paragraph longer than the limit is cut at the
//! last newline or space before the limit.
//!
//! Every document yields at least one fragment, even when empty, so an index
//! over a non-empty corpus can always answer a query.
//!
//! ```rust
//! use folio_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("weather-cli", "# Weather\n\nA forecast tool.", 700);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].id, "weather-cli#0");
//! ```

use crate::models::Chunk;

const CHARS_PER_TOKEN: usize = 4;

/// Split `text` into fragments of at most `max_tokens` tokens.
///
/// Indices are contiguous from 0 and ids are `"<document>#<index>"`, so the
/// same text always produces the same fragments.
pub fn chunk_text(document: &str, text: &str, max_tokens: usize) -> Vec<Chunk> {
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut buf = String::new();

    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let projected = if buf.is_empty() {
            para.len()
        } else {
            buf.len() + 2 + para.len()
        };
        if projected > max_chars && !buf.is_empty() {
            pieces.push(std::mem::take(&mut buf));
        }

        if para.len() > max_chars {
            pieces.extend(hard_split(para, max_chars));
            continue;
        }

        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(para);
    }

    if !buf.is_empty() {
        pieces.push(buf);
    }
    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }

    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| make_chunk(document, i as i64, piece))
        .collect()
}

/// Cut an oversized paragraph into pieces no longer than `max_chars`,
/// preferring newline then space boundaries.
fn hard_split(para: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = para;

    while !rest.is_empty() {
        let limit = floor_char_boundary(rest, max_chars);
        let cut = if limit >= rest.len() {
            rest.len()
        } else {
            rest[..limit]
                .rfind('\n')
                .or_else(|| rest[..limit].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(limit)
        };
        // A single multi-byte char wider than the limit still has to move forward.
        let cut = if cut == 0 { next_char_boundary(rest) } else { cut };

        let piece = rest[..cut].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        rest = &rest[cut..];
    }

    out
}

/// Largest char boundary `<= index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn next_char_boundary(s: &str) -> usize {
    s.char_indices().nth(1).map(|(i, _)| i).unwrap_or(s.len())
}

fn make_chunk(document: &str, index: i64, text: &str) -> Chunk {
    Chunk {
        id: format!("{}#{}", document, index),
        document: document.to_string(),
        chunk_index: index,
        text: text.to_string(),
    }
}
