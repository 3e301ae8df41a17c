//! Free-text piece recovery
//!
//! Reads keypairs out of arbitrary pasted text by annotating it in layers:
//! currency names first, then the value labels near each name, then the
//! values following each label. The scan is case-insensitive but values are
//! sliced from the original text with their case intact, so keys survive a
//! trip through a paste buffer, an OCR pass, or a hand transcription with
//! extra prose around them.

use crate::currency::{CurrencyId, Registry};
use crate::error::{Error, Result};
use crate::keypair::Keypair;
use crate::piece::Piece;

use super::text::NOT_APPLICABLE;

const PUBLIC_LABEL: &str = "public address";

#[derive(Debug, Clone, Copy, PartialEq)]
enum AnnotationKind {
    Currency(CurrencyId),
    PublicLabel,
    PrivateLabel,
    PublicValue,
    PrivateValue,
}

/// A half-open byte range `[start, end)` of the lowercased text
#[derive(Debug, Clone, Copy)]
struct Annotation {
    start: usize,
    end: usize,
    kind: AnnotationKind,
}

/// Whether annotation `a` strictly contains annotation `b`
fn subsumes(a: &Annotation, b: &Annotation) -> bool {
    (a.start <= b.start && a.end > b.end) || (a.start < b.start && a.end >= b.end)
}

fn remove_subsumed(annotations: &mut Vec<Annotation>) {
    let snapshot = annotations.clone();
    annotations.retain(|a| !snapshot.iter().any(|b| subsumes(b, a)));
}

fn sort(annotations: &mut [Annotation]) {
    annotations.sort_by_key(|a| (a.start, a.end));
}

/// Whether `[start, end)` sits on token boundaries, with ASCII whitespace
/// or the text edges on both sides
fn is_token(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let before_ok = start == 0 || bytes[start - 1].is_ascii_whitespace();
    let after_ok = end == bytes.len() || bytes[end].is_ascii_whitespace();
    before_ok && after_ok
}

/// Annotates every occurrence of `needle` within `[from, until)`
///
/// `needle` must be lowercase ASCII; overlapping occurrences are all
/// reported. With `tokens_only`, occurrences inside larger words are
/// skipped.
fn annotate_occurrences(
    lower: &str,
    needle: &str,
    from: usize,
    until: Option<usize>,
    tokens_only: bool,
    kind: AnnotationKind,
    annotations: &mut Vec<Annotation>,
) {
    let mut cursor = from;
    while cursor < lower.len() {
        let Some(found) = lower[cursor..].find(needle) else {
            break;
        };
        let start = cursor + found;
        let end = start + needle.len();
        if until.is_some_and(|limit| end > limit) {
            break;
        }
        if !tokens_only || is_token(lower, start, end) {
            annotations.push(Annotation { start, end, kind });
        }
        cursor = start + 1;
    }
}

/// Finds the next whitespace-delimited value after `from`
///
/// A value only begins after at least one whitespace character has been
/// seen, so trailing decoration glued to a label (like a state marker in
/// parentheses) is skipped over. The value ends at the first newline after
/// it starts, which lets it span multiple words on one line, or at the end
/// of the text.
fn next_value(lower: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = lower.as_bytes();
    let mut token_start: Option<usize> = None;
    let mut last_non_ws: Option<usize> = None;
    let mut ws_seen = false;

    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            ws_seen = true;
            if (b == b'\n' || b == b'\r')
                && let (Some(start), Some(last)) = (token_start, last_non_ws)
            {
                return Some((start, last + 1));
            }
        } else {
            last_non_ws = Some(i);
            if token_start.is_none() && ws_seen {
                token_start = Some(i);
            }
        }
        i += 1;
    }
    token_start.map(|start| (start, lower.len()))
}

/// One keypair's worth of values gathered from the text
#[derive(Debug)]
struct RawRecord {
    currency: CurrencyId,
    /// `Some(None)` is the explicit no-address marker
    public: Option<Option<String>>,
    private: Option<String>,
}

/// Parses arbitrary text into a piece
///
/// # Errors
/// Returns [`Error::MalformedInput`] when the text names no known currency,
/// carries conflicting values for one, or yields keypairs that cannot be
/// classified
pub fn parse_free_text(text: &str, registry: &Registry) -> Result<Piece> {
    let lower = text.to_ascii_lowercase();
    let mut annotations = Vec::new();

    for &currency in registry.currencies() {
        annotate_occurrences(
            &lower,
            &currency.name().to_ascii_lowercase(),
            0,
            None,
            true,
            AnnotationKind::Currency(currency),
            &mut annotations,
        );
    }
    remove_subsumed(&mut annotations);
    sort(&mut annotations);

    // labels are searched from just after each currency mention up to the
    // next one, private labels are currency-specific
    let currency_spans: Vec<(usize, CurrencyId)> = annotations
        .iter()
        .filter_map(|a| match a.kind {
            AnnotationKind::Currency(c) => Some((a.start, c)),
            _ => None,
        })
        .collect();
    for (i, &(start, currency)) in currency_spans.iter().enumerate() {
        let until = currency_spans.get(i + 1).map(|&(next_start, _)| next_start);
        annotate_occurrences(
            &lower,
            PUBLIC_LABEL,
            start + 1,
            until,
            false,
            AnnotationKind::PublicLabel,
            &mut annotations,
        );
        annotate_occurrences(
            &lower,
            &currency.private_label().to_ascii_lowercase(),
            start + 1,
            until,
            false,
            AnnotationKind::PrivateLabel,
            &mut annotations,
        );
    }
    sort(&mut annotations);

    let mut values = Vec::new();
    for annotation in &annotations {
        let kind = match annotation.kind {
            AnnotationKind::PublicLabel => AnnotationKind::PublicValue,
            AnnotationKind::PrivateLabel => AnnotationKind::PrivateValue,
            _ => continue,
        };
        if let Some((start, end)) = next_value(&lower, annotation.end + 1) {
            values.push(Annotation { start, end, kind });
        }
    }
    annotations.extend(values);
    remove_subsumed(&mut annotations);
    sort(&mut annotations);

    let records = gather_records(text, &annotations)?;
    build_piece(&records)
}

fn slice<'a>(text: &'a str, annotation: &Annotation) -> Result<&'a str> {
    text.get(annotation.start..annotation.end)
        .ok_or_else(|| Error::malformed("text annotation fell on a partial character"))
}

fn gather_records(text: &str, annotations: &[Annotation]) -> Result<Vec<RawRecord>> {
    let mut records: Vec<RawRecord> = Vec::new();
    for annotation in annotations {
        match annotation.kind {
            AnnotationKind::Currency(currency) => {
                records.push(RawRecord {
                    currency,
                    public: None,
                    private: None,
                });
            }
            AnnotationKind::PublicValue => {
                let record = records.last_mut().ok_or_else(|| {
                    Error::malformed("found a public address before any currency name")
                })?;
                let value = slice(text, annotation)?;
                let value = if value == NOT_APPLICABLE {
                    None
                } else {
                    Some(value.to_string())
                };
                match &record.public {
                    Some(existing) if *existing != value => {
                        return Err(Error::malformed(format!(
                            "conflicting public addresses for {}",
                            record.currency.ticker()
                        )));
                    }
                    Some(_) => {}
                    None => record.public = Some(value),
                }
            }
            AnnotationKind::PrivateValue => {
                let record = records.last_mut().ok_or_else(|| {
                    Error::malformed("found a private value before any currency name")
                })?;
                let value = slice(text, annotation)?.to_string();
                match &record.private {
                    Some(existing) if *existing != value => {
                        return Err(Error::malformed(format!(
                            "conflicting private values for {}",
                            record.currency.ticker()
                        )));
                    }
                    Some(_) => {}
                    None => record.private = Some(value),
                }
            }
            _ => {}
        }
    }
    if records.is_empty() {
        return Err(Error::malformed("no recognizable keypairs in text"));
    }
    Ok(records)
}

fn build_piece(records: &[RawRecord]) -> Result<Piece> {
    let mut keypairs = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if record.public.is_none() && record.private.is_none() {
            // a bare currency mention right before its real block is noise
            let followed_by_same = records
                .get(i + 1)
                .is_some_and(|next| next.currency == record.currency);
            if followed_by_same {
                continue;
            }
            return Err(Error::malformed(format!(
                "found the currency {} but no values for it",
                record.currency.ticker()
            )));
        }
        let public = record.public.as_ref().map(|o| o.as_deref());
        let keypair = Keypair::from_parts(record.currency, record.private.as_deref(), public)
            .map_err(|e| {
                Error::malformed(format!(
                    "cannot parse {} keypair from text: {e}",
                    record.currency.ticker()
                ))
            })?;
        keypairs.push(keypair);
    }
    Piece::new(keypairs).map_err(|e| Error::malformed(format!("text is not a coherent piece: {e}")))
}
