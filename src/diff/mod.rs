mod myers;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alignment::normalize::normalize_word;
use crate::error::AlignmentError;
use myers::Edit;

/// First code point of the private-use range used for token encoding.
const ENCODE_BASE: u32 = 0xE000;
/// Distinct tokens addressable per diff call (U+E000..=U+F8FF). A single
/// sentence or chapter stays far below this; callers that exceed it must
/// chunk their input.
pub const ENCODING_CAPACITY: usize = 0x1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
}

/// A maximal run of same-kind token operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffOp {
    pub operation: DiffKind,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffStats {
    pub reference_tokens: usize,
    pub hypothesis_tokens: usize,
    pub matches: usize,
    pub insertions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub stats: DiffStats,
    pub ops: Vec<DiffOp>,
    /// Fraction of reference tokens found in the hypothesis.
    pub coverage: f64,
    pub cer: f64,
}

/// Token-level diff between two texts, normalized and tokenized the same
/// way as the alignment pipeline.
///
/// Each distinct token is mapped to a single private-use character and the
/// encoded strings go through the character Myers diff; the equal/insert/
/// delete runs are then decoded back into token lists. This reuses one
/// battle-tested diff for exact token-level work at the cost of a
/// per-call vocabulary ceiling, which is enforced explicitly rather than
/// letting token identities alias.
pub fn analyze(reference: &str, hypothesis: &str) -> Result<DiffReport, AlignmentError> {
    let ref_tokens = tokenize(reference);
    let hyp_tokens = tokenize(hypothesis);

    let mut dict: HashMap<String, char> = HashMap::new();
    let ref_encoded = encode_side(&ref_tokens, &mut dict)?;
    let hyp_encoded = encode_side(&hyp_tokens, &mut dict)?;

    let edits = myers::diff_chars(&ref_encoded, &hyp_encoded);
    let ops = decode_runs(&edits, &ref_tokens, &hyp_tokens);

    let matches = edits.iter().filter(|&&e| e == Edit::Equal).count();
    let insertions = edits.iter().filter(|&&e| e == Edit::Insert).count();
    let deletions = edits.iter().filter(|&&e| e == Edit::Delete).count();
    let stats = DiffStats {
        reference_tokens: ref_tokens.len(),
        hypothesis_tokens: hyp_tokens.len(),
        matches,
        insertions,
        deletions,
    };

    let coverage = 1.0 - (deletions as f64 / ref_tokens.len().max(1) as f64).min(1.0);
    let cer = char_error_rate(reference, hypothesis);

    Ok(DiffReport {
        stats,
        ops,
        coverage,
        cer,
    })
}

/// Character error rate over the normalized forms of both texts, clamped
/// to [0, 1]. Computed directly on characters, independent of the token
/// encoding.
pub fn char_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let ref_chars: Vec<char> = normalize_text(reference).chars().collect();
    let hyp_chars: Vec<char> = normalize_text(hypothesis).chars().collect();
    if ref_chars.is_empty() && hyp_chars.is_empty() {
        return 0.0;
    }

    let edits = myers::diff_chars(&ref_chars, &hyp_chars);
    let changed = edits.iter().filter(|&&e| e != Edit::Equal).count();
    (changed as f64 / ref_chars.len().max(1) as f64).min(1.0)
}

fn tokenize(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .map(normalize_word)
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_text(raw: &str) -> String {
    tokenize(raw).join(" ")
}

fn encode_side(
    tokens: &[String],
    dict: &mut HashMap<String, char>,
) -> Result<Vec<char>, AlignmentError> {
    tokens
        .iter()
        .map(|token| {
            if let Some(&code) = dict.get(token) {
                return Ok(code);
            }
            if dict.len() >= ENCODING_CAPACITY {
                return Err(AlignmentError::DiffVocabulary {
                    distinct: dict.len() + 1,
                    capacity: ENCODING_CAPACITY,
                });
            }
            let code = char::from_u32(ENCODE_BASE + dict.len() as u32)
                .expect("private-use code point");
            dict.insert(token.clone(), code);
            Ok(code)
        })
        .collect()
}

fn decode_runs(edits: &[Edit], ref_tokens: &[String], hyp_tokens: &[String]) -> Vec<DiffOp> {
    let mut ops: Vec<DiffOp> = Vec::new();
    let mut ref_at = 0;
    let mut hyp_at = 0;
    for &edit in edits {
        let (kind, token) = match edit {
            Edit::Equal => {
                let t = ref_tokens[ref_at].clone();
                ref_at += 1;
                hyp_at += 1;
                (DiffKind::Equal, t)
            }
            Edit::Delete => {
                let t = ref_tokens[ref_at].clone();
                ref_at += 1;
                (DiffKind::Delete, t)
            }
            Edit::Insert => {
                let t = hyp_tokens[hyp_at].clone();
                hyp_at += 1;
                (DiffKind::Insert, t)
            }
        };
        match ops.last_mut() {
            Some(run) if run.operation == kind => run.tokens.push(token),
            _ => ops.push(DiffOp {
                operation: kind,
                tokens: vec![token],
            }),
        }
    }
    ops
}
