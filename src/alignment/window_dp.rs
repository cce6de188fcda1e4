use std::collections::HashSet;

use crate::config::AlignPolicy;
use crate::types::{AlignOp, Anchor, FilteredView, Window, WordAlign};

const COST_SUB: f64 = 1.0;
const COST_GAP: f64 = 1.0;
/// Near-zero cost for equivalence-table substitutions and filler-word
/// insertions, so spelling variants and disfluencies do not inflate edits.
const COST_DISCOUNT: f64 = 0.05;

const SCORE_ANCHOR: f64 = 1.0;
const SCORE_MATCH: f64 = 1.0;
const SCORE_EQUIV: f64 = 0.9;
const SCORE_FILLER: f64 = 0.8;
const SCORE_SUB: f64 = 0.25;
const SCORE_GAP: f64 = 0.0;

/// Align every window and union the result with one `Match` record per
/// anchor, in book order. Emitted indices are positions in the original
/// (pre-filter) input arrays. Total DP work is bounded by the sum of
/// window areas, which anchors keep near-linear in practice.
pub fn align_with_anchors(
    anchors: &[Anchor],
    windows: &[Window],
    book: &FilteredView,
    asr: &FilteredView,
    policy: &AlignPolicy,
) -> Vec<WordAlign> {
    let anchor_keys: HashSet<(usize, usize)> = anchors
        .iter()
        .map(|a| {
            (
                book.filtered_to_original[a.book_pos],
                asr.filtered_to_original[a.asr_pos],
            )
        })
        .collect();

    let mut out: Vec<WordAlign> = Vec::new();
    let mut seen: HashSet<(Option<usize>, Option<usize>, u8)> = HashSet::new();
    let mut push = |out: &mut Vec<WordAlign>, record: WordAlign| {
        let key = (record.op.book_idx(), record.op.asr_idx(), op_tag(&record.op));
        if record.reason != "anchor" {
            if let (Some(b), Some(a)) = (record.op.book_idx(), record.op.asr_idx()) {
                if anchor_keys.contains(&(b, a)) {
                    return;
                }
            }
        }
        if seen.insert(key) {
            out.push(record);
        }
    };

    let mut next_window = 0;
    for anchor in anchors {
        while next_window < windows.len() && windows[next_window].b_hi <= anchor.book_pos {
            for record in align_window(windows[next_window], book, asr, policy) {
                push(&mut out, record);
            }
            next_window += 1;
        }
        push(
            &mut out,
            WordAlign {
                op: AlignOp::Match {
                    book: book.filtered_to_original[anchor.book_pos],
                    asr: asr.filtered_to_original[anchor.asr_pos],
                },
                reason: "anchor".to_string(),
                score: SCORE_ANCHOR,
            },
        );
    }
    for window in &windows[next_window..] {
        for record in align_window(*window, book, asr, policy) {
            push(&mut out, record);
        }
    }

    tracing::debug!(
        records = out.len(),
        anchors = anchors.len(),
        windows = windows.len(),
        "windowed alignment complete"
    );
    out
}

/// Edit-distance alignment of one window's book sub-array against its
/// transcript sub-array. Ties prefer match/substitution over gaps.
pub fn align_window(
    window: Window,
    book: &FilteredView,
    asr: &FilteredView,
    policy: &AlignPolicy,
) -> Vec<WordAlign> {
    let book_len = window.book_len();
    let asr_len = window.asr_len();

    // One-side-empty windows need no DP: the gap itself determines every
    // operation.
    if book_len == 0 {
        return (window.a_lo..window.a_hi)
            .map(|a| WordAlign {
                op: AlignOp::Ins {
                    asr: asr.filtered_to_original[a],
                },
                reason: "boundary".to_string(),
                score: SCORE_GAP,
            })
            .collect();
    }
    if asr_len == 0 {
        return (window.b_lo..window.b_hi)
            .map(|b| WordAlign {
                op: AlignOp::Del {
                    book: book.filtered_to_original[b],
                },
                reason: "boundary".to_string(),
                score: SCORE_GAP,
            })
            .collect();
    }

    let book_tokens = &book.tokens[window.b_lo..window.b_hi];
    let asr_tokens = &asr.tokens[window.a_lo..window.a_hi];

    let width = asr_len + 1;
    let mut cost = vec![0.0f64; (book_len + 1) * width];
    // 0 = diagonal, 1 = up (delete book token), 2 = left (insert asr token)
    let mut bp = vec![0u8; (book_len + 1) * width];

    for j in 1..=asr_len {
        cost[j] = cost[j - 1] + insertion_cost(&asr_tokens[j - 1], policy);
        bp[j] = 2;
    }
    for i in 1..=book_len {
        cost[i * width] = cost[(i - 1) * width] + COST_GAP;
        bp[i * width] = 1;
    }

    for i in 1..=book_len {
        for j in 1..=asr_len {
            let diag = cost[(i - 1) * width + j - 1]
                + pair_cost(&book_tokens[i - 1], &asr_tokens[j - 1], policy);
            let up = cost[(i - 1) * width + j] + COST_GAP;
            let left = cost[i * width + j - 1] + insertion_cost(&asr_tokens[j - 1], policy);

            let (best, step) = if diag <= up && diag <= left {
                (diag, 0)
            } else if up <= left {
                (up, 1)
            } else {
                (left, 2)
            };
            cost[i * width + j] = best;
            bp[i * width + j] = step;
        }
    }

    let mut records = Vec::with_capacity(book_len.max(asr_len));
    let mut i = book_len;
    let mut j = asr_len;
    while i > 0 || j > 0 {
        match bp[i * width + j] {
            0 => {
                i -= 1;
                j -= 1;
                let book_idx = book.filtered_to_original[window.b_lo + i];
                let asr_idx = asr.filtered_to_original[window.a_lo + j];
                let book_word = &book_tokens[i];
                let asr_word = &asr_tokens[j];
                let (op, reason, score) = if book_word == asr_word {
                    (
                        AlignOp::Match {
                            book: book_idx,
                            asr: asr_idx,
                        },
                        "match",
                        SCORE_MATCH,
                    )
                } else if policy.are_equivalent(book_word, asr_word) {
                    (
                        AlignOp::Sub {
                            book: book_idx,
                            asr: asr_idx,
                        },
                        "equiv",
                        SCORE_EQUIV,
                    )
                } else {
                    (
                        AlignOp::Sub {
                            book: book_idx,
                            asr: asr_idx,
                        },
                        "sub",
                        SCORE_SUB,
                    )
                };
                records.push(WordAlign {
                    op,
                    reason: reason.to_string(),
                    score,
                });
            }
            1 => {
                i -= 1;
                records.push(WordAlign {
                    op: AlignOp::Del {
                        book: book.filtered_to_original[window.b_lo + i],
                    },
                    reason: "del".to_string(),
                    score: SCORE_GAP,
                });
            }
            _ => {
                j -= 1;
                let (reason, score) = if policy.fillers.contains(asr_tokens[j].as_str()) {
                    ("filler", SCORE_FILLER)
                } else {
                    ("ins", SCORE_GAP)
                };
                records.push(WordAlign {
                    op: AlignOp::Ins {
                        asr: asr.filtered_to_original[window.a_lo + j],
                    },
                    reason: reason.to_string(),
                    score,
                });
            }
        }
    }
    records.reverse();
    records
}

fn pair_cost(book_word: &str, asr_word: &str, policy: &AlignPolicy) -> f64 {
    if book_word == asr_word {
        0.0
    } else if policy.are_equivalent(book_word, asr_word) {
        COST_DISCOUNT
    } else {
        COST_SUB
    }
}

fn insertion_cost(asr_word: &str, policy: &AlignPolicy) -> f64 {
    if policy.fillers.contains(asr_word) {
        COST_DISCOUNT
    } else {
        COST_GAP
    }
}

fn op_tag(op: &AlignOp) -> u8 {
    match op {
        AlignOp::Match { .. } => 0,
        AlignOp::Sub { .. } => 1,
        AlignOp::Ins { .. } => 2,
        AlignOp::Del { .. } => 3,
    }
}
