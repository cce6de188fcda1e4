use std::collections::{HashMap, HashSet};

use crate::config::AlignPolicy;
use crate::error::AlignmentError;
use crate::types::{Anchor, FilteredView};

/// Find a monotonic set of high-confidence position correspondences between
/// the two filtered token arrays, optionally restricted to a book sub-range
/// (filtered coordinates, half-open).
///
/// Candidates are n-grams occurring exactly once on both sides; if the
/// resulting density falls under ~1 anchor per `target_per_tokens` book
/// tokens, the occurrence policy is relaxed to two well-separated
/// occurrences per side, and then the n-gram size is reduced down to
/// `min_ngram_size`. The final set is the longest subsequence strictly
/// increasing on both positions, so no two anchors cross.
pub fn select_anchors(
    book: &FilteredView,
    book_sentences: &[usize],
    asr: &FilteredView,
    policy: &AlignPolicy,
    book_span: Option<(usize, usize)>,
) -> Result<Vec<Anchor>, AlignmentError> {
    if book_sentences.len() != book.len() {
        return Err(AlignmentError::structural(
            "select anchors",
            format!(
                "sentence map length {} does not match book view length {}",
                book_sentences.len(),
                book.len()
            ),
        ));
    }
    let (lo, hi) = book_span.unwrap_or((0, book.len()));
    if lo > hi || hi > book.len() {
        return Err(AlignmentError::structural(
            "select anchors",
            format!("book span {lo}..{hi} out of range for {} tokens", book.len()),
        ));
    }

    let span_len = hi - lo;
    if span_len == 0 || asr.is_empty() {
        return Ok(Vec::new());
    }
    let target = (span_len / policy.target_per_tokens).max(1);

    let mut best: Vec<Anchor> = Vec::new();
    // Hard floor of 2 regardless of policy: unigram anchors are noise.
    let floor = policy.min_ngram_size.max(2);
    let mut n = policy.ngram_size.min(span_len).min(asr.len());
    while n >= floor {
        let mut candidates = collect_candidates(book, book_sentences, asr, policy, lo, hi, n, 1);
        if candidates.len() < target {
            let unique_count = candidates.len();
            merge_candidates(
                &mut candidates,
                collect_candidates(book, book_sentences, asr, policy, lo, hi, n, 2),
            );
            tracing::debug!(
                n,
                unique = unique_count,
                relaxed = candidates.len(),
                target,
                "anchor density under target, relaxed occurrence policy"
            );
        }
        if candidates.len() > best.len() {
            best = candidates;
        }
        if best.len() >= target {
            break;
        }
        n -= 1;
    }

    let anchors = longest_increasing_by_asr(best);
    tracing::debug!(
        anchors = anchors.len(),
        span_tokens = span_len,
        "anchor selection complete"
    );
    Ok(anchors)
}

#[allow(clippy::too_many_arguments)]
fn collect_candidates(
    book: &FilteredView,
    book_sentences: &[usize],
    asr: &FilteredView,
    policy: &AlignPolicy,
    lo: usize,
    hi: usize,
    n: usize,
    max_occurrences: usize,
) -> Vec<Anchor> {
    let book_index = ngram_index(&book.tokens, lo, hi, n);
    let asr_index = ngram_index(&asr.tokens, 0, asr.len(), n);

    let mut out = Vec::new();
    for (key, book_occs) in &book_index {
        if book_occs.len() > max_occurrences {
            continue;
        }
        let Some(asr_occs) = asr_index.get(key) else {
            continue;
        };
        if asr_occs.len() > max_occurrences {
            continue;
        }
        if max_occurrences > 1
            && !(separated(book_occs, policy.min_separation)
                && separated(asr_occs, policy.min_separation))
        {
            continue;
        }
        if !content_ok(&book.tokens[book_occs[0]..book_occs[0] + n], policy) {
            continue;
        }

        // Repeat occurrences pair in order; the LIS pass prunes any
        // crossing this produces.
        for i in 0..book_occs.len().min(asr_occs.len()) {
            let book_pos = book_occs[i];
            if !policy.allow_sentence_spanning
                && book_sentences[book_pos] != book_sentences[book_pos + n - 1]
            {
                continue;
            }
            out.push(Anchor {
                book_pos,
                asr_pos: asr_occs[i],
            });
        }
    }
    out
}

/// Occurrence lists are in ascending start order.
fn ngram_index(tokens: &[String], lo: usize, hi: usize, n: usize) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    if hi - lo < n {
        return index;
    }
    for start in lo..=hi - n {
        let key = tokens[start..start + n].join(" ");
        index.entry(key).or_default().push(start);
    }
    index
}

/// An n-gram anchors reliably only if it carries content: at least two
/// non-stopword tokens, and neither edge token a stopword (edges are where
/// word-boundary noise concentrates).
fn content_ok(gram: &[String], policy: &AlignPolicy) -> bool {
    let is_stop = |t: &String| policy.stopwords.contains(t.as_str());
    match (gram.first(), gram.last()) {
        (Some(first), Some(last)) if !is_stop(first) && !is_stop(last) => {
            gram.iter().filter(|t| !is_stop(t)).count() >= 2
        }
        _ => false,
    }
}

fn separated(occurrences: &[usize], min_separation: usize) -> bool {
    occurrences
        .windows(2)
        .all(|pair| pair[1] - pair[0] >= min_separation)
}

fn merge_candidates(base: &mut Vec<Anchor>, extra: Vec<Anchor>) {
    let seen: HashSet<(usize, usize)> = base.iter().map(|a| (a.book_pos, a.asr_pos)).collect();
    base.extend(
        extra
            .into_iter()
            .filter(|a| !seen.contains(&(a.book_pos, a.asr_pos))),
    );
}

/// Longest subsequence strictly increasing in `asr_pos` after sorting by
/// `book_pos` (patience sorting, O(n log n), predecessor back-pointers).
/// Equal book positions are pre-sorted by descending `asr_pos` so two
/// candidates at the same book position can never chain.
pub(crate) fn longest_increasing_by_asr(mut candidates: Vec<Anchor>) -> Vec<Anchor> {
    candidates.sort_by(|x, y| {
        x.book_pos
            .cmp(&y.book_pos)
            .then(y.asr_pos.cmp(&x.asr_pos))
    });
    candidates.dedup();
    if candidates.is_empty() {
        return candidates;
    }

    let mut tails: Vec<usize> = Vec::new();
    let mut parent = vec![usize::MAX; candidates.len()];
    for i in 0..candidates.len() {
        let asr_pos = candidates[i].asr_pos;
        let slot = tails.partition_point(|&j| candidates[j].asr_pos < asr_pos);
        parent[i] = if slot > 0 { tails[slot - 1] } else { usize::MAX };
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cur = *tails.last().expect("non-empty tails");
    while cur != usize::MAX {
        out.push(candidates[cur]);
        cur = parent[cur];
    }
    out.reverse();
    out
}
