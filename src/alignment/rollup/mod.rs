use std::collections::HashMap;

use crate::alignment::normalize::normalize_word;
use crate::diff;
use crate::error::AlignmentError;
use crate::types::{
    AlignOp, AlignStatus, AsrToken, BookWord, ParagraphAlign, SentenceAlign, SentenceMetrics,
    WordAlign,
};

#[cfg(test)]
mod tests;

const WER_OK: f64 = 0.10;
const WER_ATTENTION: f64 = 0.25;
/// A sentence is only `ok` with fewer than this many missed spans.
const MAX_OK_MISSING_RUNS: usize = 3;

/// Aggregate word-level operations into sentence and paragraph alignment
/// records with error-rate metrics, timing and a status classification.
/// Degenerate sentences (no resolvable transcript range) are results, not
/// errors.
pub fn rollup(
    word_aligns: &[WordAlign],
    book_words: &[BookWord],
    asr_tokens: &[AsrToken],
) -> Result<(Vec<SentenceAlign>, Vec<ParagraphAlign>), AlignmentError> {
    if book_words.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let idx_to_pos: HashMap<usize, usize> = book_words
        .iter()
        .enumerate()
        .map(|(pos, w)| (w.idx, pos))
        .collect();
    for record in word_aligns {
        if let Some(book_idx) = record.op.book_idx() {
            if !idx_to_pos.contains_key(&book_idx) {
                return Err(AlignmentError::structural(
                    "rollup",
                    format!("word alignment references unknown book index {book_idx}"),
                ));
            }
        }
        if let Some(asr_idx) = record.op.asr_idx() {
            if asr_idx >= asr_tokens.len() {
                return Err(AlignmentError::structural(
                    "rollup",
                    format!(
                        "word alignment references asr index {asr_idx} beyond {} tokens",
                        asr_tokens.len()
                    ),
                ));
            }
        }
    }

    let sentence_ranges = group_ranges(book_words, "sentence", |w| w.sentence)?;
    let paragraph_ranges = group_ranges(book_words, "paragraph", |w| w.paragraph)?;

    let sentence_rollups = rollup_ranges(
        &sentence_ranges,
        word_aligns,
        book_words,
        asr_tokens,
        &idx_to_pos,
    );
    let paragraph_rollups = rollup_ranges(
        &paragraph_ranges,
        word_aligns,
        book_words,
        asr_tokens,
        &idx_to_pos,
    );

    let sentences: Vec<SentenceAlign> = sentence_ranges
        .iter()
        .zip(&sentence_rollups)
        .map(|(range, rolled)| SentenceAlign {
            sentence: range.key,
            book_range: rolled.book_range,
            asr_range: rolled.asr_range,
            start_sec: rolled.start_sec,
            end_sec: rolled.end_sec,
            metrics: rolled.metrics,
            status: sentence_status(&rolled.metrics),
        })
        .collect();

    let paragraphs: Vec<ParagraphAlign> = paragraph_ranges
        .iter()
        .zip(&paragraph_rollups)
        .map(|(range, rolled)| ParagraphAlign {
            paragraph: range.key,
            book_range: rolled.book_range,
            asr_range: rolled.asr_range,
            start_sec: rolled.start_sec,
            end_sec: rolled.end_sec,
            metrics: rolled.metrics,
            status: paragraph_status(&rolled.metrics),
            sentences: sentence_ranges
                .iter()
                .filter(|s| s.start_pos >= range.start_pos && s.end_pos <= range.end_pos)
                .map(|s| s.key)
                .collect(),
        })
        .collect();

    let ok_count = sentences
        .iter()
        .filter(|s| s.status == AlignStatus::Ok)
        .count();
    tracing::debug!(
        sentences = sentences.len(),
        paragraphs = paragraphs.len(),
        ok = ok_count,
        "rollup complete"
    );
    Ok((sentences, paragraphs))
}

struct BookRange {
    key: usize,
    /// Positions in the book word array, half-open.
    start_pos: usize,
    end_pos: usize,
}

struct RangeRollup {
    book_range: (usize, usize),
    asr_range: Option<(usize, usize)>,
    start_sec: f64,
    end_sec: f64,
    metrics: SentenceMetrics,
}

fn group_ranges(
    book_words: &[BookWord],
    label: &'static str,
    key_of: impl Fn(&BookWord) -> usize,
) -> Result<Vec<BookRange>, AlignmentError> {
    let mut ranges: Vec<BookRange> = Vec::new();
    for (pos, word) in book_words.iter().enumerate() {
        if pos > 0 && book_words[pos - 1].idx >= word.idx {
            return Err(AlignmentError::structural(
                "rollup",
                format!("book word indices not strictly increasing at position {pos}"),
            ));
        }
        let key = key_of(word);
        match ranges.last_mut() {
            Some(range) if range.key == key => range.end_pos = pos + 1,
            Some(range) if range.key > key => {
                return Err(AlignmentError::structural(
                    "rollup",
                    format!("{label} index decreases at book position {pos}"),
                ));
            }
            _ => ranges.push(BookRange {
                key,
                start_pos: pos,
                end_pos: pos + 1,
            }),
        }
    }
    Ok(ranges)
}

fn rollup_ranges(
    ranges: &[BookRange],
    word_aligns: &[WordAlign],
    book_words: &[BookWord],
    asr_tokens: &[AsrToken],
    idx_to_pos: &HashMap<usize, usize>,
) -> Vec<RangeRollup> {
    let mut range_of_pos = vec![usize::MAX; book_words.len()];
    for (range_id, range) in ranges.iter().enumerate() {
        for slot in range_of_pos
            .iter_mut()
            .take(range.end_pos)
            .skip(range.start_pos)
        {
            *slot = range_id;
        }
    }

    #[derive(Clone)]
    struct Agg {
        present: usize,
        dels: usize,
        subs: usize,
        asr_min: Option<usize>,
        asr_max: Option<usize>,
        first_record: usize,
        last_record: usize,
    }
    let empty = Agg {
        present: 0,
        dels: 0,
        subs: 0,
        asr_min: None,
        asr_max: None,
        first_record: usize::MAX,
        last_record: 0,
    };
    let mut aggs = vec![empty; ranges.len()];

    for (record_pos, record) in word_aligns.iter().enumerate() {
        let Some(book_idx) = record.op.book_idx() else {
            continue;
        };
        let range_id = range_of_pos[idx_to_pos[&book_idx]];
        let agg = &mut aggs[range_id];
        agg.present += 1;
        match record.op {
            AlignOp::Del { .. } => agg.dels += 1,
            AlignOp::Sub { .. } => agg.subs += 1,
            AlignOp::Match { .. } | AlignOp::Ins { .. } => {}
        }
        if let Some(asr_idx) = record.op.asr_idx() {
            agg.asr_min = Some(agg.asr_min.map_or(asr_idx, |m| m.min(asr_idx)));
            agg.asr_max = Some(agg.asr_max.map_or(asr_idx, |m| m.max(asr_idx)));
        }
        agg.first_record = agg.first_record.min(record_pos);
        agg.last_record = agg.last_record.max(record_pos);
    }

    ranges
        .iter()
        .zip(&aggs)
        .map(|(range, agg)| {
            // Insertions between this range's first and last records lie
            // inside the resolved transcript span; the record stream is
            // monotonic, so the segment scan is exact.
            let mut inss = 0;
            let mut missing_runs = 0;
            let mut extra_runs = 0;
            if agg.first_record != usize::MAX {
                let mut in_del_run = false;
                let mut in_ins_run = false;
                for record in &word_aligns[agg.first_record..=agg.last_record] {
                    match record.op {
                        AlignOp::Del { .. } => {
                            if !in_del_run {
                                missing_runs += 1;
                            }
                            in_del_run = true;
                            in_ins_run = false;
                        }
                        AlignOp::Ins { .. } => {
                            // Filler insertions are absorbed disfluencies,
                            // not transcript errors.
                            if record.reason != "filler" {
                                inss += 1;
                                if !in_ins_run {
                                    extra_runs += 1;
                                }
                                in_ins_run = true;
                                in_del_run = false;
                            }
                        }
                        AlignOp::Match { .. } | AlignOp::Sub { .. } => {
                            in_del_run = false;
                            in_ins_run = false;
                        }
                    }
                }
            }

            let reference = agg.present.max(1) as f64;
            let wer = ((agg.dels + inss) as f64 / reference).min(1.0);
            let span_wer = ((agg.dels + inss + agg.subs) as f64 / reference).min(1.0);

            let asr_range = match (agg.asr_min, agg.asr_max) {
                (Some(lo), Some(hi)) => Some((lo, hi)),
                _ => None,
            };
            let book_text = joined_text(
                book_words[range.start_pos..range.end_pos]
                    .iter()
                    .map(|w| w.text.as_str()),
            );
            let asr_text = match asr_range {
                Some((lo, hi)) => {
                    joined_text(asr_tokens[lo..=hi].iter().map(|t| t.text.as_str()))
                }
                None => String::new(),
            };
            let cer = diff::char_error_rate(&book_text, &asr_text);

            let (start_sec, end_sec) = match asr_range {
                Some((lo, hi)) => (
                    asr_tokens[lo].start_sec,
                    asr_tokens[hi].start_sec + asr_tokens[hi].duration_sec,
                ),
                None => (0.0, 0.0),
            };

            RangeRollup {
                book_range: (
                    book_words[range.start_pos].idx,
                    book_words[range.end_pos - 1].idx + 1,
                ),
                asr_range,
                start_sec,
                end_sec,
                metrics: SentenceMetrics {
                    wer,
                    cer,
                    span_wer,
                    missing_runs,
                    extra_runs,
                },
            }
        })
        .collect()
}

fn joined_text<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence_status(metrics: &SentenceMetrics) -> AlignStatus {
    if metrics.wer <= WER_OK && metrics.missing_runs < MAX_OK_MISSING_RUNS {
        AlignStatus::Ok
    } else if metrics.wer <= WER_ATTENTION {
        AlignStatus::Attention
    } else {
        AlignStatus::Unreliable
    }
}

fn paragraph_status(metrics: &SentenceMetrics) -> AlignStatus {
    if metrics.wer <= WER_OK {
        AlignStatus::Ok
    } else if metrics.wer <= WER_ATTENTION {
        AlignStatus::Attention
    } else {
        AlignStatus::Unreliable
    }
}
