use super::*;
use crate::types::{AlignOp, AsrToken, BookWord, WordAlign};

fn book_from(sentences: &[(&[&str], usize)]) -> Vec<BookWord> {
    let mut words = Vec::new();
    let mut idx = 0;
    for (sentence, (texts, paragraph)) in sentences.iter().enumerate() {
        for text in *texts {
            words.push(BookWord {
                text: text.to_string(),
                idx,
                sentence,
                paragraph: *paragraph,
            });
            idx += 1;
        }
    }
    words
}

fn asr_from(texts: &[&str]) -> Vec<AsrToken> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| AsrToken {
            text: text.to_string(),
            start_sec: i as f64,
            duration_sec: 0.5,
        })
        .collect()
}

fn matched(book: usize, asr: usize) -> WordAlign {
    WordAlign {
        op: AlignOp::Match { book, asr },
        reason: "match".to_string(),
        score: 1.0,
    }
}

fn substituted(book: usize, asr: usize) -> WordAlign {
    WordAlign {
        op: AlignOp::Sub { book, asr },
        reason: "sub".to_string(),
        score: 0.25,
    }
}

fn deleted(book: usize) -> WordAlign {
    WordAlign {
        op: AlignOp::Del { book },
        reason: "del".to_string(),
        score: 0.0,
    }
}

fn inserted(asr: usize) -> WordAlign {
    WordAlign {
        op: AlignOp::Ins { asr },
        reason: "ins".to_string(),
        score: 0.0,
    }
}

#[test]
fn identity_rollup_is_all_ok() {
    let book = book_from(&[
        (&["the", "black", "forest"], 0),
        (&["was", "dark"], 0),
    ]);
    let asr = asr_from(&["the", "black", "forest", "was", "dark"]);
    let aligns: Vec<WordAlign> = (0..5).map(|i| matched(i, i)).collect();

    let (sentences, paragraphs) = rollup(&aligns, &book, &asr).expect("rollup");

    assert_eq!(sentences.len(), 2);
    let first = &sentences[0];
    assert_eq!(first.book_range, (0, 3));
    assert_eq!(first.asr_range, Some((0, 2)));
    assert_eq!(first.metrics.wer, 0.0);
    assert_eq!(first.metrics.cer, 0.0);
    assert_eq!(first.status, AlignStatus::Ok);
    assert_eq!(first.start_sec, 0.0);
    assert!((first.end_sec - 2.5).abs() < 1e-12);

    assert_eq!(paragraphs.len(), 1);
    assert_eq!(paragraphs[0].book_range, (0, 5));
    assert_eq!(paragraphs[0].sentences, vec![0, 1]);
    assert_eq!(paragraphs[0].status, AlignStatus::Ok);
}

#[test]
fn fully_missed_sentence_is_unreliable_with_zero_timing() {
    let book = book_from(&[
        (&["keep", "these", "words"], 0),
        (&["gone", "entirely"], 0),
    ]);
    let asr = asr_from(&["keep", "these", "words"]);
    let aligns = vec![
        matched(0, 0),
        matched(1, 1),
        matched(2, 2),
        deleted(3),
        deleted(4),
    ];

    let (sentences, _) = rollup(&aligns, &book, &asr).expect("rollup");
    let missed = &sentences[1];
    assert_eq!(missed.asr_range, None);
    assert_eq!(missed.start_sec, 0.0);
    assert_eq!(missed.end_sec, 0.0);
    assert_eq!(missed.metrics.wer, 1.0);
    assert_eq!(missed.metrics.cer, 1.0);
    assert_eq!(missed.metrics.missing_runs, 1);
    assert_eq!(missed.status, AlignStatus::Unreliable);
}

#[test]
fn single_deletion_in_short_sentence_needs_attention() {
    let texts: Vec<&str> = vec!["w0", "w1", "w2", "w3", "w4", "w5", "w6", "w7"];
    let book = book_from(&[(&texts, 0)]);
    let asr = asr_from(&texts[..7]);
    let mut aligns: Vec<WordAlign> = (0..7).map(|i| matched(i, i)).collect();
    aligns.push(deleted(7));

    let (sentences, _) = rollup(&aligns, &book, &asr).expect("rollup");
    // wer = 1/8 = 0.125: above the ok threshold, below attention.
    assert_eq!(sentences[0].status, AlignStatus::Attention);
    assert_eq!(sentences[0].metrics.missing_runs, 1);
}

#[test]
fn substitutions_affect_span_wer_but_not_wer() {
    let texts: Vec<&str> = vec!["w0", "w1", "w2", "w3", "w4", "w5", "w6", "w7"];
    let book = book_from(&[(&texts, 0)]);
    let asr = asr_from(&["w0", "w1", "w2", "w3", "w4", "w5", "w6", "x"]);
    let mut aligns: Vec<WordAlign> = (0..7).map(|i| matched(i, i)).collect();
    aligns.push(substituted(7, 7));

    let (sentences, _) = rollup(&aligns, &book, &asr).expect("rollup");
    let metrics = &sentences[0].metrics;
    assert_eq!(metrics.wer, 0.0);
    assert!((metrics.span_wer - 0.125).abs() < 1e-12);
    assert!(metrics.cer > 0.0);
    assert_eq!(sentences[0].status, AlignStatus::Ok);
}

#[test]
fn scattered_missing_runs_demote_ok_sentence() {
    // 30 tokens, deletions at 5, 15 and 25: wer = 0.1 stays within the ok
    // threshold, but three separate missed spans demote to attention.
    let texts: Vec<String> = (0..30).map(|i| format!("w{i}")).collect();
    let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
    let book = book_from(&[(&refs, 0)]);

    let deleted_positions = [5usize, 15, 25];
    let mut asr_texts = Vec::new();
    let mut aligns = Vec::new();
    let mut asr_idx = 0;
    for book_idx in 0..30 {
        if deleted_positions.contains(&book_idx) {
            aligns.push(deleted(book_idx));
        } else {
            asr_texts.push(refs[book_idx]);
            aligns.push(matched(book_idx, asr_idx));
            asr_idx += 1;
        }
    }
    let asr = asr_from(&asr_texts);

    let (sentences, paragraphs) = rollup(&aligns, &book, &asr).expect("rollup");
    let metrics = &sentences[0].metrics;
    assert!((metrics.wer - 0.1).abs() < 1e-12);
    assert_eq!(metrics.missing_runs, 3);
    assert_eq!(sentences[0].status, AlignStatus::Attention);
    // Paragraph status ignores the missing-runs condition.
    assert_eq!(paragraphs[0].status, AlignStatus::Ok);
}

#[test]
fn insertions_inside_span_count_as_extra_runs() {
    let book = book_from(&[(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"], 0)]);
    let asr = asr_from(&[
        "a", "b", "um", "c", "d", "e", "f", "g", "h", "i", "j",
    ]);
    let mut aligns = vec![matched(0, 0), matched(1, 1), inserted(2)];
    aligns.extend((2..10).map(|i| matched(i, i + 1)));

    let (sentences, _) = rollup(&aligns, &book, &asr).expect("rollup");
    let metrics = &sentences[0].metrics;
    assert_eq!(metrics.extra_runs, 1);
    assert!((metrics.wer - 0.1).abs() < 1e-12);
    assert_eq!(sentences[0].asr_range, Some((0, 10)));
}

#[test]
fn filler_insertions_do_not_inflate_wer() {
    let book = book_from(&[(&["black", "cat", "sat"], 0)]);
    let asr = asr_from(&["black", "um", "cat", "sat"]);
    let aligns = vec![
        matched(0, 0),
        WordAlign {
            op: AlignOp::Ins { asr: 1 },
            reason: "filler".to_string(),
            score: 0.8,
        },
        matched(1, 2),
        matched(2, 3),
    ];

    let (sentences, _) = rollup(&aligns, &book, &asr).expect("rollup");
    let metrics = &sentences[0].metrics;
    assert_eq!(metrics.wer, 0.0);
    assert_eq!(metrics.extra_runs, 0);
    assert_eq!(sentences[0].status, AlignStatus::Ok);
}

#[test]
fn paragraph_groups_its_sentences() {
    let book = book_from(&[
        (&["first", "sentence"], 0),
        (&["second", "sentence"], 0),
        (&["third", "sentence"], 1),
    ]);
    let asr = asr_from(&[
        "first", "sentence", "second", "sentence", "third", "sentence",
    ]);
    let aligns: Vec<WordAlign> = (0..6).map(|i| matched(i, i)).collect();

    let (_, paragraphs) = rollup(&aligns, &book, &asr).expect("rollup");
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[0].sentences, vec![0, 1]);
    assert_eq!(paragraphs[1].sentences, vec![2]);
}

#[test]
fn empty_inputs_roll_up_to_nothing() {
    let (sentences, paragraphs) = rollup(&[], &[], &[]).expect("rollup");
    assert!(sentences.is_empty());
    assert!(paragraphs.is_empty());
}

#[test]
fn unknown_book_index_is_structural_error() {
    let book = book_from(&[(&["only"], 0)]);
    let asr = asr_from(&["only"]);
    let result = rollup(&[matched(9, 0)], &book, &asr);
    assert!(result.is_err());
}

#[test]
fn out_of_range_asr_index_is_structural_error() {
    let book = book_from(&[(&["only"], 0)]);
    let asr = asr_from(&["only"]);
    let result = rollup(&[matched(0, 5)], &book, &asr);
    assert!(result.is_err());
}

#[test]
fn decreasing_sentence_index_is_structural_error() {
    let book = vec![
        BookWord {
            text: "a".to_string(),
            idx: 0,
            sentence: 1,
            paragraph: 0,
        },
        BookWord {
            text: "b".to_string(),
            idx: 1,
            sentence: 0,
            paragraph: 0,
        },
    ];
    let asr = asr_from(&["a", "b"]);
    let result = rollup(&[matched(0, 0), matched(1, 1)], &book, &asr);
    assert!(result.is_err());
}
