use crate::error::AlignmentError;
use crate::types::{Anchor, Window};

/// Partition the non-anchor token space into ordered, non-overlapping
/// windows. Bounds are inclusive filtered indices; synthetic sentinel
/// anchors one step outside each bound make the first and last gaps fall
/// out of the same loop. A window is emitted only if it has positive span
/// on at least one side.
pub fn build_windows(
    anchors: &[Anchor],
    book_start: usize,
    book_end: usize,
    asr_start: usize,
    asr_end: usize,
) -> Result<Vec<Window>, AlignmentError> {
    if book_start > book_end || asr_start > asr_end {
        return Err(AlignmentError::structural(
            "build windows",
            format!("empty bounds: book {book_start}..={book_end}, asr {asr_start}..={asr_end}"),
        ));
    }
    for anchor in anchors {
        if anchor.book_pos < book_start
            || anchor.book_pos > book_end
            || anchor.asr_pos < asr_start
            || anchor.asr_pos > asr_end
        {
            return Err(AlignmentError::structural(
                "build windows",
                format!(
                    "anchor ({}, {}) outside bounds book {book_start}..={book_end}, asr {asr_start}..={asr_end}",
                    anchor.book_pos, anchor.asr_pos
                ),
            ));
        }
    }
    if let Some(pair) = anchors
        .windows(2)
        .find(|p| p[0].book_pos >= p[1].book_pos || p[0].asr_pos >= p[1].asr_pos)
    {
        return Err(AlignmentError::structural(
            "build windows",
            format!(
                "anchors not strictly monotonic: ({}, {}) then ({}, {})",
                pair[0].book_pos, pair[0].asr_pos, pair[1].book_pos, pair[1].asr_pos
            ),
        ));
    }

    let book_start = book_start as isize;
    let book_end = book_end as isize;
    let asr_start = asr_start as isize;
    let asr_end = asr_end as isize;

    let mut bounded: Vec<(isize, isize)> = Vec::with_capacity(anchors.len() + 2);
    bounded.push((book_start - 1, asr_start - 1));
    bounded.extend(
        anchors
            .iter()
            .map(|a| (a.book_pos as isize, a.asr_pos as isize)),
    );
    bounded.push((book_end + 1, asr_end + 1));

    let mut windows = Vec::new();
    for pair in bounded.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let b_lo = (left.0 + 1).max(book_start);
        let b_hi = right.0.min(book_end + 1);
        let a_lo = (left.1 + 1).max(asr_start);
        let a_hi = right.1.min(asr_end + 1);
        if b_hi > b_lo || a_hi > a_lo {
            windows.push(Window {
                b_lo: b_lo as usize,
                b_hi: b_hi as usize,
                a_lo: a_lo as usize,
                a_hi: a_hi as usize,
            });
        }
    }

    tracing::debug!(
        windows = windows.len(),
        anchors = anchors.len(),
        "window partition built"
    );
    Ok(windows)
}
