//! Ghost key detection.
//!
//! In a diode-less matrix three pressed keys sharing rows and columns
//! conduct a path that makes a fourth, unpressed key read as active. The
//! predicate here marks every key whose raw reading is ambiguous in the
//! current sample so the filter can hold it at its confirmed state.

use crate::driver::RowMask;
use crate::mask::KeyMask;

/// Predicate producing, per column, the keys whose raw reading must not
/// be trusted for this sample. Keys wired in the [`KeyMask`] are exempt.
pub type GhostPredicate = fn(&[RowMask], &KeyMask) -> Vec<RowMask>;

/// Default predicate: pairwise column overlap.
///
/// Whenever two columns share two or more active rows, the intersecting
/// keys of both columns form a 2x2 short ambiguity; every one of them
/// that is not marked wired is frozen for this sample. Wired keys stay
/// confirmable, which is what disambiguates ghosting on irregular
/// matrices.
pub fn pairwise_overlap(sample: &[RowMask], mask: &KeyMask) -> Vec<RowMask> {
    let mut frozen = vec![RowMask::EMPTY; sample.len()];

    for c1 in 0..sample.len() {
        if sample[c1].is_empty() {
            continue;
        }
        for c2 in c1 + 1..sample.len() {
            let common = sample[c1] & sample[c2];
            if common.count() < 2 {
                continue;
            }
            frozen[c1] |= common & !mask.column(c1 as u8);
            frozen[c2] |= common & !mask.column(c2 as u8);
        }
    }

    frozen
}
