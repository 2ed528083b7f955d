//! Per-session question order: view position (what the student sees) to canonical
//! index (what answers and scoring are keyed by).

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum OrderError {
    #[error("index {index} is out of range for {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A bijection from view position to canonical index, fixed for the session.
///
/// There is no uninitialized state: a session only gets an order once the question
/// count is known, so nothing can map positions before the shuffle has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionOrder {
    canonical: Vec<usize>,
}

impl QuestionOrder {
    /// Fisher-Yates shuffle of `0..total`.
    pub(crate) fn shuffled<R: Rng + ?Sized>(total: usize, rng: &mut R) -> Self {
        let mut canonical: Vec<usize> = (0..total).collect();
        canonical.shuffle(rng);
        Self { canonical }
    }

    /// Fixed order for tests; `None` unless `canonical` is a permutation of `0..len`.
    #[cfg(test)]
    pub(crate) fn from_permutation(canonical: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; canonical.len()];
        for &index in &canonical {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return None,
            }
        }
        Some(Self { canonical })
    }

    pub(crate) fn len(&self) -> usize {
        self.canonical.len()
    }

    pub(crate) fn to_canonical(&self, view_position: usize) -> Result<usize, OrderError> {
        self.canonical
            .get(view_position)
            .copied()
            .ok_or(OrderError::IndexOutOfRange { index: view_position, len: self.len() })
    }

    /// Canonical indices in display order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.canonical.iter().copied()
    }

    /// Inverse of [`QuestionOrder::to_canonical`]; a linear scan.
    #[cfg(test)]
    pub(crate) fn to_view(&self, canonical_index: usize) -> Result<usize, OrderError> {
        self.canonical
            .iter()
            .position(|&index| index == canonical_index)
            .ok_or(OrderError::IndexOutOfRange { index: canonical_index, len: self.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shuffled_order_is_a_bijection() {
        let mut rng = StdRng::seed_from_u64(42);
        for total in 1..=40 {
            let order = QuestionOrder::shuffled(total, &mut rng);
            let mut seen: Vec<usize> =
                (0..total).map(|view| order.to_canonical(view).expect("in range")).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..total).collect::<Vec<_>>(), "total = {total}");
        }
    }

    #[test]
    fn to_view_inverts_to_canonical() {
        let mut rng = StdRng::seed_from_u64(7);
        let order = QuestionOrder::shuffled(25, &mut rng);
        for view in 0..25 {
            let canonical = order.to_canonical(view).expect("canonical");
            assert_eq!(order.to_view(canonical).expect("view"), view);
        }
    }

    #[test]
    fn same_seed_gives_same_order() {
        let a = QuestionOrder::shuffled(30, &mut StdRng::seed_from_u64(99));
        let b = QuestionOrder::shuffled(30, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_positions_fail() {
        let order = QuestionOrder::from_permutation(vec![2, 0, 3, 1]).expect("order");
        assert_eq!(order.to_canonical(4), Err(OrderError::IndexOutOfRange { index: 4, len: 4 }));
        assert_eq!(order.to_view(9), Err(OrderError::IndexOutOfRange { index: 9, len: 4 }));
    }

    #[test]
    fn from_permutation_rejects_duplicates_and_gaps() {
        assert!(QuestionOrder::from_permutation(vec![0, 0, 1]).is_none());
        assert!(QuestionOrder::from_permutation(vec![0, 3, 1]).is_none());
        assert_eq!(QuestionOrder::from_permutation(vec![]).expect("empty order").len(), 0);
    }
}
