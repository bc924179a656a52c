use rand::Rng;
use rand::seq::SliceRandom;

use crate::cue::CueDirection;
use crate::error::CoreError;

pub const DEFAULT_RUN_WIDTH: usize = 4;

/// Shuffled run holding `width / 2` trues and as many falses.
pub fn random_binomials<R: Rng + ?Sized>(
    width: usize,
    rng: &mut R,
) -> Result<Vec<bool>, CoreError> {
    if width == 0 || width % 2 != 0 {
        return Err(CoreError::InvalidRunWidth(width));
    }
    Ok(balanced_run(width, rng))
}

fn balanced_run<R: Rng + ?Sized>(width: usize, rng: &mut R) -> Vec<bool> {
    let mut run: Vec<bool> = (0..width).map(|i| i % 2 == 0).collect();
    run.shuffle(rng);
    run
}

/// Endless stream of cue sides, balanced within every run of `width`.
#[derive(Debug, Clone)]
pub struct DirectionCycle {
    width: usize,
    run: Vec<bool>,
    index: usize,
}

impl DirectionCycle {
    pub fn new(width: usize) -> Result<Self, CoreError> {
        if width == 0 || width % 2 != 0 {
            return Err(CoreError::InvalidRunWidth(width));
        }
        Ok(Self {
            width,
            run: Vec::new(),
            index: 0,
        })
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> CueDirection {
        if self.index >= self.run.len() {
            self.run = balanced_run(self.width, rng);
            self.index = 0;
        }
        let left = self.run[self.index];
        self.index += 1;
        CueDirection::from(left)
    }
}

impl Default for DirectionCycle {
    fn default() -> Self {
        Self {
            width: DEFAULT_RUN_WIDTH,
            run: Vec::new(),
            index: 0,
        }
    }
}

/// Visits every index in `0..len` once per pass, reshuffled each pass.
///
/// Hosts use it to pick animations and alarm sounds without repeats.
#[derive(Debug, Clone)]
pub struct PermutationCycle {
    order: Vec<usize>,
    index: usize,
}

impl PermutationCycle {
    pub fn new<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Result<Self, CoreError> {
        if len == 0 {
            return Err(CoreError::EmptyCycle);
        }
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(rng);
        Ok(Self { order, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.index >= self.order.len() {
            self.order.shuffle(rng);
            self.index = 0;
        }
        let value = self.order[self.index];
        self.index += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn binomials_are_balanced() {
        let mut rng = StdRng::seed_from_u64(7);
        for width in [2, 4, 8, 64] {
            let run = random_binomials(width, &mut rng).unwrap();
            assert_eq!(run.len(), width);
            assert_eq!(run.iter().filter(|b| **b).count(), width / 2);
        }
    }

    #[test]
    fn binomials_reject_odd_and_zero_widths() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(random_binomials(0, &mut rng), Err(CoreError::InvalidRunWidth(0)));
        assert_eq!(random_binomials(1, &mut rng), Err(CoreError::InvalidRunWidth(1)));
        assert_eq!(random_binomials(11, &mut rng), Err(CoreError::InvalidRunWidth(11)));
        assert!(DirectionCycle::new(3).is_err());
    }

    #[test]
    fn directions_balance_every_run_of_four() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut cycle = DirectionCycle::default();
        for _ in 0..50 {
            let lefts = (0..4)
                .filter(|_| cycle.next(&mut rng) == CueDirection::Left)
                .count();
            assert_eq!(lefts, 2);
        }
    }

    #[test]
    fn permutation_visits_each_index_once_per_pass() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cycle = PermutationCycle::new(5, &mut rng).unwrap();
        for _ in 0..4 {
            let mut pass: Vec<usize> = (0..5).map(|_| cycle.next(&mut rng)).collect();
            pass.sort_unstable();
            assert_eq!(pass, vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(
            PermutationCycle::new(0, &mut rng).unwrap_err(),
            CoreError::EmptyCycle
        );
    }
}
