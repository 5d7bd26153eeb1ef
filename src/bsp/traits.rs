//! Traits for scoring candidate split planes

/// What a candidate split plane does to the brushes of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateMetrics {
    /// Brushes entirely in front.
    pub front: usize,
    /// Brushes entirely behind.
    pub back: usize,
    /// Brushes owning a side on the plane.
    pub facing: usize,
    /// Visible side windings the plane would cut.
    pub splits: usize,
    /// Brushes that would leave a sliver thinner than one unit.
    pub epsilon_brushes: usize,
    pub axial: bool,
    /// A hint side would be cut by a plane that is not itself a hint.
    pub hint_split: bool,
}

/// Trait for ranking split planes. Higher scores win.
pub trait SplittingStrategy {
    fn score(&self, metrics: &CandidateMetrics) -> i64;
}

/// Default strategy: reward facing brushes and balance, punish splits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancedSplittingStrategy {
    pub facing_weight: i64,
    pub split_weight: i64,
    pub balance_weight: i64,
    pub axial_bonus: i64,
    pub epsilon_brush_penalty: i64,
}

impl Default for BalancedSplittingStrategy {
    fn default() -> Self {
        Self {
            facing_weight: 5,
            split_weight: 5,
            balance_weight: 1,
            axial_bonus: 5,
            epsilon_brush_penalty: 1000,
        }
    }
}

/// Score given to a plane that would cut a hint side.
pub const HINT_SPLIT_SCORE: i64 = -9_999_999;

impl SplittingStrategy for BalancedSplittingStrategy {
    fn score(&self, m: &CandidateMetrics) -> i64 {
        if m.hint_split {
            return HINT_SPLIT_SCORE;
        }
        let imbalance = (m.front as i64 - m.back as i64).abs();
        let mut score = self.facing_weight * m.facing as i64
            - self.split_weight * m.splits as i64
            - self.balance_weight * imbalance
            - self.epsilon_brush_penalty * m.epsilon_brushes as i64;
        if m.axial {
            score += self.axial_bonus;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_beats_splitting() {
        let strategy = BalancedSplittingStrategy::default();
        let facing = CandidateMetrics {
            front: 2,
            back: 2,
            facing: 2,
            axial: true,
            ..Default::default()
        };
        let splitting = CandidateMetrics {
            front: 2,
            back: 2,
            splits: 3,
            axial: true,
            ..Default::default()
        };
        assert!(strategy.score(&facing) > strategy.score(&splitting));
        assert_eq!(strategy.score(&facing), 15);
    }

    #[test]
    fn hint_split_is_vetoed() {
        let m = CandidateMetrics {
            facing: 100,
            hint_split: true,
            ..Default::default()
        };
        assert_eq!(BalancedSplittingStrategy::default().score(&m), HINT_SPLIT_SCORE);
    }
}
