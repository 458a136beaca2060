use super::{AssemblyOptions, Candidate};

/// Scores closer than this count as tied; the candidate found first is kept.
const TIE_EPSILON: f64 = 1e-9;

/// Small reward for alignments that start early in the reference.
///
/// Full bonus up to `bonus_free_offsets`, then a linear decay to zero over
/// `bonus_decay_offsets` further offsets.
pub(super) fn position_bonus(offset: usize, options: &AssemblyOptions) -> f64 {
    if options.position_bonus <= 0.0 {
        return 0.0;
    }
    if offset <= options.bonus_free_offsets {
        return options.position_bonus;
    }
    if options.bonus_decay_offsets == 0 {
        return 0.0;
    }
    let past = (offset - options.bonus_free_offsets) as f64;
    let remaining = 1.0 - past / options.bonus_decay_offsets as f64;
    options.position_bonus * remaining.max(0.0)
}

/// Keeps the best eligible candidate and, separately, the best one whose span
/// was already claimed.
#[derive(Debug, Default)]
pub(super) struct CandidateSelector {
    best: Option<Candidate>,
    best_blocked: Option<Candidate>,
}

impl CandidateSelector {
    pub(super) fn offer(&mut self, candidate: Candidate, blocked: bool) -> bool {
        let slot = if blocked {
            &mut self.best_blocked
        } else {
            &mut self.best
        };
        let should_replace = match slot {
            None => true,
            Some(current) => candidate.ranking_score > current.ranking_score + TIE_EPSILON,
        };
        if should_replace {
            *slot = Some(candidate);
        }
        should_replace
    }

    pub(super) fn finish(self) -> (Option<Candidate>, Option<Candidate>) {
        (self.best, self.best_blocked)
    }
}
