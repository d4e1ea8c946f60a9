use std::time::Duration;

use crate::profile::ScoringRules;

/// Bonus for answering quickly: the full `max_bonus` with the whole budget left,
/// falling linearly to zero as the clock runs out
pub fn time_bonus(remaining: Duration, budget: Duration, max_bonus: u32) -> u64 {
    let budget_ms = budget.as_millis();
    if budget_ms == 0 || max_bonus == 0 {
        return 0;
    }
    let remaining_ms = remaining.as_millis().min(budget_ms);
    (u128::from(max_bonus) * remaining_ms / budget_ms) as u64
}

/// Zero below the threshold, then one step per completed threshold, capped
pub fn streak_bonus(streak: u32, rules: &ScoringRules) -> u64 {
    if rules.streak_threshold == 0 || streak < rules.streak_threshold {
        return 0;
    }
    let steps = u64::from(streak / rules.streak_threshold);
    (steps * u64::from(rules.streak_bonus_step)).min(u64::from(rules.streak_bonus_cap))
}

/// Points for a correct answer given the streak *including* this answer
pub fn correct_points(
    rules: &ScoringRules,
    remaining: Duration,
    budget: Duration,
    streak: u32,
) -> u64 {
    u64::from(rules.base) + time_bonus(remaining, budget, rules.time_bonus) + streak_bonus(streak, rules)
}

/// Score never drops below zero
pub fn apply_penalty(score: u64, penalty: u32) -> u64 {
    score.saturating_sub(u64::from(penalty))
}
