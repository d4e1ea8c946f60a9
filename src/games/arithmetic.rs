use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;

use crate::problem::{generate_distinct, ProblemSource, MAX_ATTEMPTS};
use crate::profile::{Difficulty, DifficultyProfile};

const CHOICE_COUNT: usize = 4;
const MAX_FACTOR: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn for_difficulty(difficulty: Difficulty) -> &'static [Operator] {
        match difficulty {
            Difficulty::Easy => &[Operator::Add, Operator::Sub],
            Difficulty::Medium => &[Operator::Add, Operator::Sub, Operator::Mul],
            Difficulty::Hard => &[Operator::Add, Operator::Sub, Operator::Mul, Operator::Div],
        }
    }

    fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '−',
            Operator::Mul => '×',
            Operator::Div => '÷',
        }
    }
}

/// The part of a challenge that must not repeat between rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
}

impl Expression {
    pub fn evaluate(&self) -> i64 {
        match self.op {
            Operator::Add => self.lhs + self.rhs,
            Operator::Sub => self.lhs - self.rhs,
            Operator::Mul => self.lhs * self.rhs,
            Operator::Div => self.lhs / self.rhs,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticChallenge {
    pub expression: Expression,
    pub answer: i64,
    /// shuffled; contains `answer` exactly once
    pub choices: Vec<i64>,
}

impl fmt::Display for ArithmeticChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ?", self.expression)
    }
}

/// Mental arithmetic: `a op b = ?` with integer answers
pub struct ArithmeticSource {
    rng: StdRng,
    previous: Option<Expression>,
}

impl ArithmeticSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            previous: None,
        }
    }

    fn random_expression(rng: &mut StdRng, operators: &[Operator], max_operand: i64) -> Expression {
        let op = *operators.choose(rng).unwrap_or(&Operator::Add);
        let factor_max = max_operand.min(i64::from(MAX_FACTOR)).max(1);
        match op {
            Operator::Add => Expression {
                lhs: rng.gen_range(0..=max_operand),
                op,
                rhs: rng.gen_range(0..=max_operand),
            },
            Operator::Sub => {
                // never negative
                let a = rng.gen_range(0..=max_operand);
                let b = rng.gen_range(0..=max_operand);
                Expression {
                    lhs: a.max(b),
                    op,
                    rhs: a.min(b),
                }
            }
            Operator::Mul => Expression {
                lhs: rng.gen_range(0..=factor_max),
                op,
                rhs: rng.gen_range(0..=factor_max),
            },
            Operator::Div => {
                // always exact: build the dividend from the quotient
                let divisor = rng.gen_range(1..=factor_max);
                let quotient = rng.gen_range(0..=factor_max);
                Expression {
                    lhs: divisor * quotient,
                    op,
                    rhs: divisor,
                }
            }
        }
    }
}

impl Default for ArithmeticSource {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` distinct non-negative options including `answer`, shuffled.
/// Random offsets are tried a bounded number of times before filling the
/// remaining slots with the nearest unused values.
pub fn multiple_choice<R: Rng>(rng: &mut R, answer: i64, count: usize) -> Vec<i64> {
    let spread = (answer.abs() / 4).max(3);
    let mut choices = vec![answer];

    for _ in 0..MAX_ATTEMPTS {
        if choices.len() >= count {
            break;
        }
        let offset = rng.gen_range(-spread..=spread);
        let candidate = answer + offset;
        if offset != 0 && candidate >= 0 && !choices.contains(&candidate) {
            choices.push(candidate);
        }
    }

    let mut step = 1;
    while choices.len() < count {
        for candidate in [answer + step, answer - step] {
            if choices.len() < count && candidate >= 0 && !choices.contains(&candidate) {
                choices.push(candidate);
            }
        }
        step += 1;
    }

    choices.shuffle(rng);
    choices
}

impl ProblemSource for ArithmeticSource {
    type Challenge = ArithmeticChallenge;
    type Answer = i64;

    fn game_id(&self) -> &'static str {
        "arithmetic"
    }

    fn next(&mut self, profile: &DifficultyProfile) -> ArithmeticChallenge {
        let operators = Operator::for_difficulty(profile.difficulty);
        let max_operand = i64::from(profile.content.max_operand);
        let rng = &mut self.rng;

        let expression = generate_distinct(
            self.previous.as_ref(),
            || Self::random_expression(rng, operators, max_operand),
            |e| Expression {
                lhs: e.lhs + 1,
                op: Operator::Add,
                rhs: e.rhs,
            },
        );
        self.previous = Some(expression);

        let answer = expression.evaluate();
        ArithmeticChallenge {
            expression,
            answer,
            choices: multiple_choice(&mut self.rng, answer, CHOICE_COUNT),
        }
    }

    fn validate(&self, challenge: &ArithmeticChallenge, answer: &i64) -> bool {
        challenge.answer == *answer
    }

    fn parse_answer(&self, input: &str) -> Option<i64> {
        input.trim().parse().ok()
    }

    fn reveal(&self, challenge: &ArithmeticChallenge) -> String {
        challenge.answer.to_string()
    }

    fn hint(&self, challenge: &ArithmeticChallenge, level: u32) -> Option<String> {
        match level {
            0 => Some(format!(
                "one of {}",
                challenge.choices.iter().join(", ")
            )),
            1 => {
                let decoy = challenge
                    .choices
                    .iter()
                    .find(|&&c| c != challenge.answer)?;
                let pair = if self.answer_first(challenge) {
                    (challenge.answer, *decoy)
                } else {
                    (*decoy, challenge.answer)
                };
                Some(format!("either {} or {}", pair.0, pair.1))
            }
            _ => None,
        }
    }
}

impl ArithmeticSource {
    // deterministic per challenge so repeated hints read the same
    fn answer_first(&self, challenge: &ArithmeticChallenge) -> bool {
        (challenge.expression.lhs + challenge.expression.rhs) % 2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn profile(difficulty: Difficulty) -> DifficultyProfile {
        DifficultyProfile::preset(difficulty).with_time_budget(Duration::from_secs(5))
    }

    #[test]
    fn answers_match_expressions() {
        let mut source = ArithmeticSource::seeded(7);
        let profile = profile(Difficulty::Hard);
        for _ in 0..200 {
            let challenge = source.next(&profile);
            assert_eq!(challenge.answer, challenge.expression.evaluate());
            assert!(source.validate(&challenge, &challenge.answer));
            assert!(!source.validate(&challenge, &(challenge.answer + 1)));
        }
    }

    #[test]
    fn subtraction_never_negative_and_division_exact() {
        let mut source = ArithmeticSource::seeded(11);
        let profile = profile(Difficulty::Hard);
        for _ in 0..500 {
            let challenge = source.next(&profile);
            let e = challenge.expression;
            match e.op {
                Operator::Sub => assert!(e.lhs >= e.rhs),
                Operator::Div => {
                    assert!(e.rhs > 0);
                    assert_eq!(e.lhs % e.rhs, 0);
                }
                _ => {}
            }
            assert!(challenge.answer >= 0);
        }
    }

    #[test]
    fn easy_only_adds_and_subtracts() {
        let mut source = ArithmeticSource::seeded(3);
        let profile = profile(Difficulty::Easy);
        for _ in 0..200 {
            let op = source.next(&profile).expression.op;
            assert!(matches!(op, Operator::Add | Operator::Sub));
        }
    }

    #[test]
    fn operands_respect_max_operand() {
        let mut source = ArithmeticSource::seeded(5);
        let profile = profile(Difficulty::Medium);
        let max = i64::from(profile.content.max_operand);
        for _ in 0..200 {
            let e = source.next(&profile).expression;
            assert!(e.lhs <= max && e.rhs <= max);
        }
    }

    #[test]
    fn never_repeats_previous_expression() {
        let mut source = ArithmeticSource::seeded(42);
        // tiny range makes repeats likely without the guard
        let mut profile = profile(Difficulty::Easy);
        profile.content.max_operand = 1;
        let mut previous = source.next(&profile).expression;
        for _ in 0..300 {
            let current = source.next(&profile).expression;
            assert_ne!(current, previous);
            previous = current;
        }
    }

    #[test]
    fn choices_are_distinct_and_contain_answer() {
        let mut source = ArithmeticSource::seeded(9);
        let profile = profile(Difficulty::Medium);
        for _ in 0..200 {
            let challenge = source.next(&profile);
            assert_eq!(challenge.choices.len(), CHOICE_COUNT);
            assert_eq!(
                challenge.choices.iter().filter(|&&c| c == challenge.answer).count(),
                1
            );
            assert!(challenge.choices.iter().all_unique());
            assert!(challenge.choices.iter().all(|&c| c >= 0));
        }
    }

    #[test]
    fn multiple_choice_terminates_for_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        let choices = multiple_choice(&mut rng, 0, 6);
        assert_eq!(choices.len(), 6);
        assert!(choices.contains(&0));
        assert!(choices.iter().all_unique());
    }

    #[test]
    fn parse_answer_trims_and_rejects_garbage() {
        let source = ArithmeticSource::seeded(1);
        assert_eq!(source.parse_answer(" 42 \n"), Some(42));
        assert_eq!(source.parse_answer("-3"), Some(-3));
        assert_eq!(source.parse_answer("forty"), None);
        assert_eq!(source.parse_answer(""), None);
    }

    #[test]
    fn hints_narrow_down_then_run_out() {
        let mut source = ArithmeticSource::seeded(2);
        let challenge = source.next(&profile(Difficulty::Easy));

        let first = source.hint(&challenge, 0).unwrap();
        assert!(first.contains(&challenge.answer.to_string()));

        let second = source.hint(&challenge, 1).unwrap();
        assert!(second.starts_with("either"));
        assert!(second.contains(&challenge.answer.to_string()));

        assert_eq!(source.hint(&challenge, 2), None);
    }

    #[test]
    fn display_shows_question() {
        let challenge = ArithmeticChallenge {
            expression: Expression {
                lhs: 6,
                op: Operator::Mul,
                rhs: 7,
            },
            answer: 42,
            choices: vec![42, 40, 44, 48],
        };
        assert_eq!(challenge.to_string(), "6 × 7 = ?");
    }
}
