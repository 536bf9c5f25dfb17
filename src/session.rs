use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info};

use crate::answer::parse_answer;
use crate::config::Settings;
use crate::error::{ConfigurationError, ParseError};
use crate::problem::{generate_problem, Problem};
use crate::runtime::{Clock, SystemClock};
use crate::scorer::{is_correct, round2};

/// Where the controller is in the lifecycle of one problem.
///
/// Scoring happens inside `submit_answer` and immediately returns the
/// controller to `Idle`; the result stays readable via `last_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Revealing,
    AwaitingAnswer,
}

/// Outcome of a single `reveal_next` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    /// Operand to display now, if this call revealed one
    pub value: Option<u128>,
    /// True once every operand has been revealed
    pub done: bool,
}

/// What the player sees after submitting an answer
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub correct: bool,
    pub submitted: f64,
    pub expected: f64,
    /// `expected` as the player should have typed it
    pub expected_text: String,
    pub elapsed_secs: f64,
    pub expression: String,
}

/// Running tally for the lifetime of the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub correct: u32,
    pub total: u32,
}

impl Statistics {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Percentage of correct answers rounded to one decimal, `None` before
    /// the first answer
    pub fn accuracy_percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let pct = 100.0 * f64::from(self.correct) / f64::from(self.total);
        Some((pct * 10.0).round_ties_even() / 10.0)
    }
}

/// Owns all mutable state for one player's session
#[derive(Debug)]
pub struct SessionController<C: Clock = SystemClock> {
    settings: Settings,
    clock: C,
    rng: StdRng,
    phase: Phase,
    problem: Option<Problem>,
    reveal_index: usize,
    started_at: Option<Instant>,
    last_result: Option<ScoreResult>,
    stats: Statistics,
}

impl SessionController<SystemClock> {
    pub fn new(settings: Settings) -> Result<Self, ConfigurationError> {
        Self::with_parts(settings, SystemClock, StdRng::from_entropy())
    }
}

impl<C: Clock> SessionController<C> {
    pub fn with_parts(
        settings: Settings,
        clock: C,
        rng: StdRng,
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self {
            settings,
            clock,
            rng,
            phase: Phase::Idle,
            problem: None,
            reveal_index: 0,
            started_at: None,
            last_result: None,
            stats: Statistics::default(),
        })
    }

    /// Replace the settings used by the next `start`. An in-flight problem
    /// keeps the operands it was generated with.
    pub fn configure(&mut self, settings: Settings) -> Result<(), ConfigurationError> {
        settings.validate()?;
        debug!(?settings, "settings updated");
        self.settings = settings;
        Ok(())
    }

    /// Generate a fresh problem and begin revealing it, discarding whatever
    /// was in progress.
    pub fn start(&mut self) -> Result<(), ConfigurationError> {
        let problem = generate_problem(&self.settings, &mut self.rng)?;
        debug!(operator = %problem.operator, operands = ?problem.operands, "problem generated");

        self.problem = Some(problem);
        self.reveal_index = 0;
        self.started_at = None;
        self.last_result = None;
        self.phase = Phase::Revealing;
        Ok(())
    }

    /// Reveal the next operand. The call that reveals the last operand also
    /// moves to `AwaitingAnswer` and starts the answer timer.
    pub fn reveal_next(&mut self) -> RevealStep {
        if self.phase != Phase::Revealing {
            return RevealStep {
                value: None,
                done: self.phase == Phase::AwaitingAnswer,
            };
        }

        let Some(problem) = &self.problem else {
            self.phase = Phase::Idle;
            return RevealStep {
                value: None,
                done: false,
            };
        };

        let value = problem.operands.get(self.reveal_index).copied();
        if value.is_some() {
            self.reveal_index += 1;
        }

        let done = self.reveal_index >= problem.len();
        if done {
            self.phase = Phase::AwaitingAnswer;
            self.started_at = Some(self.clock.now());
            debug!(terms = problem.len(), "reveal complete");
        }

        RevealStep { value, done }
    }

    /// Check an answer against the current problem.
    ///
    /// Unparseable text leaves the controller waiting for another try.
    /// Returns `Ok(None)` when no problem is waiting for an answer.
    pub fn submit_answer(&mut self, raw: &str) -> Result<Option<ScoreResult>, ParseError> {
        if self.phase != Phase::AwaitingAnswer {
            return Ok(None);
        }

        let submitted = parse_answer(raw).inspect_err(|err| {
            debug!(%err, "answer rejected");
        })?;

        let Some(problem) = self.problem.take() else {
            self.phase = Phase::Idle;
            return Ok(None);
        };

        let expected = problem.expected();
        let elapsed = self
            .started_at
            .take()
            .map(|t| self.clock.now().saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        let correct = is_correct(submitted, expected);
        self.stats.record(correct);

        let result = ScoreResult {
            correct,
            submitted,
            expected,
            expected_text: problem.expected_text(),
            elapsed_secs: round2(elapsed),
            expression: problem.expression_text(),
        };
        info!(
            correct,
            submitted,
            expected,
            elapsed_secs = result.elapsed_secs,
            total = self.stats.total,
            "answer scored"
        );

        self.reveal_index = 0;
        self.phase = Phase::Idle;
        self.last_result = Some(result.clone());
        Ok(Some(result))
    }

    /// Restart the answer timer from now. Front ends that keep the final
    /// operand on screen call this once it is gone.
    pub fn reset_answer_timer(&mut self) {
        if self.phase == Phase::AwaitingAnswer {
            self.started_at = Some(self.clock.now());
        }
    }

    pub fn answer_started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Drop any in-flight problem and return to `Idle`
    pub fn abort(&mut self) {
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "problem abandoned");
        }
        self.problem = None;
        self.reveal_index = 0;
        self.started_at = None;
        self.phase = Phase::Idle;
    }

    /// Take the last result, so it is no longer reported
    pub fn acknowledge(&mut self) -> Option<ScoreResult> {
        self.last_result.take()
    }

    pub fn last_result(&self) -> Option<&ScoreResult> {
        self.last_result.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn reveal_index(&self) -> usize {
        self.reveal_index
    }

    /// The operand most recently revealed, while the problem is live
    pub fn current_operand(&self) -> Option<u128> {
        let idx = self.reveal_index.checked_sub(1)?;
        self.problem.as_ref()?.operands.get(idx).copied()
    }

    #[cfg(test)]
    fn load_problem(&mut self, problem: Problem) {
        self.problem = Some(problem);
        self.reveal_index = 0;
        self.started_at = None;
        self.last_result = None;
        self.phase = Phase::Revealing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Operator;
    use crate::runtime::ManualClock;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn controller(clock: &ManualClock, settings: Settings) -> SessionController<&ManualClock> {
        SessionController::with_parts(settings, clock, StdRng::seed_from_u64(11)).unwrap()
    }

    fn reveal_all<C: Clock>(c: &mut SessionController<C>) -> Vec<u128> {
        let mut shown = Vec::new();
        loop {
            let step = c.reveal_next();
            shown.extend(step.value);
            if step.done {
                return shown;
            }
        }
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let settings = Settings {
            term_count: 1,
            ..Settings::default()
        };
        assert_matches!(
            SessionController::new(settings),
            Err(ConfigurationError::TermCountOutOfRange { got: 1, .. })
        );
    }

    #[test]
    fn test_configure_keeps_old_settings_on_error() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        let bad = Settings {
            min_digits: 2,
            max_digits: 1,
            ..Settings::default()
        };
        assert_eq!(
            c.configure(bad),
            Err(ConfigurationError::InvertedDigitRange { min: 2, max: 1 })
        );
        assert_eq!(c.settings(), &Settings::default());

        let good = Settings {
            term_count: 5,
            ..Settings::default()
        };
        c.configure(good.clone()).unwrap();
        assert_eq!(c.settings(), &good);
    }

    #[test]
    fn test_start_enters_revealing() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        assert_eq!(c.phase(), Phase::Idle);
        c.start().unwrap();
        assert_eq!(c.phase(), Phase::Revealing);
        assert_eq!(c.reveal_index(), 0);
        assert_eq!(c.problem().map(Problem::len), Some(2));
    }

    #[test]
    fn test_reveal_takes_exactly_term_count_calls() {
        let clock = ManualClock::new();
        let settings = Settings {
            term_count: 5,
            max_digits: 3,
            ..Settings::default()
        };
        let mut c = controller(&clock, settings);
        c.start().unwrap();
        let operands = c.problem().unwrap().operands.clone();

        for (i, &expected) in operands.iter().enumerate() {
            assert_eq!(c.phase(), Phase::Revealing);
            let step = c.reveal_next();
            assert_eq!(step.value, Some(expected));
            assert_eq!(step.done, i == operands.len() - 1);
            assert_eq!(c.current_operand(), Some(expected));
        }
        assert_eq!(c.phase(), Phase::AwaitingAnswer);
        assert_eq!(c.reveal_index(), 5);
    }

    #[test]
    fn test_reveal_past_end_is_noop() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.start().unwrap();
        reveal_all(&mut c);

        let step = c.reveal_next();
        assert_eq!(
            step,
            RevealStep {
                value: None,
                done: true
            }
        );
        assert_eq!(c.phase(), Phase::AwaitingAnswer);
        assert_eq!(c.reveal_index(), 2);
    }

    #[test]
    fn test_reveal_while_idle_is_noop() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        assert_eq!(
            c.reveal_next(),
            RevealStep {
                value: None,
                done: false
            }
        );
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_correct_answer_scores_and_returns_to_idle() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![10, 3], Operator::Sub));
        reveal_all(&mut c);

        clock.advance(Duration::from_millis(2340));
        let result = c.submit_answer("7").unwrap().unwrap();

        assert!(result.correct);
        assert_eq!(result.expected, 7.0);
        assert_eq!(result.submitted, 7.0);
        assert_eq!(result.elapsed_secs, 2.34);
        assert_eq!(result.expression, "10 - 3 = 7");
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.problem().is_none());
        assert_eq!(
            c.statistics(),
            Statistics {
                correct: 1,
                total: 1
            }
        );
    }

    #[test]
    fn test_answer_outside_tolerance_is_wrong() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        // 7.02 as a fold result: 702 ÷ 100
        c.load_problem(Problem::new(vec![702, 100], Operator::Div));
        reveal_all(&mut c);

        let result = c.submit_answer("7").unwrap().unwrap();
        assert!(!result.correct);
        assert!((result.expected - 7.02).abs() < 1e-9);
        assert_eq!(
            c.statistics(),
            Statistics {
                correct: 0,
                total: 1
            }
        );
    }

    #[test]
    fn test_full_width_answer_is_accepted() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![25, 2], Operator::Div));
        reveal_all(&mut c);

        let result = c.submit_answer("１２．５").unwrap().unwrap();
        assert!(result.correct);
    }

    #[test]
    fn test_parse_error_keeps_waiting() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![4, 5], Operator::Add));
        reveal_all(&mut c);

        assert_eq!(c.submit_answer("abc"), Err(ParseError::new("abc")));
        assert_eq!(c.phase(), Phase::AwaitingAnswer);
        assert_eq!(c.statistics(), Statistics::default());
        assert!(c.last_result().is_none());

        let result = c.submit_answer("9").unwrap().unwrap();
        assert!(result.correct);
    }

    #[test]
    fn test_submit_outside_answer_phase_is_ignored() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        assert_eq!(c.submit_answer("1"), Ok(None));

        c.start().unwrap();
        assert_eq!(c.submit_answer("1"), Ok(None));
        assert_eq!(c.phase(), Phase::Revealing);
        assert_eq!(c.statistics().total, 0);
    }

    #[test]
    fn test_elapsed_starts_when_reveal_completes() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![1, 1], Operator::Add));

        c.reveal_next();
        clock.advance(Duration::from_secs(5));
        c.reveal_next();
        clock.advance(Duration::from_millis(1250));

        let result = c.submit_answer("2").unwrap().unwrap();
        assert_eq!(result.elapsed_secs, 1.25);
    }

    #[test]
    fn test_reset_answer_timer_excludes_final_display() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());

        // ignored outside AwaitingAnswer
        c.reset_answer_timer();
        assert_eq!(c.answer_started_at(), None);

        c.load_problem(Problem::new(vec![1, 1], Operator::Add));
        reveal_all(&mut c);
        clock.advance(Duration::from_secs(1));
        c.reset_answer_timer();
        assert_eq!(c.answer_started_at(), Some(clock.now()));
        clock.advance(Duration::from_millis(500));

        let result = c.submit_answer("2").unwrap().unwrap();
        assert_eq!(result.elapsed_secs, 0.5);
    }

    #[test]
    fn test_large_product_scored_exactly() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![725, 579, 817, 795, 821, 516, 336], Operator::Mul));
        reveal_all(&mut c);

        let result = c.submit_answer("38809486064522376000").unwrap().unwrap();
        assert!(result.correct);
        assert_eq!(result.expected_text, "38809486064522376000");
        assert!(result.expression.ends_with("= 38809486064522376000"));
    }

    #[test]
    fn test_division_by_zero_is_always_wrong() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![4, 0, 2], Operator::Div));
        reveal_all(&mut c);

        let result = c.submit_answer("0").unwrap().unwrap();
        assert!(!result.correct);
        assert_eq!(result.expected, f64::INFINITY);
        assert_eq!(result.expression, "4 ÷ 0 ÷ 2 = inf");
    }

    #[test]
    fn test_result_survives_until_next_start() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![2, 3], Operator::Mul));
        reveal_all(&mut c);
        c.submit_answer("6").unwrap();

        assert!(c.last_result().is_some_and(|r| r.correct));
        assert!(c.last_result().is_some());

        c.start().unwrap();
        assert!(c.last_result().is_none());
    }

    #[test]
    fn test_acknowledge_takes_result() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![2, 3], Operator::Add));
        reveal_all(&mut c);
        c.submit_answer("5").unwrap();

        assert_matches!(c.acknowledge(), Some(ScoreResult { correct: true, .. }));
        assert!(c.acknowledge().is_none());
    }

    #[test]
    fn test_abort_discards_problem_but_keeps_stats() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        c.load_problem(Problem::new(vec![2, 3], Operator::Add));
        reveal_all(&mut c);
        c.submit_answer("5").unwrap();

        c.start().unwrap();
        c.reveal_next();
        c.abort();

        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.problem().is_none());
        assert_eq!(c.current_operand(), None);
        assert_eq!(c.statistics().total, 1);
    }

    #[test]
    fn test_statistics_accuracy() {
        let mut stats = Statistics::default();
        assert_eq!(stats.accuracy_percent(), None);

        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.correct, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.accuracy_percent(), Some(66.7));

        // 6.25% rounds half to even
        let mut stats = Statistics {
            correct: 1,
            total: 16,
        };
        assert_eq!(stats.accuracy_percent(), Some(6.2));

        stats.record(true);
        assert_eq!(stats.accuracy_percent(), Some(75.0));
    }

    #[test]
    fn test_statistics_are_monotonic_across_problems() {
        let clock = ManualClock::new();
        let mut c = controller(&clock, Settings::default());
        let answers = ["3", "x", "4", "100"];
        let mut last = c.statistics();

        for answer in answers {
            c.load_problem(Problem::new(vec![1, 2], Operator::Add));
            reveal_all(&mut c);
            let _ = c.submit_answer(answer);
            c.abort();
            let now = c.statistics();
            assert!(now.total >= last.total);
            assert!(now.correct >= last.correct);
            assert!(now.correct <= now.total);
            last = now;
        }
        assert_eq!(
            last,
            Statistics {
                correct: 1,
                total: 3
            }
        );
    }
}
