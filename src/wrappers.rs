// Wrappers composing over any `Env`, remote or not.
//
// - TimeLimit
// - RecordEpisodeStatistics

use crate::core::{Env, Result, Step};

/// Info key set by [`TimeLimit`] when it ends an episode.
pub const TRUNCATED_KEY: &str = "TimeLimit.truncated";

/// Ends an episode after `max_steps` steps by forcing `done`.
///
/// When the limit, not the server, ended the episode the step's info gets
/// `"TimeLimit.truncated": true`. The next call must be `reset`, as with any
/// finished episode.
pub struct TimeLimit<E: Env> {
    inner: E,
    max_steps: u32,
    steps: u32,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(inner: E, max_steps: u32) -> Self {
        Self { inner, max_steps, steps: 0 }
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for TimeLimit<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self) -> Result<Self::Obs> {
        self.steps = 0;
        self.inner.reset()
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.steps += 1;
        if !s.done && self.steps >= self.max_steps {
            s.done = true;
            s.info.insert(TRUNCATED_KEY, true);
        }
        Ok(s)
    }

    fn close(self) -> Result<()> { self.inner.close() }
}

/// Tracks the cumulative return and length of each episode.
///
/// On the step that ends an episode it adds `"episode_return"` (f64, the
/// plain sum of the rewards as reported) and `"episode_length"` (i64) to the
/// step's info. Rewards themselves are passed through untouched.
pub struct RecordEpisodeStatistics<E: Env> {
    inner: E,
    ep_return: f64,
    ep_length: i64,
}

impl<E: Env> RecordEpisodeStatistics<E> {
    pub fn new(inner: E) -> Self { Self { inner, ep_return: 0.0, ep_length: 0 } }

    /// Return accumulated so far in the running episode.
    pub fn episode_return(&self) -> f64 { self.ep_return }

    pub fn episode_length(&self) -> i64 { self.ep_length }

    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for RecordEpisodeStatistics<E> {
    type Obs = E::Obs;
    type Act = E::Act;

    fn reset(&mut self) -> Result<Self::Obs> {
        self.ep_return = 0.0;
        self.ep_length = 0;
        self.inner.reset()
    }

    fn step(&mut self, action: Self::Act) -> Result<Step<Self::Obs>> {
        let mut s = self.inner.step(action)?;
        self.ep_return += s.reward;
        self.ep_length += 1;
        if s.done {
            s.info.insert("episode_return", self.ep_return);
            s.info.insert("episode_length", self.ep_length);
            // reset counters for next episode
            self.ep_return = 0.0;
            self.ep_length = 0;
        }
        Ok(s)
    }

    fn close(self) -> Result<()> { self.inner.close() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GymError, Info, Value};

    /// Counts up by the action; done at 3. Rejects steps after done.
    #[derive(Default)]
    struct Counter {
        state: i64,
        finished: bool,
    }

    impl Env for Counter {
        type Obs = i64;
        type Act = i64;

        fn reset(&mut self) -> Result<i64> {
            self.state = 0;
            self.finished = false;
            Ok(self.state)
        }

        fn step(&mut self, action: i64) -> Result<Step<i64>> {
            if self.finished {
                return Err(GymError::Remote { status: Some(500), message: "episode over".into() });
            }
            self.state += action;
            self.finished = self.state >= 3;
            Ok(Step::new(self.state, 0.5, self.finished, Info::new()))
        }

        fn close(self) -> Result<()> { Ok(()) }
    }

    #[test]
    fn time_limit_forces_done() {
        let mut env = TimeLimit::new(Counter::default(), 2);
        env.reset().unwrap();
        let s1 = env.step(0).unwrap();
        assert!(!s1.done);
        let s2 = env.step(0).unwrap();
        assert!(s2.done);
        assert_eq!(s2.info.get(TRUNCATED_KEY), Some(&Value::Bool(true)));

        env.reset().unwrap();
        let s = env.step(3).unwrap();
        assert!(s.done);
        assert!(s.info.get(TRUNCATED_KEY).is_none());
        env.close().unwrap();
    }

    #[test]
    fn statistics_sum_reported_rewards() {
        let mut env = RecordEpisodeStatistics::new(Counter::default());
        env.reset().unwrap();
        let mut total = 0.0;
        loop {
            let s = env.step(1).unwrap();
            total += s.reward;
            if s.done {
                assert_eq!(s.info.get("episode_return"), Some(&Value::Float(total)));
                assert_eq!(s.info.get("episode_length"), Some(&Value::Int(3)));
                break;
            }
            assert_eq!(env.episode_return(), total);
        }
        assert_eq!(env.episode_length(), 0);
        assert!(env.step(1).is_err());
    }
}
