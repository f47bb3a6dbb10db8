//! Breakpoint envelopes: scheduled automation for gains and frequencies.
//!
//! An [`Envelope`] is a list of `{time, value, curve}` breakpoints evaluated
//! against an absolute clock. Ramp semantics follow the Web Audio automation
//! model, so a graph renders the same offline as it would in a browser.

use serde::Serialize;

/// How the value travels from the previous breakpoint to this one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    /// Jump to the value at the breakpoint time.
    Step,
    /// Straight line from the previous breakpoint.
    Linear,
    /// Geometric interpolation from the previous breakpoint. Both ends must be
    /// nonzero and share a sign; otherwise the previous value is held until
    /// the breakpoint time.
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakpoint {
    /// Absolute time in seconds.
    pub time: f64,
    pub value: f64,
    pub curve: Curve,
}

/// Time-varying control curve for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Value before the first breakpoint.
    pub initial: f64,
    breakpoints: Vec<Breakpoint>,
}

impl Envelope {
    pub fn new(initial: f64) -> Self {
        Envelope {
            initial,
            breakpoints: Vec::new(),
        }
    }

    /// Hold `value` from `time` on.
    pub fn set_value_at(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint {
            time,
            value,
            curve: Curve::Step,
        })
    }

    /// Ramp linearly from the previous breakpoint to `value` at `time`.
    pub fn linear_ramp_to(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint {
            time,
            value,
            curve: Curve::Linear,
        })
    }

    /// Ramp exponentially from the previous breakpoint to `value` at `time`.
    pub fn exponential_ramp_to(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Breakpoint {
            time,
            value,
            curve: Curve::Exponential,
        })
    }

    /// Breakpoints are kept sorted by time; equal times keep insertion order.
    fn insert(&mut self, point: Breakpoint) -> &mut Self {
        let idx = self.breakpoints.partition_point(|b| b.time <= point.time);
        self.breakpoints.insert(idx, point);
        self
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Time of the last breakpoint, after which the value is constant.
    pub fn end_time(&self) -> Option<f64> {
        self.breakpoints.last().map(|b| b.time)
    }

    /// Evaluate the envelope at absolute time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        // Index of the first breakpoint strictly after t.
        let next = self.breakpoints.partition_point(|b| b.time <= t);

        let (t0, v0) = match next.checked_sub(1) {
            Some(i) => (self.breakpoints[i].time, self.breakpoints[i].value),
            None => (f64::NEG_INFINITY, self.initial),
        };

        let Some(target) = self.breakpoints.get(next) else {
            return v0;
        };

        // A ramp with nothing before it starts from the initial value at t=0.
        let t0 = if t0.is_finite() { t0 } else { 0.0_f64.min(t) };

        match target.curve {
            Curve::Step => v0,
            Curve::Linear => {
                let span = target.time - t0;
                if span <= 0.0 {
                    return v0;
                }
                let frac = (t - t0) / span;
                v0 + (target.value - v0) * frac
            }
            Curve::Exponential => {
                let span = target.time - t0;
                if span <= 0.0 || v0 == 0.0 || v0 * target.value <= 0.0 {
                    return v0;
                }
                let frac = (t - t0) / span;
                v0 * (target.value / v0).powf(frac)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_envelope_holds_initial() {
        let env = Envelope::new(0.25);
        assert_eq!(env.value_at(-1.0), 0.25);
        assert_eq!(env.value_at(100.0), 0.25);
        assert_eq!(env.end_time(), None);
    }

    #[test]
    fn set_value_jumps_at_time() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(1.0, 0.5);
        assert_eq!(env.value_at(0.49), 0.0);
        assert_eq!(env.value_at(0.5), 1.0);
        assert_eq!(env.value_at(9.0), 1.0);
    }

    #[test]
    fn linear_ramp_interpolates() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(0.0, 1.0).linear_ramp_to(10.0, 2.0);
        assert!(close(env.value_at(1.5), 5.0));
        assert!(close(env.value_at(1.25), 2.5));
        assert_eq!(env.value_at(2.0), 10.0);
        assert_eq!(env.value_at(3.0), 10.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(1.0, 0.0).exponential_ramp_to(0.0001, 0.01);
        assert_eq!(env.value_at(0.0), 1.0);
        // Geometric midpoint of 1 and 1e-4.
        assert!(close(env.value_at(0.005), 0.01));
        assert!(close(env.value_at(0.01), 0.0001));
        assert!(close(env.value_at(5.0), 0.0001));
    }

    #[test]
    fn exponential_from_zero_holds_then_jumps() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(0.0, 0.0).exponential_ramp_to(0.001, 1.0);
        assert_eq!(env.value_at(0.5), 0.0);
        assert_eq!(env.value_at(0.999), 0.0);
        assert_eq!(env.value_at(1.0), 0.001);
    }

    #[test]
    fn exponential_across_sign_change_holds() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(-50.0, 0.0).exponential_ramp_to(20.0, 1.0);
        assert_eq!(env.value_at(0.3), -50.0);
        assert_eq!(env.value_at(1.0), 20.0);
    }

    #[test]
    fn zero_length_ramp_lands_immediately() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(0.0, 0.0)
            .linear_ramp_to(300.0, 0.0)
            .exponential_ramp_to(0.001, 0.5);
        assert_eq!(env.value_at(0.0), 300.0);
        let mid = env.value_at(0.25);
        assert!(close(mid, (300.0_f64 * 0.001).sqrt()), "got {mid}");
    }

    #[test]
    fn breakpoints_stay_sorted() {
        let mut env = Envelope::new(0.0);
        env.linear_ramp_to(2.0, 2.0);
        env.set_value_at(1.0, 1.0);
        let times: Vec<f64> = env.breakpoints().iter().map(|b| b.time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
        assert_eq!(env.end_time(), Some(2.0));
    }

    #[test]
    fn chained_linear_then_exponential() {
        let mut env = Envelope::new(0.0);
        env.set_value_at(100.0, 0.0)
            .linear_ramp_to(300.0, 0.1)
            .exponential_ramp_to(100.0, 0.3);
        assert!(close(env.value_at(0.05), 200.0));
        assert!(close(env.value_at(0.1), 300.0));
        assert!(close(env.value_at(0.2), (300.0_f64 * 100.0).sqrt()));
        assert!(close(env.value_at(0.3), 100.0));
    }
}
