/*
Parameter Automation
====================

A parameter has an intrinsic value that can be changed now or scheduled to
change later. Changes are placed on a timeline and consumed as rendering
time passes them:

  set_value_at_time(v, t)           jump to v at time t
  set_target_at_time(v, t, tau)     starting at t, approach v exponentially

The exponential approach follows

    value(t) = target + (start - target) · e^(-(t - t0) / tau)

where `start` is whatever the value was when the event began. After one
time constant the value has covered ~63% of the distance, after five ~99%.
This is the smooth "release" shape used to silence a voice without the
click a hard step to zero produces.

The intrinsic value is only half the story: graph edges connected into a
parameter are summed on top of it each sample (see `graph`).
*/

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParamEvent {
    SetValue { value: f32, time: f64 },
    SetTarget { target: f32, time: f64, time_constant: f64 },
}

impl ParamEvent {
    fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } | ParamEvent::SetTarget { time, .. } => time,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Approach {
    from: f32,
    target: f32,
    start: f64,
    time_constant: f64,
}

/// A sample-accurate automatable value.
#[derive(Debug, Clone)]
pub struct AudioParam {
    current: f32,
    events: Vec<ParamEvent>,
    approach: Option<Approach>,
    /// Intrinsic value plus connected inputs at the last rendered sample.
    computed: f32,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            events: Vec::new(),
            approach: None,
            computed: value,
        }
    }

    /// Intrinsic value as of the last processed sample.
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Value including connected inputs at the end of the last rendered block.
    pub fn computed(&self) -> f32 {
        self.computed
    }

    pub(crate) fn set_computed(&mut self, value: f32) {
        self.computed = value;
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { value, time });
    }

    pub fn set_target_at_time(&mut self, target: f32, time: f64, time_constant: f64) {
        if time_constant <= 0.0 {
            self.set_value_at_time(target, time);
            return;
        }
        self.insert(ParamEvent::SetTarget {
            target,
            time,
            time_constant,
        });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    fn insert(&mut self, event: ParamEvent) {
        // Events sharing a timestamp keep insertion order.
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    /// Intrinsic value at time `t`, consuming every event due by then.
    #[inline]
    pub fn advance(&mut self, t: f64) -> f32 {
        while let Some(event) = self.events.first().copied() {
            if event.time() > t {
                break;
            }
            self.events.remove(0);
            match event {
                ParamEvent::SetValue { value, .. } => {
                    self.current = value;
                    self.approach = None;
                }
                ParamEvent::SetTarget {
                    target,
                    time,
                    time_constant,
                } => {
                    self.approach = Some(Approach {
                        from: self.current,
                        target,
                        start: time,
                        time_constant,
                    });
                }
            }
        }

        if let Some(a) = self.approach {
            let elapsed = (t - a.start).max(0.0);
            let decay = (-elapsed / a.time_constant).exp() as f32;
            self.current = a.target + (a.from - a.target) * decay;
        }

        self.current
    }

    /// Fill `out` with intrinsic values for consecutive samples starting at `start_time`.
    pub fn render(&mut self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        if self.events.is_empty() && self.approach.is_none() {
            out.fill(self.current);
            return;
        }
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.advance(start_time + i as f64 * dt);
        }
    }
}

impl Default for AudioParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
