//! Bounded narrative gauges and the per-turn update policy.
//!
//! A [`MetricsPolicy`] declares the gauges a session tracks: their range,
//! starting value, display hints and the rule applied after every turn.
//! [`Metrics`] holds the live values. Every write goes through
//! [`Gauge::set`], which clamps into the declared range.

use crate::session::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a gauge moves at the end of every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateRule {
    /// Add a uniform integer in `[-spread, spread]`.
    Jitter { spread: i32 },
    /// Add a fixed amount.
    Step { delta: i32 },
    /// Add a uniform integer in `[min, max]`.
    RandomStep { min: i32, max: i32 },
    /// Only moved explicitly.
    Fixed,
}

impl UpdateRule {
    /// Draw the delta for one turn.
    pub fn delta<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        match *self {
            UpdateRule::Jitter { spread } => {
                let spread = spread.saturating_abs();
                rng.gen_range(-spread..=spread)
            }
            UpdateRule::Step { delta } => delta,
            UpdateRule::RandomStep { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rng.gen_range(lo..=hi)
            }
            UpdateRule::Fixed => 0,
        }
    }
}

/// How a front-end should draw a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeStyle {
    /// A horizontal bar showing `value` as a share of the range.
    Percent,
    /// A row of `max` cells with the first `value` lit.
    Pips,
}

/// When a gauge should be drawn in its alert colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "when", content = "value", rename_all = "snake_case")]
pub enum Alert {
    AtOrAbove(i32),
    AtOrBelow(i32),
}

/// Declaration of one gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeSpec {
    pub name: String,
    pub label: String,
    pub min: i32,
    pub max: i32,
    pub initial: i32,
    pub rule: UpdateRule,
    pub style: GaugeStyle,
    pub alert: Option<Alert>,
}

impl GaugeSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            name: name.into(),
            label: label.into(),
            min,
            max,
            initial: min,
            rule: UpdateRule::Fixed,
            style: GaugeStyle::Percent,
            alert: None,
        }
    }

    pub fn starting_at(mut self, initial: i32) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_rule(mut self, rule: UpdateRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_style(mut self, style: GaugeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_alert(mut self, alert: Alert) -> Self {
        self.alert = Some(alert);
        self
    }
}

/// The set of gauges a session tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsPolicy {
    pub gauges: Vec<GaugeSpec>,
}

impl MetricsPolicy {
    pub fn new(gauges: Vec<GaugeSpec>) -> Self {
        Self { gauges }
    }

    /// Check every gauge declaration.
    ///
    /// Policies built with [`GaugeSpec::new`] always pass; deserialized or
    /// hand-assembled ones may not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, gauge) in self.gauges.iter().enumerate() {
            let invalid = |reason: String| {
                Err(ConfigError::InvalidSetting(format!(
                    "gauge `{}`: {reason}",
                    gauge.name
                )))
            };
            if gauge.name.trim().is_empty() {
                return invalid("name is empty".into());
            }
            if self.gauges[..i].iter().any(|g| g.name == gauge.name) {
                return invalid("declared twice".into());
            }
            if gauge.min > gauge.max {
                return invalid(format!("min {} exceeds max {}", gauge.min, gauge.max));
            }
            if !(gauge.min..=gauge.max).contains(&gauge.initial) {
                return invalid(format!(
                    "initial {} outside {}..={}",
                    gauge.initial, gauge.min, gauge.max
                ));
            }
            if let UpdateRule::Jitter { spread: i32::MIN } = gauge.rule {
                return invalid("jitter spread out of range".into());
            }
        }
        Ok(())
    }

    /// Stress 0..100 from 50 with ±10 jitter; danger 0..10 rising by one per turn.
    pub fn stress() -> Self {
        Self::new(vec![
            GaugeSpec::new("stress", "Stress Level", 0, 100)
                .starting_at(50)
                .with_rule(UpdateRule::Jitter { spread: 10 })
                .with_alert(Alert::AtOrAbove(70)),
            danger(UpdateRule::Step { delta: 1 }),
        ])
    }

    /// Health 0..100 from 100 with ±10 jitter; danger 0..10 rising by 0..=2 per turn.
    pub fn health() -> Self {
        Self::new(vec![
            GaugeSpec::new("health", "Health", 0, 100)
                .starting_at(100)
                .with_rule(UpdateRule::Jitter { spread: 10 })
                .with_alert(Alert::AtOrBelow(30)),
            danger(UpdateRule::RandomStep { min: 0, max: 2 }),
        ])
    }

    /// Look up a preset by name (`stress` or `health`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "stress" => Some(Self::stress()),
            "health" => Some(Self::health()),
            _ => None,
        }
    }
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self::stress()
    }
}

fn danger(rule: UpdateRule) -> GaugeSpec {
    GaugeSpec::new("danger", "Danger Level", 0, 10)
        .with_rule(rule)
        .with_style(GaugeStyle::Pips)
        .with_alert(Alert::AtOrAbove(7))
}

/// A live gauge. The value is private so it can only change through
/// clamping writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gauge {
    spec: GaugeSpec,
    value: i32,
}

impl Gauge {
    pub fn new(mut spec: GaugeSpec) -> Self {
        if spec.min > spec.max {
            std::mem::swap(&mut spec.min, &mut spec.max);
        }
        let value = spec.initial.clamp(spec.min, spec.max);
        Self { spec, value }
    }

    pub fn spec(&self) -> &GaugeSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Add `delta`, saturating at the declared bounds. Returns the new value.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        self.set(self.value.saturating_add(delta))
    }

    /// Set the value, clamped into the declared range.
    pub fn set(&mut self, value: i32) -> i32 {
        self.value = value.clamp(self.spec.min, self.spec.max);
        self.value
    }

    /// Fraction of the range covered, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        let span = (self.spec.max - self.spec.min) as f64;
        if span <= 0.0 {
            return 1.0;
        }
        (self.value - self.spec.min) as f64 / span
    }

    pub fn is_alert(&self) -> bool {
        match self.spec.alert {
            Some(Alert::AtOrAbove(t)) => self.value >= t,
            Some(Alert::AtOrBelow(t)) => self.value <= t,
            None => false,
        }
    }
}

/// Live gauges, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    gauges: Vec<Gauge>,
}

impl Metrics {
    pub fn from_policy(policy: &MetricsPolicy) -> Self {
        Self {
            gauges: policy.gauges.iter().cloned().map(Gauge::new).collect(),
        }
    }

    pub fn gauges(&self) -> &[Gauge] {
        &self.gauges
    }

    pub fn get(&self, name: &str) -> Option<&Gauge> {
        self.gauges.iter().find(|g| g.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<i32> {
        self.get(name).map(Gauge::value)
    }

    /// Apply `delta` to the named gauge, saturating at its bounds.
    ///
    /// Returns the new value, or `None` if no gauge has that name.
    pub fn update(&mut self, name: &str, delta: i32) -> Option<i32> {
        self.gauges
            .iter_mut()
            .find(|g| g.name() == name)
            .map(|g| g.adjust(delta))
    }

    /// Apply every gauge's end-of-turn rule.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for gauge in &mut self.gauges {
            let delta = gauge.spec.rule.delta(rng);
            gauge.adjust(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stress_preset() {
        let metrics = Metrics::from_policy(&MetricsPolicy::stress());
        assert_eq!(metrics.value("stress"), Some(50));
        assert_eq!(metrics.value("danger"), Some(0));
        assert_eq!(metrics.value("health"), None);
    }

    #[test]
    fn test_update_saturates() {
        let mut metrics = Metrics::from_policy(&MetricsPolicy::stress());
        assert_eq!(metrics.update("stress", 1000), Some(100));
        assert_eq!(metrics.update("stress", -1000), Some(0));
        assert_eq!(metrics.update("stress", i32::MAX), Some(100));
        assert_eq!(metrics.update("stress", i32::MIN), Some(0));
        assert_eq!(metrics.update("danger", 25), Some(10));
        assert_eq!(metrics.update("morale", 5), None);
    }

    #[test]
    fn test_initial_value_is_clamped() {
        let gauge = Gauge::new(GaugeSpec::new("heat", "Heat", 0, 10).starting_at(50));
        assert_eq!(gauge.value(), 10);
    }

    #[test]
    fn test_inverted_range_is_normalized() {
        let mut spec = GaugeSpec::new("heat", "Heat", 0, 10).starting_at(4);
        spec.min = 10;
        spec.max = 0;
        let mut gauge = Gauge::new(spec);
        assert_eq!(gauge.value(), 4);
        assert_eq!((gauge.spec().min, gauge.spec().max), (0, 10));
        assert_eq!(gauge.adjust(100), 10);
    }

    #[test]
    fn test_extreme_jitter_does_not_overflow() {
        let mut rng = StdRng::seed_from_u64(5);
        let rule = UpdateRule::Jitter { spread: i32::MIN };
        for _ in 0..20 {
            rule.delta(&mut rng);
        }
    }

    #[test]
    fn test_validate_presets() {
        assert_eq!(MetricsPolicy::stress().validate(), Ok(()));
        assert_eq!(MetricsPolicy::health().validate(), Ok(()));
        assert_eq!(MetricsPolicy::new(Vec::new()).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_gauges() {
        let base = GaugeSpec::new("heat", "Heat", 0, 10);

        let mut inverted = base.clone();
        inverted.min = 10;
        inverted.max = 0;
        let outside = base.clone().starting_at(11);
        let jitter = base.clone().with_rule(UpdateRule::Jitter { spread: i32::MIN });
        let unnamed = GaugeSpec::new(" ", "Blank", 0, 1);

        for gauges in [
            vec![inverted],
            vec![outside],
            vec![jitter],
            vec![unnamed],
            vec![base.clone(), base],
        ] {
            assert!(matches!(
                MetricsPolicy::new(gauges).validate(),
                Err(ConfigError::InvalidSetting(_))
            ));
        }
    }

    #[test]
    fn test_advance_stress_policy() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut metrics = Metrics::from_policy(&MetricsPolicy::stress());

        for turn in 1..=15 {
            let before = metrics.value("stress").unwrap();
            metrics.advance(&mut rng);
            let after = metrics.value("stress").unwrap();
            assert!((after - before).abs() <= 10);
            assert!((0..=100).contains(&after));
            assert_eq!(metrics.value("danger"), Some(turn.min(10)));
        }
    }

    #[test]
    fn test_advance_health_policy() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut metrics = Metrics::from_policy(&MetricsPolicy::health());
        let mut previous_danger = 0;

        for _ in 0..50 {
            metrics.advance(&mut rng);
            let danger = metrics.value("danger").unwrap();
            assert!(danger >= previous_danger);
            assert!(danger - previous_danger <= 2);
            assert!((0..=100).contains(&metrics.value("health").unwrap()));
            previous_danger = danger;
        }
    }

    #[test]
    fn test_rule_deltas_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let d = UpdateRule::Jitter { spread: 10 }.delta(&mut rng);
            assert!((-10..=10).contains(&d));
            let d = UpdateRule::RandomStep { min: 2, max: 0 }.delta(&mut rng);
            assert!((0..=2).contains(&d));
        }
        assert_eq!(UpdateRule::Fixed.delta(&mut rng), 0);
        assert_eq!(UpdateRule::Step { delta: -3 }.delta(&mut rng), -3);
    }

    #[test]
    fn test_alerts_and_ratio() {
        let mut metrics = Metrics::from_policy(&MetricsPolicy::stress());
        assert!(!metrics.get("stress").unwrap().is_alert());
        metrics.update("stress", 20);
        assert!(metrics.get("stress").unwrap().is_alert());
        assert!((metrics.get("stress").unwrap().ratio() - 0.7).abs() < f64::EPSILON);

        let mut health = Metrics::from_policy(&MetricsPolicy::health());
        health.update("health", -75);
        assert!(health.get("health").unwrap().is_alert());
    }

    #[test]
    fn test_presets_by_name() {
        assert_eq!(MetricsPolicy::preset("Health"), Some(MetricsPolicy::health()));
        assert_eq!(MetricsPolicy::preset("stress"), Some(MetricsPolicy::stress()));
        assert!(MetricsPolicy::preset("sanity").is_none());
    }
}
