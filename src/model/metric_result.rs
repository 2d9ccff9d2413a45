use serde::Serialize;

/// Outcome of a metric lookup for a caller-supplied entity.
///
/// Remote failures travel in the surrounding `Result`; these variants only
/// describe whether the entity is something the metric applies to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MetricResult<T> {
    Value(T),
    NotTracked,
    NotLpToken,
}

impl<T> MetricResult<T> {
    pub fn map<U, F>(self, f: F) -> MetricResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            MetricResult::Value(value) => MetricResult::Value(f(value)),
            MetricResult::NotTracked => MetricResult::NotTracked,
            MetricResult::NotLpToken => MetricResult::NotLpToken,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, MetricResult::Value(_))
    }
}
