//! Fixed-length circular buffers of hourly aggregates.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use bigdecimal::{BigDecimal, Zero};
use futures::future::try_join_all;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Error;

/// Time span covered by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSpan {
    pub index: usize,
    pub from_ms: i64,
    pub to_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingWindow {
    slots: Vec<BigDecimal>,
    position: usize,
    last_updated: i64,
}

impl RollingWindow {
    /// Window whose newest sample sits in the last slot.
    fn filled(slots: Vec<BigDecimal>, last_updated: i64) -> Self {
        let position = slots.len().saturating_sub(1);
        Self {
            slots,
            position,
            last_updated,
        }
    }

    fn roll(&mut self, sample: BigDecimal, at: i64) {
        self.position = (self.position + 1) % self.slots.len();
        self.slots[self.position] = sample;
        self.last_updated = at;
    }

    pub fn sum(&self) -> BigDecimal {
        self.slots
            .iter()
            .fold(BigDecimal::zero(), |acc, slot| acc + slot)
    }

    pub fn slots(&self) -> &[BigDecimal] {
        &self.slots
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }
}

type Cell = Arc<Mutex<Option<RollingWindow>>>;

/// Per-entity rolling windows, created on first reference and kept for the
/// life of the process.
#[derive(Debug)]
pub struct WindowStore {
    windows: StdMutex<HashMap<String, Cell>>,
    length: usize,
    interval: Duration,
}

impl WindowStore {
    pub fn new(length: usize, interval: Duration) -> Self {
        Self {
            windows: StdMutex::new(HashMap::new()),
            length: length.max(1),
            interval,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn interval_ms(&self) -> i64 {
        i64::try_from(self.interval.as_millis()).unwrap_or(i64::MAX)
    }

    fn cell(&self, entity: &str) -> Cell {
        let mut windows = match self.windows.lock() {
            Ok(windows) => windows,
            Err(poisoned) => poisoned.into_inner(),
        };
        windows.entry(entity.to_owned()).or_default().clone()
    }

    pub async fn window(&self, entity: &str) -> Option<RollingWindow> {
        let cell = self.cell(entity);
        let window = cell.lock().await;
        window.clone()
    }

    pub async fn sum(&self, entity: &str) -> Option<BigDecimal> {
        self.window(entity).await.map(|window| window.sum())
    }

    /// Samples all `length` hours ending at `now` and replaces the window.
    /// Slot `i` covers `[now - (length - i) h, now - (length - i - 1) h)`.
    pub async fn backfill<F, Fut>(
        &self,
        entity: &str,
        now: i64,
        sample: F,
    ) -> Result<(), Error>
    where
        F: Fn(SlotSpan) -> Fut,
        Fut: Future<Output = Result<BigDecimal, Error>>,
    {
        let cell = self.cell(entity);
        let mut window = cell.lock().await;
        *window = Some(self.sample_all(entity, now, &sample).await?);
        Ok(())
    }

    /// Writes one sample covering the hour before `now` into the slot after
    /// the current position.
    pub async fn roll_forward<F, Fut>(
        &self,
        entity: &str,
        now: i64,
        sample: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(SlotSpan) -> Fut,
        Fut: Future<Output = Result<BigDecimal, Error>>,
    {
        let cell = self.cell(entity);
        let mut guard = cell.lock().await;
        let window = guard
            .as_mut()
            .ok_or_else(|| Error::UninitializedWindow(entity.to_owned()))?;

        let span = SlotSpan {
            index: (window.position + 1) % window.slots.len(),
            from_ms: now - self.interval_ms(),
            to_ms: now,
        };
        let value = sample(span).await?;
        window.roll(value, now);
        Ok(())
    }

    /// Brings the window up to date and returns its sum.
    ///
    /// An empty window is backfilled. A window whose last slot is `k` whole
    /// intervals old is rolled forward `k` times over consecutive hours, or
    /// backfilled when `k` reaches the window length. A current window is
    /// left alone.
    pub async fn refresh<F, Fut>(
        &self,
        entity: &str,
        now: i64,
        sample: F,
    ) -> Result<BigDecimal, Error>
    where
        F: Fn(SlotSpan) -> Fut,
        Fut: Future<Output = Result<BigDecimal, Error>>,
    {
        let cell = self.cell(entity);
        let mut guard = cell.lock().await;
        let interval = self.interval_ms();

        let missed = match guard.as_ref() {
            Some(window) => (now - window.last_updated) / interval.max(1),
            None => i64::MAX,
        };

        if missed >= self.length as i64 {
            *guard = Some(self.sample_all(entity, now, &sample).await?);
        } else if let Some(window) = guard.as_mut().filter(|_| missed > 0) {
            let spans = (1..=missed).map(|k| {
                let to_ms = window.last_updated + k * interval;
                SlotSpan {
                    index: (window.position + k as usize) % self.length,
                    from_ms: to_ms - interval,
                    to_ms,
                }
            });
            let spans: Vec<SlotSpan> = spans.collect();
            let samples = try_join_all(spans.iter().map(|span| sample(*span))).await?;

            for (span, value) in spans.iter().zip(samples) {
                window.roll(value, span.to_ms);
            }
            debug!("{}: rolled window forward {} slot(s)", entity, missed);
        }

        guard
            .as_ref()
            .map(|window| window.sum())
            .ok_or_else(|| Error::UninitializedWindow(entity.to_owned()))
    }

    async fn sample_all<F, Fut>(
        &self,
        entity: &str,
        now: i64,
        sample: &F,
    ) -> Result<RollingWindow, Error>
    where
        F: Fn(SlotSpan) -> Fut,
        Fut: Future<Output = Result<BigDecimal, Error>>,
    {
        let interval = self.interval_ms();
        let length = self.length as i64;
        let spans = (0..self.length).map(|index| {
            let to_ms = now - (length - 1 - index as i64) * interval;
            SlotSpan {
                index,
                from_ms: to_ms - interval,
                to_ms,
            }
        });
        let slots = try_join_all(spans.map(sample)).await?;
        debug!("{}: backfilled {} slots", entity, slots.len());
        Ok(RollingWindow::filled(slots, now))
    }
}
