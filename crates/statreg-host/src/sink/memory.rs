//! In-process aggregating sink.
//!
//! Samples are folded into one series per (stat name, value kind), stored in
//! `DashMap`s so submissions from several threads never contend on a single
//! lock. The sink boundary is keyed by name, so counters of the same kind
//! that share a name across registry namespaces feed one series; an int64
//! and a double stat with the same name stay apart. Output is sorted to keep
//! renders deterministic.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use statreg_core::{
    CounterHandle, SampleValue, StatMetadata, StatName, StatOperation, StatSink, ValueKind,
};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Prometheus metric names allow `[a-zA-Z0-9_:]` only. Several stat names
/// can map to one metric name; the `stat` label tells them apart.
fn metric_name(stat: &str) -> String {
    let body: String = stat
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("statreg_{body}")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeriesKey {
    name: StatName,
    kind: ValueKind,
}

/// Current value of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Int(i64),
    Double(f64),
}

impl SeriesValue {
    fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int64 => SeriesValue::Int(0),
            ValueKind::Double => SeriesValue::Double(0.0),
        }
    }

    /// Fold one sample in. Series are keyed by kind, so the sample always
    /// matches the series representation.
    fn apply(&mut self, op: StatOperation, sample: &SampleValue) {
        match (self, sample) {
            (SeriesValue::Int(v), SampleValue::Int64(s)) => int_op(v, op, *s),
            (SeriesValue::Double(v), SampleValue::Double(s)) => double_op(v, op, *s),
            _ => {}
        }
    }
}

fn sample_kind(sample: &SampleValue) -> Option<ValueKind> {
    match sample {
        SampleValue::Int64(_) => Some(ValueKind::Int64),
        SampleValue::Double(_) => Some(ValueKind::Double),
        SampleValue::Label(_) => None,
    }
}

fn int_op(v: &mut i64, op: StatOperation, s: i64) {
    match op {
        StatOperation::Add => *v = v.saturating_add(s),
        StatOperation::Subtract => *v = v.saturating_sub(s),
        StatOperation::Set => *v = s,
        StatOperation::Label => {}
    }
}

fn double_op(v: &mut f64, op: StatOperation, s: f64) {
    match op {
        StatOperation::Add => *v += s,
        StatOperation::Subtract => *v -= s,
        StatOperation::Set => *v = s,
        StatOperation::Label => {}
    }
}

#[derive(Debug, Clone)]
struct Series {
    description: Option<String>,
    group: String,
    clear_every_frame: bool,
    is_cycle_stat: bool,
    value: SeriesValue,
    samples: u64,
}

impl Series {
    fn from_meta(meta: &StatMetadata) -> Self {
        Self {
            description: meta.description.clone(),
            group: meta.group.name.clone(),
            clear_every_frame: meta.clear_every_frame,
            is_cycle_stat: meta.is_cycle_stat,
            value: SeriesValue::zero(meta.value_kind),
            samples: 0,
        }
    }

    /// Series for a name that was never registered (samples submitted by
    /// other producers).
    fn implicit(kind: ValueKind) -> Self {
        Self {
            description: None,
            group: String::new(),
            clear_every_frame: false,
            is_cycle_stat: false,
            value: SeriesValue::zero(kind),
            samples: 0,
        }
    }
}

/// One stat in a [`SinkSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct StatSnapshot {
    pub name: String,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: &'static str,
    pub per_frame: bool,
    pub cycle: bool,
    pub value: SeriesValue,
    pub samples: u64,
}

/// Point-in-time view of everything the sink holds.
#[derive(Debug, Clone, Serialize)]
pub struct SinkSnapshot {
    pub collecting: bool,
    pub frame: u64,
    pub stats: Vec<StatSnapshot>,
    pub labels: BTreeMap<String, String>,
}

pub struct MemorySink {
    series: DashMap<SeriesKey, Series>,
    labels: DashMap<StatName, String>,
    handles: DashMap<CounterHandle, StatName>,
    next_handle: AtomicUsize,
    collecting: AtomicBool,
    frame: AtomicU64,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MemorySink {
    pub fn new(collecting: bool) -> Self {
        Self {
            series: DashMap::new(),
            labels: DashMap::new(),
            handles: DashMap::new(),
            next_handle: AtomicUsize::new(1),
            collecting: AtomicBool::new(collecting),
            frame: AtomicU64::new(0),
        }
    }

    pub fn set_collecting(&self, on: bool) {
        self.collecting.store(on, Ordering::Relaxed);
        tracing::info!(collecting = on, "stat collection toggled");
    }

    pub fn frame(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }

    /// Value of the `kind` series for `name`, if one exists.
    pub fn value(&self, name: &str, kind: ValueKind) -> Option<SeriesValue> {
        let key = SeriesKey {
            name: StatName::new(name).ok()?,
            kind,
        };
        self.series.get(&key).map(|s| s.value)
    }

    pub fn label(&self, name: &str) -> Option<String> {
        self.labels.get(name).map(|l| l.value().clone())
    }

    pub fn name_of(&self, handle: CounterHandle) -> Option<StatName> {
        self.handles.get(&handle).map(|n| n.value().clone())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn snapshot(&self) -> SinkSnapshot {
        let mut rows: Vec<(ValueKind, StatSnapshot)> = self
            .series
            .iter()
            .map(|r| {
                let (key, s) = (r.key(), r.value());
                let row = StatSnapshot {
                    name: key.name.to_string(),
                    group: s.group.clone(),
                    description: s.description.clone(),
                    kind: key.kind.as_str(),
                    per_frame: s.clear_every_frame,
                    cycle: s.is_cycle_stat,
                    value: s.value,
                    samples: s.samples,
                };
                (key.kind, row)
            })
            .collect();
        rows.sort_by(|(ka, a), (kb, b)| a.name.cmp(&b.name).then(ka.cmp(kb)));

        let labels = self
            .labels
            .iter()
            .map(|r| (r.key().to_string(), r.value().clone()))
            .collect();

        SinkSnapshot {
            collecting: self.collecting.load(Ordering::Relaxed),
            frame: self.frame(),
            stats: rows.into_iter().map(|(_, row)| row).collect(),
            labels,
        }
    }

    /// Render in Prometheus text exposition format. Series sharing a metric
    /// name form one family with a single HELP / TYPE header.
    pub fn render(&self) -> String {
        let snap = self.snapshot();

        let mut families: BTreeMap<String, Vec<&StatSnapshot>> = BTreeMap::new();
        for s in &snap.stats {
            families.entry(metric_name(&s.name)).or_default().push(s);
        }

        let mut out = String::new();
        for (metric, members) in &families {
            if let Some(desc) = members.iter().find_map(|s| s.description.as_deref()) {
                let _ = writeln!(out, "# HELP {} {}", metric, desc.replace('\n', " "));
            }
            let _ = writeln!(out, "# TYPE {} gauge", metric);
            for s in members {
                let labels = format!("stat=\"{}\",kind=\"{}\"", escape_label(&s.name), s.kind);
                let _ = match s.value {
                    SeriesValue::Int(v) => writeln!(out, "{metric}{{{labels}}} {v}"),
                    SeriesValue::Double(v) => writeln!(out, "{metric}{{{labels}}} {v}"),
                };
            }
        }
        if !snap.labels.is_empty() {
            let _ = writeln!(out, "# TYPE statreg_label gauge");
            for (stat, value) in &snap.labels {
                let _ = writeln!(
                    out,
                    "statreg_label{{stat=\"{}\",value=\"{}\"}} 1",
                    escape_label(stat),
                    escape_label(value)
                );
            }
        }
        let _ = writeln!(
            out,
            "# TYPE statreg_collecting gauge\nstatreg_collecting {}",
            if snap.collecting { 1 } else { 0 }
        );
        let _ = writeln!(
            out,
            "# TYPE statreg_frames_total counter\nstatreg_frames_total {}",
            snap.frame
        );
        out
    }
}

impl StatSink for MemorySink {
    /// Re-registering a known (name, kind) keeps the existing series and its
    /// value.
    fn register_metadata(&self, meta: &StatMetadata) {
        let key = SeriesKey {
            name: meta.name.clone(),
            kind: meta.value_kind,
        };
        if self.series.contains_key(&key) {
            tracing::debug!(
                stat = %meta.name,
                kind = meta.value_kind.as_str(),
                "metadata already registered; keeping series"
            );
            return;
        }
        self.series.insert(key, Series::from_meta(meta));
    }

    fn allocate_handle(&self, meta: &StatMetadata) -> CounterHandle {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = NonZeroUsize::new(raw)
            .map(CounterHandle::new)
            .unwrap_or_else(|| CounterHandle::new(NonZeroUsize::MIN));
        self.handles.insert(handle, meta.name.clone());
        handle
    }

    fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::Relaxed)
    }

    fn submit(&self, name: &StatName, op: StatOperation, value: SampleValue) {
        if !self.is_collecting() {
            return;
        }
        let Some(kind) = sample_kind(&value) else {
            if let SampleValue::Label(l) = value {
                self.labels.insert(name.clone(), l);
            }
            return;
        };
        let key = SeriesKey {
            name: name.clone(),
            kind,
        };
        let mut series = self
            .series
            .entry(key)
            .or_insert_with(|| Series::implicit(kind));
        series.value.apply(op, &value);
        series.samples += 1;
    }

    /// Close the current frame: per-frame (counter) series go back to zero,
    /// accumulators keep their totals.
    fn end_frame(&self) {
        for mut s in self.series.iter_mut() {
            if s.clear_every_frame {
                let kind = s.key().kind;
                s.value = SeriesValue::zero(kind);
            }
        }
        let frame = self.frame.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(frame, "frame closed");
    }
}
