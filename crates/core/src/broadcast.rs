// SPDX-License-Identifier: MIT

//! Point × namespace runtime overrides (spec.md §4.8).

use crate::cycle_point::CyclePoint;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as SettingValue;

/// A broadcast's point target: every cycle, or one specific point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastPoint {
    Wildcard,
    At(CyclePoint),
}

/// A broadcast's namespace target: the implicit root, or a named namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Root,
    Named(String),
}

/// Points/namespaces/setting-paths that a `put`/`clear` call couldn't apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadOptions {
    pub bad_points: Vec<String>,
    pub bad_namespaces: Vec<String>,
    pub bad_cancel_keys: Vec<String>,
}

impl BadOptions {
    pub fn is_empty(&self) -> bool {
        self.bad_points.is_empty() && self.bad_namespaces.is_empty() && self.bad_cancel_keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BroadcastEntry {
    created_ms: u64,
    settings: IndexMap<String, SettingValue>,
}

/// `(point, namespace, setting_path) → value` overrides, with expiry and
/// cancel semantics. Every public method applies atomically: either the
/// whole call's valid part is recorded, or (for validation failures)
/// nothing is.
#[derive(Debug, Default)]
pub struct BroadcastManager {
    records: IndexMap<(BroadcastPoint, Namespace), BroadcastEntry>,
}

impl BroadcastManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `settings` at every `(point, namespace)` combination, validating
    /// each point/namespace against the caller-supplied predicates. Applies
    /// the valid combinations even if some were rejected.
    pub fn put(
        &mut self,
        points: &[BroadcastPoint],
        namespaces: &[Namespace],
        settings: &IndexMap<String, SettingValue>,
        now_ms: u64,
        is_known_point: impl Fn(&CyclePoint) -> bool,
        is_known_namespace: impl Fn(&str) -> bool,
    ) -> (Vec<(BroadcastPoint, Namespace)>, BadOptions) {
        let mut bad = BadOptions::default();
        let mut applied = Vec::new();

        let valid_points: Vec<&BroadcastPoint> = points
            .iter()
            .filter(|p| match p {
                BroadcastPoint::Wildcard => true,
                BroadcastPoint::At(cp) => {
                    if is_known_point(cp) {
                        true
                    } else {
                        bad.bad_points.push(cp.format());
                        false
                    }
                }
            })
            .collect();

        let valid_namespaces: Vec<&Namespace> = namespaces
            .iter()
            .filter(|n| match n {
                Namespace::Root => true,
                Namespace::Named(name) => {
                    if is_known_namespace(name) {
                        true
                    } else {
                        bad.bad_namespaces.push(name.clone());
                        false
                    }
                }
            })
            .collect();

        for point in &valid_points {
            for namespace in &valid_namespaces {
                let key = ((*point).clone(), (*namespace).clone());
                let entry = self
                    .records
                    .entry(key.clone())
                    .or_insert_with(|| BroadcastEntry { created_ms: now_ms, settings: IndexMap::new() });
                for (path, value) in settings {
                    entry.settings.insert(path.clone(), value.clone());
                }
                applied.push(key);
            }
        }

        (applied, bad)
    }

    /// Remove settings. `None` for `points`/`namespaces` means "all"; `None`
    /// for `cancel_settings` means "every setting at the matched records".
    pub fn clear(
        &mut self,
        points: Option<&[BroadcastPoint]>,
        namespaces: Option<&[Namespace]>,
        cancel_settings: Option<&[String]>,
    ) -> (Vec<(BroadcastPoint, Namespace, String)>, BadOptions) {
        let mut removed = Vec::new();
        let mut bad = BadOptions::default();
        let mut requested_keys: IndexMap<String, bool> =
            cancel_settings.map(|ks| ks.iter().map(|k| (k.clone(), false)).collect()).unwrap_or_default();

        let mut to_drop = Vec::new();
        for (key, entry) in self.records.iter_mut() {
            let (point, namespace) = key;
            if let Some(points) = points {
                if !points.contains(point) {
                    continue;
                }
            }
            if let Some(namespaces) = namespaces {
                if !namespaces.contains(namespace) {
                    continue;
                }
            }
            match cancel_settings {
                None => {
                    for path in entry.settings.keys() {
                        removed.push((point.clone(), namespace.clone(), path.clone()));
                    }
                    to_drop.push(key.clone());
                }
                Some(paths) => {
                    for path in paths {
                        if entry.settings.shift_remove(path).is_some() {
                            removed.push((point.clone(), namespace.clone(), path.clone()));
                            if let Some(found) = requested_keys.get_mut(path) {
                                *found = true;
                            }
                        }
                    }
                }
            }
        }
        for key in to_drop {
            self.records.shift_remove(&key);
        }
        self.records.retain(|_, entry| !entry.settings.is_empty());

        for (path, found) in &requested_keys {
            if !found {
                bad.bad_cancel_keys.push(path.clone());
            }
        }

        (removed, bad)
    }

    /// Remove every record strictly before `cutoff`.
    pub fn expire(&mut self, cutoff: &CyclePoint) -> Vec<(BroadcastPoint, Namespace)> {
        let mut removed = Vec::new();
        self.records.retain(|(point, namespace), _| match point {
            BroadcastPoint::Wildcard => true,
            BroadcastPoint::At(p) if p < cutoff => {
                removed.push((point.clone(), namespace.clone()));
                false
            }
            BroadcastPoint::At(_) => true,
        });
        removed
    }

    /// Merged settings for `(point, hierarchy)`, most general first so later
    /// entries (more specific point, more specific namespace) win.
    pub fn get(&self, point: &CyclePoint, hierarchy: &[String]) -> IndexMap<String, SettingValue> {
        let mut merged = IndexMap::new();
        let groups = [BroadcastPoint::Wildcard, BroadcastPoint::At(*point)];
        for group in groups {
            if let Some(entry) = self.records.get(&(group.clone(), Namespace::Root)) {
                merged.extend(entry.settings.clone());
            }
            for name in hierarchy {
                if let Some(entry) = self.records.get(&(group.clone(), Namespace::Named(name.clone()))) {
                    merged.extend(entry.settings.clone());
                }
            }
        }
        merged
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
