use crate::st_model::{ShipSymbol, WaypointSymbol};
use std::collections::BTreeMap;
use tracing::{event, Level};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CoverageEntry {
    covered_in_pass: bool,
    ever_covered: bool,
    assignee: Option<ShipSymbol>,
}

/// Tracks which marketplaces have fresh prices in the current discovery pass and which scout is on its way to which marketplace.
///
/// Entries are kept in a `BTreeMap`, so handing out work in lexicographic order of the waypoint symbol falls out of the iteration order.
#[derive(Debug, Default)]
pub struct CoverageMap {
    entries: BTreeMap<WaypointSymbol, CoverageEntry>,
    pass: u32,
}

impl CoverageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, waypoint_symbol: &WaypointSymbol) {
        self.entries.entry(waypoint_symbol.clone()).or_default();
    }

    /// Returns false if the waypoint is not tracked.
    pub fn mark_covered(&mut self, waypoint_symbol: &WaypointSymbol) -> bool {
        match self.entries.get_mut(waypoint_symbol) {
            Some(entry) => {
                entry.covered_in_pass = true;
                entry.ever_covered = true;
                entry.assignee = None;
                true
            }
            None => false,
        }
    }

    pub fn is_covered(&self, waypoint_symbol: &WaypointSymbol) -> bool {
        self.entries.get(waypoint_symbol).map(|e| e.covered_in_pass).unwrap_or(false)
    }

    pub fn was_ever_covered(&self, waypoint_symbol: &WaypointSymbol) -> bool {
        self.entries.get(waypoint_symbol).map(|e| e.ever_covered).unwrap_or(false)
    }

    pub fn contains(&self, waypoint_symbol: &WaypointSymbol) -> bool {
        self.entries.contains_key(waypoint_symbol)
    }

    pub fn assignment_of(&self, ship_symbol: &ShipSymbol) -> Option<&WaypointSymbol> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.assignee.as_ref() == Some(ship_symbol))
            .map(|(wps, _)| wps)
    }

    /// Hands the ship the first uncovered and unassigned waypoint.
    /// A ship keeps its assignment until it covered it.
    /// Once everything is covered a new pass is started.
    pub fn assign_next(&mut self, ship_symbol: &ShipSymbol) -> Option<WaypointSymbol> {
        if let Some(current) = self.assignment_of(ship_symbol) {
            return Some(current.clone());
        }

        if self.entries.is_empty() {
            return None;
        }

        if self.entries.values().all(|e| e.covered_in_pass) {
            self.start_new_pass();
        }

        let (wps, entry) = self
            .entries
            .iter_mut()
            .find(|(_, entry)| !entry.covered_in_pass && entry.assignee.is_none())?;

        entry.assignee = Some(ship_symbol.clone());
        Some(wps.clone())
    }

    fn start_new_pass(&mut self) {
        self.pass += 1;
        event!(Level::INFO, "All {} marketplaces covered. Starting discovery pass #{}", self.entries.len(), self.pass);
        for entry in self.entries.values_mut() {
            entry.covered_in_pass = false;
        }
    }

    /// True once every waypoint was covered at least once.
    pub fn is_scan_complete(&self) -> bool {
        self.entries.values().all(|e| e.ever_covered)
    }

    pub fn pass(&self) -> u32 {
        self.pass
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn number_of_covered(&self) -> usize {
        self.entries.values().filter(|e| e.covered_in_pass).count()
    }
}
