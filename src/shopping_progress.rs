//! # Shopping Progress Tracker
//!
//! Tracks which shopping-list items the user has collected. Items are keyed
//! by their [`ItemId`], never by display position, so checked state survives
//! re-sorting the list by name or category.

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::consolidation::{ItemId, ShoppingList};

/// Minimum estimated shopping time in minutes
pub const MIN_SHOPPING_MINUTES: usize = 15;

/// Estimated minutes per shopping-list item
pub const MINUTES_PER_ITEM: usize = 2;

/// Derived progress metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub checked_count: usize,
    pub total_count: usize,
    /// Share of checked items in percent; 0 for an empty list
    pub percentage: f64,
}

impl Progress {
    /// Percentage rounded to the nearest whole number for display
    pub fn rounded_percentage(&self) -> u32 {
        self.percentage.round() as u32
    }

    /// Check whether every item has been collected
    pub fn is_complete(&self) -> bool {
        self.total_count > 0 && self.checked_count == self.total_count
    }
}

/// Checked state for the current shopping list
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    list: ShoppingList,
    checked: BTreeSet<ItemId>,
}

impl ProgressTracker {
    /// Start tracking a list with nothing checked
    pub fn new(list: ShoppingList) -> Self {
        Self {
            list,
            checked: BTreeSet::new(),
        }
    }

    /// Swap in a new list; all checked state is dropped
    pub fn replace_list(&mut self, list: ShoppingList) {
        info!("Tracking new shopping list with {} items", list.len());
        self.list = list;
        self.checked.clear();
    }

    /// The list being tracked
    pub fn list(&self) -> &ShoppingList {
        &self.list
    }

    /// Flip the checked state of an item
    ///
    /// Unknown identities are ignored. Returns the new checked state.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if !self.list.contains(id) {
            debug!("Ignoring toggle for unknown item {}", id);
            return false;
        }

        if self.checked.remove(&id) {
            debug!("Unchecked item {}", id);
            false
        } else {
            self.checked.insert(id);
            debug!("Checked item {}", id);
            true
        }
    }

    /// Uncheck every item
    pub fn clear(&mut self) {
        debug!("Clearing {} checked items", self.checked.len());
        self.checked.clear();
    }

    pub fn is_checked(&self, id: ItemId) -> bool {
        self.checked.contains(&id)
    }

    /// Checked identities in ascending order
    pub fn checked(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.checked.iter().copied()
    }

    /// Current progress metrics
    pub fn progress(&self) -> Progress {
        let checked_count = self.checked.len();
        let total_count = self.list.len();
        let percentage = if total_count == 0 {
            0.0
        } else {
            100.0 * checked_count as f64 / total_count as f64
        };

        Progress {
            checked_count,
            total_count,
            percentage,
        }
    }

    /// Estimated time in store: 2 minutes per item, at least 15 minutes
    pub fn estimated_shopping_minutes(&self) -> usize {
        (self.list.len() * MINUTES_PER_ITEM).max(MIN_SHOPPING_MINUTES)
    }
}
