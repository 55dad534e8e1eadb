//! Remaining stock for limited shop items.
//!
//! Stock is held in memory and resets when the process restarts. Unlimited
//! items are never tracked.

use arcade_types::casino::{ShopItem, SHOP};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// A catalog entry with its remaining stock (`None` when unlimited).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Listing {
    pub item: &'static ShopItem,
    pub remaining: Option<u32>,
}

pub struct Shop {
    remaining: Mutex<HashMap<&'static str, u32>>,
}

impl Default for Shop {
    fn default() -> Self {
        Self::new()
    }
}

impl Shop {
    pub fn new() -> Self {
        let remaining = SHOP
            .iter()
            .filter_map(|item| item.stock.map(|stock| (item.name, stock)))
            .collect();
        Self {
            remaining: Mutex::new(remaining),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, u32>> {
        self.remaining.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn listing(&self) -> Vec<Listing> {
        let remaining = self.lock();
        SHOP.iter()
            .map(|item| Listing {
                item,
                remaining: item.stock.and(remaining.get(item.name).copied()),
            })
            .collect()
    }

    /// Take one unit of `item`. Returns false when it is sold out.
    pub fn take(&self, item: &ShopItem) -> bool {
        if item.stock.is_none() {
            return true;
        }
        match self.lock().get_mut(item.name) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }

    /// Return a unit taken for a purchase that did not go through.
    pub fn restore(&self, item: &ShopItem) {
        if item.stock.is_none() {
            return;
        }
        if let Some(left) = self.lock().get_mut(item.name) {
            *left = left.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::casino::find_item;

    #[test]
    fn test_limited_stock_runs_out_and_restores() {
        let shop = Shop::new();
        let trophy = find_item("golden trophy").unwrap();
        assert!(shop.take(trophy));
        assert!(!shop.take(trophy));
        shop.restore(trophy);
        assert!(shop.take(trophy));
    }

    #[test]
    fn test_unlimited_items_are_untracked() {
        let shop = Shop::new();
        let rod = find_item("fishing rod").unwrap();
        for _ in 0..1_000 {
            assert!(shop.take(rod));
        }
        let listing = shop.listing();
        let rod = listing.iter().find(|l| l.item.name == "Fishing Rod").unwrap();
        assert_eq!(rod.remaining, None);
        let pass = listing.iter().find(|l| l.item.name == "VIP Pass").unwrap();
        assert_eq!(pass.remaining, Some(10));
    }
}
