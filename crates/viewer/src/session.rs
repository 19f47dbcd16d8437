//! The comparison session: which product each slot shows, for which region
//! and date.
//!
//! Slot mutations are synchronous. Each one builds the new list and swaps it
//! in, then writes it to the key-value store. A product appears in at most
//! one slot.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use client::ApiConfig;
use ntl_common::{ProductType, ViewerError};
use tracing::{debug, info, warn};

use crate::availability::DateAvailability;
use crate::config::SessionConfig;
use crate::persistence::{deserialize_slots, serialize_slots, FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

impl FromStr for Direction {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prev" => Ok(Direction::Prev),
            "next" => Ok(Direction::Next),
            other => Err(ViewerError::validation(
                "direction",
                format!("expected 'prev' or 'next', got '{}'", other),
            )),
        }
    }
}

/// What a slot should do for the current region and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRequest {
    /// Region or date not chosen, or no such slot.
    NoSelection,
    /// The date has no data for the region.
    NoData,
    /// The product has no raster; show the base map only.
    Unsupported(ProductType),
    Fetch { product: ProductType, url: String },
}

pub struct ComparisonSessionController {
    slots: Option<Vec<ProductType>>,
    region: Option<String>,
    date: Option<NaiveDate>,
    availability: DateAvailability,
    store: Box<dyn KeyValueStore>,
    config: SessionConfig,
}

impl ComparisonSessionController {
    /// A session whose slot list has not been read yet.
    pub fn new(store: Box<dyn KeyValueStore>, config: SessionConfig) -> Self {
        Self {
            slots: None,
            region: None,
            date: None,
            availability: DateAvailability::default(),
            store,
            config,
        }
    }

    /// A session with the slot list read from `store`.
    pub fn load(store: Box<dyn KeyValueStore>, config: SessionConfig) -> Self {
        let mut session = Self::new(store, config);
        session.load_slots();
        session
    }

    /// Open the store named by `config` (a JSON file, or memory) and load.
    pub fn open(config: SessionConfig) -> Self {
        let store: Box<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Box::new(FileStore::new(path.clone())),
            None => Box::new(MemoryStore::new()),
        };
        Self::load(store, config)
    }

    /// Read the slot list, falling back to the configured default.
    pub fn load_slots(&mut self) {
        let default = &self.config.default_slots;
        let slots = match self.store.get(&self.config.storage_key) {
            Ok(Some(raw)) => deserialize_slots(&raw, default),
            Ok(None) => default.clone(),
            Err(e) => {
                warn!(error = %e, "Failed to read slot configuration, using default");
                default.clone()
            }
        };
        info!(slots = ?slots, "Slot configuration loaded");
        self.slots = Some(slots);
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.is_some()
    }

    /// `None` until loaded.
    pub fn slots(&self) -> Option<&[ProductType]> {
        self.slots.as_deref()
    }

    /// Products not assigned to any slot, in catalogue order.
    pub fn available_types(&self) -> Vec<ProductType> {
        let used = self.slots.as_deref().unwrap_or_default();
        ProductType::ALL
            .iter()
            .copied()
            .filter(|p| !used.contains(p))
            .collect()
    }

    /// No-op (returns `false`) when `product` is already in another slot or
    /// `index` is out of range.
    pub fn set_slot_type(&mut self, index: usize, product: ProductType) -> bool {
        self.mutate(|slots| {
            if index >= slots.len() || slots[index] == product || slots.contains(&product) {
                return false;
            }
            slots[index] = product;
            true
        })
    }

    /// Append a slot. Without a product, the configured default is used if
    /// it is unassigned, otherwise the first unassigned product. Returns the
    /// new slot's index, or `None` when nothing was added.
    pub fn add_slot(&mut self, product: Option<ProductType>) -> Option<usize> {
        let product = product.or_else(|| {
            let available = self.available_types();
            if available.contains(&self.config.default_product) {
                Some(self.config.default_product)
            } else {
                available.first().copied()
            }
        })?;
        let mut index = None;
        self.mutate(|slots| {
            if slots.contains(&product) {
                return false;
            }
            slots.push(product);
            index = Some(slots.len() - 1);
            true
        });
        index
    }

    pub fn remove_slot(&mut self, index: usize) -> Option<ProductType> {
        let mut removed = None;
        self.mutate(|slots| {
            if index >= slots.len() {
                return false;
            }
            removed = Some(slots.remove(index));
            true
        });
        removed
    }

    /// Swap slot `index` with its neighbour, wrapping around at the ends.
    /// Returns the neighbour's index.
    pub fn reorder_slot(&mut self, index: usize, direction: Direction) -> Option<usize> {
        let mut target = None;
        self.mutate(|slots| {
            let len = slots.len();
            if index >= len {
                return false;
            }
            let other = match direction {
                Direction::Prev => (index + len - 1) % len,
                Direction::Next => (index + 1) % len,
            };
            slots.swap(index, other);
            target = Some(other);
            other != index
        });
        target
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn availability(&self) -> &DateAvailability {
        &self.availability
    }

    pub fn set_global_dates(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        self.availability.set_global(dates);
    }

    /// Select a region. Dates are per region, so a different region clears
    /// the date and the region's known dates.
    pub fn set_region(&mut self, region: Option<String>) {
        if region == self.region {
            return;
        }
        debug!(region = ?region, previous = ?self.region, "Region changed");
        self.region = region;
        self.date = None;
        self.availability.clear_region();
    }

    /// Dates with data for the selected region. Ignored for other regions.
    pub fn set_region_dates(&mut self, region: &str, dates: impl IntoIterator<Item = NaiveDate>) {
        if self.region.as_deref() != Some(region) {
            debug!(region = region, "Ignoring dates for unselected region");
            return;
        }
        self.availability.set_region(region, dates);
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    /// Decide what slot `index` has to show.
    pub fn slot_request(&self, index: usize, api: &ApiConfig) -> SlotRequest {
        let Some(product) = self.slots.as_deref().and_then(|s| s.get(index)).copied() else {
            return SlotRequest::NoSelection;
        };
        let (Some(region), Some(date)) = (self.region.as_deref(), self.date) else {
            return SlotRequest::NoSelection;
        };
        if !product.is_raster() {
            return SlotRequest::Unsupported(product);
        }
        if !self.availability.is_available(date) {
            debug!(region = region, date = %date, "No data for date");
            return SlotRequest::NoData;
        }
        match api.raster_url(product, date, region) {
            Some(url) => SlotRequest::Fetch { product, url },
            None => SlotRequest::Unsupported(product),
        }
    }

    /// Apply `change` to a copy of the slots; keep and persist the copy if
    /// `change` reports a change.
    fn mutate(&mut self, change: impl FnOnce(&mut Vec<ProductType>) -> bool) -> bool {
        let Some(current) = &self.slots else {
            debug!("Ignoring slot change before configuration is loaded");
            return false;
        };
        let mut next = current.clone();
        if !change(&mut next) {
            return false;
        }
        self.slots = Some(next);
        self.persist();
        true
    }

    fn persist(&self) {
        let Some(slots) = &self.slots else {
            return;
        };
        if let Err(e) = self
            .store
            .set(&self.config.storage_key, &serialize_slots(slots))
        {
            warn!(error = %e, "Failed to persist slot configuration");
        }
    }
}

impl fmt::Debug for ComparisonSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonSessionController")
            .field("slots", &self.slots)
            .field("region", &self.region)
            .field("date", &self.date)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProductType::*;

    fn session_with(slots: &[ProductType]) -> ComparisonSessionController {
        let store = MemoryStore::new();
        store
            .set("chart-config", &serialize_slots(slots))
            .unwrap();
        ComparisonSessionController::load(Box::new(store), SessionConfig::default())
    }

    #[test]
    fn test_uninitialized_is_not_empty() {
        let mut session =
            ComparisonSessionController::new(Box::new(MemoryStore::new()), SessionConfig::default());
        assert_eq!(session.slots(), None);
        assert_eq!(session.add_slot(Some(LuoJia)), None);

        let empty = session_with(&[]);
        assert_eq!(empty.slots(), Some(&[][..]));
    }

    #[test]
    fn test_default_when_nothing_stored() {
        let session = ComparisonSessionController::open(SessionConfig::default());
        assert_eq!(session.slots(), Some(&[Vnp46a2GapFilled, LuoJia][..]));
    }

    #[test]
    fn test_set_slot_type_rejects_duplicates() {
        let mut session = session_with(&[LuoJia, Vnp46a1Dnb]);
        assert!(!session.set_slot_type(0, Vnp46a1Dnb));
        assert!(!session.set_slot_type(5, BaseMap));
        assert!(session.set_slot_type(0, BaseMap));
        assert_eq!(session.slots(), Some(&[BaseMap, Vnp46a1Dnb][..]));
    }

    #[test]
    fn test_add_slot_picks_first_available() {
        let mut session = session_with(&[BaseMap]);
        assert_eq!(session.add_slot(None), Some(1));
        assert_eq!(session.slots(), Some(&[BaseMap, Vnp46a2GapFilled][..]));
        assert_eq!(session.add_slot(Some(BaseMap)), None);
    }

    #[test]
    fn test_add_slot_prefers_configured_default() {
        let mut session = session_with(&[LuoJia]);
        assert_eq!(session.add_slot(None), Some(1));
        assert_eq!(session.slots(), Some(&[LuoJia, Vnp46a2GapFilled][..]));
        assert_eq!(session.add_slot(None), Some(2));
        assert_eq!(session.slots(), Some(&[LuoJia, Vnp46a2GapFilled, BaseMap][..]));
    }

    #[test]
    fn test_remove_slot_reindexes() {
        let mut session = session_with(&[BaseMap, LuoJia, Overlay]);
        assert_eq!(session.remove_slot(1), Some(LuoJia));
        assert_eq!(session.remove_slot(7), None);
        assert_eq!(session.slots(), Some(&[BaseMap, Overlay][..]));
    }

    #[test]
    fn test_single_slot_reorder_is_noop() {
        let mut session = session_with(&[LuoJia]);
        assert_eq!(session.reorder_slot(0, Direction::Next), Some(0));
        assert_eq!(session.slots(), Some(&[LuoJia][..]));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("prev".parse::<Direction>().unwrap(), Direction::Prev);
        assert!("up".parse::<Direction>().is_err());
    }
}
