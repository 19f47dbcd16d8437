//! Hover and selection state of the boundary layer.
//!
//! Features are styled by the pair `(selected, hovered)`:
//!
//! | selected | hovered | emphasis |
//! |----------|---------|----------|
//! | no       | no      | hidden (hit-testing only) |
//! | yes      | no      | light |
//! | no       | yes     | light |
//! | yes      | yes     | strong |

use ntl_common::Rgba;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Hidden,
    Light,
    Strong,
}

impl Emphasis {
    pub fn of(selected: bool, hovered: bool) -> Self {
        match (selected, hovered) {
            (false, false) => Emphasis::Hidden,
            (true, true) => Emphasis::Strong,
            _ => Emphasis::Light,
        }
    }
}

/// Path style of a boundary feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureStyle {
    pub color: Rgba,
    pub weight: f32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl FeatureStyle {
    pub fn for_emphasis(emphasis: Emphasis) -> Self {
        let color = Rgba::opaque(255, 255, 255);
        match emphasis {
            Emphasis::Hidden => Self {
                color,
                weight: 0.0,
                opacity: 0.0,
                fill_opacity: 0.0,
            },
            Emphasis::Light => Self {
                color,
                weight: 1.0,
                opacity: 0.6,
                fill_opacity: 0.1,
            },
            Emphasis::Strong => Self {
                color,
                weight: 3.0,
                opacity: 1.0,
                fill_opacity: 0.3,
            },
        }
    }
}

/// Emitted when a region is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    pub region_id: String,
    pub previous: Option<String>,
    /// The clicked feature as received.
    pub feature: Value,
}

impl SelectionChanged {
    /// Regions whose style has to be refreshed.
    pub fn restyle(&self) -> Vec<&str> {
        let mut ids = vec![self.region_id.as_str()];
        if let Some(prev) = self.previous.as_deref() {
            if prev != self.region_id {
                ids.push(prev);
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSelectionModel {
    selected: Option<String>,
    hovered: Option<String>,
}

impl RegionSelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `selected` already selected, e.g. from the query string.
    pub fn with_selected(selected: Option<String>) -> Self {
        Self {
            selected,
            hovered: None,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Returns `true` if the hovered region changed.
    pub fn pointer_enter(&mut self, region_id: &str) -> bool {
        if self.hovered.as_deref() == Some(region_id) {
            return false;
        }
        trace!(region = region_id, "Pointer enter");
        self.hovered = Some(region_id.to_string());
        true
    }

    /// Clears the hover only if it still belongs to `region_id`; a leave
    /// arriving after the enter of a neighbour is ignored.
    pub fn pointer_leave(&mut self, region_id: &str) -> bool {
        if self.hovered.as_deref() != Some(region_id) {
            trace!(region = region_id, hovered = ?self.hovered, "Ignoring stale pointer leave");
            return false;
        }
        self.hovered = None;
        true
    }

    pub fn click(&mut self, region_id: &str, feature: Value) -> SelectionChanged {
        let previous = self.selected.replace(region_id.to_string());
        debug!(region = region_id, previous = ?previous, "Region selected");
        SelectionChanged {
            region_id: region_id.to_string(),
            previous,
            feature,
        }
    }

    /// Returns the previously selected region.
    pub fn clear_selection(&mut self) -> Option<String> {
        self.selected.take()
    }

    pub fn emphasis(&self, region_id: &str) -> Emphasis {
        Emphasis::of(
            self.selected.as_deref() == Some(region_id),
            self.hovered.as_deref() == Some(region_id),
        )
    }

    pub fn style_for(&self, region_id: &str) -> FeatureStyle {
        FeatureStyle::for_emphasis(self.emphasis(region_id))
    }
}
