//! Files written for a comparison.
//!
//! ```text
//! <out>/availability.json
//! <out>/slot-0-lj/status.json
//! <out>/slot-0-lj/legend.png
//! <out>/slot-0-lj/tiles/{z}/{x}/{y}.png
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ntl_common::tile::{tiles_covering, MAX_ZOOM};
use ntl_common::{MapSurface, ProductType, TileRange, TileSource};
use renderer::{encode_image, encode_png, LegendRenderer};
use serde_json::json;
use tracing::{debug, info, warn};
use viewer::{DateAvailability, SlotDriver, SlotStatus};

pub fn slot_dir_name(index: usize, product: ProductType) -> String {
    format!("slot-{}-{}", index, product.id())
}

pub fn write_availability(out_dir: &Path, availability: &DateAvailability) -> Result<()> {
    let dates: Vec<String> = availability.dates().map(|d| d.to_string()).collect();
    let doc = json!({
        "region": availability.region_id(),
        "min_date": availability.min_date(),
        "max_date": availability.max_date(),
        "years": availability.years(),
        "months": availability.months(),
        "dates": dates,
    });
    write_json(&out_dir.join("availability.json"), &doc)
}

/// Write status, legend and tiles of one slot. Returns the number of tiles.
pub fn write_slot(
    out_dir: &Path,
    driver: &SlotDriver,
    date: Option<NaiveDate>,
    zoom: Option<u32>,
    max_tiles: usize,
    legend_renderer: &LegendRenderer,
) -> Result<usize> {
    let product = driver.product();
    let dir = out_dir.join(slot_dir_name(driver.index(), product));
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let status = driver.status();
    let renderer = driver.renderer();
    let view = driver.surface().get_view();
    let imaging = date.and_then(|d| product.mission().map(|m| m.imaging_datetime(d)));

    let (state, error) = match &status {
        SlotStatus::Empty => ("empty", None),
        SlotStatus::NoData => ("no_data", None),
        SlotStatus::BaseMapOnly => ("base_map_only", None),
        SlotStatus::Loading => ("loading", None),
        SlotStatus::Ready => ("ready", None),
        SlotStatus::Errored { category, message } => (
            "errored",
            Some(json!({ "category": category, "message": message })),
        ),
    };

    let mut tiles = 0;
    if let (Some(overlay), Some(legend)) = (renderer.overlay(), renderer.legend()) {
        let png = encode_image(&legend_renderer.render(legend))?;
        write_bytes(&dir.join("legend.png"), &png)?;

        let z = zoom.unwrap_or(view.zoom.max(0) as u32).min(MAX_ZOOM);
        let total = TileRange::covering(&overlay.bounds(), z).map_or(0, |r| r.tile_count());
        if total > max_tiles as u64 {
            warn!(
                slot = driver.index(),
                zoom = z,
                tiles = total,
                limit = max_tiles,
                "Too many tiles, writing the first ones only"
            );
        }

        let size = overlay.tile_size() as usize;
        for coord in tiles_covering(&overlay.bounds(), z).take(max_tiles) {
            let Some(pixels) = overlay.render_tile(coord) else {
                continue;
            };
            let png = encode_png(&pixels, size, size)?;
            write_bytes(&dir.join("tiles").join(format!("{}.png", coord.path())), &png)?;
            tiles += 1;
        }
        info!(slot = driver.index(), product = %product, tiles = tiles, zoom = z, "Slot written");
    }

    let doc = json!({
        "index": driver.index(),
        "product": product.id(),
        "name": product.display_name(),
        "status": state,
        "error": error,
        "url": renderer.url(),
        "imaging_datetime": imaging.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        "view": view,
        "legend": renderer.legend().map(|l| json!({
            "descriptor": l,
            "css": l.gradient_css(),
        })),
        "tiles": tiles,
    });
    write_json(&dir.join("status.json"), &doc)?;
    Ok(tiles)
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    write_bytes(path, serde_json::to_string_pretty(value)?.as_bytes())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}
