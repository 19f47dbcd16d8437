//! One comparison run: resolve the query, load every slot, write outputs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use client::{ApiClient, RasterFetcher, RasterSource};
use futures::future::join_all;
use ntl_common::{HeadlessSurface, ProductType, ViewportState};
use renderer::LegendRenderer;
use tracing::{info, warn};
use viewer::{
    ComparisonSessionController, ExploreQuery, RegionFeature, SlotDriver, SlotStatus,
    ViewerConfig, ViewportSyncCoordinator,
};

use crate::output;

pub struct CompareOptions {
    pub config: ViewerConfig,
    pub query: ExploreQuery,
    pub out_dir: PathBuf,
    /// Tile zoom; the slot's fitted zoom when `None`.
    pub zoom: Option<u32>,
    pub max_tiles: usize,
    /// Fresh re-fetches granted to a failed slot.
    pub retries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotSummary {
    pub index: usize,
    pub product: ProductType,
    pub status: SlotStatus,
    pub tiles: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareSummary {
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
    pub slots: Vec<SlotSummary>,
}

impl CompareSummary {
    pub fn failed_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.status, SlotStatus::Errored { .. }))
            .count()
    }
}

/// Run a comparison. Must be polled inside a [`tokio::task::LocalSet`].
///
/// Without an open comparison (region, date and `compare=true`) only the
/// date availability is written.
pub async fn run(options: CompareOptions) -> Result<CompareSummary> {
    let CompareOptions {
        config,
        query,
        out_dir,
        zoom,
        max_tiles,
        retries,
    } = options;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let api = ApiClient::new(config.api.clone())?;
    let fetcher: Arc<dyn RasterSource> = Arc::new(RasterFetcher::new(&config.api)?);
    let mut session = ComparisonSessionController::open(config.session.clone());

    match api.dates().await {
        Ok(dates) => session.set_global_dates(dates),
        Err(e) => warn!(error = %e, "Failed to load available dates"),
    }

    let mut summary = CompareSummary::default();
    let Some(region_id) = query.admin.clone() else {
        info!("No region selected");
        output::write_availability(&out_dir, session.availability())?;
        return Ok(summary);
    };
    summary.region = Some(region_id.clone());

    session.set_region(Some(region_id.clone()));
    match api.region_dates(&region_id).await {
        Ok(dates) => session.set_region_dates(&region_id, dates),
        Err(e) => warn!(region = %region_id, error = %e, "Failed to load region dates"),
    }

    if !query.is_compare_open() {
        info!(region = %region_id, "Comparison not requested");
        output::write_availability(&out_dir, session.availability())?;
        return Ok(summary);
    }
    session.set_date(query.date);
    summary.date = query.date;

    let initial_view = match api.admin_area(&region_id, config.boundaries.resolution).await {
        Ok(feature) => match RegionFeature::from_value(feature, &config.boundaries.id_property) {
            Ok(region) => {
                info!(region = %region.id, name = ?region.attributes.name, "Region loaded");
                region.initial_view()
            }
            Err(e) => {
                warn!(region = %region_id, error = %e, "Unreadable region feature");
                ViewportState::default()
            }
        },
        Err(e) => {
            warn!(region = %region_id, error = %e, "Failed to load region feature");
            ViewportState::default()
        }
    };

    let slots = session.slots().unwrap_or_default().to_vec();
    let sync = ViewportSyncCoordinator::new();
    let mut drivers = Vec::with_capacity(slots.len());
    for (index, product) in slots.into_iter().enumerate() {
        let surface = HeadlessSurface::with_view(format!("slot-{}", index), initial_view)
            .into_handle();
        sync.register(index, surface.clone());
        let mut driver = SlotDriver::new(index, product, surface, &config, fetcher.clone())?;
        driver.show(session.slot_request(index, &config.api));
        drivers.push(driver);
    }

    join_all(drivers.iter_mut().map(|d| d.settle())).await;

    for _ in 0..retries {
        let retried: Vec<usize> = drivers
            .iter_mut()
            .filter(|d| matches!(d.status(), SlotStatus::Errored { .. }))
            .filter_map(|d| d.retry().then_some(d.index()))
            .collect();
        if retried.is_empty() {
            break;
        }
        warn!(slots = ?retried, "Retrying failed slots");
        join_all(drivers.iter_mut().map(|d| d.settle())).await;
    }

    let legend_renderer = legend_renderer(&config);
    for driver in &drivers {
        let tiles = output::write_slot(
            &out_dir,
            driver,
            query.date,
            zoom,
            max_tiles,
            &legend_renderer,
        )?;
        summary.slots.push(SlotSummary {
            index: driver.index(),
            product: driver.product(),
            status: driver.status(),
            tiles,
        });
    }
    sync.clear();
    Ok(summary)
}

fn legend_renderer(config: &ViewerConfig) -> LegendRenderer {
    match &config.legend.font_path {
        Some(path) => LegendRenderer::with_font_file(path).unwrap_or_else(|e| {
            warn!(error = %e, "Legend font unavailable, drawing legends without text");
            LegendRenderer::without_font()
        }),
        None => LegendRenderer::without_font(),
    }
}
