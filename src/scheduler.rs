/*
 *  scheduler.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Refresh loop: sample, lay out, render, push, sleep
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::{Config, RefreshMode};
use crate::display::error::DisplayError;
use crate::display::fonts::{Font, FontBook, FontError};
use crate::display::frame::Frame;
use crate::display::layout::{
    FontPolicy, FontRule, LayoutEngine, LayoutResult, PageLayout, StackedLayout, TextLine,
};
use crate::display::render::FrameRenderer;
use crate::display::traits::DisplaySurface;
use crate::metrics::{detail_line, MetricKind, MetricSampler};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_DWELL: Duration = Duration::from_secs(5);
pub const DEFAULT_DETAILS: [MetricKind; 3] = [MetricKind::Cpu, MetricKind::Temperature, MetricKind::Disk];
pub const DEFAULT_PAGES: [MetricKind; 4] =
    [MetricKind::Ip, MetricKind::Cpu, MetricKind::Temperature, MetricKind::Disk];

/// Values longer than this switch to the fallback font. Twelve cells of the
/// 10px value face still fit a 128px panel.
const VALUE_FALLBACK_LEN: usize = 12;

/// Kinds whose values routinely outgrow the value face.
const LONG_VALUE_KINDS: [MetricKind; 3] = [MetricKind::Ip, MetricKind::Disk, MetricKind::Memory];

/// How often the screen changes and what goes on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cadence {
    /// address headline over `details`, all refreshed every `interval`
    AllAtOnce { interval: Duration, details: Vec<MetricKind> },
    /// one metric per screen, each held for `dwell`, round robin
    Paged { dwell: Duration, pages: Vec<MetricKind> },
}

impl Cadence {
    pub fn pause(&self) -> Duration {
        match self {
            Cadence::AllAtOnce { interval, .. } => *interval,
            Cadence::Paged { dwell, .. } => *dwell,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::AllAtOnce { interval: DEFAULT_INTERVAL, details: DEFAULT_DETAILS.to_vec() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Sampling,
    LayingOut,
    Rendering,
    Pushing,
    Idle,
}

/// What a failed push does to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushFailurePolicy {
    /// warn, drop the frame, try again next cycle
    #[default]
    Retry,
    /// stop the loop with the error
    Fatal,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("display push failed")]
    Push(#[source] DisplayError),
    #[error("paged mode needs at least one page")]
    NoPages,
}

/// Outcome of one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// metric shown, paged mode only
    pub page: Option<MetricKind>,
    pub layout: LayoutResult,
    /// states entered this cycle, in order
    pub states: Vec<CycleState>,
    pub pushed: bool,
    /// how long to sit idle before the next cycle
    pub pause: Duration,
}

/// Everything the loop needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub cadence: Cadence,
    pub stacked: StackedLayout,
    pub page: PageLayout,
    pub policy: FontPolicy,
    pub on_push_failure: PushFailurePolicy,
}

impl SchedulerSettings {
    /// Defaults with the standard long-value font rules.
    pub fn new(cadence: Cadence, fonts: &FontBook) -> Self {
        Self {
            cadence,
            stacked: StackedLayout::default(),
            page: PageLayout::default(),
            policy: default_policy(fonts),
            on_push_failure: PushFailurePolicy::default(),
        }
    }

    /// Settings from the merged config. Font rules name their own fonts,
    /// so a bad descriptor there is a startup error like any other font.
    pub fn from_config(cfg: &Config, fonts: &FontBook) -> Result<Self, FontError> {
        let refresh = cfg.refresh.clone().unwrap_or_default();
        let cadence = match refresh.mode.unwrap_or(RefreshMode::Stacked) {
            RefreshMode::Stacked => Cadence::AllAtOnce {
                interval: refresh.interval_secs.map(Duration::from_secs).unwrap_or(DEFAULT_INTERVAL),
                details: refresh.details.unwrap_or_else(|| DEFAULT_DETAILS.to_vec()),
            },
            RefreshMode::Paged => Cadence::Paged {
                dwell: refresh.dwell_secs.map(Duration::from_secs).unwrap_or(DEFAULT_DWELL),
                pages: refresh.pages.unwrap_or_else(|| DEFAULT_PAGES.to_vec()),
            },
        };

        let tuning = cfg.layout.clone().unwrap_or_default();
        let stacked_defaults = StackedLayout::default();
        let page_defaults = PageLayout::default();
        let stacked = StackedLayout {
            top_offset: tuning.top_offset.unwrap_or(stacked_defaults.top_offset),
            headline_gap: tuning.headline_gap.unwrap_or(stacked_defaults.headline_gap),
            line_gap: tuning.line_gap.unwrap_or(stacked_defaults.line_gap),
        };
        let page = PageLayout {
            title_y: tuning.title_y.unwrap_or(page_defaults.title_y),
            value_offset: tuning.value_offset.unwrap_or(page_defaults.value_offset),
        };

        let policy = match cfg.font_rules.as_ref() {
            None => default_policy(fonts),
            Some(rules) => {
                let mut policy = FontPolicy::new(fonts.value);
                for rule in rules {
                    policy = policy.with_rule(FontRule {
                        category: rule.category,
                        max_len: rule.max_len,
                        fallback: Font::load("font rule", rule.font)?,
                    });
                }
                policy
            }
        };

        Ok(Self {
            cadence,
            stacked,
            page,
            policy,
            on_push_failure: refresh.on_push_failure.unwrap_or_default(),
        })
    }
}

fn default_policy(fonts: &FontBook) -> FontPolicy {
    LONG_VALUE_KINDS
        .iter()
        .fold(FontPolicy::new(fonts.value), |policy, &category| {
            policy.with_rule(FontRule {
                category,
                max_len: VALUE_FALLBACK_LEN,
                fallback: fonts.value_fallback,
            })
        })
}

/// Single-threaded refresh loop over one sampler and one surface.
pub struct RefreshScheduler<S: MetricSampler, D: DisplaySurface> {
    sampler: S,
    surface: D,
    fonts: FontBook,
    settings: SchedulerSettings,
    engine: LayoutEngine,
    state: CycleState,
    page_index: usize,
    consecutive_failures: u32,
    cycles: u64,
}

impl<S: MetricSampler, D: DisplaySurface> RefreshScheduler<S, D> {
    /// `surface` must already be initialised; its size is read once here.
    pub fn new(
        sampler: S,
        surface: D,
        fonts: FontBook,
        settings: SchedulerSettings,
    ) -> Result<Self, SchedulerError> {
        if let Cadence::Paged { pages, .. } = &settings.cadence {
            if pages.is_empty() {
                return Err(SchedulerError::NoPages);
            }
        }
        let (width, height) = surface.dimensions();
        Ok(Self {
            sampler,
            surface,
            fonts,
            settings,
            engine: LayoutEngine::new(width, height),
            state: CycleState::Idle,
            page_index: 0,
            consecutive_failures: 0,
            cycles: 0,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Page the next paged cycle will show.
    pub fn next_page(&self) -> Option<MetricKind> {
        match &self.settings.cadence {
            Cadence::Paged { pages, .. } => pages.get(self.page_index).copied(),
            Cadence::AllAtOnce { .. } => None,
        }
    }

    fn enter(&mut self, next: CycleState, trail: &mut Vec<CycleState>) {
        debug!("cycle {}: {:?} -> {:?}", self.cycles, self.state, next);
        self.state = next;
        trail.push(next);
    }

    /// Run one full cycle, without the idle sleep.
    pub fn step(&mut self) -> Result<CycleReport, SchedulerError> {
        let mut trail = Vec::with_capacity(5);
        let cadence = self.settings.cadence.clone();

        self.enter(CycleState::Sampling, &mut trail);
        let (page, layout) = match &cadence {
            Cadence::AllAtOnce { details, .. } => {
                let address = self.sampler.sample(MetricKind::Ip);
                let lines: Vec<String> = details
                    .iter()
                    .map(|&kind| detail_line(kind, &self.sampler.sample(kind)))
                    .collect();

                self.enter(CycleState::LayingOut, &mut trail);
                let headline = TextLine::new(address.to_string(), self.fonts.headline);
                let details = lines
                    .into_iter()
                    .map(|text| TextLine::new(text, self.fonts.detail))
                    .collect();
                (None, self.engine.stacked(headline, details, &self.settings.stacked))
            }
            Cadence::Paged { pages, .. } => {
                let kind = pages[self.page_index % pages.len()];
                let value = self.sampler.sample(kind).to_string();

                self.enter(CycleState::LayingOut, &mut trail);
                let title = TextLine::new(kind.title(), self.fonts.title);
                let layout = self.engine.single_page(
                    title,
                    kind,
                    &value,
                    &self.settings.policy,
                    &self.settings.page,
                );
                (Some(kind), layout)
            }
        };

        self.enter(CycleState::Rendering, &mut trail);
        let frame: Frame = FrameRenderer::render(self.engine.canvas(), &layout);

        self.enter(CycleState::Pushing, &mut trail);
        let outcome = self.surface.push(&frame);

        if let Cadence::Paged { pages, .. } = &cadence {
            self.page_index = (self.page_index + 1) % pages.len();
        }
        self.cycles += 1;
        self.enter(CycleState::Idle, &mut trail);

        let pushed = match outcome {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    info!("Display recovered after {} failed pushes", self.consecutive_failures);
                }
                self.consecutive_failures = 0;
                true
            }
            Err(e) => match self.settings.on_push_failure {
                PushFailurePolicy::Retry => {
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    warn!("Push failed ({} in a row), retrying next cycle: {}", self.consecutive_failures, e);
                    false
                }
                PushFailurePolicy::Fatal => {
                    error!("Push failed: {}", e);
                    return Err(SchedulerError::Push(e));
                }
            },
        };

        Ok(CycleReport { page, layout, states: trail, pushed, pause: cadence.pause() })
    }

    /// Cycle forever. Returns only when a push failure is fatal.
    ///
    /// Sampling may block (the cpu window), so on a multi-threaded runtime
    /// each cycle runs under `block_in_place` and other tasks keep moving.
    pub async fn run(&mut self) -> Result<(), SchedulerError> {
        match &self.settings.cadence {
            Cadence::AllAtOnce { interval, details } =>
                info!("Stacked refresh every {:?} ({} detail lines)", interval, details.len()),
            Cadence::Paged { dwell, pages } =>
                info!("Paged refresh, {} pages held {:?} each", pages.len(), dwell),
        }
        loop {
            let report = match Handle::current().runtime_flavor() {
                RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| self.step()),
                _ => self.step(),
            }?;
            tokio::time::sleep(report.pause).await;
        }
    }

    /// Blank the panel, e.g. on the way out.
    pub fn blank(&mut self) -> Result<(), DisplayError> {
        self.surface.clear()
    }
}
