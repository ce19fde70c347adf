/*
 *  tests/status_integration.rs
 *
 *  End to end tests: sampler -> layout -> frame -> surface
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 */

use std::path::PathBuf;

use pistatus::config::{FontsConfig, SamplerConfig};
use pistatus::display::layout::center_x;
use pistatus::display::{
    DisplaySurface, FontBook, FontDescriptor, FontPolicy, FrameRenderer, HeadlessDriver,
    LayoutEngine, LayoutResult, PageLayout, StackedLayout, TextLine, TextMeasurer,
};
use pistatus::metrics::{detail_line, MetricKind, MetricSampler, MetricValue, SystemSampler};
use pistatus::scheduler::{Cadence, RefreshScheduler, SchedulerSettings, DEFAULT_DWELL};

fn fonts() -> FontBook {
    FontBook::load(&FontsConfig::default()).unwrap()
}

fn assert_stacked_invariants(layout: &LayoutResult, width: u32, height: u32) {
    for p in layout.iter() {
        let (w, _) = TextMeasurer::measure(&p.line.text, &p.line.font);
        assert_eq!(p.x, center_x(width, w), "{:?} not centered", p.line.text);
        assert!(p.y < height as i32);
    }
    for pair in layout.placements().windows(2) {
        assert!(pair[0].bottom() <= pair[1].y, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
}

/// Samples nothing successfully.
struct DeadSampler;

impl MetricSampler for DeadSampler {
    fn sample(&mut self, kind: MetricKind) -> MetricValue {
        MetricValue::Unavailable(kind)
    }
}

#[test]
fn test_stacked_screen_128x64() {
    let fonts = fonts();
    let engine = LayoutEngine::new(128, 64);
    let details = ["CPU: 10.0%", "Temp: 45.0°C", "Disk: 100/200 MB"]
        .into_iter()
        .map(|t| TextLine::new(t, fonts.detail))
        .collect();
    let layout = engine.stacked(
        TextLine::new("192.168.1.10", fonts.headline),
        details,
        &StackedLayout::default(),
    );

    assert_eq!(layout.len(), 4);
    assert_stacked_invariants(&layout, 128, 64);
    let last = &layout.placements()[3];
    assert!(last.bottom() <= 64);

    // 12 chars of 9px, 16 chars of 6px
    assert_eq!(layout.placements()[0].x, 10);
    assert_eq!(layout.placements()[3].x, 16);

    let frame = FrameRenderer::render(engine.canvas(), &layout);
    assert_eq!((frame.width(), frame.height()), (128, 64));
    assert!(frame.count_on_pixels() > 0);
}

#[test]
fn test_long_address_page_uses_fallback_font() {
    let fonts = fonts();
    let policy = SchedulerSettings::new(Cadence::default(), &fonts).policy;
    let engine = LayoutEngine::new(128, 64);

    let long = "192.168.100.200";
    assert_eq!(long.len(), 15);
    let layout = engine.single_page(
        TextLine::new(MetricKind::Ip.title(), fonts.title),
        MetricKind::Ip,
        long,
        &policy,
        &PageLayout::default(),
    );
    assert_eq!(layout.placements()[0].line.text, "Wi-Fi IP");
    assert_eq!(layout.placements()[1].line.font, fonts.value_fallback);
    assert_eq!(layout.placements()[1].line.font.descriptor(), FontDescriptor::bold(13));

    let short = engine.single_page(
        TextLine::new(MetricKind::Ip.title(), fonts.title),
        MetricKind::Ip,
        "10.0.0.7",
        &policy,
        &PageLayout::default(),
    );
    assert_eq!(short.placements()[1].line.font, fonts.value);
}

#[test]
fn test_font_threshold_boundary() {
    let fonts = fonts();
    let policy = SchedulerSettings::new(Cadence::default(), &fonts).policy;
    for len in 1..=20 {
        let value = "9".repeat(len);
        let expected = if len > 12 { fonts.value_fallback } else { fonts.value };
        assert_eq!(policy.select(MetricKind::Ip, &value), expected, "length {}", len);
    }
}

#[test]
fn test_unreadable_thermal_zone_shows_placeholder() {
    let fonts = fonts();
    let sampler = SystemSampler::new(&SamplerConfig {
        thermal_zone: Some(PathBuf::from("/nonexistent/thermal_zone0/temp")),
        ..Default::default()
    });
    let surface = HeadlessDriver::new_with_size(128, 64).unwrap();
    let state = surface.state();
    let settings = SchedulerSettings::new(
        Cadence::Paged { dwell: DEFAULT_DWELL, pages: vec![MetricKind::Temperature] },
        &fonts,
    );
    let mut scheduler = RefreshScheduler::new(sampler, surface, fonts, settings).unwrap();

    for _ in 0..3 {
        let report = scheduler.step().unwrap();
        assert!(report.pushed);
        assert_eq!(report.layout.placements()[1].line.text, "N/A");
    }
    assert_eq!(state.lock().unwrap().push_count, 3);
}

#[test]
fn test_every_kind_fails_soft() {
    for kind in MetricKind::ALL {
        let text = DeadSampler.sample(kind).to_string();
        assert!(!text.is_empty());
        assert_eq!(text, kind.placeholder());
        assert_eq!(detail_line(kind, &DeadSampler.sample(kind)), format!("{}: {}", kind.label(), kind.placeholder()));
    }

    let fonts = fonts();
    let surface = HeadlessDriver::new_with_size(128, 64).unwrap();
    let settings = SchedulerSettings::new(Cadence::default(), &fonts);
    let mut scheduler = RefreshScheduler::new(DeadSampler, surface, fonts, settings).unwrap();
    let report = scheduler.step().unwrap();
    let texts: Vec<&str> = report.layout.iter().map(|p| p.line.text.as_str()).collect();
    assert_eq!(texts, ["No IP", "CPU: N/A", "Temp: N/A", "Disk: N/A"]);
}

#[test]
fn test_layout_invariants_across_canvases() {
    let fonts = fonts();
    let texts = ["", "x", "CPU: 99.9%", "Disk: 14832/29542 MB", "192.168.100.200"];
    for (w, h) in [(0, 0), (1, 1), (32, 16), (64, 48), (128, 32), (128, 64), (256, 64)] {
        let engine = LayoutEngine::new(w, h);
        let details = texts.iter().map(|t| TextLine::new(*t, fonts.detail)).collect();
        let layout = engine.stacked(TextLine::new("10.1.2.3", fonts.headline), details, &StackedLayout::default());
        assert_stacked_invariants(&layout, w, h);

        let page = engine.single_page(
            TextLine::new("Disk", fonts.title),
            MetricKind::Disk,
            "14832/29542 MB",
            &FontPolicy::new(fonts.value),
            &PageLayout::default(),
        );
        assert_stacked_invariants(&page, w, h);

        let frame = FrameRenderer::render(engine.canvas(), &layout);
        assert_eq!((frame.width(), frame.height()), (w, h));
    }
}

#[test]
fn test_rendering_is_bit_identical() {
    let fonts = fonts();
    let engine = LayoutEngine::new(128, 64);
    let layout = engine.single_page(
        TextLine::new("CPU Temp", fonts.title),
        MetricKind::Temperature,
        "45.0°C",
        &FontPolicy::new(fonts.value),
        &PageLayout::default(),
    );
    let a = FrameRenderer::render(engine.canvas(), &layout);
    let b = FrameRenderer::render(engine.canvas(), &layout);
    assert_eq!(a.to_packed_bytes(), b.to_packed_bytes());
    assert_eq!(a.to_packed_bytes().len(), 128 * 64 / 8);
}

#[test]
fn test_headless_surface_receives_rendered_frame() {
    let fonts = fonts();
    let mut surface = HeadlessDriver::new_with_size(128, 32).unwrap();
    surface.init().unwrap();
    let engine = LayoutEngine::new(128, 32);
    let layout = engine.stacked(TextLine::new("10.0.0.7", fonts.headline), vec![], &StackedLayout::default());
    let frame = FrameRenderer::render(engine.canvas(), &layout);
    surface.push(&frame).unwrap();
    assert_eq!(surface.state().lock().unwrap().last_frame.as_ref(), Some(&frame));
}
