/*
 *  display/layout.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Centered text layout for stacked and single-page screens
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

use embedded_graphics::geometry::Size;

use crate::display::fonts::{Font, TextMeasurer};
use crate::metrics::MetricKind;

/// A string to draw and the font to draw it in. Built fresh every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font: Font,
}

impl TextLine {
    pub fn new(text: impl Into<String>, font: Font) -> Self {
        Self { text: text.into(), font }
    }
}

/// A line with its top-left position and measured extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub line: TextLine,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// First row below the line.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(to_i32(self.height))
    }
}

/// Ordered placements for one frame.
///
/// Placements never overlap vertically and are listed top to bottom.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult {
    placements: Vec<Placement>,
}

impl LayoutResult {
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Vertical spacing for the headline-over-details screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackedLayout {
    /// y of the headline; slightly negative reclaims the font's top padding
    pub top_offset: i32,
    /// rows between headline and first detail line
    pub headline_gap: u32,
    /// rows between detail lines
    pub line_gap: u32,
}

impl Default for StackedLayout {
    fn default() -> Self {
        Self { top_offset: -2, headline_gap: 4, line_gap: 1 }
    }
}

/// Positioning for the title/value page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub title_y: i32,
    /// added to the vertically centered value position
    pub value_offset: i32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self { title_y: 5, value_offset: 5 }
    }
}

/// Values under `category` longer than `max_len` characters use `fallback`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontRule {
    pub category: MetricKind,
    pub max_len: usize,
    pub fallback: Font,
}

/// Table-driven value font selection for paged screens.
#[derive(Debug, Clone, PartialEq)]
pub struct FontPolicy {
    default: Font,
    rules: Vec<FontRule>,
}

impl FontPolicy {
    pub fn new(default: Font) -> Self {
        Self { default, rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: FontRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FontRule] {
        &self.rules
    }

    /// First matching rule wins; no match keeps the default font.
    pub fn select(&self, category: MetricKind, value: &str) -> Font {
        let len = value.chars().count();
        self.rules
            .iter()
            .find(|r| r.category == category && len > r.max_len)
            .map(|r| r.fallback)
            .unwrap_or(self.default)
    }
}

/// `floor((canvas_width - line_width) / 2)`; negative when the line is wider
/// than the canvas.
pub fn center_x(canvas_width: u32, line_width: u32) -> i32 {
    to_i32(canvas_width).saturating_sub(to_i32(line_width)).div_euclid(2)
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Computes placements for a fixed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEngine {
    canvas: Size,
}

impl LayoutEngine {
    pub fn new(width: u32, height: u32) -> Self {
        Self { canvas: Size::new(width, height) }
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    fn is_degenerate(&self) -> bool {
        self.canvas.width == 0 || self.canvas.height == 0
    }

    fn place(&self, line: TextLine, y: i32) -> Placement {
        let (width, height) = TextMeasurer::measure(&line.text, &line.font);
        Placement { x: center_x(self.canvas.width, width), y, width, height, line }
    }

    /// Lines starting at or below the bottom edge are dropped; partly
    /// visible lines stay and get clipped when drawn.
    fn visible(&self, placement: &Placement) -> bool {
        placement.y < to_i32(self.canvas.height) && placement.bottom() > 0
    }

    /// Headline on top, detail lines stacked beneath it.
    pub fn stacked(
        &self,
        headline: TextLine,
        details: Vec<TextLine>,
        params: &StackedLayout,
    ) -> LayoutResult {
        if self.is_degenerate() {
            return LayoutResult::default();
        }

        let mut placements = Vec::with_capacity(details.len() + 1);
        let head = self.place(headline, params.top_offset);
        let mut cursor = head.bottom().saturating_add(to_i32(params.headline_gap));
        placements.push(head);

        for line in details {
            let placed = self.place(line, cursor);
            cursor = placed.bottom().saturating_add(to_i32(params.line_gap));
            placements.push(placed);
        }

        placements.retain(|p| self.visible(p));
        LayoutResult { placements }
    }

    /// Small title near the top, one value line centered in the canvas.
    pub fn single_page(
        &self,
        title: TextLine,
        category: MetricKind,
        value: &str,
        policy: &FontPolicy,
        params: &PageLayout,
    ) -> LayoutResult {
        if self.is_degenerate() {
            return LayoutResult::default();
        }

        let title = self.place(title, params.title_y);
        let value_line = TextLine::new(value, policy.select(category, value));
        let (_, value_height) = TextMeasurer::measure(&value_line.text, &value_line.font);
        let centered = to_i32(self.canvas.height)
            .saturating_sub(to_i32(value_height))
            .div_euclid(2)
            .saturating_add(params.value_offset);
        // never ride up into the title
        let value = self.place(value_line, centered.max(title.bottom()));

        let mut placements = vec![title, value];
        placements.retain(|p| self.visible(p));
        LayoutResult { placements }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::fonts::FontDescriptor;

    fn font(d: FontDescriptor) -> Font {
        Font::load("test", d).unwrap()
    }

    fn assert_no_overlap(layout: &LayoutResult) {
        for pair in layout.placements().windows(2) {
            assert!(pair[0].bottom() <= pair[1].y, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_center_x_floors() {
        assert_eq!(center_x(128, 60), 34);
        assert_eq!(center_x(128, 61), 33);
        assert_eq!(center_x(128, 128), 0);
        // wider than the canvas goes negative, still floored
        assert_eq!(center_x(128, 131), -2);
        assert_eq!(center_x(0, 0), 0);
    }

    #[test]
    fn test_stacked_positions() {
        let engine = LayoutEngine::new(128, 64);
        let big = font(FontDescriptor::bold(18));
        let small = font(FontDescriptor::regular(13));
        let layout = engine.stacked(
            TextLine::new("192.168.1.10", big),
            vec![TextLine::new("CPU: 10.0%", small), TextLine::new("Temp: 45.0°C", small)],
            &StackedLayout::default(),
        );
        let p = layout.placements();
        assert_eq!(p.len(), 3);
        assert_eq!((p[0].x, p[0].y), (10, -2));
        // headline height + 2, as the details always sat
        assert_eq!(p[1].y, 20);
        assert_eq!(p[1].x, 34);
        assert_eq!(p[2].y, 34);
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_stacked_drops_lines_below_canvas() {
        let engine = LayoutEngine::new(128, 32);
        let small = font(FontDescriptor::regular(13));
        let details = (0..5).map(|i| TextLine::new(format!("line {i}"), small)).collect();
        let layout = engine.stacked(TextLine::new("head", small), details, &StackedLayout::default());
        assert!(layout.len() < 6);
        for p in layout.iter() {
            assert!(p.y < 32);
        }
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_zero_canvas_is_empty() {
        let small = font(FontDescriptor::regular(13));
        for (w, h) in [(0, 64), (128, 0), (0, 0)] {
            let engine = LayoutEngine::new(w, h);
            assert!(engine
                .stacked(TextLine::new("x", small), vec![TextLine::new("y", small)], &StackedLayout::default())
                .is_empty());
            assert!(engine
                .single_page(TextLine::new("t", small), MetricKind::Cpu, "v", &FontPolicy::new(small), &PageLayout::default())
                .is_empty());
        }
    }

    #[test]
    fn test_font_policy_threshold() {
        let large = font(FontDescriptor::regular(20));
        let medium = font(FontDescriptor::bold(13));
        let policy = FontPolicy::new(large)
            .with_rule(FontRule { category: MetricKind::Ip, max_len: 12, fallback: medium });

        assert_eq!(policy.select(MetricKind::Ip, "192.168.1.10"), large); // 12 chars
        assert_eq!(policy.select(MetricKind::Ip, "192.168.100.20"), medium); // 14 chars
        // the rule is scoped to its category
        assert_eq!(policy.select(MetricKind::Disk, "14832/29542 MB"), large);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let large = font(FontDescriptor::regular(20));
        let medium = font(FontDescriptor::bold(13));
        let small = font(FontDescriptor::regular(10));
        let policy = FontPolicy::new(large)
            .with_rule(FontRule { category: MetricKind::Disk, max_len: 16, fallback: small })
            .with_rule(FontRule { category: MetricKind::Disk, max_len: 10, fallback: medium });
        assert_eq!(policy.select(MetricKind::Disk, "100/200 MB"), large);
        assert_eq!(policy.select(MetricKind::Disk, "1000/2000 MB"), medium);
        assert_eq!(policy.select(MetricKind::Disk, "14832/29542 MB MB"), small);
    }

    #[test]
    fn test_single_page_positions() {
        let engine = LayoutEngine::new(128, 64);
        let title_font = font(FontDescriptor::regular(10));
        let large = font(FontDescriptor::regular(20));
        let layout = engine.single_page(
            TextLine::new("CPU Load", title_font),
            MetricKind::Cpu,
            "12.5%",
            &FontPolicy::new(large),
            &PageLayout::default(),
        );
        let p = layout.placements();
        assert_eq!(p.len(), 2);
        assert_eq!((p[0].x, p[0].y), (40, 5));
        // (64 - 20) / 2 + 5
        assert_eq!((p[1].x, p[1].y), (39, 27));
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_single_page_value_stays_below_title() {
        let engine = LayoutEngine::new(128, 20);
        let title_font = font(FontDescriptor::regular(10));
        let large = font(FontDescriptor::regular(20));
        let layout = engine.single_page(
            TextLine::new("Disk", title_font),
            MetricKind::Disk,
            "1/2 MB",
            &FontPolicy::new(large),
            &PageLayout { title_y: 5, value_offset: -10 },
        );
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_wide_text_goes_negative_without_wrapping() {
        let engine = LayoutEngine::new(64, 64);
        let large = font(FontDescriptor::regular(20));
        let layout = engine.stacked(TextLine::new("192.168.100.200", large), vec![], &StackedLayout::default());
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.placements()[0].x, (64 - 150) / 2);
    }
}
