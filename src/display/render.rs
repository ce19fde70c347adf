/*
 *  display/render.rs
 *
 *  PiStatus - host status at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Draws a laid out screen onto a fresh frame
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
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::display::frame::Frame;
use crate::display::layout::LayoutResult;

/// Stateless: same inputs, same bits.
pub struct FrameRenderer;

impl FrameRenderer {
    pub fn render(canvas: Size, layout: &LayoutResult) -> Frame {
        let mut frame = Frame::new(canvas.width, canvas.height);
        for placement in layout.iter() {
            let style = MonoTextStyle::new(placement.line.font.face(), BinaryColor::On);
            let origin = Point::new(placement.x, placement.y);
            let Ok(_) = Text::with_baseline(&placement.line.text, origin, style, Baseline::Top)
                .draw(&mut frame);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::fonts::{Font, FontDescriptor};
    use crate::display::layout::{LayoutEngine, StackedLayout, TextLine};

    fn sample_layout() -> LayoutResult {
        let big = Font::load("test", FontDescriptor::bold(18)).unwrap();
        let small = Font::load("test", FontDescriptor::regular(13)).unwrap();
        LayoutEngine::new(128, 64).stacked(
            TextLine::new("10.0.0.7", big),
            vec![TextLine::new("CPU: 3.0%", small), TextLine::new("Temp: 41.2°C", small)],
            &StackedLayout::default(),
        )
    }

    #[test]
    fn test_empty_layout_renders_blank() {
        let frame = FrameRenderer::render(Size::new(128, 64), &LayoutResult::default());
        assert_eq!(frame.count_on_pixels(), 0);
        assert_eq!(frame.size(), Size::new(128, 64));
    }

    #[test]
    fn test_render_is_idempotent() {
        let layout = sample_layout();
        let a = FrameRenderer::render(Size::new(128, 64), &layout);
        let b = FrameRenderer::render(Size::new(128, 64), &layout);
        assert!(a.count_on_pixels() > 0);
        assert_eq!(a, b);
        assert_eq!(a.to_packed_bytes(), b.to_packed_bytes());
    }

    #[test]
    fn test_text_stays_inside_its_placement() {
        let layout = sample_layout();
        let frame = FrameRenderer::render(Size::new(128, 64), &layout);
        for Pixel(p, _) in frame.lit_pixels() {
            let inside = layout.iter().any(|pl| {
                p.x >= pl.x && p.x < pl.x + pl.width as i32 && p.y >= pl.y && p.y < pl.bottom()
            });
            assert!(inside, "stray pixel at {:?}", p);
        }
    }

    #[test]
    fn test_offscreen_text_is_clipped() {
        let big = Font::load("test", FontDescriptor::regular(20)).unwrap();
        let layout = LayoutEngine::new(32, 16)
            .stacked(TextLine::new("192.168.100.200", big), vec![], &StackedLayout::default());
        let frame = FrameRenderer::render(Size::new(32, 16), &layout);
        assert_eq!(frame.size(), Size::new(32, 16));
        assert!(frame.count_on_pixels() > 0);
    }
}
