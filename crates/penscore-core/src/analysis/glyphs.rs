//! Glyph bounding boxes from external contours.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned bounding box of one outer contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Bounding boxes of the outermost contours of a binary image.
///
/// Contours nested inside another shape (holes and their contents) are skipped.
pub fn glyph_boxes(binary: &GrayImage) -> Vec<GlyphBox> {
    find_contours::<u32>(binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| bounding_box(&c.points))
        .collect()
}

fn bounding_box(points: &[Point<u32>]) -> Option<GlyphBox> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);

    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    Some(GlyphBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_boxes_match_drawn_rects() {
        let mut img = GrayImage::new(100, 60);
        draw_filled_rect_mut(&mut img, Rect::at(10, 5).of_size(8, 30), Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(50, 20).of_size(12, 15), Luma([255]));

        let mut boxes = glyph_boxes(&img);
        boxes.sort_by_key(|b| b.x);

        assert_eq!(
            boxes,
            vec![
                GlyphBox { x: 10, y: 5, width: 8, height: 30 },
                GlyphBox { x: 50, y: 20, width: 12, height: 15 },
            ]
        );
    }

    #[test]
    fn test_ring_counts_once() {
        let mut img = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(40, 40), Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(20, 20), Luma([0]));
        // dot inside the hole
        draw_filled_rect_mut(&mut img, Rect::at(28, 28).of_size(4, 4), Luma([255]));

        let boxes = glyph_boxes(&img);
        assert_eq!(boxes, vec![GlyphBox { x: 10, y: 10, width: 40, height: 40 }]);
    }

    #[test]
    fn test_blank_image() {
        assert!(glyph_boxes(&GrayImage::new(20, 20)).is_empty());
    }
}
