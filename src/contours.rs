use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;
use tracing::{ debug, trace };

/// A closed border found in an edge map, reduced to the vertices where its
/// direction changes. The enclosed area is computed once on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
    area: f64,
}

impl Contour {

    pub fn new(points: Vec<Point<i32>>) -> Self {
        let area = polygon_area(&points);
        Self { points, area }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Absolute enclosed area (shoelace formula over the vertices).
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Smallest axis aligned box holding every vertex, pixel inclusive.
    pub fn bounding_rect(&self) -> PlateRect {
        let mut iter = self.points.iter();
        let first = match iter.next() {
            Some(p) => p,
            None => return PlateRect::placeholder(),
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        // only the part at non negative coordinates can map onto an image
        if max_x < 0 || max_y < 0 {
            return PlateRect::placeholder();
        }
        let (min_x, min_y) = (min_x.max(0), min_y.max(0));
        PlateRect {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }
    }
}

/// Axis aligned rectangle in pixel units.
///
/// The all-zero value is the placeholder standing in for a contour that was
/// rejected as not rectangular, so that `rects[i]` still belongs to
/// `contours[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlateRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PlateRect {

    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// height / width, or 0 for a rect without width.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        self.height as f64 / self.width as f64
    }
}

/// Finds every border (outer borders and holes) in `edges` and sorts them by
/// enclosed area, smallest first.
///
/// The sort is stable: contours of equal area stay in the order border
/// following met them, which is the raster order of their first pixel.
pub fn rank(edges: &GrayImage) -> Vec<Contour> {
    let mut contours: Vec<Contour> = find_contours::<i32>(edges)
        .into_iter()
        .map(|c| Contour::new(simplify_chain(&c.points)))
        .collect();
    contours.sort_by(|a, b| a.area().total_cmp(&b.area()));
    debug!(contours = contours.len(), "ranked contours");
    contours
}

/// Bounding rect of every contour that nearly fills it, a placeholder for
/// the rest. The output always has the length of `contours`.
pub fn filter_rectangles(contours: &[Contour], rect_threshold: f64) -> Vec<PlateRect> {
    let rects: Vec<PlateRect> = contours.iter().map(|contour| {
        let bounding = contour.bounding_rect();
        let difference = bounding.area() as f64 - contour.area();
        if difference < rect_threshold {
            bounding
        } else {
            trace!(?bounding, difference, "not rectangular");
            PlateRect::placeholder()
        }
    }).collect();
    debug!(
        kept = rects.iter().filter(|r| !r.is_placeholder()).count(),
        total = rects.len(),
        "filtered rectangles"
    );
    rects
}

/// Drops every point that continues a straight horizontal, vertical or
/// diagonal run, leaving only the segment end points of the closed chain.
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let len = points.len();
    if len < 3 {
        return points.to_vec();
    }
    let step = |from: &Point<i32>, to: &Point<i32>| ((to.x - from.x).signum(), (to.y - from.y).signum());
    points.iter().enumerate().filter(|(i, current)| {
        let prev = &points[(i + len - 1) % len];
        let next = &points[(i + 1) % len];
        step(prev, current) != step(current, next)
    }).map(|(_, p)| *p).collect()
}

/// Absolute area of the closed polygon through `points`.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points.iter().zip(points.iter().cycle().skip(1)).map(|(a, b)| {
        a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
    }).sum();
    (twice as f64 / 2.0).abs()
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, Luma };
    use imageproc::{ drawing, rect::Rect };
    use imageproc::point::Point;

    use super::*;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point<i32>> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn area_of_simple_shapes() {
        assert_eq!(polygon_area(&pts(&[(0, 0), (99, 0), (99, 49), (0, 49)])), 99.0 * 49.0);
        // orientation does not matter
        assert_eq!(polygon_area(&pts(&[(0, 0), (0, 49), (99, 49), (99, 0)])), 99.0 * 49.0);
        assert_eq!(polygon_area(&pts(&[(0, 0), (4, 0), (0, 3)])), 6.0);
        assert_eq!(polygon_area(&pts(&[(0, 0), (5, 5)])), 0.0);
        assert_eq!(polygon_area(&[]), 0.0);
    }

    #[test]
    fn chain_keeps_only_corners() {
        let square = pts(&[
            (0, 0), (1, 0), (2, 0),
            (2, 1), (2, 2),
            (1, 2), (0, 2),
            (0, 1),
        ]);
        assert_eq!(simplify_chain(&square), pts(&[(0, 0), (2, 0), (2, 2), (0, 2)]));

        let line = pts(&[(0, 0), (1, 0), (2, 0), (3, 0), (2, 0), (1, 0)]);
        assert_eq!(simplify_chain(&line), pts(&[(0, 0), (3, 0)]));

        let diamond = pts(&[(1, 0), (2, 1), (1, 2), (0, 1)]);
        assert_eq!(simplify_chain(&diamond), diamond);

        let single = pts(&[(4, 4)]);
        assert_eq!(simplify_chain(&single), single);
    }

    #[test]
    fn bounding_rect_is_pixel_inclusive() {
        let contour = Contour::new(pts(&[(3, 4), (12, 4), (12, 8), (3, 8)]));
        assert_eq!(contour.bounding_rect(), PlateRect { x: 3, y: 4, width: 10, height: 5 });

        let dot = Contour::new(pts(&[(7, 7)]));
        assert_eq!(dot.bounding_rect(), PlateRect { x: 7, y: 7, width: 1, height: 1 });
        assert_eq!(Contour::new(Vec::new()).bounding_rect(), PlateRect::placeholder());
    }

    #[test]
    fn bounding_rect_clips_negative_points() {
        let straddling = Contour::new(pts(&[(-5, -3), (10, -3), (10, 10), (-5, 10)]));
        assert_eq!(straddling.bounding_rect(), PlateRect { x: 0, y: 0, width: 11, height: 11 });

        let outside = Contour::new(pts(&[(-9, 2), (-2, 2), (-2, 6), (-9, 6)]));
        assert!(outside.bounding_rect().is_placeholder());
    }

    #[test]
    fn rank_sorts_ascending_by_area() {
        let mut edges = GrayImage::new(120, 100);
        drawing::draw_hollow_rect_mut(&mut edges, Rect::at(10, 10).of_size(20, 10), Luma([255]));
        drawing::draw_hollow_rect_mut(&mut edges, Rect::at(40, 30).of_size(60, 50), Luma([255]));
        drawing::draw_hollow_rect_mut(&mut edges, Rect::at(5, 60).of_size(8, 8), Luma([255]));

        let contours = rank(&edges);
        assert!(contours.len() >= 3);
        assert!(contours.windows(2).all(|w| w[0].area() <= w[1].area()));

        let largest = contours.last().unwrap();
        assert_eq!(largest.bounding_rect(), PlateRect { x: 40, y: 30, width: 60, height: 50 });
        assert_eq!(largest.points().len(), 4);
    }

    #[test]
    fn rank_on_blank_map_is_empty() {
        assert!(rank(&GrayImage::new(50, 50)).is_empty());
    }

    #[test]
    fn filter_keeps_length_and_marks_rejects() {
        let plate = Contour::new(pts(&[(0, 0), (99, 0), (99, 49), (0, 49)]));
        // thin L whose box is mostly empty
        let ell = Contour::new(pts(&[(0, 0), (10, 0), (10, 190), (200, 190), (200, 200), (0, 200)]));
        let contours = vec![plate.clone(), ell.clone(), plate.clone()];

        let rects = filter_rectangles(&contours, 10000.0);
        assert_eq!(rects.len(), contours.len());
        assert_eq!(rects[0], PlateRect { x: 0, y: 0, width: 100, height: 50 });
        assert_eq!(rects[1], PlateRect::placeholder());
        assert_eq!(rects[1].area(), 0);
        assert_eq!(rects[2], rects[0]);

        for (rect, contour) in rects.iter().zip(&contours) {
            if !rect.is_placeholder() {
                assert!((rect.area() as f64 - contour.area()) < 10000.0);
            }
        }

        // a looser threshold lets the L through
        let rects = filter_rectangles(&contours, 50000.0);
        assert_eq!(rects[1], PlateRect { x: 0, y: 0, width: 201, height: 201 });
    }

    #[test]
    fn filter_of_nothing_is_nothing() {
        assert!(filter_rectangles(&[], 10000.0).is_empty());
    }

    #[test]
    fn placeholder_aspect_is_zero() {
        let rect = PlateRect::placeholder();
        assert!(rect.is_placeholder());
        assert_eq!(rect.aspect(), 0.0);
        assert_eq!(PlateRect { x: 0, y: 0, width: 100, height: 50 }.aspect(), 0.5);
    }
}
