use tracing::{ debug, trace };

use crate::config::SelectorConfig;
use crate::contours::PlateRect;

/// Outcome of scoring the candidate rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// There was nothing to score.
    Empty,
    /// The best scoring entry is a rejected (placeholder) position. Only
    /// happens when every real rectangle in the window scored worse than a
    /// zero aspect.
    Rejected { index: usize },
    Candidate { index: usize, rect: PlateRect, aspect_error: f64 },
}

impl Selection {

    /// Index into the rectangle (and contour) list, if anything was picked.
    pub fn index(&self) -> Option<usize> {
        match self {
            Selection::Empty => None,
            Selection::Rejected { index } | Selection::Candidate { index, .. } => Some(*index),
        }
    }

    /// The picked rectangle, unless it is a placeholder.
    pub fn plate(&self) -> Option<(usize, PlateRect)> {
        match self {
            Selection::Candidate { index, rect, .. } => Some((*index, *rect)),
            _ => None,
        }
    }
}

/// Picks the rectangle whose height / width is closest to the target aspect.
///
/// `rects` is expected in ascending area order, only the last
/// `max_rects_to_consider` entries are scored. Placeholders are scored like
/// any other rect (aspect 0). Scanning runs from the largest down and only a
/// strictly lower error replaces the best, so ties go to the larger area.
pub fn select(rects: &[PlateRect], config: &SelectorConfig) -> Selection {
    let start = rects.len().saturating_sub(config.max_rects_to_consider);
    let mut best: Option<(usize, f64)> = None;
    for (index, rect) in rects.iter().enumerate().skip(start).rev() {
        let error = (rect.aspect() - config.target_aspect).abs();
        trace!(index, ?rect, error, "scored rectangle");
        match best {
            Some((_, lowest)) if error >= lowest => {}
            _ => best = Some((index, error)),
        }
    }

    let selection = match best {
        None => Selection::Empty,
        Some((index, _)) if rects[index].is_placeholder() => Selection::Rejected { index },
        Some((index, aspect_error)) => Selection::Candidate { index, rect: rects[index], aspect_error },
    };
    debug!(?selection, "selected plate");
    selection
}


#[cfg(test)]
mod test {

    use super::*;

    fn rect(width: u32, height: u32) -> PlateRect {
        PlateRect { x: 0, y: 0, width, height }
    }

    #[test]
    fn empty_input_is_empty() {
        let sel = select(&[], &SelectorConfig::default());
        assert_eq!(sel, Selection::Empty);
        assert_eq!(sel.index(), None);
        assert_eq!(sel.plate(), None);
    }

    #[test]
    fn single_rect_is_index_zero() {
        let sel = select(&[rect(30, 90)], &SelectorConfig::default());
        assert_eq!(sel.index(), Some(0));
    }

    #[test]
    fn best_aspect_wins() {
        let rects = [rect(100, 50), rect(10, 10), PlateRect::placeholder()];
        let sel = select(&rects, &SelectorConfig::default());
        assert_eq!(sel, Selection::Candidate { index: 0, rect: rect(100, 50), aspect_error: 0.0 });
    }

    #[test]
    fn all_placeholders_is_a_soft_failure() {
        // placeholders stay in the scan; when nothing else exists one of them
        // comes back, flagged as rejected
        let rects = [PlateRect::placeholder(); 3];
        let sel = select(&rects, &SelectorConfig::default());
        let index = match sel {
            Selection::Rejected { index } => index,
            other => panic!("expected a rejected pick, got {:?}", other),
        };
        assert!(index < rects.len());
        assert_eq!(rects[index].area(), 0);
        assert_eq!(sel.plate(), None);
    }

    #[test]
    fn placeholder_beats_a_worse_real_rect() {
        // aspect 3.0 is further from 0.5 than a placeholder's 0.0
        let rects = [rect(10, 30), PlateRect::placeholder()];
        let sel = select(&rects, &SelectorConfig::default());
        assert_eq!(sel, Selection::Rejected { index: 1 });
    }

    #[test]
    fn only_largest_ten_are_considered() {
        let mut rects = vec![rect(100, 50), rect(200, 100)];
        rects.extend(std::iter::repeat(rect(10, 10)).take(10));
        let sel = select(&rects, &SelectorConfig::default());
        // both perfect matches sit outside the window; the square ties at 0.5
        // and the largest index wins the tie
        assert_eq!(sel.index(), Some(11));
    }

    #[test]
    fn short_list_is_scanned_whole() {
        let rects = [rect(100, 50), rect(10, 10), rect(20, 20)];
        let config = SelectorConfig { max_rects_to_consider: 10, ..SelectorConfig::default() };
        assert_eq!(select(&rects, &config).index(), Some(0));
    }

    #[test]
    fn ties_go_to_larger_area() {
        let rects = [rect(40, 20), rect(80, 40)];
        assert_eq!(select(&rects, &SelectorConfig::default()).index(), Some(1));
    }

    #[test]
    fn window_and_target_come_from_config() {
        let rects = [rect(100, 25), rect(100, 50), rect(10, 10)];
        let config = SelectorConfig { max_rects_to_consider: 2, target_aspect: 0.25 };
        // rect 0 would be perfect but is outside the window
        assert_eq!(select(&rects, &config).index(), Some(1));

        let config = SelectorConfig { max_rects_to_consider: 3, target_aspect: 0.25 };
        assert_eq!(select(&rects, &config).index(), Some(0));
    }
}
