use crate::shared::face_box::FaceBox;

/// Pick the box with the largest area.
///
/// Ties go to the box that appears first; `Iterator::max_by_key` would
/// return the last one, so the scan is explicit.
pub fn select_largest(boxes: &[FaceBox]) -> Option<FaceBox> {
    let mut best: Option<FaceBox> = None;
    for candidate in boxes {
        match best {
            Some(current) if candidate.area() <= current.area() => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yields_none() {
        assert_eq!(select_largest(&[]), None);
    }

    #[test]
    fn test_single_box() {
        let b = FaceBox::new(1, 2, 30, 30);
        assert_eq!(select_largest(&[b]), Some(b));
    }

    #[test]
    fn test_picks_maximum_area() {
        let boxes = [
            FaceBox::new(0, 0, 30, 30),
            FaceBox::new(50, 50, 60, 40),
            FaceBox::new(10, 10, 45, 45),
        ];
        assert_eq!(select_largest(&boxes), Some(boxes[1]));
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        let boxes = [
            FaceBox::new(0, 0, 40, 40),
            FaceBox::new(100, 0, 40, 40),
            FaceBox::new(0, 100, 20, 80),
        ];
        assert_eq!(select_largest(&boxes), Some(boxes[0]));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let boxes = [FaceBox::new(5, 5, 32, 32), FaceBox::new(9, 9, 32, 32)];
        let first = select_largest(&boxes);
        for _ in 0..10 {
            assert_eq!(select_largest(&boxes), first);
        }
    }
}
