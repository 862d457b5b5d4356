//! Shared math utilities for detection infrastructure.
//!
//! Provides union-find clustering and summed-area tables used by the
//! cascade evaluator and the hit grouping.

use image::GrayImage;

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Partition `items` into equivalence classes of `same`.
///
/// Returns one label per item and the number of classes. Labels are
/// numbered by first appearance, so class 0 contains `items[0]`.
pub fn partition<T>(items: &[T], same: impl Fn(&T, &T) -> bool) -> (Vec<usize>, usize) {
    let n = items.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if same(&items[i], &items[j]) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut root_label: Vec<Option<usize>> = vec![None; n];
    let mut labels = Vec::with_capacity(n);
    let mut classes = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        let label = *root_label[root].get_or_insert_with(|| {
            classes += 1;
            classes - 1
        });
        labels.push(label);
    }
    (labels, classes)
}

/// Summed-area tables of pixel values and squared pixel values.
///
/// Both tables have a zero row and column prepended, so the sum over
/// `[x, x + w) × [y, y + h)` needs no bounds special-casing.
pub struct IntegralImage {
    stride: usize,
    sum: Vec<i64>,
    sq_sum: Vec<i64>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0i64; stride * (h + 1)];
        let mut sq_sum = vec![0i64; stride * (h + 1)];
        let pixels = gray.as_raw();

        for y in 0..h {
            let mut row = 0i64;
            let mut row_sq = 0i64;
            for x in 0..w {
                let v = pixels[y * w + x] as i64;
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sq_sum,
        }
    }

    pub fn rect_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        Self::lookup(&self.sum, self.stride, x, y, w, h)
    }

    pub fn rect_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> i64 {
        Self::lookup(&self.sq_sum, self.stride, x, y, w, h)
    }

    fn lookup(table: &[i64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> i64 {
        let top = y * stride;
        let bottom = (y + h) * stride;
        table[bottom + x + w] - table[bottom + x] - table[top + x + w] + table[top + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_union_find_transitive() {
        let mut parent = vec![0, 1, 2];
        union(&mut parent, 0, 1);
        union(&mut parent, 1, 2);
        assert_eq!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_union_find_separate() {
        let mut parent = vec![0, 1, 2, 3];
        union(&mut parent, 0, 1);
        union(&mut parent, 2, 3);
        assert_ne!(find(&mut parent, 0), find(&mut parent, 2));
    }

    #[test]
    fn test_partition_labels_by_first_appearance() {
        let items: [i32; 6] = [10, 50, 11, 52, 12, 90];
        let (labels, classes) = partition(&items, |a, b| (a - b).abs() <= 3);
        assert_eq!(classes, 3);
        assert_eq!(labels, vec![0, 1, 0, 1, 0, 2]);
    }

    #[test]
    fn test_partition_empty() {
        let items: [i32; 0] = [];
        let (labels, classes) = partition(&items, |_, _| true);
        assert!(labels.is_empty());
        assert_eq!(classes, 0);
    }

    #[test]
    fn test_partition_chains_transitively() {
        // 0~1 and 1~2 but not 0~2 directly: still one class
        let items: [i32; 3] = [0, 3, 6];
        let (labels, classes) = partition(&items, |a, b| (a - b).abs() <= 3);
        assert_eq!(classes, 1);
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_integral_full_image_sum() {
        let gray = GrayImage::from_fn(4, 3, |x, y| Luma([(x + y * 4) as u8]));
        let integral = IntegralImage::new(&gray);
        let expected: i64 = (0..12).sum();
        assert_eq!(integral.rect_sum(0, 0, 4, 3), expected);
    }

    #[test]
    fn test_integral_sub_rectangle() {
        let gray = GrayImage::from_fn(4, 3, |x, y| Luma([(x + y * 4) as u8]));
        let integral = IntegralImage::new(&gray);
        // pixels (1,1),(2,1),(1,2),(2,2) = 5 + 6 + 9 + 10
        assert_eq!(integral.rect_sum(1, 1, 2, 2), 30);
        assert_eq!(integral.rect_sq_sum(1, 1, 2, 2), 25 + 36 + 81 + 100);
    }

    #[test]
    fn test_integral_constant_image() {
        let gray = GrayImage::from_pixel(10, 10, Luma([200]));
        let integral = IntegralImage::new(&gray);
        assert_eq!(integral.rect_sum(2, 3, 5, 4), 200 * 20);
        assert_eq!(integral.rect_sq_sum(2, 3, 5, 4), 200 * 200 * 20);
    }
}
