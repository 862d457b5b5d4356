/// Axis-aligned rectangle bounding a detected face, in pixel coordinates
/// of the image it was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Intersection with the `width × height` image rectangle.
    ///
    /// The result is never smaller than 1×1, so a crop taken from it is
    /// always non-empty as long as the image itself is.
    pub fn clamp_to(&self, width: u32, height: u32) -> FaceBox {
        let max_x = (width as i32 - 1).max(0);
        let max_y = (height as i32 - 1).max(0);
        let x = self.x.clamp(0, max_x);
        let y = self.y.clamp(0, max_y);
        let right = self.right().clamp(x + 1, width as i32);
        let bottom = self.bottom().clamp(y + 1, height as i32);
        FaceBox::new(x, y, (right - x).max(1), (bottom - y).max(1))
    }

    /// Whether two boxes describe the same object: every edge lies within
    /// `eps · (min width + min height) / 2` of its counterpart.
    pub fn is_similar(&self, other: &FaceBox, eps: f64) -> bool {
        let delta = eps
            * (self.width.min(other.width) + self.height.min(other.height)) as f64
            * 0.5;
        (self.x - other.x).abs() as f64 <= delta
            && (self.y - other.y).abs() as f64 <= delta
            && (self.right() - other.right()).abs() as f64 <= delta
            && (self.bottom() - other.bottom()).abs() as f64 <= delta
    }

    /// Whether `self` lies inside `outer` grown by `eps` of its size.
    pub fn is_inside(&self, outer: &FaceBox, eps: f64) -> bool {
        let dx = (outer.width as f64 * eps).round() as i32;
        let dy = (outer.height as f64 * eps).round() as i32;
        self.x >= outer.x - dx
            && self.y >= outer.y - dy
            && self.right() <= outer.right() + dx
            && self.bottom() <= outer.bottom() + dy
    }
}
