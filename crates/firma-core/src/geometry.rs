//! Page geometry
//!
//! Everything the scanner and the placer reason about uses a top-left origin
//! with Y growing downward, in PDF points. [`PageBox`] converts between that
//! space and PDF user space (bottom-left origin, Y up).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle, top-left origin: `y0` is the visually topmost edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}, {:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// Visible page area in PDF user space (`[llx, lly, urx, ury]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// US Letter, the fallback when a page declares no usable box.
    pub const LETTER: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    /// Build from a PDF box array, normalizing swapped corners.
    pub fn from_corners(a: [f64; 4]) -> Self {
        Self {
            llx: a[0].min(a[2]),
            lly: a[1].min(a[3]),
            urx: a[0].max(a[2]),
            ury: a[1].max(a[3]),
        }
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    /// PDF user-space point to top-left page space.
    pub fn to_page_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.llx, self.ury - y)
    }

    /// Top-left page rectangle to PDF user space as `(x, y_bottom, width, height)`.
    pub fn to_user_space(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        let x = self.llx + rect.x0;
        let y_bottom = self.ury - rect.y1;
        (x, y_bottom, rect.width(), rect.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(100.0, 200.0, 300.0, 220.0);
        assert_eq!(r.width(), 200.0);
        assert_eq!(r.height(), 20.0);
    }

    #[test]
    fn test_y_axis_flip() {
        // PDF origin is bottom-left, page space origin is top-left
        let page = PageBox::LETTER;
        assert_eq!(page.to_page_point(0.0, 100.0), (0.0, 692.0));
        assert_eq!(page.to_page_point(50.0, 792.0), (50.0, 0.0));
    }

    #[test]
    fn test_user_space_rect() {
        let page = PageBox::LETTER;
        let rect = Rect::new(190.0, 160.0, 310.0, 200.0);
        assert_eq!(page.to_user_space(&rect), (190.0, 592.0, 120.0, 40.0));
    }

    #[test]
    fn test_offset_crop_box() {
        let page = PageBox::from_corners([30.0, 842.0, 625.0, 40.0]);
        assert_eq!(page.width(), 595.0);
        assert_eq!(page.height(), 802.0);
        assert_eq!(page.to_page_point(130.0, 742.0), (100.0, 100.0));

        let rect = Rect::new(100.0, 100.0, 150.0, 120.0);
        assert_eq!(page.to_user_space(&rect), (130.0, 722.0, 50.0, 20.0));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a rectangle mapped to user space and back lands where it started
        #[test]
        fn user_space_round_trip(
            llx in -100.0f64..100.0,
            lly in -100.0f64..100.0,
            w in 100.0f64..2000.0,
            h in 100.0f64..2000.0,
            x in 0.0f64..100.0,
            y in 0.0f64..100.0,
        ) {
            let page = PageBox { llx, lly, urx: llx + w, ury: lly + h };
            let rect = Rect::new(x, y, x + 30.0, y + 10.0);
            let (ux, uy, uw, uh) = page.to_user_space(&rect);
            let (tx, ty) = page.to_page_point(ux, uy + uh);
            prop_assert!((tx - rect.x0).abs() < 1e-6);
            prop_assert!((ty - rect.y0).abs() < 1e-6);
            prop_assert!((uw - 30.0).abs() < 1e-9);
        }
    }
}
