//! Shape outlines for code modules.
//!
//! Every drawable piece of a code is a [`Figure`]: an outer outline with an
//! optional hole. The same figure is rasterized by point sampling and written
//! to SVG as a path, so raster and vector output always agree.

use std::fmt::Write;

use crate::style::{CornerDotShape, CornerSquareShape, DotShape};

/// Per-corner radii, clockwise from top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Radii {
    pub tl: f32,
    pub tr: f32,
    pub br: f32,
    pub bl: f32,
}

impl Radii {
    pub fn uniform(r: f32) -> Self {
        Self {
            tl: r,
            tr: r,
            br: r,
            bl: r,
        }
    }
}

/// Axis-aligned bounds in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    RoundedRect { rect: Rect, radii: Radii },
    Circle { cx: f32, cy: f32, r: f32 },
}

impl Outline {
    pub fn rect(x: f32, y: f32, size: f32) -> Self {
        Outline::RoundedRect {
            rect: Rect {
                x,
                y,
                w: size,
                h: size,
            },
            radii: Radii::default(),
        }
    }

    pub fn rounded(x: f32, y: f32, size: f32, radii: Radii) -> Self {
        Outline::RoundedRect {
            rect: Rect {
                x,
                y,
                w: size,
                h: size,
            },
            radii,
        }
    }

    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        Outline::Circle { cx, cy, r }
    }

    pub fn bounds(&self) -> Rect {
        match *self {
            Outline::RoundedRect { rect, .. } => rect,
            Outline::Circle { cx, cy, r } => Rect {
                x: cx - r,
                y: cy - r,
                w: 2.0 * r,
                h: 2.0 * r,
            },
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        match *self {
            Outline::Circle { cx, cy, r } => {
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy <= r * r
            }
            Outline::RoundedRect { rect, radii } => {
                let (u, v) = (px - rect.x, py - rect.y);
                if u < 0.0 || v < 0.0 || u > rect.w || v > rect.h {
                    return false;
                }
                // Inside a corner's r×r box the point must also lie within the arc
                let corners = [
                    (radii.tl, u < radii.tl && v < radii.tl, radii.tl, radii.tl),
                    (
                        radii.tr,
                        u > rect.w - radii.tr && v < radii.tr,
                        rect.w - radii.tr,
                        radii.tr,
                    ),
                    (
                        radii.br,
                        u > rect.w - radii.br && v > rect.h - radii.br,
                        rect.w - radii.br,
                        rect.h - radii.br,
                    ),
                    (
                        radii.bl,
                        u < radii.bl && v > rect.h - radii.bl,
                        radii.bl,
                        rect.h - radii.bl,
                    ),
                ];
                corners.iter().all(|&(r, in_box, cx, cy)| {
                    if r <= 0.0 || !in_box {
                        return true;
                    }
                    let (dx, dy) = (u - cx, v - cy);
                    dx * dx + dy * dy <= r * r
                })
            }
        }
    }

    /// Append this outline as a closed SVG subpath.
    pub fn write_path(&self, d: &mut String) {
        // Writing to a String cannot fail
        let _ = match *self {
            Outline::Circle { cx, cy, r } => write!(
                d,
                "M{} {}a{r} {r} 0 1 0 {} 0a{r} {r} 0 1 0 {} 0Z",
                fmt(cx - r),
                fmt(cy),
                fmt(2.0 * r),
                fmt(-2.0 * r),
                r = fmt(r)
            ),
            Outline::RoundedRect { rect, radii } => {
                let Rect { x, y, w, h } = rect;
                let mut out = format!("M{} {}", fmt(x + radii.tl), fmt(y));
                out += &format!("H{}", fmt(x + w - radii.tr));
                if radii.tr > 0.0 {
                    out += &arc(radii.tr, x + w, y + radii.tr);
                }
                out += &format!("V{}", fmt(y + h - radii.br));
                if radii.br > 0.0 {
                    out += &arc(radii.br, x + w - radii.br, y + h);
                }
                out += &format!("H{}", fmt(x + radii.bl));
                if radii.bl > 0.0 {
                    out += &arc(radii.bl, x, y + h - radii.bl);
                }
                out += &format!("V{}", fmt(y + radii.tl));
                if radii.tl > 0.0 {
                    out += &arc(radii.tl, x + radii.tl, y);
                }
                out.push('Z');
                d.write_str(&out)
            }
        };
    }
}

fn arc(r: f32, to_x: f32, to_y: f32) -> String {
    format!("A{r} {r} 0 0 1 {} {}", fmt(to_x), fmt(to_y), r = fmt(r))
}

/// Compact number formatting for SVG paths.
fn fmt(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// An outline with an optional hole (for finder frames).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    pub outer: Outline,
    pub hole: Option<Outline>,
}

impl Figure {
    pub fn solid(outer: Outline) -> Self {
        Self { outer, hole: None }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.outer.contains(x, y) && !self.hole.is_some_and(|h| h.contains(x, y))
    }
}

/// Which orthogonal neighbors of a module are also drawn as dots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Neighbors {
    /// Radii of `r` on every corner whose two adjacent sides are both exposed.
    fn exposed_corners(&self, r: f32) -> Radii {
        let pick = |a: bool, b: bool| if !a && !b { r } else { 0.0 };
        Radii {
            tl: pick(self.top, self.left),
            tr: pick(self.top, self.right),
            br: pick(self.bottom, self.right),
            bl: pick(self.bottom, self.left),
        }
    }
}

/// Outline of a data module at (x, y) with edge length `s`.
pub fn dot_figure(shape: DotShape, x: f32, y: f32, s: f32, n: Neighbors) -> Figure {
    let half = s / 2.0;
    let outline = match shape {
        DotShape::Square => Outline::rect(x, y, s),
        DotShape::Dots => Outline::circle(x + half, y + half, half),
        DotShape::Rounded => Outline::rounded(x, y, s, n.exposed_corners(s * 0.3)),
        DotShape::ExtraRounded => Outline::rounded(x, y, s, n.exposed_corners(half)),
        DotShape::Classy => {
            let r = n.exposed_corners(half);
            Outline::rounded(
                x,
                y,
                s,
                Radii {
                    tl: r.tl,
                    br: r.br,
                    ..Radii::default()
                },
            )
        }
        DotShape::ClassyRounded => {
            let big = n.exposed_corners(half);
            let small = n.exposed_corners(s * 0.2);
            Outline::rounded(
                x,
                y,
                s,
                Radii {
                    tl: big.tl,
                    tr: small.tr,
                    br: big.br,
                    bl: small.bl,
                },
            )
        }
    };
    Figure::solid(outline)
}

/// Finder frame (7×7 modules) with its top-left at (x, y).
pub fn corner_square_figure(shape: CornerSquareShape, x: f32, y: f32, s: f32) -> Figure {
    let size = 7.0 * s;
    match shape {
        CornerSquareShape::Square => Figure {
            outer: Outline::rect(x, y, size),
            hole: Some(Outline::rect(x + s, y + s, 5.0 * s)),
        },
        CornerSquareShape::Dot => {
            let (cx, cy) = (x + size / 2.0, y + size / 2.0);
            Figure {
                outer: Outline::circle(cx, cy, 3.5 * s),
                hole: Some(Outline::circle(cx, cy, 2.5 * s)),
            }
        }
        CornerSquareShape::ExtraRounded => Figure {
            outer: Outline::rounded(x, y, size, Radii::uniform(2.5 * s)),
            hole: Some(Outline::rounded(
                x + s,
                y + s,
                5.0 * s,
                Radii::uniform(1.5 * s),
            )),
        },
    }
}

/// Finder center (3×3 modules); (x, y) is the top-left of the whole 7×7 frame.
pub fn corner_dot_figure(shape: CornerDotShape, x: f32, y: f32, s: f32) -> Figure {
    let (dx, dy) = (x + 2.0 * s, y + 2.0 * s);
    match shape {
        CornerDotShape::Square => Figure::solid(Outline::rect(dx, dy, 3.0 * s)),
        CornerDotShape::Dot => Figure::solid(Outline::circle(dx + 1.5 * s, dy + 1.5 * s, 1.5 * s)),
    }
}
