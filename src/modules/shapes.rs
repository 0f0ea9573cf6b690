use std::rc::Rc;

use mlua::{Lua, Table};

use super::check_points;
use crate::backend::{Backend, DrawCommand};
use crate::insert_global;
use crate::types::{Color, Rectangle, Texture, Vector2};

const EPSILON: f32 = 0.000_001;

/// Integer pixel position from two Lua numbers.
fn px(x: f32, y: f32) -> Vector2 {
    Vector2::new(x.trunc(), y.trunc())
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Rectangle {
    Rectangle::new(x.trunc(), y.trunc(), w.trunc(), h.trunc())
}

fn solid(rec: Rectangle, color: Color) -> DrawCommand {
    DrawCommand::Rectangle {
        rec,
        origin: Vector2::ZERO,
        rotation: 0.0,
        colors: [color; 4],
    }
}

fn circle(center: Vector2, radius: f32, color: Color, outline: bool) -> DrawCommand {
    DrawCommand::Circle {
        center,
        radius,
        inner: color,
        outer: color,
        outline,
    }
}

fn line(start: Vector2, end: Vector2, thick: f32, color: Color) -> DrawCommand {
    DrawCommand::Line {
        start,
        end,
        thick,
        color,
    }
}

fn bezier(start: Vector2, end: Vector2, controls: Vec<Vector2>, thick: f32, color: Color) -> DrawCommand {
    DrawCommand::Bezier {
        start,
        end,
        controls,
        thick,
        color,
    }
}

pub fn register(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    drawing(lua, g, rl)?;
    collisions(lua, g)
}

fn drawing(lua: &Lua, g: &Table, rl: &Rc<dyn Backend>) -> mlua::Result<()> {
    insert_backend!(lua, g, rl, "SetShapesTexture", |b, (tex, source): (Texture, Rectangle)| {
        b.set_shapes_texture(tex.id(), source)
    });

    insert_backend!(lua, g, rl, "DrawPixel", |b, (x, y, color): (f32, f32, Color)| {
        b.draw(DrawCommand::Pixel { position: px(x, y), color })
    });
    insert_backend!(lua, g, rl, "DrawPixelV", |b, (position, color): (Vector2, Color)| {
        b.draw(DrawCommand::Pixel { position, color })
    });

    insert_backend!(lua, g, rl, "DrawLine", |b, (x0, y0, x1, y1, color): (f32, f32, f32, f32, Color)| {
        b.draw(line(px(x0, y0), px(x1, y1), 1.0, color))
    });
    insert_backend!(lua, g, rl, "DrawLineV", |b, (start, end, color): (Vector2, Vector2, Color)| {
        b.draw(line(start, end, 1.0, color))
    });
    insert_backend!(lua, g, rl, "DrawLineEx", |b, (start, end, thick, color): (Vector2, Vector2, f32, Color)| {
        b.draw(line(start, end, thick, color))
    });
    insert_backend!(lua, g, rl, "DrawLineBezier", |b, (start, end, thick, color): (Vector2, Vector2, f32, Color)| {
        b.draw(bezier(start, end, Vec::new(), thick, color))
    });
    insert_backend!(
        lua, g, rl, "DrawLineBezierQuad",
        |b, (start, end, control, thick, color): (Vector2, Vector2, Vector2, f32, Color)| {
            b.draw(bezier(start, end, vec![control], thick, color))
        }
    );
    insert_backend!(
        lua, g, rl, "DrawLineBezierCubic",
        |b, (start, end, c1, c2, thick, color): (Vector2, Vector2, Vector2, Vector2, f32, Color)| {
            b.draw(bezier(start, end, vec![c1, c2], thick, color))
        }
    );
    let b = Rc::clone(rl);
    insert_global!(lua, g, "DrawLineStrip", move |_, (points, color): (Table, Color)| {
        let points = check_points(&points)?;
        b.draw(DrawCommand::LineStrip { points, color });
        Ok(())
    });

    insert_backend!(lua, g, rl, "DrawCircle", |b, (x, y, radius, color): (f32, f32, f32, Color)| {
        b.draw(circle(px(x, y), radius, color, false))
    });
    insert_backend!(lua, g, rl, "DrawCircleV", |b, (center, radius, color): (Vector2, f32, Color)| {
        b.draw(circle(center, radius, color, false))
    });
    insert_backend!(lua, g, rl, "DrawCircleLines", |b, (x, y, radius, color): (f32, f32, f32, Color)| {
        b.draw(circle(px(x, y), radius, color, true))
    });
    insert_backend!(
        lua, g, rl, "DrawCircleGradient",
        |b, (x, y, radius, inner, outer): (f32, f32, f32, Color, Color)| {
            b.draw(DrawCommand::Circle { center: px(x, y), radius, inner, outer, outline: false })
        }
    );
    for (name, outline) in [("DrawCircleSector", false), ("DrawCircleSectorLines", true)] {
        insert_backend!(
            lua, g, rl, name,
            |b, (center, radius, start_angle, end_angle, segments, color): (Vector2, f32, f32, f32, i32, Color)| {
                b.draw(DrawCommand::CircleSector { center, radius, start_angle, end_angle, segments, color, outline })
            }
        );
    }
    for (name, outline) in [("DrawEllipse", false), ("DrawEllipseLines", true)] {
        insert_backend!(
            lua, g, rl, name,
            |b, (x, y, radius_h, radius_v, color): (f32, f32, f32, f32, Color)| {
                b.draw(DrawCommand::Ellipse { center: px(x, y), radius_h, radius_v, color, outline })
            }
        );
    }
    for (name, outline) in [("DrawRing", false), ("DrawRingLines", true)] {
        insert_backend!(
            lua, g, rl, name,
            |b, (center, inner_radius, outer_radius, start_angle, end_angle, segments, color):
                (Vector2, f32, f32, f32, f32, i32, Color)| {
                b.draw(DrawCommand::Ring {
                    center,
                    inner_radius,
                    outer_radius,
                    start_angle,
                    end_angle,
                    segments,
                    color,
                    outline,
                })
            }
        );
    }

    insert_backend!(lua, g, rl, "DrawRectangle", |b, (x, y, w, h, color): (f32, f32, f32, f32, Color)| {
        b.draw(solid(rect(x, y, w, h), color))
    });
    insert_backend!(lua, g, rl, "DrawRectangleV", |b, (pos, size, color): (Vector2, Vector2, Color)| {
        b.draw(solid(Rectangle::new(pos.x, pos.y, size.x, size.y), color))
    });
    insert_backend!(lua, g, rl, "DrawRectangleRec", |b, (rec, color): (Rectangle, Color)| {
        b.draw(solid(rec, color))
    });
    insert_backend!(
        lua, g, rl, "DrawRectanglePro",
        |b, (rec, origin, rotation, color): (Rectangle, Vector2, f32, Color)| {
            b.draw(DrawCommand::Rectangle { rec, origin, rotation, colors: [color; 4] })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawRectangleGradientV",
        |b, (x, y, w, h, top, bottom): (f32, f32, f32, f32, Color, Color)| {
            b.draw(DrawCommand::Rectangle {
                rec: rect(x, y, w, h),
                origin: Vector2::ZERO,
                rotation: 0.0,
                colors: [top, bottom, bottom, top],
            })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawRectangleGradientH",
        |b, (x, y, w, h, left, right): (f32, f32, f32, f32, Color, Color)| {
            b.draw(DrawCommand::Rectangle {
                rec: rect(x, y, w, h),
                origin: Vector2::ZERO,
                rotation: 0.0,
                colors: [left, left, right, right],
            })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawRectangleGradientEx",
        |b, (rec, c1, c2, c3, c4): (Rectangle, Color, Color, Color, Color)| {
            b.draw(DrawCommand::Rectangle { rec, origin: Vector2::ZERO, rotation: 0.0, colors: [c1, c2, c3, c4] })
        }
    );
    insert_backend!(lua, g, rl, "DrawRectangleLines", |b, (x, y, w, h, color): (f32, f32, f32, f32, Color)| {
        b.draw(DrawCommand::RectangleLines { rec: rect(x, y, w, h), thick: 1.0, color })
    });
    insert_backend!(lua, g, rl, "DrawRectangleLinesEx", |b, (rec, thick, color): (Rectangle, f32, Color)| {
        b.draw(DrawCommand::RectangleLines { rec, thick, color })
    });
    insert_backend!(
        lua, g, rl, "DrawRectangleRounded",
        |b, (rec, roundness, segments, color): (Rectangle, f32, i32, Color)| {
            b.draw(DrawCommand::RectangleRounded { rec, roundness, segments, thick: None, color })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawRectangleRoundedLines",
        |b, (rec, roundness, segments, thick, color): (Rectangle, f32, i32, f32, Color)| {
            b.draw(DrawCommand::RectangleRounded { rec, roundness, segments, thick: Some(thick), color })
        }
    );

    for (name, outline) in [("DrawTriangle", false), ("DrawTriangleLines", true)] {
        insert_backend!(
            lua, g, rl, name,
            |b, (v1, v2, v3, color): (Vector2, Vector2, Vector2, Color)| {
                b.draw(DrawCommand::Triangle { points: [v1, v2, v3], color, outline })
            }
        );
    }
    let b = Rc::clone(rl);
    insert_global!(lua, g, "DrawTriangleFan", move |_, (points, color): (Table, Color)| {
        let points = check_points(&points)?;
        b.draw(DrawCommand::TriangleFan { points, color });
        Ok(())
    });
    let b = Rc::clone(rl);
    insert_global!(lua, g, "DrawTriangleStrip", move |_, (points, color): (Table, Color)| {
        let points = check_points(&points)?;
        b.draw(DrawCommand::TriangleStrip { points, color });
        Ok(())
    });

    insert_backend!(
        lua, g, rl, "DrawPoly",
        |b, (center, sides, radius, rotation, color): (Vector2, i32, f32, f32, Color)| {
            b.draw(DrawCommand::Poly { center, sides, radius, rotation, thick: None, color })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawPolyLines",
        |b, (center, sides, radius, rotation, color): (Vector2, i32, f32, f32, Color)| {
            b.draw(DrawCommand::Poly { center, sides, radius, rotation, thick: Some(1.0), color })
        }
    );
    insert_backend!(
        lua, g, rl, "DrawPolyLinesEx",
        |b, (center, sides, radius, rotation, thick, color): (Vector2, i32, f32, f32, f32, Color)| {
            b.draw(DrawCommand::Poly { center, sides, radius, rotation, thick: Some(thick), color })
        }
    );
    Ok(())
}

fn collisions(lua: &Lua, g: &Table) -> mlua::Result<()> {
    insert_global!(lua, g, "CheckCollisionRecs", |_, (a, b): (Rectangle, Rectangle)| {
        Ok(recs_overlap(a, b))
    });
    insert_global!(lua, g, "CheckCollisionCircles", |_, (c1, r1, c2, r2): (Vector2, f32, Vector2, f32)| {
        Ok(circles_overlap(c1, r1, c2, r2))
    });
    insert_global!(lua, g, "CheckCollisionCircleRec", |_, (center, radius, rec): (Vector2, f32, Rectangle)| {
        Ok(circle_rec_overlap(center, radius, rec))
    });
    insert_global!(lua, g, "CheckCollisionPointRec", |_, (point, rec): (Vector2, Rectangle)| {
        Ok(rec.contains(point))
    });
    insert_global!(lua, g, "CheckCollisionPointCircle", |_, (point, center, radius): (Vector2, Vector2, f32)| {
        Ok(circles_overlap(point, 0.0, center, radius))
    });
    insert_global!(
        lua,
        g,
        "CheckCollisionPointTriangle",
        |_, (point, p1, p2, p3): (Vector2, Vector2, Vector2, Vector2)| Ok(point_in_triangle(point, p1, p2, p3))
    );
    insert_global!(
        lua,
        g,
        "CheckCollisionLines",
        |_, (s1, e1, s2, e2): (Vector2, Vector2, Vector2, Vector2)| {
            Ok(match lines_intersect(s1, e1, s2, e2) {
                Some(point) => (true, point),
                None => (false, Vector2::ZERO),
            })
        }
    );
    insert_global!(
        lua,
        g,
        "CheckCollisionPointLine",
        |_, (point, p1, p2, threshold): (Vector2, Vector2, Vector2, f32)| {
            Ok(point_on_line(point, p1, p2, threshold))
        }
    );
    insert_global!(lua, g, "GetCollisionRec", |_, (a, b): (Rectangle, Rectangle)| {
        Ok(overlap(a, b))
    });
    Ok(())
}

pub fn recs_overlap(a: Rectangle, b: Rectangle) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

pub fn circles_overlap(c1: Vector2, r1: f32, c2: Vector2, r2: f32) -> bool {
    c1.vec().distance(c2.vec()) <= r1 + r2
}

pub fn circle_rec_overlap(center: Vector2, radius: f32, rec: Rectangle) -> bool {
    let (hw, hh) = (rec.width / 2.0, rec.height / 2.0);
    let dx = (center.x - (rec.x + hw)).abs();
    let dy = (center.y - (rec.y + hh)).abs();

    if dx > hw + radius || dy > hh + radius {
        return false;
    }
    if dx <= hw || dy <= hh {
        return true;
    }
    (dx - hw).powi(2) + (dy - hh).powi(2) <= radius * radius
}

pub fn point_in_triangle(p: Vector2, p1: Vector2, p2: Vector2, p3: Vector2) -> bool {
    let denom = (p2.y - p3.y) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.y - p3.y);
    let alpha = ((p2.y - p3.y) * (p.x - p3.x) + (p3.x - p2.x) * (p.y - p3.y)) / denom;
    let beta = ((p3.y - p1.y) * (p.x - p3.x) + (p1.x - p3.x) * (p.y - p3.y)) / denom;
    let gamma = 1.0 - alpha - beta;
    alpha > 0.0 && beta > 0.0 && gamma > 0.0
}

fn within(v: f32, a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON || (v >= a.min(b) && v <= a.max(b))
}

/// Intersection point of two segments.
pub fn lines_intersect(s1: Vector2, e1: Vector2, s2: Vector2, e2: Vector2) -> Option<Vector2> {
    let div = (e2.y - s2.y) * (e1.x - s1.x) - (e2.x - s2.x) * (e1.y - s1.y);
    if div.abs() < EPSILON {
        return None;
    }

    let c1 = s1.x * e1.y - s1.y * e1.x;
    let c2 = s2.x * e2.y - s2.y * e2.x;
    let x = ((s2.x - e2.x) * c1 - (s1.x - e1.x) * c2) / div;
    let y = ((s2.y - e2.y) * c1 - (s1.y - e1.y) * c2) / div;

    let hit = within(x, s1.x, e1.x)
        && within(x, s2.x, e2.x)
        && within(y, s1.y, e1.y)
        && within(y, s2.y, e2.y);
    hit.then(|| Vector2::new(x, y))
}

/// Whether `p` lies on the segment `p1`-`p2`, within `threshold` pixels.
pub fn point_on_line(p: Vector2, p1: Vector2, p2: Vector2, threshold: f32) -> bool {
    let (dxc, dyc) = (p.x - p1.x, p.y - p1.y);
    let (dxl, dyl) = (p2.x - p1.x, p2.y - p1.y);
    let cross = dxc * dyl - dyc * dxl;

    if cross.abs() >= threshold * dxl.abs().max(dyl.abs()) {
        return false;
    }
    if dxl.abs() >= dyl.abs() {
        within(p.x, p1.x, p2.x)
    } else {
        within(p.y, p1.y, p2.y)
    }
}

/// Overlap of two rectangles, empty when they do not touch.
pub fn overlap(a: Rectangle, b: Rectangle) -> Rectangle {
    if !recs_overlap(a, b) {
        return Rectangle::default();
    }
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let w = (a.x + a.width).min(b.x + b.width) - x;
    let h = (a.y + a.height).min(b.y + b.height) - y;
    Rectangle::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_meet_in_the_middle() {
        let hit = lines_intersect(
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(0.0, 10.0),
            Vector2::new(10.0, 0.0),
        );
        assert_eq!(hit, Some(Vector2::new(5.0, 5.0)));
    }

    #[test]
    fn parallel_or_short_segments_miss() {
        let a = (Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0));
        assert_eq!(lines_intersect(a.0, a.1, Vector2::new(0.0, 1.0), Vector2::new(10.0, 1.0)), None);
        assert_eq!(lines_intersect(a.0, a.1, Vector2::new(5.0, 1.0), Vector2::new(5.0, 3.0)), None);
    }

    #[test]
    fn circle_touches_rectangle_corner() {
        let rec = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_rec_overlap(Vector2::new(12.0, 12.0), 3.0, rec));
        assert!(!circle_rec_overlap(Vector2::new(13.0, 13.0), 3.0, rec));
        assert!(circle_rec_overlap(Vector2::new(5.0, -2.0), 3.0, rec));
    }

    #[test]
    fn triangle_contains_centroid_only() {
        let (a, b, c) = (Vector2::new(0.0, 0.0), Vector2::new(4.0, 0.0), Vector2::new(0.0, 4.0));
        assert!(point_in_triangle(Vector2::new(1.0, 1.0), a, b, c));
        assert!(!point_in_triangle(Vector2::new(3.0, 3.0), a, b, c));
    }

    #[test]
    fn point_line_respects_threshold_and_extent() {
        let (p1, p2) = (Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0));
        assert!(point_on_line(Vector2::new(5.0, 0.5), p1, p2, 1.0));
        assert!(!point_on_line(Vector2::new(5.0, 2.0), p1, p2, 1.0));
        assert!(!point_on_line(Vector2::new(11.0, 0.0), p1, p2, 1.0));
    }

    #[test]
    fn overlap_is_intersection() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(overlap(a, b), Rectangle::new(5.0, 0.0, 5.0, 5.0));
        assert_eq!(overlap(a, Rectangle::new(20.0, 0.0, 1.0, 1.0)), Rectangle::default());
    }
}
