use std::rc::Rc;

use raylua::backend::Headless;
use raylua::dispatch::Policy;
use raylua::types::{Camera2D, Color, Vector2};
use raylua::Runtime;

fn runtime() -> Runtime {
    Runtime::new(Policy::default(), Rc::new(Headless::default())).unwrap()
}

#[test]
fn vector2_arithmetic() {
    let rt = runtime();
    rt.exec(
        r#"
        local a = Vector2(1, 2)
        local b = Vector2(2, 2)
        local c = a + b
        assert(c.x == 3 and c.y == 4)
        assert(tostring(c) == "Vector2(x = 3.0, y = 4.0)")
        assert(c:Length() == 5)
        assert((c * 2).y == 8)
        assert((c - 1).x == 2)
        assert((-c).x == -3)
        assert(c / 2 == Vector2(1.5, 2))
        assert(Vector2() == Vector2(0, 0))
        "#,
    )
    .unwrap();
}

#[test]
fn numeric_strings_are_scalars() {
    let rt = runtime();
    rt.exec(
        r#"
        assert(Vector2(1, 2) * "2" == Vector2(2, 4))
        assert(Vector3(1, 1, 1) + "0.5" == Vector3(1.5, 1.5, 1.5))
        "#,
    )
    .unwrap();
    let err = rt.exec(r#"local _ = Vector2(1, 2) * "two""#).unwrap_err();
    assert!(err.to_string().contains("Vector2 expected, got string"));
}

#[test]
fn script_errors_name_the_chunk() {
    let rt = runtime();
    let err = rt.exec("error('boom')").unwrap_err().to_string();
    assert!(err.contains("exec:1: boom"));
    assert!(!err.contains(".rs:"));
    let err = rt.eval::<i32>("nil + 1").unwrap_err().to_string();
    assert!(err.contains("eval:1:"));
}

#[test]
fn vector3_equality_tolerates_rounding() {
    let rt = runtime();
    rt.exec(
        r#"
        local v = Vector3(0.1, 0.2, 0.3)
        assert(v + Vector3(0.2, 0, 0) == Vector3(0.3, 0.2, 0.3))
        assert(v ~= Vector3(0.1, 0.2, 0.31))
        "#,
    )
    .unwrap();
}

#[test]
fn copies_do_not_alias() {
    let rt = runtime();
    rt.exec(
        r#"
        local a = Vector2(1, 1)
        local b = Vector2(a)
        b.x = 9
        assert(a.x == 1)
        "#,
    )
    .unwrap();
}

#[test]
fn color_components_clamp() {
    let rt = runtime();
    let color: Color = rt.eval("Color(300, -5, 12.7)").unwrap();
    assert_eq!(color, Color::rgba(255, 0, 12, 255));
    rt.exec(
        r#"
        local c = Color(10, 20, 30, 255)
        c.a = 1000
        assert(c.a == 255)
        assert(c:Fade(0.5).a == 127)
        assert(c:Fade(2).a == 255)
        assert(tostring(RED) == "Color(r = 230, g = 41, b = 55, a = 255)")
        "#,
    )
    .unwrap();
}

#[test]
fn rectangle_fields() {
    let rt = runtime();
    rt.exec(
        r#"
        local r = Rectangle(1, 2, 3, 4)
        assert(r.x == 1 and r.y == 2 and r.width == 3 and r.height == 4)
        r.width = 10
        assert(tostring(r) == "Rectangle(x = 1.0, y = 2.0, width = 10.0, height = 4.0)")
        "#,
    )
    .unwrap();
}

#[test]
fn nested_fields_write_through() {
    let rt = runtime();
    rt.exec(
        r#"
        cam = Camera2D()
        cam.target.x = 5
        local target = cam.target
        target.y = 7
        cam.zoom = 2
        "#,
    )
    .unwrap();
    let cam: Camera2D = rt.eval("cam").unwrap();
    assert_eq!(cam.target, Vector2::new(5.0, 7.0));
    assert_eq!(cam.zoom, 2.0);
}

#[test]
fn nested_reference_outlives_its_local_owner() {
    let rt = runtime();
    rt.exec(
        r#"
        local t = Camera2D(Vector2(1, 1), Vector2(2, 3), 0, 1).target
        collectgarbage()
        collectgarbage()
        assert(t.x == 2 and t.y == 3)
        "#,
    )
    .unwrap();
}

#[test]
fn camera_transforms_points() {
    let rt = runtime();
    rt.exec(
        r#"
        local cam = Camera2D(Vector2(400, 300), Vector2(10, 10), 0, 2)
        local p = cam:GetWorldToScreen(Vector2(20, 10))
        assert(p == Vector2(420, 300))
        assert(cam:GetScreenToWorld(p) == Vector2(20, 10))
        "#,
    )
    .unwrap();
}

#[test]
fn constructors_check_arity() {
    let rt = runtime();
    let err = rt.exec("Vector2(1, 2, 3)").unwrap_err();
    assert!(err.to_string().contains("wrong number of arguments"));
    let err = rt.exec("Color(1, 2)").unwrap_err();
    assert!(err.to_string().contains("wrong number of arguments"));
}

#[test]
fn type_mismatch_names_the_expected_type() {
    let rt = runtime();
    let err = rt.exec("DrawPixelV(Color(1, 2, 3), RED)").unwrap_err();
    assert!(err.to_string().contains("Vector2 expected"));
}
