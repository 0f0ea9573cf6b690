use std::rc::Rc;

use raylua::backend::{DrawCommand, Headless, HeadlessConfig};
use raylua::constants::KEY_SPACE;
use raylua::dispatch::Policy;
use raylua::types::{Color, Rectangle, Vector2};
use raylua::Runtime;

fn setup() -> (Rc<Headless>, Runtime) {
    let hl = Rc::new(Headless::default());
    let rt = Runtime::new(Policy::default(), hl.clone()).unwrap();
    (hl, rt)
}

#[test]
fn keyboard_edges() {
    let (hl, rt) = setup();
    hl.press_key(KEY_SPACE);
    hl.push_char('x');
    rt.exec(
        r#"
        assert(IsKeyPressed(KEY_SPACE))
        assert(IsKeyDown(KEY_SPACE) and not IsKeyUp(KEY_SPACE))
        assert(GetKeyPressed() == KEY_SPACE)
        assert(GetKeyPressed() == 0)
        assert(GetCharPressed() == string.byte("x"))
        BeginDrawing()
        EndDrawing()
        assert(not IsKeyPressed(KEY_SPACE))
        assert(IsKeyDown(KEY_SPACE))
        "#,
    )
    .unwrap();
    hl.release_key(KEY_SPACE);
    rt.exec("assert(IsKeyReleased(KEY_SPACE) and IsKeyUp(KEY_SPACE))").unwrap();
}

#[test]
fn mouse_and_gamepad_state() {
    let (hl, rt) = setup();
    hl.move_mouse(10.0, 20.0);
    hl.press_mouse_button(0);
    hl.scroll(0.0, 1.5);
    hl.connect_gamepad(0, "Test Pad", 2);
    hl.move_gamepad_axis(0, 1, -0.5);
    rt.exec(
        r#"
        assert(GetMousePosition() == Vector2(10, 20))
        assert(IsMouseButtonPressed(MOUSE_BUTTON_LEFT))
        assert(GetMouseWheelMove().y == 1.5)
        assert(IsGamepadAvailable(0) and not IsGamepadAvailable(1))
        assert(GetGamepadName(0) == "Test Pad")
        assert(GetGamepadName(1) == nil)
        assert(GetGamepadAxisCount(0) == 2)
        assert(GetGamepadAxisMovement(0, 1) == -0.5)
        SetMouseOffset(Vector2(5, 5))
        SetMouseScale(Vector2(2, 2))
        assert(GetMousePosition() == Vector2(30, 50))
        "#,
    )
    .unwrap();
}

#[test]
fn frame_records_draw_commands() {
    let (hl, rt) = setup();
    rt.exec(
        r#"
        InitWindow(320, 240, "frame test")
        BeginDrawing()
        ClearBackground(RAYWHITE)
        DrawRectangleGradientH(0, 0, 10, 20, RED, BLUE)
        DrawText("hi", 4.7, 8.2, 4, BLACK)
        EndDrawing()
        "#,
    )
    .unwrap();

    assert_eq!(hl.title(), "frame test");
    assert_eq!(hl.frames(), 1);
    let frame = hl.last_frame();
    assert_eq!(frame.len(), 3);
    assert_eq!(frame[0], DrawCommand::Clear(Color::rgba(245, 245, 245, 255)));

    let red = Color::rgba(230, 41, 55, 255);
    let blue = Color::rgba(0, 121, 241, 255);
    match &frame[1] {
        DrawCommand::Rectangle { rec, colors, .. } => {
            assert_eq!(*rec, Rectangle::new(0.0, 0.0, 10.0, 20.0));
            assert_eq!(*colors, [red, red, blue, blue]);
        }
        other => panic!("expected a rectangle, got {other:?}"),
    }
    match &frame[2] {
        DrawCommand::Text { text, position, size, spacing, .. } => {
            assert_eq!(text, "hi");
            assert_eq!(*position, Vector2::new(4.0, 8.0));
            assert_eq!((*size, *spacing), (10.0, 1.0));
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn max_frames_ends_the_main_loop() {
    let hl = Rc::new(Headless::new(HeadlessConfig {
        max_frames: Some(3),
        ..HeadlessConfig::default()
    }));
    let rt = Runtime::new(Policy::default(), hl.clone()).unwrap();
    rt.exec(
        r#"
        InitWindow(800, 450, "loop")
        SetTargetFPS(60)
        while not WindowShouldClose() do
            BeginDrawing()
            ClearBackground(RAYWHITE)
            DrawFPS(10, 10)
            EndDrawing()
        end
        CloseWindow()
        "#,
    )
    .unwrap();
    assert_eq!(hl.frames(), 3);
    assert!(!hl.is_drawing());
    assert_eq!(hl.target_fps(), 60);
}

#[test]
fn window_state_flags() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        assert(not IsWindowFullscreen())
        ToggleFullscreen()
        assert(IsWindowFullscreen() and IsWindowState(FLAG_FULLSCREEN_MODE))
        ToggleFullscreen()
        assert(not IsWindowFullscreen())
        MaximizeWindow()
        assert(IsWindowMaximized())
        MinimizeWindow()
        assert(IsWindowMinimized() and not IsWindowMaximized())
        RestoreWindow()
        assert(not IsWindowMinimized())
        "#,
    )
    .unwrap();
}

#[test]
fn multi_value_returns() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        local w, h = GetScreenSize()
        assert(w == 800 and h == 450)

        local hit, point = CheckCollisionLines(Vector2(0, 0), Vector2(10, 10), Vector2(0, 10), Vector2(10, 0))
        assert(hit and point == Vector2(5, 5))
        hit, point = CheckCollisionLines(Vector2(0, 0), Vector2(1, 0), Vector2(0, 1), Vector2(1, 1))
        assert(not hit and point == Vector2(0, 0))

        local width = MeasureText("abcd", 20)
        assert(math.type(width) == "integer" and width > 0)
        "#,
    )
    .unwrap();
}

#[test]
fn collision_helpers() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        local a = Rectangle(0, 0, 10, 10)
        local b = Rectangle(5, 5, 10, 10)
        assert(CheckCollisionRecs(a, b))
        assert(GetCollisionRec(a, b) == Rectangle(5, 5, 5, 5))
        assert(CheckCollisionPointRec(Vector2(1, 1), a))
        assert(not CheckCollisionPointRec(Vector2(11, 1), a))
        assert(CheckCollisionCircles(Vector2(0, 0), 1, Vector2(1.5, 0), 1))
        assert(CheckCollisionPointTriangle(Vector2(1, 1), Vector2(0, 0), Vector2(4, 0), Vector2(0, 4)))
        "#,
    )
    .unwrap();
}

#[test]
fn file_data_round_trips() {
    let (_hl, rt) = setup();
    let dir = tempfile::tempdir().unwrap();
    rt.lua()
        .globals()
        .set("dir", dir.path().to_str().unwrap())
        .unwrap();
    rt.exec(
        r#"
        local path = dir .. "/blob.bin"
        local data = "header\0body\255"
        assert(SaveFileData(path, data))
        assert(FileExists(path) and IsPathFile(path) and DirectoryExists(dir))
        assert(GetFileLength(path) == #data)
        assert(LoadFileData(path) == data)
        assert(LoadFileData(dir .. "/missing.bin") == nil)
        assert(GetFileExtension(path) == ".bin")
        assert(GetFileNameWithoutExt(path) == "blob")
        assert(IsFileExtension(path, ".png;.BIN"))

        local files = LoadDirectoryFiles(dir)
        assert(#files == 1 and GetFileName(files[1]) == "blob.bin")
        "#,
    )
    .unwrap();
}

#[test]
fn compression_and_base64() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        local text = string.rep("raylua ", 64)
        local packed = CompressData(text)
        assert(#packed < #text)
        assert(DecompressData(packed) == text)

        assert(EncodeDataBase64("hello") == "aGVsbG8=")
        assert(DecodeDataBase64("aGVsbG8=") == "hello")
        assert(DecodeDataBase64("***") == nil)
        "#,
    )
    .unwrap();
}

#[test]
fn dropped_files_are_taken_once() {
    let (hl, rt) = setup();
    hl.drop_files(["a.png", "b.png"]);
    rt.exec(
        r#"
        assert(IsFileDropped())
        local files = LoadDroppedFiles()
        assert(#files == 2 and files[1] == "a.png")
        assert(not IsFileDropped())
        "#,
    )
    .unwrap();
}

#[test]
fn image_globals_and_textures() {
    let (hl, rt) = setup();
    rt.exec(
        r#"
        local img = GenImageColor(8, 4, RED)
        ImageResizeNN(img, 4, 2)
        assert(img.width == 4 and img.height == 2)
        assert(GetImageColor(img, 0, 0) == RED)
        assert(img.mipmaps == 1)
        ImageMipmaps(img)
        assert(img.mipmaps == 3)
        ImageDither(img, 4, 4, 4, 4)
        img:Dither(1, 1, 1, 1)
        assert(GetImageColor(img, 0, 0) == Color(255, 0, 0, 255))
        local tex = LoadTextureFromImage(img)
        DrawTextureEx(tex, Vector2(1, 2), 0, 2, WHITE)
        "#,
    )
    .unwrap();
    match hl.commands().last() {
        Some(DrawCommand::Texture { dest, .. }) => {
            assert_eq!(*dest, Rectangle::new(1.0, 2.0, 8.0, 4.0));
        }
        other => panic!("expected a texture blit, got {other:?}"),
    }
}

#[test]
fn image_drawing_survives_extreme_arguments() {
    let (_hl, rt) = setup();
    rt.exec(
        r#"
        local img = GenImageColor(10, 10, RED)
        ImageDrawCircle(img, 5, 5, 50000, BLUE)
        assert(GetImageColor(img, 0, 0) == BLUE and GetImageColor(img, 9, 9) == BLUE)
        ImageDrawLine(img, 0, 0, 2147483647, 0, GREEN)
        assert(GetImageColor(img, 9, 0) == GREEN)
        local empty = GenImageCellular(2147483647, 0, 16)
        assert(empty.height == 0)
        "#,
    )
    .unwrap();
}

#[test]
fn version_is_exposed() {
    let (_hl, rt) = setup();
    let version: String = rt.eval("raylua._VERSION").unwrap();
    assert!(version.starts_with("raylua "));
}

#[test]
fn missing_script_is_reported() {
    let (_hl, rt) = setup();
    let err = rt.run_file("does/not/exist.lua").unwrap_err();
    assert!(matches!(err, raylua::Error::NotFound(_)));
}
