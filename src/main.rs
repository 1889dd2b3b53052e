//! Headless walkthrough of the pixmark editor.
//!
//! Drives an immediate-mode and a retained backend through one scripted
//! editing session and checks that both encode identical frames. Run with
//! `RUST_LOG=debug` to watch the document mutate.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use image::{Rgba, RgbaImage};
    use ndarray::Array2;
    use pixmark::scene::{
        BackendKind, Color, Detection, HeatmapGrid, LayerData, LayerKind, MediaFrame,
    };
    use pixmark::{EditorEvent, EditorState, Label, MediaInfo, SurfaceId, Tool};

    env_logger::init();

    let mut editor = EditorState::new();
    editor.subscribe(|event: &EditorEvent| println!("  event: {event:?}"));

    let left = editor.add_surface("left", BackendKind::Immediate);
    let right = editor.add_surface("right", BackendKind::Retained);
    editor.resize_surface(left, 960.0, 720.0);
    editor.resize_surface(right, 960.0, 720.0);

    editor.set_labels(vec![
        Label::new("label-car", "car", Color::from_rgb8(255, 107, 107)),
        Label::new("label-lane", "lane", Color::from_rgb8(78, 205, 196)),
        Label::new("label-marker", "marker", Color::from_rgb8(255, 230, 109)),
    ]);

    // A synthetic checkerboard stands in for a decoded file
    let (width, height) = (640u32, 480u32);
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        if (x / 32 + y / 32) % 2 == 0 {
            Rgba([200, 200, 205, 255])
        } else {
            Rgba([58, 58, 66, 255])
        }
    });
    println!("== load media ==");
    editor.load_media(
        MediaInfo::image("checkerboard.png", width, height),
        MediaFrame::with_pixels(1, pixels),
    );

    // Pointer input arrives in screen coordinates, so aim through the
    // surface's own viewport
    let at = |editor: &EditorState, s: SurfaceId, mx: f64, my: f64| {
        let p = editor.surface(s).unwrap().viewport().media_to_screen(mx, my);
        (p.x, p.y)
    };

    println!("== bbox ==");
    editor.set_tool(Tool::Bbox);
    let (sx, sy) = at(&editor, left, 40.0, 40.0);
    editor.pointer_down(left, sx, sy);
    let (sx, sy) = at(&editor, left, 200.0, 150.0);
    editor.pointer_move(left, sx, sy);
    editor.pointer_up(left, sx, sy);

    println!("== polygon ==");
    assert!(editor.set_active_label("label-lane"));
    editor.set_tool(Tool::Polygon);
    for (mx, my) in [(260.0, 80.0), (420.0, 60.0), (460.0, 200.0), (300.0, 230.0)] {
        let (sx, sy) = at(&editor, left, mx, my);
        editor.pointer_down(left, sx, sy);
    }
    editor.double_click(left);

    println!("== point ==");
    assert!(editor.set_active_label("label-marker"));
    editor.set_tool(Tool::Point);
    let (sx, sy) = at(&editor, left, 520.0, 100.0);
    editor.pointer_down(left, sx, sy);

    println!("== brush, two strokes ==");
    assert!(editor.set_active_label("label-car"));
    editor.set_tool(Tool::Brush);
    editor.set_brush_size(14.0);
    for stroke in [
        [(80.0, 300.0), (110.0, 310.0), (140.0, 300.0), (170.0, 315.0)],
        [(90.0, 340.0), (120.0, 352.0), (150.0, 348.0), (175.0, 345.0)],
    ] {
        let (mut sx, mut sy) = at(&editor, left, stroke[0].0, stroke[0].1);
        editor.pointer_down(left, sx, sy);
        for &(mx, my) in &stroke[1..] {
            (sx, sy) = at(&editor, left, mx, my);
            editor.pointer_move(left, sx, sy);
        }
        editor.pointer_up(left, sx, sy);
    }
    editor.context_menu(left);

    println!("== undo / redo ==");
    assert!(editor.undo());
    println!("  after undo: {} annotations", editor.annotations().len());
    assert!(editor.redo());
    println!("  after redo: {} annotations", editor.annotations().len());

    println!("== ml overlays ==");
    let grid = Array2::from_shape_fn((24, 32), |(y, x)| {
        let dx = x as f32 / 31.0 - 0.5;
        let dy = y as f32 / 23.0 - 0.5;
        (1.0 - (dx * dx + dy * dy).sqrt() * 2.0).max(0.0)
    });
    editor.set_layer_data(LayerData::Heatmap(HeatmapGrid::new(grid)));
    editor.set_layer_data(LayerData::Detections(vec![
        Detection {
            x: 48.0,
            y: 52.0,
            w: 150.0,
            h: 100.0,
            label: "car".to_string(),
            color: Color::from_rgb8(255, 107, 107),
            confidence: 0.92,
        },
        Detection {
            x: 420.0,
            y: 260.0,
            w: 120.0,
            h: 80.0,
            label: "car".to_string(),
            color: Color::from_rgb8(255, 107, 107),
            confidence: 0.71,
        },
    ]));
    editor.set_layer_visibility(LayerKind::Heatmap, true, 0.4);

    println!("== zoom the left surface only ==");
    editor.wheel_zoom(left, 480.0, 360.0, 3);

    let fl = editor.encode_frame(left).unwrap();
    let fr = editor.encode_frame(right).unwrap();
    assert_eq!(fl.passes, fr.passes, "backends must encode identical passes");
    assert_ne!(fl.transform, fr.transform, "transforms stay per-surface");

    println!("\nboth backends agree: {} passes, {} commands", fl.passes.len(), fl.command_count());
    for pass in &fl.passes {
        println!("  {:?}: {} commands at opacity {:.2}", pass.layer, pass.commands.len(), pass.opacity);
    }

    println!("\n== snapshot ==");
    let json = editor.export_json().unwrap();
    println!("{json}");
    let restored = editor.import_json(&json).unwrap();
    println!("re-imported {restored} annotations");
}

#[cfg(target_arch = "wasm32")]
fn main() {}
