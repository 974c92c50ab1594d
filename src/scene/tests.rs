use super::*;
use crate::config::{SceneCompression, SceneConfig};
use crate::draw::canvas::CompositingCanvas;
use crate::draw::geometry::Point;
use crate::draw::object::{DrawObject, ObjectData};
use crate::draw::path::PathCommand;
use crate::draw::polygon::RectShape;
use crate::draw::props::ObjectProps;
use crate::draw::color::{BLUE, RED, WHITE};
use crate::draw::{Color, EraserPath};
use std::fs;
use std::cell::RefCell;
use std::rc::Rc;

fn rect(left: f64, top: f64, fill: Color) -> DrawObject {
    RectShape::new(50.0, 50.0, ObjectProps::at(left, top).with_fill(fill))
        .unwrap()
        .into()
}

fn sample_scene() -> SceneFile {
    let mut canvas = CompositingCanvas::new(120, 80);
    canvas.set_background(Some(WHITE));
    canvas.add(rect(10.0, 10.0, Color::from_rgb8(0xE8, 0x0F, 0x07))).unwrap();
    let eraser = EraserPath::new(
        vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::LineTo(Point::new(60.0, 60.0)),
        ],
        ObjectProps::default(),
    )
    .unwrap();
    canvas.add(eraser).unwrap();
    SceneFile::from_canvas(&canvas)
}

fn plain_options() -> SceneOptions {
    SceneOptions {
        compression: CompressionMode::Off,
        ..SceneOptions::default()
    }
}

#[test]
fn options_from_config_copies_limits() {
    let cfg = SceneConfig {
        compression: SceneCompression::On,
        backup_retention: 3,
        max_objects: 7,
        ..SceneConfig::default()
    };
    let options = SceneOptions::from_config(&cfg);
    assert_eq!(options.compression, CompressionMode::On);
    assert_eq!(options.backup_retention, 3);
    assert_eq!(options.max_objects, 7);
    assert_eq!(
        options.auto_compress_threshold_bytes,
        DEFAULT_AUTO_COMPRESS_THRESHOLD_BYTES
    );
}

#[test]
fn sidecar_paths_extend_the_file_name() {
    let path = std::path::Path::new("/tmp/board.json");
    assert_eq!(
        backup_file_path(path, 0),
        std::path::PathBuf::from("/tmp/board.json.bak")
    );
    assert_eq!(
        backup_file_path(path, 2),
        std::path::PathBuf::from("/tmp/board.json.bak.2")
    );
    assert_eq!(
        lock_file_path(path),
        std::path::PathBuf::from("/tmp/board.json.lock")
    );
}

#[test]
fn save_and_load_plain_scene() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let scene = sample_scene();

    save_scene(&path, &scene, &plain_options()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"eraser-path\""));

    let loaded = load_scene(&path, &plain_options()).unwrap();
    assert!(!loaded.compressed);
    assert_eq!(loaded.scene.width, 120);
    assert_eq!(loaded.scene.background, Some(WHITE));
    assert_eq!(loaded.scene.objects, scene.objects);
}

#[test]
fn compressed_scene_round_trips() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let options = SceneOptions {
        compression: CompressionMode::On,
        ..SceneOptions::default()
    };

    save_scene(&path, &sample_scene(), &options).unwrap();
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let loaded = load_scene(&path, &options).unwrap();
    assert!(loaded.compressed);
    assert_eq!(loaded.scene.objects.len(), 2);
}

#[test]
fn auto_compression_respects_threshold() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let options = SceneOptions {
        compression: CompressionMode::Auto,
        auto_compress_threshold_bytes: 1,
        ..SceneOptions::default()
    };
    save_scene(&path, &sample_scene(), &options).unwrap();
    assert!(load_scene(&path, &options).unwrap().compressed);

    let options = SceneOptions {
        auto_compress_threshold_bytes: u64::MAX,
        ..options
    };
    save_scene(&path, &sample_scene(), &options).unwrap();
    assert!(!load_scene(&path, &options).unwrap().compressed);
}

#[test]
fn saving_twice_keeps_a_backup() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let mut scene = sample_scene();

    save_scene(&path, &scene, &plain_options()).unwrap();
    scene.width = 999;
    save_scene(&path, &scene, &plain_options()).unwrap();

    let backup = load_scene(&backup_file_path(&path, 0), &plain_options()).unwrap();
    assert_eq!(backup.scene.width, 120);
    assert_eq!(load_scene(&path, &plain_options()).unwrap().scene.width, 999);
}

#[test]
fn backups_rotate_up_to_retention() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let options = SceneOptions {
        backup_retention: 2,
        ..plain_options()
    };
    let mut scene = sample_scene();
    for width in [1, 2, 3, 4] {
        scene.width = width;
        save_scene(&path, &scene, &options).unwrap();
    }

    let width_of = |p: &std::path::Path| load_scene(p, &options).unwrap().scene.width;
    assert_eq!(width_of(&path), 4);
    assert_eq!(width_of(&backup_file_path(&path, 0)), 3);
    assert_eq!(width_of(&backup_file_path(&path, 1)), 2);
    assert!(!backup_file_path(&path, 2).exists());
}

#[test]
fn zero_retention_keeps_no_backup() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let options = SceneOptions {
        backup_retention: 0,
        ..plain_options()
    };
    save_scene(&path, &sample_scene(), &options).unwrap();
    save_scene(&path, &sample_scene(), &options).unwrap();
    assert!(path.exists());
    assert!(!backup_file_path(&path, 0).exists());
}

#[test]
fn oversized_scene_is_not_written() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let options = SceneOptions {
        max_file_size_bytes: 16,
        ..plain_options()
    };
    assert!(save_scene(&path, &sample_scene(), &options).is_err());
    assert!(!path.exists());
}

#[test]
fn failed_save_removes_its_temporary_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    // A non-empty directory in the way makes the final rename fail.
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();
    let options = SceneOptions {
        backup_retention: 0,
        ..plain_options()
    };

    assert!(save_scene(&path, &sample_scene(), &options).is_err());
    assert!(path.join("keep").exists());
    assert!(!temp.path().join("scene.json.tmp").exists());
}

#[test]
fn compressed_payload_over_the_limit_is_refused() {
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    let mut json = serde_json::to_vec(&sample_scene()).unwrap();
    json.extend(std::iter::repeat_n(b' ', 200_000));
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json).unwrap();
    let compressed = encoder.finish().unwrap();
    fs::write(&path, &compressed).unwrap();

    let options = SceneOptions {
        max_file_size_bytes: 10_000,
        ..plain_options()
    };
    assert!((compressed.len() as u64) < options.max_file_size_bytes);
    let err = load_scene(&path, &options).unwrap_err();
    assert!(err.to_string().contains("exceeds the configured limit"));

    let roomy = SceneOptions {
        max_file_size_bytes: 1_000_000,
        ..plain_options()
    };
    let loaded = load_scene(&path, &roomy).unwrap();
    assert!(loaded.compressed);
    assert_eq!(loaded.scene.objects.len(), 2);
}

#[test]
fn load_truncates_excess_objects() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("scene.json");
    save_scene(&path, &sample_scene(), &plain_options()).unwrap();

    let options = SceneOptions {
        max_objects: 1,
        ..plain_options()
    };
    let loaded = load_scene(&path, &options).unwrap();
    assert_eq!(loaded.scene.objects.len(), 1);
    assert!(matches!(loaded.scene.objects[0], ObjectData::Rect(_)));
}

#[test]
fn load_missing_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    assert!(load_scene(&temp.path().join("absent.json"), &plain_options()).is_err());
}

fn eraser_src_record(src: &str) -> ObjectData {
    serde_json::from_value(serde_json::json!({
        "type": "eraser-path",
        "src": src,
        "strokeWidth": 10.0,
    }))
    .unwrap()
}

fn image_record(src: &str, left: f64) -> ObjectData {
    serde_json::from_value(serde_json::json!({
        "type": "image",
        "src": src,
        "left": left,
        "top": 0.0,
    }))
    .unwrap()
}

fn loader_with_resources() -> MemoryLoader {
    let mut loader = MemoryLoader::default();
    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 4, 4).unwrap();
    loader.insert_image("dot.png", &surface).unwrap();
    loader.insert_text("stroke.json", r#"[["M",0,0],["L",20,20]]"#);
    loader
}

#[test]
fn restore_keeps_record_order_for_late_arrivals() {
    let canvas = Rc::new(RefCell::new(CompositingCanvas::new(100, 100)));
    let records = vec![
        image_record("dot.png", 0.0),
        rect(0.0, 0.0, RED).to_object(),
        eraser_src_record("stroke.json"),
        rect(30.0, 30.0, BLUE).to_object(),
    ];
    let mut loader = loader_with_resources();

    let summary = restore_into(&canvas, records, &mut loader);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.deferred, 2);
    assert_eq!(summary.rejected, 0);
    assert_eq!(canvas.borrow().len(), 2);

    assert_eq!(loader.run_pending(), 2);
    let canvas = canvas.borrow();
    let kinds: Vec<_> = canvas.objects().map(|(_, o)| o.kind_name()).collect();
    assert_eq!(kinds, ["image", "rect", "eraser-path", "rect"]);
}

#[test]
fn restore_counts_invalid_records() {
    let canvas = Rc::new(RefCell::new(CompositingCanvas::new(100, 100)));
    let bad_image: ObjectData = serde_json::from_value(serde_json::json!({
        "type": "image",
        "src": "",
    }))
    .unwrap();
    let mut loader = MemoryLoader::default();

    let summary = restore_into(&canvas, vec![bad_image], &mut loader);
    assert_eq!(summary.rejected, 1);
    assert!(canvas.borrow().is_empty());
}

#[test]
fn completions_after_dispose_are_dropped() {
    let canvas = Rc::new(RefCell::new(CompositingCanvas::new(100, 100)));
    let mut loader = loader_with_resources();
    restore_into(&canvas, vec![image_record("dot.png", 0.0)], &mut loader);

    canvas.borrow_mut().dispose();
    assert_eq!(loader.run_pending(), 1);
    assert!(canvas.borrow().is_empty());
}

#[test]
fn completions_after_drop_are_dropped() {
    let canvas = Rc::new(RefCell::new(CompositingCanvas::new(100, 100)));
    let mut loader = loader_with_resources();
    restore_into(&canvas, vec![eraser_src_record("stroke.json")], &mut loader);

    drop(canvas);
    assert_eq!(loader.run_pending(), 1);
}

#[test]
fn failed_loads_leave_the_scene_unchanged() {
    let canvas = Rc::new(RefCell::new(CompositingCanvas::new(100, 100)));
    let mut loader = MemoryLoader::default();
    restore_into(&canvas, vec![image_record("missing.png", 0.0)], &mut loader);
    loader.run_pending();
    assert!(canvas.borrow().is_empty());
}
