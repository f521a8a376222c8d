use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use parkwatch::config::{DetectorKind, ParkwatchConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PARKWATCH_CONFIG",
        "PARKWATCH_SPACES",
        "PARKWATCH_SOURCE_URL",
        "PARKWATCH_TARGET_FPS",
        "PARKWATCH_DETECTOR",
        "PARKWATCH_REPLAY_PATH",
        "PARKWATCH_MODEL_PATH",
        "PARKWATCH_VEHICLE_CLASSES",
        "PARKWATCH_OUTPUT_DIR",
        "PARKWATCH_FONT",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "spaces_path": "lot_a/parking_spaces2.json",
            "source": {
                "url": "stub://lot-a",
                "target_fps": 5,
                "width": 800,
                "height": 600,
                "frames": 20
            },
            "detector": {
                "backend": "replay",
                "replay_path": "detections.jsonl",
                "confidence_threshold": 0.4
            },
            "vehicle_classes": [2, 7],
            "queue_depth": 3,
            "output": {
                "dir": "out",
                "every_n_frames": 5
            },
            "overlay": {
                "font_path": "fonts/lot.ttf"
            }
        }"#,
    );

    std::env::set_var("PARKWATCH_CONFIG", file.path());
    std::env::set_var("PARKWATCH_SOURCE_URL", "/var/lib/parkwatch/frames");
    std::env::set_var("PARKWATCH_VEHICLE_CLASSES", "2, 5,7");
    std::env::set_var("PARKWATCH_FONT", "/usr/share/fonts/lot.ttf");

    let cfg = ParkwatchConfig::load().expect("load config");

    assert_eq!(cfg.spaces_path, PathBuf::from("lot_a/parking_spaces2.json"));
    assert_eq!(cfg.source.url, "/var/lib/parkwatch/frames");
    assert_eq!(cfg.source.target_fps, 5);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);
    assert_eq!(cfg.source.frame_limit, 20);
    assert_eq!(cfg.detector.backend, DetectorKind::Replay);
    assert_eq!(cfg.detector.replay_path, Some(PathBuf::from("detections.jsonl")));
    assert!((cfg.detector.confidence_threshold - 0.4).abs() < f32::EPSILON);
    assert_eq!(cfg.vehicle_classes, vec![2, 5, 7]);
    assert_eq!(cfg.queue_depth, 3);
    assert_eq!(cfg.output.dir, Some(PathBuf::from("out")));
    assert_eq!(cfg.output.every_n_frames, 5);
    assert_eq!(cfg.font_path, Some(PathBuf::from("/usr/share/fonts/lot.ttf")));

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ParkwatchConfig::load().expect("load config");
    assert_eq!(cfg.spaces_path, PathBuf::from("parking_spaces1.json"));
    assert_eq!(cfg.source.url, "stub://lot");
    assert_eq!(cfg.source.target_fps, 10);
    assert_eq!(cfg.detector.backend, DetectorKind::Stub);
    assert_eq!(cfg.vehicle_classes, vec![2]);
    assert_eq!(cfg.queue_depth, 1);
    assert!(cfg.output.dir.is_none());
    assert!(cfg.font_path.is_none());
    assert!(cfg.vehicle_classes().unwrap().accepts(Some(2)));

    clear_env();
}

#[test]
fn replay_backend_without_path_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PARKWATCH_DETECTOR", "replay");
    let err = ParkwatchConfig::load().unwrap_err();
    assert!(err.to_string().contains("replay_path"));

    clear_env();
}

#[test]
fn invalid_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    for json in [
        r#"{ "vehicle_classes": [] }"#,
        r#"{ "queue_depth": 0 }"#,
        r#"{ "output": { "every_n_frames": 0 } }"#,
        r#"{ "detector": { "confidence_threshold": 1.5 } }"#,
        r#"{ "detector": { "backend": "tract" } }"#,
        r#"{ "detector": { "backend": "yolo" } }"#,
    ] {
        let file = write_config(json);
        std::env::set_var("PARKWATCH_CONFIG", file.path());
        assert!(ParkwatchConfig::load().is_err(), "{json} should be rejected");
    }

    clear_env();
    std::env::set_var("PARKWATCH_TARGET_FPS", "fast");
    assert!(ParkwatchConfig::load().is_err());
    clear_env();
    std::env::set_var("PARKWATCH_VEHICLE_CLASSES", "car");
    assert!(ParkwatchConfig::load().is_err());

    clear_env();
}
