//! End-to-end loading through the stage filter

mod common;

use approx::assert_relative_eq;
use common::*;
use pointstage_core::{DimensionId, EntityGroup, Error, Point3f, PointCloud, Vector3d};
use pointstage_io::convert::create_scalar_field_map_with;
use pointstage_io::{
    EventLevel, FileError, FileErrorCode, FileIoFilter, FilterRegistry, LoadParameters,
    MemorySink, NoProgress, ShiftMode, StageFilter,
};
use std::path::Path;

fn scalar_names(cloud: &PointCloud) -> Vec<String> {
    cloud.scalar_fields().iter().map(|f| f.name().to_string()).collect()
}

fn assert_same_content(a: &PointCloud, b: &PointCloud) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.points(), b.points());
    assert_eq!(a.global_shift(), b.global_shift());
    assert_eq!(scalar_names(a), scalar_names(b));
    for (fa, fb) in a.scalar_fields().iter().zip(b.scalar_fields()) {
        assert_eq!(fa.values(), fb.values());
    }
    assert_eq!(a.colors(), b.colors());
}

#[test]
fn test_streaming_point_count_matches_source() {
    for count in [0, 1, 999, 1000, 2500] {
        let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(count, [0.0; 3]));
        let loaded = load_stage(stage, &LoadParameters::default());
        assert!(loaded.result.is_ok(), "{} points: {:?}", count, loaded.result);
        assert_eq!(loaded.cloud().len(), count);
        for field in loaded.cloud().scalar_fields() {
            assert_eq!(field.len(), count);
        }
    }
}

#[test]
fn test_batch_point_count_matches_source() {
    let stage = ScriptedStage::new(Script::Batch, &XYZI, grid_rows(1234, [0.0; 3]));
    let loaded = load_stage(stage, &LoadParameters::default());
    assert!(loaded.result.is_ok());
    assert_eq!(loaded.cloud().len(), 1234);
    assert_eq!(loaded.cloud().scalar_field(0).unwrap().len(), 1234);
}

#[test]
fn test_estimate_is_only_a_hint() {
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(300, [0.0; 3])).with_estimate(10);
    let loaded = load_stage(stage, &LoadParameters::default());
    assert_eq!(loaded.cloud().len(), 300);

    let stage = ScriptedStage::new(Script::Batch, &XYZI, grid_rows(300, [0.0; 3])).with_estimate(5000);
    let loaded = load_stage(stage, &LoadParameters::default());
    assert_eq!(loaded.cloud().len(), 300);
}

#[test]
fn test_every_point_uses_the_first_point_shift() {
    let rows = grid_rows(2100, [1_000_000.0, 2_000_000.0, 10.0]);
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, rows.clone());
    let loaded = load_stage(stage, &LoadParameters::default());
    let cloud = loaded.cloud();

    let shift = Vector3d::new(-1_000_000.0, -2_000_000.0, 0.0);
    assert_eq!(cloud.global_shift(), shift);
    for (stored, raw) in cloud.iter().zip(&rows) {
        let expected = Point3f::new(
            (raw[0] + shift.x) as f32,
            (raw[1] + shift.y) as f32,
            (raw[2] + shift.z) as f32,
        );
        assert_eq!(*stored, expected);
    }

    let warnings = loaded.sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message,
        "Cloud has been recentered! Translation: (-1000000.00 ; -2000000.00 ; 0.00)"
    );
}

#[test]
fn test_small_coordinates_are_not_shifted() {
    let rows = grid_rows(10, [5.0, -3.0, 1.0]);
    let stage = ScriptedStage::new(Script::Batch, &XYZI, rows.clone());
    let loaded = load_stage(stage, &LoadParameters::default());
    let cloud = loaded.cloud();
    assert_eq!(cloud.global_shift(), Vector3d::zeros());
    assert!(!cloud.is_shifted());
    assert_relative_eq!(cloud[3].x, rows[3][0] as f32);
    assert!(loaded.sink.warnings().is_empty());
}

#[test]
fn test_never_shift_mode() {
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(3, [1_000_000.0, 0.0, 0.0]));
    let params = LoadParameters::default().with_shift_mode(ShiftMode::Never);
    let loaded = load_stage(stage, &params);
    assert_eq!(loaded.cloud().global_shift(), Vector3d::zeros());
    assert_eq!(loaded.cloud()[0].x, 1_000_000.0);
}

#[test]
fn test_unpreserved_shift_is_not_applied() {
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(3, [1_000_000.0, 0.0, 0.0]));
    let params = LoadParameters::default().with_preserve_coordinate_shift(false);
    let loaded = load_stage(stage, &params);
    assert_eq!(loaded.cloud().global_shift(), Vector3d::zeros());
    assert_eq!(loaded.cloud()[0].x, 1_000_000.0);
    assert!(loaded.sink.warnings().is_empty());
}

#[test]
fn test_manual_shift() {
    let stage = ScriptedStage::new(Script::Batch, &XYZI, grid_rows(3, [100.0, 200.0, 300.0]));
    let params =
        LoadParameters::default().with_shift_mode(ShiftMode::Manual(Vector3d::new(-100.0, -200.0, -300.0)));
    let loaded = load_stage(stage, &params);
    assert_eq!(loaded.cloud()[0], Point3f::new(0.0, 0.0, 0.0));
    assert!(loaded.cloud().is_shifted());
}

#[test]
fn test_intensity_scenario() {
    let rows = vec![
        vec![1_000_000.0, 2_000_000.0, 10.0, 12.0],
        vec![1_000_001.0, 2_000_001.0, 11.0, 40.0],
        vec![1_000_002.0, 2_000_002.0, 12.0, 3.0],
    ];
    for script in [Script::Streaming, Script::Batch] {
        let stage = ScriptedStage::new(script, &XYZI, rows.clone());
        let loaded = load_stage(stage, &LoadParameters::default());
        let cloud = loaded.cloud();

        assert_eq!(cloud.global_shift(), Vector3d::new(-1_000_000.0, -2_000_000.0, 0.0));
        assert_eq!(cloud[0], Point3f::new(0.0, 0.0, 10.0));
        assert_eq!(scalar_names(cloud), vec!["Intensity"]);
        let intensity = cloud.scalar_field_by_name("Intensity").unwrap();
        assert_eq!(intensity.len(), 3);
        assert_eq!(intensity.min(), 3.0);
        assert_eq!(intensity.max(), 40.0);
    }
}

#[test]
fn test_scalar_fields_exclude_coordinates_and_colors() {
    let dims = [
        DimensionId::X,
        DimensionId::Y,
        DimensionId::Z,
        DimensionId::Red,
        DimensionId::Green,
        DimensionId::Blue,
        DimensionId::GpsTime,
        DimensionId::Classification,
    ];
    let rows = vec![
        vec![0.0, 0.0, 0.0, 255.0, 0.0, 10.0, 1.5, 2.0],
        vec![1.0, 1.0, 1.0, 0.0, 255.0, 20.0, 2.5, 6.0],
    ];
    let stage = ScriptedStage::new(Script::Streaming, &dims, rows);
    let loaded = load_stage(stage, &LoadParameters::default());
    let cloud = loaded.cloud();

    assert_eq!(scalar_names(cloud), vec!["GpsTime", "Classification"]);
    assert_eq!(cloud.colors(), Some(&[[255, 0, 10], [0, 255, 20]][..]));
}

#[test]
fn test_reloading_is_idempotent() {
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(1500, [20_000.0, 0.0, 0.0]));
    let first = load_stage(stage.clone(), &LoadParameters::default());
    let second = load_stage(stage, &LoadParameters::default());
    assert_same_content(first.cloud(), second.cloud());
}

#[test]
fn test_streaming_and_batch_agree() {
    let rows = grid_rows(2345, [450_000.0, 5_400_000.0, 120.0]);
    let streamed = load_stage(
        ScriptedStage::new(Script::Streaming, &XYZI, rows.clone()),
        &LoadParameters::default(),
    );
    let batched = load_stage(ScriptedStage::new(Script::Batch, &XYZI, rows), &LoadParameters::default());
    assert_same_content(streamed.cloud(), batched.cloud());
}

#[test]
fn test_multiple_views_are_merged() {
    let rows = grid_rows(101, [0.0; 3]);
    let merged = load_stage(
        ScriptedStage::new(Script::TwoViews, &XYZI, rows.clone()),
        &LoadParameters::default(),
    );
    let single = load_stage(ScriptedStage::new(Script::Batch, &XYZI, rows), &LoadParameters::default());
    assert!(merged.result.is_ok());
    assert_same_content(merged.cloud(), single.cloud());
    assert!(merged
        .sink
        .events()
        .iter()
        .any(|e| e.message.contains("2 point views")));
}

#[test]
fn test_no_views_is_console_error() {
    let loaded = load_stage(
        ScriptedStage::new(Script::NoViews, &XYZI, grid_rows(4, [0.0; 3])),
        &LoadParameters::default(),
    );
    assert_eq!(FileErrorCode::from_result(&loaded.result), FileErrorCode::ConsoleError);
    assert!(loaded.group.is_empty());
}

#[test]
fn test_scalar_reservation_failure_keeps_earlier_fields() {
    let sink = MemorySink::new();
    let dims = [
        DimensionId::X,
        DimensionId::Y,
        DimensionId::Z,
        DimensionId::Intensity,
        DimensionId::ReturnNumber,
        DimensionId::GpsTime,
    ];
    let mut attempted = Vec::new();
    let map = create_scalar_field_map_with(&dims, 3, &sink, |field, count| {
        attempted.push(field.name().to_string());
        if attempted.len() == 2 {
            return Err(Error::OutOfMemory("no room".to_string()));
        }
        field.try_reserve(count)
    });

    assert_eq!(map.keys().collect::<Vec<_>>(), vec![DimensionId::Intensity]);
    assert_eq!(attempted, vec!["Intensity", "ReturnNumber"]);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field.as_deref(), Some("ReturnNumber"));
}

#[test]
fn test_execute_failure_is_library_exception() {
    let loaded = load_stage(
        ScriptedStage::new(Script::FailOnExecute, &XYZI, grid_rows(4, [0.0; 3])),
        &LoadParameters::default(),
    );
    assert_eq!(
        FileErrorCode::from_result(&loaded.result),
        FileErrorCode::ThirdPartyLibException
    );
    assert!(loaded.group.is_empty());
    let errors = loaded.sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("scripted read failure"));
}

#[test]
fn test_reader_panic_is_library_exception() {
    let loaded = load_stage(
        ScriptedStage::new(Script::PanicOnExecute, &XYZI, grid_rows(4, [0.0; 3])),
        &LoadParameters::default(),
    );
    match &loaded.result {
        Err(FileError::ThirdPartyLibException(message)) => {
            assert!(message.contains("scripted reader panic"))
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(loaded.group.is_empty());
}

#[test]
fn test_absurd_point_estimate_is_fatal() {
    for script in [Script::Streaming, Script::Batch] {
        let stage = ScriptedStage::new(script, &XYZI, grid_rows(4, [0.0; 3])).with_estimate(usize::MAX);
        let loaded = load_stage(stage, &LoadParameters::default());
        assert!(matches!(loaded.result, Err(FileError::ThirdPartyLibException(_))));
        assert!(loaded.group.is_empty());
        assert!(loaded
            .sink
            .events()
            .iter()
            .any(|e| e.level == EventLevel::Error && e.message.contains("Not enough memory")));
    }
}

#[test]
fn test_streaming_progress_reaches_completion() {
    let mut progress = RecordingProgress::default();
    let stage = ScriptedStage::new(Script::Streaming, &XYZI, grid_rows(2500, [0.0; 3]));
    let loaded = load_stage_with_progress(stage, &LoadParameters::default(), &mut progress);
    assert!(loaded.result.is_ok());

    assert_eq!(progress.titles, vec!["Loading file"]);
    assert_eq!(progress.updates.len(), 100);
    assert_eq!(progress.updates.last(), Some(&100.0));
    assert!(progress.updates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!((progress.starts, progress.stops), (1, 1));
}

#[test]
fn test_batch_progress_phases() {
    let mut progress = RecordingProgress::default();
    let stage = ScriptedStage::new(Script::Batch, &XYZI, grid_rows(50, [0.0; 3]));
    let params = LoadParameters::default().with_poll_interval_ms(1);
    let loaded = load_stage_with_progress(stage, &params, &mut progress);
    assert!(loaded.result.is_ok());

    assert_eq!(progress.titles, vec!["Reading file", "Loading points"]);
    assert_eq!(progress.updates.last(), Some(&100.0));
    assert_eq!((progress.starts, progress.stops), (2, 2));
}

#[test]
fn test_save_is_not_implemented() {
    let filter = StageFilter::new();
    let cloud = PointCloud::from_points("c", vec![Point3f::new(0.0, 0.0, 0.0)]);
    let result = filter.save_to_file(&cloud, Path::new("out.pcd"));
    assert_eq!(FileErrorCode::from_result(&result), FileErrorCode::NotImplemented);
}

#[test]
fn test_load_text_file_through_registry() {
    let file = TempFile::new(
        "survey.xyz",
        b"x y z intensity\n1000000.5 2000000.25 10 7\n1000001.5 2000001.25 11 9\n1000002.5 2000002.25 12 8\n",
    );
    let registry = FilterRegistry::with_default_filters();
    let mut group = EntityGroup::new();
    let params = LoadParameters::default().with_stream_capacity(2);
    registry
        .load(&file.path, &mut group, &params, &mut NoProgress)
        .unwrap();

    let cloud = &group.children()[0];
    assert_eq!(cloud.name(), file.path.display().to_string());
    assert_eq!(cloud.len(), 3);
    assert_eq!(cloud.global_shift(), Vector3d::new(-1_000_000.0, -2_000_000.0, 0.0));
    assert_eq!(cloud[0], Point3f::new(0.5, 0.25, 10.0));
    assert_eq!(scalar_names(cloud), vec!["Intensity"]);
    assert_eq!(cloud.scalar_fields()[0].values(), &[7.0, 9.0, 8.0]);
}

#[test]
fn test_load_pcd_file_through_registry() {
    let file = TempFile::new(
        "colored.pcd",
        b"# .PCD v0.7
VERSION 0.7
FIELDS x y z rgb intensity
SIZE 4 4 4 4 4
TYPE F F F U F
COUNT 1 1 1 1 1
WIDTH 2
HEIGHT 1
POINTS 2
DATA ascii
0.5 1.5 2.5 16711680 0.25
3.5 4.5 5.5 65280 0.75
",
    );
    let registry = FilterRegistry::with_default_filters();
    let mut group = EntityGroup::new();
    registry
        .load(&file.path, &mut group, &LoadParameters::default(), &mut NoProgress)
        .unwrap();

    let cloud = &group.children()[0];
    assert_eq!(cloud.len(), 2);
    assert_eq!(cloud[1], Point3f::new(3.5, 4.5, 5.5));
    assert_eq!(cloud.colors(), Some(&[[255, 0, 0], [0, 255, 0]][..]));
    assert_eq!(scalar_names(cloud), vec!["Intensity"]);
    assert_relative_eq!(cloud.scalar_fields()[0].max(), 0.75);
}

#[test]
fn test_malformed_file_leaves_group_untouched() {
    let file = TempFile::new("broken.csv", b"x,y,z\n1,2,3\n4,five,6\n");
    let sink = std::sync::Arc::new(MemorySink::new());
    let filter = StageFilter::new().with_event_sink(sink.clone());
    let mut group = EntityGroup::new();
    let result = filter.load_file(&file.path, &mut group, &LoadParameters::default(), &mut NoProgress);

    assert!(matches!(result, Err(FileError::ThirdPartyLibException(_))));
    assert!(group.is_empty());
    assert_eq!(sink.errors().len(), 1);
}

#[test]
fn test_malformed_pcd_headers_are_library_errors() {
    let headers = [
        (
            "wide.pcd",
            format!(
                "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nWIDTH {}\nHEIGHT 2\nDATA binary\n",
                usize::MAX
            ),
        ),
        (
            "empty_field.pcd",
            "FIELDS x y z intensity\nSIZE 4 4 4 4\nTYPE F F F F\nCOUNT 1 1 1 0\nWIDTH 1\nDATA binary\n"
                .to_string(),
        ),
        (
            "flat.pcd",
            "FIELDS x y intensity\nSIZE 4 4 4\nTYPE F F F\nWIDTH 1\nDATA ascii\n1 2 3\n".to_string(),
        ),
    ];
    for (name, header) in headers {
        let mut content = header.into_bytes();
        content.extend_from_slice(&[0u8; 16]);
        let file = TempFile::new(name, &content);
        let filter = StageFilter::new().with_event_sink(std::sync::Arc::new(MemorySink::new()));
        let mut group = EntityGroup::new();
        let result = filter.load_file(&file.path, &mut group, &LoadParameters::default(), &mut NoProgress);

        assert!(
            matches!(&result, Err(FileError::ThirdPartyLibException(msg)) if msg.starts_with("Invalid data")),
            "{}: {:?}",
            name,
            result
        );
        assert!(group.is_empty());
    }
}
