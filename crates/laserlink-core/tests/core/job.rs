use laserlink_core::{
    JobPart, JobValidationError, LaserJob, LaserProperty, Point, RasterKind, RasterPart,
    Resolution, VectorCommand, VectorPart,
};

fn dpi500() -> Resolution {
    Resolution::new(500.0).unwrap()
}

fn square(offset: i32) -> VectorPart {
    let mut part = VectorPart::with_property(dpi500(), LaserProperty::power_speed(50.0, 80.0));
    part.move_to(offset, offset)
        .line_to(offset + 100, offset)
        .line_to(offset + 100, offset + 100)
        .line_to(offset, offset + 100)
        .line_to(offset, offset);
    part
}

#[test]
fn test_empty_job_rejected() {
    let job = LaserJob::new("empty");
    assert_eq!(
        job.validate(),
        Err(JobValidationError::EmptyJob("empty".to_string()))
    );
}

#[test]
fn test_vector_bounds() {
    let bounds = square(10).bounds().unwrap();
    assert_eq!(bounds.min, Point::new(10, 10));
    assert_eq!(bounds.max, Point::new(110, 110));
    assert!(VectorPart::new(dpi500()).bounds().is_none());
}

#[test]
fn test_check_bed() {
    let mut job = LaserJob::new("bed");
    job.add_part(square(0));
    assert!(job.check_bed(250.0, 280.0).is_ok());
    // 100px at 500dpi is ~5mm, a 4mm bed is too small
    assert!(matches!(
        job.check_bed(4.0, 280.0),
        Err(JobValidationError::ExceedsBed { index: 0, .. })
    ));

    let mut job = LaserJob::new("negative");
    job.add_part(square(-5));
    assert_eq!(
        job.check_bed(250.0, 280.0),
        Err(JobValidationError::NegativeCoordinates { index: 0 })
    );
}

#[test]
fn test_start_point_applied_once() {
    let mut job = LaserJob::new("shifted").with_start_point(Point::new(10, 20));
    job.add_part(square(10));
    let raster = RasterPart::new(
        RasterKind::BlackWhite,
        2,
        1,
        vec![255, 0],
        LaserProperty::power_speed(100.0, 50.0),
        dpi500(),
    )
    .unwrap()
    .at(Point::new(30, 40));
    job.add_part(raster);

    let applied = job.with_start_point_applied();
    assert_eq!(applied.start_point, None);
    match &applied.parts[0] {
        JobPart::Vector(v) => {
            assert_eq!(v.commands[1], VectorCommand::MoveTo { x: 0, y: -10 });
        }
        other => panic!("unexpected part {other:?}"),
    }
    match &applied.parts[1] {
        JobPart::Raster(r) => assert_eq!(r.start, Point::new(20, 20)),
        other => panic!("unexpected part {other:?}"),
    }

    // a second application is a no-op and the caller's job is untouched
    assert_eq!(applied.with_start_point_applied(), applied);
    assert_eq!(job.start_point, Some(Point::new(10, 20)));
}

#[test]
fn test_job_json_round_trip() {
    let mut job = LaserJob::new("json");
    job.add_part(square(0));
    let text = serde_json::to_string(&job).unwrap();
    assert!(text.contains("\"part\":\"vector\""));
    assert!(text.contains("\"type\":\"line_to\""));
    let parsed: LaserJob = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, job);
}

#[test]
fn test_job_json_rejects_zero_resolution() {
    let text = r#"{"name":"bad","parts":[{"part":"vector","resolution":0.0,"commands":[]}]}"#;
    assert!(serde_json::from_str::<LaserJob>(text).is_err());
}

#[test]
fn test_greyscale_raster_detected() {
    let mut job = LaserJob::new("grey");
    job.add_part(
        RasterPart::new(
            RasterKind::Greyscale,
            1,
            1,
            vec![128],
            LaserProperty::power_speed(100.0, 50.0),
            dpi500(),
        )
        .unwrap(),
    );
    assert!(job.contains_raster(RasterKind::Greyscale));
    assert!(!job.contains_raster(RasterKind::BlackWhite));
    assert_eq!(job.parts[0].kind_name(), "Raster 3D");
}
