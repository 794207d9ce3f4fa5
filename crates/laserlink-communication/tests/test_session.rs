use laserlink_communication::{
    save_job, Dialect, DeviceSession, MockResponse, MockTransport,
    MockTransportFactory, PlotterTool, SerialTarget, SessionConfig, SessionState, Target,
};
use laserlink_core::{
    ConnectionError, Error, JobValidationError, LaserJob, LaserProperty, NoProgress, Point, ProgressLog,
    ProtocolError, RasterKind, RasterPart, Resolution, VectorPart,
};
use laserlink_raster::{RasterMode, RasterOptions};

fn dpi500() -> Resolution {
    Resolution::new(500.0).unwrap()
}

fn line_job() -> LaserJob {
    let mut part = VectorPart::with_property(dpi500(), LaserProperty::power_speed(50.0, 80.0));
    part.move_to(0, 0).line_to(100, 0);
    let mut job = LaserJob::new("line");
    job.add_part(part);
    job
}

fn named(port: &str) -> Target {
    Target::Serial(SerialTarget::Named(port.to_string()))
}

fn generic_config(target: Target) -> SessionConfig {
    SessionConfig::new(Dialect::generic(), target).with_bed(250.0, 280.0)
}

#[test]
fn test_end_to_end_vector_job() {
    let device = MockTransport::responsive("COM1", "Grbl");
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    session.send_job(&line_job(), &mut NoProgress).unwrap();

    assert_eq!(
        device.written_lines(),
        vec![
            "G21",
            "G90",
            "G0 X0.000000 Y0.000000",
            "G1 X5.080000 Y0.000000 S50.000000 F960",
            "G0 X0 Y0",
        ]
    );
    assert!(device.written().ends_with("G0 X0 Y0\r\n"));
    assert!(!device.written().contains(" Z"));
    assert_eq!(device.close_count(), 1);
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(
        session.history(),
        &[
            SessionState::Idle,
            SessionState::Connecting,
            SessionState::Identifying,
            SessionState::Sending,
            SessionState::ShuttingDown,
            SessionState::Completed,
        ]
    );
}

#[test]
fn test_bad_ack_stops_transmission() {
    let device = MockTransport::new("COM1");
    for line in ["Grbl", "ok", "ok", "error:20", "ok", "ok"] {
        device.push_line(line);
    }
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();

    match err {
        Error::Protocol(ProtocolError::UnexpectedResponse { line, response }) => {
            assert_eq!(line, "G0 X0.000000 Y0.000000");
            assert_eq!(response, "error:20");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        device.written_lines(),
        vec!["G21", "G90", "G0 X0.000000 Y0.000000"]
    );
    assert_eq!(device.close_count(), 1);
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn test_ack_timeout_is_protocol_error() {
    let device = MockTransport::new("COM1");
    device.push_line("Grbl");
    device.push(MockResponse::Timeout);
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(device.written_lines(), vec!["G21"]);
    assert_eq!(device.close_count(), 1);
}

#[test]
fn test_probe_stops_at_first_identified_port() {
    let first = MockTransport::responsive("/dev/ttyUSB0", "Smoothie");
    let second = MockTransport::responsive("/dev/ttyUSB1", "Grbl");
    let third = MockTransport::responsive("/dev/ttyUSB2", "Grbl");
    let factory = MockTransportFactory::new()
        .with_serial(first.clone())
        .with_serial(second.clone())
        .with_serial(third.clone());
    let mut session = DeviceSession::with_factory(
        generic_config(Target::Serial(SerialTarget::Auto)),
        factory.clone(),
    );

    session.send_job(&line_job(), &mut NoProgress).unwrap();

    assert_eq!(factory.opened(), vec!["/dev/ttyUSB0", "/dev/ttyUSB1"]);
    assert_eq!(first.close_count(), 1);
    assert!(first.written().is_empty());
    assert_eq!(second.written_lines().len(), 5);
    assert_eq!(second.close_count(), 1);
    assert_eq!(third.close_count(), 0);
}

#[test]
fn test_probe_exhausted_reports_every_candidate() {
    let silent = MockTransport::new("COM4");
    silent.push(MockResponse::Eof);
    let factory = MockTransportFactory::new()
        .with_busy_serial("COM3")
        .with_serial(silent.clone());
    let mut session = DeviceSession::with_factory(
        generic_config(Target::Serial(SerialTarget::Auto)),
        factory,
    );

    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();

    match err {
        Error::Connection(ConnectionError::ProbeExhausted { attempts }) => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0], "Port in use COM3");
            assert!(attempts[1].contains("COM4"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(silent.close_count(), 1);
}

#[test]
fn test_probe_without_ports() {
    let mut session = DeviceSession::with_factory(
        generic_config(Target::Serial(SerialTarget::Auto)),
        MockTransportFactory::new(),
    );
    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::NoSerialPorts)
    ));
}

#[test]
fn test_teardown_closes_once_on_any_write_failure() {
    for failing_write in 0..12 {
        let device = MockTransport::responsive("COM1", "Grbl");
        device.fail_writes_after(failing_write);
        let factory = MockTransportFactory::new().with_serial(device.clone());
        let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

        let result = session.send_job(&line_job(), &mut NoProgress);

        assert_eq!(device.close_count(), 1, "failing write {failing_write}");
        if let Err(e) = result {
            assert!(matches!(e, Error::Io(_)), "{e:?}");
            assert_eq!(session.state(), SessionState::Closed);
        } else {
            assert_eq!(session.state(), SessionState::Completed);
        }
    }
}

#[test]
fn test_device_hangup_closes_once() {
    let device = MockTransport::new("COM1");
    device.push_line("Grbl");
    device.push_line("ok");
    device.push(MockResponse::Eof);
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();

    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::ConnectionClosed { .. })
    ));
    assert_eq!(device.close_count(), 1);
}

#[test]
fn test_identification_mismatch_on_named_port() {
    let device = MockTransport::responsive("COM1", "Marlin 2.0");
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();

    assert!(err.is_identification_error());
    assert!(device.written().is_empty());
    assert_eq!(device.close_count(), 1);
    assert!(session.history().contains(&SessionState::Identifying));
}

#[test]
fn test_validation_happens_before_connecting() {
    let device = MockTransport::responsive("COM1", "Grbl");
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory.clone());

    let err = session
        .send_job(&LaserJob::new("nothing"), &mut NoProgress)
        .unwrap_err();

    assert!(err.is_validation_error());
    assert!(factory.opened().is_empty());
    assert_eq!(
        session.history(),
        &[SessionState::Idle, SessionState::Aborting, SessionState::Closed]
    );
}

#[test]
fn test_job_outside_bed_rejected() {
    let mut part = VectorPart::with_property(dpi500(), LaserProperty::power_speed(50.0, 80.0));
    part.move_to(0, 0).line_to(6000, 0);
    let mut job = LaserJob::new("wide");
    job.add_part(part);
    let factory = MockTransportFactory::new();
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory.clone());

    let err = session.send_job(&job, &mut NoProgress).unwrap_err();

    assert!(matches!(
        err,
        Error::JobValidation(JobValidationError::ExceedsBed { index: 0, .. })
    ));
    assert!(factory.opened().is_empty());
}

#[test]
fn test_makeblock_rejects_greyscale_before_connecting() {
    let raster = RasterPart::new(
        RasterKind::Greyscale,
        2,
        1,
        vec![40, 200],
        LaserProperty::power_speed(100.0, 50.0),
        dpi500(),
    )
    .unwrap();
    let mut job = LaserJob::new("photo");
    job.add_part(raster);
    let factory = MockTransportFactory::new().with_serial(MockTransport::new("COM1").with_auto_ok());
    let config = SessionConfig::new(Dialect::makeblock(PlotterTool::Pen), named("COM1"));
    let mut session = DeviceSession::with_factory(config, factory.clone());

    let err = session.send_job(&job, &mut NoProgress).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Raster 3D parts are not implemented for MakeBlockXYPlotter"
    );
    assert!(factory.opened().is_empty());
}

#[test]
fn test_progress_and_tasks() {
    let mut job = line_job();
    job.add_part(line_job().parts[0].clone());
    let factory = MockTransportFactory::new().with_serial(MockTransport::responsive("COM1", "Grbl"));
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);
    let mut log = ProgressLog::default();

    session.send_job(&job, &mut log).unwrap();

    assert_eq!(log.percents, vec![0, 20, 50, 80, 100]);
    assert_eq!(
        log.tasks,
        vec!["checking job", "connecting...", "sending", "disconnecting", "sent."]
    );
}

#[test]
fn test_failed_send_never_reports_completion() {
    let device = MockTransport::responsive("COM1", "Grbl");
    device.fail_writes_after(4);
    let factory = MockTransportFactory::new().with_serial(device);
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);
    let mut log = ProgressLog::default();

    assert!(session.send_job(&line_job(), &mut log).is_err());
    assert!(log.percents.iter().all(|p| *p < 100));
    assert!(log.percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(log.tasks.last().map(String::as_str), Some("disconnecting"));
}

#[test]
fn test_session_sends_one_job_only() {
    let factory = MockTransportFactory::new().with_serial(MockTransport::responsive("COM1", "Grbl"));
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);
    session.send_job(&line_job(), &mut NoProgress).unwrap();
    let err = session.send_job(&line_job(), &mut NoProgress).unwrap_err();
    assert!(matches!(err, Error::Other(_)));
}

#[test]
fn test_network_target_identifies_too() {
    let device = MockTransport::responsive("10.0.0.9:23", "Grbl");
    let factory = MockTransportFactory::new().with_network(device.clone());
    let target = Target::from_settings("10.0.0.9", "auto").unwrap();
    let mut session = DeviceSession::with_factory(generic_config(target), factory.clone());

    session.send_job(&line_job(), &mut NoProgress).unwrap();

    assert_eq!(factory.opened(), vec!["10.0.0.9:23"]);
    assert_eq!(device.written_lines().len(), 5);
}

#[test]
fn test_start_point_applied_once_without_touching_caller_job() {
    let mut part = VectorPart::with_property(dpi500(), LaserProperty::power_speed(50.0, 80.0));
    part.move_to(100, 100).line_to(200, 100);
    let mut job = LaserJob::new("shifted");
    job.add_part(part);
    let job = job.with_start_point(Point::new(100, 100));
    let original = job.clone();
    let device = MockTransport::responsive("COM1", "Grbl");
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let mut session = DeviceSession::with_factory(generic_config(named("COM1")), factory);

    session.send_job(&job, &mut NoProgress).unwrap();

    assert_eq!(job, original);
    assert_eq!(device.written_lines()[2], "G0 X0.000000 Y0.000000");
}

#[test]
fn test_marlin_drains_banner_and_streams_g7() {
    let device = MockTransport::new("/dev/ttyACM0").with_auto_ok();
    for line in [
        "start",
        "echo:Marlin 1.1.0-RC8",
        "echo:Steps per unit:",
        "echo:  M92 X80.00 Y80.00",
        "echo:SD card ok",
    ] {
        device.push_line(line);
    }
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let raster = RasterPart::new(
        RasterKind::BlackWhite,
        3,
        2,
        vec![255, 255, 0, 0, 255, 255],
        LaserProperty::power_speed(60.0, 50.0),
        Resolution::new(254.0).unwrap(),
    )
    .unwrap();
    let mut job = LaserJob::new("logo");
    job.add_part(raster);
    let config = SessionConfig::new(Dialect::marlin(), named("/dev/ttyACM0")).with_raster(
        RasterOptions {
            mode: RasterMode::BinaryChunk,
            ..RasterOptions::default()
        },
    );
    let mut session = DeviceSession::with_factory(config, factory);

    session.send_job(&job, &mut NoProgress).unwrap();

    let lines = device.written_lines();
    assert_eq!(&lines[..4], &["G21", "G90", "G28 XY", "M5"]);
    assert_eq!(lines[4], ";Beginning of Raster Image. Pixel size: 3x2");
    assert_eq!(lines[5], "M649 S60.000000 B2 D0 R0.100000");
    assert_eq!(lines[6], "G0 F600.000000");
    assert_eq!(lines[7], "G0 X0.000000 Y0.000000");
    assert!(lines[8].starts_with("G7 $1 L4 D"), "{}", lines[8]);
    assert_eq!(lines[9], "G0 X0.200000 Y0.100000");
    assert!(lines[10].starts_with("G7 $0 L4 D"), "{}", lines[10]);
    assert_eq!(
        &lines[11..],
        &[
            "M5",
            "M649 S60.000000 B0 D0 R0.100000",
            ";End of Raster Image.",
            "G0 X0 Y0",
            "M5",
            "G28 XY",
        ]
    );
}

#[test]
fn test_vector_after_g7_raster_restates_feed() {
    let raster = RasterPart::new(
        RasterKind::BlackWhite,
        2,
        1,
        vec![255, 255],
        LaserProperty::power_speed(50.0, 100.0),
        Resolution::new(254.0).unwrap(),
    )
    .unwrap()
    .at(Point::new(0, 10));
    let mut job = LaserJob::new("mixed");
    job.add_part(line_job().parts[0].clone());
    job.add_part(raster);
    job.add_part(line_job().parts[0].clone());
    let config = SessionConfig::new(Dialect::marlin(), named("COM1")).with_raster(RasterOptions {
        mode: RasterMode::BinaryChunk,
        ..RasterOptions::default()
    });

    let mut out = Vec::new();
    save_job(&config, &job, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.contains(&"G0 F1200.000000"));
    let end = lines
        .iter()
        .position(|l| *l == ";End of Raster Image.")
        .unwrap();
    assert_eq!(
        &lines[end + 1..end + 3],
        &["G0 X0.000000 Y0.000000", "G1 X5.080000 Y0.000000 S50.000000 F600"]
    );
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("G1 ")).count(),
        2,
        "{text}"
    );
}

#[test]
fn test_saved_output_matches_sent_bytes() {
    let device = MockTransport::responsive("COM1", "Grbl");
    let factory = MockTransportFactory::new().with_serial(device.clone());
    let config = generic_config(named("COM1"));
    let mut session = DeviceSession::with_factory(config.clone(), factory);
    let mut job = line_job();
    let raster = RasterPart::new(
        RasterKind::Greyscale,
        4,
        2,
        vec![0, 128, 255, 0, 255, 255, 0, 64],
        LaserProperty::power_speed(100.0, 40.0),
        dpi500(),
    )
    .unwrap()
    .at(Point::new(10, 10));
    job.add_part(raster);

    session.send_job(&job, &mut NoProgress).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let lines = save_job(&config, &job, file.as_file_mut()).unwrap();
    let saved = std::fs::read_to_string(file.path()).unwrap();

    assert_eq!(saved, device.written());
    assert_eq!(lines, device.written_lines().len());
}
