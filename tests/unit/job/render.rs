use super::*;

fn opts_in(dir: &std::path::Path) -> Arc<PipelineOpts> {
    Arc::new(PipelineOpts {
        temp_dir: Some(dir.to_path_buf()),
        ffmpeg: "/nonexistent/ffmpeg".into(),
        ffprobe: "/nonexistent/ffprobe".into(),
        ..PipelineOpts::default()
    })
}

#[test]
fn empty_input_is_a_validation_error() {
    let tmp = tempfile::tempdir().unwrap();
    let job = RenderJob::new(1, Vec::new(), "mp4", TransformParams::default())
        .with_opts(opts_in(tmp.path()));
    let err = job.run(|_| {}).unwrap_err();
    assert!(matches!(err, VidfxError::Validation(_)));
}

#[test]
fn invalid_params_fail_before_touching_media() {
    let tmp = tempfile::tempdir().unwrap();
    let params = TransformParams {
        start_us: Some(10),
        end_us: Some(1),
        ..TransformParams::default()
    };
    let job = RenderJob::new(2, vec![0u8; 16], "mp4", params).with_opts(opts_in(tmp.path()));
    assert!(matches!(job.run(|_| {}), Err(VidfxError::Validation(_))));
}

#[test]
fn probe_failure_is_fatal_and_cleans_up_scratch() {
    let tmp = tempfile::tempdir().unwrap();
    let job = RenderJob::new(3, vec![0u8; 16], "mp4", TransformParams::default())
        .with_opts(opts_in(tmp.path()));

    let mut events = Vec::new();
    let err = job.run(|ev| events.push(ev)).unwrap_err();
    assert!(matches!(err, VidfxError::MediaRead(_)));
    assert!(events.is_empty());
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn spawned_job_closes_progress_before_reporting_the_error() {
    let tmp = tempfile::tempdir().unwrap();
    let handle = RenderJob::new(7, vec![0u8; 16], "mov", TransformParams::default())
        .with_opts(opts_in(tmp.path()))
        .spawn()
        .unwrap();
    assert_eq!(handle.id(), 7);

    let mut events = 0;
    let result = handle.wait_with_progress(|_| events += 1);
    assert_eq!(events, 0);
    assert!(matches!(result, Err(VidfxError::MediaRead(_))));
}
