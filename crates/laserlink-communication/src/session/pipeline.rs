//! Job body emission
//!
//! Shared by live sends and file output so both produce the same lines in
//! the same order.

use super::SessionConfig;
use crate::protocol::{GcodeEncoder, LineSink};
use laserlink_core::{
    lower_vector, part_progress, JobPart, JobValidationError, LaserJob, ProgressListener, Result,
};
use laserlink_raster::lower_raster;

/// Check a job against a configuration before anything is opened
pub fn check_job(config: &SessionConfig, job: &LaserJob) -> Result<()> {
    job.validate()?;
    job.check_bed(config.bed_width_mm, config.bed_height_mm)?;
    for part in &job.parts {
        if let JobPart::Raster(raster) = part {
            if !config.dialect.supports_raster(raster.kind) {
                return Err(JobValidationError::UnsupportedPart {
                    dialect: config.dialect.kind.to_string(),
                    part: part.kind_name(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Write the pre-job lines, every part and the post-job lines to `sink`
///
/// Modal state starts out unknown. Progress is reported as 20 after the
/// pre-job lines and interpolated up to 80 across the parts. Returns the
/// number of lines written.
pub fn emit_job(
    config: &SessionConfig,
    job: &LaserJob,
    sink: &mut dyn LineSink,
    progress: &mut dyn ProgressListener,
) -> Result<usize> {
    let mut count = 0usize;
    for line in &config.pre_job {
        sink.send_line(line)?;
        count += 1;
    }
    progress.progress_changed(20);

    let raster_options = config.raster_options();
    let mut encoder = GcodeEncoder::new(&config.dialect, config.bed_width_mm);
    let mut lines = Vec::new();
    let total = job.parts.len();
    for (index, part) in job.parts.iter().enumerate() {
        let resolution = part.resolution();
        let ops = match part {
            JobPart::Vector(vector) => lower_vector(vector),
            JobPart::Raster(raster) => lower_raster(raster, &raster_options),
        };
        tracing::debug!(
            "Part {} ({}): {} operations",
            index,
            part.kind_name(),
            ops.len()
        );
        for op in &ops {
            encoder.encode(op, resolution, &mut lines);
            for line in lines.drain(..) {
                sink.send_line(&line)?;
                count += 1;
            }
        }
        progress.progress_changed(part_progress(index + 1, total));
    }

    encoder.finish(&mut lines);
    for line in lines.drain(..).chain(config.post_job.iter().cloned()) {
        sink.send_line(&line)?;
        count += 1;
    }
    Ok(count)
}
