use crate::library::{
    decoding::DecoderSession,
    definitions::BYTES_PER_MB,
    errors::{ConfigError, PipelineError},
    frame_encoder::FrameEncoder,
};

/// Predicts the total size in megabytes of the images a run would write, from the encoded size of
/// the first frame. Deduplication is ignored, so this is an upper bound on the sampled output.
///
/// The session is always left positioned at frame 0.
pub fn estimate_output_size<S>(session: &mut S, frame_interval: u64, encoder: &FrameEncoder) -> Result<f64, PipelineError>
where
    S: DecoderSession + ?Sized,
{
    if frame_interval < 1 {
        return Err(ConfigError::InvalidInterval(frame_interval.to_string()).into());
    }

    let total_frames = session.metadata().total_frames;

    let encode_result = match session.read_next_frame() {
        Ok(Some(frame)) => Some(encoder.encode(frame.image())),
        Ok(None) => None,
        Err(e) => {
            warn!("Could not read a frame to estimate output size: {}", e);
            None
        }
    };

    session.seek_to_start()?;

    let single_image_bytes = match encode_result {
        Some(encoded) => encoded.map_err(PipelineError::Estimate)?.len(),
        None => return Ok(0.0),
    };

    let single_image_mb = single_image_bytes as f64 / BYTES_PER_MB;
    let estimated_frames = total_frames / frame_interval;

    Ok(single_image_mb * estimated_frames as f64)
}
