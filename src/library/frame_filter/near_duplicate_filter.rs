use super::Fingerprint;
use crate::library::{
    definitions::HASH_SIZE,
    errors::{ConfigError, FilterError},
    img_ops::RgbImgBuf,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub is_near_duplicate: bool,
    pub similarity: f64,
}

/// Compares each frame it is shown against the frame it was shown just before.
///
/// The filter only remembers the fingerprint of the last frame it compared, whether or not that
/// frame was judged a near-duplicate. Frames must therefore be presented in decode order, and
/// `reset` must be called before the first frame of each video.
#[derive(Debug, Clone)]
pub struct NearDuplicateFilter {
    threshold: f64,
    hash_size: u32,
    last_fingerprint: Option<Fingerprint>,
}

impl NearDuplicateFilter {
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        Ok(Self {
            threshold,
            hash_size: HASH_SIZE,
            last_fingerprint: None,
        })
    }

    pub fn fingerprint(&self, frame: &RgbImgBuf) -> Fingerprint {
        Fingerprint::from_image(frame, self.hash_size)
    }

    pub fn compare_and_advance(&mut self, frame: &RgbImgBuf) -> Result<Comparison, FilterError> {
        let current = self.fingerprint(frame);

        let comparison = match &self.last_fingerprint {
            None => Comparison {
                is_near_duplicate: false,
                similarity: 0.0,
            },
            Some(previous) => {
                let similarity = current.similarity(previous)?;
                Comparison {
                    is_near_duplicate: similarity >= self.threshold,
                    similarity,
                }
            }
        };

        self.last_fingerprint = Some(current);
        Ok(comparison)
    }

    pub fn reset(&mut self) {
        self.last_fingerprint = None;
    }

    #[cfg(test)]
    pub fn has_state(&self) -> bool {
        self.last_fingerprint.is_some()
    }
}
