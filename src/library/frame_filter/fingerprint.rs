use crate::library::{
    errors::FilterError,
    img_ops::{gray_thumbnail, RgbImgBuf},
};

/// Difference hash of a frame: one bit per cell of a `width` x `height` grid, set when the
/// cell's right-hand neighbour is brighter than the cell itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    width: u32,
    height: u32,
    bits: Vec<u64>,
}

impl Fingerprint {
    pub fn from_image(img: &RgbImgBuf, hash_size: u32) -> Self {
        //one extra column, so that every cell in the grid has a right-hand neighbour.
        let thumb = gray_thumbnail(img, hash_size + 1, hash_size);

        let mut ret = Self::empty(hash_size, hash_size);
        for y in 0..hash_size {
            for x in 0..hash_size {
                let left = thumb.get_pixel(x, y).0[0];
                let right = thumb.get_pixel(x + 1, y).0[0];
                if right > left {
                    ret.set_bit(x, y);
                }
            }
        }

        ret
    }

    fn empty(width: u32, height: u32) -> Self {
        let num_bits = (width * height) as usize;
        Self {
            width,
            height,
            bits: vec![0; (num_bits + 63) / 64],
        }
    }

    fn set_bit(&mut self, x: u32, y: u32) {
        let bit_no = (y * self.width + x) as usize;
        self.bits[bit_no / 64] |= 1 << (bit_no % 64);
    }

    #[cfg(test)]
    pub fn bit(&self, x: u32, y: u32) -> bool {
        let bit_no = (y * self.width + x) as usize;
        (self.bits[bit_no / 64] >> (bit_no % 64)) & 1 == 1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn num_bits(&self) -> u32 {
        self.width * self.height
    }

    pub fn hamming_distance(&self, other: &Self) -> Result<u32, FilterError> {
        if self.dimensions() != other.dimensions() {
            return Err(FilterError::FingerprintMismatch(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }

        Ok(raw_distance(&self.bits, &other.bits))
    }

    /// 1.0 for identical fingerprints, 0.0 when every bit differs.
    pub fn similarity(&self, other: &Self) -> Result<f64, FilterError> {
        let distance = self.hamming_distance(other)?;
        let num_bits = self.num_bits();
        if num_bits == 0 {
            return Ok(1.0);
        }

        Ok(1.0 - (distance as f64 / num_bits as f64))
    }
}

fn raw_distance(x: &[u64], y: &[u64]) -> u32 {
    x.iter().zip(y.iter()).fold(0, |acc, (x, y)| {
        let difference = x ^ y;
        let set_bits = difference.count_ones();
        acc + set_bits
    })
}

#[cfg(test)]
impl Fingerprint {
    pub fn from_u64(bits: u64) -> Self {
        Self {
            width: 8,
            height: 8,
            bits: vec![bits],
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.bits.as_slice() {
            [bits] if self.dimensions() == (8, 8) => Some(*bits),
            _ => None,
        }
    }
}
