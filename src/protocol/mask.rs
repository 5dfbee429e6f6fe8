//! Payload masking (RFC 6455 §5.3).
//!
//! Byte `i` of a masked payload is XORed with `key[i % 4]`. XOR is its own
//! inverse, so the same routine masks outbound frames and unmasks inbound ones.

/// Reference masking, one byte per step.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    data.iter_mut()
        .zip(mask.iter().cycle())
        .for_each(|(byte, key)| *byte ^= key);
}

/// Masking eight bytes per step.
///
/// The key is widened to a `u64` (two copies back to back), which keeps its
/// phase because every word starts on a multiple of four. Output is identical
/// to [`apply_mask`].
#[inline]
pub fn apply_mask_fast(data: &mut [u8], mask: [u8; 4]) {
    let mut wide = [0u8; 8];
    wide[..4].copy_from_slice(&mask);
    wide[4..].copy_from_slice(&mask);
    let wide = u64::from_ne_bytes(wide);

    let mut words = data.chunks_exact_mut(8);
    for word in &mut words {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(word);
        word.copy_from_slice(&(u64::from_ne_bytes(bytes) ^ wide).to_ne_bytes());
    }
    apply_mask(words.into_remainder(), mask);
}
