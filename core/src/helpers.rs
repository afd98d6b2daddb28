/// Take any vec, set its length and fill it with the default value.
///
/// Only allocates when `len` exceeds the current capacity.
pub fn prepare_cache_vec<T: Copy>(vec: &mut Vec<T>, len: usize, default: T) {
    vec.clear();
    vec.resize(len, default);
}

/// Sum the values of `source` to the values of `target`, writing to `target`.
pub fn sum_into(source: &[f32], target: &mut [f32]) {
    for (t, s) in target.iter_mut().zip(source.iter()) {
        *t += *s;
    }
}

/// Decibels to a linear amplitude factor.
#[inline(always)]
pub fn db_to_amp(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Linear amplitude to decibels. Silence maps to negative infinity.
#[inline(always)]
pub fn amp_to_db(amp: f32) -> f32 {
    if amp <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * amp.log10()
    }
}
