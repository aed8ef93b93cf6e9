use std::hash::{Hash, Hasher};

/// An f32 that can participate in `Hash`/`Eq`, used for the float fields of state descriptions
/// (sampler LOD bias, depth bias, clear values) that are used as cache keys.
///
/// Comparison is bitwise, so `0.0` and `-0.0` are different keys and NaN equals itself. That is
/// the behavior a cache wants: two descriptions are equal only if they would program the GPU
/// identically.
#[derive(Debug, Copy, Clone, Default)]
pub struct DecimalF32(pub f32);

impl From<f32> for DecimalF32 {
    fn from(value: f32) -> Self {
        DecimalF32(value)
    }
}

impl From<DecimalF32> for f32 {
    fn from(value: DecimalF32) -> Self {
        value.0
    }
}

impl PartialEq for DecimalF32 {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for DecimalF32 {}

impl Hash for DecimalF32 {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.0.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::DecimalF32;
    use std::collections::HashSet;

    #[test]
    fn equal_values_hash_together() {
        let mut set = HashSet::new();
        set.insert(DecimalF32(1.5));
        assert!(set.contains(&DecimalF32(1.5)));
        assert!(!set.contains(&DecimalF32(1.25)));
    }

    #[test]
    fn nan_is_a_usable_key() {
        let nan = DecimalF32(f32::NAN);
        assert_eq!(nan, nan);
    }
}
