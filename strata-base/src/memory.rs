pub fn round_size_up_to_alignment_u64(
    size: u64,
    required_alignment: u64,
) -> u64 {
    assert!(required_alignment > 0);
    size.div_ceil(required_alignment) * required_alignment
}

pub fn slice_size_in_bytes<T>(slice: &[T]) -> usize {
    std::mem::size_of_val(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_alignment() {
        assert_eq!(round_size_up_to_alignment_u64(0, 256), 0);
        assert_eq!(round_size_up_to_alignment_u64(1, 256), 256);
        assert_eq!(round_size_up_to_alignment_u64(257, 256), 512);
        assert_eq!(round_size_up_to_alignment_u64(1024, 4), 1024);
    }

    #[test]
    fn slice_size_counts_every_element() {
        assert_eq!(slice_size_in_bytes(&[0u32; 3]), 12);
        assert_eq!(slice_size_in_bytes::<u64>(&[]), 0);
    }
}
