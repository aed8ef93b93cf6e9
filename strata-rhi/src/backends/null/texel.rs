//! Encodes clear values into the bytes a texel of a given format holds in host memory.

use crate::{RhiFormat, RhiResult};

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn linear_to_srgb(value: f32) -> f32 {
    let value = value.clamp(0.0, 1.0);
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// IEEE 754 binary16, round to nearest. Subnormal results flush to zero.
fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exponent == 0xFF {
        let nan_bit = if mantissa != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | nan_bit;
    }

    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1F {
        return sign | 0x7C00;
    }
    if half_exponent <= 0 {
        return sign;
    }

    let half_mantissa = (mantissa >> 13) as u16;
    let rounded = ((half_exponent as u16) << 10 | half_mantissa) + ((mantissa >> 12) & 1) as u16;
    sign | rounded
}

/// Bytes of one texel of `format` cleared to `color`
pub(super) fn encode_color(
    format: RhiFormat,
    color: [f32; 4],
) -> RhiResult<Vec<u8>> {
    let [r, g, b, a] = color;
    Ok(match format {
        RhiFormat::R8_UNORM => vec![unorm8(r)],
        RhiFormat::R8G8_UNORM => vec![unorm8(r), unorm8(g)],
        RhiFormat::R8G8B8A8_UNORM => vec![unorm8(r), unorm8(g), unorm8(b), unorm8(a)],
        RhiFormat::R8G8B8A8_SRGB => vec![
            unorm8(linear_to_srgb(r)),
            unorm8(linear_to_srgb(g)),
            unorm8(linear_to_srgb(b)),
            unorm8(a),
        ],
        RhiFormat::B8G8R8A8_UNORM => vec![unorm8(b), unorm8(g), unorm8(r), unorm8(a)],
        RhiFormat::B8G8R8A8_SRGB => vec![
            unorm8(linear_to_srgb(b)),
            unorm8(linear_to_srgb(g)),
            unorm8(linear_to_srgb(r)),
            unorm8(a),
        ],
        RhiFormat::R16G16B16A16_SFLOAT => color
            .iter()
            .flat_map(|x| f32_to_f16_bits(*x).to_le_bytes())
            .collect(),
        RhiFormat::R32_SFLOAT => r.to_le_bytes().to_vec(),
        RhiFormat::R32G32_SFLOAT => [r, g].iter().flat_map(|x| x.to_le_bytes()).collect(),
        RhiFormat::R32G32B32_SFLOAT => [r, g, b].iter().flat_map(|x| x.to_le_bytes()).collect(),
        RhiFormat::R32G32B32A32_SFLOAT => color.iter().flat_map(|x| x.to_le_bytes()).collect(),
        RhiFormat::R16_UINT => (r as u16).to_le_bytes().to_vec(),
        RhiFormat::R32_UINT => (r as u32).to_le_bytes().to_vec(),
        RhiFormat::R32G32_UINT => [r, g]
            .iter()
            .flat_map(|x| (*x as u32).to_le_bytes())
            .collect(),
        RhiFormat::R32G32B32A32_UINT => color
            .iter()
            .flat_map(|x| (*x as u32).to_le_bytes())
            .collect(),
        _ => Err(format!("{:?} cannot be cleared as a color", format))?,
    })
}

/// Bytes of one texel of a depth/stencil `format` cleared to `depth` and `stencil`
pub(super) fn encode_depth_stencil(
    format: RhiFormat,
    depth: f32,
    stencil: u32,
) -> RhiResult<Vec<u8>> {
    let depth = depth.clamp(0.0, 1.0);
    Ok(match format {
        RhiFormat::D16_UNORM => ((depth * 65535.0 + 0.5) as u16).to_le_bytes().to_vec(),
        RhiFormat::D32_SFLOAT => depth.to_le_bytes().to_vec(),
        RhiFormat::D24_UNORM_S8_UINT => {
            let depth_bits = (depth * 16_777_215.0 + 0.5) as u32;
            (depth_bits | (stencil & 0xFF) << 24).to_le_bytes().to_vec()
        }
        RhiFormat::D32_SFLOAT_S8_UINT => {
            let mut bytes = depth.to_le_bytes().to_vec();
            bytes.extend_from_slice(&[(stencil & 0xFF) as u8, 0, 0, 0]);
            bytes
        }
        _ => Err(format!("{:?} is not a depth/stencil format", format))?,
    })
}

/// Fill `data` by repeating `texel`
pub(super) fn fill(
    data: &mut [u8],
    texel: &[u8],
) {
    if texel.is_empty() {
        return;
    }

    for chunk in data.chunks_exact_mut(texel.len()) {
        chunk.copy_from_slice(texel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_unorm_and_swizzles_bgra() {
        let rgba = encode_color(RhiFormat::R8G8B8A8_UNORM, [1.0, 0.0, 0.5, 1.0]).unwrap();
        assert_eq!(rgba, vec![255, 0, 128, 255]);

        let bgra = encode_color(RhiFormat::B8G8R8A8_UNORM, [1.0, 0.0, 0.5, 1.0]).unwrap();
        assert_eq!(bgra, vec![128, 0, 255, 255]);
    }

    #[test]
    fn encodes_half_floats() {
        assert_eq!(f32_to_f16_bits(1.0), 0x3C00);
        assert_eq!(f32_to_f16_bits(-2.0), 0xC000);
        assert_eq!(f32_to_f16_bits(0.0), 0);
        assert_eq!(f32_to_f16_bits(f32::INFINITY), 0x7C00);
    }

    #[test]
    fn encodes_depth() {
        assert_eq!(
            encode_depth_stencil(RhiFormat::D32_SFLOAT, 1.0, 0).unwrap(),
            1.0f32.to_le_bytes().to_vec()
        );
        assert_eq!(
            encode_depth_stencil(RhiFormat::D24_UNORM_S8_UINT, 1.0, 3).unwrap(),
            (0x00FF_FFFFu32 | 3 << 24).to_le_bytes().to_vec()
        );
        assert!(encode_depth_stencil(RhiFormat::R8_UNORM, 1.0, 0).is_err());
    }

    #[test]
    fn fills_repeating_texel() {
        let mut data = vec![0u8; 8];
        fill(&mut data, &[1, 2]);
        assert_eq!(data, vec![1, 2, 1, 2, 1, 2, 1, 2]);
    }
}
