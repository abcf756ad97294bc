const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32635;

pub fn encode_ulaw(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len());

    for &s in samples {
        let clamped = s.clamp(-(ULAW_CLIP as i16), ULAW_CLIP as i16);
        let sign = ((clamped >> 8) & 0x80) as u8;

        let magnitude = if clamped < 0 {
            (!clamped as i32) + ULAW_BIAS
        } else {
            (clamped as i32) + ULAW_BIAS
        };

        let mut exponent: u8 = 0;
        let mut tmp = magnitude >> 7;
        while tmp > 1 && exponent < 7 {
            tmp >>= 1;
            exponent += 1;
        }

        let mantissa = (magnitude >> (exponent + 3)) & 0x0F;
        out.push(!(sign | (exponent << 4) | (mantissa as u8)));
    }

    out
}

pub fn decode_ulaw(bytes: &[u8]) -> Vec<i16> {
    #[cfg(feature = "table_decode")]
    {
        decode_ulaw_table(bytes)
    }
    #[cfg(not(feature = "table_decode"))]
    {
        compute_decode_ulaw(bytes)
    }
}

#[cfg(feature = "table_decode")]
fn decode_ulaw_table(bytes: &[u8]) -> Vec<i16> {
    bytes.iter().map(|&b| ULAW_DECODE_TABLE[b as usize]).collect()
}

pub fn compute_decode_ulaw(bytes: &[u8]) -> Vec<i16> {
    bytes.iter().map(|&b| decode_one(b)).collect()
}

const fn decode_one(b: u8) -> i16 {
    let byte = !b;
    let sign = (byte & 0x80) != 0;
    let exponent = (byte >> 4) & 0x07;
    let mantissa = byte & 0x0F;

    let mut magnitude = ((mantissa as i32) << 3) + ULAW_BIAS;
    magnitude <<= exponent;
    magnitude -= ULAW_BIAS;

    if sign {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

#[cfg(feature = "table_decode")]
const ULAW_DECODE_TABLE: [i16; 256] = {
    let mut t = [0i16; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = decode_one(i as u8);
        i += 1;
    }
    t
};

/// Encode a float32 block in [-1, 1]; out-of-range input is clamped.
pub fn pcmu_encode(samples: &[f32]) -> Vec<u8> {
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&x| (x.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect();
    encode_ulaw(&pcm)
}

/// Decode RTP PT=0 payload bytes to float32 mono in [-1, 1].
pub fn pcmu_decode_f32(bytes: &[u8]) -> Vec<f32> {
    decode_ulaw(bytes)
        .into_iter()
        .map(|s| s as f32 / 32768.0)
        .collect()
}
