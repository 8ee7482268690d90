// Versioned binary framing shared by keys and proofs:
//
//   magic (8 bytes) || version (u16 LE) || num_blocks (u32 LE) || arkworks payload

use crate::config::CircuitConfig;

pub const FORMAT_VERSION: u16 = 1;

pub const PROVING_KEY_MAGIC: &[u8; 8] = b"ZKCPPK\0\0";
pub const VERIFYING_KEY_MAGIC: &[u8; 8] = b"ZKCPVK\0\0";
pub const PROOF_MAGIC: &[u8; 8] = b"ZKCPPF\0\0";

pub const HEADER_LEN: usize = 8 + 2 + 4;

pub(crate) fn write_header(out: &mut Vec<u8>, magic: &[u8; 8], config: &CircuitConfig) {
    out.extend_from_slice(magic);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    // MAX_BLOCKS fits in u32
    out.extend_from_slice(&(config.num_blocks() as u32).to_le_bytes());
}

/// Splits off and validates a header, returning the configuration it names and
/// the payload behind it.
pub(crate) fn read_header<'a>(
    bytes: &'a [u8],
    magic: &[u8; 8],
) -> std::result::Result<(CircuitConfig, &'a [u8]), String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("{} bytes is shorter than the {HEADER_LEN}-byte header", bytes.len()));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if &header[..8] != magic {
        return Err(format!(
            "bad magic {:?}, expected {:?}",
            String::from_utf8_lossy(&header[..8]),
            String::from_utf8_lossy(magic)
        ));
    }
    let version = u16::from_le_bytes([header[8], header[9]]);
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {version}"));
    }
    let num_blocks = u32::from_le_bytes([header[10], header[11], header[12], header[13]]);
    let config = CircuitConfig::new(num_blocks as usize).map_err(|e| e.to_string())?;
    Ok((config, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let config = CircuitConfig::new(32).unwrap();
        let mut out = Vec::new();
        write_header(&mut out, PROOF_MAGIC, &config);
        out.extend_from_slice(b"payload");
        let (decoded, payload) = read_header(&out, PROOF_MAGIC).unwrap();
        assert_eq!(decoded, config);
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn rejects_wrong_magic_version_and_block_count() {
        let config = CircuitConfig::new(4).unwrap();
        let mut out = Vec::new();
        write_header(&mut out, PROVING_KEY_MAGIC, &config);
        assert!(read_header(&out, VERIFYING_KEY_MAGIC).is_err());
        assert!(read_header(&out[..HEADER_LEN - 1], PROVING_KEY_MAGIC).is_err());

        let mut bad_version = out.clone();
        bad_version[8] = 9;
        assert!(read_header(&bad_version, PROVING_KEY_MAGIC).is_err());

        let mut zero_blocks = out;
        zero_blocks[10..14].copy_from_slice(&0u32.to_le_bytes());
        assert!(read_header(&zero_blocks, PROVING_KEY_MAGIC).is_err());
    }
}
