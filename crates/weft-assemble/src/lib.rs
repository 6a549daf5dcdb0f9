//! Assembled program blobs.
//!
//! A pre-linked [`Program`] can be serialised into a self-describing binary
//! blob: a fixed recognition header, a format version, the payload length,
//! a blake3 digest of the payload, then the bincode-encoded program. The
//! loader recognises the header at sniff time and decodes the program
//! directly instead of compiling.

use blake3::Hasher;
use thiserror::Error;

use weft_core::types::Program;

/// Recognition prefix of an assembled blob.
pub const MAGIC: &[u8; 4] = b"WEFT";

const VERSION: u32 = 1;
const HEADER_SIZE: usize = 4 + 4 + 8 + 32;

/// Errors produced while encoding or decoding assembled blobs.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] Box<bincode::ErrorKind>),

    #[error("Invalid assembled program header")]
    InvalidHeader,

    #[error("Assembled program version mismatch: {0}")]
    VersionMismatch(u32),

    #[error("Assembled program hash mismatch")]
    HashMismatch,
}

pub type AssembleResult<T> = std::result::Result<T, AssembleError>;

/// Does this byte stream start with the assemble header?
pub fn is_assembled(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Serialise a program into an assembled blob.
pub fn assemble(program: &Program) -> AssembleResult<Vec<u8>> {
    let payload = bincode::serialize(program)?;
    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let digest = hasher.finalize();

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(digest.as_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode an assembled blob back into its program.
///
/// Verifies the header, the format version, and the payload digest.
pub fn load(bytes: &[u8]) -> AssembleResult<Program> {
    if bytes.len() < HEADER_SIZE || &bytes[..4] != MAGIC {
        return Err(AssembleError::InvalidHeader);
    }

    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(AssembleError::VersionMismatch(version));
    }

    let payload_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
    let hash = &bytes[16..48];

    if bytes.len() < HEADER_SIZE + payload_len {
        return Err(AssembleError::InvalidHeader);
    }

    let payload = &bytes[HEADER_SIZE..HEADER_SIZE + payload_len];
    let mut hasher = Hasher::new();
    hasher.update(payload);
    if hasher.finalize().as_bytes() != hash {
        return Err(AssembleError::HashMismatch);
    }

    Ok(bincode::deserialize(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::types::Tool;

    fn sample_program() -> Program {
        let mut tool = Tool::default();
        tool.id = "testdata/test.wft:1".to_string();
        tool.parameters.name = "entry".to_string();
        tool.instructions = "This is a chatbot".to_string();

        let mut program = Program {
            name: "testdata/test.wft".to_string(),
            entry_tool_id: tool.id.clone(),
            ..Default::default()
        };
        program.tool_set.insert(tool.id.clone(), tool);
        program
    }

    #[test]
    fn round_trip() {
        let program = sample_program();
        let bytes = assemble(&program).expect("serialize program");
        assert!(is_assembled(&bytes));

        let decoded = load(&bytes).expect("deserialize program");
        assert_eq!(decoded, program);
    }

    #[test]
    fn detects_corrupted_payload() {
        let mut bytes = assemble(&sample_program()).expect("serialize program");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = load(&bytes).expect_err("expected hash mismatch");
        assert!(matches!(err, AssembleError::HashMismatch));
    }

    #[test]
    fn rejects_foreign_bytes() {
        assert!(!is_assembled(b"name: tool"));
        let err = load(b"name: tool").expect_err("expected header error");
        assert!(matches!(err, AssembleError::InvalidHeader));
    }

    #[test]
    fn rejects_future_versions() {
        let mut bytes = assemble(&sample_program()).expect("serialize program");
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
        let err = load(&bytes).expect_err("expected version mismatch");
        assert!(matches!(err, AssembleError::VersionMismatch(2)));
    }
}
