use crate::error::{GenomeError, Result};

/// IUPAC nucleotide and ambiguity codes plus the gap symbol.
pub const NUCLEOTIDE_ALPHABET: &[u8; 16] = b"ATCGNRYSWKMBDHV-";

pub const MIN_SEQUENCE_LENGTH: usize = 10;
pub const MAX_SEQUENCE_LENGTH: usize = 50_000;

/// Checks sequences against the nucleotide alphabet and normalizes case.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceValidator;

impl SequenceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Returns the upper-cased sequence, or a validation error naming the
    /// first symbol outside the alphabet.
    pub fn validate(&self, raw: &str) -> Result<String> {
        if let Some((position, symbol)) = raw
            .chars()
            .enumerate()
            .find(|(_, c)| !Self::is_valid_symbol(*c))
        {
            return Err(GenomeError::validation(
                "sequence",
                format!(
                    "Invalid DNA sequence character {:?} at position {}",
                    symbol, position
                ),
            ));
        }
        Ok(raw.to_ascii_uppercase())
    }

    /// Length bounds of the request schema, checked separately from the alphabet.
    pub fn validate_length(&self, sequence: &str) -> Result<()> {
        let len = sequence.chars().count();
        if !(MIN_SEQUENCE_LENGTH..=MAX_SEQUENCE_LENGTH).contains(&len) {
            return Err(GenomeError::validation(
                "sequence",
                format!(
                    "Sequence length {} outside [{}, {}]",
                    len, MIN_SEQUENCE_LENGTH, MAX_SEQUENCE_LENGTH
                ),
            ));
        }
        Ok(())
    }

    pub fn is_valid_symbol(c: char) -> bool {
        c.is_ascii() && NUCLEOTIDE_ALPHABET.contains(&(c.to_ascii_uppercase() as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_alphabet_and_uppercases() {
        let validator = SequenceValidator::new();
        let out = validator.validate("atcgnrysWKMBDHV-").unwrap();
        assert_eq!(out, "ATCGNRYSWKMBDHV-");
    }

    #[test]
    fn test_rejects_foreign_symbol() {
        let validator = SequenceValidator::new();
        let err = validator.validate("ATCGXATCG").unwrap_err();
        match err {
            GenomeError::Validation { field, reason } => {
                assert_eq!(field, "sequence");
                assert!(reason.contains("position 4"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_uracil_and_non_ascii() {
        let validator = SequenceValidator::new();
        assert!(validator.validate("AUCG").is_err());
        assert!(validator.validate("ATCGÅ").is_err());
        assert!(validator.validate("ATC G").is_err());
    }

    #[test]
    fn test_length_bounds() {
        let validator = SequenceValidator::new();
        assert!(validator.validate_length("ATCGATCGA").is_err());
        assert!(validator.validate_length("ATCGATCGAT").is_ok());
        assert!(validator.validate_length(&"A".repeat(MAX_SEQUENCE_LENGTH)).is_ok());
        assert!(validator
            .validate_length(&"A".repeat(MAX_SEQUENCE_LENGTH + 1))
            .is_err());
    }
}
