//! Content hash for ingested proposal rows (spec §6): SHA-256 of
//! `insurer||proposal_id||page||span_text`, used for idempotent
//! re-ingestion and as the dedup key alongside `(insurer, proposal_id,
//! normalized_name)`.

use covcmp_registry::InsurerCode;
use sha2::{Digest, Sha256};

pub fn content_hash(insurer: InsurerCode, proposal_id: &str, page: u32, span_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(insurer.as_str().as_bytes());
    hasher.update(proposal_id.as_bytes());
    hasher.update(page.to_string().as_bytes());
    hasher.update(span_text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_the_same_hash() {
        let a = content_hash(InsurerCode::Samsung, "P-1", 4, "일반암진단비 3,000만원");
        let b = content_hash(InsurerCode::Samsung, "P-1", 4, "일반암진단비 3,000만원");
        assert_eq!(a, b);
    }

    #[test]
    fn different_pages_produce_different_hashes() {
        let a = content_hash(InsurerCode::Samsung, "P-1", 4, "일반암진단비 3,000만원");
        let b = content_hash(InsurerCode::Samsung, "P-1", 5, "일반암진단비 3,000만원");
        assert_ne!(a, b);
    }
}
