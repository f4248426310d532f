use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed finite set of document types with a fixed priority order
/// (spec §3): evidence panels always surface in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// 가입설계서 — the proposal; lowest priority in the evidence panel order.
    Proposal,
    /// 상품요약서
    ProductSummary,
    /// 사업방법서
    BusinessMethod,
    /// 약관 — the policy; highest priority in the evidence panel order.
    Policy,
}

impl DocumentType {
    /// Fixed priority order, ascending (spec §3: PROPOSAL < PRODUCT_SUMMARY
    /// < BUSINESS_METHOD < POLICY). The derived `Ord` above matches this
    /// declaration order; this const exists so callers don't have to
    /// depend on declaration order remaining stable by accident.
    pub const PRIORITY_ORDER: [DocumentType; 4] = [
        DocumentType::Proposal,
        DocumentType::ProductSummary,
        DocumentType::BusinessMethod,
        DocumentType::Policy,
    ];

    pub fn short_code(&self) -> &'static str {
        match self {
            DocumentType::Proposal => "proposal",
            DocumentType::ProductSummary => "summary",
            DocumentType::BusinessMethod => "method",
            DocumentType::Policy => "policy",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_code())
    }
}
