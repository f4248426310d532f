use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the KCD-7 master table (spec §3, §6): externally sourced,
/// read-only. `disease_code_group_member` single-code members enforce an
/// FK against this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseCodeMaster {
    pub code: String,
    pub name_kor: String,
    pub name_eng: String,
    pub category: String,
    pub is_leaf: bool,
}

/// Read-only KCD-7 master, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct DiseaseCodeMasterRegistry {
    by_code: HashMap<String, DiseaseCodeMaster>,
}

impl DiseaseCodeMasterRegistry {
    pub fn new(rows: impl IntoIterator<Item = DiseaseCodeMaster>) -> Self {
        Self {
            by_code: rows.into_iter().map(|r| (r.code.clone(), r)).collect(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&DiseaseCodeMaster> {
        self.by_code.get(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fk_lookup_succeeds_for_loaded_code() {
        let reg = DiseaseCodeMasterRegistry::new([DiseaseCodeMaster {
            code: "C73".into(),
            name_kor: "갑상선의 악성 신생물".into(),
            name_eng: "Malignant neoplasm of thyroid gland".into(),
            category: "neoplasm".into(),
            is_leaf: true,
        }]);
        assert!(reg.contains("C73"));
        assert!(!reg.contains("Z99"));
    }
}
