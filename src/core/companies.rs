use crate::domain::model::Company;
use serde::{Deserialize, Serialize};

/// (id, 顯示名稱, DART corp_code)
const SUPPORTED_COMPANIES: [(&str, &str, &str); 4] = [
    ("samsung", "삼성생명", "00126256"),
    ("hanwha", "한화생명", "00113058"),
    ("kyobo", "교보생명", "00112882"),
    ("shinhan", "신한라이프", "00137517"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
}

pub fn supported_companies() -> Vec<Company> {
    SUPPORTED_COMPANIES
        .iter()
        .map(|(id, name, corp_code)| Company {
            id: id.to_string(),
            name: name.to_string(),
            corp_code: corp_code.to_string(),
        })
        .collect()
}

pub fn find_company(company_id: &str) -> Option<Company> {
    supported_companies().into_iter().find(|company| company.id == company_id)
}

pub fn supported_ids() -> Vec<&'static str> {
    SUPPORTED_COMPANIES.iter().map(|(id, _, _)| *id).collect()
}

/// 可分析公司清單（id 與顯示名稱）
pub fn list_companies() -> Vec<CompanySummary> {
    SUPPORTED_COMPANIES
        .iter()
        .map(|(id, name, _)| CompanySummary {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}
