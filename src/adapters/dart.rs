use crate::adapters::http::{build_client, ensure_success, require_key};
use crate::domain::model::{CorpEntry, LineItem, PeriodReport, ReportPeriod};
use crate::domain::ports::DisclosureSource;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Deserialize;
use std::io::{Cursor, Read};
use std::time::Duration;

pub const DEFAULT_DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

const SOURCE_NAME: &str = "DART";
const STATUS_OK: &str = "000";
const STATUS_NO_DATA: &str = "013";
const CORP_ARCHIVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct SingleAccountResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<SingleAccountRow>,
}

#[derive(Debug, Deserialize)]
struct SingleAccountRow {
    #[serde(default)]
    account_nm: String,
    #[serde(default)]
    fs_div: String,
    #[serde(default)]
    thstrm_amount: Option<String>,
}

/// Open DART 主要帳戶（fnlttSinglAcnt）與公司代碼（corpCode）客戶端
pub struct DartClient {
    client: Client,
    archive_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl DartClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            archive_client: build_client(CORP_ARCHIVE_TIMEOUT.max(timeout))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// 下載 corpCode.xml 壓縮檔並取出其中唯一的 XML 文件
    async fn download_corp_archive(&self, api_key: &str) -> Result<String> {
        let url = format!("{}/corpCode.xml", self.base_url);
        tracing::debug!("📡 Downloading DART corp code archive");

        let response = self
            .archive_client
            .get(&url)
            .query(&[("crtfc_key", api_key)])
            .send()
            .await?;
        let bytes = ensure_success(SOURCE_NAME, response).await?.bytes().await?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut xml_file = archive.by_index(0)?;
        let mut xml = String::new();
        xml_file.read_to_string(&mut xml)?;
        Ok(xml)
    }
}

#[async_trait]
impl DisclosureSource for DartClient {
    async fn period_report(
        &self,
        corp_code: &str,
        period: ReportPeriod,
    ) -> Result<Option<PeriodReport>> {
        let api_key = require_key(SOURCE_NAME, self.api_key.as_deref())?;
        let url = format!("{}/fnlttSinglAcnt.json", self.base_url);
        let year = period.year.to_string();

        tracing::debug!(
            "📡 DART fnlttSinglAcnt corp_code={} year={} report={} ({})",
            corp_code,
            period.year,
            period.code.code(),
            period.code.label()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", api_key),
                ("corp_code", corp_code),
                ("bsns_year", year.as_str()),
                ("reprt_code", period.code.code()),
            ])
            .send()
            .await?;
        let body: SingleAccountResponse =
            ensure_success(SOURCE_NAME, response).await?.json().await?;

        match body.status.as_str() {
            STATUS_OK if !body.list.is_empty() => {
                let items = body
                    .list
                    .iter()
                    .map(|row| {
                        LineItem::from_raw(
                            &row.account_nm,
                            &row.fs_div,
                            row.thstrm_amount.as_deref().unwrap_or(""),
                        )
                    })
                    .collect();
                Ok(Some(PeriodReport { period, items }))
            }
            STATUS_OK | STATUS_NO_DATA => Ok(None),
            code => Err(AppError::UpstreamError {
                source_name: SOURCE_NAME.to_string(),
                code: code.to_string(),
                message: body.message,
            }),
        }
    }

    async fn search_corp(&self, keyword: &str, limit: usize) -> Result<Vec<CorpEntry>> {
        let api_key = require_key(SOURCE_NAME, self.api_key.as_deref())?;
        let xml = self.download_corp_archive(api_key).await?;
        parse_corp_codes(&xml, keyword, limit)
    }
}

#[derive(Clone, Copy)]
enum CorpField {
    Code,
    Name,
    StockCode,
}

/// 解析 corpCode.xml，回傳公司名稱包含 `keyword` 的前 `limit` 筆
pub fn parse_corp_codes(xml: &str, keyword: &str, limit: usize) -> Result<Vec<CorpEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut current = CorpEntry::default();
    let mut field: Option<CorpField> = None;

    while results.len() < limit {
        match reader.read_event()? {
            Event::Start(e) => {
                field = match e.name().as_ref() {
                    b"list" => {
                        current = CorpEntry::default();
                        None
                    }
                    b"corp_code" => Some(CorpField::Code),
                    b"corp_name" => Some(CorpField::Name),
                    b"stock_code" => Some(CorpField::StockCode),
                    _ => None,
                };
            }
            Event::Text(text) => {
                if let Some(target) = field {
                    let value = text.unescape().map_err(quick_xml::Error::from)?.into_owned();
                    match target {
                        CorpField::Code => current.corp_code = value,
                        CorpField::Name => current.corp_name = value,
                        CorpField::StockCode => current.stock_code = value,
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"list" && current.corp_name.contains(keyword) {
                    results.push(std::mem::take(&mut current));
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
    <list>
        <corp_code>00126256</corp_code>
        <corp_name>삼성생명보험</corp_name>
        <stock_code>032830</stock_code>
        <modify_date>20240101</modify_date>
    </list>
    <list>
        <corp_code>00113058</corp_code>
        <corp_name>한화생명보험</corp_name>
        <stock_code>088350</stock_code>
        <modify_date>20240101</modify_date>
    </list>
    <list>
        <corp_code>00164779</corp_code>
        <corp_name>삼성전자</corp_name>
        <stock_code> </stock_code>
        <modify_date>20240101</modify_date>
    </list>
</result>"#;

    #[test]
    fn test_parse_corp_codes_filters_by_keyword() {
        let results = parse_corp_codes(SAMPLE_XML, "생명", 20).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].corp_code, "00126256");
        assert_eq!(results[1].stock_code, "088350");
    }

    #[test]
    fn test_parse_corp_codes_respects_limit() {
        let results = parse_corp_codes(SAMPLE_XML, "삼성", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].corp_name, "삼성생명보험");
    }

    #[test]
    fn test_parse_corp_codes_blank_stock_code() {
        let results = parse_corp_codes(SAMPLE_XML, "전자", 20).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stock_code, "");
    }
}
