//! Parsing of the bid-listing API's JSON envelope.
//!
//! The service wraps results as `response.header` / `response.body.items`.
//! `items` comes back as an array, as `{"item": [...]}`, as `{"item": {...}}`
//! when there is a single hit, or as an empty string when there are none.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{BidDate, BidRecord};

const RESULT_CODE_OK: &str = "00";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: Option<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    header: Option<Header>,
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(rename = "resultCode", default)]
    result_code: Option<String>,
    #[serde(rename = "resultMsg", default)]
    result_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    items: Value,
    #[serde(rename = "totalCount", default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BidItem {
    #[serde(rename = "bidNtceNm", default)]
    title: Option<String>,
    #[serde(rename = "bidNtceNo", default)]
    bid_number: Option<String>,
    #[serde(rename = "bidNtceDtlUrl", default)]
    url: Option<String>,
}

/// One page of results for a keyword query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidPage {
    pub records: Vec<BidRecord>,
    /// Total hits the server reports, which may exceed `records.len()`.
    pub total_count: Option<u64>,
}

impl BidPage {
    /// Whether the server holds more hits than this page carried.
    pub fn is_truncated(&self) -> bool {
        self.total_count
            .is_some_and(|total| total > self.records.len() as u64)
    }
}

pub fn parse_bid_response(body: &str, keyword: &str, date: BidDate) -> Result<BidPage, ParseError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let Some(response) = envelope.response else {
        return Ok(BidPage {
            records: Vec::new(),
            total_count: None,
        });
    };

    if let Some(header) = response.header
        && let Some(code) = header.result_code
        && code != RESULT_CODE_OK
    {
        return Err(ParseError::Api {
            code,
            message: header.result_msg.unwrap_or_default(),
        });
    }

    let Some(body) = response.body else {
        return Ok(BidPage {
            records: Vec::new(),
            total_count: None,
        });
    };

    let records = extract_items(body.items)?
        .into_iter()
        .map(|item| BidRecord {
            keyword: keyword.to_string(),
            title: item.title.unwrap_or_default(),
            bid_number: non_empty(item.bid_number),
            url: non_empty(item.url),
            date,
        })
        .collect();

    Ok(BidPage {
        records,
        total_count: body.total_count,
    })
}

fn extract_items(items: Value) -> Result<Vec<BidItem>, serde_json::Error> {
    match items {
        Value::Array(_) => serde_json::from_value(items),
        Value::Object(mut map) => match map.remove("item") {
            Some(list @ Value::Array(_)) => serde_json::from_value(list),
            Some(single @ Value::Object(_)) => Ok(vec![serde_json::from_value(single)?]),
            _ => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> BidDate {
        "20250709".parse().unwrap()
    }

    #[test]
    fn test_parse_item_array() {
        let body = r#"{
            "response": {
                "header": {"resultCode": "00", "resultMsg": "정상"},
                "body": {
                    "items": [
                        {
                            "bidNtceNo": "R25BK00000001",
                            "bidNtceNm": "교육 운영 용역",
                            "bidNtceDtlUrl": "https://www.g2b.go.kr/link/1",
                            "ntceInsttNm": "조달청"
                        },
                        {
                            "bidNtceNo": "R25BK00000002",
                            "bidNtceNm": "교육 플랫폼 구축"
                        }
                    ],
                    "numOfRows": 100,
                    "pageNo": 1,
                    "totalCount": 2
                }
            }
        }"#;

        let page = parse_bid_response(body, "교육", date()).unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(!page.is_truncated());

        let first = &page.records[0];
        assert_eq!(first.keyword, "교육");
        assert_eq!(first.title, "교육 운영 용역");
        assert_eq!(first.bid_number.as_deref(), Some("R25BK00000001"));
        assert_eq!(first.url.as_deref(), Some("https://www.g2b.go.kr/link/1"));
        assert_eq!(first.date, date());

        assert_eq!(page.records[1].url, None);
    }

    #[test]
    fn test_parse_wrapped_single_item() {
        let body = r#"{"response": {"body": {"items": {"item": {"bidNtceNo": "X1", "bidNtceNm": "단건"}}}}}"#;

        let page = parse_bid_response(body, "k", date()).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].bid_number.as_deref(), Some("X1"));
    }

    #[test]
    fn test_parse_wrapped_item_list() {
        let body = r#"{"response": {"body": {"items": {"item": [{"bidNtceNo": "X1"}, {"bidNtceNo": "X2"}]}}}}"#;

        let page = parse_bid_response(body, "k", date()).unwrap();
        let numbers: Vec<_> = page
            .records
            .iter()
            .map(|r| r.bid_number.as_deref().unwrap())
            .collect();
        assert_eq!(numbers, vec!["X1", "X2"]);
        assert_eq!(page.records[0].title, "");
    }

    #[test]
    fn test_absent_or_empty_items_yield_no_records() {
        for body in [
            r#"{}"#,
            r#"{"response": {}}"#,
            r#"{"response": {"body": {}}}"#,
            r#"{"response": {"body": {"items": ""}}}"#,
            r#"{"response": {"body": {"items": null}}}"#,
            r#"{"response": {"body": {"items": []}}}"#,
        ] {
            let page = parse_bid_response(body, "k", date()).unwrap();
            assert!(page.records.is_empty(), "expected no records for {body}");
        }
    }

    #[test]
    fn test_blank_bid_number_is_absent() {
        let body = r#"{"response": {"body": {"items": [{"bidNtceNo": "  ", "bidNtceDtlUrl": ""}]}}}"#;

        let page = parse_bid_response(body, "k", date()).unwrap();
        assert_eq!(page.records[0].bid_number, None);
        assert_eq!(page.records[0].url, None);
    }

    #[test]
    fn test_error_result_code() {
        let body = r#"{"response": {"header": {"resultCode": "07", "resultMsg": "입력범위값 초과 에러"}}}"#;

        let err = parse_bid_response(body, "k", date()).unwrap_err();
        match err {
            ParseError::Api { code, message } => {
                assert_eq!(code, "07");
                assert_eq!(message, "입력범위값 초과 에러");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        let body = "<OpenAPI_ServiceResponse><cmmMsgHeader/></OpenAPI_ServiceResponse>";
        assert!(matches!(
            parse_bid_response(body, "k", date()),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_truncated_page() {
        let body = r#"{"response": {"body": {"items": [{"bidNtceNo": "A"}], "totalCount": 250}}}"#;

        let page = parse_bid_response(body, "k", date()).unwrap();
        assert!(page.is_truncated());
        assert_eq!(page.total_count, Some(250));
    }
}
