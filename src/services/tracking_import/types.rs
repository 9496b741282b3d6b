//! 运单导入的数据类型

use serde::Serialize;
use uuid::Uuid;

use crate::db::OrderRecord;

/// 同一行中识别出的电话号码与运单号
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExtractedPair {
    pub phone: String,
    pub tracking: String,
}

/// 单张图片的识别结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResult {
    pub file_name: String,
    pub tracking_count: usize,
    pub tracking_numbers: Vec<String>,
    /// 文件内容的 SHA-256
    pub fingerprint: String,
    /// 同一批次中已出现过相同内容的图片
    pub duplicate_of: Option<String>,
    /// 识别失败原因；失败的图片不贡献任何运单号
    pub error: Option<String>,
}

impl ImageResult {
    pub fn from_pairs(file_name: &str, fingerprint: String, pairs: &[ExtractedPair]) -> Self {
        let tracking_numbers: Vec<String> = pairs.iter().map(|p| p.tracking.clone()).collect();
        Self {
            file_name: file_name.to_string(),
            tracking_count: tracking_numbers.len(),
            tracking_numbers,
            fingerprint,
            duplicate_of: None,
            error: None,
        }
    }

    pub fn failed(file_name: &str, fingerprint: String, error: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            tracking_count: 0,
            tracking_numbers: Vec::new(),
            fingerprint,
            duplicate_of: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Automatic,
    Manual,
}

/// 与某个订单绑定的识别结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub order_id: i64,
    pub order_code: String,
    pub customer_contact: String,
    pub phone: String,
    pub tracking: String,
    pub source: MatchSource,
}

impl MatchCandidate {
    pub fn new(order: &OrderRecord, phone: &str, tracking: &str, source: MatchSource) -> Self {
        Self {
            order_id: order.order_id,
            order_code: order.order_code.clone(),
            customer_contact: order.customer_contact.clone(),
            phone: phone.to_string(),
            tracking: tracking.to_string(),
            source,
        }
    }

    /// 联系信息第一行（客户姓名）
    pub fn customer_name(&self) -> &str {
        self.customer_contact
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }
}

/// 未自动匹配到订单的识别结果，`entry_id` 在一次审核会话内唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedEntry {
    pub entry_id: usize,
    pub phone: String,
    pub tracking: String,
}

/// 一次批处理的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub per_image: Vec<ImageResult>,
    pub matched: Vec<MatchCandidate>,
    pub unmatched: Vec<UnmatchedEntry>,
}

impl BatchReport {
    pub fn pair_count(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    pub fn status(&self) -> BatchStatus {
        if self.pair_count() == 0 {
            BatchStatus::NoDataFound
        } else if self.matched.is_empty() {
            BatchStatus::NoMatchesFound {
                unmatched: self.unmatched.len(),
            }
        } else {
            BatchStatus::Matched {
                matched: self.matched.len(),
                unmatched: self.unmatched.len(),
            }
        }
    }
}

/// 批处理结束后的结论；每种结论对应不同的提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchStatus {
    /// 所有图片都没有识别出电话 + 运单号
    NoDataFound,
    /// 识别出了数据，但没有任何一条匹配到待发货订单
    NoMatchesFound { unmatched: usize },
    Matched { matched: usize, unmatched: usize },
}

impl BatchStatus {
    pub fn message(&self) -> String {
        match self {
            BatchStatus::NoDataFound => {
                "没有在图片中找到电话号码和运单号，请重新拍摄标签".to_string()
            }
            BatchStatus::NoMatchesFound { unmatched } => format!(
                "识别出 {} 条运单，但没有匹配到任何待发货订单，请手动匹配",
                unmatched
            ),
            BatchStatus::Matched { matched, unmatched: 0 } => {
                format!("已匹配 {} 个订单", matched)
            }
            BatchStatus::Matched { matched, unmatched } => format!(
                "已匹配 {} 个订单，{} 条运单需要手动匹配",
                matched, unmatched
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(matched: usize, unmatched: usize) -> BatchReport {
        let order = OrderRecord {
            order_id: 1,
            order_code: "ORD-1".into(),
            customer_contact: "Somchai\n0812345678".into(),
            status: crate::db::OrderStatus::Pending,
            tracking_number: None,
            delivery_round: None,
            created_at: None,
            updated_at: None,
        };
        BatchReport {
            run_id: Uuid::new_v4(),
            per_image: Vec::new(),
            matched: (0..matched)
                .map(|_| MatchCandidate::new(&order, "0812345678", "TH1234567890", MatchSource::Automatic))
                .collect(),
            unmatched: (0..unmatched)
                .map(|i| UnmatchedEntry {
                    entry_id: i,
                    phone: "0899999999".into(),
                    tracking: "TH0000000000".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn no_pairs_is_no_data_not_no_matches() {
        assert_eq!(report(0, 0).status(), BatchStatus::NoDataFound);
    }

    #[test]
    fn pairs_without_matches_is_no_matches() {
        assert_eq!(
            report(0, 3).status(),
            BatchStatus::NoMatchesFound { unmatched: 3 }
        );
    }

    #[test]
    fn terminal_messages_are_distinct() {
        let messages = [
            report(0, 0).status().message(),
            report(0, 2).status().message(),
            report(2, 0).status().message(),
            report(2, 1).status().message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn candidate_name_is_first_contact_line() {
        let r = report(1, 0);
        assert_eq!(r.matched[0].customer_name(), "Somchai");
    }
}
