//! 从识别文本中逐行提取电话号码与运单号

use regex::Regex;

use super::types::ExtractedPair;

lazy_static::lazy_static! {
    // 本地格式手机号：0 开头共 10 位
    static ref PHONE_RE: Regex = Regex::new(r"0[0-9]{9}").unwrap();
    // 运单号：10–20 位大写字母或数字，不区分承运商格式
    static ref TRACKING_RE: Regex = Regex::new(r"[A-Z0-9]{10,20}").unwrap();
}

/// 每一行同时含有电话和运单号时产生一条结果：取该行第一个电话、最后一个运单号。
///
/// 与电话号码完全相同的片段不算作运单号（电话本身也满足运单号的字符规则）。
/// 不做去重，同一张标签的多行可以产生多条结果。
pub fn extract_pairs(text: &str) -> Vec<ExtractedPair> {
    text.lines().filter_map(pair_from_line).collect()
}

fn pair_from_line(line: &str) -> Option<ExtractedPair> {
    let phones: Vec<&str> = PHONE_RE.find_iter(line).map(|m| m.as_str()).collect();
    let phone = *phones.first()?;

    let tracking = TRACKING_RE
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|token| !phones.contains(token))
        .last()?;

    Some(ExtractedPair {
        phone: phone.to_string(),
        tracking: tracking.to_string(),
    })
}
