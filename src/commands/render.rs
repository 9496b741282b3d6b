//! 终端输出

use crate::db::OrderRecord;
use crate::services::tracking_import::{CommitReport, ImageResult, MatchCandidate, UnmatchedEntry};

pub fn print_orders(orders: &[OrderRecord]) {
    if orders.is_empty() {
        println!("（无订单）");
        return;
    }
    for order in orders {
        println!(
            "{:<14} {:<11} {:<22} {:<12} {}",
            order.order_code,
            order.status,
            order.tracking_number.as_deref().unwrap_or("-"),
            order.delivery_round.as_deref().unwrap_or("-"),
            order.customer_name(),
        );
    }
}

pub fn print_image_results(results: &[ImageResult]) {
    for (index, result) in results.iter().enumerate() {
        let mut line = format!("  [{}] {}", index + 1, result.file_name);
        match &result.error {
            Some(error) => line.push_str(&format!(" ✘ {}", error)),
            None => line.push_str(&format!(" ✔ {} 个运单号", result.tracking_count)),
        }
        if let Some(first) = &result.duplicate_of {
            line.push_str(&format!("（与 {} 内容相同）", first));
        }
        println!("{}", line);
        for tracking in &result.tracking_numbers {
            println!("        {}", tracking);
        }
    }
}

pub fn print_matches(matched: &[MatchCandidate]) {
    for (index, candidate) in matched.iter().enumerate() {
        println!(
            "  {:>2}. {:<14} {:<22} {} ({})",
            index + 1,
            candidate.order_code,
            candidate.tracking,
            candidate.customer_name(),
            candidate.phone,
        );
    }
}

pub fn print_unmatched(unmatched: &[UnmatchedEntry]) {
    for entry in unmatched {
        println!("   -  {:<22} 电话 {}", entry.tracking, entry.phone);
    }
}

pub fn print_commit_report(report: &CommitReport) {
    println!("{}", report.message());
    for failure in &report.failures {
        println!(
            "  ✘ {} {}: {}",
            failure.order_code, failure.tracking, failure.message
        );
    }
}
