//! Terminal output for the report command.
//!
//! Formatting lives here so the analytics code stays free of presentation and
//! output changes stay localized.

use crate::domain::{ProductReport, ReportDocument, RiskType};

/// Rows ordered by risk score (highest first), at most `top_n`.
///
/// The sort is stable, so ties keep report order.
pub fn rank_by_risk(products: &[ProductReport], top_n: usize) -> Vec<&ProductReport> {
    let mut sorted: Vec<&ProductReport> = products.iter().collect();
    sorted.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    sorted.truncate(top_n);
    sorted
}

/// Count of products per risk type, in `RiskType::ALL` order.
pub fn risk_counts(products: &[ProductReport]) -> Vec<(RiskType, usize)> {
    RiskType::ALL
        .iter()
        .map(|&kind| (kind, products.iter().filter(|p| p.risk_type == kind).count()))
        .collect()
}

/// Summary printed after `report`: risk counts plus the top-N table.
pub fn format_report_summary(doc: &ReportDocument, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("=== radar - inventory risk report ===\n");
    out.push_str(&format!("Products: {}\n", doc.products.len()));

    out.push_str("\nRisk breakdown:\n");
    for (kind, count) in risk_counts(&doc.products) {
        out.push_str(&format!("  {:<28} {count:>5}\n", kind.label()));
    }

    let top = rank_by_risk(&doc.products, top_n);
    if !top.is_empty() {
        out.push_str(&format!("\nTop {} by risk score:\n", top.len()));
        out.push_str(&format_table(&top));
    }

    out
}

fn format_table(rows: &[&ProductReport]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:<24} {:>9} {:>8} {:>9} {:<8} {:<26} {:>5}",
            "product", "name", "inventory", "avg7", "cover", "trend", "risk", "score"
        )
        .trim_end(),
    );
    out.push('\n');

    out.push_str(
        format!(
            "{:-<12} {:-<24} {:-<9} {:-<8} {:-<9} {:-<8} {:-<26} {:-<5}",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<12} {:<24} {:>9} {:>8.2} {:>9} {:<8} {:<26} {:>5}{}",
                truncate(&r.product_id, 12),
                truncate(&r.product_name, 24),
                r.inventory,
                r.avg7,
                r.days_of_cover_label,
                format!("{:?}", r.demand_trend),
                r.risk_type.label(),
                r.risk_score,
                if r.demand_spike { " !" } else { "" },
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
