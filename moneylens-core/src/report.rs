//! Report types returned by the manager agent.
//!
//! Two incompatible report shapes exist side by side: the classic view
//! (three coarse buckets) and the audit view (six spending categories plus a
//! habit audit). Field names match the agent's JSON keys exactly; a payload
//! is decoded wholesale or not at all, so a half-shaped report can never
//! reach the renderer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which report shape the agent is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Classic,
    Audit,
}

/// One category bucket in the classic view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicCategory {
    pub amount: f64,
    pub percentage: f64,
    pub count: u64,
}

/// The three fixed classic buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicSummary {
    pub survival: ClassicCategory,
    pub lifestyle: ClassicCategory,
    pub future: ClassicCategory,
}

impl ClassicSummary {
    /// Buckets in display order, paired with their wire keys.
    pub fn entries(&self) -> [(&'static str, &ClassicCategory); 3] {
        [
            ("survival", &self.survival),
            ("lifestyle", &self.lifestyle),
            ("future", &self.future),
        ]
    }
}

/// One category bucket in the audit view. Note the different field names
/// from [`ClassicCategory`]; the two views never shared a wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditCategory {
    pub total_amount: f64,
    pub percentage: f64,
    pub transaction_count: u64,
}

/// The six fixed audit categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub dining: AuditCategory,
    pub shopping: AuditCategory,
    pub bill_payments: AuditCategory,
    pub travel: AuditCategory,
    pub investments: AuditCategory,
    pub others: AuditCategory,
}

impl AuditSummary {
    /// Categories in display order, paired with their wire keys.
    pub fn entries(&self) -> [(&'static str, &AuditCategory); 6] {
        [
            ("dining", &self.dining),
            ("shopping", &self.shopping),
            ("bill_payments", &self.bill_payments),
            ("travel", &self.travel),
            ("investments", &self.investments),
            ("others", &self.others),
        ]
    }
}

/// Per-merchant aggregate, shared by both views (`top_merchants` in the
/// classic payload, `merchant_breakdown` in the audit payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub merchant: String,
    pub amount: f64,
    pub count: u64,
}

/// A raw transaction row as categorized by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: String,
    pub merchant: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
}

/// A purchase the agent judged impulsive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulsivePurchase {
    pub merchant: String,
    pub amount: f64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub reason: String,
}

/// A dining spot flagged for unusually high spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningSpot {
    pub merchant: String,
    pub total_amount: f64,
    pub visit_count: u64,
}

/// One recurring subscription with the agent's verdict on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionLine {
    pub service: String,
    pub monthly_amount: f64,
    #[serde(default)]
    pub assessment: String,
}

/// A cut-back suggestion with its estimated monthly saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutBack {
    pub category: String,
    #[serde(default)]
    pub suggestion: String,
    pub potential_savings: f64,
}

/// Behavioral analysis, present only in the audit view. Every section is
/// optional on the wire; an absent section renders as an empty card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HabitAudit {
    #[serde(default)]
    pub impulsive_purchases: Vec<ImpulsivePurchase>,
    #[serde(default)]
    pub high_cost_dining: Vec<DiningSpot>,
    #[serde(default)]
    pub subscription_analysis: Vec<SubscriptionLine>,
    #[serde(default)]
    pub cut_back_opportunities: Vec<CutBack>,
}

impl HabitAudit {
    /// Total estimated monthly saving across all cut-back entries.
    /// Recomputed by the renderer on every draw; nothing caches it.
    pub fn potential_savings_total(&self) -> f64 {
        self.cut_back_opportunities
            .iter()
            .map(|c| c.potential_savings)
            .sum()
    }
}

/// Classic-view payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicReport {
    pub financial_alignment_score: f64,
    pub total_transactions: u64,
    pub total_amount: f64,
    pub category_summary: ClassicSummary,
    pub top_merchants: Vec<MerchantSummary>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

/// Audit-view payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub financial_alignment_score: f64,
    pub total_transactions: u64,
    pub total_amount: f64,
    pub category_summary: AuditSummary,
    pub merchant_breakdown: Vec<MerchantSummary>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    pub habit_audit: HabitAudit,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// A decoded report in either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    Classic(ClassicReport),
    Audit(AuditReport),
}

impl AnalysisReport {
    pub fn kind(&self) -> ReportKind {
        match self {
            AnalysisReport::Classic(_) => ReportKind::Classic,
            AnalysisReport::Audit(_) => ReportKind::Audit,
        }
    }

    /// Financial alignment score, 0-100, computed entirely by the agent.
    pub fn score(&self) -> f64 {
        match self {
            AnalysisReport::Classic(r) => r.financial_alignment_score,
            AnalysisReport::Audit(r) => r.financial_alignment_score,
        }
    }

    pub fn total_transactions(&self) -> u64 {
        match self {
            AnalysisReport::Classic(r) => r.total_transactions,
            AnalysisReport::Audit(r) => r.total_transactions,
        }
    }

    pub fn total_amount(&self) -> f64 {
        match self {
            AnalysisReport::Classic(r) => r.total_amount,
            AnalysisReport::Audit(r) => r.total_amount,
        }
    }

    /// Merchant aggregates in wire order. Display sorting is the
    /// renderer's job.
    pub fn merchants(&self) -> &[MerchantSummary] {
        match self {
            AnalysisReport::Classic(r) => &r.top_merchants,
            AnalysisReport::Audit(r) => &r.merchant_breakdown,
        }
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        match self {
            AnalysisReport::Classic(r) => &r.transactions,
            AnalysisReport::Audit(r) => &r.transactions,
        }
    }

    pub fn habit_audit(&self) -> Option<&HabitAudit> {
        match self {
            AnalysisReport::Classic(_) => None,
            AnalysisReport::Audit(r) => Some(&r.habit_audit),
        }
    }

    pub fn recommendations(&self) -> &[String] {
        match self {
            AnalysisReport::Classic(_) => &[],
            AnalysisReport::Audit(r) => &r.recommendations,
        }
    }
}

/// Decode an agent `result` payload into a report plus its insights list.
///
/// Insights ride at the top level of the same payload and are tolerated when
/// absent or malformed (they degrade to an empty list); the report itself
/// must decode in full or the whole analysis is treated as failed.
pub fn decode_report(kind: ReportKind, result: &Value) -> Result<(AnalysisReport, Vec<String>)> {
    let insights = result
        .get("insights")
        .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
        .unwrap_or_default();

    let report = match kind {
        ReportKind::Classic => AnalysisReport::Classic(
            serde_json::from_value(result.clone()).context("decode classic report payload")?,
        ),
        ReportKind::Audit => AnalysisReport::Audit(
            serde_json::from_value(result.clone()).context("decode audit report payload")?,
        ),
    };

    Ok((report, insights))
}
