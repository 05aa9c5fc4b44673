//! Texts sent back to the chat.

use crate::{BudgetOutcome, Transaction};

pub const FORMAT_HINT: &str = "請使用格式：分類,付款工具,付款方式,+或-,金額,備註";
pub const APPEND_FAILED: &str = "⚠️ 記錄失敗，請稍後再試";
pub const BUDGET_UNAVAILABLE: &str = "⚠️ 預算計算失敗，請稍後再試";

/// Renders the confirmation of a recorded transaction.
///
/// `budget` is `None` for incomes, which leaves the budget line blank.
pub fn render_recorded(transaction: &Transaction, budget: Option<&BudgetOutcome>) -> String {
    format!(
        "✅ 已記錄：{category} {amount} 元\n\
         💳 工具：{tool}／{method}\n\
         📌 備註：{note}\n\
         {budget}\n\
         🕒 {timestamp}",
        category = transaction.category,
        amount = transaction.amount,
        tool = transaction.tool,
        method = transaction.method,
        note = transaction.note,
        budget = render_budget_line(&transaction.category, budget),
        timestamp = transaction.timestamp,
    )
}

fn render_budget_line(category: &str, budget: Option<&BudgetOutcome>) -> String {
    match budget {
        None => String::new(),
        Some(BudgetOutcome::Summary(summary)) => format!(
            "📉「{}」本月剩餘預算：{} 元（預算 {} - 累計支出 {}）",
            summary.category,
            summary.remaining.grouped(),
            summary.monthly_limit.grouped(),
            summary.monthly_spent.grouped(),
        ),
        Some(BudgetOutcome::NoBudgetConfigured) => {
            format!("⚠️「{category}」沒有在預算設定中，無法計算剩餘預算")
        }
        Some(BudgetOutcome::BudgetUnavailable) => BUDGET_UNAVAILABLE.to_string(),
    }
}
