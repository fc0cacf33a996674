//! Reporting API endpoints

use api_types::report::{MonthlyReportView, ReportEntryView};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState, transactions};

pub async fn monthly(
    State(state): State<ServerState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthlyReportView>, ServerError> {
    let report = state.engine.monthly_report(year, month).await?;

    let entries = report
        .transactions
        .into_iter()
        .map(|entry| ReportEntryView {
            member_name: entry.member_name,
            transaction: transactions::tx_view(entry.transaction),
        })
        .collect();

    Ok(Json(MonthlyReportView {
        year: report.year,
        month: report.month,
        total_recharge_minor: report.total_recharge_minor,
        total_consume_minor: report.total_consume_minor,
        total_bonus_minor: report.total_bonus_minor,
        recharge_count: report.recharge_count,
        consume_count: report.consume_count,
        active_member_count: report.active_member_count,
        total_members: report.total_members,
        valid_member_count: report.valid_member_count,
        transactions: entries,
    }))
}
