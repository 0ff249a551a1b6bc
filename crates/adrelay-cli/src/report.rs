//! Budget reporting commands.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use adrelay_budget::ReportWindow;

fn parse_window(raw: &str) -> anyhow::Result<ReportWindow> {
    match raw {
        "24h" => Ok(ReportWindow::Day),
        "7d" => Ok(ReportWindow::Week),
        "30d" => Ok(ReportWindow::Month),
        other => anyhow::bail!("unknown window '{other}' (expected 24h, 7d, or 30d)"),
    }
}

/// Print per-campaign budget utilization with in-window activity.
pub(crate) async fn run_budget_report(pool: &PgPool, window: &str) -> anyhow::Result<()> {
    let window = parse_window(window)?;
    let since = window.since(Utc::now());
    let rows = adrelay_db::reporting::budget_utilization(pool, since).await?;

    if rows.is_empty() {
        println!("no campaigns found");
        return Ok(());
    }

    println!(
        "{:<38} {:<10} {:>12} {:>12} {:>8} {:>8}",
        "campaign", "status", "budget", "spent", "imps", "clicks"
    );
    for row in &rows {
        println!(
            "{:<38} {:<10} {:>12} {:>12} {:>8} {:>8}",
            row.campaign_name,
            row.status,
            row.budget_amount,
            row.spent_amount,
            row.impressions,
            row.clicks
        );
    }
    Ok(())
}

/// Print budget status and pacing for one campaign.
pub(crate) async fn run_campaign_status(pool: &PgPool, campaign_id: Uuid) -> anyhow::Result<()> {
    let Some(status) =
        adrelay_budget::campaign_budget_status(pool, campaign_id, Utc::now()).await?
    else {
        anyhow::bail!("campaign '{campaign_id}' not found");
    };

    println!("campaign:              {}", status.campaign_id);
    println!("status:                {}", status.status);
    println!(
        "budget:                {} {}",
        status.budget_amount, status.currency
    );
    println!(
        "spent:                 {} {}",
        status.spent_amount, status.currency
    );
    println!(
        "remaining:             {} {}",
        status.remaining_budget, status.currency
    );
    println!("utilization:           {:.1}%", status.utilization_percent);
    println!("out of budget:         {}", status.is_out_of_budget);
    println!(
        "flight:                day {} of {} ({} remaining)",
        status.elapsed_days, status.total_days, status.days_remaining
    );
    println!("projected daily spend: {}", status.projected_daily_spend);
    println!("projected total spend: {}", status.projected_total_spend);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parsing_accepts_known_spans() {
        assert!(parse_window("24h").is_ok());
        assert!(parse_window("7d").is_ok());
        assert!(parse_window("30d").is_ok());
        assert!(parse_window("1y").is_err());
    }
}
