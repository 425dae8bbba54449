use std::fmt::Debug;

use chrono::{DateTime, Utc};
use dpg_common::MinorUnits;

use crate::{
    db_types::DonationStatus,
    dpe_api::donation_objects::{
        recent_donations_window,
        DonationListing,
        DonationStatistics,
        DonationStats,
        Pagination,
        DEFAULT_PAGE_SIZE,
        MAX_PAGE_SIZE,
        RECENT_DONATIONS_LIMIT,
    },
    traits::{DonationQueries, DonationQuery, LedgerError, StatusSummary},
};

/// Read-only access to donations for reporting.
pub struct DonationQueryApi<B> {
    db: B,
}

impl<B> Debug for DonationQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DonationQueryApi")
    }
}

impl<B> DonationQueryApi<B>
where B: DonationQueries
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Returns a page of donations, newest first, along with pagination details and overall statistics.
    ///
    /// `page` starts at 1. `limit` is clamped to between 1 and 100, and defaults to 20.
    pub async fn list_donations(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
        status: Option<DonationStatus>,
    ) -> Result<DonationListing, LedgerError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);
        let mut query = DonationQuery::new(offset, limit);
        if let Some(status) = status {
            query = query.with_status(status);
        }
        let donations = self.db.search_donations(query).await?;
        let total = self.db.count_donations(status).await?;
        let pages = (total + limit - 1) / limit;
        let breakdown = self.db.status_breakdown().await?;
        let statistics = statistics_from(breakdown);
        Ok(DonationListing { donations, pagination: Pagination { total, page, pages, limit }, statistics })
    }

    /// Overall counts per status, the amount raised, and the most recent completed donations of the past week.
    pub async fn donation_stats(&self, now: DateTime<Utc>) -> Result<DonationStats, LedgerError> {
        let breakdown = self.db.status_breakdown().await?;
        let count_for = |status| breakdown.iter().find(|s| s.status == status).map(|s| s.count).unwrap_or(0);
        let completed = count_for(DonationStatus::Completed);
        let pending = count_for(DonationStatus::Pending);
        let failed = count_for(DonationStatus::Failed);
        let total_amount = amount_raised(&breakdown);
        let since = now - recent_donations_window();
        let recent_donations = self.db.fetch_recent_completed(since, RECENT_DONATIONS_LIMIT).await?;
        Ok(DonationStats {
            total: completed + pending + failed,
            completed,
            pending,
            failed,
            total_amount,
            recent_donations,
        })
    }
}

fn amount_raised(breakdown: &[StatusSummary]) -> MinorUnits {
    breakdown.iter().filter(|s| s.status == DonationStatus::Completed).map(|s| s.total_amount).sum()
}

fn statistics_from(status_breakdown: Vec<StatusSummary>) -> DonationStatistics {
    let total_donations = status_breakdown.iter().map(|s| s.count).sum();
    let completed_count =
        status_breakdown.iter().filter(|s| s.status == DonationStatus::Completed).map(|s| s.count).sum();
    let total_amount_raised = amount_raised(&status_breakdown);
    DonationStatistics { total_donations, total_amount_raised, completed_count, status_breakdown }
}
