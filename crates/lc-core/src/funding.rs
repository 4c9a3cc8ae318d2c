//! # Funding Aggregator
//!
//! Display-ready funding metrics for sponsorship campaigns. The completed
//! donations are the source of truth for how much was raised; the stored
//! `raised_amount` on a campaign is only a cache of that sum.

use serde::Serialize;

use crate::models::{SponsorshipCase, SponsorshipDonation};
use crate::status::{PaymentStatus, SponsorshipStatus};

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of `target` covered by `raised`, in percent, rounded to one decimal.
///
/// Clamped to `[0, 100]`: overfunding never displays past 100%. A non-positive
/// target yields 0.
pub fn progress_percent(raised: f64, target: f64) -> f64 {
    if target.is_nan() || target <= 0.0 {
        return 0.0;
    }
    let raised = raised.max(0.0);
    if raised >= target {
        return 100.0;
    }
    one_decimal((raised / target * 100.0).clamp(0.0, 100.0))
}

/// Amount still missing to reach `target`. Never negative.
pub fn remaining(raised: f64, target: f64) -> f64 {
    (target - raised.max(0.0)).max(0.0)
}

pub fn completed_donation_total(donations: &[SponsorshipDonation]) -> f64 {
    donations
        .iter()
        .filter(|d| d.payment_status == PaymentStatus::Completed)
        .map(|d| d.amount)
        .sum()
}

/// Partitioned donation counts for staff statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub completed_count: usize,
    pub pending_count: usize,
    pub failed_count: usize,
    pub completed_total: f64,
}

impl DonationStats {
    pub fn total_count(&self) -> usize {
        self.completed_count + self.pending_count + self.failed_count
    }
}

pub fn donation_stats(donations: &[SponsorshipDonation]) -> DonationStats {
    donations
        .iter()
        .fold(DonationStats::default(), |mut stats, donation| {
            match donation.payment_status {
                PaymentStatus::Completed => {
                    stats.completed_count += 1;
                    stats.completed_total += donation.amount;
                }
                PaymentStatus::Pending => stats.pending_count += 1,
                PaymentStatus::Failed => stats.failed_count += 1,
            }
            stats
        })
}

/// Funding figures of one campaign, recomputed from its donations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingSummary {
    pub target_amount: f64,
    pub raised_amount: f64,
    pub progress_percent: f64,
    pub remaining: f64,
    pub donations: DonationStats,
}

impl FundingSummary {
    /// Donations belonging to other campaigns are ignored.
    pub fn for_case(case: &SponsorshipCase, donations: &[SponsorshipDonation]) -> Self {
        let own: Vec<SponsorshipDonation> = donations
            .iter()
            .filter(|d| d.sponsorship_id == case.id)
            .cloned()
            .collect();
        let stats = donation_stats(&own);
        Self::from_raised(case.target_amount, stats.completed_total, stats)
    }

    /// Summary from the cached `raised_amount` alone, for listings where the
    /// donations were not fetched.
    pub fn from_cached(case: &SponsorshipCase) -> Self {
        Self::from_raised(case.target_amount, case.raised_amount, DonationStats::default())
    }

    fn from_raised(target: f64, raised: f64, donations: DonationStats) -> Self {
        FundingSummary {
            target_amount: target,
            raised_amount: raised,
            progress_percent: progress_percent(raised, target),
            remaining: remaining(raised, target),
            donations,
        }
    }
}

/// Public consumers only ever see ongoing campaigns.
pub fn is_publicly_visible(case: &SponsorshipCase) -> bool {
    case.status == SponsorshipStatus::Ongoing
}

/// Keeps the ongoing campaigns, preserving the server order.
pub fn public_listing(cases: Vec<SponsorshipCase>) -> Vec<SponsorshipCase> {
    cases.into_iter().filter(is_publicly_visible).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn campaign(target: f64) -> SponsorshipCase {
        SponsorshipCase {
            id: Uuid::now_v7(),
            patient_name: "Patient".into(),
            age: 30,
            case_description: "Below-knee prosthesis".into(),
            case_image: "/static/uploads/ab/cd/abcd.png".into(),
            video_url: None,
            estimated_cost: target,
            target_amount: target,
            raised_amount: 0.0,
            status: SponsorshipStatus::Ongoing,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    fn donation(sponsorship_id: Uuid, amount: f64, status: PaymentStatus) -> SponsorshipDonation {
        SponsorshipDonation {
            id: Uuid::now_v7(),
            sponsorship_id,
            donor_name: "Donor".into(),
            donor_email: "donor@example.com".into(),
            donor_phone: "0100000000".into(),
            amount,
            payment_method: PaymentMethod::Cash,
            is_anonymous: false,
            message: None,
            payment_status: status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn completed_total_ignores_pending() {
        let id = Uuid::now_v7();
        assert_eq!(completed_donation_total(&[]), 0.0);
        let donations = vec![
            donation(id, 100.0, PaymentStatus::Completed),
            donation(id, 50.0, PaymentStatus::Pending),
        ];
        assert_eq!(completed_donation_total(&donations), 100.0);
    }

    #[test]
    fn stats_partition_by_payment_status() {
        let id = Uuid::now_v7();
        let donations = vec![
            donation(id, 100.0, PaymentStatus::Completed),
            donation(id, 25.0, PaymentStatus::Completed),
            donation(id, 50.0, PaymentStatus::Pending),
            donation(id, 70.0, PaymentStatus::Failed),
        ];
        let stats = donation_stats(&donations);
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.failed_count, 1);
        assert_eq!(stats.completed_total, 125.0);
        assert_eq!(stats.total_count(), 4);
    }

    #[test]
    fn no_donations_means_nothing_raised() {
        let case = campaign(1000.0);
        let summary = FundingSummary::for_case(&case, &[]);
        assert_eq!(summary.progress_percent, 0.0);
        assert_eq!(summary.remaining, 1000.0);
        assert_eq!(summary.donations, DonationStats::default());
    }

    #[test]
    fn overfunded_case_caps_at_hundred_percent() {
        assert_eq!(progress_percent(1500.0, 1000.0), 100.0);
        assert_eq!(remaining(1500.0, 1000.0), 0.0);
    }

    #[test]
    fn progress_is_rendered_to_one_decimal() {
        assert_eq!(progress_percent(300.0, 1000.0), 30.0);
        assert_eq!(progress_percent(1.0, 3.0), 33.3);
        assert_eq!(progress_percent(2.0, 3.0), 66.7);
    }

    #[test]
    fn zero_target_does_not_divide() {
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
    }

    #[test]
    fn summary_recomputes_from_donations_not_cache() {
        let mut case = campaign(1000.0);
        case.raised_amount = 900.0;
        let donations = vec![
            donation(case.id, 300.0, PaymentStatus::Completed),
            donation(case.id, 200.0, PaymentStatus::Pending),
            donation(Uuid::now_v7(), 400.0, PaymentStatus::Completed),
        ];
        let summary = FundingSummary::for_case(&case, &donations);
        assert_eq!(summary.raised_amount, 300.0);
        assert_eq!(summary.progress_percent, 30.0);
        assert_eq!(summary.remaining, 700.0);
        assert_eq!(summary.donations.pending_count, 1);
    }

    #[test]
    fn public_listing_keeps_only_ongoing_in_order() {
        let a = campaign(100.0);
        let mut b = campaign(100.0);
        b.status = SponsorshipStatus::Completed;
        let mut c = campaign(100.0);
        c.status = SponsorshipStatus::Cancelled;
        let d = campaign(100.0);
        let visible = public_listing(vec![a.clone(), b, c, d.clone()]);
        assert_eq!(visible, vec![a, d]);
    }

    proptest! {
        #[test]
        fn progress_stays_within_bounds(raised in 0.0f64..1e9, target in 0.01f64..1e9) {
            let p = progress_percent(raised, target);
            prop_assert!((0.0..=100.0).contains(&p));
            if raised >= target {
                prop_assert_eq!(p, 100.0);
            }
        }

        #[test]
        fn remaining_is_never_negative(raised in -1e9f64..1e9, target in -1e9f64..1e9) {
            let r = remaining(raised, target);
            prop_assert!(r >= 0.0);
            if raised >= target {
                prop_assert_eq!(r, 0.0);
            }
        }
    }
}
