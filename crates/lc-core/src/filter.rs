//! # List Filter / Search Engine
//!
//! Pure filtering over fetched collections. Criteria are plain values (usually
//! deserialized from a query string); nothing here keeps state between calls.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::models::{Appointment, Case, SponsorshipCase, StoryMilestone};
use crate::status::{AppointmentStatus, CasePriority, CaseStatus, SponsorshipStatus};

/// Wire sentinel that disables an exact-match filter.
pub const ALL: &str = "ALL";

/// Exact-match filter over a closed enumeration, or `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL) {
            Ok(Choice::All)
        } else {
            s.parse().map(Choice::Only)
        }
    }
}

impl<'de, T> Deserialize<'de> for Choice<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A cleared date picker sends an empty value, which means no date filter.
fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Records that can be matched by the free-text search box.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Case {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str(), self.phone.as_str()];
        fields.extend(self.email.as_deref());
        fields
    }
}

impl Searchable for Appointment {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.patient_name.as_str(), self.phone.as_str()];
        fields.extend(self.email.as_deref());
        fields.push(self.appointment_type.as_str());
        fields
    }
}

impl Searchable for SponsorshipCase {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.patient_name.as_str(), self.case_description.as_str()]
    }
}

/// Case-insensitive substring match over any searchable field.
/// A blank query matches everything.
pub fn matches_query<T: Searchable>(item: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// A conjunction of predicates plus the ordering of the visible subset.
pub trait Criteria<T> {
    fn admits(&self, item: &T) -> bool;

    /// Server order is kept unless a list says otherwise.
    fn order(&self, _items: &mut [T]) {}
}

/// Applies `criteria` to `items`. Never fails; an empty result is valid.
pub fn filter<T: Clone, C: Criteria<T>>(items: &[T], criteria: &C) -> Vec<T> {
    let mut visible: Vec<T> = items
        .iter()
        .filter(|item| criteria.admits(item))
        .cloned()
        .collect();
    criteria.order(&mut visible);
    visible
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseCriteria {
    pub search: String,
    pub status: Choice<CaseStatus>,
    pub priority: Choice<CasePriority>,
}

impl Criteria<Case> for CaseCriteria {
    fn admits(&self, case: &Case) -> bool {
        matches_query(case, &self.search)
            && self.status.admits(&case.status)
            && self.priority.admits(&case.priority)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentCriteria {
    pub search: String,
    pub status: Choice<AppointmentStatus>,
    #[serde(deserialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
}

impl Criteria<Appointment> for AppointmentCriteria {
    fn admits(&self, appointment: &Appointment) -> bool {
        matches_query(appointment, &self.search)
            && self.status.admits(&appointment.status)
            && self
                .date
                .map_or(true, |date| appointment.appointment_date == date)
    }

    /// Newest first; ties keep their relative order.
    fn order(&self, items: &mut [Appointment]) {
        items.sort_by(|a, b| b.scheduled_at().cmp(&a.scheduled_at()));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SponsorshipCriteria {
    pub search: String,
    pub status: Choice<SponsorshipStatus>,
    pub featured_only: bool,
}

impl Criteria<SponsorshipCase> for SponsorshipCriteria {
    fn admits(&self, case: &SponsorshipCase) -> bool {
        matches_query(case, &self.search)
            && self.status.admits(&case.status)
            && (!self.featured_only || case.is_featured)
    }
}

/// Ascending by `order_index`, stable for equal indexes.
pub fn order_milestones(milestones: &mut [StoryMilestone]) {
    milestones.sort_by_key(|m| m.order_index);
}
