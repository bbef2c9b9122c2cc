pub mod app_config;
pub mod category;
pub mod config;
pub mod domain;
pub mod keywords;
pub mod price;
pub mod ranking;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use category::DealCategory;
pub use store::Store;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A community-submitted product listing with pricing and voting metadata.
///
/// `category` stays a free string at this level: rows predating the category
/// enum carry legacy labels, which [`category::normalize_label`] folds into
/// the canonical set at ranking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub previous_price: Option<Decimal>,
    pub current_price: Decimal,
    pub discount_percentage: Option<i32>,
    pub category: String,
    pub purchase_link: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub created_by_name: String,
    pub store: Store,
    pub upvotes: i32,
    pub downvotes: i32,
    pub unavailable_reports: i32,
    pub views: i32,
}

impl Deal {
    /// Net community vote for this deal, `upvotes - downvotes`.
    #[must_use]
    pub fn vote_score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    /// Discount derived from the two prices, when both are present and the
    /// previous price is strictly higher. Rounded to the nearest percent,
    /// with `.5` midpoints rounding up.
    #[must_use]
    pub fn derived_discount(previous: Option<Decimal>, current: Decimal) -> Option<i32> {
        let previous = previous?;
        if previous <= current || previous <= Decimal::ZERO {
            return None;
        }
        let ratio = (previous - current) / previous * Decimal::from(100);
        ratio
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .try_into()
            .ok()
    }
}

/// Direction of a user's vote on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl std::str::FromStr for VoteDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(CoreError::InvalidVoteDirection(other.to_string())),
        }
    }
}

/// Per-(user, deal) interaction state: at most one record per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInteraction {
    pub id: String,
    pub user_id: String,
    pub deal_id: Uuid,
    pub vote: Option<VoteDirection>,
    pub reported_unavailable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stable identity for a (user, deal) interaction record.
#[must_use]
pub fn interaction_id(user_id: &str, deal_id: Uuid) -> String {
    format!("{user_id}_{deal_id}")
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    #[error("invalid vote direction: {0}")]
    InvalidVoteDirection(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read store seed file at {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn derived_discount_quarter_off() {
        let prev = Some(Decimal::from(1000));
        let curr = Decimal::from(750);
        assert_eq!(Deal::derived_discount(prev, curr), Some(25));
    }

    #[test]
    fn derived_discount_rounds_to_nearest() {
        let prev = Some(Decimal::from(3));
        let curr = Decimal::from(2);
        // 33.33… rounds down
        assert_eq!(Deal::derived_discount(prev, curr), Some(33));
    }

    #[test]
    fn derived_discount_rounds_midpoints_up() {
        let prev = Some(Decimal::from(8));
        let curr = Decimal::from(7);
        // 12.5% is a midpoint and goes to 13, not banker's 12
        assert_eq!(Deal::derived_discount(prev, curr), Some(13));
    }

    #[test]
    fn derived_discount_absent_without_previous() {
        assert_eq!(Deal::derived_discount(None, Decimal::from(750)), None);
    }

    #[test]
    fn derived_discount_absent_when_price_rose() {
        let prev = Some(Decimal::from(500));
        assert_eq!(Deal::derived_discount(prev, Decimal::from(750)), None);
    }

    #[test]
    fn interaction_id_concatenates_pair() {
        let deal = Uuid::nil();
        assert_eq!(
            interaction_id("u123", deal),
            format!("u123_{deal}"),
        );
    }

    #[test]
    fn vote_direction_round_trips_through_str() {
        assert_eq!("up".parse::<VoteDirection>().unwrap(), VoteDirection::Up);
        assert_eq!(VoteDirection::Down.as_str(), "down");
        assert!("sideways".parse::<VoteDirection>().is_err());
    }
}
