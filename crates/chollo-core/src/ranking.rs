//! Pure ranking and aggregation over deal collections.
//!
//! All surfaces share one scoring rule for groups: the average vote score of
//! the group's members, doubled, plus the member count. A busy group with
//! mediocre votes can outrank a tiny group with great ones, which is what a
//! "what's hot" surface wants.

use chrono::{DateTime, Duration, Utc};

use crate::category::normalize_label;
use crate::Deal;

/// Groups surfaced per highlight (categories, stores).
pub const TOP_GROUPS: usize = 3;
/// Member deals kept per group for preview.
pub const GROUP_PREVIEW: usize = 3;
/// Trailing window for the featured carousel, in days.
pub const FEATURED_WINDOW_DAYS: i64 = 7;
pub const FEATURED_LIMIT: usize = 5;
/// Trailing window for the most-viewed carousel, in days (two months).
pub const MOST_VIEWED_WINDOW_DAYS: i64 = 60;
pub const MOST_VIEWED_LIMIT: usize = 6;

/// A ranked group of deals sharing a label (category name or store name).
#[derive(Debug, Clone)]
pub struct DealGroup<'a> {
    pub label: String,
    pub final_score: f64,
    pub deal_count: usize,
    /// Net vote score summed over every member, not just the preview.
    pub total_vote_score: i64,
    /// Mean discount over members carrying one; `None` when no member does.
    pub average_discount: Option<f64>,
    /// Top members by vote score, truncated to [`GROUP_PREVIEW`].
    pub deals: Vec<&'a Deal>,
}

/// `avg_vote_score * 2 + count` over a group's vote sum and size.
#[must_use]
pub fn group_score(vote_sum: i64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let average = vote_sum as f64 / count as f64;
    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    average * 2.0 + count
}

/// Top category groups: deals bucketed by normalized category label, scored
/// by [`group_score`], ties broken by ascending label. Truncated to
/// [`TOP_GROUPS`] groups of [`GROUP_PREVIEW`] deals each.
#[must_use]
pub fn top_category_groups(deals: &[Deal]) -> Vec<DealGroup<'_>> {
    let grouped = group_by(deals, |deal| normalize_label(&deal.category).to_string());
    rank_groups(grouped)
}

/// Top store groups, same scoring as categories. Deals attributed to the
/// unknown sentinel store are excluded; they have no merchant to feature.
#[must_use]
pub fn top_store_groups(deals: &[Deal]) -> Vec<DealGroup<'_>> {
    let known: Vec<&Deal> = deals.iter().filter(|d| !d.store.is_unknown()).collect();
    let grouped = group_refs_by(&known, |deal| deal.store.name.clone());
    rank_groups(grouped)
}

/// Featured deals: created within the trailing week, by vote score
/// descending, top [`FEATURED_LIMIT`].
#[must_use]
pub fn featured_deals(deals: &[Deal], now: DateTime<Utc>) -> Vec<&Deal> {
    let cutoff = now - Duration::days(FEATURED_WINDOW_DAYS);
    let mut recent: Vec<&Deal> = deals.iter().filter(|d| d.created_at >= cutoff).collect();
    recent.sort_by(|a, b| {
        b.vote_score()
            .cmp(&a.vote_score())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    recent.truncate(FEATURED_LIMIT);
    recent
}

/// Most-viewed deals: created within the trailing two months, views
/// descending, zero-view deals excluded, top [`MOST_VIEWED_LIMIT`].
#[must_use]
pub fn most_viewed_deals(deals: &[Deal], now: DateTime<Utc>) -> Vec<&Deal> {
    let cutoff = now - Duration::days(MOST_VIEWED_WINDOW_DAYS);
    let mut viewed: Vec<&Deal> = deals
        .iter()
        .filter(|d| d.created_at >= cutoff && d.views > 0)
        .collect();
    viewed.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    viewed.truncate(MOST_VIEWED_LIMIT);
    viewed
}

fn group_by<F>(deals: &[Deal], label_of: F) -> Vec<(String, Vec<&Deal>)>
where
    F: Fn(&Deal) -> String,
{
    let refs: Vec<&Deal> = deals.iter().collect();
    group_refs_by(&refs, label_of)
}

fn group_refs_by<'a, F>(deals: &[&'a Deal], label_of: F) -> Vec<(String, Vec<&'a Deal>)>
where
    F: Fn(&Deal) -> String,
{
    let mut groups: Vec<(String, Vec<&Deal>)> = Vec::new();
    for &deal in deals {
        let label = label_of(deal);
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(deal),
            None => groups.push((label, vec![deal])),
        }
    }
    groups
}

fn rank_groups(grouped: Vec<(String, Vec<&Deal>)>) -> Vec<DealGroup<'_>> {
    let mut ranked: Vec<DealGroup<'_>> = grouped
        .into_iter()
        .map(|(label, mut members)| {
            let total_vote_score: i64 = members.iter().map(|d| d.vote_score()).sum();
            let deal_count = members.len();
            let final_score = group_score(total_vote_score, deal_count);
            let average_discount = average_discount(&members);

            members.sort_by(|a, b| {
                b.vote_score()
                    .cmp(&a.vote_score())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
            members.truncate(GROUP_PREVIEW);

            DealGroup {
                label,
                final_score,
                deal_count,
                total_vote_score,
                average_discount,
                deals: members,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.truncate(TOP_GROUPS);
    ranked
}

fn average_discount(members: &[&Deal]) -> Option<f64> {
    let discounts: Vec<i32> = members
        .iter()
        .filter_map(|d| d.discount_percentage)
        .collect();
    if discounts.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = discounts.len() as f64;
    Some(f64::from(discounts.iter().sum::<i32>()) / count)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::Store;

    fn deal(category: &str, up: i32, down: i32) -> Deal {
        deal_at(category, up, down, Utc::now())
    }

    fn deal_at(category: &str, up: i32, down: i32, created_at: DateTime<Utc>) -> Deal {
        Deal {
            id: Uuid::new_v4(),
            title: format!("{category} deal"),
            description: String::new(),
            previous_price: None,
            current_price: Decimal::from(100),
            discount_percentage: None,
            category: category.to_string(),
            purchase_link: "https://example.com/p".to_string(),
            image_url: None,
            created_at,
            created_by: "u1".to_string(),
            created_by_name: "Usuario".to_string(),
            store: Store::unknown(),
            upvotes: up,
            downvotes: down,
            unavailable_reports: 0,
            views: 0,
        }
    }

    fn with_store(mut d: Deal, name: &str) -> Deal {
        d.store = Store {
            id: format!("{}.com", name.to_lowercase()),
            name: name.to_string(),
            icon: "🏪".to_string(),
            domain: format!("{}.com", name.to_lowercase()),
            color: "#3B82F6".to_string(),
        };
        d
    }

    #[test]
    fn group_score_is_avg_doubled_plus_count() {
        // sum 6 over 3 deals: avg 2, score 2*2 + 3 = 7
        assert!((group_score(6, 3) - 7.0).abs() < f64::EPSILON);
        assert!((group_score(0, 0) - 0.0).abs() < f64::EPSILON);
        // negative vote sums are legal
        assert!((group_score(-4, 2) - (-2.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn categories_rank_by_final_score() {
        // hogar: avg 5, 1 deal  -> 11
        // moda: avg 1, 4 deals  -> 6
        // libros: avg 0, 1 deal -> 1
        let deals = vec![
            deal("hogar", 5, 0),
            deal("moda", 1, 0),
            deal("moda", 1, 0),
            deal("moda", 1, 0),
            deal("moda", 1, 0),
            deal("libros", 0, 0),
        ];
        let groups = top_category_groups(&deals);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["hogar", "moda", "libros"]);
        assert!((groups[0].final_score - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_resolve_alphabetically() {
        let deals = vec![
            deal("moda", 2, 0),
            deal("hogar", 2, 0),
            deal("belleza", 2, 0),
        ];
        let groups = top_category_groups(&deals);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["belleza", "hogar", "moda"]);
    }

    #[test]
    fn fourth_ranked_group_never_appears() {
        let deals = vec![
            deal("hogar", 9, 0),
            deal("moda", 7, 0),
            deal("libros", 5, 0),
            deal("belleza", 3, 0),
        ];
        let groups = top_category_groups(&deals);
        assert_eq!(groups.len(), TOP_GROUPS);
        assert!(groups.iter().all(|g| g.label != "belleza"));
    }

    #[test]
    fn legacy_labels_merge_into_canonical_groups() {
        let deals = vec![
            deal("Tecnología", 3, 0),
            deal("electrónicos", 2, 0),
            deal("Salud", 1, 0),
        ];
        let groups = top_category_groups(&deals);
        let electronics = groups
            .iter()
            .find(|g| g.label == "electrónicos")
            .expect("merged group");
        assert_eq!(electronics.deal_count, 2);
        assert_eq!(electronics.total_vote_score, 5);
        assert!(groups.iter().any(|g| g.label == "otros"));
    }

    #[test]
    fn group_preview_ranks_members_by_vote_score() {
        let deals = vec![
            deal("moda", 1, 0),
            deal("moda", 8, 0),
            deal("moda", 3, 0),
            deal("moda", 5, 0),
        ];
        let groups = top_category_groups(&deals);
        let scores: Vec<i64> = groups[0].deals.iter().map(|d| d.vote_score()).collect();
        assert_eq!(scores, vec![8, 5, 3]);
        assert_eq!(groups[0].deal_count, 4);
    }

    #[test]
    fn store_groups_exclude_unknown_sentinel() {
        let deals = vec![
            with_store(deal("moda", 4, 0), "Falabella"),
            deal("moda", 9, 0), // unknown store
        ];
        let groups = top_store_groups(&deals);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Falabella");
    }

    #[test]
    fn store_groups_carry_stats() {
        let mut a = with_store(deal("moda", 4, 1), "Falabella");
        a.discount_percentage = Some(30);
        let mut b = with_store(deal("hogar", 2, 0), "Falabella");
        b.discount_percentage = Some(10);
        let c = with_store(deal("moda", 1, 0), "Falabella");

        let deals = [a, b, c];
        let groups = top_store_groups(&deals);
        assert_eq!(groups[0].deal_count, 3);
        assert_eq!(groups[0].total_vote_score, 6);
        assert!((groups[0].average_discount.unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_discount_absent_when_no_member_has_one() {
        let deals = [with_store(deal("moda", 1, 0), "Linio")];
        let groups = top_store_groups(&deals);
        assert!(groups[0].average_discount.is_none());
    }

    #[test]
    fn featured_honors_window_and_limit() {
        let now = Utc::now();
        let mut deals = vec![deal_at("moda", 100, 0, now - Duration::days(10))];
        for votes in 1..=6 {
            deals.push(deal_at("moda", votes, 0, now - Duration::days(1)));
        }
        let featured = featured_deals(&deals, now);
        assert_eq!(featured.len(), FEATURED_LIMIT);
        // the 10-day-old deal is outside the window despite its votes
        assert!(featured.iter().all(|d| d.upvotes != 100));
        assert_eq!(featured[0].vote_score(), 6);
    }

    #[test]
    fn most_viewed_skips_zero_views_and_old_deals() {
        let now = Utc::now();
        let mut fresh = deal_at("moda", 0, 0, now - Duration::days(3));
        fresh.views = 40;
        let mut stale = deal_at("moda", 0, 0, now - Duration::days(90));
        stale.views = 900;
        let unviewed = deal_at("moda", 50, 0, now - Duration::days(1));

        let deals = vec![fresh, stale, unviewed];
        let viewed = most_viewed_deals(&deals, now);
        assert_eq!(viewed.len(), 1);
        assert_eq!(viewed[0].views, 40);
    }

    #[test]
    fn most_viewed_truncates_to_limit() {
        let now = Utc::now();
        let deals: Vec<Deal> = (1..=8)
            .map(|views| {
                let mut d = deal_at("moda", 0, 0, now - Duration::days(1));
                d.views = views;
                d
            })
            .collect();
        let viewed = most_viewed_deals(&deals, now);
        assert_eq!(viewed.len(), MOST_VIEWED_LIMIT);
        assert_eq!(viewed[0].views, 8);
    }
}
