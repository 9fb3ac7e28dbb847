//! Search request/response shapes for the position list.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::PositionFilter;
use crate::domain::StoredPosition;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    OpenedAt,
    NetPnl,
    RFactor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default)]
    pub field: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    /// Order two positions; ties fall back to id for a stable result.
    ///
    /// Open times compare at millisecond precision, the resolution stored in SQLite.
    pub fn compare(&self, a: &StoredPosition, b: &StoredPosition) -> Ordering {
        let primary = match self.field {
            SortField::OpenedAt => a
                .opened_at()
                .timestamp_millis()
                .cmp(&b.opened_at().timestamp_millis()),
            SortField::NetPnl => a.net_pnl().cmp(&b.net_pnl()),
            SortField::RFactor => a.r_factor().cmp(&b.r_factor()),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: PositionFilter,
    #[serde(default)]
    pub sort: Sort,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl SearchRequest {
    pub fn new(filters: PositionFilter) -> Self {
        Self {
            filters,
            sort: Sort::default(),
            page: default_page(),
            limit: default_limit(),
        }
    }

    /// Requested page, at least 1.
    pub fn page_number(&self) -> u32 {
        self.page.max(1)
    }

    /// Requested page size, clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn page_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Number of matching positions before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number() - 1) * u64::from(self.page_limit())
    }

    /// True when filtering, ordering and paging need no decimal comparison, so the
    /// whole request can run in the database.
    pub fn is_column_only(&self) -> bool {
        self.filters.net_pnl.is_none()
            && self.filters.r_factor.is_none()
            && self.sort.field == SortField::OpenedAt
    }

    /// Filter, sort and paginate `positions`.
    pub fn apply(&self, positions: Vec<StoredPosition>) -> SearchResponse {
        let mut matched: Vec<StoredPosition> = positions
            .into_iter()
            .filter(|p| self.filters.matches(p))
            .collect();
        matched.sort_by(|a, b| self.sort.compare(a, b));

        let total_items = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.page_limit() as usize)
            .collect();
        self.respond(items, total_items)
    }

    /// Wrap an already paginated slice of results.
    pub fn respond(&self, items: Vec<StoredPosition>, total_items: u64) -> SearchResponse {
        SearchResponse {
            items,
            pagination: Pagination {
                page: self.page_number(),
                limit: self.page_limit(),
                total_items,
            },
        }
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new(PositionFilter::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<StoredPosition>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Instrument, PositionStatus, Trade};
    use crate::filter::{CompareOp, Comparison};
    use crate::engine::compute;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn position(sell: &str, opened_ms: i64) -> StoredPosition {
        let trades = vec![
            Trade::buy(Utc.timestamp_millis_opt(opened_ms).unwrap(), d("1"), d("100")),
            Trade::sell(Utc.timestamp_millis_opt(opened_ms + 1).unwrap(), d("1"), d(sell)),
        ];
        StoredPosition {
            id: Uuid::new_v4(),
            instrument: Instrument::new("TCS".to_string()),
            notes: None,
            risk_amount: d("10"),
            charges_amount: Decimal::zero(),
            enable_auto_charges: false,
            computed: compute(&trades, d("10"), Decimal::zero()).unwrap(),
            trades,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_sort_newest_first() {
        let response = SearchRequest::default().apply(vec![
            position("110", 1000),
            position("90", 3000),
            position("100", 2000),
        ]);
        let opened: Vec<i64> = response
            .items
            .iter()
            .map(|p| p.opened_at().timestamp_millis())
            .collect();
        assert_eq!(opened, vec![3000, 2000, 1000]);
        assert_eq!(response.pagination.total_items, 3);
    }

    #[test]
    fn test_sort_by_net_pnl_ascending() {
        let mut request = SearchRequest::new(PositionFilter::default());
        request.sort = Sort {
            field: SortField::NetPnl,
            order: SortOrder::Asc,
        };
        let response =
            request.apply(vec![position("110", 1000), position("90", 3000), position("100", 2000)]);
        let pnl: Vec<Decimal> = response.items.iter().map(|p| p.net_pnl()).collect();
        assert_eq!(pnl, vec![d("-10"), d("0"), d("10")]);
    }

    #[test]
    fn test_pagination_and_filtering() {
        let positions: Vec<_> = (0..5).map(|i| position("110", i * 1000)).collect();
        let mut request = SearchRequest::new(PositionFilter {
            statuses: vec![PositionStatus::Win],
            ..Default::default()
        });
        request.limit = 2;
        request.page = 3;

        let response = request.apply(positions);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.pagination.total_items, 5);
        assert_eq!(response.pagination.page, 3);
    }

    #[test]
    fn test_column_only_requests() {
        let mut request = SearchRequest::new(PositionFilter {
            instrument: Some("TCS".to_string()),
            statuses: vec![PositionStatus::Win],
            ..Default::default()
        });
        assert!(request.is_column_only());

        request.sort.field = SortField::RFactor;
        assert!(!request.is_column_only());

        request.sort.field = SortField::OpenedAt;
        request.filters.net_pnl = Some(Comparison::new(CompareOp::Gt, Decimal::zero()));
        assert!(!request.is_column_only());
    }

    #[test]
    fn test_offset_uses_clamped_page_and_limit() {
        let mut request = SearchRequest::default();
        request.page = 0;
        request.limit = 500;
        assert_eq!(request.page_number(), 1);
        assert_eq!(request.offset(), 0);

        request.page = 3;
        assert_eq!(request.page_limit(), MAX_PAGE_LIMIT);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: SearchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(request.sort.order, SortOrder::Desc);
    }
}
