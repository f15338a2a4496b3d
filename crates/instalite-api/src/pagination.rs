use serde::Deserialize;

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Raw `?page=&limit=` values. Kept as strings so junk input falls back to
/// the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// `page = max(1, page || 1)`, `limit = min(100, max(1, limit || 20))`,
    /// where a missing, non-numeric or zero value counts as absent.
    pub fn from_query(query: &PageQuery) -> Self {
        let page = leading_int(query.page.as_deref())
            .unwrap_or(1)
            .clamp(1, u32::MAX as i64) as u32;
        let limit = leading_int(query.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT as i64)
            .clamp(1, MAX_LIMIT as i64) as u32;
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit as i64 - 1) / self.limit as i64
    }
}

/// Leading integer of `raw` ("12abc" is 12). Zero counts as absent.
fn leading_int(raw: Option<&str>) -> Option<i64> {
    parse_leading_int(raw?).filter(|&n| n != 0)
}

/// Integer at the start of `raw`, after leading whitespace and an optional
/// sign. Overflow saturates. None when there are no digits.
pub(crate) fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}
