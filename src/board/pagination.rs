//! Page arithmetic for topic and post listings.

use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// 1-based page number.
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    /// Total number of items across all pages.
    pub total: i64,
}

impl PageInfo {
    /// Resolve a requested page against a total count.
    ///
    /// A missing or unparsable request means page 1. Out-of-range numbers are
    /// clamped to the first or last page. An empty listing still has one page.
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let number = requested
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .clamp(1, num_pages);

        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    /// 1-based position of the first item on this page.
    pub fn start_index(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            self.offset() + 1
        }
    }
}

/// Where a newly added item lands in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLocation {
    /// Page containing the item.
    pub page: i64,
    /// 1-based position of the item in the whole listing.
    pub position: i64,
}

impl ItemLocation {
    /// Location of the item appended after `existing` items, `per_page` per page.
    ///
    /// # Examples
    ///
    /// ```
    /// use forum::board::ItemLocation;
    ///
    /// let loc = ItemLocation::appended(20, 20);
    /// assert_eq!(loc.page, 2);
    /// assert_eq!(loc.position, 21);
    /// ```
    pub fn appended(existing: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let position = existing.max(0) + 1;
        Self {
            page: (position + per_page - 1) / per_page,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults_to_first_page() {
        let page = PageInfo::resolve(None, 25, 10);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 0);
        assert!(!page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn test_resolve_clamps() {
        assert_eq!(PageInfo::resolve(Some("99"), 25, 10).number, 3);
        assert_eq!(PageInfo::resolve(Some("0"), 25, 10).number, 1);
        assert_eq!(PageInfo::resolve(Some("-4"), 25, 10).number, 1);
        assert_eq!(PageInfo::resolve(Some("abc"), 25, 10).number, 1);
        assert_eq!(PageInfo::resolve(Some(" 2 "), 25, 10).number, 2);
    }

    #[test]
    fn test_resolve_empty_listing() {
        let page = PageInfo::resolve(Some("3"), 0, 10);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.start_index(), 0);
        assert!(!page.has_other_pages());
    }

    #[test]
    fn test_last_page() {
        let page = PageInfo::resolve(Some("3"), 25, 10);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.start_index(), 21);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_appended_location() {
        // ceil((N + 1) / P) with anchor N + 1
        for (existing, per_page, page) in [
            (0, 10, 1),
            (9, 10, 1),
            (10, 10, 2),
            (1, 2, 1),
            (2, 2, 2),
            (20, 20, 2),
        ] {
            let loc = ItemLocation::appended(existing, per_page);
            assert_eq!(loc.page, page, "N={existing} P={per_page}");
            assert_eq!(loc.position, existing + 1);
        }
    }
}
