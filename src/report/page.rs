use clap::ValueEnum;

/// The record tabs of the terminal view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tab {
    Issues,
    PullRequests,
    Commits,
    Reviews,
    Comments,
    ReviewComments,
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tab::Issues => write!(f, "Issues"),
            Tab::PullRequests => write!(f, "Pull Requests"),
            Tab::Commits => write!(f, "Commits"),
            Tab::Reviews => write!(f, "Code Reviews"),
            Tab::Comments => write!(f, "Comments"),
            Tab::ReviewComments => write!(f, "Review Comments"),
        }
    }
}

/// One page of an in-memory collection.
#[derive(Debug, PartialEq, Eq)]
pub struct PageView<'a, T> {
    /// 1-based, clamped into `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty collection.
    pub total_pages: usize,
    pub items: &'a [T],
}

impl<T> PageView<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice `items` into page `page` of `per_page` entries. Out-of-range pages
/// clamp to the first or last page, so the view is stable as data shrinks.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> PageView<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());

    PageView {
        page,
        total_pages,
        items: &items[start..end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let items: Vec<u32> = (1..=25).collect();
        let view = paginate(&items, 2, 10);
        assert_eq!(view.items, &items[10..20]);
        assert_eq!(view.total_pages, 3);
        assert!(view.has_prev());
        assert!(view.has_next());
    }

    #[test]
    fn test_paginate_last_page_is_short() {
        let items: Vec<u32> = (1..=25).collect();
        let view = paginate(&items, 3, 10);
        assert_eq!(view.items.len(), 5);
        assert!(!view.has_next());
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let items: Vec<u32> = (1..=5).collect();
        assert_eq!(paginate(&items, 0, 2).page, 1);
        assert_eq!(paginate(&items, 99, 2).page, 3);
        assert_eq!(paginate(&items, 99, 2).items, &[5]);
    }

    #[test]
    fn test_paginate_empty() {
        let items: Vec<u32> = Vec::new();
        let view = paginate(&items, 1, 10);
        assert!(view.items.is_empty());
        assert_eq!(view.total_pages, 1);
        assert!(!view.has_prev());
        assert!(!view.has_next());
    }

    #[test]
    fn test_tab_display() {
        assert_eq!(Tab::PullRequests.to_string(), "Pull Requests");
        assert_eq!(Tab::Reviews.to_string(), "Code Reviews");
    }
}
