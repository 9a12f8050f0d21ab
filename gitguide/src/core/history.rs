//! Windowed presentation of commit history for the branch flow.
//!
//! History can be thousands of entries; the user sees one page at a time
//! with previous/next sentinels. Index mapping back to the full list lives
//! here so the flow code stays a thin loop.

/// Entries shown per page.
pub const PAGE_SIZE: usize = 10;

const HEAD_LABEL: &str = "HEAD";
const PREVIOUS_LABEL: &str = "<<< PREVIOUS <<<";
const NEXT_LABEL: &str = ">>> NEXT >>>";

/// One page of history options as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Display order: a head/previous sentinel, the window entries, and a
    /// next sentinel when more history follows.
    pub options: Vec<String>,
    start: usize,
    window_len: usize,
    has_prev: bool,
    has_next: bool,
}

/// What a numeric choice on a page means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// The newest commit (only offered on the first page).
    Head,
    /// Scroll one page back toward newer commits.
    Previous,
    /// Scroll one page forward toward older commits.
    Next,
    /// A concrete entry, indexed into the full history list.
    Entry(usize),
}

/// Build the page starting at `start` over `entries`.
pub fn page(entries: &[String], start: usize, size: usize) -> Page {
    let end = (start + size).min(entries.len());
    let has_prev = start != 0;
    let has_next = end < entries.len();
    let mut options = Vec::with_capacity(end - start + 2);
    options.push(if has_prev {
        PREVIOUS_LABEL.to_string()
    } else {
        HEAD_LABEL.to_string()
    });
    options.extend(entries[start..end].iter().cloned());
    if has_next {
        options.push(NEXT_LABEL.to_string());
    }
    Page {
        options,
        start,
        window_len: end - start,
        has_prev,
        has_next,
    }
}

impl Page {
    /// Map a choice index on this page back to its meaning. `None` means
    /// the index is outside the options shown, which a list prompt cannot
    /// produce.
    pub fn selection(&self, choice: usize) -> Option<PageSelection> {
        if choice == 0 {
            return Some(if self.has_prev {
                PageSelection::Previous
            } else {
                PageSelection::Head
            });
        }
        let index = choice - 1;
        if index < self.window_len {
            return Some(PageSelection::Entry(self.start + index));
        }
        if self.has_next && index == self.window_len {
            return Some(PageSelection::Next);
        }
        None
    }

    /// Start index for the previous page.
    pub fn prev_start(&self, size: usize) -> usize {
        self.start.saturating_sub(size)
    }

    /// Start index for the next page.
    pub fn next_start(&self) -> usize {
        self.start + self.window_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("commit {i}")).collect()
    }

    #[test]
    fn first_page_offers_head_not_previous() {
        let all = entries(25);
        let page = page(&all, 0, PAGE_SIZE);
        assert_eq!(page.options[0], "HEAD");
        assert_eq!(page.options.len(), 12, "head + 10 entries + next");
        assert_eq!(page.options.last().map(String::as_str), Some(">>> NEXT >>>"));
        assert_eq!(page.selection(0), Some(PageSelection::Head));
        assert_eq!(page.selection(1), Some(PageSelection::Entry(0)));
        assert_eq!(page.selection(11), Some(PageSelection::Next));
    }

    #[test]
    fn middle_page_offers_both_directions() {
        let all = entries(25);
        let page = page(&all, 10, PAGE_SIZE);
        assert_eq!(page.options[0], "<<< PREVIOUS <<<");
        assert_eq!(page.selection(0), Some(PageSelection::Previous));
        assert_eq!(page.selection(1), Some(PageSelection::Entry(10)));
        assert_eq!(page.selection(11), Some(PageSelection::Next));
        assert_eq!(page.prev_start(PAGE_SIZE), 0);
        assert_eq!(page.next_start(), 20);
    }

    #[test]
    fn last_page_has_no_next() {
        let all = entries(25);
        let page = page(&all, 20, PAGE_SIZE);
        assert_eq!(page.options.len(), 6, "previous + 5 entries");
        assert_eq!(page.selection(5), Some(PageSelection::Entry(24)));
        assert_eq!(page.selection(6), None);
    }

    #[test]
    fn short_history_fits_one_page() {
        let all = entries(3);
        let page = page(&all, 0, PAGE_SIZE);
        assert_eq!(page.options.len(), 4, "head + 3 entries");
        assert_eq!(page.selection(3), Some(PageSelection::Entry(2)));
        assert_eq!(page.selection(4), None);
    }
}
