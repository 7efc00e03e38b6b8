//! Portal page layout
//!
//! Selectors and texts that tie the agent to the SmartFind pages. They are
//! plain data so a portal redesign only touches this file.

use smartfind_core::domain::JobListing;

use crate::browser::Locator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSelectors {
    pub user_field: String,
    pub pin_field: String,
    pub available_tab: String,
    pub active_tab: String,
    /// Rows of the available-jobs table
    pub job_rows: String,
    /// Rows of the committed-assignments table
    pub assignment_rows: String,
    pub accept_css: String,
    pub accept_text: String,
    pub confirm_css: String,
    pub confirm_text: String,
    pub banner_css: String,
    /// Text of the banner shown when another party won the job
    pub banner_text: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            user_field: "#userId".to_string(),
            pin_field: "#userPin".to_string(),
            available_tab: "#available-tab-link".to_string(),
            active_tab: "#active-tab-link".to_string(),
            job_rows: "#available-panel table tbody tr".to_string(),
            assignment_rows: "#active-panel table tbody tr".to_string(),
            accept_css: "button, a, input[type='button']".to_string(),
            accept_text: "Accept".to_string(),
            confirm_css: "[role='dialog'] button, .modal button, .ui-dialog button".to_string(),
            confirm_text: "Yes".to_string(),
            banner_css: "[role='alert'], .alert, .error, .message".to_string(),
            banner_text: "no longer available".to_string(),
        }
    }
}

impl PortalSelectors {
    pub fn user_field(&self) -> Locator {
        Locator::css(&self.user_field)
    }

    pub fn pin_field(&self) -> Locator {
        Locator::css(&self.pin_field)
    }

    pub fn available_tab(&self) -> Locator {
        Locator::css(&self.available_tab)
    }

    pub fn active_tab(&self) -> Locator {
        Locator::css(&self.active_tab)
    }

    pub fn body(&self) -> Locator {
        Locator::css("body")
    }

    /// The board row carrying `listing`
    ///
    /// Every word the row was parsed from must be present, so two openings
    /// that share a date and a school still resolve to different rows.
    pub fn row_of(&self, listing: &JobListing) -> Locator {
        Locator::text(&self.job_rows, row_needles(listing))
    }

    /// The accept control inside the listing's row
    pub fn accept_in(&self, listing: &JobListing) -> Locator {
        self.row_of(listing)
            .within(&self.accept_css, [self.accept_text.as_str()])
    }

    pub fn confirm(&self) -> Locator {
        Locator::text(&self.confirm_css, [self.confirm_text.as_str()])
    }

    pub fn blocked_banner(&self) -> Locator {
        Locator::text(&self.banner_css, [self.banner_text.as_str()])
    }
}

fn row_needles(listing: &JobListing) -> Vec<String> {
    let mut needles: Vec<String> = Vec::new();
    for word in listing.raw_text.split_whitespace() {
        if !needles.iter().any(|n| n == word) {
            needles.push(word.to_string());
        }
    }
    needles
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfind_core::parser::parse_row;

    #[test]
    fn test_row_locator_uses_every_word_of_the_row() {
        let selectors = PortalSelectors::default();
        let listing = parse_row("Tuesday 3/10/2026 8:00 AM 3:30 PM Kennedy High")
            .into_listing()
            .unwrap();

        assert_eq!(
            selectors.row_of(&listing),
            Locator::text(
                selectors.job_rows.clone(),
                ["Tuesday", "3/10/2026", "8:00", "AM", "3:30", "PM", "Kennedy", "High"]
            )
        );

        let Locator::Within { scope, contains, .. } = selectors.accept_in(&listing) else {
            panic!("accept locator must be scoped to its row");
        };
        assert_eq!(*scope, selectors.row_of(&listing));
        assert_eq!(contains, vec!["Accept".to_string()]);
    }

    #[test]
    fn test_same_date_and_school_rows_do_not_share_a_locator() {
        let selectors = PortalSelectors::default();
        let math = parse_row("03/10/2026 8:00 AM 3:30 PM Math El Cerrito High")
            .into_listing()
            .unwrap();
        let science = parse_row("03/10/2026 9:00 AM 3:00 PM Science El Cerrito High")
            .into_listing()
            .unwrap();

        let Locator::Text { contains, .. } = selectors.row_of(&math) else {
            panic!("row locator must match on text");
        };
        assert!(contains.iter().any(|word| !science.raw_text.contains(word.as_str())));
    }
}
