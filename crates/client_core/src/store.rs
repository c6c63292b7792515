//! In-memory UI state for the expense list.

use shared::domain::{Amount, ExpenseId, ExpenseRecord, UserIdentity, DEFAULT_CATEGORIES};
use tracing::warn;

use crate::requests::RequestTracker;

/// Read-only snapshot handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseView {
    pub records: Vec<ExpenseRecord>,
    pub categories: Vec<String>,
    pub selected: Option<ExpenseId>,
    pub error_banner: Option<String>,
    pub loading: bool,
}

#[derive(Debug)]
pub struct ExpenseStore {
    owner: UserIdentity,
    records: Vec<ExpenseRecord>,
    categories: Vec<String>,
    selected: Option<ExpenseId>,
    error_banner: Option<String>,
    mounted: bool,
    pub(crate) requests: RequestTracker,
}

impl ExpenseStore {
    pub fn new(owner: UserIdentity) -> Self {
        Self {
            owner,
            records: Vec::new(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            selected: None,
            error_banner: None,
            mounted: false,
            requests: RequestTracker::default(),
        }
    }

    pub fn owner(&self) -> &UserIdentity {
        &self.owner
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    pub fn is_loading(&self) -> bool {
        !self.requests.is_idle()
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn selected(&self) -> Option<&ExpenseId> {
        self.selected.as_ref()
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    /// Stamps ownerless records with the current identity and refuses
    /// records that belong to somebody else.
    fn claim(&self, mut record: ExpenseRecord) -> Option<ExpenseRecord> {
        match &record.owner_id {
            None => {
                record.owner_id = Some(self.owner.clone());
                Some(record)
            }
            Some(owner) if *owner == self.owner => Some(record),
            Some(owner) => {
                warn!(
                    expense_id = %record.id,
                    owner = %owner,
                    expected = %self.owner,
                    "dropping expense owned by another user"
                );
                None
            }
        }
    }

    /// Replaces the list after a full fetch. A selection that no longer
    /// matches any record is cleared.
    pub fn replace_records(&mut self, records: Vec<ExpenseRecord>) {
        let claimed: Vec<ExpenseRecord> = records
            .into_iter()
            .filter_map(|record| self.claim(record))
            .collect();
        self.records = claimed;
        if let Some(selected) = &self.selected {
            if !self.records.iter().any(|record| &record.id == selected) {
                self.selected = None;
            }
        }
    }

    pub fn append_record(&mut self, record: ExpenseRecord) -> Option<&ExpenseRecord> {
        let record = self.claim(record)?;
        self.records.push(record);
        self.records.last()
    }

    pub fn set_amount(&mut self, id: &ExpenseId, amount: Amount) -> bool {
        match self.records.iter_mut().find(|record| &record.id == id) {
            Some(record) => {
                record.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Removes the record and clears the selection when it pointed at it.
    pub fn remove_record(&mut self, id: &ExpenseId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.records.len() != before
    }

    pub fn select(&mut self, id: Option<ExpenseId>) {
        self.selected = id;
    }

    /// Appends a category unless it is blank or already known.
    pub fn add_category(&mut self, category: &str) -> bool {
        if category.trim().is_empty() || self.categories.iter().any(|known| known == category) {
            return false;
        }
        self.categories.push(category.to_string());
        true
    }

    pub fn set_error_banner(&mut self, message: impl Into<String>) {
        self.error_banner = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error_banner = None;
    }

    pub fn view(&self) -> ExpenseView {
        ExpenseView {
            records: self.records.clone(),
            categories: self.categories.clone(),
            selected: self.selected.clone(),
            error_banner: self.error_banner.clone(),
            loading: self.is_loading(),
        }
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
