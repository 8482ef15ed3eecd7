//! JEP index table parser
//!
//! Turns the `table.jeps` markup into [`Entry`] values. Rows are handled one
//! at a time and a malformed row never affects the others: it is logged and
//! dropped.

use scraper::{ElementRef, Html, Selector};

use crate::models::{Entry, EntryKind, EntryState};
use crate::parser::sanitize::{clean_cell_text, component_or_none, value_or_none};
use crate::parser::selectors::TableSelectors;
use crate::utils::error::RowError;
use crate::utils::truncate_text;

/// Minimum number of cells for a data row
pub const MIN_CELLS: usize = 5;

/// Parser for the JEP index table
pub struct TableParser {
    selectors: TableSelectors,
}

impl TableParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: TableSelectors::new(),
        }
    }

    /// Parse raw HTML into entries
    pub fn parse_html(&self, html: &str) -> Vec<Entry> {
        let document = Html::parse_document(html);
        self.parse_document(&document)
    }

    /// Parse every row of the index, in document order
    ///
    /// Rows with fewer than [`MIN_CELLS`] cells are structural and skipped
    /// quietly. Rows with an unknown type or state code are skipped with a
    /// warning.
    pub fn parse_document(&self, document: &Html) -> Vec<Entry> {
        let mut entries = Vec::new();
        let mut rejected = 0usize;

        for row in document.select(self.selectors.row) {
            match self.parse_row(&row) {
                Ok(entry) => {
                    tracing::trace!(number = ?entry.number, state = %entry.state, "Parsed row");
                    entries.push(entry);
                }
                Err(e) if e.is_structural() => {
                    tracing::trace!(error = %e, "Skipping structural row");
                }
                Err(e) => {
                    rejected += 1;
                    tracing::warn!(
                        error = %e,
                        row = %truncate_text(&clean_cell_text(&row.text().collect::<String>()), 120),
                        "Failed to parse JEP row"
                    );
                }
            }
        }

        tracing::debug!(entries = entries.len(), rejected, "Parsed JEP index");
        entries
    }

    /// Parse a single `tr` element
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] describing why the row has no entry.
    pub fn parse_row(&self, row: &ElementRef<'_>) -> Result<Entry, RowError> {
        let cells: Vec<ElementRef<'_>> = row.select(self.selectors.cell).collect();
        if cells.len() < MIN_CELLS {
            return Err(RowError::TooFewCells(cells.len()));
        }

        let kind_code = element_text(&cells[0]);
        let kind =
            EntryKind::from_short_code(&kind_code).ok_or(RowError::UnknownKind(kind_code))?;

        let state_code = element_text(&cells[1]);
        let state =
            EntryState::from_short_code(&state_code).ok_or(RowError::UnknownState(state_code))?;

        let release = value_or_none(&element_text(&cells[2]));
        let component = component_or_none(&self.select_text(row, self.selectors.component));
        let sub_component =
            component_or_none(&self.select_text(row, self.selectors.sub_component));
        let number = value_or_none(&self.select_text(row, self.selectors.number));
        let title = cells
            .last()
            .and_then(|cell| value_or_none(&element_text(cell)));

        Ok(Entry {
            kind,
            state,
            release,
            component,
            sub_component,
            number,
            title,
        })
    }

    /// Joined text of every element in the row matching `selector`
    fn select_text(&self, row: &ElementRef<'_>, selector: &Selector) -> String {
        row.select(selector)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    clean_cell_text(&element.text().collect::<String>())
}
