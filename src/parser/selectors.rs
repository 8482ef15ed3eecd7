//! CSS selectors for the JEP index table
//!
//! The index is a single `table.jeps`. Each data row carries the type and
//! state codes in its first two cells, the release in the third, the
//! component split into `.cl` / `.cr` elements, the number in `.jep` and
//! the title in the last cell.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref TABLE_ROW: Selector = parse_selector!("table.jeps tr");
    static ref CELL: Selector = parse_selector!("td");
    static ref COMPONENT_LEFT: Selector = parse_selector!(".cl");
    static ref COMPONENT_RIGHT: Selector = parse_selector!(".cr");
    static ref NUMBER: Selector = parse_selector!(".jep");
}

/// Selectors used by [`crate::parser::TableParser`]
pub struct TableSelectors {
    pub row: &'static Selector,
    pub cell: &'static Selector,
    /// Component ("left" role)
    pub component: &'static Selector,
    /// Sub-component ("right" role)
    pub sub_component: &'static Selector,
    pub number: &'static Selector,
}

impl TableSelectors {
    pub fn new() -> Self {
        Self {
            row: &TABLE_ROW,
            cell: &CELL,
            component: &COMPONENT_LEFT,
            sub_component: &COMPONENT_RIGHT,
            number: &NUMBER,
        }
    }
}

impl Default for TableSelectors {
    fn default() -> Self {
        Self::new()
    }
}
