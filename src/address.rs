use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Last column of an xlsx sheet (XFD).
pub const MAX_COLUMN: u32 = 16_384;
/// Last row of an xlsx sheet.
pub const MAX_ROW: u32 = 1_048_576;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("malformed reference: {0:?}")]
    Malformed(String),
    #[error("reference {0:?} is outside the sheet bounds")]
    OutOfBounds(String),
    #[error("area {start}:{end} has its start after its end")]
    InvertedArea { start: CellRef, end: CellRef },
}

pub fn column_name(mut column: u32) -> String {
    // 1 -> A, 26 -> Z, 27 -> AA ...
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn column_index(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index)
}

/// A single cell, 1-based on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    // row first so the derived ordering is row-major
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Result<Self, AddressError> {
        let cell = CellRef { row, col };
        if !(1..=MAX_COLUMN).contains(&col) || !(1..=MAX_ROW).contains(&row) {
            return Err(AddressError::OutOfBounds(format!(
                "{}{}",
                column_name(col),
                row
            )));
        }
        Ok(cell)
    }

    /// Parses `B2`, `$B$2` or any mix of anchors.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let malformed = || AddressError::Malformed(text.to_string());
        let rest = text.strip_prefix('$').unwrap_or(text);
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(malformed)?;
        let (letters, digits) = rest.split_at(split);
        let digits = digits.strip_prefix('$').unwrap_or(digits);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let col = column_index(letters).ok_or_else(malformed)?;
        let row = digits
            .parse::<u32>()
            .map_err(|_| AddressError::OutOfBounds(text.to_string()))?;
        CellRef::new(col, row).map_err(|_| AddressError::OutOfBounds(text.to_string()))
    }

    pub fn column_name(&self) -> String {
        column_name(self.col)
    }

    /// `$A$2`
    pub fn absolute(&self) -> String {
        format!("${}${}", self.column_name(), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column_name(), self.row)
    }
}

/// A rectangular block of cells; `start` is the upper-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Area {
    start: CellRef,
    end: CellRef,
}

impl Area {
    pub fn new(start: CellRef, end: CellRef) -> Result<Self, AddressError> {
        if start.col > end.col || start.row > end.row {
            return Err(AddressError::InvertedArea { start, end });
        }
        Ok(Area { start, end })
    }

    /// Parses `A5:C10`, anchors allowed.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let (start, end) = text
            .split_once(':')
            .ok_or_else(|| AddressError::Malformed(text.to_string()))?;
        Area::new(CellRef::parse(start)?, CellRef::parse(end)?)
    }

    pub fn start(&self) -> CellRef {
        self.start
    }

    pub fn end(&self) -> CellRef {
        self.end
    }

    /// Inclusive row bounds.
    pub fn rows(&self) -> (u32, u32) {
        (self.start.row, self.end.row)
    }

    /// Inclusive column bounds.
    pub fn columns(&self) -> (u32, u32) {
        (self.start.col, self.end.col)
    }

    pub fn absolute(&self) -> String {
        format!("{}:{}", self.start.absolute(), self.end.absolute())
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Cell(CellRef),
    Area(Area),
}

impl Target {
    pub fn absolute(&self) -> String {
        match self {
            Target::Cell(cell) => cell.absolute(),
            Target::Area(area) => area.absolute(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Cell(cell) => cell.fmt(f),
            Target::Area(area) => area.fmt(f),
        }
    }
}

impl From<CellRef> for Target {
    fn from(cell: CellRef) -> Self {
        Target::Cell(cell)
    }
}

impl From<Area> for Target {
    fn from(area: Area) -> Self {
        Target::Area(area)
    }
}

// sheet name (quoted or bare), then one cell or a cell:cell area
static REFERS_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=?\$?(?:'((?:[^']|'')+)'|([^'!:\s]+))!(\$?[A-Za-z]+\$?\d+)(?::(\$?[A-Za-z]+\$?\d+))?$")
        .expect("valid regex")
});

/// A reference qualified by its sheet, as stored in a workbook's defined names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetTarget {
    pub sheet: String,
    pub target: Target,
}

impl SheetTarget {
    pub fn new(sheet: impl Into<String>, target: impl Into<Target>) -> Self {
        SheetTarget {
            sheet: sheet.into(),
            target: target.into(),
        }
    }

    /// Absolute refers-to text, e.g. `Sheet1!$A$5:$C$10` or `'My Sheet'!$B$2`.
    pub fn formula(&self) -> String {
        format!("{}!{}", quote_sheet_name(&self.sheet), self.target.absolute())
    }

    /// Accepts `Sheet1!$A$2`, `'My Sheet'!B2`, `=Sheet1!$A$5:$C$10` and the
    /// `$'Sheet1'!...` form some producers write.
    pub fn parse(formula: &str) -> Result<Self, AddressError> {
        let caps = REFERS_TO
            .captures(formula.trim())
            .ok_or_else(|| AddressError::Malformed(formula.to_string()))?;
        let sheet = match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => quoted.as_str().replace("''", "'"),
            (None, Some(bare)) => bare.as_str().to_string(),
            (None, None) => return Err(AddressError::Malformed(formula.to_string())),
        };
        let start = CellRef::parse(&caps[3])?;
        let target = match caps.get(4) {
            Some(end) => Target::Area(Area::new(start, CellRef::parse(end.as_str())?)?),
            None => Target::Cell(start),
        };
        Ok(SheetTarget { sheet, target })
    }
}

impl fmt::Display for SheetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula())
    }
}

fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_roll_over() {
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(MAX_COLUMN), "XFD");
        assert_eq!(column_index("xfd"), Some(MAX_COLUMN));
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn parses_cells_with_and_without_anchors() {
        let b2 = CellRef::new(2, 2).unwrap();
        assert_eq!(CellRef::parse("B2").unwrap(), b2);
        assert_eq!(CellRef::parse("$B$2").unwrap(), b2);
        assert_eq!(CellRef::parse("B$2").unwrap(), b2);
        assert_eq!(b2.absolute(), "$B$2");
        assert_eq!(b2.to_string(), "B2");
    }

    #[test]
    fn rejects_bad_cells() {
        assert!(matches!(CellRef::parse("2B"), Err(AddressError::Malformed(_))));
        assert!(matches!(CellRef::parse("B"), Err(AddressError::Malformed(_))));
        assert!(matches!(CellRef::parse("B0"), Err(AddressError::OutOfBounds(_))));
        assert!(matches!(
            CellRef::parse("XFE1"),
            Err(AddressError::OutOfBounds(_))
        ));
        assert!(matches!(
            CellRef::parse("A1048577"),
            Err(AddressError::OutOfBounds(_))
        ));
    }

    #[test]
    fn area_bounds_must_be_ordered() {
        let area = Area::parse("A5:C10").unwrap();
        assert_eq!(area.rows(), (5, 10));
        assert_eq!(area.columns(), (1, 3));
        assert_eq!(area.absolute(), "$A$5:$C$10");
        assert!(matches!(
            Area::parse("C10:A5"),
            Err(AddressError::InvertedArea { .. })
        ));
        assert!(matches!(
            Area::parse("C5:A10"),
            Err(AddressError::InvertedArea { .. })
        ));
    }

    #[test]
    fn formula_quotes_only_when_needed() {
        let target = SheetTarget::new("Sheet1", CellRef::parse("A2").unwrap());
        assert_eq!(target.formula(), "Sheet1!$A$2");

        let spaced = SheetTarget::new("My Sheet", Area::parse("A5:C10").unwrap());
        assert_eq!(spaced.formula(), "'My Sheet'!$A$5:$C$10");

        let apostrophe = SheetTarget::new("Bob's", CellRef::parse("B2").unwrap());
        assert_eq!(apostrophe.formula(), "'Bob''s'!$B$2");
    }

    #[test]
    fn parses_refers_to_formulas() {
        for text in [
            "Sheet1!$A$5:$C$10",
            "'Sheet1'!$A$5:$C$10",
            "$'Sheet1'!$A$5:$C$10",
            "=Sheet1!A5:C10",
        ] {
            let parsed = SheetTarget::parse(text).unwrap();
            assert_eq!(parsed.sheet, "Sheet1", "{text}");
            assert_eq!(parsed.target, Target::Area(Area::parse("A5:C10").unwrap()));
        }

        let quoted = SheetTarget::parse("'Bob''s'!$B$2").unwrap();
        assert_eq!(quoted.sheet, "Bob's");
        assert_eq!(quoted.target, Target::Cell(CellRef::parse("B2").unwrap()));
    }

    #[test]
    fn rejects_unqualified_formulas() {
        assert!(SheetTarget::parse("$A$2").is_err());
        assert!(SheetTarget::parse("Sheet1!").is_err());
        assert!(SheetTarget::parse("Sheet1!$C$10:$A$5").is_err());
    }
}
