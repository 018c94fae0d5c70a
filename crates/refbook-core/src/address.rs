//! A1-notation cell addresses and ranges
//!
//! Sheets in this crate index rows and columns from zero; the spreadsheet
//! container addresses them as `B4` or `$A$1`. These types are the bridge
//! between the two and back the validation-range math in [`crate::Sheet`].

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// A single cell address (e.g. `B4`, `$A$1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u16,
    /// Render with `$` locks on both coordinates
    pub absolute: bool,
}

impl CellAddress {
    /// Relative address from 0-based indices
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            absolute: false,
        }
    }

    /// Absolute (`$A$1` style) address from 0-based indices
    pub fn absolute(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            absolute: true,
        }
    }

    /// Build an address from sheet-model indices, checking the worksheet bounds
    pub fn from_indices(row: usize, col: usize, absolute: bool) -> Result<Self> {
        let row = u32::try_from(row)
            .ok()
            .filter(|r| *r < MAX_ROWS)
            .ok_or_else(|| Error::Address(format!("row index {} out of bounds", row)))?;
        let col = u16::try_from(col)
            .ok()
            .filter(|c| *c < MAX_COLS)
            .ok_or_else(|| Error::Address(format!("column index {} out of bounds", col)))?;
        Ok(Self { row, col, absolute })
    }

    /// Parse an A1-style address; `$` markers set [`CellAddress::absolute`]
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let absolute = s.contains('$');
        let cleaned: String = s.chars().filter(|c| *c != '$').collect();

        let split = cleaned
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| Error::Address(format!("no row number in '{}'", s)))?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() {
            return Err(Error::Address(format!("no column letters in '{}'", s)));
        }

        let col = Self::letters_to_column(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| Error::Address(format!("invalid row number in '{}'", s)))?;
        if row == 0 || row > MAX_ROWS {
            return Err(Error::Address(format!("row number out of range in '{}'", s)));
        }

        Ok(Self {
            row: row - 1,
            col,
            absolute,
        })
    }

    /// Convert a column index to letters (0 = A, 25 = Z, 26 = AA)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1;

        while n > 0 {
            n -= 1;
            result.insert(0, ((n % 26) as u8 + b'A') as char);
            n /= 26;
        }

        result
    }

    /// Convert column letters to an index (A = 0, AA = 26)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::Address("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::Address(format!("invalid column letter '{}'", c)));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COLS as u32 {
                return Err(Error::Address(format!("column '{}' out of range", letters)));
            }
        }

        Ok((col - 1) as u16)
    }

    /// Format as an A1-style string
    pub fn to_a1_string(&self) -> String {
        let letters = Self::column_to_letters(self.col);
        if self.absolute {
            format!("${}${}", letters, self.row + 1)
        } else {
            format!("{}{}", letters, self.row + 1)
        }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range between two addresses (e.g. `B4:B9999`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self { start, end }
    }

    /// A single-column range over 0-based rows `first..=last`
    pub fn column(col: usize, first: usize, last: usize, absolute: bool) -> Result<Self> {
        Ok(Self {
            start: CellAddress::from_indices(first, col, absolute)?,
            end: CellAddress::from_indices(last, col, absolute)?,
        })
    }

    /// Format as `A1:B2`
    pub fn to_a1_string(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}
