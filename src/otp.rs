//! One-time-password entry: a row of single-digit cells with a focus cursor

use crate::constants::OTP_LENGTH;
use crate::validation::ValidationError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OtpInput {
    cells: [Option<u8>; OTP_LENGTH],
    focus: usize,
}

impl OtpInput {
    /// Types one key into the focused cell.
    ///
    /// Only a single ASCII digit is accepted. Focus moves to the next cell
    /// after a digit lands, and stays on the last cell once reached.
    pub fn input(&mut self, key: char) -> bool {
        let Some(digit) = key.to_digit(10) else {
            return false;
        };
        self.cells[self.focus] = Some(digit as u8);
        if self.focus + 1 < OTP_LENGTH {
            self.focus += 1;
        }
        true
    }

    /// Clears the focused cell, or steps back and clears the previous one
    /// when the focused cell is already empty.
    pub fn backspace(&mut self) {
        if self.cells[self.focus].is_some() {
            self.cells[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
            self.cells[self.focus] = None;
        }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// The entered code, available only once every cell holds a digit
    pub fn code(&self) -> Result<String, ValidationError> {
        if !self.is_complete() {
            return Err(ValidationError::IncompleteOtp);
        }
        Ok(self
            .cells
            .iter()
            .flatten()
            .map(|d| char::from(b'0' + d))
            .collect())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Masked rendering, e.g. `1 2 _ _ _ _`
    pub fn display(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.map(|d| d.to_string()).unwrap_or_else(|| "_".to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
