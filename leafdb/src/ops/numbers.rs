//! Numeric helpers.

use super::number_value;
use crate::cursor::Cursor;
use crate::error::Result;

impl Cursor {
    /// Increase the addressed number by one.
    pub fn inc(&self) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_number("inc")?;
            self.set_direct(&[], &number_value(value + 1.0)?)
        })
    }

    /// Decrease the addressed number by one.
    pub fn dec(&self) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_number("dec")?;
            self.set_direct(&[], &number_value(value - 1.0)?)
        })
    }

    pub fn add(&self, amount: f64) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_number("add")?;
            self.set_direct(&[], &number_value(value + amount)?)
        })
    }

    pub fn sub(&self, amount: f64) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_number("sub")?;
            self.set_direct(&[], &number_value(value - amount)?)
        })
    }

    /// Clamp the addressed number into `[min, max]`.
    pub fn clamp_value(&self, min: f64, max: f64) -> Result<Cursor> {
        self.queue().submit(|| {
            let value = self.require_number("clamp")?;
            self.set_direct(&[], &number_value(value.clamp(min, max))?)
        })
    }
}
