//! Register addresses and per-model alias tables

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Register address (e.g. `0A0B`)
///
/// Printable ASCII only. Brackets and parentheses are rejected because the
/// address is spliced into a command template and echoed back inside `(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Validate and wrap an address
    ///
    /// # Examples
    ///
    /// ```
    /// use neva_types::Address;
    ///
    /// let address = Address::new("VOLT").unwrap();
    /// assert_eq!(address.as_bytes(), b"VOLT");
    /// assert!(Address::new("[SOH]").is_err());
    /// ```
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();

        if address.is_empty() {
            return Err(Error::Validation("address must not be empty".into()));
        }

        if let Some(c) = address
            .chars()
            .find(|c| !c.is_ascii_graphic() || matches!(c, '[' | ']' | '(' | ')'))
        {
            return Err(Error::Validation(format!(
                "address {:?} contains forbidden character {:?}",
                address, c
            )));
        }

        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Enumerate the inclusive hexadecimal range between two addresses
    ///
    /// Bounds may be given in either order. Generated addresses are uppercase
    /// and zero-padded to the width of the wider bound. Addresses are built
    /// as the iterator advances.
    pub fn range(first: &Address, last: &Address) -> Result<AddressRange> {
        let parse = |a: &Address| {
            u32::from_str_radix(a.as_str(), 16)
                .map_err(|e| Error::Parse(format!("address {} is not hexadecimal: {}", a, e)))
        };

        let (a, b) = (parse(first)?, parse(last)?);

        Ok(AddressRange {
            numbers: a.min(b)..=a.max(b),
            width: first.0.len().max(last.0.len()),
        })
    }
}

/// Addresses of a hexadecimal range, see [`Address::range`]
#[derive(Debug, Clone)]
pub struct AddressRange {
    numbers: RangeInclusive<u32>,
    width: usize,
}

impl AddressRange {
    fn address(&self, n: u32) -> Address {
        Address(format!("{:0width$X}", n, width = self.width))
    }
}

impl Iterator for AddressRange {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        self.numbers.next().map(|n| self.address(n))
    }

    fn nth(&mut self, n: usize) -> Option<Address> {
        self.numbers.nth(n).map(|n| self.address(n))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.numbers.size_hint()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(value)
            .map_err(|e| Error::Validation(format!("address is not ASCII: {}", e)))?;
        Self::new(text)
    }
}

/// What an alias refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A single register
    Register(Address),

    /// Consecutive registers `first..=last` (hexadecimal numbering)
    Range { first: Address, last: Address },
}

/// Alias table for one meter model
///
/// Alias lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    entries: HashMap<String, Binding>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias` to a single register
    pub fn with_register(mut self, alias: &str, address: Address) -> Self {
        self.entries
            .insert(alias.to_lowercase(), Binding::Register(address));
        self
    }

    /// Bind `alias` to a register range
    pub fn with_range(mut self, alias: &str, first: Address, last: Address) -> Self {
        self.entries
            .insert(alias.to_lowercase(), Binding::Range { first, last });
        self
    }

    pub fn get(&self, alias: &str) -> Option<&Binding> {
        self.entries.get(&alias.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(alias, binding)` pairs; aliases are lowercase
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Address tables keyed by model identifier
///
/// Populated once at program start and handed to the meter session. Tables are
/// shared read-only after registration.
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    tables: HashMap<String, Arc<AddressTable>>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table for `model` (case-insensitive), replacing any previous one
    pub fn register(&mut self, model: &str, table: AddressTable) -> &mut Self {
        self.tables.insert(model.to_lowercase(), Arc::new(table));
        self
    }

    pub fn lookup(&self, model: &str) -> Option<Arc<AddressTable>> {
        self.tables.get(&model.to_lowercase()).cloned()
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
