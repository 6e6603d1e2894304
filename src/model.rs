//! Donation records as handed to the renderer.
//!
//! Field names follow the camelCase JSON shape used by the donation form and
//! dashboard (`donorName`, `paymentMode`, ...). Optional text fields treat an
//! empty string the same as a missing value, since form fields default to `""`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How a donation was made. Decides which optional receipt sections render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Upi,
    Cash,
    Groceries,
}

impl PaymentMode {
    /// Wire name (`UPI`, `CASH`, `GROCERIES`)
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::Cash => "CASH",
            PaymentMode::Groceries => "GROCERIES",
        }
    }

    /// Translation key of the localized label, e.g. `mode_upi`
    pub fn label_key(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "mode_upi",
            PaymentMode::Cash => "mode_cash",
            PaymentMode::Groceries => "mode_groceries",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPI" => Ok(PaymentMode::Upi),
            "CASH" => Ok(PaymentMode::Cash),
            "GROCERIES" => Ok(PaymentMode::Groceries),
            other => Err(Error::InvalidRecord(format!("unknown payment mode '{}'", other))),
        }
    }
}

/// One line of an in-kind grocery donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

impl GroceryItem {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
        }
    }

    /// Quantity column text, `"<quantity> <unit>"`
    pub fn quantity_label(&self) -> String {
        format!("{} {}", self.quantity, self.unit).trim().to_string()
    }
}

/// A single donation, immutable input to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub donor_name: String,
    #[serde(default)]
    pub amount: String,
    pub payment_mode: PaymentMode,
    pub mobile_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr_number: Option<String>,
    #[serde(default)]
    pub grocery_list: Vec<GroceryItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_no: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl DonationRecord {
    /// Start a record with the required fields; optional ones default to absent.
    pub fn new(
        donor_name: impl Into<String>,
        amount: impl Into<String>,
        payment_mode: PaymentMode,
        mobile_number: impl Into<String>,
    ) -> Self {
        Self {
            donor_name: donor_name.into(),
            amount: amount.into(),
            payment_mode,
            mobile_number: mobile_number.into(),
            notes: None,
            address: None,
            utr_number: None,
            grocery_list: Vec::new(),
            created_at: None,
            receipt_no: None,
        }
    }

    /// Parse a record from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidRecord(format!("malformed record: {}", e)))
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_utr(mut self, utr: impl Into<String>) -> Self {
        self.utr_number = Some(utr.into());
        self
    }

    pub fn with_item(mut self, item: GroceryItem) -> Self {
        self.grocery_list.push(item);
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn with_receipt_no(mut self, receipt_no: impl Into<String>) -> Self {
        self.receipt_no = Some(receipt_no.into());
        self
    }

    pub fn notes(&self) -> Option<&str> {
        present(&self.notes)
    }

    pub fn address(&self) -> Option<&str> {
        present(&self.address)
    }

    pub fn utr_number(&self) -> Option<&str> {
        present(&self.utr_number)
    }

    pub fn created_at(&self) -> Option<&str> {
        present(&self.created_at)
    }

    pub fn receipt_no(&self) -> Option<&str> {
        present(&self.receipt_no)
    }

    /// Whether the amount block is shown (every mode except groceries)
    pub fn shows_amount(&self) -> bool {
        self.payment_mode != PaymentMode::Groceries
    }

    /// Whether the grocery items table is shown
    pub fn shows_items(&self) -> bool {
        self.payment_mode == PaymentMode::Groceries && !self.grocery_list.is_empty()
    }

    /// The UTR value when the UTR row is shown
    pub fn shown_utr(&self) -> Option<&str> {
        if self.payment_mode == PaymentMode::Upi {
            self.utr_number()
        } else {
            None
        }
    }

    /// Checks the renderer needs to draw a receipt at all.
    pub fn check_renderable(&self) -> Result<()> {
        if self.donor_name.trim().is_empty() {
            return Err(Error::InvalidRecord("donor name is required".into()));
        }
        if self.mobile_number.trim().is_empty() {
            return Err(Error::InvalidRecord("mobile number is required".into()));
        }
        if self.shows_amount() && self.amount.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "amount is required for {} donations",
                self.payment_mode
            )));
        }
        Ok(())
    }

    /// Full form validation performed by callers before saving a donation.
    pub fn validate(&self) -> Result<()> {
        self.check_renderable()?;
        if self.payment_mode == PaymentMode::Groceries && self.grocery_list.is_empty() {
            return Err(Error::InvalidRecord("add at least one grocery item".into()));
        }
        if let Some(item) = self
            .grocery_list
            .iter()
            .find(|i| i.name.trim().is_empty() || i.quantity.trim().is_empty())
        {
            return Err(Error::InvalidRecord(format!(
                "grocery item needs both a name and a quantity: {:?}",
                item
            )));
        }
        if self.payment_mode == PaymentMode::Upi && self.utr_number().is_none() {
            return Err(Error::InvalidRecord("UTR number is required for UPI payments".into()));
        }
        Ok(())
    }
}
