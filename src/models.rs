//! Record types produced by the extractors
//!
//! `SearchResult` is one candidate from a search page. `DetailFields` is the
//! field map scraped from a detail page; it is also the payload persisted by
//! the result cache.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The fixed set of fields a detail page can yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    TaxCode,
    TaxAddress,
    Address,
    Representative,
    Phone,
    Status,
    OperationDate,
    ManagedBy,
    BusinessType,
    MainBusiness,
    OtherBusinesses,
}

impl FieldName {
    pub const ALL: [FieldName; 11] = [
        FieldName::TaxCode,
        FieldName::TaxAddress,
        FieldName::Address,
        FieldName::Representative,
        FieldName::Phone,
        FieldName::Status,
        FieldName::OperationDate,
        FieldName::ManagedBy,
        FieldName::BusinessType,
        FieldName::MainBusiness,
        FieldName::OtherBusinesses,
    ];

    /// Key used in the persisted JSON form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::TaxCode => "tax_code",
            FieldName::TaxAddress => "tax_address",
            FieldName::Address => "address",
            FieldName::Representative => "representative",
            FieldName::Phone => "phone",
            FieldName::Status => "status",
            FieldName::OperationDate => "operation_date",
            FieldName::ManagedBy => "managed_by",
            FieldName::BusinessType => "business_type",
            FieldName::MainBusiness => "main_business",
            FieldName::OtherBusinesses => "other_businesses",
        }
    }

    /// Label shown to users, matching the portal's own wording
    #[must_use]
    pub fn display_label(self) -> &'static str {
        match self {
            FieldName::TaxCode => "Mã số thuế",
            FieldName::TaxAddress => "Địa chỉ Thuế",
            FieldName::Address => "Địa chỉ",
            FieldName::Representative => "Người đại diện",
            FieldName::Phone => "Điện thoại",
            FieldName::Status => "Tình trạng",
            FieldName::OperationDate => "Ngày hoạt động",
            FieldName::ManagedBy => "Quản lý bởi",
            FieldName::BusinessType => "Loại hình DN",
            FieldName::MainBusiness => "Ngành nghề chính",
            FieldName::OtherBusinesses => "Ngành nghề khác",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields scraped from a detail page.
///
/// Every setter goes through [`DetailFields::set_if_empty`]: the first
/// non-empty value written to a field wins and later writers are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tax_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tax_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    representative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    managed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    business_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    main_business: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_list"
    )]
    other_businesses: Vec<String>,
}

impl DetailFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, field: FieldName) -> Option<&Option<String>> {
        match field {
            FieldName::TaxCode => Some(&self.tax_code),
            FieldName::TaxAddress => Some(&self.tax_address),
            FieldName::Address => Some(&self.address),
            FieldName::Representative => Some(&self.representative),
            FieldName::Phone => Some(&self.phone),
            FieldName::Status => Some(&self.status),
            FieldName::OperationDate => Some(&self.operation_date),
            FieldName::ManagedBy => Some(&self.managed_by),
            FieldName::BusinessType => Some(&self.business_type),
            FieldName::MainBusiness => Some(&self.main_business),
            FieldName::OtherBusinesses => None,
        }
    }

    fn slot_mut(&mut self, field: FieldName) -> Option<&mut Option<String>> {
        match field {
            FieldName::TaxCode => Some(&mut self.tax_code),
            FieldName::TaxAddress => Some(&mut self.tax_address),
            FieldName::Address => Some(&mut self.address),
            FieldName::Representative => Some(&mut self.representative),
            FieldName::Phone => Some(&mut self.phone),
            FieldName::Status => Some(&mut self.status),
            FieldName::OperationDate => Some(&mut self.operation_date),
            FieldName::ManagedBy => Some(&mut self.managed_by),
            FieldName::BusinessType => Some(&mut self.business_type),
            FieldName::MainBusiness => Some(&mut self.main_business),
            FieldName::OtherBusinesses => None,
        }
    }

    /// Value of a scalar field. `OtherBusinesses` is read via
    /// [`DetailFields::other_businesses`].
    #[must_use]
    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.slot(field).and_then(|v| v.as_deref())
    }

    #[must_use]
    pub fn is_set(&self, field: FieldName) -> bool {
        match field {
            FieldName::OtherBusinesses => !self.other_businesses.is_empty(),
            _ => self.get(field).is_some(),
        }
    }

    /// Write `value` unless the field already holds a value.
    ///
    /// The value is trimmed; blank values are ignored. For `OtherBusinesses`
    /// the value becomes the single list entry. Returns whether the write
    /// happened.
    pub fn set_if_empty(&mut self, field: FieldName, value: impl Into<String>) -> bool {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() || self.is_set(field) {
            return false;
        }
        match self.slot_mut(field) {
            Some(slot) => *slot = Some(value.to_string()),
            None => self.other_businesses.push(value.to_string()),
        }
        true
    }

    /// List counterpart of [`DetailFields::set_if_empty`]
    pub fn set_other_businesses_if_empty(&mut self, entries: Vec<String>) -> bool {
        let entries: Vec<String> = entries
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if entries.is_empty() || !self.other_businesses.is_empty() {
            return false;
        }
        self.other_businesses = entries;
        true
    }

    #[must_use]
    pub fn tax_code(&self) -> Option<&str> {
        self.tax_code.as_deref()
    }

    #[must_use]
    pub fn tax_address(&self) -> Option<&str> {
        self.tax_address.as_deref()
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn representative(&self) -> Option<&str> {
        self.representative.as_deref()
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    #[must_use]
    pub fn other_businesses(&self) -> &[String] {
        &self.other_businesses
    }

    /// True when no field holds a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !FieldName::ALL.iter().any(|f| self.is_set(*f))
    }

    #[must_use]
    pub fn populated_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|f| self.is_set(*f))
            .collect()
    }

    /// Human-readable multi-line rendering for terminals
    #[must_use]
    pub fn to_display_string(&self) -> String {
        let lines = display_lines(|field| self.get(field), &self.other_businesses);
        if lines.is_empty() {
            "Không có thông tin chi tiết".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// `label: value` lines in `FieldName::ALL` order, other businesses last
fn display_lines<'a>(
    value: impl Fn(FieldName) -> Option<&'a str>,
    other_businesses: &[String],
) -> Vec<String> {
    let mut lines = Vec::new();
    for field in FieldName::ALL {
        if field == FieldName::OtherBusinesses {
            if !other_businesses.is_empty() {
                lines.push(format!(
                    "{} ({}):",
                    field.display_label(),
                    other_businesses.len()
                ));
                lines.extend(other_businesses.iter().map(|b| format!("  - {b}")));
            }
        } else if let Some(value) = value(field) {
            lines.push(format!("{}: {value}", field.display_label()));
        }
    }
    lines
}

/// Older cache files store `other_businesses` as one newline-joined string
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        List(Vec<String>),
        Text(String),
        Missing(()),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => items,
        StringOrList::Text(text) => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        StringOrList::Missing(()) => Vec::new(),
    })
}

/// One candidate entity from a search page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub tax_code: String,
    pub representative: Option<String>,
    pub address: Option<String>,
    pub detail_url: Option<String>,
    pub tax_address: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub operation_date: Option<String>,
    pub managed_by: Option<String>,
    pub business_type: Option<String>,
    pub main_business: Option<String>,
    #[serde(default)]
    pub other_businesses: Vec<String>,
    #[serde(skip)]
    details_merged: bool,
}

impl SearchResult {
    #[must_use]
    pub fn new(name: impl Into<String>, tax_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_code: tax_code.into(),
            ..Self::default()
        }
    }

    /// Tax code when known, else the entity name
    #[must_use]
    pub fn identity_key(&self) -> &str {
        if self.tax_code.is_empty() {
            &self.name
        } else {
            &self.tax_code
        }
    }

    #[must_use]
    pub fn has_details(&self) -> bool {
        self.details_merged
    }

    /// Value of `field` as currently known for this candidate
    #[must_use]
    pub fn field(&self, field: FieldName) -> Option<&str> {
        let value = match field {
            FieldName::TaxCode => return Some(self.tax_code.as_str()).filter(|c| !c.is_empty()),
            FieldName::TaxAddress => &self.tax_address,
            FieldName::Address => &self.address,
            FieldName::Representative => &self.representative,
            FieldName::Phone => &self.phone,
            FieldName::Status => &self.status,
            FieldName::OperationDate => &self.operation_date,
            FieldName::ManagedBy => &self.managed_by,
            FieldName::BusinessType => &self.business_type,
            FieldName::MainBusiness => &self.main_business,
            FieldName::OtherBusinesses => return None,
        };
        value.as_deref()
    }

    /// Entity name followed by its known fields, indented
    #[must_use]
    pub fn to_display_string(&self) -> String {
        let mut out = self.name.clone();
        for line in display_lines(|field| self.field(field), &self.other_businesses) {
            out.push_str("\n  ");
            out.push_str(&line);
        }
        out
    }

    /// Fold detail-page fields into this search candidate.
    ///
    /// Only the first merge has an effect. Detail values replace the search
    /// page's address and representative when present; the remaining detail
    /// fields are copied as-is.
    pub fn merge_details(&mut self, details: &DetailFields) {
        if self.details_merged {
            return;
        }
        self.details_merged = true;

        if self.tax_code.is_empty() {
            if let Some(code) = details.tax_code() {
                self.tax_code = code.to_string();
            }
        }
        if let Some(address) = details.address() {
            self.address = Some(address.to_string());
        }
        if let Some(representative) = details.representative() {
            self.representative = Some(representative.to_string());
        }
        self.tax_address = details.tax_address().map(str::to_string);
        self.phone = details.phone().map(str::to_string);
        self.status = details.status().map(str::to_string);
        self.operation_date = details.get(FieldName::OperationDate).map(str::to_string);
        self.managed_by = details.get(FieldName::ManagedBy).map(str::to_string);
        self.business_type = details.get(FieldName::BusinessType).map(str::to_string);
        self.main_business = details.get(FieldName::MainBusiness).map(str::to_string);
        self.other_businesses = details.other_businesses().to_vec();
    }
}
