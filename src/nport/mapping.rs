use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

pub const ACCESSION_NUMBER: &str = "accession_number";
pub const DATE_FILED: &str = "date_filed";

/// Output table a record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumIter, EnumString,
)]
pub enum Relation {
    #[strum(serialize = "header_data")]
    Header,
    #[strum(serialize = "general_data")]
    General,
    #[strum(serialize = "fund_data")]
    Fund,
    #[strum(serialize = "securities_data")]
    Securities,
}

impl Relation {
    /// Columns every record of this relation starts with.
    pub fn leading_columns(&self) -> &'static [&'static str] {
        match self {
            Relation::General => &[ACCESSION_NUMBER, DATE_FILED],
            _ => &[ACCESSION_NUMBER],
        }
    }
}

/// Declarative rule mapping one output field to a tag/attribute lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingDescriptor {
    DirectText {
        field: String,
        tag: String,
    },
    NestedText {
        field: String,
        outer: String,
        inner: String,
    },
    DirectAttribute {
        field: String,
        tag: String,
        attribute: String,
    },
    NestedAttribute {
        field: String,
        outer: String,
        inner: String,
        attribute: String,
    },
}

impl MappingDescriptor {
    pub fn direct_text(field: &str, tag: &str) -> Self {
        MappingDescriptor::DirectText {
            field: field.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn nested_text(field: &str, outer: &str, inner: &str) -> Self {
        MappingDescriptor::NestedText {
            field: field.to_string(),
            outer: outer.to_string(),
            inner: inner.to_string(),
        }
    }

    pub fn direct_attribute(field: &str, tag: &str, attribute: &str) -> Self {
        MappingDescriptor::DirectAttribute {
            field: field.to_string(),
            tag: tag.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn nested_attribute(field: &str, outer: &str, inner: &str, attribute: &str) -> Self {
        MappingDescriptor::NestedAttribute {
            field: field.to_string(),
            outer: outer.to_string(),
            inner: inner.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            MappingDescriptor::DirectText { field, .. }
            | MappingDescriptor::NestedText { field, .. }
            | MappingDescriptor::DirectAttribute { field, .. }
            | MappingDescriptor::NestedAttribute { field, .. } => field,
        }
    }
}

/// Tags that bound each relation's lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTags {
    pub header: String,
    pub general: String,
    pub fund: String,
    /// Repeated element; every match yields one securities record.
    pub security: String,
}

impl Default for ScopeTags {
    fn default() -> Self {
        ScopeTags {
            header: "headerData".to_string(),
            general: "genInfo".to_string(),
            fund: "fundInfo".to_string(),
            security: "invstOrSec".to_string(),
        }
    }
}

/// Read-only catalogue of descriptor sets, one per relation.
///
/// Built once per run and shared by every document. Descriptor order is the
/// output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRegistry {
    #[serde(default)]
    pub scopes: ScopeTags,
    pub header: Vec<MappingDescriptor>,
    pub general: Vec<MappingDescriptor>,
    pub fund: Vec<MappingDescriptor>,
    pub securities: Vec<MappingDescriptor>,
}

impl MappingRegistry {
    /// Field catalogue for Form N-PORT submissions.
    pub fn nport() -> Self {
        use MappingDescriptor as M;

        MappingRegistry {
            scopes: ScopeTags::default(),
            header: vec![
                M::direct_text("form_type", "submissionType"),
                M::direct_text("confidential", "isConfidential"),
            ],
            general: vec![
                M::direct_text("registrant_name", "regName"),
                M::direct_text("registrant_file_number", "regFileNumber"),
                M::direct_text("registrant_cik", "regCik"),
                M::direct_text("registrant_street", "regStreet1"),
                M::direct_text("registrant_city", "regCity"),
                M::direct_text("registrant_code", "regZipOrPostalCode"),
            ],
            fund: vec![
                M::direct_text("assets", "totAssets"),
                M::direct_text("liabilities", "totLiabs"),
                M::direct_text("net_assets", "netAssets"),
            ],
            securities: vec![
                M::direct_text("name", "name"),
                M::direct_text("cusip", "cusip"),
                M::direct_text("balance", "balance"),
                M::direct_text("units", "units"),
                M::nested_text("debt_maturity_date", "debtSec", "maturityDt"),
                M::nested_text("debt_coupon_type", "debtSec", "couponKind"),
                M::nested_text("debt_annualized_rate", "debtSec", "annualizedRt"),
                M::nested_text("default", "debtSec", "isDefault"),
                M::nested_text("arrears", "debtSec", "areIntrstPmtsInArrs"),
                M::direct_attribute("currency_other", "currencyConditional", "curCd"),
                M::direct_attribute("exchange_rate", "currencyConditional", "exchangeRt"),
                M::direct_attribute("asset_category_alt", "assetConditional", "assetCat"),
                M::direct_attribute("asset_description", "assetConditional", "desc"),
                M::direct_attribute("issuer_category_alt", "issuerConditional", "issuerCat"),
                M::direct_attribute("issuer_description", "issuerConditional", "desc"),
                M::nested_attribute("isin", "identifiers", "isin", "value"),
                M::nested_attribute("ticker", "identifiers", "ticker", "value"),
                M::nested_attribute("other_id", "identifiers", "other", "value"),
                M::nested_attribute("other_id_details", "identifiers", "other", "desc"),
            ],
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let registry: MappingRegistry = serde_json::from_str(content)
            .map_err(|e| anyhow!("Failed to parse mapping set: {}", e))?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read mapping file {:?}: {}", path, e))?;
        Self::from_json(&content)
    }

    pub fn descriptors_for(&self, relation: Relation) -> &[MappingDescriptor] {
        match relation {
            Relation::Header => &self.header,
            Relation::General => &self.general,
            Relation::Fund => &self.fund,
            Relation::Securities => &self.securities,
        }
    }

    /// Full column order of a relation: leading columns, then one per descriptor.
    pub fn columns_for(&self, relation: Relation) -> Vec<String> {
        relation
            .leading_columns()
            .iter()
            .map(|c| c.to_string())
            .chain(
                self.descriptors_for(relation)
                    .iter()
                    .map(|d| d.field().to_string()),
            )
            .collect()
    }

    /// Field names must be unique within a relation and must not shadow the
    /// columns the assembler adds itself.
    pub fn validate(&self) -> Result<()> {
        for relation in Relation::iter() {
            let mut seen: HashSet<&str> = relation.leading_columns().iter().copied().collect();
            for descriptor in self.descriptors_for(relation) {
                let field = descriptor.field();
                if field.is_empty() {
                    return Err(anyhow!("Empty field name in {}", relation));
                }
                if !seen.insert(field) {
                    return Err(anyhow!("Duplicate field '{}' in {}", field, relation));
                }
            }
        }
        Ok(())
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        MappingRegistry::nport()
    }
}
