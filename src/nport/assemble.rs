use std::sync::Arc;

use crate::edgar::parsing::{Element, FilingDocument};

use super::extract::resolve;
use super::mapping::{MappingRegistry, Relation, ACCESSION_NUMBER, DATE_FILED};

/// One output row: field names paired with extracted values, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(accession_number: &str) -> Self {
        Record {
            fields: vec![(ACCESSION_NUMBER.to_string(), accession_number.to_string())],
        }
    }

    pub fn push(&mut self, field: &str, value: String) {
        self.fields.push((field.to_string(), value));
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn accession_number(&self) -> Option<&str> {
        self.get(ACCESSION_NUMBER)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Every record extracted from one filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFiling {
    pub header: Record,
    pub general: Record,
    pub fund: Record,
    pub securities: Vec<Record>,
}

impl AssembledFiling {
    /// Records paired with their relation, in append order.
    pub fn into_records(self) -> impl Iterator<Item = (Relation, Record)> {
        [
            (Relation::Header, self.header),
            (Relation::General, self.general),
            (Relation::Fund, self.fund),
        ]
        .into_iter()
        .chain(
            self.securities
                .into_iter()
                .map(|record| (Relation::Securities, record)),
        )
    }
}

/// Builds records for a filing from a shared mapping registry.
#[derive(Debug, Clone)]
pub struct Assembler {
    registry: Arc<MappingRegistry>,
}

impl Assembler {
    pub fn new(registry: Arc<MappingRegistry>) -> Self {
        Assembler { registry }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn assemble(&self, document: &FilingDocument) -> AssembledFiling {
        let root = document.markup.root();
        let scopes = &self.registry.scopes;

        let header = self.record(Relation::Header, root.find(&scopes.header), document);
        let general = self.record(Relation::General, root.find(&scopes.general), document);
        let fund = self.record(Relation::Fund, root.find(&scopes.fund), document);
        let securities: Vec<Record> = root
            .find_all(&scopes.security)
            .map(|security| self.record(Relation::Securities, Some(security), document))
            .collect();

        log::debug!(
            "{}: assembled {} securities",
            document.identifier,
            securities.len()
        );

        AssembledFiling {
            header,
            general,
            fund,
            securities,
        }
    }

    // An absent scope still yields a record, with every mapped field missing.
    fn record(
        &self,
        relation: Relation,
        scope: Option<Element<'_>>,
        document: &FilingDocument,
    ) -> Record {
        let mut record = Record::new(&document.identifier);
        if relation == Relation::General {
            record.push(DATE_FILED, document.filing_date_or_missing().to_string());
        }
        for descriptor in self.registry.descriptors_for(relation) {
            record.push(descriptor.field(), resolve(scope, descriptor));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::parsing::tests::read_test_file;
    use crate::edgar::parsing::MISSING;
    use crate::nport::mapping::MappingDescriptor;

    fn assembler() -> Assembler {
        Assembler::new(Arc::new(MappingRegistry::nport()))
    }

    fn assemble(name: &str, text: &str) -> AssembledFiling {
        assembler().assemble(&FilingDocument::parse(name, text))
    }

    #[test]
    fn test_general_record_merges_filing_date() {
        let filing = assemble(
            "0000000001-23-000001.txt",
            "FILED AS OF DATE: 20230115\n<genInfo><regName>Acme Fund</regName></genInfo>",
        );
        let general = &filing.general;
        assert_eq!(general.accession_number(), Some("0000000001-23-000001"));
        assert_eq!(general.get("registrant_name"), Some("Acme Fund"));
        assert_eq!(general.get("date_filed"), Some("20230115"));
        assert_eq!(general.get("registrant_city"), Some(MISSING));
    }

    #[test]
    fn test_security_missing_cusip() {
        let text = r#"<edgarSubmission><invstOrSecs>
            <invstOrSec><name>First</name><cusip>123456789</cusip><balance>10</balance><units>NS</units></invstOrSec>
            <invstOrSec><name>Second</name><balance>20</balance><units>PA</units></invstOrSec>
        </invstOrSecs></edgarSubmission>"#;
        let filing = assemble("doc.txt", text);

        assert_eq!(filing.securities.len(), 2);
        assert_eq!(filing.securities[0].get("cusip"), Some("123456789"));
        let second = &filing.securities[1];
        assert_eq!(second.get("cusip"), Some(MISSING));
        assert_eq!(second.get("name"), Some("Second"));
        assert_eq!(second.get("balance"), Some("20"));
        assert_eq!(second.get("units"), Some("PA"));
        assert_eq!(second.accession_number(), Some("doc"));
    }

    #[test]
    fn test_missing_fund_scope() {
        let filing = assemble("doc.txt", "<genInfo><regName>Acme Fund</regName></genInfo>");
        for field in ["assets", "liabilities", "net_assets"] {
            assert_eq!(filing.fund.get(field), Some(MISSING));
        }
        assert_eq!(filing.fund.len(), 4);
    }

    #[test]
    fn test_empty_document_still_yields_singular_records() {
        let filing = assemble("empty.txt", "");
        assert!(filing.securities.is_empty());
        let registry = MappingRegistry::nport();
        for (relation, record) in [
            (Relation::Header, &filing.header),
            (Relation::General, &filing.general),
            (Relation::Fund, &filing.fund),
        ] {
            let columns: Vec<&str> = record.fields().map(|(name, _)| name).collect();
            assert_eq!(columns, registry.columns_for(relation));
            assert!(record.fields().skip(1).all(|(_, value)| value == MISSING));
        }
    }

    #[test]
    fn test_fixture_round_trip() {
        let content = read_test_file("nport_sample.txt");
        let filing = assemble("0001752724-23-011234.txt", &content);

        assert_eq!(filing.header.get("form_type"), Some("NPORT-P"));
        assert_eq!(filing.header.get("confidential"), Some("false"));
        assert_eq!(filing.general.get("date_filed"), Some("20230130"));
        assert_eq!(filing.general.get("registrant_code"), Some("02110"));
        assert_eq!(filing.fund.get("net_assets"), Some("1232222211.22"));
        assert_eq!(filing.securities.len(), 3);

        let treasury = &filing.securities[0];
        let expected = [
            ("name", "US Treasury Note"),
            ("cusip", "91282CFF3"),
            ("balance", "5000000.00000000"),
            ("units", "PA"),
            ("debt_maturity_date", "2032-08-15"),
            ("debt_coupon_type", "Fixed"),
            ("debt_annualized_rate", "2.75000000"),
            ("default", "N"),
            ("arrears", "N"),
            ("currency_other", "EUR"),
            ("exchange_rate", "0.93450000"),
            ("isin", "US91282CFF32"),
            ("ticker", "T 2.75 08/15/32"),
        ];
        for (field, value) in expected {
            assert_eq!(treasury.get(field), Some(value), "field {}", field);
        }
        assert_eq!(treasury.get("asset_category_alt"), Some(MISSING));

        let equity = &filing.securities[1];
        assert_eq!(equity.get("cusip"), Some(MISSING));
        assert_eq!(equity.get("debt_maturity_date"), Some(MISSING));
        assert_eq!(equity.get("isin"), Some("GB00B03MLX29"));

        let private = &filing.securities[2];
        assert_eq!(private.get("other_id"), Some("PPF-2021-01"));
        assert_eq!(private.get("other_id_details"), Some("Internal identifier"));
        assert_eq!(private.get("asset_description"), Some("Limited partnership interest"));
        assert_eq!(private.get("issuer_category_alt"), Some("OTHER"));
        assert_eq!(private.get("issuer_description"), Some("Private fund"));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let content = read_test_file("nport_sample.txt");
        let document = FilingDocument::parse("0001752724-23-011234.txt", &content);
        let assembler = assembler();
        assert_eq!(assembler.assemble(&document), assembler.assemble(&document));
    }

    #[test]
    fn test_alternate_registry() {
        let mut registry = MappingRegistry::nport();
        registry.scopes.security = "holding".to_string();
        registry.securities = vec![MappingDescriptor::direct_attribute("id", "ref", "value")];
        let assembler = Assembler::new(Arc::new(registry));
        let document = FilingDocument::parse(
            "alt.txt",
            r#"<holdings><holding><ref value="a"/></holding><holding/></holdings>"#,
        );
        let filing = assembler.assemble(&document);
        let ids: Vec<_> = filing.securities.iter().map(|r| r.get("id")).collect();
        assert_eq!(ids, vec![Some("a"), Some(MISSING)]);
    }

    #[test]
    fn test_into_records_order() {
        let filing = assemble(
            "doc.txt",
            "<invstOrSec><name>a</name></invstOrSec><invstOrSec><name>b</name></invstOrSec>",
        );
        let relations: Vec<Relation> = filing.into_records().map(|(r, _)| r).collect();
        assert_eq!(
            relations,
            vec![
                Relation::Header,
                Relation::General,
                Relation::Fund,
                Relation::Securities,
                Relation::Securities
            ]
        );
    }
}
