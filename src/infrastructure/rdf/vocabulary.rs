//! Namespaces and terms of the Linked USDL vocabulary.

/// SPARQL prologue declaring every prefix used by the catalog queries.
pub const QUERY_PREFIXES: &str = "\
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX dcterms: <http://purl.org/dc/terms/>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
PREFIX gr: <http://purl.org/goodrelations/v1#>
PREFIX usdl: <http://www.linked-usdl.org/ns/usdl-core#>
PREFIX price: <http://www.linked-usdl.org/ns/usdl-price#>
";

pub const DCTERMS_TITLE: &str = "dcterms:title";
pub const DCTERMS_DESCRIPTION: &str = "dcterms:description";
pub const FOAF_THUMBNAIL: &str = "foaf:thumbnail";
pub const RDFS_LABEL: &str = "rdfs:label";

pub const USDL_SERVICE_OFFERING: &str = "usdl:ServiceOffering";
pub const USDL_VERSION_INFO: &str = "usdl:versionInfo";
pub const USDL_HAS_PRICE_PLAN: &str = "usdl:hasPricePlan";
pub const USDL_INCLUDES: &str = "usdl:includes";
pub const USDL_HAS_CLASSIFICATION: &str = "usdl:hasClassification";

pub const PRICE_HAS_PRICE_COMPONENT: &str = "price:hasPriceComponent";

pub const GR_HAS_CURRENCY: &str = "gr:hasCurrency";
pub const GR_HAS_CURRENCY_VALUE: &str = "gr:hasCurrencyValue";
pub const GR_HAS_UNIT_OF_MEASUREMENT: &str = "gr:hasUnitOfMeasurement";

/// Prepends [`QUERY_PREFIXES`] to a query body.
pub fn with_prefixes(query: &str) -> String {
    format!("{QUERY_PREFIXES}{query}")
}
