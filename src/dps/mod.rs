//! DPS and NFS-e XML handling.
//!
//! - [`validate_dps`]: structural validation (XSD-lite) of a DPS document
//! - [`parse_nfse_xml`]: issued NFS-e response into [`NfseData`](crate::core::NfseData)
//! - [`parse_presigned_xml`]: signed DPS into [`PreSignedInfo`](crate::core::PreSignedInfo)
//! - [`check_presigned_submission`]: the full admission pipeline for a signed DPS

mod nfse;
mod presigned;
mod schema;
mod submission;
pub(crate) mod xml_utils;

pub use nfse::parse_nfse_xml;
pub use presigned::{PreSignedXmlRequest, parse_presigned_xml};
pub use schema::{MAX_DESCRIPTION_CHARS, environment_of, render_violations, validate_dps};
pub use submission::check_presigned_submission;

/// Namespace of the national NFS-e schema.
pub const NFSE_NAMESPACE: &str = "http://www.sped.fazenda.gov.br/nfse";
