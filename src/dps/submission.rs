use tracing::debug;

use super::presigned::parse_presigned_xml;
use super::schema::validate_dps;
use crate::core::{NfseError, PreSignedInfo, SignatureVerifier};

/// Admit a pre-signed DPS for submission.
///
/// Checks run cheapest first and stop at the first failing stage: parsing,
/// semantic checks, structural validation, then signature verification by
/// the collaborator. A document only reaches the verifier when it is
/// otherwise submission-ready.
pub fn check_presigned_submission<V: SignatureVerifier>(
    xml: &str,
    verifier: &V,
) -> Result<PreSignedInfo, NfseError> {
    let info = parse_presigned_xml(xml)?;

    let problems = info.validate();
    if !problems.is_empty() {
        debug!(problems = problems.len(), dps_id = %info.dps_id, "pre-signed DPS rejected");
        return Err(NfseError::Submission(problems));
    }

    let violations = validate_dps(xml);
    if !violations.is_empty() {
        return Err(NfseError::Document(violations));
    }

    let verification = verifier.verify_document_signature(xml);
    debug!(
        valid = verification.valid,
        signer = verification.signer_identity.as_deref().unwrap_or("unknown"),
        "signature verification finished"
    );
    if !verification.valid {
        let mut reasons = verification.errors;
        if reasons.is_empty() {
            reasons.push("signature is not valid".to_string());
        }
        return Err(NfseError::InvalidSignature(reasons));
    }

    Ok(info)
}
