//! Interfaces of the external cryptographic collaborator.
//!
//! This crate never parses PFX containers, checks X.509 validity or verifies
//! XML signatures itself. Those operations are delegated to an implementation
//! of the traits below, and their failures come back as typed values that
//! the certificate gate and the submission gate classify.

use thiserror::Error;

/// Failure reported while opening a PFX container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("certificate blob is not valid base64")]
    InvalidBase64,

    #[error("incorrect certificate password")]
    IncorrectPassword,

    /// Untyped failure; the message is the collaborator's own text.
    #[error("invalid PFX format: {0}")]
    InvalidFormat(String),

    #[error("PFX does not contain a private key")]
    MissingPrivateKey,

    #[error("PFX does not contain a certificate")]
    NoCertificate,

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),
}

/// Reason a parsed certificate cannot be used for signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningFailure {
    #[error("certificate has expired")]
    Expired,

    #[error("certificate is not yet valid")]
    NotYetValid,

    #[error("certificate has no private key")]
    MissingPrivateKey,

    #[error("certificate key usage does not allow digital signatures")]
    InvalidKeyUsage,

    #[error("{0}")]
    Other(String),
}

/// Parses certificates and checks them for signing.
///
/// `Info` is whatever the implementation extracts from the container; it is
/// handed back to the caller on success so the blob is never parsed twice.
pub trait CertificateParser {
    type Info;

    fn parse_certificate(&self, pfx_base64: &str, password: &str)
    -> Result<Self::Info, ParseFailure>;

    /// Every reason the certificate is unusable, or `Ok(())`.
    fn validate_for_signing(&self, info: &Self::Info) -> Result<(), Vec<SigningFailure>>;
}

/// Outcome of verifying an enveloped XML signature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureVerification {
    pub valid: bool,
    /// Subject of the signing certificate, when the verifier could read it.
    pub signer_identity: Option<String>,
    pub errors: Vec<String>,
}

/// Verifies XML document signatures.
pub trait SignatureVerifier {
    fn verify_document_signature(&self, xml: &str) -> SignatureVerification;
}

impl<T: CertificateParser + ?Sized> CertificateParser for &T {
    type Info = T::Info;

    fn parse_certificate(
        &self,
        pfx_base64: &str,
        password: &str,
    ) -> Result<Self::Info, ParseFailure> {
        (**self).parse_certificate(pfx_base64, password)
    }

    fn validate_for_signing(&self, info: &Self::Info) -> Result<(), Vec<SigningFailure>> {
        (**self).validate_for_signing(info)
    }
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify_document_signature(&self, xml: &str) -> SignatureVerification {
        (**self).verify_document_signature(xml)
    }
}
