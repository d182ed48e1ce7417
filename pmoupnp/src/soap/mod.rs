//! # Module SOAP - Simple Object Access Protocol
//!
//! Support SOAP pour un control point UPnP : on construit les requêtes
//! d'actions, on parse les enveloppes de réponse et on extrait les faults.
//!
//! ## Architecture
//!
//! - [`build_soap_request`] : corps XML d'une invocation d'action
//! - [`SoapEnvelope`] : enveloppe SOAP parsée
//! - [`SoapFault`] : erreur SOAP, avec le détail UPnP éventuel
//!
//! ## Example
//!
//! ```ignore
//! use pmoupnp::soap::{build_soap_request, parse_soap_envelope};
//!
//! let body = build_soap_request(
//!     "urn:schemas-upnp-org:service:AVTransport:1",
//!     "GetTransportInfo",
//!     &[("InstanceID", "0")],
//! )?;
//!
//! let envelope = parse_soap_envelope(response.as_bytes())?;
//! let fields = envelope.response_fields("GetTransportInfo");
//! ```

mod builder;
mod envelope;
mod fault;
mod parser;

pub use builder::{build_soap_request, build_soap_response};
pub use envelope::{FieldMap, SoapBody, SoapEnvelope, SoapHeader, find_child_with_suffix};
pub use fault::{SoapFault, UpnpError, build_soap_fault, parse_soap_fault};
pub use parser::parse_soap_envelope;

/// Erreurs de construction ou de parsing SOAP
#[derive(Debug, thiserror::Error)]
pub enum SoapError {
    #[error("XML parse error: {0}")]
    Parse(#[from] xmltree::ParseError),

    #[error("XML write error: {0}")]
    Write(#[from] xmltree::Error),

    #[error("SOAP payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Missing SOAP Envelope")]
    MissingEnvelope,

    #[error("Missing SOAP Body")]
    MissingBody,
}

/// Codes d'erreur SOAP UPnP standards
pub mod error_codes {
    /// Action invalide
    pub const INVALID_ACTION: u32 = 401;

    /// Arguments invalides
    pub const INVALID_ARGS: u32 = 402;

    /// Action échouée
    pub const ACTION_FAILED: u32 = 501;

    /// Action optionnelle non implémentée
    pub const OPTIONAL_ACTION_NOT_IMPLEMENTED: u32 = 602;

    /// AVTransport : transition non disponible
    pub const TRANSITION_NOT_AVAILABLE: u32 = 701;

    /// AVTransport : pas de contenu
    pub const NO_CONTENTS: u32 = 702;

    /// AVTransport : type MIME non supporté
    pub const ILLEGAL_MIME_TYPE: u32 = 714;

    /// AVTransport : ressource introuvable
    pub const RESOURCE_NOT_FOUND: u32 = 716;

    /// AVTransport : InstanceID invalide
    pub const INVALID_INSTANCE_ID: u32 = 718;

    /// ContentDirectory : objet inexistant
    pub const NO_SUCH_OBJECT: u32 = 701;

    /// Libellé lisible pour les codes génériques et AVTransport
    pub fn describe(code: u32) -> Option<&'static str> {
        match code {
            INVALID_ACTION => Some("Invalid Action"),
            INVALID_ARGS => Some("Invalid Args"),
            ACTION_FAILED => Some("Action Failed"),
            OPTIONAL_ACTION_NOT_IMPLEMENTED => Some("Optional Action Not Implemented"),
            TRANSITION_NOT_AVAILABLE => Some("Transition not available"),
            NO_CONTENTS => Some("No contents"),
            ILLEGAL_MIME_TYPE => Some("Illegal MIME-type"),
            RESOURCE_NOT_FOUND => Some("Resource not found"),
            INVALID_INSTANCE_ID => Some("Invalid InstanceID"),
            _ => None,
        }
    }
}
