//! # pmoupnp - briques UPnP côté control point
//!
//! Ce crate regroupe les morceaux de protocole dont un control point a besoin :
//!
//! - [`soap`] : construction des requêtes SOAP, parsing des enveloppes et des faults
//! - [`ssdp`] : client M-SEARCH pour découvrir les devices du réseau local
//!
//! Les services (AVTransport, ContentDirectory) sont pilotés par `pmocontrol`.

pub mod soap;
pub mod ssdp;
