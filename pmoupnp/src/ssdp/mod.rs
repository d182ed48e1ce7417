//! # Module SSDP - Simple Service Discovery Protocol
//!
//! Côté control point uniquement : envoi de M-SEARCH et collecte des
//! réponses unicast (et des NOTIFY reçus pendant la fenêtre d'écoute).
//!
//! ## Constants SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Max-Age**: 1800 secondes (30 minutes), valeur par défaut si absente

mod client;

pub use client::{SsdpClient, SsdpEvent};

use std::net::Ipv4Addr;

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Durée de validité des annonces (en secondes)
pub const MAX_AGE: u32 = 1800;
