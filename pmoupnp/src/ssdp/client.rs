/*!
The SSDP client is a *control point*.
It must **not** bind to UDP port 1900.

If a client and a device stack both bind 1900 (even with SO_REUSEPORT) the
kernel load-balances incoming datagrams between sockets and replies get lost.
The client binds an ephemeral port, sends M-SEARCH and reads the unicast
HTTP/200 replies.
*/

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, trace, warn};

use super::{MAX_AGE, SSDP_MULTICAST_ADDR, SSDP_PORT};

/// Événements SSDP intéressants pour un control point
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsdpEvent {
    Alive {
        usn: String,
        nt: String,
        location: String,
        server: String,
        max_age: u32,
        from: SocketAddr,
    },
    ByeBye {
        usn: String,
        nt: String,
        from: SocketAddr,
    },
    SearchResponse {
        usn: String,
        st: String,
        location: String,
        server: String,
        max_age: u32,
        from: SocketAddr,
    },
}

impl SsdpEvent {
    /// URL de description du device, absente pour un byebye
    pub fn location(&self) -> Option<&str> {
        match self {
            SsdpEvent::Alive { location, .. } | SsdpEvent::SearchResponse { location, .. } => {
                Some(location)
            }
            SsdpEvent::ByeBye { .. } => None,
        }
    }

    /// Type annoncé (NT pour un NOTIFY, ST pour une réponse de recherche)
    pub fn notification_type(&self) -> &str {
        match self {
            SsdpEvent::Alive { nt, .. } | SsdpEvent::ByeBye { nt, .. } => nt,
            SsdpEvent::SearchResponse { st, .. } => st,
        }
    }
}

/// Client SSDP pour envoyer des M-SEARCH et écouter les réponses
pub struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    /// Crée un nouveau client SSDP sur un port éphémère
    pub fn new() -> std::io::Result<Self> {
        let socket2 = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket2.set_reuse_address(true)?;

        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
        socket2.bind(&bind_addr.into())?;

        let socket: UdpSocket = socket2.into();
        socket.set_multicast_loop_v4(true)?;

        for iface in get_if_addrs::get_if_addrs()? {
            if let std::net::IpAddr::V4(ipv4) = iface.ip() {
                if ipv4.is_loopback() {
                    continue;
                }
                match socket.join_multicast_v4(&SSDP_MULTICAST_ADDR, &ipv4) {
                    Ok(()) => debug!("SSDP: joined {} on {}", SSDP_MULTICAST_ADDR, ipv4),
                    Err(e) => warn!(
                        "SSDP: failed to join {} on {}: {}",
                        SSDP_MULTICAST_ADDR, ipv4, e
                    ),
                }
            }
        }

        Ok(Self { socket })
    }

    /// Envoie un M-SEARCH pour un type donné
    pub fn send_msearch(&self, st: &str, mx: u32) -> std::io::Result<()> {
        let mx = mx.max(1); // MX doit être >= 1
        let msg = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}:{}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: {}\r\n\
             ST: {}\r\n\
             USER-AGENT: pmoplay SSDP Client\r\n\
             \r\n",
            SSDP_MULTICAST_ADDR, SSDP_PORT, mx, st
        );

        let addr = SocketAddr::V4(SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT));
        self.socket.send_to(msg.as_bytes(), addr)?;
        debug!(st, mx, "M-SEARCH sent");
        Ok(())
    }

    /// Envoie un M-SEARCH puis collecte les événements jusqu'à `wait`.
    ///
    /// Bloquant ; les événements sont rendus dans leur ordre d'arrivée.
    pub fn search(&self, st: &str, wait: Duration) -> std::io::Result<Vec<SsdpEvent>> {
        let mx = wait.as_secs().clamp(1, 5) as u32;
        self.send_msearch(st, mx)?;

        let deadline = Instant::now() + wait;
        let mut events = Vec::new();
        let mut buf = [0u8; 8192];

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = (deadline - now).min(Duration::from_millis(250));
            self.socket
                .set_read_timeout(Some(remaining.max(Duration::from_millis(1))))?;

            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let data = String::from_utf8_lossy(&buf[..n]);
                    if let Some(event) = parse_message(&data, from) {
                        trace!("SSDP event from {}: {:?}", from, event);
                        events.push(event);
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    warn!("SSDP client read error: {}", e);
                    return Err(e);
                }
            }
        }

        debug!(st, count = events.len(), "SSDP search window closed");
        Ok(events)
    }
}

pub(crate) fn parse_message(data: &str, from: SocketAddr) -> Option<SsdpEvent> {
    let mut lines = data.lines();
    let first_line = lines.next()?.trim();
    let upper = first_line.to_ascii_uppercase();
    let headers = parse_headers(lines);

    if upper.starts_with("NOTIFY ") {
        handle_notify(&headers, from)
    } else if upper.starts_with("HTTP/") && upper.contains(" 200 ") {
        handle_search_response(&headers, from)
    } else {
        // M-SEARCH d'un autre control point, ou message inconnu
        trace!("Ignoring SSDP message from {}: {}", from, first_line);
        None
    }
}

fn handle_notify(headers: &HashMap<String, String>, from: SocketAddr) -> Option<SsdpEvent> {
    let nts = headers.get("NTS")?.to_ascii_lowercase();
    let nt = headers.get("NT")?.to_string();
    let usn = headers.get("USN")?.to_string();

    match nts.as_str() {
        "ssdp:alive" => Some(SsdpEvent::Alive {
            usn,
            nt,
            location: headers.get("LOCATION")?.to_string(),
            server: headers
                .get("SERVER")
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            max_age: parse_max_age(headers.get("CACHE-CONTROL")),
            from,
        }),
        "ssdp:byebye" => Some(SsdpEvent::ByeBye { usn, nt, from }),
        _ => {
            trace!("Unknown NTS value from {}: {}", from, nts);
            None
        }
    }
}

fn handle_search_response(
    headers: &HashMap<String, String>,
    from: SocketAddr,
) -> Option<SsdpEvent> {
    // ST, USN et LOCATION sont obligatoires
    let st = headers.get("ST")?.to_string();
    let usn = headers.get("USN")?.to_string();
    let location = headers.get("LOCATION")?.to_string();

    let server = headers
        .get("SERVER")
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());
    let max_age = parse_max_age(headers.get("CACHE-CONTROL"));

    Some(SsdpEvent::SearchResponse {
        usn,
        st,
        location,
        server,
        max_age,
        from,
    })
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();

        // Une ligne vide termine les en-têtes
        if line.is_empty() {
            break;
        }

        // Découper sur le premier ':' seulement (les valeurs peuvent en contenir)
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_uppercase();
            let value = value.trim().to_string();

            if !name.is_empty() && !value.is_empty() {
                headers.insert(name, value);
            }
        } else {
            trace!("Skipping line without colon: '{}'", line);
        }
    }
    headers
}

fn parse_max_age(value: Option<&String>) -> u32 {
    if let Some(v) = value {
        let lower = v.to_ascii_lowercase();
        if let Some(idx) = lower.find("max-age") {
            let after_key = &lower[idx + "max-age".len()..];
            let after_eq = after_key.trim_start().trim_start_matches('=').trim_start();
            let digits: String = after_eq
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(age) = digits.parse::<u32>() {
                return age;
            }
        }
        trace!("Could not parse max-age from CACHE-CONTROL: '{}'", v);
    }
    MAX_AGE
}
