//! UDP bridge standing in for the physical broadcast bus.
//!
//! Each datagram is one transport unit: a 4-byte address header
//! followed by the unit's data bytes. The bridge is point-to-point in
//! this deployment (one bind address, one peer address) but carries
//! broadcast-bus semantics: no acknowledgements, no retransmission,
//! no sender authentication below the frame codec.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use zerocopy::{AsBytes, FromBytes};

use canseal_core::wire::{TransportUnit, UnitHeader, UNIT_DATA_LEN, UNIT_HEADER_LEN};

/// One datagram as received, before any reassembly.
///
/// `data` is whatever followed the header, which on a hostile bus may
/// be shorter or longer than the nominal 8 bytes.
#[derive(Debug, Clone)]
pub struct ReceivedUnit {
    pub addr: u32,
    pub data: Vec<u8>,
}

pub struct UdpBus {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpBus {
    pub async fn bind(bind_addr: &str, peer_addr: &str) -> anyhow::Result<Self> {
        let peer: SocketAddr = peer_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid peer address {peer_addr}: {e}"))?;
        let socket = UdpSocket::bind(bind_addr).await?;
        tracing::info!(local = %socket.local_addr()?, %peer, "bus bridge bound");
        Ok(Self { socket, peer })
    }

    pub async fn send_unit(&self, unit: &TransportUnit) -> std::io::Result<()> {
        let mut datagram = [0u8; UNIT_HEADER_LEN + UNIT_DATA_LEN];
        let header = UnitHeader { addr: unit.addr };
        datagram[..UNIT_HEADER_LEN].copy_from_slice(header.as_bytes());
        datagram[UNIT_HEADER_LEN..].copy_from_slice(&unit.data);
        self.socket.send_to(&datagram, self.peer).await?;
        Ok(())
    }

    /// Receive one datagram. `None` for a datagram too short to carry
    /// the unit header; those are dropped here since there is nothing
    /// to hand upward.
    pub async fn recv_unit(&self) -> std::io::Result<Option<ReceivedUnit>> {
        let mut buf = [0u8; 64];
        let (n, _) = self.socket.recv_from(&mut buf).await?;
        let Some(header) = UnitHeader::read_from_prefix(&buf[..n]) else {
            tracing::warn!(len = n, "datagram shorter than unit header, dropped");
            return Ok(None);
        };
        let addr = header.addr;
        Ok(Some(ReceivedUnit {
            addr,
            data: buf[UNIT_HEADER_LEN..n].to_vec(),
        }))
    }
}
