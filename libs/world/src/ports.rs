use std::sync::Mutex;

use crate::error::WorldError;

/// Hands out contiguous port ranges from a fixed window.
#[derive(Debug)]
pub struct PortAllocator {
    next: Mutex<u32>,
    end: u32,
}

impl PortAllocator {
    /// Allocator over `start..end`.
    pub fn new(start: u32, end: u32) -> Result<Self, WorldError> {
        if start == 0 || start >= end || end > u32::from(u16::MAX) + 1 {
            return Err(WorldError::InvalidPortRange { start, end });
        }

        Ok(Self {
            next: Mutex::new(start),
            end,
        })
    }

    /// Window used by a parallel node: 5000 ports starting at `2000 * node`.
    pub fn for_node(node: u32) -> Result<Self, WorldError> {
        let start = 2000 * node;
        Self::new(start, start + 5000)
    }

    /// Claim `count` consecutive ports and return the first.
    pub fn claim_ports(&self, count: u16) -> Result<u16, WorldError> {
        let mut next = self.next.lock().unwrap_or_else(|e| e.into_inner());
        let remaining = self.end - *next;

        if u32::from(count) > remaining {
            return Err(WorldError::PortsExhausted {
                requested: count,
                remaining,
                end: self.end,
            });
        }

        let first = *next;
        *next += u32::from(count);
        // `end` is capped at 65536, so every handed-out port fits in a u16.
        Ok(first as u16)
    }

    /// Claim a single port.
    pub fn claim_port(&self) -> Result<u16, WorldError> {
        self.claim_ports(1)
    }
}
