//! Monotonic identifier issuers for tags and fids.
//!
//! Both counters start at 1 (0 and the sentinel values are never issued) and
//! never wrap back to a previously-issued value; overflow is a fatal session
//! error rather than silent reuse.

use crate::error::{Error, Result};

macro_rules! issuer {
    ($name:ident, $int:ty) => {
        pub struct $name {
            next: $int,
        }

        impl $name {
            pub fn new() -> $name {
                $name { next: 1 }
            }

            pub fn issue(&mut self) -> Result<$int> {
                let value = self.next;
                self.next = self.next.checked_add(1).ok_or(Error::FidSpaceExhausted)?;
                Ok(value)
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::new()
            }
        }
    };
}

issuer!(TagIssuer, u16);
issuer!(FidIssuer, u32);
