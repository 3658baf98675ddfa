use crate::err::{DeserializationError, DeserializationResult};
use crate::utils::ByteCursor;

use std::fmt::{self, Debug, Display, Write};

/// A Windows NT security identifier as it appears in EVTX substitution
/// values: revision, sub-authority count, a 48-bit big-endian top authority,
/// then little-endian 32-bit sub-authorities.
///
/// The number of sub-authorities actually present is driven by the declared
/// value size, not by the count byte; dirty logs routinely disagree between
/// the two and the renderable data is what fits the declared size.
#[derive(PartialOrd, PartialEq, Eq, Clone)]
pub struct Sid {
    revision: u8,
    sub_authority_count: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    pub(crate) fn from_cursor_sized(
        cursor: &mut ByteCursor<'_>,
        size: u16,
    ) -> DeserializationResult<Sid> {
        if size < 8 {
            return Err(DeserializationError::InvalidSid {
                size,
                offset: cursor.position(),
            });
        }

        let revision = cursor.u8_named("sid_revision")?;
        let sub_authority_count = cursor.u8_named("sid_sub_authority_count")?;

        // The top authority is kept in big-endian order.
        let id = cursor.array::<6>("sid_authority")?;
        let authority = id.iter().fold(0_u64, |acc, b| (acc << 8) | u64::from(*b));

        let mut sub_authorities = Vec::with_capacity(usize::from(size - 8) / 4);
        let mut consumed = 8_usize;
        while consumed + 4 <= usize::from(size) {
            sub_authorities.push(cursor.u32_named("sid_sub_authority")?);
            consumed += 4;
        }

        Ok(Sid {
            revision,
            sub_authority_count,
            authority,
            sub_authorities,
        })
    }

    pub fn to_string(&self) -> String {
        let mut repr = String::new();

        write!(repr, "S-{}-{}", self.revision, self.authority)
            .expect("Writing to a String cannot fail");

        for sub_authority in self.sub_authorities.iter() {
            write!(repr, "-{}", sub_authority).expect("Writing to a String cannot fail");
        }

        repr
    }
}

impl Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}
