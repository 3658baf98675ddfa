use crate::err::DeserializationResult;
use crate::utils::ByteCursor;

use std::fmt::{self, Debug, Display, Write};

#[derive(PartialOrd, PartialEq, Eq, Clone)]
pub struct Guid {
    data1: u32,
    data2: u16,
    data3: u16,
    data4: [u8; 8],
}

impl Guid {
    pub fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Guid {
        Guid {
            data1,
            data2,
            data3,
            data4,
        }
    }

    pub(crate) fn from_cursor(cursor: &mut ByteCursor<'_>) -> DeserializationResult<Guid> {
        let data1 = cursor.u32_named("guid_data1")?;
        let data2 = cursor.u16_named("guid_data2")?;
        let data3 = cursor.u16_named("guid_data3")?;
        let data4 = cursor.array::<8>("guid_data4")?;

        Ok(Guid::new(data1, data2, data3, data4))
    }

    pub fn to_string(&self) -> String {
        // Using `format!` would extend the string multiple times,
        // but we know ahead of time how much space we need.
        let mut s = String::with_capacity(36);

        write!(
            &mut s,
            "{:08X}-{:02X}-{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7]
        )
        .expect("writing to a preallocated buffer cannot fail");

        s
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}

impl Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string())
    }
}
