//! Typed rendering of template-instance argument values.
//!
//! Every argument slot carries a `(length, type)` descriptor; the value blob
//! occupies exactly `length` bytes regardless of how many the type itself
//! consumes, so the cursor is position-corrected after every value.

use crate::binxml::deserializer::{decode_fragment, ChunkDecodeState, ParseCtx};
use crate::err::DeserializationResult;
use crate::event_descriptions::logon_type_name;
use crate::guid::Guid;
use crate::ntsid::Sid;
use crate::template_cache::TemplateArgPair;
use crate::utils::{datetime_from_filetime, decode_utf16_unit, read_utf16_by_size};

use log::{debug, warn};
use std::fmt::Write;

/// One entry of the instance's parallel argument table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ValueDescriptor {
    pub size: u16,
    pub value_type: u16,
}

pub(crate) fn render_value(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
    pair: &TemplateArgPair,
    descriptor: ValueDescriptor,
    out: &mut String,
) -> DeserializationResult<()> {
    let size = usize::from(descriptor.size);
    let start = ctx.cursor.pos();
    let key = pair.key.as_str();

    match descriptor.value_type {
        // Void: occupies its bytes but renders nothing.
        0x00 => {}

        // UTF-16LE string
        0x01 => {
            let s = read_utf16_by_size(&mut ctx.cursor, size)?;
            let _ = write!(out, "'{key}':'{s}', ");
        }

        // UInt8
        0x04 => {
            let v = ctx.cursor.u8_named("uint8_value")?;
            let _ = write!(out, "'{key}':{v:02}, ");
        }

        // UInt16, with event-ID annotation
        0x06 => {
            let v = ctx.cursor.u16_named("uint16_value")?;
            match state.descriptions.get(v).filter(|_| key == "EventID") {
                Some(description) => {
                    let _ = write!(out, "'{key}':{v:04} ({description}), ");
                }
                None => {
                    let _ = write!(out, "'{key}':{v:04}, ");
                }
            }
        }

        // UInt32, with logon-type and IPv4 annotations
        0x08 => {
            let v = ctx.cursor.u32_named("uint32_value")?;
            if key == "LogonType" {
                match logon_type_name(v) {
                    Some(name) => {
                        let _ = write!(out, "'{key}':{v:08} ({name}), ");
                    }
                    None => {
                        let _ = write!(out, "'{key}':{v:08}, ");
                    }
                }
            } else if key == "Address1" || key == "Address2" {
                let octets = v.to_le_bytes();
                let _ = write!(
                    out,
                    "'{key}':{v:08} ({}.{}.{}.{}), ",
                    octets[0], octets[1], octets[2], octets[3]
                );
            } else {
                let _ = write!(out, "'{key}':{v:08}, ");
            }
        }

        // UInt64
        0x0a => {
            let v = ctx.cursor.u64_named("uint64_value")?;
            let _ = write!(out, "'{key}':{v:016}, ");
        }

        // Binary
        0x0e => {
            let bytes = ctx.cursor.take_bytes(size, "binary_value")?;
            let _ = write!(out, "'{key}':");
            for b in bytes {
                let _ = write!(out, "{b:02X}");
            }
            out.push_str(", ");
        }

        // GUID
        0x0f => {
            let guid = Guid::from_cursor(&mut ctx.cursor)?;
            let _ = write!(out, "'{key}':{guid}, ");
        }

        // FILETIME; unrepresentable values fall back to raw hex
        0x11 => {
            let filetime = ctx.cursor.u64_named("filetime_value")?;
            match datetime_from_filetime(filetime) {
                Some(datetime) => {
                    let _ = write!(out, "'{key}':{}, ", datetime.format("%Y.%m.%d-%H:%M:%S"));
                }
                None => {
                    let _ = write!(out, "'{key}':{filetime:016X}, ");
                }
            }
        }

        // SID
        0x13 => {
            let sid = Sid::from_cursor_sized(&mut ctx.cursor, descriptor.size)?;
            let _ = write!(out, "'{key}':{sid}, ");
        }

        // HexInt32 / HexInt64
        0x14 => {
            let v = ctx.cursor.u32_named("hex32_value")?;
            let _ = write!(out, "'{key}':{v:08X}, ");
        }
        0x15 => {
            let v = ctx.cursor.u64_named("hex64_value")?;
            let _ = write!(out, "'{key}':{v:016X}, ");
        }

        // Embedded BinXml: decode over a child window, keep the record even
        // if the substructure is broken.
        0x21 => {
            let mut embedded = ParseCtx::new(ctx.cursor.sub_window(size));
            if let Err(e) = decode_fragment(&mut embedded, state, out) {
                debug!("embedded binxml value under '{key}' failed: {e}");
            }
        }

        // Array of NUL-separated UTF-16LE strings
        0x81 => {
            let mut window = ctx.cursor.sub_window(size);
            let _ = write!(out, "'{key}':[");

            let mut in_string = false;
            while let Ok(unit) = window.u16_named("string_array_unit") {
                let unit = match unit {
                    0x000d | 0x000a => 0x0020,
                    other => other,
                };

                if unit == 0x0000 {
                    if in_string {
                        out.push_str("',");
                        in_string = false;
                    }
                } else {
                    if !in_string {
                        out.push('\'');
                        in_string = true;
                    }
                    out.push(decode_utf16_unit(unit));
                }
            }

            if in_string {
                out.push('\'');
            }
            out.push_str("], ");
        }

        unknown => {
            let _ = write!(
                out,
                "'{key}':'...//{:04X}[{:04X}]', ",
                pair.value_type, descriptor.size
            );
            debug!("unhandled value type {unknown:#06x} under '{key}', skipping {size} bytes");
        }
    }

    // Each value blob occupies exactly its declared length.
    let expected = start + size;
    if ctx.cursor.pos() != expected {
        if ctx.cursor.pos() > expected {
            warn!(
                "value under '{key}' consumed {} bytes past its declared size {size}",
                ctx.cursor.pos() - expected
            );
        }
        ctx.cursor.set_pos(expected);
    }

    Ok(())
}
