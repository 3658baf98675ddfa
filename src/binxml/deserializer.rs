//! The BinXml token loop.
//!
//! A record's payload is a token stream over a window of the chunk buffer.
//! Tokens either manipulate the element/attribute name stack, capture literal
//! values and substitution declarations onto the template being defined, or
//! (for template instances) render an event line. Template bodies and
//! embedded BinXml values recurse through the same loop over child windows.

use crate::binxml::tokens::{
    read_attribute, read_open_start_element, read_substitution, read_template_instance,
    read_value_text,
};
use crate::err::{DeserializationError, DeserializationResult};
use crate::event_descriptions::EventDescriptions;
use crate::name_stack::NameStack;
use crate::template_cache::{TemplateCache, TemplateDescription};
use crate::utils::ByteCursor;

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    Normal,
    InAttribute,
}

/// Decode state scoped to one chunk: the name stack and template cache start
/// fresh at every chunk boundary, the description table is shared for the
/// whole run.
pub(crate) struct ChunkDecodeState<'d> {
    pub name_stack: NameStack,
    pub templates: TemplateCache,
    pub descriptions: &'d EventDescriptions,
}

impl<'d> ChunkDecodeState<'d> {
    pub(crate) fn new(descriptions: &'d EventDescriptions) -> Self {
        ChunkDecodeState {
            name_stack: NameStack::new(),
            templates: TemplateCache::new(),
            descriptions,
        }
    }
}

/// One parse window plus the state that belongs to it. Children are created
/// for template bodies and embedded BinXml values; they never touch their
/// parent except through the parent's explicit offset advance on return.
pub(crate) struct ParseCtx<'a> {
    pub cursor: ByteCursor<'a>,
    pub state: ParseState,
    /// `Some` only while this window is a template body being defined.
    pub template: Option<TemplateDescription>,
    /// Most recent literal value, used for the `Data`/`EventData` key rewrite.
    pub cached_value: String,
}

impl<'a> ParseCtx<'a> {
    pub(crate) fn new(cursor: ByteCursor<'a>) -> Self {
        ParseCtx {
            cursor,
            state: ParseState::Normal,
            template: None,
            cached_value: String::new(),
        }
    }

    pub(crate) fn for_template_body(cursor: ByteCursor<'a>) -> Self {
        ParseCtx {
            cursor,
            state: ParseState::Normal,
            template: Some(TemplateDescription::default()),
            cached_value: String::new(),
        }
    }
}

/// Transitions the parse state, popping the attribute name when the state
/// moves away from `InAttribute`. A transition to the current state is a
/// no-op.
pub(crate) fn set_state(ctx: &mut ParseCtx<'_>, names: &mut NameStack, new_state: ParseState) {
    if ctx.state == new_state {
        return;
    }

    if ctx.state == ParseState::InAttribute {
        names.pop();
    }

    ctx.state = new_state;
}

/// The key a value or substitution renders under.
///
/// Usually the name-stack top; for `<Data>` elements inside `<EventData>`
/// whose `Name` attribute was just captured, the attribute's value takes
/// over so that `<Data Name="X">v</Data>` renders as `X=v`.
pub(crate) fn effective_key<'k>(ctx: &'k ParseCtx<'_>, names: &'k NameStack) -> Option<&'k str> {
    let key = names.top()?;

    if key == "Data" && names.parent() == Some("EventData") && !ctx.cached_value.is_empty() {
        return Some(ctx.cached_value.as_str());
    }

    Some(key)
}

/// Consumes the window one token at a time until the window is exhausted or
/// an end-of-fragment token jumps to its end. Rendered output is appended to
/// `out`; a partially rendered record is left in place when an error unwinds.
pub(crate) fn decode_fragment(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
    out: &mut String,
) -> DeserializationResult<()> {
    ctx.state = ParseState::Normal;

    while ctx.cursor.has_data() {
        let token = ctx.cursor.u8_named("binxml_token")?;
        trace!("Offset `0x{:08x}` - token `0x{:02x}`", ctx.cursor.position() - 1, token);

        match token {
            // End of fragment
            0x00 => ctx.cursor.seek_to_end(),
            // OpenStartElement, with and without attribute list
            0x01 => read_open_start_element(ctx, state, false)?,
            0x41 => read_open_start_element(ctx, state, true)?,
            // CloseStartElement
            0x02 => set_state(ctx, &mut state.name_stack, ParseState::Normal),
            // CloseEmptyElement / CloseElement
            0x03 | 0x04 => {
                set_state(ctx, &mut state.name_stack, ParseState::Normal);
                state.name_stack.pop();
            }
            // ValueText
            0x05 | 0x45 => read_value_text(ctx, state)?,
            // Attribute
            0x06 | 0x46 => read_attribute(ctx, state)?,
            // CDATA / CharRef / EntityRef / PITarget / PIData carry no
            // payload we care about and are skipped tag-only.
            0x07..=0x0b | 0x47..=0x49 => {}
            // TemplateInstance
            0x0c => read_template_instance(ctx, state, out)?,
            // Normal / Optional substitution, treated identically
            0x0d | 0x0e => read_substitution(ctx, state)?,
            // FragmentHeader: major, minor, flags
            0x0f => ctx.cursor.skip(3),
            value => {
                return Err(DeserializationError::InvalidToken {
                    value,
                    offset: ctx.cursor.position() - 1,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_env_logger_initialized;
    use pretty_assertions::assert_eq;

    fn empty_descriptions() -> EventDescriptions {
        EventDescriptions::default()
    }

    #[test]
    fn test_eof_token_jumps_to_window_end() {
        ensure_env_logger_initialized();
        let descriptions = empty_descriptions();
        let mut state = ChunkDecodeState::new(&descriptions);

        // EOF followed by bytes that would be invalid tokens.
        let data = [0x00_u8, 0xFF, 0xFF, 0xFF];
        let mut ctx = ParseCtx::new(ByteCursor::new(&data));
        let mut out = String::new();

        decode_fragment(&mut ctx, &mut state, &mut out).unwrap();
        assert_eq!(out, "");
        assert_eq!(ctx.cursor.pos(), data.len());
    }

    #[test]
    fn test_unknown_token_fails() {
        ensure_env_logger_initialized();
        let descriptions = empty_descriptions();
        let mut state = ChunkDecodeState::new(&descriptions);

        let data = [0x0f_u8, 1, 1, 0, 0xAB];
        let mut ctx = ParseCtx::new(ByteCursor::new(&data));
        let mut out = String::new();

        let err = decode_fragment(&mut ctx, &mut state, &mut out).unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::InvalidToken { value: 0xAB, offset: 4 }
        ));
    }

    #[test]
    fn test_set_state_pops_attribute_name_once() {
        let descriptions = empty_descriptions();
        let mut state = ChunkDecodeState::new(&descriptions);
        let data = [0_u8; 1];
        let mut ctx = ParseCtx::new(ByteCursor::new(&data));

        state.name_stack.push("Element");
        state.name_stack.push("Attribute");
        ctx.state = ParseState::InAttribute;

        set_state(&mut ctx, &mut state.name_stack, ParseState::Normal);
        assert_eq!(state.name_stack.top(), Some("Element"));

        // Already Normal; nothing further is popped.
        set_state(&mut ctx, &mut state.name_stack, ParseState::Normal);
        assert_eq!(state.name_stack.top(), Some("Element"));
    }

    #[test]
    fn test_effective_key_rewrites_data_under_event_data() {
        let descriptions = empty_descriptions();
        let mut state = ChunkDecodeState::new(&descriptions);
        let data = [0_u8; 1];
        let mut ctx = ParseCtx::new(ByteCursor::new(&data));

        state.name_stack.push("EventData");
        state.name_stack.push("Data");

        assert_eq!(effective_key(&ctx, &state.name_stack), Some("Data"));

        ctx.cached_value = "TargetUserName".to_owned();
        assert_eq!(
            effective_key(&ctx, &state.name_stack),
            Some("TargetUserName")
        );

        // Outside EventData the rewrite does not apply.
        state.name_stack.pop();
        state.name_stack.pop();
        state.name_stack.push("System");
        state.name_stack.push("Data");
        assert_eq!(effective_key(&ctx, &state.name_stack), Some("Data"));
    }
}
