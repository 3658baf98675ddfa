use crate::binxml::deserializer::{
    decode_fragment, effective_key, set_state, ChunkDecodeState, ParseCtx, ParseState,
};
use crate::binxml::name::BinXmlName;
use crate::binxml::value_render::{render_value, ValueDescriptor};
use crate::err::{DeserializationError, DeserializationResult};
use crate::event_descriptions::parse_leading_u16;
use crate::utils::read_len_prefixed_utf16_string;

use log::{trace, warn};
use std::fmt::Write;

pub(crate) fn read_open_start_element(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
    has_attributes: bool,
) -> DeserializationResult<()> {
    trace!(
        "Offset `0x{:08x}` - OpenStartElement<has_attributes={}>",
        ctx.cursor.position(),
        has_attributes
    );

    let _dependency_identifier = ctx
        .cursor
        .u16_named("open_start_element_dependency_identifier")?;
    let _data_size = ctx.cursor.u32_named("open_start_element_data_size")?;

    let name = BinXmlName::from_binxml_stream(&mut ctx.cursor)?;
    trace!("\t name: {}", name);

    if has_attributes {
        let _attribute_list_data_size = ctx
            .cursor
            .u32_named("open_start_element_attribute_list_data_size")?;
    }

    state.name_stack.push(name.as_str());

    Ok(())
}

pub(crate) fn read_attribute(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
) -> DeserializationResult<()> {
    trace!("Offset `0x{:08x}` - Attribute", ctx.cursor.position());

    let name = BinXmlName::from_binxml_stream(&mut ctx.cursor)?;
    trace!("\t name: {}", name);

    state.name_stack.push(name.as_str());
    set_state(ctx, &mut state.name_stack, ParseState::InAttribute);

    Ok(())
}

/// A literal string value. Captured as a fixed pair on the template under
/// definition, except for the `Name` attribute of a `Data` element whose
/// value instead becomes the cached key for the element's content.
pub(crate) fn read_value_text(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
) -> DeserializationResult<()> {
    trace!("Offset `0x{:08x}` - ValueText", ctx.cursor.position());

    let _string_type = ctx.cursor.u8_named("value_text_string_type")?;
    let value = read_len_prefixed_utf16_string(&mut ctx.cursor, false)?;

    let key = effective_key(ctx, &state.name_stack).map(str::to_owned);
    let parent_is_data = state.name_stack.parent() == Some("Data");

    if let Some(key) = &key {
        let is_data_name_attribute = key == "Name" && parent_is_data;
        if !is_data_name_attribute {
            if let Some(template) = ctx.template.as_mut() {
                template.register_fixed_pair(key, &value);
            }
        }
    }

    set_state(ctx, &mut state.name_stack, ParseState::Normal);

    // `value` is already bounded, so the cached copy cannot outgrow the key
    // scratch it stands in for.
    ctx.cached_value = value;

    Ok(())
}

/// A substitution declaration inside a template body. Normal and optional
/// substitutions carry the same payload and are recorded identically.
pub(crate) fn read_substitution(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
) -> DeserializationResult<()> {
    let substitution_index = ctx.cursor.u16_named("substitution_index")?;
    let mut value_type = ctx.cursor.u8_named("substitution_value_type")?;

    // A null value type defers to the byte that follows it.
    if value_type == 0x00 {
        value_type = ctx.cursor.u8_named("substitution_value_type")?;
    }

    trace!(
        "Offset `0x{:08x}` - Substitution<index={}, type=0x{:02x}>",
        ctx.cursor.position(),
        substitution_index,
        value_type
    );

    let key = effective_key(ctx, &state.name_stack).map(str::to_owned);
    if let Some(template) = ctx.template.as_mut() {
        template.register_arg_pair(key.as_deref(), value_type, substitution_index);
    }

    set_state(ctx, &mut state.name_stack, ParseState::Normal);

    Ok(())
}

/// A template instance: resolves (or defines) the template, renders its fixed
/// pairs, then renders the instance's argument vector.
pub(crate) fn read_template_instance(
    ctx: &mut ParseCtx<'_>,
    state: &mut ChunkDecodeState<'_>,
    out: &mut String,
) -> DeserializationResult<()> {
    trace!("Offset `0x{:08x}` - TemplateInstance", ctx.cursor.position());

    let version = ctx.cursor.u8_named("template_instance_version")?;
    if version != 0x01 {
        return Err(DeserializationError::InvalidTemplateInstanceVersion {
            value: version,
            offset: ctx.cursor.position() - 1,
        });
    }

    let template_id = ctx.cursor.u32_named("template_instance_id")?;
    let _residual_len = ctx.cursor.u32_named("template_instance_residual_len")?;
    let mut number_of_substitutions = ctx.cursor.u32_named("template_instance_substitution_count")?;

    if !state.templates.is_known(template_id) {
        // An inline definition follows: GUID, body length, body.
        let _template_guid = ctx.cursor.array::<16>("template_guid")?;
        let body_len = ctx.cursor.u32_named("template_body_len")? as usize;

        trace!("\t template {:#010x}, inline body of {} bytes", template_id, body_len);

        let mut body_ctx = ParseCtx::for_template_body(ctx.cursor.sub_window(body_len));

        // Register before decoding so the body's own tokens see the ID.
        state.templates.register(template_id);
        decode_fragment(&mut body_ctx, state, out)?;

        let definition = body_ctx.template.take().unwrap_or_default();
        state.templates.insert(template_id, definition);

        ctx.cursor.skip(body_len);

        // The count read before the definition belongs to the definition
        // header; the instance's real count follows the body.
        number_of_substitutions = ctx.cursor.u32_named("template_instance_substitution_count")?;
    }

    // Render from a copy: instances never mutate the cached description, and
    // nested BinXml values may re-enter the cache while we render.
    let template = state
        .templates
        .get(template_id)
        .cloned()
        .unwrap_or_default();

    for pair in template.fixed_pairs() {
        if pair.key == "EventID" {
            let event_id = parse_leading_u16(&pair.value);
            if event_id != 0 {
                if let Some(description) = state.descriptions.get(event_id) {
                    let _ = write!(out, "'{}':{} ({}), ", pair.key, event_id, description);
                    continue;
                }
            }
        }

        let _ = write!(out, "'{}':'{}', ", pair.key, pair.value);
    }

    let count = number_of_substitutions as usize;
    if count > ctx.cursor.remaining() / 4 {
        warn!(
            "Instance of template {:#010x} declares {} substitutions but only {} bytes remain",
            template_id,
            count,
            ctx.cursor.remaining()
        );
        return Err(DeserializationError::Truncated {
            what: "template_instance_value_descriptors",
            offset: ctx.cursor.position(),
            need: count.saturating_mul(4),
            have: ctx.cursor.remaining(),
        });
    }

    let mut value_descriptors = Vec::with_capacity(count);
    for _ in 0..count {
        let size = ctx.cursor.u16_named("value_descriptor_size")?;
        let value_type = ctx.cursor.u16_named("value_descriptor_type")?;
        value_descriptors.push(ValueDescriptor { size, value_type });
    }

    for (index, descriptor) in value_descriptors.iter().enumerate() {
        match template.arg(index as u16) {
            Some(pair) => render_value(ctx, state, pair, *descriptor, out)?,
            // Slots the template never declared still occupy their bytes.
            None => ctx.cursor.skip(usize::from(descriptor.size)),
        }
    }

    Ok(())
}
