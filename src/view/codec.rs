//! SSZ byte encoding of composite views
//!
//! Fixed-size parts are written in place; each variable-size part leaves a
//! 4-byte little-endian offset, relative to the start of the enclosing
//! value, and is appended after all fixed parts.

use super::pack::pack_bytes_to_chunks;
use super::value::assemble;
use super::{unpack_bytes_from_chunks, CompositeView, Encodable, Layout, TreeBacked, TypeDef, View};
use crate::basic::{BasicKind, BasicValue};
use crate::bytes::{check_limit, ByteList, ByteVector};
use crate::hash::Root;
use crate::iter::{FieldIter, ViewIter};
use crate::tree::{zero_node, Node};
use crate::{Error, Result, BYTES_PER_LENGTH_OFFSET};

pub(crate) fn encode_composite(view: &CompositeView, out: &mut Vec<u8>) -> Result<()> {
    let typ = view.type_def();
    let depth = typ.contents_depth();
    match typ.layout() {
        Layout::Packed { kind, .. } => {
            let byte_len = view.length()?.saturating_mul(kind.byte_length() as u64);
            let byte_len = to_usize(byte_len)?;
            out.extend(unpack_bytes_from_chunks(&view.contents()?, depth, byte_len)?);
        }
        Layout::Bits { mixin, .. } => {
            let length = view.length()?;
            let mut bytes =
                unpack_bytes_from_chunks(&view.contents()?, depth, to_usize(length.div_ceil(8))?)?;
            if mixin {
                let delimiter = 1u8 << (length % 8);
                if length % 8 == 0 {
                    bytes.push(delimiter);
                } else {
                    bytes[(length / 8) as usize] |= delimiter;
                }
            }
            out.extend(bytes);
        }
        Layout::Elements { elem, .. } => {
            let fixed = elem.is_fixed_byte_length();
            let parts = ViewIter::new(view.contents()?, depth, elem.clone(), view.length()?)?;
            encode_parts(parts.map(|part| part.map(|v| (fixed, v))), out)?;
        }
        Layout::Fields(def) => {
            let parts = FieldIter::new(view.backing().clone(), def.clone())?;
            let fixed = def.fields.iter().map(|(_, t)| t.is_fixed_byte_length());
            encode_parts(parts.zip(fixed).map(|(part, f)| part.map(|v| (f, v))), out)?;
        }
        Layout::Union(options) => {
            let selector = view.selector()?;
            out.push(selector);
            if let Some(t) = &options[selector as usize] {
                t.view_from_backing(view.backing().get_left()?.clone())?
                    .encode_into(out)?;
            }
        }
        Layout::Basic(_) => {
            return Err(Error::UnsupportedOperation(
                "scalar stored as a composite".into(),
            ))
        }
    }
    Ok(())
}

fn encode_parts<I>(parts: I, out: &mut Vec<u8>) -> Result<()>
where
    I: Iterator<Item = Result<(bool, View)>>,
{
    let start = out.len();
    let mut variable = Vec::new();
    for part in parts {
        let (fixed, view) = part?;
        if fixed {
            view.encode_into(out)?;
        } else {
            variable.push((out.len(), view));
            out.extend_from_slice(&[0u8; BYTES_PER_LENGTH_OFFSET]);
        }
    }
    for (slot, view) in variable {
        let offset = u32::try_from(out.len() - start)
            .map_err(|_| Error::ValueOutOfRange("offset does not fit 4 bytes".into()))?;
        out[slot..slot + BYTES_PER_LENGTH_OFFSET].copy_from_slice(&offset.to_le_bytes());
        view.encode_into(out)?;
    }
    Ok(())
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::ValueOutOfRange(format!("{} bytes do not fit memory", n)))
}

pub(crate) fn decode(typ: &TypeDef, bytes: &[u8]) -> Result<View> {
    match typ {
        TypeDef::ByteVector(n) => return Ok(View::ByteVector(ByteVector::decode(bytes, *n)?)),
        TypeDef::ByteList(limit) => return Ok(View::ByteList(ByteList::decode(bytes, *limit)?)),
        _ => {}
    }
    match typ.layout() {
        Layout::Basic(kind) => {
            if bytes.len() != kind.byte_length() {
                return Err(Error::decode(format!(
                    "{} is {} bytes, got {}",
                    kind,
                    kind.byte_length(),
                    bytes.len()
                )));
            }
            Ok(View::Basic(BasicValue::from_le(kind, bytes)?))
        }
        Layout::Packed { kind, count, mixin } => {
            let size = kind.byte_length();
            if bytes.len() % size != 0 {
                return Err(Error::decode(format!(
                    "{} bytes is not a whole number of {}",
                    bytes.len(),
                    kind
                )));
            }
            let length = (bytes.len() / size) as u64;
            check_decoded_count(typ, count, mixin, length)?;
            if kind == BasicKind::Boolean {
                if let Some(b) = bytes.iter().find(|b| **b > 1) {
                    return Err(Error::decode(format!("invalid boolean byte {:#04x}", b)));
                }
            }
            assemble(typ, &pack_bytes_to_chunks(bytes), length)
        }
        Layout::Bits { count, mixin: false } => {
            let expected = to_usize(count.div_ceil(8))?;
            if bytes.len() != expected {
                return Err(Error::decode(format!(
                    "{} is {} bytes, got {}",
                    typ,
                    expected,
                    bytes.len()
                )));
            }
            let used = count % 8;
            if used != 0 && bytes[expected - 1] >> used != 0 {
                return Err(Error::decode(format!("{} has padding bits set", typ)));
            }
            assemble(typ, &pack_bytes_to_chunks(bytes), count)
        }
        Layout::Bits { count, mixin: true } => {
            let Some((&last, _)) = bytes.split_last() else {
                return Err(Error::decode("empty bitlist has no delimiter"));
            };
            if last == 0 {
                return Err(Error::decode("bitlist is missing its delimiter bit"));
            }
            let top = 7 - last.leading_zeros() as u64;
            let length = (bytes.len() as u64 - 1) * 8 + top;
            check_limit(length, count)?;
            let mut data = bytes.to_vec();
            let end = data.len() - 1;
            data[end] &= !(1u8 << top);
            data.truncate(to_usize(length.div_ceil(8))?);
            assemble(typ, &pack_bytes_to_chunks(&data), length)
        }
        Layout::Elements { elem, count, mixin } => {
            let parts = if elem.is_fixed_byte_length() {
                let size = elem.byte_length()?;
                if size == 0 || bytes.len() % size != 0 {
                    return Err(Error::decode(format!(
                        "{} bytes is not a whole number of {}",
                        bytes.len(),
                        elem
                    )));
                }
                check_decoded_count(typ, count, mixin, (bytes.len() / size) as u64)?;
                bytes.chunks(size).collect()
            } else {
                let parts = split_offsets(bytes)?;
                check_decoded_count(typ, count, mixin, parts.len() as u64)?;
                parts
            };
            let nodes = parts
                .into_iter()
                .map(|part| decode(elem, part).map(|v| v.get_backing()))
                .collect::<Result<Vec<Node>>>()?;
            assemble(typ, &nodes, nodes.len() as u64)
        }
        Layout::Fields(def) => {
            let parts = split_fields(typ, &def.fields, bytes)?;
            let nodes = def
                .fields
                .iter()
                .zip(parts)
                .map(|((_, t), part)| decode(t, part).map(|v| v.get_backing()))
                .collect::<Result<Vec<Node>>>()?;
            assemble(typ, &nodes, nodes.len() as u64)
        }
        Layout::Union(options) => {
            let Some((&selector, rest)) = bytes.split_first() else {
                return Err(Error::decode("union needs a selector byte"));
            };
            let value = match options.get(selector as usize) {
                None => {
                    return Err(Error::decode(format!(
                        "selector {} out of {} options",
                        selector,
                        options.len()
                    )))
                }
                Some(None) if rest.is_empty() => zero_node(0),
                Some(None) => return Err(Error::decode("empty union option with a value")),
                Some(Some(t)) => decode(t, rest)?.get_backing(),
            };
            let backing = Node::pair(value, Node::leaf(Root::from_length(u64::from(selector))));
            Ok(View::Composite(CompositeView::new(typ.clone(), backing)))
        }
    }
}

fn check_decoded_count(typ: &TypeDef, count: u64, mixin: bool, length: u64) -> Result<()> {
    if mixin {
        check_limit(length, count)
    } else if length != count {
        Err(Error::decode(format!(
            "{} needs {} elements, got {}",
            typ, count, length
        )))
    } else {
        Ok(())
    }
}

fn read_offset(bytes: &[u8], at: usize) -> Result<usize> {
    let raw = bytes
        .get(at..at + BYTES_PER_LENGTH_OFFSET)
        .ok_or_else(|| Error::decode(format!("offset at {} runs past the input", at)))?;
    let mut le = [0u8; BYTES_PER_LENGTH_OFFSET];
    le.copy_from_slice(raw);
    Ok(u32::from_le_bytes(le) as usize)
}

/// Slices between consecutive offsets; the last one ends with the input
fn slice_between<'a>(bytes: &'a [u8], offsets: &[usize]) -> Result<Vec<&'a [u8]>> {
    let mut parts = Vec::with_capacity(offsets.len());
    for (i, &start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).copied().unwrap_or(bytes.len());
        if start > end || end > bytes.len() {
            return Err(Error::decode(format!(
                "offsets {}..{} out of order or past {} bytes",
                start,
                end,
                bytes.len()
            )));
        }
        parts.push(&bytes[start..end]);
    }
    Ok(parts)
}

/// Parts of a sequence of variable-size elements: an offset table whose
/// first entry also tells its own length
fn split_offsets(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let first = read_offset(bytes, 0)?;
    if first == 0 || first % BYTES_PER_LENGTH_OFFSET != 0 || first > bytes.len() {
        return Err(Error::decode(format!("invalid first offset {}", first)));
    }
    let count = first / BYTES_PER_LENGTH_OFFSET;
    let offsets = (0..count)
        .map(|i| read_offset(bytes, i * BYTES_PER_LENGTH_OFFSET))
        .collect::<Result<Vec<usize>>>()?;
    slice_between(bytes, &offsets)
}

fn split_fields<'a>(
    typ: &TypeDef,
    fields: &[(String, TypeDef)],
    bytes: &'a [u8],
) -> Result<Vec<&'a [u8]>> {
    let fixed_size: u64 = fields
        .iter()
        .map(|(_, t)| t.fixed_part_length())
        .fold(0, u64::saturating_add);
    if (bytes.len() as u64) < fixed_size {
        return Err(Error::decode(format!(
            "{} needs at least {} bytes, got {}",
            typ,
            fixed_size,
            bytes.len()
        )));
    }
    let fixed_size = fixed_size as usize;
    let mut parts: Vec<Option<&[u8]>> = Vec::with_capacity(fields.len());
    let mut offsets = Vec::new();
    let mut pos = 0;
    for (_, t) in fields {
        if t.is_fixed_byte_length() {
            let size = t.byte_length()?;
            parts.push(Some(&bytes[pos..pos + size]));
            pos += size;
        } else {
            offsets.push(read_offset(bytes, pos)?);
            parts.push(None);
            pos += BYTES_PER_LENGTH_OFFSET;
        }
    }
    match offsets.first() {
        None if bytes.len() != fixed_size => {
            return Err(Error::decode(format!(
                "{} is {} bytes, got {}",
                typ,
                fixed_size,
                bytes.len()
            )))
        }
        Some(&first) if first != fixed_size => {
            return Err(Error::decode(format!(
                "first offset {} does not follow the {} fixed bytes",
                first, fixed_size
            )))
        }
        _ => {}
    }
    let mut variable = slice_between(bytes, &offsets)?.into_iter();
    parts
        .into_iter()
        .map(|part| {
            part.or_else(|| variable.next())
                .ok_or_else(|| Error::decode("missing variable part"))
        })
        .collect()
}
