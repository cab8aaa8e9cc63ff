//! EOF container (EIP-3540) header and body codec.

use alloy::primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{EofDecodeError, EofEncodeError};

use super::opcode;

pub const EOF_MAGIC: u16 = 0xEF00;
pub const EOF_MAGIC_BYTES: [u8; 2] = [0xEF, 0x00];
pub const EOF_VERSION: u8 = 1;

pub const KIND_TERMINAL: u8 = 0x00;
pub const KIND_TYPES: u8 = 0x01;
pub const KIND_CODE: u8 = 0x02;
pub const KIND_CONTAINER: u8 = 0x03;
pub const KIND_DATA: u8 = 0x04;

pub const MAX_CODE_SECTIONS: usize = 1024;
pub const MAX_CONTAINER_SECTIONS: usize = 256;

const TYPES_ENTRY_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypesSection {
    pub inputs: u8,
    pub outputs: u8,
    pub max_stack_size: u16,
}

impl TypesSection {
    /// Outputs marker of a function that never returns.
    pub const NON_RETURNING: u8 = 0x80;

    pub fn new(inputs: u8, outputs: u8, max_stack_size: u16) -> Self {
        Self {
            inputs,
            outputs,
            max_stack_size,
        }
    }

    pub fn is_non_returning(&self) -> bool {
        self.outputs == Self::NON_RETURNING
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.inputs);
        buffer.push(self.outputs);
        buffer.extend_from_slice(&self.max_stack_size.to_be_bytes());
    }

    pub fn decode(input: &[u8]) -> Result<(Self, &[u8]), EofDecodeError> {
        let (input, inputs) = consume_u8(input)?;
        let (input, outputs) = consume_u8(input)?;
        let (input, max_stack_size) = consume_u16(input)?;

        let section = Self::new(inputs, outputs, max_stack_size);
        section.validate()?;
        Ok((section, input))
    }

    pub fn validate(&self) -> Result<(), EofDecodeError> {
        if self.inputs > 0x7f || self.outputs > 0x80 || self.max_stack_size > 0x03ff {
            return Err(EofDecodeError::InvalidTypesSection);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EofHeader {
    pub types_size: u16,
    pub code_sizes: Vec<u16>,
    pub container_sizes: Vec<u16>,
    pub data_size: u16,
    pub sum_code_sizes: usize,
    pub sum_container_sizes: usize,
}

impl EofHeader {
    /// Encoded length of the header itself.
    pub fn size(&self) -> usize {
        let containers = if self.container_sizes.is_empty() {
            0
        } else {
            3 + 2 * self.container_sizes.len()
        };

        // magic, version, types, code kind + count, code sizes, data, terminator
        2 + 1 + 3 + 3 + 2 * self.code_sizes.len() + containers + 3 + 1
    }

    pub fn types_count(&self) -> usize {
        self.types_size as usize / TYPES_ENTRY_SIZE
    }

    pub fn body_size(&self) -> usize {
        self.types_size as usize
            + self.sum_code_sizes
            + self.sum_container_sizes
            + self.data_size as usize
    }

    pub fn eof_size(&self) -> usize {
        self.size() + self.body_size()
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&EOF_MAGIC_BYTES);
        buffer.push(EOF_VERSION);

        buffer.push(KIND_TYPES);
        buffer.extend_from_slice(&self.types_size.to_be_bytes());

        buffer.push(KIND_CODE);
        buffer.extend_from_slice(&(self.code_sizes.len() as u16).to_be_bytes());
        for size in &self.code_sizes {
            buffer.extend_from_slice(&size.to_be_bytes());
        }

        if !self.container_sizes.is_empty() {
            buffer.push(KIND_CONTAINER);
            buffer.extend_from_slice(&(self.container_sizes.len() as u16).to_be_bytes());
            for size in &self.container_sizes {
                buffer.extend_from_slice(&size.to_be_bytes());
            }
        }

        buffer.push(KIND_DATA);
        buffer.extend_from_slice(&self.data_size.to_be_bytes());
        buffer.push(KIND_TERMINAL);
    }

    /// Decodes the header and returns it along with the remaining input.
    pub fn decode(input: &[u8]) -> Result<(Self, &[u8]), EofDecodeError> {
        let (input, magic) = consume_u16(input)?;
        if magic != EOF_MAGIC {
            return Err(EofDecodeError::InvalidEofMagic);
        }

        let (input, version) = consume_u8(input)?;
        if version != EOF_VERSION {
            return Err(EofDecodeError::InvalidEofVersion);
        }

        let (input, kind) = consume_u8(input)?;
        if kind != KIND_TYPES {
            return Err(EofDecodeError::InvalidTypesKind);
        }

        let (input, types_size) = consume_u16(input)?;
        if types_size as usize % TYPES_ENTRY_SIZE != 0 {
            return Err(EofDecodeError::InvalidTypesSectionSize);
        }

        let (input, kind) = consume_u8(input)?;
        if kind != KIND_CODE {
            return Err(EofDecodeError::InvalidCodeKind);
        }

        let (input, code_sizes, sum_code_sizes) = consume_sizes(input, MAX_CODE_SECTIONS)
            .map_err(|err| match err {
                SizesError::Zero => EofDecodeError::ZeroCodeSections,
                SizesError::TooMany => EofDecodeError::TooManyCodeSections,
                SizesError::Decode(err) => err,
            })?;

        if code_sizes.len() != types_size as usize / TYPES_ENTRY_SIZE {
            return Err(EofDecodeError::MismatchCodeAndTypesSize);
        }

        let (input, kind) = consume_u8(input)?;
        let (input, container_sizes, sum_container_sizes, kind) = if kind == KIND_CONTAINER {
            let (input, sizes, sum) = consume_sizes(input, MAX_CONTAINER_SECTIONS).map_err(
                |err| match err {
                    SizesError::Zero => EofDecodeError::ZeroContainerSections,
                    SizesError::TooMany => EofDecodeError::TooManyContainerSections,
                    SizesError::Decode(err) => err,
                },
            )?;
            let (input, kind) = consume_u8(input)?;
            (input, sizes, sum, kind)
        } else {
            (input, Vec::new(), 0, kind)
        };

        if kind != KIND_DATA {
            return Err(EofDecodeError::InvalidDataKind);
        }
        let (input, data_size) = consume_u16(input)?;

        let (input, terminator) = consume_u8(input)?;
        if terminator != KIND_TERMINAL {
            return Err(EofDecodeError::InvalidTerminalByte);
        }

        let header = Self {
            types_size,
            code_sizes,
            container_sizes,
            data_size,
            sum_code_sizes,
            sum_container_sizes,
        };

        Ok((header, input))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EofBody {
    pub types_section: Vec<TypesSection>,
    pub code_section: Vec<Bytes>,
    pub container_section: Vec<Bytes>,
    pub data_section: Bytes,
    pub is_data_filled: bool,
}

impl EofBody {
    pub fn code(&self, index: usize) -> Option<&Bytes> {
        self.code_section.get(index)
    }

    /// Header describing this body as it currently stands. Every section
    /// size must fit the header's 16 bit fields.
    pub fn calc_header(&self) -> Result<EofHeader, EofEncodeError> {
        if self.code_section.len() > MAX_CODE_SECTIONS {
            return Err(EofEncodeError::TooManyCodeSections);
        }
        if self.container_section.len() > MAX_CONTAINER_SECTIONS {
            return Err(EofEncodeError::TooManyContainerSections);
        }

        let code_sizes = section_sizes(&self.code_section)?;
        let container_sizes = section_sizes(&self.container_section)?;

        Ok(EofHeader {
            types_size: section_size(self.types_section.len() * TYPES_ENTRY_SIZE)?,
            sum_code_sizes: code_sizes.iter().map(|s| *s as usize).sum(),
            sum_container_sizes: container_sizes.iter().map(|s| *s as usize).sum(),
            code_sizes,
            container_sizes,
            data_size: section_size(self.data_section.len())?,
        })
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) {
        for types in &self.types_section {
            types.encode(buffer);
        }
        for code in &self.code_section {
            buffer.extend_from_slice(code);
        }
        for container in &self.container_section {
            buffer.extend_from_slice(container);
        }
        buffer.extend_from_slice(&self.data_section);
    }

    pub fn into_eof(self) -> Result<Eof, EofEncodeError> {
        let header = self.calc_header()?;
        Ok(self.assemble(header))
    }

    fn assemble(self, header: EofHeader) -> Eof {
        let mut buffer = Vec::with_capacity(header.eof_size());
        header.encode(&mut buffer);
        self.encode(&mut buffer);

        Eof {
            header,
            body: self,
            raw: buffer.into(),
        }
    }

    /// Splits `input` (the whole container) into sections using the sizes
    /// declared in `header`.
    pub fn decode(input: &Bytes, header: &EofHeader) -> Result<Self, EofDecodeError> {
        let header_len = header.size();
        let partial_body_len =
            header.types_size as usize + header.sum_code_sizes + header.sum_container_sizes;

        if input.len() < header_len + partial_body_len {
            return Err(EofDecodeError::MissingBodyWithoutData);
        }
        if input.len() > header.eof_size() {
            return Err(EofDecodeError::DanglingData);
        }

        let mut body = Self::default();

        let types_end = header_len + header.types_size as usize;
        let mut types_input = &input[header_len..types_end];
        for _ in 0..header.types_count() {
            let (section, rest) = TypesSection::decode(types_input)?;
            body.types_section.push(section);
            types_input = rest;
        }

        let mut start = types_end;
        for size in &header.code_sizes {
            let end = start + *size as usize;
            body.code_section.push(input.slice(start..end));
            start = end;
        }
        for size in &header.container_sizes {
            let end = start + *size as usize;
            body.container_section.push(input.slice(start..end));
            start = end;
        }

        body.data_section = input.slice(start..);
        body.is_data_filled = body.data_section.len() == header.data_size as usize;

        if body.types_section.len() != body.code_section.len() {
            return Err(EofDecodeError::MismatchCodeAndTypesSize);
        }

        Ok(body)
    }
}

/// A decoded EOF container together with its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Eof {
    pub header: EofHeader,
    pub body: EofBody,
    pub raw: Bytes,
}

impl Default for Eof {
    fn default() -> Self {
        let body = EofBody {
            types_section: vec![TypesSection::new(0, TypesSection::NON_RETURNING, 0)],
            code_section: vec![Bytes::from_static(&[opcode::STOP])],
            container_section: Vec::new(),
            data_section: Bytes::new(),
            is_data_filled: true,
        };
        let header = EofHeader {
            types_size: TYPES_ENTRY_SIZE as u16,
            code_sizes: vec![1],
            container_sizes: Vec::new(),
            data_size: 0,
            sum_code_sizes: 1,
            sum_container_sizes: 0,
        };
        body.assemble(header)
    }
}

impl Eof {
    pub fn new(body: EofBody) -> Result<Self, EofEncodeError> {
        body.into_eof()
    }

    pub fn size(&self) -> usize {
        self.header.eof_size()
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn data(&self) -> &[u8] {
        &self.body.data_section
    }

    /// Data section bytes in `offset..offset + len`, clamped to what exists.
    pub fn data_slice(&self, offset: usize, len: usize) -> &[u8] {
        let data = self.data();
        let start = offset.min(data.len());
        let end = offset.saturating_add(len).min(data.len());
        &data[start..end]
    }

    pub fn decode(raw: Bytes) -> Result<Self, EofDecodeError> {
        let (header, _) = EofHeader::decode(&raw)?;
        let body = EofBody::decode(&raw, &header)?;
        Ok(Self { header, body, raw })
    }
}

enum SizesError {
    Zero,
    TooMany,
    Decode(EofDecodeError),
}

impl From<EofDecodeError> for SizesError {
    fn from(err: EofDecodeError) -> Self {
        Self::Decode(err)
    }
}

fn consume_u8(input: &[u8]) -> Result<(&[u8], u8), EofDecodeError> {
    match input.split_first() {
        Some((byte, rest)) => Ok((rest, *byte)),
        None => Err(EofDecodeError::MissingInput),
    }
}

fn consume_u16(input: &[u8]) -> Result<(&[u8], u16), EofDecodeError> {
    if input.len() < 2 {
        return Err(EofDecodeError::MissingInput);
    }
    let (value, rest) = input.split_at(2);
    Ok((rest, u16::from_be_bytes([value[0], value[1]])))
}

fn consume_sizes(input: &[u8], max: usize) -> Result<(&[u8], Vec<u16>, usize), SizesError> {
    let (mut input, count) = consume_u16(input)?;
    if count == 0 {
        return Err(SizesError::Zero);
    }
    if count as usize > max {
        return Err(SizesError::TooMany);
    }

    let mut sizes = Vec::with_capacity(count as usize);
    let mut sum = 0;
    for _ in 0..count {
        let (rest, size) = consume_u16(input)?;
        if size == 0 {
            return Err(EofDecodeError::ZeroSize.into());
        }
        sizes.push(size);
        sum += size as usize;
        input = rest;
    }

    Ok((input, sizes, sum))
}

fn section_size(len: usize) -> Result<u16, EofEncodeError> {
    u16::try_from(len).map_err(|_| EofEncodeError::SectionTooLarge(len))
}

fn section_sizes(sections: &[Bytes]) -> Result<Vec<u16>, EofEncodeError> {
    sections.iter().map(|section| section_size(section.len())).collect()
}
