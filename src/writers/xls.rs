//! BIFF8 (`.xls`) workbook writer.
//!
//! Produces a minimal Excel 97-2003 workbook: a globals substream (fonts,
//! cell formats, one sheet entry, shared string table) followed by one
//! worksheet substream holding NUMBER and LABELSST cells, all stored as the
//! `Workbook` stream of an OLE compound file.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

use cfb::{CompoundFile, Version};

use crate::error::Result;
use crate::table::{Cell, Table};

use super::{persist, write_error, SheetWriter, SHEET_NAME};

/// BIFF8 sheet limits
pub const MAX_ROWS: usize = 65_536;
pub const MAX_COLUMNS: usize = 256;
pub const MAX_STRING_CHARS: usize = 32_767;

/// Largest record payload before a CONTINUE record is needed
const MAX_RECORD_DATA: usize = 8224;

/// Streams smaller than this would land in the mini stream, which Excel rejects
const MIN_STREAM_SIZE: usize = 4096;

const BIFF8_VERSION: u16 = 0x0600;
const SUBSTREAM_GLOBALS: u16 = 0x0005;
const SUBSTREAM_WORKSHEET: u16 = 0x0010;

/// Index of the default cell XF written after the 15 style XFs
const DEFAULT_CELL_XF: u16 = 15;

mod record {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const CODEPAGE: u16 = 0x0042;
    pub const WINDOW1: u16 = 0x003D;
    pub const FONT: u16 = 0x0031;
    pub const XF: u16 = 0x00E0;
    pub const STYLE: u16 = 0x0293;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SST: u16 = 0x00FC;
    pub const CONTINUE: u16 = 0x003C;
    pub const EXTSST: u16 = 0x00FF;
    pub const DIMENSIONS: u16 = 0x0200;
    pub const WINDOW2: u16 = 0x023E;
    pub const NUMBER: u16 = 0x0203;
    pub const LABELSST: u16 = 0x00FD;
}

/// Writes legacy `.xls` workbooks
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsWriter;

impl SheetWriter for XlsWriter {
    fn write(&self, table: &Table, output_path: &Path) -> Result<()> {
        if table.row_count() > MAX_ROWS {
            return Err(write_error(
                output_path,
                format!(
                    "{} rows exceed the .xls limit of {}",
                    table.row_count(),
                    MAX_ROWS
                ),
            ));
        }
        if table.max_columns() > MAX_COLUMNS {
            return Err(write_error(
                output_path,
                format!(
                    "{} columns exceed the .xls limit of {}",
                    table.max_columns(),
                    MAX_COLUMNS
                ),
            ));
        }

        if let Some((row, col, _)) = table.cells().find(|(_, _, cell)| {
            cell.as_text()
                .is_some_and(|s| s.encode_utf16().count() > MAX_STRING_CHARS)
        }) {
            return Err(write_error(
                output_path,
                format!(
                    "text in row {}, column {} exceeds {} characters",
                    row + 1,
                    col + 1,
                    MAX_STRING_CHARS
                ),
            ));
        }

        let stream = workbook_stream(table);
        let bytes = compound_file(&stream).map_err(|e| write_error(output_path, e))?;
        persist(output_path, &bytes)
    }
}

/// Wraps the workbook stream in a version 3 OLE compound document
/// (512-byte sectors), the layout Excel 97-2003 readers expect
fn compound_file(stream: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut comp = CompoundFile::create_with_version(Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut workbook = comp.create_stream("/Workbook")?;
        workbook.write_all(stream)?;
        workbook.flush()?;
    }
    comp.flush()?;
    Ok(comp.into_inner().into_inner())
}

/// Builds the complete BIFF8 workbook stream for `table`; rows and
/// columns must already be within the format limits
fn workbook_stream(table: &Table) -> Vec<u8> {
    let strings = SharedStrings::collect(table);
    let mut out = BiffBuffer::default();

    out.record(record::BOF, &bof(SUBSTREAM_GLOBALS));
    out.record(record::CODEPAGE, &1200u16.to_le_bytes()); // UTF-16
    out.record(record::WINDOW1, &window1());
    // Font index 4 is never referenced, so five records cover indices 0-5
    for _ in 0..5 {
        out.record(record::FONT, &font("Arial"));
    }
    for _ in 0..DEFAULT_CELL_XF {
        out.record(record::XF, &xf(true));
    }
    out.record(record::XF, &xf(false));
    // Built-in "Normal" style bound to XF 0
    out.record(record::STYLE, &[0x00, 0x80, 0x00, 0xFF]);

    let sheet_offset_pos = out.len() + 4;
    out.record(record::BOUNDSHEET, &boundsheet(SHEET_NAME));

    strings.write(&mut out);
    out.record(record::EOF, &[]);

    let sheet_offset = out.len() as u32;
    out.patch_u32(sheet_offset_pos, sheet_offset);

    write_sheet(&mut out, table, &strings);

    let mut bytes = out.into_bytes();
    if bytes.len() < MIN_STREAM_SIZE {
        bytes.resize(MIN_STREAM_SIZE, 0);
    }
    bytes
}

fn write_sheet(out: &mut BiffBuffer, table: &Table, strings: &SharedStrings) {
    out.record(record::BOF, &bof(SUBSTREAM_WORKSHEET));

    let mut dims = Vec::with_capacity(14);
    dims.extend_from_slice(&0u32.to_le_bytes());
    dims.extend_from_slice(&(table.row_count() as u32).to_le_bytes());
    dims.extend_from_slice(&0u16.to_le_bytes());
    dims.extend_from_slice(&(table.max_columns() as u16).to_le_bytes());
    dims.extend_from_slice(&0u16.to_le_bytes());
    out.record(record::DIMENSIONS, &dims);

    out.record(record::WINDOW2, &window2());

    for (row, col, cell) in table.cells() {
        let mut data = Vec::with_capacity(14);
        data.extend_from_slice(&(row as u16).to_le_bytes());
        data.extend_from_slice(&(col as u16).to_le_bytes());
        data.extend_from_slice(&DEFAULT_CELL_XF.to_le_bytes());

        match cell {
            Cell::Number(n) => {
                data.extend_from_slice(&n.to_le_bytes());
                out.record(record::NUMBER, &data);
            }
            Cell::Text(s) => {
                let Some(index) = strings.index_of(s) else {
                    continue;
                };
                data.extend_from_slice(&index.to_le_bytes());
                out.record(record::LABELSST, &data);
            }
        }
    }

    out.record(record::EOF, &[]);
}

/// Byte buffer of BIFF records
#[derive(Default)]
struct BiffBuffer {
    bytes: Vec<u8>,
}

impl BiffBuffer {
    fn record(&mut self, kind: u16, data: &[u8]) {
        debug_assert!(data.len() <= MAX_RECORD_DATA);
        self.bytes.extend_from_slice(&kind.to_le_bytes());
        self.bytes.extend_from_slice(&(data.len() as u16).to_le_bytes());
        self.bytes.extend_from_slice(data);
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn patch_u32(&mut self, pos: usize, value: u32) {
        self.bytes[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Shared string table: unique non-empty texts in first-seen order
struct SharedStrings {
    unique: Vec<String>,
    index: HashMap<String, u32>,
    total: u32,
}

impl SharedStrings {
    fn collect(table: &Table) -> Self {
        let mut unique = Vec::new();
        let mut index = HashMap::new();
        let mut total = 0u32;

        for (_, _, cell) in table.cells() {
            let Cell::Text(s) = cell else { continue };
            if s.is_empty() {
                continue;
            }
            total += 1;
            if !index.contains_key(s) {
                index.insert(s.clone(), unique.len() as u32);
                unique.push(s.clone());
            }
        }

        Self {
            unique,
            index,
            total,
        }
    }

    fn index_of(&self, s: &str) -> Option<u32> {
        self.index.get(s).copied()
    }

    /// Strings between EXTSST bucket marks
    fn bucket_size(&self) -> usize {
        (self.unique.len() / 128 + 1).max(8)
    }

    /// Emits SST (split into CONTINUE records as needed) followed by EXTSST
    fn write(&self, out: &mut BiffBuffer) {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut current = Vec::with_capacity(MAX_RECORD_DATA);
        current.extend_from_slice(&self.total.to_le_bytes());
        current.extend_from_slice(&(self.unique.len() as u32).to_le_bytes());

        // (chunk index, offset within chunk) of every bucket's first string
        let mut marks: Vec<(usize, usize)> = Vec::new();
        let bucket_size = self.bucket_size();

        for (i, s) in self.unique.iter().enumerate() {
            let units: Vec<u16> = s.encode_utf16().collect();

            // The 3-byte header and the first character must share a record
            let needed = 3 + if units.is_empty() { 0 } else { 2 };
            if current.len() + needed > MAX_RECORD_DATA {
                chunks.push(std::mem::replace(
                    &mut current,
                    Vec::with_capacity(MAX_RECORD_DATA),
                ));
            }

            if i % bucket_size == 0 {
                marks.push((chunks.len(), current.len()));
            }

            current.extend_from_slice(&(units.len() as u16).to_le_bytes());
            current.push(0x01); // uncompressed UTF-16LE

            let mut remaining = units.as_slice();
            while !remaining.is_empty() {
                let room = (MAX_RECORD_DATA - current.len()) / 2;
                if room == 0 {
                    chunks.push(std::mem::replace(
                        &mut current,
                        Vec::with_capacity(MAX_RECORD_DATA),
                    ));
                    // Continued character data restates its encoding
                    current.push(0x01);
                    continue;
                }
                let take = room.min(remaining.len());
                for unit in &remaining[..take] {
                    current.extend_from_slice(&unit.to_le_bytes());
                }
                remaining = &remaining[take..];
            }
        }
        chunks.push(current);

        let mut starts = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            starts.push(out.len());
            let kind = if i == 0 { record::SST } else { record::CONTINUE };
            out.record(kind, chunk);
        }

        let mut extsst = Vec::with_capacity(2 + marks.len() * 8);
        extsst.extend_from_slice(&(bucket_size as u16).to_le_bytes());
        for (chunk, offset) in marks {
            let in_record = 4 + offset;
            extsst.extend_from_slice(&((starts[chunk] + in_record) as u32).to_le_bytes());
            extsst.extend_from_slice(&(in_record as u16).to_le_bytes());
            extsst.extend_from_slice(&0u16.to_le_bytes());
        }
        out.record(record::EXTSST, &extsst);
    }
}

fn bof(substream: u16) -> [u8; 16] {
    let mut data = [0u8; 16];
    data[0..2].copy_from_slice(&BIFF8_VERSION.to_le_bytes());
    data[2..4].copy_from_slice(&substream.to_le_bytes());
    data[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    data[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year
    data[12..16].copy_from_slice(&0x0006u32.to_le_bytes()); // lowest BIFF version
    data
}

fn window1() -> [u8; 18] {
    let fields: [u16; 9] = [
        0x0000, // horizontal position
        0x0000, // vertical position
        0x25BC, // width
        0x1572, // height
        0x0038, // show scroll bars and sheet tabs
        0x0000, // active sheet
        0x0000, // first visible tab
        0x0001, // selected sheets
        0x0258, // tab bar width ratio
    ];
    let mut data = [0u8; 18];
    for (i, field) in fields.iter().enumerate() {
        data[i * 2..i * 2 + 2].copy_from_slice(&field.to_le_bytes());
    }
    data
}

fn font(name: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(16 + name.len());
    data.extend_from_slice(&200u16.to_le_bytes()); // 10pt in twips
    data.extend_from_slice(&0u16.to_le_bytes()); // attributes
    data.extend_from_slice(&0x7FFFu16.to_le_bytes()); // automatic colour
    data.extend_from_slice(&400u16.to_le_bytes()); // normal weight
    data.extend_from_slice(&0u16.to_le_bytes()); // no super/subscript
    data.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    data.push(name.len() as u8);
    data.push(0x00); // compressed latin-1
    data.extend_from_slice(name.as_bytes());
    data
}

fn xf(style: bool) -> [u8; 20] {
    let mut data = [0u8; 20];
    // Style XFs have no parent (0xFFF) and the style bit set; cells inherit XF 0
    let flags: u16 = if style { 0xFFF5 } else { 0x0001 };
    data[4..6].copy_from_slice(&flags.to_le_bytes());
    data[6] = 0x20; // bottom aligned
    if style {
        data[9] = 0xF4; // attribute groups not set by this style
    }
    // Default pattern colours: foreground 64, background 65
    data[18..20].copy_from_slice(&0x20C0u16.to_le_bytes());
    data
}

fn boundsheet(name: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + name.len());
    data.extend_from_slice(&0u32.to_le_bytes()); // patched with the sheet BOF offset
    data.push(0x00); // visible
    data.push(0x00); // worksheet
    data.push(name.len() as u8);
    data.push(0x00); // compressed latin-1
    data.extend_from_slice(name.as_bytes());
    data
}

fn window2() -> [u8; 18] {
    let mut data = [0u8; 18];
    data[0..2].copy_from_slice(&0x06B6u16.to_le_bytes()); // gridlines, headers, selected
    data[6..8].copy_from_slice(&0x0040u16.to_le_bytes()); // default gridline colour
    data
}
