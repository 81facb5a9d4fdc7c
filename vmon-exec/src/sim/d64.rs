//! 35 track 1541 disk images.

use crate::error::ExecError;

pub const TRACKS: u8 = 35;
pub const IMAGE_LEN: usize = 174_848;
const BLOCK: usize = 256;
const DIR_TRACK: u8 = 18;
/// Bytes of a file carried by one block; the first two link to the next.
const PAYLOAD: usize = BLOCK - 2;
const PAD: u8 = 0xa0;

const FILE_TYPES: [&str; 5] = ["DEL", "SEQ", "PRG", "USR", "REL"];

pub fn sectors(track: u8) -> u8 {
    match track {
        1..=17 => 21,
        18..=24 => 19,
        25..=30 => 18,
        _ => 17,
    }
}

#[derive(Debug, Clone)]
pub struct D64 {
    data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub file_type: &'static str,
    pub track: u8,
    pub sector: u8,
    pub blocks: u16,
}

impl D64 {
    /// Images with a trailing error table are accepted; the table is dropped.
    pub fn from_bytes(mut data: Vec<u8>) -> Option<Self> {
        if data.len() < IMAGE_LEN {
            return None;
        }
        data.truncate(IMAGE_LEN);
        Some(Self { data })
    }
    /// A freshly formatted image.
    pub fn blank(name: &str, id: &str) -> Self {
        let mut image = Self {
            data: vec![0; IMAGE_LEN],
        };
        let mut bam = [0u8; BLOCK];
        bam[0] = DIR_TRACK;
        bam[1] = 1;
        bam[2] = b'A';
        for track in 1..=TRACKS {
            let entry = 4 + (track as usize - 1) * 4;
            // the BAM and the first directory block are taken
            let first_free = if track == DIR_TRACK { 2 } else { 0 };
            let count = sectors(track);
            bam[entry] = count - first_free;
            for sector in first_free..count {
                bam[entry + 1 + sector as usize / 8] |= 1 << (sector % 8);
            }
        }
        bam[0x90..0xab].fill(PAD);
        write_padded(&mut bam[0x90..0xa0], name);
        write_padded(&mut bam[0xa2..0xa4], id);
        bam[0xa5] = b'2';
        bam[0xa6] = b'A';
        image.block_mut(DIR_TRACK, 0).copy_from_slice(&bam);
        let dir = image.block_mut(DIR_TRACK, 1);
        dir[1] = 0xff;
        image
    }
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn offset(track: u8, sector: u8) -> Option<usize> {
        if !(1..=TRACKS).contains(&track) || sector >= sectors(track) {
            return None;
        }
        let before: usize = (1..track).map(|t| sectors(t) as usize).sum();
        Some((before + sector as usize) * BLOCK)
    }
    fn check(track: i64, sector: i64) -> Result<(u8, u8), ExecError> {
        let bad = ExecError::BadBlock { track, sector };
        let (Ok(t), Ok(s)) = (u8::try_from(track), u8::try_from(sector)) else {
            return Err(bad);
        };
        match Self::offset(t, s) {
            Some(_) => Ok((t, s)),
            None => Err(bad),
        }
    }
    fn block(&self, track: u8, sector: u8) -> &[u8] {
        let offset = Self::offset(track, sector).unwrap_or(0);
        &self.data[offset..offset + BLOCK]
    }
    fn block_mut(&mut self, track: u8, sector: u8) -> &mut [u8] {
        let offset = Self::offset(track, sector).unwrap_or(0);
        &mut self.data[offset..offset + BLOCK]
    }

    pub fn read_block(&self, track: i64, sector: i64) -> Result<Vec<u8>, ExecError> {
        let (t, s) = Self::check(track, sector)?;
        Ok(self.block(t, s).to_vec())
    }
    /// Short data leaves the rest of the block as it was.
    pub fn write_block(&mut self, track: i64, sector: i64, data: &[u8]) -> Result<(), ExecError> {
        let (t, s) = Self::check(track, sector)?;
        let len = data.len().min(BLOCK);
        self.block_mut(t, s)[..len].copy_from_slice(&data[..len]);
        Ok(())
    }

    /// Follows a block chain from `track`/`sector`, at most one lap of the disk.
    fn chain(&self, mut track: u8, mut sector: u8) -> Vec<(u8, u8)> {
        let mut blocks = Vec::new();
        while Self::offset(track, sector).is_some() && blocks.len() < IMAGE_LEN / BLOCK {
            blocks.push((track, sector));
            let block = self.block(track, sector);
            (track, sector) = (block[0], block[1]);
        }
        blocks
    }

    pub fn disk_name(&self) -> (String, String) {
        let bam = self.block(DIR_TRACK, 0);
        (unpad(&bam[0x90..0xa0], ' '), unpad(&bam[0xa2..0xa4], ' '))
    }
    pub fn free_blocks(&self) -> u32 {
        let bam = self.block(DIR_TRACK, 0);
        (1..=TRACKS)
            .filter(|&track| track != DIR_TRACK)
            .map(|track| bam[4 + (track as usize - 1) * 4] as u32)
            .sum()
    }
    pub fn entries(&self) -> Vec<DirEntry> {
        let mut entries = Vec::new();
        for (track, sector) in self.chain(DIR_TRACK, 1) {
            let block = self.block(track, sector);
            for raw in block.chunks(32) {
                let kind = raw[2];
                if kind & 0x07 == 0 && kind & 0x80 == 0 {
                    continue;
                }
                entries.push(DirEntry {
                    name: unpad(&raw[5..0x15], '\0'),
                    file_type: FILE_TYPES.get((kind & 0x07) as usize).copied().unwrap_or("???"),
                    track: raw[3],
                    sector: raw[4],
                    blocks: u16::from_le_bytes([raw[0x1e], raw[0x1f]]),
                });
            }
        }
        entries
    }
    /// The directory as `list` prints it.
    pub fn listing(&self) -> Vec<String> {
        let (name, id) = self.disk_name();
        let mut lines = vec![format!("0 \"{name:<16}\" {id} 2A")];
        for entry in self.entries() {
            let quoted = format!("\"{}\"", entry.name);
            lines.push(format!("{:<5}{quoted:<18} {}", entry.blocks, entry.file_type));
        }
        lines.push(format!("{} BLOCKS FREE.", self.free_blocks()));
        lines
    }

    /// `*` at the end of `pattern` matches any rest of the name.
    pub fn find(&self, pattern: &str) -> Option<DirEntry> {
        let pattern = pattern.to_ascii_uppercase();
        self.entries().into_iter().find(|entry| match pattern.strip_suffix('*') {
            Some(prefix) => entry.name.starts_with(prefix),
            None => entry.name == pattern,
        })
    }
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, ExecError> {
        let entry = self
            .find(name)
            .ok_or_else(|| ExecError::FileNotFound(name.to_owned()))?;
        let mut data = Vec::new();
        for (track, sector) in self.chain(entry.track, entry.sector) {
            let block = self.block(track, sector);
            let end = match block[0] {
                0 => (block[1] as usize + 1).clamp(2, BLOCK),
                _ => BLOCK,
            };
            data.extend_from_slice(&block[2..end]);
        }
        Ok(data)
    }

    fn allocate(&mut self) -> Option<(u8, u8)> {
        for track in (1..=TRACKS).filter(|&t| t != DIR_TRACK) {
            let entry = 4 + (track as usize - 1) * 4;
            for sector in 0..sectors(track) {
                let bam = self.block_mut(DIR_TRACK, 0);
                let bit = 1 << (sector % 8);
                let byte = entry + 1 + sector as usize / 8;
                if bam[byte] & bit != 0 {
                    bam[byte] &= !bit;
                    bam[entry] -= 1;
                    return Some((track, sector));
                }
            }
        }
        None
    }
    /// Stores `data` as a PRG file.
    pub fn write_file(&mut self, name: &str, data: &[u8]) -> Result<(), ExecError> {
        let name = name.to_ascii_uppercase();
        if self.find(&name).is_some() {
            return Err(ExecError::FileExists(name));
        }
        let blocks = data.len().div_ceil(PAYLOAD).max(1);
        if self.free_blocks() < blocks as u32 {
            return Err(ExecError::DiskFull);
        }
        let slot = self.free_slot().ok_or(ExecError::DiskFull)?;
        let mut chain = Vec::with_capacity(blocks);
        for _ in 0..blocks {
            chain.push(self.allocate().ok_or(ExecError::DiskFull)?);
        }
        for (i, &(track, sector)) in chain.iter().enumerate() {
            let part = data.chunks(PAYLOAD).nth(i).unwrap_or(&[]);
            let link = match chain.get(i + 1) {
                Some(&next) => next,
                None => (0, (part.len() + 1) as u8),
            };
            let block = self.block_mut(track, sector);
            block.fill(0);
            (block[0], block[1]) = link;
            block[2..2 + part.len()].copy_from_slice(part);
        }

        let (dir_track, dir_sector, index) = slot;
        let (first_track, first_sector) = chain[0];
        let block = self.block_mut(dir_track, dir_sector);
        let raw = &mut block[index * 32..index * 32 + 32];
        raw[2] = 0x82;
        raw[3] = first_track;
        raw[4] = first_sector;
        raw[5..0x15].fill(PAD);
        write_padded(&mut raw[5..0x15], &name);
        raw[0x1e..0x20].copy_from_slice(&(blocks as u16).to_le_bytes());
        Ok(())
    }
    /// An unused directory entry in the directory blocks already linked.
    fn free_slot(&self) -> Option<(u8, u8, usize)> {
        self.chain(DIR_TRACK, 1).into_iter().find_map(|(track, sector)| {
            let block = self.block(track, sector);
            (0..8)
                .find(|&i| block[i * 32 + 2] == 0)
                .map(|i| (track, sector, i))
        })
    }
}

fn write_padded(field: &mut [u8], text: &str) {
    for (slot, byte) in field.iter_mut().zip(text.bytes()) {
        *slot = byte;
    }
}

fn unpad(field: &[u8], pad: char) -> String {
    let text: String = field
        .iter()
        .map(|&b| if b == PAD { pad } else { b as char })
        .collect();
    text.trim_end_matches(['\0', ' ']).to_owned()
}
