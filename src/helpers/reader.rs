use crate::error::InformeError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

/// Seekable source for spreadsheet containers: a file on disk or bytes already in memory.
pub(crate) enum SourceReader {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl SourceReader {
    pub(crate) fn open(path: &Path) -> Result<SourceReader, InformeError> {
        let file = File::open(path)?;
        Ok(SourceReader::File(BufReader::new(file)))
    }

    pub(crate) fn from_bytes(bytes: Vec<u8>) -> SourceReader {
        SourceReader::Memory(Cursor::new(bytes))
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceReader::File(reader) => reader.read(buf),
            SourceReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceReader::File(reader) => reader.seek(pos),
            SourceReader::Memory(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_local_file() {
        let result = SourceReader::open(Path::new("Cargo.toml"));
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());

        let result = SourceReader::open(Path::new("non_existent_file.xlsx"));
        assert!(result.is_err(), "Should fail to open non-existent file");
    }

    #[test]
    fn read_from_memory() {
        let mut reader = SourceReader::from_bytes(b"PK\x03\x04".to_vec());
        let mut buffer = [0u8; 2];
        reader.read_exact(&mut buffer).unwrap();
        assert_eq!(&buffer, b"PK");
        reader.seek(std::io::SeekFrom::Start(0)).unwrap();
        reader.read_exact(&mut buffer).unwrap();
        assert_eq!(&buffer, b"PK");
    }
}
