use async_std::{
    fs,
    io::{prelude::*, BufReader, Read, Seek, SeekFrom},
    path::Path,
};
use async_trait::async_trait;
use tracing::trace;

use crate::{
    config::Config,
    error::Error,
    index::{decode_record, record_count, record_position, RECORD_LEN},
    line::read_line,
    ReadByLine, Result,
};

/// Reads lines of a file using its index. Holds both files open until it gets dropped.
#[derive(Debug)]
pub struct Locator<S, I>
where
    S: Read + Seek + Unpin + Send,
    I: Read + Seek + Unpin + Send,
{
    source: BufReader<S>,
    index: BufReader<I>,
    lines: u64,
}

impl Locator<fs::File, fs::File> {
    /// Open `source` together with its index located at `index`.
    ///
    /// Returns an error if one of the files is missing or the index length isn't a multiple of the
    /// record length.
    pub async fn open<P, Q>(source: P, index: Q) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let (source, index) = (source.as_ref(), index.as_ref());

        let index_file = fs::File::open(index)
            .await
            .map_err(|e| Error::not_found_as(e, index, Error::MissingIndex))?;
        let source_file = fs::File::open(source)
            .await
            .map_err(|e| Error::not_found_as(e, source, Error::SourceNotFound))?;

        Self::new(source_file, index_file).await
    }

    /// Open `source` using the index path derived from `config`. The index must already exist.
    pub async fn for_source<P: AsRef<Path>>(source: P, config: &Config) -> Result<Self> {
        let source = source.as_ref();
        Self::open(source, config.index_path(source)).await
    }
}

impl<S, I> Locator<S, I>
where
    S: Read + Seek + Unpin + Send,
    I: Read + Seek + Unpin + Send,
{
    /// Creates a new `Locator` reading lines from `source` using the records in `index`.
    pub async fn new(source: S, index: I) -> Result<Self> {
        let mut index = BufReader::new(index);
        let len = index.seek(SeekFrom::End(0)).await?;
        let lines = record_count(len)?;

        Ok(Self {
            source: BufReader::new(source),
            index,
            lines,
        })
    }

    /// Returns the byte offset in the source at which `line` begins.
    pub async fn offset_of(&mut self, line: u64) -> Result<u64> {
        let pos = record_position(line).ok_or(Error::LineNotFound(line))?;
        self.index.seek(SeekFrom::Start(pos)).await?;

        let mut record = Vec::with_capacity(RECORD_LEN);
        let n = (&mut self.index)
            .take(RECORD_LEN as u64)
            .read_until(b'\n', &mut record)
            .await?;

        if n == 0 {
            return Err(Error::LineNotFound(line));
        }

        let offset = decode_record(&record)?;
        trace!(line, index_pos = pos, offset, "decoded index record");
        Ok(offset)
    }
}

#[async_trait]
impl<S, I> ReadByLine for Locator<S, I>
where
    S: Read + Seek + Unpin + Send,
    I: Read + Seek + Unpin + Send,
{
    #[inline]
    fn total_lines(&self) -> u64 {
        self.lines
    }

    async fn read_line_raw(&mut self, line: u64, buf: &mut Vec<u8>) -> Result<usize> {
        let offset = self.offset_of(line).await?;
        self.source.seek(SeekFrom::Start(offset)).await?;

        let (len, term) = read_line(&mut self.source, buf).await?;
        if len + term == 0 {
            return Err(Error::LineNotFound(line));
        }

        Ok(len)
    }
}

/// Reads `line` of `source` using the index at `index`. Both files are closed before this
/// returns.
pub async fn lookup<P, Q>(source: P, index: Q, line: u64) -> Result<String>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Locator::open(source, index).await?.read_line(line).await
}
