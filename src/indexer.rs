use std::{ffi::OsString, time::Instant};

use async_std::{
    fs,
    io::{prelude::*, BufReader, BufWriter},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::Error,
    index::encode_record,
    line::read_line,
    Result,
};

/// Amount of lines and bytes which were indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Amount of records written, equal to the amount of lines in the file
    pub lines: u64,
    /// Amount of bytes read from the file
    pub bytes: u64,
}

/// Result of building an index for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub index_path: PathBuf,
    pub stats: IndexStats,
}

/// Builds index files.
#[derive(Debug, Clone, Copy)]
pub struct Indexer<'a> {
    config: &'a Config,
}

impl<'a> Indexer<'a> {
    #[inline]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Builds the index for `source` at the path derived from the config, overwriting an existing
    /// index.
    pub async fn build<P: AsRef<Path>>(&self, source: P) -> Result<IndexSummary> {
        let source = source.as_ref();
        let index = self.config.index_path(source);
        self.build_to(source, &index).await
    }

    /// Builds the index for `source` and stores it at `index`, overwriting an existing index.
    ///
    /// The records are written to a temporary file next to `index` which replaces `index` once
    /// everything was written. If indexing fails the temporary file gets removed and `index` stays
    /// untouched.
    pub async fn build_to<P, Q>(&self, source: P, index: Q) -> Result<IndexSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let (source, index) = (source.as_ref(), index.as_ref());
        let start = Instant::now();
        let tmp = tmp_path(index);

        let stats = match write_index_file(source, &tmp).await {
            Ok(stats) => stats,
            Err(err) => {
                if let Err(rm_err) = fs::remove_file(&tmp).await {
                    if rm_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            path = %tmp.display(),
                            error = %rm_err,
                            "failed to remove partial index"
                        );
                    }
                }
                return Err(err);
            }
        };

        fs::rename(&tmp, index).await?;

        debug!(
            source = %source.display(),
            index = %index.display(),
            lines = stats.lines,
            bytes = stats.bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index file created"
        );

        Ok(IndexSummary {
            index_path: index.to_path_buf(),
            stats,
        })
    }
}

/// Scans `source` and writes its index into `dest`. Both files are closed when this returns.
async fn write_index_file(source: &Path, dest: &Path) -> Result<IndexStats> {
    let source_file = fs::File::open(source)
        .await
        .map_err(|e| Error::not_found_as(e, source, Error::SourceNotFound))?;
    let mut reader = BufReader::new(source_file);

    let mut writer = BufWriter::new(fs::File::create(dest).await?);
    let stats = write_index(&mut reader, &mut writer).await?;

    writer.flush().await?;
    writer.get_ref().sync_all().await?;

    Ok(stats)
}

/// Reads all lines from `reader` and writes one offset record per line into `writer`.
pub async fn write_index<R, W>(reader: &mut R, writer: &mut W) -> Result<IndexStats>
where
    R: BufRead + Unpin,
    W: Write + Unpin,
{
    let mut stats = IndexStats::default();
    let mut buf = Vec::with_capacity(1000);

    loop {
        buf.clear();
        let (len, term) = read_line(reader, &mut buf).await?;
        if len + term == 0 {
            break;
        }

        writer.write_all(&encode_record(stats.bytes)?).await?;
        stats.bytes += (len + term) as u64;
        stats.lines += 1;
    }

    Ok(stats)
}

fn tmp_path(index: &Path) -> PathBuf {
    let mut path: OsString = index.as_os_str().to_owned();
    path.push(".tmp");
    PathBuf::from(path)
}
