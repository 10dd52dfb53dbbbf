//! Read arbitrary lines of large text files in constant time.
//!
//! A file gets indexed once by writing the byte offset of each line into a side-car index file
//! (`<file>.idx`). Every record of the index has the same length, so the record of a line can be
//! found by multiplying the line number with the record length. Reading a line then takes two
//! seeks: one into the index and one into the file.

pub mod config;
pub mod error;
/// Format of the index records
pub mod index;
/// Building index files
pub mod indexer;
mod line;
/// Reading lines using an index
pub mod locator;

pub use config::{Config, Freshness};
pub use error::Error;
pub use indexer::{IndexStats, IndexSummary, Indexer};
pub use locator::{lookup, Locator};

use async_std::path::{Path, PathBuf};
use async_trait::async_trait;
use tracing::debug;

pub type Result<T> = std::result::Result<T, error::Error>;

/// A trait defining behavior for reading certain lines directly from indexed files.
#[async_trait]
pub trait ReadByLine: Send {
    /// Returns the total amount of lines in the file.
    fn total_lines(&self) -> u64;

    /// Reads the given line, without its terminator, and appends it to `buf`. Returns the amount
    /// of bytes appended.
    async fn read_line_raw(&mut self, line: u64, buf: &mut Vec<u8>) -> Result<usize>;

    /// Reads the given line
    async fn read_line(&mut self, line: u64) -> Result<String> {
        let mut buf = Vec::new();
        self.read_line_raw(line, &mut buf).await?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Makes sure an index for `source` exists and returns its path. The index gets built if it is
/// missing, if `config.rebuild` is set or if it is considered stale by `config.freshness`.
pub async fn ensure_index<P: AsRef<Path>>(source: P, config: &Config) -> Result<PathBuf> {
    let source = source.as_ref();
    if !source.exists().await {
        return Err(Error::SourceNotFound(source.to_path_buf()));
    }

    let index = config.index_path(source);

    if config.rebuild || needs_build(source, &index, config.freshness).await? {
        Indexer::new(config).build_to(source, &index).await?;
    } else {
        debug!(index = %index.display(), "using existing index");
    }

    Ok(index)
}

async fn needs_build(source: &Path, index: &Path, freshness: Freshness) -> Result<bool> {
    let index_meta = match index.metadata().await {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err.into()),
    };

    match freshness {
        Freshness::Trust => Ok(false),
        Freshness::Modified => {
            let source_modified = source.metadata().await?.modified()?;
            Ok(source_modified > index_meta.modified()?)
        }
    }
}

/// Reads `line` (0-based) of `source`, building the index first if required.
pub async fn get_line<P: AsRef<Path>>(source: P, line: u64, config: &Config) -> Result<String> {
    let source = source.as_ref();
    let index = ensure_index(source, config).await?;
    lookup(source, index, line).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::fs;
    use rand::{distributions::Uniform, seq::SliceRandom, Rng};
    use std::time::{Duration, SystemTime};

    const CHARS: &[char] = &['a', 'b', 'z', ' ', '0', 'ä', 'é', '日', '本', '🦀'];
    const TERMINATORS: &[&str] = &["\n", "\r\n"];

    /// Generates random text and returns it together with its lines.
    fn random_text(lines: usize) -> (String, Vec<String>) {
        let mut rng = rand::thread_rng();
        let mut text = String::new();
        let mut expected = Vec::with_capacity(lines);

        for i in 0..lines {
            let len = rng.gen_range(0..40);
            let line: String = (0..len).map(|_| *CHARS.choose(&mut rng).unwrap()).collect();
            text.push_str(&line);

            // A non empty last line sometimes has no terminator
            if i + 1 < lines || line.is_empty() || rng.gen_bool(0.5) {
                text.push_str(TERMINATORS.choose(&mut rng).unwrap());
            }
            expected.push(line);
        }

        (text, expected)
    }

    async fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = PathBuf::from(dir.path().join(name));
        fs::write(&path, content).await.unwrap();
        path
    }

    async fn test_reader<L: ReadByLine>(reader: &mut L, expected: &[String]) {
        test_sequentially(reader, expected).await;
        test_random(reader, expected).await;
    }

    async fn test_sequentially<L: ReadByLine>(reader: &mut L, expected: &[String]) {
        assert_eq!(reader.total_lines(), expected.len() as u64);

        for (line, original) in expected.iter().enumerate() {
            let read = reader.read_line(line as u64).await;
            assert_eq!(*original, read.unwrap());

            let mut buf = Vec::new();
            let res = reader.read_line_raw(line as u64, &mut buf).await;
            assert!(res.is_ok());
            assert_eq!(original.as_bytes(), &buf[..]);
        }
    }

    async fn test_random<L: ReadByLine>(reader: &mut L, expected: &[String]) {
        let lines: Vec<_> = rand::thread_rng()
            .sample_iter(Uniform::new(0, expected.len()))
            .take(expected.len() * 3)
            .collect();

        for line in lines {
            let read = reader.read_line(line as u64).await;
            assert_eq!(expected[line], read.unwrap());
        }
    }

    #[async_std::test]
    async fn test_example() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "greek.txt", "alpha\nbeta\ngamma\n").await;
        let config = Config::default();

        assert_eq!(get_line(&source, 1, &config).await.unwrap(), "beta");
        assert!(matches!(
            get_line(&source, 3, &config).await,
            Err(Error::LineNotFound(3))
        ));

        let index = fs::read(config.index_path(&source)).await.unwrap();
        assert_eq!(
            index,
            b"0000000000000\n0000000000006\n0000000000011\n".to_vec()
        );
    }

    #[async_std::test]
    async fn test_round_trip() {
        for lines in &[1, 2, 17, 500] {
            let dir = tempfile::tempdir().unwrap();
            let (text, expected) = random_text(*lines);
            let source = write_source(&dir, "random.txt", &text).await;
            let config = Config::default();

            let summary = Indexer::new(&config).build(&source).await.unwrap();
            assert_eq!(summary.stats.lines, expected.len() as u64);
            assert_eq!(summary.stats.bytes, text.len() as u64);

            let mut locator = Locator::for_source(&source, &config).await.unwrap();
            test_reader(&mut locator, &expected).await;
        }
    }

    #[async_std::test]
    async fn test_lone_carriage_returns() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "mac.txt", "one\rtwo\r\rfour\r\nfive\nsix").await;
        let config = Config::default();

        let expected = ["one", "two", "", "four", "five", "six"];
        for (line, text) in expected.iter().enumerate() {
            assert_eq!(get_line(&source, line as u64, &config).await.unwrap(), *text);
        }
        assert!(matches!(
            get_line(&source, 6, &config).await,
            Err(Error::LineNotFound(6))
        ));
    }

    #[async_std::test]
    async fn test_offsets_point_to_line_start() {
        let dir = tempfile::tempdir().unwrap();
        let text = "first\r\n\nthird line\rfourth\n";
        let source = write_source(&dir, "offsets.txt", text).await;
        let config = Config::default();

        let index = ensure_index(&source, &config).await.unwrap();
        let mut locator = Locator::open(&source, &index).await.unwrap();

        let starts = [0, 7, 8, 19];
        assert_eq!(locator.total_lines(), starts.len() as u64);
        for (line, start) in starts.iter().enumerate() {
            assert_eq!(locator.offset_of(line as u64).await.unwrap(), *start);
        }
    }

    #[async_std::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "empty.txt", "").await;
        let config = Config::default();

        assert!(matches!(
            get_line(&source, 0, &config).await,
            Err(Error::LineNotFound(0))
        ));
        let index = config.index_path(&source);
        assert_eq!(index.metadata().await.unwrap().len(), 0);
    }

    #[async_std::test]
    async fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = PathBuf::from(dir.path().join("nope.txt"));
        let config = Config::default();

        assert!(matches!(
            get_line(&source, 0, &config).await,
            Err(Error::SourceNotFound(_))
        ));
        assert!(!config.index_path(&source).exists().await);
    }

    #[async_std::test]
    async fn test_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "reuse.txt", "alpha\nbeta\ngamma\n").await;
        let config = Config::default();

        let first = get_line(&source, 2, &config).await.unwrap();
        let index = config.index_path(&source);
        let modified = index.metadata().await.unwrap().modified().unwrap();
        let content = fs::read(&index).await.unwrap();

        let second = get_line(&source, 2, &config).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(index.metadata().await.unwrap().modified().unwrap(), modified);
        assert_eq!(fs::read(&index).await.unwrap(), content);
    }

    #[async_std::test]
    async fn test_existing_index_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "trusted.txt", "alpha\nbeta\ngamma\n").await;
        let config = Config::default();

        // A handwritten index whose only record points to the second line
        fs::write(config.index_path(&source), "0000000000006\n")
            .await
            .unwrap();

        assert_eq!(get_line(&source, 0, &config).await.unwrap(), "beta");
        assert!(matches!(
            get_line(&source, 1, &config).await,
            Err(Error::LineNotFound(1))
        ));

        let config = config.with_rebuild(true);
        assert_eq!(get_line(&source, 0, &config).await.unwrap(), "alpha");
        assert_eq!(get_line(&source, 1, &config).await.unwrap(), "beta");
    }

    #[async_std::test]
    async fn test_stale_index() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "stale.txt", "alpha\nbeta\n").await;
        let config = Config::default();

        assert_eq!(get_line(&source, 1, &config).await.unwrap(), "beta");

        // Pretend the index was built a while ago, then modify the file
        let past = SystemTime::now() - Duration::from_secs(120);
        std::fs::OpenOptions::new()
            .write(true)
            .open(dir.path().join("stale.txt.idx"))
            .unwrap()
            .set_modified(past)
            .unwrap();
        fs::write(&source, "a\nb\nc\n").await.unwrap();

        // The stale index is trusted by default: its second record points behind the new content
        assert_eq!(get_line(&source, 0, &config).await.unwrap(), "a");
        assert!(matches!(
            get_line(&source, 1, &config).await,
            Err(Error::LineNotFound(1))
        ));

        let config = config.with_freshness(Freshness::Modified);
        let index = config.index_path(&source);
        assert!(needs_build(&source, &index, Freshness::Modified).await.unwrap());

        assert_eq!(get_line(&source, 1, &config).await.unwrap(), "b");
        assert_eq!(get_line(&source, 2, &config).await.unwrap(), "c");
        assert!(!needs_build(&source, &index, Freshness::Modified).await.unwrap());
    }
}
