use revgate_blocks::{BlockTable, ParseError};
use std::path::PathBuf;

#[derive(Debug)]
pub enum SourceError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(inner) => write!(f, "unable to read block table: {inner}"),
            Self::Parse(inner) => write!(f, "unable to parse block table: {inner}"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ParseError> for SourceError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

/// Provider of block table snapshots.
///
/// Every call yields a fresh immutable snapshot, a reload therefore
/// replaces the table wholesale and evaluations in flight keep the one
/// they loaded.
#[async_trait::async_trait]
pub trait ConfigSource {
    async fn load_block_table(&self) -> Result<BlockTable, SourceError>;
}

#[derive(Debug)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ConfigSource for FileConfigSource {
    #[tracing::instrument(skip(self), fields(path = ?self.path))]
    async fn load_block_table(&self) -> Result<BlockTable, SourceError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(BlockTable::from_text(&content)?)
    }
}

/// Fixed in memory source, used by tests and offline evaluation.
#[derive(Debug, Default)]
pub struct StaticConfigSource {
    content: String,
}

impl StaticConfigSource {
    pub fn new<C: Into<String>>(content: C) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait::async_trait]
impl ConfigSource for StaticConfigSource {
    async fn load_block_table(&self) -> Result<BlockTable, SourceError> {
        Ok(BlockTable::from_text(&self.content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigSource, FileConfigSource, StaticConfigSource};
    use revgate_blocks::PolicyType;

    #[tokio::test]
    async fn static_source_should_parse_content() {
        let source = StaticConfigSource::new("[block \"ops\"]\nblocks = true\n");
        let table = source.load_block_table().await.unwrap();
        assert!(table.rule(PolicyType::Blocks, "ops").unwrap().blocked);
    }

    #[tokio::test]
    async fn file_source_should_error_on_missing_file() {
        let source = FileConfigSource::new("/nonexistent/blocks.config");
        assert!(source.load_block_table().await.is_err());
    }
}
