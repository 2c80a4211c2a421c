//! Chunk a document, extract structure chunk by chunk, merge, checkpoint,
//! and validate the final outline against the source lines.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use super::extractor::StructureExtractor;
use crate::chunking::document::read_non_empty_lines;
use crate::chunking::{Chunker, TokenCounter};
use crate::core::config::PipelineSettings;
use crate::core::errors::OutlineError;
use crate::outline::{OutlineDocument, OutlineMerger};
use crate::validate::{LineMatcher, ValidationReport};

/// Snapshot written after every merged chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// 1-based index of the last merged chunk
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub updated_at: DateTime<Utc>,
    pub outline: OutlineDocument,
}

impl Checkpoint {
    pub fn save(&self, path: &Path) -> Result<(), OutlineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OutlineError::io(parent, e))?;
        }
        let text = serde_json::to_string_pretty(self).map_err(OutlineError::internal)?;
        fs::write(path, text).map_err(|e| OutlineError::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self, OutlineError> {
        let text = fs::read_to_string(path).map_err(|e| OutlineError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| OutlineError::malformed(path.display().to_string(), e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub document: OutlineDocument,
    pub report: ValidationReport,
    pub chunks: usize,
    /// 1-based indices of chunks whose extraction failed and was skipped
    pub skipped: Vec<usize>,
    pub output_path: PathBuf,
}

pub struct OutlinePipeline<C, E> {
    chunker: Chunker<C>,
    extractor: E,
    matcher: LineMatcher,
    settings: PipelineSettings,
    output_dir: Option<PathBuf>,
}

impl<C, E> OutlinePipeline<C, E>
where
    C: TokenCounter,
    E: StructureExtractor,
{
    pub fn new(chunker: Chunker<C>, extractor: E, settings: PipelineSettings) -> Self {
        Self {
            chunker,
            extractor,
            matcher: LineMatcher::default(),
            settings,
            output_dir: None,
        }
    }

    pub fn with_matcher(mut self, matcher: LineMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Directory that relative progress/output paths are resolved against.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn progress_path(&self) -> PathBuf {
        self.resolve(&self.settings.progress_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.settings.output_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub async fn run(&self, path: impl AsRef<Path>) -> Result<PipelineOutcome, OutlineError> {
        let path = path.as_ref();
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("outline_run", %run_id, source = %path.display());
        self.run_inner(path).instrument(span).await
    }

    async fn run_inner(&self, path: &Path) -> Result<PipelineOutcome, OutlineError> {
        let lines = read_non_empty_lines(path)?;
        let chunks = self.chunker.split(&lines)?;
        let total = chunks.len();
        tracing::info!(
            "Split {} into {} chunks ({} lines, <= {} tokens each)",
            path.display(),
            total,
            lines.len(),
            self.chunker.config().max_tokens
        );

        let progress_path = self.progress_path();
        let mut merger = OutlineMerger::new();
        let mut skipped = Vec::new();

        for chunk in &chunks {
            let number = chunk.index + 1;
            tracing::info!(
                "Extracting chunk {}/{} (lines {}-{}, {} tokens)",
                number,
                total,
                chunk.first_line,
                chunk.last_line,
                chunk.tokens
            );

            let previous = (number > 1).then(|| merger.document());
            let fragment = match self.extractor.extract(previous, &chunk.text).await {
                Ok(fragment) => fragment,
                Err(e) if self.settings.skip_failed_chunks => {
                    tracing::warn!("Skipping chunk {}/{}: {}", number, total, e);
                    skipped.push(number);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Chunk {}/{} failed: {}", number, total, e);
                    return Err(e);
                }
            };

            merger.absorb(fragment);

            Checkpoint {
                chunk_index: number,
                total_chunks: total,
                updated_at: Utc::now(),
                outline: merger.document().clone(),
            }
            .save(&progress_path)?;
        }

        let document = merger.into_document();
        let output_path = self.output_path();
        document.save(&output_path)?;
        tracing::info!("Saved merged outline to {}", output_path.display());

        let report = self.matcher.validate_outline(&document.merged_structure, &lines);
        tracing::info!(
            "Validated {} titles: {} found (threshold {})",
            report.total(),
            report.found_count(),
            report.threshold
        );

        Ok(PipelineOutcome {
            document,
            report,
            chunks: total,
            skipped,
            output_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkerConfig;
    use crate::outline::types::{parse_outline, OutlineFragment};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const DOC: &str = "# 目录\n- 1. 概述\n\n# 1. 概述\n## 1.1 背景介绍\n\n## 1.2 系统结构\n# 2. 使用说明\n";

    /// Replays canned fragments in order; `None` simulates a failed call.
    struct ScriptedExtractor {
        replies: Mutex<VecDeque<Option<OutlineFragment>>>,
        previous_titles: Mutex<Vec<Option<Vec<String>>>>,
    }

    impl ScriptedExtractor {
        fn new(replies: Vec<Option<OutlineFragment>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                previous_titles: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StructureExtractor for ScriptedExtractor {
        async fn extract(
            &self,
            previous: Option<&OutlineDocument>,
            _chunk: &str,
        ) -> Result<OutlineFragment, OutlineError> {
            self.previous_titles.lock().unwrap().push(
                previous.map(|doc| doc.titles().into_iter().map(String::from).collect()),
            );
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| OutlineError::Provider("scripted failure".to_string()))
        }
    }

    fn fragment(value: serde_json::Value) -> OutlineFragment {
        OutlineFragment::new(parse_outline(&value, "$").unwrap())
    }

    fn scripted(fail_second: bool) -> ScriptedExtractor {
        let second = fragment(json!({
            "1. 概述": { "children": { "1.1 背景介绍": { "children": {} } } }
        }));
        ScriptedExtractor::new(vec![
            Some(OutlineFragment::default().with_toc("# 目录\n- 1. 概述")),
            (!fail_second).then_some(second),
            Some(fragment(json!({
                "1. 概述": { "children": { "1.2 系统结构": { "children": {} } } },
                "2. 使用说明": { "children": {} }
            }))),
        ])
    }

    // One token per line, two lines per chunk: 6 non-empty lines -> 3 chunks.
    fn line_chunker() -> Chunker<impl TokenCounter> {
        Chunker::new(ChunkerConfig { max_tokens: 2 }, |text: &str| {
            text.lines().count()
        })
    }

    fn write_doc(dir: &Path) -> PathBuf {
        let path = dir.join("guide.md");
        fs::write(&path, DOC).unwrap();
        path
    }

    #[tokio::test]
    async fn chunks_are_extracted_merged_and_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_doc(tmp.path());
        let pipeline =
            OutlinePipeline::new(line_chunker(), scripted(false), PipelineSettings::default())
                .with_output_dir(tmp.path().join("out"));

        let outcome = pipeline.run(&source).await.unwrap();

        assert_eq!(outcome.chunks, 3);
        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.document.titles(),
            vec!["1. 概述", "1.1 背景介绍", "1.2 系统结构", "2. 使用说明"]
        );
        assert_eq!(outcome.document.detected_toc.text(), Some("# 目录\n- 1. 概述"));
        assert_eq!(outcome.report.total(), 4);
        assert_eq!(outcome.report.found_count(), 4);

        let seen = pipeline.extractor.previous_titles.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                None,
                Some(vec![]),
                Some(vec!["1. 概述".to_string(), "1.1 背景介绍".to_string()]),
            ]
        );

        assert_eq!(
            outcome.output_path,
            tmp.path()
                .join("out")
                .join("final_merged_markdown_structure.json")
        );
        assert_eq!(OutlineDocument::load(&outcome.output_path).unwrap(), outcome.document);

        let checkpoint = Checkpoint::load(&pipeline.progress_path()).unwrap();
        assert_eq!(checkpoint.chunk_index, 3);
        assert_eq!(checkpoint.total_chunks, 3);
        assert_eq!(checkpoint.outline, outcome.document);
    }

    #[tokio::test]
    async fn failed_chunks_are_skipped_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_doc(tmp.path());
        let pipeline =
            OutlinePipeline::new(line_chunker(), scripted(true), PipelineSettings::default())
                .with_output_dir(tmp.path());

        let outcome = pipeline.run(&source).await.unwrap();

        assert_eq!(outcome.skipped, vec![2]);
        assert_eq!(
            outcome.document.titles(),
            vec!["1. 概述", "1.2 系统结构", "2. 使用说明"]
        );
    }

    #[tokio::test]
    async fn failed_chunk_aborts_when_skipping_is_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_doc(tmp.path());
        let settings = PipelineSettings {
            skip_failed_chunks: false,
            ..Default::default()
        };
        let pipeline = OutlinePipeline::new(line_chunker(), scripted(true), settings)
            .with_output_dir(tmp.path());

        let err = pipeline.run(&source).await.unwrap_err();

        assert!(matches!(err, OutlineError::Provider(_)));
        // The first chunk was checkpointed, the final output never written.
        assert_eq!(Checkpoint::load(&pipeline.progress_path()).unwrap().chunk_index, 1);
        assert!(!pipeline.output_path().exists());
    }

    #[tokio::test]
    async fn oversized_line_fails_before_any_extraction() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_doc(tmp.path());
        let chunker = Chunker::new(ChunkerConfig { max_tokens: 3 }, |text: &str| {
            text.chars().count()
        });
        let pipeline = OutlinePipeline::new(chunker, scripted(false), PipelineSettings::default())
            .with_output_dir(tmp.path());

        let err = pipeline.run(&source).await.unwrap_err();

        assert!(matches!(err, OutlineError::LineTooLarge { line: 1, .. }));
        assert!(pipeline.extractor.previous_titles.lock().unwrap().is_empty());
    }

    #[test]
    fn checkpoint_save_reports_unwritable_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let checkpoint = Checkpoint {
            chunk_index: 1,
            total_chunks: 1,
            updated_at: Utc::now(),
            outline: OutlineDocument::default(),
        };

        let err = checkpoint.save(&blocker.join("progress.json")).unwrap_err();

        match err {
            OutlineError::Io { path, .. } => assert_eq!(path, blocker),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absolute_paths_ignore_output_dir() {
        let settings = PipelineSettings {
            output_file: PathBuf::from("/var/tmp/outline.json"),
            ..Default::default()
        };
        let pipeline = OutlinePipeline::new(line_chunker(), scripted(false), settings)
            .with_output_dir("/data");

        assert_eq!(pipeline.output_path(), PathBuf::from("/var/tmp/outline.json"));
        assert_eq!(pipeline.progress_path(), PathBuf::from("/data/merged_progress.json"));
    }
}
