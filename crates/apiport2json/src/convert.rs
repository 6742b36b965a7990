/// Conversion pipeline: checkout, extract every document, stream the records to JSON.
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{Config, MalformedPolicy};
use crate::emit;
use crate::error::AppError;
use crate::model::BreakingChange;
use crate::parser::TemplateParser;
use crate::source::{list_documents, DocumentSource};

/// Outcome of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of records written to the output.
    pub written: usize,
    /// Number of malformed documents left out (only with [`MalformedPolicy::Skip`]).
    pub skipped: usize,
    pub output_path: PathBuf,
}

pub struct Converter {
    config: Config,
    parser: TemplateParser,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: TemplateParser::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check the repository out, convert its documents and release the checkout.
    ///
    /// The checkout is released whether or not the conversion succeeds.
    pub fn run(&self, source: &dyn DocumentSource) -> Result<ConversionSummary, AppError> {
        let checkout = source.checkout(&self.config.repo_url)?;
        let docs_dir = self.config.documents_dir(checkout.root());

        let result = list_documents(&docs_dir, &self.config.template_name).and_then(|documents| {
            info!(
                documents = documents.len(),
                output = %self.config.output_path.display(),
                "converting documents"
            );
            let mut skipped = 0;
            let written = emit::write_records_to_path(
                &self.config.output_path,
                self.records(&documents, &mut skipped),
            )?;
            Ok(ConversionSummary {
                written,
                skipped,
                output_path: self.config.output_path.clone(),
            })
        });

        checkout.release();

        if let Ok(summary) = &result {
            info!(
                written = summary.written,
                skipped = summary.skipped,
                output = %summary.output_path.display(),
                "conversion complete"
            );
        }
        result
    }

    /// Convert the documents of `docs_dir` into `writer`.
    ///
    /// Returns `(written, skipped)`.
    pub fn convert_dir<W: Write>(
        &self,
        docs_dir: &Path,
        writer: W,
    ) -> Result<(usize, usize), AppError> {
        let documents = list_documents(docs_dir, &self.config.template_name)?;
        let mut skipped = 0;
        let written = emit::write_records(writer, self.records(&documents, &mut skipped))?;
        Ok((written, skipped))
    }

    /// Lazily extract each document in order, applying the malformed-document policy.
    fn records<'a>(
        &'a self,
        documents: &'a [PathBuf],
        skipped: &'a mut usize,
    ) -> impl Iterator<Item = Result<BreakingChange, AppError>> + 'a {
        documents.iter().filter_map(move |path| match self.extract(path) {
            Ok(change) => Some(Ok(change)),
            Err(e) if e.is_malformed_document() && self.config.on_malformed == MalformedPolicy::Skip => {
                warn!(error = %e, "skipping malformed document");
                *skipped += 1;
                None
            }
            Err(e) => Some(Err(e)),
        })
    }

    /// Read and parse a single document.
    pub fn extract(&self, path: &Path) -> Result<BreakingChange, AppError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(document = %name, "parsing document");

        let bytes = std::fs::read(path).map_err(|source| AppError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = content {
            warn!(document = %name, "document is not valid UTF-8, decoding lossily");
        }
        self.parser.parse(&content).map_err(|e| AppError::Parse {
            file: name,
            line: e.line,
            message: e.message,
        })
    }
}
