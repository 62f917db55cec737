//! Conversion of stored artifacts through the document service.

use std::time::Instant;

use bytes::Bytes;
use coedit_convert::{
    ConversionJob, ConversionRequest, ConversionResponse, ConversionService, DownloadService,
};
use coedit_core::storage::StorageService;
use coedit_core::types::{Artifact, ArtifactId, User};
use coedit_core::{Error, Result, derive_key};

use crate::{AccessGate, DocumentConfig};

/// Tracing target for conversion orchestration.
pub const TRACING_TARGET: &str = "coedit_document::orchestrator";

/// Only source format a form template can be derived from.
pub const TEMPLATE_SOURCE_EXTENSION: &str = "docx";

/// Format of derived form templates.
pub const TEMPLATE_TARGET_EXTENSION: &str = "docxf";

/// Converts stored artifacts and derives form templates.
///
/// Holds no per-request state and can be cloned into concurrent tasks. Two
/// requests for the same artifact version share a revision key, which the
/// document service uses to de-duplicate work.
#[derive(Debug, Clone)]
pub struct ConversionOrchestrator {
    gate: AccessGate,
    storage: StorageService,
    conversion: ConversionService,
    downloads: DownloadService,
    config: DocumentConfig,
}

impl ConversionOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        gate: AccessGate,
        storage: StorageService,
        conversion: ConversionService,
        downloads: DownloadService,
        config: DocumentConfig,
    ) -> Self {
        Self {
            gate,
            storage,
            conversion,
            downloads,
            config,
        }
    }

    /// Converts the latest version of an artifact into `target_ext`.
    ///
    /// Asynchronous requests may return an unfinished response; use
    /// [`start_conversion`](Self::start_conversion) to poll one to the end.
    #[tracing::instrument(skip_all, fields(artifact_id = %artifact_id, target_ext = %target_ext))]
    pub async fn convert_artifact(
        &self,
        user: Option<&User>,
        artifact_id: ArtifactId,
        target_ext: &str,
        is_async: bool,
    ) -> Result<ConversionResponse> {
        self.gate.require_access(user, artifact_id, false).await?;
        let artifact = self.storage.get_artifact(artifact_id).await?;

        let request = self.build_request(&artifact, target_ext)?;
        let request = request.with_async(is_async);
        self.conversion.convert(&request).await
    }

    /// Prepares an asynchronous conversion without contacting the document
    /// service; the caller drives it with [`ConversionJob::poll`] or
    /// [`ConversionJob::wait`].
    pub async fn start_conversion(
        &self,
        user: Option<&User>,
        artifact_id: ArtifactId,
        target_ext: &str,
    ) -> Result<ConversionJob> {
        self.gate.require_access(user, artifact_id, false).await?;
        let artifact = self.storage.get_artifact(artifact_id).await?;

        let request = self.build_request(&artifact, target_ext)?;
        Ok(ConversionJob::new(request))
    }

    /// Derives a fillable form template from a `docx` artifact.
    ///
    /// Converts the template source to `docxf` synchronously and fetches the
    /// result. Nothing is written to storage.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` without view access to the source
    /// - `UnsupportedFormat` for a source other than `docx`, before any
    ///   network call
    /// - `ConversionTransport` when the conversion or the fetch fails
    #[tracing::instrument(skip_all, fields(template_id = %template_id))]
    pub async fn derive_form_template(
        &self,
        user: Option<&User>,
        template_id: ArtifactId,
    ) -> Result<Bytes> {
        self.gate.require_access(user, template_id, false).await?;
        let template = self.storage.get_artifact(template_id).await?;

        let source_ext = template.extension();
        if source_ext != TEMPLATE_SOURCE_EXTENSION {
            let expected = TEMPLATE_SOURCE_EXTENSION;
            let message = format!("form templates derive from {expected}, not '{source_ext}'");
            return Err(Error::unsupported_format()
                .with_message(message)
                .with_context(format!("artifact {template_id}")));
        }

        let started_at = Instant::now();
        let request = self.build_request(&template, TEMPLATE_TARGET_EXTENSION)?;
        let file_url = self.conversion.convert(&request).await?.into_file_url()?;

        let data = self
            .downloads
            .download(&file_url, Some(self.config.effective_fetch_timeout()))
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            template_id = %template_id,
            revision_key = %request.revision_key,
            size = data.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Form template derived"
        );

        Ok(data)
    }

    fn build_request(&self, artifact: &Artifact, target_ext: &str) -> Result<ConversionRequest> {
        if target_ext.trim().trim_start_matches('.').is_empty() {
            return Err(Error::invalid_argument()
                .with_message("target extension must not be empty")
                .with_context(format!("artifact {}", artifact.id)));
        }

        let revision_key = derive_key(&artifact.fingerprint())?;
        let source_url = self.config.download_url(artifact.id)?;

        let source_ext = artifact.extension();
        let request = ConversionRequest::new(artifact.id, &source_ext, target_ext, revision_key)
            .with_source_url(source_url)
            .with_title(artifact.file_name.clone());

        Ok(request)
    }
}
