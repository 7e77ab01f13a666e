// ABOUTME: Editor upload bridge - swaps transient in-editor image handles
// ABOUTME: for durable gateway URLs once the out-of-band upload completes

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("upload request failed: {0}")]
    Upload(String),
    #[error("unknown transient reference")]
    UnknownReference,
    #[error("upload task aborted")]
    Aborted,
}

/// Response body of the gateway's upload endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UploadedAsset {
    pub url: String,
}

/// Where the bridge submits image bytes. Abstracted so editor tests run
/// without a live gateway.
#[async_trait]
pub trait UploadEndpoint: Send + Sync {
    async fn upload_image(
        &self,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<UploadedAsset, BridgeError>;
}

/// HTTP implementation posting to the gateway's `/upload` route. The
/// request timeout is owned here, not by the gateway; expiry surfaces as
/// a retryable upload error.
pub struct HttpUploadEndpoint {
    client: reqwest::Client,
    upload_url: String,
}

impl HttpUploadEndpoint {
    pub fn new(upload_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, upload_url })
    }
}

#[async_trait]
impl UploadEndpoint for HttpUploadEndpoint {
    async fn upload_image(
        &self,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<UploadedAsset, BridgeError> {
        let response = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| BridgeError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::Upload(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        response
            .json::<UploadedAsset>()
            .await
            .map_err(|e| BridgeError::Upload(e.to_string()))
    }
}

/// The editor's view of the containing document. The bridge only needs to
/// ask whether an image source is still present and to rewrite it.
pub trait DocumentModel {
    /// Replace every occurrence of `from` as an image source with `to`,
    /// returning how many were rewritten.
    fn rewrite_image_source(&mut self, from: &str, to: &str) -> usize;

    /// True while the document still shows an image with this source.
    fn references_image(&self, source: &str) -> bool;
}

/// Process-local handle to not-yet-uploaded image bytes. Only ever valid
/// inside the editing session that created it; always superseded by a
/// durable URL before the document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientRef(Uuid);

impl TransientRef {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The placeholder source string inserted into the document model.
    pub fn source(&self) -> String {
        format!("transient://{}", self.0)
    }
}

impl fmt::Display for TransientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transient://{}", self.0)
    }
}

/// Upload lifecycle as observed by the editor UI, delivered over a watch
/// channel rather than a callback.
#[derive(Debug, Clone)]
pub enum UploadProgress {
    Uploading,
    Resolved(String),
    Failed(String),
}

struct PendingImage {
    bytes: Bytes,
    content_type: String,
    resolved: Option<String>,
}

/// A single in-flight upload. Aborting cancels the substitution step but
/// not necessarily the network call; a success arriving after the editor
/// dropped the image is simply discarded by `apply_result`.
pub struct UploadTask {
    pub transient: TransientRef,
    pub progress: watch::Receiver<UploadProgress>,
    handle: JoinHandle<Result<String, BridgeError>>,
}

impl UploadTask {
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the upload to finish and return the durable URL.
    pub async fn wait(self) -> Result<String, BridgeError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(BridgeError::Aborted),
            Err(e) => Err(BridgeError::Upload(e.to_string())),
        }
    }
}

/// Coordinates the editor's local image insertions with the gateway's
/// upload endpoint.
///
/// Each inserted image gets a transient reference immediately, so the
/// editor shows it without waiting on the network. Uploads run as
/// independent concurrent tasks; on completion the transient source is
/// rewritten to the durable URL everywhere it occurs. On failure the
/// transient reference (and its bytes) stay in place so the user's image
/// is never silently dropped. The whole arena is released when the bridge
/// is dropped, resolved or not.
pub struct EditorUploadBridge {
    endpoint: Arc<dyn UploadEndpoint>,
    pending: HashMap<TransientRef, PendingImage>,
}

impl EditorUploadBridge {
    pub fn new(endpoint: Arc<dyn UploadEndpoint>) -> Self {
        Self {
            endpoint,
            pending: HashMap::new(),
        }
    }

    /// Register locally inserted image bytes and hand back the transient
    /// reference the editor should render right away.
    pub fn insert_image(&mut self, bytes: Bytes, content_type: &str) -> TransientRef {
        let transient = TransientRef::new();
        self.pending.insert(
            transient,
            PendingImage {
                bytes,
                content_type: content_type.to_string(),
                resolved: None,
            },
        );
        transient
    }

    /// Kick off the asynchronous upload for a previously inserted image.
    /// Safe to call again after a failure; the bytes are retained until
    /// the reference resolves or is discarded.
    pub fn start_upload(&self, transient: TransientRef) -> Result<UploadTask, BridgeError> {
        let image = self
            .pending
            .get(&transient)
            .ok_or(BridgeError::UnknownReference)?;

        let (progress_tx, progress_rx) = watch::channel(UploadProgress::Uploading);
        let endpoint = self.endpoint.clone();
        let bytes = image.bytes.clone();
        let content_type = image.content_type.clone();

        let handle = tokio::spawn(async move {
            match endpoint.upload_image(bytes, &content_type).await {
                Ok(asset) => {
                    let _ = progress_tx.send(UploadProgress::Resolved(asset.url.clone()));
                    Ok(asset.url)
                }
                Err(e) => {
                    tracing::error!(error = %e, "image upload failed");
                    let _ = progress_tx.send(UploadProgress::Failed(e.to_string()));
                    Err(e)
                }
            }
        });

        Ok(UploadTask {
            transient,
            progress: progress_rx,
            handle,
        })
    }

    /// Substitute a completed upload into the document. Returns false when
    /// the transient reference is no longer present (the user removed the
    /// image mid-flight); the late success is then discarded and its
    /// resources freed.
    pub fn apply_result(
        &mut self,
        document: &mut dyn DocumentModel,
        transient: TransientRef,
        url: String,
    ) -> bool {
        let source = transient.source();
        if !document.references_image(&source) {
            self.pending.remove(&transient);
            return false;
        }

        let rewritten = document.rewrite_image_source(&source, &url);
        tracing::debug!(transient = %transient, rewritten, url = %url, "resolved image reference");

        if let Some(image) = self.pending.get_mut(&transient) {
            // Bytes are no longer needed once the durable URL exists
            image.bytes = Bytes::new();
            image.resolved = Some(url);
        }
        true
    }

    /// Durable URL for a resolved reference, if the upload completed.
    pub fn resolved_url(&self, transient: TransientRef) -> Option<&str> {
        self.pending
            .get(&transient)
            .and_then(|image| image.resolved.as_deref())
    }

    /// Drop a reference the editor no longer needs, freeing its bytes.
    pub fn discard(&mut self, transient: TransientRef) {
        self.pending.remove(&transient);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for EditorUploadBridge {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(count = self.pending.len(), "releasing transient references");
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockEndpoint {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockEndpoint {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UploadEndpoint for MockEndpoint {
        async fn upload_image(
            &self,
            bytes: Bytes,
            _content_type: &str,
        ) -> Result<UploadedAsset, BridgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BridgeError::Upload("gateway returned 502".into()));
            }
            Ok(UploadedAsset {
                url: format!("https://cdn.test/blog-content/{}.png", bytes.len()),
            })
        }
    }

    /// Minimal document model: markdown-ish text where image sources are
    /// plain substrings.
    struct TestDocument(String);

    impl DocumentModel for TestDocument {
        fn rewrite_image_source(&mut self, from: &str, to: &str) -> usize {
            let count = self.0.matches(from).count();
            self.0 = self.0.replace(from, to);
            count
        }

        fn references_image(&self, source: &str) -> bool {
            self.0.contains(source)
        }
    }

    #[tokio::test]
    async fn test_successful_upload_substitutes_every_occurrence() {
        let endpoint = MockEndpoint::new(false);
        let mut bridge = EditorUploadBridge::new(endpoint);

        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        let source = transient.source();
        let mut doc = TestDocument(format!("![a]({source}) text ![b]({source})"));

        let task = bridge.start_upload(transient).unwrap();
        let url = task.wait().await.unwrap();

        assert!(bridge.apply_result(&mut doc, transient, url.clone()));
        assert!(!doc.0.contains(&source));
        assert_eq!(doc.0.matches(&url).count(), 2);
        assert_eq!(bridge.resolved_url(transient), Some(url.as_str()));
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_transient_in_place() {
        let endpoint = MockEndpoint::new(true);
        let mut bridge = EditorUploadBridge::new(endpoint.clone());

        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        let source = transient.source();
        let doc = TestDocument(format!("![a]({source})"));

        let task = bridge.start_upload(transient).unwrap();
        let mut progress = task.progress.clone();
        let err = task.wait().await.unwrap_err();
        assert!(matches!(err, BridgeError::Upload(_)));

        // The document still shows the image and the bytes are retained
        // so the upload can be retried
        assert!(doc.references_image(&source));
        assert_eq!(bridge.pending_count(), 1);
        assert!(matches!(
            progress.borrow_and_update().clone(),
            UploadProgress::Failed(_)
        ));

        // Retry reuses the same transient reference
        let retry = bridge.start_upload(transient).unwrap();
        let _ = retry.wait().await;
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_late_success_for_removed_image_is_discarded() {
        let endpoint = MockEndpoint::new(false);
        let mut bridge = EditorUploadBridge::new(endpoint);

        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        // User deleted the image before the upload came back
        let mut doc = TestDocument("no images left".to_string());

        let task = bridge.start_upload(transient).unwrap();
        let url = task.wait().await.unwrap();

        assert!(!bridge.apply_result(&mut doc, transient, url));
        assert_eq!(doc.0, "no images left");
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_progress_reports_resolution() {
        let endpoint = MockEndpoint::new(false);
        let mut bridge = EditorUploadBridge::new(endpoint);

        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        let task = bridge.start_upload(transient).unwrap();
        let mut progress = task.progress.clone();
        let url = task.wait().await.unwrap();

        assert!(matches!(
            progress.borrow_and_update().clone(),
            UploadProgress::Resolved(resolved) if resolved == url
        ));
    }

    #[tokio::test]
    async fn test_abort_cancels_substitution() {
        let endpoint = MockEndpoint::new(false);
        let mut bridge = EditorUploadBridge::new(endpoint);

        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        let task = bridge.start_upload(transient).unwrap();
        task.abort();

        let result = tokio::time::timeout(Duration::from_secs(1), task.wait())
            .await
            .unwrap();
        // Either the task finished before the abort landed or it reports
        // as aborted; in neither case may it hang
        if let Err(e) = result {
            assert!(matches!(e, BridgeError::Aborted));
        }
        assert_eq!(bridge.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_reference_rejected() {
        let endpoint = MockEndpoint::new(false);
        let mut bridge = EditorUploadBridge::new(endpoint);
        let transient = bridge.insert_image(Bytes::from_static(b"img!"), "image/png");
        bridge.discard(transient);

        assert!(matches!(
            bridge.start_upload(transient),
            Err(BridgeError::UnknownReference)
        ));
        assert_eq!(bridge.pending_count(), 0);
    }
}
