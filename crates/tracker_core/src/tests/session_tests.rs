use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{EncodedPhoto, GeoFix, OneTimeCode, SetupPhase, WorkflowStep};

use crate::{
    CodeIssuer, FilePhotoSource, FixedLocationProvider, LocationProvider, MissingLocationProvider,
    MissingPhotoSource, PhotoSource, RandomCodeIssuer, WorkflowError, WorkflowSession,
};

struct TestLocationProvider {
    fail_with: Option<String>,
    fixes_served: Arc<AtomicU32>,
}

impl TestLocationProvider {
    fn ok() -> Self {
        Self {
            fail_with: None,
            fixes_served: Arc::new(AtomicU32::new(0)),
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            fixes_served: Arc::new(AtomicU32::new(0)),
        }
    }
}

#[async_trait]
impl LocationProvider for TestLocationProvider {
    async fn current_fix(&self) -> Result<GeoFix> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.fixes_served.fetch_add(1, Ordering::SeqCst);
        Ok(GeoFix {
            latitude: 13.7563,
            longitude: 100.5018,
            captured_at: Utc::now(),
        })
    }
}

struct TestPhotoSource {
    fail_with: Option<String>,
    loaded_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl TestPhotoSource {
    fn ok() -> Self {
        Self {
            fail_with: None,
            loaded_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            loaded_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PhotoSource for TestPhotoSource {
    async fn load(&self, path: &Path) -> Result<EncodedPhoto> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.loaded_paths
            .lock()
            .expect("loaded_paths lock")
            .push(path.to_path_buf());
        Ok(EncodedPhoto::from_bytes(
            "image/jpeg",
            path.display().to_string().as_bytes(),
        ))
    }
}

/// Issues a predictable sequence so tests can read the expected code back.
struct SequencedCodeIssuer {
    next: AtomicU32,
}

impl SequencedCodeIssuer {
    fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }
}

impl CodeIssuer for SequencedCodeIssuer {
    fn issue(&self) -> OneTimeCode {
        OneTimeCode::from_numeric(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

fn session() -> WorkflowSession {
    WorkflowSession::new(
        Arc::new(TestLocationProvider::ok()),
        Arc::new(TestPhotoSource::ok()),
        Arc::new(SequencedCodeIssuer::starting_at(1_234)),
    )
}

async fn session_at_setup() -> WorkflowSession {
    let mut session = session();
    session.submit_login("Jane – Floral").expect("login");
    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");
    let code = session.active_code().expect("start code").to_string();
    session.submit_code(&code).expect("start verification");
    session
}

#[test]
fn login_rejects_whitespace_only_names() {
    let mut session = session();
    assert!(matches!(
        session.submit_login(""),
        Err(WorkflowError::EmptyVendorName)
    ));
    assert!(matches!(
        session.submit_login("   \t"),
        Err(WorkflowError::EmptyVendorName)
    ));
    assert_eq!(session.step(), WorkflowStep::Login);
    assert!(session.record().is_none());
}

#[test]
fn login_trims_and_stores_the_vendor_id() {
    let mut session = session();
    session.submit_login("  Jane – Floral  ").expect("login");
    assert_eq!(session.step(), WorkflowStep::CheckIn);
    assert_eq!(session.record().expect("record").vendor_id, "Jane – Floral");
}

#[tokio::test]
async fn full_assignment_walkthrough_reaches_summary() {
    let mut session = session();
    session.submit_login("Jane – Floral").expect("login");
    assert_eq!(session.step(), WorkflowStep::CheckIn);

    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");
    assert_eq!(session.step(), WorkflowStep::OtpStart);
    let start_code = session.active_code().expect("start code").clone();
    assert_eq!(start_code.as_str().len(), 4);
    assert!(start_code.as_str().bytes().all(|b| b.is_ascii_digit()));

    let record = session.record().expect("record");
    let check_in = record.check_in.as_ref().expect("check-in record");
    assert_eq!(check_in.location.latitude, 13.7563);
    assert!(record.start_time.is_none());

    session
        .submit_code(start_code.as_str())
        .expect("start verification");
    assert_eq!(session.step(), WorkflowStep::Setup);
    assert!(session.record().expect("record").start_time.is_some());
    assert!(session.active_code().is_none());

    session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre.jpg"))
        .await
        .expect("pre photo");
    session
        .set_setup_notes(SetupPhase::Pre, "tables staged")
        .expect("pre notes");
    session
        .attach_setup_photo(SetupPhase::Post, Path::new("post.jpg"))
        .await
        .expect("post photo");

    session.finish_setup().expect("handover");
    assert_eq!(session.step(), WorkflowStep::OtpComplete);
    let completion_code = session.active_code().expect("completion code").clone();
    assert_ne!(completion_code, start_code);

    session
        .submit_code(completion_code.as_str())
        .expect("completion verification");
    assert_eq!(session.step(), WorkflowStep::Summary);

    let summary = session.summary().expect("summary");
    assert_eq!(summary.vendor_id, "Jane – Floral");
    assert_eq!(summary.location.longitude, 100.5018);
    assert_eq!(summary.duration_minutes, 0);
}

#[tokio::test]
async fn failed_location_read_keeps_the_vendor_at_check_in() {
    let mut session = WorkflowSession::new(
        Arc::new(TestLocationProvider::failing("permission denied")),
        Arc::new(TestPhotoSource::ok()),
        Arc::new(SequencedCodeIssuer::starting_at(0)),
    );
    session.submit_login("Jane").expect("login");

    let err = session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect_err("location failure");
    assert!(matches!(err, WorkflowError::Location(_)));
    assert_eq!(session.step(), WorkflowStep::CheckIn);
    assert!(session.record().expect("record").check_in.is_none());
    assert!(session.active_code().is_none());
}

#[tokio::test]
async fn failed_photo_read_surfaces_like_a_location_failure() {
    let mut session = WorkflowSession::new(
        Arc::new(TestLocationProvider::ok()),
        Arc::new(TestPhotoSource::failing("unreadable file")),
        Arc::new(SequencedCodeIssuer::starting_at(0)),
    );
    session.submit_login("Jane").expect("login");

    let err = session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect_err("photo failure");
    assert!(matches!(err, WorkflowError::Photo(_)));
    assert_eq!(session.step(), WorkflowStep::CheckIn);
}

#[tokio::test]
async fn wrong_code_leaves_step_unchanged_and_a_retry_still_succeeds() {
    let mut session = session();
    session.submit_login("Jane").expect("login");
    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");

    let err = session.submit_code("0000").expect_err("mismatch");
    assert!(matches!(err, WorkflowError::CodeMismatch));
    assert_eq!(session.step(), WorkflowStep::OtpStart);
    assert!(session.record().expect("record").start_time.is_none());

    let code = session.active_code().expect("code").to_string();
    session.submit_code(&code).expect("retry succeeds");
    assert_eq!(session.step(), WorkflowStep::Setup);
}

#[tokio::test]
async fn code_input_is_trimmed_before_comparison() {
    let mut session = session();
    session.submit_login("Jane").expect("login");
    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");
    let code = session.active_code().expect("code").to_string();
    session
        .submit_code(&format!(" {code} "))
        .expect("padded input accepted");
    assert_eq!(session.step(), WorkflowStep::Setup);
}

#[tokio::test]
async fn handover_is_blocked_until_both_setup_photos_exist() {
    let mut session = session_at_setup().await;

    assert!(matches!(
        session.finish_setup(),
        Err(WorkflowError::SetupIncomplete)
    ));
    session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre.jpg"))
        .await
        .expect("pre photo");
    assert!(matches!(
        session.finish_setup(),
        Err(WorkflowError::SetupIncomplete)
    ));
    assert_eq!(session.step(), WorkflowStep::Setup);

    session
        .attach_setup_photo(SetupPhase::Post, Path::new("post.jpg"))
        .await
        .expect("post photo");
    session.finish_setup().expect("handover");
    assert_eq!(session.step(), WorkflowStep::OtpComplete);
}

#[tokio::test]
async fn setup_photos_are_write_once_but_notes_are_not() {
    let mut session = session_at_setup().await;
    session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre.jpg"))
        .await
        .expect("pre photo");

    let err = session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre-again.jpg"))
        .await
        .expect_err("second write refused");
    assert!(matches!(
        err,
        WorkflowError::PhotoAlreadyCaptured(SetupPhase::Pre)
    ));

    session
        .set_setup_notes(SetupPhase::Post, "first draft")
        .expect("notes");
    session
        .set_setup_notes(SetupPhase::Post, "final wording")
        .expect("notes rewritten");
    let setup = &session.record().expect("record").setup;
    assert_eq!(setup.notes(SetupPhase::Post), "final wording");
    assert_eq!(setup.notes(SetupPhase::Pre), "");
    assert!(setup.photo(SetupPhase::Pre).is_some());
    assert!(setup.photo(SetupPhase::Post).is_none());
}

#[tokio::test]
async fn operations_out_of_step_fail_without_side_effects() {
    let mut session = session();

    assert!(matches!(
        session.submit_code("1234"),
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert!(matches!(
        session.finish_setup(),
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert!(matches!(
        session.check_in(Path::new("venue.jpg")).await,
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert!(matches!(
        session.reset(),
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert_eq!(session.step(), WorkflowStep::Login);

    session.submit_login("Jane").expect("login");
    assert!(matches!(
        session.submit_login("Jane again"),
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert!(matches!(
        session.attach_setup_photo(SetupPhase::Pre, Path::new("p.jpg")).await,
        Err(WorkflowError::StepMismatch { .. })
    ));
    assert_eq!(session.step(), WorkflowStep::CheckIn);
}

#[tokio::test]
async fn reset_discards_the_record_from_any_later_step() {
    let mut session = session();
    session.submit_login("Jane").expect("login");
    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");

    session.reset().expect("logout");
    assert_eq!(session.step(), WorkflowStep::Login);
    assert!(session.record().is_none());
    assert!(session.active_code().is_none());

    // A fresh assignment starts clean after the reset.
    session.submit_login("Noah – Lighting").expect("login");
    assert_eq!(session.record().expect("record").vendor_id, "Noah – Lighting");
    assert!(session.record().expect("record").check_in.is_none());
}

#[tokio::test]
async fn starting_a_new_assignment_resets_from_summary() {
    let mut session = session_at_setup().await;
    session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre.jpg"))
        .await
        .expect("pre photo");
    session
        .attach_setup_photo(SetupPhase::Post, Path::new("post.jpg"))
        .await
        .expect("post photo");
    session.finish_setup().expect("handover");
    let code = session.active_code().expect("code").to_string();
    session.submit_code(&code).expect("completion");
    assert_eq!(session.step(), WorkflowStep::Summary);

    session.reset().expect("start new assignment");
    assert_eq!(session.step(), WorkflowStep::Login);
    assert!(session.record().is_none());
    assert!(session.active_code().is_none());
    assert!(session.summary().is_none());
}

#[tokio::test]
async fn summary_is_absent_until_completion_is_verified() {
    let mut session = session_at_setup().await;
    assert!(session.summary().is_none());

    session
        .attach_setup_photo(SetupPhase::Pre, Path::new("pre.jpg"))
        .await
        .expect("pre photo");
    session
        .attach_setup_photo(SetupPhase::Post, Path::new("post.jpg"))
        .await
        .expect("post photo");
    session.finish_setup().expect("handover");
    assert!(session.summary().is_none());

    let code = session.active_code().expect("code").to_string();
    session.submit_code(&code).expect("completion");
    assert!(session.summary().is_some());
}

#[tokio::test]
async fn snapshot_mirrors_session_state() {
    let mut session = session();
    session.submit_login("Jane").expect("login");
    session
        .check_in(Path::new("venue.jpg"))
        .await
        .expect("check-in");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.step, WorkflowStep::OtpStart);
    assert_eq!(
        snapshot.active_code.as_ref().map(|code| code.as_str()),
        session.active_code().map(|code| code.as_str())
    );
    assert!(snapshot.summary.is_none());
    assert_eq!(
        snapshot.record.expect("record").vendor_id,
        session.record().expect("record").vendor_id
    );
}

#[tokio::test]
async fn missing_capability_providers_always_error() {
    assert!(MissingLocationProvider.current_fix().await.is_err());
    assert!(MissingPhotoSource
        .load(Path::new("anything.jpg"))
        .await
        .is_err());
}

#[test]
fn random_codes_are_always_four_digits() {
    for _ in 0..256 {
        let code = RandomCodeIssuer.issue();
        assert_eq!(code.as_str().len(), 4);
        assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
    }
}

#[tokio::test]
async fn fixed_location_provider_reports_the_configured_venue() {
    let fix = FixedLocationProvider::new(51.5072, -0.1276)
        .current_fix()
        .await
        .expect("fix");
    assert_eq!(fix.latitude, 51.5072);
    assert_eq!(fix.longitude, -0.1276);
}

#[tokio::test]
async fn file_photo_source_encodes_a_real_file_with_its_mime_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("venue.png");
    tokio::fs::write(&path, b"\x89PNG\r\n\x1a\nfake")
        .await
        .expect("write");

    let photo = FilePhotoSource.load(&path).await.expect("load");
    assert_eq!(photo.mime(), "image/png");
    assert_eq!(photo.decode_bytes().expect("decode"), b"\x89PNG\r\n\x1a\nfake");

    let missing = dir.path().join("not-there.jpg");
    assert!(FilePhotoSource.load(&missing).await.is_err());

    let empty = dir.path().join("empty.jpg");
    tokio::fs::write(&empty, b"").await.expect("write");
    assert!(FilePhotoSource.load(&empty).await.is_err());
}
