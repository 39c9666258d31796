// src/services/achievement_service.rs
//! Achievement lifecycle: creation, scoped listing and the
//! draft → submitted → verified/rejected workflow across both stores.

use crate::{
    documents::AchievementDocuments,
    error::{AppError, AppResult},
    models::{
        achievement::{
            AchievementFilter, AchievementListItem, AchievementPage, AchievementReference,
            AchievementStatus, AttachmentView, CreateAchievementRequest, EvidenceFile,
            ReferenceListRow, RejectRequest, SubmitRequest, VerifyRequest, MISSING_DOCUMENT_TITLE,
            UNKNOWN_STUDENT_NAME, UNKNOWN_STUDENT_NIM,
        },
        academic::Student,
        document::{AchievementDocument, Attachment},
        user::Role,
    },
    services::{academic_service, achievement_reference, paired_record::PairedRecords},
};
use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::Utc;
use serde_json::Map;
use sqlx::SqlitePool;
use std::collections::HashMap;

// --- Precondition helpers ---

async fn load_reference(db_pool: &SqlitePool, achievement_id: &str) -> AppResult<AchievementReference> {
    achievement_reference::find_reference_by_id(db_pool, achievement_id)
        .await?
        .ok_or(AppError::ReferenceNotFound)
}

async fn require_student(db_pool: &SqlitePool, user_id: &str) -> AppResult<Student> {
    academic_service::find_student_by_user_id(db_pool, user_id)
        .await?
        .ok_or(AppError::ProfileNotFound("Student"))
}

/// Loads the reference and checks that the acting user's student profile owns it.
async fn load_owned_reference(
    db_pool: &SqlitePool,
    user_id: &str,
    achievement_id: &str,
) -> AppResult<AchievementReference> {
    let reference = load_reference(db_pool, achievement_id).await?;
    let student = require_student(db_pool, user_id).await?;

    if reference.student_id != student.id {
        tracing::warn!(
            "Student {} tried to act on achievement {} owned by {}",
            student.id,
            reference.id,
            reference.student_id
        );
        return Err(AppError::Unauthorized(
            "you do not own this achievement".to_string(),
        ));
    }
    Ok(reference)
}

fn require_status(
    reference: &AchievementReference,
    expected: AchievementStatus,
    action: &'static str,
) -> AppResult<()> {
    if reference.status != expected {
        tracing::warn!(
            "Refused to {} achievement {}: status is '{}'",
            action,
            reference.id,
            reference.status
        );
        return Err(AppError::InvalidStateTransition {
            action,
            current: reference.status,
        });
    }
    Ok(())
}

/// The caller must be the lecturer currently assigned as the owning student's advisor.
async fn require_assigned_advisor(
    db_pool: &SqlitePool,
    advisor_user_id: &str,
    reference: &AchievementReference,
) -> AppResult<()> {
    let lecturer = academic_service::find_lecturer_by_user_id(db_pool, advisor_user_id)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized("only lecturers can review achievements".to_string())
        })?;

    let student = academic_service::find_student_by_id(db_pool, &reference.student_id)
        .await?
        .ok_or(AppError::ProfileNotFound("Student"))?;

    match student.advisor_id.as_deref() {
        None => Err(AppError::Unauthorized(
            "student has no assigned advisor".to_string(),
        )),
        Some(advisor_id) if advisor_id != lecturer.id => {
            tracing::warn!(
                "Lecturer {} is not the advisor of student {}",
                lecturer.lecturer_id,
                student.nim
            );
            Err(AppError::Unauthorized(
                "you are not the advisor of this student".to_string(),
            ))
        }
        Some(_) => Ok(()),
    }
}

/// A conditional update matched nothing: another request moved the reference first.
async fn lost_transition(
    db_pool: &SqlitePool,
    achievement_id: &str,
    action: &'static str,
) -> AppError {
    match achievement_reference::find_reference_by_id(db_pool, achievement_id).await {
        Ok(Some(current)) => AppError::InvalidStateTransition {
            action,
            current: current.status,
        },
        Ok(None) => AppError::ReferenceNotFound,
        Err(e) => e,
    }
}

// --- Operations ---

/// Creates a draft achievement for the acting student.
pub async fn create_achievement(
    db_pool: &SqlitePool,
    documents: &dyn AchievementDocuments,
    user_id: &str,
    req: &CreateAchievementRequest,
) -> AppResult<AchievementReference> {
    let student = require_student(db_pool, user_id).await?;

    let now = BsonDateTime::now();
    let document = AchievementDocument {
        id: ObjectId::new(),
        student_id: student.id.clone(),
        achievement_type: req.achievement_type.clone(),
        title: req.title.clone(),
        description: req.description.clone(),
        details: req.details.clone(),
        attachments: Vec::new(),
        tags: req.tags.clone(),
        points: req.points,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    let reference = PairedRecords::new(db_pool, documents)
        .create(&document)
        .await?;
    tracing::info!(
        "✅ Achievement {} created as draft for student {}",
        reference.id,
        student.nim
    );
    Ok(reference)
}

/// Lists achievements visible to the caller, one page at a time.
///
/// Students only ever see their own, advisors only their current advisees,
/// admins everything the filter selects.
pub async fn list_achievements(
    db_pool: &SqlitePool,
    documents: &dyn AchievementDocuments,
    user_id: &str,
    role: Role,
    mut filter: AchievementFilter,
) -> AppResult<AchievementPage> {
    // 1. Scope by role
    match role {
        Role::Student => {
            let student = require_student(db_pool, user_id).await?;
            filter.student_ids = Some(vec![student.id]);
        }
        Role::Advisor => {
            let lecturer = academic_service::find_lecturer_by_user_id(db_pool, user_id)
                .await?
                .ok_or(AppError::ProfileNotFound("Lecturer"))?;
            let advisees = academic_service::find_student_ids_by_advisor(db_pool, &lecturer.id).await?;
            if advisees.is_empty() {
                return Ok(AchievementPage::empty(&filter));
            }
            filter.student_ids = Some(advisees);
        }
        Role::Admin => {}
    }

    // 2. References
    let (rows, total) = achievement_reference::find_references(db_pool, &filter).await?;
    if rows.is_empty() {
        return Ok(AchievementPage {
            total,
            ..AchievementPage::empty(&filter)
        });
    }

    // 3. Documents, one bulk fetch
    let document_ids: Vec<String> = rows
        .iter()
        .map(|row| row.reference.mongo_achievement_id.clone())
        .collect();
    let fetched = documents.find_live_by_ids(&document_ids).await?;
    let by_id: HashMap<String, &AchievementDocument> = fetched
        .iter()
        .filter(|doc| doc.is_live())
        .map(|doc| (doc.id_hex(), doc))
        .collect();

    // 4. Merge
    let items = rows
        .into_iter()
        .map(|row| {
            let document = by_id.get(&row.reference.mongo_achievement_id).copied();
            if document.is_none() {
                tracing::warn!(
                    "Reference {} has no live document {}",
                    row.reference.id,
                    row.reference.mongo_achievement_id
                );
            }
            merge_item(row, document)
        })
        .collect();

    Ok(AchievementPage {
        items,
        page: filter.page,
        limit: filter.limit,
        total,
    })
}

fn merge_item(row: ReferenceListRow, document: Option<&AchievementDocument>) -> AchievementListItem {
    let ReferenceListRow {
        reference,
        student_nim,
        student_name,
    } = row;

    let student_name = student_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_STUDENT_NAME.to_string());
    let nim = student_nim.unwrap_or_else(|| UNKNOWN_STUDENT_NIM.to_string());

    let (title, achievement_type, description, points, details, attachments) = match document {
        Some(doc) => (
            doc.title.clone(),
            doc.achievement_type.clone(),
            doc.description.clone(),
            doc.points,
            doc.details.clone(),
            doc.attachments.iter().map(AttachmentView::from).collect(),
        ),
        None => (
            MISSING_DOCUMENT_TITLE.to_string(),
            String::new(),
            String::new(),
            0,
            Map::new(),
            Vec::new(),
        ),
    };

    AchievementListItem {
        id: reference.id,
        status: reference.status,
        student_id: reference.student_id,
        student_name,
        nim,
        title,
        achievement_type,
        description,
        points,
        details,
        attachments,
        submitted_at: reference.submitted_at,
        verified_at: reference.verified_at,
        rejection_note: reference.rejection_note,
        created_at: reference.created_at,
    }
}

/// Soft-deletes a draft owned by the acting student (document first, then reference).
pub async fn delete_achievement(
    db_pool: &SqlitePool,
    documents: &dyn AchievementDocuments,
    user_id: &str,
    achievement_id: &str,
) -> AppResult<()> {
    let reference = load_owned_reference(db_pool, user_id, achievement_id).await?;
    require_status(&reference, AchievementStatus::Draft, "delete")?;

    if !PairedRecords::new(db_pool, documents)
        .soft_delete(&reference)
        .await?
    {
        return Err(lost_transition(db_pool, achievement_id, "delete").await);
    }

    tracing::info!("🗑️ Achievement {} deleted", achievement_id);
    Ok(())
}

pub async fn submit_achievement(
    db_pool: &SqlitePool,
    user_id: &str,
    achievement_id: &str,
) -> AppResult<AchievementReference> {
    let reference = load_owned_reference(db_pool, user_id, achievement_id).await?;
    require_status(&reference, AchievementStatus::Draft, "submit")?;

    let req = SubmitRequest {
        submitted_at: Utc::now(),
    };
    if !achievement_reference::mark_submitted(db_pool, achievement_id, &req).await? {
        return Err(lost_transition(db_pool, achievement_id, "submit").await);
    }

    tracing::info!("📨 Achievement {} submitted for verification", achievement_id);
    load_reference(db_pool, achievement_id).await
}

pub async fn verify_achievement(
    db_pool: &SqlitePool,
    advisor_user_id: &str,
    achievement_id: &str,
) -> AppResult<AchievementReference> {
    let reference = load_reference(db_pool, achievement_id).await?;
    require_status(&reference, AchievementStatus::Submitted, "verify")?;
    require_assigned_advisor(db_pool, advisor_user_id, &reference).await?;

    let req = VerifyRequest {
        verifier_id: advisor_user_id.to_string(),
        verified_at: Utc::now(),
    };
    if !achievement_reference::mark_verified(db_pool, achievement_id, &req).await? {
        return Err(lost_transition(db_pool, achievement_id, "verify").await);
    }

    tracing::info!("✅ Achievement {} verified by {}", achievement_id, advisor_user_id);
    load_reference(db_pool, achievement_id).await
}

/// Same preconditions as verification. The note is stored as given.
pub async fn reject_achievement(
    db_pool: &SqlitePool,
    advisor_user_id: &str,
    achievement_id: &str,
    note: &str,
) -> AppResult<AchievementReference> {
    let reference = load_reference(db_pool, achievement_id).await?;
    require_status(&reference, AchievementStatus::Submitted, "reject")?;
    require_assigned_advisor(db_pool, advisor_user_id, &reference).await?;

    let req = RejectRequest {
        verifier_id: advisor_user_id.to_string(),
        note: note.to_string(),
        rejected_at: Utc::now(),
    };
    if !achievement_reference::mark_rejected(db_pool, achievement_id, &req).await? {
        return Err(lost_transition(db_pool, achievement_id, "reject").await);
    }

    tracing::info!("❌ Achievement {} rejected by {}", achievement_id, advisor_user_id);
    load_reference(db_pool, achievement_id).await
}

/// Records an already-stored evidence file on the achievement's document.
/// Allowed while `draft` or `rejected`; the reference status does not change.
pub async fn upload_evidence(
    db_pool: &SqlitePool,
    documents: &dyn AchievementDocuments,
    user_id: &str,
    achievement_id: &str,
    file: EvidenceFile,
) -> AppResult<AttachmentView> {
    let reference = load_owned_reference(db_pool, user_id, achievement_id).await?;
    if !reference.status.accepts_evidence() {
        tracing::warn!(
            "Refused evidence upload for achievement {}: status is '{}'",
            reference.id,
            reference.status
        );
        return Err(AppError::InvalidStateTransition {
            action: "upload evidence to",
            current: reference.status,
        });
    }

    let attachment = Attachment {
        file_name: file.file_name,
        file_url: file.file_url,
        file_type: file.file_type,
        uploaded_at: BsonDateTime::now(),
    };
    documents
        .push_attachment(&reference.mongo_achievement_id, &attachment)
        .await
        .map_err(|e| {
            tracing::error!(
                "Attachment push to document {} failed: {}",
                reference.mongo_achievement_id,
                e
            );
            AppError::DocumentWriteFailed(e.to_string())
        })?;

    tracing::info!("📎 Evidence '{}' attached to achievement {}", attachment.file_name, achievement_id);
    Ok(AttachmentView::from(&attachment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_pool,
        documents::memory::InMemoryDocuments,
        services::{
            academic_service::set_student_advisor,
            test_support::{Fixture, LecturerHandle, StudentHandle},
        },
    };
    use serde_json::json;

    fn contest(title: &str, points: i64) -> CreateAchievementRequest {
        let mut details = Map::new();
        details.insert("rank".to_string(), json!(1));
        details.insert("organizer".to_string(), json!("Kemdikbud"));
        CreateAchievementRequest {
            title: title.to_string(),
            achievement_type: "Kompetisi".to_string(),
            description: "Juara nasional".to_string(),
            details,
            tags: vec!["nasional".to_string()],
            points,
        }
    }

    fn evidence(name: &str) -> EvidenceFile {
        EvidenceFile {
            file_name: name.to_string(),
            file_url: format!("http://localhost:3000/uploads/{}", name),
            file_type: "application/pdf".to_string(),
        }
    }

    struct World {
        pool: SqlitePool,
        docs: InMemoryDocuments,
        advisor: LecturerHandle,
        other_advisor: LecturerHandle,
        student_a: StudentHandle,
        student_b: StudentHandle,
    }

    async fn world() -> World {
        let pool = test_pool().await;
        let fx = Fixture::new(&pool).await;
        let advisor = fx.lecturer("Dr. Dosen 1", "NIP001").await;
        let other_advisor = fx.lecturer("Dr. Dosen 2", "NIP002").await;
        let student_a = fx.student("Mahasiswa A", "NIM001", Some(advisor.lecturer_id.as_str())).await;
        let student_b = fx.student("Mahasiswa B", "NIM002", Some(other_advisor.lecturer_id.as_str())).await;
        World {
            pool,
            docs: InMemoryDocuments::new(),
            advisor,
            other_advisor,
            student_a,
            student_b,
        }
    }

    async fn status_of(pool: &SqlitePool, id: &str) -> AchievementStatus {
        achievement_reference::find_reference_by_id(pool, id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn create_writes_document_then_draft_reference() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("Coding Contest Win", 100))
            .await
            .unwrap();

        assert_eq!(created.status, AchievementStatus::Draft);
        assert_eq!(created.student_id, w.student_a.student_id);
        let doc = w.docs.get(&created.mongo_achievement_id).unwrap();
        assert_eq!(doc.title, "Coding Contest Win");
        assert_eq!(doc.student_id, w.student_a.student_id);
        assert!(doc.attachments.is_empty());
        assert_eq!(doc.details.get("rank"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn create_requires_a_student_profile() {
        let w = world().await;
        let err = create_achievement(&w.pool, &w.docs, &w.advisor.user_id, &contest("X", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProfileNotFound("Student")));
        assert_eq!(w.docs.len(), 0);
    }

    #[tokio::test]
    async fn failed_document_write_leaves_no_reference() {
        let w = world().await;
        w.docs.set_fail_writes(true);

        let err = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentWriteFailed(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievement_references")
            .fetch_one(&w.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn failed_reference_write_orphans_the_document() {
        let w = world().await;
        sqlx::query("DROP TABLE achievement_references")
            .execute(&w.pool)
            .await
            .unwrap();

        let err = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReferenceWriteFailed(_)));
        assert_eq!(w.docs.len(), 1);
    }

    #[tokio::test]
    async fn submit_moves_draft_once() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();

        let submitted = submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap();
        assert_eq!(submitted.status, AchievementStatus::Submitted);
        assert!(submitted.submitted_at.is_some());

        let err = submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStateTransition {
                current: AchievementStatus::Submitted,
                ..
            }
        ));
        assert!(err.to_string().contains("submitted"));
    }

    #[tokio::test]
    async fn other_students_cannot_touch_a_draft() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();
        let intruder = &w.student_b.user_id;

        let err = submit_achievement(&w.pool, intruder, &created.id).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = delete_achievement(&w.pool, &w.docs, intruder, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = upload_evidence(&w.pool, &w.docs, intruder, &created.id, evidence("a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        assert_eq!(status_of(&w.pool, &created.id).await, AchievementStatus::Draft);
        assert!(w.docs.get(&created.mongo_achievement_id).unwrap().is_live());
    }

    #[tokio::test]
    async fn unknown_achievement_is_not_found() {
        let w = world().await;
        let missing = uuid::Uuid::new_v4().to_string();
        let err = submit_achievement(&w.pool, &w.student_a.user_id, &missing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReferenceNotFound));
        let err = verify_achievement(&w.pool, &w.advisor.user_id, &missing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReferenceNotFound));
    }

    #[tokio::test]
    async fn only_the_assigned_advisor_reviews() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();

        // Draft cannot be verified yet
        let err = verify_achievement(&w.pool, &w.advisor.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));

        submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap();

        let err = verify_achievement(&w.pool, &w.other_advisor.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = verify_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let verified = verify_achievement(&w.pool, &w.advisor.user_id, &created.id)
            .await
            .unwrap();
        assert_eq!(verified.status, AchievementStatus::Verified);
        assert_eq!(verified.verified_by.as_deref(), Some(w.advisor.user_id.as_str()));
        assert!(verified.verified_at.is_some());

        // Reassigning the student later does not touch the verified record
        set_student_advisor(&w.pool, &w.student_a.user_id, Some(w.other_advisor.lecturer_id.as_str()))
            .await
            .unwrap();
        assert_eq!(status_of(&w.pool, &created.id).await, AchievementStatus::Verified);
        let err = reject_achievement(&w.pool, &w.other_advisor.user_id, &created.id, "late")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStateTransition {
                current: AchievementStatus::Verified,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn student_without_advisor_cannot_be_reviewed() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();
        submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap();
        set_student_advisor(&w.pool, &w.student_a.user_id, None).await.unwrap();

        let err = verify_achievement(&w.pool, &w.advisor.user_id, &created.id)
            .await
            .unwrap_err();
        match err {
            AppError::Unauthorized(msg) => assert!(msg.contains("no assigned advisor")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn reject_records_note_and_reopens_evidence_upload() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();
        submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap();

        let err = upload_evidence(&w.pool, &w.docs, &w.student_a.user_id, &created.id, evidence("a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));

        // Blank notes are a transport-level concern
        let rejected = reject_achievement(&w.pool, &w.advisor.user_id, &created.id, "")
            .await
            .unwrap();
        assert_eq!(rejected.status, AchievementStatus::Rejected);
        assert_eq!(rejected.rejection_note.as_deref(), Some(""));
        assert_eq!(rejected.verified_by.as_deref(), Some(w.advisor.user_id.as_str()));

        let view = upload_evidence(&w.pool, &w.docs, &w.student_a.user_id, &created.id, evidence("b.pdf"))
            .await
            .unwrap();
        assert_eq!(view.file_name, "b.pdf");
        assert_eq!(status_of(&w.pool, &created.id).await, AchievementStatus::Rejected);
        assert_eq!(w.docs.get(&created.mongo_achievement_id).unwrap().attachments.len(), 1);

        let err = submit_achievement(&w.pool, &w.student_a.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition { .. }));
    }

    #[tokio::test]
    async fn evidence_upload_failure_is_a_document_write_error() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();
        w.docs.set_fail_writes(true);

        let err = upload_evidence(&w.pool, &w.docs, &w.student_a.user_id, &created.id, evidence("a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentWriteFailed(_)));
    }

    #[tokio::test]
    async fn delete_hides_the_achievement_everywhere() {
        let w = world().await;
        let kept = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("Kept", 100))
            .await
            .unwrap();
        let dropped = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("Dropped", 50))
            .await
            .unwrap();

        delete_achievement(&w.pool, &w.docs, &w.student_a.user_id, &dropped.id)
            .await
            .unwrap();

        assert_eq!(status_of(&w.pool, &dropped.id).await, AchievementStatus::Deleted);
        assert!(w.docs.get(&dropped.mongo_achievement_id).unwrap().deleted_at.is_some());
        let fetched = w
            .docs
            .find_live_by_ids(&[dropped.mongo_achievement_id.clone()])
            .await
            .unwrap();
        assert!(fetched.is_empty());

        let page = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, kept.id);

        let err = delete_achievement(&w.pool, &w.docs, &w.student_a.user_id, &dropped.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStateTransition {
                current: AchievementStatus::Deleted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_document_soft_delete_keeps_the_draft() {
        let w = world().await;
        let created = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("X", 1))
            .await
            .unwrap();
        w.docs.set_fail_writes(true);

        let err = delete_achievement(&w.pool, &w.docs, &w.student_a.user_id, &created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentWriteFailed(_)));
        assert_eq!(status_of(&w.pool, &created.id).await, AchievementStatus::Draft);
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let w = world().await;
        let a = create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("A", 10))
            .await
            .unwrap();
        let b = create_achievement(&w.pool, &w.docs, &w.student_b.user_id, &contest("B", 20))
            .await
            .unwrap();

        // A student cannot widen the filter to someone else
        let mut filter = AchievementFilter::default();
        filter.student_ids = Some(vec![w.student_b.student_id.clone()]);
        let page = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, filter)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, a.id);
        assert_eq!(page.items[0].student_name, "Mahasiswa A");
        assert_eq!(page.items[0].nim, "NIM001");
        assert_eq!(page.items[0].title, "A");

        let page = list_achievements(&w.pool, &w.docs, &w.other_advisor.user_id, Role::Advisor, AchievementFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, b.id);

        let admin = Fixture::new(&w.pool).await.admin("root").await;
        let page = list_achievements(&w.pool, &w.docs, &admin, Role::Admin, AchievementFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, b.id);
    }

    #[tokio::test]
    async fn advisor_without_advisees_gets_empty_page_without_document_reads() {
        let w = world().await;
        let fx = Fixture::new(&w.pool).await;
        let idle = fx.lecturer("Dr. Idle", "NIP009").await;
        create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("A", 10))
            .await
            .unwrap();
        w.docs.set_fail_reads(true);

        let filter = AchievementFilter::new(None, Some(2), Some(5));
        let page = list_achievements(&w.pool, &w.docs, &idle.user_id, Role::Advisor, filter)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!((page.total, page.page, page.limit), (0, 2, 5));
    }

    #[tokio::test]
    async fn missing_documents_render_a_placeholder() {
        let w = world().await;
        let fx = Fixture::new(&w.pool).await;
        fx.reference_row(&w.student_a.student_id, "draft").await;

        let page = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, MISSING_DOCUMENT_TITLE);
        assert_eq!(page.items[0].points, 0);
    }

    #[tokio::test]
    async fn pages_follow_limit_and_total_ignores_pagination() {
        let w = world().await;
        for i in 0..5 {
            create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest(&format!("A{}", i), i))
                .await
                .unwrap();
        }

        let page = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::new(None, Some(3), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 1);

        let beyond = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::new(None, Some(9), Some(2)))
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);

        let huge = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::new(None, Some(i64::MAX), Some(100)))
            .await
            .unwrap();
        assert!(huge.items.is_empty());
        assert_eq!((huge.page, huge.total), (i64::MAX, 5));
    }

    #[tokio::test]
    async fn document_read_failure_surfaces() {
        let w = world().await;
        create_achievement(&w.pool, &w.docs, &w.student_a.user_id, &contest("A", 10))
            .await
            .unwrap();
        w.docs.set_fail_reads(true);

        let err = list_achievements(&w.pool, &w.docs, &w.student_a.user_id, Role::Student, AchievementFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentStoreError(_)));
    }
}
