//! Database tests. They run against `TEST_DATABASE_URL` and are skipped when
//! it is unset.

mod common;

use std::time::Duration;

use common::{test_db, unique_email};
use educonnect::{
    db::EmailAlreadyRegistered,
    models::{QuestionStatus, Role},
    services::{
        student::{StudentService, SubmitQuestionOutcome},
        teacher::{AnswerOutcome, TeacherService},
    },
};

macro_rules! db_or_skip {
    () => {
        match test_db().await {
            Some(db) => db,
            None => {
                eprintln!("TEST_DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn migrations_are_recorded() {
    let db = db_or_skip!();
    assert!(db.migration_applied("V1").await.unwrap());
}

#[tokio::test]
async fn users_get_a_profile_and_teachers_are_listed() {
    let db = db_or_skip!();
    let email = unique_email("teacher");

    let id = db
        .create_user(&email, "secret", "Dr. Lee", Role::Teacher)
        .await
        .unwrap();

    let profile = db.find_profile(id).await.unwrap().unwrap();
    assert_eq!(profile.full_name, "Dr. Lee");
    assert_eq!(profile.role, Role::Teacher);

    assert!(db.email_exists(&email).await.unwrap());
    assert!(db.verify_user_password(&email, "secret").await.unwrap());
    assert!(!db.verify_user_password(&email, "wrong").await.unwrap());

    let teachers = db.list_teachers().await.unwrap();
    assert!(teachers.iter().any(|t| t.user_id == id));
    assert!(teachers.iter().all(|t| t.role == Role::Teacher));
}

#[tokio::test]
async fn duplicate_email_insert_is_reported_as_taken() {
    let db = db_or_skip!();
    let email = unique_email("twice");

    db.create_user(&email, "secret", "Sam", Role::Student)
        .await
        .unwrap();

    let err = db
        .create_user(&email, "other", "Sam Again", Role::Teacher)
        .await
        .unwrap_err();
    assert!(err.is::<EmailAlreadyRegistered>());

    let err = db
        .create_unverified_user(&email, "other", "Sam Again", Role::Student)
        .await
        .unwrap_err();
    assert!(err.is::<EmailAlreadyRegistered>());
}

#[tokio::test]
async fn sessions_resolve_and_delete_idempotently() {
    let db = db_or_skip!();
    let email = unique_email("student");
    let id = db
        .create_user(&email, "secret", "Sam", Role::Student)
        .await
        .unwrap();

    let token = db.create_user_session(id).await.unwrap();
    let user = db.get_user_by_session(&token).await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.email, email);

    db.delete_user_session(&token).await.unwrap();
    db.delete_user_session(&token).await.unwrap();
    assert!(db.get_user_by_session(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn email_verification_tokens_work_once() {
    let db = db_or_skip!();
    let email = unique_email("pending");
    let (_, token) = db
        .create_unverified_user(&email, "secret", "Pat", Role::Student)
        .await
        .unwrap();

    assert!(!db.is_email_verified(&email).await.unwrap());
    assert!(db.verify_email_token(&token).await.unwrap());
    assert!(db.is_email_verified(&email).await.unwrap());
    assert!(!db.verify_email_token(&token).await.unwrap());
}

#[tokio::test]
async fn question_and_answer_flow_across_both_views() {
    let db = db_or_skip!();
    let student_id = db
        .create_user(&unique_email("student"), "pw", "Sam", Role::Student)
        .await
        .unwrap();
    let teacher_id = db
        .create_user(&unique_email("teacher"), "pw", "Dr. Lee", Role::Teacher)
        .await
        .unwrap();

    let students = StudentService::new(db.clone(), db.feed().clone());
    let teachers = TeacherService::new(db.clone(), db.feed().clone());
    let mut student_watch = students.watch(student_id);
    let mut teacher_watch = teachers.watch(teacher_id);

    // Student asks.
    let SubmitQuestionOutcome::Submitted(question) = students
        .submit_question(student_id, "What is 2+2?", Some(teacher_id))
        .await
    else {
        panic!("question should be submitted");
    };
    assert_eq!(question.status, QuestionStatus::Pending);

    let mine = students.list_own_questions(student_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].counterpart_name, "Dr. Lee");
    assert!(mine[0].answers.is_empty());

    // Teacher is told and sees it pending.
    let notice = tokio::time::timeout(Duration::from_secs(1), teachers.next_notice(&mut teacher_watch))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notice.title, "New Question");

    let board = teachers.board(teacher_id).await.unwrap();
    assert_eq!(board.pending_count(), 1);
    assert_eq!(board.answered_count(), 0);
    assert_eq!(board.pending[0].counterpart_name, "Sam");

    // Teacher answers.
    let outcome = teachers
        .submit_answer(teacher_id, question.id, "It is 4.")
        .await;
    assert!(matches!(outcome, AnswerOutcome::Answered(_)), "got {outcome:?}");

    let board = teachers.board(teacher_id).await.unwrap();
    assert_eq!(board.pending_count(), 0);
    assert_eq!(board.answered_count(), 1);

    // Student is told and sees the answer.
    let notice = tokio::time::timeout(Duration::from_secs(1), students.next_notice(&mut student_watch))
        .await
        .unwrap()
        .unwrap();
    assert!(notice.title == "New Answer" || notice.title == "Question Updated");

    let mine = students.list_own_questions(student_id).await.unwrap();
    assert_eq!(mine[0].question.status, QuestionStatus::Answered);
    assert_eq!(mine[0].answers.len(), 1);
    assert_eq!(mine[0].answers[0].answer.content, "It is 4.");
    assert_eq!(mine[0].answers[0].author_name, "Dr. Lee");

    // A second answer is turned away.
    let again = teachers
        .submit_answer(teacher_id, question.id, "Still 4.")
        .await;
    assert!(matches!(again, AnswerOutcome::AlreadyAnswered));
}

#[tokio::test]
async fn teachers_cannot_answer_questions_addressed_to_others() {
    let db = db_or_skip!();
    let student_id = db
        .create_user(&unique_email("student"), "pw", "Sam", Role::Student)
        .await
        .unwrap();
    let addressed = db
        .create_user(&unique_email("teacher"), "pw", "Dr. Lee", Role::Teacher)
        .await
        .unwrap();
    let other = db
        .create_user(&unique_email("teacher"), "pw", "Dr. Kim", Role::Teacher)
        .await
        .unwrap();

    let question = db
        .create_question(student_id, addressed, "Why is the sky blue?")
        .await
        .unwrap();

    assert!(db.question_belongs_to(question.id, student_id).await.unwrap());
    assert!(!db.question_belongs_to(question.id, other).await.unwrap());
    assert_eq!(
        db.assigned_question_status(addressed, question.id).await.unwrap(),
        Some(QuestionStatus::Pending)
    );
    assert_eq!(db.assigned_question_status(other, question.id).await.unwrap(), None);

    let teachers = TeacherService::new(db.clone(), db.feed().clone());
    let outcome = teachers.submit_answer(other, question.id, "Rayleigh").await;
    assert!(matches!(outcome, AnswerOutcome::NotAssigned));
}
