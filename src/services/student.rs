use color_eyre::Result;
use rust_i18n::t;

use super::{Notice, NoticeKind};
use crate::db::Db;
use crate::models::{Profile, Question, QuestionThread};
use crate::realtime::{ChangeFeed, ChangeKind, Column, Filter, Record, Subscription, Table};

#[cfg_attr(test, mockall::automock)]
pub trait StudentRepository: Send + Sync {
    fn list_teachers(&self) -> impl std::future::Future<Output = Result<Vec<Profile>>> + Send;

    fn questions_for_student(
        &self,
        student_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<QuestionThread>>> + Send;

    fn create_question(
        &self,
        student_id: i32,
        teacher_id: i32,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Question>> + Send;

    fn question_belongs_to(
        &self,
        question_id: i32,
        student_id: i32,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl StudentRepository for Db {
    async fn list_teachers(&self) -> Result<Vec<Profile>> {
        Db::list_teachers(self).await
    }

    async fn questions_for_student(&self, student_id: i32) -> Result<Vec<QuestionThread>> {
        Db::questions_for_student(self, student_id).await
    }

    async fn create_question(
        &self,
        student_id: i32,
        teacher_id: i32,
        content: &str,
    ) -> Result<Question> {
        Db::create_question(self, student_id, teacher_id, content).await
    }

    async fn question_belongs_to(&self, question_id: i32, student_id: i32) -> Result<bool> {
        Db::question_belongs_to(self, question_id, student_id).await
    }
}

#[derive(Debug)]
pub enum SubmitQuestionOutcome {
    Submitted(Question),
    /// Content was empty after trimming; nothing was sent.
    MissingContent,
    /// No teacher was selected; nothing was sent.
    MissingTeacher,
    Failed,
}

/// Live subscriptions backing one student's dashboard. Dropping it
/// unregisters both.
pub struct StudentWatch {
    student_id: i32,
    question_updates: Subscription,
    answer_inserts: Subscription,
}

pub struct StudentService<R: StudentRepository = Db> {
    repo: R,
    feed: ChangeFeed,
}

impl<R: StudentRepository + Clone> Clone for StudentService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            feed: self.feed.clone(),
        }
    }
}

impl<R: StudentRepository> StudentService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self { repo, feed }
    }

    pub async fn list_teachers(&self) -> Result<Vec<Profile>> {
        self.repo.list_teachers().await
    }

    pub async fn list_own_questions(&self, student_id: i32) -> Result<Vec<QuestionThread>> {
        self.repo.questions_for_student(student_id).await
    }

    pub async fn submit_question(
        &self,
        student_id: i32,
        content: &str,
        teacher_id: Option<i32>,
    ) -> SubmitQuestionOutcome {
        let content = content.trim();
        if content.is_empty() {
            return SubmitQuestionOutcome::MissingContent;
        }
        let Some(teacher_id) = teacher_id else {
            return SubmitQuestionOutcome::MissingTeacher;
        };

        match self
            .repo
            .create_question(student_id, teacher_id, content)
            .await
        {
            Ok(question) => SubmitQuestionOutcome::Submitted(question),
            Err(e) => {
                tracing::error!("failed to submit question for student {student_id}: {e}");
                SubmitQuestionOutcome::Failed
            }
        }
    }

    pub fn watch(&self, student_id: i32) -> StudentWatch {
        StudentWatch {
            student_id,
            question_updates: self.feed.subscribe(
                Table::Questions,
                ChangeKind::Update,
                Some(Filter::eq(Column::StudentId, student_id)),
            ),
            answer_inserts: self.feed.subscribe(Table::Answers, ChangeKind::Insert, None),
        }
    }

    /// Waits for the next change that concerns the watched student. Answer
    /// inserts are checked against question ownership before they count.
    pub async fn next_notice(&self, watch: &mut StudentWatch) -> Option<Notice> {
        loop {
            tokio::select! {
                event = watch.question_updates.recv() => {
                    event?;
                    return Some(Notice::new(
                        NoticeKind::Info,
                        t!("student.notice_updated_title"),
                        t!("student.notice_updated_desc"),
                    ));
                }
                event = watch.answer_inserts.recv() => {
                    let Record::Answer(answer) = event?.record else {
                        continue;
                    };
                    match self
                        .repo
                        .question_belongs_to(answer.question_id, watch.student_id)
                        .await
                    {
                        Ok(true) => {
                            return Some(Notice::new(
                                NoticeKind::Info,
                                t!("student.notice_answer_title"),
                                t!("student.notice_answer_desc"),
                            ));
                        }
                        Ok(false) => continue,
                        Err(e) => {
                            tracing::warn!("could not check answer ownership: {e}");
                            continue;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::models::{Answer, QuestionStatus};

    fn question(id: i32, student_id: i32, teacher_id: i32) -> Question {
        Question {
            id,
            content: "What is 2+2?".to_string(),
            status: QuestionStatus::Pending,
            created_at: Utc::now(),
            student_id,
            teacher_id,
        }
    }

    fn answer(question_id: i32) -> Answer {
        Answer {
            id: 100,
            content: "It is 4.".to_string(),
            created_at: Utc::now(),
            teacher_id: 2,
            question_id,
        }
    }

    async fn notice(svc: &StudentService<MockStudentRepository>, w: &mut StudentWatch) -> Option<Notice> {
        tokio::time::timeout(Duration::from_millis(100), svc.next_notice(w))
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn empty_content_never_inserts() {
        // No expectations: an insert would panic.
        let svc = StudentService::new(MockStudentRepository::new(), ChangeFeed::new());

        for content in ["", "   ", "\n\t"] {
            let outcome = svc.submit_question(1, content, Some(2)).await;
            assert!(matches!(outcome, SubmitQuestionOutcome::MissingContent));
        }
    }

    #[tokio::test]
    async fn missing_teacher_never_inserts() {
        let svc = StudentService::new(MockStudentRepository::new(), ChangeFeed::new());
        let outcome = svc.submit_question(1, "What is 2+2?", None).await;
        assert!(matches!(outcome, SubmitQuestionOutcome::MissingTeacher));
    }

    #[tokio::test]
    async fn submit_inserts_trimmed_pending_question() {
        let mut repo = MockStudentRepository::new();
        repo.expect_create_question()
            .withf(|student, teacher, content| *student == 1 && *teacher == 2 && content == "What is 2+2?")
            .times(1)
            .returning(|s, t, _| Box::pin(async move { Ok(question(10, s, t)) }));

        let svc = StudentService::new(repo, ChangeFeed::new());
        let outcome = svc.submit_question(1, "  What is 2+2?\n", Some(2)).await;

        let SubmitQuestionOutcome::Submitted(q) = outcome else {
            panic!("expected the question to be submitted");
        };
        assert_eq!(q.status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn backend_failure_is_reported_not_raised() {
        let mut repo = MockStudentRepository::new();
        repo.expect_create_question()
            .returning(|_, _, _| Box::pin(async { Err(color_eyre::eyre::eyre!("rls violation")) }));

        let svc = StudentService::new(repo, ChangeFeed::new());
        let outcome = svc.submit_question(1, "Why?", Some(2)).await;
        assert!(matches!(outcome, SubmitQuestionOutcome::Failed));
    }

    #[tokio::test]
    async fn status_update_on_own_question_produces_a_notice() {
        let feed = ChangeFeed::new();
        let svc = StudentService::new(MockStudentRepository::new(), feed.clone());
        let mut watch = svc.watch(1);

        let mut answered = question(10, 1, 2);
        answered.status = QuestionStatus::Answered;
        feed.publish(ChangeKind::Update, Record::Question(question(11, 9, 2)));
        feed.publish(ChangeKind::Update, Record::Question(answered));

        let n = notice(&svc, &mut watch).await.unwrap();
        assert_eq!(n.kind, NoticeKind::Info);
        assert!(notice(&svc, &mut watch).await.is_none());
    }

    #[tokio::test]
    async fn answer_inserts_are_checked_for_ownership() {
        let mut repo = MockStudentRepository::new();
        repo.expect_question_belongs_to()
            .returning(|question_id, _| Box::pin(async move { Ok(question_id == 10) }));

        let feed = ChangeFeed::new();
        let svc = StudentService::new(repo, feed.clone());
        let mut watch = svc.watch(1);

        feed.publish(ChangeKind::Insert, Record::Answer(answer(99)));
        feed.publish(ChangeKind::Insert, Record::Answer(answer(10)));

        assert!(notice(&svc, &mut watch).await.is_some());
        assert!(notice(&svc, &mut watch).await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_watch_releases_both_subscriptions() {
        let feed = ChangeFeed::new();
        let svc = StudentService::new(MockStudentRepository::new(), feed.clone());

        let watch = svc.watch(1);
        assert_eq!(feed.active_subscriptions(), 2);
        drop(watch);
        assert_eq!(feed.active_subscriptions(), 0);
    }
}
