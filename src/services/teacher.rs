use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use color_eyre::Result;
use rust_i18n::t;

use super::{Notice, NoticeKind};
use crate::db::Db;
use crate::models::{Answer, Question, QuestionStatus, QuestionThread};
use crate::realtime::{ChangeFeed, ChangeKind, Column, Filter, Subscription, Table};

#[cfg_attr(test, mockall::automock)]
pub trait TeacherRepository: Send + Sync {
    fn questions_for_teacher(
        &self,
        teacher_id: i32,
    ) -> impl std::future::Future<Output = Result<Vec<QuestionThread>>> + Send;

    fn assigned_question_status(
        &self,
        teacher_id: i32,
        question_id: i32,
    ) -> impl std::future::Future<Output = Result<Option<QuestionStatus>>> + Send;

    fn create_answer(
        &self,
        question_id: i32,
        teacher_id: i32,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Answer>> + Send;

    fn mark_answered(
        &self,
        question_id: i32,
    ) -> impl std::future::Future<Output = Result<Question>> + Send;
}

impl TeacherRepository for Db {
    async fn questions_for_teacher(&self, teacher_id: i32) -> Result<Vec<QuestionThread>> {
        Db::questions_for_teacher(self, teacher_id).await
    }

    async fn assigned_question_status(
        &self,
        teacher_id: i32,
        question_id: i32,
    ) -> Result<Option<QuestionStatus>> {
        Db::assigned_question_status(self, teacher_id, question_id).await
    }

    async fn create_answer(&self, question_id: i32, teacher_id: i32, content: &str) -> Result<Answer> {
        Db::create_answer(self, question_id, teacher_id, content).await
    }

    async fn mark_answered(&self, question_id: i32) -> Result<Question> {
        Db::mark_answered(self, question_id).await
    }
}

/// Per-question submission state on the teacher side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Failed,
}

#[derive(Debug)]
pub enum AnswerOutcome {
    Answered(Answer),
    /// The answer row exists but the question still reads as pending.
    AnswerSavedStatusStale { answer: Answer, detail: String },
    Failed(String),
    EmptyContent,
    AlreadyInFlight,
    NotAssigned,
    AlreadyAnswered,
}

/// A teacher's assigned questions split by status, newest first in each half.
#[derive(Debug, Default)]
pub struct TeacherBoard {
    pub pending: Vec<QuestionThread>,
    pub answered: Vec<QuestionThread>,
}

impl TeacherBoard {
    pub fn from_threads(threads: Vec<QuestionThread>) -> Self {
        let (answered, pending): (Vec<_>, Vec<_>) =
            threads.into_iter().partition(QuestionThread::is_answered);
        Self { pending, answered }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.answered.len()
    }

    /// Highest question id on the board, or 0 when it is empty.
    pub fn newest_id(&self) -> i32 {
        self.pending
            .iter()
            .chain(&self.answered)
            .map(|thread| thread.question.id)
            .max()
            .unwrap_or(0)
    }

    /// Pending questions newer than `after`, newest first.
    pub fn pending_after(&self, after: i32) -> impl Iterator<Item = &QuestionThread> + '_ {
        self.pending.iter().filter(move |thread| thread.question.id > after)
    }

    pub fn answered_thread(&self, question_id: i32) -> Option<&QuestionThread> {
        self.answered
            .iter()
            .find(|thread| thread.question.id == question_id)
    }
}

type Submissions = Arc<Mutex<HashMap<(i32, i32), SubmissionState>>>;

/// Holds a question's in-flight slot. Whatever state was settled is written
/// back on drop, so an abandoned request does not leave the question locked.
struct Claim<'a> {
    submissions: &'a Submissions,
    key: (i32, i32),
    settled: SubmissionState,
}

impl Claim<'_> {
    fn take(submissions: &Submissions, key: (i32, i32)) -> Option<Claim<'_>> {
        let mut map = submissions.lock().unwrap_or_else(|e| e.into_inner());
        if map.get(&key) == Some(&SubmissionState::InFlight) {
            return None;
        }
        map.insert(key, SubmissionState::InFlight);
        Some(Claim {
            submissions,
            key,
            settled: SubmissionState::Idle,
        })
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut map = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
        match self.settled {
            SubmissionState::Idle => map.remove(&self.key),
            state => map.insert(self.key, state),
        };
    }
}

pub struct TeacherService<R: TeacherRepository = Db> {
    repo: R,
    feed: ChangeFeed,
    submissions: Submissions,
}

impl<R: TeacherRepository + Clone> Clone for TeacherService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            feed: self.feed.clone(),
            submissions: self.submissions.clone(),
        }
    }
}

impl<R: TeacherRepository> TeacherService<R> {
    pub fn new(repo: R, feed: ChangeFeed) -> Self {
        Self {
            repo,
            feed,
            submissions: Arc::default(),
        }
    }

    pub async fn list_assigned_questions(&self, teacher_id: i32) -> Result<Vec<QuestionThread>> {
        self.repo.questions_for_teacher(teacher_id).await
    }

    pub async fn board(&self, teacher_id: i32) -> Result<TeacherBoard> {
        let threads = self.list_assigned_questions(teacher_id).await?;
        Ok(TeacherBoard::from_threads(threads))
    }

    pub fn submission_state(&self, teacher_id: i32, question_id: i32) -> SubmissionState {
        let map = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&(teacher_id, question_id)).copied().unwrap_or_default()
    }

    /// Non-idle submission states for one teacher, keyed by question id.
    pub fn submission_states(&self, teacher_id: i32) -> HashMap<i32, SubmissionState> {
        let map = self.submissions.lock().unwrap_or_else(|e| e.into_inner());
        map.iter()
            .filter(|((teacher, _), _)| *teacher == teacher_id)
            .map(|((_, question), state)| (*question, *state))
            .collect()
    }

    /// Insert the answer, then flip the question to answered. At most one
    /// submission per question runs at a time; a second one is turned away
    /// without touching the backend.
    pub async fn submit_answer(
        &self,
        teacher_id: i32,
        question_id: i32,
        content: &str,
    ) -> AnswerOutcome {
        let content = content.trim();
        if content.is_empty() {
            return AnswerOutcome::EmptyContent;
        }

        let Some(mut claim) = Claim::take(&self.submissions, (teacher_id, question_id)) else {
            return AnswerOutcome::AlreadyInFlight;
        };

        match self.repo.assigned_question_status(teacher_id, question_id).await {
            Ok(Some(QuestionStatus::Pending)) => {}
            Ok(Some(QuestionStatus::Answered)) => return AnswerOutcome::AlreadyAnswered,
            Ok(None) => return AnswerOutcome::NotAssigned,
            Err(e) => {
                tracing::error!("failed to look up question {question_id}: {e}");
                claim.settled = SubmissionState::Failed;
                return AnswerOutcome::Failed(e.to_string());
            }
        }

        let answer = match self.repo.create_answer(question_id, teacher_id, content).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("failed to save answer for question {question_id}: {e}");
                claim.settled = SubmissionState::Failed;
                return AnswerOutcome::Failed(e.to_string());
            }
        };

        match self.repo.mark_answered(question_id).await {
            Ok(_) => {
                tracing::info!("teacher {teacher_id} answered question {question_id}");
                AnswerOutcome::Answered(answer)
            }
            Err(e) => {
                tracing::warn!("answer {} saved but question {question_id} is still pending: {e}", answer.id);
                AnswerOutcome::AnswerSavedStatusStale {
                    answer,
                    detail: e.to_string(),
                }
            }
        }
    }

    pub fn watch(&self, teacher_id: i32) -> Subscription {
        self.feed.subscribe(
            Table::Questions,
            ChangeKind::Insert,
            Some(Filter::eq(Column::TeacherId, teacher_id)),
        )
    }

    pub async fn next_notice(&self, watch: &mut Subscription) -> Option<Notice> {
        watch.recv().await?;
        Some(Notice::new(
            NoticeKind::Info,
            t!("teacher.notice_new_title"),
            t!("teacher.notice_new_desc"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::oneshot;

    use super::*;
    use crate::models::AnswerView;
    use crate::realtime::Record;

    fn question(id: i32, status: QuestionStatus) -> Question {
        Question {
            id,
            content: format!("question {id}"),
            status,
            created_at: Utc::now(),
            student_id: 1,
            teacher_id: 2,
        }
    }

    fn answer(question_id: i32) -> Answer {
        Answer {
            id: 50,
            content: "Because.".to_string(),
            created_at: Utc::now(),
            teacher_id: 2,
            question_id,
        }
    }

    fn thread(id: i32, status: QuestionStatus) -> QuestionThread {
        let answers = match status {
            QuestionStatus::Answered => vec![AnswerView {
                answer: answer(id),
                author_name: "Dr. Lee".to_string(),
            }],
            QuestionStatus::Pending => Vec::new(),
        };
        QuestionThread {
            question: question(id, status),
            counterpart_name: "Sam".to_string(),
            answers,
        }
    }

    fn pending_repo() -> MockTeacherRepository {
        let mut repo = MockTeacherRepository::new();
        repo.expect_assigned_question_status()
            .returning(|_, _| Box::pin(async { Ok(Some(QuestionStatus::Pending)) }));
        repo
    }

    #[tokio::test]
    async fn board_splits_by_status_and_counts_add_up() {
        let mut repo = MockTeacherRepository::new();
        repo.expect_questions_for_teacher().returning(|_| {
            Box::pin(async {
                Ok(vec![
                    thread(5, QuestionStatus::Pending),
                    thread(4, QuestionStatus::Answered),
                    thread(3, QuestionStatus::Pending),
                ])
            })
        });

        let board = TeacherService::new(repo, ChangeFeed::new()).board(2).await.unwrap();

        assert_eq!(board.pending_count(), 2);
        assert_eq!(board.answered_count(), 1);
        assert_eq!(board.total(), board.pending_count() + board.answered_count());
        let pending: Vec<i32> = board.pending.iter().map(|t| t.question.id).collect();
        assert_eq!(pending, vec![5, 3]);
    }

    #[test]
    fn board_finds_newer_pending_questions() {
        let board = TeacherBoard::from_threads(vec![
            thread(7, QuestionStatus::Pending),
            thread(6, QuestionStatus::Answered),
            thread(4, QuestionStatus::Pending),
        ]);

        assert_eq!(board.newest_id(), 7);
        let fresh: Vec<i32> = board.pending_after(4).map(|t| t.question.id).collect();
        assert_eq!(fresh, vec![7]);
        assert_eq!(board.pending_after(7).count(), 0);
        assert!(board.answered_thread(6).is_some());
        assert!(board.answered_thread(7).is_none());
        assert_eq!(TeacherBoard::default().newest_id(), 0);
    }

    #[tokio::test]
    async fn empty_answer_touches_nothing() {
        let svc = TeacherService::new(MockTeacherRepository::new(), ChangeFeed::new());
        let outcome = svc.submit_answer(2, 10, "  \n ").await;

        assert!(matches!(outcome, AnswerOutcome::EmptyContent));
        assert_eq!(svc.submission_state(2, 10), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn successful_answer_inserts_then_marks_answered() {
        let mut repo = pending_repo();
        let mut seq = mockall::Sequence::new();
        repo.expect_create_answer()
            .withf(|q, t, content| *q == 10 && *t == 2 && content == "Because.")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|q, _, _| Box::pin(async move { Ok(answer(q)) }));
        repo.expect_mark_answered()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|q| Box::pin(async move { Ok(question(q, QuestionStatus::Answered)) }));

        let svc = TeacherService::new(repo, ChangeFeed::new());
        let outcome = svc.submit_answer(2, 10, " Because. ").await;

        assert!(matches!(outcome, AnswerOutcome::Answered(a) if a.question_id == 10));
        assert_eq!(svc.submission_state(2, 10), SubmissionState::Idle);
        assert!(svc.submission_states(2).is_empty());
    }

    #[tokio::test]
    async fn failed_insert_never_marks_answered() {
        let mut repo = pending_repo();
        repo.expect_create_answer()
            .returning(|_, _, _| Box::pin(async { Err(color_eyre::eyre::eyre!("insert failed")) }));
        repo.expect_mark_answered().never();

        let svc = TeacherService::new(repo, ChangeFeed::new());
        let outcome = svc.submit_answer(2, 10, "Because.").await;

        assert!(matches!(outcome, AnswerOutcome::Failed(detail) if detail.contains("insert failed")));
        assert_eq!(svc.submission_state(2, 10), SubmissionState::Failed);
        assert_eq!(svc.submission_states(2).get(&10), Some(&SubmissionState::Failed));
    }

    #[tokio::test]
    async fn failed_status_update_keeps_the_answer() {
        let mut repo = pending_repo();
        repo.expect_create_answer()
            .returning(|q, _, _| Box::pin(async move { Ok(answer(q)) }));
        repo.expect_mark_answered()
            .returning(|_| Box::pin(async { Err(color_eyre::eyre::eyre!("update failed")) }));

        let svc = TeacherService::new(repo, ChangeFeed::new());
        let outcome = svc.submit_answer(2, 10, "Because.").await;

        let AnswerOutcome::AnswerSavedStatusStale { answer, detail } = outcome else {
            panic!("expected a partial success");
        };
        assert_eq!(answer.question_id, 10);
        assert!(detail.contains("update failed"));
    }

    #[tokio::test]
    async fn unassigned_and_answered_questions_are_refused() {
        let mut repo = MockTeacherRepository::new();
        repo.expect_assigned_question_status().returning(|_, q| {
            Box::pin(async move {
                Ok(match q {
                    10 => Some(QuestionStatus::Answered),
                    _ => None,
                })
            })
        });
        repo.expect_create_answer().never();

        let svc = TeacherService::new(repo, ChangeFeed::new());
        assert!(matches!(
            svc.submit_answer(2, 10, "again").await,
            AnswerOutcome::AlreadyAnswered
        ));
        assert!(matches!(
            svc.submit_answer(2, 11, "not mine").await,
            AnswerOutcome::NotAssigned
        ));
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_turned_away() {
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let mut release_rx = Some(release_rx);

        let mut repo = MockTeacherRepository::new();
        repo.expect_assigned_question_status().times(1).returning(move |_, _| {
            let rx = release_rx.take().unwrap();
            Box::pin(async move {
                let _ = rx.await;
                Ok(Some(QuestionStatus::Pending))
            })
        });
        repo.expect_create_answer()
            .times(1)
            .returning(|q, _, _| Box::pin(async move { Ok(answer(q)) }));
        repo.expect_mark_answered()
            .times(1)
            .returning(|q| Box::pin(async move { Ok(question(q, QuestionStatus::Answered)) }));

        let svc = Arc::new(TeacherService::new(repo, ChangeFeed::new()));
        let first = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.submit_answer(2, 10, "first").await })
        };

        // Wait for the first submission to claim the question.
        while svc.submission_state(2, 10) != SubmissionState::InFlight {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            svc.submit_answer(2, 10, "second").await,
            AnswerOutcome::AlreadyInFlight
        ));
        // Another question is unaffected by the lock.
        assert_eq!(svc.submission_state(2, 11), SubmissionState::Idle);

        release_tx.send(()).unwrap();
        assert!(matches!(first.await.unwrap(), AnswerOutcome::Answered(_)));
        assert_eq!(svc.submission_state(2, 10), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn abandoned_submission_releases_the_question() {
        let mut repo = MockTeacherRepository::new();
        repo.expect_assigned_question_status()
            .returning(|_, _| Box::pin(std::future::pending::<Result<Option<QuestionStatus>>>()));

        let svc = TeacherService::new(repo, ChangeFeed::new());
        let attempt =
            tokio::time::timeout(Duration::from_millis(20), svc.submit_answer(2, 10, "hi")).await;

        assert!(attempt.is_err());
        assert_eq!(svc.submission_state(2, 10), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn only_assigned_inserts_produce_notices() {
        let feed = ChangeFeed::new();
        let svc = TeacherService::new(MockTeacherRepository::new(), feed.clone());
        let mut watch = svc.watch(2);

        let mut other = question(7, QuestionStatus::Pending);
        other.teacher_id = 9;
        feed.publish(ChangeKind::Insert, Record::Question(other));
        feed.publish(ChangeKind::Update, Record::Question(question(8, QuestionStatus::Answered)));
        feed.publish(ChangeKind::Insert, Record::Question(question(9, QuestionStatus::Pending)));

        let first = tokio::time::timeout(Duration::from_millis(100), svc.next_notice(&mut watch)).await;
        assert!(first.unwrap().is_some());
        let second = tokio::time::timeout(Duration::from_millis(100), svc.next_notice(&mut watch)).await;
        assert!(second.is_err());
    }
}
