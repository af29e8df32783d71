use std::{convert::Infallible, pin::Pin, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::{stream, Stream, StreamExt};

use crate::{
    extractors::AuthGuard,
    models::Role,
    realtime::Subscription,
    services::{
        student::{StudentRepository, StudentService, StudentWatch},
        teacher::{TeacherRepository, TeacherService},
        Notice,
    },
    views::components,
    AppState,
};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

type NoticeStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(events))
}

fn notice_event(notice: &Notice) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event("notice")
        .data(components::toast(notice).into_string()))
}

fn student_notices<R>(students: StudentService<R>, watch: StudentWatch) -> NoticeStream
where
    R: StudentRepository + 'static,
{
    stream::unfold((students, watch), |(students, mut watch)| async move {
        let notice = students.next_notice(&mut watch).await?;
        Some((notice_event(&notice), (students, watch)))
    })
    .boxed()
}

fn teacher_notices<R>(teachers: TeacherService<R>, watch: Subscription) -> NoticeStream
where
    R: TeacherRepository + 'static,
{
    stream::unfold((teachers, watch), |(teachers, mut watch)| async move {
        let notice = teachers.next_notice(&mut watch).await?;
        Some((notice_event(&notice), (teachers, watch)))
    })
    .boxed()
}

/// Live notices for the signed-in user. The subscriptions behind the stream
/// are dropped, and so unregistered, when the client goes away.
async fn events(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = signed_in.user.id;
    tracing::debug!("user {user_id} connected to live updates");

    let notices = match signed_in.profile.role {
        Role::Student => {
            let watch = state.students.watch(user_id);
            student_notices(state.students.clone(), watch)
        }
        Role::Teacher => {
            let watch = state.teachers.watch(user_id);
            teacher_notices(state.teachers.clone(), watch)
        }
    };

    Sse::new(notices).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}
