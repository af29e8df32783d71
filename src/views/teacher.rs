use std::collections::HashMap;

use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    models::QuestionThread,
    names,
    services::teacher::{SubmissionState, TeacherBoard},
    views::components,
};

fn student_name(name: &str) -> String {
    if name.is_empty() {
        t!("teacher.unknown_student").to_string()
    } else {
        name.to_string()
    }
}

fn stats(board: &TeacherBoard, out_of_band: bool) -> Markup {
    html! {
        div #teacher-stats .stats hx-swap-oob=[out_of_band.then_some("true")] {
            article.stat {
                strong { (board.pending_count()) }
                small { (t!("teacher.pending_count")) }
            }
            article.stat {
                strong { (board.answered_count()) }
                small { (t!("teacher.answered_count")) }
            }
            article.stat {
                strong { (board.total()) }
                small { (t!("teacher.total_count")) }
            }
        }
    }
}

fn card_id(question_id: i32) -> String {
    format!("question-{question_id}")
}

fn composer(question_id: i32, state: SubmissionState) -> Markup {
    let in_flight = state == SubmissionState::InFlight;
    html! {
        form.composer
             hx-post=(names::answer_url(question_id))
             hx-target={ "#" (card_id(question_id)) }
             hx-swap="outerHTML"
             hx-disabled-elt="find button[type='submit']" {
            textarea name="content"
                     rows="3"
                     required="true"
                     placeholder=(t!("teacher.answer_placeholder"))
                     oninput="this.form.querySelector('button').disabled = !this.value.trim()" {}
            @if state == SubmissionState::Failed {
                small.retry-hint role="alert" { (t!("teacher.retry_hint")) }
            }
            button type="submit" disabled aria-busy=[in_flight.then_some("true")] {
                (t!("teacher.submit_btn"))
            }
        }
    }
}

fn question_card(thread: &QuestionThread, state: Option<SubmissionState>) -> Markup {
    let question = &thread.question;
    html! {
        article.question-card id=(card_id(question.id)) {
            header {
                @if thread.is_answered() {
                    (components::badge(&t!("status.answered"), "badge-answered"))
                } @else {
                    (components::badge(&t!("status.pending"), "badge-pending"))
                }
                small { (t!("teacher.from", name = student_name(&thread.counterpart_name))) }
            }
            p.question-content { (question.content) }
            small.muted { (t!("teacher.asked_on", date = components::date(&question.created_at))) }

            @for view in &thread.answers {
                blockquote.answer {
                    p { (view.answer.content) }
                    footer {
                        (t!("teacher.answered_on", date = components::date_time(&view.answer.created_at)))
                    }
                }
            }

            @if let Some(state) = state {
                (composer(question.id, state))
            }
        }
    }
}

fn pending_card(thread: &QuestionThread, states: &HashMap<i32, SubmissionState>) -> Markup {
    let state = states.get(&thread.question.id).copied().unwrap_or_default();
    question_card(thread, Some(state))
}

/// Hidden poller that asks for questions newer than `after` on every live
/// notice and replaces itself with an advanced cursor.
fn pending_feed(after: i32) -> Markup {
    html! {
        div #pending-feed
            hidden
            hx-get=(names::new_teacher_questions_url(after))
            hx-trigger="sse:notice"
            hx-swap="outerHTML" {}
    }
}

/// Stats, pending questions with a composer each, then answered questions
/// read-only. Cards are added and moved individually so drafts typed into
/// other composers survive live updates.
pub fn board(board: &TeacherBoard, states: &HashMap<i32, SubmissionState>) -> Markup {
    html! {
        section #teacher-board {
            (stats(board, false))

            article.empty-state {
                h4 { (t!("teacher.empty_title")) }
                p { (t!("teacher.empty_desc")) }
            }
            section.board-section {
                h3 { (t!("teacher.pending_title")) }
                div #pending-list {
                    @for thread in &board.pending {
                        (pending_card(thread, states))
                    }
                }
            }
            section.board-section {
                h3 { (t!("teacher.answered_title")) }
                div #answered-list {
                    @for thread in &board.answered {
                        (question_card(thread, None))
                    }
                }
            }

            (pending_feed(board.newest_id()))
        }
    }
}

/// Response to a new-question notice: pending cards newer than `after` go on
/// top of the pending list, the stats and the cursor are replaced.
pub fn new_pending(
    board: &TeacherBoard,
    after: i32,
    states: &HashMap<i32, SubmissionState>,
) -> Markup {
    html! {
        (pending_feed(board.newest_id().max(after)))
        (stats(board, true))
        div hx-swap-oob="afterbegin:#pending-list" {
            @for thread in board.pending_after(after) {
                (pending_card(thread, states))
            }
        }
    }
}

/// Response to a settled answer. The pending card it targets is swapped for
/// nothing; the answered version goes on top of the answered list.
pub fn answered(board: &TeacherBoard, question_id: i32) -> Markup {
    html! {
        (stats(board, true))
        @if let Some(thread) = board.answered_thread(question_id) {
            div hx-swap-oob="afterbegin:#answered-list" {
                (question_card(thread, None))
            }
        }
    }
}
