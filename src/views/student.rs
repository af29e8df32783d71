use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    models::{Profile, QuestionThread},
    names,
    views::components,
};

/// Values kept in the ask form across a re-render.
#[derive(Debug, Default)]
pub struct QuestionForm<'a> {
    pub content: &'a str,
    pub teacher_id: Option<i32>,
}

fn teacher_name(name: &str) -> String {
    if name.is_empty() {
        t!("student.unknown_teacher").to_string()
    } else {
        name.to_string()
    }
}

fn ask_form(teachers: &[Profile], form: &QuestionForm) -> Markup {
    html! {
        article {
            h3 { (t!("student.ask_title")) }
            form hx-post=(names::STUDENT_QUESTIONS_URL)
                 hx-target="#student-panel"
                 hx-swap="outerHTML"
                 hx-disabled-elt="find button[type='submit']" {
                label {
                    (t!("student.teacher_label"))
                    select name="teacher_id" required="true" {
                        option value="" disabled selected[form.teacher_id.is_none()] {
                            (t!("student.teacher_placeholder"))
                        }
                        @for teacher in teachers {
                            option value=(teacher.user_id)
                                   selected[form.teacher_id == Some(teacher.user_id)] {
                                (teacher.full_name)
                            }
                        }
                    }
                }
                label {
                    (t!("student.question_label"))
                    textarea name="content"
                             rows="4"
                             required="true"
                             placeholder=(t!("student.question_placeholder")) {
                        (form.content)
                    }
                }
                button type="submit" { (t!("student.submit_btn")) }
            }
        }
    }
}

fn question_card(thread: &QuestionThread) -> Markup {
    let question = &thread.question;
    html! {
        article.question-card {
            header {
                @if thread.is_answered() {
                    (components::badge(&t!("status.answered"), "badge-answered"))
                } @else {
                    (components::badge(&t!("status.pending"), "badge-pending"))
                }
                small { (t!("student.asked_to", name = teacher_name(&thread.counterpart_name))) }
            }
            p.question-content { (question.content) }
            small.muted { (t!("student.asked_on", date = components::date(&question.created_at))) }

            @for view in &thread.answers {
                blockquote.answer {
                    p { (view.answer.content) }
                    footer {
                        cite { (teacher_name(&view.author_name)) }
                        " · "
                        (t!("student.answered_on", date = components::date_time(&view.answer.created_at)))
                    }
                }
            }
        }
    }
}

pub fn question_list(threads: &[QuestionThread]) -> Markup {
    html! {
        @if threads.is_empty() {
            article.empty-state {
                h4 { (t!("student.empty_title")) }
                p { (t!("student.empty_desc")) }
            }
        } @else {
            @for thread in threads {
                (question_card(thread))
            }
        }
    }
}

/// Ask form plus the student's own questions. The list re-fetches itself
/// whenever a live notice arrives.
pub fn panel(teachers: &[Profile], threads: &[QuestionThread], form: &QuestionForm) -> Markup {
    html! {
        section #student-panel {
            (ask_form(teachers, form))
            section {
                h3 { (t!("student.my_questions")) }
                div #student-questions
                    hx-get=(names::STUDENT_QUESTIONS_URL)
                    hx-trigger="sse:notice"
                    hx-swap="innerHTML" {
                    (question_list(threads))
                }
            }
        }
    }
}
